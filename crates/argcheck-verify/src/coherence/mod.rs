//! Coherence between two artifacts of one verification call
//!
//! Each [`Pair`] aligns the elements of a first artifact with those of a
//! second one: annotation spans, map nodes, reconstructed arguments and
//! propositions. Shared labels and ids link elements structurally;
//! everything else is matched by normalized text within the configured
//! Levenshtein tolerance (see [`align`]).
//!
//! | Pair | First side | Second side | Structural links |
//! |---|---|---|---|
//! | annotation / reconstruction | proposition spans | PCS propositions | `argument_label` + `ref_reco_label`, `annotation_ids` |
//! | annotation / map | proposition spans | all nodes | `ref_reco_label`, else `argument_label` |
//! | map / reconstruction | all nodes | arguments, PCS propositions | equal labels |
//!
//! Coverage, uniqueness and relation checks run in the first-to-second
//! direction; [`Coverage::Bidirectional`] adds the reverse direction.

mod align;
mod view;

pub use align::{align, Alignment};
pub use view::ANNOTATION_IDS_KEY;

use crate::config::Coverage;
use crate::context::RequestContext;
use crate::outcome::RuleOutcome;
use crate::rules::presence::artifact_name;
use crate::rules::{Rule, RuleResult};
use argcheck_artifact::NodeRef;
use argcheck_extract::Role;
use std::fmt::{self, Display, Formatter};
use view::{annotation_ids, Side, Source, Target};

/// Two artifacts checked for coherence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pair {
    /// Annotation and argument map
    ArgannoArgmap,
    /// Annotation and informal reconstruction
    ArgannoInfreco,
    /// Annotation and logical reconstruction
    ArgannoLogreco,
    /// Argument map and informal reconstruction
    ArgmapInfreco,
    /// Argument map and logical reconstruction
    ArgmapLogreco,
}

impl Pair {
    /// All pairs
    pub const ALL: [Self; 5] = [
        Self::ArgannoArgmap,
        Self::ArgannoInfreco,
        Self::ArgannoLogreco,
        Self::ArgmapInfreco,
        Self::ArgmapLogreco,
    ];

    /// Prefix of the pair's rule ids
    #[must_use]
    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::ArgannoArgmap => "ArgannoArgmap",
            Self::ArgannoInfreco => "ArgannoInfreco",
            Self::ArgannoLogreco => "ArgannoLogreco",
            Self::ArgmapInfreco => "ArgmapInfreco",
            Self::ArgmapLogreco => "ArgmapLogreco",
        }
    }

    /// Snake-case name, as in verifier ids
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::ArgannoArgmap => "arganno_argmap",
            Self::ArgannoInfreco => "arganno_infreco",
            Self::ArgannoLogreco => "arganno_logreco",
            Self::ArgmapInfreco => "argmap_infreco",
            Self::ArgmapLogreco => "argmap_logreco",
        }
    }

    /// First and second role
    #[must_use]
    pub const fn roles(&self) -> (Role, Role) {
        match self {
            Self::ArgannoArgmap => (Role::Arganno, Role::Argmap),
            Self::ArgannoInfreco => (Role::Arganno, Role::Infreco),
            Self::ArgannoLogreco => (Role::Arganno, Role::Logreco),
            Self::ArgmapInfreco => (Role::Argmap, Role::Infreco),
            Self::ArgmapLogreco => (Role::Argmap, Role::Logreco),
        }
    }

    /// Id of the pair's alignment fidelity scorer
    #[must_use]
    pub fn fidelity_scorer_id(&self) -> String {
        format!("{}_alignment_fidelity", self.key())
    }

    /// Coherence rules of the pair
    #[must_use]
    pub fn rules(self) -> Vec<Rule> {
        let mut rules = vec![coverage(self), unique_correspondence(self), relation_consistency(self)];
        if self.roles().0 == Role::Arganno {
            rules.push(argument_labels_resolve(self));
        }
        rules
    }
}

impl Display for Pair {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Both sides of a pair and their alignment
#[derive(Debug)]
pub(crate) struct Correspondence<'a> {
    pub(crate) first: Side<'a>,
    pub(crate) second: Side<'a>,
    pub(crate) alignment: Alignment,
}

impl<'a> Correspondence<'a> {
    fn new(first: Side<'a>, second: Side<'a>, links: &[(usize, usize)], tolerance: f64) -> Self {
        let alignment = align(&first.texts(), &second.texts(), links, tolerance);
        tracing::trace!(
            first = first.name,
            second = second.name,
            links = links.len(),
            "aligned artifacts"
        );
        Self {
            first,
            second,
            alignment,
        }
    }

    /// Texts of aligned element pairs
    pub(crate) fn aligned_texts(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.alignment.pairs().filter_map(|(i, j)| {
            Some((
                self.first.elements[i].text.as_deref()?,
                self.second.elements[j].text.as_deref()?,
            ))
        })
    }
}

/// Run `f` on the pair's correspondence, `None` if an artifact is missing
pub(crate) fn with_correspondence<T>(
    ctx: &RequestContext<'_>,
    pair: Pair,
    f: impl FnOnce(&Correspondence<'_>) -> T,
) -> Option<T> {
    let (first_role, second_role) = pair.roles();
    let (first_name, second_name) = (artifact_name(first_role), artifact_name(second_role));
    let tolerance = ctx.config().levenshtein_tolerance;
    let second_graph = ctx.graph(second_role)?;

    if first_role == Role::Arganno {
        let doc = ctx.document(first_role)?;
        let first = Side::annotation(&doc, first_name);
        let (second, links) = if second_role == Role::Argmap {
            let second = Side::map_nodes(&second_graph, second_name);
            let links = annotation_map_links(&first, &second);
            (second, links)
        } else {
            let second = Side::reco_propositions(&second_graph, second_name);
            let links = annotation_reco_links(&first, &second);
            (second, links)
        };
        Some(f(&Correspondence::new(first, second, &links, tolerance)))
    } else {
        let map = ctx.graph(first_role)?;
        let first = Side::map_nodes(&map, first_name);
        let second = Side::reco_nodes(&second_graph, second_name);
        let links = label_links(&first, &second);
        Some(f(&Correspondence::new(first, second, &links, tolerance)))
    }
}

fn on_pair<F>(ctx: &RequestContext<'_>, pair: Pair, f: F) -> RuleResult
where
    F: FnOnce(&Correspondence<'_>) -> RuleResult,
{
    with_correspondence(ctx, pair, f).unwrap_or(Ok(RuleOutcome::NotApplicable))
}

/// Span `argument_label` plus `ref_reco_label`, and proposition `annotation_ids`
fn annotation_reco_links(first: &Side<'_>, second: &Side<'_>) -> Vec<(usize, usize)> {
    let Source::Reco(graph) = second.source else {
        return Vec::new();
    };
    let mut links = Vec::new();
    for i in 0..first.elements.len() {
        let Some(span) = first.span(i) else {
            continue;
        };
        let (Some(argument), Some(reference)) = (span.argument_label(), span.ref_reco_label()) else {
            continue;
        };
        let target = graph
            .argument(argument)
            .and_then(|a| a.statement(reference))
            .and_then(|s| second.node_position(NodeRef::proposition(&s.proposition)));
        if let Some(j) = target {
            links.push((i, j));
        }
    }
    for (j, element) in second.elements.iter().enumerate() {
        let Target::Node(node) = &element.target else {
            continue;
        };
        for id in annotation_ids(graph, node) {
            if let Some(i) = first.span_with_id(&id) {
                links.push((i, j));
            }
        }
    }
    links
}

/// Span `ref_reco_label` against node labels, else `argument_label` against arguments
fn annotation_map_links(first: &Side<'_>, second: &Side<'_>) -> Vec<(usize, usize)> {
    (0..first.elements.len())
        .filter_map(|i| {
            let span = first.span(i)?;
            let by_reference = span.ref_reco_label().and_then(|l| labeled_position(second, l));
            let by_argument = || {
                span.argument_label()
                    .and_then(|l| second.node_position(NodeRef::argument(l)))
                    .filter(|j| second.elements[*j].labeled)
            };
            by_reference.or_else(by_argument).map(|j| (i, j))
        })
        .collect()
}

fn labeled_position(side: &Side<'_>, label: &str) -> Option<usize> {
    [NodeRef::proposition(label), NodeRef::argument(label)]
        .into_iter()
        .find_map(|node| side.node_position(node).filter(|i| side.elements[*i].labeled))
}

/// Labeled nodes of the same kind and label
fn label_links(first: &Side<'_>, second: &Side<'_>) -> Vec<(usize, usize)> {
    first
        .elements
        .iter()
        .enumerate()
        .filter(|(_, e)| e.labeled)
        .filter_map(|(i, e)| {
            second
                .position(&e.target)
                .filter(|j| second.elements[*j].labeled)
                .map(|j| (i, j))
        })
        .collect()
}

fn handles<'s>(side: &'s Side<'_>, indices: impl IntoIterator<Item = usize>) -> Vec<&'s str> {
    indices.into_iter().map(|i| side.elements[i].handle.as_str()).collect()
}

fn coverage(pair: Pair) -> Rule {
    Rule::new(
        format!("{}.Coverage", pair.prefix()),
        "every element has a counterpart in the other artifact",
        move |ctx| {
            let mode = ctx.config().coverage;
            on_pair(ctx, pair, |c| {
                let mut problems = Vec::new();
                let missing = handles(&c.first, c.alignment.uncovered_forward());
                if !missing.is_empty() {
                    problems.push(format!(
                        "Elements of the {} without counterpart in the {}: {}.",
                        c.first.name,
                        c.second.name,
                        missing.join(", ")
                    ));
                }
                if mode == Coverage::Bidirectional {
                    let missing = handles(&c.second, c.alignment.uncovered_backward());
                    if !missing.is_empty() {
                        problems.push(format!(
                            "Elements of the {} without counterpart in the {}: {}.",
                            c.second.name,
                            c.first.name,
                            missing.join(", ")
                        ));
                    }
                }
                Ok(RuleOutcome::from_problems(problems))
            })
        },
    )
}

fn unique_correspondence(pair: Pair) -> Rule {
    Rule::new(
        format!("{}.UniqueCorrespondence", pair.prefix()),
        "no element corresponds to several elements of the other artifact",
        move |ctx| {
            on_pair(ctx, pair, |c| {
                let problems = c
                    .alignment
                    .forward
                    .iter()
                    .enumerate()
                    .filter(|(_, targets)| targets.len() > 1)
                    .map(|(i, targets)| {
                        format!(
                            "{} corresponds to several elements of the {}: {}.",
                            c.first.elements[i].handle,
                            c.second.name,
                            handles(&c.second, targets.iter().copied()).join(", ")
                        )
                    })
                    .collect();
                Ok(RuleOutcome::from_problems(problems))
            })
        },
    )
}

fn relation_consistency(pair: Pair) -> Rule {
    Rule::new(
        format!("{}.RelationConsistency", pair.prefix()),
        "dialectical relations are mirrored by the other artifact",
        move |ctx| {
            let config = ctx.config();
            on_pair(ctx, pair, |c| {
                let mut problems = unmirrored(&c.first, &c.second, &c.alignment.forward, &config.from_key);
                if config.coverage.is_bidirectional() {
                    problems.extend(unmirrored(&c.second, &c.first, &c.alignment.backward, &config.from_key));
                }
                Ok(RuleOutcome::from_problems(problems))
            })
        },
    )
}

/// Relations of `source` whose aligned endpoints are not related in `target`
fn unmirrored(source: &Side<'_>, target: &Side<'_>, mapping: &[Vec<usize>], from_key: &str) -> Vec<String> {
    source
        .relations()
        .into_iter()
        .filter_map(|(i, j, valence)| {
            let (from, to) = (&mapping[i], &mapping[j]);
            if from.is_empty() || to.is_empty() || target.holds(valence, from, to, from_key) {
                return None;
            }
            Some(format!(
                "In the {}, {} {} {}, but the {} does not reflect this.",
                source.name,
                source.elements[i].handle,
                valence.verb(),
                source.elements[j].handle,
                target.name
            ))
        })
        .collect()
}

fn argument_labels_resolve(pair: Pair) -> Rule {
    Rule::new(
        format!("{}.ArgumentLabelsResolve", pair.prefix()),
        "labels declared in the annotation name existing nodes",
        move |ctx| on_pair(ctx, pair, |c| Ok(RuleOutcome::from_problems(unresolved_labels(c)))),
    )
}

fn unresolved_labels(c: &Correspondence<'_>) -> Vec<String> {
    let mut problems = Vec::new();
    let name = c.second.name;
    for i in 0..c.first.elements.len() {
        let Some(span) = c.first.span(i) else {
            continue;
        };
        let handle = &c.first.elements[i].handle;
        let argument = span.argument_label();
        match c.second.source {
            Source::Reco(graph) => {
                let found = argument.map(|l| (l, graph.argument(l)));
                if let Some((label, None)) = found {
                    problems.push(format!(
                        "Proposition {handle}: argument label '{label}' does not name an argument of the {name}."
                    ));
                }
                let Some(reference) = span.ref_reco_label() else {
                    continue;
                };
                match found {
                    Some((label, Some(arg))) if arg.statement(reference).is_none() => problems.push(format!(
                        "Proposition {handle}: reference label '{reference}' is not a statement of <{label}>."
                    )),
                    None if !graph.arguments.iter().any(|a| a.statement(reference).is_some()) => {
                        problems.push(format!(
                            "Proposition {handle}: reference label '{reference}' does not name a statement of the {name}."
                        ));
                    }
                    _ => {}
                }
            }
            Source::Map(graph) => {
                if let Some(label) = argument.filter(|l| graph.argument(l).is_none()) {
                    problems.push(format!(
                        "Proposition {handle}: argument label '{label}' does not name an argument of the {name}."
                    ));
                }
                if let Some(reference) = span.ref_reco_label().filter(|l| labeled_position(&c.second, l).is_none()) {
                    problems.push(format!(
                        "Proposition {handle}: reference label '{reference}' does not name a node of the {name}."
                    ));
                }
            }
            Source::Annotation(_) => {}
        }
    }
    if let Source::Reco(graph) = c.second.source {
        for element in &c.second.elements {
            let Target::Node(node) = &element.target else {
                continue;
            };
            for id in annotation_ids(graph, node) {
                if c.first.span_with_id(&id).is_none() {
                    problems.push(format!(
                        "{} refers to annotation id '{id}', which does not exist.",
                        element.handle
                    ));
                }
            }
        }
    }
    problems
}
