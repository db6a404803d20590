//! Artifacts as lists of alignable elements

use crate::rules::reco::from_refs;
use crate::rules::{describe_argument, describe_proposition};
use argcheck_artifact::dialectics::{are_contradictory, indirectly_attacks, indirectly_supports};
use argcheck_artifact::{stringify_value, AnnotationDocument, AnnotationSpan, NodeRef, ParsedGraph, Valence};
use serde_json::Value;
use std::collections::BTreeSet;

/// Data key on reconstruction propositions naming annotation span ids
pub const ANNOTATION_IDS_KEY: &str = "annotation_ids";

/// What an element stands for
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Target {
    /// Index into the annotation's spans
    Span(usize),
    /// A graph node
    Node(NodeRef),
}

#[derive(Debug, Clone)]
pub(crate) struct Element {
    pub(crate) handle: String,
    pub(crate) text: Option<String>,
    pub(crate) target: Target,
    pub(crate) labeled: bool,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Source<'a> {
    Annotation(&'a AnnotationDocument),
    Map(&'a ParsedGraph),
    Reco(&'a ParsedGraph),
}

/// One side of a coherence check
#[derive(Debug)]
pub(crate) struct Side<'a> {
    pub(crate) source: Source<'a>,
    pub(crate) name: &'static str,
    pub(crate) elements: Vec<Element>,
}

impl<'a> Side<'a> {
    /// Proposition spans of an annotation
    pub(crate) fn annotation(doc: &'a AnnotationDocument, name: &'static str) -> Self {
        let elements = doc
            .propositions()
            .map(|span| Element {
                handle: span.describe(),
                text: Some(span.text.clone()),
                target: Target::Span(span.index),
                labeled: span.id().is_some(),
            })
            .collect();
        Self { source: Source::Annotation(doc), name, elements }
    }

    /// PCS propositions of a reconstruction
    pub(crate) fn reco_propositions(graph: &'a ParsedGraph, name: &'static str) -> Self {
        let mut side = Self { source: Source::Reco(graph), name, elements: Vec::new() };
        side.push_propositions(graph, true);
        side
    }

    /// Every node of a map
    pub(crate) fn map_nodes(graph: &'a ParsedGraph, name: &'static str) -> Self {
        let mut side = Self { source: Source::Map(graph), name, elements: Vec::new() };
        side.push_propositions(graph, false);
        side.push_arguments(graph);
        side
    }

    /// Arguments and PCS propositions of a reconstruction
    pub(crate) fn reco_nodes(graph: &'a ParsedGraph, name: &'static str) -> Self {
        let mut side = Self { source: Source::Reco(graph), name, elements: Vec::new() };
        side.push_arguments(graph);
        side.push_propositions(graph, true);
        side
    }

    fn push_propositions(&mut self, graph: &ParsedGraph, pcs_only: bool) {
        let in_pcs = graph.pcs_propositions();
        for prop in graph.propositions.iter().filter(|p| !pcs_only || in_pcs.contains(p.label.as_str())) {
            self.elements.push(Element {
                handle: describe_proposition(graph, &prop.label),
                text: prop.text().map(str::to_string),
                target: Target::Node(NodeRef::proposition(&prop.label)),
                labeled: !prop.unlabeled,
            });
        }
    }

    fn push_arguments(&mut self, graph: &ParsedGraph) {
        for (i, arg) in graph.arguments.iter().enumerate() {
            self.elements.push(Element {
                handle: describe_argument(i, arg),
                text: arg.gists.first().cloned(),
                target: Target::Node(NodeRef::argument(&arg.label)),
                labeled: !arg.unlabeled,
            });
        }
    }

    pub(crate) fn texts(&self) -> Vec<Option<&str>> {
        self.elements.iter().map(|e| e.text.as_deref()).collect()
    }

    pub(crate) fn position(&self, target: &Target) -> Option<usize> {
        self.elements.iter().position(|e| &e.target == target)
    }

    pub(crate) fn node_position(&self, node: NodeRef) -> Option<usize> {
        self.position(&Target::Node(node))
    }

    pub(crate) fn span(&self, index: usize) -> Option<&'a AnnotationSpan> {
        match (self.source, &self.elements.get(index)?.target) {
            (Source::Annotation(doc), Target::Span(i)) => doc.spans.get(*i),
            _ => None,
        }
    }

    fn node(&self, index: usize) -> Option<&NodeRef> {
        match &self.elements.get(index)?.target {
            Target::Node(node) => Some(node),
            Target::Span(_) => None,
        }
    }

    /// Element with span id `id`
    pub(crate) fn span_with_id(&self, id: &str) -> Option<usize> {
        (0..self.elements.len()).find(|i| self.span(*i).and_then(AnnotationSpan::id) == Some(id))
    }

    /// Relations between elements of this side
    pub(crate) fn relations(&self) -> Vec<(usize, usize, Valence)> {
        let mut out = Vec::new();
        match self.source {
            Source::Annotation(_) => {
                for i in 0..self.elements.len() {
                    let Some(span) = self.span(i) else {
                        continue;
                    };
                    let targets = span
                        .supports()
                        .into_iter()
                        .map(|id| (id, Valence::Support))
                        .chain(span.attacks().into_iter().map(|id| (id, Valence::Attack)));
                    for (id, valence) in targets {
                        if let Some(j) = self.span_with_id(id) {
                            push_unique(&mut out, (i, j, valence));
                        }
                    }
                }
            }
            Source::Map(graph) | Source::Reco(graph) => {
                for relation in &graph.relations {
                    let source = self.node_position(relation.source.clone());
                    let target = self.node_position(relation.target.clone());
                    if let (Some(i), Some(j)) = (source, target) {
                        push_unique(&mut out, (i, j, relation.valence));
                    }
                }
            }
        }
        out
    }

    /// Whether some element of `from` stands in `valence` to some element of `to`
    pub(crate) fn holds(&self, valence: Valence, from: &[usize], to: &[usize], from_key: &str) -> bool {
        from.iter()
            .any(|&i| to.iter().any(|&j| i != j && self.relates(valence, i, j, from_key)))
    }

    fn relates(&self, valence: Valence, i: usize, j: usize, from_key: &str) -> bool {
        if valence == Valence::Contradict {
            return self.relates(Valence::Attack, i, j, from_key) || self.relates(Valence::Attack, j, i, from_key);
        }
        match self.source {
            Source::Annotation(_) => {
                let (Some(a), Some(b)) = (self.span(i), self.span(j)) else {
                    return false;
                };
                let Some(id) = b.id() else {
                    return false;
                };
                match valence {
                    Valence::Support => a.supports().contains(&id),
                    _ => a.attacks().contains(&id),
                }
            }
            Source::Map(graph) | Source::Reco(graph) => {
                let (Some(a), Some(b)) = (self.node(i), self.node(j)) else {
                    return false;
                };
                let reco = matches!(self.source, Source::Reco(_));
                let (xs, ys) = (expand(graph, a, reco), expand(graph, b, reco));
                let pairs = || xs.iter().flat_map(|x| ys.iter().map(move |y| (x, y))).filter(|(x, y)| x != y);
                match valence {
                    Valence::Support => {
                        (reco && inferentially_supports(graph, from_key, a, b))
                            || pairs().any(|(x, y)| indirectly_supports(graph, x, y))
                    }
                    _ => pairs().any(|(x, y)| indirectly_attacks(graph, x, y)) || contradictory(graph, a, b),
                }
            }
        }
    }
}

fn push_unique(out: &mut Vec<(usize, usize, Valence)>, relation: (usize, usize, Valence)) {
    if !out.contains(&relation) {
        out.push(relation);
    }
}

/// A reconstructed proposition also stands for the arguments concluding it
fn expand(graph: &ParsedGraph, node: &NodeRef, reco: bool) -> Vec<NodeRef> {
    let mut nodes = vec![node.clone()];
    if let (true, NodeRef::Proposition(label)) = (reco, node) {
        nodes.extend(
            graph
                .arguments
                .iter()
                .filter(|a| a.final_conclusion().is_some_and(|c| &c.proposition == label))
                .map(|a| NodeRef::argument(&a.label)),
        );
    }
    nodes
}

fn contradictory(graph: &ParsedGraph, a: &NodeRef, b: &NodeRef) -> bool {
    match (a, b) {
        (NodeRef::Proposition(a), NodeRef::Proposition(b)) => match (graph.proposition(a), graph.proposition(b)) {
            (Some(a), Some(b)) => are_contradictory(a, b, Some(graph)),
            _ => false,
        },
        _ => false,
    }
}

/// `premise` is inferred into `conclusion` within one argument
fn inferentially_supports(graph: &ParsedGraph, from_key: &str, premise: &NodeRef, conclusion: &NodeRef) -> bool {
    let (NodeRef::Proposition(premise), NodeRef::Proposition(conclusion)) = (premise, conclusion) else {
        return false;
    };
    graph.arguments.iter().any(|arg| {
        let inferences = arg.inferences();
        let mut stack: Vec<String> = arg
            .conclusions()
            .filter(|s| &s.proposition == conclusion)
            .map(|s| s.label.clone())
            .collect();
        let mut seen = BTreeSet::new();
        while let Some(label) = stack.pop() {
            if !seen.insert(label.clone()) {
                continue;
            }
            let Some(inference) = inferences
                .iter()
                .find(|inf| inf.conclusion.is_some_and(|c| c.label == label))
            else {
                continue;
            };
            for reference in from_refs(inference.step, from_key).unwrap_or_default() {
                if arg.statement(&reference).is_some_and(|s| &s.proposition == premise) {
                    return true;
                }
                stack.push(reference);
            }
        }
        false
    })
}

/// Span ids a reconstruction proposition claims to annotate
pub(crate) fn annotation_ids(graph: &ParsedGraph, node: &NodeRef) -> Vec<String> {
    let NodeRef::Proposition(label) = node else {
        return Vec::new();
    };
    match graph.proposition(label).and_then(|p| p.data.get(ANNOTATION_IDS_KEY)) {
        Some(Value::Array(ids)) => ids.iter().map(stringify_value).collect(),
        Some(other) => vec![stringify_value(other)],
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argcheck_extract::default_parsers;
    use pretty_assertions::assert_eq;

    fn graph(raw: &str) -> ParsedGraph {
        default_parsers()
            .argdown()
            .parse(raw)
            .unwrap_or_else(|e| panic!("fixture parses: {e}"))
    }

    fn pcs(g: &ParsedGraph, label: &str) -> NodeRef {
        let statement = g.arguments[0].statement(label).unwrap_or_else(|| panic!("({label}) exists"));
        NodeRef::proposition(&statement.proposition)
    }

    const RECO: &str = "<A>: Gist.\n\n(1) P. {annotation_ids: [\"1\"]}\n(2) Q.\n-- {from: [\"1\", \"2\"]} --\n(3) R.\n-- {from: [\"3\"]} --\n(4) S.\n";

    #[test]
    fn reconstruction_sides() {
        let g = graph(RECO);
        let props = Side::reco_propositions(&g, "reconstruction");
        assert_eq!(props.elements.len(), 4);
        assert_eq!(props.texts()[0], Some("P."));
        let nodes = Side::reco_nodes(&g, "reconstruction");
        assert_eq!(nodes.elements[0].handle, "<A>");
        assert_eq!(nodes.elements.len(), 5);
        assert_eq!(annotation_ids(&g, &pcs(&g, "1")), vec!["1".to_string()]);
        assert!(annotation_ids(&g, &pcs(&g, "2")).is_empty());
    }

    #[test]
    fn inferential_closure_spans_intermediate_conclusions() {
        let g = graph(RECO);
        let side = Side::reco_propositions(&g, "reconstruction");
        let p = side.node_position(pcs(&g, "1")).unwrap();
        let s = side.node_position(pcs(&g, "4")).unwrap();
        assert!(side.holds(Valence::Support, &[p], &[s], "from"));
        assert!(!side.holds(Valence::Support, &[s], &[p], "from"));
        assert!(inferentially_supports(&g, "from", &pcs(&g, "2"), &pcs(&g, "3")));
        assert!(!inferentially_supports(&g, "premises", &pcs(&g, "1"), &pcs(&g, "4")));
    }

    #[test]
    fn map_relations() {
        let g = graph("[T]: Raise taxes.\n    <+ <Fair>: It is fair.\n    <- <Growth>: Growth slows.\n");
        let side = Side::map_nodes(&g, "map");
        let rels = side.relations();
        let t = side.node_position(NodeRef::proposition("T")).unwrap();
        let fair = side.node_position(NodeRef::argument("Fair")).unwrap();
        let growth = side.node_position(NodeRef::argument("Growth")).unwrap();
        assert!(rels.contains(&(fair, t, Valence::Support)));
        assert!(side.holds(Valence::Attack, &[growth], &[t], "from"));
        assert!(side.holds(Valence::Contradict, &[t], &[growth], "from"));
        assert!(!side.holds(Valence::Support, &[growth], &[t], "from"));
    }

    #[test]
    fn annotation_relations() {
        let doc = default_parsers()
            .xml()
            .parse(r#"<proposition id="1" supports="2">a</proposition> <proposition id="2" attacks="1">b</proposition>"#)
            .unwrap_or_else(|e| panic!("fixture parses: {e}"));
        let side = Side::annotation(&doc, "annotation");
        assert_eq!(side.relations(), vec![(0, 1, Valence::Support), (1, 0, Valence::Attack)]);
        assert!(side.holds(Valence::Support, &[0], &[1], "from"));
        assert!(side.holds(Valence::Contradict, &[0], &[1], "from"));
        assert!(!side.holds(Valence::Support, &[1], &[0], "from"));
        assert_eq!(side.span_with_id("2"), Some(1));
    }
}
