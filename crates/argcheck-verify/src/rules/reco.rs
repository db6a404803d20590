//! Informal reconstruction rules
//!
//! Checks the premise-conclusion structures of an Argdown reconstruction.
//! Argument-level rules look at every argument of the graph and list the
//! offending ones in their message.
//!
//! # Example
//!
//! ```text
//! <Socrates>: Socrates is mortal.
//!
//! (1) All men are mortal.
//! (2) Socrates is a man.
//! -- {from: ["1", "2"]} --
//! (3) Socrates is mortal.
//! ```

use super::{describe_argument, fail_listing, on_graph, Rule};
use crate::outcome::RuleOutcome;
use argcheck_artifact::{stringify_value, Argument, Dialectic, InferenceStep, ParsedGraph, PcsElement};
use argcheck_extract::Role;
use serde_json::Value;
use std::collections::BTreeSet;

/// How many arguments a reconstruction must contain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly one argument
    Unique,
    /// At least `min_arguments` arguments
    AtLeastConfigured,
}

/// Inline proposition data keys permitted when annotations are linked
pub const ANNOTATION_LINK_KEYS: &[&str] = &[crate::coherence::ANNOTATION_IDS_KEY];

/// Full informal chain for a role
#[must_use]
pub fn informal_rules(role: Role, arity: Arity, allowed_prop_data: &'static [&'static str]) -> Vec<Rule> {
    let mut rules = structure_rules(role, arity);
    rules.push(no_prop_inline_data(role, allowed_prop_data));
    rules.push(no_arg_inline_data(role));
    rules
}

/// Rules shared by informal and logical reconstructions, in chain order
///
/// Ends before the inline data rules; callers append their own.
#[must_use]
pub fn structure_rules(role: Role, arity: Arity) -> Vec<Rule> {
    vec![
        has_arguments(role),
        match arity {
            Arity::Unique => has_unique_argument(role),
            Arity::AtLeastConfigured => has_at_least_n_arguments(role),
        },
        has_pcs(role),
        starts_with_premise(role),
        ends_with_conclusion(role),
        not_multiple_gists(role),
        no_duplicate_pcs_labels(role),
        has_label(role),
        has_gist(role),
        has_inference_data(role),
        prop_refs_exist(role),
        uses_all_props(role),
        no_extra_propositions(role),
        only_grounded_dialectical_relations(role),
    ]
}

/// References listed under `from_key`, if the step carries a list there
pub(crate) fn from_refs(step: &InferenceStep, from_key: &str) -> Option<Vec<String>> {
    match step.data.get(from_key) {
        Some(Value::Array(items)) => Some(items.iter().map(stringify_value).collect()),
        _ => None,
    }
}

/// Rule over every argument, failing with the list of offenders
fn per_argument(
    role: Role,
    id: &'static str,
    description: &'static str,
    prefix: &'static str,
    offends: fn(&Argument) -> bool,
) -> Rule {
    Rule::new(id, description, move |ctx| {
        on_graph(ctx, role, |graph| {
            let offenders: Vec<String> = graph
                .arguments
                .iter()
                .enumerate()
                .filter(|(_, arg)| offends(arg))
                .map(|(i, arg)| describe_argument(i, arg))
                .collect();
            Ok(fail_listing(prefix, &offenders))
        })
    })
}

fn has_arguments(role: Role) -> Rule {
    Rule::new("HasArguments", "graph contains an argument", move |ctx| {
        on_graph(ctx, role, |graph| {
            Ok(if graph.arguments.is_empty() {
                RuleOutcome::fail("No arguments found in the argdown data.")
            } else {
                RuleOutcome::Pass
            })
        })
    })
}

fn has_unique_argument(role: Role) -> Rule {
    Rule::new("HasUniqueArgument", "graph contains at most one argument", move |ctx| {
        on_graph(ctx, role, |graph| {
            Ok(if graph.arguments.len() > 1 {
                RuleOutcome::fail(format!(
                    "More than one argument found in the argdown data ({}).",
                    graph.arguments.len()
                ))
            } else {
                RuleOutcome::Pass
            })
        })
    })
}

fn has_at_least_n_arguments(role: Role) -> Rule {
    Rule::new("HasAtLeastNArguments", "graph contains enough arguments", move |ctx| {
        on_graph(ctx, role, |graph| {
            let (found, expected) = (graph.arguments.len(), ctx.config().min_arguments);
            Ok(if found < expected {
                RuleOutcome::fail(format!("Not enough arguments (found {found}, expected ≥{expected})."))
            } else {
                RuleOutcome::Pass
            })
        })
    })
}

fn has_pcs(role: Role) -> Rule {
    Rule::new("HasPCS", "every argument has a well-formed PCS", move |ctx| {
        on_graph(ctx, role, |graph| {
            let mut problems = Vec::new();
            for (i, arg) in graph.arguments.iter().enumerate() {
                let name = describe_argument(i, arg);
                if arg.pcs.is_empty() {
                    problems.push(format!("{name} lacks a premise-conclusion structure."));
                    continue;
                }
                for inference in arg.inferences() {
                    if inference.index == 0 {
                        problems.push(format!("{name} opens with an inference line."));
                    } else if matches!(arg.pcs.get(inference.index - 1), Some(PcsElement::Inference(_))) {
                        problems.push(format!("{name} has two consecutive inference lines."));
                    } else if inference.conclusion.is_none()
                        && !matches!(arg.pcs.get(inference.index + 1), Some(PcsElement::Inference(_)))
                    {
                        problems.push(format!("{name} has an inference line without a conclusion."));
                    }
                }
            }
            Ok(RuleOutcome::from_problems(problems))
        })
    })
}

fn starts_with_premise(role: Role) -> Rule {
    per_argument(
        role,
        "StartsWithPremise",
        "every PCS starts with a premise",
        "The following arguments do not start with a premise",
        |arg| !arg.pcs.is_empty() && !matches!(arg.pcs.first(), Some(PcsElement::Premise(_))),
    )
}

fn ends_with_conclusion(role: Role) -> Rule {
    per_argument(
        role,
        "EndsWithConclusion",
        "every PCS ends with a conclusion",
        "The following arguments do not end with a conclusion",
        |arg| !arg.pcs.is_empty() && arg.final_conclusion().is_none(),
    )
}

fn not_multiple_gists(role: Role) -> Rule {
    per_argument(
        role,
        "NotMultipleGists",
        "no argument has alternative gists",
        "The following arguments have alternative gists (and are declared multiple times)",
        |arg| arg.gists.len() > 1,
    )
}

fn no_duplicate_pcs_labels(role: Role) -> Rule {
    Rule::new("NoDuplicatePCSLabels", "PCS labels are unique within an argument", move |ctx| {
        on_graph(ctx, role, |graph| {
            let offenders: Vec<String> = graph
                .arguments
                .iter()
                .enumerate()
                .filter_map(|(i, arg)| {
                    let mut seen = BTreeSet::new();
                    let mut duplicates = Vec::new();
                    for statement in arg.statements() {
                        let label = format!("({})", statement.label);
                        if !seen.insert(statement.label.as_str()) && !duplicates.contains(&label) {
                            duplicates.push(label);
                        }
                    }
                    (!duplicates.is_empty())
                        .then(|| format!("{} (duplicates: {})", describe_argument(i, arg), duplicates.join(", ")))
                })
                .collect();
            Ok(fail_listing(
                "The following arguments have duplicate premise/conclusion labels",
                &offenders,
            ))
        })
    })
}

fn has_label(role: Role) -> Rule {
    per_argument(
        role,
        "HasLabel",
        "every argument is labeled",
        "The following arguments lack labels",
        |arg| arg.unlabeled,
    )
}

fn has_gist(role: Role) -> Rule {
    per_argument(
        role,
        "HasGist",
        "every argument has a gist",
        "The following arguments lack gists",
        |arg| arg.gists.is_empty(),
    )
}

fn has_inference_data(role: Role) -> Rule {
    Rule::new("HasInferenceData", "inference steps name their premises", move |ctx| {
        on_graph(ctx, role, |graph| {
            let key = ctx.config().from_key.as_str();
            let mut problems = Vec::new();
            for (i, arg) in graph.arguments.iter().enumerate() {
                let name = describe_argument(i, arg);
                for inference in arg.inferences() {
                    let target = inference
                        .conclusion
                        .map_or_else(|| "without conclusion".to_string(), |c| format!("to conclusion ({})", c.label));
                    let problem = match inference.step.data.get(key) {
                        _ if inference.step.data.is_empty() => Some("lacks inline inference data".to_string()),
                        None => Some(format!("inference data lacks '{key}' key")),
                        Some(Value::Array(items)) if items.is_empty() => {
                            Some(format!("inference data '{key}' value is empty"))
                        }
                        Some(Value::Array(_)) => None,
                        Some(_) => Some(format!("inference data '{key}' value is not a list")),
                    };
                    if let Some(problem) = problem {
                        problems.push(format!("In {name}: Inference {target} {problem}."));
                    }
                }
            }
            Ok(RuleOutcome::from_problems(problems))
        })
    })
}

fn prop_refs_exist(role: Role) -> Rule {
    Rule::new("PropRefsExist", "inference references point backwards", move |ctx| {
        on_graph(ctx, role, |graph| {
            let key = ctx.config().from_key.as_str();
            let mut problems = Vec::new();
            for (i, arg) in graph.arguments.iter().enumerate() {
                for inference in arg.inferences() {
                    let Some(refs) = from_refs(inference.step, key) else {
                        continue;
                    };
                    let earlier: BTreeSet<&str> = arg.pcs[..inference.index]
                        .iter()
                        .filter_map(PcsElement::statement)
                        .map(|s| s.label.as_str())
                        .collect();
                    let target = inference.conclusion.map_or("?", |c| c.label.as_str());
                    for reference in refs.iter().filter(|r| !earlier.contains(r.as_str())) {
                        problems.push(format!(
                            "In {}: Item '{reference}' in inference information of conclusion ({target}) does not \
                             refer to a previously introduced premise or conclusion.",
                            describe_argument(i, arg),
                        ));
                    }
                }
            }
            Ok(RuleOutcome::from_problems(problems))
        })
    })
}

fn uses_all_props(role: Role) -> Rule {
    Rule::new("UsesAllProps", "every non-final statement is used in an inference", move |ctx| {
        on_graph(ctx, role, |graph| {
            let key = ctx.config().from_key.as_str();
            let mut problems = Vec::new();
            for (i, arg) in graph.arguments.iter().enumerate() {
                let used: BTreeSet<String> = arg
                    .inferences()
                    .iter()
                    .filter_map(|inf| from_refs(inf.step, key))
                    .flatten()
                    .collect();
                let statements: Vec<_> = arg.statements().collect();
                let unused: Vec<String> = statements
                    .iter()
                    .take(statements.len().saturating_sub(1))
                    .filter(|s| !used.contains(&s.label))
                    .map(|s| format!("({})", s.label))
                    .collect();
                if !unused.is_empty() {
                    problems.push(format!(
                        "In {}: Some propositions are not explicitly used in any inferences: {}.",
                        describe_argument(i, arg),
                        unused.join(", ")
                    ));
                }
            }
            Ok(RuleOutcome::from_problems(problems))
        })
    })
}

fn no_extra_propositions(role: Role) -> Rule {
    Rule::new("NoExtraPropositions", "every proposition occurs in some PCS", move |ctx| {
        on_graph(ctx, role, |graph| {
            let in_pcs = graph.pcs_propositions();
            let outside: Vec<String> = graph
                .propositions
                .iter()
                .filter(|p| !in_pcs.contains(p.label.as_str()))
                .map(|p| format!("[{}]", p.label))
                .collect();
            Ok(fail_listing(
                "Argdown snippet contains propositions not used in any argument",
                &outside,
            ))
        })
    })
}

fn only_grounded_dialectical_relations(role: Role) -> Rule {
    Rule::new(
        "OnlyGroundedDialecticalRelations",
        "sketched relations are backed by premise-conclusion structures",
        move |ctx| {
            on_graph(ctx, role, |graph| {
                Ok(fail_listing(
                    "Argdown snippet defines dialectical relations not grounded in any premise-conclusion structure",
                    &ungrounded_relations(graph),
                ))
            })
        },
    )
}

fn ungrounded_relations(graph: &ParsedGraph) -> Vec<String> {
    graph
        .relations
        .iter()
        .filter(|r| r.dialectics.contains(&Dialectic::Sketched) && !r.dialectics.contains(&Dialectic::Grounded))
        .map(|r| format!("{} {} {}", r.source, r.valence.verb(), r.target))
        .collect()
}

fn no_prop_inline_data(role: Role, allowed: &'static [&'static str]) -> Rule {
    Rule::new("NoPropInlineData", "propositions carry no inline data", move |ctx| {
        on_graph(ctx, role, |graph| {
            let offenders: Vec<String> = graph
                .propositions
                .iter()
                .filter(|p| p.data.keys().any(|k| !allowed.contains(&k.as_str())))
                .map(|p| format!("[{}]", p.label))
                .collect();
            Ok(fail_listing("Some propositions contain yaml inline data", &offenders))
        })
    })
}

pub(crate) fn no_arg_inline_data(role: Role) -> Rule {
    Rule::new("NoArgInlineData", "arguments carry no inline data", move |ctx| {
        on_graph(ctx, role, |graph| {
            let offenders: Vec<String> = graph
                .arguments
                .iter()
                .filter(|a| !a.data.is_empty())
                .map(|a| format!("<{}>", a.label))
                .collect();
            Ok(fail_listing("Some arguments contain yaml inline data", &offenders))
        })
    })
}
