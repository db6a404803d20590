//! Annotation rules
//!
//! An annotation marks propositions in a source text:
//!
//! ```xml
//! <proposition id="1" supports="2">Taxes rise.</proposition> So
//! <proposition id="2">prices go up</proposition>.
//! ```

use super::{on_document, Rule};
use crate::outcome::{Details, RuleOutcome};
use crate::text::{compact_ratio, shorten};
use argcheck_artifact::{AnnotationDocument, AnnotationSpan, PROPOSITION_TAG};
use argcheck_extract::Role;
use serde_json::json;
use std::collections::BTreeMap;

/// Attributes a `<proposition>` may carry
pub const ALLOWED_ATTRIBUTES: [&str; 5] = ["id", "supports", "attacks", "argument_label", "ref_reco_label"];

/// Largest edit-distance ratio between source and annotated text
pub const SOURCE_TOLERANCE: f64 = 0.01;

/// Annotation chain
#[must_use]
pub fn arganno_rules(role: Role) -> Vec<Rule> {
    vec![
        source_text_integrity(role),
        element_validity(role),
        nested_proposition(role),
        proposition_id_presence(role),
        proposition_id_uniqueness(role),
        attribute_validity(role),
        reference_validity(role, "SupportReferenceValidity", "Supported", AnnotationSpan::supports),
        reference_validity(role, "AttackReferenceValidity", "Attacked", AnnotationSpan::attacks),
    ]
}

fn quote(span: &AnnotationSpan) -> String {
    format!("'{}'", shorten(&span.text, 64))
}

fn source_text_integrity(role: Role) -> Rule {
    Rule::new("SourceTextIntegrity", "annotation leaves the source text intact", move |ctx| {
        let Some(source) = ctx.source() else {
            return Ok(RuleOutcome::NotApplicable);
        };
        on_document(ctx, role, |doc| {
            let ratio = compact_ratio(source, &doc.text);
            if ratio <= SOURCE_TOLERANCE {
                return Ok(RuleOutcome::Pass);
            }
            let mut details = Details::new();
            details.insert("ratio".into(), json!(ratio));
            Ok(RuleOutcome::fail_with(
                format!(
                    "Source text '{}' was altered (edit distance ratio {ratio:.3}).",
                    shorten(source, 40)
                ),
                details,
            ))
        })
    })
}

fn element_validity(role: Role) -> Rule {
    Rule::new("ElementValidity", "only proposition elements are used", move |ctx| {
        on_document(ctx, role, |doc| {
            let unknown: Vec<String> = doc
                .spans
                .iter()
                .filter(|s| s.tag != PROPOSITION_TAG)
                .map(|s| format!("Unknown element '{}' at {}.", s.tag, quote(s)))
                .collect();
            Ok(RuleOutcome::from_problems(unknown))
        })
    })
}

fn nested_proposition(role: Role) -> Rule {
    Rule::new("NestedProposition", "propositions do not nest", move |ctx| {
        on_document(ctx, role, |doc| {
            let nested: Vec<String> = doc
                .propositions()
                .filter(|s| doc.is_nested(s))
                .map(quote)
                .collect();
            Ok(if nested.is_empty() {
                RuleOutcome::Pass
            } else {
                RuleOutcome::fail(format!("Nested annotations in proposition(s) {}.", nested.join(", ")))
            })
        })
    })
}

fn proposition_id_presence(role: Role) -> Rule {
    Rule::new("PropositionIdPresence", "every proposition has an id", move |ctx| {
        on_document(ctx, role, |doc| {
            let missing: Vec<String> = doc.propositions().filter(|s| s.id().is_none()).map(quote).collect();
            Ok(if missing.is_empty() {
                RuleOutcome::Pass
            } else {
                RuleOutcome::fail(format!("Missing id in proposition(s) {}.", missing.join(", ")))
            })
        })
    })
}

fn proposition_id_uniqueness(role: Role) -> Rule {
    Rule::new("PropositionIdUniqueness", "proposition ids are unique", move |ctx| {
        on_document(ctx, role, |doc| {
            let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
            for id in doc.propositions().filter_map(AnnotationSpan::id) {
                *counts.entry(id).or_default() += 1;
            }
            let duplicates: Vec<String> = counts
                .into_iter()
                .filter(|(_, n)| *n > 1)
                .map(|(id, _)| format!("'{id}'"))
                .collect();
            Ok(super::fail_listing("Duplicate ids", &duplicates))
        })
    })
}

fn attribute_validity(role: Role) -> Rule {
    Rule::new("AttributeValidity", "propositions carry only known attributes", move |ctx| {
        on_document(ctx, role, |doc| {
            let unknown: Vec<String> = doc
                .propositions()
                .flat_map(|s| {
                    s.attributes
                        .keys()
                        .filter(|k| !ALLOWED_ATTRIBUTES.contains(&k.as_str()))
                        .map(move |k| format!("Unknown attribute '{k}' in proposition {}.", quote(s)))
                })
                .collect();
            Ok(RuleOutcome::from_problems(unknown))
        })
    })
}

fn reference_validity(
    role: Role,
    id: &'static str,
    adjective: &'static str,
    targets: for<'s> fn(&'s AnnotationSpan) -> Vec<&'s str>,
) -> Rule {
    Rule::new(id, "references name other existing propositions", move |ctx| {
        on_document(ctx, role, |doc| Ok(RuleOutcome::from_problems(bad_references(doc, adjective, targets))))
    })
}

fn bad_references(
    doc: &AnnotationDocument,
    adjective: &str,
    targets: for<'s> fn(&'s AnnotationSpan) -> Vec<&'s str>,
) -> Vec<String> {
    let mut problems = Vec::new();
    for span in doc.propositions() {
        for target in targets(span) {
            if span.id() == Some(target) {
                problems.push(format!(
                    "{adjective} proposition with id '{target}' in proposition {} refers to itself.",
                    quote(span)
                ));
            } else if doc.proposition_by_id(target).is_none() {
                problems.push(format!(
                    "{adjective} proposition with id '{target}' in proposition {} does not exist.",
                    quote(span)
                ));
            }
        }
    }
    problems
}
