//! Annotation scorers

use super::{ratio, Measurement, Scorer};
use crate::text::sentences;
use argcheck_extract::Role;

/// Annotation scorers for a role
#[must_use]
pub fn annotation_scorers(role: Role) -> Vec<Scorer> {
    vec![coverage(role), scope(role), density(role)]
}

fn coverage(role: Role) -> Scorer {
    Scorer::new("annotation_coverage", "share of the text inside propositions", move |ctx| {
        let doc = ctx.document(role)?;
        let annotated = doc.annotated_chars();
        let total = doc.text.chars().count();
        let score = ratio(annotated, total)?;
        Some(
            Measurement::new(score)
                .message(format!("{annotated} of {total} characters are annotated."))
                .detail("annotated_chars", annotated)
                .detail("total_chars", total),
        )
    })
}

fn scope(role: Role) -> Scorer {
    Scorer::new("annotation_scope", "propositions per sentence of the source", move |ctx| {
        let doc = ctx.document(role)?;
        let text = ctx.source().unwrap_or(&doc.text);
        let sentences = sentences(text).len();
        let propositions = doc.propositions().count();
        let score = ratio(propositions, sentences)?;
        Some(
            Measurement::new(score)
                .message(format!("{propositions} propositions annotated in {sentences} sentences."))
                .detail("propositions", propositions)
                .detail("sentences", sentences),
        )
    })
}

fn density(role: Role) -> Scorer {
    Scorer::new("annotation_density", "dialectical relations per proposition", move |ctx| {
        let doc = ctx.document(role)?;
        let propositions = doc.propositions().count();
        let relations: usize = doc
            .propositions()
            .map(|s| s.supports().len() + s.attacks().len())
            .sum();
        let score = ratio(relations, 2 * propositions)?;
        Some(
            Measurement::new(score)
                .message(format!("{relations} relations between {propositions} propositions."))
                .detail("relations", relations)
                .detail("propositions", propositions),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;
    use pretty_assertions::assert_eq;

    const ANNOTATION: &str = r#"<proposition id="1" supports="2">Taxes rise.</proposition> So <proposition id="2">prices go up</proposition>. Fine."#;

    fn harness() -> Harness {
        Harness::new().block(Role::Arganno, ANNOTATION)
    }

    #[test]
    fn coverage_counts_annotated_characters() {
        let result = harness().score_id(&annotation_scorers(Role::Arganno), "annotation_coverage").unwrap();
        assert_eq!(result.details["annotated_chars"], serde_json::json!(23));
        assert!(result.score > 0.5 && result.score < 1.0);
    }

    #[test]
    fn scope_prefers_the_source() {
        let scorers = annotation_scorers(Role::Arganno);
        let doc_only = harness().score_id(&scorers, "annotation_scope").unwrap();
        assert_eq!(doc_only.details["sentences"], serde_json::json!(3));
        assert!((doc_only.score - 2.0 / 3.0).abs() < 1e-9);

        let with_source = harness()
            .source("Taxes rise. So prices go up. Fine. Really. Yes.")
            .score_id(&scorers, "annotation_scope")
            .unwrap();
        assert_eq!(with_source.score, 0.4);
    }

    #[test]
    fn density_of_relations() {
        let result = harness().score_id(&annotation_scorers(Role::Arganno), "annotation_density").unwrap();
        assert_eq!(result.score, 0.25);
        assert_eq!(result.message.as_deref(), Some("1 relations between 2 propositions."));
    }

    #[test]
    fn missing_document_skips() {
        assert_eq!(Harness::new().score_id(&annotation_scorers(Role::Arganno), "annotation_density"), None);
    }
}
