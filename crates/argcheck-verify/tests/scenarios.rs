//! End-to-end scenarios over model output

use argcheck_artifact::{ParsedArtifact, ParsedGraph};
use argcheck_extract::Role;
use argcheck_test_utils::{argdown_block, fixtures, init_tracing, model_output, xml_block};
use argcheck_verify::{evaluate, list_rule_ids, ConfigMap, Evaluation, RuleOutcome};
use pretty_assertions::assert_eq;
use serde_json::json;

fn graph(eval: &Evaluation, role: Role) -> &ParsedGraph {
    match eval.artifact(role) {
        Some(ParsedArtifact::Graph(g)) => g,
        other => panic!("no graph for {role}: {other:?}"),
    }
}

#[test]
fn well_formed_reconstruction_is_valid() {
    init_tracing();
    let input = model_output(&[argdown_block("reconstruction.ad", fixtures::INFRECO)]);
    let eval = evaluate(&ConfigMap::new(), &input, "infreco").unwrap();

    assert_eq!(eval.outcomes().len(), 17);
    for (id, outcome) in eval.outcomes() {
        assert_eq!(outcome, &RuleOutcome::Pass, "{id}");
    }
    assert!(eval.is_valid());
    assert!(eval.metrics().values().all(Option::is_none));
}

#[test]
fn missing_gist_fails_only_that_rule() {
    init_tracing();
    let input = model_output(&[argdown_block("reconstruction.ad", fixtures::INFRECO_NO_GIST)]);
    let eval = evaluate(&ConfigMap::new(), &input, "infreco").unwrap();

    assert!(!eval.is_valid());
    assert_eq!(eval.failures().collect::<Vec<_>>(), vec!["HasGist"]);
    assert!(eval.metrics()["HasGist"].as_deref().unwrap().contains("<Socrates>"));
}

#[test]
fn default_filters_pick_blocks_by_file_name() {
    init_tracing();
    let input = model_output(&[
        argdown_block("map.ad", fixtures::ARGMAP),
        argdown_block("reconstruction.ad", fixtures::INFRECO),
    ]);
    let eval = evaluate(&ConfigMap::new(), &input, "argmap_infreco").unwrap();
    assert!(graph(&eval, Role::Argmap).proposition("Tax").is_some());
    assert!(graph(&eval, Role::Infreco).argument("Socrates").is_some());
    assert!(graph(&eval, Role::Infreco).proposition("Tax").is_none());

    let explicit = ConfigMap::new().with(
        "filters",
        json!({
            "argmap": {"key": "filename", "value": "^map", "regex": true},
            "infreco": {"key": "filename", "value": "^reconstruction", "regex": true},
        }),
    );
    let again = evaluate(&explicit, &input, "argmap_infreco").unwrap();
    assert_eq!(again.artifacts(), eval.artifacts());

    let map_only = evaluate(&ConfigMap::new(), &input, "argmap").unwrap();
    assert!(map_only.is_valid(), "{:?}", map_only.failures().collect::<Vec<_>>());
    assert!(graph(&map_only, Role::Argmap).proposition("Tax").is_some());
    let reco_only = evaluate(&ConfigMap::new(), &input, "infreco").unwrap();
    assert!(reco_only.is_valid(), "{:?}", reco_only.failures().collect::<Vec<_>>());
    assert!(graph(&reco_only, Role::Infreco).argument("Socrates").is_some());
}

#[test]
fn tolerance_decides_alignment() {
    init_tracing();
    let reco = "<Sky>: Blue.\n\n(1) The sky is blue.\n-- {from: [\"1\"]} --\n(2) Something is blue.\n";
    let anno = r#"<proposition id="s">the sky is blue</proposition>"#;
    let input = model_output(&[argdown_block("reconstruction.ad", reco), xml_block(anno)]);

    let loose = ConfigMap::new().with("levenshtein_tolerance", 0.1);
    let eval = evaluate(&loose, &input, "arganno_infreco").unwrap();
    assert_eq!(eval.outcome("ArgannoInfreco.Coverage"), Some(&RuleOutcome::Pass));

    let strict = ConfigMap::new().with("levenshtein_tolerance", 0.01);
    let eval = evaluate(&strict, &input, "arganno_infreco").unwrap();
    assert!(!eval.is_valid());
    assert_eq!(
        eval.metrics()["ArgannoInfreco.Coverage"].as_deref(),
        Some("Elements of the annotation without counterpart in the informal argument reconstruction: 's'.")
    );
}

#[test]
fn entailment_is_checked_by_the_solver() {
    init_tracing();
    let input = model_output(&[argdown_block("reconstruction.ad", fixtures::LOGRECO)]);
    let eval = evaluate(&ConfigMap::new(), &input, "logreco").unwrap();
    assert_eq!(eval.outcome("DeductivelyValidInferences"), Some(&RuleOutcome::Pass));
    assert_eq!(eval.outcome("GloballyValid"), Some(&RuleOutcome::Pass));
    assert!(eval.is_valid(), "{:?}", eval.failures().collect::<Vec<_>>());

    let corrupted = fixtures::LOGRECO.replace("{formalization: \"q\"}", "{formalization: \"-q\"}");
    let input = model_output(&[argdown_block("reconstruction.ad", &corrupted)]);
    let eval = evaluate(&ConfigMap::new(), &input, "logreco").unwrap();
    let outcome = eval.outcome("DeductivelyValidInferences").unwrap();
    assert!(outcome.is_fail());
    let details = outcome.details().unwrap();
    assert_eq!(details["reason"], json!("countermodel"));
    assert!(details["witness"].is_object());
}

#[test]
fn deeply_nested_formalization_is_a_failure() {
    init_tracing();
    let deep = format!("{}q{}", "(".repeat(1000), ")".repeat(1000));
    let reco = fixtures::LOGRECO.replace("{formalization: \"q\"}", &format!("{{formalization: \"{deep}\"}}"));
    let input = model_output(&[argdown_block("reconstruction.ad", &reco)]);
    let eval = evaluate(&ConfigMap::new(), &input, "logreco").unwrap();
    assert!(!eval.is_valid());
    assert!(eval.outcome("HasFormalizations").unwrap().is_fail());
    assert_eq!(
        eval.outcome("DeductivelyValidInferences").unwrap().details().unwrap()["reason"],
        json!("formalization")
    );
}

#[test]
fn coherent_annotation_and_reconstruction() {
    init_tracing();
    let input = model_output(&[
        xml_block(fixtures::ARGANNO),
        argdown_block("reconstruction.ad", fixtures::INFRECO),
    ]);
    let config = ConfigMap::new().with("coverage", "bidirectional");
    let eval = evaluate(&config, &input, "arganno_infreco").unwrap();
    assert!(eval.is_valid(), "{:?}", eval.failures().collect::<Vec<_>>());
    assert_eq!(
        eval.outcomes().keys().map(String::as_str).collect::<Vec<_>>(),
        list_rule_ids("arganno_infreco").unwrap()
    );
    assert_eq!(
        eval.score("arganno_infreco_alignment_fidelity").map(|s| s.score),
        Some(1.0)
    );
}
