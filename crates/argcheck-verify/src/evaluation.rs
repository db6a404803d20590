//! Aggregated result of one verification call

use crate::outcome::RuleOutcome;
use crate::scorers::ScoreResult;
use argcheck_artifact::ParsedArtifact;
use argcheck_extract::Role;
use indexmap::IndexMap;
use serde::Serialize;

/// Immutable result of one verification call
///
/// `is_valid` is the conjunction over applicable outcomes: a call with
/// only not-applicable outcomes is valid. Scores never affect validity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    is_valid: bool,
    artifacts: IndexMap<Role, Option<ParsedArtifact>>,
    metrics: IndexMap<String, Option<String>>,
    outcomes: IndexMap<String, RuleOutcome>,
    scores: Vec<ScoreResult>,
}

impl Evaluation {
    /// Start an empty evaluation
    #[must_use]
    pub fn builder() -> EvaluationBuilder {
        EvaluationBuilder {
            artifacts: IndexMap::new(),
            outcomes: IndexMap::new(),
            scores: Vec::new(),
        }
    }

    /// Whether every applicable rule passed
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Parsed structure per role, `None` when absent or unparseable
    #[inline]
    #[must_use]
    pub fn artifacts(&self) -> &IndexMap<Role, Option<ParsedArtifact>> {
        &self.artifacts
    }

    /// Parsed structure of a role
    #[must_use]
    pub fn artifact(&self, role: Role) -> Option<&ParsedArtifact> {
        self.artifacts.get(&role).and_then(Option::as_ref)
    }

    /// Failure message per rule id in chain order, `None` unless failing
    #[inline]
    #[must_use]
    pub fn metrics(&self) -> &IndexMap<String, Option<String>> {
        &self.metrics
    }

    /// Full outcome per rule id in chain order
    #[inline]
    #[must_use]
    pub fn outcomes(&self) -> &IndexMap<String, RuleOutcome> {
        &self.outcomes
    }

    /// Outcome of one rule
    #[must_use]
    pub fn outcome(&self, rule_id: &str) -> Option<&RuleOutcome> {
        self.outcomes.get(rule_id)
    }

    /// Scores in scorer order, for scorers that ran and met their precondition
    #[inline]
    #[must_use]
    pub fn scores(&self) -> &[ScoreResult] {
        &self.scores
    }

    /// Score of one scorer
    #[must_use]
    pub fn score(&self, scorer_id: &str) -> Option<&ScoreResult> {
        self.scores.iter().find(|s| s.scorer_id == scorer_id)
    }

    /// Ids of failing rules in chain order
    pub fn failures(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|(_, o)| o.is_fail())
            .map(|(id, _)| id.as_str())
    }
}

/// Collects outcomes and scores in declared order
#[derive(Debug)]
pub struct EvaluationBuilder {
    artifacts: IndexMap<Role, Option<ParsedArtifact>>,
    outcomes: IndexMap<String, RuleOutcome>,
    scores: Vec<ScoreResult>,
}

impl EvaluationBuilder {
    /// Record the parsed structure of a role
    pub fn artifact(&mut self, role: Role, parsed: Option<ParsedArtifact>) -> &mut Self {
        self.artifacts.insert(role, parsed);
        self
    }

    /// Record a rule outcome
    pub fn outcome(&mut self, rule_id: impl Into<String>, outcome: RuleOutcome) -> &mut Self {
        self.outcomes.insert(rule_id.into(), outcome);
        self
    }

    /// Record a score; a later result for the same scorer replaces the earlier one
    pub fn score(&mut self, result: ScoreResult) -> &mut Self {
        match self.scores.iter_mut().find(|s| s.scorer_id == result.scorer_id) {
            Some(slot) => *slot = result,
            None => self.scores.push(result),
        }
        self
    }

    /// Compose the evaluation
    #[must_use]
    pub fn build(self) -> Evaluation {
        let is_valid = self.outcomes.values().all(|o| !o.is_fail());
        let metrics = self
            .outcomes
            .iter()
            .map(|(id, o)| (id.clone(), o.message().map(str::to_string)))
            .collect();
        Evaluation {
            is_valid,
            artifacts: self.artifacts,
            metrics,
            outcomes: self.outcomes,
            scores: self.scores,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn builder() -> EvaluationBuilder {
        let mut builder = Evaluation::builder();
        builder.artifact(Role::Argmap, None);
        builder
    }

    #[test]
    fn validity_ignores_not_applicable() {
        let mut builder = builder();
        builder
            .outcome("A", RuleOutcome::Pass)
            .outcome("B", RuleOutcome::NotApplicable);
        let eval = builder.build();
        assert!(eval.is_valid());
        assert_eq!(eval.metrics()["B"], None);
        assert_eq!(eval.artifact(Role::Argmap), None);
    }

    #[test]
    fn one_failure_invalidates() {
        let mut builder = builder();
        builder
            .outcome("Z", RuleOutcome::fail("broken"))
            .outcome("A", RuleOutcome::Pass);
        let eval = builder.build();
        assert!(!eval.is_valid());
        assert_eq!(eval.metrics().keys().collect::<Vec<_>>(), vec!["Z", "A"]);
        assert_eq!(eval.metrics()["Z"].as_deref(), Some("broken"));
        assert_eq!(eval.failures().collect::<Vec<_>>(), vec!["Z"]);
    }

    #[test]
    fn serializes_in_declared_order() {
        let mut builder = builder();
        builder.outcome("B", RuleOutcome::Pass).outcome("A", RuleOutcome::fail("no"));
        let json = serde_json::to_string(&builder.build()).unwrap();
        assert!(json.find("\"B\"").unwrap() < json.find("\"A\"").unwrap());
        assert!(json.contains("\"is_valid\":false"));
        assert!(json.contains("\"argmap\":null"));
    }

    fn score(id: &str, value: f64) -> ScoreResult {
        ScoreResult {
            scorer_id: id.to_string(),
            description: String::new(),
            score: value,
            message: None,
            details: crate::outcome::Details::new(),
        }
    }

    #[test]
    fn scores_are_a_list_in_recorded_order() {
        let mut builder = builder();
        builder.score(score("size", 0.5)).score(score("density", 0.25)).score(score("size", 0.75));
        let eval = builder.build();
        let ids: Vec<&str> = eval.scores().iter().map(|s| s.scorer_id.as_str()).collect();
        assert_eq!(ids, vec!["size", "density"]);
        assert_eq!(eval.score("size").map(|s| s.score), Some(0.75));

        let json = serde_json::to_value(&eval).unwrap();
        assert_eq!(json["scores"][1]["scorer_id"], serde_json::json!("density"));
    }
}
