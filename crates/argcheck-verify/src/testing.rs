//! Harness for running rules and scorers against hand-written blocks

use crate::config::ResolvedConfig;
use crate::context::RequestContext;
use crate::outcome::RuleOutcome;
use crate::rules::Rule;
use crate::scorers::{ScoreResult, Scorer};
use argcheck_artifact::{ArtifactCandidate, Metadata};
use argcheck_extract::{default_parsers, FilterRule, ParserRegistry, Role, RoleFilter};
use argcheck_logic::FiniteModelSolver;
use serde_json::json;

pub(crate) struct Harness {
    candidates: Vec<ArtifactCandidate>,
    config: ResolvedConfig,
    parsers: ParserRegistry,
    solver: FiniteModelSolver,
    source: Option<String>,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self {
            candidates: Vec::new(),
            config: ResolvedConfig::new(),
            parsers: default_parsers(),
            solver: FiniteModelSolver::new(),
            source: None,
        }
    }

    /// Add a block for `role`, selectable by its file name
    pub(crate) fn block(mut self, role: Role, raw: &str) -> Self {
        let filename = format!("{role}.block");
        let mut meta = Metadata::new();
        meta.insert("filename".into(), json!(filename));
        self.candidates
            .push(ArtifactCandidate::new(self.candidates.len(), role.dtype(), raw, meta));
        self.config = self
            .config
            .with_filter(RoleFilter::new(role).with_rule(FilterRule::exact("filename", filename)));
        self
    }

    pub(crate) fn config(mut self, f: impl FnOnce(ResolvedConfig) -> ResolvedConfig) -> Self {
        self.config = f(self.config);
        self
    }

    pub(crate) fn source(mut self, text: &str) -> Self {
        self.source = Some(text.to_string());
        self
    }

    pub(crate) fn context(&self) -> RequestContext<'_> {
        RequestContext::new(&self.candidates, &self.config, &self.parsers, &self.solver)
            .with_source(self.source.as_deref())
    }

    pub(crate) fn run(&self, rule: &Rule) -> RuleOutcome {
        rule.run(&self.context())
    }

    /// Outcome of the rule with the given id from a chain
    pub(crate) fn run_id(&self, rules: &[Rule], id: &str) -> RuleOutcome {
        let rule = rules
            .iter()
            .find(|r| r.id() == id)
            .unwrap_or_else(|| panic!("no rule {id}"));
        self.run(rule)
    }

    pub(crate) fn score(&self, scorer: &Scorer) -> Option<ScoreResult> {
        scorer.score(&self.context())
    }

    /// Result of the scorer with the given id from a list
    pub(crate) fn score_id(&self, scorers: &[Scorer], id: &str) -> Option<ScoreResult> {
        let scorer = scorers
            .iter()
            .find(|s| s.id() == id)
            .unwrap_or_else(|| panic!("no scorer {id}"));
        self.score(scorer)
    }
}
