//! Verification engine
//!
//! One call runs the whole pipeline:
//! 1. resolve the configuration against the verifier's schema
//! 2. extract candidates and select one per role
//! 3. run the rule chain in declared order
//! 4. run the enabled scorers
//! 5. compose the [`Evaluation`]
//!
//! Calls share nothing mutable, so [`Engine::evaluate_batch`] fans
//! independent requests out over the rayon pool.

use crate::config::ConfigMap;
use crate::context::RequestContext;
use crate::error::{ConfigError, EngineError};
use crate::evaluation::Evaluation;
use crate::registry::{verifier, VerifierSpec};
use argcheck_extract::{default_parsers, Extractor, ParserRegistry};
use argcheck_logic::{EntailmentSolver, FiniteModelSolver};
use once_cell::sync::Lazy;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Default capacity of the per-call artifact cache
pub const DEFAULT_CACHE_CAPACITY: u64 = 64;

/// Cooperative cancellation, polled at every rule and scorer boundary
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create unset flag
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every call holding this flag to stop
    #[inline]
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Input of one verification call
#[derive(Debug, Clone)]
pub struct Request {
    verifier: String,
    input: String,
    config: ConfigMap,
    source: Option<String>,
    cancel: Option<CancelFlag>,
}

impl Request {
    /// Request running `verifier` over `input` with default configuration
    #[must_use]
    pub fn new(verifier: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            verifier: verifier.into(),
            input: input.into(),
            config: ConfigMap::new(),
            source: None,
            cancel: None,
        }
    }

    /// With configuration
    #[must_use]
    pub fn with_config(mut self, config: ConfigMap) -> Self {
        self.config = config;
        self
    }

    /// With source text the artifacts describe
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// With cancellation flag
    #[must_use]
    pub fn with_cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Verifier id
    #[inline]
    #[must_use]
    pub fn verifier(&self) -> &str {
        &self.verifier
    }

    /// Raw input text
    #[inline]
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }
}

/// Parser and solver collaborators plus extraction settings
#[derive(Clone)]
pub struct Engine {
    parsers: ParserRegistry,
    solver: Arc<dyn EntailmentSolver>,
    extractor: Extractor,
    cache_capacity: u64,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("parsers", &self.parsers)
            .field("solver", &self.solver.name())
            .field("cache_capacity", &self.cache_capacity)
            .finish_non_exhaustive()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Engine with the bundled parsers and the finite-model solver
    #[must_use]
    pub fn new() -> Self {
        Self {
            parsers: default_parsers(),
            solver: Arc::new(FiniteModelSolver::new()),
            extractor: Extractor::new(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }

    /// With parser collaborators
    #[must_use]
    pub fn with_parsers(mut self, parsers: ParserRegistry) -> Self {
        self.parsers = parsers;
        self
    }

    /// With solver collaborator
    #[must_use]
    pub fn with_solver<S: EntailmentSolver + 'static>(mut self, solver: S) -> Self {
        self.solver = Arc::new(solver);
        self
    }

    /// With shared solver collaborator
    #[must_use]
    pub fn with_shared_solver(mut self, solver: Arc<dyn EntailmentSolver>) -> Self {
        self.solver = solver;
        self
    }

    /// With per-call cache capacity
    #[inline]
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: u64) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Run one request
    ///
    /// # Errors
    /// Returns [`EngineError::Config`] when the verifier or configuration
    /// is rejected, and [`EngineError::Cancelled`] when the request's flag
    /// was raised before the call finished
    pub fn evaluate(&self, request: &Request) -> Result<Evaluation, EngineError> {
        let cancel = request.cancel.as_ref();
        self.run(request, || match cancel {
            Some(flag) if flag.is_cancelled() => Err(EngineError::Cancelled),
            _ => Ok(()),
        })
    }

    /// Run independent requests in parallel, results in request order
    #[must_use]
    pub fn evaluate_batch(&self, requests: &[Request]) -> Vec<Result<Evaluation, EngineError>> {
        requests.par_iter().map(|r| self.evaluate(r)).collect()
    }

    fn run<E>(&self, request: &Request, poll: impl Fn() -> Result<(), E>) -> Result<Evaluation, E>
    where
        E: From<ConfigError>,
    {
        let spec = lookup(&request.verifier)?;
        let config = spec.resolve(&request.config)?;

        let span = tracing::info_span!("evaluate", verifier = spec.id());
        let _guard = span.enter();

        let candidates = self.extractor.extract(&request.input);
        tracing::debug!(candidates = candidates.len(), "extracted candidates");
        let ctx = RequestContext::new(&candidates, &config, &self.parsers, self.solver.as_ref())
            .with_source(request.source.as_deref())
            .with_cache_capacity(self.cache_capacity);

        let mut builder = Evaluation::builder();
        for rule in spec.rules() {
            poll()?;
            let outcome = rule.run(&ctx);
            tracing::debug!(rule = rule.id(), status = outcome.status(), "rule outcome");
            builder.outcome(rule.id(), outcome);
        }
        for scorer in spec.scorers() {
            poll()?;
            if !config.scorer_enabled(scorer.id()) {
                tracing::trace!(scorer = scorer.id(), "scorer disabled");
                continue;
            }
            match scorer.score(&ctx) {
                Some(result) => {
                    builder.score(result);
                }
                None => tracing::trace!(scorer = scorer.id(), "scorer precondition unmet"),
            }
        }
        for &role in spec.roles() {
            builder.artifact(role, ctx.snapshot(role));
        }
        let evaluation = builder.build();
        tracing::debug!(valid = evaluation.is_valid(), "evaluation complete");
        Ok(evaluation)
    }
}

fn lookup(id: &str) -> Result<&'static VerifierSpec, ConfigError> {
    verifier(id).ok_or_else(|| ConfigError::UnknownVerifier(id.to_string()))
}

static DEFAULT_ENGINE: Lazy<Engine> = Lazy::new(Engine::new);

/// Run `verifier` over `input` with the default engine
///
/// # Errors
/// Returns [`ConfigError`] when the verifier or configuration is rejected
pub fn evaluate(config: &ConfigMap, input: &str, verifier: &str) -> Result<Evaluation, ConfigError> {
    let request = Request::new(verifier, input).with_config(config.clone());
    DEFAULT_ENGINE.run(&request, || Ok(()))
}

/// Run `verifier` over `input` against a source text
///
/// # Errors
/// Returns [`ConfigError`] when the verifier or configuration is rejected
pub fn evaluate_with_source(
    config: &ConfigMap,
    input: &str,
    source: &str,
    verifier: &str,
) -> Result<Evaluation, ConfigError> {
    let request = Request::new(verifier, input)
        .with_config(config.clone())
        .with_source(source);
    DEFAULT_ENGINE.run(&request, || Ok(()))
}

/// Run independent requests in parallel with the default engine
#[must_use]
pub fn evaluate_batch(requests: &[Request]) -> Vec<Result<Evaluation, EngineError>> {
    DEFAULT_ENGINE.evaluate_batch(requests)
}

/// Rule ids of a verifier in declared order
///
/// # Errors
/// Returns [`ConfigError::UnknownVerifier`] for an unknown id
pub fn list_rule_ids(verifier: &str) -> Result<Vec<&'static str>, ConfigError> {
    lookup(verifier).map(VerifierSpec::rule_ids)
}

/// Scorer ids of a verifier in declared order
///
/// # Errors
/// Returns [`ConfigError::UnknownVerifier`] for an unknown id
pub fn list_scorer_ids(verifier: &str) -> Result<Vec<&'static str>, ConfigError> {
    lookup(verifier).map(VerifierSpec::scorer_ids)
}
