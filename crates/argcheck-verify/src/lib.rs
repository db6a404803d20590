//! argcheck verification engine
//!
//! Takes a raw model output, extracts the argument-analysis artifacts it
//! contains and judges them: structural rule chains per artifact,
//! coherence checks across artifacts, and optional virtue scores.
//!
//! # Overview
//!
//! - [`registry`]: the static catalogue of verifiers and their rule chains
//! - [`ConfigMap`]: caller options, checked against each verifier's schema
//! - [`RequestContext`]: per-call role selection, parse cache and solver access
//! - [`rules`]: structural validators for maps, reconstructions and annotations
//! - [`coherence`]: alignment and consistency checks between two artifacts
//! - [`scorers`]: soft quality measurements in `[0, 1]`
//! - [`Engine`]: runs a verifier and composes the [`Evaluation`]
//!
//! # Example
//!
//! ```rust
//! use argcheck_verify::{evaluate, ConfigMap};
//!
//! let input = "```argdown {filename=\"map.ad\"}\n[Tax]: We should tax the rich.\n    <+ <Fair>: It is fair.\n```\n";
//! let eval = evaluate(&ConfigMap::new(), input, "argmap").unwrap();
//! assert!(eval.is_valid());
//! assert_eq!(eval.metrics()["HasArgumentMap"], None);
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod coherence;
mod config;
mod context;
mod engine;
mod error;
mod evaluation;
mod outcome;
pub mod registry;
pub mod rules;
pub mod scorers;
pub mod text;

#[cfg(test)]
mod testing;

pub use coherence::Pair;
pub use config::{
    ConfigMap, Coverage, ResolvedConfig, COVERAGE, DECLARATIONS_KEY, ENABLE_PREFIX, FILTERS,
    FORMALIZATION_KEY, FROM_KEY, LEVENSHTEIN_TOLERANCE, MIN_ARGUMENTS, SOLVER_TIMEOUT_MS,
};
pub use context::RequestContext;
pub use engine::{
    evaluate, evaluate_batch, evaluate_with_source, list_rule_ids, list_scorer_ids, CancelFlag,
    Engine, Request, DEFAULT_CACHE_CAPACITY,
};
pub use error::{ConfigError, ConfigResult, EngineError, RuleError};
pub use evaluation::{Evaluation, EvaluationBuilder};
pub use outcome::{Details, RuleOutcome};
pub use registry::{verifier, verifiers, VerifierSpec};
pub use rules::{Rule, RuleResult};
pub use scorers::{ScoreResult, Scorer};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running verifiers
    pub use crate::{
        evaluate, evaluate_with_source, CancelFlag, ConfigMap, Engine, EngineError, Evaluation,
        Request, RuleOutcome, ScoreResult,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
