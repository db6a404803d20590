//! Error types for the verification engine
//!
//! - [`ConfigError`]: rejected configuration, raised before any rule runs
//! - [`RuleError`]: a rule body could not complete; folded into a failing outcome
//! - [`EngineError`]: everything an evaluation call can return instead of a result

use argcheck_extract::{FilterError, Role};
use argcheck_logic::{FormulaError, SolverError};
use std::path::PathBuf;

/// Configuration rejected at call start
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No verifier with this id
    #[error("unknown verifier: '{0}'")]
    UnknownVerifier(String),

    /// Option not in the verifier's schema
    #[error("verifier '{verifier}' does not accept option '{key}'")]
    UnknownOption {
        /// Verifier id
        verifier: String,
        /// Offending key
        key: String,
    },

    /// Role name not known
    #[error("unknown role: '{0}'")]
    UnknownRole(String),

    /// Filter configured for a role the verifier does not use
    #[error("verifier '{verifier}' has no role '{role}'")]
    RoleNotAllowed {
        /// Verifier id
        verifier: String,
        /// Offending role
        role: Role,
    },

    /// `enable_<id>` names no scorer of the verifier
    #[error("verifier '{verifier}' has no scorer '{scorer}'")]
    UnknownScorer {
        /// Verifier id
        verifier: String,
        /// Offending scorer id
        scorer: String,
    },

    /// Value of the wrong type or out of range
    #[error("invalid value for '{key}': expected {expected}, found {found}")]
    InvalidValue {
        /// Option key
        key: String,
        /// What the option accepts
        expected: &'static str,
        /// What was given
        found: String,
    },

    /// Filter rule does not compile or has the wrong shape
    #[error("invalid filter for role '{role}': {source}")]
    InvalidFilter {
        /// Role of the filter
        role: Role,
        /// Underlying filter error
        #[source]
        source: FilterError,
    },

    /// Configuration text is not a JSON/TOML table
    #[error("invalid configuration: {0}")]
    Parse(String),

    /// Configuration file could not be read
    #[error("cannot read configuration file '{}': {source}", path.display())]
    Io {
        /// File path
        path: PathBuf,
        /// I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Create unknown option error
    pub fn unknown_option(verifier: impl Into<String>, key: impl Into<String>) -> Self {
        Self::UnknownOption {
            verifier: verifier.into(),
            key: key.into(),
        }
    }

    /// Create invalid value error
    pub fn invalid_value(key: impl Into<String>, expected: &'static str, found: &serde_json::Value) -> Self {
        Self::InvalidValue {
            key: key.into(),
            expected,
            found: found.to_string(),
        }
    }
}

/// A rule body that could not run to completion
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// Solver backend failed
    #[error("solver error: {0}")]
    Solver(#[from] SolverError),

    /// Formula could not be analysed
    #[error("formula error: {0}")]
    Formula(#[from] FormulaError),

    /// Unexpected state
    #[error("internal error: {0}")]
    Internal(String),
}

impl RuleError {
    /// Create internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Reason code reported in outcome details
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Solver(_) => "unknown",
            Self::Formula(_) => "formula",
            Self::Internal(_) => "internal",
        }
    }
}

/// Errors returned by an evaluation call
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration rejected
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Caller cancelled the call
    #[error("evaluation cancelled")]
    Cancelled,
}

impl EngineError {
    /// Whether the call was cancelled
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Result type alias for configuration resolution
pub type ConfigResult<T> = Result<T, ConfigError>;
