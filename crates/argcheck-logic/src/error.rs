//! Error types for formulas and solvers

/// Errors while reading or analysing a formula
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormulaError {
    /// Formula text does not parse
    #[error("invalid formula '{formula}': {message}")]
    Syntax {
        /// Formula text
        formula: String,
        /// Parser diagnostics
        message: String,
    },

    /// Formula nests deeper than the parser accepts
    #[error("formula nests deeper than {limit} levels")]
    TooDeep {
        /// Nesting limit
        limit: usize,
    },

    /// Symbol used with different arities or kinds
    #[error("symbol '{symbol}' is used as {first} and as {second}")]
    SymbolConflict {
        /// Offending symbol
        symbol: String,
        /// First use
        first: String,
        /// Conflicting use
        second: String,
    },
}

impl FormulaError {
    /// Create syntax error
    pub fn syntax(formula: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Syntax {
            formula: formula.into(),
            message: message.into(),
        }
    }

    /// Create symbol conflict error
    pub fn conflict(
        symbol: impl Into<String>,
        first: impl std::fmt::Display,
        second: impl std::fmt::Display,
    ) -> Self {
        Self::SymbolConflict {
            symbol: symbol.into(),
            first: first.to_string(),
            second: second.to_string(),
        }
    }
}

/// Errors raised by a solver backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SolverError {
    /// Query formula is ill-formed
    #[error(transparent)]
    Formula(#[from] FormulaError),

    /// Variable occurs outside the scope of its quantifier
    #[error("unbound variable '{0}'")]
    UnboundVariable(String),

    /// Backend-specific failure
    #[error("solver backend error: {0}")]
    Backend(String),
}

impl SolverError {
    /// Create backend error
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}
