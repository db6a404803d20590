//! Error types for extraction and parsing
//!
//! - Parse operations (candidate → parsed structure)
//! - Filter construction (configuration → role filter)

/// Errors while parsing a candidate block
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    /// Syntax error on a given line of an Argdown block
    #[error("syntax error on line {line}: {message}")]
    Syntax {
        /// 1-based line number
        line: usize,
        /// What went wrong
        message: String,
    },

    /// Inline YAML data could not be read
    #[error("invalid inline data on line {line}: {message}")]
    InlineData {
        /// 1-based line number
        line: usize,
        /// What went wrong
        message: String,
    },

    /// Malformed XML markup
    #[error("xml error: {0}")]
    Xml(String),

    /// Block is of the wrong data type for this parser
    #[error("invalid block type: expected {expected}, got {actual}")]
    InvalidType {
        /// Data type the parser handles
        expected: String,
        /// Data type of the candidate
        actual: String,
    },
}

impl ParseError {
    /// Create syntax error for line
    pub fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }

    /// Create inline data error for line
    pub fn inline_data(line: usize, message: impl Into<String>) -> Self {
        Self::InlineData {
            line,
            message: message.into(),
        }
    }

    /// Create XML error
    pub fn xml(message: impl std::fmt::Display) -> Self {
        Self::Xml(message.to_string())
    }
}

/// Errors while building role filters
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// Role name not known
    #[error("unknown filter role: '{0}'")]
    UnknownRole(String),

    /// Filter pattern does not compile
    #[error("invalid regex for key '{key}': {source}")]
    InvalidRegex {
        /// Metadata key of the rule
        key: String,
        /// Regex compilation error
        #[source]
        source: regex::Error,
    },

    /// Filter specification has the wrong shape
    #[error("invalid filter specification: {0}")]
    InvalidSpec(String),
}

/// Result type alias for parse operations
pub type ParseResult<T> = Result<T, ParseError>;
