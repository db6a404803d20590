//! Rule outcomes

use serde::Serialize;
use serde_json::{Map, Value};

/// Structured details attached to a failing outcome
pub type Details = Map<String, Value>;

/// Result of one rule on one request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RuleOutcome {
    /// The rule's input is missing
    NotApplicable,
    /// The rule holds
    Pass,
    /// The rule is violated
    Fail {
        /// Human-readable explanation
        message: String,
        /// Machine-readable context
        #[serde(skip_serializing_if = "Map::is_empty")]
        details: Details,
    },
}

impl RuleOutcome {
    /// Failing outcome without details
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self::Fail {
            message: message.into(),
            details: Details::new(),
        }
    }

    /// Failing outcome with details
    #[must_use]
    pub fn fail_with(message: impl Into<String>, details: Details) -> Self {
        Self::Fail {
            message: message.into(),
            details,
        }
    }

    /// Pass when there are no problems, otherwise fail with all of them
    #[must_use]
    pub fn from_problems(problems: Vec<String>) -> Self {
        if problems.is_empty() {
            Self::Pass
        } else {
            Self::fail(problems.join(" "))
        }
    }

    /// Whether the rule had input to judge
    #[inline]
    #[must_use]
    pub fn is_applicable(&self) -> bool {
        !matches!(self, Self::NotApplicable)
    }

    /// Whether the rule holds
    #[inline]
    #[must_use]
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    /// Whether the rule is violated
    #[inline]
    #[must_use]
    pub fn is_fail(&self) -> bool {
        matches!(self, Self::Fail { .. })
    }

    /// Status tag as serialized
    #[must_use]
    pub const fn status(&self) -> &'static str {
        match self {
            Self::NotApplicable => "not_applicable",
            Self::Pass => "pass",
            Self::Fail { .. } => "fail",
        }
    }

    /// Failure message
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Fail { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Failure details
    #[must_use]
    pub fn details(&self) -> Option<&Details> {
        match self {
            Self::Fail { details, .. } => Some(details),
            _ => None,
        }
    }
}
