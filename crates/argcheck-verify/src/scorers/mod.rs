//! Virtue scorers
//!
//! A [`Scorer`] measures one quality of the parsed artifacts on a scale
//! from 0 to 1. Scores never influence validity. A scorer whose
//! precondition is unmet (missing artifact, empty text, no source)
//! produces no result; a scorer switched off with `enable_<id> = false`
//! is not run at all.

use crate::context::RequestContext;
use crate::outcome::Details;
use serde::Serialize;
use std::borrow::Cow;
use std::sync::Arc;

pub mod alignment;
pub mod annotation;
pub mod argmap;
pub mod reco;

/// Score of one scorer on one request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    /// Scorer id
    pub scorer_id: String,
    /// What the scorer measures
    pub description: String,
    /// Value in `[0, 1]`
    pub score: f64,
    /// Human-readable rendering of the measurement
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Raw measurements
    #[serde(skip_serializing_if = "Details::is_empty")]
    pub details: Details,
}

/// What a scorer body measures
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Measurement {
    pub(crate) score: f64,
    pub(crate) message: Option<String>,
    pub(crate) details: Details,
}

impl Measurement {
    pub(crate) fn new(score: f64) -> Self {
        Self {
            score: score.clamp(0.0, 1.0),
            ..Self::default()
        }
    }

    pub(crate) fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub(crate) fn detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}

type ScoreFn = dyn Fn(&RequestContext<'_>) -> Option<Measurement> + Send + Sync;

/// A named measurement
#[derive(Clone)]
pub struct Scorer {
    id: Cow<'static, str>,
    description: &'static str,
    measure: Arc<ScoreFn>,
}

impl std::fmt::Debug for Scorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scorer")
            .field("id", &self.id)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl Scorer {
    pub(crate) fn new<F>(id: impl Into<Cow<'static, str>>, description: &'static str, measure: F) -> Self
    where
        F: Fn(&RequestContext<'_>) -> Option<Measurement> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            description,
            measure: Arc::new(measure),
        }
    }

    /// Scorer id, also the suffix of its `enable_<id>` switch
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// What the scorer measures
    #[inline]
    #[must_use]
    pub fn description(&self) -> &'static str {
        self.description
    }

    /// Score the request, `None` when the precondition is unmet
    #[must_use]
    pub fn score(&self, ctx: &RequestContext<'_>) -> Option<ScoreResult> {
        let measured = (self.measure)(ctx)?;
        Some(ScoreResult {
            scorer_id: self.id.to_string(),
            description: self.description.to_string(),
            score: measured.score,
            message: measured.message,
            details: measured.details,
        })
    }
}

/// `n / (n + 1)`
#[allow(clippy::cast_precision_loss)]
pub(crate) fn saturating(n: usize) -> f64 {
    n as f64 / (n as f64 + 1.0)
}

/// `a / b`, `None` when `b` is zero
#[allow(clippy::cast_precision_loss)]
pub(crate) fn ratio(a: usize, b: usize) -> Option<f64> {
    (b > 0).then(|| a as f64 / b as f64)
}
