//! Structural validation rules
//!
//! A [`Rule`] is a named check over the request context. Rules never
//! depend on one another's outcomes: every rule of a chain runs on every
//! call, and a rule whose input is missing reports
//! [`RuleOutcome::NotApplicable`].
//!
//! Chains:
//! - [`presence`]: the selected block exists and parses
//! - [`reco`]: informal reconstructions (also the first part of logical ones)
//! - [`formal`]: formalizations and deductive validity
//! - [`argmap`]: argument maps
//! - [`arganno`]: XML annotations

use crate::context::RequestContext;
use crate::error::RuleError;
use crate::outcome::RuleOutcome;
use argcheck_artifact::{AnnotationDocument, Argument, ParsedGraph};
use argcheck_extract::Role;
use serde_json::json;
use std::borrow::Cow;
use std::sync::Arc;

pub mod arganno;
pub mod argmap;
pub mod formal;
pub mod presence;
pub mod reco;

/// What a rule body returns
pub type RuleResult = Result<RuleOutcome, RuleError>;

type CheckFn = dyn Fn(&RequestContext<'_>) -> RuleResult + Send + Sync;

/// A named check
#[derive(Clone)]
pub struct Rule {
    id: Cow<'static, str>,
    description: &'static str,
    check: Arc<CheckFn>,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl Rule {
    pub(crate) fn new<F>(id: impl Into<Cow<'static, str>>, description: &'static str, check: F) -> Self
    where
        F: Fn(&RequestContext<'_>) -> RuleResult + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            description,
            check: Arc::new(check),
        }
    }

    /// Rule id as reported in evaluations
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// What the rule checks
    #[inline]
    #[must_use]
    pub fn description(&self) -> &'static str {
        self.description
    }

    /// Run the rule body
    ///
    /// # Errors
    /// Returns the error the body raised
    pub fn check(&self, ctx: &RequestContext<'_>) -> RuleResult {
        (self.check)(ctx)
    }

    /// Run the rule, folding a body error into a failing outcome
    #[must_use]
    pub fn run(&self, ctx: &RequestContext<'_>) -> RuleOutcome {
        match self.check(ctx) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(rule = %self.id, error = %err, "rule body failed");
                let mut details = crate::outcome::Details::new();
                details.insert("reason".into(), json!(err.reason()));
                details.insert("error".into(), json!(err.to_string()));
                RuleOutcome::fail_with(format!("Rule could not be evaluated: {err}"), details)
            }
        }
    }
}

/// Run `f` on the parsed graph of `role`, or report not-applicable
pub(crate) fn on_graph<F>(ctx: &RequestContext<'_>, role: Role, f: F) -> RuleResult
where
    F: FnOnce(&ParsedGraph) -> RuleResult,
{
    match ctx.graph(role) {
        Some(graph) => f(&graph),
        None => Ok(RuleOutcome::NotApplicable),
    }
}

/// Run `f` on the parsed annotation of `role`, or report not-applicable
pub(crate) fn on_document<F>(ctx: &RequestContext<'_>, role: Role, f: F) -> RuleResult
where
    F: FnOnce(&AnnotationDocument) -> RuleResult,
{
    match ctx.document(role) {
        Some(doc) => f(&doc),
        None => Ok(RuleOutcome::NotApplicable),
    }
}

/// `<Label>` for labeled arguments, `argument #n` for generated labels
pub(crate) fn describe_argument(index: usize, argument: &Argument) -> String {
    if argument.unlabeled {
        format!("argument #{}", index + 1)
    } else {
        format!("<{}>", argument.label)
    }
}

/// `[Label]` for labeled propositions, `(n)` of its first PCS occurrence otherwise
pub(crate) fn describe_proposition(graph: &ParsedGraph, label: &str) -> String {
    let Some(prop) = graph.proposition(label) else {
        return format!("[{label}]");
    };
    if !prop.unlabeled {
        return format!("[{label}]");
    }
    let several = graph.arguments.len() > 1;
    graph
        .arguments
        .iter()
        .enumerate()
        .find_map(|(i, arg)| {
            let statement = arg.statements().find(|s| s.proposition == label)?;
            Some(if several {
                format!("({}) of {}", statement.label, describe_argument(i, arg))
            } else {
                format!("({})", statement.label)
            })
        })
        .unwrap_or_else(|| format!("[{label}]"))
}

/// Fail listing `items` after `prefix`, or pass when there are none
pub(crate) fn fail_listing(prefix: &str, items: &[String]) -> RuleOutcome {
    if items.is_empty() {
        RuleOutcome::Pass
    } else {
        RuleOutcome::fail(format!("{prefix}: {}.", items.join(", ")))
    }
}
