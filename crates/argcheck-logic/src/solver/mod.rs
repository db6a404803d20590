//! Entailment checking
//!
//! Solvers answer one question: is a formula unsatisfiable? Entailment
//! `premises ⊨ conclusion` is asked as the unsatisfiability of
//! `premises ∧ ¬conclusion`, consistency as the satisfiability of the
//! premises.
//!
//! # Example
//!
//! ```rust
//! use argcheck_logic::{check_entailment, parse_formula, Declarations, FiniteModelSolver};
//! use std::time::Duration;
//!
//! let premises = [parse_formula("P").unwrap(), parse_formula("P -> Q").unwrap()];
//! let conclusion = parse_formula("Q").unwrap();
//! let verdict = check_entailment(
//!     &FiniteModelSolver::new(),
//!     &premises,
//!     &conclusion,
//!     &Declarations::new(),
//!     Duration::from_secs(1),
//! )
//! .unwrap();
//! assert!(verdict.is_unsat());
//! ```

use crate::error::SolverError;
use crate::formula::Formula;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

mod finite;

pub use finite::FiniteModelSolver;

/// Symbol declarations: formal symbol to natural-language reading
pub type Declarations = BTreeMap<String, String>;

/// Why a solver gave up
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownReason {
    /// Query deadline passed
    Timeout,
    /// Searched every domain size up to the bound without a complete result
    BoundExhausted,
    /// Grounded problem grew beyond the size limit
    ResourceLimit,
    /// Backend-specific reason
    Other(String),
}

impl UnknownReason {
    /// Short reason code
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Timeout => "timeout",
            Self::BoundExhausted => "bound",
            Self::ResourceLimit => "resource_limit",
            Self::Other(reason) => reason,
        }
    }
}

impl fmt::Display for UnknownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A finite interpretation satisfying the query
///
/// Domain elements are `0..domain_size`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Countermodel {
    /// Number of domain elements
    pub domain_size: usize,
    /// Constant interpretations
    pub constants: BTreeMap<String, usize>,
    /// Extensions of predicates of positive arity
    pub predicates: BTreeMap<String, Vec<Vec<usize>>>,
    /// Truth values of propositional atoms
    pub propositions: BTreeMap<String, bool>,
}

impl fmt::Display for Countermodel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "domain of {} element(s)", self.domain_size)?;
        for (name, value) in &self.constants {
            write!(f, "; {name} = {value}")?;
        }
        for (name, tuples) in &self.predicates {
            let tuples: Vec<String> = tuples
                .iter()
                .map(|t| {
                    let elems: Vec<String> = t.iter().map(ToString::to_string).collect();
                    format!("({})", elems.join(","))
                })
                .collect();
            write!(f, "; {name} = {{{}}}", tuples.join(", "))?;
        }
        for (name, value) in &self.propositions {
            write!(f, "; {name} = {value}")?;
        }
        Ok(())
    }
}

/// Answer to an unsatisfiability query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", content = "detail", rename_all = "snake_case")]
pub enum Verdict {
    /// No model exists
    Unsat,
    /// A model exists
    Sat(Countermodel),
    /// Solver could not decide
    Unknown(UnknownReason),
}

impl Verdict {
    /// Whether the query is proven unsatisfiable
    #[inline]
    #[must_use]
    pub fn is_unsat(&self) -> bool {
        matches!(self, Self::Unsat)
    }

    /// Whether a model was found
    #[inline]
    #[must_use]
    pub fn is_sat(&self) -> bool {
        matches!(self, Self::Sat(_))
    }

    /// The model, if one was found
    #[must_use]
    pub fn countermodel(&self) -> Option<&Countermodel> {
        match self {
            Self::Sat(model) => Some(model),
            _ => None,
        }
    }
}

/// Satisfiability backend
///
/// Implementations must honor `timeout` by answering
/// [`Verdict::Unknown`] with [`UnknownReason::Timeout`] instead of running
/// past it.
pub trait EntailmentSolver: Send + Sync {
    /// Decide whether `formula` is unsatisfiable
    ///
    /// # Errors
    /// Returns error when the formula cannot be handed to the backend
    fn check_unsat(
        &self,
        formula: &Formula,
        declarations: &Declarations,
        timeout: Duration,
    ) -> Result<Verdict, SolverError>;

    /// Solver name for diagnostics
    fn name(&self) -> &'static str {
        "solver"
    }
}

/// Whether the premises entail the conclusion
///
/// `Unsat` means the entailment holds; `Sat` carries a countermodel.
///
/// # Errors
/// Propagates solver errors
pub fn check_entailment(
    solver: &dyn EntailmentSolver,
    premises: &[Formula],
    conclusion: &Formula,
    declarations: &Declarations,
    timeout: Duration,
) -> Result<Verdict, SolverError> {
    let query = Formula::and(
        Formula::conjunction(premises.iter().cloned()),
        Formula::not(conclusion.clone()),
    );
    tracing::trace!(solver = solver.name(), %query, "entailment query");
    solver.check_unsat(&query, declarations, timeout)
}

/// Whether the premises are jointly satisfiable
///
/// `Unsat` means the premises are inconsistent.
///
/// # Errors
/// Propagates solver errors
pub fn check_consistency(
    solver: &dyn EntailmentSolver,
    premises: &[Formula],
    declarations: &Declarations,
    timeout: Duration,
) -> Result<Verdict, SolverError> {
    let query = Formula::conjunction(premises.iter().cloned());
    tracing::trace!(solver = solver.name(), %query, "consistency query");
    solver.check_unsat(&query, declarations, timeout)
}
