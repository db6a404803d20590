//! argcheck logic layer
//!
//! First-order formulas as they appear in logical reconstructions, and the
//! solver interface used to check deductive validity.
//!
//! # Core Concepts
//!
//! - [`Formula`]: function-free first-order formula with equality
//! - [`parse_formula`]: NLTK-style syntax (`all x.(F(x) -> G(x))`, `-p & q`)
//! - [`Signature`]: constants, predicates and propositions a formula uses
//! - [`EntailmentSolver`]: `check_unsat` queries answered with a [`Verdict`]
//! - [`FiniteModelSolver`]: bounded model search shipped as the default backend
//!
//! # Example
//!
//! ```rust
//! use argcheck_logic::{parse_formula, Signature};
//!
//! let formula = parse_formula("all x.(Man(x) -> Mortal(x)) & Man(socrates)").unwrap();
//! let signature = Signature::of(&formula).unwrap();
//! assert_eq!(signature.constants().collect::<Vec<_>>(), vec!["socrates"]);
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

mod error;
mod formula;
mod parser;
mod solver;

pub use error::{FormulaError, SolverError};
pub use formula::{Formula, Signature, SymbolKind, Term};
pub use parser::{parse_formula, MAX_FORMULA_DEPTH};
pub use solver::{
    check_consistency, check_entailment, Countermodel, Declarations, EntailmentSolver,
    FiniteModelSolver, UnknownReason, Verdict,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
