//! Bounded finite-model search
//!
//! Looks for a model over domains `1..=bound`. For each domain size the
//! constants are interpreted in canonical order (restricted growth, so
//! permuted interpretations are tried once), the quantifiers are grounded
//! over the domain and the resulting propositional formula goes through a
//! DPLL search with unit propagation.
//!
//! A failed search proves unsatisfiability only when the bound is complete
//! for the formula's fragment:
//!
//! - Bernays–Schönfinkel (no existential under a universal after pushing
//!   negations inward): constants plus existential quantifiers
//! - monadic without equality: `2^k` for `k` predicates
//!
//! Everything else is searched up to `max_domain_size` and reported as
//! [`UnknownReason::BoundExhausted`] when no model turns up.

use super::{Countermodel, Declarations, EntailmentSolver, UnknownReason, Verdict};
use crate::error::SolverError;
use crate::formula::{Formula, Signature, Term};
use crate::parser::MAX_FORMULA_DEPTH;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Default largest domain searched
const DEFAULT_MAX_DOMAIN_SIZE: usize = 8;

/// Default node budget for one grounded formula
const DEFAULT_MAX_GROUND_NODES: usize = 200_000;

/// Deepest query accepted; deeper queries are a resource limit
const MAX_QUERY_DEPTH: usize = 4 * MAX_FORMULA_DEPTH;

/// Most nested branching decisions in one search
const MAX_DECISIONS: usize = 1024;

/// Finite-model solver
#[derive(Debug, Clone, Copy)]
pub struct FiniteModelSolver {
    max_domain_size: usize,
    max_ground_nodes: usize,
}

impl Default for FiniteModelSolver {
    fn default() -> Self {
        Self {
            max_domain_size: DEFAULT_MAX_DOMAIN_SIZE,
            max_ground_nodes: DEFAULT_MAX_GROUND_NODES,
        }
    }
}

impl FiniteModelSolver {
    /// Create solver with default limits
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set largest domain searched
    #[must_use]
    pub fn with_max_domain_size(mut self, size: usize) -> Self {
        self.max_domain_size = size.max(1);
        self
    }

    /// Set node budget for one grounded formula
    #[must_use]
    pub fn with_max_ground_nodes(mut self, nodes: usize) -> Self {
        self.max_ground_nodes = nodes;
        self
    }

    /// Largest domain searched
    #[inline]
    #[must_use]
    pub fn max_domain_size(&self) -> usize {
        self.max_domain_size
    }
}

impl EntailmentSolver for FiniteModelSolver {
    fn check_unsat(
        &self,
        formula: &Formula,
        _declarations: &Declarations,
        timeout: Duration,
    ) -> Result<Verdict, SolverError> {
        let depth = formula.depth();
        if depth > MAX_QUERY_DEPTH {
            tracing::debug!(depth, "query nests too deeply");
            return Ok(Verdict::Unknown(UnknownReason::ResourceLimit));
        }
        let signature = Signature::of(formula)?;
        let complete = complete_bound(formula, &signature);
        let bound = complete
            .unwrap_or(self.max_domain_size)
            .min(self.max_domain_size)
            .max(1);
        let deadline = Deadline(Instant::now().checked_add(timeout));
        let constants: Vec<&str> = signature.constants().collect();

        for size in 1..=bound {
            tracing::trace!(size, bound, "searching models");
            let mut search = SizeSearch {
                formula,
                signature: &signature,
                assignment: vec![0; constants.len()],
                constants: &constants,
                size,
                deadline,
                max_nodes: self.max_ground_nodes,
            };
            match search.run() {
                Ok(Some(model)) => return Ok(Verdict::Sat(model)),
                Ok(None) => {}
                Err(Halt::Timeout) => {
                    tracing::warn!(?timeout, size, "model search timed out");
                    return Ok(Verdict::Unknown(UnknownReason::Timeout));
                }
                Err(Halt::Limit) => {
                    tracing::debug!(size, "grounded formula exceeds node budget");
                    return Ok(Verdict::Unknown(UnknownReason::ResourceLimit));
                }
                Err(Halt::Unbound(name)) => return Err(SolverError::UnboundVariable(name)),
            }
        }

        if complete.is_some_and(|b| b <= self.max_domain_size) {
            Ok(Verdict::Unsat)
        } else {
            Ok(Verdict::Unknown(UnknownReason::BoundExhausted))
        }
    }

    fn name(&self) -> &'static str {
        "finite-model"
    }
}

/// Domain size sufficient to find a model whenever one exists
fn complete_bound(formula: &Formula, signature: &Signature) -> Option<usize> {
    let constants = signature.constants().count();
    let herbrand = skolem_constants(formula, true, false).map(|n| (constants + n).max(1));
    let monadic = (!signature.has_equality() && signature.is_monadic())
        .then(|| signature.predicates().count())
        .filter(|k| *k < 16)
        .map(|k| 1usize << k);
    match (herbrand, monadic) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Existential quantifiers outside every universal, if none sits inside one
fn skolem_constants(formula: &Formula, positive: bool, under_forall: bool) -> Option<usize> {
    match formula {
        Formula::Bool(_) | Formula::Atom { .. } | Formula::Eq(..) => Some(0),
        Formula::Not(a) => skolem_constants(a, !positive, under_forall),
        Formula::And(a, b) | Formula::Or(a, b) => Some(
            skolem_constants(a, positive, under_forall)? + skolem_constants(b, positive, under_forall)?,
        ),
        Formula::Implies(a, b) => Some(
            skolem_constants(a, !positive, under_forall)? + skolem_constants(b, positive, under_forall)?,
        ),
        Formula::Iff(a, b) => {
            let mut n = 0;
            for polarity in [true, false] {
                n += skolem_constants(a, polarity, under_forall)?;
                n += skolem_constants(b, polarity, under_forall)?;
            }
            Some(n)
        }
        Formula::Forall(_, body) | Formula::Exists(_, body) => {
            let universal = matches!(formula, Formula::Forall(..)) == positive;
            if universal {
                skolem_constants(body, positive, true)
            } else if under_forall {
                None
            } else {
                Some(1 + skolem_constants(body, positive, false)?)
            }
        }
    }
}

enum Halt {
    Timeout,
    Limit,
    Unbound(String),
}

#[derive(Clone, Copy)]
struct Deadline(Option<Instant>);

impl Deadline {
    fn passed(self) -> bool {
        self.0.is_some_and(|d| Instant::now() >= d)
    }
}

/// Ground propositional formula over atom indices
#[derive(Debug, Clone, PartialEq)]
enum Prop {
    True,
    False,
    Var(usize),
    Not(Box<Prop>),
    And(Vec<Prop>),
    Or(Vec<Prop>),
}

impl Prop {
    fn negate(self) -> Self {
        match self {
            Self::True => Self::False,
            Self::False => Self::True,
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }

    fn all(parts: Vec<Self>) -> Self {
        let mut out = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                Self::True => {}
                Self::False => return Self::False,
                Self::And(inner) => out.extend(inner),
                other => out.push(other),
            }
        }
        match out.len() {
            0 => Self::True,
            1 => out.swap_remove(0),
            _ => Self::And(out),
        }
    }

    fn any(parts: Vec<Self>) -> Self {
        let mut out = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                Self::False => {}
                Self::True => return Self::True,
                Self::Or(inner) => out.extend(inner),
                other => out.push(other),
            }
        }
        match out.len() {
            0 => Self::False,
            1 => out.swap_remove(0),
            _ => Self::Or(out),
        }
    }

    fn substitute(&self, var: usize, value: bool) -> Self {
        match self {
            Self::Var(v) if *v == var => {
                if value {
                    Self::True
                } else {
                    Self::False
                }
            }
            Self::True | Self::False | Self::Var(_) => self.clone(),
            Self::Not(inner) => inner.substitute(var, value).negate(),
            Self::And(parts) => Self::all(parts.iter().map(|p| p.substitute(var, value)).collect()),
            Self::Or(parts) => Self::any(parts.iter().map(|p| p.substitute(var, value)).collect()),
        }
    }

    fn literal(&self) -> Option<(usize, bool)> {
        match self {
            Self::Var(v) => Some((*v, true)),
            Self::Not(inner) => match **inner {
                Self::Var(v) => Some((v, false)),
                _ => None,
            },
            _ => None,
        }
    }

    /// A literal every model must satisfy
    fn unit(&self) -> Option<(usize, bool)> {
        match self {
            Self::And(parts) => parts.iter().find_map(Self::literal),
            other => other.literal(),
        }
    }

    fn first_var(&self) -> Option<usize> {
        match self {
            Self::Var(v) => Some(*v),
            Self::Not(inner) => inner.first_var(),
            Self::And(parts) | Self::Or(parts) => parts.iter().find_map(Self::first_var),
            Self::True | Self::False => None,
        }
    }
}

struct Grounder<'f> {
    size: usize,
    constants: BTreeMap<&'f str, usize>,
    atoms: BTreeMap<(&'f str, Vec<usize>), usize>,
    scope: Vec<(&'f str, usize)>,
    budget: usize,
}

impl<'f> Grounder<'f> {
    fn term(&self, term: &'f Term) -> Result<usize, Halt> {
        let found = match term {
            Term::Var(name) => self
                .scope
                .iter()
                .rev()
                .find(|(n, _)| *n == name.as_str())
                .map(|(_, e)| *e),
            Term::Const(name) => self.constants.get(name.as_str()).copied(),
        };
        found.ok_or_else(|| Halt::Unbound(term.name().to_string()))
    }

    fn ground(&mut self, formula: &'f Formula) -> Result<Prop, Halt> {
        self.budget = self.budget.checked_sub(1).ok_or(Halt::Limit)?;
        let prop = match formula {
            Formula::Bool(true) => Prop::True,
            Formula::Bool(false) => Prop::False,
            Formula::Atom { predicate, args } => {
                let elems = args
                    .iter()
                    .map(|t| self.term(t))
                    .collect::<Result<Vec<_>, _>>()?;
                let next = self.atoms.len();
                Prop::Var(*self.atoms.entry((predicate.as_str(), elems)).or_insert(next))
            }
            Formula::Eq(a, b) => {
                if self.term(a)? == self.term(b)? {
                    Prop::True
                } else {
                    Prop::False
                }
            }
            Formula::Not(a) => self.ground(a)?.negate(),
            Formula::And(a, b) => Prop::all(vec![self.ground(a)?, self.ground(b)?]),
            Formula::Or(a, b) => Prop::any(vec![self.ground(a)?, self.ground(b)?]),
            Formula::Implies(a, b) => Prop::any(vec![self.ground(a)?.negate(), self.ground(b)?]),
            Formula::Iff(a, b) => {
                let (a, b) = (self.ground(a)?, self.ground(b)?);
                Prop::any(vec![
                    Prop::all(vec![a.clone(), b.clone()]),
                    Prop::all(vec![a.negate(), b.negate()]),
                ])
            }
            Formula::Forall(var, body) => Prop::all(self.instances(var, body)?),
            Formula::Exists(var, body) => Prop::any(self.instances(var, body)?),
        };
        Ok(prop)
    }

    fn instances(&mut self, var: &'f str, body: &'f Formula) -> Result<Vec<Prop>, Halt> {
        (0..self.size)
            .map(|elem| {
                self.scope.push((var, elem));
                let prop = self.ground(body);
                self.scope.pop();
                prop
            })
            .collect()
    }
}

/// Model search for one domain size
struct SizeSearch<'f> {
    formula: &'f Formula,
    signature: &'f Signature,
    constants: &'f [&'f str],
    assignment: Vec<usize>,
    size: usize,
    deadline: Deadline,
    max_nodes: usize,
}

impl<'f> SizeSearch<'f> {
    fn run(&mut self) -> Result<Option<Countermodel>, Halt> {
        self.enumerate(0, None)
    }

    fn enumerate(&mut self, slot: usize, max_used: Option<usize>) -> Result<Option<Countermodel>, Halt> {
        if slot == self.constants.len() {
            return self.try_assignment();
        }
        let limit = max_used.map_or(0, |m| m + 1).min(self.size - 1);
        for value in 0..=limit {
            self.assignment[slot] = value;
            let used = max_used.map_or(value, |m| m.max(value));
            if let Some(model) = self.enumerate(slot + 1, Some(used))? {
                return Ok(Some(model));
            }
        }
        Ok(None)
    }

    fn try_assignment(&self) -> Result<Option<Countermodel>, Halt> {
        if self.deadline.passed() {
            return Err(Halt::Timeout);
        }
        let mut grounder = Grounder {
            size: self.size,
            constants: self
                .constants
                .iter()
                .copied()
                .zip(self.assignment.iter().copied())
                .collect(),
            atoms: BTreeMap::new(),
            scope: Vec::new(),
            budget: self.max_nodes,
        };
        let prop = grounder.ground(self.formula)?;
        let mut values = vec![None; grounder.atoms.len()];
        if !dpll(prop, &mut values, self.deadline)? {
            return Ok(None);
        }
        Ok(Some(self.countermodel(&grounder, &values)))
    }

    fn countermodel(&self, grounder: &Grounder<'_>, values: &[Option<bool>]) -> Countermodel {
        let mut model = Countermodel {
            domain_size: self.size,
            constants: grounder
                .constants
                .iter()
                .map(|(name, elem)| ((*name).to_string(), *elem))
                .collect(),
            ..Countermodel::default()
        };
        for (name, _) in self.signature.predicates() {
            model.predicates.insert(name.to_string(), Vec::new());
        }
        for name in self.signature.propositions() {
            model.propositions.insert(name.to_string(), false);
        }
        for ((name, args), var) in &grounder.atoms {
            let holds = values.get(*var).copied().flatten().unwrap_or(false);
            if args.is_empty() {
                model.propositions.insert((*name).to_string(), holds);
            } else if holds {
                model
                    .predicates
                    .entry((*name).to_string())
                    .or_default()
                    .push(args.clone());
            }
        }
        model
    }
}

fn dpll(prop: Prop, values: &mut [Option<bool>], deadline: Deadline) -> Result<bool, Halt> {
    decide(prop, values, deadline, 0)
}

fn decide(mut prop: Prop, values: &mut [Option<bool>], deadline: Deadline, level: usize) -> Result<bool, Halt> {
    if level > MAX_DECISIONS {
        return Err(Halt::Limit);
    }
    let mut forced = Vec::new();
    loop {
        match prop {
            Prop::True => return Ok(true),
            Prop::False => {
                unassign(values, &forced);
                return Ok(false);
            }
            _ => {}
        }
        if deadline.passed() {
            return Err(Halt::Timeout);
        }
        let Some((var, value)) = prop.unit() else {
            break;
        };
        values[var] = Some(value);
        forced.push(var);
        prop = prop.substitute(var, value);
    }
    let Some(var) = prop.first_var() else {
        unassign(values, &forced);
        return Ok(false);
    };
    for value in [true, false] {
        values[var] = Some(value);
        if decide(prop.substitute(var, value), values, deadline, level + 1)? {
            return Ok(true);
        }
    }
    values[var] = None;
    unassign(values, &forced);
    Ok(false)
}

fn unassign(values: &mut [Option<bool>], vars: &[usize]) {
    for &var in vars {
        values[var] = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_formula;
    use crate::solver::{check_consistency, check_entailment};
    use pretty_assertions::assert_eq;

    fn f(text: &str) -> Formula {
        parse_formula(text).unwrap()
    }

    fn entails(premises: &[&str], conclusion: &str) -> Verdict {
        let premises: Vec<Formula> = premises.iter().map(|p| f(p)).collect();
        check_entailment(
            &FiniteModelSolver::new(),
            &premises,
            &f(conclusion),
            &Declarations::new(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn modus_ponens_is_valid() {
        assert_eq!(entails(&["P", "P -> Q"], "Q"), Verdict::Unsat);
    }

    #[test]
    fn wrong_conclusion_has_countermodel() {
        let verdict = entails(&["P", "P -> Q"], "-Q");
        let model = verdict.countermodel().unwrap();
        assert_eq!(model.propositions.get("P"), Some(&true));
        assert_eq!(model.propositions.get("Q"), Some(&true));
    }

    #[test]
    fn syllogism_is_valid() {
        assert!(entails(&["all x.(F(x) -> G(x))", "F(a)"], "G(a)").is_unsat());
    }

    #[test]
    fn affirming_the_consequent_is_invalid() {
        let verdict = entails(&["all x.(F(x) -> G(x))", "G(a)"], "F(a)");
        let model = verdict.countermodel().unwrap();
        assert_eq!(model.constants.get("a"), Some(&0));
        assert_eq!(model.predicates.get("G"), Some(&vec![vec![0]]));
        assert_eq!(model.predicates.get("F"), Some(&Vec::new()));
    }

    #[test]
    fn relational_universal_premises_are_decided() {
        assert!(entails(&["all x y.(R(x,y) -> R(y,x))", "R(a,b)"], "R(b,a)").is_unsat());
        assert!(entails(&["all x y.(R(x,y) -> R(y,x))", "R(a,b)"], "R(a,a)").is_sat());
    }

    #[test]
    fn equality_between_constants() {
        assert!(entails(&["a = b", "F(a)"], "F(b)").is_unsat());
        assert!(entails(&["F(a)"], "a = b").is_sat());
    }

    #[test]
    fn existential_conclusions() {
        assert!(entails(&["F(a)"], "exists x.F(x)").is_unsat());
        assert!(entails(&["exists x.F(x)"], "F(a)").is_sat());
    }

    #[test]
    fn alternating_quantifiers_without_model_are_unknown() {
        let solver = FiniteModelSolver::new().with_max_domain_size(3);
        let query = f("(all x.exists y.R(x,y)) & -R(a,a) & (all x y.(R(x,y) -> (x = a & y = a)))");
        let verdict = solver
            .check_unsat(&query, &Declarations::new(), Duration::from_secs(5))
            .unwrap();
        assert_eq!(verdict, Verdict::Unknown(UnknownReason::BoundExhausted));
    }

    #[test]
    fn alternating_quantifiers_with_model_are_sat() {
        let query = f("(all x.exists y.R(x,y)) & -(exists x.R(x,x))");
        let verdict = FiniteModelSolver::new()
            .check_unsat(&query, &Declarations::new(), Duration::from_secs(5))
            .unwrap();
        assert_eq!(verdict.countermodel().unwrap().domain_size, 2);
    }

    #[test]
    fn zero_timeout_is_unknown() {
        let verdict = FiniteModelSolver::new()
            .check_unsat(&f("P"), &Declarations::new(), Duration::ZERO)
            .unwrap();
        assert_eq!(verdict, Verdict::Unknown(UnknownReason::Timeout));
    }

    #[test]
    fn node_budget_is_enforced() {
        let solver = FiniteModelSolver::new().with_max_ground_nodes(3);
        let verdict = solver
            .check_unsat(&f("all x y z.(R(x,y) & R(y,z) -> R(x,z))"), &Declarations::new(), Duration::from_secs(5))
            .unwrap();
        assert_eq!(verdict, Verdict::Unknown(UnknownReason::ResourceLimit));
    }

    #[test]
    fn overly_deep_queries_are_a_resource_limit() {
        let mut query = Formula::prop("p");
        for _ in 0..=MAX_QUERY_DEPTH {
            query = Formula::not(query);
        }
        let verdict = FiniteModelSolver::new()
            .check_unsat(&query, &Declarations::new(), Duration::from_secs(5))
            .unwrap();
        assert_eq!(verdict, Verdict::Unknown(UnknownReason::ResourceLimit));
    }

    #[test]
    fn many_atoms_are_searched_without_deep_recursion() {
        let clauses = (0..800).map(|i| Formula::or(Formula::prop(format!("p{i}")), Formula::prop(format!("q{i}"))));
        let verdict = FiniteModelSolver::new()
            .check_unsat(&Formula::conjunction(clauses), &Declarations::new(), Duration::from_secs(30))
            .unwrap();
        assert!(verdict.is_sat());
    }

    #[test]
    fn inconsistent_premises() {
        let verdict = check_consistency(
            &FiniteModelSolver::new(),
            &[f("P"), f("P -> Q"), f("-Q")],
            &Declarations::new(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert!(verdict.is_unsat());
    }

    #[test]
    fn complete_bounds_by_fragment() {
        let bound = |text: &str| {
            let formula = f(text);
            complete_bound(&formula, &Signature::of(&formula).unwrap())
        };
        assert_eq!(bound("P & -P"), Some(1));
        assert_eq!(bound("R(a,b) & -R(b,c)"), Some(3));
        assert_eq!(bound("(all x.R(x,a)) & -(all x.R(a,x))"), Some(2));
        assert_eq!(bound("(all x.(F(x) | G(x))) & (exists x.H(x))"), Some(1));
        assert_eq!(bound("all x.exists y.R(x,y)"), None);
        assert_eq!(bound("all x.exists y.(F(x) -> G(y))"), Some(4));
    }
}
