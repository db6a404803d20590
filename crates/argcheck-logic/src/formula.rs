//! First-order formulas
//!
//! Function-free first-order logic with equality. Zero-ary predicates are
//! propositional atoms. Terms are either variables bound by an enclosing
//! quantifier or constants.

use crate::error::FormulaError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Term in argument position
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum Term {
    /// Variable bound by a quantifier
    Var(String),
    /// Individual constant
    Const(String),
}

impl Term {
    /// Symbol name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Var(n) | Self::Const(n) => n,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A first-order formula
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Formula {
    /// Truth constant
    Bool(bool),
    /// Predicate applied to terms; no terms for a propositional atom
    Atom {
        /// Predicate or proposition symbol
        predicate: String,
        /// Arguments
        args: Vec<Term>,
    },
    /// Identity of two terms
    Eq(Term, Term),
    /// Negation
    Not(Box<Formula>),
    /// Conjunction
    And(Box<Formula>, Box<Formula>),
    /// Disjunction
    Or(Box<Formula>, Box<Formula>),
    /// Material conditional
    Implies(Box<Formula>, Box<Formula>),
    /// Biconditional
    Iff(Box<Formula>, Box<Formula>),
    /// Universal quantification
    Forall(String, Box<Formula>),
    /// Existential quantification
    Exists(String, Box<Formula>),
}

impl Formula {
    /// Propositional atom
    #[must_use]
    pub fn prop(name: impl Into<String>) -> Self {
        Self::Atom {
            predicate: name.into(),
            args: Vec::new(),
        }
    }

    /// Predicate application
    #[must_use]
    pub fn pred(name: impl Into<String>, args: Vec<Term>) -> Self {
        Self::Atom {
            predicate: name.into(),
            args,
        }
    }

    /// Negation of `f`
    #[must_use]
    pub fn not(f: Self) -> Self {
        Self::Not(Box::new(f))
    }

    /// Conjunction of `a` and `b`
    #[must_use]
    pub fn and(a: Self, b: Self) -> Self {
        Self::And(Box::new(a), Box::new(b))
    }

    /// Disjunction of `a` and `b`
    #[must_use]
    pub fn or(a: Self, b: Self) -> Self {
        Self::Or(Box::new(a), Box::new(b))
    }

    /// Conditional from `a` to `b`
    #[must_use]
    pub fn implies(a: Self, b: Self) -> Self {
        Self::Implies(Box::new(a), Box::new(b))
    }

    /// Biconditional of `a` and `b`
    #[must_use]
    pub fn iff(a: Self, b: Self) -> Self {
        Self::Iff(Box::new(a), Box::new(b))
    }

    /// Conjunction of all formulas; `true` when empty
    ///
    /// Conjuncts are paired up level by level, so the result is only
    /// logarithmically deeper than its deepest conjunct.
    #[must_use]
    pub fn conjunction(formulas: impl IntoIterator<Item = Self>) -> Self {
        let mut level: Vec<Self> = formulas.into_iter().collect();
        while level.len() > 1 {
            let mut next = Vec::with_capacity(level.len().div_ceil(2));
            let mut items = level.into_iter();
            while let Some(a) = items.next() {
                next.push(match items.next() {
                    Some(b) => Self::and(a, b),
                    None => a,
                });
            }
            level = next;
        }
        level.pop().unwrap_or(Self::Bool(true))
    }

    /// Height of the syntax tree; atoms have height 0
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 0)];
        while let Some((formula, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            match formula {
                Self::Bool(_) | Self::Atom { .. } | Self::Eq(..) => {}
                Self::Not(a) | Self::Forall(_, a) | Self::Exists(_, a) => stack.push((a, depth + 1)),
                Self::And(a, b) | Self::Or(a, b) | Self::Implies(a, b) | Self::Iff(a, b) => {
                    stack.push((a, depth + 1));
                    stack.push((b, depth + 1));
                }
            }
        }
        deepest
    }

    /// Whether the formula contains a quantifier
    #[must_use]
    pub fn is_quantified(&self) -> bool {
        match self {
            Self::Forall(..) | Self::Exists(..) => true,
            Self::Not(a) => a.is_quantified(),
            Self::And(a, b) | Self::Or(a, b) | Self::Implies(a, b) | Self::Iff(a, b) => {
                a.is_quantified() || b.is_quantified()
            }
            Self::Bool(_) | Self::Atom { .. } | Self::Eq(..) => false,
        }
    }
}

fn binary(f: &mut fmt::Formatter<'_>, a: &Formula, op: &str, b: &Formula) -> fmt::Result {
    write!(f, "({a} {op} {b})")
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(true) => f.write_str("true"),
            Self::Bool(false) => f.write_str("false"),
            Self::Atom { predicate, args } if args.is_empty() => f.write_str(predicate),
            Self::Atom { predicate, args } => {
                let args: Vec<&str> = args.iter().map(Term::name).collect();
                write!(f, "{predicate}({})", args.join(","))
            }
            Self::Eq(a, b) => write!(f, "({a} = {b})"),
            Self::Not(a) => write!(f, "-{a}"),
            Self::And(a, b) => binary(f, a, "&", b),
            Self::Or(a, b) => binary(f, a, "|", b),
            Self::Implies(a, b) => binary(f, a, "->", b),
            Self::Iff(a, b) => binary(f, a, "<->", b),
            Self::Forall(v, body) => write!(f, "all {v}.{body}"),
            Self::Exists(v, body) => write!(f, "exists {v}.{body}"),
        }
    }
}

/// Role of a non-logical symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    /// Individual constant
    Constant,
    /// Predicate of the given arity; arity 0 is a proposition
    Predicate(usize),
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant => f.write_str("constant"),
            Self::Predicate(0) => f.write_str("proposition"),
            Self::Predicate(n) => write!(f, "predicate of arity {n}"),
        }
    }
}

/// Non-logical vocabulary of one or more formulas
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Signature {
    symbols: BTreeMap<String, SymbolKind>,
    has_equality: bool,
    has_quantifiers: bool,
}

impl Signature {
    /// Create empty signature
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signature of a formula
    ///
    /// # Errors
    /// Returns error when a symbol is used with two different kinds
    pub fn of(formula: &Formula) -> Result<Self, FormulaError> {
        let mut sig = Self::new();
        sig.collect(formula)?;
        Ok(sig)
    }

    /// Add the symbols of `formula`
    ///
    /// # Errors
    /// Returns error when a symbol conflicts with an earlier use
    pub fn collect(&mut self, formula: &Formula) -> Result<(), FormulaError> {
        match formula {
            Formula::Bool(_) => Ok(()),
            Formula::Atom { predicate, args } => {
                self.add(predicate, SymbolKind::Predicate(args.len()))?;
                args.iter().try_for_each(|t| self.term(t))
            }
            Formula::Eq(a, b) => {
                self.has_equality = true;
                self.term(a)?;
                self.term(b)
            }
            Formula::Not(a) => self.collect(a),
            Formula::And(a, b) | Formula::Or(a, b) | Formula::Implies(a, b) | Formula::Iff(a, b) => {
                self.collect(a)?;
                self.collect(b)
            }
            Formula::Forall(_, body) | Formula::Exists(_, body) => {
                self.has_quantifiers = true;
                self.collect(body)
            }
        }
    }

    /// Merge another signature into this one
    ///
    /// # Errors
    /// Returns error when the signatures disagree on a symbol
    pub fn merge(&mut self, other: &Self) -> Result<(), FormulaError> {
        for (name, kind) in &other.symbols {
            self.add(name, *kind)?;
        }
        self.has_equality |= other.has_equality;
        self.has_quantifiers |= other.has_quantifiers;
        Ok(())
    }

    fn term(&mut self, term: &Term) -> Result<(), FormulaError> {
        match term {
            Term::Var(_) => Ok(()),
            Term::Const(name) => self.add(name, SymbolKind::Constant),
        }
    }

    fn add(&mut self, name: &str, kind: SymbolKind) -> Result<(), FormulaError> {
        match self.symbols.get(name) {
            Some(existing) if *existing != kind => Err(FormulaError::conflict(name, existing, kind)),
            Some(_) => Ok(()),
            None => {
                self.symbols.insert(name.to_string(), kind);
                Ok(())
            }
        }
    }

    /// Kind of a symbol
    #[must_use]
    pub fn kind(&self, name: &str) -> Option<SymbolKind> {
        self.symbols.get(name).copied()
    }

    /// All symbols with their kinds, sorted by name
    pub fn symbols(&self) -> impl Iterator<Item = (&str, SymbolKind)> {
        self.symbols.iter().map(|(n, k)| (n.as_str(), *k))
    }

    /// Individual constants
    pub fn constants(&self) -> impl Iterator<Item = &str> {
        self.symbols()
            .filter(|(_, k)| *k == SymbolKind::Constant)
            .map(|(n, _)| n)
    }

    /// Predicates of positive arity with their arity
    pub fn predicates(&self) -> impl Iterator<Item = (&str, usize)> {
        self.symbols().filter_map(|(n, k)| match k {
            SymbolKind::Predicate(arity) if arity > 0 => Some((n, arity)),
            _ => None,
        })
    }

    /// Propositional atoms
    pub fn propositions(&self) -> impl Iterator<Item = &str> {
        self.symbols()
            .filter(|(_, k)| *k == SymbolKind::Predicate(0))
            .map(|(n, _)| n)
    }

    /// Whether `=` occurs
    #[inline]
    #[must_use]
    pub fn has_equality(&self) -> bool {
        self.has_equality
    }

    /// Whether a quantifier occurs
    #[inline]
    #[must_use]
    pub fn has_quantifiers(&self) -> bool {
        self.has_quantifiers
    }

    /// Whether every predicate is at most unary
    #[must_use]
    pub fn is_monadic(&self) -> bool {
        self.predicates().all(|(_, arity)| arity == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn c(name: &str) -> Term {
        Term::Const(name.into())
    }

    #[test]
    fn display_uses_nltk_syntax() {
        let f = Formula::Forall(
            "x".into(),
            Box::new(Formula::implies(
                Formula::pred("F", vec![Term::Var("x".into())]),
                Formula::not(Formula::Eq(Term::Var("x".into()), c("a"))),
            )),
        );
        assert_eq!(f.to_string(), "all x.(F(x) -> -(x = a))");
    }

    #[test]
    fn conjunction_of_nothing_is_true() {
        assert_eq!(Formula::conjunction(Vec::new()), Formula::Bool(true));
        let f = Formula::conjunction([Formula::prop("p"), Formula::prop("q")]);
        assert_eq!(f.to_string(), "(p & q)");
    }

    #[test]
    fn conjunction_stays_shallow() {
        let f = Formula::conjunction((0..1000).map(|i| Formula::prop(format!("p{i}"))));
        assert_eq!(f.depth(), 10);
        let g = Formula::conjunction(["p", "q", "r", "s"].map(Formula::prop));
        assert_eq!(g.to_string(), "((p & q) & (r & s))");
        assert_eq!(Formula::not(Formula::prop("p")).depth(), 1);
    }

    #[test]
    fn signature_collects_symbols() {
        let f = Formula::and(
            Formula::pred("R", vec![c("a"), Term::Var("x".into())]),
            Formula::prop("p"),
        );
        let sig = Signature::of(&f).unwrap();
        assert_eq!(sig.constants().collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(sig.predicates().collect::<Vec<_>>(), vec![("R", 2)]);
        assert_eq!(sig.propositions().collect::<Vec<_>>(), vec!["p"]);
        assert!(!sig.is_monadic());
        assert!(!sig.has_equality());
    }

    #[test]
    fn signature_rejects_conflicting_uses() {
        let f = Formula::and(Formula::pred("F", vec![c("a")]), Formula::pred("F", vec![c("a"), c("b")]));
        assert!(matches!(Signature::of(&f), Err(FormulaError::SymbolConflict { .. })));

        let g = Formula::and(Formula::pred("F", vec![c("a")]), Formula::prop("a"));
        let err = Signature::of(&g).unwrap_err();
        assert_eq!(err, FormulaError::conflict("a", "constant", "proposition"));
    }

    #[test]
    fn merge_checks_conflicts() {
        let mut sig = Signature::of(&Formula::prop("p")).unwrap();
        let other = Signature::of(&Formula::pred("p", vec![c("a")])).unwrap();
        assert!(sig.merge(&other).is_err());
    }
}
