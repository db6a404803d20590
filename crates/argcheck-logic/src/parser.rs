//! Formula parser
//!
//! Reads formulas in NLTK's first-order syntax with nom.
//!
//! Precedence, loosest first: `<->`, `->` (right associative), `|`, `&`,
//! then negation and quantifiers. A quantifier body extends as far to the
//! right as possible, so `all x.F(x) -> G(x)` quantifies the conditional.

use crate::error::FormulaError;
use crate::formula::{Formula, Term};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, multispace0, multispace1},
    combinator::{all_consuming, not, opt, recognize, value},
    error::{context, convert_error, VerboseError, VerboseErrorKind},
    multi::{many0_count, separated_list1},
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};
use std::str::FromStr;

type Res<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

/// Deepest syntax tree and parenthesis nesting accepted
pub const MAX_FORMULA_DEPTH: usize = 128;

const TOO_DEEP: &str = "formula nesting limit";

/// Parsed formula with the height of its syntax tree
type Node = (Formula, usize);

/// Parse formula text
///
/// Identifiers in term position become variables when bound by an
/// enclosing quantifier and constants otherwise.
///
/// # Errors
/// Returns [`FormulaError::Syntax`] with nom's diagnostics, or
/// [`FormulaError::TooDeep`] past [`MAX_FORMULA_DEPTH`]
pub fn parse_formula(input: &str) -> Result<Formula, FormulaError> {
    match all_consuming(delimited(multispace0, |i| iff(i, 0), multispace0))(input) {
        Ok((_, (raw, _))) => Ok(bind(raw, &mut Vec::new())),
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) if hit_limit(&e) => {
            Err(FormulaError::TooDeep { limit: MAX_FORMULA_DEPTH })
        }
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => {
            Err(FormulaError::syntax(input, convert_error(input, e)))
        }
        Err(nom::Err::Incomplete(_)) => Err(FormulaError::syntax(input, "incomplete input")),
    }
}

impl FromStr for Formula {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_formula(s)
    }
}

#[derive(Clone, Copy)]
enum Quantifier {
    All,
    Exists,
}

fn hit_limit(e: &VerboseError<&str>) -> bool {
    e.errors
        .iter()
        .any(|(_, kind)| matches!(kind, VerboseErrorKind::Context(c) if *c == TOO_DEEP))
}

fn too_deep(i: &str) -> nom::Err<VerboseError<&str>> {
    nom::Err::Failure(VerboseError {
        errors: vec![(i, VerboseErrorKind::Context(TOO_DEEP))],
    })
}

/// One more level of parser recursion
fn nest(i: &str, depth: usize) -> Result<usize, nom::Err<VerboseError<&str>>> {
    if depth >= MAX_FORMULA_DEPTH {
        Err(too_deep(i))
    } else {
        Ok(depth + 1)
    }
}

fn join<'a>(i: &'a str, lhs: Node, rhs: Node, make: fn(Formula, Formula) -> Formula) -> Res<'a, Node> {
    let height = lhs.1.max(rhs.1) + 1;
    if height > MAX_FORMULA_DEPTH {
        return Err(too_deep(i));
    }
    Ok((i, (make(lhs.0, rhs.0), height)))
}

fn identifier(i: &str) -> Res<'_, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0_count(alt((alphanumeric1, tag("_")))),
    ))(i)
}

fn op<'a>(ascii: &'static str, unicode: &'static str) -> impl FnMut(&'a str) -> Res<'a, &'a str> {
    delimited(multispace0, alt((tag(ascii), tag(unicode))), multispace0)
}

/// Left-associative chain of `next` separated by `symbol`
fn chain<'a>(
    mut i: &'a str,
    depth: usize,
    symbol: (&'static str, &'static str),
    next: fn(&'a str, usize) -> Res<'a, Node>,
    make: fn(Formula, Formula) -> Formula,
) -> Res<'a, Node> {
    let (rest, mut acc) = next(i, depth)?;
    i = rest;
    while let (rest, Some(rhs)) = opt(preceded(op(symbol.0, symbol.1), |i| next(i, depth)))(i)? {
        (i, acc) = join(rest, acc, rhs, make)?;
    }
    Ok((i, acc))
}

fn iff(i: &str, depth: usize) -> Res<'_, Node> {
    chain(i, depth, ("<->", "↔"), implication, Formula::iff)
}

fn implication(i: &str, depth: usize) -> Res<'_, Node> {
    let (i, lhs) = disjunction(i, depth)?;
    match opt(op("->", "→"))(i)? {
        (i, Some(_)) => {
            let (i, rhs) = implication(i, nest(i, depth)?)?;
            join(i, lhs, rhs, Formula::implies)
        }
        (i, None) => Ok((i, lhs)),
    }
}

fn disjunction(i: &str, depth: usize) -> Res<'_, Node> {
    chain(i, depth, ("|", "∨"), conjunction, Formula::or)
}

fn conjunction(i: &str, depth: usize) -> Res<'_, Node> {
    chain(i, depth, ("&", "∧"), unary, Formula::and)
}

fn unary(i: &str, depth: usize) -> Res<'_, Node> {
    let (i, _) = multispace0(i)?;
    alt((
        |i| negation(i, depth),
        |i| quantified(i, depth),
        |i| primary(i, depth),
    ))(i)
}

fn negation(i: &str, depth: usize) -> Res<'_, Node> {
    let (i, _) = alt((terminated(tag("-"), not(char('>'))), tag("¬")))(i)?;
    let depth = nest(i, depth)?;
    let (i, (inner, height)) = unary(i, depth)?;
    if height >= MAX_FORMULA_DEPTH {
        return Err(too_deep(i));
    }
    Ok((i, (Formula::not(inner), height + 1)))
}

fn quantifier(i: &str) -> Res<'_, Quantifier> {
    terminated(
        alt((
            value(Quantifier::All, tag("forall")),
            value(Quantifier::All, tag("all")),
            value(Quantifier::Exists, tag("exists")),
            value(Quantifier::Exists, tag("exist")),
            value(Quantifier::Exists, tag("some")),
        )),
        multispace1,
    )(i)
}

fn quantified(i: &str, depth: usize) -> Res<'_, Node> {
    let (i, q) = quantifier(i)?;
    let (i, vars) = separated_list1(multispace1, identifier)(i)?;
    let (i, _) = preceded(multispace0, context("'.' after quantified variables", char('.')))(i)?;
    let depth = nest(i, depth)?;
    let (i, (body, height)) = iff(i, depth)?;
    let height = height + vars.len();
    if height > MAX_FORMULA_DEPTH {
        return Err(too_deep(i));
    }
    let formula = vars.into_iter().rev().fold(body, |acc, v| match q {
        Quantifier::All => Formula::Forall(v.to_string(), Box::new(acc)),
        Quantifier::Exists => Formula::Exists(v.to_string(), Box::new(acc)),
    });
    Ok((i, (formula, height)))
}

fn primary(i: &str, depth: usize) -> Res<'_, Node> {
    alt((|i| parenthesized(i, depth), leaf))(i)
}

fn parenthesized(i: &str, depth: usize) -> Res<'_, Node> {
    let (i, _) = char('(')(i)?;
    let depth = nest(i, depth)?;
    terminated(
        move |i| iff(i, depth),
        preceded(multispace0, context("closing parenthesis", char(')'))),
    )(i)
}

fn leaf(i: &str) -> Res<'_, Node> {
    let (i, formula) = alt((equality, atom))(i)?;
    Ok((i, (formula, 0)))
}

fn equality(i: &str) -> Res<'_, Formula> {
    let (i, lhs) = identifier(i)?;
    let (i, negated) = preceded(
        multispace0,
        alt((value(true, tag("!=")), value(false, tag("=")))),
    )(i)?;
    let (i, rhs) = preceded(multispace0, identifier)(i)?;
    let eq = Formula::Eq(Term::Const(lhs.to_string()), Term::Const(rhs.to_string()));
    Ok((i, if negated { Formula::not(eq) } else { eq }))
}

fn atom(i: &str) -> Res<'_, Formula> {
    let (i, name) = identifier(i)?;
    let (i, args) = opt(delimited(
        pair(multispace0, char('(')),
        separated_list1(delimited(multispace0, char(','), multispace0), identifier),
        preceded(multispace0, context("closing parenthesis", char(')'))),
    ))(i)?;
    let args = args
        .unwrap_or_default()
        .into_iter()
        .map(|a| Term::Const(a.to_string()))
        .collect();
    Ok((i, Formula::pred(name, args)))
}

/// Turn constants bound by a quantifier into variables
fn bind(formula: Formula, scope: &mut Vec<String>) -> Formula {
    let term = |t: Term, scope: &[String]| match t {
        Term::Const(name) if scope.contains(&name) => Term::Var(name),
        other => other,
    };
    match formula {
        Formula::Atom { predicate, args } => Formula::Atom {
            predicate,
            args: args.into_iter().map(|t| term(t, scope)).collect(),
        },
        Formula::Eq(a, b) => Formula::Eq(term(a, scope), term(b, scope)),
        Formula::Not(a) => Formula::not(bind(*a, scope)),
        Formula::And(a, b) => Formula::and(bind(*a, scope), bind(*b, scope)),
        Formula::Or(a, b) => Formula::or(bind(*a, scope), bind(*b, scope)),
        Formula::Implies(a, b) => Formula::implies(bind(*a, scope), bind(*b, scope)),
        Formula::Iff(a, b) => Formula::iff(bind(*a, scope), bind(*b, scope)),
        Formula::Forall(v, body) => {
            scope.push(v.clone());
            let body = bind(*body, scope);
            scope.pop();
            Formula::Forall(v, Box::new(body))
        }
        Formula::Exists(v, body) => {
            scope.push(v.clone());
            let body = bind(*body, scope);
            scope.pop();
            Formula::Exists(v, Box::new(body))
        }
        Formula::Bool(b) => Formula::Bool(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn var(n: &str) -> Term {
        Term::Var(n.into())
    }

    fn cst(n: &str) -> Term {
        Term::Const(n.into())
    }

    #[test]
    fn propositional_connectives() {
        let f = parse_formula("p & q -> r | -s").unwrap();
        assert_eq!(
            f,
            Formula::implies(
                Formula::and(Formula::prop("p"), Formula::prop("q")),
                Formula::or(Formula::prop("r"), Formula::not(Formula::prop("s"))),
            )
        );
    }

    #[test]
    fn implication_is_right_associative() {
        let f = parse_formula("p -> q -> r").unwrap();
        assert_eq!(
            f,
            Formula::implies(Formula::prop("p"), Formula::implies(Formula::prop("q"), Formula::prop("r")))
        );
    }

    #[test]
    fn unicode_aliases() {
        assert_eq!(
            parse_formula("¬P ∧ Q → R ↔ S").unwrap(),
            parse_formula("-P & Q -> R <-> S").unwrap()
        );
    }

    #[test]
    fn quantifier_binds_variables() {
        let f = parse_formula("all x.(F(x) -> G(x, a))").unwrap();
        assert_eq!(
            f,
            Formula::Forall(
                "x".into(),
                Box::new(Formula::implies(
                    Formula::pred("F", vec![var("x")]),
                    Formula::pred("G", vec![var("x"), cst("a")]),
                ))
            )
        );
    }

    #[test]
    fn quantifier_body_extends_right() {
        assert_eq!(
            parse_formula("all x.F(x) -> G(x)").unwrap(),
            parse_formula("all x.(F(x) -> G(x))").unwrap()
        );
    }

    #[test]
    fn several_variables_and_keywords() {
        let f = parse_formula("forall x y.(R(x,y) -> exist z.R(y,z))").unwrap();
        let Formula::Forall(x, body) = f else {
            panic!("expected universal");
        };
        assert_eq!(x, "x");
        assert!(matches!(*body, Formula::Forall(ref y, _) if y == "y"));
        assert!(parse_formula("some x.F(x)").unwrap().is_quantified());
    }

    #[test]
    fn equality_and_inequality() {
        assert_eq!(parse_formula("a = b").unwrap(), Formula::Eq(cst("a"), cst("b")));
        assert_eq!(
            parse_formula("exists x.(x != a)").unwrap(),
            Formula::Exists(
                "x".into(),
                Box::new(Formula::not(Formula::Eq(var("x"), cst("a"))))
            )
        );
    }

    #[test]
    fn free_identifiers_are_constants() {
        let f = parse_formula("F(x) & all x.G(x)").unwrap();
        assert_eq!(
            f,
            Formula::and(
                Formula::pred("F", vec![cst("x")]),
                Formula::Forall("x".into(), Box::new(Formula::pred("G", vec![var("x")]))),
            )
        );
    }

    #[test]
    fn keyword_prefixed_names_are_atoms() {
        assert_eq!(parse_formula("allergic(a)").unwrap(), Formula::pred("allergic", vec![cst("a")]));
    }

    #[test]
    fn malformed_formulas_are_errors() {
        for text in ["", "p &", "(p", "all x F(x)", "F(a,)", "p q"] {
            assert!(
                matches!(parse_formula(text), Err(FormulaError::Syntax { .. })),
                "{text} should not parse"
            );
        }
    }

    fn nested(open: &str, close: &str, depth: usize) -> String {
        format!("{}q{}", open.repeat(depth), close.repeat(depth))
    }

    #[test]
    fn deep_nesting_is_rejected() {
        for (open, close) in [("(", ")"), ("-", ""), ("all x.", ""), ("p -> ", "")] {
            assert!(parse_formula(&nested(open, close, 100)).is_ok(), "{open}");
            assert_eq!(
                parse_formula(&nested(open, close, 1000)),
                Err(FormulaError::TooDeep { limit: MAX_FORMULA_DEPTH }),
                "{open}"
            );
        }
    }

    #[test]
    fn long_chains_are_bounded() {
        let flat = vec!["p"; 2000].join(" & ");
        assert_eq!(parse_formula(&flat), Err(FormulaError::TooDeep { limit: MAX_FORMULA_DEPTH }));

        let grouped = vec!["(p & q)"; 100].join(" | ");
        assert!(parse_formula(&grouped).unwrap().depth() <= MAX_FORMULA_DEPTH);
    }

    fn arb_formula() -> impl Strategy<Value = Formula> {
        let name = prop::sample::select(vec!["a", "b", "c"]);
        let leaf = prop_oneof![
            prop::sample::select(vec!["p", "q", "r"]).prop_map(Formula::prop),
            (prop::sample::select(vec!["F", "G"]), name.clone())
                .prop_map(|(p, a)| Formula::pred(p, vec![Term::Const(a.into())])),
            (name.clone(), name).prop_map(|(a, b)| Formula::Eq(Term::Const(a.into()), Term::Const(b.into()))),
        ];
        leaf.prop_recursive(4, 24, 2, |inner| {
            prop_oneof![
                inner.clone().prop_map(Formula::not),
                (inner.clone(), inner.clone()).prop_map(|(a, b)| Formula::and(a, b)),
                (inner.clone(), inner.clone()).prop_map(|(a, b)| Formula::or(a, b)),
                (inner.clone(), inner.clone()).prop_map(|(a, b)| Formula::implies(a, b)),
                (inner.clone(), inner).prop_map(|(a, b)| Formula::iff(a, b)),
            ]
        })
    }

    proptest! {
        #[test]
        fn display_reparses_to_same_formula(f in arb_formula()) {
            prop_assert_eq!(parse_formula(&f.to_string()).unwrap(), f);
        }
    }
}
