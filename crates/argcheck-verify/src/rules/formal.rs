//! Logical reconstruction rules
//!
//! Every PCS proposition carries a first-order formalization and symbol
//! declarations in its inline data:
//!
//! ```text
//! (1) All men are mortal. {formalization: "all x.(F(x) -> G(x))", declarations: {"F": "man", "G": "mortal"}}
//! ```
//!
//! The validity rules hand entailment queries to the request's
//! [`EntailmentSolver`](argcheck_logic::EntailmentSolver). A countermodel
//! or an undecided query fails the rule; the failure details carry
//! `reason` (`countermodel`, `timeout`, `unknown` or `formalization`) and
//! the countermodel under `witness`. A solver error on one query is an
//! `unknown` failure of that step; the other steps are still checked.

use super::reco::{from_refs, no_arg_inline_data, structure_rules, Arity};
use super::{describe_argument, describe_proposition, on_graph, Rule, RuleResult};
use crate::config::ResolvedConfig;
use crate::context::RequestContext;
use crate::outcome::{Details, RuleOutcome};
use argcheck_artifact::{Argument, Dialectic, NodeRef, ParsedGraph, Valence};
use argcheck_extract::Role;
use argcheck_logic::{
    check_consistency, check_entailment, parse_formula, Declarations, Formula, Signature, UnknownReason, Verdict,
};
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Logical chain: the informal structure rules, then the formal rules
#[must_use]
pub fn logical_rules(role: Role, arity: Arity) -> Vec<Rule> {
    let mut rules = structure_rules(role, arity);
    rules.push(no_arg_inline_data(role));
    rules.extend(formal_rules(role));
    rules
}

/// Rules on formalizations and deductive validity
#[must_use]
pub fn formal_rules(role: Role) -> Vec<Rule> {
    vec![
        has_formalizations(role),
        well_formed_declarations(role),
        deductively_valid_inferences(role),
        globally_valid(role),
        premises_consistent(role),
        all_premises_relevant(role),
        formally_grounded_relations(role),
    ]
}

/// Formulas and declarations read from a graph
struct Formalization<'g> {
    graph: &'g ParsedGraph,
    formulas: BTreeMap<&'g str, Formula>,
    formula_problems: Vec<String>,
    declarations: Declarations,
    declaration_problems: Vec<String>,
}

impl<'g> Formalization<'g> {
    fn read(graph: &'g ParsedGraph, config: &ResolvedConfig) -> Self {
        let mut this = Self {
            graph,
            formulas: BTreeMap::new(),
            formula_problems: Vec::new(),
            declarations: Declarations::new(),
            declaration_problems: Vec::new(),
        };
        let in_pcs = graph.pcs_propositions();
        let mut declared_by: Vec<(&'g str, Vec<String>)> = Vec::new();

        for prop in graph.propositions.iter().filter(|p| in_pcs.contains(p.label.as_str())) {
            let name = this.describe(&prop.label);
            match prop.data.get(&config.formalization_key) {
                None => this.formula_problems.push(format!(
                    "Proposition {name} lacks a '{}' entry in its inline data.",
                    config.formalization_key
                )),
                Some(Value::String(text)) => match parse_formula(text) {
                    Ok(formula) => {
                        this.formulas.insert(prop.label.as_str(), formula);
                    }
                    Err(err) => this.formula_problems.push(format!(
                        "Formalization of proposition {name} is not a well-formed first-order formula: {err}"
                    )),
                },
                Some(_) => this
                    .formula_problems
                    .push(format!("Formalization of proposition {name} is not a string.")),
            }

            let Some(value) = prop.data.get(&config.declarations_key) else {
                continue;
            };
            let entries = match value {
                Value::Object(map) if map.values().all(Value::is_string) => map,
                _ => {
                    this.declaration_problems.push(format!(
                        "'{}' of proposition {name} is not a mapping of symbols to readings.",
                        config.declarations_key
                    ));
                    continue;
                }
            };
            let mut own = Vec::new();
            for (symbol, reading) in entries {
                let reading = reading.as_str().unwrap_or_default();
                match this.declarations.get(symbol) {
                    Some(earlier) if earlier != reading => this.declaration_problems.push(format!(
                        "Duplicate declaration: symbol '{symbol}' of proposition {name} conflicts with the \
                         earlier declaration '{earlier}'."
                    )),
                    Some(_) => {}
                    None => {
                        this.declarations.insert(symbol.clone(), reading.to_string());
                    }
                }
                own.push(symbol.clone());
            }
            declared_by.push((prop.label.as_str(), own));
        }

        this.check_symbols(&declared_by);
        this
    }

    /// Declared symbols must be used where declared, used symbols declared somewhere
    fn check_symbols(&mut self, declared_by: &[(&'g str, Vec<String>)]) {
        let mut global = Signature::new();
        let mut problems = Vec::new();
        for (label, formula) in &self.formulas {
            let name = self.describe(label);
            let signature = match Signature::of(formula) {
                Ok(signature) => signature,
                Err(err) => {
                    problems.push(format!("In the formalization of proposition {name}: {err}."));
                    continue;
                }
            };
            for (symbol, _) in signature.symbols() {
                if !self.declarations.contains_key(symbol) {
                    problems.push(format!(
                        "Symbol '{symbol}' in the formalization of proposition {name} is not declared anywhere."
                    ));
                }
            }
            if let Some((_, own)) = declared_by.iter().find(|(l, _)| l == label) {
                for symbol in own.iter().filter(|s| signature.kind(s.as_str()).is_none()) {
                    problems.push(format!(
                        "Symbol '{symbol}' declared with proposition {name} is not used in its formalization '{formula}'."
                    ));
                }
            }
            if let Err(err) = global.merge(&signature) {
                problems.push(format!("Formalizations use symbols inconsistently: {err}."));
            }
        }
        self.declaration_problems.extend(problems);
    }

    fn describe(&self, label: &str) -> String {
        describe_proposition(self.graph, label)
    }

    /// Formula of the statement with PCS label `pcs_label` in `arg`
    fn statement_formula(&self, arg: &Argument, pcs_label: &str) -> Option<&Formula> {
        arg.statement(pcs_label)
            .and_then(|s| self.formulas.get(s.proposition.as_str()))
    }

    /// Formulas of all premises, `None` if one is missing
    fn premises(&self, arg: &Argument) -> Option<Vec<(String, Formula)>> {
        arg.premises()
            .map(|s| Some((s.label.clone(), self.formulas.get(s.proposition.as_str())?.clone())))
            .collect()
    }

    fn final_conclusion(&self, arg: &Argument) -> Option<(String, Formula)> {
        let conclusion = arg.final_conclusion()?;
        Some((
            conclusion.label.clone(),
            self.formulas.get(conclusion.proposition.as_str())?.clone(),
        ))
    }
}

/// Why a validity check failed
struct Failure {
    argument: String,
    conclusion: Option<String>,
    message: String,
    reason: &'static str,
    witness: Option<Value>,
}

impl Failure {
    fn formalization(argument: String, conclusion: Option<String>, message: String) -> Self {
        Self {
            argument,
            conclusion,
            message,
            reason: "formalization",
            witness: None,
        }
    }

    /// Failure for a non-unsat verdict, `None` when the query is proven
    fn from_verdict(verdict: Verdict, argument: String, conclusion: Option<String>, what: &str) -> Option<Self> {
        let (message, reason, witness) = match verdict {
            Verdict::Unsat => return None,
            Verdict::Sat(model) => (
                format!("{what} is refuted by a countermodel: {model}."),
                "countermodel",
                serde_json::to_value(&model).ok(),
            ),
            Verdict::Unknown(why) => {
                if why == UnknownReason::Timeout {
                    tracing::warn!(argument = %argument, "entailment query timed out");
                }
                let reason = if why == UnknownReason::Timeout { "timeout" } else { "unknown" };
                (format!("{what} could not be decided ({why})."), reason, None)
            }
        };
        Some(Self {
            argument,
            conclusion,
            message,
            reason,
            witness,
        })
    }

    fn step_details(&self) -> Value {
        let mut step = json!({
            "argument": self.argument,
            "conclusion": self.conclusion,
            "reason": self.reason,
        });
        if let (Some(witness), Some(map)) = (&self.witness, step.as_object_mut()) {
            map.insert("witness".into(), witness.clone());
        }
        step
    }
}

fn failures_outcome(failures: &[Failure]) -> RuleOutcome {
    let Some(first) = failures.first() else {
        return RuleOutcome::Pass;
    };
    let mut details = Details::new();
    details.insert("reason".into(), json!(first.reason));
    if let Some(witness) = &first.witness {
        details.insert("witness".into(), witness.clone());
    }
    if failures.len() > 1 {
        let steps: Vec<Value> = failures.iter().map(Failure::step_details).collect();
        details.insert("steps".into(), Value::Array(steps));
    }
    let message = failures.iter().map(|f| f.message.as_str()).collect::<Vec<_>>().join(" ");
    RuleOutcome::fail_with(message, details)
}

/// Run `f` on the formalization of the role's graph
fn on_formalization<F>(ctx: &RequestContext<'_>, role: Role, f: F) -> RuleResult
where
    F: FnOnce(&Formalization<'_>) -> RuleResult,
{
    on_graph(ctx, role, |graph| f(&Formalization::read(graph, ctx.config())))
}

/// Entailment verdict; a failing solver counts as undecided for this query only
fn entails(ctx: &RequestContext<'_>, formal: &Formalization<'_>, premises: &[Formula], conclusion: &Formula) -> Verdict {
    let timeout = ctx.config().solver_timeout;
    check_entailment(ctx.solver(), premises, conclusion, &formal.declarations, timeout).unwrap_or_else(|err| {
        tracing::warn!(solver = ctx.solver().name(), error = %err, "entailment query failed");
        Verdict::Unknown(UnknownReason::Other(format!("solver error: {err}")))
    })
}

fn has_formalizations(role: Role) -> Rule {
    Rule::new("HasFormalizations", "every PCS proposition has a well-formed formalization", move |ctx| {
        on_formalization(ctx, role, |formal| Ok(RuleOutcome::from_problems(formal.formula_problems.clone())))
    })
}

fn well_formed_declarations(role: Role) -> Rule {
    Rule::new("WellFormedDeclarations", "symbols are declared once and used where declared", move |ctx| {
        on_formalization(ctx, role, |formal| {
            Ok(RuleOutcome::from_problems(formal.declaration_problems.clone()))
        })
    })
}

fn deductively_valid_inferences(role: Role) -> Rule {
    Rule::new("DeductivelyValidInferences", "every inference step is deductively valid", move |ctx| {
        on_formalization(ctx, role, |formal| {
            let key = ctx.config().from_key.as_str();
            let mut failures = Vec::new();
            for (i, arg) in formal.graph.arguments.iter().enumerate() {
                let name = describe_argument(i, arg);
                for inference in arg.inferences() {
                    let Some(conclusion) = inference.conclusion else {
                        continue;
                    };
                    let what = format!("In {name}: the inference to conclusion ({})", conclusion.label);
                    let premises: Option<Vec<Formula>> = from_refs(inference.step, key)
                        .filter(|refs| !refs.is_empty())
                        .and_then(|refs| {
                            refs.iter()
                                .map(|r| formal.statement_formula(arg, r).cloned())
                                .collect()
                        });
                    let target = formal.statement_formula(arg, &conclusion.label);
                    let (Some(premises), Some(target)) = (premises, target) else {
                        failures.push(Failure::formalization(
                            name.clone(),
                            Some(conclusion.label.clone()),
                            format!("{what} cannot be checked: formalizations or inference data are missing."),
                        ));
                        continue;
                    };
                    let verdict = entails(ctx, formal, &premises, target);
                    failures.extend(Failure::from_verdict(
                        verdict,
                        name.clone(),
                        Some(conclusion.label.clone()),
                        &what,
                    ));
                }
            }
            Ok(failures_outcome(&failures))
        })
    })
}

fn globally_valid(role: Role) -> Rule {
    Rule::new("GloballyValid", "the premises entail the final conclusion", move |ctx| {
        on_formalization(ctx, role, |formal| {
            let mut failures = Vec::new();
            for (i, arg) in formal.graph.arguments.iter().enumerate() {
                if arg.pcs.is_empty() {
                    continue;
                }
                let name = describe_argument(i, arg);
                let (Some(premises), Some((label, conclusion))) = (formal.premises(arg), formal.final_conclusion(arg))
                else {
                    failures.push(Failure::formalization(
                        name.clone(),
                        None,
                        format!("In {name}: global validity cannot be checked: formalizations are missing."),
                    ));
                    continue;
                };
                let premises: Vec<Formula> = premises.into_iter().map(|(_, f)| f).collect();
                let verdict = entails(ctx, formal, &premises, &conclusion);
                failures.extend(Failure::from_verdict(
                    verdict,
                    name.clone(),
                    Some(label),
                    &format!("In {name}: the argument as a whole"),
                ));
            }
            Ok(failures_outcome(&failures))
        })
    })
}

fn premises_consistent(role: Role) -> Rule {
    Rule::new("PremisesConsistent", "the premises are jointly satisfiable", move |ctx| {
        on_formalization(ctx, role, |formal| {
            let mut problems = Vec::new();
            for (i, arg) in formal.graph.arguments.iter().enumerate() {
                let premises: Vec<Formula> = arg
                    .premises()
                    .filter_map(|s| formal.formulas.get(s.proposition.as_str()).cloned())
                    .collect();
                if premises.is_empty() {
                    continue;
                }
                let verdict = check_consistency(
                    ctx.solver(),
                    &premises,
                    &formal.declarations,
                    ctx.config().solver_timeout,
                )?;
                match verdict {
                    Verdict::Unsat => problems.push(format!(
                        "In {}: the premises are not logically consistent.",
                        describe_argument(i, arg)
                    )),
                    Verdict::Unknown(why) => {
                        tracing::debug!(argument = %arg.label, reason = %why, "premise consistency undecided");
                    }
                    Verdict::Sat(_) => {}
                }
            }
            Ok(RuleOutcome::from_problems(problems))
        })
    })
}

fn all_premises_relevant(role: Role) -> Rule {
    Rule::new("AllPremisesRelevant", "no premise is dispensable", move |ctx| {
        on_formalization(ctx, role, |formal| {
            let mut failures = Vec::new();
            for (i, arg) in formal.graph.arguments.iter().enumerate() {
                if arg.pcs.is_empty() {
                    continue;
                }
                let name = describe_argument(i, arg);
                let (Some(premises), Some((_, conclusion))) = (formal.premises(arg), formal.final_conclusion(arg))
                else {
                    failures.push(Failure::formalization(
                        name.clone(),
                        None,
                        format!("In {name}: premise relevance cannot be checked: formalizations are missing."),
                    ));
                    continue;
                };
                if premises.len() <= 1 {
                    continue;
                }
                for (skip, (label, _)) in premises.iter().enumerate() {
                    let rest: Vec<Formula> = premises
                        .iter()
                        .enumerate()
                        .filter(|(j, _)| *j != skip)
                        .map(|(_, (_, f))| f.clone())
                        .collect();
                    if entails(ctx, formal, &rest, &conclusion).is_unsat() {
                        failures.push(Failure {
                            argument: name.clone(),
                            conclusion: None,
                            message: format!(
                                "In {name}: premise ({label}) is not required to infer the final conclusion."
                            ),
                            reason: "irrelevant_premise",
                            witness: None,
                        });
                    }
                }
            }
            Ok(failures_outcome(&failures))
        })
    })
}

fn formally_grounded_relations(role: Role) -> Rule {
    Rule::new(
        "FormallyGroundedRelations",
        "sketched relations between formalized propositions follow from the formalizations",
        move |ctx| {
            on_formalization(ctx, role, |formal| {
                let mut failures = Vec::new();
                let mut checked = BTreeSet::new();
                for relation in &formal.graph.relations {
                    if !relation.dialectics.contains(&Dialectic::Sketched) {
                        continue;
                    }
                    let (NodeRef::Proposition(source), NodeRef::Proposition(target)) =
                        (&relation.source, &relation.target)
                    else {
                        continue;
                    };
                    let (Some(src), Some(tgt)) =
                        (formal.formulas.get(source.as_str()), formal.formulas.get(target.as_str()))
                    else {
                        continue;
                    };
                    if !checked.insert((source, target, relation.valence)) {
                        continue;
                    }
                    let (s, t) = (formal.describe(source), formal.describe(target));
                    let not_tgt = Formula::not(tgt.clone());
                    let queries: Vec<(Vec<Formula>, Formula, String)> = match relation.valence {
                        Valence::Support => vec![(
                            vec![src.clone()],
                            tgt.clone(),
                            format!("That {s} entails the supported proposition {t}"),
                        )],
                        Valence::Attack => vec![(
                            vec![src.clone()],
                            not_tgt,
                            format!("That {s} entails the negation of the attacked proposition {t}"),
                        )],
                        Valence::Contradict => vec![
                            (vec![src.clone()], not_tgt.clone(), format!("That {s} entails the negation of {t}")),
                            (vec![not_tgt], src.clone(), format!("That the negation of {t} entails {s}")),
                        ],
                    };
                    for (premises, conclusion, what) in queries {
                        let verdict = entails(ctx, formal, &premises, &conclusion);
                        let handle = format!("{s} {} {t}", relation.valence.verb());
                        failures.extend(Failure::from_verdict(verdict, handle, None, &what));
                    }
                }
                Ok(failures_outcome(&failures))
            })
        },
    )
}
