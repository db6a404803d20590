//! Parsed argument graphs
//!
//! The typed structure an Argdown block parses into: propositions,
//! arguments with their premise-conclusion structures (PCS), and the
//! dialectical relations between nodes.

use crate::dialectics;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

/// Inline YAML data attached to a proposition, argument or inference step
pub type InlineData = serde_json::Map<String, serde_json::Value>;

/// Polarity of a dialectical relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Valence {
    /// Source supports target
    Support,
    /// Source attacks target
    Attack,
    /// Source and target contradict each other
    Contradict,
}

impl Valence {
    /// Verb for messages, e.g. `supports`
    #[inline]
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Support => "supports",
            Self::Attack => "attacks",
            Self::Contradict => "contradicts",
        }
    }
}

/// How a relation came about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialectic {
    /// Declared explicitly in the markup
    Sketched,
    /// Derived from premise-conclusion structures
    Grounded,
}

/// Reference to a node of the graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "label", rename_all = "snake_case")]
pub enum NodeRef {
    /// A proposition, by label
    Proposition(String),
    /// An argument, by label
    Argument(String),
}

impl NodeRef {
    /// Proposition reference
    #[inline]
    #[must_use]
    pub fn proposition(label: impl Into<String>) -> Self {
        Self::Proposition(label.into())
    }

    /// Argument reference
    #[inline]
    #[must_use]
    pub fn argument(label: impl Into<String>) -> Self {
        Self::Argument(label.into())
    }

    /// Label of the referenced node
    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Proposition(l) | Self::Argument(l) => l,
        }
    }

    /// Whether the node is an argument
    #[inline]
    #[must_use]
    pub fn is_argument(&self) -> bool {
        matches!(self, Self::Argument(_))
    }
}

impl Display for NodeRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Proposition(l) => write!(f, "[{l}]"),
            Self::Argument(l) => write!(f, "<{l}>"),
        }
    }
}

/// A proposition (claim) node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposition {
    /// Label (generated when `unlabeled`)
    pub label: String,
    /// Distinct texts declared for this label, in order
    pub texts: Vec<String>,
    /// Inline data, merged across declarations
    pub data: InlineData,
    /// Whether the label was generated by the parser
    pub unlabeled: bool,
}

impl Proposition {
    /// Create labeled proposition without text
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            texts: Vec::new(),
            data: InlineData::new(),
            unlabeled: false,
        }
    }

    /// First declared text
    #[inline]
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.texts.first().map(String::as_str)
    }
}

/// A proposition occurring in a PCS
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PcsStatement {
    /// PCS label, e.g. `P1` in `(P1)`
    pub label: String,
    /// Label of the proposition stated here
    pub proposition: String,
}

/// An inference line in a PCS
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InferenceStep {
    /// Inline inference data (e.g. `{from: ["P1", "P2"]}`)
    pub data: InlineData,
}

/// One element of a premise-conclusion structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum PcsElement {
    /// A statement not preceded by an inference line
    Premise(PcsStatement),
    /// An inference line
    Inference(InferenceStep),
    /// A statement directly following an inference line
    Conclusion(PcsStatement),
}

impl PcsElement {
    /// Statement carried by this element, if any
    #[inline]
    #[must_use]
    pub fn statement(&self) -> Option<&PcsStatement> {
        match self {
            Self::Premise(s) | Self::Conclusion(s) => Some(s),
            Self::Inference(_) => None,
        }
    }
}

/// One inference step together with the conclusion it yields
#[derive(Debug, Clone, Copy)]
pub struct Inference<'a> {
    /// Index of the inference line in the PCS
    pub index: usize,
    /// The inference line
    pub step: &'a InferenceStep,
    /// Conclusion following the line, if well-formed
    pub conclusion: Option<&'a PcsStatement>,
}

/// An argument node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    /// Label (generated when `unlabeled`)
    pub label: String,
    /// Distinct gists declared for this label, in order
    pub gists: Vec<String>,
    /// Premise-conclusion structure, empty if not reconstructed
    pub pcs: Vec<PcsElement>,
    /// Inline data, merged across declarations
    pub data: InlineData,
    /// Whether the label was generated by the parser
    pub unlabeled: bool,
}

impl Argument {
    /// Create labeled argument without gist or PCS
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            gists: Vec::new(),
            pcs: Vec::new(),
            data: InlineData::new(),
            unlabeled: false,
        }
    }

    /// All statements of the PCS in order
    pub fn statements(&self) -> impl Iterator<Item = &PcsStatement> {
        self.pcs.iter().filter_map(PcsElement::statement)
    }

    /// Premises of the PCS
    pub fn premises(&self) -> impl Iterator<Item = &PcsStatement> {
        self.pcs.iter().filter_map(|e| match e {
            PcsElement::Premise(s) => Some(s),
            _ => None,
        })
    }

    /// Conclusions of the PCS (intermediate and final)
    pub fn conclusions(&self) -> impl Iterator<Item = &PcsStatement> {
        self.pcs.iter().filter_map(|e| match e {
            PcsElement::Conclusion(s) => Some(s),
            _ => None,
        })
    }

    /// Final conclusion, if the PCS ends with one
    #[must_use]
    pub fn final_conclusion(&self) -> Option<&PcsStatement> {
        match self.pcs.last() {
            Some(PcsElement::Conclusion(s)) => Some(s),
            _ => None,
        }
    }

    /// Inference steps with the conclusions they yield
    #[must_use]
    pub fn inferences(&self) -> Vec<Inference<'_>> {
        self.pcs
            .iter()
            .enumerate()
            .filter_map(|(index, e)| match e {
                PcsElement::Inference(step) => Some(Inference {
                    index,
                    step,
                    conclusion: match self.pcs.get(index + 1) {
                        Some(PcsElement::Conclusion(s)) => Some(s),
                        _ => None,
                    },
                }),
                _ => None,
            })
            .collect()
    }

    /// Statement with the given PCS label
    #[must_use]
    pub fn statement(&self, pcs_label: &str) -> Option<&PcsStatement> {
        self.statements().find(|s| s.label == pcs_label)
    }

    /// Index of the element carrying the given PCS label
    #[must_use]
    pub fn position_of(&self, pcs_label: &str) -> Option<usize> {
        self.pcs
            .iter()
            .position(|e| e.statement().is_some_and(|s| s.label == pcs_label))
    }

    /// Whether the argument states the given proposition anywhere in its PCS
    #[must_use]
    pub fn states(&self, proposition: &str) -> bool {
        self.statements().any(|s| s.proposition == proposition)
    }
}

/// A dialectical relation between two nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialecticalRelation {
    /// Source node
    pub source: NodeRef,
    /// Target node
    pub target: NodeRef,
    /// Polarity
    pub valence: Valence,
    /// Origins of this relation
    pub dialectics: BTreeSet<Dialectic>,
}

/// Parsed Argdown graph
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParsedGraph {
    /// Propositions in declaration order
    pub propositions: Vec<Proposition>,
    /// Arguments in declaration order
    pub arguments: Vec<Argument>,
    /// Relations in declaration order
    pub relations: Vec<DialecticalRelation>,
}

impl ParsedGraph {
    /// Create empty graph
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Proposition by label
    #[must_use]
    pub fn proposition(&self, label: &str) -> Option<&Proposition> {
        self.propositions.iter().find(|p| p.label == label)
    }

    /// Mutable proposition by label
    pub fn proposition_mut(&mut self, label: &str) -> Option<&mut Proposition> {
        self.propositions.iter_mut().find(|p| p.label == label)
    }

    /// Argument by label
    #[must_use]
    pub fn argument(&self, label: &str) -> Option<&Argument> {
        self.arguments.iter().find(|a| a.label == label)
    }

    /// Mutable argument by label
    pub fn argument_mut(&mut self, label: &str) -> Option<&mut Argument> {
        self.arguments.iter_mut().find(|a| a.label == label)
    }

    /// Whether the graph holds the referenced node
    #[must_use]
    pub fn contains(&self, node: &NodeRef) -> bool {
        match node {
            NodeRef::Proposition(l) => self.proposition(l).is_some(),
            NodeRef::Argument(l) => self.argument(l).is_some(),
        }
    }

    /// All nodes, propositions first
    #[must_use]
    pub fn nodes(&self) -> Vec<NodeRef> {
        self.propositions
            .iter()
            .map(|p| NodeRef::proposition(&p.label))
            .chain(self.arguments.iter().map(|a| NodeRef::argument(&a.label)))
            .collect()
    }

    /// Relations from `source` to `target`
    pub fn relations_between<'a, 'n>(
        &'a self,
        source: &'n NodeRef,
        target: &'n NodeRef,
    ) -> impl Iterator<Item = &'a DialecticalRelation> + 'n
    where
        'a: 'n,
    {
        self.relations
            .iter()
            .filter(move |r| &r.source == source && &r.target == target)
    }

    /// Add relation, merging dialectics into an existing equal edge
    pub fn add_relation(
        &mut self,
        source: NodeRef,
        target: NodeRef,
        valence: Valence,
        dialectic: Dialectic,
    ) {
        if let Some(existing) = self
            .relations
            .iter_mut()
            .find(|r| r.source == source && r.target == target && r.valence == valence)
        {
            existing.dialectics.insert(dialectic);
            return;
        }
        self.relations.push(DialecticalRelation {
            source,
            target,
            valence,
            dialectics: BTreeSet::from([dialectic]),
        });
    }

    /// Labels of propositions stated in some PCS
    #[must_use]
    pub fn pcs_propositions(&self) -> BTreeSet<&str> {
        self.arguments
            .iter()
            .flat_map(Argument::statements)
            .map(|s| s.proposition.as_str())
            .collect()
    }

    /// Derive grounded relations from the premise-conclusion structures
    ///
    /// Premises support their argument, an argument supports its final
    /// conclusion, and one argument supports (attacks) another when its
    /// conclusion is identical to (contradicts) a statement of the other.
    pub fn ground_relations(&mut self) {
        let mut derived = Vec::new();

        for arg in self.arguments.iter().filter(|a| !a.pcs.is_empty()) {
            let node = NodeRef::argument(&arg.label);
            for premise in arg.premises() {
                derived.push((NodeRef::proposition(&premise.proposition), node.clone(), Valence::Support));
            }
            if let Some(conclusion) = arg.final_conclusion() {
                derived.push((node.clone(), NodeRef::proposition(&conclusion.proposition), Valence::Support));
            }
        }

        for source in &self.arguments {
            let Some(conclusion) = source
                .final_conclusion()
                .and_then(|c| self.proposition(&c.proposition))
            else {
                continue;
            };
            for target in self.arguments.iter().filter(|t| t.label != source.label) {
                let statements: Vec<&Proposition> = target
                    .statements()
                    .filter_map(|s| self.proposition(&s.proposition))
                    .collect();
                let supports = target
                    .premises()
                    .filter_map(|s| self.proposition(&s.proposition))
                    .any(|p| dialectics::are_identical(conclusion, p));
                if supports {
                    derived.push((
                        NodeRef::argument(&source.label),
                        NodeRef::argument(&target.label),
                        Valence::Support,
                    ));
                }
                if statements
                    .iter()
                    .any(|p| dialectics::are_contradictory(conclusion, p, Some(self)))
                {
                    derived.push((
                        NodeRef::argument(&source.label),
                        NodeRef::argument(&target.label),
                        Valence::Attack,
                    ));
                }
            }
        }

        for (source, target, valence) in derived {
            self.add_relation(source, target, valence, Dialectic::Grounded);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stmt(label: &str, prop: &str) -> PcsStatement {
        PcsStatement {
            label: label.into(),
            proposition: prop.into(),
        }
    }

    fn sample() -> ParsedGraph {
        let mut g = ParsedGraph::new();
        for (label, text) in [("p", "P."), ("q", "Q."), ("r", "R.")] {
            let mut prop = Proposition::new(label);
            prop.texts.push(text.into());
            g.propositions.push(prop);
        }
        let mut a = Argument::new("A");
        a.pcs = vec![
            PcsElement::Premise(stmt("1", "p")),
            PcsElement::Inference(InferenceStep::default()),
            PcsElement::Conclusion(stmt("2", "q")),
        ];
        let mut b = Argument::new("B");
        b.pcs = vec![
            PcsElement::Premise(stmt("1", "q")),
            PcsElement::Inference(InferenceStep::default()),
            PcsElement::Conclusion(stmt("2", "r")),
        ];
        g.arguments.push(a);
        g.arguments.push(b);
        g
    }

    #[test]
    fn pcs_accessors() {
        let g = sample();
        let a = g.argument("A").unwrap();
        assert_eq!(a.premises().count(), 1);
        assert_eq!(a.final_conclusion().map(|c| c.label.as_str()), Some("2"));
        let inferences = a.inferences();
        assert_eq!(inferences.len(), 1);
        assert_eq!(inferences[0].conclusion.map(|c| c.proposition.as_str()), Some("q"));
        assert_eq!(a.position_of("2"), Some(2));
        assert!(a.states("p"));
    }

    #[test]
    fn grounding_links_chained_arguments() {
        let mut g = sample();
        g.ground_relations();
        let a = NodeRef::argument("A");
        let b = NodeRef::argument("B");
        let rel = g.relations_between(&a, &b).next().unwrap();
        assert_eq!(rel.valence, Valence::Support);
        assert!(rel.dialectics.contains(&Dialectic::Grounded));
        assert!(g
            .relations_between(&NodeRef::proposition("p"), &a)
            .any(|r| r.valence == Valence::Support));
        assert!(g.relations_between(&b, &a).next().is_none());
    }

    #[test]
    fn found_relations_outlive_the_query_nodes() {
        let mut g = ParsedGraph::default();
        g.add_relation(NodeRef::argument("A"), NodeRef::argument("B"), Valence::Attack, Dialectic::Sketched);
        let rel = g
            .relations_between(&NodeRef::argument("A"), &NodeRef::argument("B"))
            .next()
            .unwrap();
        assert_eq!(rel.valence, Valence::Attack);
    }

    #[test]
    fn add_relation_merges_dialectics() {
        let mut g = sample();
        let a = NodeRef::argument("A");
        let b = NodeRef::argument("B");
        g.add_relation(a.clone(), b.clone(), Valence::Support, Dialectic::Sketched);
        g.ground_relations();
        let rels: Vec<_> = g.relations_between(&a, &b).collect();
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].dialectics.len(), 2);
    }

    #[test]
    fn node_ref_display() {
        assert_eq!(NodeRef::proposition("C").to_string(), "[C]");
        assert_eq!(NodeRef::argument("A").to_string(), "<A>");
    }
}
