//! Identity, contradiction and indirect support between nodes

use crate::graph::{NodeRef, ParsedGraph, Proposition, Valence};

/// Textual patterns that mark one statement as the negation of another
pub const NEGATION_SCHEMES: [&str; 4] = ["NOT: ", "Not: ", "NOT ", "Not "];

/// Two propositions are identical if they share a label or a text
#[must_use]
pub fn are_identical(a: &Proposition, b: &Proposition) -> bool {
    a.label == b.label || a.texts.iter().any(|t| b.texts.contains(t))
}

/// Two distinct propositions contradict each other
///
/// Either the graph declares an attack or contradiction between them, or
/// one text is a negation-scheme rendering of the other.
#[must_use]
pub fn are_contradictory(a: &Proposition, b: &Proposition, graph: Option<&ParsedGraph>) -> bool {
    if a.label == b.label {
        return false;
    }
    if let Some(graph) = graph {
        let (na, nb) = (NodeRef::proposition(&a.label), NodeRef::proposition(&b.label));
        let declared = graph.relations.iter().any(|r| {
            matches!(r.valence, Valence::Attack | Valence::Contradict)
                && ((r.source == na && r.target == nb) || (r.source == nb && r.target == na))
        });
        if declared {
            return true;
        }
    }
    negates(a, b) || negates(b, a)
}

fn negates(a: &Proposition, b: &Proposition) -> bool {
    a.texts.iter().any(|text| {
        NEGATION_SCHEMES
            .iter()
            .any(|scheme| b.texts.iter().any(|t| t.strip_prefix(scheme) == Some(text.as_str())))
    })
}

fn valences(graph: &ParsedGraph, from: &NodeRef, to: &NodeRef) -> Vec<Valence> {
    graph.relations_between(from, to).map(|r| r.valence).collect()
}

fn is_negative(v: Valence) -> bool {
    matches!(v, Valence::Attack | Valence::Contradict)
}

/// `from` supports `to` directly or through one intermediate node
///
/// Two supports chain into support, as do two attacks.
#[must_use]
pub fn indirectly_supports(graph: &ParsedGraph, from: &NodeRef, to: &NodeRef) -> bool {
    if from == to {
        return true;
    }
    if valences(graph, from, to).contains(&Valence::Support) {
        return true;
    }
    graph.nodes().iter().filter(|n| *n != from && *n != to).any(|mid| {
        let first = valences(graph, from, mid);
        let second = valences(graph, mid, to);
        first.iter().any(|a| {
            second.iter().any(|b| {
                (*a == Valence::Support && *b == Valence::Support) || (is_negative(*a) && is_negative(*b))
            })
        })
    })
}

/// `from` attacks `to` directly or through one intermediate node
#[must_use]
pub fn indirectly_attacks(graph: &ParsedGraph, from: &NodeRef, to: &NodeRef) -> bool {
    if from == to {
        return false;
    }
    if valences(graph, from, to).into_iter().any(is_negative) {
        return true;
    }
    graph.nodes().iter().filter(|n| *n != from && *n != to).any(|mid| {
        let first = valences(graph, from, mid);
        let second = valences(graph, mid, to);
        first.iter().any(|a| {
            second.iter().any(|b| {
                (*a == Valence::Support && is_negative(*b)) || (is_negative(*a) && *b == Valence::Support)
            })
        })
    })
}
