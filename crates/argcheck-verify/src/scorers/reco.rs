//! Reconstruction scorers

use super::{saturating, Measurement, Scorer};
use argcheck_artifact::Argument;
use argcheck_extract::Role;

/// Reconstruction scorers for a role
#[must_use]
pub fn reco_scorers(role: Role) -> Vec<Scorer> {
    vec![premises_count(role), intermediate_conclusions(role)]
}

fn premises_count(role: Role) -> Scorer {
    Scorer::new("premises_count", "number of premises", move |ctx| {
        let graph = ctx.graph(role)?;
        let reconstructed: Vec<&Argument> = graph.arguments.iter().filter(|a| !a.pcs.is_empty()).collect();
        if reconstructed.is_empty() {
            return None;
        }
        let n: usize = reconstructed.iter().map(|a| a.premises().count()).sum();
        Some(
            Measurement::new(saturating(n))
                .message(format!("The reconstruction has {n} premises."))
                .detail("premises_count", n),
        )
    })
}

fn intermediate_conclusions(role: Role) -> Scorer {
    Scorer::new("intermediate_conclusions", "number of intermediate conclusions", move |ctx| {
        let graph = ctx.graph(role)?;
        let reconstructed: Vec<&Argument> = graph.arguments.iter().filter(|a| !a.pcs.is_empty()).collect();
        if reconstructed.is_empty() {
            return None;
        }
        let n: usize = reconstructed
            .iter()
            .map(|a| a.conclusions().count().saturating_sub(1))
            .sum();
        Some(
            Measurement::new(saturating(n))
                .message(format!("The reconstruction has {n} intermediate conclusions."))
                .detail("intermediate_conclusions", n),
        )
    })
}
