//! Argument map scorers

use super::{ratio, Measurement, Scorer};
use crate::text::{distance_ratio, sentences};
use argcheck_artifact::ParsedGraph;
use argcheck_extract::Role;

/// Argument map scorers for a role
#[must_use]
pub fn argmap_scorers(role: Role) -> Vec<Scorer> {
    vec![size(role), density(role), faithfulness(role)]
}

fn size(role: Role) -> Scorer {
    Scorer::new("argmap_size", "number of nodes and edges", move |ctx| {
        let graph = ctx.graph(role)?;
        let (nodes, edges) = (graph.nodes().len(), graph.relations.len());
        if nodes == 0 {
            return None;
        }
        let n = nodes + edges;
        #[allow(clippy::cast_precision_loss)]
        let score = 1.0 - 1.0 / (1.0 + n as f64 / 10.0);
        Some(
            Measurement::new(score)
                .message(format!("The map has {nodes} nodes and {edges} edges."))
                .detail("nodes", nodes)
                .detail("edges", edges),
        )
    })
}

fn density(role: Role) -> Scorer {
    Scorer::new("argmap_density", "edges per node", move |ctx| {
        let graph = ctx.graph(role)?;
        let (nodes, edges) = (graph.nodes().len(), graph.relations.len());
        let score = ratio(edges, nodes)?;
        Some(
            Measurement::new(score)
                .detail("nodes", nodes)
                .detail("edges", edges),
        )
    })
}

/// Claim texts and first gists
fn node_texts(graph: &ParsedGraph) -> Vec<&str> {
    graph
        .propositions
        .iter()
        .filter_map(|p| p.text())
        .chain(graph.arguments.iter().filter_map(|a| a.gists.first().map(String::as_str)))
        .collect()
}

fn faithfulness(role: Role) -> Scorer {
    Scorer::new("argmap_faithfulness", "closeness of node texts to the source", move |ctx| {
        let source = ctx.source()?;
        let graph = ctx.graph(role)?;
        let sentences = sentences(source);
        let texts = node_texts(&graph);
        if sentences.is_empty() || texts.is_empty() {
            return None;
        }
        let distances: Vec<f64> = texts
            .iter()
            .map(|t| {
                sentences
                    .iter()
                    .map(|s| distance_ratio(t, s))
                    .fold(f64::INFINITY, f64::min)
            })
            .collect();
        #[allow(clippy::cast_precision_loss)]
        let mean = distances.iter().sum::<f64>() / distances.len() as f64;
        Some(
            Measurement::new(1.0 - mean)
                .message(format!("Node texts differ from the source by {mean:.2} on average."))
                .detail("mean_distance", mean)
                .detail("nodes", texts.len()),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;
    use pretty_assertions::assert_eq;

    const MAP: &str = "[Tax]: We should tax the rich.\n    <+ <Fair>: It is fair.\n    <- <Growth>: Growth slows.\n";

    fn harness() -> Harness {
        Harness::new().block(Role::Argmap, MAP)
    }

    #[test]
    fn size_and_density() {
        let scorers = argmap_scorers(Role::Argmap);
        let size = harness().score_id(&scorers, "argmap_size").unwrap();
        assert_eq!(size.details["nodes"], serde_json::json!(3));
        assert_eq!(size.details["edges"], serde_json::json!(2));
        assert!((size.score - (1.0 - 1.0 / 1.5)).abs() < 1e-9);

        let density = harness().score_id(&scorers, "argmap_density").unwrap();
        assert!((density.score - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn faithfulness_needs_a_source() {
        let scorers = argmap_scorers(Role::Argmap);
        assert_eq!(harness().score_id(&scorers, "argmap_faithfulness"), None);

        let verbatim = harness()
            .source("We should tax the rich. It is fair. Growth slows.")
            .score_id(&scorers, "argmap_faithfulness")
            .unwrap();
        assert_eq!(verbatim.score, 1.0);

        let loose = harness()
            .source("Taxes on wealth are needed. Nobody disagrees.")
            .score_id(&scorers, "argmap_faithfulness")
            .unwrap();
        assert!(loose.score < 0.7);
    }
}
