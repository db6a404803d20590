//! Argument map rules

use super::{fail_listing, on_graph, Rule};
use crate::text::shorten;
use argcheck_extract::Role;

/// Argument map chain
#[must_use]
pub fn argmap_rules(role: Role) -> Vec<Rule> {
    vec![complete_claims(role), no_duplicate_labels(role), no_pcs(role)]
}

fn complete_claims(role: Role) -> Rule {
    Rule::new("CompleteClaims", "every node is labeled", move |ctx| {
        on_graph(ctx, role, |graph| {
            let claims = graph.propositions.iter().filter(|p| p.unlabeled).map(|p| match p.text() {
                Some(text) if !text.is_empty() => shorten(text, 40),
                _ => "Empty claim".to_string(),
            });
            let arguments = graph
                .arguments
                .iter()
                .filter(|a| a.unlabeled)
                .map(|a| a.gists.first().map_or_else(|| "Untitled argument".to_string(), |g| shorten(g, 40)));
            let missing: Vec<String> = claims.chain(arguments).collect();
            Ok(fail_listing("Missing labels for nodes", &missing))
        })
    })
}

fn no_duplicate_labels(role: Role) -> Rule {
    Rule::new("NoDuplicateLabels", "labels name a single text or gist", move |ctx| {
        on_graph(ctx, role, |graph| {
            let duplicates: Vec<String> = graph
                .propositions
                .iter()
                .filter(|p| !p.unlabeled && p.texts.len() > 1)
                .map(|p| format!("[{}]", p.label))
                .chain(
                    graph
                        .arguments
                        .iter()
                        .filter(|a| !a.unlabeled && a.gists.len() > 1)
                        .map(|a| format!("<{}>", a.label)),
                )
                .collect();
            Ok(fail_listing("Duplicate labels", &duplicates))
        })
    })
}

fn no_pcs(role: Role) -> Rule {
    Rule::new("NoPCS", "map contains no premise-conclusion structures", move |ctx| {
        on_graph(ctx, role, |graph| {
            let reconstructed: Vec<String> = graph
                .arguments
                .iter()
                .filter(|a| !a.pcs.is_empty())
                .map(|a| if a.unlabeled { "<unlabeled argument>".to_string() } else { format!("<{}>", a.label) })
                .collect();
            Ok(fail_listing(
                "Found detailed reconstructions of individual arguments as premise-conclusion structures",
                &reconstructed,
            ))
        })
    })
}
