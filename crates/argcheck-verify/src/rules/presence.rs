//! Block presence rules
//!
//! One rule per role: the role has a selected candidate and it parses. A
//! successful parse leaves the structure in the request cache for the
//! rest of the chain.

use super::Rule;
use crate::outcome::{Details, RuleOutcome};
use argcheck_extract::Role;
use serde_json::json;

/// Rule id of the presence rule for a role
#[must_use]
pub const fn rule_id(role: Role) -> &'static str {
    match role {
        Role::Arganno => "HasAnnotations",
        Role::Argmap => "HasArgumentMap",
        Role::Infreco => "HasInformalReconstruction",
        Role::Logreco => "HasLogicalReconstruction",
    }
}

pub(crate) const fn artifact_name(role: Role) -> &'static str {
    match role {
        Role::Arganno => "annotation",
        Role::Argmap => "argument map",
        Role::Infreco => "informal argument reconstruction",
        Role::Logreco => "logical argument reconstruction",
    }
}

/// Presence rule for a role
#[must_use]
pub fn rule(role: Role) -> Rule {
    Rule::new(rule_id(role), "selected block exists and parses", move |ctx| {
        let Some(candidate) = ctx.selected(role) else {
            return Ok(RuleOutcome::fail(format!(
                "No {} found: no {} block matches the filter for role '{role}'.",
                artifact_name(role),
                role.dtype(),
            )));
        };
        let error = match role {
            Role::Arganno => ctx.parse_document(role).and_then(Result::err),
            Role::Argmap | Role::Infreco | Role::Logreco => ctx.parse_graph(role).and_then(Result::err),
        };
        Ok(match error {
            None => RuleOutcome::Pass,
            Some(err) => {
                let mut details = Details::new();
                details.insert("candidate".into(), json!(candidate.id()));
                details.insert("error".into(), json!(err.to_string()));
                RuleOutcome::fail_with(format!("The {} could not be parsed: {err}", artifact_name(role)), details)
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolvedConfig;
    use crate::context::RequestContext;
    use argcheck_artifact::{ArtifactCandidate, DataType, Metadata};
    use argcheck_extract::{default_parsers, RoleFilter};
    use argcheck_logic::FiniteModelSolver;

    fn run(role: Role, candidates: &[ArtifactCandidate]) -> RuleOutcome {
        let config = ResolvedConfig::new().with_filter(RoleFilter::new(role));
        let parsers = default_parsers();
        let solver = FiniteModelSolver::new();
        let ctx = RequestContext::new(candidates, &config, &parsers, &solver);
        rule(role).run(&ctx)
    }

    #[test]
    fn absent_role_fails() {
        let outcome = run(Role::Infreco, &[]);
        assert!(outcome.message().unwrap().starts_with("No informal argument reconstruction found"));
    }

    #[test]
    fn parse_error_fails_with_parser_message() {
        let cand = ArtifactCandidate::new(0, DataType::Argdown, "[A]: a.\n<+ [B]: b.\n", Metadata::new());
        let outcome = run(Role::Argmap, &[cand]);
        assert!(outcome.message().unwrap().contains("syntax error on line 2"));
        assert!(outcome.details().unwrap().contains_key("candidate"));
    }

    #[test]
    fn well_formed_block_passes() {
        let cand = ArtifactCandidate::new(0, DataType::Xml, "<proposition id=\"1\">x</proposition>", Metadata::new());
        assert_eq!(run(Role::Arganno, &[cand]), RuleOutcome::Pass);
    }
}
