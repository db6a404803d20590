//! Static verifier registry
//!
//! A [`VerifierSpec`] names the roles a verifier reads, its rule chain in
//! declared order, its scorers and the option schema its configuration is
//! checked against.
//!
//! | Verifier | Roles | Coherence pairs |
//! |---|---|---|
//! | `arganno` | arganno | |
//! | `argmap` | argmap | |
//! | `infreco` | infreco | |
//! | `logreco` | logreco | |
//! | `arganno_argmap` | arganno, argmap | [`Pair::ArgannoArgmap`] |
//! | `arganno_infreco` | arganno, infreco | [`Pair::ArgannoInfreco`] |
//! | `arganno_logreco` | arganno, logreco | [`Pair::ArgannoLogreco`] |
//! | `argmap_infreco` | argmap, infreco | [`Pair::ArgmapInfreco`] |
//! | `argmap_logreco` | argmap, logreco | [`Pair::ArgmapLogreco`] |
//! | `arganno_argmap_logreco` | arganno, argmap, logreco | [`Pair::ArgannoArgmap`], [`Pair::ArgmapLogreco`] |

use crate::coherence::Pair;
use crate::config::{
    self, ConfigMap, ResolvedConfig, COVERAGE, DECLARATIONS_KEY, ENABLE_PREFIX, FILTERS, FORMALIZATION_KEY, FROM_KEY,
    LEVENSHTEIN_TOLERANCE, MIN_ARGUMENTS, SOLVER_TIMEOUT_MS,
};
use crate::error::ConfigResult;
use crate::rules::reco::{informal_rules, Arity, ANNOTATION_LINK_KEYS};
use crate::rules::{arganno, argmap, formal, presence, Rule};
use crate::scorers::{alignment, annotation, argmap as argmap_scores, reco as reco_scores, Scorer};
use argcheck_extract::{FilterRule, Role, RoleFilter};
use indexmap::IndexMap;
use once_cell::sync::Lazy;

/// One verifier: roles, rule chain, scorers and option schema
pub struct VerifierSpec {
    id: &'static str,
    roles: Vec<Role>,
    pairs: Vec<Pair>,
    rules: Vec<Rule>,
    scorers: Vec<Scorer>,
    default_filters: IndexMap<Role, RoleFilter>,
}

impl std::fmt::Debug for VerifierSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerifierSpec")
            .field("id", &self.id)
            .field("roles", &self.roles)
            .field("rules", &self.rules.len())
            .field("scorers", &self.scorers.len())
            .finish_non_exhaustive()
    }
}

impl VerifierSpec {
    fn build(id: &'static str, roles: &[Role], pairs: &[Pair]) -> Self {
        let with_map = roles.contains(&Role::Argmap);
        let with_annotation = roles.contains(&Role::Arganno);
        let arity = if with_map { Arity::AtLeastConfigured } else { Arity::Unique };

        let mut rules = Vec::new();
        let mut scorers = Vec::new();
        let mut default_filters = IndexMap::new();
        for &role in roles {
            rules.push(presence::rule(role));
            match role {
                Role::Arganno => {
                    rules.extend(arganno::arganno_rules(role));
                    scorers.extend(annotation::annotation_scorers(role));
                }
                Role::Argmap => {
                    rules.extend(argmap::argmap_rules(role));
                    scorers.extend(argmap_scores::argmap_scorers(role));
                }
                Role::Infreco => {
                    let allowed: &'static [&'static str] = if with_annotation { ANNOTATION_LINK_KEYS } else { &[] };
                    rules.extend(informal_rules(role, arity, allowed));
                    scorers.extend(reco_scores::reco_scorers(role));
                }
                Role::Logreco => {
                    rules.extend(formal::logical_rules(role, arity));
                    scorers.extend(reco_scores::reco_scorers(role));
                }
            }
            default_filters.insert(role, default_filter(role));
        }
        for &pair in pairs {
            rules.extend(pair.rules());
            scorers.push(alignment::fidelity_scorer(pair));
        }

        Self {
            id,
            roles: roles.to_vec(),
            pairs: pairs.to_vec(),
            rules,
            scorers,
            default_filters,
        }
    }

    /// Verifier id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &'static str {
        self.id
    }

    /// Roles the verifier reads, primary role first
    #[inline]
    #[must_use]
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// Coherence pairs checked after the structural chains
    #[inline]
    #[must_use]
    pub fn pairs(&self) -> &[Pair] {
        &self.pairs
    }

    /// Rules in declared order
    #[inline]
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Scorers in declared order
    #[inline]
    #[must_use]
    pub fn scorers(&self) -> &[Scorer] {
        &self.scorers
    }

    /// Rule ids in declared order
    #[must_use]
    pub fn rule_ids(&self) -> Vec<&str> {
        self.rules.iter().map(Rule::id).collect()
    }

    /// Scorer ids in declared order
    #[must_use]
    pub fn scorer_ids(&self) -> Vec<&str> {
        self.scorers.iter().map(Scorer::id).collect()
    }

    /// Whether several artifacts are checked together
    #[inline]
    #[must_use]
    pub fn is_multi_role(&self) -> bool {
        self.roles.len() > 1
    }

    /// Option keys the verifier accepts
    #[must_use]
    pub fn options(&self) -> Vec<String> {
        let has = |role| self.roles.contains(&role);
        let mut options = vec![FILTERS.to_string()];
        if has(Role::Infreco) || has(Role::Logreco) {
            options.push(FROM_KEY.to_string());
        }
        if has(Role::Logreco) {
            options.extend([FORMALIZATION_KEY, DECLARATIONS_KEY, SOLVER_TIMEOUT_MS].map(String::from));
        }
        if self.is_multi_role() {
            options.extend([LEVENSHTEIN_TOLERANCE, COVERAGE].map(String::from));
        }
        if has(Role::Argmap) && (has(Role::Infreco) || has(Role::Logreco)) {
            options.push(MIN_ARGUMENTS.to_string());
        }
        options.extend(self.scorers.iter().map(|s| format!("{ENABLE_PREFIX}{}", s.id())));
        options
    }

    /// Filter used for `role` when the configuration names none
    #[must_use]
    pub fn default_filter(&self, role: Role) -> RoleFilter {
        self.default_filters
            .get(&role)
            .cloned()
            .unwrap_or_else(|| RoleFilter::new(role))
    }

    /// Check `map` against the option schema and apply it over the defaults
    ///
    /// # Errors
    /// Returns [`ConfigError`](crate::ConfigError) for unknown options,
    /// roles or scorers, ill-typed values and invalid filters
    pub fn resolve(&self, map: &ConfigMap) -> ConfigResult<ResolvedConfig> {
        config::resolve(self, map)
    }
}

/// Maps and reconstructions are narrowed by file name; annotations are not
fn default_filter(role: Role) -> RoleFilter {
    let pattern = match role {
        Role::Argmap => "^map",
        Role::Infreco | Role::Logreco => "^reconstruction",
        Role::Arganno => return RoleFilter::new(role),
    };
    RoleFilter::new(role).with_rule(FilterRule::regex("filename", pattern).expect("valid default filter pattern"))
}

static REGISTRY: Lazy<IndexMap<&'static str, VerifierSpec>> = Lazy::new(|| {
    use Role::{Arganno, Argmap, Infreco, Logreco};
    [
        VerifierSpec::build("arganno", &[Arganno], &[]),
        VerifierSpec::build("argmap", &[Argmap], &[]),
        VerifierSpec::build("infreco", &[Infreco], &[]),
        VerifierSpec::build("logreco", &[Logreco], &[]),
        VerifierSpec::build("arganno_argmap", &[Arganno, Argmap], &[Pair::ArgannoArgmap]),
        VerifierSpec::build("arganno_infreco", &[Arganno, Infreco], &[Pair::ArgannoInfreco]),
        VerifierSpec::build("arganno_logreco", &[Arganno, Logreco], &[Pair::ArgannoLogreco]),
        VerifierSpec::build("argmap_infreco", &[Argmap, Infreco], &[Pair::ArgmapInfreco]),
        VerifierSpec::build("argmap_logreco", &[Argmap, Logreco], &[Pair::ArgmapLogreco]),
        VerifierSpec::build(
            "arganno_argmap_logreco",
            &[Arganno, Argmap, Logreco],
            &[Pair::ArgannoArgmap, Pair::ArgmapLogreco],
        ),
    ]
    .into_iter()
    .map(|spec| (spec.id, spec))
    .collect()
});

/// Look up a verifier by id
#[must_use]
pub fn verifier(id: &str) -> Option<&'static VerifierSpec> {
    REGISTRY.get(id)
}

/// All verifiers in registry order
pub fn verifiers() -> impl Iterator<Item = &'static VerifierSpec> {
    REGISTRY.values()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use argcheck_artifact::{ArtifactCandidate, DataType, Metadata};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn spec(id: &str) -> &'static VerifierSpec {
        verifier(id).unwrap_or_else(|| panic!("verifier {id} is registered"))
    }

    #[test]
    fn registry_lists_all_verifiers() {
        let ids: Vec<&str> = verifiers().map(VerifierSpec::id).collect();
        assert_eq!(
            ids,
            vec![
                "arganno",
                "argmap",
                "infreco",
                "logreco",
                "arganno_argmap",
                "arganno_infreco",
                "arganno_logreco",
                "argmap_infreco",
                "argmap_logreco",
                "arganno_argmap_logreco"
            ]
        );
        assert!(verifier("nope").is_none());
    }

    #[test]
    fn chains_start_with_presence() {
        assert_eq!(spec("infreco").rule_ids()[..3], ["HasInformalReconstruction", "HasArguments", "HasUniqueArgument"]);
        assert_eq!(spec("argmap").rule_ids(), vec!["HasArgumentMap", "CompleteClaims", "NoDuplicateLabels", "NoPCS"]);
        assert_eq!(spec("logreco").rule_ids().len(), 1 + 22);
        assert_eq!(spec("infreco").rule_ids().len(), 1 + 16);
    }

    #[test]
    fn maps_allow_several_arguments() {
        let ids = spec("argmap_infreco").rule_ids();
        assert!(ids.contains(&"HasAtLeastNArguments"));
        assert!(!ids.contains(&"HasUniqueArgument"));
        assert_eq!(ids.last(), Some(&"ArgmapInfreco.RelationConsistency"));
        assert!(spec("arganno_infreco").rule_ids().contains(&"HasUniqueArgument"));
    }

    #[test]
    fn triple_verifier_chains_both_pairs() {
        let s = spec("arganno_argmap_logreco");
        let ids = s.rule_ids();
        assert!(ids.contains(&"ArgannoArgmap.ArgumentLabelsResolve"));
        assert!(ids.contains(&"ArgmapLogreco.Coverage"));
        assert_eq!(
            s.scorer_ids()[s.scorer_ids().len() - 2..],
            ["arganno_argmap_alignment_fidelity", "argmap_logreco_alignment_fidelity"]
        );
    }

    #[test]
    fn option_schemas() {
        let infreco = spec("infreco").options();
        assert!(infreco.contains(&"from_key".to_string()));
        assert!(!infreco.contains(&"levenshtein_tolerance".to_string()));
        assert!(infreco.contains(&"enable_premises_count".to_string()));

        let logreco = spec("argmap_logreco").options();
        for key in ["solver_timeout_ms", "formalization_key", "min_arguments", "coverage"] {
            assert!(logreco.contains(&key.to_string()), "{key}");
        }
        assert!(!spec("arganno_infreco").options().contains(&"min_arguments".to_string()));
    }

    #[test]
    fn default_filters() {
        let mut map_meta = Metadata::new();
        map_meta.insert("filename".into(), json!("map.ad"));
        let map_block = ArtifactCandidate::new(0, DataType::Argdown, "[A]: a.", map_meta);
        let bare_block = ArtifactCandidate::new(1, DataType::Argdown, "[A]: a.", Metadata::new());

        for id in ["argmap", "argmap_infreco"] {
            let filter = spec(id).default_filter(Role::Argmap);
            assert!(filter.matches(&map_block), "{id}");
            assert!(!filter.matches(&bare_block), "{id}");
        }
        assert!(!spec("infreco").default_filter(Role::Infreco).matches(&map_block));
        assert!(!spec("logreco").default_filter(Role::Logreco).rules().is_empty());
        assert!(spec("arganno_argmap").default_filter(Role::Arganno).rules().is_empty());
    }

    #[test]
    fn resolve_rejects_foreign_options() {
        let err = spec("argmap").resolve(&ConfigMap::new().with("from_key", "premises")).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownOption { .. }), "{err}");

        let err = spec("argmap").resolve(&ConfigMap::new().with("enable_premises_count", false)).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownScorer { .. }), "{err}");

        let config = spec("argmap")
            .resolve(&ConfigMap::new().with("enable_argmap_size", false))
            .unwrap();
        assert!(!config.scorer_enabled("argmap_size"));
        assert!(config.scorer_enabled("argmap_density"));
        assert_eq!(config.filters.len(), 1);
    }
}
