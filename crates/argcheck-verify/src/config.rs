//! Verifier configuration
//!
//! A [`ConfigMap`] is the raw option table a caller passes in (JSON text,
//! TOML text or a TOML file). [`VerifierSpec::resolve`] checks it against
//! the verifier's option schema and yields a [`ResolvedConfig`].
//!
//! # Options
//!
//! | Key | Verifiers | Default |
//! |---|---|---|
//! | `filters` | all | per verifier |
//! | `from_key` | with a reconstruction | `"from"` |
//! | `formalization_key`, `declarations_key` | with `logreco` | `"formalization"`, `"declarations"` |
//! | `solver_timeout_ms` | with `logreco` | `5000` |
//! | `levenshtein_tolerance`, `coverage` | multi-role | `0.1`, `"surjective"` |
//! | `min_arguments` | map paired with a reconstruction | `2` |
//! | `enable_<scorer_id>` | all | `true` |
//!
//! [`VerifierSpec::resolve`]: crate::VerifierSpec::resolve

use crate::error::{ConfigError, ConfigResult};
use crate::registry::VerifierSpec;
use argcheck_extract::{FilterError, FilterRuleSpec, Role, RoleFilter};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Option key for role filters
pub const FILTERS: &str = "filters";
/// Option key for the inference reference key
pub const FROM_KEY: &str = "from_key";
/// Option key for the formalization key
pub const FORMALIZATION_KEY: &str = "formalization_key";
/// Option key for the declarations key
pub const DECLARATIONS_KEY: &str = "declarations_key";
/// Option key for the text alignment tolerance
pub const LEVENSHTEIN_TOLERANCE: &str = "levenshtein_tolerance";
/// Option key for the coverage mode
pub const COVERAGE: &str = "coverage";
/// Option key for the minimal argument count
pub const MIN_ARGUMENTS: &str = "min_arguments";
/// Option key for the solver timeout
pub const SOLVER_TIMEOUT_MS: &str = "solver_timeout_ms";
/// Prefix of scorer switches
pub const ENABLE_PREFIX: &str = "enable_";

/// Raw option table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigMap(Map<String, Value>);

impl ConfigMap {
    /// Empty table (all defaults)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] if the text is not a JSON object
    pub fn from_json_str(text: &str) -> ConfigResult<Self> {
        let value: Value = serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::try_from(value)
    }

    /// Parse a TOML document
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] if the text is not valid TOML
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let value: Value = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::try_from(value)
    }

    /// Read a TOML file
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Parse`] if it is not valid TOML
    pub fn from_toml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Set an option
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Option value
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Options in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Whether no option is set
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for ConfigMap {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for ConfigMap {
    type Error = ConfigError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ConfigError::Parse(format!("expected a table, found {other}"))),
        }
    }
}

/// Which directions coherence coverage checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Coverage {
    /// Every element of the first artifact has a counterpart
    #[default]
    Surjective,
    /// Every element of both artifacts has a counterpart
    Bidirectional,
}

impl Coverage {
    /// Stable lowercase name
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Surjective => "surjective",
            Self::Bidirectional => "bidirectional",
        }
    }

    /// Whether the reverse direction is checked
    #[inline]
    #[must_use]
    pub fn is_bidirectional(&self) -> bool {
        matches!(self, Self::Bidirectional)
    }
}

impl Display for Coverage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Coverage {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "surjective" => Ok(Self::Surjective),
            "bidirectional" => Ok(Self::Bidirectional),
            other => Err(ConfigError::invalid_value(
                COVERAGE,
                "\"surjective\" or \"bidirectional\"",
                &Value::String(other.to_string()),
            )),
        }
    }
}

/// Configuration after validation against a verifier's schema
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Active filter per role of the verifier
    pub filters: IndexMap<Role, RoleFilter>,
    /// Inline data key listing an inference's premises
    pub from_key: String,
    /// Inline data key holding a proposition's formula
    pub formalization_key: String,
    /// Inline data key holding symbol declarations
    pub declarations_key: String,
    /// Maximal normalized edit distance of aligned texts
    pub levenshtein_tolerance: f64,
    /// Coherence coverage mode
    pub coverage: Coverage,
    /// Minimal argument count when a map is paired with a reconstruction
    pub min_arguments: usize,
    /// Per-query solver timeout
    pub solver_timeout: Duration,
    /// Scorers switched off with `enable_<id> = false`
    pub disabled_scorers: BTreeSet<String>,
}

impl ResolvedConfig {
    /// Create default configuration without filters
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With filter for a role
    #[must_use]
    pub fn with_filter(mut self, filter: RoleFilter) -> Self {
        self.filters.insert(filter.role(), filter);
        self
    }

    /// With alignment tolerance
    #[inline]
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.levenshtein_tolerance = tolerance;
        self
    }

    /// With coverage mode
    #[inline]
    #[must_use]
    pub fn with_coverage(mut self, coverage: Coverage) -> Self {
        self.coverage = coverage;
        self
    }

    /// With solver timeout
    #[inline]
    #[must_use]
    pub fn with_solver_timeout(mut self, timeout: Duration) -> Self {
        self.solver_timeout = timeout;
        self
    }

    /// Active filter for a role
    #[inline]
    #[must_use]
    pub fn filter(&self, role: Role) -> Option<&RoleFilter> {
        self.filters.get(&role)
    }

    /// Whether a scorer is enabled
    #[inline]
    #[must_use]
    pub fn scorer_enabled(&self, id: &str) -> bool {
        !self.disabled_scorers.contains(id)
    }
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            filters: IndexMap::new(),
            from_key: "from".into(),
            formalization_key: "formalization".into(),
            declarations_key: "declarations".into(),
            levenshtein_tolerance: 0.1,
            coverage: Coverage::Surjective,
            min_arguments: 2,
            solver_timeout: Duration::from_millis(5000),
            disabled_scorers: BTreeSet::new(),
        }
    }
}

/// Check `map` against the verifier's schema and apply it over the defaults
pub(crate) fn resolve(spec: &VerifierSpec, map: &ConfigMap) -> ConfigResult<ResolvedConfig> {
    let options = spec.options();
    let mut config = ResolvedConfig::default();
    let mut explicit: IndexMap<Role, RoleFilter> = IndexMap::new();

    for (key, value) in map.iter() {
        if !options.iter().any(|o| o == key) {
            if let Some(scorer) = key.strip_prefix(ENABLE_PREFIX) {
                return Err(ConfigError::UnknownScorer {
                    verifier: spec.id().to_string(),
                    scorer: scorer.to_string(),
                });
            }
            return Err(ConfigError::unknown_option(spec.id(), key.as_str()));
        }
        match key.as_str() {
            FILTERS => explicit = filters(spec, value)?,
            FROM_KEY => config.from_key = string(key, value)?,
            FORMALIZATION_KEY => config.formalization_key = string(key, value)?,
            DECLARATIONS_KEY => config.declarations_key = string(key, value)?,
            LEVENSHTEIN_TOLERANCE => {
                config.levenshtein_tolerance = value
                    .as_f64()
                    .filter(|t| (0.0..=1.0).contains(t))
                    .ok_or_else(|| ConfigError::invalid_value(key.as_str(), "a number in [0, 1]", value))?;
            }
            COVERAGE => config.coverage = string(key, value)?.parse()?,
            MIN_ARGUMENTS => {
                config.min_arguments = value
                    .as_u64()
                    .filter(|n| *n >= 1)
                    .and_then(|n| usize::try_from(n).ok())
                    .ok_or_else(|| ConfigError::invalid_value(key.as_str(), "a positive integer", value))?;
            }
            SOLVER_TIMEOUT_MS => {
                let ms = value
                    .as_u64()
                    .filter(|n| *n >= 1)
                    .ok_or_else(|| ConfigError::invalid_value(key.as_str(), "a positive integer", value))?;
                config.solver_timeout = Duration::from_millis(ms);
            }
            _ => {
                let scorer = key.trim_start_matches(ENABLE_PREFIX);
                let enabled = value
                    .as_bool()
                    .ok_or_else(|| ConfigError::invalid_value(key.as_str(), "a boolean", value))?;
                if !enabled {
                    config.disabled_scorers.insert(scorer.to_string());
                }
            }
        }
    }

    for role in spec.roles() {
        let filter = explicit
            .swap_remove(role)
            .unwrap_or_else(|| spec.default_filter(*role));
        config.filters.insert(*role, filter);
    }
    Ok(config)
}

fn string(key: &str, value: &Value) -> ConfigResult<String> {
    value
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ConfigError::invalid_value(key, "a non-empty string", value))
}

/// `filters: {role: rule | [rule]}`
fn filters(spec: &VerifierSpec, value: &Value) -> ConfigResult<IndexMap<Role, RoleFilter>> {
    let Value::Object(entries) = value else {
        return Err(ConfigError::invalid_value(FILTERS, "a table of role filters", value));
    };
    let mut out = IndexMap::new();
    for (name, rules) in entries {
        let role: Role = name.parse().map_err(|e| match e {
            FilterError::UnknownRole(r) => ConfigError::UnknownRole(r),
            other => ConfigError::Parse(other.to_string()),
        })?;
        if !spec.roles().contains(&role) {
            return Err(ConfigError::RoleNotAllowed {
                verifier: spec.id().to_string(),
                role,
            });
        }
        let rules = match rules {
            Value::Array(items) => items.clone(),
            Value::Object(_) => vec![rules.clone()],
            other => {
                return Err(ConfigError::InvalidFilter {
                    role,
                    source: FilterError::InvalidSpec(format!("expected a rule or a list of rules, found {other}")),
                })
            }
        };
        let specs = rules
            .into_iter()
            .map(serde_json::from_value::<FilterRuleSpec>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ConfigError::InvalidFilter {
                role,
                source: FilterError::InvalidSpec(e.to_string()),
            })?;
        let filter =
            RoleFilter::from_specs(role, specs).map_err(|source| ConfigError::InvalidFilter { role, source })?;
        out.insert(role, filter);
    }
    Ok(out)
}
