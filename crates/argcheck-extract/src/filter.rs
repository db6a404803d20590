//! Role filters and candidate selection
//!
//! A [`RoleFilter`] binds a semantic role to its data type and a set of
//! metadata rules. Selection picks the matching candidate that occurs last.

use crate::error::FilterError;
use argcheck_artifact::{stringify_value, ArtifactCandidate, DataType, Metadata};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Semantic purpose of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// XML annotation of the source text
    Arganno,
    /// Argument map
    Argmap,
    /// Informal reconstruction
    Infreco,
    /// Logical (formalized) reconstruction
    Logreco,
}

impl Role {
    /// All roles
    pub const ALL: [Role; 4] = [Self::Arganno, Self::Argmap, Self::Infreco, Self::Logreco];

    /// Stable lowercase name
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Arganno => "arganno",
            Self::Argmap => "argmap",
            Self::Infreco => "infreco",
            Self::Logreco => "logreco",
        }
    }

    /// Data type every candidate for this role must have
    #[inline]
    #[must_use]
    pub const fn dtype(&self) -> DataType {
        match self {
            Self::Arganno => DataType::Xml,
            Self::Argmap | Self::Infreco | Self::Logreco => DataType::Argdown,
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| FilterError::UnknownRole(s.to_string()))
    }
}

/// One metadata condition
#[derive(Debug, Clone)]
pub struct FilterRule {
    key: String,
    value: serde_json::Value,
    pattern: Option<Regex>,
}

impl FilterRule {
    /// Rule requiring `metadata[key] == value`
    #[must_use]
    pub fn exact(key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            pattern: None,
        }
    }

    /// Rule requiring `pattern` to occur in the stringified `metadata[key]`
    ///
    /// # Errors
    /// Returns error if the pattern does not compile
    pub fn regex(key: impl Into<String>, pattern: &str) -> Result<Self, FilterError> {
        let key = key.into();
        let compiled = Regex::new(pattern).map_err(|source| FilterError::InvalidRegex {
            key: key.clone(),
            source,
        })?;
        Ok(Self {
            key,
            value: serde_json::Value::String(pattern.to_string()),
            pattern: Some(compiled),
        })
    }

    /// Metadata key tested by this rule
    #[inline]
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether this is a regex rule
    #[inline]
    #[must_use]
    pub fn is_regex(&self) -> bool {
        self.pattern.is_some()
    }

    /// Test metadata; a missing key never matches
    #[must_use]
    pub fn matches(&self, metadata: &Metadata) -> bool {
        let Some(actual) = metadata.get(&self.key) else {
            return false;
        };
        match &self.pattern {
            Some(re) => re.is_match(&stringify_value(actual)),
            None => actual == &self.value,
        }
    }
}

/// Serialized form of a [`FilterRule`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterRuleSpec {
    /// Metadata key
    pub key: String,
    /// Expected value or pattern
    pub value: serde_json::Value,
    /// Treat `value` as a regex pattern
    #[serde(default)]
    pub regex: bool,
}

impl TryFrom<FilterRuleSpec> for FilterRule {
    type Error = FilterError;

    fn try_from(spec: FilterRuleSpec) -> Result<Self, Self::Error> {
        if spec.regex {
            Self::regex(spec.key, &stringify_value(&spec.value))
        } else {
            Ok(Self::exact(spec.key, spec.value))
        }
    }
}

/// AND-combination of rules, bound to a role
#[derive(Debug, Clone)]
pub struct RoleFilter {
    role: Role,
    rules: Vec<FilterRule>,
}

impl RoleFilter {
    /// Filter with no rules (matches every candidate of the role's type)
    #[inline]
    #[must_use]
    pub fn new(role: Role) -> Self {
        Self {
            role,
            rules: Vec::new(),
        }
    }

    /// Add rule
    #[must_use]
    pub fn with_rule(mut self, rule: FilterRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Build from serialized rules
    ///
    /// # Errors
    /// Returns error if a regex rule does not compile
    pub fn from_specs(role: Role, specs: Vec<FilterRuleSpec>) -> Result<Self, FilterError> {
        let rules = specs
            .into_iter()
            .map(FilterRule::try_from)
            .collect::<Result<_, _>>()?;
        Ok(Self { role, rules })
    }

    /// Role this filter selects for
    #[inline]
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Rules of this filter
    #[inline]
    #[must_use]
    pub fn rules(&self) -> &[FilterRule] {
        &self.rules
    }

    /// Candidate has the role's data type and satisfies every rule
    #[must_use]
    pub fn matches(&self, candidate: &ArtifactCandidate) -> bool {
        candidate.dtype() == self.role.dtype()
            && self.rules.iter().all(|r| r.matches(candidate.metadata()))
    }

    /// Matching candidate with the highest position
    #[must_use]
    pub fn select<'a>(&self, candidates: &'a [ArtifactCandidate]) -> Option<&'a ArtifactCandidate> {
        candidates
            .iter()
            .filter(|c| self.matches(c))
            .max_by_key(|c| c.position())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cand(position: usize, dtype: DataType, filename: Option<&str>) -> ArtifactCandidate {
        let mut meta = Metadata::new();
        if let Some(f) = filename {
            meta.insert("filename".into(), json!(f));
        }
        ArtifactCandidate::new(position, dtype, format!("block {position}"), meta)
    }

    #[test]
    fn role_parsing() {
        assert_eq!("argmap".parse::<Role>().unwrap(), Role::Argmap);
        assert!("argumap".parse::<Role>().is_err());
        assert_eq!(Role::Arganno.dtype(), DataType::Xml);
    }

    #[test]
    fn exact_rules_compare_values() {
        let rule = FilterRule::exact("version", 2);
        let mut meta = Metadata::new();
        meta.insert("version".into(), json!(2));
        assert!(rule.matches(&meta));
        meta.insert("version".into(), json!("2"));
        assert!(!rule.matches(&meta));
        assert!(!rule.matches(&Metadata::new()));
    }

    #[test]
    fn regex_rules_search_substrings() {
        let rule = FilterRule::regex("filename", "map").unwrap();
        let mut meta = Metadata::new();
        meta.insert("filename".into(), json!("argmap.ad"));
        assert!(rule.matches(&meta));
        assert!(FilterRule::regex("filename", "(").is_err());
    }

    #[test]
    fn last_match_wins() {
        let candidates = vec![
            cand(0, DataType::Argdown, Some("map.ad")),
            cand(1, DataType::Xml, Some("map.xml")),
            cand(2, DataType::Argdown, Some("map2.ad")),
            cand(3, DataType::Argdown, Some("reconstruction.ad")),
        ];
        let filter = RoleFilter::new(Role::Argmap).with_rule(FilterRule::regex("filename", "^map").unwrap());
        assert_eq!(filter.select(&candidates).map(ArtifactCandidate::position), Some(2));
        let any = RoleFilter::new(Role::Infreco);
        assert_eq!(any.select(&candidates).map(ArtifactCandidate::position), Some(3));
        let anno = RoleFilter::new(Role::Arganno);
        assert_eq!(anno.select(&candidates).map(ArtifactCandidate::position), Some(1));
    }

    #[test]
    fn spec_conversion() {
        let spec: FilterRuleSpec =
            serde_json::from_value(json!({"key": "filename", "value": "map.*", "regex": true})).unwrap();
        let rule = FilterRule::try_from(spec).unwrap();
        assert!(rule.is_regex());
        assert_eq!(rule.key(), "filename");
    }
}
