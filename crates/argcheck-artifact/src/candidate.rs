//! Artifact candidates
//!
//! A candidate is one fenced block lifted out of the raw input, tagged with
//! its data type, its declared metadata and its position in the input.

use crate::hash::ContentHash;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Metadata declared for a candidate block, in declaration order
pub type Metadata = IndexMap<String, serde_json::Value>;

/// Data type of a candidate block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Argdown markup (argument maps and reconstructions)
    Argdown,
    /// XML markup (text annotations)
    Xml,
}

impl DataType {
    /// Stable lowercase name
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Argdown => "argdown",
            Self::Xml => "xml",
        }
    }

    /// Classify a fence marker (the first word of a code block info string)
    #[must_use]
    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker.trim().to_ascii_lowercase().as_str() {
            "argdown" => Some(Self::Argdown),
            "xml" => Some(Self::Xml),
            _ => None,
        }
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One typed block extracted from the raw input
///
/// # Invariants
/// - Immutable after construction
/// - `id` is derived from `dtype`, `position` and `raw_text` only, so the
///   same input always yields the same ids
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactCandidate {
    id: String,
    dtype: DataType,
    raw_text: String,
    metadata: Metadata,
    position: usize,
}

impl ArtifactCandidate {
    /// Create candidate (computes its id)
    #[must_use]
    pub fn new(
        position: usize,
        dtype: DataType,
        raw_text: impl Into<String>,
        metadata: Metadata,
    ) -> Self {
        let raw_text = raw_text.into();
        let hash = ContentHash::compute_parts(&[
            dtype.as_str().as_bytes(),
            &(position as u64).to_le_bytes(),
            raw_text.as_bytes(),
        ]);
        Self {
            id: format!("{}_{}", dtype.as_str(), hash.short()),
            dtype,
            raw_text,
            metadata,
            position,
        }
    }

    /// Stable candidate id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Data type
    #[inline]
    #[must_use]
    pub fn dtype(&self) -> DataType {
        self.dtype
    }

    /// Raw block text (without fences)
    #[inline]
    #[must_use]
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// Declared metadata
    #[inline]
    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Index of this block among all extracted blocks
    #[inline]
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Stringified metadata value
    ///
    /// Strings are returned verbatim, every other value as its JSON text.
    #[must_use]
    pub fn metadata_str(&self, key: &str) -> Option<String> {
        self.metadata.get(key).map(stringify_value)
    }
}

/// Render a metadata value the way filters compare it
#[must_use]
pub fn stringify_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn marker_classification() {
        assert_eq!(DataType::from_marker("argdown"), Some(DataType::Argdown));
        assert_eq!(DataType::from_marker("XML"), Some(DataType::Xml));
        assert_eq!(DataType::from_marker("rust"), None);
    }

    #[test]
    fn ids_are_stable_and_position_sensitive() {
        let a = ArtifactCandidate::new(0, DataType::Argdown, "[A]: a.", Metadata::new());
        let b = ArtifactCandidate::new(0, DataType::Argdown, "[A]: a.", Metadata::new());
        let c = ArtifactCandidate::new(1, DataType::Argdown, "[A]: a.", Metadata::new());
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
        assert!(a.id().starts_with("argdown_"));
    }

    #[test]
    fn metadata_stringification() {
        let mut meta = Metadata::new();
        meta.insert("filename".into(), json!("map.ad"));
        meta.insert("version".into(), json!(2));
        let cand = ArtifactCandidate::new(0, DataType::Xml, "<a/>", meta);
        assert_eq!(cand.metadata_str("filename").as_deref(), Some("map.ad"));
        assert_eq!(cand.metadata_str("version").as_deref(), Some("2"));
        assert_eq!(cand.metadata_str("missing"), None);
    }
}
