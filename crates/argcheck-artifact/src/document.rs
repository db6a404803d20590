//! Parsed annotation documents
//!
//! An XML annotation block marks spans of a source text with
//! `<proposition>` elements. The parsed form keeps the markup-free text
//! and every element as a span into it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Tag name of annotated propositions
pub const PROPOSITION_TAG: &str = "proposition";

/// One element of an annotation document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationSpan {
    /// Element index in document order
    pub index: usize,
    /// Tag name
    pub tag: String,
    /// Attributes in declaration order
    pub attributes: IndexMap<String, String>,
    /// Byte offset of the span start in [`AnnotationDocument::text`]
    pub start: usize,
    /// Byte offset of the span end in [`AnnotationDocument::text`]
    pub end: usize,
    /// Text covered by the span
    pub text: String,
    /// Index of the enclosing element
    pub parent: Option<usize>,
}

impl AnnotationSpan {
    /// Attribute value
    #[inline]
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// The `id` attribute
    #[inline]
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.attribute("id")
    }

    /// Ids listed in the `supports` attribute
    #[must_use]
    pub fn supports(&self) -> Vec<&str> {
        self.attribute("supports")
            .map(|v| v.split_whitespace().collect())
            .unwrap_or_default()
    }

    /// Ids listed in the `attacks` attribute
    #[must_use]
    pub fn attacks(&self) -> Vec<&str> {
        self.attribute("attacks")
            .map(|v| v.split_whitespace().collect())
            .unwrap_or_default()
    }

    /// The `argument_label` attribute
    #[inline]
    #[must_use]
    pub fn argument_label(&self) -> Option<&str> {
        self.attribute("argument_label")
    }

    /// The `ref_reco_label` attribute
    #[inline]
    #[must_use]
    pub fn ref_reco_label(&self) -> Option<&str> {
        self.attribute("ref_reco_label")
    }

    /// Whether this is a `<proposition>` element
    #[inline]
    #[must_use]
    pub fn is_proposition(&self) -> bool {
        self.tag == PROPOSITION_TAG
    }

    /// Human-readable handle for messages
    #[must_use]
    pub fn describe(&self) -> String {
        match self.id() {
            Some(id) => format!("'{id}'"),
            None => format!("#{} (\"{}\")", self.index + 1, self.text),
        }
    }
}

/// Parsed annotation document
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnnotationDocument {
    /// Text with all markup removed
    pub text: String,
    /// Elements in document order
    pub spans: Vec<AnnotationSpan>,
}

impl AnnotationDocument {
    /// All `<proposition>` elements
    pub fn propositions(&self) -> impl Iterator<Item = &AnnotationSpan> {
        self.spans.iter().filter(|s| s.is_proposition())
    }

    /// First proposition with the given id
    #[must_use]
    pub fn proposition_by_id(&self, id: &str) -> Option<&AnnotationSpan> {
        self.propositions().find(|s| s.id() == Some(id))
    }

    /// Number of characters inside outermost propositions
    #[must_use]
    pub fn annotated_chars(&self) -> usize {
        self.propositions()
            .filter(|s| !self.is_nested(s))
            .map(|s| s.text.chars().count())
            .sum()
    }

    /// Whether some enclosing element of `span` is a proposition
    #[must_use]
    pub fn is_nested(&self, span: &AnnotationSpan) -> bool {
        let mut parent = span.parent;
        while let Some(index) = parent {
            let Some(p) = self.spans.get(index) else {
                return false;
            };
            if p.is_proposition() {
                return true;
            }
            parent = p.parent;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(index: usize, attrs: &[(&str, &str)], text: &str) -> AnnotationSpan {
        AnnotationSpan {
            index,
            tag: PROPOSITION_TAG.into(),
            attributes: attrs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect(),
            start: 0,
            end: text.len(),
            text: text.into(),
            parent: None,
        }
    }

    #[test]
    fn multi_valued_references() {
        let s = span(0, &[("id", "1"), ("supports", "2  3"), ("attacks", "4")], "x");
        assert_eq!(s.supports(), vec!["2", "3"]);
        assert_eq!(s.attacks(), vec!["4"]);
        assert_eq!(s.describe(), "'1'");
    }

    #[test]
    fn lookup_and_counts() {
        let doc = AnnotationDocument {
            text: "ab cd".into(),
            spans: vec![span(0, &[("id", "a")], "ab"), span(1, &[], "cd")],
        };
        assert_eq!(doc.proposition_by_id("a").map(|s| s.index), Some(0));
        assert_eq!(doc.annotated_chars(), 4);
        assert_eq!(doc.spans[1].describe(), "#2 (\"cd\")");
    }
}
