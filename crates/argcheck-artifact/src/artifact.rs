//! Typed parsed artifacts
//!
//! Defines the sealed [`ArtifactType`] trait binding a parsed content type
//! to a stable type id, and [`Artifact<T>`], the cacheable wrapper that ties
//! parsed content to the candidate it came from.

use crate::candidate::ArtifactCandidate;
use crate::document::AnnotationDocument;
use crate::graph::ParsedGraph;
use serde::Serialize;
use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;

/// Trait for parsed artifact types
///
/// This trait is **sealed**: the set of parsed structures is closed.
pub trait ArtifactType: Send + Sync + 'static + Debug + private::Sealed {
    /// The parsed content type
    type Content: Send + Sync + 'static + Debug + Clone + PartialEq + Serialize;

    /// Artifact type identifier, used as cache key prefix
    const TYPE_ID: &'static str;

    /// Wrap parsed content for reporting
    fn snapshot(content: &Self::Content) -> ParsedArtifact;
}

/// Sealed trait - prevents external implementations
#[doc(hidden)]
pub mod private {
    /// Sealed trait marker
    pub trait Sealed {}
}

/// Argdown graph artifact
#[derive(Debug, Clone, Copy)]
pub struct ArgdownGraph;

impl private::Sealed for ArgdownGraph {}

impl ArtifactType for ArgdownGraph {
    type Content = ParsedGraph;

    const TYPE_ID: &'static str = "argdown_graph";

    fn snapshot(content: &Self::Content) -> ParsedArtifact {
        ParsedArtifact::Graph(content.clone())
    }
}

/// XML annotation artifact
#[derive(Debug, Clone, Copy)]
pub struct XmlDocument;

impl private::Sealed for XmlDocument {}

impl ArtifactType for XmlDocument {
    type Content = AnnotationDocument;

    const TYPE_ID: &'static str = "xml_document";

    fn snapshot(content: &Self::Content) -> ParsedArtifact {
        ParsedArtifact::Document(content.clone())
    }
}

/// Parsed content bound to its source candidate
///
/// # Invariants
/// - `source_id` is the id of the candidate the content was parsed from
/// - Immutable after construction; clones share the content
#[derive(Debug)]
pub struct Artifact<T: ArtifactType> {
    source_id: String,
    content: Arc<T::Content>,
    _phantom: PhantomData<T>,
}

impl<T: ArtifactType> Clone for Artifact<T> {
    fn clone(&self) -> Self {
        Self {
            source_id: self.source_id.clone(),
            content: Arc::clone(&self.content),
            _phantom: PhantomData,
        }
    }
}

impl<T: ArtifactType> Artifact<T> {
    /// Bind parsed content to the candidate it was parsed from
    #[must_use]
    pub fn from_candidate(candidate: &ArtifactCandidate, content: T::Content) -> Self {
        Self {
            source_id: candidate.id().to_string(),
            content: Arc::new(content),
            _phantom: PhantomData,
        }
    }

    /// Cache key for a candidate: `"<type-id>:<candidate-id>"`
    #[inline]
    #[must_use]
    pub fn cache_key(candidate: &ArtifactCandidate) -> String {
        format!("{}:{}", T::TYPE_ID, candidate.id())
    }

    /// Id of the source candidate
    #[inline]
    #[must_use]
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Reference to content
    #[inline]
    #[must_use]
    pub fn content(&self) -> &T::Content {
        &self.content
    }

    /// Shared handle to content
    #[inline]
    #[must_use]
    pub fn shared(&self) -> Arc<T::Content> {
        Arc::clone(&self.content)
    }

    /// Owned snapshot for reporting
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> ParsedArtifact {
        T::snapshot(&self.content)
    }
}

/// A parsed structure as reported in an evaluation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ParsedArtifact {
    /// Parsed Argdown graph
    Graph(ParsedGraph),
    /// Parsed annotation document
    Document(AnnotationDocument),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{DataType, Metadata};

    #[test]
    fn cache_key_uses_type_and_candidate() {
        let cand = ArtifactCandidate::new(3, DataType::Argdown, "[A]: a.", Metadata::new());
        let key = Artifact::<ArgdownGraph>::cache_key(&cand);
        assert_eq!(key, format!("argdown_graph:{}", cand.id()));
    }

    #[test]
    fn clones_share_content() {
        let cand = ArtifactCandidate::new(0, DataType::Xml, "<proposition/>", Metadata::new());
        let artifact = Artifact::<XmlDocument>::from_candidate(&cand, AnnotationDocument::default());
        let clone = artifact.clone();
        assert!(Arc::ptr_eq(&artifact.shared(), &clone.shared()));
        assert_eq!(clone.source_id(), cand.id());
        assert!(matches!(clone.snapshot(), ParsedArtifact::Document(_)));
    }
}
