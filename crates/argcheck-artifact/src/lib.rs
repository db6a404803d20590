//! argcheck artifact model
//!
//! Typed data shared by every layer of the verification engine.
//!
//! # Core Concepts
//!
//! - [`ArtifactCandidate`]: one fenced block of the raw input with its metadata
//! - [`ParsedGraph`]: propositions, arguments (with PCS) and dialectical relations
//! - [`AnnotationDocument`]: markup-free text with `<proposition>` spans
//! - [`Artifact<T>`]: parsed content bound to its source candidate, cacheable
//! - [`ContentHash`]: Blake3 digest behind candidate ids
//!
//! # Example
//!
//! ```rust
//! use argcheck_artifact::{ArtifactCandidate, DataType, Metadata};
//!
//! let candidate = ArtifactCandidate::new(0, DataType::Argdown, "[A]: a.", Metadata::new());
//! assert!(candidate.id().starts_with("argdown_"));
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

mod artifact;
mod candidate;
pub mod dialectics;
mod document;
mod graph;
mod hash;

pub use artifact::{ArgdownGraph, Artifact, ArtifactType, ParsedArtifact, XmlDocument};
pub use candidate::{stringify_value, ArtifactCandidate, DataType, Metadata};
pub use document::{AnnotationDocument, AnnotationSpan, PROPOSITION_TAG};
pub use graph::{
    Argument, Dialectic, DialecticalRelation, Inference, InferenceStep, InlineData, NodeRef,
    ParsedGraph, PcsElement, PcsStatement, Proposition, Valence,
};
pub use hash::ContentHash;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
