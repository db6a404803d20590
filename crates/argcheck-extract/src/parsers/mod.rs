//! Artifact parsers for candidate blocks
//!
//! Provides parsing from raw block text into typed structures:
//! - Argdown blocks into [`ParsedGraph`](argcheck_artifact::ParsedGraph)
//! - XML annotation blocks into [`AnnotationDocument`](argcheck_artifact::AnnotationDocument) via quick-xml

use crate::error::ParseError;
use argcheck_artifact::{ArgdownGraph, ArtifactCandidate, ArtifactType, DataType, XmlDocument};
use std::sync::Arc;

mod argdown;
mod xml;

pub use argdown::ArgdownParser;
pub use xml::AnnotationParser;

/// Parser trait for converting block text into typed structures
///
/// Implement this trait to plug in another parser for a data type.
pub trait ArtifactParser: Send + Sync + 'static {
    /// The artifact type this parser produces
    type Output: ArtifactType;

    /// Parse raw block text
    ///
    /// # Errors
    /// Returns error if the text is not well-formed
    fn parse(&self, content: &str) -> Result<<Self::Output as ArtifactType>::Content, ParseError>;

    /// Data type of the blocks this parser reads
    fn dtype(&self) -> DataType;

    /// Parser name for diagnostics
    fn name(&self) -> &'static str;

    /// Parse a candidate, rejecting candidates of another data type
    ///
    /// # Errors
    /// Returns error on a type mismatch or if parsing fails
    fn parse_candidate(
        &self,
        candidate: &ArtifactCandidate,
    ) -> Result<<Self::Output as ArtifactType>::Content, ParseError> {
        if candidate.dtype() != self.dtype() {
            return Err(ParseError::InvalidType {
                expected: self.dtype().to_string(),
                actual: candidate.dtype().to_string(),
            });
        }
        self.parse(candidate.raw_text())
    }
}

/// The parser collaborators used by one engine
#[derive(Clone)]
pub struct ParserRegistry {
    argdown: Arc<dyn ArtifactParser<Output = ArgdownGraph>>,
    xml: Arc<dyn ArtifactParser<Output = XmlDocument>>,
}

impl Default for ParserRegistry {
    fn default() -> Self {
        default_parsers()
    }
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("argdown", &self.argdown.name())
            .field("xml", &self.xml.name())
            .finish()
    }
}

impl ParserRegistry {
    /// Replace the Argdown parser
    #[must_use]
    pub fn with_argdown<P>(mut self, parser: P) -> Self
    where
        P: ArtifactParser<Output = ArgdownGraph>,
    {
        self.argdown = Arc::new(parser);
        self
    }

    /// Replace the XML parser
    #[must_use]
    pub fn with_xml<P>(mut self, parser: P) -> Self
    where
        P: ArtifactParser<Output = XmlDocument>,
    {
        self.xml = Arc::new(parser);
        self
    }

    /// Argdown parser
    #[inline]
    #[must_use]
    pub fn argdown(&self) -> &dyn ArtifactParser<Output = ArgdownGraph> {
        self.argdown.as_ref()
    }

    /// XML parser
    #[inline]
    #[must_use]
    pub fn xml(&self) -> &dyn ArtifactParser<Output = XmlDocument> {
        self.xml.as_ref()
    }

    /// Name of the parser responsible for a data type
    #[must_use]
    pub fn name_for(&self, dtype: DataType) -> &'static str {
        match dtype {
            DataType::Argdown => self.argdown.name(),
            DataType::Xml => self.xml.name(),
        }
    }
}

/// Create default parser registry with the built-in parsers
#[inline]
#[must_use]
pub fn default_parsers() -> ParserRegistry {
    ParserRegistry {
        argdown: Arc::new(ArgdownParser::new()),
        xml: Arc::new(AnnotationParser::new()),
    }
}
