//! argcheck extraction layer
//!
//! Everything between the raw input string and the typed artifacts that
//! verification rules inspect.
//!
//! # Overview
//!
//! - [`Extractor`]: finds `argdown` and `xml` fenced blocks and their metadata
//! - [`RoleFilter`]: selects the candidate that plays a role (map, reconstruction, ...)
//! - [`ArtifactParser`]: parses a candidate into a graph or annotation document
//! - [`ArtifactCache`]: request-scoped cache so each candidate is parsed once
//!
//! # Example
//!
//! ```rust
//! use argcheck_extract::{Extractor, Role, RoleFilter};
//!
//! let input = "```argdown {filename=\"map.ad\"}\n[A]: a.\n```\n";
//! let candidates = Extractor::new().extract(input);
//! let selected = RoleFilter::new(Role::Argmap).select(&candidates);
//! assert_eq!(selected.map(|c| c.position()), Some(0));
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

mod cache;
mod error;
mod extractor;
pub mod metadata;
mod filter;
mod parsers;

pub use cache::{ArtifactCache, CacheStats};
pub use error::{FilterError, ParseError, ParseResult};
pub use extractor::Extractor;
pub use filter::{FilterRule, FilterRuleSpec, Role, RoleFilter};
pub use parsers::{default_parsers, AnnotationParser, ArgdownParser, ArtifactParser, ParserRegistry};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for extraction
    pub use crate::{
        ArtifactCache, ArtifactParser, Extractor, ParseError, ParserRegistry, Role, RoleFilter,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
