//! Fenced block extraction
//!
//! Uses pulldown-cmark to walk the raw input and lift every `argdown` and
//! `xml` fenced code block into an [`ArtifactCandidate`], in document order.

use crate::metadata;
use argcheck_artifact::{ArtifactCandidate, DataType, Metadata};
use pulldown_cmark::{CodeBlockKind, Event, Parser as MdParser, Tag, TagEnd};

/// Block extractor
#[derive(Debug, Clone, Copy, Default)]
pub struct Extractor;

/// Block under construction
struct OpenBlock {
    dtype: DataType,
    info_metadata: Metadata,
    preceding: Metadata,
    code: String,
}

impl Extractor {
    /// Create new extractor
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Extract all typed candidates from the raw input
    ///
    /// Blocks with other info strings are skipped and do not take up a
    /// position.
    #[must_use]
    pub fn extract(&self, input: &str) -> Vec<ArtifactCandidate> {
        let mut candidates = Vec::new();
        let mut open: Option<OpenBlock> = None;
        let mut html: Option<String> = None;
        let mut pending = Metadata::new();

        for event in MdParser::new(input) {
            match event {
                Event::Start(Tag::HtmlBlock) => html = Some(String::new()),
                Event::Html(text) => {
                    if let Some(ref mut buf) = html {
                        buf.push_str(&text);
                    }
                }
                Event::End(TagEnd::HtmlBlock) => {
                    pending = html
                        .take()
                        .map(|buf| metadata::from_html_comment(&buf))
                        .unwrap_or_default();
                }
                Event::Start(Tag::CodeBlock(kind)) => {
                    let preceding = std::mem::take(&mut pending);
                    let CodeBlockKind::Fenced(info) = kind else {
                        continue;
                    };
                    let (marker, rest) = info
                        .trim()
                        .split_once(char::is_whitespace)
                        .unwrap_or((info.trim(), ""));
                    open = DataType::from_marker(marker).map(|dtype| OpenBlock {
                        dtype,
                        info_metadata: metadata::from_info_string(rest),
                        preceding,
                        code: String::new(),
                    });
                }
                Event::Text(text) => {
                    if let Some(ref mut block) = open {
                        block.code.push_str(&text);
                    }
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some(block) = open.take() {
                        let candidate = Self::finish(candidates.len(), block);
                        tracing::debug!(
                            id = candidate.id(),
                            dtype = %candidate.dtype(),
                            position = candidate.position(),
                            "extracted candidate"
                        );
                        candidates.push(candidate);
                    }
                }
                Event::Start(_) => pending.clear(),
                _ => {}
            }
        }

        candidates
    }

    fn finish(position: usize, block: OpenBlock) -> ArtifactCandidate {
        let mut meta = block.preceding;
        meta.extend(metadata::from_first_line(&block.code));
        meta.extend(block.info_metadata);
        ArtifactCandidate::new(position, block.dtype, block.code, meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn extracts_typed_blocks_in_order() {
        let input = "Intro.\n\n```argdown {filename=\"map.ad\"}\n[A]: a.\n```\n\n```python\nprint()\n```\n\n```xml\n<proposition id=\"1\">x</proposition>\n```\n";
        let candidates = Extractor::new().extract(input);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].dtype(), DataType::Argdown);
        assert_eq!(candidates[0].position(), 0);
        assert_eq!(candidates[0].raw_text(), "[A]: a.\n");
        assert_eq!(candidates[0].metadata().get("filename"), Some(&json!("map.ad")));
        assert_eq!(candidates[1].dtype(), DataType::Xml);
        assert_eq!(candidates[1].position(), 1);
    }

    #[test]
    fn metadata_sources_merge_with_priority() {
        let input = "<!-- filename: old.ad\nauthor: x -->\n\n```argdown {filename=\"new.ad\"}\n// stage: draft\n[A]: a.\n```\n";
        let candidates = Extractor::new().extract(input);
        let meta = candidates[0].metadata();
        assert_eq!(meta.get("filename"), Some(&json!("new.ad")));
        assert_eq!(meta.get("author"), Some(&json!("x")));
        assert_eq!(meta.get("stage"), Some(&json!("draft")));
    }

    #[test]
    fn preceding_comment_only_applies_to_next_block() {
        let input = "<!-- filename: map.ad -->\n\nSome paragraph.\n\n```argdown\n[A]: a.\n```\n";
        let candidates = Extractor::new().extract(input);
        assert!(candidates[0].metadata().is_empty());
    }

    #[test]
    fn empty_input_has_no_candidates() {
        assert!(Extractor::new().extract("").is_empty());
        assert!(Extractor::new().extract("no blocks at all").is_empty());
    }

    proptest::proptest! {
        #[test]
        fn positions_follow_document_order(kinds in proptest::collection::vec(0u8..3, 0..8)) {
            let mut input = String::new();
            let mut expected = Vec::new();
            for (i, kind) in kinds.iter().enumerate() {
                let (lang, dtype) = match kind {
                    0 => ("argdown", Some(DataType::Argdown)),
                    1 => ("xml", Some(DataType::Xml)),
                    _ => ("python", None),
                };
                input.push_str(&format!("Paragraph {i}.\n\n```{lang}\nline {i}\n```\n\n"));
                expected.extend(dtype);
            }
            let candidates = Extractor::new().extract(&input);
            let dtypes: Vec<DataType> = candidates.iter().map(ArtifactCandidate::dtype).collect();
            proptest::prop_assert_eq!(dtypes, expected);
            for (i, c) in candidates.iter().enumerate() {
                proptest::prop_assert_eq!(c.position(), i);
            }
        }
    }
}
