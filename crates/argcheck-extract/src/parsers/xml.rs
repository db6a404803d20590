//! XML annotation parser
//!
//! Turns an annotated source text into an [`AnnotationDocument`]: the
//! markup-free text plus one [`AnnotationSpan`] per element, with byte
//! offsets into that text.

use crate::error::ParseError;
use crate::parsers::ArtifactParser;
use argcheck_artifact::{AnnotationDocument, AnnotationSpan, DataType, XmlDocument};
use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Parser for XML annotation blocks
#[derive(Debug, Clone, Copy, Default)]
pub struct AnnotationParser;

impl AnnotationParser {
    /// Create new annotation parser
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ArtifactParser for AnnotationParser {
    type Output = XmlDocument;

    fn parse(&self, content: &str) -> Result<AnnotationDocument, ParseError> {
        let mut reader = Reader::from_str(content);
        let mut doc = AnnotationDocument::default();
        let mut open: Vec<usize> = Vec::new();

        loop {
            match reader.read_event().map_err(ParseError::xml)? {
                Event::Start(e) => {
                    let span = open_span(&e, &doc, open.last().copied())?;
                    open.push(span.index);
                    doc.spans.push(span);
                }
                Event::Empty(e) => {
                    let span = open_span(&e, &doc, open.last().copied())?;
                    doc.spans.push(span);
                }
                Event::End(_) => {
                    let Some(index) = open.pop() else {
                        return Err(ParseError::xml("closing tag without opening tag"));
                    };
                    let end = doc.text.len();
                    let span = &mut doc.spans[index];
                    span.end = end;
                    span.text = doc.text[span.start..end].to_string();
                }
                Event::Text(t) => {
                    let text = t.unescape().map_err(ParseError::xml)?;
                    doc.text.push_str(&text);
                }
                Event::CData(c) => {
                    doc.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(&index) = open.last() {
            return Err(ParseError::xml(format!(
                "unclosed element <{}>",
                doc.spans[index].tag
            )));
        }
        Ok(doc)
    }

    fn dtype(&self) -> DataType {
        DataType::Xml
    }

    fn name(&self) -> &'static str {
        "quick-xml annotation"
    }
}

fn open_span(
    e: &BytesStart<'_>,
    doc: &AnnotationDocument,
    parent: Option<usize>,
) -> Result<AnnotationSpan, ParseError> {
    let mut attributes = IndexMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(ParseError::xml)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(ParseError::xml)?.into_owned();
        attributes.insert(key, value);
    }
    let start = doc.text.len();
    Ok(AnnotationSpan {
        index: doc.spans.len(),
        tag: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
        attributes,
        start,
        end: start,
        text: String::new(),
        parent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(src: &str) -> AnnotationDocument {
        AnnotationParser::new().parse(src).unwrap()
    }

    #[test]
    fn spans_and_text() {
        let doc = parse(
            r#"We should act. <proposition id="1" supports="2" argument_label="A">Taxes &amp; fees rise.</proposition> So <proposition id="2" ref_reco_label="C1">prices go up</proposition>."#,
        );
        assert_eq!(doc.text, "We should act. Taxes & fees rise. So prices go up.");
        assert_eq!(doc.spans.len(), 2);
        let first = &doc.spans[0];
        assert_eq!(first.text, "Taxes & fees rise.");
        assert_eq!(&doc.text[first.start..first.end], "Taxes & fees rise.");
        assert_eq!(first.supports(), vec!["2"]);
        assert_eq!(first.argument_label(), Some("A"));
        assert_eq!(doc.proposition_by_id("2").unwrap().ref_reco_label(), Some("C1"));
        assert_eq!(doc.annotated_chars(), "Taxes & fees rise.".len() + "prices go up".len());
    }

    #[test]
    fn nested_elements_keep_parent() {
        let doc = parse("<text><proposition id=\"1\">a <proposition id=\"2\">b</proposition></proposition><br/></text>");
        assert_eq!(doc.spans[1].parent, Some(0));
        assert_eq!(doc.spans[2].parent, Some(1));
        assert_eq!(doc.spans[1].text, "a b");
        assert_eq!(doc.spans[3].tag, "br");
        assert_eq!(doc.spans[3].start, doc.spans[3].end);
        assert_eq!(doc.annotated_chars(), 3);
    }

    #[test]
    fn plain_text_has_no_spans() {
        let doc = parse("Just some words.");
        assert!(doc.spans.is_empty());
        assert_eq!(doc.text, "Just some words.");
    }

    #[test]
    fn malformed_markup_is_error() {
        let parser = AnnotationParser::new();
        assert!(matches!(parser.parse("<proposition id=\"1\">open"), Err(ParseError::Xml(_))));
        assert!(matches!(parser.parse("<a>x</b>"), Err(ParseError::Xml(_))));
    }
}
