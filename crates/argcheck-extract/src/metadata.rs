//! Block metadata
//!
//! Metadata reaches a block in three ways, merged in increasing priority:
//! an HTML comment block right before the fence, a comment on the first
//! line inside the block, and the rest of the fence info string.

use argcheck_artifact::Metadata;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static ATTRIBUTE_BODY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\{\s*(?:[A-Za-z_][\w.-]*\s*=\s*(?:"[^"]*"|'[^']*'|[^\s,}]+)\s*,?\s*)*\}$"#)
        .expect("valid attribute body pattern")
});

static ATTRIBUTE_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z_][\w.-]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s,}]+))"#)
        .expect("valid attribute pair pattern")
});

static LINE_COMMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?://|<!--)\s*([A-Za-z_][\w.-]*)\s*:\s*(.*?)\s*(?:-->)?\s*$")
        .expect("valid line comment pattern")
});

/// Metadata from the remainder of a fence info string
///
/// Accepts a YAML/JSON flow mapping (`{"type": "map"}`) or attribute
/// pairs (`{filename="map.ad" version=2}`). Anything else is ignored.
#[must_use]
pub fn from_info_string(rest: &str) -> Metadata {
    let rest = rest.trim();
    if rest.is_empty() {
        return Metadata::new();
    }
    if ATTRIBUTE_BODY.is_match(rest) {
        return ATTRIBUTE_PAIR
            .captures_iter(rest)
            .map(|caps| {
                let key = caps[1].to_string();
                let value = match (caps.get(2), caps.get(3), caps.get(4)) {
                    (Some(q), _, _) | (_, Some(q), _) => Value::String(q.as_str().to_string()),
                    (_, _, Some(bare)) => scalar(bare.as_str()),
                    _ => Value::Null,
                };
                (key, value)
            })
            .collect();
    }
    from_yaml_mapping(rest)
}

/// Metadata from an HTML comment block (`<!-- filename: map.ad -->`)
#[must_use]
pub fn from_html_comment(html: &str) -> Metadata {
    let trimmed = html.trim();
    let Some(body) = trimmed
        .strip_prefix("<!--")
        .and_then(|b| b.strip_suffix("-->"))
    else {
        return Metadata::new();
    };
    from_yaml_mapping(body)
}

/// A `key: value` comment on the first non-empty line of a block
#[must_use]
pub fn from_first_line(block: &str) -> Metadata {
    let Some(first) = block.lines().find(|l| !l.trim().is_empty()) else {
        return Metadata::new();
    };
    LINE_COMMENT
        .captures(first)
        .map(|caps| {
            Metadata::from([(caps[1].to_string(), Value::String(caps[2].to_string()))])
        })
        .unwrap_or_default()
}

fn from_yaml_mapping(text: &str) -> Metadata {
    match serde_yaml::from_str::<Value>(text) {
        Ok(Value::Object(map)) => map.into_iter().collect(),
        Ok(_) => {
            tracing::warn!(metadata = text, "ignoring metadata that is not a mapping");
            Metadata::new()
        }
        Err(e) => {
            tracing::warn!(metadata = text, error = %e, "ignoring unparseable metadata");
            Metadata::new()
        }
    }
}

fn scalar(raw: &str) -> Value {
    serde_json::from_str::<Value>(raw)
        .ok()
        .filter(|v| !v.is_object() && !v.is_array())
        .unwrap_or_else(|| Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn attribute_pairs() {
        let meta = from_info_string(r#"{filename="map.ad" version=2 draft=true}"#);
        assert_eq!(meta.get("filename"), Some(&json!("map.ad")));
        assert_eq!(meta.get("version"), Some(&json!(2)));
        assert_eq!(meta.get("draft"), Some(&json!(true)));
    }

    #[test]
    fn flow_mapping() {
        let meta = from_info_string(r#"{"type": "map", "author": "test"}"#);
        assert_eq!(meta.get("type"), Some(&json!("map")));
        assert_eq!(meta.get("author"), Some(&json!("test")));
        assert_eq!(meta.keys().next().map(String::as_str), Some("type"));
    }

    #[test]
    fn garbage_is_ignored() {
        assert!(from_info_string("{unclosed").is_empty());
        assert!(from_info_string("plain words").is_empty());
        assert!(from_info_string("").is_empty());
    }

    #[test]
    fn comments() {
        let meta = from_first_line("\n// filename: reconstruction.ad\n<A>: gist.");
        assert_eq!(meta.get("filename"), Some(&json!("reconstruction.ad")));
        let meta = from_first_line("<!-- filename: annotation.xml -->\n<proposition/>");
        assert_eq!(meta.get("filename"), Some(&json!("annotation.xml")));
        let meta = from_html_comment("<!-- filename: map.ad -->\n");
        assert_eq!(meta.get("filename"), Some(&json!("map.ad")));
        assert!(from_first_line("[A]: no comment here.").is_empty());
    }
}
