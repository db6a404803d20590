//! Testing utilities for the argcheck workspace
//!
//! Fenced-block builders, canned artifacts, and tracing setup.

#![allow(missing_docs)]

use tracing_subscriber::EnvFilter;

/// Install a test-writer subscriber filtered by `RUST_LOG`
///
/// Safe to call from every test; only the first call installs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_test_writer()
        .try_init();
}

/// Fenced block with an optional `filename` in its info string
pub fn fenced(lang: &str, filename: Option<&str>, body: &str) -> String {
    let info = match filename {
        Some(name) => format!("{lang} {{filename=\"{name}\"}}"),
        None => lang.to_string(),
    };
    let body = body.trim_start_matches('\n');
    let newline = if body.ends_with('\n') { "" } else { "\n" };
    format!("```{info}\n{body}{newline}```\n")
}

pub fn argdown_block(filename: &str, body: &str) -> String {
    fenced("argdown", Some(filename), body)
}

pub fn xml_block(body: &str) -> String {
    fenced("xml", None, body)
}

/// Model output: prose around the given blocks
pub fn model_output(blocks: &[String]) -> String {
    let mut out = String::from("Here is my analysis.\n\n");
    for block in blocks {
        out.push_str(block);
        out.push('\n');
    }
    out.push_str("Let me know if anything is unclear.\n");
    out
}

pub mod fixtures {
    //! Canned artifacts

    /// Two premises, one conclusion, labeled gist, complete inference data
    pub const INFRECO: &str = r#"
<Socrates>: Socrates is mortal.

(1) All men are mortal.
(2) Socrates is a man.
-- {from: ["1", "2"]} --
(3) Socrates is mortal.
"#;

    /// [`INFRECO`] without a gist
    pub const INFRECO_NO_GIST: &str = r#"
<Socrates>

(1) All men are mortal.
(2) Socrates is a man.
-- {from: ["1", "2"]} --
(3) Socrates is mortal.
"#;

    /// Modus ponens with propositional formalizations
    pub const LOGRECO: &str = r#"
<Ponens>: It is wet.

(1) It rains. {formalization: "p", declarations: {"p": "it rains"}}
(2) If it rains, it is wet. {formalization: "p -> q", declarations: {"q": "it is wet"}}
-- {from: ["1", "2"]} --
(3) It is wet. {formalization: "q"}
"#;

    /// Map whose claim is supported by two arguments
    pub const ARGMAP: &str = r#"
[Tax]: We should tax the rich.
    <+ <Fair>: It is fair.
    <+ <Schools>: It funds schools.
"#;

    /// Annotation whose spans restate [`INFRECO`]
    pub const ARGANNO: &str = r#"<proposition id="p1" supports="c">All men are mortal.</proposition> <proposition id="p2" supports="c">Socrates is a man.</proposition> So <proposition id="c">Socrates is mortal.</proposition>"#;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_blocks() {
        assert_eq!(argdown_block("map.ad", "[A]: a.\n"), "```argdown {filename=\"map.ad\"}\n[A]: a.\n```\n");
        assert_eq!(xml_block("<a/>"), "```xml\n<a/>\n```\n");
    }
}
