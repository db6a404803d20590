//! Argdown parser
//!
//! Reads the subset of Argdown used by argument maps and reconstructions:
//!
//! ```text
//! [Claim]: text {yaml}            claims (plain lines are unlabeled claims)
//! <Argument>: gist {yaml}         arguments
//!     <+ <Other>                  relations, nested by indentation
//! (P1) [Label]: text {yaml}       premise-conclusion structures
//! -- {from: ["P1"]} --            inference lines
//! ```
//!
//! `//` and `/* */` comments and `#` headings are skipped. Indented plain
//! lines continue the previous statement.

use crate::error::ParseError;
use crate::parsers::ArtifactParser;
use argcheck_artifact::{
    ArgdownGraph, Argument, DataType, Dialectic, InferenceStep, InlineData, NodeRef, ParsedGraph,
    PcsElement, PcsStatement, Proposition, Valence,
};
use once_cell::sync::Lazy;
use regex::Regex;

static PCS_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\(([^()\s][^()]*)\)\s*(.*)$").expect("valid pcs pattern"));

static RELATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(<\+|<-|<_|\+>|->|_>|><)\s*(.*)$").expect("valid relation pattern")
});

static ARGUMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<([^<>]+)>(.*)$").expect("valid argument pattern"));

static CLAIM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[([^\[\]]+)\](.*)$").expect("valid claim pattern"));

/// Argdown parser
#[derive(Debug, Clone, Copy, Default)]
pub struct ArgdownParser;

impl ArgdownParser {
    /// Create new Argdown parser
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ArtifactParser for ArgdownParser {
    type Output = ArgdownGraph;

    fn parse(&self, content: &str) -> Result<ParsedGraph, ParseError> {
        GraphBuilder::default().build(content)
    }

    fn dtype(&self) -> DataType {
        DataType::Argdown
    }

    fn name(&self) -> &'static str {
        "argdown"
    }
}

/// What follows a `[Label]` or `<Label>` marker
enum Tail {
    Reference,
    Text(String),
}

#[derive(Default)]
struct GraphBuilder {
    graph: ParsedGraph,
    /// Relation nesting: (indentation, node)
    stack: Vec<(usize, NodeRef)>,
    /// Argument whose PCS is being read
    pcs_owner: Option<String>,
    /// Argument declared by the last top-level line
    header: Option<String>,
    /// Node receiving continuation lines
    last_text: Option<NodeRef>,
    untitled_propositions: usize,
    untitled_arguments: usize,
}

impl GraphBuilder {
    fn build(mut self, source: &str) -> Result<ParsedGraph, ParseError> {
        for (idx, line) in strip_comments(source)?.iter().enumerate() {
            self.line(idx + 1, line)?;
        }
        self.graph.ground_relations();
        Ok(self.graph)
    }

    fn line(&mut self, n: usize, raw: &str) -> Result<(), ParseError> {
        let content = raw.trim();
        if content.is_empty() {
            return Ok(());
        }
        let indent = indentation(raw);

        if content.starts_with('#') || content.chars().all(|c| c == '=') {
            self.stack.clear();
            self.pcs_owner = None;
            self.header = None;
            self.last_text = None;
            return Ok(());
        }
        if content.starts_with("--") {
            return self.inference(n, content);
        }
        if let Some(caps) = PCS_LINE.captures(content) {
            return self.pcs_statement(n, indent, caps[1].trim(), &caps[2]);
        }
        if let Some(caps) = RELATION.captures(content) {
            return self.relation(n, indent, &caps[1], &caps[2]);
        }
        if indent > 0 && self.last_text.is_some() {
            self.continuation(content);
            return Ok(());
        }

        let node = self.node(n, content)?;
        self.header = match &node {
            NodeRef::Argument(label) => Some(label.clone()),
            NodeRef::Proposition(_) => None,
        };
        self.pcs_owner = None;
        self.stack = vec![(indent, node)];
        Ok(())
    }

    fn inference(&mut self, n: usize, content: &str) -> Result<(), ParseError> {
        let inner = content.trim_start_matches('-').trim_end_matches('-');
        let (_, data) = split_inline_data(n, inner)?;
        let owner = self.pcs_owner();
        if let Some(arg) = self.graph.argument_mut(&owner) {
            arg.pcs.push(PcsElement::Inference(InferenceStep {
                data: data.unwrap_or_default(),
            }));
        }
        self.stack.clear();
        self.last_text = None;
        Ok(())
    }

    fn pcs_statement(&mut self, n: usize, indent: usize, label: &str, rest: &str) -> Result<(), ParseError> {
        let owner = self.pcs_owner();
        let proposition = self.statement(n, rest)?;
        if let Some(arg) = self.graph.argument_mut(&owner) {
            let statement = PcsStatement {
                label: label.to_string(),
                proposition: proposition.clone(),
            };
            let element = if matches!(arg.pcs.last(), Some(PcsElement::Inference(_))) {
                PcsElement::Conclusion(statement)
            } else {
                PcsElement::Premise(statement)
            };
            arg.pcs.push(element);
        }
        self.stack = vec![(indent, NodeRef::Proposition(proposition))];
        Ok(())
    }

    fn relation(&mut self, n: usize, indent: usize, op: &str, rest: &str) -> Result<(), ParseError> {
        while self.stack.last().is_some_and(|(i, _)| *i >= indent) {
            self.stack.pop();
        }
        let Some((_, parent)) = self.stack.last().cloned() else {
            return Err(ParseError::syntax(n, format!("relation '{op}' without a parent node")));
        };
        let child = self.node(n, rest)?;
        let (source, target, valence) = match op {
            "<+" => (child.clone(), parent, Valence::Support),
            "<-" | "<_" => (child.clone(), parent, Valence::Attack),
            "+>" => (parent, child.clone(), Valence::Support),
            "><" => (parent, child.clone(), Valence::Contradict),
            _ => (parent, child.clone(), Valence::Attack),
        };
        self.graph.add_relation(source, target, valence, Dialectic::Sketched);
        self.stack.push((indent, child));
        Ok(())
    }

    fn continuation(&mut self, content: &str) {
        let Some(node) = &self.last_text else {
            return;
        };
        let slot = match node {
            NodeRef::Proposition(l) => self.graph.proposition_mut(l).and_then(|p| p.texts.last_mut()),
            NodeRef::Argument(l) => self.graph.argument_mut(l).and_then(|a| a.gists.last_mut()),
        };
        if let Some(text) = slot {
            text.push(' ');
            text.push_str(content);
        }
    }

    /// Argument owning the current PCS, opening a PCS if needed
    fn pcs_owner(&mut self) -> String {
        if let Some(owner) = &self.pcs_owner {
            return owner.clone();
        }
        let owner = match self.header.take() {
            Some(label) if self.graph.argument(&label).is_some_and(|a| a.pcs.is_empty()) => label,
            _ => {
                self.untitled_arguments += 1;
                let mut arg = Argument::new(format!("Untitled argument {}", self.untitled_arguments));
                arg.unlabeled = true;
                let label = arg.label.clone();
                self.graph.arguments.push(arg);
                label
            }
        };
        self.pcs_owner = Some(owner.clone());
        owner
    }

    /// Any node: `<Argument>...` or a statement
    fn node(&mut self, n: usize, text: &str) -> Result<NodeRef, ParseError> {
        let text = text.trim();
        let Some(caps) = ARGUMENT.captures(text) else {
            return self.statement(n, text).map(NodeRef::Proposition);
        };
        let label = caps[1].trim().to_string();
        let (tail, data) = tail(n, &caps[2])?;

        if self.graph.argument(&label).is_none() {
            self.graph.arguments.push(Argument::new(&label));
        }
        if let Some(arg) = self.graph.argument_mut(&label) {
            if let Tail::Text(gist) = tail {
                if !arg.gists.contains(&gist) {
                    arg.gists.push(gist);
                }
            }
            if let Some(data) = data {
                arg.data.extend(data);
            }
        }
        let node = NodeRef::Argument(label);
        self.last_text = Some(node.clone());
        Ok(node)
    }

    /// A statement: `[Label]: text {data}`, `[Label]` or plain text
    fn statement(&mut self, n: usize, text: &str) -> Result<String, ParseError> {
        let text = text.trim();
        let (label, tail, data) = if let Some(caps) = CLAIM.captures(text) {
            let (tail, data) = tail(n, &caps[2])?;
            (Some(caps[1].trim().to_string()), tail, data)
        } else {
            let (body, data) = split_inline_data(n, text)?;
            if body.is_empty() {
                return Err(ParseError::syntax(n, "empty statement"));
            }
            (None, Tail::Text(body), data)
        };

        let label = match label {
            Some(label) => label,
            None => self.label_for_text(&tail),
        };
        if self.graph.proposition(&label).is_none() {
            self.graph.propositions.push(Proposition::new(&label));
        }
        if let Some(prop) = self.graph.proposition_mut(&label) {
            if let Tail::Text(t) = tail {
                if !prop.texts.contains(&t) {
                    prop.texts.push(t);
                }
            }
            if let Some(data) = data {
                prop.data.extend(data);
            }
        }
        self.last_text = Some(NodeRef::proposition(&label));
        Ok(label)
    }

    /// Label of an existing proposition with this text, or a fresh one
    fn label_for_text(&mut self, tail: &Tail) -> String {
        if let Tail::Text(t) = tail {
            if let Some(existing) = self.graph.propositions.iter().find(|p| p.texts.contains(t)) {
                return existing.label.clone();
            }
        }
        self.untitled_propositions += 1;
        let mut prop = Proposition::new(format!("Untitled proposition {}", self.untitled_propositions));
        prop.unlabeled = true;
        let label = prop.label.clone();
        self.graph.propositions.push(prop);
        label
    }
}

/// Read what follows a `[Label]`/`<Label>` marker
fn tail(n: usize, rest: &str) -> Result<(Tail, Option<InlineData>), ParseError> {
    let rest = rest.trim();
    if rest.is_empty() {
        return Ok((Tail::Reference, None));
    }
    if let Some(body) = rest.strip_prefix(':') {
        let (text, data) = split_inline_data(n, body)?;
        let tail = if text.is_empty() { Tail::Reference } else { Tail::Text(text) };
        return Ok((tail, data));
    }
    if rest.starts_with('{') {
        let (text, data) = split_inline_data(n, rest)?;
        if text.is_empty() {
            return Ok((Tail::Reference, data));
        }
    }
    Err(ParseError::syntax(n, format!("unexpected text after label: '{rest}'")))
}

/// Split a trailing `{...}` YAML mapping off a statement
fn split_inline_data(n: usize, text: &str) -> Result<(String, Option<InlineData>), ParseError> {
    let trimmed = text.trim();
    if !trimmed.ends_with('}') {
        return Ok((trimmed.to_string(), None));
    }

    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut open = None;
    for (i, c) in trimmed.char_indices().rev() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '}' => depth += 1,
                '{' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        open = Some(i);
                        break;
                    }
                }
                _ => {}
            },
        }
    }
    let Some(open) = open else {
        return Err(ParseError::inline_data(n, "unbalanced braces"));
    };

    let value: serde_json::Value = serde_yaml::from_str(&trimmed[open..])
        .map_err(|e| ParseError::inline_data(n, e.to_string()))?;
    let serde_json::Value::Object(data) = value else {
        return Err(ParseError::inline_data(n, "inline data must be a mapping"));
    };
    Ok((trimmed[..open].trim().to_string(), Some(data)))
}

fn indentation(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

/// Remove `//` and `/* */` comments, keeping line numbering intact
fn strip_comments(source: &str) -> Result<Vec<String>, ParseError> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut chars = source.chars().peekable();
    let mut block_opened: Option<usize> = None;
    let mut in_quote = false;
    let mut line = 1;

    while let Some(c) = chars.next() {
        if c == '\n' {
            lines.push(std::mem::take(&mut current));
            line += 1;
            in_quote = false;
            continue;
        }
        if block_opened.is_some() {
            if c == '*' && chars.peek() == Some(&'/') {
                chars.next();
                block_opened = None;
            }
            continue;
        }
        if in_quote {
            in_quote = c != '"';
            current.push(c);
            continue;
        }
        match c {
            '"' => {
                in_quote = true;
                current.push(c);
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                block_opened = Some(line);
            }
            '/' if chars.peek() == Some(&'/')
                && current.chars().last().map_or(true, char::is_whitespace) =>
            {
                while chars.peek().is_some_and(|next| *next != '\n') {
                    chars.next();
                }
            }
            _ => current.push(c),
        }
    }
    if let Some(opened) = block_opened {
        return Err(ParseError::syntax(opened, "unterminated block comment"));
    }
    lines.push(current);
    Ok(lines)
}
