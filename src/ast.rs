//! Stylesheet tree produced by the parser and rewritten by the orchestrator
//!
//! Every node keeps the raw text around it (`before`, `between`, `after`) so
//! that serializing an untouched tree yields the original source byte for byte.

use std::fmt;

/// Location of the first character of a node (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Root of a parsed stylesheet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stylesheet {
    pub nodes: Vec<Node>,
    /// Whitespace after the last node
    pub after: String,
}

/// Stylesheet node types
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// `selector { ... }`
    Rule(Rule),
    /// `@name params { ... }` or `@name params;`
    AtRule(AtRule),
    /// `prop: value`
    Declaration(Declaration),
    /// `/* text */`
    Comment(Comment),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub selector: String,
    pub nodes: Vec<Node>,
    pub position: Position,
    pub before: String,
    /// Whitespace between the selector and `{`
    pub between: String,
    /// Whitespace before the closing `}`
    pub after: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AtRule {
    /// Directive name without the leading `@`
    pub name: String,
    pub params: String,
    /// `None` for statement at-rules such as `@custom-media ...;`
    pub nodes: Option<Vec<Node>>,
    pub position: Position,
    pub before: String,
    /// Whitespace between the name and the parameters
    pub after_name: String,
    /// Whitespace between the parameters and `{` / `;`
    pub between: String,
    /// Whitespace before the closing `}`
    pub after: String,
    /// Statement at-rule terminated by `;`
    pub semicolon: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub prop: String,
    pub value: String,
    pub position: Position,
    pub before: String,
    /// Everything between the property name and the value, colon included
    pub between: String,
    /// Whitespace after a regular value; custom properties keep it in `value`
    pub after_value: String,
    pub semicolon: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    /// Text between `/*` and `*/`
    pub text: String,
    pub position: Position,
    pub before: String,
}

impl Declaration {
    /// Whether this declaration defines a custom property (`--name`)
    pub fn is_custom_property(&self) -> bool {
        is_custom_property_name(&self.prop)
    }
}

pub fn is_custom_property_name(name: &str) -> bool {
    name.len() > 2 && name.starts_with("--")
}

impl Stylesheet {
    /// Count nodes of every kind, recursively
    pub fn node_count(&self) -> usize {
        fn count(nodes: &[Node]) -> usize {
            nodes
                .iter()
                .map(|node| {
                    1 + match node {
                        Node::Rule(rule) => count(&rule.nodes),
                        Node::AtRule(at_rule) => at_rule.nodes.as_deref().map_or(0, count),
                        Node::Declaration(_) | Node::Comment(_) => 0,
                    }
                })
                .sum()
        }
        count(&self.nodes)
    }
}

fn write_nodes(f: &mut fmt::Formatter<'_>, nodes: &[Node]) -> fmt::Result {
    for node in nodes {
        write!(f, "{}", node)?;
    }
    Ok(())
}

impl fmt::Display for Stylesheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_nodes(f, &self.nodes)?;
        f.write_str(&self.after)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Rule(rule) => {
                write!(f, "{}{}{}{{", rule.before, rule.selector, rule.between)?;
                write_nodes(f, &rule.nodes)?;
                write!(f, "{}}}", rule.after)
            }
            Node::AtRule(at_rule) => {
                write!(
                    f,
                    "{}@{}{}{}{}",
                    at_rule.before, at_rule.name, at_rule.after_name, at_rule.params, at_rule.between
                )?;
                match &at_rule.nodes {
                    Some(nodes) => {
                        f.write_str("{")?;
                        write_nodes(f, nodes)?;
                        write!(f, "{}}}", at_rule.after)
                    }
                    None if at_rule.semicolon => f.write_str(";"),
                    None => Ok(()),
                }
            }
            Node::Declaration(decl) => {
                write!(f, "{}{}{}{}{}", decl.before, decl.prop, decl.between, decl.value, decl.after_value)?;
                if decl.semicolon {
                    f.write_str(";")?;
                }
                Ok(())
            }
            Node::Comment(comment) => write!(f, "{}/*{}*/", comment.before, comment.text),
        }
    }
}
