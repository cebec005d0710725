//! Lossless CSS parser producing a [`Stylesheet`] tree
//!
//! The parser only understands the block structure of CSS: rules, at-rules,
//! declarations and comments. Selectors, parameters and values are kept as raw
//! text together with the surrounding whitespace.

use crate::ast::*;
use crate::error::{AtVarsError, Result};

pub struct Parser {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    filename: String,
}

/// Character that ended a raw statement
#[derive(Debug, Clone, Copy, PartialEq)]
enum Terminator {
    OpenBrace,
    Semicolon,
    CloseBrace,
    Eof,
}

impl Parser {
    pub fn new(input: &str, filename: String) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            filename,
        }
    }

    /// Parse the whole input into a stylesheet
    pub fn parse(&mut self) -> Result<Stylesheet> {
        let (nodes, after) = self.parse_nodes(None)?;
        log::trace!("Parsed {} top-level nodes from {}", nodes.len(), self.filename);
        Ok(Stylesheet { nodes, after })
    }

    /// Parse nodes until the closing `}` of the block opened at `opener`,
    /// or until end of input at the top level
    fn parse_nodes(&mut self, opener: Option<Position>) -> Result<(Vec<Node>, String)> {
        let mut nodes = Vec::new();
        let mut before = String::new();

        loop {
            before.push_str(&self.consume_whitespace());

            match self.peek() {
                None => {
                    if let Some(open) = opener {
                        return Err(AtVarsError::parse(
                            &self.filename,
                            open.line,
                            open.column,
                            "Unclosed block",
                        ));
                    }
                    return Ok((nodes, before));
                }
                Some('}') => {
                    if opener.is_none() {
                        return Err(self.error_here("Unexpected }"));
                    }
                    self.advance();
                    return Ok((nodes, before));
                }
                Some(';') => {
                    // Stray semicolons are kept as raw text in front of the next node
                    before.push(';');
                    self.advance();
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    let comment = self.parse_comment(std::mem::take(&mut before))?;
                    nodes.push(Node::Comment(comment));
                }
                Some('@') => {
                    let at_rule = self.parse_at_rule(std::mem::take(&mut before))?;
                    nodes.push(Node::AtRule(at_rule));
                }
                Some(_) => {
                    let node = self.parse_statement(std::mem::take(&mut before))?;
                    nodes.push(node);
                }
            }
        }
    }

    fn parse_comment(&mut self, before: String) -> Result<Comment> {
        let position = self.current_position();
        self.advance();
        self.advance();

        let mut text = String::new();
        loop {
            match self.peek() {
                None => {
                    return Err(AtVarsError::parse(
                        &self.filename,
                        position.line,
                        position.column,
                        "Unclosed comment",
                    ))
                }
                Some('*') if self.peek_at(1) == Some('/') => {
                    self.advance();
                    self.advance();
                    break;
                }
                Some(ch) => {
                    text.push(ch);
                    self.advance();
                }
            }
        }

        Ok(Comment { text, position, before })
    }

    fn parse_at_rule(&mut self, before: String) -> Result<AtRule> {
        let position = self.current_position();
        self.advance();

        let mut name = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '-' || ch == '_' {
                name.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if name.is_empty() {
            return Err(AtVarsError::parse(
                &self.filename,
                position.line,
                position.column,
                "At-rule without name",
            ));
        }

        let after_name = self.consume_whitespace();
        let (raw, terminator) = self.read_statement()?;
        let (params, between) = split_trailing_whitespace(&raw);

        let mut at_rule = AtRule {
            name,
            params: params.to_string(),
            nodes: None,
            position,
            before,
            after_name,
            between: between.to_string(),
            after: String::new(),
            semicolon: terminator == Terminator::Semicolon,
        };

        if terminator == Terminator::OpenBrace {
            let (nodes, after) = self.parse_nodes(Some(position))?;
            at_rule.nodes = Some(nodes);
            at_rule.after = after;
        }

        Ok(at_rule)
    }

    fn parse_statement(&mut self, before: String) -> Result<Node> {
        let position = self.current_position();
        let (raw, terminator) = self.read_statement()?;

        if terminator == Terminator::OpenBrace {
            let (selector, between) = split_trailing_whitespace(&raw);
            let selector = selector.to_string();
            let between = between.to_string();
            let (nodes, after) = self.parse_nodes(Some(position))?;
            return Ok(Node::Rule(Rule {
                selector,
                nodes,
                position,
                before,
                between,
                after,
            }));
        }

        let colon = raw.find(':').ok_or_else(|| {
            AtVarsError::parse(
                &self.filename,
                position.line,
                position.column,
                format!("Unknown word '{}'", raw.trim()),
            )
        })?;

        let prop = raw[..colon].trim_end();
        if prop.is_empty() {
            return Err(AtVarsError::parse(
                &self.filename,
                position.line,
                position.column,
                "Declaration without property name",
            ));
        }

        let rest = &raw[colon + 1..];
        let value_start = rest.len() - rest.trim_start().len();
        let between = format!("{}:{}", &raw[prop.len()..colon], &rest[..value_start]);
        let rest = &rest[value_start..];

        // Custom property values are kept verbatim, trailing whitespace included
        let (value, after_value) = if is_custom_property_name(prop) {
            (rest, "")
        } else {
            split_trailing_whitespace(rest)
        };

        Ok(Node::Declaration(Declaration {
            prop: prop.to_string(),
            value: value.to_string(),
            position,
            before,
            between,
            after_value: after_value.to_string(),
            semicolon: terminator == Terminator::Semicolon,
        }))
    }

    /// Read raw text up to the next top-level `{`, `;` or `}`.
    /// `{` and `;` are consumed, `}` is left for the enclosing block.
    fn read_statement(&mut self) -> Result<(String, Terminator)> {
        let mut text = String::new();
        let mut paren_depth = 0usize;

        while let Some(ch) = self.peek() {
            match ch {
                '{' if paren_depth == 0 => {
                    self.advance();
                    return Ok((text, Terminator::OpenBrace));
                }
                ';' if paren_depth == 0 => {
                    self.advance();
                    return Ok((text, Terminator::Semicolon));
                }
                '}' if paren_depth == 0 => return Ok((text, Terminator::CloseBrace)),
                '(' => {
                    paren_depth += 1;
                    text.push(ch);
                    self.advance();
                }
                ')' => {
                    paren_depth = paren_depth.saturating_sub(1);
                    text.push(ch);
                    self.advance();
                }
                '"' | '\'' => self.read_string(ch, &mut text)?,
                '/' if self.peek_at(1) == Some('*') => {
                    let comment = self.parse_comment(String::new())?;
                    text.push_str("/*");
                    text.push_str(&comment.text);
                    text.push_str("*/");
                }
                _ => {
                    text.push(ch);
                    self.advance();
                }
            }
        }

        Ok((text, Terminator::Eof))
    }

    fn read_string(&mut self, quote: char, text: &mut String) -> Result<()> {
        let start = self.current_position();
        text.push(quote);
        self.advance();

        while let Some(ch) = self.peek() {
            text.push(ch);
            self.advance();
            if ch == '\\' {
                if let Some(escaped) = self.peek() {
                    text.push(escaped);
                    self.advance();
                }
            } else if ch == quote {
                return Ok(());
            } else if ch == '\n' {
                break;
            }
        }

        Err(AtVarsError::parse(&self.filename, start.line, start.column, "Unclosed string"))
    }

    fn consume_whitespace(&mut self) -> String {
        let mut ws = String::new();
        while let Some(ch) = self.peek() {
            if !ch.is_whitespace() {
                break;
            }
            ws.push(ch);
            self.advance();
        }
        ws
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.peek() {
            self.position += 1;
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn current_position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn error_here(&self, message: &str) -> AtVarsError {
        AtVarsError::parse(&self.filename, self.line, self.column, message)
    }
}

/// Split `text` into its content and trailing whitespace
fn split_trailing_whitespace(text: &str) -> (&str, &str) {
    let content = text.trim_end();
    (content, &text[content.len()..])
}

/// Parse CSS source into a stylesheet
pub fn parse_stylesheet(source: &str, filename: &str) -> Result<Stylesheet> {
    Parser::new(source, filename.to_string()).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Stylesheet {
        parse_stylesheet(source, "test.css").unwrap()
    }

    #[test]
    fn test_round_trip_preserves_source() {
        let sources = [
            ":root{ --from: 1; --to: var(--from)} @for $i from var(--from) to var(--to)",
            ":root{ --from: 1; /* comment */ }",
            "@if var(--green) { .text-green { color: var(--green) }}",
            ":root { --a: calc(2 * var(--b)); } .x { @mixin m var(--a); }\n",
            "@custom-media --viewport-xs (width > var(--breakpoint-xs));",
            "a { background: url(\"a;b.png\") ; color : red !important }\n\n",
            "@each $val in var(--array) {} @for var(--array) {}",
            "a{;color:red;;}",
        ];
        for source in sources {
            assert_eq!(parse(source).to_string(), source, "Round trip failed for '{}'", source);
        }
    }

    #[test]
    fn test_custom_property_keeps_trailing_whitespace() {
        let sheet = parse(":root{ --step: 5 }");
        match &sheet.nodes[0] {
            Node::Rule(rule) => match &rule.nodes[0] {
                Node::Declaration(decl) => {
                    assert_eq!(decl.prop, "--step");
                    assert_eq!(decl.value, "5 ");
                    assert!(!decl.semicolon);
                }
                other => panic!("Expected declaration, got {:?}", other),
            },
            other => panic!("Expected rule, got {:?}", other),
        }
    }

    #[test]
    fn test_regular_declaration_trims_value() {
        let sheet = parse("a{ color : red }");
        match &sheet.nodes[0] {
            Node::Rule(rule) => match &rule.nodes[0] {
                Node::Declaration(decl) => {
                    assert_eq!(decl.prop, "color");
                    assert_eq!(decl.between, " : ");
                    assert_eq!(decl.value, "red");
                    assert_eq!(decl.after_value, " ");
                }
                other => panic!("Expected declaration, got {:?}", other),
            },
            other => panic!("Expected rule, got {:?}", other),
        }
    }

    #[test]
    fn test_at_rule_params_and_positions() {
        let sheet = parse(":root{}\n  @for $i from var(--from) to 2 {}");
        match &sheet.nodes[1] {
            Node::AtRule(at_rule) => {
                assert_eq!(at_rule.name, "for");
                assert_eq!(at_rule.params, "$i from var(--from) to 2");
                assert_eq!(at_rule.between, " ");
                assert_eq!(at_rule.position, Position::new(2, 3));
                assert_eq!(at_rule.nodes.as_ref().map(Vec::len), Some(0));
            }
            other => panic!("Expected at-rule, got {:?}", other),
        }
    }

    #[test]
    fn test_comment_node() {
        let sheet = parse("/* header */ a {}");
        match &sheet.nodes[0] {
            Node::Comment(comment) => assert_eq!(comment.text, " header "),
            other => panic!("Expected comment, got {:?}", other),
        }
    }

    #[test]
    fn test_unclosed_block_error() {
        let result = parse_stylesheet("a {\n color: red;", "broken.css");
        match result {
            Err(AtVarsError::Parse { file, line, column, .. }) => {
                assert_eq!(file, "broken.css");
                assert_eq!((line, column), (1, 1));
            }
            other => panic!("Expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_word_error() {
        let result = parse_stylesheet("a { color red }", "broken.css");
        assert!(matches!(result, Err(AtVarsError::Parse { .. })));
    }

    #[test]
    fn test_unclosed_comment_error() {
        assert!(parse_stylesheet("a {} /* never closed", "broken.css").is_err());
    }

    #[test]
    fn test_unexpected_close_brace() {
        assert!(parse_stylesheet("a {} }", "broken.css").is_err());
    }
}
