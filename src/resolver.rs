//! `var()` reference resolution for at-rule parameters
//!
//! References are looked up in the configured overrides first and then in the
//! property table. Values found are themselves resolved before substitution so
//! that chains of custom properties collapse to their final literal. Each name
//! is expanded at most once per top-level call: any later request for it,
//! whether it is still being expanded (a cycle) or already done, gets its raw
//! value instead. Output size therefore stays linear in the input and table.
//!
//! `var()` text inside `/* ... */` comments is never rewritten.

use crate::overrides::VariableOverrides;
use crate::property_table::PropertyTable;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// `var(--name)` with optional inner whitespace; fallback arguments are not matched
const VAR_PATTERN: &str = r"var\(\s*(--[\w-]+)\s*\)";

/// A complete or unterminated block comment
const COMMENT_PATTERN: &str = r"(?s)/\*.*?(?:\*/|\z)";

fn var_regex() -> &'static Regex {
    static VAR_REGEX: OnceLock<Regex> = OnceLock::new();
    VAR_REGEX.get_or_init(|| Regex::new(VAR_PATTERN).expect("var() pattern is valid"))
}

fn comment_regex() -> &'static Regex {
    static COMMENT_REGEX: OnceLock<Regex> = OnceLock::new();
    COMMENT_REGEX.get_or_init(|| Regex::new(COMMENT_PATTERN).expect("comment pattern is valid"))
}

/// One `var(--name)` occurrence inside a parameter string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterToken<'a> {
    /// Byte offset of `v`
    pub start: usize,
    /// Byte offset just past `)`
    pub end: usize,
    pub name: &'a str,
}

/// Names expanded during one top-level resolution.
/// A name stays visited after its expansion finishes.
#[derive(Debug, Default)]
pub struct ResolutionGuard {
    visited: HashSet<String>,
    in_progress: HashSet<String>,
}

impl ResolutionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start expanding `name`. Returns `false` if it was already expanded
    /// or is being expanded.
    pub fn enter(&mut self, name: &str) -> bool {
        if !self.visited.insert(name.to_string()) {
            return false;
        }
        self.in_progress.insert(name.to_string());
        true
    }

    /// Finish expanding `name`; it remains visited
    pub fn leave(&mut self, name: &str) {
        self.in_progress.remove(name);
    }

    /// Whether `name` is on the current expansion chain
    pub fn is_in_progress(&self, name: &str) -> bool {
        self.in_progress.contains(name)
    }
}

/// Result of resolving one parameter string
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolutionOutcome {
    pub value: String,
    /// `var()` tokens replaced, nested ones included
    pub substitutions: usize,
    /// Referenced names with no known value, in order of appearance
    pub unresolved: Vec<String>,
    /// Times a circular reference was cut short
    pub cycles_broken: usize,
}

impl ResolutionOutcome {
    pub fn changed(&self) -> bool {
        self.substitutions > 0
    }
}

pub struct ReferenceResolver {
    var_regex: &'static Regex,
    comment_regex: &'static Regex,
}

impl ReferenceResolver {
    pub fn new() -> Self {
        Self {
            var_regex: var_regex(),
            comment_regex: comment_regex(),
        }
    }

    /// All `var(--name)` occurrences in `input` outside comments, in order
    pub fn tokens<'a>(&self, input: &'a str) -> Vec<ParameterToken<'a>> {
        let comments: Vec<(usize, usize)> = if input.contains("/*") {
            self.comment_regex
                .find_iter(input)
                .map(|m| (m.start(), m.end()))
                .collect()
        } else {
            Vec::new()
        };

        self.var_regex
            .captures_iter(input)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let name = caps.get(1)?;
                Some(ParameterToken {
                    start: whole.start(),
                    end: whole.end(),
                    name: name.as_str(),
                })
            })
            .filter(|token| {
                !comments
                    .iter()
                    .any(|&(start, end)| token.start >= start && token.start < end)
            })
            .collect()
    }

    /// Whether `input` could contain a reference; cheap pre-check before [`Self::resolve`]
    pub fn has_references(&self, input: &str) -> bool {
        self.var_regex.is_match(input)
    }

    /// Substitute every resolvable `var()` reference in `input`
    pub fn resolve(&self, input: &str, table: &PropertyTable, overrides: &VariableOverrides) -> ResolutionOutcome {
        let mut outcome = ResolutionOutcome::default();
        let mut guard = ResolutionGuard::new();
        outcome.value = self.expand(input, table, overrides, &mut guard, &mut outcome);
        outcome
    }

    fn expand(
        &self,
        input: &str,
        table: &PropertyTable,
        overrides: &VariableOverrides,
        guard: &mut ResolutionGuard,
        outcome: &mut ResolutionOutcome,
    ) -> String {
        let tokens = self.tokens(input);
        if tokens.is_empty() {
            return input.to_string();
        }

        let mut output = String::with_capacity(input.len());
        let mut last = 0;

        for token in tokens {
            output.push_str(&input[last..token.start]);
            last = token.end;

            let raw_value = match lookup(token.name, table, overrides) {
                Some(value) => value,
                None => {
                    log::debug!("No value for '{}', leaving reference unresolved", token.name);
                    outcome.unresolved.push(token.name.to_string());
                    output.push_str(&input[token.start..token.end]);
                    continue;
                }
            };

            if !guard.enter(token.name) {
                if guard.is_in_progress(token.name) {
                    log::debug!("Circular reference through '{}', substituting its raw value", token.name);
                    outcome.cycles_broken += 1;
                } else {
                    log::trace!("'{}' already expanded, substituting its raw value", token.name);
                }
                outcome.substitutions += 1;
                output.push_str(raw_value);
                continue;
            }

            let expanded = self.expand(raw_value, table, overrides, guard, outcome);
            guard.leave(token.name);

            outcome.substitutions += 1;
            output.push_str(&expanded);
        }

        output.push_str(&input[last..]);
        output
    }
}

impl Default for ReferenceResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn lookup<'a>(name: &str, table: &'a PropertyTable, overrides: &'a VariableOverrides) -> Option<&'a str> {
    overrides.get(name).or_else(|| table.value_of(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Declaration, Position};
    use std::collections::HashMap;

    fn table(entries: &[(&str, &str)]) -> PropertyTable {
        let mut table = PropertyTable::new();
        for (line, (prop, value)) in entries.iter().enumerate() {
            table.record(&Declaration {
                prop: prop.to_string(),
                value: value.to_string(),
                position: Position::new(line + 1, 1),
                before: String::new(),
                between: ": ".to_string(),
                after_value: String::new(),
                semicolon: true,
            });
        }
        table
    }

    fn overrides(entries: &[(&str, &str)]) -> VariableOverrides {
        let map: HashMap<String, String> = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        VariableOverrides::from_map(&map).unwrap()
    }

    #[test]
    fn test_no_references_is_identity() {
        let resolver = ReferenceResolver::new();
        let input = "$i from 1 to 10 /* var */ by 2";
        let outcome = resolver.resolve(input, &table(&[("--a", "1")]), &VariableOverrides::new());
        assert_eq!(outcome.value, input);
        assert!(!outcome.changed());
    }

    #[test]
    fn test_multiple_slots() {
        let resolver = ReferenceResolver::new();
        let t = table(&[("--from", "1"), ("--to", "2"), ("--step", "5")]);
        let outcome = resolver.resolve(
            "$i from var(--from) to var(--to) by var(--step)",
            &t,
            &VariableOverrides::new(),
        );
        assert_eq!(outcome.value, "$i from 1 to 2 by 5");
        assert_eq!(outcome.substitutions, 3);
    }

    #[test]
    fn test_transitive_chain() {
        let resolver = ReferenceResolver::new();
        let t = table(&[("--a", "var(--b)"), ("--b", "var(--c)"), ("--c", "4px")]);
        let outcome = resolver.resolve("(width > var(--a))", &t, &VariableOverrides::new());
        assert_eq!(outcome.value, "(width > 4px)");
    }

    #[test]
    fn test_shared_dependency_resolves_in_every_slot() {
        let resolver = ReferenceResolver::new();
        let t = table(&[("--from", "1"), ("--to", "var(--from)")]);
        let outcome = resolver.resolve("$i from var(--from) to var(--to)", &t, &VariableOverrides::new());
        assert_eq!(outcome.value, "$i from 1 to 1");
        assert_eq!(outcome.cycles_broken, 0);
    }

    #[test]
    fn test_mutual_cycle_terminates() {
        let resolver = ReferenceResolver::new();
        let t = table(&[("--a", "var(--b)"), ("--b", "var(--a)")]);
        let outcome = resolver.resolve("var(--a)", &t, &VariableOverrides::new());
        assert_eq!(outcome.value, "var(--b)");
        assert_eq!(outcome.cycles_broken, 1);
    }

    #[test]
    fn test_self_reference_terminates() {
        let resolver = ReferenceResolver::new();
        let t = table(&[("--x", "calc(var(--x) + 1)")]);
        let outcome = resolver.resolve("var(--x)", &t, &VariableOverrides::new());
        assert_eq!(outcome.value, "calc(calc(var(--x) + 1) + 1)");
        assert_eq!(outcome.cycles_broken, 1);
    }

    #[test]
    fn test_unknown_reference_passes_through() {
        let resolver = ReferenceResolver::new();
        let outcome = resolver.resolve("var(--green) and var( --blue )", &table(&[]), &VariableOverrides::new());
        assert_eq!(outcome.value, "var(--green) and var( --blue )");
        assert_eq!(outcome.unresolved, vec!["--green".to_string(), "--blue".to_string()]);
    }

    #[test]
    fn test_overrides_take_precedence() {
        let resolver = ReferenceResolver::new();
        let t = table(&[("--green", "lime")]);
        let outcome = resolver.resolve("var(--green)", &t, &overrides(&[("--green", "green")]));
        assert_eq!(outcome.value, "green");
    }

    #[test]
    fn test_override_values_are_resolved_against_table() {
        let resolver = ReferenceResolver::new();
        let t = table(&[("--base", "8px")]);
        let outcome = resolver.resolve("var(--gap)", &t, &overrides(&[("--gap", "calc(2 * var(--base))")]));
        assert_eq!(outcome.value, "calc(2 * 8px)");
    }

    #[test]
    fn test_fallback_syntax_is_not_matched() {
        let resolver = ReferenceResolver::new();
        let t = table(&[("--a", "1")]);
        let outcome = resolver.resolve("var(--a, 2)", &t, &VariableOverrides::new());
        assert_eq!(outcome.value, "var(--a, 2)");
    }

    #[test]
    fn test_tokens_offsets() {
        let resolver = ReferenceResolver::new();
        let input = "a var(--x) b";
        let tokens = resolver.tokens(input);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].name, "--x");
        assert_eq!(&input[tokens[0].start..tokens[0].end], "var(--x)");
    }

    #[test]
    fn test_guard_keeps_names_visited() {
        let mut guard = ResolutionGuard::new();
        assert!(guard.enter("--a"));
        assert!(guard.is_in_progress("--a"));
        assert!(!guard.enter("--a"));
        guard.leave("--a");
        assert!(!guard.is_in_progress("--a"));
        assert!(!guard.enter("--a"));
    }

    #[test]
    fn test_repeated_name_uses_raw_value() {
        let resolver = ReferenceResolver::new();
        let t = table(&[("--a", "var(--b)"), ("--b", "4px")]);
        let outcome = resolver.resolve("var(--a) var(--a)", &t, &VariableOverrides::new());
        assert_eq!(outcome.value, "4px var(--b)");
        assert_eq!(outcome.cycles_broken, 0);
    }

    #[test]
    fn test_doubling_chain_stays_linear() {
        let resolver = ReferenceResolver::new();
        let mut entries = vec![("--a0".to_string(), "x".to_string())];
        for n in 1..=20 {
            entries.push((format!("--a{}", n), format!("var(--a{0}) var(--a{0})", n - 1)));
        }
        let borrowed: Vec<(&str, &str)> = entries.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        let t = table(&borrowed);

        let outcome = resolver.resolve("var(--a20)", &t, &VariableOverrides::new());
        assert_eq!(outcome.substitutions, 41);
        assert!(outcome.value.len() < 1024, "output grew to {} bytes", outcome.value.len());
        assert!(outcome.value.starts_with("x x var(--a1) var(--a1)"));
        assert_eq!(outcome.cycles_broken, 0);
    }

    #[test]
    fn test_references_in_comments_untouched() {
        let resolver = ReferenceResolver::new();
        let t = table(&[("--a", "1")]);
        let outcome = resolver.resolve("$i /* var(--a) */ from var(--a) to 2", &t, &VariableOverrides::new());
        assert_eq!(outcome.value, "$i /* var(--a) */ from 1 to 2");
        assert_eq!(outcome.substitutions, 1);
    }

    #[test]
    fn test_has_references() {
        let resolver = ReferenceResolver::new();
        assert!(resolver.has_references("from var(--a)"));
        assert!(!resolver.has_references("from 1 to 2"));
    }
}
