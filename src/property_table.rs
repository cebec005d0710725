//! Custom property table built while walking a stylesheet

use crate::ast::{Declaration, Position};
use std::collections::HashMap;

/// A custom property definition found in the stylesheet
#[derive(Debug, Clone, PartialEq)]
pub struct CustomProperty {
    pub name: String,
    /// Raw value as authored; may still contain `var()` references
    pub value: String,
    pub defined_at: Position,
}

/// Latest known value of every custom property seen so far
#[derive(Debug, Clone, Default)]
pub struct PropertyTable {
    properties: HashMap<String, CustomProperty>,
}

impl PropertyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a declaration if it defines a custom property.
    /// Returns `true` when the declaration was recorded.
    pub fn record(&mut self, decl: &Declaration) -> bool {
        if !decl.is_custom_property() {
            return false;
        }

        if let Some(existing) = self.properties.get(&decl.prop) {
            log::debug!(
                "{}: custom property '{}' redefined (previous definition at {})",
                decl.position, decl.prop, existing.defined_at
            );
        }

        self.properties.insert(
            decl.prop.clone(),
            CustomProperty {
                name: decl.prop.clone(),
                value: decl.value.clone(),
                defined_at: decl.position,
            },
        );
        true
    }

    pub fn get(&self, name: &str) -> Option<&CustomProperty> {
        self.properties.get(name)
    }

    /// Raw value of a property, if defined
    pub fn value_of(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(|prop| prop.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Property names in sorted order (for debugging)
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.properties.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(prop: &str, value: &str, line: usize) -> Declaration {
        Declaration {
            prop: prop.to_string(),
            value: value.to_string(),
            position: Position::new(line, 1),
            before: String::new(),
            between: ": ".to_string(),
            after_value: String::new(),
            semicolon: true,
        }
    }

    #[test]
    fn test_last_write_wins() {
        let mut table = PropertyTable::new();
        assert!(table.record(&decl("--gap", "4px", 1)));
        assert!(table.record(&decl("--gap", "8px", 2)));

        let prop = table.get("--gap").unwrap();
        assert_eq!(prop.value, "8px");
        assert_eq!(prop.defined_at, Position::new(2, 1));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_regular_declarations_are_skipped() {
        let mut table = PropertyTable::new();
        assert!(!table.record(&decl("color", "red", 1)));
        assert!(table.is_empty());
    }

    #[test]
    fn test_values_are_stored_unresolved() {
        let mut table = PropertyTable::new();
        table.record(&decl("--a", "var(--b)", 1));
        assert_eq!(table.value_of("--a"), Some("var(--b)"));
        assert_eq!(table.value_of("--b"), None);
    }

    #[test]
    fn test_names_sorted() {
        let mut table = PropertyTable::new();
        table.record(&decl("--z", "1", 1));
        table.record(&decl("--a", "2", 2));
        assert_eq!(table.names(), vec!["--a", "--z"]);
    }
}
