//! Externally supplied custom property values

use crate::ast::is_custom_property_name;
use crate::error::{AtVarsError, Result};
use std::collections::HashMap;

/// Literal values injected by configuration.
/// They take precedence over values declared in the stylesheet.
#[derive(Debug, Clone, Default)]
pub struct VariableOverrides {
    values: HashMap<String, String>,
}

impl VariableOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build overrides from a name → value map, rejecting names without the `--` prefix
    pub fn from_map(values: &HashMap<String, String>) -> Result<Self> {
        for name in values.keys() {
            if !is_custom_property_name(name) {
                return Err(AtVarsError::config(format!(
                    "Invalid variable name '{}': custom properties must start with '--'",
                    name
                )));
            }
        }
        Ok(Self {
            values: values.clone(),
        })
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_map() {
        let mut map = HashMap::new();
        map.insert("--green".to_string(), "green".to_string());
        let overrides = VariableOverrides::from_map(&map).unwrap();
        assert_eq!(overrides.get("--green"), Some("green"));
        assert_eq!(overrides.get("--red"), None);
        assert_eq!(overrides.len(), 1);
    }

    #[test]
    fn test_rejects_names_without_prefix() {
        let mut map = HashMap::new();
        map.insert("green".to_string(), "green".to_string());
        let result = VariableOverrides::from_map(&map);
        assert!(matches!(result, Err(AtVarsError::Config { .. })));
    }
}
