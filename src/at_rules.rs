//! Which at-rules get their parameters resolved

use std::collections::HashSet;

/// At-rules resolved out of the box; configuration can only add to this set
pub const DEFAULT_AT_RULES: &[&str] = &["for", "if", "else", "each", "mixin", "custom-media"];

#[derive(Debug, Clone)]
pub struct AtRuleFilter {
    eligible: HashSet<String>,
}

impl AtRuleFilter {
    /// Filter with only the built-in at-rules
    pub fn new() -> Self {
        Self {
            eligible: DEFAULT_AT_RULES.iter().map(|name| name.to_string()).collect(),
        }
    }

    /// Built-in at-rules plus the configured ones
    pub fn with_additional<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut filter = Self::new();
        for name in names {
            let normalized = normalize(name.as_ref());
            if normalized.is_empty() {
                log::warn!("Ignoring empty at-rule name in configuration");
                continue;
            }
            filter.eligible.insert(normalized);
        }
        filter
    }

    pub fn is_eligible(&self, name: &str) -> bool {
        self.eligible.contains(&normalize(name))
    }

    /// Eligible names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.eligible.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for AtRuleFilter {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(name: &str) -> String {
    name.trim().trim_start_matches('@').to_ascii_lowercase()
}
