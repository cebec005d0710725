// FILE: src/cli/config.rs

use crate::error::{AtVarsError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    pub at_rules: Option<Vec<String>>,
    pub variables: Option<HashMap<String, String>>,
    pub declaration_by_walk: Option<bool>,
}

pub fn load(config_path: &str) -> Result<ConfigFile> {
    let config_content = fs::read_to_string(config_path).map_err(|e| AtVarsError::FileNotFound {
        path: format!("Config file {}: {}", config_path, e),
    })?;

    let config = parse(config_path, &config_content)?;
    log::info!("Loaded configuration from {}", config_path);
    Ok(config)
}

fn parse(config_path: &str, config_content: &str) -> Result<ConfigFile> {
    if config_path.ends_with(".json") {
        serde_json::from_str(config_content).map_err(|e| AtVarsError::InvalidFormat {
            message: format!("Invalid JSON config: {}", e),
        })
    } else if config_path.ends_with(".toml") {
        toml::from_str(config_content).map_err(|e| AtVarsError::InvalidFormat {
            message: format!("Invalid TOML config: {}", e),
        })
    } else {
        Err(AtVarsError::InvalidFormat {
            message: "Config file must be .json or .toml format".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("atvars.json");
        fs::write(
            &path,
            r#"{ "atRules": ["media"], "variables": { "--green": "green" }, "declarationByWalk": true }"#,
        )
        .unwrap();

        let config = load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.at_rules, Some(vec!["media".to_string()]));
        assert_eq!(
            config.variables.unwrap().get("--green").map(String::as_str),
            Some("green")
        );
        assert_eq!(config.declaration_by_walk, Some(true));
    }

    #[test]
    fn test_parse_toml() {
        let content = r#"
atRules = ["supports"]

[variables]
"--gap" = "4px"
"#;
        let config = parse("atvars.toml", content).unwrap();
        assert_eq!(config.at_rules, Some(vec!["supports".to_string()]));
        assert_eq!(config.declaration_by_walk, None);
        assert!(config.variables.unwrap().contains_key("--gap"));
    }

    #[test]
    fn test_rejects_unknown_extension() {
        let result = parse("atvars.yaml", "atRules: []");
        assert!(matches!(result, Err(AtVarsError::InvalidFormat { .. })));
    }

    #[test]
    fn test_missing_file() {
        let result = load("/nonexistent/atvars.json");
        assert!(matches!(result, Err(AtVarsError::FileNotFound { .. })));
    }
}
