//! atvars: resolve CSS custom properties inside at-rule parameters
//!
//! Preprocessor directives such as `@for`, `@if` or `@custom-media` are
//! evaluated at build time, so a `var(--name)` inside their parameters has to be
//! replaced with a static value before they run. This crate does exactly that
//! and nothing more: `var()` in ordinary declarations is left alone.
//!
//! # Basic Usage
//!
//! ```rust
//! use atvars::process_source;
//!
//! let css = ":root { --to: 3; } @for $i from 1 to var(--to) {}";
//! assert_eq!(process_source(css).unwrap(), ":root { --to: 3; } @for $i from 1 to 3 {}");
//! ```
//!
//! # Processing Pipeline
//!
//! 1. **Parse** - Build a lossless stylesheet tree
//! 2. **Scan** - Record custom property declarations
//! 3. **Resolve** - Rewrite the parameters of eligible at-rules
//! 4. **Serialize** - Write the tree back to CSS text

pub mod ast;
pub mod at_rules;
pub mod cli;
pub mod error;
pub mod orchestrator;
pub mod overrides;
pub mod parser;
pub mod property_table;
pub mod resolver;

use serde::Serialize;
use std::collections::HashMap;

// Re-export commonly used types and functions
pub use ast::{AtRule, Comment, Declaration, Node, Position, Rule, Stylesheet};
pub use at_rules::{AtRuleFilter, DEFAULT_AT_RULES};
pub use cli::EnhancedCli;
pub use error::{AtVarsError, Result};
pub use orchestrator::{
    Orchestrator, Phase, ProcessReport, ResolutionConfig, TraversalMode, UnresolvedReference,
};
pub use overrides::VariableOverrides;
pub use parser::{parse_stylesheet, Parser};
pub use property_table::{CustomProperty, PropertyTable};
pub use resolver::{ParameterToken, ReferenceResolver, ResolutionGuard, ResolutionOutcome};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Processing options
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// At-rule names resolved in addition to [`DEFAULT_AT_RULES`]
    pub at_rules: Vec<String>,

    /// Custom property values that win over the stylesheet's own declarations
    pub variables: HashMap<String, String>,

    /// Collect every declaration before resolving any at-rule
    pub declaration_by_walk: bool,
}

impl ProcessOptions {
    /// Validate the options and build the resolution configuration
    pub fn to_config(&self) -> Result<ResolutionConfig> {
        Ok(ResolutionConfig {
            filter: AtRuleFilter::with_additional(&self.at_rules),
            overrides: VariableOverrides::from_map(&self.variables)?,
            mode: if self.declaration_by_walk {
                TraversalMode::DeclarationByWalk
            } else {
                TraversalMode::DocumentOrder
            },
        })
    }
}

/// Processing statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessStats {
    /// Input size in bytes
    pub source_size: u64,

    /// Output size in bytes
    pub output_size: u64,

    /// Number of nodes in the parsed tree
    pub node_count: usize,

    #[serde(flatten)]
    pub report: ProcessReport,

    /// Processing time in milliseconds
    pub process_time_ms: u64,
}

/// Process a file with default options
pub fn process_file(input_path: &str, output_path: &str) -> Result<ProcessStats> {
    process_file_with_options(input_path, output_path, &ProcessOptions::default())
}

/// Process a file and write the result to `output_path`
pub fn process_file_with_options(
    input_path: &str,
    output_path: &str,
    options: &ProcessOptions,
) -> Result<ProcessStats> {
    use std::fs;
    use std::time::Instant;

    let start_time = Instant::now();
    log::info!("Processing '{}' to '{}'...", input_path, output_path);

    let source = fs::read_to_string(input_path).map_err(|e| AtVarsError::FileNotFound {
        path: format!("{}: {}", input_path, e),
    })?;

    let (output, mut stats) = process_source_with_options(&source, input_path, options)?;

    fs::write(output_path, &output)?;

    stats.process_time_ms = start_time.elapsed().as_millis() as u64;
    log::info!(
        "Processed {}: {} at-rules rewritten, {} substitutions in {}ms",
        input_path, stats.report.at_rules_rewritten, stats.report.substitutions, stats.process_time_ms
    );

    Ok(stats)
}

/// Process CSS source with default options
pub fn process_source(source: &str) -> Result<String> {
    let (output, _stats) = process_source_with_options(source, "<input>", &ProcessOptions::default())?;
    Ok(output)
}

/// Process CSS source with custom options
pub fn process_source_with_options(
    source: &str,
    filename: &str,
    options: &ProcessOptions,
) -> Result<(String, ProcessStats)> {
    let config = options.to_config()?;
    log::debug!("Eligible at-rules: {}", config.filter.names().join(", "));
    if !config.overrides.is_empty() {
        log::debug!("{} custom property overrides configured", config.overrides.len());
    }

    let mut sheet = parse_stylesheet(source, filename)?;
    let report = Orchestrator::new(&config).run(&mut sheet);
    let output = sheet.to_string();

    let stats = ProcessStats {
        source_size: source.len() as u64,
        output_size: output.len() as u64,
        node_count: sheet.node_count(),
        report,
        process_time_ms: 0,
    };

    Ok((output, stats))
}

/// Resolve for the report only; the rewritten stylesheet is discarded
pub fn check_source(source: &str, filename: &str, options: &ProcessOptions) -> Result<ProcessReport> {
    let config = options.to_config()?;
    let sheet = parse_stylesheet(source, filename)?;
    Ok(Orchestrator::new(&config).inspect(sheet))
}
