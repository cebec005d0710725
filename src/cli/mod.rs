// FILE: src/cli/mod.rs

mod config;
mod handlers;

use crate::error::{AtVarsError, Result};
use crate::ProcessOptions;
use clap::{Arg, ArgAction, Command, ValueEnum};
use std::time::Instant;

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

pub struct EnhancedCli {
    config: config::ConfigFile,
    start_time: Instant,
}

impl EnhancedCli {
    pub fn new() -> Self {
        Self {
            config: config::ConfigFile::default(),
            start_time: Instant::now(),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        self.start_time = Instant::now();
        let matches = self.build_cli().get_matches();

        self.setup_logging(matches.get_count("verbose"))?;

        if let Some(config_path) = matches.get_one::<String>("config") {
            self.config = config::load(config_path)?;
        }

        let result = match matches.subcommand() {
            Some(("process", sub_matches)) => handlers::handle_process_command(self, sub_matches),
            Some(("check", sub_matches)) => handlers::handle_check_command(self, sub_matches),
            _ => {
                println!("No subcommand specified. Use --help for usage information.");
                Ok(())
            }
        };

        log::debug!("Finished in {}ms", self.start_time.elapsed().as_millis());
        result
    }

    fn build_cli(&self) -> Command {
        Command::new(crate::NAME)
            .version(crate::VERSION)
            .about(crate::DESCRIPTION)
            .author("atvars Development Team")
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_name("FILE")
                    .help("Configuration file path (.json or .toml)")
                    .action(ArgAction::Set),
            )
            .arg(
                Arg::new("verbose")
                    .short('v')
                    .long("verbose")
                    .help("Increase verbosity (can be used multiple times)")
                    .action(ArgAction::Count),
            )
            .subcommand(
                Command::new("process")
                    .about("Resolve custom properties in at-rule parameters")
                    .arg(Arg::new("input").help("Input CSS file").required(true).index(1))
                    .arg(Arg::new("output").short('o').long("output").value_name("FILE").help("Output CSS file (stdout when omitted)"))
                    .args(resolution_args())
                    .arg(Arg::new("format").short('f').long("format").value_parser(clap::value_parser!(OutputFormat)).default_value("text").help("Statistics output format"))
                    .arg(Arg::new("stats").long("stats").help("Show detailed processing statistics").action(ArgAction::SetTrue))
                    .arg(Arg::new("watch").short('w').long("watch").help("Watch for file changes and reprocess").action(ArgAction::SetTrue)),
            )
            .subcommand(
                Command::new("check")
                    .about("Report unresolved references in CSS files")
                    .arg(Arg::new("input").help("Input CSS file or directory").required(true).index(1))
                    .args(resolution_args())
                    .arg(Arg::new("recursive").short('r').long("recursive").help("Check all CSS files in directory recursively").action(ArgAction::SetTrue)),
            )
    }

    fn setup_logging(&self, verbose_count: u8) -> Result<()> {
        let log_level = match verbose_count {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };
        env_logger::Builder::from_default_env()
            .filter_level(log_level)
            .format_timestamp_secs()
            .init();
        Ok(())
    }

    pub fn build_process_options(&self, matches: &clap::ArgMatches) -> Result<ProcessOptions> {
        let mut options = ProcessOptions::default();

        if let Some(at_rules) = matches.get_many::<String>("at-rule") {
            options.at_rules.extend(at_rules.cloned());
        }
        if let Some(config_at_rules) = &self.config.at_rules {
            options.at_rules.extend(config_at_rules.iter().cloned());
        }

        if let Some(defines) = matches.get_many::<String>("define") {
            for define in defines {
                let (name, value) = parse_define(define)?;
                options.variables.insert(name, value);
            }
        }
        if let Some(config_vars) = &self.config.variables {
            for (name, value) in config_vars {
                options.variables.entry(name.clone()).or_insert_with(|| value.clone());
            }
        }

        options.declaration_by_walk =
            matches.get_flag("by-walk") || self.config.declaration_by_walk.unwrap_or(false);

        Ok(options)
    }
}

impl Default for EnhancedCli {
    fn default() -> Self {
        Self::new()
    }
}

/// Options shared by every subcommand that resolves a stylesheet
fn resolution_args() -> Vec<Arg> {
    vec![
        Arg::new("at-rule")
            .short('a')
            .long("at-rule")
            .value_name("NAME")
            .help("Also resolve parameters of this at-rule")
            .action(ArgAction::Append),
        Arg::new("define")
            .short('D')
            .long("define")
            .value_name("--NAME=VALUE")
            .help("Define a custom property value that overrides the stylesheet")
            .allow_hyphen_values(true)
            .action(ArgAction::Append),
        Arg::new("by-walk")
            .long("by-walk")
            .help("Collect all custom properties before resolving any at-rule")
            .action(ArgAction::SetTrue),
    ]
}

fn parse_define(define: &str) -> Result<(String, String)> {
    match define.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(AtVarsError::InvalidFormat {
            message: format!("Invalid variable definition: {}. Use --NAME=VALUE format.", define),
        }),
    }
}
