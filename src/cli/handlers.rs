// FILE: src/cli/handlers.rs
use crate::{
    check_source, cli::OutputFormat, process_file_with_options, process_source_with_options,
    AtVarsError, ProcessOptions, ProcessReport, ProcessStats, Result,
};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::fs;
use std::path::Path;
use std::sync::mpsc::channel;

// --- PROCESS ---
pub fn handle_process_command(cli: &super::EnhancedCli, matches: &clap::ArgMatches) -> Result<()> {
    let input_path = required_input(matches)?;
    let output_path = matches.get_one::<String>("output");
    let format = matches
        .get_one::<OutputFormat>("format")
        .cloned()
        .unwrap_or(OutputFormat::Text);

    let options = cli.build_process_options(matches)?;

    if matches.get_flag("watch") {
        let output_path = output_path.ok_or_else(|| AtVarsError::InvalidFormat {
            message: "--watch requires an --output file".to_string(),
        })?;
        return watch_and_process(input_path, output_path, &options);
    }

    let stats = match output_path {
        Some(output_path) => {
            let stats = process_file_with_options(input_path, output_path, &options)?;
            eprintln!("✅ {} -> {}", input_path, output_path);
            stats
        }
        None => {
            let source = fs::read_to_string(input_path).map_err(|e| AtVarsError::FileNotFound {
                path: format!("{}: {}", input_path, e),
            })?;
            let (output, stats) = process_source_with_options(&source, input_path, &options)?;
            print!("{}", output);
            stats
        }
    };

    if matches.get_flag("stats") {
        print_stats(&stats, &format)?;
    }

    Ok(())
}

fn print_stats(stats: &ProcessStats, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(stats).map_err(|e| AtVarsError::InvalidFormat {
                message: format!("JSON serialization error: {}", e),
            })?;
            eprintln!("{}", json);
        }
        OutputFormat::Text => {
            eprintln!("\n📊 Processing Statistics:");
            eprintln!("   Source: {} bytes", stats.source_size);
            eprintln!("   Output: {} bytes", stats.output_size);
            eprintln!("   Nodes: {}", stats.node_count);
            eprintln!("   Custom properties: {}", stats.report.custom_properties);
            eprintln!("   At-rules visited: {}", stats.report.at_rules_visited);
            eprintln!("   At-rules rewritten: {}", stats.report.at_rules_rewritten);
            eprintln!("   Substitutions: {}", stats.report.substitutions);
            eprintln!("   Circular references cut: {}", stats.report.cycles_broken);
            eprintln!("   Unresolved references: {}", stats.report.unresolved.len());
            eprintln!("   Time: {}ms", stats.process_time_ms);
        }
    }
    Ok(())
}

fn watch_and_process(input_path: &str, output_path: &str, options: &ProcessOptions) -> Result<()> {
    println!("👀 Watching {} for changes...", input_path);

    let (tx, rx) = channel();
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| {
            if let Ok(event) = res {
                if let Err(e) = tx.send(event) {
                    eprintln!("Watch error: {}", e);
                }
            }
        },
        notify::Config::default(),
    )
    .map_err(|e| {
        AtVarsError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("Failed to create file watcher: {}", e),
        ))
    })?;

    watcher
        .watch(Path::new(input_path), RecursiveMode::NonRecursive)
        .map_err(|e| {
            AtVarsError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Failed to watch file: {}", e),
            ))
        })?;

    if let Err(e) = process_file_with_options(input_path, output_path, options) {
        eprintln!("❌ Initial processing failed: {}", e);
    } else {
        println!("✅ Initial processing successful");
    }

    loop {
        match rx.recv() {
            Ok(event) => {
                if !event.kind.is_modify() && !event.kind.is_create() {
                    continue;
                }
                println!("🔄 File changed, reprocessing...");
                match process_file_with_options(input_path, output_path, options) {
                    Ok(stats) => println!(
                        "✅ Reprocessed ({} substitutions, {}ms)",
                        stats.report.substitutions, stats.process_time_ms
                    ),
                    Err(e) => eprintln!("❌ Processing failed: {}", e),
                }
            }
            Err(e) => {
                eprintln!("Watch error: {}", e);
                break;
            }
        }
    }

    Ok(())
}

// --- CHECK ---
pub fn handle_check_command(cli: &super::EnhancedCli, matches: &clap::ArgMatches) -> Result<()> {
    let input_path = required_input(matches)?;
    let recursive = matches.get_flag("recursive");
    let options = cli.build_process_options(matches)?;

    if recursive && Path::new(input_path).is_dir() {
        check_directory_recursive(input_path, &options)
    } else {
        check_single_file(input_path, &options).map(|_| ())
    }
}

fn check_single_file(input_path: &str, options: &ProcessOptions) -> Result<ProcessReport> {
    println!("🔍 Checking {}", input_path);
    let source = fs::read_to_string(input_path).map_err(|e| AtVarsError::FileNotFound {
        path: format!("{}: {}", input_path, e),
    })?;

    match check_source(&source, input_path, options) {
        Ok(report) => {
            print_check_report(input_path, &report);
            Ok(report)
        }
        Err(e) => {
            println!("❌ {} - {}", input_path, e);
            Err(e)
        }
    }
}

fn print_check_report(input_path: &str, report: &ProcessReport) {
    if report.unresolved.is_empty() {
        println!("✅ {} - {} at-rules, no unresolved references", input_path, report.at_rules_visited);
        return;
    }
    for reference in &report.unresolved {
        println!(
            "⚠️  {}:{} @{} references {} which has no known value",
            input_path, reference.position, reference.at_rule, reference.name
        );
    }
}

fn check_directory_recursive(dir_path: &str, options: &ProcessOptions) -> Result<()> {
    let mut total_files = 0;
    let mut error_files = 0;
    let mut unresolved = 0;

    for entry in walkdir::WalkDir::new(dir_path) {
        let entry = entry.map_err(|e| {
            AtVarsError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Directory traversal error: {}", e),
            ))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().map_or(false, |ext| ext == "css") {
            total_files += 1;
            match check_single_file(&entry.path().to_string_lossy(), options) {
                Ok(report) => unresolved += report.unresolved.len(),
                Err(_) => error_files += 1,
            }
        }
    }

    println!("\n📊 Check Summary:");
    println!("   Total files: {}", total_files);
    println!("   Files with errors: {}", error_files);
    println!("   Unresolved references: {}", unresolved);

    if error_files > 0 {
        Err(AtVarsError::InvalidFormat {
            message: format!("{} files have errors", error_files),
        })
    } else {
        Ok(())
    }
}

fn required_input(matches: &clap::ArgMatches) -> Result<&String> {
    matches.get_one::<String>("input").ok_or_else(|| AtVarsError::InvalidFormat {
        message: "Missing input path".to_string(),
    })
}
