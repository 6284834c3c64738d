//! CLI logic for the Meridian model graph tool.
//!
//! Every subcommand reads entity collections (a JSON array of entities or an
//! object with an `entities` array), builds them with a [`GraphManager`]
//! configured from the loaded configuration and writes its report to stdout
//! or to the requested output file.

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, Command};

use std::{
    fs,
    io::{self, Write},
};

use log::info;
use serde::Serialize;

use meridian::{GraphManager, MeridianError, entities_to_json, roundtrip_mismatches};

/// One line of the `hash` report.
#[derive(Debug, Serialize)]
struct HashEntry<'a> {
    path: &'a str,
    hash: String,
}

/// Run the Meridian CLI application
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `MeridianError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Build errors, carrying the diagnostics and the input JSON
/// - Entities that don't survive the round trip
pub fn run(args: &Args) -> Result<(), MeridianError> {
    let app_config = config::load_config(args.config.as_ref())?;
    let manager = GraphManager::new(app_config)?;

    match &args.command {
        Command::Check { input } => check(&manager, input),
        Command::Hash { input, output } => hash(&manager, input, output.as_deref()),
        Command::Roundtrip { input, output } => roundtrip(&manager, input, output.as_deref()),
        Command::Diff { before, after } => diff(&manager, before, after),
    }
}

fn check(manager: &GraphManager, input: &str) -> Result<(), MeridianError> {
    info!(input_path = input; "Checking entities");

    let source = fs::read_to_string(input)?;
    let graph = manager.build_graph_from_json(&source)?;

    emit(None, &format!("{input}: {} elements, no errors\n", graph.len()))?;
    Ok(())
}

fn hash(manager: &GraphManager, input: &str, output: Option<&str>) -> Result<(), MeridianError> {
    info!(input_path = input; "Hashing entities");

    let source = fs::read_to_string(input)?;
    let graph = manager.build_graph_from_json(&source)?;
    let index = manager.hash_index(&graph)?;

    let entries: Vec<HashEntry> = index
        .iter()
        .map(|(path, hash)| HashEntry {
            path,
            hash: hash.to_string(),
        })
        .collect();
    let mut report = serde_json::to_string_pretty(&entries)?;
    report.push('\n');

    emit(output, &report)?;
    info!(elements = entries.len(); "Hashes written");
    Ok(())
}

fn roundtrip(manager: &GraphManager, input: &str, output: Option<&str>) -> Result<(), MeridianError> {
    info!(input_path = input; "Checking round trip");

    let source = fs::read_to_string(input)?;
    let entities = meridian::parse_entities(&source)
        .map_err(|diagnostic| MeridianError::new_build_error(diagnostic.into(), source.as_str()))?;
    let graph = manager.build_graph_from_json(&source)?;
    let written = manager.serialize_graph(&graph)?;

    if let Some(output) = output {
        fs::write(output, entities_to_json(&written)?)?;
        info!(output_file = output; "Serialized entities written");
    }

    let mismatches = roundtrip_mismatches(&entities, &written);
    if !mismatches.is_empty() {
        return Err(MeridianError::Roundtrip {
            paths: mismatches
                .iter()
                .map(|mismatch| mismatch.path().to_string())
                .collect(),
        });
    }

    emit(None, &format!("{input}: {} entities round trip\n", entities.len()))?;
    Ok(())
}

fn diff(manager: &GraphManager, before: &str, after: &str) -> Result<(), MeridianError> {
    info!(before_path = before, after_path = after; "Comparing entities");

    let read = |path: &str| -> Result<_, MeridianError> {
        let source = fs::read_to_string(path)?;
        meridian::parse_entities(&source)
            .map_err(|diagnostic| MeridianError::new_build_error(diagnostic.into(), source))
    };
    let diff = manager.diff(&read(before)?, &read(after)?)?;

    emit(None, &diff.to_string())?;
    Ok(())
}

/// Writes `content` to `output`, or to stdout when no file is given.
fn emit(output: Option<&str>, content: &str) -> io::Result<()> {
    match output {
        Some(path) => fs::write(path, content),
        None => io::stdout().lock().write_all(content.as_bytes()),
    }
}
