//! Command-line argument definitions for the Meridian CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. A subcommand selects the operation; global options control
//! configuration file selection and logging verbosity.

use clap::{Parser, Subcommand};

/// Command-line arguments for the Meridian model graph tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build an entity collection and report its diagnostics
    Check {
        /// Path to the input entity JSON file
        input: String,
    },

    /// Print the structural hash of every element
    Hash {
        /// Path to the input entity JSON file
        input: String,

        /// Write the hashes to this file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Build, write back and compare an entity collection
    Roundtrip {
        /// Path to the input entity JSON file
        input: String,

        /// Write the serialized entities to this file
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Compare two entity collections element by element
    Diff {
        /// Path to the original entity JSON file
        before: String,

        /// Path to the changed entity JSON file
        after: String,
    },
}
