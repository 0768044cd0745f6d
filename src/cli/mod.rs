//! CLI module for course-rag
//!
//! Provides command-line parsing and the non-server subcommands.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod commands;
pub mod output;

use crate::utils::toml_config::DEFAULT_CONFIG_FILE;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// course-rag - question answering over course material
///
/// Loads course documents into a vector store and answers questions about
/// them with an LLM that searches the material through tools.
#[derive(Parser, Debug)]
#[command(
    name = "course-rag",
    version,
    about = "Course material question-answering server",
    long_about = "Loads course documents into a vector store and answers questions about them\n\
                  with an LLM that searches the material through tools.\n\n\
                  Run without arguments to ingest the docs folder and start the server.",
    after_help = "EXAMPLES:\n    \
                  course-rag                          # Ingest docs/ and start the server\n    \
                  course-rag ingest ./courses --clear # Reload a folder of course files\n    \
                  course-rag config --validate        # Check the configuration\n    \
                  course-rag --config my.toml serve   # Use a custom config file"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE, global = true)]
    pub config: PathBuf,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Ingest the configured docs folder, then serve the HTTP API
    Serve,

    /// Load a folder of course files into the configured vector store
    Ingest {
        /// Folder containing .txt / .md course files
        path: PathBuf,

        /// Delete all stored courses before loading
        #[arg(long)]
        clear: bool,
    },

    /// Show the effective configuration
    Config {
        /// Only validate the configuration file
        #[arg(long)]
        validate: bool,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
