//! CLI module for Aula.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Aula - A RAG chatbot backend for university information sites
///
/// Documents are ingested into a local vector store; the serve command
/// exposes a chat endpoint that answers questions grounded in them.
#[derive(Parser, Debug)]
#[command(name = "aula")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP chat backend
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ingest pre-chunked documents from a JSON file
    Ingest {
        /// Path to a JSON array of {source, title?, content} objects
        file: String,

        /// Delete existing chunks for the file's sources first
        #[arg(long)]
        replace: bool,
    },

    /// Ask a one-shot question against the knowledge base
    Ask {
        /// The question to ask
        question: String,
    },

    /// List indexed sources
    List,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}
