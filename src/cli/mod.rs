//! CLI module for Recast.

pub mod commands;
mod output;

pub use output::{content_preview, format_timestamp, Output};

use crate::content::SectionKey;
use clap::{Parser, Subcommand};

/// Recast - turn transcripts into publishable content
///
/// Processes a talk or livestream transcript into insights, book chapters,
/// blog posts and social media posts written in the speaker's own voice.
#[derive(Parser, Debug)]
#[command(name = "recast")]
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
    /// Process a transcript file (.txt or .md) and save the result
    Process {
        /// Path to the transcript file
        file: String,

        /// Print the saved record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a processed transcript
    Show {
        /// Record ID
        id: String,

        /// Only show one section (insights, chapters, blogs, social)
        #[arg(short, long)]
        section: Option<SectionKey>,
    },

    /// List processed transcripts, newest first
    List,

    /// Export a processed transcript
    Export {
        /// Record ID
        id: String,

        /// Export one section as plain text instead of the complete JSON
        #[arg(short, long)]
        section: Option<SectionKey>,

        /// Output file or directory (stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Show processing statistics
    Stats,

    /// Start HTTP API server for integration with other systems
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

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
