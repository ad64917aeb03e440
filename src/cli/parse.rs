//! CLI parse: clap types for scriptsync. No behavior; definitions only.

use crate::types::{DocumentKind, DocumentRef};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Scriptsync CLI - version and generation coordination for script documents
#[derive(Parser)]
#[command(name = "scriptsync")]
#[command(about = "Generate document versions and manage the selected version")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (for config/ lookup)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, both)
    #[arg(long)]
    pub log_output: Option<String>,
}

/// Identifies one document of a project
#[derive(Args, Debug, Clone)]
pub struct DocumentArgs {
    /// Parent project id
    #[arg(long)]
    pub project: String,

    /// Document kind (story, scene, script)
    #[arg(long, default_value = "story")]
    pub kind: DocumentKind,

    /// Scene key for scene and script documents
    #[arg(long)]
    pub scene: Option<String>,
}

impl DocumentArgs {
    pub fn document(&self) -> DocumentRef {
        match &self.scene {
            Some(key) => DocumentRef::with_scene(self.project.as_str(), self.kind, key.as_str()),
            None => DocumentRef::new(self.project.as_str(), self.kind),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the versions of a document
    Versions {
        #[command(flatten)]
        document: DocumentArgs,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show selected, latest and server-pointer versions of a document
    Status {
        #[command(flatten)]
        document: DocumentArgs,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Submit a generation job and poll until it settles or fails
    Generate {
        #[command(flatten)]
        document: DocumentArgs,
        /// Seed text to generate from
        #[arg(long, conflicts_with = "notes", required_unless_present = "notes")]
        seed: Option<String>,
        /// Revision notes to apply
        #[arg(long)]
        notes: Option<String>,
        /// Model override
        #[arg(long)]
        model: Option<String>,
        /// Number of versions requested (bulk generation)
        #[arg(long, default_value = "1")]
        count: usize,
    },
    /// Select a version to display (only --pin outlasts this invocation)
    Select {
        #[command(flatten)]
        document: DocumentArgs,
        /// Version id (omit with --latest)
        #[arg(required_unless_present = "latest")]
        id: Option<String>,
        /// Remember the selection across runs; without it the choice is a
        /// preview that ends when the command exits
        #[arg(long)]
        pin: bool,
        /// Follow the latest version again
        #[arg(long, conflicts_with_all = ["id", "pin"])]
        latest: bool,
    },
    /// Print the effective configuration as TOML
    Config,
}
