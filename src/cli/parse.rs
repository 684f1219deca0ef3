//! CLI parse: clap types for widgetforge. No behavior; definitions only.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// widgetforge CLI - Flutter widget generation from natural language
#[derive(Parser)]
#[command(name = "widgetforge")]
#[command(about = "Generate Flutter widgets from natural-language descriptions")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, global = true, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, global = true, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a widget with one provider
    Generate {
        /// Configured provider name
        #[arg(long)]
        provider: String,
        /// Widget class name (defaults to the provider's widget name)
        #[arg(long)]
        identifier: Option<String>,
        /// UI description
        prompt: String,
    },
    /// Send one prompt to every configured provider
    FanOut {
        /// UI description
        prompt: String,
    },
    /// Serve the closest widget from the local corpus
    Retrieve {
        /// Candidates considered
        #[arg(long)]
        top_k: Option<usize>,
        /// Minimum cosine similarity
        #[arg(long)]
        threshold: Option<f32>,
        /// UI description
        prompt: String,
    },
    /// List the models a provider offers
    Models {
        #[arg(long)]
        provider: String,
    },
    /// Show configured providers
    Providers {
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
