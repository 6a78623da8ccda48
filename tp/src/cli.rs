//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// TaskPilot - AI-assisted change orchestrator
#[derive(Parser)]
#[command(
    name = "taskpilot",
    about = "Propose-then-approve AI changes to your tasks",
    version,
    after_help = "Logs are written to: ~/.local/share/taskpilot/logs/taskpilot.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// List supported operations
    Operations {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show agent status
    Status,

    /// Split tasks into smaller subtasks
    Split {
        /// Task ids to split
        #[arg(value_name = "TASK_ID", required = true)]
        task_ids: Vec<i64>,

        /// JSON seed file to run against a local in-memory store
        /// (otherwise the remote entity API from config is used)
        #[arg(short, long)]
        seed: Option<PathBuf>,

        /// Execute the proposal instead of only previewing it
        #[arg(long)]
        apply: bool,
    },

    /// Improve task descriptions
    Improve {
        /// Task ids to improve
        #[arg(value_name = "TASK_ID", required = true)]
        task_ids: Vec<i64>,

        /// JSON seed file to run against a local in-memory store
        #[arg(short, long)]
        seed: Option<PathBuf>,

        /// Execute the proposal instead of only previewing it
        #[arg(long)]
        apply: bool,
    },
}

/// Output format for listing commands
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
