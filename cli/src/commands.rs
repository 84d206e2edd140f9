//! CLI command definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Council - multi-participant deliberation with memory resonance
#[derive(Parser, Debug)]
#[command(name = "council")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Run a simulated session with five scripted voices
    council simulate --domain ethics --topic "What do we owe each other?"

    # Replay a participant script from JSON
    council simulate --domain ethics --topic "Care" --script roster.json

    # Inspect stored results
    council session ses-1234
    council memories --domain ethics --days 30

    # Show configuration sources and the effective configuration
    council config
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Override the store directory
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a deliberation with scripted participants
    Simulate {
        /// Domain the session (and its memory) belongs to
        #[arg(short, long)]
        domain: String,

        /// Topic under deliberation
        #[arg(short, long)]
        topic: String,

        /// Number of built-in scripted voices (ignored with --script)
        #[arg(short, long, default_value_t = 5)]
        participants: usize,

        /// JSON roster of scripted participants
        #[arg(long, value_name = "PATH")]
        script: Option<PathBuf>,

        /// Use this session id instead of a generated one
        #[arg(long)]
        session_id: Option<String>,

        /// Suppress progress indicators
        #[arg(short, long)]
        quiet: bool,
    },

    /// Print a stored session
    Session {
        id: String,
    },

    /// Print the metrics record of a concluded session
    Metrics {
        id: String,
    },

    /// List episodic memories of a domain, newest first
    Memories {
        #[arg(short, long)]
        domain: String,

        /// Only memories from the last N days
        #[arg(long)]
        days: Option<i64>,
    },

    /// Mark a memory sacred
    PromoteSacred {
        memory_id: String,
    },

    /// Promote one message of an archived session to its own memory
    Promote {
        session_id: String,

        /// Message sequence number
        sequence: u64,

        /// Mark the new memory sacred
        #[arg(long)]
        sacred: bool,
    },

    /// Show configuration sources, the effective configuration and any issues
    Config,
}
