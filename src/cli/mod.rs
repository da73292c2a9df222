//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "obex",
    version,
    author = "neur0map",
    about = "Extract typed, tagged observables from unstructured security text",
    long_about = "Obex runs a configured set of pattern matchers over logs, email bodies or crawled \
                  pages and prints the deduplicated observables (URLs, addresses, hashes, ...) with \
                  their tags and directives as JSON, ready for submission to an analysis pipeline."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/obex/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Profile to apply on top of the config file
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract observables from a file or stdin
    Extract {
        /// Input file (reads stdin when omitted)
        input: Option<PathBuf>,

        /// Matcher definitions file (overrides patterns.matchers_file)
        #[arg(short, long, value_name = "FILE")]
        matchers: Option<PathBuf>,

        /// Print values grouped by kind instead of observable records
        #[arg(long)]
        by_kind: bool,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// List the configured matchers
    Matchers {
        /// Matcher definitions file (overrides patterns.matchers_file)
        #[arg(short, long, value_name = "FILE")]
        matchers: Option<PathBuf>,
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

    /// Print the configuration file path in use
    Path,

    /// Validate configuration file and its matcher definitions
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration and matcher template
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
