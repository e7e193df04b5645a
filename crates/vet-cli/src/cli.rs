//! CLI argument parsing for vet-assist.
//!
//! CLI flags override all other config sources.

use clap::{Parser, Subcommand, ValueEnum};
use vet_types::ResponderMode;
use vet_vector::Metric;

/// Veterinary answer service
///
/// Answers livestock and pet health questions from a curated knowledge base
/// of diseases and herbal treatments.
#[derive(Parser, Debug)]
#[command(name = "vet-assist")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/vet-assist/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Response strategy flag values
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    Template,
    Structured,
    Generative,
}

impl From<ModeArg> for ResponderMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Template => ResponderMode::Template,
            ModeArg::Structured => ResponderMode::Structured,
            ModeArg::Generative => ResponderMode::Generative,
        }
    }
}

/// Distance metric flag values
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricArg {
    Cosine,
    L2,
}

impl From<MetricArg> for Metric {
    fn from(metric: MetricArg) -> Self {
        match metric {
            MetricArg::Cosine => Metric::Cosine,
            MetricArg::L2 => Metric::L2,
        }
    }
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer a question; reads questions from stdin when none is given
    Ask {
        /// Question text
        query: Vec<String>,

        /// Number of records to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Override the response strategy
        #[arg(short, long, value_enum)]
        mode: Option<ModeArg>,

        /// Print the answer as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build index, content and manifest files from a JSON array of records
    Build {
        /// Input records (JSON array)
        #[arg(short, long)]
        records: String,

        /// Output directory
        #[arg(short, long)]
        out_dir: String,

        /// Texts embedded per model call (default from config)
        #[arg(long)]
        batch_size: Option<usize>,

        /// Distance metric baked into the index
        #[arg(long, value_enum, default_value = "cosine")]
        metric: MetricArg,
    },

    /// Show the shape of the configured artifacts
    Inspect {
        /// Index file (default from config)
        #[arg(long)]
        index: Option<String>,

        /// Content file (default from config)
        #[arg(long)]
        content: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_ask() {
        let cli = Cli::parse_from(["vet-assist", "ask", "my", "cow", "has", "fever", "-k", "5"]);
        match cli.command {
            Commands::Ask {
                query, top_k, json, ..
            } => {
                assert_eq!(query.join(" "), "my cow has fever");
                assert_eq!(top_k, Some(5));
                assert!(!json);
            }
            _ => panic!("Expected Ask command"),
        }
    }

    #[test]
    fn test_cli_ask_without_query() {
        let cli = Cli::parse_from(["vet-assist", "ask", "--json"]);
        match cli.command {
            Commands::Ask { query, json, .. } => {
                assert!(query.is_empty());
                assert!(json);
            }
            _ => panic!("Expected Ask command"),
        }
    }

    #[test]
    fn test_cli_ask_mode() {
        let cli = Cli::parse_from(["vet-assist", "ask", "--mode", "structured", "bloat"]);
        match cli.command {
            Commands::Ask { mode, .. } => assert_eq!(mode, Some(ModeArg::Structured)),
            _ => panic!("Expected Ask command"),
        }
    }

    #[test]
    fn test_cli_build() {
        let cli = Cli::parse_from([
            "vet-assist",
            "build",
            "--records",
            "kb.json",
            "--out-dir",
            "/tmp/kb",
            "--metric",
            "l2",
        ]);
        match cli.command {
            Commands::Build {
                records,
                out_dir,
                batch_size,
                metric,
            } => {
                assert_eq!(records, "kb.json");
                assert_eq!(out_dir, "/tmp/kb");
                assert_eq!(batch_size, None);
                assert_eq!(metric, MetricArg::L2);
            }
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_cli_inspect() {
        let cli = Cli::parse_from(["vet-assist", "inspect"]);
        assert!(matches!(
            cli.command,
            Commands::Inspect {
                index: None,
                content: None
            }
        ));
    }

    #[test]
    fn test_cli_with_config_and_log_level() {
        let cli = Cli::parse_from([
            "vet-assist",
            "--config",
            "/path/to/config.toml",
            "--log-level",
            "debug",
            "inspect",
        ]);
        assert_eq!(cli.config, Some("/path/to/config.toml".to_string()));
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }
}
