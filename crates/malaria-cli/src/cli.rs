//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::builder::FalseyValueParser;
use clap::{Args, Parser, Subcommand, ValueEnum};
use malaria_types::{Diagnosis, Language};

/// Output format for commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

/// File format for `export`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

/// Reusable output format arguments
#[derive(Debug, Clone, Args)]
pub struct OutputArgs {
    /// Output format (defaults to the configured format, then text)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Omit header row in CSV output (useful for appending)
    #[arg(long)]
    pub no_header: bool,
}

/// History selection shared by `history` and `export`
#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Only records with this diagnosis (parasitized, uninfected, error)
    #[arg(short, long)]
    pub diagnosis: Option<Diagnosis>,

    /// Records analysed at or after this time (RFC3339 or YYYY-MM-DD)
    #[arg(long)]
    pub since: Option<String>,

    /// Records analysed at or before this time (RFC3339, or YYYY-MM-DD for the whole day)
    #[arg(long)]
    pub until: Option<String>,

    /// Maximum number of records
    #[arg(short = 'n', long)]
    pub limit: Option<u32>,

    /// Skip this many records
    #[arg(long)]
    pub offset: Option<u32>,

    /// List oldest records first
    #[arg(long)]
    pub oldest_first: bool,
}

#[derive(Parser)]
#[command(name = "malaria")]
#[command(author, version, about = "Client for the malaria cell classifier service", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output compact JSON (no pretty-printing)
    #[arg(long, global = true)]
    pub compact: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR", value_parser = FalseyValueParser::new())]
    pub no_color: bool,

    /// Language for diagnosis labels (en, ru)
    #[arg(long, global = true, env = "MALARIA_LANG")]
    pub lang: Option<Language>,

    /// History database file
    #[arg(long, global = true, env = "MALARIA_DB")]
    pub database: Option<PathBuf>,

    /// Base URL of the inference service
    #[arg(long, global = true, env = "MALARIA_SERVICE_URL")]
    pub service_url: Option<String>,

    /// Write output to file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify a blood-cell image and save the result
    Analyze {
        /// Image file (jpg, jpeg, png or bmp)
        image: PathBuf,

        /// Do not save the result to history
        #[arg(long)]
        no_save: bool,

        /// Request timeout in seconds
        #[arg(short = 'T', long)]
        timeout: Option<u64>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// List past analyses, newest first
    History {
        #[command(flatten)]
        filter: FilterArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Export past analyses as CSV or JSON
    Export {
        /// Export format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: ExportFormat,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Check the inference service and show the loaded model
    Health {
        /// Request timeout in seconds
        #[arg(short = 'T', long)]
        timeout: Option<u64>,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Show the history database location, size and counts
    Info {
        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Configuration keys that can be read or written
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfigKey {
    /// Base URL of the inference service
    ServiceUrl,
    /// Request timeout in seconds
    Timeout,
    /// History database file
    Database,
    /// Save failed analyses to history
    PersistFailures,
    /// Language for diagnosis labels
    Language,
    /// Default output format
    Format,
    /// Disable colored output
    NoColor,
}

/// Configuration subcommands
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Get a configuration value
    Get {
        /// Configuration key
        #[arg(value_enum)]
        key: ConfigKey,
    },

    /// Set a configuration value
    Set {
        /// Configuration key
        #[arg(value_enum)]
        key: ConfigKey,
        /// Configuration value
        value: String,
    },

    /// Unset (remove) a configuration value
    Unset {
        /// Configuration key to remove
        #[arg(value_enum)]
        key: ConfigKey,
    },

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_history_filters() {
        let cli = Cli::try_parse_from([
            "malaria",
            "history",
            "--diagnosis",
            "Parasitized",
            "--since",
            "2026-01-01",
            "-n",
            "5",
            "--format",
            "json",
        ])
        .unwrap();

        match cli.command {
            Commands::History { filter, output } => {
                assert_eq!(filter.diagnosis, Some(Diagnosis::Parasitized));
                assert_eq!(filter.since.as_deref(), Some("2026-01-01"));
                assert_eq!(filter.limit, Some(5));
                assert_eq!(output.format, Some(OutputFormat::Json));
            }
            _ => panic!("expected history command"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_diagnosis() {
        let result = Cli::try_parse_from(["malaria", "history", "--diagnosis", "infected"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "malaria",
            "info",
            "--lang",
            "ru",
            "--database",
            "/tmp/a.db",
        ])
        .unwrap();
        assert_eq!(cli.lang, Some(Language::Russian));
        assert_eq!(cli.database, Some(PathBuf::from("/tmp/a.db")));
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["malaria", "-q", "-v", "info"]).is_err());
    }

    #[test]
    fn test_export_defaults_to_csv() {
        let cli = Cli::try_parse_from(["malaria", "export"]).unwrap();
        match cli.command {
            Commands::Export { format, filter } => {
                assert_eq!(format, ExportFormat::Csv);
                assert!(filter.diagnosis.is_none());
            }
            _ => panic!("expected export command"),
        }
    }
}
