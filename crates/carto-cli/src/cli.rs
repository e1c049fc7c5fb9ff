//! CLI argument definitions.

use std::path::PathBuf;
use std::str::FromStr;

use carto_model::{Category, RecordId};
use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "carto",
    version,
    about = "Load the dashboard map layers and report what is shown",
    long_about = "Load the dashboard map layers and report what is shown.\n\n\
                  Signs in to the Supabase project (or reads local fixtures), loads\n\
                  beneficiaries, field agents and sectors, applies visibility\n\
                  toggles and prints the resulting layer panel."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow user identities in log output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,

    /// Configuration file (default: config.toml in the user config directory).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the layer categories and the views they are read from.
    Categories,

    /// Show the resolved configuration and whether it is usable.
    Config(ConfigArgs),

    /// Load every layer, apply toggles and print the layer panel.
    Sync(SyncArgs),
}

#[derive(Parser)]
pub struct ConfigArgs {
    /// Print an example configuration file instead.
    #[arg(long = "example")]
    pub example: bool,
}

#[derive(Parser)]
pub struct SyncArgs {
    /// Read rows from `<view>.json` files in DIR instead of Supabase.
    #[arg(long = "fixtures", value_name = "DIR")]
    pub fixtures: Option<PathBuf>,

    /// Account e-mail. The password is read from CARTO_PASSWORD.
    #[arg(long = "email", value_name = "EMAIL", conflicts_with = "fixtures")]
    pub email: Option<String>,

    /// Uncheck one record, as CATEGORY:ID. Repeatable.
    #[arg(long = "hide", value_name = "CATEGORY:ID")]
    pub hide: Vec<HideArg>,

    /// Turn a whole category off. Repeatable.
    #[arg(long = "hide-category", value_name = "CATEGORY")]
    pub hide_category: Vec<Category>,

    /// Reload every category after applying the toggles.
    #[arg(long = "refresh")]
    pub refresh: bool,

    /// Print the panel as JSON instead of tables.
    #[arg(long = "json")]
    pub json: bool,
}

/// A record to uncheck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HideArg {
    pub category: Category,
    pub id: RecordId,
}

impl FromStr for HideArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (category, id) = s
            .split_once(':')
            .ok_or_else(|| format!("expected CATEGORY:ID, got '{s}'"))?;
        Ok(Self {
            category: category.parse().map_err(|e| format!("{e}"))?,
            id: RecordId::new(id).map_err(|e| format!("{e}"))?,
        })
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
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
    fn test_hide_arg_parses_category_and_id() {
        let hide: HideArg = "intervenants: 42 ".parse().unwrap();
        assert_eq!(hide.category, Category::FieldAgents);
        assert_eq!(hide.id.as_str(), "42");
        assert!("field_agents".parse::<HideArg>().is_err());
        assert!("roads:1".parse::<HideArg>().is_err());
    }

    #[test]
    fn test_sync_args() {
        let cli = Cli::parse_from([
            "carto",
            "sync",
            "--fixtures",
            "data",
            "--hide",
            "team_sectors:3",
            "--hide-category",
            "beneficiaries",
            "--refresh",
        ]);
        let Command::Sync(args) = cli.command else {
            panic!("expected sync");
        };
        assert_eq!(args.hide.len(), 1);
        assert_eq!(args.hide_category, vec![Category::Beneficiaries]);
        assert!(args.refresh);
    }
}
