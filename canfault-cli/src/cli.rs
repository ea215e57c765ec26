//! CLI argument parsing using clap derive API
//!
//! Purely declarative; no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// canfault -- CAN bus fault injection and scenario campaigns.
///
/// Use `canfault <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "canfault", version, about, long_about = None)]
pub struct Cli {
    /// Path to the canfault.toml configuration file.
    ///
    /// When omitted, `canfault.toml` in the current directory is used if present,
    /// otherwise built-in defaults.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inject a single fault on the simulated bus and wait for it to finish.
    Inject(InjectArgs),

    /// Run every scenario in a JSON file as one campaign.
    Campaign(CampaignArgs),

    /// Check a scenario file without running it.
    Validate(ValidateArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- inject ----

/// Fault types accepted by `inject`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FaultType {
    FrozenValue,
    OutOfRange,
    Missing,
    Flooding,
}

impl FaultType {
    /// Name used in scenario files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FrozenValue => "frozen_value",
            Self::OutOfRange => "out_of_range",
            Self::Missing => "missing",
            Self::Flooding => "flooding",
        }
    }
}

#[derive(Args, Debug)]
pub struct InjectArgs {
    /// Fault type.
    #[arg(value_enum)]
    pub kind: FaultType,

    /// Target CAN identifier in hex (e.g. 0x200). Optional for flooding.
    #[arg(long)]
    pub can_id: Option<String>,

    /// Fault duration in seconds.
    #[arg(short, long, default_value_t = 3.0)]
    pub duration: f64,

    /// Payload in hex for frozen_value (e.g. "00 11 22 33").
    #[arg(long)]
    pub data: Option<String>,

    /// Physical maximum for out_of_range.
    #[arg(long)]
    pub max_value: Option<u64>,

    /// Messages per second for flooding.
    #[arg(long)]
    pub rate: Option<u32>,

    /// Emission period in milliseconds for frozen_value / out_of_range.
    #[arg(long)]
    pub period_ms: Option<u64>,
}

// ---- campaign ----

/// Report file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
    Text,
    Json,
}

#[derive(Args, Debug)]
pub struct CampaignArgs {
    /// Scenario file (JSON array).
    pub scenarios: PathBuf,

    /// Write a report file after the campaign.
    #[arg(short, long)]
    pub report: Option<PathBuf>,

    /// Report file format.
    #[arg(long, default_value = "text")]
    pub report_format: ReportKind,

    /// Run only the scenarios with these ids (repeatable).
    #[arg(long = "only")]
    pub only: Vec<String>,
}

// ---- validate ----

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Scenario file (JSON array).
    pub scenarios: PathBuf,
}

// ---- config ----

/// Manage canfault configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, transport, injector, runner).
        #[arg(long)]
        section: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_inject_frozen_value() {
        let cli = Cli::try_parse_from([
            "canfault",
            "inject",
            "frozen-value",
            "--can-id",
            "0x200",
            "--data",
            "0000",
            "-d",
            "1.5",
        ])
        .expect("parse succeeded");
        match cli.command {
            Commands::Inject(args) => {
                assert_eq!(args.kind, FaultType::FrozenValue);
                assert_eq!(args.can_id.as_deref(), Some("0x200"));
                assert_eq!(args.data.as_deref(), Some("0000"));
                assert_eq!(args.duration, 1.5);
                assert!(args.period_ms.is_none());
            }
            _ => panic!("expected Inject command"),
        }
    }

    #[test]
    fn parse_inject_defaults() {
        let cli = Cli::try_parse_from(["canfault", "inject", "flooding"]).expect("parse succeeded");
        match cli.command {
            Commands::Inject(args) => {
                assert_eq!(args.kind.as_str(), "flooding");
                assert!(args.can_id.is_none());
                assert_eq!(args.duration, 3.0);
            }
            _ => panic!("expected Inject command"),
        }
    }

    #[test]
    fn parse_inject_rejects_unknown_kind() {
        assert!(Cli::try_parse_from(["canfault", "inject", "bit-flip"]).is_err());
    }

    #[test]
    fn parse_campaign_with_report() {
        let cli = Cli::try_parse_from([
            "canfault",
            "campaign",
            "scenarios/basic_scenarios.json",
            "-r",
            "report.json",
            "--report-format",
            "json",
            "--only",
            "1",
            "--only",
            "3",
        ])
        .expect("parse succeeded");
        match cli.command {
            Commands::Campaign(args) => {
                assert_eq!(
                    args.scenarios,
                    PathBuf::from("scenarios/basic_scenarios.json")
                );
                assert_eq!(args.report, Some(PathBuf::from("report.json")));
                assert_eq!(args.report_format, ReportKind::Json);
                assert_eq!(args.only, vec!["1", "3"]);
            }
            _ => panic!("expected Campaign command"),
        }
    }

    #[test]
    fn parse_validate() {
        let cli = Cli::try_parse_from(["canfault", "validate", "s.json"]).expect("parse succeeded");
        assert!(matches!(cli.command, Commands::Validate(ref a) if a.scenarios == PathBuf::from("s.json")));
    }

    #[test]
    fn parse_config_show_section() {
        let cli = Cli::try_parse_from(["canfault", "config", "show", "--section", "injector"])
            .expect("parse succeeded");
        match cli.command {
            Commands::Config(args) => match args.action {
                ConfigAction::Show { section } => assert_eq!(section.as_deref(), Some("injector")),
                _ => panic!("expected Show action"),
            },
            _ => panic!("expected Config command"),
        }
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "canfault",
            "config",
            "validate",
            "--config",
            "/tmp/c.toml",
            "--output",
            "json",
            "--log-level",
            "debug",
        ])
        .expect("parse succeeded");
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn config_is_optional() {
        let cli = Cli::try_parse_from(["canfault", "config", "show"]).expect("parse succeeded");
        assert!(cli.config.is_none());
        assert_eq!(cli.output, OutputFormat::Text);
    }
}
