//! `canfault config` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use canfault_core::config::CanfaultConfig;

use crate::cli::{ConfigAction, ConfigArgs};
use crate::commands::load_config;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

const DEFAULTS_SOURCE: &str = "(defaults)";

/// Execute the `config` command.
///
/// Configuration problems are reported through the output payload, so this
/// command runs before (and independently of) the global configuration load.
pub async fn execute(
    args: ConfigArgs,
    config_path: Option<&Path>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let source = super::resolve_config_path(config_path).await;
    let source = source.as_deref();
    match args.action {
        ConfigAction::Validate => execute_validate(source, writer).await,
        ConfigAction::Show { section } => execute_show(source, section, writer).await,
    }
}

fn source_name(path: Option<&Path>) -> String {
    path.map_or_else(|| DEFAULTS_SOURCE.to_owned(), |p| p.display().to_string())
}

/// Load and validate the configuration, reporting any errors.
///
/// # Errors
///
/// Returns `CliError::Config` if validation fails.
async fn execute_validate(path: Option<&Path>, writer: &OutputWriter) -> Result<(), CliError> {
    info!(source = %source_name(path), "validating configuration");

    let report = match load_config(path).await {
        Ok(_) => ConfigValidationReport {
            source: source_name(path),
            valid: true,
            errors: Vec::new(),
        },
        Err(e) => ConfigValidationReport {
            source: source_name(path),
            valid: false,
            errors: vec![e.to_string()],
        },
    };

    writer.render(&report)?;

    if !report.valid {
        return Err(CliError::Config("configuration is invalid".to_owned()));
    }
    Ok(())
}

/// Show the effective configuration (file + env overrides + defaults).
async fn execute_show(
    path: Option<&Path>,
    section: Option<String>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = load_config(path).await?;
    let report = ConfigReport {
        source: source_name(path),
        config_toml: section_toml(&config, section.as_deref())?,
        section,
    };
    writer.render(&report)
}

/// Serialize the whole configuration or one section to TOML.
fn section_toml(config: &CanfaultConfig, section: Option<&str>) -> Result<String, CliError> {
    let rendered = match section {
        None => toml::to_string_pretty(config),
        Some("general") => toml::to_string_pretty(&config.general),
        Some("transport") => toml::to_string_pretty(&config.transport),
        Some("injector") => toml::to_string_pretty(&config.injector),
        Some("runner") => toml::to_string_pretty(&config.runner),
        Some(other) => {
            return Err(CliError::Command(format!(
                "unknown section: {other} (expected: general, transport, injector, runner)"
            )));
        }
    };
    rendered.map_err(|e| CliError::Command(format!("failed to serialize configuration: {e}")))
}

/// Configuration display report.
///
/// `config_toml` is only used for text rendering.
#[derive(Serialize)]
pub struct ConfigReport {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(skip)]
    pub config_toml: String,
}

impl Render for ConfigReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        match &self.section {
            Some(section) => writeln!(
                w,
                "Configuration [{}] ({})",
                section.bold(),
                self.source.dimmed()
            )?,
            None => writeln!(w, "Configuration ({})", self.source.dimmed())?,
        }
        writeln!(w)?;
        write!(w, "{}", self.config_toml)?;
        Ok(())
    }
}

/// Configuration validation report.
#[derive(Serialize)]
pub struct ConfigValidationReport {
    pub source: String,
    pub valid: bool,
    pub errors: Vec<String>,
}

impl Render for ConfigValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Configuration Validation: {}", self.source)?;
        if self.valid {
            writeln!(w, "  Status: {}", "VALID".green().bold())?;
        } else {
            writeln!(w, "  Status: {}", "INVALID".red().bold())?;
            for err in &self.errors {
                writeln!(w, "  - {err}")?;
            }
        }
        Ok(())
    }
}
