//! `canfault validate` command handler

use std::io::Write;

use serde::Serialize;
use tracing::info;

use canfault_core::config::CanfaultConfig;
use canfault_injector::InjectorConfig;
use canfault_runner::{Scenario, load_scenarios};

use crate::cli::ValidateArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `validate` command.
pub async fn execute(
    args: ValidateArgs,
    config: &CanfaultConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    info!(path = %args.scenarios.display(), "validating scenarios");
    let scenarios = load_scenarios(&args.scenarios).await?;
    let defaults = InjectorConfig::from_core(&config.injector);

    let report = ScenarioValidationReport {
        source: args.scenarios.display().to_string(),
        scenarios: scenarios.iter().map(|s| check(s, &defaults)).collect(),
    };
    writer.render(&report)?;

    let invalid = report.invalid_count();
    if invalid > 0 {
        return Err(CliError::Scenario(format!(
            "{invalid} of {} scenarios are invalid",
            report.scenarios.len()
        )));
    }
    Ok(())
}

fn check(scenario: &Scenario, defaults: &InjectorConfig) -> ScenarioCheck {
    let error = scenario.validate(defaults).err().map(|e| e.to_string());
    ScenarioCheck {
        id: scenario.id.to_string(),
        name: scenario.name.clone(),
        faults: scenario.faults.len(),
        nominal_fault_secs: scenario.nominal_fault_time().as_secs_f64(),
        error,
    }
}

/// Per-scenario validation outcome.
#[derive(Serialize)]
pub struct ScenarioCheck {
    pub id: String,
    pub name: String,
    pub faults: usize,
    pub nominal_fault_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Validation report for a scenario file.
#[derive(Serialize)]
pub struct ScenarioValidationReport {
    pub source: String,
    pub scenarios: Vec<ScenarioCheck>,
}

impl ScenarioValidationReport {
    pub fn invalid_count(&self) -> usize {
        self.scenarios.iter().filter(|s| s.error.is_some()).count()
    }
}

impl Render for ScenarioValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Scenario Validation: {}", self.source.bold())?;
        for s in &self.scenarios {
            match &s.error {
                None => writeln!(
                    w,
                    "  {} {} {} ({} faults, {:.1}s of faults)",
                    "OK ".green().bold(),
                    s.id,
                    s.name,
                    s.faults,
                    s.nominal_fault_secs
                )?,
                Some(err) => writeln!(
                    w,
                    "  {} {} {}: {}",
                    "ERR".red().bold(),
                    s.id,
                    s.name,
                    err.red()
                )?,
            }
        }
        let invalid = self.invalid_count();
        if invalid == 0 {
            writeln!(w, "  Result: {}", "VALID".green().bold())?;
        } else {
            writeln!(
                w,
                "  Result: {} ({invalid} invalid)",
                "INVALID".red().bold()
            )?;
        }
        Ok(())
    }
}
