//! `canfault campaign` command handler

use std::io::Write;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use canfault_core::config::CanfaultConfig;
use canfault_core::transport::{CanTransport, SimulatedTransport};
use canfault_injector::{FaultInjector, InjectorConfig};
use canfault_runner::{
    CampaignResult, ReportFormat, RunnerConfig, ScenarioRunner, ScenarioStatus, load_scenarios,
};

use crate::cli::{CampaignArgs, ReportKind};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `campaign` command.
///
/// Returns `CliError::CampaignFailed` after rendering when any scenario failed.
pub async fn execute(
    args: CampaignArgs,
    config: &CanfaultConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let mut scenarios = load_scenarios(&args.scenarios).await?;
    if !args.only.is_empty() {
        scenarios.retain(|s| args.only.contains(&s.id.to_string()));
        if scenarios.is_empty() {
            return Err(CliError::Scenario(format!(
                "no scenario in {} matches --only {:?}",
                args.scenarios.display(),
                args.only
            )));
        }
    }
    info!(path = %args.scenarios.display(), count = scenarios.len(), "scenarios loaded");

    let transport = Arc::new(SimulatedTransport::new(config.transport.clone()));
    let injector = FaultInjector::with_config(
        Arc::clone(&transport),
        InjectorConfig::from_core(&config.injector),
    )
    .map_err(|e| CliError::Config(e.to_string()))?;
    let mut runner = ScenarioRunner::new(Arc::new(injector), RunnerConfig::from_core(&config.runner));

    let campaign = tokio::select! {
        campaign = runner.run_campaign(&scenarios) => campaign,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted, stopping all faults");
            runner.injector().stop_all().await;
            transport.close().await;
            return Err(CliError::Command("campaign interrupted".to_owned()));
        }
    };

    if let Some(path) = &args.report {
        let format = match args.report_format {
            ReportKind::Text => ReportFormat::Text,
            ReportKind::Json => ReportFormat::Json,
        };
        runner.generate_report(path, format).await?;
    }
    transport.close().await;

    let (failed, total) = (campaign.failed, campaign.total());
    writer.render(&CampaignOutput {
        report_path: args.report.as_ref().map(|p| p.display().to_string()),
        campaign,
    })?;

    if failed > 0 {
        return Err(CliError::CampaignFailed { failed, total });
    }
    Ok(())
}

/// Campaign result with the report location.
#[derive(Serialize)]
pub struct CampaignOutput {
    #[serde(flatten)]
    pub campaign: CampaignResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_path: Option<String>,
}

impl Render for CampaignOutput {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        let c = &self.campaign;
        writeln!(w, "Campaign {}", c.campaign_id.to_string().bold())?;
        writeln!(w)?;

        for r in &c.results {
            let status = match r.status {
                ScenarioStatus::Pass => "PASS".green().bold(),
                ScenarioStatus::Fail => "FAIL".red().bold(),
                ScenarioStatus::Running => "RUNNING".yellow().bold(),
            };
            let faults: Vec<&str> = r.faults_injected.iter().map(|k| k.as_str()).collect();
            writeln!(
                w,
                "  [{}] {:<8} {:<36} {:>7.2}s  {}",
                status,
                r.scenario_id,
                r.name,
                r.duration.as_secs_f64(),
                faults.join(", ")
            )?;
            if let Some(err) = &r.error {
                writeln!(w, "         {}", err.red())?;
            }
        }

        writeln!(w)?;
        writeln!(
            w,
            "Total: {} | Passed: {} | Failed: {} | Pass rate: {:.1}%",
            c.total(),
            c.passed.to_string().green(),
            if c.failed > 0 {
                c.failed.to_string().red()
            } else {
                c.failed.to_string().normal()
            },
            c.pass_rate()
        )?;
        if let Some(path) = &self.report_path {
            writeln!(w, "Report: {path}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const SCENARIOS: &str = r#"[
        { "id": 1, "name": "ok", "faults": [ { "type": "missing", "can_id": "0x100", "duration": 0.01 } ] },
        { "id": 2, "name": "bad", "faults": [ { "type": "bit_flip", "can_id": "0x100", "duration": 0.01 } ] }
    ]"#;

    fn fast_config() -> CanfaultConfig {
        let mut config = CanfaultConfig::default();
        config.runner.precondition_default_ms = 0;
        config.runner.observation_delay_ms = 0;
        config.runner.settle_delay_ms = 0;
        config
    }

    #[tokio::test]
    async fn failing_scenario_yields_campaign_failed_and_report() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("s.json");
        tokio::fs::write(&path, SCENARIOS).await.expect("write");
        let report = dir.path().join("report.txt");

        let args = CampaignArgs {
            scenarios: path,
            report: Some(report.clone()),
            report_format: ReportKind::Text,
            only: Vec::new(),
        };
        let writer = OutputWriter::new(crate::cli::OutputFormat::Json);
        let err = execute(args, &fast_config(), &writer).await.unwrap_err();
        assert!(matches!(err, CliError::CampaignFailed { failed: 1, total: 2 }));
        assert_eq!(err.exit_code(), 4);

        let text = tokio::fs::read_to_string(&report).await.expect("report written");
        assert!(text.contains("Status: FAIL"));
    }

    #[tokio::test]
    async fn only_filter_selects_scenarios() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("s.json");
        tokio::fs::write(&path, SCENARIOS).await.expect("write");

        let args = CampaignArgs {
            scenarios: path.clone(),
            report: None,
            report_format: ReportKind::Text,
            only: vec!["1".to_owned()],
        };
        let writer = OutputWriter::new(crate::cli::OutputFormat::Json);
        execute(args, &fast_config(), &writer)
            .await
            .expect("only passing scenario runs");

        let args = CampaignArgs {
            scenarios: path,
            report: None,
            report_format: ReportKind::Text,
            only: vec!["99".to_owned()],
        };
        let err = execute(args, &fast_config(), &writer).await.unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[tokio::test]
    async fn missing_scenario_file_is_scenario_error() {
        let args = CampaignArgs {
            scenarios: PathBuf::from("/nonexistent/s.json"),
            report: None,
            report_format: ReportKind::Text,
            only: Vec::new(),
        };
        let writer = OutputWriter::new(crate::cli::OutputFormat::Text);
        let err = execute(args, &fast_config(), &writer).await.unwrap_err();
        assert!(matches!(err, CliError::Scenario(_)));
    }
}
