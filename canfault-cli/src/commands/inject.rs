//! `canfault inject` command handler
//!
//! Runs one fault against the simulated transport until its duration elapses
//! or Ctrl-C is pressed.

use std::io::Write;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use canfault_core::config::CanfaultConfig;
use canfault_core::frame::HexId;
use canfault_core::transport::{CanTransport, SimulatedTransport, TransportStats};
use canfault_injector::{FaultInjector, FaultReport, InjectorConfig};
use canfault_runner::FaultSpec;

use crate::cli::InjectArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `inject` command.
pub async fn execute(
    args: InjectArgs,
    config: &CanfaultConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let injector_config = InjectorConfig::from_core(&config.injector);
    let fault = fault_spec(&args)
        .resolve(&injector_config)
        .map_err(|e| CliError::Command(format!("invalid fault: {e}")))?;

    let transport = Arc::new(SimulatedTransport::new(config.transport.clone()));
    let injector = FaultInjector::with_config(Arc::clone(&transport), injector_config)
        .map_err(|e| CliError::Config(e.to_string()))?;

    let handle = fault
        .inject(&injector)
        .await
        .map_err(|e| CliError::Command(e.to_string()))?;

    let report = tokio::select! {
        report = handle.wait() => report,
        _ = tokio::signal::ctrl_c() => {
            warn!(can_id = %HexId(fault.can_id), "interrupted, stopping injection");
            injector.stop_all().await;
            handle.wait().await
        }
    };
    injector.stop_all().await;
    let transport_stats = transport.close().await;

    let report =
        report.ok_or_else(|| CliError::Command("fault task ended without a report".to_owned()))?;
    info!(
        frames = report.frames_sent,
        failures = report.send_failures,
        "injection complete"
    );

    writer.render(&InjectOutput {
        channel: transport.channel().to_owned(),
        report,
        transport: transport_stats,
    })
}

fn fault_spec(args: &InjectArgs) -> FaultSpec {
    FaultSpec {
        kind: Some(Value::from(args.kind.as_str())),
        can_id: args.can_id.clone().map(Value::from),
        duration: Some(Value::from(args.duration)),
        data: args.data.clone().map(Value::from),
        max_value: args.max_value.map(Value::from),
        rate: args.rate.map(Value::from),
        period_ms: args.period_ms.map(Value::from),
    }
}

/// Result of a single injection.
#[derive(Serialize)]
pub struct InjectOutput {
    pub channel: String,
    pub report: FaultReport,
    pub transport: TransportStats,
}

impl Render for InjectOutput {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        let outcome = if self.report.cancelled {
            "CANCELLED".yellow().bold()
        } else {
            "COMPLETED".green().bold()
        };
        writeln!(
            w,
            "Fault {} on {} ({}): {}",
            self.report.kind.to_string().bold(),
            HexId(self.report.can_id),
            self.channel,
            outcome
        )?;
        writeln!(w, "  Elapsed:       {:.2}s", self.report.elapsed.as_secs_f64())?;
        writeln!(w, "  Frames sent:   {}", self.report.frames_sent)?;
        if self.report.send_failures > 0 {
            writeln!(
                w,
                "  Send failures: {}",
                self.report.send_failures.to_string().red()
            )?;
        } else {
            writeln!(w, "  Send failures: 0")?;
        }
        writeln!(
            w,
            "  Bus totals:    sent={} received={} failed={}",
            self.transport.frames_sent, self.transport.frames_received, self.transport.send_failures
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use canfault_injector::FaultKind;

    use crate::cli::FaultType;

    fn args(kind: FaultType) -> InjectArgs {
        InjectArgs {
            kind,
            can_id: Some("0x200".to_owned()),
            duration: 0.5,
            data: Some("DEAD".to_owned()),
            max_value: Some(250),
            rate: None,
            period_ms: Some(20),
        }
    }

    #[test]
    fn fault_spec_carries_arguments() {
        let spec = fault_spec(&args(FaultType::OutOfRange));
        assert_eq!(spec.kind, Some(Value::from("out_of_range")));
        assert_eq!(spec.max_value, Some(Value::from(250u64)));
        let fault = spec.resolve(&InjectorConfig::default()).expect("resolves");
        assert_eq!(fault.can_id, 0x200);
        assert_eq!(fault.kind(), FaultKind::OutOfRange);
    }

    #[test]
    fn render_text_shows_counts() {
        let output = InjectOutput {
            channel: "virtual".to_owned(),
            report: FaultReport {
                can_id: 0x200,
                kind: FaultKind::FrozenValue,
                frames_sent: 25,
                send_failures: 0,
                elapsed: Duration::from_millis(500),
                cancelled: false,
            },
            transport: TransportStats {
                frames_sent: 25,
                frames_received: 0,
                send_failures: 0,
            },
        };
        let mut buffer = Vec::new();
        output.render_text(&mut buffer).expect("render");
        let text = String::from_utf8(buffer).expect("utf-8");
        assert!(text.contains("0x200"));
        assert!(text.contains("Frames sent:   25"));
        assert!(text.contains("Elapsed:       0.50s"));
    }

    #[tokio::test]
    async fn execute_runs_short_missing_fault() {
        let args = InjectArgs {
            kind: FaultType::Missing,
            can_id: Some("0x1A0".to_owned()),
            duration: 0.05,
            data: None,
            max_value: None,
            rate: None,
            period_ms: None,
        };
        let writer = OutputWriter::new(crate::cli::OutputFormat::Json);
        execute(args, &CanfaultConfig::default(), &writer)
            .await
            .expect("inject succeeds");
    }
}
