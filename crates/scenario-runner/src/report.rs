//! 테스트 리포트 렌더링
//!
//! 실행 결과를 텍스트 또는 JSON으로 렌더링하여 파일에 기록합니다.

use std::fmt::Write as _;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::error::RunnerError;
use crate::result::{ScenarioResult, pass_rate};

const RULE_WIDTH: usize = 60;

/// 리포트 형식
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = RunnerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(RunnerError::Report(format!(
                "unknown report format '{other}' (expected text or json)"
            ))),
        }
    }
}

/// JSON 리포트 최상위 구조
#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    total: usize,
    passed: usize,
    failed: usize,
    pass_rate: f64,
    results: &'a [ScenarioResult],
}

/// 텍스트 리포트를 렌더링합니다.
pub fn render_text(results: &[ScenarioResult]) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let sep = "-".repeat(RULE_WIDTH);
    let mut out = String::new();

    // write! to String cannot fail
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "AUTOMATED FAULT INJECTION TEST REPORT");
    let _ = writeln!(out, "{rule}\n");

    for result in results {
        let faults: Vec<&str> = result.faults_injected.iter().map(|k| k.as_str()).collect();
        let _ = writeln!(out, "Test: {} (id: {})", result.name, result.scenario_id);
        let _ = writeln!(out, "Status: {}", result.status);
        let _ = writeln!(out, "Started: {}", result.start_time.to_rfc3339());
        let _ = writeln!(out, "Duration: {:.2}s", result.duration.as_secs_f64());
        let _ = writeln!(out, "Faults injected: {}", faults.join(", "));
        if let Some(dtc) = &result.expected_dtc {
            let _ = writeln!(out, "Expected DTC: {}", dtc.join(", "));
        }
        if let Some(error) = &result.error {
            let _ = writeln!(out, "Error: {error}");
        }
        let _ = writeln!(out, "\n{sep}\n");
    }

    let passed = results.iter().filter(|r| r.passed()).count();
    let _ = writeln!(
        out,
        "Total: {} | Passed: {} | Failed: {} | Pass rate: {:.1}%",
        results.len(),
        passed,
        results.len() - passed,
        pass_rate(passed, results.len())
    );
    out
}

/// JSON 리포트를 렌더링합니다.
pub fn render_json(results: &[ScenarioResult]) -> Result<String, RunnerError> {
    let passed = results.iter().filter(|r| r.passed()).count();
    let report = JsonReport {
        generated_at: Utc::now(),
        total: results.len(),
        passed,
        failed: results.len() - passed,
        pass_rate: pass_rate(passed, results.len()),
        results,
    };
    serde_json::to_string_pretty(&report)
        .map_err(|e| RunnerError::Report(format!("failed to serialize report: {e}")))
}

/// 리포트를 렌더링하여 파일에 기록합니다.
pub async fn write_report(
    path: impl AsRef<Path>,
    format: ReportFormat,
    results: &[ScenarioResult],
) -> Result<(), RunnerError> {
    let path = path.as_ref();
    let content = match format {
        ReportFormat::Text => render_text(results),
        ReportFormat::Json => render_json(results)?,
    };
    tokio::fs::write(path, content).await.map_err(|e| {
        RunnerError::Report(format!("failed to write {}: {e}", path.display()))
    })?;
    info!(path = %path.display(), scenarios = results.len(), "report generated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use canfault_injector::FaultKind;

    use crate::result::ScenarioStatus;

    fn result(name: &str, status: ScenarioStatus, error: Option<&str>) -> ScenarioResult {
        ScenarioResult {
            scenario_id: name.to_lowercase(),
            name: name.to_owned(),
            start_time: Utc::now(),
            status,
            faults_injected: vec![FaultKind::FrozenValue, FaultKind::Flooding],
            expected_dtc: Some(vec!["C0035".to_owned()]),
            duration: Duration::from_millis(3250),
            error: error.map(str::to_owned),
        }
    }

    #[test]
    fn text_report_lists_each_scenario() {
        let results = vec![
            result("Alpha", ScenarioStatus::Pass, None),
            result("Beta", ScenarioStatus::Fail, Some("unknown fault type 'x'")),
        ];
        let text = render_text(&results);
        assert!(text.contains("Test: Alpha (id: alpha)"));
        assert!(text.contains("Status: FAIL"));
        assert!(text.contains("Duration: 3.25s"));
        assert!(text.contains("Faults injected: frozen_value, flooding"));
        assert!(text.contains("Expected DTC: C0035"));
        assert!(text.contains("Error: unknown fault type 'x'"));
        assert!(text.contains("Total: 2 | Passed: 1 | Failed: 1 | Pass rate: 50.0%"));
    }

    #[test]
    fn empty_text_report_has_zero_rate() {
        let text = render_text(&[]);
        assert!(text.contains("Total: 0 | Passed: 0 | Failed: 0 | Pass rate: 0.0%"));
    }

    #[test]
    fn json_report_has_summary() {
        let results = vec![result("Alpha", ScenarioStatus::Pass, None)];
        let json: serde_json::Value = serde_json::from_str(&render_json(&results).unwrap()).unwrap();
        assert_eq!(json["total"], 1);
        assert_eq!(json["passed"], 1);
        assert_eq!(json["pass_rate"], 100.0);
        assert_eq!(json["results"][0]["name"], "Alpha");
    }

    #[test]
    fn report_format_parse() {
        assert_eq!("JSON".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
        assert_eq!("txt".parse::<ReportFormat>().unwrap(), ReportFormat::Text);
        assert!("yaml".parse::<ReportFormat>().is_err());
    }
}
