//! 시나리오/캠페인 실행 결과

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use uuid::Uuid;

use canfault_injector::FaultKind;

use crate::scenario::Scenario;

/// 시나리오 실행 상태
///
/// `Running`에서 시작해 `Pass` 또는 `Fail`로 한 번만 전이합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScenarioStatus {
    Running,
    Pass,
    Fail,
}

impl ScenarioStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

impl fmt::Display for ScenarioStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => f.write_str("RUNNING"),
            Self::Pass => f.write_str("PASS"),
            Self::Fail => f.write_str("FAIL"),
        }
    }
}

/// 시나리오 하나의 실행 결과
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub scenario_id: String,
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub status: ScenarioStatus,
    /// 실제로 인젝션된 폴트 유형 (선언 순서)
    pub faults_injected: Vec<FaultKind>,
    /// 시나리오에 선언된 기대 DTC (검증하지 않음)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_dtc: Option<Vec<String>>,
    #[serde(serialize_with = "as_secs_f64")]
    pub duration: Duration,
    /// `Fail`일 때만 존재
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScenarioResult {
    /// `Running` 상태의 결과를 생성합니다.
    pub(crate) fn start(scenario: &Scenario) -> Self {
        Self {
            scenario_id: scenario.id.to_string(),
            name: scenario.name.clone(),
            start_time: Utc::now(),
            status: ScenarioStatus::Running,
            faults_injected: Vec::new(),
            expected_dtc: None,
            duration: Duration::ZERO,
            error: None,
        }
    }

    pub(crate) fn pass(&mut self, elapsed: Duration) {
        if self.status.is_terminal() {
            return;
        }
        self.status = ScenarioStatus::Pass;
        self.duration = elapsed;
    }

    pub(crate) fn fail(&mut self, error: String, elapsed: Duration) {
        if self.status.is_terminal() {
            return;
        }
        self.status = ScenarioStatus::Fail;
        self.error = Some(error);
        self.duration = elapsed;
    }

    pub fn passed(&self) -> bool {
        self.status == ScenarioStatus::Pass
    }
}

/// 캠페인 실행 결과
///
/// `passed + failed == results.len()`이며 `results`는 입력 순서를 유지합니다.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignResult {
    pub campaign_id: Uuid,
    pub started_at: DateTime<Utc>,
    #[serde(serialize_with = "as_secs_f64")]
    pub duration: Duration,
    pub results: Vec<ScenarioResult>,
    pub passed: usize,
    pub failed: usize,
}

impl CampaignResult {
    /// 결과 목록에서 통계를 집계합니다.
    pub fn from_results(
        started_at: DateTime<Utc>,
        duration: Duration,
        results: Vec<ScenarioResult>,
    ) -> Self {
        let passed = results.iter().filter(|r| r.passed()).count();
        let failed = results.len() - passed;
        Self {
            campaign_id: Uuid::new_v4(),
            started_at,
            duration,
            results,
            passed,
            failed,
        }
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// 통과율 (퍼센트). 시나리오가 없으면 0.0
    pub fn pass_rate(&self) -> f64 {
        pass_rate(self.passed, self.total())
    }
}

/// `passed / total * 100`, `total == 0`이면 0.0
pub fn pass_rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    passed as f64 / total as f64 * 100.0
}

fn as_secs_f64<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}
