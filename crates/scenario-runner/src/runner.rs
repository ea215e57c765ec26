//! 시나리오 러너 -- 시나리오 실행 상태 머신과 캠페인 집계
//!
//! 시나리오 하나는 다음 순서로 실행됩니다.
//!
//! ```text
//! Running ─> preconditions 대기 ─> 폴트 1..N (인젝션 후 duration 대기)
//!         ─> 관찰 대기 ─> expected_dtc 기록 ─> Pass
//!                  (어느 단계든 에러) ───────────> Fail
//! 종료 시 항상 FaultInjector::stop_all()
//! ```
//!
//! 시나리오 단위 에러는 `Fail` 결과로 변환되며 캠페인을 중단시키지 않습니다.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tokio::time::Instant;
use tracing::{error, info, warn};

use canfault_core::frame::HexId;
use canfault_core::metrics as m;
use canfault_core::transport::CanTransport;
use canfault_injector::FaultInjector;

use crate::config::RunnerConfig;
use crate::error::RunnerError;
use crate::report::{ReportFormat, write_report};
use crate::result::{CampaignResult, ScenarioResult};
use crate::scenario::Scenario;

/// 시나리오 러너
///
/// 인젝터를 `Arc`로 공유하므로 러너 밖에서도 같은 인젝터를 조회/중지할 수 있습니다.
/// 실행한 모든 결과는 내부 이력에 쌓이며 [`generate_report`](Self::generate_report)에 사용됩니다.
pub struct ScenarioRunner<T: CanTransport> {
    injector: Arc<FaultInjector<T>>,
    config: RunnerConfig,
    history: Vec<ScenarioResult>,
}

impl<T: CanTransport> ScenarioRunner<T> {
    pub fn new(injector: Arc<FaultInjector<T>>, config: RunnerConfig) -> Self {
        Self {
            injector,
            config,
            history: Vec::new(),
        }
    }

    pub fn injector(&self) -> &Arc<FaultInjector<T>> {
        &self.injector
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// 지금까지 실행한 시나리오 결과 (실행 순서)
    pub fn history(&self) -> &[ScenarioResult] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// 시나리오 하나를 실행합니다.
    ///
    /// 실패는 반환값의 `status`/`error`로 표현되며, 성공/실패와 관계없이
    /// 반환 전에 인젝터의 모든 폴트를 중지합니다.
    pub async fn run_scenario(&mut self, scenario: &Scenario) -> ScenarioResult {
        let started = Instant::now();
        let mut result = ScenarioResult::start(scenario);
        info!(
            scenario_id = %result.scenario_id,
            name = %scenario.name,
            faults = scenario.faults.len(),
            "scenario started"
        );

        let outcome = self.execute(scenario, &mut result).await;

        let stopped = self.injector.stop_all().await;
        if stopped > 0 {
            info!(scenario_id = %result.scenario_id, stopped, "cleanup stopped lingering faults");
        }

        let elapsed = started.elapsed();
        match outcome {
            Ok(()) => {
                result.pass(elapsed);
                info!(
                    scenario_id = %result.scenario_id,
                    duration_secs = elapsed.as_secs_f64(),
                    "scenario passed"
                );
            }
            Err(e) => {
                result.fail(e.to_string(), elapsed);
                error!(
                    scenario_id = %result.scenario_id,
                    error = %e,
                    injected = result.faults_injected.len(),
                    "scenario failed"
                );
            }
        }

        let label = if result.passed() { "pass" } else { "fail" };
        metrics::counter!(m::RUNNER_SCENARIOS_TOTAL, m::LABEL_RESULT => label).increment(1);
        metrics::histogram!(m::RUNNER_SCENARIO_DURATION_SECONDS).record(elapsed.as_secs_f64());

        self.history.push(result.clone());
        result
    }

    /// 시나리오 목록을 입력 순서대로 실행하고 집계합니다.
    ///
    /// 시나리오 사이에는 안정화 대기를 넣습니다 (마지막 시나리오 뒤에는 넣지 않음).
    pub async fn run_campaign(&mut self, scenarios: &[Scenario]) -> CampaignResult {
        let started_at = Utc::now();
        let started = Instant::now();
        let total = scenarios.len();
        info!(total, "campaign started");

        let mut results = Vec::with_capacity(total);
        for (index, scenario) in scenarios.iter().enumerate() {
            info!(test = index + 1, total, name = %scenario.name, "running scenario");
            results.push(self.run_scenario(scenario).await);

            if index + 1 < total && !self.config.settle_delay.is_zero() {
                tokio::time::sleep(self.config.settle_delay).await;
            }
        }

        let campaign = CampaignResult::from_results(started_at, started.elapsed(), results);
        if total == 0 {
            warn!("campaign contained no scenarios, pass rate reported as 0%");
        }
        info!(
            campaign_id = %campaign.campaign_id,
            total,
            passed = campaign.passed,
            failed = campaign.failed,
            pass_rate = campaign.pass_rate(),
            "campaign finished"
        );
        metrics::gauge!(m::RUNNER_CAMPAIGN_PASS_RATE).set(campaign.pass_rate());

        campaign
    }

    /// 실행 이력으로 리포트를 생성합니다.
    pub async fn generate_report(
        &self,
        path: impl AsRef<Path>,
        format: ReportFormat,
    ) -> Result<(), RunnerError> {
        write_report(path, format, &self.history).await
    }

    async fn execute(
        &self,
        scenario: &Scenario,
        result: &mut ScenarioResult,
    ) -> Result<(), RunnerError> {
        if let Some(preconditions) = &scenario.preconditions {
            let delay = preconditions.delay(self.config.precondition_default)?;
            info!(
                scenario_id = %result.scenario_id,
                delay_ms = delay.as_millis() as u64,
                "waiting for preconditions"
            );
            tokio::time::sleep(delay).await;
        }

        for spec in &scenario.faults {
            let fault = spec.resolve(self.injector.config())?;
            info!(
                scenario_id = %result.scenario_id,
                kind = %fault.kind(),
                can_id = %HexId(fault.can_id),
                duration_ms = fault.duration.as_millis() as u64,
                "injecting fault"
            );
            fault.inject(&*self.injector).await?;
            result.faults_injected.push(fault.kind());
            tokio::time::sleep(fault.duration).await;
        }

        info!(
            scenario_id = %result.scenario_id,
            delay_ms = self.config.observation_delay.as_millis() as u64,
            "observing"
        );
        tokio::time::sleep(self.config.observation_delay).await;

        if let Some(expected) = &scenario.expected_behavior {
            info!(
                scenario_id = %result.scenario_id,
                dtc_codes = ?expected.dtc_codes,
                "expected behavior recorded"
            );
            result.expected_dtc = Some(expected.dtc_codes.clone());
        }

        Ok(())
    }
}
