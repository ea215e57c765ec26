//! 메트릭 상수
//!
//! 모든 메트릭의 이름을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다. 레코더가 설치되지 않으면
//! 매크로 호출은 아무 동작도 하지 않습니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `canfault_`
//! - 모듈명: `injector_`, `runner_`
//! - 접미어: `_total` (counter), `_seconds` (histogram), 없음 (gauge)

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 폴트 유형 레이블 키 (frozen_value, out_of_range, missing, flooding)
pub const LABEL_FAULT_KIND: &str = "kind";

/// 결과 레이블 키 (pass, fail)
pub const LABEL_RESULT: &str = "result";

// ─── Fault Injector 메트릭 ─────────────────────────────────────────

/// Injector: 시작된 폴트 수 (counter, label: kind)
pub const INJECTOR_FAULTS_STARTED_TOTAL: &str = "canfault_injector_faults_started_total";

/// Injector: 폴트 태스크가 전송한 프레임 수 (counter, label: kind)
pub const INJECTOR_FRAMES_SENT_TOTAL: &str = "canfault_injector_frames_sent_total";

/// Injector: 폴트 태스크 내 전송 실패 수 (counter, label: kind)
pub const INJECTOR_SEND_FAILURES_TOTAL: &str = "canfault_injector_send_failures_total";

/// Injector: 현재 활성 폴트 태스크 수 (gauge)
pub const INJECTOR_ACTIVE_FAULTS: &str = "canfault_injector_active_faults";

// ─── Scenario Runner 메트릭 ────────────────────────────────────────

/// Runner: 완료된 시나리오 수 (counter, label: result)
pub const RUNNER_SCENARIOS_TOTAL: &str = "canfault_runner_scenarios_total";

/// Runner: 시나리오 실행 시간 (histogram, 초)
pub const RUNNER_SCENARIO_DURATION_SECONDS: &str = "canfault_runner_scenario_duration_seconds";

/// Runner: 마지막 캠페인 통과율 (gauge, 퍼센트)
pub const RUNNER_CAMPAIGN_PASS_RATE: &str = "canfault_runner_campaign_pass_rate";
