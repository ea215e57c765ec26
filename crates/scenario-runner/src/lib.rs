#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: 도메인 에러 타입 (`RunnerError`)
//! - [`config`]: 러너 타이밍 설정 (`RunnerConfig`)
//! - [`scenario`]: 시나리오 모델과 JSON 로더 (`Scenario`, `FaultSpec`, `load_scenarios`)
//! - [`result`]: 실행 결과 (`ScenarioResult`, `CampaignResult`)
//! - [`runner`]: 시나리오 실행 상태 머신 (`ScenarioRunner`)
//! - [`report`]: 텍스트/JSON 리포트 렌더링

pub mod config;
pub mod error;
pub mod report;
pub mod result;
pub mod runner;
pub mod scenario;

// --- Public API Re-exports ---

pub use config::RunnerConfig;
pub use error::RunnerError;
pub use report::{ReportFormat, render_json, render_text, write_report};
pub use result::{CampaignResult, ScenarioResult, ScenarioStatus};
pub use runner::ScenarioRunner;
pub use scenario::{
    ExpectedBehavior, FaultAction, FaultSpec, Preconditions, ResolvedFault, Scenario, ScenarioId,
    load_scenarios, parse_scenarios,
};
