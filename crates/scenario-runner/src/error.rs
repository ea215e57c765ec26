//! 시나리오 러너 에러 타입
//!
//! [`RunnerError`]는 시나리오 로딩, 폴트 해석/인젝션, 리포트 작성 실패를 표현합니다.
//! 시나리오 실행 중 발생한 에러는 호출자에게 전파되지 않고
//! `Fail` 결과의 에러 설명으로 변환됩니다.

use canfault_core::error::{CanfaultError, ConfigError, ValidationError};
use canfault_injector::InjectorError;

/// 시나리오 러너 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// 시나리오 파일 로딩 실패
    #[error("scenario load error: {path}: {reason}")]
    ScenarioLoad {
        /// 시나리오 파일 경로
        path: String,
        /// 로딩 실패 사유
        reason: String,
    },

    /// 시나리오/폴트 정의 검증 실패
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// 폴트 인젝터가 요청을 거부함
    #[error(transparent)]
    Injector(#[from] InjectorError),

    /// 리포트 렌더링/작성 실패
    #[error("report error: {0}")]
    Report(String),
}

impl From<RunnerError> for CanfaultError {
    fn from(err: RunnerError) -> Self {
        match err {
            RunnerError::ScenarioLoad { path, reason } => {
                CanfaultError::Config(ConfigError::ParseFailed {
                    reason: format!("{path}: {reason}"),
                })
            }
            RunnerError::Validation(e) => CanfaultError::Validation(e),
            RunnerError::Injector(e) => e.into(),
            RunnerError::Report(msg) => CanfaultError::Io(std::io::Error::other(msg)),
        }
    }
}
