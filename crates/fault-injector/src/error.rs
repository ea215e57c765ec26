//! 폴트 인젝터 에러 타입
//!
//! [`InjectorError`]는 인젝션 요청이 거부되는 모든 경우를 표현합니다.
//! 폴트 태스크 내부의 전송 실패는 에러로 전파되지 않고 로깅/카운트만 됩니다.

use canfault_core::error::{CanfaultError, ConfigError, ValidationError};

/// 폴트 인젝터 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum InjectorError {
    /// 인젝션 파라미터 검증 실패
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// flooding 속도가 설정 상한 초과
    #[error("flood rate {rate} msg/s exceeds limit {max} msg/s")]
    RateLimitExceeded {
        /// 요청된 속도
        rate: u32,
        /// 설정 상한
        max: u32,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },
}

impl From<InjectorError> for CanfaultError {
    fn from(err: InjectorError) -> Self {
        match err {
            InjectorError::Validation(e) => CanfaultError::Validation(e),
            InjectorError::RateLimitExceeded { rate, max } => {
                CanfaultError::Validation(ValidationError::Overflow(format!(
                    "flood rate {rate} exceeds {max}"
                )))
            }
            InjectorError::Config { field, reason } => {
                CanfaultError::Config(ConfigError::InvalidValue { field, reason })
            }
        }
    }
}
