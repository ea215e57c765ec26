//! 폴트 인젝터 설정
//!
//! [`InjectorConfig`]는 core의 [`InjectorSection`](canfault_core::config::InjectorSection)을
//! 기반으로 인젝터 전용 설정을 제공합니다.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use canfault_core::frame::MAX_EXTENDED_ID;

use crate::error::InjectorError;

/// 폴트 인젝터 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InjectorConfig {
    /// frozen/out-of-range 폴트의 기본 전송 주기 (밀리초)
    pub default_period_ms: u64,
    /// flooding 기본 CAN ID
    pub flood_can_id: u32,
    /// flooding 기본 속도 (초당 메시지 수)
    pub flood_rate: u32,
    /// flooding 최대 속도 (초당 메시지 수)
    pub max_flood_rate: u32,
}

impl Default for InjectorConfig {
    fn default() -> Self {
        Self::from_core(&canfault_core::config::InjectorSection::default())
    }
}

impl InjectorConfig {
    /// core의 `InjectorSection`에서 인젝터 설정을 생성합니다.
    pub fn from_core(core: &canfault_core::config::InjectorSection) -> Self {
        Self {
            default_period_ms: core.default_period_ms,
            flood_can_id: core.flood_can_id,
            flood_rate: core.flood_rate,
            max_flood_rate: core.max_flood_rate,
        }
    }

    /// 기본 전송 주기
    pub fn default_period(&self) -> Duration {
        Duration::from_millis(self.default_period_ms)
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), InjectorError> {
        if self.default_period_ms == 0 {
            return Err(InjectorError::Config {
                field: "default_period_ms".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.flood_can_id > MAX_EXTENDED_ID {
            return Err(InjectorError::Config {
                field: "flood_can_id".to_owned(),
                reason: format!("must be 0-0x{MAX_EXTENDED_ID:X}"),
            });
        }

        if self.max_flood_rate == 0 {
            return Err(InjectorError::Config {
                field: "max_flood_rate".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.flood_rate == 0 || self.flood_rate > self.max_flood_rate {
            return Err(InjectorError::Config {
                field: "flood_rate".to_owned(),
                reason: format!("must be 1-{}", self.max_flood_rate),
            });
        }

        Ok(())
    }
}
