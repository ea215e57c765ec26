//! 설정 관리 — canfault.toml 파싱 및 런타임 설정
//!
//! [`CanfaultConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`CANFAULT_RUNNER_SETTLE_DELAY_MS=500` 형식)
//! 3. 설정 파일 (`canfault.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), canfault_core::error::CanfaultError> {
//! use canfault_core::config::CanfaultConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = CanfaultConfig::load("canfault.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = CanfaultConfig::parse("[runner]\nobservation_delay_ms = 500")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{CanfaultError, ConfigError};
use crate::frame::{MAX_EXTENDED_ID, MAX_STANDARD_ID};

/// canfault 통합 설정
///
/// `canfault.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 모듈은 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CanfaultConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// CAN 전송 계층 설정
    #[serde(default)]
    pub transport: TransportConfig,
    /// 폴트 인젝터 설정
    #[serde(default)]
    pub injector: InjectorSection,
    /// 시나리오 러너 설정
    #[serde(default)]
    pub runner: RunnerSection,
}

impl CanfaultConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, CanfaultError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, CanfaultError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CanfaultError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                CanfaultError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, CanfaultError> {
        toml::from_str(toml_str).map_err(|e| {
            CanfaultError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `CANFAULT_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "CANFAULT_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "CANFAULT_GENERAL_LOG_FORMAT");

        // Transport
        override_string(&mut self.transport.channel, "CANFAULT_TRANSPORT_CHANNEL");
        override_u32(&mut self.transport.bitrate, "CANFAULT_TRANSPORT_BITRATE");
        override_u64(
            &mut self.transport.receive_poll_ms,
            "CANFAULT_TRANSPORT_RECEIVE_POLL_MS",
        );

        // Injector
        override_u64(
            &mut self.injector.default_period_ms,
            "CANFAULT_INJECTOR_DEFAULT_PERIOD_MS",
        );
        override_u32(
            &mut self.injector.flood_can_id,
            "CANFAULT_INJECTOR_FLOOD_CAN_ID",
        );
        override_u32(&mut self.injector.flood_rate, "CANFAULT_INJECTOR_FLOOD_RATE");
        override_u32(
            &mut self.injector.max_flood_rate,
            "CANFAULT_INJECTOR_MAX_FLOOD_RATE",
        );

        // Runner
        override_u64(
            &mut self.runner.precondition_default_ms,
            "CANFAULT_RUNNER_PRECONDITION_DEFAULT_MS",
        );
        override_u64(
            &mut self.runner.observation_delay_ms,
            "CANFAULT_RUNNER_OBSERVATION_DELAY_MS",
        );
        override_u64(
            &mut self.runner.settle_delay_ms,
            "CANFAULT_RUNNER_SETTLE_DELAY_MS",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), CanfaultError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.transport.channel.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "transport.channel".to_owned(),
                reason: "channel must not be empty".to_owned(),
            }
            .into());
        }

        if self.transport.bitrate == 0 || self.transport.bitrate > MAX_BITRATE {
            return Err(ConfigError::InvalidValue {
                field: "transport.bitrate".to_owned(),
                reason: format!("must be 1-{MAX_BITRATE}"),
            }
            .into());
        }

        if self.injector.default_period_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "injector.default_period_ms".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.injector.flood_can_id > MAX_EXTENDED_ID {
            return Err(ConfigError::InvalidValue {
                field: "injector.flood_can_id".to_owned(),
                reason: format!("must be 0-0x{MAX_EXTENDED_ID:X}"),
            }
            .into());
        }

        if self.injector.max_flood_rate == 0 {
            return Err(ConfigError::InvalidValue {
                field: "injector.max_flood_rate".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.injector.flood_rate == 0 || self.injector.flood_rate > self.injector.max_flood_rate
        {
            return Err(ConfigError::InvalidValue {
                field: "injector.flood_rate".to_owned(),
                reason: format!("must be 1-{}", self.injector.max_flood_rate),
            }
            .into());
        }

        Ok(())
    }
}

/// 비트레이트 상한 (CAN FD 데이터 단계 포함)
const MAX_BITRATE: u32 = 8_000_000;

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// CAN 전송 계층 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// 채널 이름 (시뮬레이션에서는 `virtual`)
    pub channel: String,
    /// 버스 비트레이트 (bps)
    pub bitrate: u32,
    /// 수신 대기 시 큐 확인 간격 (밀리초)
    pub receive_poll_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            channel: "virtual".to_owned(),
            bitrate: 500_000,
            receive_poll_ms: 10,
        }
    }
}

/// 폴트 인젝터 설정 섹션
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InjectorSection {
    /// frozen/out-of-range 폴트의 기본 전송 주기 (밀리초)
    pub default_period_ms: u64,
    /// flooding 폴트에서 `can_id` 생략 시 사용할 ID
    pub flood_can_id: u32,
    /// flooding 폴트에서 `rate` 생략 시 사용할 초당 메시지 수
    pub flood_rate: u32,
    /// 허용하는 최대 flooding 속도 (초당 메시지 수)
    pub max_flood_rate: u32,
}

impl Default for InjectorSection {
    fn default() -> Self {
        Self {
            default_period_ms: 10,
            flood_can_id: MAX_STANDARD_ID,
            flood_rate: 1000,
            max_flood_rate: 100_000,
        }
    }
}

/// 시나리오 러너 설정 섹션
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerSection {
    /// `preconditions`에 `duration`이 없을 때의 대기 시간 (밀리초)
    pub precondition_default_ms: u64,
    /// 모든 폴트 이후 관찰 대기 시간 (밀리초)
    pub observation_delay_ms: u64,
    /// 캠페인 내 시나리오 사이의 안정화 대기 시간 (밀리초)
    pub settle_delay_ms: u64,
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            precondition_default_ms: 2000,
            observation_delay_ms: 2000,
            settle_delay_ms: 1000,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_u32(target: &mut u32, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match parse_u32_maybe_hex(&val) {
            Some(parsed) => *target = parsed,
            None => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u32 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

/// CAN ID 환경변수는 `0x7FF` 형식도 허용합니다.
fn parse_u32_maybe_hex(val: &str) -> Option<u32> {
    let val = val.trim();
    match val.strip_prefix("0x").or_else(|| val.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => val.parse::<u32>().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_values() {
        let config = CanfaultConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.transport.channel, "virtual");
        assert_eq!(config.transport.bitrate, 500_000);
        assert_eq!(config.injector.default_period_ms, 10);
        assert_eq!(config.injector.flood_can_id, 0x7FF);
        assert_eq!(config.injector.flood_rate, 1000);
        assert_eq!(config.runner.observation_delay_ms, 2000);
        assert_eq!(config.runner.settle_delay_ms, 1000);
    }

    #[test]
    fn default_config_passes_validation() {
        CanfaultConfig::default().validate().unwrap();
    }

    #[test]
    fn from_str_empty_toml_uses_defaults() {
        let config = CanfaultConfig::parse("").unwrap();
        assert_eq!(config.general.log_format, "pretty");
        assert_eq!(config.runner.precondition_default_ms, 2000);
    }

    #[test]
    fn from_str_partial_toml_merges_with_defaults() {
        let toml = r#"
[runner]
observation_delay_ms = 250

[injector]
flood_can_id = 0x100
"#;
        let config = CanfaultConfig::parse(toml).unwrap();
        assert_eq!(config.runner.observation_delay_ms, 250);
        // settle_delay_ms는 기본값 유지
        assert_eq!(config.runner.settle_delay_ms, 1000);
        assert_eq!(config.injector.flood_can_id, 0x100);
        assert_eq!(config.injector.flood_rate, 1000);
    }

    #[test]
    fn from_str_invalid_toml_returns_error() {
        let err = CanfaultConfig::parse("invalid = [[[toml").unwrap_err();
        assert!(matches!(
            err,
            CanfaultError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = CanfaultConfig::default();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_zero_period() {
        let mut config = CanfaultConfig::default();
        config.injector.default_period_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("default_period_ms"));
    }

    #[test]
    fn validate_rejects_flood_rate_above_max() {
        let mut config = CanfaultConfig::default();
        config.injector.flood_rate = 200_000;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("flood_rate"));
    }

    #[test]
    fn validate_rejects_empty_channel() {
        let mut config = CanfaultConfig::default();
        config.transport.channel = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("channel"));
    }

    #[test]
    fn parse_u32_accepts_hex_and_decimal() {
        assert_eq!(parse_u32_maybe_hex("0x7FF"), Some(0x7FF));
        assert_eq!(parse_u32_maybe_hex("2047"), Some(2047));
        assert_eq!(parse_u32_maybe_hex("zz"), None);
    }

    #[test]
    fn env_override_missing_var_keeps_original() {
        let mut val = "original".to_owned();
        override_string(&mut val, "TEST_CANFAULT_NONEXISTENT_12345");
        assert_eq!(val, "original");
    }

    #[test]
    fn config_serialize_roundtrip() {
        let config = CanfaultConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = CanfaultConfig::parse(&toml_str).unwrap();
        assert_eq!(config.transport.bitrate, parsed.transport.bitrate);
        assert_eq!(config.runner.settle_delay_ms, parsed.runner.settle_delay_ms);
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let err = CanfaultConfig::from_file("/nonexistent/path/canfault.toml")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CanfaultError::Config(ConfigError::FileNotFound { .. })
        ));
    }
}
