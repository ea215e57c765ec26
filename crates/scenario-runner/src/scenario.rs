//! 시나리오 정의와 JSON 로더
//!
//! 시나리오 파일은 JSON 배열이며, 각 원소가 하나의 [`Scenario`]입니다.
//! 폴트 정의([`FaultSpec`])는 파일 형식 그대로 보관하고, 실행 직전에
//! [`FaultSpec::resolve`]로 타입이 있는 [`ResolvedFault`]로 변환합니다.
//! 폴트 필드는 JSON 값 그대로 받으므로 알 수 없는 유형, 누락된 필드,
//! 타입이 틀린 값이 있어도 파일 로딩은 성공하며 해당 시나리오만 실행 시점에 실패합니다.
//!
//! ```json
//! [
//!   {
//!     "id": 1,
//!     "name": "Frozen speed sensor",
//!     "preconditions": { "duration": 0.5 },
//!     "faults": [
//!       { "type": "frozen_value", "can_id": "0x200", "data": "0000000000000000", "duration": 3 }
//!     ],
//!     "expected_behavior": { "dtc_codes": ["C0035"] }
//!   }
//! ]
//! ```

use std::fmt;
use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use canfault_core::error::ValidationError;
use canfault_core::frame::{parse_can_id, parse_hex_payload};
use canfault_core::transport::CanTransport;
use canfault_injector::{FaultHandle, FaultInjector, FaultKind, InjectorConfig, InjectorError};

use crate::error::RunnerError;

/// 시나리오 파일 최대 크기 (바이트)
const MAX_SCENARIO_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// 시나리오 식별자 (JSON 숫자 또는 문자열, 그 밖의 값은 그대로 보관)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScenarioId {
    Number(i64),
    Text(String),
    Other(Value),
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Other(v) => write!(f, "{v}"),
        }
    }
}

/// 테스트 시나리오
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub id: ScenarioId,
    pub name: String,
    /// 폴트 인젝션 전 안정화 대기
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preconditions: Option<Preconditions>,
    /// 선언 순서대로 실행할 폴트 목록
    #[serde(default)]
    pub faults: Vec<FaultSpec>,
    /// 기대 동작 (기록만 하며 검증하지 않음)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_behavior: Option<ExpectedBehavior>,
}

impl Scenario {
    /// 모든 폴트 정의와 전제 조건을 미리 해석해 봅니다.
    ///
    /// 실행 없이 시나리오 파일을 점검할 때 사용합니다.
    pub fn validate(&self, defaults: &InjectorConfig) -> Result<Vec<ResolvedFault>, ValidationError> {
        if let Some(pre) = &self.preconditions {
            pre.delay(Duration::ZERO)?;
        }
        self.faults.iter().map(|spec| spec.resolve(defaults)).collect()
    }

    /// 모든 폴트 지속 시간의 합 (해석 가능한 폴트만)
    pub fn nominal_fault_time(&self) -> Duration {
        self.faults
            .iter()
            .filter_map(|spec| present(&spec.duration)?.as_f64())
            .filter_map(|secs| Duration::try_from_secs_f64(secs).ok())
            .sum()
    }
}

/// 전제 조건
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Preconditions {
    /// 대기 시간 (초). 생략 시 러너 기본값 사용
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Value>,
}

impl Preconditions {
    /// 실제 대기 시간을 계산합니다. 음수나 유한하지 않은 값은 거부합니다.
    pub fn delay(&self, default: Duration) -> Result<Duration, ValidationError> {
        const FIELD: &str = "preconditions.duration";
        let Some(value) = present(&self.duration) else {
            return Ok(default);
        };
        match number_field(FIELD, value)? {
            secs if secs == 0.0 => Ok(Duration::ZERO),
            secs => seconds(FIELD, secs),
        }
    }
}

/// 기대 동작
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpectedBehavior {
    #[serde(default)]
    pub dtc_codes: Vec<String>,
}

/// 파일 형식 그대로의 폴트 정의
///
/// 모든 필드는 JSON 값 그대로 보관하며 타입 검사는 [`resolve`](Self::resolve)가 합니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaultSpec {
    /// `frozen_value`, `out_of_range`, `missing`, `flooding`
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<Value>,
    /// 16진수 CAN ID 문자열 (`"0x200"`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_id: Option<Value>,
    /// 지속 시간 (초)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Value>,
    /// frozen_value 페이로드 (16진수 문자열)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// out_of_range 물리 최대값 (정수)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<Value>,
    /// flooding 속도 (초당 메시지 수)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<Value>,
    /// frozen_value / out_of_range 전송 주기 (밀리초)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_ms: Option<Value>,
}

/// 해석이 끝난 폴트
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFault {
    pub can_id: u32,
    pub duration: Duration,
    pub action: FaultAction,
}

/// 폴트 유형별 파라미터
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultAction {
    FrozenValue { data: Bytes, period: Duration },
    OutOfRange { max_value: u64, period: Duration },
    Missing,
    Flooding { rate: u32 },
}

impl ResolvedFault {
    pub fn kind(&self) -> FaultKind {
        match self.action {
            FaultAction::FrozenValue { .. } => FaultKind::FrozenValue,
            FaultAction::OutOfRange { .. } => FaultKind::OutOfRange,
            FaultAction::Missing => FaultKind::Missing,
            FaultAction::Flooding { .. } => FaultKind::Flooding,
        }
    }

    /// 유형에 맞는 인젝터 연산으로 폴트를 시작합니다.
    pub async fn inject<T: CanTransport>(
        &self,
        injector: &FaultInjector<T>,
    ) -> Result<FaultHandle, InjectorError> {
        match &self.action {
            FaultAction::FrozenValue { data, period } => {
                injector
                    .inject_frozen_value(self.can_id, data.clone(), self.duration, *period)
                    .await
            }
            FaultAction::OutOfRange { max_value, period } => {
                injector
                    .inject_out_of_range(self.can_id, *max_value, self.duration, *period)
                    .await
            }
            FaultAction::Missing => {
                injector
                    .inject_missing_message(self.can_id, self.duration)
                    .await
            }
            FaultAction::Flooding { rate } => {
                injector
                    .inject_can_flooding(self.can_id, *rate, self.duration)
                    .await
            }
        }
    }
}

impl FaultSpec {
    /// 폴트 정의를 해석합니다.
    ///
    /// flooding은 `can_id`와 `rate`가 없으면 `defaults`의 값을 씁니다.
    /// 주기 폴트는 `period_ms`가 없으면 `defaults.default_period_ms`를 씁니다.
    ///
    /// # Errors
    /// 알 수 없는 유형, 잘못된 16진수 ID/페이로드, 필수 필드 누락, 타입이 틀린 값, 0 이하의 수치
    pub fn resolve(&self, defaults: &InjectorConfig) -> Result<ResolvedFault, ValidationError> {
        let kind: FaultKind = match present(&self.kind) {
            Some(value) => string_field("type", value)?.parse()?,
            None => {
                return Err(ValidationError::MissingField {
                    kind: "(none)".to_owned(),
                    field: "type".to_owned(),
                });
            }
        };
        let duration = present(&self.duration).ok_or_else(|| missing(kind, "duration"))?;
        let duration = seconds("duration", number_field("duration", duration)?)?;

        let can_id = match (present(&self.can_id), kind) {
            (Some(raw), _) => parse_can_id(string_field("can_id", raw)?)?,
            (None, FaultKind::Flooding) => defaults.flood_can_id,
            (None, _) => return Err(missing(kind, "can_id")),
        };

        let period = match present(&self.period_ms) {
            Some(value) => match integer_field("period_ms", value)? {
                0 => {
                    return Err(ValidationError::NotPositive {
                        field: "period_ms".to_owned(),
                        value: "0".to_owned(),
                    });
                }
                ms => Duration::from_millis(ms),
            },
            None => defaults.default_period(),
        };

        let action = match kind {
            FaultKind::FrozenValue => {
                let raw = present(&self.data).ok_or_else(|| missing(kind, "data"))?;
                FaultAction::FrozenValue {
                    data: Bytes::from(parse_hex_payload(string_field("data", raw)?)?),
                    period,
                }
            }
            FaultKind::OutOfRange => {
                let raw = present(&self.max_value).ok_or_else(|| missing(kind, "max_value"))?;
                FaultAction::OutOfRange {
                    max_value: integer_field("max_value", raw)?,
                    period,
                }
            }
            FaultKind::Missing => FaultAction::Missing,
            FaultKind::Flooding => {
                let rate = match present(&self.rate) {
                    Some(raw) => {
                        let rate = integer_field("rate", raw)?;
                        u32::try_from(rate)
                            .map_err(|_| ValidationError::Overflow(format!("rate = {rate}")))?
                    }
                    None => defaults.flood_rate,
                };
                if rate == 0 {
                    return Err(ValidationError::NotPositive {
                        field: "rate".to_owned(),
                        value: "0".to_owned(),
                    });
                }
                FaultAction::Flooding { rate }
            }
        };

        Ok(ResolvedFault {
            can_id,
            duration,
            action,
        })
    }
}

/// `null`은 생략과 같게 취급합니다.
fn present(value: &Option<Value>) -> Option<&Value> {
    value.as_ref().filter(|v| !v.is_null())
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn invalid_type(field: &str, expected: &str, value: &Value) -> ValidationError {
    ValidationError::InvalidType {
        field: field.to_owned(),
        expected: expected.to_owned(),
        found: json_type(value).to_owned(),
    }
}

fn string_field<'a>(field: &str, value: &'a Value) -> Result<&'a str, ValidationError> {
    value
        .as_str()
        .ok_or_else(|| invalid_type(field, "a string", value))
}

fn number_field(field: &str, value: &Value) -> Result<f64, ValidationError> {
    value
        .as_f64()
        .ok_or_else(|| invalid_type(field, "a number", value))
}

/// 음이 아닌 정수 필드. 음수는 `NotPositive`, 소수나 다른 타입은 `InvalidType`
fn integer_field(field: &str, value: &Value) -> Result<u64, ValidationError> {
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    match value.as_i64() {
        Some(n) => Err(ValidationError::NotPositive {
            field: field.to_owned(),
            value: n.to_string(),
        }),
        None => Err(ValidationError::InvalidType {
            field: field.to_owned(),
            expected: "a non-negative integer".to_owned(),
            found: value.to_string(),
        }),
    }
}

fn missing(kind: FaultKind, field: &str) -> ValidationError {
    ValidationError::MissingField {
        kind: kind.to_string(),
        field: field.to_owned(),
    }
}

/// 초 단위 실수를 양의 `Duration`으로 변환합니다.
fn seconds(field: &str, secs: f64) -> Result<Duration, ValidationError> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(ValidationError::NotPositive {
            field: field.to_owned(),
            value: secs.to_string(),
        });
    }
    Duration::try_from_secs_f64(secs)
        .map_err(|e| ValidationError::Overflow(format!("{field} = {secs}: {e}")))
}

/// JSON 문자열에서 시나리오 목록을 파싱합니다.
pub fn parse_scenarios(content: &str) -> Result<Vec<Scenario>, serde_json::Error> {
    serde_json::from_str(content)
}

/// 시나리오 파일을 로드합니다.
///
/// 파일 구조만 검증하며, 폴트 정의의 의미 검증은 실행 시점에 수행합니다.
pub async fn load_scenarios(path: impl AsRef<Path>) -> Result<Vec<Scenario>, RunnerError> {
    let path = path.as_ref();
    let load_err = |reason: String| RunnerError::ScenarioLoad {
        path: path.display().to_string(),
        reason,
    };

    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| load_err(format!("failed to read metadata: {e}")))?;
    if metadata.len() > MAX_SCENARIO_FILE_SIZE {
        return Err(load_err(format!(
            "file too large: {} bytes (max: {MAX_SCENARIO_FILE_SIZE})",
            metadata.len()
        )));
    }

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| load_err(format!("failed to read file: {e}")))?;
    let scenarios =
        parse_scenarios(&content).map_err(|e| load_err(format!("failed to parse JSON: {e}")))?;

    debug!(path = %path.display(), count = scenarios.len(), "scenarios loaded");
    Ok(scenarios)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(json: &str) -> FaultSpec {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn parses_scenario_with_all_sections() {
        let json = r#"[{
            "id": 7,
            "name": "Brake sensor frozen",
            "preconditions": { "duration": 0.5 },
            "faults": [
                { "type": "frozen_value", "can_id": "0x200", "data": "00 11 22", "duration": 1.5 }
            ],
            "expected_behavior": { "dtc_codes": ["C0035", "U0121"] }
        }]"#;
        let scenarios = parse_scenarios(json).unwrap();
        assert_eq!(scenarios.len(), 1);
        let s = &scenarios[0];
        assert_eq!(s.id, ScenarioId::Number(7));
        assert_eq!(s.id.to_string(), "7");
        assert_eq!(s.faults.len(), 1);
        assert_eq!(
            s.expected_behavior.as_ref().unwrap().dtc_codes,
            vec!["C0035", "U0121"]
        );
        assert_eq!(s.nominal_fault_time(), Duration::from_millis(1500));
    }

    #[test]
    fn string_ids_and_missing_optionals() {
        let json = r#"[{ "id": "TC-001", "name": "empty", "faults": [] }]"#;
        let s = &parse_scenarios(json).unwrap()[0];
        assert_eq!(s.id.to_string(), "TC-001");
        assert!(s.preconditions.is_none());
        assert!(s.expected_behavior.is_none());
    }

    #[test]
    fn unknown_type_loads_but_fails_to_resolve() {
        let spec = spec(r#"{ "type": "bit_flip", "can_id": "0x100", "duration": 1 }"#);
        assert_eq!(
            spec.resolve(&InjectorConfig::default()).unwrap_err(),
            ValidationError::UnknownFaultKind("bit_flip".to_owned())
        );
    }

    #[test]
    fn frozen_value_resolves_payload_and_default_period() {
        let spec = spec(
            r#"{ "type": "frozen_value", "can_id": "0x1A0", "data": "DEADBEEF", "duration": 2 }"#,
        );
        let fault = spec.resolve(&InjectorConfig::default()).unwrap();
        assert_eq!(fault.can_id, 0x1A0);
        assert_eq!(fault.duration, Duration::from_secs(2));
        assert_eq!(
            fault.action,
            FaultAction::FrozenValue {
                data: Bytes::from_static(&[0xDE, 0xAD, 0xBE, 0xEF]),
                period: Duration::from_millis(10),
            }
        );
        assert_eq!(fault.kind(), FaultKind::FrozenValue);
    }

    #[test]
    fn flooding_uses_defaults() {
        let spec = spec(r#"{ "type": "flooding", "duration": 0.25 }"#);
        let fault = spec.resolve(&InjectorConfig::default()).unwrap();
        assert_eq!(fault.can_id, 0x7FF);
        assert_eq!(fault.action, FaultAction::Flooding { rate: 1000 });
    }

    #[test]
    fn missing_required_fields_are_rejected() {
        let defaults = InjectorConfig::default();
        let err = spec(r#"{ "type": "frozen_value", "can_id": "0x200", "duration": 1 }"#)
            .resolve(&defaults)
            .unwrap_err();
        assert!(matches!(err, ValidationError::MissingField { ref field, .. } if field == "data"));

        let err = spec(r#"{ "type": "out_of_range", "can_id": "0x200", "duration": 1 }"#)
            .resolve(&defaults)
            .unwrap_err();
        assert!(matches!(err, ValidationError::MissingField { ref field, .. } if field == "max_value"));

        let err = spec(r#"{ "type": "missing", "duration": 1 }"#)
            .resolve(&defaults)
            .unwrap_err();
        assert!(matches!(err, ValidationError::MissingField { ref field, .. } if field == "can_id"));
    }

    #[test]
    fn malformed_values_are_rejected() {
        let defaults = InjectorConfig::default();
        let cases = [
            r#"{ "type": "missing", "can_id": "0xZZ", "duration": 1 }"#,
            r#"{ "type": "missing", "can_id": "0x100", "duration": 0 }"#,
            r#"{ "type": "missing", "can_id": "0x100", "duration": -1.5 }"#,
            r#"{ "type": "flooding", "rate": 0, "duration": 1 }"#,
            r#"{ "type": "frozen_value", "can_id": "0x100", "data": "ABC", "duration": 1 }"#,
            r#"{ "type": "frozen_value", "can_id": "0x100", "data": "001122334455667788", "duration": 1 }"#,
            r#"{ "type": "out_of_range", "can_id": "0x100", "max_value": 5, "period_ms": 0, "duration": 1 }"#,
        ];
        for case in cases {
            assert!(spec(case).resolve(&defaults).is_err(), "accepted: {case}");
        }
    }

    #[test]
    fn mistyped_fields_load_and_fail_at_resolve() {
        let json = r#"[{
            "id": 3, "name": "mistyped",
            "faults": [
                { "type": "out_of_range", "can_id": "0x300", "max_value": 250.5, "duration": 1 },
                { "type": "flooding", "rate": -1, "duration": 1 },
                { "type": "missing", "can_id": 416, "duration": 1 },
                { "type": "missing", "can_id": "0x1A0" },
                { "can_id": "0x1A0", "duration": 1 },
                { "type": "flooding", "rate": 5000000000, "duration": 1 }
            ]
        }]"#;
        let scenario = &parse_scenarios(json).expect("file with mistyped faults still loads")[0];
        let defaults = InjectorConfig::default();
        let errors: Vec<ValidationError> = scenario
            .faults
            .iter()
            .map(|spec| spec.resolve(&defaults).unwrap_err())
            .collect();

        assert!(matches!(&errors[0], ValidationError::InvalidType { field, .. } if field == "max_value"));
        assert!(matches!(&errors[1], ValidationError::NotPositive { field, .. } if field == "rate"));
        assert!(matches!(&errors[2], ValidationError::InvalidType { field, .. } if field == "can_id"));
        assert!(matches!(&errors[3], ValidationError::MissingField { field, .. } if field == "duration"));
        assert!(matches!(&errors[4], ValidationError::MissingField { field, .. } if field == "type"));
        assert!(matches!(&errors[5], ValidationError::Overflow(_)));
    }

    #[test]
    fn unusual_ids_are_kept() {
        let json = r#"[{ "id": 1.5, "name": "float id", "faults": [] }]"#;
        let s = &parse_scenarios(json).unwrap()[0];
        assert_eq!(s.id.to_string(), "1.5");
    }

    #[test]
    fn validate_reports_first_bad_fault() {
        let json = r#"[{
            "id": 1, "name": "mixed",
            "faults": [
                { "type": "missing", "can_id": "0x100", "duration": 1 },
                { "type": "jitter", "can_id": "0x100", "duration": 1 }
            ]
        }]"#;
        let s = &parse_scenarios(json).unwrap()[0];
        assert!(matches!(
            s.validate(&InjectorConfig::default()),
            Err(ValidationError::UnknownFaultKind(_))
        ));
    }

    #[test]
    fn precondition_delay_defaults_and_validates() {
        let default = Duration::from_secs(2);
        assert_eq!(Preconditions::default().delay(default).unwrap(), default);
        assert_eq!(
            Preconditions { duration: Some(Value::from(0.25)) }.delay(default).unwrap(),
            Duration::from_millis(250)
        );
        assert_eq!(
            Preconditions { duration: Some(Value::Null) }.delay(default).unwrap(),
            default
        );
        assert!(Preconditions { duration: Some(Value::from(-1.0)) }.delay(default).is_err());
        assert!(matches!(
            Preconditions { duration: Some(Value::from("2s")) }.delay(default),
            Err(ValidationError::InvalidType { .. })
        ));
    }

    #[tokio::test]
    async fn load_missing_file_is_load_error() {
        let err = load_scenarios("/nonexistent/scenarios.json").await.unwrap_err();
        assert!(matches!(err, RunnerError::ScenarioLoad { .. }));
    }
}
