//! 폴트 유형, 페이로드 계산, 태스크 핸들/리포트

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use canfault_core::error::ValidationError;
use canfault_core::frame::MAX_PAYLOAD_LEN;

/// flooding 폴트가 반복 전송하는 고부하 페이로드
pub const FLOOD_PAYLOAD: [u8; MAX_PAYLOAD_LEN] = [0xFF; MAX_PAYLOAD_LEN];

/// out-of-range 폴트에서 물리 최대값에 곱하는 배수
pub const OUT_OF_RANGE_FACTOR: u64 = 10;

/// 폴트 유형
///
/// 직렬화 이름은 시나리오 파일의 `type` 값과 같습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// 같은 값을 주기적으로 반복 전송 (센서 값 고착)
    FrozenValue,
    /// 물리 한계를 벗어난 값을 주기적으로 전송
    OutOfRange,
    /// 주기 메시지 부재 (버스에 아무것도 보내지 않음)
    Missing,
    /// 고속 전송으로 버스 부하 유발
    Flooding,
}

impl FaultKind {
    /// 시나리오 파일/메트릭 레이블에서 쓰는 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FrozenValue => "frozen_value",
            Self::OutOfRange => "out_of_range",
            Self::Missing => "missing",
            Self::Flooding => "flooding",
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FaultKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "frozen_value" => Ok(Self::FrozenValue),
            "out_of_range" => Ok(Self::OutOfRange),
            "missing" => Ok(Self::Missing),
            "flooding" => Ok(Self::Flooding),
            other => Err(ValidationError::UnknownFaultKind(other.to_owned())),
        }
    }
}

/// out-of-range 페이로드를 계산합니다.
///
/// `max_physical_value * 10`을 빅엔디언 8바이트 부호 없는 정수로 인코딩합니다.
/// 매 주기 같은 값이 반복되는 고정(frozen) 형태의 폴트입니다.
pub fn out_of_range_payload(max_physical_value: u64) -> Result<[u8; 8], ValidationError> {
    let invalid = max_physical_value
        .checked_mul(OUT_OF_RANGE_FACTOR)
        .ok_or_else(|| {
            ValidationError::Overflow(format!(
                "max_physical_value {max_physical_value} * {OUT_OF_RANGE_FACTOR} exceeds u64"
            ))
        })?;
    Ok(invalid.to_be_bytes())
}

/// flooding 속도(초당 메시지 수)를 전송 간격으로 변환합니다.
pub fn flood_interval(rate: u32) -> Result<Duration, ValidationError> {
    if rate == 0 {
        return Err(ValidationError::NotPositive {
            field: "rate".to_owned(),
            value: rate.to_string(),
        });
    }
    Ok(Duration::from_secs(1) / rate)
}

/// 종료된 폴트 태스크의 실행 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FaultReport {
    pub can_id: u32,
    pub kind: FaultKind,
    /// 전송 성공 프레임 수
    pub frames_sent: u64,
    /// 전송 실패 수 (태스크는 계속 진행)
    pub send_failures: u64,
    /// 실제 실행 시간
    pub elapsed: Duration,
    /// 취소로 종료되었는지 여부 (false면 지속 시간 만료)
    pub cancelled: bool,
}

/// 실행 중인 폴트 태스크에 대한 핸들
///
/// 인젝션 호출은 이 핸들을 즉시 반환합니다. 태스크 자체의 소유권은
/// [`FaultInjector`](crate::FaultInjector)의 레지스트리에 있으며,
/// 핸들을 drop해도 태스크는 계속 실행됩니다.
#[derive(Debug, Clone)]
pub struct FaultHandle {
    pub(crate) can_id: u32,
    pub(crate) kind: FaultKind,
    pub(crate) started_at: Instant,
    pub(crate) duration: Duration,
    pub(crate) cancel: CancellationToken,
    pub(crate) report_rx: watch::Receiver<Option<FaultReport>>,
}

impl FaultHandle {
    pub fn can_id(&self) -> u32 {
        self.can_id
    }

    pub fn kind(&self) -> FaultKind {
        self.kind
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// 태스크에 취소를 요청합니다. 다음 대기 지점에서 종료됩니다.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// 태스크가 리포트를 남기고 종료되었는지 여부
    pub fn is_finished(&self) -> bool {
        self.report_rx.borrow().is_some()
    }

    /// 태스크 종료를 기다리고 리포트를 반환합니다.
    ///
    /// 태스크가 리포트 없이 사라진 경우(패닉 등) `None`을 반환합니다.
    pub async fn wait(&self) -> Option<FaultReport> {
        let mut rx = self.report_rx.clone();
        match rx.wait_for(Option::is_some).await {
            Ok(report) => report.clone(),
            Err(_) => None,
        }
    }
}
