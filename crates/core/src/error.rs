//! 에러 타입 — 도메인별 에러 정의

/// canfault 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum CanfaultError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 입력 검증 에러 (호출 시점에 동기적으로 발생)
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// CAN 전송 에러
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 입력 검증 에러
///
/// 잘못된 페이로드 길이, 0 이하의 주기/속도/지속 시간, 알 수 없는 폴트 유형,
/// 잘못된 CAN ID 등은 모두 이 타입으로 즉시 거부됩니다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// 페이로드가 CAN 프레임 최대 길이를 초과
    #[error("payload too long: {len} bytes (max: {max})")]
    PayloadTooLong { len: usize, max: usize },

    /// CAN ID가 허용 범위를 벗어남
    #[error("can id 0x{id:X} out of range (max: 0x{max:X})")]
    IdOutOfRange { id: u32, max: u32 },

    /// CAN ID 문자열 파싱 실패
    #[error("malformed can id '{0}'")]
    MalformedId(String),

    /// 16진수 페이로드 파싱 실패
    #[error("malformed hex payload '{value}': {reason}")]
    MalformedPayload { value: String, reason: String },

    /// 0 이하 또는 유한하지 않은 값
    #[error("'{field}' must be positive, got {value}")]
    NotPositive { field: String, value: String },

    /// 알 수 없는 폴트 유형
    #[error("unknown fault type '{0}'")]
    UnknownFaultKind(String),

    /// 필수 필드 누락
    #[error("missing required field '{field}' for fault type '{kind}'")]
    MissingField { kind: String, field: String },

    /// 필드 값의 JSON 타입이 맞지 않음
    #[error("field '{field}' must be {expected}, got {found}")]
    InvalidType {
        field: String,
        expected: String,
        found: String,
    },

    /// 값 계산 중 오버플로우
    #[error("value overflow: {0}")]
    Overflow(String),
}

/// CAN 전송 에러
///
/// 폴트 태스크 내부에서 발생하면 로깅 후 다음 주기로 진행합니다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// 프레임 전송 실패
    #[error("send failed for 0x{id:03X}: {reason}")]
    SendFailed { id: u32, reason: String },

    /// 프레임 수신 실패
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// 이미 닫힌 전송 계층
    #[error("transport closed")]
    Closed,
}
