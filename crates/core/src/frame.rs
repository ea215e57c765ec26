//! CAN 프레임 타입
//!
//! [`Frame`]은 생성 시점에 ID 범위와 페이로드 길이를 검증하며,
//! 생성 이후에는 변경할 수 없습니다.

use std::fmt;

use bytes::Bytes;
use serde::Serialize;

use crate::error::ValidationError;

/// 클래식 CAN 프레임의 최대 페이로드 길이 (바이트)
pub const MAX_PAYLOAD_LEN: usize = 8;

/// 표준(11비트) 식별자 최대값
pub const MAX_STANDARD_ID: u32 = 0x7FF;

/// 확장(29비트) 식별자 최대값
pub const MAX_EXTENDED_ID: u32 = 0x1FFF_FFFF;

/// CAN 프레임
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frame {
    id: u32,
    payload: Bytes,
    extended: bool,
}

impl Frame {
    /// 검증된 프레임을 생성합니다.
    ///
    /// # Errors
    /// - `ValidationError::IdOutOfRange`: 표준/확장 범위를 벗어난 ID
    /// - `ValidationError::PayloadTooLong`: 8바이트 초과 페이로드
    pub fn new(
        id: u32,
        payload: impl Into<Bytes>,
        extended: bool,
    ) -> Result<Self, ValidationError> {
        validate_id(id, extended)?;
        let payload = payload.into();
        validate_payload(&payload)?;
        Ok(Self {
            id,
            payload,
            extended,
        })
    }

    /// 표준 ID 프레임을 생성합니다.
    pub fn standard(id: u32, payload: impl Into<Bytes>) -> Result<Self, ValidationError> {
        Self::new(id, payload, false)
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn is_extended(&self) -> bool {
        self.extended
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.extended {
            write!(f, "0x{:08X}", self.id)?;
        } else {
            write!(f, "0x{:03X}", self.id)?;
        }
        write!(f, " [{}]", self.payload.len())?;
        for byte in self.payload.iter() {
            write!(f, " {byte:02X}")?;
        }
        Ok(())
    }
}

/// 로그 필드용 CAN ID 표기 (`0x200`, `0x18DAF110`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexId(pub u32);

impl fmt::Display for HexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 > MAX_STANDARD_ID {
            write!(f, "0x{:08X}", self.0)
        } else {
            write!(f, "0x{:03X}", self.0)
        }
    }
}

/// CAN ID가 프레임 유형의 범위 안에 있는지 검증합니다.
pub fn validate_id(id: u32, extended: bool) -> Result<(), ValidationError> {
    let max = if extended {
        MAX_EXTENDED_ID
    } else {
        MAX_STANDARD_ID
    };
    if id > max {
        return Err(ValidationError::IdOutOfRange { id, max });
    }
    Ok(())
}

/// 페이로드 길이를 검증합니다.
pub fn validate_payload(payload: &[u8]) -> Result<(), ValidationError> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(ValidationError::PayloadTooLong {
            len: payload.len(),
            max: MAX_PAYLOAD_LEN,
        });
    }
    Ok(())
}

/// `"0x1A0"`, `"1A0"`, `"0X7ff"` 형식의 16진수 CAN ID를 파싱합니다.
///
/// 11비트를 넘는 값은 확장 ID로 간주하여 29비트 범위까지 허용합니다.
pub fn parse_can_id(raw: &str) -> Result<u32, ValidationError> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.is_empty() {
        return Err(ValidationError::MalformedId(raw.to_owned()));
    }
    let id = u32::from_str_radix(digits, 16)
        .map_err(|_| ValidationError::MalformedId(raw.to_owned()))?;
    validate_id(id, id > MAX_STANDARD_ID)?;
    Ok(id)
}

/// 공백이 섞인 16진수 문자열(`"00 11 22"`, `"001122"`)을 바이트로 변환합니다.
pub fn parse_hex_payload(raw: &str) -> Result<Vec<u8>, ValidationError> {
    let digits: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::MalformedPayload {
            value: raw.to_owned(),
            reason: "contains non-hex characters".to_owned(),
        });
    }
    if digits.len() % 2 != 0 {
        return Err(ValidationError::MalformedPayload {
            value: raw.to_owned(),
            reason: "odd number of hex digits".to_owned(),
        });
    }

    let bytes = (0..digits.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&digits[i..i + 2], 16).map_err(|e| {
                ValidationError::MalformedPayload {
                    value: raw.to_owned(),
                    reason: e.to_string(),
                }
            })
        })
        .collect::<Result<Vec<u8>, _>>()?;

    validate_payload(&bytes)?;
    Ok(bytes)
}
