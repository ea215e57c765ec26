#![doc = include_str!("../README.md")]

pub mod config;
pub mod error;
pub mod frame;
pub mod metrics;
pub mod transport;

// --- 주요 타입 re-export ---
// 각 모듈의 핵심 타입을 크레이트 루트에서 바로 사용할 수 있도록 합니다.

// 에러
pub use error::{CanfaultError, ConfigError, TransportError, ValidationError};

// 설정
pub use config::CanfaultConfig;

// 프레임
pub use frame::{Frame, HexId, MAX_EXTENDED_ID, MAX_PAYLOAD_LEN, MAX_STANDARD_ID};

// 전송 계층
pub use transport::{CanTransport, SimulatedTransport, TransportStats};
