#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: 도메인 에러 타입 (`InjectorError`)
//! - [`config`]: 인젝터 설정 (`InjectorConfig`)
//! - [`fault`]: 폴트 유형, 페이로드 계산, 핸들/리포트 (`FaultKind`, `FaultHandle`, `FaultReport`)
//! - [`injector`]: 폴트 태스크 레지스트리와 인젝션 API (`FaultInjector`)
//!
//! # Architecture
//!
//! ```text
//! ScenarioRunner --inject_*()--> FaultInjector
//!                                    |
//!                         tokio::spawn (폴트마다 1개)
//!                                    |
//!                          CanTransport::send()
//! ```

pub mod config;
pub mod error;
pub mod fault;
pub mod injector;

// --- Public API Re-exports ---

pub use config::InjectorConfig;
pub use error::InjectorError;
pub use fault::{FaultHandle, FaultKind, FaultReport};
pub use injector::{FaultInjector, InjectorStats};
