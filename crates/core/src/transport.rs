//! CAN 전송 계층 추상화
//!
//! [`CanTransport`] trait은 실제 버스 I/O(SocketCAN 등)와 시뮬레이션을 분리합니다.
//! 폴트 인젝터는 이 trait만 알고 있으며, 프레임 전송/수신 능력 외에는
//! 전송 계층 구현에 의존하지 않습니다.
//!
//! ```text
//! ┌───────────────┐
//! │ FaultInjector │
//! └───────┬───────┘
//!         │
//!         ▼
//!  ┌──────────────┐
//!  │ CanTransport │ (trait)
//!  └──────────────┘
//!      │       │
//!      ▼       ▼
//!  ┌──────┐ ┌─────────┐
//!  │ Sim  │ │ 실제 버스 │
//!  └──────┘ └─────────┘
//! ```

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::TransportConfig;
use crate::error::TransportError;
use crate::frame::Frame;

/// 전송 계층 진단 카운터
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportStats {
    /// 전송 성공 프레임 수
    pub frames_sent: u64,
    /// 수신 프레임 수
    pub frames_received: u64,
    /// 전송 실패 수
    pub send_failures: u64,
}

/// CAN 전송 능력
///
/// 폴트 태스크가 여러 tokio 태스크에서 동시에 호출하므로
/// `Send + Sync + 'static`이어야 합니다.
pub trait CanTransport: Send + Sync + 'static {
    /// 프레임 하나를 전송합니다.
    ///
    /// # Errors
    /// - `TransportError::SendFailed`: 버스 오류 등 일시적 실패
    /// - `TransportError::Closed`: `close()` 이후 호출
    fn send(&self, frame: &Frame) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// `timeout` 동안 프레임 수신을 기다립니다. 시간 내 수신이 없으면 `Ok(None)`.
    fn receive(
        &self,
        timeout: Duration,
    ) -> impl Future<Output = Result<Option<Frame>, TransportError>> + Send;

    /// 현재까지의 진단 카운터를 반환합니다.
    fn stats(&self) -> TransportStats;

    /// 전송 계층을 닫고 최종 카운터를 반환합니다.
    fn close(&self) -> impl Future<Output = TransportStats> + Send;
}

/// 전송 방향
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Tx,
    Rx,
}

/// 시뮬레이션 로그 엔트리
#[derive(Debug, Clone)]
pub struct LoggedFrame {
    /// 전송 계층 생성 이후 경과 시간
    pub at: Duration,
    pub direction: Direction,
    pub frame: Frame,
}

/// 하드웨어 없이 동작하는 시뮬레이션 전송 계층
///
/// 전송된 프레임은 메모리 로그에 기록되고, 수신은 [`push_rx`](Self::push_rx)로
/// 미리 넣어 둔 프레임을 돌려줍니다. [`set_fail_sends`](Self::set_fail_sends)로
/// 전송 실패를 흉내 낼 수 있습니다.
pub struct SimulatedTransport {
    config: TransportConfig,
    created_at: Instant,
    log: Mutex<Vec<LoggedFrame>>,
    rx_queue: Mutex<VecDeque<Frame>>,
    fail_sends: AtomicBool,
    closed: AtomicBool,
    frames_sent: AtomicU64,
    frames_received: AtomicU64,
    send_failures: AtomicU64,
}

impl SimulatedTransport {
    /// 설정으로부터 시뮬레이션 전송 계층을 생성합니다.
    pub fn new(config: TransportConfig) -> Self {
        info!(
            channel = %config.channel,
            bitrate = config.bitrate,
            "simulated CAN transport opened, no hardware required"
        );
        Self {
            config,
            created_at: Instant::now(),
            log: Mutex::new(Vec::new()),
            rx_queue: Mutex::new(VecDeque::new()),
            fail_sends: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            frames_sent: AtomicU64::new(0),
            frames_received: AtomicU64::new(0),
            send_failures: AtomicU64::new(0),
        }
    }

    /// 채널 이름
    pub fn channel(&self) -> &str {
        &self.config.channel
    }

    /// 이후 `send()` 호출을 실패시키거나 정상으로 되돌립니다.
    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::Relaxed);
    }

    /// 수신 큐에 프레임을 넣습니다 (ECU 응답 시뮬레이션).
    pub async fn push_rx(&self, frame: Frame) {
        self.rx_queue.lock().await.push_back(frame);
    }

    /// 기록된 전체 로그의 스냅샷
    pub async fn message_log(&self) -> Vec<LoggedFrame> {
        self.log.lock().await.clone()
    }

    /// 전송된 프레임만 반환합니다.
    pub async fn sent_frames(&self) -> Vec<Frame> {
        self.log
            .lock()
            .await
            .iter()
            .filter(|entry| entry.direction == Direction::Tx)
            .map(|entry| entry.frame.clone())
            .collect()
    }

    /// 특정 ID로 전송된 프레임 수
    pub async fn sent_count_for(&self, id: u32) -> usize {
        self.log
            .lock()
            .await
            .iter()
            .filter(|entry| entry.direction == Direction::Tx && entry.frame.id() == id)
            .count()
    }

    async fn record(&self, direction: Direction, frame: Frame) {
        let at = self.created_at.elapsed();
        self.log.lock().await.push(LoggedFrame {
            at,
            direction,
            frame,
        });
    }
}

impl Default for SimulatedTransport {
    fn default() -> Self {
        Self::new(TransportConfig::default())
    }
}

impl CanTransport for SimulatedTransport {
    async fn send(&self, frame: &Frame) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Relaxed) {
            return Err(TransportError::Closed);
        }
        if self.fail_sends.load(Ordering::Relaxed) {
            self.send_failures.fetch_add(1, Ordering::Relaxed);
            return Err(TransportError::SendFailed {
                id: frame.id(),
                reason: "simulated bus error".to_owned(),
            });
        }

        debug!(frame = %frame, "[sim] tx");
        self.record(Direction::Tx, frame.clone()).await;
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn receive(&self, timeout: Duration) -> Result<Option<Frame>, TransportError> {
        if self.closed.load(Ordering::Relaxed) {
            return Err(TransportError::Closed);
        }

        let deadline = Instant::now() + timeout;
        let poll = Duration::from_millis(self.config.receive_poll_ms.max(1));
        loop {
            if let Some(frame) = self.rx_queue.lock().await.pop_front() {
                debug!(frame = %frame, "[sim] rx");
                self.record(Direction::Rx, frame.clone()).await;
                self.frames_received.fetch_add(1, Ordering::Relaxed);
                return Ok(Some(frame));
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(poll.min(deadline - now)).await;
        }
    }

    fn stats(&self) -> TransportStats {
        TransportStats {
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
        }
    }

    async fn close(&self) -> TransportStats {
        self.closed.store(true, Ordering::Relaxed);
        let stats = self.stats();
        info!(
            channel = %self.config.channel,
            frames_sent = stats.frames_sent,
            frames_received = stats.frames_received,
            send_failures = stats.send_failures,
            "simulated CAN transport closed"
        );
        stats
    }
}
