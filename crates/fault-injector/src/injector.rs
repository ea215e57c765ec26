//! 폴트 인젝터 -- 시간 제한이 있는 취소 가능한 폴트 태스크 관리
//!
//! [`FaultInjector`]는 폴트마다 독립적인 tokio 태스크를 스폰하고,
//! CAN ID별 레지스트리(`can_id -> FaultTask`)로 태스크를 소유합니다.
//!
//! # 내부 아키텍처
//! ```text
//! inject_*() ──> registry (Mutex<HashMap<can_id, FaultTask>>)
//!                   |
//!                   └─ tokio::spawn(run_fault) ──send()──> CanTransport
//!                          ^
//!                          └── CancellationToken (stop_injection / stop_all)
//! ```
//!
//! # 불변 조건
//! - CAN ID 하나에 활성 태스크는 최대 하나입니다. 같은 ID로 새 인젝션을 시작하면
//!   이전 태스크를 먼저 취소하고 종료를 기다린 뒤 등록합니다.
//! - 폴트 태스크는 레지스트리를 건드리지 않습니다. 종료된 엔트리는
//!   조회/등록 시점에 정리되므로 락을 잡은 채 태스크 종료를 기다려도 교착이 없습니다.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use canfault_core::error::ValidationError;
use canfault_core::frame::{self, Frame, HexId, MAX_STANDARD_ID};
use canfault_core::metrics as m;
use canfault_core::transport::CanTransport;

use crate::config::InjectorConfig;
use crate::error::InjectorError;
use crate::fault::{FLOOD_PAYLOAD, FaultHandle, FaultKind, FaultReport, flood_interval, out_of_range_payload};

/// 폴트별 전송 패턴
#[derive(Debug, Clone)]
enum Emission {
    /// `period`마다 같은 프레임 전송
    Periodic { frame: Frame, period: Duration },
    /// 아무것도 전송하지 않음
    Silent,
}

/// 레지스트리에 등록된 폴트 태스크
struct FaultTask {
    kind: FaultKind,
    started_at: Instant,
    duration: Duration,
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl FaultTask {
    /// 취소를 요청하고 태스크 종료를 기다립니다. 실패하지 않습니다.
    async fn shutdown(self, can_id: u32) {
        self.cancel.cancel();
        if let Err(e) = self.join.await {
            if e.is_panic() {
                error!(can_id = %HexId(can_id), kind = %self.kind, "fault task panicked");
            } else {
                debug!(can_id = %HexId(can_id), kind = %self.kind, "fault task aborted");
            }
        }
    }
}

/// 인젝터 누적 카운터 (태스크와 공유)
#[derive(Debug, Default)]
struct Counters {
    faults_started: AtomicU64,
    frames_sent: AtomicU64,
    send_failures: AtomicU64,
}

/// 인젝터 누적 통계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InjectorStats {
    /// 시작된 폴트 수
    pub faults_started: u64,
    /// 폴트 태스크가 전송한 프레임 수
    pub frames_sent: u64,
    /// 폴트 태스크 내 전송 실패 수
    pub send_failures: u64,
}

/// CAN 폴트 인젝터
///
/// 전송 계층과 함께 생성되며, `stop_all()` 후 drop으로 수명이 끝납니다.
/// drop 시점에 남아 있는 태스크에는 취소 신호만 보냅니다.
///
/// # 사용 예시
/// ```ignore
/// use std::sync::Arc;
/// use std::time::Duration;
/// use canfault_core::SimulatedTransport;
/// use canfault_injector::FaultInjector;
///
/// let injector = FaultInjector::new(Arc::new(SimulatedTransport::default()));
/// let handle = injector
///     .inject_frozen_value(0x200, vec![0u8; 8], Duration::from_secs(3), Duration::from_millis(10))
///     .await?;
/// let report = handle.wait().await;
/// injector.stop_all().await;
/// ```
pub struct FaultInjector<T: CanTransport> {
    transport: Arc<T>,
    config: InjectorConfig,
    registry: Mutex<HashMap<u32, FaultTask>>,
    counters: Arc<Counters>,
}

impl<T: CanTransport> FaultInjector<T> {
    /// 기본 설정으로 인젝터를 생성합니다.
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            config: InjectorConfig::default(),
            registry: Mutex::new(HashMap::new()),
            counters: Arc::new(Counters::default()),
        }
    }

    /// 지정한 설정으로 인젝터를 생성합니다.
    pub fn with_config(transport: Arc<T>, config: InjectorConfig) -> Result<Self, InjectorError> {
        config.validate()?;
        Ok(Self {
            transport,
            config,
            registry: Mutex::new(HashMap::new()),
            counters: Arc::new(Counters::default()),
        })
    }

    /// 인젝터 설정
    pub fn config(&self) -> &InjectorConfig {
        &self.config
    }

    /// 공유 전송 계층
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// 누적 통계를 반환합니다.
    pub fn stats(&self) -> InjectorStats {
        InjectorStats {
            faults_started: self.counters.faults_started.load(Ordering::Relaxed),
            frames_sent: self.counters.frames_sent.load(Ordering::Relaxed),
            send_failures: self.counters.send_failures.load(Ordering::Relaxed),
        }
    }

    /// 고정값 폴트: `data`를 `period`마다 `duration` 동안 전송합니다.
    ///
    /// 태스크를 스폰한 뒤 즉시 반환합니다.
    ///
    /// # Errors
    /// 8바이트 초과 페이로드, 범위 밖 ID, 0인 `duration`/`period`
    pub async fn inject_frozen_value(
        &self,
        can_id: u32,
        data: impl Into<Bytes>,
        duration: Duration,
        period: Duration,
    ) -> Result<FaultHandle, InjectorError> {
        self.inject_periodic(FaultKind::FrozenValue, can_id, data.into(), duration, period)
            .await
    }

    /// 범위 초과 폴트: `max_physical_value * 10`을 빅엔디언 8바이트로 인코딩하여
    /// 고정값 폴트와 같은 방식으로 반복 전송합니다.
    pub async fn inject_out_of_range(
        &self,
        can_id: u32,
        max_physical_value: u64,
        duration: Duration,
        period: Duration,
    ) -> Result<FaultHandle, InjectorError> {
        let payload = out_of_range_payload(max_physical_value)?;
        info!(
            can_id = %HexId(can_id),
            invalid_value = max_physical_value.saturating_mul(10),
            max_physical_value,
            "out-of-range value selected"
        );
        self.inject_periodic(
            FaultKind::OutOfRange,
            can_id,
            Bytes::copy_from_slice(&payload),
            duration,
            period,
        )
        .await
    }

    /// 메시지 부재 폴트: `duration` 동안 버스에 아무것도 보내지 않습니다.
    pub async fn inject_missing_message(
        &self,
        can_id: u32,
        duration: Duration,
    ) -> Result<FaultHandle, InjectorError> {
        frame::validate_id(can_id, can_id > MAX_STANDARD_ID)?;
        validate_duration(duration)?;
        Ok(self
            .start(can_id, FaultKind::Missing, Emission::Silent, duration)
            .await)
    }

    /// 버스 포화 폴트: `[0xFF; 8]`을 초당 `rate`개 속도로 `duration` 동안 전송합니다.
    pub async fn inject_can_flooding(
        &self,
        can_id: u32,
        rate: u32,
        duration: Duration,
    ) -> Result<FaultHandle, InjectorError> {
        let period = flood_interval(rate)?;
        if rate > self.config.max_flood_rate {
            return Err(InjectorError::RateLimitExceeded {
                rate,
                max: self.config.max_flood_rate,
            });
        }
        self.inject_periodic(
            FaultKind::Flooding,
            can_id,
            Bytes::from_static(&FLOOD_PAYLOAD),
            duration,
            period,
        )
        .await
    }

    /// `can_id`에 등록된 태스크를 취소하고 종료를 기다립니다.
    ///
    /// 등록된 태스크가 없으면 아무 일도 하지 않고 `false`를 반환합니다.
    pub async fn stop_injection(&self, can_id: u32) -> bool {
        let mut registry = self.registry.lock().await;
        let Some(task) = registry.remove(&can_id) else {
            return false;
        };
        let was_running = !task.join.is_finished();
        task.shutdown(can_id).await;
        metrics::gauge!(m::INJECTOR_ACTIVE_FAULTS).set(registry.len() as f64);
        if was_running {
            info!(can_id = %HexId(can_id), "injection stopped");
        }
        was_running
    }

    /// 추적 중인 모든 태스크를 취소하고 종료를 기다립니다.
    ///
    /// 활성 태스크가 없어도 안전하며 실패하지 않습니다. 중지한 실행 중 태스크 수를 반환합니다.
    pub async fn stop_all(&self) -> usize {
        let mut registry = self.registry.lock().await;
        let tasks: Vec<(u32, FaultTask)> = registry.drain().collect();
        for (_, task) in &tasks {
            task.cancel.cancel();
        }

        let mut stopped = 0;
        for (can_id, task) in tasks {
            if !task.join.is_finished() {
                stopped += 1;
            }
            task.shutdown(can_id).await;
        }

        metrics::gauge!(m::INJECTOR_ACTIVE_FAULTS).set(0.0);
        info!(stopped, "all injections stopped");
        stopped
    }

    /// 실행 중인 폴트 수
    pub async fn active_count(&self) -> usize {
        let mut registry = self.registry.lock().await;
        prune_finished(&mut registry);
        registry.len()
    }

    /// 실행 중인 폴트의 CAN ID 목록 (오름차순)
    pub async fn active_ids(&self) -> Vec<u32> {
        let mut registry = self.registry.lock().await;
        prune_finished(&mut registry);
        let mut ids: Vec<u32> = registry.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// `can_id`에 실행 중인 폴트가 있는지 여부
    pub async fn is_active(&self, can_id: u32) -> bool {
        let mut registry = self.registry.lock().await;
        prune_finished(&mut registry);
        registry.contains_key(&can_id)
    }

    /// 실행 중인 폴트의 (유형, 남은 시간) 목록
    pub async fn active_faults(&self) -> Vec<(u32, FaultKind, Duration)> {
        let mut registry = self.registry.lock().await;
        prune_finished(&mut registry);
        let now = Instant::now();
        let mut faults: Vec<_> = registry
            .iter()
            .map(|(id, task)| {
                let remaining = task
                    .started_at
                    .checked_add(task.duration)
                    .map_or(Duration::MAX, |end| end.saturating_duration_since(now));
                (*id, task.kind, remaining)
            })
            .collect();
        faults.sort_unstable_by_key(|(id, _, _)| *id);
        faults
    }

    async fn inject_periodic(
        &self,
        kind: FaultKind,
        can_id: u32,
        payload: Bytes,
        duration: Duration,
        period: Duration,
    ) -> Result<FaultHandle, InjectorError> {
        let frame = Frame::new(can_id, payload, can_id > MAX_STANDARD_ID)?;
        validate_duration(duration)?;
        validate_positive("period", period)?;
        Ok(self
            .start(can_id, kind, Emission::Periodic { frame, period }, duration)
            .await)
    }

    /// 검증이 끝난 폴트를 등록하고 태스크를 스폰합니다.
    async fn start(
        &self,
        can_id: u32,
        kind: FaultKind,
        emission: Emission,
        duration: Duration,
    ) -> FaultHandle {
        let mut registry = self.registry.lock().await;

        if let Some(prior) = registry.remove(&can_id) {
            if !prior.join.is_finished() {
                warn!(
                    can_id = %HexId(can_id),
                    prior = %prior.kind,
                    next = %kind,
                    "fault already active on this can id, stopping it first"
                );
            }
            prior.shutdown(can_id).await;
        }
        prune_finished(&mut registry);

        match &emission {
            Emission::Periodic { frame, period } => info!(
                can_id = %HexId(can_id),
                kind = %kind,
                duration_ms = duration.as_millis() as u64,
                period_us = period.as_micros() as u64,
                frame = %frame,
                "injecting fault"
            ),
            Emission::Silent => info!(
                can_id = %HexId(can_id),
                kind = %kind,
                duration_ms = duration.as_millis() as u64,
                "injecting fault"
            ),
        }

        let cancel = CancellationToken::new();
        let (report_tx, report_rx) = watch::channel(None);
        let started_at = Instant::now();

        let join = tokio::spawn(run_fault(
            Arc::clone(&self.transport),
            can_id,
            kind,
            emission,
            duration,
            cancel.clone(),
            Arc::clone(&self.counters),
            report_tx,
        ));

        registry.insert(
            can_id,
            FaultTask {
                kind,
                started_at,
                duration,
                cancel: cancel.clone(),
                join,
            },
        );

        self.counters.faults_started.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(m::INJECTOR_FAULTS_STARTED_TOTAL, m::LABEL_FAULT_KIND => kind.as_str())
            .increment(1);
        metrics::gauge!(m::INJECTOR_ACTIVE_FAULTS).set(registry.len() as f64);

        FaultHandle {
            can_id,
            kind,
            started_at,
            duration,
            cancel,
            report_rx,
        }
    }
}

impl<T: CanTransport> Drop for FaultInjector<T> {
    fn drop(&mut self) {
        let registry = self.registry.get_mut();
        if registry.is_empty() {
            return;
        }
        for task in registry.values() {
            task.cancel.cancel();
        }
        debug!(
            remaining = registry.len(),
            "fault injector dropped, cancelled remaining tasks"
        );
    }
}

/// 종료된 태스크 엔트리를 정리합니다.
fn prune_finished(registry: &mut HashMap<u32, FaultTask>) {
    registry.retain(|_, task| !task.join.is_finished());
}

fn validate_positive(field: &str, value: Duration) -> Result<(), ValidationError> {
    if value.is_zero() {
        return Err(ValidationError::NotPositive {
            field: field.to_owned(),
            value: format!("{value:?}"),
        });
    }
    Ok(())
}

/// 0이 아니고, 현재 시각에 더해 마감 시각을 표현할 수 있어야 합니다.
fn validate_duration(duration: Duration) -> Result<(), ValidationError> {
    validate_positive("duration", duration)?;
    if Instant::now().checked_add(duration).is_none() {
        return Err(ValidationError::Overflow(format!(
            "duration {duration:?} exceeds the representable deadline"
        )));
    }
    Ok(())
}

/// 폴트 태스크 본체
///
/// 매 주기 취소 신호를 확인합니다. 전송 실패는 로깅 후 다음 주기로 진행합니다.
#[allow(clippy::too_many_arguments)]
async fn run_fault<T: CanTransport>(
    transport: Arc<T>,
    can_id: u32,
    kind: FaultKind,
    emission: Emission,
    duration: Duration,
    cancel: CancellationToken,
    counters: Arc<Counters>,
    report_tx: watch::Sender<Option<FaultReport>>,
) {
    let started = Instant::now();
    // 검증 시점에 표현 가능했던 값이므로 None이면 마감 없이 취소만 기다림
    let deadline = started.checked_add(duration);
    let mut frames_sent = 0u64;
    let mut send_failures = 0u64;

    let cancelled = match emission {
        Emission::Periodic { frame, period } => loop {
            if cancel.is_cancelled() {
                break true;
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                break false;
            }

            match transport.send(&frame).await {
                Ok(()) => {
                    frames_sent += 1;
                    counters.frames_sent.fetch_add(1, Ordering::Relaxed);
                    metrics::counter!(m::INJECTOR_FRAMES_SENT_TOTAL, m::LABEL_FAULT_KIND => kind.as_str())
                        .increment(1);
                }
                Err(e) => {
                    send_failures += 1;
                    counters.send_failures.fetch_add(1, Ordering::Relaxed);
                    metrics::counter!(m::INJECTOR_SEND_FAILURES_TOTAL, m::LABEL_FAULT_KIND => kind.as_str())
                        .increment(1);
                    warn!(can_id = %HexId(can_id), kind = %kind, error = %e, "send failed, continuing schedule");
                }
            }

            // 마지막 전송 뒤에는 마감 시각까지만 대기
            let nap = match deadline {
                Some(d) => period.min(d.saturating_duration_since(Instant::now())),
                None => period,
            };
            tokio::select! {
                _ = cancel.cancelled() => break true,
                _ = tokio::time::sleep(nap) => {}
            }
        },
        Emission::Silent => match deadline {
            Some(d) => tokio::select! {
                _ = cancel.cancelled() => true,
                _ = tokio::time::sleep_until(d) => false,
            },
            None => {
                cancel.cancelled().await;
                true
            }
        },
    };

    let report = FaultReport {
        can_id,
        kind,
        frames_sent,
        send_failures,
        elapsed: started.elapsed(),
        cancelled,
    };

    info!(
        can_id = %HexId(can_id),
        kind = %kind,
        frames = frames_sent,
        failures = send_failures,
        elapsed_ms = report.elapsed.as_millis() as u64,
        cancelled,
        "fault injection finished"
    );

    report_tx.send_replace(Some(report));
}
