#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use canfault_core::frame::MAX_EXTENDED_ID;
use canfault_injector::InjectorConfig;
use canfault_runner::{FaultAction, FaultSpec};
use serde_json::Value;

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzSpec {
    kind: FuzzKind,
    can_id: Option<String>,
    duration: f64,
    data: Option<String>,
    max_value: Option<u64>,
    rate: Option<u32>,
    period_ms: Option<u64>,
}

#[derive(Arbitrary, Debug)]
enum FuzzKind {
    FrozenValue,
    OutOfRange,
    Missing,
    Flooding,
    Other(String),
}

impl FuzzKind {
    fn name(self) -> String {
        match self {
            Self::FrozenValue => "frozen_value".to_owned(),
            Self::OutOfRange => "out_of_range".to_owned(),
            Self::Missing => "missing".to_owned(),
            Self::Flooding => "flooding".to_owned(),
            Self::Other(s) => s,
        }
    }
}

fuzz_target!(|input: FuzzSpec| {
    let spec = FaultSpec {
        kind: Some(Value::from(input.kind.name())),
        can_id: input.can_id.map(Value::from),
        duration: Some(Value::from(input.duration)),
        data: input.data.map(Value::from),
        max_value: input.max_value.map(Value::from),
        rate: input.rate.map(Value::from),
        period_ms: input.period_ms.map(Value::from),
    };

    // resolve에 성공한 폴트는 인젝터가 그대로 받아들일 수 있어야 함
    if let Ok(fault) = spec.resolve(&InjectorConfig::default()) {
        assert!(fault.can_id <= MAX_EXTENDED_ID);
        match fault.action {
            FaultAction::FrozenValue { period, .. } | FaultAction::OutOfRange { period, .. } => {
                assert!(!period.is_zero());
            }
            FaultAction::Flooding { rate } => assert!(rate > 0),
            FaultAction::Missing => {}
        }
    }
});
