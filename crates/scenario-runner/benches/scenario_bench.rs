//! 시나리오 파싱/해석 벤치마크
//!
//! JSON 파싱과 폴트 정의 해석 성능을 측정합니다.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use canfault_injector::InjectorConfig;
use canfault_runner::parse_scenarios;

fn campaign_json(count: usize) -> String {
    let scenarios: Vec<String> = (0..count)
        .map(|i| {
            format!(
                r#"{{
                    "id": {i},
                    "name": "scenario {i}",
                    "preconditions": {{ "duration": 0.5 }},
                    "faults": [
                        {{ "type": "frozen_value", "can_id": "0x{:03X}", "data": "00 11 22 33 44 55 66 77", "duration": 1 }},
                        {{ "type": "out_of_range", "can_id": "0x300", "max_value": 250, "duration": 1 }},
                        {{ "type": "flooding", "rate": 1000, "duration": 1 }}
                    ],
                    "expected_behavior": {{ "dtc_codes": ["U0415"] }}
                }}"#,
                0x100 + (i % 0x600)
            )
        })
        .collect();
    format!("[{}]", scenarios.join(","))
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_scenarios");
    for count in [1usize, 10, 100] {
        let json = campaign_json(count);
        group.throughput(Throughput::Bytes(json.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &json, |b, json| {
            b.iter(|| parse_scenarios(black_box(json)));
        });
    }
    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let scenarios = parse_scenarios(&campaign_json(100)).unwrap_or_default();
    let defaults = InjectorConfig::default();
    c.bench_function("resolve_100_scenarios", |b| {
        b.iter(|| {
            for scenario in &scenarios {
                let _ = black_box(scenario.validate(&defaults));
            }
        });
    });
}

criterion_group!(benches, bench_parse, bench_resolve);
criterion_main!(benches);
