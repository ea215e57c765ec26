#![no_main]

use libfuzzer_sys::fuzz_target;
use canfault_injector::InjectorConfig;
use canfault_runner::parse_scenarios;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data)
        && let Ok(scenarios) = parse_scenarios(content)
    {
        let defaults = InjectorConfig::default();
        for scenario in &scenarios {
            let _ = scenario.validate(&defaults);
            let _ = scenario.nominal_fault_time();
        }
    }
});
