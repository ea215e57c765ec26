//! 시나리오 러너 설정

use std::time::Duration;

use canfault_core::config::RunnerSection;

/// 시나리오 러너 타이밍 설정
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// `preconditions`에 `duration`이 없을 때의 대기 시간
    pub precondition_default: Duration,
    /// 모든 폴트 이후 관찰 대기 시간
    pub observation_delay: Duration,
    /// 캠페인 내 시나리오 사이의 안정화 대기 시간
    pub settle_delay: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self::from_core(&RunnerSection::default())
    }
}

impl RunnerConfig {
    /// core의 `RunnerSection`에서 러너 설정을 생성합니다.
    pub fn from_core(core: &RunnerSection) -> Self {
        Self {
            precondition_default: Duration::from_millis(core.precondition_default_ms),
            observation_delay: Duration::from_millis(core.observation_delay_ms),
            settle_delay: Duration::from_millis(core.settle_delay_ms),
        }
    }

    /// 모든 대기 시간이 0인 설정 (테스트/드라이런용)
    pub fn immediate() -> Self {
        Self {
            precondition_default: Duration::ZERO,
            observation_delay: Duration::ZERO,
            settle_delay: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_core_defaults() {
        let config = RunnerConfig::default();
        assert_eq!(config.precondition_default, Duration::from_secs(2));
        assert_eq!(config.observation_delay, Duration::from_secs(2));
        assert_eq!(config.settle_delay, Duration::from_secs(1));
    }

    #[test]
    fn from_core_converts_millis() {
        let core = RunnerSection {
            precondition_default_ms: 10,
            observation_delay_ms: 250,
            settle_delay_ms: 0,
        };
        let config = RunnerConfig::from_core(&core);
        assert_eq!(config.observation_delay, Duration::from_millis(250));
        assert_eq!(config.settle_delay, Duration::ZERO);
    }
}
