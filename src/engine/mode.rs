use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Step 간 진행 속도를 결정하는 실행 모드이다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// 배치/CI용 전속력 실행. `step_delay`만큼 쉰다.
    #[default]
    Automated,
    /// 사람이 지켜볼 수 있도록 `interactive_delay`만큼 쉰다.
    Interactive,
    /// 지연 없이 목표 Step 직전까지 빨리 감는다.
    Teleport,
}

impl ExecutionMode {
    /// 모드 문자열 표현을 반환한다.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Automated => "automated",
            ExecutionMode::Interactive => "interactive",
            ExecutionMode::Teleport => "teleport",
        }
    }

    /// 모드별 Step 간 지연을 계산한다.
    pub fn delay(&self, step_delay: Duration, interactive_delay: Duration) -> Duration {
        match self {
            ExecutionMode::Automated => step_delay,
            ExecutionMode::Interactive => interactive_delay,
            ExecutionMode::Teleport => Duration::ZERO,
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionMode {
    type Err = EngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "automated" => Ok(ExecutionMode::Automated),
            "interactive" => Ok(ExecutionMode::Interactive),
            "teleport" => Ok(ExecutionMode::Teleport),
            other => Err(EngineError::InvalidMode(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_modes_and_rejects_others() {
        let mode: ExecutionMode = "teleport".parse().expect("모드 파싱 실패");
        assert_eq!(ExecutionMode::Teleport, mode);
        assert!(matches!(
            "bogus".parse::<ExecutionMode>(),
            Err(EngineError::InvalidMode(value)) if value == "bogus"
        ));
    }

    #[test]
    fn teleport_never_waits() {
        let step = Duration::from_millis(20);
        let interactive = Duration::from_millis(1000);
        assert_eq!(step, ExecutionMode::Automated.delay(step, interactive));
        assert_eq!(interactive, ExecutionMode::Interactive.delay(step, interactive));
        assert_eq!(Duration::ZERO, ExecutionMode::Teleport.delay(step, interactive));
    }
}
