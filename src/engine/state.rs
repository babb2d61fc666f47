use super::mode::ExecutionMode;
use crate::config::EngineConfig;
use crate::scenario::Scenario;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// 실행된 Step 하나의 결과를 담는다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    /// 실행 시점의 Step 인덱스.
    pub index: usize,
    /// Step 이름.
    pub name: String,
    /// Step 설명.
    pub description: String,
    /// 통과 여부.
    pub passed: bool,
    /// 실패 사유. 통과 시 `None`이다.
    pub error: Option<String>,
    /// 단조 시계로 측정한 소요 시간(ms).
    pub duration_ms: u64,
}

/// 외부에 노출되는 엔진 상태 스냅샷이다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineState {
    /// 실행 중 여부.
    pub is_running: bool,
    /// 일시정지 여부. 실행 중일 때만 의미가 있다.
    pub is_paused: bool,
    /// 현재 실행 모드.
    pub mode: ExecutionMode,
    /// 엔진에 연결된 시나리오 id.
    pub current_scenario: Option<String>,
    /// 다음에 실행할 Step 인덱스.
    pub current_step_index: usize,
    /// 연결된 시나리오의 Step 수.
    pub total_steps: usize,
    /// 이번 실행에서 누적된 Step 결과.
    pub results: Vec<StepResult>,
}

/// 엔진 내부의 가변 상태이다. 항상 mutex 안에서만 접근한다.
#[derive(Debug)]
pub(crate) struct EngineCore {
    pub mode: ExecutionMode,
    pub step_delay: Duration,
    pub interactive_delay: Duration,
    pub pause_timeout: Option<Duration>,
    pub current_scenario: Option<Arc<Scenario>>,
    pub current_step_index: usize,
    /// 이번 실행의 종료 Step(미포함).
    pub end_step: usize,
    pub results: Vec<StepResult>,
    pub is_running: bool,
    pub is_paused: bool,
    /// 실행마다 증가하는 세대 번호. 중단된 루프가 새 실행 상태를 건드리지 못하게 한다.
    pub run_id: u64,
    /// 현재 실행의 중단 토큰.
    pub cancel: CancellationToken,
    /// 실행 중 `reset()`으로 분리된 실행. 루프는 더 이상 결과를 기록하지 않고 종료한다.
    pub detached: bool,
}

impl EngineCore {
    /// 설정값으로 초기 상태를 만든다.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            mode: config.default_mode,
            step_delay: config.step_delay(),
            interactive_delay: config.interactive_delay(),
            pause_timeout: config.pause_timeout(),
            current_scenario: None,
            current_step_index: 0,
            end_step: 0,
            results: Vec::new(),
            is_running: false,
            is_paused: false,
            run_id: 0,
            cancel: CancellationToken::new(),
            detached: false,
        }
    }

    /// `run_id` 실행이 아직 살아 있는지 확인한다.
    pub fn is_active(&self, run_id: u64) -> bool {
        self.is_running && self.run_id == run_id && !self.detached
    }

    /// 현재 상태의 스냅샷을 만든다.
    pub fn snapshot(&self) -> EngineState {
        EngineState {
            is_running: self.is_running,
            is_paused: self.is_paused,
            mode: self.mode,
            current_scenario: self.current_scenario.as_ref().map(|s| s.id.clone()),
            current_step_index: self.current_step_index,
            total_steps: self.current_scenario.as_ref().map_or(0, |s| s.len()),
            results: self.results.clone(),
        }
    }

    /// 현재 설정값을 EngineConfig로 되돌린다.
    pub fn config(&self) -> EngineConfig {
        EngineConfig {
            default_mode: self.mode,
            step_delay_ms: duration_to_ms(self.step_delay),
            interactive_delay_ms: duration_to_ms(self.interactive_delay),
            pause_timeout_ms: self.pause_timeout.map(duration_to_ms),
        }
    }
}

/// Duration을 밀리초 정수로 변환한다.
pub(crate) fn duration_to_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
