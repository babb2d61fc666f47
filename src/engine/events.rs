use super::state::{EngineState, StepResult};
use super::summary::ScenarioSummary;

/// 엔진에서 구독자에게 전달되는 이벤트 모델이다.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// 실행 시작, Step 완료, 일시정지/재개/중단 등 상태가 바뀔 때마다 전송된다.
    StateChanged(EngineState),
    /// Step 하나가 끝났다. 인덱스가 다시 증가하기 전에 전송된다.
    StepCompleted {
        result: StepResult,
        index: usize,
        total: usize,
    },
    /// 시나리오가 끝까지 실행되었다.
    ScenarioCompleted(ScenarioSummary),
    /// setup/teardown 실패 또는 일시정지 시간 초과.
    Error { message: String, step_index: usize },
}
