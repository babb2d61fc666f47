use std::fmt;

/// 시나리오 훅이 실행되는 단계를 구분한다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    /// 첫 Step 이전에 실행되는 setup 훅.
    Setup,
    /// 마지막 Step 이후에 실행되는 teardown 훅.
    Teardown,
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookPhase::Setup => f.write_str("setup"),
            HookPhase::Teardown => f.write_str("teardown"),
        }
    }
}

/// 엔진 사용 중 호출자에게 전달되는 오류를 표현한다.
///
/// Step 내부의 실패는 이 타입으로 전파되지 않고 `StepResult::error`에 기록된다.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// id 또는 name이 비어 있는 시나리오를 등록하려는 경우이다.
    #[error("유효하지 않은 시나리오입니다: {0}")]
    InvalidScenario(String),
    /// name 또는 action이 없는 Step을 추가하려는 경우이다.
    #[error("유효하지 않은 Step입니다 (시나리오: {scenario}): {reason}")]
    InvalidStep { scenario: String, reason: String },
    /// 알 수 없는 실행 모드 문자열이다.
    #[error("알 수 없는 실행 모드입니다: {0} (automated, interactive, teleport 중 하나)")]
    InvalidMode(String),
    /// 등록되지 않은 시나리오 id를 참조한 경우이다.
    #[error("등록되지 않은 시나리오입니다: {0}")]
    ScenarioNotFound(String),
    /// 다른 시나리오가 이미 실행 중인 경우이다.
    #[error("이미 실행 중인 시나리오가 있습니다: {0}")]
    AlreadyRunning(String),
    /// setup/teardown 훅이 실패해 실행이 중단된 경우이다.
    #[error("{phase} 훅 실패로 시나리오가 중단되었습니다: {message}")]
    ScenarioAborted { phase: HookPhase, message: String },
    /// 일시정지 대기 시간이 설정된 제한을 넘긴 경우이다.
    #[error("일시정지 대기 시간이 초과되어 실행을 중단했습니다 (Step {step_index})")]
    PauseTimedOut { step_index: usize },
}
