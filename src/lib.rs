pub mod action;
pub mod config;
pub mod engine;
pub mod error;
pub mod scenario;

pub use action::{Action, Assertion, AssertionOutcome, SharedAction, SharedAssertion};
pub use config::{EngineConfig, load_config_from_file, load_config_from_reader};
pub use engine::{
    BatchEntry, BatchSummary, EngineEvent, EngineState, EventSubscription, ExecutionMode,
    QaEngine, RunAllOptions, RunOptions, ScenarioSummary, StepResult, SubscriptionId,
};
pub use error::{EngineError, HookPhase};
pub use scenario::{Scenario, ScenarioInfo, Step};

/// 기본 fmt 구독자로 tracing 로그 출력을 초기화한다.
///
/// 이미 전역 구독자가 설정되어 있으면 아무 것도 하지 않는다.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}
