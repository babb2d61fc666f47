use super::event_hub::{EventHub, EventSubscription, SubscriptionId};
use super::events::EngineEvent;
use super::mode::ExecutionMode;
use super::options::{RunAllOptions, RunOptions};
use super::registry::ScenarioRegistry;
use super::state::{EngineCore, EngineState, StepResult};
use super::steps::{run_action, run_single_step};
use super::summary::{BatchEntry, BatchSummary, ScenarioSummary, summarize};
use crate::config::EngineConfig;
use crate::error::{EngineError, HookPhase};
use crate::scenario::{Scenario, ScenarioInfo, Step};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::{Instant, sleep, sleep_until};
use tokio_util::sync::CancellationToken;

/// 실행 한 번의 내부 계획이다.
#[derive(Debug, Clone, Copy)]
struct RunPlan {
    start: usize,
    end: usize,
    mode: ExecutionMode,
    /// 순간이동 목표 Step. 도달하면 일시정지한다.
    teleport_to: Option<usize>,
    /// 순간이동 도착 후 복원할 모드.
    resume_mode: ExecutionMode,
}

/// 루프 상단에서 내리는 다음 동작 판단이다.
enum LoopDecision {
    Stopped,
    TeleportArrived,
    Exhausted,
    Paused,
    Ready,
}

/// QA 시나리오를 한 번에 하나씩 실행하는 엔진 핸들이다.
///
/// 복제 비용이 낮으며, 복제본은 같은 엔진 상태를 공유한다. Step action이 핸들을 들고
/// 자기 엔진을 `pause`/`stop` 하는 것도 가능하다.
#[derive(Clone)]
pub struct QaEngine {
    inner: Arc<EngineInner>,
}

/// QaEngine 내부 구현체이다.
struct EngineInner {
    /// 등록된 시나리오.
    registry: RwLock<ScenarioRegistry>,
    /// 가변 실행 상태. await 지점을 넘어 잠그지 않는다.
    core: Mutex<EngineCore>,
    /// 일시정지 대기를 깨우는 신호.
    resume_signal: Notify,
    /// 실행 루프와 `next_step`이 동시에 Step을 실행하지 못하게 막는다.
    step_gate: tokio::sync::Mutex<()>,
    /// 이벤트 구독자 목록.
    events: EventHub,
}

impl QaEngine {
    /// 설정값으로 엔진을 생성한다.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                registry: RwLock::new(ScenarioRegistry::new()),
                core: Mutex::new(EngineCore::new(&config)),
                resume_signal: Notify::new(),
                step_gate: tokio::sync::Mutex::new(()),
                events: EventHub::new(),
            }),
        }
    }

    fn core(&self) -> MutexGuard<'_, EngineCore> {
        self.inner.core.lock().expect("엔진 상태 mutex poisoned")
    }

    fn emit_state(&self, core: &EngineCore) {
        self.inner
            .events
            .emit(EngineEvent::StateChanged(core.snapshot()));
    }

    /// 시나리오를 등록한다. 같은 id가 있으면 덮어쓴다.
    pub fn register_scenario(&self, scenario: Scenario) -> Result<(), EngineError> {
        self.inner
            .registry
            .write()
            .expect("레지스트리 lock poisoned")
            .register(scenario)?;
        Ok(())
    }

    /// 등록된 시나리오 메타데이터를 등록 순서대로 반환한다.
    pub fn get_scenarios(&self) -> Vec<ScenarioInfo> {
        self.inner
            .registry
            .read()
            .expect("레지스트리 lock poisoned")
            .list()
    }

    fn lookup(&self, id: &str) -> Result<Arc<Scenario>, EngineError> {
        self.inner
            .registry
            .read()
            .expect("레지스트리 lock poisoned")
            .get(id)
            .ok_or_else(|| EngineError::ScenarioNotFound(id.to_string()))
    }

    /// 엔진 기본 모드를 바꾼다.
    pub fn set_mode(&self, mode: ExecutionMode) {
        let mut core = self.core();
        core.mode = mode;
        self.emit_state(&core);
    }

    /// 문자열로 모드를 바꾼다. 알 수 없는 값이면 `InvalidMode`를 반환한다.
    pub fn set_mode_named(&self, mode: &str) -> Result<(), EngineError> {
        self.set_mode(mode.parse()?);
        Ok(())
    }

    /// automated 모드의 Step 간 지연을 바꾼다.
    pub fn set_step_delay(&self, delay: Duration) {
        self.core().step_delay = delay;
    }

    /// interactive 모드의 Step 간 지연을 바꾼다.
    pub fn set_interactive_delay(&self, delay: Duration) {
        self.core().interactive_delay = delay;
    }

    /// 일시정지 대기 제한을 바꾼다. `None`이면 무기한 대기한다.
    pub fn set_pause_timeout(&self, timeout: Option<Duration>) {
        self.core().pause_timeout = timeout;
    }

    /// 현재 설정값을 반환한다.
    pub fn config(&self) -> EngineConfig {
        self.core().config()
    }

    /// 엔진 이벤트를 구독한다.
    pub fn subscribe(&self) -> EventSubscription {
        self.inner.events.subscribe()
    }

    /// 구독을 해지한다.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.events.unsubscribe(id)
    }

    /// 현재 엔진 상태 스냅샷을 반환한다.
    pub fn get_state(&self) -> EngineState {
        self.core().snapshot()
    }

    /// 다음에 실행될 Step을 반환한다.
    pub fn get_current_step(&self) -> Option<Step> {
        let core = self.core();
        core.current_scenario
            .as_ref()
            .and_then(|scenario| scenario.step(core.current_step_index))
            .cloned()
    }

    /// 실행 중이면 다음 Step 경계에서 멈추도록 표시한다.
    pub fn pause(&self) {
        let mut core = self.core();
        if !core.is_running || core.is_paused {
            return;
        }
        core.is_paused = true;
        tracing::info!(step_index = core.current_step_index, "일시정지");
        self.emit_state(&core);
    }

    /// 일시정지된 실행 하나를 재개한다.
    pub fn resume(&self) {
        let mut core = self.core();
        if !core.is_paused {
            return;
        }
        core.is_paused = false;
        self.inner.resume_signal.notify_one();
        tracing::info!(step_index = core.current_step_index, "재개");
        self.emit_state(&core);
    }

    /// 실행을 중단한다. 진행 중인 Step은 끝까지 실행되고 teardown은 건너뛴다.
    pub fn stop(&self) {
        let mut core = self.core();
        let was_running = core.is_running;
        core.is_running = false;
        core.is_paused = false;
        core.cancel.cancel();
        self.inner.resume_signal.notify_one();
        if was_running {
            tracing::info!(step_index = core.current_step_index, "실행 중단");
        }
        self.emit_state(&core);
    }

    /// Step 인덱스와 결과를 초기화한다. 실행 여부는 바꾸지 않는다.
    ///
    /// 실행 중에 호출하면 그 실행은 Step을 다시 실행하지 않고 다음 확인 지점에서 종료된다.
    /// 진행 중이던 Step의 결과는 버려진다.
    pub fn reset(&self) {
        let mut core = self.core();
        if core.is_running && !core.detached {
            core.detached = true;
            core.cancel.cancel();
            tracing::info!(step_index = core.current_step_index, "초기화로 실행을 종료합니다");
        }
        core.current_step_index = 0;
        core.results.clear();
        core.is_paused = false;
        self.inner.resume_signal.notify_one();
        self.emit_state(&core);
    }

    /// 일시정지 중일 때 Step 하나를 수동으로 실행한다.
    ///
    /// 실행 중이 아니거나, 일시정지 상태가 아니거나, 남은 Step이 없거나, 다른 Step이
    /// 실행 중이면 `None`을 반환한다.
    pub async fn next_step(&self) -> Option<StepResult> {
        let Ok(_gate) = self.inner.step_gate.try_lock() else {
            return None;
        };
        let (run_id, scenario, index) = {
            let core = self.core();
            if !core.is_running || !core.is_paused || core.detached {
                return None;
            }
            let scenario = core.current_scenario.clone()?;
            let index = core.current_step_index;
            if index >= core.end_step.min(scenario.len()) {
                return None;
            }
            (core.run_id, scenario, index)
        };
        let step = scenario.step(index)?;
        let result = run_single_step(step, index).await;
        self.record_result(run_id, scenario.len(), result.clone());
        Some(result)
    }

    /// 등록된 시나리오를 실행한다.
    ///
    /// 끝까지 실행되면 요약을, `stop()`으로 중단되면 `None`을 반환한다.
    /// setup/teardown 실패는 `ScenarioAborted`로 반환된다.
    pub async fn run_scenario(
        &self,
        id: &str,
        options: RunOptions,
    ) -> Result<Option<ScenarioSummary>, EngineError> {
        let scenario = self.lookup(id)?;
        let total = scenario.len();
        let mode = options.mode.unwrap_or_else(|| self.core().mode);
        let plan = RunPlan {
            start: options.start_step.unwrap_or(0),
            end: options.end_step.map_or(total, |end| end.min(total)),
            mode,
            teleport_to: None,
            resume_mode: mode,
        };
        self.execute(scenario, plan).await
    }

    /// `target_step` 직전까지 지연 없이 실행한 뒤 일시정지한다.
    ///
    /// 반환된 future는 같은 실행을 계속 구동한다. `resume()`하면 `target_step`부터 이전
    /// 모드의 속도로 이어서 실행하고, `next_step()`으로 한 Step씩 진행할 수도 있다.
    pub async fn teleport_to_step(
        &self,
        id: &str,
        target_step: usize,
    ) -> Result<Option<ScenarioSummary>, EngineError> {
        let scenario = self.lookup(id)?;
        let total = scenario.len();
        let resume_mode = self.core().mode;
        let plan = RunPlan {
            start: 0,
            end: total,
            mode: ExecutionMode::Teleport,
            teleport_to: Some(target_step.min(total)),
            resume_mode,
        };
        self.execute(scenario, plan).await
    }

    /// 등록된 모든 시나리오를 순차 실행한다.
    ///
    /// 개별 시나리오의 오류는 결과에 기록되고 일괄 실행은 계속된다. 중단된 시나리오가
    /// 있으면 남은 시나리오는 실행하지 않는다.
    pub async fn run_all_scenarios(&self, options: RunAllOptions) -> BatchSummary {
        let ids: Vec<String> = {
            let registry = self
                .inner
                .registry
                .read()
                .expect("레지스트리 lock poisoned");
            registry
                .ids()
                .into_iter()
                .filter(|id| {
                    options.tags.is_empty()
                        || registry
                            .get(id)
                            .is_some_and(|scenario| scenario.has_any_tag(&options.tags))
                })
                .collect()
        };
        tracing::info!(scenarios = ids.len(), "일괄 실행 시작");
        let mut batch = BatchSummary::default();
        for id in ids {
            let run_options = RunOptions {
                mode: options.mode,
                ..RunOptions::default()
            };
            let (entry, stopped) = match self.run_scenario(&id, run_options).await {
                Ok(Some(summary)) => (
                    BatchEntry {
                        scenario_id: id,
                        summary: Some(summary),
                        error: None,
                    },
                    false,
                ),
                Ok(None) => (
                    BatchEntry {
                        scenario_id: id,
                        summary: None,
                        error: Some("실행이 중단되었습니다.".into()),
                    },
                    true,
                ),
                Err(err) => {
                    tracing::warn!(scenario_id = %id, error = %err, "시나리오 실행 실패");
                    (
                        BatchEntry {
                            scenario_id: id,
                            summary: None,
                            error: Some(err.to_string()),
                        },
                        false,
                    )
                }
            };
            batch.push(entry);
            if stopped {
                tracing::info!("중단 요청으로 일괄 실행을 종료합니다");
                break;
            }
        }
        tracing::info!(
            passed = batch.total_passed,
            failed = batch.total_failed,
            total = batch.total_scenarios,
            "일괄 실행 종료"
        );
        batch
    }

    /// 실행 상태를 초기화하고 시작 이벤트를 보낸다.
    fn start_run(
        &self,
        scenario: &Arc<Scenario>,
        plan: &RunPlan,
    ) -> Result<(u64, CancellationToken), EngineError> {
        let mut core = self.core();
        if core.is_running {
            let current = core
                .current_scenario
                .as_ref()
                .map(|s| s.id.clone())
                .unwrap_or_default();
            return Err(EngineError::AlreadyRunning(current));
        }
        core.run_id += 1;
        core.is_running = true;
        core.is_paused = false;
        core.mode = plan.mode;
        core.current_scenario = Some(scenario.clone());
        core.current_step_index = plan.start;
        core.end_step = plan.end;
        core.results.clear();
        core.detached = false;
        core.cancel = CancellationToken::new();
        tracing::info!(
            scenario_id = %scenario.id,
            mode = %plan.mode,
            start = plan.start,
            end = plan.end,
            "시나리오 실행 시작"
        );
        self.emit_state(&core);
        Ok((core.run_id, core.cancel.clone()))
    }

    async fn execute(
        &self,
        scenario: Arc<Scenario>,
        plan: RunPlan,
    ) -> Result<Option<ScenarioSummary>, EngineError> {
        let (run_id, cancel) = self.start_run(&scenario, &plan)?;
        let _guard = RunGuard {
            engine: self.clone(),
            run_id,
        };

        if let Some(setup) = scenario.setup_hook() {
            if let Err(message) = run_action(setup).await {
                return Err(self.abort(HookPhase::Setup, message));
            }
        }

        let mut teleport_pending = plan.teleport_to;
        loop {
            let decision = {
                let core = self.core();
                if !core.is_active(run_id) {
                    LoopDecision::Stopped
                } else if teleport_pending.is_some_and(|target| core.current_step_index >= target)
                {
                    LoopDecision::TeleportArrived
                } else if core.current_step_index >= plan.end {
                    LoopDecision::Exhausted
                } else if core.is_paused {
                    LoopDecision::Paused
                } else {
                    LoopDecision::Ready
                }
            };
            match decision {
                LoopDecision::Stopped => {
                    tracing::info!(scenario_id = %scenario.id, "중단된 실행을 종료합니다");
                    return Ok(None);
                }
                LoopDecision::TeleportArrived => {
                    teleport_pending = None;
                    self.arrive(run_id, plan.resume_mode);
                    self.wait_for_resume(run_id, &cancel).await?;
                }
                LoopDecision::Exhausted => break,
                LoopDecision::Paused => self.wait_for_resume(run_id, &cancel).await?,
                LoopDecision::Ready => {
                    let gate = self.inner.step_gate.lock().await;
                    let claimed = {
                        let core = self.core();
                        let index = core.current_step_index;
                        let blocked = !core.is_active(run_id)
                            || core.is_paused
                            || index >= plan.end
                            || teleport_pending.is_some_and(|target| index >= target);
                        (!blocked).then_some(index)
                    };
                    let Some(index) = claimed else {
                        continue;
                    };
                    let Some(step) = scenario.step(index) else {
                        break;
                    };
                    let result = run_single_step(step, index).await;
                    let still_running = self.record_result(run_id, scenario.len(), result);
                    drop(gate);
                    if still_running {
                        self.pace(run_id, plan.end, &cancel).await;
                    }
                }
            }
        }

        if let Some(teardown) = scenario.teardown_hook() {
            if let Err(message) = run_action(teardown).await {
                return Err(self.abort(HookPhase::Teardown, message));
            }
        }
        let summary = {
            let core = self.core();
            summarize(&core.results, &scenario)
        };
        tracing::info!(
            scenario_id = %scenario.id,
            passed = summary.passed,
            failed = summary.failed,
            total = summary.total,
            "시나리오 실행 완료"
        );
        self.inner
            .events
            .emit(EngineEvent::ScenarioCompleted(summary.clone()));
        Ok(Some(summary))
    }

    /// Step 결과를 기록하고 인덱스를 진행한다. 실행이 계속 중이면 `true`를 반환한다.
    fn record_result(&self, run_id: u64, total: usize, result: StepResult) -> bool {
        let mut core = self.core();
        if core.run_id != run_id || core.detached {
            return false;
        }
        let index = result.index;
        core.results.push(result.clone());
        self.inner.events.emit(EngineEvent::StepCompleted {
            result,
            index,
            total,
        });
        core.current_step_index = index + 1;
        self.emit_state(&core);
        core.is_running
    }

    /// 모드별 Step 간 지연을 적용한다. 마지막 Step 뒤에는 쉬지 않는다.
    async fn pace(&self, run_id: u64, end: usize, cancel: &CancellationToken) {
        let delay = {
            let core = self.core();
            if !core.is_active(run_id) || core.current_step_index >= end {
                return;
            }
            core.mode.delay(core.step_delay, core.interactive_delay)
        };
        if delay.is_zero() {
            tokio::task::yield_now().await;
            return;
        }
        tokio::select! {
            _ = sleep(delay) => {}
            _ = cancel.cancelled() => {}
        }
    }

    /// 순간이동 목표에 도착했음을 기록하고 일시정지한다.
    fn arrive(&self, run_id: u64, resume_mode: ExecutionMode) {
        let mut core = self.core();
        if !core.is_active(run_id) {
            return;
        }
        core.is_paused = true;
        core.mode = resume_mode;
        tracing::info!(step_index = core.current_step_index, "순간이동 도착");
        self.emit_state(&core);
    }

    /// `resume()` 또는 `stop()`까지 대기한다. 대기 제한이 있으면 초과 시 실행을 중단한다.
    async fn wait_for_resume(
        &self,
        run_id: u64,
        cancel: &CancellationToken,
    ) -> Result<(), EngineError> {
        let deadline = self.core().pause_timeout.map(|timeout| Instant::now() + timeout);
        loop {
            let notified = self.inner.resume_signal.notified();
            {
                let core = self.core();
                if !core.is_active(run_id) || !core.is_paused {
                    return Ok(());
                }
            }
            match deadline {
                Some(deadline) => tokio::select! {
                    _ = notified => {}
                    _ = cancel.cancelled() => return Ok(()),
                    _ = sleep_until(deadline) => return Err(self.expire_pause(run_id)),
                },
                None => tokio::select! {
                    _ = notified => {}
                    _ = cancel.cancelled() => return Ok(()),
                },
            }
        }
    }

    fn expire_pause(&self, run_id: u64) -> EngineError {
        let mut core = self.core();
        let step_index = core.current_step_index;
        if core.run_id == run_id {
            core.is_running = false;
            core.is_paused = false;
            core.cancel.cancel();
            tracing::warn!(step_index, "일시정지 대기 시간 초과로 실행을 중단합니다");
            self.inner.events.emit(EngineEvent::Error {
                message: "일시정지 대기 시간 초과".into(),
                step_index,
            });
            self.emit_state(&core);
        }
        EngineError::PauseTimedOut { step_index }
    }

    fn abort(&self, phase: HookPhase, message: String) -> EngineError {
        let step_index = self.core().current_step_index;
        tracing::error!(%phase, step_index, %message, "시나리오 훅 실패");
        self.inner.events.emit(EngineEvent::Error {
            message: format!("{phase} 실패: {message}"),
            step_index,
        });
        EngineError::ScenarioAborted { phase, message }
    }
}

impl Default for QaEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// 실행이 어떤 경로로 끝나든 실행 중 표시를 해제한다.
struct RunGuard {
    engine: QaEngine,
    run_id: u64,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        let mut core = self
            .engine
            .inner
            .core
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if core.run_id != self.run_id || !core.is_running {
            return;
        }
        core.is_running = false;
        core.is_paused = false;
        self.engine.emit_state(&core);
    }
}
