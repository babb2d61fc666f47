use super::state::{StepResult, duration_to_ms};
use crate::action::{Action, SharedAssertion};
use crate::scenario::Step;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

mod utils;

use utils::{assertion_failure_message, panic_message};

/// 단일 Step을 실행하고 결과를 반환한다.
///
/// action 또는 assertion 실패는 결과의 `error`로만 기록되며 호출자에게 전파되지 않는다.
pub(super) async fn run_single_step(step: &Step, index: usize) -> StepResult {
    let started_at = Instant::now();
    let outcome = match step.action_handle() {
        Some(action) => run_step_body(action.as_ref(), step.assertions()).await,
        None => Err(format!("Step '{}'에 action이 없습니다.", step.name)),
    };
    let duration_ms = duration_to_ms(started_at.elapsed());
    match &outcome {
        Ok(()) => tracing::debug!(index, step = %step.name, duration_ms, "Step 통과"),
        Err(reason) => {
            tracing::warn!(index, step = %step.name, duration_ms, %reason, "Step 실패")
        }
    }
    StepResult {
        index,
        name: step.name.clone(),
        description: step.description.clone(),
        passed: outcome.is_ok(),
        error: outcome.err(),
        duration_ms,
    }
}

/// action을 실행한 뒤 assertion을 순서대로 평가한다. 첫 실패에서 멈춘다.
async fn run_step_body(action: &dyn Action, assertions: &[SharedAssertion]) -> Result<(), String> {
    run_action(action).await?;
    for (offset, assertion) in assertions.iter().enumerate() {
        let position = offset + 1;
        let outcome = AssertUnwindSafe(assertion.check())
            .catch_unwind()
            .await
            .map_err(|payload| {
                format!("Assertion #{position} panic: {}", panic_message(payload.as_ref()))
            })?;
        if !outcome.passed {
            return Err(assertion_failure_message(position, outcome.message));
        }
    }
    Ok(())
}

/// action 또는 훅을 실행한다. 오류와 panic을 모두 메시지로 변환한다.
pub(super) async fn run_action(action: &dyn Action) -> Result<(), String> {
    match AssertUnwindSafe(action.run()).catch_unwind().await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(format!("{err:#}")),
        Err(payload) => Err(format!("panic: {}", panic_message(payload.as_ref()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::AssertionOutcome;
    use anyhow::Context;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn missing_selector() -> anyhow::Result<()> {
        panic!("selector missing")
    }

    #[tokio::test]
    async fn first_failing_assertion_stops_evaluation() {
        let third_ran = Arc::new(AtomicBool::new(false));
        let flag = third_ran.clone();
        let step = Step::new("check")
            .description("폼 확인")
            .action(|| async { Ok(()) })
            .assertion(|| async { AssertionOutcome::pass("ok") })
            .assertion(|| async { AssertionOutcome::fail("boom") })
            .assertion(move || {
                let flag = flag.clone();
                async move {
                    flag.store(true, Ordering::SeqCst);
                    AssertionOutcome::pass("unreachable")
                }
            });

        let result = run_single_step(&step, 4).await;

        assert_eq!(4, result.index);
        assert!(!result.passed);
        assert_eq!(Some("boom".to_string()), result.error);
        assert_eq!("폼 확인", result.description);
        assert!(!third_ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn empty_assertion_message_gets_default_text() {
        let step = Step::new("s")
            .action(|| async { Ok(()) })
            .assertion(|| async { AssertionOutcome::fail("") });

        let result = run_single_step(&step, 0).await;

        assert_eq!(Some("Assertion #1 실패".to_string()), result.error);
    }

    #[tokio::test]
    async fn action_error_skips_assertions_and_keeps_context() {
        let step = Step::new("s")
            .action(|| async {
                Err(anyhow::anyhow!("connection refused")).context("페이지 열기 실패")
            })
            .assertion(|| async { AssertionOutcome::pass("never") });

        let result = run_single_step(&step, 0).await;

        assert!(!result.passed);
        assert_eq!(
            Some("페이지 열기 실패: connection refused".to_string()),
            result.error
        );
    }

    #[tokio::test]
    async fn panicking_action_is_recorded_as_failure() {
        let step = Step::new("s").action(|| async { missing_selector() });

        let result = run_single_step(&step, 0).await;

        assert!(!result.passed);
        assert_eq!(Some("panic: selector missing".to_string()), result.error);
    }

    #[tokio::test]
    async fn step_without_assertions_passes_when_action_succeeds() {
        let step = Step::new("s").action(|| async { Ok(()) });
        let result = run_single_step(&step, 1).await;
        assert!(result.passed);
        assert_eq!(None, result.error);
    }
}
