use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;

/// Action은 Step 또는 시나리오 훅이 수행하는 비동기 작업을 정의한다.
///
/// 실패는 `Err`로 반환하며, 엔진은 Step 안의 실패를 결과로 기록하고 다음 Step으로 진행한다.
#[async_trait]
pub trait Action: Send + Sync {
    /// 작업을 한 번 수행한다.
    async fn run(&self) -> anyhow::Result<()>;
}

#[async_trait]
impl<F, Fut> Action for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    /// 클로저를 호출하고 반환된 future를 기다린다.
    async fn run(&self) -> anyhow::Result<()> {
        (self)().await
    }
}

/// Assertion 한 건의 판정 결과이다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionOutcome {
    /// 통과 여부.
    pub passed: bool,
    /// 판정 메시지. 실패 시 Step 오류 메시지로 사용된다.
    pub message: String,
}

impl AssertionOutcome {
    /// 통과 결과를 생성한다.
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
        }
    }

    /// 실패 결과를 생성한다.
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
        }
    }

    /// 조건식으로 결과를 만든다. 실패 시에만 메시지가 의미를 가진다.
    pub fn check(condition: bool, message: impl Into<String>) -> Self {
        Self {
            passed: condition,
            message: message.into(),
        }
    }
}

/// Assertion은 Step action 이후 상태를 검사하는 비동기 판정기이다.
#[async_trait]
pub trait Assertion: Send + Sync {
    /// 검사를 수행하고 판정 결과를 반환한다.
    async fn check(&self) -> AssertionOutcome;
}

#[async_trait]
impl<F, Fut> Assertion for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = AssertionOutcome> + Send + 'static,
{
    async fn check(&self) -> AssertionOutcome {
        (self)().await
    }
}

/// Action을 공유하기 위한 Arc 타입 별칭이다.
pub type SharedAction = Arc<dyn Action>;

/// Assertion을 공유하기 위한 Arc 타입 별칭이다.
pub type SharedAssertion = Arc<dyn Assertion>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 호출 횟수를 세는 Action 구현체이다.
    struct CountingAction {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Action for CountingAction {
        async fn run(&self) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn closures_and_structs_are_both_actions() {
        let calls = Arc::new(AtomicUsize::new(0));
        let from_struct: SharedAction = Arc::new(CountingAction {
            calls: calls.clone(),
        });
        let from_closure: SharedAction =
            Arc::new(|| async { Err::<(), _>(anyhow::anyhow!("닫힌 페이지")) });

        from_struct.run().await.expect("구조체 Action 실패");
        from_struct.run().await.expect("구조체 Action 실패");
        let err = from_closure.run().await.expect_err("클로저 Action은 실패해야 한다");

        assert_eq!(2, calls.load(Ordering::SeqCst));
        assert_eq!("닫힌 페이지", err.to_string());
    }

    #[tokio::test]
    async fn closure_assertion_reports_outcome() {
        let assertion: SharedAssertion =
            Arc::new(|| async { AssertionOutcome::check(1 + 1 == 3, "산술 불일치") });

        let outcome = assertion.check().await;

        assert!(!outcome.passed);
        assert_eq!("산술 불일치", outcome.message);
    }
}
