use crate::action::{Action, AssertionOutcome, SharedAction, SharedAssertion};
use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Step은 Scenario 내 최소 실행 단위를 표현한다.
///
/// action 하나와 0개 이상의 assertion으로 구성되며, Scenario에 추가된 뒤에는 변경되지 않는다.
#[derive(Clone)]
pub struct Step {
    /// 사용자 친화적인 Step 이름.
    pub name: String,
    /// Step 설명. 비어 있을 수 있다.
    pub description: String,
    /// Step에서 실행할 action.
    action: Option<SharedAction>,
    /// action 이후 순서대로 평가할 assertion 목록.
    assertions: Vec<SharedAssertion>,
}

impl Step {
    /// 이름만 가진 Step을 생성한다. Scenario에 추가하기 전에 action을 지정해야 한다.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            action: None,
            assertions: Vec::new(),
        }
    }

    /// Step 설명을 지정한다.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// 클로저를 action으로 지정한다.
    pub fn action<F, Fut>(mut self, action: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.action = Some(Arc::new(action));
        self
    }

    /// 이미 공유 중인 Action 구현체를 지정한다.
    pub fn action_arc(mut self, action: SharedAction) -> Self {
        self.action = Some(action);
        self
    }

    /// 클로저 assertion을 뒤에 추가한다.
    pub fn assertion<F, Fut>(mut self, assertion: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AssertionOutcome> + Send + 'static,
    {
        self.assertions.push(Arc::new(assertion));
        self
    }

    /// 이미 공유 중인 Assertion 구현체를 뒤에 추가한다.
    pub fn assertion_arc(mut self, assertion: SharedAssertion) -> Self {
        self.assertions.push(assertion);
        self
    }

    /// 지정된 action을 반환한다.
    pub fn action_handle(&self) -> Option<&SharedAction> {
        self.action.as_ref()
    }

    /// assertion 목록을 반환한다.
    pub fn assertions(&self) -> &[SharedAssertion] {
        &self.assertions
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("has_action", &self.action.is_some())
            .field("assertions", &self.assertions.len())
            .finish()
    }
}

/// Scenario는 여러 Step으로 구성된 하나의 테스트 여정을 정의한다.
#[derive(Clone)]
pub struct Scenario {
    /// 시나리오 id. 유일성은 레지스트리가 보장한다.
    pub id: String,
    /// 시나리오의 표시 이름.
    pub name: String,
    /// 시나리오 설명.
    pub description: String,
    /// 분류용 태그 목록. 중복 없이 유지된다.
    pub tags: Vec<String>,
    /// Step 목록.
    steps: Vec<Step>,
    /// 첫 Step 이전에 한 번 실행할 훅.
    setup: Option<SharedAction>,
    /// 마지막 Step 이후에 한 번 실행할 훅.
    teardown: Option<SharedAction>,
}

impl Scenario {
    /// 비어 있는 시나리오를 생성한다.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            tags: Vec::new(),
            steps: Vec::new(),
            setup: None,
            teardown: None,
        }
    }

    /// 시나리오 설명을 지정한다.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// 태그를 추가한다. 이미 있는 태그는 무시한다.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
        self
    }

    /// 여러 태그를 한 번에 추가한다.
    pub fn tags<I, T>(self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        tags.into_iter().fold(self, |scenario, tag| scenario.tag(tag))
    }

    /// setup 훅을 지정한다.
    pub fn setup<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.setup = Some(Arc::new(hook));
        self
    }

    /// teardown 훅을 지정한다.
    pub fn teardown<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.teardown = Some(Arc::new(hook));
        self
    }

    /// Step을 뒤에 추가한다.
    ///
    /// 이름이 비어 있거나 action이 없으면 `EngineError::InvalidStep`을 반환한다.
    pub fn add_step(mut self, step: Step) -> Result<Self, EngineError> {
        if step.name.trim().is_empty() {
            return Err(EngineError::InvalidStep {
                scenario: self.id.clone(),
                reason: "Step 이름이 비어 있습니다.".into(),
            });
        }
        if step.action.is_none() {
            return Err(EngineError::InvalidStep {
                scenario: self.id.clone(),
                reason: format!("Step '{}'에 action이 없습니다.", step.name),
            });
        }
        self.steps.push(step);
        Ok(self)
    }

    /// Step 목록을 반환한다.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// 인덱스로 Step을 조회한다.
    pub fn step(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub(crate) fn setup_hook(&self) -> Option<&dyn Action> {
        self.setup.as_deref()
    }

    pub(crate) fn teardown_hook(&self) -> Option<&dyn Action> {
        self.teardown.as_deref()
    }

    /// 전체 Step 수를 반환한다.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Step 수가 비었는지 여부를 확인한다.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// 주어진 태그 중 하나라도 가지고 있는지 확인한다.
    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        tags.iter().any(|tag| self.tags.contains(tag))
    }

    /// UI 노출용 메타데이터 사본을 만든다.
    pub fn info(&self) -> ScenarioInfo {
        ScenarioInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            step_count: self.steps.len(),
            tags: self.tags.clone(),
        }
    }
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("tags", &self.tags)
            .field("steps", &self.steps)
            .field("has_setup", &self.setup.is_some())
            .field("has_teardown", &self.teardown.is_some())
            .finish()
    }
}

/// 레지스트리가 외부에 노출하는 읽기 전용 시나리오 정보이다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioInfo {
    /// 시나리오 id.
    pub id: String,
    /// 시나리오 이름.
    pub name: String,
    /// 시나리오 설명.
    pub description: String,
    /// Step 개수.
    pub step_count: usize,
    /// 태그 목록.
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_chains_steps_and_dedups_tags() {
        let scenario = Scenario::new("login", "로그인 흐름")
            .description("폼 제출까지")
            .tags(["smoke", "auth", "smoke"])
            .add_step(Step::new("open").action(|| async { Ok(()) }))
            .and_then(|s| s.add_step(Step::new("submit").action(|| async { Ok(()) })))
            .expect("Step 추가 실패");

        assert_eq!(2, scenario.len());
        assert_eq!(vec!["smoke".to_string(), "auth".to_string()], scenario.tags);
        assert_eq!("submit", scenario.step(1).map(|s| s.name.as_str()).unwrap_or(""));

        let info = scenario.info();
        assert_eq!(2, info.step_count);
        assert_eq!("폼 제출까지", info.description);
    }

    #[test]
    fn add_step_rejects_missing_name_or_action() {
        let unnamed = Scenario::new("s", "S").add_step(Step::new("  ").action(|| async { Ok(()) }));
        assert!(matches!(unnamed, Err(EngineError::InvalidStep { .. })));

        let no_action = Scenario::new("s", "S").add_step(Step::new("click"));
        match no_action {
            Err(EngineError::InvalidStep { scenario, reason }) => {
                assert_eq!("s", scenario);
                assert!(reason.contains("click"));
            }
            other => panic!("InvalidStep이 아닙니다: {other:?}"),
        }
    }
}
