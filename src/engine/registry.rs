use crate::error::EngineError;
use crate::scenario::{Scenario, ScenarioInfo};
use indexmap::IndexMap;
use std::sync::Arc;

/// 시나리오 id를 키로 등록 순서를 유지하는 레지스트리이다.
#[derive(Debug, Default)]
pub struct ScenarioRegistry {
    /// id별 시나리오. 등록 후에는 읽기 전용으로 공유된다.
    scenarios: IndexMap<String, Arc<Scenario>>,
}

impl ScenarioRegistry {
    /// 비어 있는 레지스트리를 생성한다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 시나리오를 등록한다.
    ///
    /// 같은 id가 이미 있으면 덮어쓰며, 기존 위치는 유지된다. 덮어쓴 경우 이전 시나리오를 반환한다.
    pub fn register(&mut self, scenario: Scenario) -> Result<Option<Arc<Scenario>>, EngineError> {
        if scenario.id.trim().is_empty() {
            return Err(EngineError::InvalidScenario(
                "시나리오 id가 비어 있습니다.".into(),
            ));
        }
        if scenario.name.trim().is_empty() {
            return Err(EngineError::InvalidScenario(format!(
                "시나리오 '{}'의 name이 비어 있습니다.",
                scenario.id
            )));
        }
        let id = scenario.id.clone();
        let previous = self.scenarios.insert(id.clone(), Arc::new(scenario));
        if previous.is_some() {
            tracing::warn!(scenario_id = %id, "같은 id의 시나리오를 덮어썼습니다");
        }
        Ok(previous)
    }

    /// id로 시나리오를 조회한다.
    pub fn get(&self, id: &str) -> Option<Arc<Scenario>> {
        self.scenarios.get(id).cloned()
    }

    /// 등록 순서대로 id 목록을 반환한다.
    pub fn ids(&self) -> Vec<String> {
        self.scenarios.keys().cloned().collect()
    }

    /// 등록 순서대로 시나리오 메타데이터를 반환한다.
    pub fn list(&self) -> Vec<ScenarioInfo> {
        self.scenarios.values().map(|s| s.info()).collect()
    }

    /// 등록된 시나리오 수를 반환한다.
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// 등록된 시나리오가 없는지 확인한다.
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::Step;

    fn scenario(id: &str, name: &str, steps: usize) -> Scenario {
        (0..steps).fold(Scenario::new(id, name), |s, i| {
            s.add_step(Step::new(format!("step-{i}")).action(|| async { Ok(()) }))
                .expect("Step 추가 실패")
        })
    }

    #[test]
    fn register_rejects_missing_id_or_name() {
        let mut registry = ScenarioRegistry::new();
        assert!(matches!(
            registry.register(Scenario::new("", "x")),
            Err(EngineError::InvalidScenario(_))
        ));
        assert!(matches!(
            registry.register(Scenario::new("x", " ")),
            Err(EngineError::InvalidScenario(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn last_registration_wins_and_keeps_position() {
        let mut registry = ScenarioRegistry::new();
        registry.register(scenario("a", "A", 1)).expect("등록 실패");
        registry.register(scenario("b", "B", 1)).expect("등록 실패");
        let replaced = registry.register(scenario("a", "A2", 3)).expect("등록 실패");

        assert!(replaced.is_some());
        assert_eq!(vec!["a".to_string(), "b".to_string()], registry.ids());
        let listed = registry.list();
        assert_eq!("A2", listed[0].name);
        assert_eq!(3, listed[0].step_count);
    }
}
