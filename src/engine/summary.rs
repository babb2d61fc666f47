use super::state::StepResult;
use crate::scenario::Scenario;
use serde::{Deserialize, Serialize};

/// 시나리오 한 번 실행의 집계 결과이다.
///
/// 항상 `passed + failed == total == results.len()`을 만족한다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioSummary {
    /// 시나리오 id.
    pub scenario_id: String,
    /// 시나리오 이름.
    pub scenario_name: String,
    /// 통과한 Step 수.
    pub passed: usize,
    /// 실패한 Step 수.
    pub failed: usize,
    /// 수집된 결과 수.
    pub total: usize,
    /// Step 결과 사본.
    pub results: Vec<StepResult>,
    /// 실패가 하나도 없으면 `true`.
    pub all_passed: bool,
}

/// Step 결과 목록을 시나리오 요약으로 집계한다.
pub fn summarize(results: &[StepResult], scenario: &Scenario) -> ScenarioSummary {
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.len() - passed;
    ScenarioSummary {
        scenario_id: scenario.id.clone(),
        scenario_name: scenario.name.clone(),
        passed,
        failed,
        total: results.len(),
        results: results.to_vec(),
        all_passed: failed == 0,
    }
}

/// 일괄 실행에서 시나리오 하나의 결과이다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchEntry {
    /// 시나리오 id.
    pub scenario_id: String,
    /// 끝까지 실행된 경우의 요약.
    pub summary: Option<ScenarioSummary>,
    /// 실행이 오류로 끝났거나 중단된 경우의 사유.
    pub error: Option<String>,
}

impl BatchEntry {
    /// 시나리오가 완료되었고 모든 Step이 통과했는지 확인한다.
    pub fn passed(&self) -> bool {
        self.error.is_none() && self.summary.as_ref().is_some_and(|s| s.all_passed)
    }
}

/// 여러 시나리오 일괄 실행의 집계 결과이다. 합계는 시나리오 단위로 센다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// 실행 순서대로 정렬된 시나리오별 결과.
    pub entries: Vec<BatchEntry>,
    /// 통과한 시나리오 수.
    pub total_passed: usize,
    /// 실패, 오류, 중단된 시나리오 수.
    pub total_failed: usize,
    /// 실행한 시나리오 수.
    pub total_scenarios: usize,
}

impl BatchSummary {
    /// 시나리오 결과 하나를 누적한다.
    pub fn push(&mut self, entry: BatchEntry) {
        if entry.passed() {
            self.total_passed += 1;
        } else {
            self.total_failed += 1;
        }
        self.total_scenarios += 1;
        self.entries.push(entry);
    }

    /// 모든 시나리오가 통과했는지 확인한다.
    pub fn all_passed(&self) -> bool {
        self.total_failed == 0
    }

    /// 실패한 시나리오만 반환한다.
    pub fn failures(&self) -> Vec<&BatchEntry> {
        self.entries.iter().filter(|e| !e.passed()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(index: usize, passed: bool) -> StepResult {
        StepResult {
            index,
            name: format!("step-{index}"),
            description: String::new(),
            passed,
            error: (!passed).then(|| "boom".to_string()),
            duration_ms: 1,
        }
    }

    #[test]
    fn summarize_counts_pass_and_fail() {
        let scenario = Scenario::new("s1", "Sample");
        let results = vec![result(0, true), result(1, false), result(2, true)];

        let summary = summarize(&results, &scenario);

        assert_eq!(2, summary.passed);
        assert_eq!(1, summary.failed);
        assert_eq!(3, summary.total);
        assert_eq!(summary.total, summary.passed + summary.failed);
        assert_eq!(summary.total, summary.results.len());
        assert!(!summary.all_passed);
        assert_eq!("Sample", summary.scenario_name);
    }

    #[test]
    fn empty_results_are_all_passed() {
        let summary = summarize(&[], &Scenario::new("empty", "Empty"));
        assert_eq!(0, summary.total);
        assert!(summary.all_passed);
    }

    #[test]
    fn batch_counts_errors_as_failed_scenarios() {
        let scenario = Scenario::new("ok", "Ok");
        let mut batch = BatchSummary::default();
        batch.push(BatchEntry {
            scenario_id: "ok".into(),
            summary: Some(summarize(&[result(0, true)], &scenario)),
            error: None,
        });
        batch.push(BatchEntry {
            scenario_id: "broken".into(),
            summary: None,
            error: Some("setup 실패".into()),
        });

        assert_eq!(1, batch.total_passed);
        assert_eq!(1, batch.total_failed);
        assert_eq!(2, batch.total_scenarios);
        assert!(!batch.all_passed());
        assert_eq!("broken", batch.failures()[0].scenario_id);
    }
}
