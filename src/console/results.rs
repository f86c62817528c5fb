use serde::Serialize;
use std::collections::VecDeque;

use super::model::TestResult;

/// Dispatch outcomes, newest first.
#[derive(Debug, Default)]
pub struct TestResultLog {
    entries: VecDeque<TestResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResultSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl TestResultLog {
    pub fn record(&mut self, result: TestResult) {
        self.entries.push_front(result);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TestResult> {
        self.entries.iter()
    }

    pub fn snapshot(&self) -> Vec<TestResult> {
        self.entries.iter().cloned().collect()
    }

    pub fn summary(&self) -> ResultSummary {
        let succeeded = self.iter().filter(|r| r.success).count();
        ResultSummary {
            total: self.len(),
            succeeded,
            failed: self.len() - succeeded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::model::{AnalyticsEvent, UserContext};

    fn result(event_type: &str, success: bool) -> TestResult {
        TestResult {
            timestamp: 0,
            experiment_flags: vec![],
            event: AnalyticsEvent::new(event_type),
            user_context: UserContext::default(),
            success,
            response_data: None,
            error: None,
        }
    }

    #[test]
    fn test_newest_first() {
        let mut log = TestResultLog::default();
        log.record(result("first", true));
        log.record(result("second", false));

        let types: Vec<_> = log.iter().map(|r| r.event.event_type.as_str()).collect();
        assert_eq!(types, vec!["second", "first"]);
    }

    #[test]
    fn test_clear_empties_log() {
        let mut log = TestResultLog::default();
        for i in 0..5 {
            log.record(result(&format!("e{}", i), i % 2 == 0));
        }
        assert_eq!(log.len(), 5);

        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.summary(), ResultSummary { total: 0, succeeded: 0, failed: 0 });
    }

    #[test]
    fn test_summary_counts() {
        let mut log = TestResultLog::default();
        log.record(result("a", true));
        log.record(result("b", false));
        log.record(result("c", true));
        assert_eq!(log.summary(), ResultSummary { total: 3, succeeded: 2, failed: 1 });
    }
}
