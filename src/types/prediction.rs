use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::workflow_run::{RunConclusion, WorkflowRun};

/// Prediction issued by the backend for a single workflow run.
///
/// Both booleans mean "failure": `predicted_result = Some(true)` is a
/// forecast that the run will fail, `actual_result = Some(true)` records that
/// it did. `actual_result` is populated server-side once the run concludes.
/// Read-only to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub run_id: u64,
    pub predicted_result: Option<bool>,
    pub actual_result: Option<bool>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl PredictionRecord {
    /// Whether the prediction disagrees with the run's actual outcome.
    ///
    /// Derived on every read, never cached: the run's conclusion may only
    /// have been observed on the latest poll. When the record itself carries
    /// no `actual_result` yet, the run conclusion stands in for it; a run
    /// that ended neither in success nor failure yields no verdict.
    pub fn mismatch(&self, run: &WorkflowRun) -> bool {
        let actual = self
            .actual_result
            .or_else(|| actual_from_conclusion(run.conclusion));
        match (actual, self.predicted_result) {
            (Some(actual), Some(predicted)) => actual != predicted,
            _ => false,
        }
    }

    /// A record is frozen once the backend has recorded the actual outcome.
    pub fn is_settled(&self) -> bool {
        self.actual_result.is_some()
    }
}

fn actual_from_conclusion(conclusion: Option<RunConclusion>) -> Option<bool> {
    match conclusion? {
        RunConclusion::Failure => Some(true),
        RunConclusion::Success => Some(false),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::workflow_run::RunStatus;
    use chrono::Utc;

    fn make_run(conclusion: Option<RunConclusion>) -> WorkflowRun {
        WorkflowRun {
            id: 7,
            name: "ci".to_owned(),
            status: RunStatus::Completed,
            conclusion,
            head_branch: Some("main".to_owned()),
            head_sha: "abc123".to_owned(),
            run_number: 12,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn make_record(predicted: Option<bool>, actual: Option<bool>) -> PredictionRecord {
        PredictionRecord {
            run_id: 7,
            predicted_result: predicted,
            actual_result: actual,
            updated_at: None,
        }
    }

    #[test]
    fn failed_run_not_predicted_is_mismatch() {
        let run = make_run(Some(RunConclusion::Failure));
        assert!(make_record(Some(false), None).mismatch(&run));
    }

    #[test]
    fn failed_run_predicted_is_not_mismatch() {
        let run = make_run(Some(RunConclusion::Failure));
        assert!(!make_record(Some(true), None).mismatch(&run));
    }

    #[test]
    fn successful_run_predicted_to_fail_is_mismatch() {
        let run = make_run(Some(RunConclusion::Success));
        assert!(make_record(Some(true), None).mismatch(&run));
    }

    #[test]
    fn unconcluded_run_is_never_mismatch() {
        let run = make_run(None);
        assert!(!make_record(Some(true), None).mismatch(&run));
    }

    #[test]
    fn cancelled_run_yields_no_verdict() {
        let run = make_run(Some(RunConclusion::Cancelled));
        assert!(!make_record(Some(true), None).mismatch(&run));
    }

    #[test]
    fn missing_prediction_is_never_mismatch() {
        let run = make_run(Some(RunConclusion::Failure));
        assert!(!make_record(None, Some(true)).mismatch(&run));
    }

    #[test]
    fn record_actual_wins_over_conclusion() {
        // Server already settled the record; a stale run snapshot must not
        // override it.
        let run = make_run(Some(RunConclusion::Success));
        assert!(make_record(Some(false), Some(true)).mismatch(&run));
    }

    #[test]
    fn settled_only_with_actual_result() {
        assert!(make_record(Some(true), Some(true)).is_settled());
        assert!(!make_record(Some(true), None).is_settled());
    }
}
