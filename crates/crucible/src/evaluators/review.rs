//! Human-review triage flag
//!
//! Not a graded metric: the score is a binary gate for downstream review
//! queues, never something to average into a KPI.

use async_trait::async_trait;

use crate::dataset::Expectation;
use crate::run::RunOutcome;

use super::{EvalResult, Evaluator};

/// Main text shorter than this always gets flagged.
const MIN_REPORT_CHARS: usize = 200;

/// Substrings that indicate a failed or apologetic answer.
const FAILURE_PHRASES: [&str; 3] = ["error", "sorry", "unable to"];

/// Flags runs that need a human look: 0.0 = flagged, 1.0 = auto-approved.
pub struct NeedsHumanReviewEvaluator;

#[async_trait]
impl Evaluator for NeedsHumanReviewEvaluator {
    fn key(&self) -> &'static str {
        "needs_human_review"
    }

    async fn evaluate(&self, run: &RunOutcome, _expected: &Expectation) -> EvalResult {
        let response = run.main_text().unwrap_or("");
        let lowered = response.to_lowercase();

        let needs_review = response.chars().count() < MIN_REPORT_CHARS
            || FAILURE_PHRASES.iter().any(|p| lowered.contains(p))
            || run.error.is_some();

        if needs_review {
            EvalResult::new(self.key(), 0.0, "Flagged for human review")
        } else {
            EvalResult::new(self.key(), 1.0, "Auto-approved")
        }
    }
}
