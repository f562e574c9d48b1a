//! Scoring functions for recorded runs
//!
//! Every evaluator maps one recorded run and its expectation record to a
//! single named score in [0, 1] with a human-readable comment. Evaluators are
//! total: internal faults become the indeterminate sentinel, never a returned
//! error.
//!
//! Evaluators are grouped into cost tiers:
//! - automated: deterministic, no external calls
//! - performance: needs timing/token metadata, no external calls
//! - judged: one chat-model call per invocation
//!
//! Consumers pick the tier combination their budget allows; the combined set
//! is the union of all tiers plus the human-review flag.

pub mod automated;
pub mod judged;
pub mod performance;
pub mod review;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::dataset::Expectation;
use crate::judge::Judge;
use crate::run::RunOutcome;

pub use automated::{
    ForbiddenContentEvaluator, GracefulErrorEvaluator, KeywordCoverageEvaluator,
    ReportLengthEvaluator, SchemaEvaluator,
};
pub use judged::{ConsistencyEvaluator, QualityEvaluator, RelevanceEvaluator};
pub use performance::{LatencyEvaluator, TokenEfficiencyEvaluator};
pub use review::NeedsHumanReviewEvaluator;

/// Canonical score for "required signal absent / judge failed", distinct from
/// a verified-poor 0.0.
pub const INDETERMINATE_SCORE: f64 = 0.5;

/// One evaluator's score for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalResult {
    /// Metric key this score is recorded under
    pub key: String,
    /// Score in [0, 1]
    pub score: f64,
    /// Human-readable explanation
    pub comment: String,
}

impl EvalResult {
    /// Build a result, clamping the score into [0, 1].
    pub fn new(key: impl Into<String>, score: f64, comment: impl Into<String>) -> Self {
        let score = if score.is_finite() {
            score.clamp(0.0, 1.0)
        } else {
            INDETERMINATE_SCORE
        };
        Self {
            key: key.into(),
            score,
            comment: comment.into(),
        }
    }

    /// Build an indeterminate-sentinel result.
    pub fn indeterminate(key: impl Into<String>, comment: impl Into<String>) -> Self {
        Self::new(key, INDETERMINATE_SCORE, comment)
    }
}

/// A scoring function over one recorded run.
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// Metric key this evaluator writes
    fn key(&self) -> &'static str;

    /// Score one run against the case's expectation record.
    ///
    /// Must be total: any internal failure is folded into the returned result.
    async fn evaluate(&self, run: &RunOutcome, expected: &Expectation) -> EvalResult;
}

/// Deterministic tier: no external calls, near-zero cost.
pub fn automated_evaluators() -> Vec<Box<dyn Evaluator>> {
    vec![
        Box::new(SchemaEvaluator),
        Box::new(KeywordCoverageEvaluator),
        Box::new(ForbiddenContentEvaluator),
        Box::new(ReportLengthEvaluator),
        Box::new(GracefulErrorEvaluator),
    ]
}

/// Performance tier: needs timing/token metadata, no external calls.
pub fn performance_evaluators() -> Vec<Box<dyn Evaluator>> {
    vec![
        Box::new(LatencyEvaluator),
        Box::new(TokenEfficiencyEvaluator),
    ]
}

/// Judged tier: one chat-model call per evaluator invocation.
pub fn judge_evaluators(judge: Arc<Judge>) -> Vec<Box<dyn Evaluator>> {
    vec![
        Box::new(QualityEvaluator::new(judge.clone())),
        Box::new(RelevanceEvaluator::new(judge.clone())),
        Box::new(ConsistencyEvaluator::new(judge)),
    ]
}

/// Every tier plus the human-review triage flag.
pub fn all_evaluators(judge: Arc<Judge>) -> Vec<Box<dyn Evaluator>> {
    let mut evaluators = automated_evaluators();
    evaluators.extend(performance_evaluators());
    evaluators.extend(judge_evaluators(judge));
    evaluators.push(Box::new(NeedsHumanReviewEvaluator));
    evaluators
}

/// Truncate to a character budget without splitting a code point.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Serialize a run's outputs to searchable text (empty object when absent).
pub(crate) fn output_text(run: &RunOutcome) -> String {
    run.outputs
        .as_ref()
        .and_then(|outputs| serde_json::to_string(outputs).ok())
        .unwrap_or_else(|| "{}".to_string())
}
