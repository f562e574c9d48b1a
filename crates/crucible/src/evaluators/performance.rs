//! Performance evaluators
//!
//! Score timing and token signals recorded on the run. Missing signals yield
//! the indeterminate sentinel rather than a failing score.

use async_trait::async_trait;

use crate::dataset::Expectation;
use crate::run::RunOutcome;

use super::{EvalResult, Evaluator};

/// Default latency threshold in seconds.
pub const DEFAULT_MAX_LATENCY_SECONDS: f64 = 30.0;

/// Default token budget.
pub const DEFAULT_MAX_TOKENS: f64 = 10_000.0;

/// Scores wall-clock latency against the case's threshold.
pub struct LatencyEvaluator;

#[async_trait]
impl Evaluator for LatencyEvaluator {
    fn key(&self) -> &'static str {
        "latency_seconds"
    }

    async fn evaluate(&self, run: &RunOutcome, expected: &Expectation) -> EvalResult {
        let threshold = expected
            .max_latency_seconds
            .unwrap_or(DEFAULT_MAX_LATENCY_SECONDS);
        if threshold <= 0.0 {
            return EvalResult::indeterminate(
                self.key(),
                format!("Invalid latency threshold: {}", threshold),
            );
        }

        let Some(elapsed) = run.elapsed_seconds() else {
            return EvalResult::indeterminate(self.key(), "No timing data available");
        };

        let score = (1.0 - elapsed / threshold).max(0.0);
        EvalResult::new(
            self.key(),
            score,
            format!("{:.2}s (threshold: {}s)", elapsed, threshold),
        )
    }
}

/// Scores total token usage against the case's budget.
pub struct TokenEfficiencyEvaluator;

#[async_trait]
impl Evaluator for TokenEfficiencyEvaluator {
    fn key(&self) -> &'static str {
        "token_efficiency"
    }

    async fn evaluate(&self, run: &RunOutcome, expected: &Expectation) -> EvalResult {
        let threshold = expected.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS);
        if threshold <= 0.0 {
            return EvalResult::indeterminate(
                self.key(),
                format!("Invalid token budget: {}", threshold),
            );
        }

        let Some(total_tokens) = run.total_tokens() else {
            return EvalResult::indeterminate(self.key(), "No token data available");
        };

        let score = (1.0 - total_tokens / threshold).max(0.0);
        EvalResult::new(
            self.key(),
            score,
            format!("{} tokens (threshold: {})", total_tokens, threshold),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn timed_run(elapsed_secs: i64) -> RunOutcome {
        let start = Utc::now();
        RunOutcome {
            start_time: Some(start),
            end_time: Some(start + Duration::seconds(elapsed_secs)),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_latency_missing_timing_is_indeterminate() {
        let result = LatencyEvaluator
            .evaluate(&RunOutcome::default(), &Expectation::default())
            .await;
        assert_eq!(result.score, 0.5);
        assert!(result.comment.contains("No timing data"));

        let partial = RunOutcome {
            start_time: Some(Utc::now()),
            ..Default::default()
        };
        let result = LatencyEvaluator
            .evaluate(&partial, &Expectation::default())
            .await;
        assert_eq!(result.score, 0.5);
    }

    #[tokio::test]
    async fn test_latency_instant_run_scores_one() {
        let result = LatencyEvaluator
            .evaluate(&timed_run(0), &Expectation::default())
            .await;
        assert_eq!(result.score, 1.0);
    }

    #[tokio::test]
    async fn test_latency_saturates_at_zero() {
        let result = LatencyEvaluator
            .evaluate(&timed_run(3600), &Expectation::default())
            .await;
        assert_eq!(result.score, 0.0);
    }

    #[tokio::test]
    async fn test_latency_threshold_override() {
        let expected = Expectation {
            max_latency_seconds: Some(10.0),
            ..Default::default()
        };
        let result = LatencyEvaluator.evaluate(&timed_run(5), &expected).await;
        assert!((result.score - 0.5).abs() < 1e-9);
        assert!(result.comment.contains("threshold: 10"));
    }

    #[tokio::test]
    async fn test_token_efficiency_missing_data_is_indeterminate() {
        let result = TokenEfficiencyEvaluator
            .evaluate(&RunOutcome::default(), &Expectation::default())
            .await;
        assert_eq!(result.score, 0.5);
        assert!(result.comment.contains("No token data"));
    }

    #[tokio::test]
    async fn test_token_efficiency_under_budget() {
        let run = RunOutcome {
            extra: Some(json!({"token_usage": {"total_tokens": 1500}})),
            ..Default::default()
        };
        let result = TokenEfficiencyEvaluator
            .evaluate(&run, &Expectation::default())
            .await;
        assert!((result.score - 0.85).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_token_efficiency_over_budget_saturates() {
        let run = RunOutcome {
            extra: Some(json!({"token_usage": {"total_tokens": 50_000}})),
            ..Default::default()
        };
        let expected = Expectation {
            max_tokens: Some(2000.0),
            ..Default::default()
        };
        let result = TokenEfficiencyEvaluator.evaluate(&run, &expected).await;
        assert_eq!(result.score, 0.0);
    }
}
