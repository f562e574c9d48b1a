//! Evaluator execution glue
//!
//! Applies a set of evaluators to one recorded run, sequentially, and folds
//! the results into the [`FeedbackStats`] the comparator consumes.

use std::collections::BTreeMap;

use tracing::debug;

use crate::dataset::Expectation;
use crate::evaluators::{EvalResult, Evaluator};
use crate::run::{FeedbackStats, MetricStats, RunOutcome};

/// Score one run with every evaluator in the set, in order.
///
/// Evaluators are independent and total; the loop never short-circuits.
pub async fn evaluate_run(
    evaluators: &[Box<dyn Evaluator>],
    run: &RunOutcome,
    expected: &Expectation,
) -> Vec<EvalResult> {
    let mut results = Vec::with_capacity(evaluators.len());
    for evaluator in evaluators {
        let result = evaluator.evaluate(run, expected).await;
        debug!(key = %result.key, score = result.score, "evaluated");
        results.push(result);
    }
    results
}

/// Fold evaluator results into per-metric feedback statistics.
pub fn feedback_stats(results: &[EvalResult]) -> FeedbackStats {
    let mut samples: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for result in results {
        samples
            .entry(result.key.clone())
            .or_default()
            .push(result.score);
    }

    samples
        .into_iter()
        .map(|(key, scores)| {
            let avg = scores.iter().sum::<f64>() / scores.len() as f64;
            (
                key,
                MetricStats {
                    avg,
                    n: scores.len(),
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluators::automated_evaluators;
    use serde_json::json;
    use std::collections::HashMap;

    #[tokio::test]
    async fn test_evaluate_run_covers_every_evaluator() {
        let mut outputs = HashMap::new();
        outputs.insert("response".to_string(), json!("a perfectly fine answer"));
        let run = RunOutcome {
            outputs: Some(outputs),
            ..Default::default()
        };

        let evaluators = automated_evaluators();
        let results = evaluate_run(&evaluators, &run, &Expectation::default()).await;

        assert_eq!(results.len(), evaluators.len());
        // With no directives set, every deterministic check is vacuous.
        assert!(results.iter().all(|r| r.score == 1.0));
    }

    #[test]
    fn test_feedback_stats_fold() {
        let results = vec![
            EvalResult::new("schema_valid", 1.0, ""),
            EvalResult::new("keyword_coverage", 0.5, ""),
            EvalResult::new("keyword_coverage", 1.0, ""),
        ];

        let stats = feedback_stats(&results);
        assert_eq!(stats["schema_valid"].avg, 1.0);
        assert_eq!(stats["schema_valid"].n, 1);
        assert_eq!(stats["keyword_coverage"].avg, 0.75);
        assert_eq!(stats["keyword_coverage"].n, 2);
    }

    #[test]
    fn test_feedback_stats_empty() {
        assert!(feedback_stats(&[]).is_empty());
    }
}
