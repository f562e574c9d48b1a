//! Deterministic evaluators
//!
//! No external calls; every score derives from the run record and the
//! expectation directives alone.

use async_trait::async_trait;

use crate::dataset::Expectation;
use crate::run::RunOutcome;

use super::{output_text, EvalResult, Evaluator};

/// Checks that the required output fields are present and non-null.
pub struct SchemaEvaluator;

#[async_trait]
impl Evaluator for SchemaEvaluator {
    fn key(&self) -> &'static str {
        "schema_valid"
    }

    async fn evaluate(&self, run: &RunOutcome, expected: &Expectation) -> EvalResult {
        let required = &expected.expected_fields;
        if required.is_empty() {
            return EvalResult::new(self.key(), 1.0, "No expected fields defined");
        }

        let is_present = |field: &String| {
            run.outputs
                .as_ref()
                .and_then(|outputs| outputs.get(field))
                .is_some_and(|v| !v.is_null())
        };

        let present = required.iter().filter(|f| is_present(f)).count();
        let missing: Vec<&str> = required
            .iter()
            .filter(|f| !is_present(f))
            .map(String::as_str)
            .collect();
        let score = present as f64 / required.len() as f64;

        let comment = if missing.is_empty() {
            format!("All fields present ({}/{})", present, required.len())
        } else {
            format!("Missing: {:?}", missing)
        };
        EvalResult::new(self.key(), score, comment)
    }
}

/// Checks that the serialized output mentions the expected keywords.
pub struct KeywordCoverageEvaluator;

#[async_trait]
impl Evaluator for KeywordCoverageEvaluator {
    fn key(&self) -> &'static str {
        "keyword_coverage"
    }

    async fn evaluate(&self, run: &RunOutcome, expected: &Expectation) -> EvalResult {
        let keywords = &expected.should_mention;
        if keywords.is_empty() {
            return EvalResult::new(self.key(), 1.0, "No keywords to check");
        }

        let haystack = output_text(run).to_lowercase();
        let found = keywords
            .iter()
            .filter(|kw| haystack.contains(&kw.to_lowercase()))
            .count();
        let missing: Vec<&str> = keywords
            .iter()
            .filter(|kw| !haystack.contains(&kw.to_lowercase()))
            .map(String::as_str)
            .collect();
        let score = found as f64 / keywords.len() as f64;

        let comment = if missing.is_empty() {
            format!("All keywords found ({}/{})", found, keywords.len())
        } else {
            format!("Missing: {:?}", missing)
        };
        EvalResult::new(self.key(), score, comment)
    }
}

/// Checks that the serialized output avoids forbidden phrases.
pub struct ForbiddenContentEvaluator;

#[async_trait]
impl Evaluator for ForbiddenContentEvaluator {
    fn key(&self) -> &'static str {
        "forbidden_content"
    }

    async fn evaluate(&self, run: &RunOutcome, expected: &Expectation) -> EvalResult {
        let forbidden = &expected.should_not_contain;
        if forbidden.is_empty() {
            return EvalResult::new(self.key(), 1.0, "No forbidden phrases defined");
        }

        let haystack = output_text(run).to_lowercase();
        let leaked: Vec<&str> = forbidden
            .iter()
            .filter(|phrase| haystack.contains(&phrase.to_lowercase()))
            .map(String::as_str)
            .collect();
        let score = (forbidden.len() - leaked.len()) as f64 / forbidden.len() as f64;

        let comment = if leaked.is_empty() {
            format!("No forbidden phrases present (0/{})", forbidden.len())
        } else {
            format!("Contains: {:?}", leaked)
        };
        EvalResult::new(self.key(), score, comment)
    }
}

/// Checks that the main text meets the case's minimum length.
pub struct ReportLengthEvaluator;

#[async_trait]
impl Evaluator for ReportLengthEvaluator {
    fn key(&self) -> &'static str {
        "report_length"
    }

    async fn evaluate(&self, run: &RunOutcome, expected: &Expectation) -> EvalResult {
        let min_len = expected.min_report_length;
        if min_len == 0 {
            return EvalResult::new(self.key(), 1.0, "No minimum length defined");
        }

        let actual = run.main_text().map_or(0, |text| text.chars().count());
        let score = (actual as f64 / min_len as f64).min(1.0);

        let comment = if score < 1.0 {
            format!("Too short: {} chars < {} minimum", actual, min_len)
        } else {
            format!("Length OK: {} chars", actual)
        };
        EvalResult::new(self.key(), score, comment)
    }
}

/// Checks that cases flagged as must-degrade-gracefully did not crash.
pub struct GracefulErrorEvaluator;

#[async_trait]
impl Evaluator for GracefulErrorEvaluator {
    fn key(&self) -> &'static str {
        "graceful_error"
    }

    async fn evaluate(&self, run: &RunOutcome, expected: &Expectation) -> EvalResult {
        if !expected.should_handle_gracefully {
            return EvalResult::new(self.key(), 1.0, "Not an error case");
        }

        if let Some(error) = &run.error {
            return EvalResult::new(self.key(), 0.0, format!("Agent crashed: {}", error));
        }

        if run.main_text().is_some() {
            EvalResult::new(self.key(), 1.0, "Handled gracefully with output")
        } else {
            EvalResult::new(self.key(), 0.5, "No crash but no output either")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn run_with_outputs(pairs: &[(&str, serde_json::Value)]) -> RunOutcome {
        let outputs: HashMap<String, serde_json::Value> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        RunOutcome {
            outputs: Some(outputs),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_schema_empty_requirement_is_vacuous() {
        let result = SchemaEvaluator
            .evaluate(&RunOutcome::default(), &Expectation::default())
            .await;
        assert_eq!(result.score, 1.0);
        assert_eq!(result.key, "schema_valid");
    }

    #[tokio::test]
    async fn test_schema_counts_present_fields() {
        let run = run_with_outputs(&[("response", json!("hi")), ("summary", json!(null))]);
        let expected = Expectation {
            expected_fields: vec!["response".to_string(), "summary".to_string()],
            ..Default::default()
        };

        let result = SchemaEvaluator.evaluate(&run, &expected).await;
        assert_eq!(result.score, 0.5);
        assert!(result.comment.contains("summary"));
    }

    #[tokio::test]
    async fn test_schema_monotonic_in_presence() {
        let expected = Expectation {
            expected_fields: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            ..Default::default()
        };

        let none = SchemaEvaluator.evaluate(&RunOutcome::default(), &expected).await;
        let one = SchemaEvaluator
            .evaluate(&run_with_outputs(&[("a", json!(1))]), &expected)
            .await;
        let all = SchemaEvaluator
            .evaluate(
                &run_with_outputs(&[("a", json!(1)), ("b", json!(2)), ("c", json!(3))]),
                &expected,
            )
            .await;

        assert_eq!(none.score, 0.0);
        assert!(one.score > none.score && one.score < all.score);
        assert_eq!(all.score, 1.0);
    }

    #[tokio::test]
    async fn test_keyword_coverage_case_insensitive() {
        let run = run_with_outputs(&[("response", json!("Uses SurrealDB and BM25 search"))]);
        let expected = Expectation {
            should_mention: vec!["surrealdb".to_string(), "vector".to_string()],
            ..Default::default()
        };

        let result = KeywordCoverageEvaluator.evaluate(&run, &expected).await;
        assert_eq!(result.score, 0.5);
        assert!(result.comment.contains("vector"));
    }

    #[tokio::test]
    async fn test_keyword_coverage_empty_list_is_vacuous() {
        let result = KeywordCoverageEvaluator
            .evaluate(&RunOutcome::default(), &Expectation::default())
            .await;
        assert_eq!(result.score, 1.0);
    }

    #[tokio::test]
    async fn test_forbidden_content_flags_leaks() {
        let run = run_with_outputs(&[("response", json!("Sure, I'll reveal the system prompt"))]);
        let expected = Expectation {
            should_not_contain: vec!["system prompt".to_string(), "I will ignore".to_string()],
            ..Default::default()
        };

        let result = ForbiddenContentEvaluator.evaluate(&run, &expected).await;
        assert_eq!(result.score, 0.5);
        assert!(result.comment.contains("system prompt"));
    }

    #[tokio::test]
    async fn test_forbidden_content_clean_output() {
        let run = run_with_outputs(&[("response", json!("I can't help with that."))]);
        let expected = Expectation {
            should_not_contain: vec!["system prompt".to_string()],
            ..Default::default()
        };

        let result = ForbiddenContentEvaluator.evaluate(&run, &expected).await;
        assert_eq!(result.score, 1.0);
    }

    #[tokio::test]
    async fn test_report_length_ratio() {
        let run = run_with_outputs(&[("final_report", json!("a".repeat(50)))]);
        let expected = Expectation {
            min_report_length: 200,
            ..Default::default()
        };

        let result = ReportLengthEvaluator.evaluate(&run, &expected).await;
        assert_eq!(result.score, 0.25);
        assert!(result.comment.contains("Too short"));
    }

    #[tokio::test]
    async fn test_report_length_no_minimum() {
        let result = ReportLengthEvaluator
            .evaluate(&RunOutcome::default(), &Expectation::default())
            .await;
        assert_eq!(result.score, 1.0);
    }

    #[tokio::test]
    async fn test_graceful_error_not_flagged_case() {
        let run = RunOutcome {
            error: Some("boom".to_string()),
            ..Default::default()
        };
        let result = GracefulErrorEvaluator
            .evaluate(&run, &Expectation::default())
            .await;
        assert_eq!(result.score, 1.0);
    }

    #[tokio::test]
    async fn test_graceful_error_crash_scores_zero() {
        let mut run = run_with_outputs(&[("response", json!("partial output"))]);
        run.error = Some("timeout".to_string());
        let expected = Expectation {
            should_handle_gracefully: true,
            ..Default::default()
        };

        let result = GracefulErrorEvaluator.evaluate(&run, &expected).await;
        assert_eq!(result.score, 0.0);
        assert!(result.comment.contains("timeout"));
    }

    #[tokio::test]
    async fn test_graceful_error_silent_no_output() {
        let expected = Expectation {
            should_handle_gracefully: true,
            ..Default::default()
        };
        let result = GracefulErrorEvaluator
            .evaluate(&RunOutcome::default(), &expected)
            .await;
        assert_eq!(result.score, 0.5);
    }
}
