//! Model-judged evaluators
//!
//! Each check builds a bounded-length prompt around the run's main text and a
//! rubric, asks the judge, and normalizes the verdict into [0, 1]. Judge-side
//! failures never escape: they become the indeterminate sentinel with the
//! failure folded into the comment. A run with no output at all scores 0.0,
//! a harder failure than a judge error.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::dataset::Expectation;
use crate::judge::Judge;
use crate::run::RunOutcome;

use super::{truncate_chars, EvalResult, Evaluator};

/// Character budget for quality and consistency prompts.
const REPORT_PROMPT_BUDGET: usize = 3000;
/// Character budget for the relevance prompt.
const RELEVANCE_PROMPT_BUDGET: usize = 2000;
/// Character budget for serialized inputs used as a fallback query.
const QUERY_FALLBACK_BUDGET: usize = 500;

fn input_str<'a>(run: &'a RunOutcome, field: &str) -> Option<&'a str> {
    run.inputs
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Judges overall output quality on a 1-5 rubric.
pub struct QualityEvaluator {
    judge: Arc<Judge>,
}

impl QualityEvaluator {
    pub fn new(judge: Arc<Judge>) -> Self {
        Self { judge }
    }
}

#[async_trait]
impl Evaluator for QualityEvaluator {
    fn key(&self) -> &'static str {
        "quality"
    }

    async fn evaluate(&self, run: &RunOutcome, _expected: &Expectation) -> EvalResult {
        let Some(response) = run.main_text() else {
            return EvalResult::new(self.key(), 0.0, "No output to evaluate");
        };

        let prompt = format!(
            r#"Evaluate this output on a scale of 1-5.

Output to evaluate:
{}

Rubric:
- 5: Excellent - comprehensive, accurate, well-structured
- 4: Good - mostly complete, minor issues
- 3: Adequate - basic but acceptable
- 2: Poor - significant issues
- 1: Failing - incorrect or unusable

Return JSON: {{"score": 1-5, "reasoning": "brief explanation"}}"#,
            truncate_chars(response, REPORT_PROMPT_BUDGET)
        );

        match self.judge.score(&prompt).await {
            Ok(verdict) => match verdict.score {
                Some(score) => EvalResult::new(self.key(), score / 5.0, verdict.reasoning),
                None => EvalResult::indeterminate(
                    self.key(),
                    "Judge error: verdict missing score field",
                ),
            },
            Err(e) => EvalResult::indeterminate(self.key(), format!("Judge error: {:#}", e)),
        }
    }
}

/// Judges whether the output addresses the query, on a 1-5 rubric.
pub struct RelevanceEvaluator {
    judge: Arc<Judge>,
}

impl RelevanceEvaluator {
    pub fn new(judge: Arc<Judge>) -> Self {
        Self { judge }
    }
}

#[async_trait]
impl Evaluator for RelevanceEvaluator {
    fn key(&self) -> &'static str {
        "relevance"
    }

    async fn evaluate(&self, run: &RunOutcome, _expected: &Expectation) -> EvalResult {
        let Some(response) = run.main_text() else {
            return EvalResult::new(self.key(), 0.0, "No output to evaluate");
        };

        let fallback;
        let query = match input_str(run, "query").or_else(|| input_str(run, "target")) {
            Some(q) => q,
            None => {
                fallback = serde_json::to_string(&run.inputs).unwrap_or_default();
                truncate_chars(&fallback, QUERY_FALLBACK_BUDGET)
            }
        };

        let prompt = format!(
            r#"Is this response relevant to the query?

Query: {}
Response: {}

Score 1-5:
- 5: Directly addresses the query
- 3: Partially relevant
- 1: Off-topic or irrelevant

Return JSON: {{"score": 1-5, "reasoning": "brief explanation"}}"#,
            query,
            truncate_chars(response, RELEVANCE_PROMPT_BUDGET)
        );

        match self.judge.score(&prompt).await {
            Ok(verdict) => match verdict.score {
                Some(score) => EvalResult::new(self.key(), score / 5.0, verdict.reasoning),
                None => EvalResult::indeterminate(
                    self.key(),
                    "Judge error: verdict missing score field",
                ),
            },
            Err(e) => EvalResult::indeterminate(self.key(), format!("Judge error: {:#}", e)),
        }
    }
}

/// Judges whether the report's conclusions match the claimed input entity.
///
/// Catches silent reconciliation: when the gathered evidence points to a
/// different entity than the input claimed, a passing report must either
/// confirm the claim or explicitly flag the discrepancy. Quietly rationalizing
/// the mismatch scores near 0.
pub struct ConsistencyEvaluator {
    judge: Arc<Judge>,
}

impl ConsistencyEvaluator {
    pub fn new(judge: Arc<Judge>) -> Self {
        Self { judge }
    }
}

#[async_trait]
impl Evaluator for ConsistencyEvaluator {
    fn key(&self) -> &'static str {
        "input_data_consistency"
    }

    async fn evaluate(&self, run: &RunOutcome, _expected: &Expectation) -> EvalResult {
        let target = input_str(run, "linkedin_url")
            .or_else(|| input_str(run, "target"))
            .unwrap_or("");
        let company = input_str(run, "company_name")
            .or_else(|| input_str(run, "company"))
            .unwrap_or("");
        let report = run.main_text().unwrap_or("");

        // Nothing to cross-check without both sides of the claim.
        if report.is_empty() || company.is_empty() {
            return EvalResult::new(self.key(), 1.0, "No company/report to verify");
        }

        let prompt = format!(
            r#"Analyze this research report for input-data consistency.

USER INPUT:
- Target: {target}
- Company claimed: {company}

REPORT:
{report}

QUESTIONS:
1. Does the report confirm the person actually works at "{company}"?
2. If the source data shows a DIFFERENT company, did the agent:
   a) Explicitly flag the mismatch? (GOOD)
   b) Silently reconcile by finding tangential connections? (BAD)
   c) Ignore the mismatch entirely? (BAD)

SCORING:
- 1.0: Data matches OR agent explicitly flagged mismatch
- 0.5: Minor discrepancy, agent partially addressed
- 0.0: Major mismatch silently reconciled (hallucination risk)

Return JSON: {{"score": 0.0-1.0, "mismatch_found": true/false, "reasoning": "explanation"}}"#,
            target = target,
            company = company,
            report = truncate_chars(report, REPORT_PROMPT_BUDGET),
        );

        match self.judge.score(&prompt).await {
            Ok(verdict) => {
                let score = verdict.score.unwrap_or(0.5);
                let mismatch = verdict
                    .mismatch_found
                    .map_or("unknown".to_string(), |m| m.to_string());
                EvalResult::new(
                    self.key(),
                    score,
                    format!("Mismatch: {} - {}", mismatch, verdict.reasoning),
                )
            }
            Err(e) => EvalResult::indeterminate(self.key(), format!("Judge error: {:#}", e)),
        }
    }
}
