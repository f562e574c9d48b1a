//! Run records consumed by evaluators and the comparator
//!
//! A [`RunOutcome`] is one recorded execution of the system under test against
//! one test case. [`FeedbackStats`] are attached to a stored run after
//! evaluators execute and are the comparator's only input signal.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Output fields checked, in order, when extracting a run's main text.
pub const MAIN_TEXT_FIELDS: [&str; 3] = ["final_report", "output", "response"];

/// One recorded execution of the system under test.
///
/// Produced externally, consumed read-only by evaluators.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Inputs the run was invoked with
    #[serde(default)]
    pub inputs: HashMap<String, Value>,
    /// Outputs the run produced, if any
    #[serde(default)]
    pub outputs: Option<HashMap<String, Value>>,
    /// Error message if the run crashed
    #[serde(default)]
    pub error: Option<String>,
    /// When execution started
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    /// When execution finished
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Run metadata (token usage lives at `token_usage.total_tokens`)
    #[serde(default)]
    pub extra: Option<Value>,
}

impl RunOutcome {
    /// Extract the run's main text output: the first candidate field holding a
    /// non-empty string, in [`MAIN_TEXT_FIELDS`] order.
    pub fn main_text(&self) -> Option<&str> {
        let outputs = self.outputs.as_ref()?;
        MAIN_TEXT_FIELDS.iter().find_map(|field| {
            outputs
                .get(*field)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
        })
    }

    /// Total token count from run metadata.
    ///
    /// A recorded count of zero is treated as "no data", not as a real signal.
    pub fn total_tokens(&self) -> Option<f64> {
        let tokens = self
            .extra
            .as_ref()?
            .get("token_usage")?
            .get("total_tokens")?
            .as_f64()?;
        if tokens > 0.0 {
            Some(tokens)
        } else {
            None
        }
    }

    /// Elapsed wall-clock seconds, when both timestamps were recorded.
    pub fn elapsed_seconds(&self) -> Option<f64> {
        let (start, end) = (self.start_time?, self.end_time?);
        Some((end - start).num_milliseconds() as f64 / 1000.0)
    }
}

/// Summary statistics for one metric on one stored run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricStats {
    /// Average score for this metric on this run
    pub avg: f64,
    /// Number of samples behind the average
    #[serde(default)]
    pub n: usize,
}

/// Per-metric statistics attached to a stored run after evaluators execute.
pub type FeedbackStats = BTreeMap<String, MetricStats>;

/// A run as returned by the storage backend: the outcome plus any feedback
/// statistics attached after evaluation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredRun {
    #[serde(flatten)]
    pub run: RunOutcome,
    /// Name of the test case this run executed, when known
    #[serde(default)]
    pub case: Option<String>,
    /// Per-metric statistics, absent until evaluators have run
    #[serde(default)]
    pub feedback_stats: Option<FeedbackStats>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn outputs(pairs: &[(&str, Value)]) -> Option<HashMap<String, Value>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_main_text_candidate_order() {
        let run = RunOutcome {
            outputs: outputs(&[
                ("response", json!("fallback")),
                ("final_report", json!("the report")),
            ]),
            ..Default::default()
        };
        assert_eq!(run.main_text(), Some("the report"));
    }

    #[test]
    fn test_main_text_skips_empty_fields() {
        let run = RunOutcome {
            outputs: outputs(&[("final_report", json!("")), ("output", json!("text"))]),
            ..Default::default()
        };
        assert_eq!(run.main_text(), Some("text"));
    }

    #[test]
    fn test_main_text_absent_outputs() {
        let run = RunOutcome::default();
        assert_eq!(run.main_text(), None);
    }

    #[test]
    fn test_total_tokens() {
        let run = RunOutcome {
            extra: Some(json!({"token_usage": {"total_tokens": 1500}})),
            ..Default::default()
        };
        assert_eq!(run.total_tokens(), Some(1500.0));
    }

    #[test]
    fn test_total_tokens_zero_is_no_data() {
        let run = RunOutcome {
            extra: Some(json!({"token_usage": {"total_tokens": 0}})),
            ..Default::default()
        };
        assert_eq!(run.total_tokens(), None);

        let run = RunOutcome::default();
        assert_eq!(run.total_tokens(), None);
    }

    #[test]
    fn test_stored_run_roundtrip() {
        let mut stats = FeedbackStats::new();
        stats.insert("accuracy".to_string(), MetricStats { avg: 0.9, n: 1 });
        let stored = StoredRun {
            run: RunOutcome {
                outputs: outputs(&[("response", json!("ok"))]),
                ..Default::default()
            },
            case: Some("happy_path_basic".to_string()),
            feedback_stats: Some(stats),
        };

        let json = serde_json::to_string(&stored).unwrap();
        let back: StoredRun = serde_json::from_str(&json).unwrap();
        assert_eq!(back.case.as_deref(), Some("happy_path_basic"));
        assert_eq!(back.feedback_stats.unwrap()["accuracy"].avg, 0.9);
        assert_eq!(back.run.main_text(), Some("ok"));
    }
}
