//! Judge client adapter
//!
//! Sends a scoring prompt to a chat model and parses the structured verdict
//! the judged evaluators consume. Transport and parse failures surface as
//! errors here; the evaluators downgrade them to the indeterminate sentinel.

use std::sync::Arc;

use anyhow::{Context, Result};
use llm::ChatModel;
use serde::Deserialize;

/// A parsed judge answer.
///
/// The `score` scale is check-specific: quality and relevance prompts ask for
/// 1-5, the consistency prompt for 0.0-1.0. Missing fields are left for the
/// calling evaluator to interpret.
#[derive(Debug, Clone, Deserialize)]
pub struct Verdict {
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub mismatch_found: Option<bool>,
}

/// Judge over an injected chat model.
pub struct Judge {
    model: Arc<dyn ChatModel>,
}

impl Judge {
    /// Create a new judge with the given chat model
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Send a scoring prompt and parse the verdict
    pub async fn score(&self, prompt: &str) -> Result<Verdict> {
        let response = self
            .model
            .complete(JUDGE_SYSTEM_PROMPT, prompt)
            .await
            .context("Judge completion failed")?;

        let verdict: Verdict = serde_json::from_str(extract_json(&response))
            .with_context(|| format!("Failed to parse judge verdict: {}", response))?;

        Ok(verdict)
    }
}

/// Extract JSON from a response that may be wrapped in markdown code blocks
fn extract_json(response: &str) -> &str {
    let trimmed = response.trim();

    if let Some(start) = trimmed.find("```") {
        let after_start = &trimmed[start + 3..];
        let json_start = if after_start.starts_with("json") {
            after_start.find('\n').map(|i| i + 1).unwrap_or(0)
        } else if after_start.starts_with('\n') {
            1
        } else {
            0
        };
        let content = &after_start[json_start..];
        if let Some(end) = content.find("```") {
            return content[..end].trim();
        }
    }

    trimmed
}

const JUDGE_SYSTEM_PROMPT: &str = r#"You are an evaluation judge scoring the output of an automated agent against the instructions in the prompt.

Follow the scale the prompt defines. Be strict but fair: an empty or evasive output scores at the bottom of the scale.

Respond with JSON only, containing at least a numeric "score" field and a brief "reasoning" string."#;

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct CannedModel(String);

    #[async_trait]
    impl ChatModel for CannedModel {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    struct FailingModel;

    #[async_trait]
    impl ChatModel for FailingModel {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
            anyhow::bail!("judge offline")
        }
    }

    #[test]
    fn test_extract_json_fenced() {
        let input = "```json\n{\"score\": 4, \"reasoning\": \"solid\"}\n```";
        let json = extract_json(input);
        assert!(json.starts_with('{'));
        assert!(json.ends_with('}'));
    }

    #[test]
    fn test_extract_json_bare() {
        let input = "  {\"score\": 2}  ";
        assert_eq!(extract_json(input), "{\"score\": 2}");
    }

    #[tokio::test]
    async fn test_score_parses_verdict() {
        let judge = Judge::new(Arc::new(CannedModel(
            "{\"score\": 4, \"reasoning\": \"mostly complete\"}".to_string(),
        )));
        let verdict = judge.score("rate this").await.unwrap();
        assert_eq!(verdict.score, Some(4.0));
        assert_eq!(verdict.reasoning, "mostly complete");
        assert!(verdict.mismatch_found.is_none());
    }

    #[tokio::test]
    async fn test_score_missing_fields_default() {
        let judge = Judge::new(Arc::new(CannedModel("{}".to_string())));
        let verdict = judge.score("rate this").await.unwrap();
        assert!(verdict.score.is_none());
        assert!(verdict.reasoning.is_empty());
    }

    #[tokio::test]
    async fn test_score_transport_failure() {
        let judge = Judge::new(Arc::new(FailingModel));
        let err = judge.score("rate this").await.unwrap_err();
        assert!(format!("{err:#}").contains("judge offline"));
    }

    #[tokio::test]
    async fn test_score_unparseable_reply() {
        let judge = Judge::new(Arc::new(CannedModel("I refuse to answer".to_string())));
        assert!(judge.score("rate this").await.is_err());
    }
}
