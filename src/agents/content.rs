use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::gateway::{complete_within, CompletionRequest, LlmError, LlmGateway};
use super::prompts;

pub const RESPONSE_FALLBACK: &str = "Thank you for taking the time to share your feedback. \
We appreciate it and will use it to keep improving.";

pub const SUMMARY_FALLBACK: &str = "Unable to generate summary.";

pub const ACTIONS_FALLBACK: &str =
    "- Review this feedback internally and follow up with the customer if needed";

/// Writes the reply, summary and action list for a review.
///
/// Each operation makes one provider call and degrades to its own fallback
/// text; a failure in one never affects the others.
pub struct ContentGenerator {
    gateway: Arc<dyn LlmGateway>,
    timeout: Duration,
}

impl ContentGenerator {
    pub fn new(gateway: Arc<dyn LlmGateway>, timeout: Duration) -> Self {
        Self { gateway, timeout }
    }

    pub async fn generate_response(&self, rating: i64, review_text: &str) -> String {
        let outcome = self
            .call("response", &prompts::user_response(rating, review_text))
            .await
            .and_then(|text| at_least(text, 21));
        or_fallback("response", outcome, RESPONSE_FALLBACK)
    }

    pub async fn generate_summary(&self, rating: i64, review_text: &str) -> String {
        let outcome = self
            .call("summary", &prompts::summary(rating, review_text))
            .await
            .and_then(|text| first_sentence(&text))
            .and_then(|text| at_least(text, 11));
        or_fallback("summary", outcome, SUMMARY_FALLBACK)
    }

    pub async fn generate_actions(&self, rating: i64, review_text: &str) -> String {
        let outcome = self
            .call("actions", &prompts::recommended_actions(rating, review_text))
            .await
            .map(|text| action_lines(&text))
            .and_then(|text| at_least(text, 1));
        or_fallback("actions", outcome, ACTIONS_FALLBACK)
    }

    async fn call(&self, task: &str, request: &CompletionRequest) -> Result<String, LlmError> {
        info!(task, "Generating content");
        complete_within(self.gateway.as_ref(), request, self.timeout).await
    }
}

fn or_fallback(task: &str, outcome: Result<String, LlmError>, fallback: &str) -> String {
    match outcome {
        Ok(text) => {
            info!(task, length = text.len(), "Content generated");
            text
        }
        Err(e) => {
            warn!(task, error = %e, "Content generation failed, using fallback");
            fallback.to_string()
        }
    }
}

fn at_least(text: String, min_chars: usize) -> Result<String, LlmError> {
    if text.chars().count() < min_chars {
        Err(LlmError::Malformed(format!("Reply too short: {:?}", text)))
    } else {
        Ok(text)
    }
}

/// First sentence of the first non-blank line.
fn first_sentence(text: &str) -> Result<String, LlmError> {
    let line = text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| LlmError::Malformed("Empty summary".to_string()))?;

    let mut chars = line.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let at_boundary = chars.peek().map_or(true, |(_, next)| next.is_whitespace());
        if matches!(c, '.' | '!' | '?') && at_boundary {
            return Ok(line[..i + c.len_utf8()].to_string());
        }
    }
    Ok(line.to_string())
}

/// Normalises a list reply to one trimmed item per line.
fn action_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
