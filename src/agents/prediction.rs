use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{error, info, warn};

use super::gateway::{complete_within, LlmError, LlmGateway};
use super::prompts;

/// A star rating inferred from review text, with its one-sentence rationale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prediction {
    pub rating: i64,
    pub explanation: String,
}

#[derive(Debug, Deserialize)]
struct RawPrediction {
    predicted_stars: Value,
    explanation: Value,
}

/// Predicts a star rating with a bounded number of attempts.
pub struct RatingPredictor {
    gateway: Arc<dyn LlmGateway>,
    timeout: Duration,
    max_attempts: u32,
    retry_delay: Duration,
}

impl RatingPredictor {
    pub fn new(gateway: Arc<dyn LlmGateway>, timeout: Duration, max_attempts: u32) -> Self {
        Self {
            gateway,
            timeout,
            max_attempts: max_attempts.max(1),
            retry_delay: Duration::from_secs(1),
        }
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Returns `None` once every attempt has failed; errors never escape.
    pub async fn predict(&self, review_text: &str) -> Option<Prediction> {
        let request = prompts::rating_prediction(review_text);

        for attempt in 1..=self.max_attempts {
            info!(attempt, max_attempts = self.max_attempts, "Predicting rating");

            let outcome = complete_within(self.gateway.as_ref(), &request, self.timeout)
                .await
                .and_then(|text| parse_prediction(&text));

            match outcome {
                Ok(prediction) => {
                    info!(attempt, predicted = prediction.rating, "Rating predicted");
                    return Some(prediction);
                }
                Err(e) => {
                    warn!(attempt, max_attempts = self.max_attempts, error = %e, "Rating prediction attempt failed");
                    if attempt < self.max_attempts && !self.retry_delay.is_zero() {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        error!("Rating prediction failed after {} attempts", self.max_attempts);
        None
    }
}

fn json_object() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("valid JSON object pattern"))
}

/// Parses a `{"predicted_stars", "explanation"}` reply, tolerating code fences
/// and chatter around the object.
pub fn parse_prediction(raw: &str) -> Result<Prediction, LlmError> {
    let object = json_object()
        .find(raw)
        .map(|m| m.as_str())
        .ok_or_else(|| LlmError::Malformed("No JSON object in reply".to_string()))?;

    let parsed: RawPrediction =
        serde_json::from_str(object).map_err(|e| LlmError::Malformed(e.to_string()))?;

    let rating = stars_value(&parsed.predicted_stars).ok_or_else(|| {
        LlmError::Malformed(format!("Unusable predicted_stars: {}", parsed.predicted_stars))
    })?;
    if !(1..=5).contains(&rating) {
        return Err(LlmError::Malformed(format!(
            "predicted_stars out of range: {}",
            rating
        )));
    }

    let explanation = parsed
        .explanation
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| LlmError::Malformed("Missing explanation".to_string()))?;

    Ok(Prediction {
        rating,
        explanation: explanation.to_string(),
    })
}

fn stars_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::testing::ScriptedGateway;

    #[test]
    fn test_parse_plain_json() {
        let p = parse_prediction(r#"{"predicted_stars": 4, "explanation": "Mostly positive."}"#)
            .unwrap();
        assert_eq!(p.rating, 4);
        assert_eq!(p.explanation, "Mostly positive.");
    }

    #[test]
    fn test_parse_fenced_json_and_loose_types() {
        let raw = "```json\n{\"predicted_stars\": \"5\", \"explanation\": \" Loved it. \"}\n```";
        let p = parse_prediction(raw).unwrap();
        assert_eq!(p.rating, 5);
        assert_eq!(p.explanation, "Loved it.");

        let p = parse_prediction(r#"{"predicted_stars": 2.0, "explanation": "Slow."}"#).unwrap();
        assert_eq!(p.rating, 2);
    }

    #[test]
    fn test_parse_rejects_out_of_range_and_garbage() {
        for raw in [
            r#"{"predicted_stars": 0, "explanation": "x"}"#,
            r#"{"predicted_stars": 6, "explanation": "x"}"#,
            r#"{"predicted_stars": 3.5, "explanation": "x"}"#,
            r#"{"predicted_stars": 3, "explanation": ""}"#,
            r#"{"predicted_stars": 3}"#,
            "I think this is four stars",
        ] {
            assert!(
                matches!(parse_prediction(raw), Err(LlmError::Malformed(_))),
                "accepted {}",
                raw
            );
        }
    }

    fn predictor(gateway: Arc<ScriptedGateway>) -> RatingPredictor {
        RatingPredictor::new(gateway, Duration::from_secs(1), 3).with_retry_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_retries_until_valid_reply() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            Err(LlmError::Timeout),
            Ok("not json".to_string()),
            Ok(r#"{"predicted_stars": 5, "explanation": "Glowing."}"#.to_string()),
        ]));

        let prediction = predictor(gateway.clone()).predict("Amazing").await.unwrap();

        assert_eq!(prediction.rating, 5);
        assert_eq!(gateway.calls(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let gateway = Arc::new(ScriptedGateway::failing());

        let prediction = predictor(gateway.clone()).predict("Amazing").await;

        assert!(prediction.is_none());
        assert_eq!(gateway.calls(), 3);
    }

    #[tokio::test]
    async fn test_stops_on_first_success() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Ok(
            r#"{"predicted_stars": 1, "explanation": "Awful."}"#.to_string(),
        )]));

        predictor(gateway.clone()).predict("Awful").await.unwrap();

        assert_eq!(gateway.calls(), 1);
    }
}
