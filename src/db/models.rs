use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    pub rating: i64,
    pub review_text: String,
    pub predicted_rating: Option<i64>,
    pub prediction_explanation: Option<String>,
    pub ai_response: String,
    pub ai_summary: String,
    pub ai_recommended_actions: String,
    pub created_at: DateTime<Utc>,
}

/// Everything but the store-assigned `id` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub rating: i64,
    pub review_text: String,
    pub predicted_rating: Option<i64>,
    pub prediction_explanation: Option<String>,
    pub ai_response: String,
    pub ai_summary: String,
    pub ai_recommended_actions: String,
}

/// Submission count per user-given rating; always holds keys 1 through 5.
/// Serializes as `{"1": n, ..., "5": n}`.
pub type RatingCounts = BTreeMap<i64, i64>;
