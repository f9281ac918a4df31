use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use chrono::Utc;
use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};

use super::error::ApiError;
use crate::db::{self, RatingCounts, StorageError, Submission};
use crate::state::AppState;

pub const MAX_REVIEW_CHARS: usize = 5000;

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    rating: i64,
    review_text: String,
}

#[derive(Debug, Serialize)]
pub struct SubmissionList {
    submissions: Vec<Submission>,
    total: usize,
    by_rating: RatingCounts,
}

/// Checks the request and returns the rating and the trimmed review text.
pub fn validate(request: &SubmitRequest) -> Result<(i64, String), ApiError> {
    if !(1..=5).contains(&request.rating) {
        return Err(ApiError::Validation(
            "rating must be an integer between 1 and 5".to_string(),
        ));
    }

    if request.review_text.chars().count() > MAX_REVIEW_CHARS {
        return Err(ApiError::Validation(format!(
            "review_text must be at most {} characters",
            MAX_REVIEW_CHARS
        )));
    }

    let review_text = request.review_text.trim();
    if review_text.is_empty() {
        return Err(ApiError::Validation(
            "review_text cannot be empty".to_string(),
        ));
    }

    Ok((request.rating, review_text.to_string()))
}

pub async fn submit(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> Result<Json<Submission>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;
    let (rating, review_text) = validate(&request).map_err(|e| {
        tracing::info!(reason = %e, "Rejected submission");
        e
    })?;

    let service = state.service.clone();
    let submission = tokio::spawn(async move { service.submit(rating, &review_text).await })
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(ApiError::save_failed)?;

    Ok(Json(submission))
}

pub async fn list_submissions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SubmissionList>, ApiError> {
    // One read transaction so `total` and `by_rating` describe the same rows.
    let load = async {
        let mut tx = state.pool.begin().await?;
        let submissions = db::list_submissions(&mut *tx).await?;
        let by_rating = db::count_by_rating(&mut *tx).await?;
        tx.commit().await?;
        Ok::<_, StorageError>((submissions, by_rating))
    };
    let (submissions, by_rating) = load.await.map_err(ApiError::load_failed)?;

    tracing::info!("Retrieved {} submissions", submissions.len());

    Ok(Json(SubmissionList {
        total: submissions.len(),
        submissions,
        by_rating,
    }))
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database = match db::ping(&state.pool).await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::error!(error = %e, "Health check could not reach the database");
            "error"
        }
    };

    let (status_code, status) = if database == "ok" {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };

    let api_key = if state.config.llm_api_key.is_empty() {
        "missing"
    } else {
        "configured"
    };

    (
        status_code,
        Json(json!({
            "status": status,
            "timestamp": Utc::now().to_rfc3339(),
            "database": database,
            "api_key": api_key,
        })),
    )
}

/// Pushes each newly stored submission as a `submission` event.
pub async fn stream_submissions(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.service.subscribe();

    let connected =
        stream::once(async { Ok::<_, Infallible>(Event::default().event("connected").data("ok")) });

    let events = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(submission) => Event::default()
                .event("submission")
                .json_data(&submission)
                .ok()
                .map(Ok),
            Err(BroadcastStreamRecvError::Lagged(missed)) => Event::default()
                .event("lagged")
                .json_data(json!({ "missed": missed }))
                .ok()
                .map(Ok),
        }
    });

    Sse::new(connected.chain(events)).keep_alive(KeepAlive::default())
}

/// Runs the generators on a canned review to check the provider end to end.
pub async fn test_ai(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let review = "The food was amazing and service was excellent!";
    tracing::info!("Running AI self-test");

    let generator = state.service.generator();
    let (summary, response) = tokio::join!(
        generator.generate_summary(5, review),
        generator.generate_response(5, review),
    );

    Json(json!({
        "status": "success",
        "summary": summary,
        "response": response,
        "api_key_present": !state.config.llm_api_key.is_empty(),
    }))
}

pub async fn index() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Feedback Desk API",
        "endpoints": {
            "submit": "/api/submit",
            "submissions": "/api/submissions",
            "stream": "/api/submissions/stream",
            "health": "/api/health",
            "test_ai": "/api/test-ai",
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(rating: i64, review_text: &str) -> SubmitRequest {
        SubmitRequest {
            rating,
            review_text: review_text.to_string(),
        }
    }

    #[test]
    fn test_rating_bounds() {
        assert!(validate(&request(1, "ok")).is_ok());
        assert!(validate(&request(5, "ok")).is_ok());
        assert!(matches!(validate(&request(0, "ok")), Err(ApiError::Validation(_))));
        assert!(matches!(validate(&request(6, "ok")), Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_review_length_bounds_count_characters() {
        assert!(validate(&request(3, &"a".repeat(5000))).is_ok());
        assert!(validate(&request(3, &"é".repeat(5000))).is_ok());

        let err = validate(&request(3, &"a".repeat(5001))).unwrap_err();
        assert!(err.to_string().contains("5000"));
    }

    #[test]
    fn test_blank_review_is_rejected_and_text_is_trimmed() {
        assert!(validate(&request(3, "")).is_err());
        assert!(validate(&request(3, " \n\t ")).is_err());

        let (_, text) = validate(&request(3, "  Lovely patio \n")).unwrap();
        assert_eq!(text, "Lovely patio");
    }
}
