use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::agents::{ContentGenerator, RatingPredictor};
use crate::db::{self, DbPool, NewSubmission, StorageError, Submission};

const FEED_CAPACITY: usize = 64;

/// Turns a validated rating and review into a stored, AI-annotated submission.
pub struct SubmissionService {
    pool: DbPool,
    predictor: RatingPredictor,
    generator: ContentGenerator,
    feed: broadcast::Sender<Submission>,
}

impl SubmissionService {
    pub fn new(pool: DbPool, predictor: RatingPredictor, generator: ContentGenerator) -> Self {
        let (feed, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            pool,
            predictor,
            generator,
            feed,
        }
    }

    /// Expects `rating` in 1..=5 and a non-empty review; the HTTP layer checks both.
    ///
    /// LLM failures only degrade the generated fields. The call fails solely
    /// when the record cannot be written.
    pub async fn submit(&self, rating: i64, review_text: &str) -> Result<Submission, StorageError> {
        info!(rating, review_length = review_text.len(), "Processing submission");

        let (prediction, ai_response, ai_summary, ai_recommended_actions) = tokio::join!(
            self.predictor.predict(review_text),
            self.generator.generate_response(rating, review_text),
            self.generator.generate_summary(rating, review_text),
            self.generator.generate_actions(rating, review_text),
        );

        if prediction.is_none() {
            warn!("Rating prediction unavailable, storing submission without it");
        }

        let (predicted_rating, prediction_explanation) = match prediction {
            Some(p) => (Some(p.rating), Some(p.explanation)),
            None => (None, None),
        };

        let new = NewSubmission {
            rating,
            review_text: review_text.to_string(),
            predicted_rating,
            prediction_explanation,
            ai_response,
            ai_summary,
            ai_recommended_actions,
        };

        let submission = db::insert_submission(&self.pool, &new)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to save submission");
                e
            })?;

        info!(id = submission.id, "Saved submission");

        let _ = self.feed.send(submission.clone());

        Ok(submission)
    }

    /// Receives every submission stored after the call.
    pub fn subscribe(&self) -> broadcast::Receiver<Submission> {
        self.feed.subscribe()
    }

    pub fn generator(&self) -> &ContentGenerator {
        &self.generator
    }

    #[cfg(test)]
    pub fn with_feed_capacity(mut self, capacity: usize) -> Self {
        self.feed = broadcast::channel(capacity).0;
        self
    }
}

pub type SharedService = Arc<SubmissionService>;
