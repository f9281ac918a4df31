mod models;

pub use models::*;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::SqliteExecutor;
use std::str::FromStr;
use std::time::Duration;

pub type DbPool = SqlitePool;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

const SUBMISSION_COLUMNS: &str = "id, rating, review_text, predicted_rating, prediction_explanation, \
     ai_response, ai_summary, ai_recommended_actions, created_at";

pub async fn create_pool(database_url: &str) -> Result<DbPool, StorageError> {
    let in_memory = database_url.contains(":memory:");

    let mut options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5));
    if !in_memory {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    // Every connection to `:memory:` is its own database, so keep exactly one.
    let max_connections = if in_memory { 1 } else { 5 };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Creates the `submissions` table if it does not exist yet.
pub async fn run_migrations(pool: &DbPool) -> Result<(), StorageError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn insert_submission<'e, E>(
    executor: E,
    new: &NewSubmission,
) -> Result<Submission, StorageError>
where
    E: SqliteExecutor<'e>,
{
    let submission = sqlx::query_as::<_, Submission>(&format!(
        r#"
        INSERT INTO submissions
            (rating, review_text, predicted_rating, prediction_explanation,
             ai_response, ai_summary, ai_recommended_actions, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {}
        "#,
        SUBMISSION_COLUMNS
    ))
    .bind(new.rating)
    .bind(&new.review_text)
    .bind(new.predicted_rating)
    .bind(&new.prediction_explanation)
    .bind(&new.ai_response)
    .bind(&new.ai_summary)
    .bind(&new.ai_recommended_actions)
    .bind(Utc::now())
    .fetch_one(executor)
    .await?;

    Ok(submission)
}

/// All submissions, newest first; `id` breaks timestamp ties.
pub async fn list_submissions<'e, E>(executor: E) -> Result<Vec<Submission>, StorageError>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query_as::<_, Submission>(&format!(
        "SELECT {} FROM submissions ORDER BY created_at DESC, id DESC",
        SUBMISSION_COLUMNS
    ))
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

pub async fn count_by_rating<'e, E>(executor: E) -> Result<RatingCounts, StorageError>
where
    E: SqliteExecutor<'e>,
{
    let rows: Vec<(i64, i64)> =
        sqlx::query_as("SELECT rating, COUNT(*) FROM submissions GROUP BY rating")
            .fetch_all(executor)
            .await?;

    let mut counts: RatingCounts = (1..=5).map(|rating| (rating, 0)).collect();
    for (rating, count) in rows {
        counts.insert(rating, count);
    }
    Ok(counts)
}

/// Liveness check for the health endpoint.
pub async fn ping(pool: &DbPool) -> Result<(), StorageError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

#[cfg(test)]
pub async fn test_pool() -> DbPool {
    let pool = create_pool("sqlite::memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();
    pool
}
