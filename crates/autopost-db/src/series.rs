//! Database operations for `series`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// One entry in a series topic queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicEntry {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A row from the `series` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SeriesRow {
    pub id: i64,
    pub public_id: Uuid,
    pub user_id: String,
    pub title: String,
    pub category: Option<String>,
    pub template_id: Option<i64>,
    pub topic_queue: Json<Vec<TopicEntry>>,
    pub current_index: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SeriesRow {
    /// The next unconsumed topic, if the queue is not exhausted.
    #[must_use]
    pub fn next_topic(&self) -> Option<&TopicEntry> {
        usize::try_from(self.current_index)
            .ok()
            .and_then(|i| self.topic_queue.0.get(i))
    }
}

const SERIES_COLUMNS: &str = "id, public_id, user_id, title, category, template_id, \
     topic_queue, current_index, created_at, updated_at";

/// Fetch a series by internal id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row matches.
pub async fn get_series(pool: &PgPool, id: i64) -> Result<SeriesRow, DbError> {
    let query = format!("SELECT {SERIES_COLUMNS} FROM series WHERE id = $1");
    sqlx::query_as::<_, SeriesRow>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// The user's oldest series that still has unconsumed topics.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn active_series_for_user(
    pool: &PgPool,
    user_id: &str,
) -> Result<Option<SeriesRow>, DbError> {
    let query = format!(
        "SELECT {SERIES_COLUMNS} FROM series \
         WHERE user_id = $1 AND jsonb_array_length(topic_queue) > current_index \
         ORDER BY created_at \
         LIMIT 1"
    );
    let row = sqlx::query_as::<_, SeriesRow>(&query)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Compare-and-increment of the series queue position.
///
/// Succeeds only when `current_index` still equals `expected_index` and the
/// queue has a topic at that position — a stale expectation (a concurrent
/// publish already advanced, or the queue was shortened) leaves the row
/// unchanged and returns `false`. This is the single write path that moves
/// a series forward; it runs only after a successful publication.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn advance_series_index(
    pool: &PgPool,
    series_id: i64,
    expected_index: i32,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE series \
         SET current_index = current_index + 1, updated_at = NOW() \
         WHERE id = $1 AND current_index = $2 \
           AND jsonb_array_length(topic_queue) > $2",
    )
    .bind(series_id)
    .bind(expected_index)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}
