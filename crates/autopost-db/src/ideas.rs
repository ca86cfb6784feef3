//! Database operations for `ideas`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `ideas` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IdeaRow {
    pub id: i64,
    pub user_id: String,
    pub series_id: Option<i64>,
    pub text: String,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

/// The user's oldest unused idea, if any.
///
/// Ideas take priority over the series queue, so the topic selector calls
/// this first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn first_unused_idea(pool: &PgPool, user_id: &str) -> Result<Option<IdeaRow>, DbError> {
    let row = sqlx::query_as::<_, IdeaRow>(
        "SELECT id, user_id, series_id, text, used, created_at \
         FROM ideas \
         WHERE user_id = $1 AND NOT used \
         ORDER BY created_at \
         LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Mark an idea consumed. Conditional on `NOT used` so two racing sweeps
/// cannot both spend the same idea; returns whether this caller claimed it.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn claim_idea(pool: &PgPool, idea_id: i64) -> Result<bool, DbError> {
    let result = sqlx::query("UPDATE ideas SET used = TRUE WHERE id = $1 AND NOT used")
        .bind(idea_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() == 1)
}
