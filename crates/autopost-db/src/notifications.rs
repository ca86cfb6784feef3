//! Database operations for `notifications`.
//!
//! The notification sink is best-effort: callers log insert failures and
//! carry on. Nothing in the pipeline ever depends on a notification landing.

use sqlx::PgPool;

use crate::DbError;

/// Insert a notification for a user.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_notification(
    pool: &PgPool,
    user_id: &str,
    kind: &str,
    title: &str,
    body: &str,
    post_id: Option<i64>,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO notifications (user_id, kind, title, body, post_id) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(user_id)
    .bind(kind)
    .bind(title)
    .bind(body)
    .bind(post_id)
    .execute(pool)
    .await?;

    Ok(())
}
