//! Best-effort user notifications.
//!
//! A notification that fails to land is logged and forgotten; it must never
//! change a sweep's outcome.

use sqlx::PgPool;

pub const KIND_REVIEW_READY: &str = "post_ready_for_review";
pub const KIND_POST_SKIPPED: &str = "post_skipped";
pub const KIND_POST_PUBLISHED: &str = "post_published";
pub const KIND_POST_FAILED: &str = "post_failed";

pub async fn notify(
    pool: &PgPool,
    user_id: &str,
    kind: &str,
    title: &str,
    body: &str,
    post_id: Option<i64>,
) {
    if let Err(e) =
        autopost_db::insert_notification(pool, user_id, kind, title, body, post_id).await
    {
        tracing::warn!(user_id, kind, error = %e, "failed to record notification");
    }
}
