//! Cutoff sweep: `pending_review -> skipped` once the review window closes.
//!
//! No AI or publishing calls. The series position is never touched here, so
//! a skipped topic can be regenerated without losing its place in the queue.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use autopost_db::DbError;

use crate::notify::{self, KIND_POST_SKIPPED};
use crate::outcome::{SweepError, SweepItem, SweepOutcome};

/// Run the cutoff sweep.
///
/// # Errors
///
/// Returns [`SweepError`] only if the candidate query itself fails.
pub async fn run_cutoff_sweep(
    pool: &PgPool,
    now: DateTime<Utc>,
) -> Result<SweepOutcome, SweepError> {
    let candidates = autopost_db::list_review_expired(pool, now).await?;

    tracing::info!(count = candidates.len(), "cutoff sweep: candidates loaded");

    let mut results = Vec::with_capacity(candidates.len());
    for post in candidates {
        let item = match autopost_db::skip_expired_post(pool, post.id, now).await {
            Ok(()) => {
                notify::notify(
                    pool,
                    &post.user_id,
                    KIND_POST_SKIPPED,
                    "Post skipped",
                    "The review window closed before this draft was approved.",
                    Some(post.id),
                )
                .await;
                SweepItem::ok(post.id, &post.user_id, "skipped")
            }
            Err(DbError::StaleStatus { .. }) => {
                // Approved (or otherwise moved) between the scan and the
                // update; leave it alone.
                SweepItem::with_detail(post.id, &post.user_id, "unchanged", "reviewed in time")
            }
            Err(e) => {
                tracing::error!(post_id = post.id, error = %e, "cutoff: update failed");
                SweepItem::with_detail(post.id, &post.user_id, "error", "store error")
            }
        };
        results.push(item);
    }

    Ok(SweepOutcome::new(results))
}
