//! Database operations for `posts`.
//!
//! Every lifecycle transition here is a conditional `UPDATE` whose `WHERE`
//! clause re-checks the expected current status. A zero-row result surfaces
//! as [`DbError::StaleStatus`], which callers treat as "another writer got
//! there first" — this is the only concurrency control the pipeline needs.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use autopost_core::{MediaType, PostStatus};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `posts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostRow {
    pub id: i64,
    pub public_id: Uuid,
    pub user_id: String,
    pub status: String,
    pub scheduled_for: DateTime<Utc>,
    pub review_deadline: Option<DateTime<Utc>>,
    pub topic: Option<String>,
    pub notes: Option<String>,
    pub content: Option<String>,
    pub edited_content: Option<String>,
    pub media_type: String,
    pub media_url: Option<String>,
    pub media_mime_type: Option<String>,
    pub html_content: Option<String>,
    pub image_urls: Json<Vec<String>>,
    pub page_count: Option<i32>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub linkedin_media_asset: Option<String>,
    pub linkedin_post_id: Option<String>,
    pub failure_reason: Option<String>,
    pub series_id: Option<i64>,
    pub topic_index: Option<i32>,
    pub previous_post_summary: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostRow {
    /// Parse the stored media type column into its closed variant.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidField`] if the column holds an unknown value.
    pub fn media_type(&self) -> Result<MediaType, DbError> {
        self.media_type
            .parse()
            .map_err(|_| DbError::InvalidField {
                field: "media_type",
                value: self.media_type.clone(),
            })
    }

    /// The text that should be published: the user's edit when present,
    /// otherwise the generated content.
    #[must_use]
    pub fn final_content(&self) -> Option<&str> {
        self.edited_content
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or(self.content.as_deref())
    }
}

const POST_COLUMNS: &str = "id, public_id, user_id, status, scheduled_for, review_deadline, \
     topic, notes, content, edited_content, media_type, media_url, media_mime_type, \
     html_content, image_urls, page_count, provider, model, linkedin_media_asset, \
     linkedin_post_id, failure_reason, series_id, topic_index, previous_post_summary, \
     published_at, created_at, updated_at";

/// Generated draft fields written together with the `pending_review` transition.
#[derive(Debug, Clone)]
pub struct NewDraft {
    pub content: String,
    pub media_url: Option<String>,
    pub media_mime_type: Option<String>,
    pub html_content: Option<String>,
    pub page_count: Option<i32>,
    pub review_deadline: DateTime<Utc>,
    pub previous_post_summary: Option<String>,
    pub provider: String,
    pub model: String,
}

// ---------------------------------------------------------------------------
// Creation & lookup
// ---------------------------------------------------------------------------

/// Insert a placeholder post in `scheduled` status for an upcoming slot.
///
/// Idempotent per `(user_id, scheduled_for)`: returns `None` when a post
/// already occupies the slot.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_placeholder_post(
    pool: &PgPool,
    user_id: &str,
    scheduled_for: DateTime<Utc>,
    media_type: MediaType,
    series_id: Option<i64>,
) -> Result<Option<i64>, DbError> {
    let public_id = Uuid::new_v4();

    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO posts (public_id, user_id, scheduled_for, media_type, series_id) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (user_id, scheduled_for) DO NOTHING \
         RETURNING id",
    )
    .bind(public_id)
    .bind(user_id)
    .bind(scheduled_for)
    .bind(media_type.as_str())
    .bind(series_id)
    .fetch_optional(pool)
    .await?;

    Ok(id)
}

/// Fetch a post by internal id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row matches.
pub async fn get_post(pool: &PgPool, id: i64) -> Result<PostRow, DbError> {
    let query = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
    sqlx::query_as::<_, PostRow>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// List posts for a user, optionally filtered by status, newest schedule first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_posts(
    pool: &PgPool,
    user_id: &str,
    status: Option<PostStatus>,
    limit: i64,
) -> Result<Vec<PostRow>, DbError> {
    let query = format!(
        "SELECT {POST_COLUMNS} FROM posts \
         WHERE user_id = $1 AND ($2::text IS NULL OR status = $2) \
         ORDER BY scheduled_for DESC \
         LIMIT $3"
    );
    let rows = sqlx::query_as::<_, PostRow>(&query)
        .bind(user_id)
        .bind(status.map(PostStatus::as_str))
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

// ---------------------------------------------------------------------------
// Sweep candidate queries
// ---------------------------------------------------------------------------

/// Posts in `scheduled` whose slot falls inside the generation window.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_generation_candidates(
    pool: &PgPool,
    from: DateTime<Utc>,
    until: DateTime<Utc>,
) -> Result<Vec<PostRow>, DbError> {
    let query = format!(
        "SELECT {POST_COLUMNS} FROM posts \
         WHERE status = 'scheduled' AND scheduled_for >= $1 AND scheduled_for < $2 \
         ORDER BY scheduled_for"
    );
    let rows = sqlx::query_as::<_, PostRow>(&query)
        .bind(from)
        .bind(until)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Posts in `pending_review` whose review deadline has elapsed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_review_expired(
    pool: &PgPool,
    now: DateTime<Utc>,
) -> Result<Vec<PostRow>, DbError> {
    let query = format!(
        "SELECT {POST_COLUMNS} FROM posts \
         WHERE status = 'pending_review' AND review_deadline IS NOT NULL \
           AND review_deadline <= $1 \
         ORDER BY review_deadline"
    );
    let rows = sqlx::query_as::<_, PostRow>(&query)
        .bind(now)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Approved posts whose scheduled time has arrived.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_publish_due(pool: &PgPool, now: DateTime<Utc>) -> Result<Vec<PostRow>, DbError> {
    let query = format!(
        "SELECT {POST_COLUMNS} FROM posts \
         WHERE status = 'approved' AND scheduled_for <= $1 \
         ORDER BY scheduled_for"
    );
    let rows = sqlx::query_as::<_, PostRow>(&query)
        .bind(now)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// The most recently published post of a series, used for continuity context.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn last_published_in_series(
    pool: &PgPool,
    series_id: i64,
) -> Result<Option<PostRow>, DbError> {
    let query = format!(
        "SELECT {POST_COLUMNS} FROM posts \
         WHERE series_id = $1 AND status = 'published' \
         ORDER BY published_at DESC NULLS LAST \
         LIMIT 1"
    );
    let row = sqlx::query_as::<_, PostRow>(&query)
        .bind(series_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

// ---------------------------------------------------------------------------
// Lifecycle transitions
// ---------------------------------------------------------------------------

/// Record the topic selection on a still-`scheduled` post.
///
/// `topic_index` is captured here, at selection time, so series advancement
/// at publish time is idempotent with respect to queue edits in between.
///
/// # Errors
///
/// Returns [`DbError::StaleStatus`] if the post has left `scheduled`.
pub async fn assign_topic(
    pool: &PgPool,
    post_id: i64,
    topic: &str,
    notes: Option<&str>,
    series_id: Option<i64>,
    topic_index: Option<i32>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE posts \
         SET topic = $2, notes = COALESCE($3, notes), series_id = COALESCE($4, series_id), \
             topic_index = $5, updated_at = NOW() \
         WHERE id = $1 AND status = 'scheduled'",
    )
    .bind(post_id)
    .bind(topic)
    .bind(notes)
    .bind(series_id)
    .bind(topic_index)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::StaleStatus {
            post_id,
            expected: "scheduled",
        });
    }

    Ok(())
}

/// Write generated content and move `scheduled -> pending_review`.
///
/// The status precondition guarantees at-most-one generation per post even
/// when sweep runs overlap.
///
/// # Errors
///
/// Returns [`DbError::StaleStatus`] if the post has left `scheduled`.
pub async fn store_draft(pool: &PgPool, post_id: i64, draft: &NewDraft) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE posts \
         SET status = 'pending_review', content = $2, media_url = $3, media_mime_type = $4, \
             html_content = $5, page_count = $6, review_deadline = $7, \
             previous_post_summary = $8, provider = $9, model = $10, \
             failure_reason = NULL, updated_at = NOW() \
         WHERE id = $1 AND status = 'scheduled'",
    )
    .bind(post_id)
    .bind(&draft.content)
    .bind(draft.media_url.as_deref())
    .bind(draft.media_mime_type.as_deref())
    .bind(draft.html_content.as_deref())
    .bind(draft.page_count)
    .bind(draft.review_deadline)
    .bind(draft.previous_post_summary.as_deref())
    .bind(&draft.provider)
    .bind(&draft.model)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::StaleStatus {
            post_id,
            expected: "scheduled",
        });
    }

    Ok(())
}

/// User approval: `pending_review -> approved`, optionally applying a content
/// edit and the pre-captured html page images.
///
/// # Errors
///
/// Returns [`DbError::StaleStatus`] if the post has left `pending_review`.
pub async fn approve_post(
    pool: &PgPool,
    post_id: i64,
    edited_content: Option<&str>,
    image_urls: Option<&[String]>,
) -> Result<(), DbError> {
    let captured = image_urls.map(|urls| Json(urls.to_vec()));

    let result = sqlx::query(
        "UPDATE posts \
         SET status = 'approved', edited_content = COALESCE($2, edited_content), \
             image_urls = COALESCE($3, image_urls), updated_at = NOW() \
         WHERE id = $1 AND status = 'pending_review'",
    )
    .bind(post_id)
    .bind(edited_content)
    .bind(captured)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::StaleStatus {
            post_id,
            expected: "pending_review",
        });
    }

    Ok(())
}

/// User rejection: `pending_review -> scheduled`, clearing generated content
/// and media so the next generate sweep produces a fresh draft. The series
/// position is deliberately not touched.
///
/// # Errors
///
/// Returns [`DbError::StaleStatus`] if the post has left `pending_review`.
pub async fn reject_post(pool: &PgPool, post_id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE posts \
         SET status = 'scheduled', content = NULL, edited_content = NULL, \
             html_content = NULL, media_url = NULL, media_mime_type = NULL, \
             image_urls = '[]'::jsonb, page_count = NULL, review_deadline = NULL, \
             linkedin_media_asset = NULL, updated_at = NOW() \
         WHERE id = $1 AND status = 'pending_review'",
    )
    .bind(post_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::StaleStatus {
            post_id,
            expected: "pending_review",
        });
    }

    Ok(())
}

/// Cutoff transition: `pending_review -> skipped` once the review deadline
/// has elapsed. Re-checks the deadline in the precondition so a just-approved
/// post racing the sweep is left alone.
///
/// # Errors
///
/// Returns [`DbError::StaleStatus`] if the post is no longer an expired
/// `pending_review` candidate.
pub async fn skip_expired_post(
    pool: &PgPool,
    post_id: i64,
    now: DateTime<Utc>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE posts \
         SET status = 'skipped', updated_at = NOW() \
         WHERE id = $1 AND status = 'pending_review' \
           AND review_deadline IS NOT NULL AND review_deadline <= $2",
    )
    .bind(post_id)
    .bind(now)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::StaleStatus {
            post_id,
            expected: "pending_review",
        });
    }

    Ok(())
}

/// Publish success: `approved -> published` with the remote post id.
///
/// # Errors
///
/// Returns [`DbError::StaleStatus`] if the post has left `approved`.
pub async fn mark_published(
    pool: &PgPool,
    post_id: i64,
    linkedin_post_id: &str,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE posts \
         SET status = 'published', linkedin_post_id = $2, failure_reason = NULL, \
             published_at = NOW(), updated_at = NOW() \
         WHERE id = $1 AND status = 'approved'",
    )
    .bind(post_id)
    .bind(linkedin_post_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::StaleStatus {
            post_id,
            expected: "approved",
        });
    }

    Ok(())
}

/// Publish failure: `approved -> failed` with a sanitized reason.
///
/// # Errors
///
/// Returns [`DbError::StaleStatus`] if the post has left `approved`.
pub async fn mark_publish_failed(
    pool: &PgPool,
    post_id: i64,
    reason: &str,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE posts \
         SET status = 'failed', failure_reason = $2, updated_at = NOW() \
         WHERE id = $1 AND status = 'approved'",
    )
    .bind(post_id)
    .bind(reason)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::StaleStatus {
            post_id,
            expected: "approved",
        });
    }

    Ok(())
}

/// User retry after a publish failure: `failed -> approved`, keeping the
/// already-generated content (no regeneration).
///
/// # Errors
///
/// Returns [`DbError::StaleStatus`] if the post has left `failed`.
pub async fn retry_failed_post(pool: &PgPool, post_id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE posts \
         SET status = 'approved', failure_reason = NULL, updated_at = NOW() \
         WHERE id = $1 AND status = 'failed'",
    )
    .bind(post_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::StaleStatus {
            post_id,
            expected: "failed",
        });
    }

    Ok(())
}

/// Explicit regeneration: return any non-published post to `scheduled`,
/// clearing generated content and media so the next generate sweep rebuilds
/// it. The series position is not touched, so a regenerated series topic
/// keeps its place in the queue.
///
/// # Errors
///
/// Returns [`DbError::StaleStatus`] if the post is already published.
pub async fn regenerate_post(pool: &PgPool, post_id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE posts \
         SET status = 'scheduled', content = NULL, edited_content = NULL, \
             html_content = NULL, media_url = NULL, media_mime_type = NULL, \
             image_urls = '[]'::jsonb, page_count = NULL, review_deadline = NULL, \
             linkedin_media_asset = NULL, failure_reason = NULL, updated_at = NOW() \
         WHERE id = $1 AND status <> 'published'",
    )
    .bind(post_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::StaleStatus {
            post_id,
            expected: "not published",
        });
    }

    Ok(())
}

/// Cache the remote media asset reference on the post so a publish retry
/// skips re-upload.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn cache_media_asset(pool: &PgPool, post_id: i64, asset: &str) -> Result<(), DbError> {
    sqlx::query("UPDATE posts SET linkedin_media_asset = $2, updated_at = NOW() WHERE id = $1")
        .bind(post_id)
        .bind(asset)
        .execute(pool)
        .await?;

    Ok(())
}
