//! Publish sweep: `approved -> {published | failed}`.
//!
//! For each approved post whose slot has arrived: make sure there is a
//! usable access token (refreshing through the store-backed CAS when
//! expired), resolve the media for the post's type, create the remote post,
//! and only then advance the series queue. One post's failure never aborts
//! the batch.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

use autopost_core::MediaType;
use autopost_db::{DbError, PostRow, ProfileRow};
use autopost_linkedin::LinkedinClient;

use crate::notify::{self, KIND_POST_FAILED, KIND_POST_PUBLISHED};
use crate::outcome::{SweepError, SweepItem, SweepOutcome};

/// Tokens within this margin of expiry are refreshed before use, so an
/// upload-then-post sequence cannot straddle the expiry instant.
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 300;

/// Dependencies of one publish sweep run.
pub struct PublishContext<'a> {
    pub pool: &'a PgPool,
    pub linkedin: &'a LinkedinClient,
    /// Plain client for downloading media bytes from object storage.
    pub http: &'a reqwest::Client,
}

/// A per-post publish failure: the sanitized reason stored on the post.
struct PublishFailure(String);

impl PublishFailure {
    fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Run the publish sweep.
///
/// # Errors
///
/// Returns [`SweepError`] only if the candidate query itself fails.
pub async fn run_publish_sweep(
    ctx: &PublishContext<'_>,
    now: DateTime<Utc>,
) -> Result<SweepOutcome, SweepError> {
    let candidates = autopost_db::list_publish_due(ctx.pool, now).await?;

    tracing::info!(count = candidates.len(), "publish sweep: candidates loaded");

    let mut results = Vec::with_capacity(candidates.len());
    for post in candidates {
        results.push(publish_post(ctx, post, now).await);
    }

    Ok(SweepOutcome::new(results))
}

async fn publish_post(ctx: &PublishContext<'_>, post: PostRow, now: DateTime<Utc>) -> SweepItem {
    let profile = match autopost_db::get_profile(ctx.pool, &post.user_id).await {
        Ok(Some(profile)) => profile,
        Ok(None) => {
            // Operational skip: a missing profile is a config gap, not a
            // post failure.
            tracing::warn!(post_id = post.id, user_id = %post.user_id, "publish: no profile");
            return SweepItem::with_detail(post.id, &post.user_id, "skipped", "no autoposter profile");
        }
        Err(e) => {
            tracing::error!(post_id = post.id, error = %e, "publish: profile lookup failed");
            return SweepItem::with_detail(post.id, &post.user_id, "error", "profile lookup failed");
        }
    };

    match try_publish(ctx, &post, &profile, now).await {
        Ok(remote_id) => {
            advance_series(ctx.pool, &post).await;
            notify::notify(
                ctx.pool,
                &post.user_id,
                KIND_POST_PUBLISHED,
                "Post published",
                "Your scheduled post is live on LinkedIn.",
                Some(post.id),
            )
            .await;
            SweepItem::with_detail(post.id, &post.user_id, "published", remote_id)
        }
        Err(PublishFailure(reason)) => {
            match autopost_db::mark_publish_failed(ctx.pool, post.id, &reason).await {
                Ok(()) => {
                    notify::notify(
                        ctx.pool,
                        &post.user_id,
                        KIND_POST_FAILED,
                        "Post failed to publish",
                        &reason,
                        Some(post.id),
                    )
                    .await;
                    SweepItem::with_detail(post.id, &post.user_id, "failed", reason)
                }
                Err(DbError::StaleStatus { .. }) => {
                    SweepItem::with_detail(post.id, &post.user_id, "skipped", "no longer approved")
                }
                Err(e) => {
                    tracing::error!(post_id = post.id, error = %e, "publish: failure write failed");
                    SweepItem::with_detail(post.id, &post.user_id, "error", "store error")
                }
            }
        }
    }
}

async fn try_publish(
    ctx: &PublishContext<'_>,
    post: &PostRow,
    profile: &ProfileRow,
    now: DateTime<Utc>,
) -> Result<String, PublishFailure> {
    let (access_token, member_urn) = ensure_token(ctx, profile, now).await?;

    let assets = resolve_media(ctx, post, &access_token, &member_urn).await?;

    let text = post
        .final_content()
        .ok_or_else(|| PublishFailure::new("post has no content"))?;

    let remote_id = ctx
        .linkedin
        .create_post(&access_token, &member_urn, text, &assets)
        .await
        .map_err(|e| {
            tracing::error!(post_id = post.id, error = %e, "publish: post creation failed");
            PublishFailure::new(e.sanitized())
        })?;

    match autopost_db::mark_published(ctx.pool, post.id, &remote_id).await {
        Ok(()) => Ok(remote_id),
        Err(e) => {
            // The remote post exists; losing the local transition is a race
            // worth shouting about but not worth marking the post failed.
            tracing::error!(post_id = post.id, error = %e, "publish: published remotely but local transition failed");
            Ok(remote_id)
        }
    }
}

/// Produce a usable access token, refreshing through the store-backed CAS
/// when the stored one is expired or about to expire.
async fn ensure_token(
    ctx: &PublishContext<'_>,
    profile: &ProfileRow,
    now: DateTime<Utc>,
) -> Result<(String, String), PublishFailure> {
    if !profile.linkedin_connected {
        return Err(PublishFailure::new("LinkedIn is not connected"));
    }
    let member_urn = profile
        .linkedin_member_urn
        .clone()
        .ok_or_else(|| PublishFailure::new("LinkedIn member URN missing"))?;

    let cutoff = now + Duration::seconds(TOKEN_EXPIRY_MARGIN_SECS);
    let token_usable = profile.linkedin_access_token.is_some()
        && profile.linkedin_token_expiry.is_some_and(|exp| exp > cutoff);

    if token_usable {
        if let Some(token) = profile.linkedin_access_token.clone() {
            return Ok((token, member_urn));
        }
    }

    let refresh_token = profile.linkedin_refresh_token.clone().ok_or_else(|| {
        PublishFailure::new("access token expired and no refresh token is stored")
    })?;

    let refreshed = ctx
        .linkedin
        .refresh_token(&refresh_token)
        .await
        .map_err(|e| {
            tracing::warn!(user_id = %profile.user_id, error = %e, "publish: token refresh failed");
            PublishFailure::new(e.sanitized())
        })?;

    let swapped = autopost_db::update_linkedin_tokens(
        ctx.pool,
        &profile.user_id,
        &refreshed.access_token,
        refreshed.refresh_token.as_deref(),
        refreshed.expires_at,
        profile.linkedin_token_expiry,
    )
    .await
    .map_err(|e| {
        tracing::error!(user_id = %profile.user_id, error = %e, "publish: token persist failed");
        PublishFailure::new("could not persist refreshed token")
    })?;

    if swapped {
        return Ok((refreshed.access_token, member_urn));
    }

    // A concurrent sweep refreshed first; use what it stored.
    let fresh = autopost_db::get_profile(ctx.pool, &profile.user_id)
        .await
        .ok()
        .flatten()
        .and_then(|p| p.linkedin_access_token);
    match fresh {
        Some(token) => Ok((token, member_urn)),
        None => Err(PublishFailure::new("token refresh raced and no token is stored")),
    }
}

/// Resolve the media assets for a post according to its media type contract.
async fn resolve_media(
    ctx: &PublishContext<'_>,
    post: &PostRow,
    access_token: &str,
    member_urn: &str,
) -> Result<Vec<String>, PublishFailure> {
    let media_type = post
        .media_type()
        .map_err(|_| PublishFailure::new("invalid media type"))?;

    match media_type {
        MediaType::Text => Ok(Vec::new()),
        MediaType::Html => {
            let urls = &post.image_urls.0;
            if urls.is_empty() {
                return Err(PublishFailure::new(
                    "no captured page images; approve the post again to capture them",
                ));
            }
            let mut assets = Vec::with_capacity(urls.len());
            for url in urls {
                let bytes = download_media(ctx.http, url).await?;
                let asset = ctx
                    .linkedin
                    .upload_image(access_token, member_urn, bytes)
                    .await
                    .map_err(|e| PublishFailure::new(e.sanitized()))?;
                assets.push(asset);
            }
            Ok(assets)
        }
        MediaType::Image | MediaType::Video => {
            // The asset reference is cached on first upload so a retry after
            // a later failure skips the re-upload entirely.
            if let Some(cached) = post
                .linkedin_media_asset
                .as_deref()
                .filter(|a| !a.is_empty())
            {
                return Ok(vec![cached.to_owned()]);
            }

            let url = post
                .media_url
                .as_deref()
                .ok_or_else(|| PublishFailure::new("post has no media URL"))?;
            let bytes = download_media(ctx.http, url).await?;
            let asset = if media_type == MediaType::Video {
                ctx.linkedin
                    .upload_video(access_token, member_urn, bytes)
                    .await
            } else {
                ctx.linkedin
                    .upload_image(access_token, member_urn, bytes)
                    .await
            }
            .map_err(|e| PublishFailure::new(e.sanitized()))?;

            if let Err(e) = autopost_db::cache_media_asset(ctx.pool, post.id, &asset).await {
                tracing::warn!(post_id = post.id, error = %e, "publish: asset cache write failed");
            }
            Ok(vec![asset])
        }
    }
}

async fn download_media(http: &reqwest::Client, url: &str) -> Result<Vec<u8>, PublishFailure> {
    let response = http
        .get(url)
        .send()
        .await
        .map_err(|_| PublishFailure::new("media download failed"))?;
    if !response.status().is_success() {
        return Err(PublishFailure::new(format!(
            "media download returned {}",
            response.status().as_u16()
        )));
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|_| PublishFailure::new("media download failed"))?;
    Ok(bytes.to_vec())
}

/// Advance the series queue after a successful publication. Best-effort:
/// a miss (concurrent advance, edited queue) is logged, never propagated.
async fn advance_series(pool: &PgPool, post: &PostRow) {
    let (Some(series_id), Some(topic_index)) = (post.series_id, post.topic_index) else {
        return;
    };

    match autopost_db::advance_series_index(pool, series_id, topic_index).await {
        Ok(true) => {
            tracing::info!(post_id = post.id, series_id, topic_index, "series advanced");
        }
        Ok(false) => {
            tracing::warn!(
                post_id = post.id,
                series_id,
                topic_index,
                "series advance skipped: index moved or queue changed"
            );
        }
        Err(e) => {
            tracing::error!(post_id = post.id, series_id, error = %e, "series advance failed");
        }
    }
}
