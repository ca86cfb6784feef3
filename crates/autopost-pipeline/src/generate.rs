//! Draft generator sweep: `scheduled -> pending_review`.
//!
//! Scans for posts whose slot falls inside the generation window, resolves
//! topic and continuity context, invokes the AI client, and writes the draft
//! together with the status change in one conditional update. A failure at
//! any step leaves the post in `scheduled` — the next run tries again — and
//! is recorded in the sweep result without aborting the batch.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;

use autopost_ai::{
    build_draft_prompt, build_html_prompt, AiClient, AiError, GenerationKind, GenerationRequest,
    PromptInputs,
};
use autopost_core::MediaType;
use autopost_db::{DbError, NewDraft, PostRow, ProfileRow};

use crate::notify::{self, KIND_REVIEW_READY};
use crate::outcome::{SweepError, SweepItem, SweepOutcome};
use crate::schedule::{generation_window, review_deadline_for};
use crate::topic::{select_topic, TopicSelection, TopicSource};

const DEFAULT_PAGE_COUNT: u32 = 5;
const CONTINUITY_SUMMARY_MAX_CHARS: usize = 500;

/// Dependencies of one generate sweep run.
pub struct GenerateContext<'a> {
    pub pool: &'a PgPool,
    pub ai: &'a AiClient,
    pub default_provider: &'a str,
    pub default_model: &'a str,
}

#[derive(Debug, Error)]
enum GenerateError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Ai(#[from] AiError),
}

/// Run the draft generator sweep.
///
/// # Errors
///
/// Returns [`SweepError`] only if the candidate query itself fails.
pub async fn run_generate_sweep(
    ctx: &GenerateContext<'_>,
    now: DateTime<Utc>,
) -> Result<SweepOutcome, SweepError> {
    let (from, until) = generation_window(now);
    let candidates = autopost_db::list_generation_candidates(ctx.pool, from, until).await?;

    tracing::info!(count = candidates.len(), "generate sweep: candidates loaded");

    let mut results = Vec::with_capacity(candidates.len());
    for post in candidates {
        results.push(generate_for_post(ctx, post).await);
    }

    Ok(SweepOutcome::new(results))
}

async fn generate_for_post(ctx: &GenerateContext<'_>, post: PostRow) -> SweepItem {
    let profile = match autopost_db::get_profile(ctx.pool, &post.user_id).await {
        Ok(Some(profile)) => profile,
        Ok(None) => {
            // Operational skip: never mutate the post over a config gap.
            tracing::warn!(post_id = post.id, user_id = %post.user_id, "generate: no profile");
            return SweepItem::with_detail(post.id, &post.user_id, "skipped", "no autoposter profile");
        }
        Err(e) => {
            tracing::error!(post_id = post.id, error = %e, "generate: profile lookup failed");
            return SweepItem::with_detail(post.id, &post.user_id, "error", "profile lookup failed");
        }
    };

    match try_generate(ctx, &post, &profile).await {
        Ok(item) => item,
        Err(GenerateError::Db(DbError::StaleStatus { .. })) => {
            // Another writer moved the post; it is simply not ours anymore.
            SweepItem::with_detail(post.id, &post.user_id, "skipped", "no longer scheduled")
        }
        Err(GenerateError::Db(e)) => {
            tracing::error!(post_id = post.id, error = %e, "generate: store error");
            SweepItem::with_detail(post.id, &post.user_id, "error", "store error")
        }
        Err(GenerateError::Ai(e)) => {
            tracing::error!(post_id = post.id, error = %e, "generate: generation failed");
            SweepItem::with_detail(post.id, &post.user_id, "error", e.sanitized())
        }
    }
}

async fn try_generate(
    ctx: &GenerateContext<'_>,
    post: &PostRow,
    profile: &ProfileRow,
) -> Result<SweepItem, GenerateError> {
    let media_type = match post.media_type() {
        Ok(media_type) => media_type,
        Err(e) => {
            tracing::error!(post_id = post.id, error = %e, "generate: bad media type");
            return Ok(SweepItem::with_detail(
                post.id,
                &post.user_id,
                "error",
                "invalid media type",
            ));
        }
    };

    // Resolve the topic. Posts scheduled with an explicit topic keep it;
    // placeholders consult the idea bank and the series queue.
    let selection = match resolve_topic(ctx.pool, post).await? {
        Some(selection) => selection,
        None => {
            return Ok(SweepItem::with_detail(
                post.id,
                &post.user_id,
                "skipped",
                "no topic available",
            ));
        }
    };

    // Continuity: the last published post of the same series feeds the next
    // draft, so the narrative continues across posts.
    let previous_post_summary = match selection.series_id {
        Some(series_id) => autopost_db::last_published_in_series(ctx.pool, series_id)
            .await?
            .and_then(|prev| prev.final_content().map(continuity_summary)),
        None => None,
    };

    let template_html = match (media_type, selection.series_id) {
        (MediaType::Html, Some(series_id)) => fetch_template_html(ctx.pool, series_id).await?,
        _ => None,
    };

    let provider = post
        .provider
        .clone()
        .or_else(|| profile.preferred_provider.clone())
        .unwrap_or_else(|| ctx.default_provider.to_owned());
    let model = post
        .model
        .clone()
        .or_else(|| profile.preferred_model.clone())
        .unwrap_or_else(|| ctx.default_model.to_owned());

    let page_count = post
        .page_count
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(DEFAULT_PAGE_COUNT);

    let inputs = PromptInputs {
        topic: &selection.topic,
        notes: selection.notes.as_deref().or(post.notes.as_deref()),
        persona: profile.persona.as_deref(),
        series_title: selection.series_title.as_deref(),
        category: None,
        previous_post_summary: previous_post_summary.as_deref(),
    };

    let (kind, prompt) = match media_type {
        MediaType::Text => (GenerationKind::Text, build_draft_prompt(&inputs)),
        MediaType::Image => (GenerationKind::Image, build_draft_prompt(&inputs)),
        MediaType::Video => (GenerationKind::Video, build_draft_prompt(&inputs)),
        MediaType::Html => (GenerationKind::Html, build_html_prompt(&inputs, page_count)),
    };

    let request = GenerationRequest {
        provider: provider.clone(),
        model: model.clone(),
        kind,
        prompt,
        template_html,
        page_count: (media_type == MediaType::Html).then_some(page_count),
    };

    let generation = ctx.ai.generate(&request).await?;

    let deadline_hour = u32::try_from(profile.review_deadline_hour.clamp(0, 23)).unwrap_or(18);
    let review_deadline =
        review_deadline_for(post.scheduled_for, &profile.timezone, deadline_hour);

    let draft = NewDraft {
        content: generation.content,
        media_url: generation.media_url,
        media_mime_type: generation.mime_type,
        html_content: generation.html,
        page_count: (media_type == MediaType::Html)
            .then_some(i32::try_from(page_count).unwrap_or(i32::MAX)),
        review_deadline,
        previous_post_summary,
        provider,
        model,
    };

    autopost_db::store_draft(ctx.pool, post.id, &draft).await?;

    notify::notify(
        ctx.pool,
        &post.user_id,
        KIND_REVIEW_READY,
        "Draft ready for review",
        &format!("Your post on \"{}\" is ready for review.", selection.topic),
        Some(post.id),
    )
    .await;

    Ok(SweepItem::ok(post.id, &post.user_id, "generated"))
}

/// Resolve the topic for a candidate, persisting a fresh selection onto the
/// post so the choice survives a later failure in this run.
async fn resolve_topic(
    pool: &PgPool,
    post: &PostRow,
) -> Result<Option<TopicSelection>, DbError> {
    if let Some(topic) = post.topic.as_deref().filter(|t| !t.trim().is_empty()) {
        // Explicit topic: keep the post's own series linkage, if any.
        let series_title = match post.series_id {
            Some(series_id) => match autopost_db::get_series(pool, series_id).await {
                Ok(series) => Some(series.title),
                Err(DbError::NotFound) => None,
                Err(e) => return Err(e),
            },
            None => None,
        };
        return Ok(Some(TopicSelection {
            topic: topic.to_owned(),
            notes: post.notes.clone(),
            source: TopicSource::Manual,
            idea_id: None,
            series_id: post.series_id,
            topic_index: post.topic_index,
            series_title,
        }));
    }

    let Some(selection) = select_topic(pool, &post.user_id).await? else {
        return Ok(None);
    };

    autopost_db::assign_topic(
        pool,
        post.id,
        &selection.topic,
        selection.notes.as_deref(),
        selection.series_id,
        selection.topic_index,
    )
    .await?;

    Ok(Some(selection))
}

async fn fetch_template_html(pool: &PgPool, series_id: i64) -> Result<Option<String>, DbError> {
    let series = match autopost_db::get_series(pool, series_id).await {
        Ok(series) => series,
        Err(DbError::NotFound) => return Ok(None),
        Err(e) => return Err(e),
    };
    let Some(template_id) = series.template_id else {
        return Ok(None);
    };
    Ok(autopost_db::get_template(pool, template_id)
        .await?
        .map(|t| t.html))
}

/// Truncate a published post body into a continuity summary, respecting
/// char boundaries.
fn continuity_summary(text: &str) -> String {
    if text.chars().count() <= CONTINUITY_SUMMARY_MAX_CHARS {
        return text.to_owned();
    }
    let truncated: String = text.chars().take(CONTINUITY_SUMMARY_MAX_CHARS).collect();
    format!("{truncated}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn continuity_summary_passes_short_text_through() {
        assert_eq!(continuity_summary("short"), "short");
    }

    #[test]
    fn continuity_summary_truncates_on_char_boundaries() {
        let long: String = "é".repeat(600);
        let summary = continuity_summary(&long);
        assert_eq!(summary.chars().count(), CONTINUITY_SUMMARY_MAX_CHARS + 1);
        assert!(summary.ends_with('…'));
    }
}
