//! Review-action handlers: the user-driven lifecycle transitions.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use autopost_core::PostStatus;
use autopost_db::PostRow;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    user_id: String,
    status: Option<String>,
    limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct PostItem {
    pub id: i64,
    pub public_id: Uuid,
    pub user_id: String,
    pub status: String,
    pub scheduled_for: DateTime<Utc>,
    pub review_deadline: Option<DateTime<Utc>>,
    pub topic: Option<String>,
    pub content: Option<String>,
    pub edited_content: Option<String>,
    pub media_type: String,
    pub media_url: Option<String>,
    pub failure_reason: Option<String>,
    pub linkedin_post_id: Option<String>,
    pub series_id: Option<i64>,
    pub published_at: Option<DateTime<Utc>>,
}

impl From<PostRow> for PostItem {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            public_id: row.public_id,
            user_id: row.user_id,
            status: row.status,
            scheduled_for: row.scheduled_for,
            review_deadline: row.review_deadline,
            topic: row.topic,
            content: row.content,
            edited_content: row.edited_content,
            media_type: row.media_type,
            media_url: row.media_url,
            failure_reason: row.failure_reason,
            linkedin_post_id: row.linkedin_post_id,
            series_id: row.series_id,
            published_at: row.published_at,
        }
    }
}

pub async fn list_posts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ListPostsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let status = match query.status.as_deref() {
        Some(raw) => Some(raw.parse::<PostStatus>().map_err(|e| {
            ApiError::new(req_id.0.clone(), "validation_error", e)
        })?),
        None => None,
    };

    let rows = autopost_db::list_posts(
        &state.pool,
        &query.user_id,
        status,
        normalize_limit(query.limit),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data: Vec<PostItem> = rows.into_iter().map(PostItem::from).collect();
    Ok((
        StatusCode::OK,
        Json(ApiResponse {
            data,
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// Body of the approve action. `image_urls` carries the page snapshots the
/// review UI captured client-side for html posts.
#[derive(Debug, Default, Deserialize)]
pub struct ApproveBody {
    #[serde(default)]
    edited_content: Option<String>,
    #[serde(default)]
    image_urls: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct ActionData {
    post_id: i64,
    status: &'static str,
}

pub async fn approve_post(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(post_id): Path<i64>,
    body: Option<Json<ApproveBody>>,
) -> Result<impl IntoResponse, ApiError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();

    autopost_db::approve_post(
        &state.pool,
        post_id,
        body.edited_content.as_deref(),
        body.image_urls.as_deref(),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(action_response(req_id.0, post_id, PostStatus::Approved))
}

pub async fn reject_post(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    autopost_db::reject_post(&state.pool, post_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(action_response(req_id.0, post_id, PostStatus::Scheduled))
}

pub async fn retry_post(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    autopost_db::retry_failed_post(&state.pool, post_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(action_response(req_id.0, post_id, PostStatus::Approved))
}

pub async fn regenerate_post(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    autopost_db::regenerate_post(&state.pool, post_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(action_response(req_id.0, post_id, PostStatus::Scheduled))
}

fn action_response(
    request_id: String,
    post_id: i64,
    status: PostStatus,
) -> (StatusCode, Json<ApiResponse<ActionData>>) {
    (
        StatusCode::OK,
        Json(ApiResponse {
            data: ActionData {
                post_id,
                status: status.as_str(),
            },
            meta: ResponseMeta::new(request_id),
        }),
    )
}
