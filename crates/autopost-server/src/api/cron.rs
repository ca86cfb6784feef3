//! Cron trigger handlers.
//!
//! Each handler runs one sweep to completion and reports the per-post
//! results in the response body. Partial failure is normal and reported as
//! `success: true`; only a setup-level error (the candidate query failing)
//! produces a 5xx, which tells the external scheduler to simply try again
//! on its next tick.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use chrono::Utc;
use serde::Serialize;

use autopost_pipeline::{
    run_cutoff_sweep, run_generate_sweep, run_publish_sweep, run_schedule_sweep, GenerateContext,
    PublishContext, SweepError, SweepItem, SweepOutcome,
};

use super::{ApiError, AppState};
use crate::middleware::RequestId;

#[derive(Debug, Serialize)]
struct SweepResponse {
    success: bool,
    processed: usize,
    results: Vec<SweepItem>,
}

impl From<SweepOutcome> for SweepResponse {
    fn from(outcome: SweepOutcome) -> Self {
        Self {
            success: true,
            processed: outcome.processed,
            results: outcome.results,
        }
    }
}

fn sweep_error(request_id: String, sweep: &str, error: &SweepError) -> ApiError {
    tracing::error!(sweep, error = %error, "sweep aborted on setup error");
    ApiError::new(request_id, "internal_error", format!("{sweep} sweep failed"))
}

pub async fn trigger_schedule(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = run_schedule_sweep(&state.pool, Utc::now())
        .await
        .map_err(|e| sweep_error(req_id.0, "schedule", &e))?;
    Ok((StatusCode::OK, Json(SweepResponse::from(outcome))))
}

pub async fn trigger_generate(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = GenerateContext {
        pool: &state.pool,
        ai: &state.ai,
        default_provider: &state.default_provider,
        default_model: &state.default_model,
    };
    let outcome = run_generate_sweep(&ctx, Utc::now())
        .await
        .map_err(|e| sweep_error(req_id.0, "generate", &e))?;
    Ok((StatusCode::OK, Json(SweepResponse::from(outcome))))
}

pub async fn trigger_cutoff(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = run_cutoff_sweep(&state.pool, Utc::now())
        .await
        .map_err(|e| sweep_error(req_id.0, "cutoff", &e))?;
    Ok((StatusCode::OK, Json(SweepResponse::from(outcome))))
}

pub async fn trigger_publish(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = PublishContext {
        pool: &state.pool,
        linkedin: &state.linkedin,
        http: &state.http,
    };
    let outcome = run_publish_sweep(&ctx, Utc::now())
        .await
        .map_err(|e| sweep_error(req_id.0, "publish", &e))?;
    Ok((StatusCode::OK, Json(SweepResponse::from(outcome))))
}
