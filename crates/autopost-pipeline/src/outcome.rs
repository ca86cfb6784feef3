//! Result shapes shared by all sweeps.

use serde::Serialize;
use thiserror::Error;

/// The outcome of one sweep invocation: one entry per candidate examined.
#[derive(Debug, Serialize)]
pub struct SweepOutcome {
    pub processed: usize,
    pub results: Vec<SweepItem>,
}

impl SweepOutcome {
    #[must_use]
    pub fn new(results: Vec<SweepItem>) -> Self {
        Self {
            processed: results.len(),
            results,
        }
    }
}

/// One candidate's result within a sweep run.
#[derive(Debug, Serialize)]
pub struct SweepItem {
    pub post_id: i64,
    pub user_id: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl SweepItem {
    #[must_use]
    pub fn ok(post_id: i64, user_id: &str, status: &'static str) -> Self {
        Self {
            post_id,
            user_id: user_id.to_owned(),
            status,
            detail: None,
        }
    }

    #[must_use]
    pub fn with_detail(
        post_id: i64,
        user_id: &str,
        status: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            post_id,
            user_id: user_id.to_owned(),
            status,
            detail: Some(detail.into()),
        }
    }
}

/// Setup-level sweep failure. Per-post errors never surface here; they are
/// recorded as [`SweepItem`]s so one bad post cannot abort the batch. Only a
/// failure to enumerate candidates at all aborts a sweep.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error(transparent)]
    Db(#[from] autopost_db::DbError),
}
