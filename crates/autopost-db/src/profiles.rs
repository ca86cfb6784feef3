//! Database operations for `profiles`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::DbError;

/// One weekday entry in a posting schedule. `weekday` is 0 = Monday through
/// 6 = Sunday; `post_time` is a local `HH:MM` string in the profile timezone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySlot {
    pub weekday: u8,
    pub enabled: bool,
    pub post_time: String,
}

/// A row from the `profiles` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfileRow {
    pub id: i64,
    pub user_id: String,
    pub timezone: String,
    pub posting_schedule: Json<Vec<DaySlot>>,
    pub draft_generation_hour: i32,
    pub review_deadline_hour: i32,
    pub preferred_media_type: String,
    pub preferred_provider: Option<String>,
    pub preferred_model: Option<String>,
    pub persona: Option<String>,
    pub linkedin_connected: bool,
    pub linkedin_access_token: Option<String>,
    pub linkedin_refresh_token: Option<String>,
    pub linkedin_token_expiry: Option<DateTime<Utc>>,
    pub linkedin_member_urn: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const PROFILE_COLUMNS: &str = "id, user_id, timezone, posting_schedule, draft_generation_hour, \
     review_deadline_hour, preferred_media_type, preferred_provider, preferred_model, persona, \
     linkedin_connected, linkedin_access_token, linkedin_refresh_token, linkedin_token_expiry, \
     linkedin_member_urn, created_at, updated_at";

/// Fetch the profile for a user, if one exists.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_profile(pool: &PgPool, user_id: &str) -> Result<Option<ProfileRow>, DbError> {
    let query = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = $1");
    let row = sqlx::query_as::<_, ProfileRow>(&query)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// All profiles with LinkedIn connected, for the schedule sweep.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_connected_profiles(pool: &PgPool) -> Result<Vec<ProfileRow>, DbError> {
    let query = format!(
        "SELECT {PROFILE_COLUMNS} FROM profiles WHERE linkedin_connected ORDER BY user_id"
    );
    let rows = sqlx::query_as::<_, ProfileRow>(&query)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Persist a refreshed token pair with a compare-and-swap on the previous
/// expiry. A `false` return means a concurrent sweep refreshed first; the
/// caller should re-read the profile and use the stored token instead of
/// its own.
///
/// The refresh token only overwrites when the provider returned a new one
/// (LinkedIn rotates them on some grants and omits them on others).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn update_linkedin_tokens(
    pool: &PgPool,
    user_id: &str,
    access_token: &str,
    refresh_token: Option<&str>,
    expiry: DateTime<Utc>,
    expected_previous_expiry: Option<DateTime<Utc>>,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE profiles \
         SET linkedin_access_token = $2, \
             linkedin_refresh_token = COALESCE($3, linkedin_refresh_token), \
             linkedin_token_expiry = $4, updated_at = NOW() \
         WHERE user_id = $1 AND linkedin_token_expiry IS NOT DISTINCT FROM $5",
    )
    .bind(user_id)
    .bind(access_token)
    .bind(refresh_token)
    .bind(expiry)
    .bind(expected_previous_expiry)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}
