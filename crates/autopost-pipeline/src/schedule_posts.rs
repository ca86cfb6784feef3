//! Schedule sweep: materialize placeholder posts for upcoming slots.
//!
//! For each connected profile, expands the posting schedule over the next
//! week and inserts a `scheduled` placeholder for every slot that has none.
//! Topic selection happens later, in the generate sweep, so this sweep is
//! write-only and trivially idempotent.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use autopost_core::MediaType;

use crate::outcome::{SweepError, SweepItem, SweepOutcome};
use crate::schedule::{upcoming_slots, SCHEDULE_HORIZON_DAYS};

/// Run the schedule sweep. Emits one result item per placeholder created;
/// slots that already have a post contribute nothing.
///
/// # Errors
///
/// Returns [`SweepError`] only if the profile query itself fails.
pub async fn run_schedule_sweep(
    pool: &PgPool,
    now: DateTime<Utc>,
) -> Result<SweepOutcome, SweepError> {
    let profiles = autopost_db::list_connected_profiles(pool).await?;

    tracing::info!(count = profiles.len(), "schedule sweep: profiles loaded");

    let mut results = Vec::new();
    for profile in profiles {
        let media_type = profile
            .preferred_media_type
            .parse::<MediaType>()
            .unwrap_or(MediaType::Text);

        let slots = upcoming_slots(
            &profile.posting_schedule.0,
            &profile.timezone,
            now,
            SCHEDULE_HORIZON_DAYS,
        );

        for slot in slots {
            match autopost_db::create_placeholder_post(
                pool,
                &profile.user_id,
                slot,
                media_type,
                None,
            )
            .await
            {
                Ok(Some(post_id)) => {
                    results.push(SweepItem::with_detail(
                        post_id,
                        &profile.user_id,
                        "created",
                        slot.to_rfc3339(),
                    ));
                }
                Ok(None) => {} // slot already occupied
                Err(e) => {
                    tracing::error!(user_id = %profile.user_id, error = %e, "schedule: insert failed");
                }
            }
        }
    }

    Ok(SweepOutcome::new(results))
}
