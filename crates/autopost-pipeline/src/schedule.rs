//! Scheduling and timezone arithmetic.
//!
//! All instants are stored UTC; user-facing times (posting slots, review
//! deadlines) are defined in the profile's IANA timezone and converted with
//! chrono-tz. Offsets are whatever the zone says they are — including
//! non-integer ones — so nothing here parses a local time string naively.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use autopost_db::DaySlot;

/// How far ahead of `now` the draft sweep generates. Must exceed the sweep
/// cadence (hourly) by a wide margin so a missed tick never skips a post
/// permanently.
pub const GENERATION_WINDOW_HOURS: i64 = 28;

/// How many days ahead the schedule sweep materializes placeholder posts.
pub const SCHEDULE_HORIZON_DAYS: u32 = 7;

/// The `[now, now + window)` eligibility interval for draft generation.
#[must_use]
pub fn generation_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    (now, now + Duration::hours(GENERATION_WINDOW_HOURS))
}

/// Compute the review deadline for a post: the calendar date of
/// `scheduled_for` in the profile timezone, at `deadline_hour` local time,
/// converted back to UTC.
///
/// Unknown zone names fall back to UTC with a warning; a deadline in a DST
/// gap resolves to the earliest valid interpretation.
#[must_use]
pub fn review_deadline_for(
    scheduled_for: DateTime<Utc>,
    timezone: &str,
    deadline_hour: u32,
) -> DateTime<Utc> {
    let tz = parse_timezone(timezone);
    let local_date = scheduled_for.with_timezone(&tz).date_naive();
    local_instant(tz, local_date, deadline_hour.min(23), 0)
}

/// Expand a posting schedule into concrete UTC instants over the horizon,
/// strictly after `from`, sorted ascending.
#[must_use]
pub fn upcoming_slots(
    schedule: &[DaySlot],
    timezone: &str,
    from: DateTime<Utc>,
    horizon_days: u32,
) -> Vec<DateTime<Utc>> {
    let tz = parse_timezone(timezone);
    let start_date = from.with_timezone(&tz).date_naive();

    let mut slots = Vec::new();
    for day_offset in 0..=i64::from(horizon_days) {
        let date = start_date + Duration::days(day_offset);
        let weekday = u8::try_from(date.weekday().num_days_from_monday()).unwrap_or(0);

        for slot in schedule {
            if !slot.enabled || slot.weekday != weekday {
                continue;
            }
            let Some((hour, minute)) = parse_hhmm(&slot.post_time) else {
                tracing::warn!(post_time = %slot.post_time, "unparseable posting time; skipping slot");
                continue;
            };
            let instant = local_instant(tz, date, hour, minute);
            if instant > from {
                slots.push(instant);
            }
        }
    }

    slots.sort_unstable();
    slots
}

fn parse_timezone(timezone: &str) -> Tz {
    timezone.parse().unwrap_or_else(|_| {
        tracing::warn!(timezone, "unknown IANA timezone; falling back to UTC");
        Tz::UTC
    })
}

/// Resolve a local wall-clock time to UTC. Ambiguous times (DST fall-back)
/// take the earlier offset; times inside a DST gap are shifted forward an
/// hour, matching what a wall clock in that zone actually shows.
fn local_instant(tz: Tz, date: NaiveDate, hour: u32, minute: u32) -> DateTime<Utc> {
    let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);
    let naive = date.and_time(time);

    tz.from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| {
            tz.from_local_datetime(&(naive + Duration::hours(1)))
                .earliest()
                .unwrap_or_else(|| Utc.from_utc_datetime(&naive).with_timezone(&tz))
        })
        .with_timezone(&Utc)
}

fn parse_hhmm(value: &str) -> Option<(u32, u32)> {
    let (h, m) = value.split_once(':')?;
    let hour: u32 = h.parse().ok()?;
    let minute: u32 = m.parse().ok()?;
    (hour < 24 && minute < 60).then_some((hour, minute))
}
