//! Countdown text for card deadlines.
//!
//! A deadline is a date and an hour in local wall-clock time. It is resolved
//! in the time zone of the supplied "now", so the same stored deadline means
//! 18:00 wherever the board is opened.

use chrono::{
    DateTime, Datelike, Duration, Local, Months, NaiveDate, NaiveDateTime, TimeZone, Timelike,
};
use serde::Serialize;

use crate::storage::models::Deadline;

/// Shown instead of a countdown once the deadline has passed.
pub const EXPIRED_LABEL: &str = "已過期";

const MS_PER_MINUTE: i64 = 60 * 1000;

// Keeps calendar arithmetic on garbage input far from chrono's limits.
const MAX_COMPONENT_OFFSET: i64 = 1_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadlineInfo {
    /// `已過期`, an `HH:MM` countdown, or `N天後`
    pub display: String,
    /// `M月D日 H時` of the resolved deadline
    pub tooltip: String,
    pub is_expired: bool,
}

/// [`compute_deadline_info`] against the system clock and local time zone.
pub fn deadline_info(deadline: &Deadline) -> DeadlineInfo {
    compute_deadline_info(deadline, Local::now())
}

pub fn compute_deadline_info<Tz: TimeZone>(deadline: &Deadline, now: DateTime<Tz>) -> DeadlineInfo {
    let tz = now.timezone();
    let wall_clock = wall_clock_time(deadline, now.naive_local().date());
    let due = resolve_local(&tz, wall_clock);

    let tooltip = format!("{}月{}日 {}時", due.month(), due.day(), due.hour());
    let remaining_ms = due.timestamp_millis() - now.timestamp_millis();

    if remaining_ms < 0 {
        return DeadlineInfo {
            display: EXPIRED_LABEL.to_string(),
            tooltip,
            is_expired: true,
        };
    }

    let total_minutes = remaining_ms / MS_PER_MINUTE;
    let hours = total_minutes / 60;
    let display = if hours < 24 {
        format!("{:02}:{:02}", hours, total_minutes % 60)
    } else {
        format!("{}天後", hours / 24)
    };

    DeadlineInfo {
        display,
        tooltip,
        is_expired: false,
    }
}

/// Build the deadline's wall-clock time.
///
/// Missing, zero, or non-numeric date parts fall back to `today`'s. Values
/// past the end of their range carry over, so month 13 is January of the
/// next year and hour 24 is midnight of the next day.
fn wall_clock_time(deadline: &Deadline, today: NaiveDate) -> NaiveDateTime {
    let mut parts = deadline.date.split('-').map(|part| {
        part.trim()
            .parse::<i64>()
            .ok()
            .filter(|v| *v != 0)
            .map(|v| v.clamp(-MAX_COMPONENT_OFFSET, MAX_COMPONENT_OFFSET))
    });
    let year = parts.next().flatten().unwrap_or(i64::from(today.year()));
    let month = parts.next().flatten().unwrap_or(i64::from(today.month()));
    let day = parts.next().flatten().unwrap_or(i64::from(today.day()));

    let date = i32::try_from(year)
        .ok()
        .and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1))
        .and_then(|jan_first| shift_months(jan_first, month - 1))
        .and_then(|first| first.checked_add_signed(Duration::days(day - 1)))
        .unwrap_or(today);

    let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    midnight
        .checked_add_signed(Duration::hours(i64::from(deadline.hour)))
        .unwrap_or(midnight)
}

fn shift_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        date.checked_add_months(magnitude)
    } else {
        date.checked_sub_months(magnitude)
    }
}

/// Map a wall-clock time to an instant in `tz`. Ambiguous times take the
/// earlier instant; times skipped by a DST jump move forward to the first
/// hour that exists.
fn resolve_local<Tz: TimeZone>(tz: &Tz, wall_clock: NaiveDateTime) -> DateTime<Tz> {
    let mut candidate = wall_clock;
    for _ in 0..4 {
        if let Some(instant) = tz.from_local_datetime(&candidate).earliest() {
            return instant;
        }
        candidate += Duration::hours(1);
    }
    tz.from_utc_datetime(&wall_clock)
}
