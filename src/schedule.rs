//! Daily time-of-day trigger.

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Utc};

/// Next instant strictly after `now` at local time `at`.
pub fn next_run(now: DateTime<Utc>, at: NaiveTime, offset: FixedOffset) -> DateTime<Utc> {
    let local = now.with_timezone(&offset);
    let shift = Duration::seconds(offset.local_minus_utc() as i64);

    let today = (local.date_naive().and_time(at) - shift).and_utc();
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}

/// Wall-clock wait from `now` until `target` (zero if already past).
pub fn wait_until(now: DateTime<Utc>, target: DateTime<Utc>) -> std::time::Duration {
    (target - now).to_std().unwrap_or(std::time::Duration::ZERO)
}
