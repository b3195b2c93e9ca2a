//! Date-only comparison helpers. Every scheduling rule compares calendar
//! days in UTC and ignores the time of day; keeping the comparisons in pure
//! functions keeps timezone handling in one place.

use chrono::{DateTime, NaiveDate, Utc};

pub fn date_only(instant: DateTime<Utc>) -> NaiveDate {
    instant.date_naive()
}

/// True when `schedule` falls on a later calendar day than `now`.
pub fn is_at_least_one_day_ahead(schedule: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    date_only(schedule) > date_only(now)
}

/// True when `candidate` falls on the same calendar day as `anchor` or later.
pub fn is_on_or_after(candidate: DateTime<Utc>, anchor: DateTime<Utc>) -> bool {
    date_only(candidate) >= date_only(anchor)
}
