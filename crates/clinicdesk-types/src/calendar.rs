//! Calendar helpers
//!
//! Pure functions mapping timestamps onto the clinic's working calendar.
//! Every sequence scope and list filter derives its day and year here so
//! that "today" and "this year" mean the same thing everywhere.

use chrono::{DateTime, Datelike, NaiveDate, Utc};

/// Calendar day a timestamp falls on
pub fn day_of(ts: DateTime<Utc>) -> NaiveDate {
    ts.date_naive()
}

/// Calendar year a date falls in
pub fn year_of(date: NaiveDate) -> i32 {
    date.year()
}
