use chrono::{Datelike, Duration, NaiveDate};

/// Returns the most recent Monday for the given local date.
///
/// The computation stays in local calendar terms; converting through UTC
/// would shift the date near midnight for timezones east of UTC.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Formats the week start for the given local date as `YYYY-MM-DD`.
pub fn week_start_string(date: NaiveDate) -> String {
    week_start(date).format("%Y-%m-%d").to_string()
}
