use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// The active unlock code for one calendar week (Monday through Sunday).
///
/// One active row per week; the most recent `week_start` wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyCode {
    /// Monday of the week this code belongs to, local calendar.
    pub week_start: NaiveDate,
    /// The unlock code, stored uppercase.
    pub secret_code: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
