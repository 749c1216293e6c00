use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sentinel token held by admin-granted sessions.
pub const ADMIN_TOKEN: &str = "admin";
/// Sentinel code held by admin-granted sessions.
pub const ADMIN_CODE: &str = "ADMIN";

/// The controller-visible access state.
///
/// A non-admin session is valid only while the backing record exists and the
/// locally cached timestamp is inside the sliding window; admin sessions do
/// not expire until explicitly revoked.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessState {
    /// Whether the caller may currently view the secret menu.
    pub has_access: bool,
    /// Whether an access check is still in flight.
    pub is_loading: bool,
    /// The active session token, `"admin"` for admin-granted sessions.
    pub access_token: Option<String>,
    /// The unlock code bound to this session, `"ADMIN"` for admin sessions.
    pub secret_code: Option<String>,
    /// Distinguishes the permanent admin bypass from a time-limited grant.
    pub is_admin_access: bool,
}

impl AccessState {
    /// The state a freshly constructed controller starts in.
    pub fn initial() -> Self {
        Self {
            has_access: false,
            is_loading: true,
            access_token: None,
            secret_code: None,
            is_admin_access: false,
        }
    }

    /// The fully-locked resolved state.
    pub fn locked() -> Self {
        Self {
            is_loading: false,
            ..Self::initial()
        }
    }

    /// An unlocked state for a user-granted session.
    pub fn unlocked(token: String, secret_code: String) -> Self {
        Self {
            has_access: true,
            is_loading: false,
            access_token: Some(token),
            secret_code: Some(secret_code),
            is_admin_access: false,
        }
    }

    /// The unlocked state for the permanent admin bypass.
    pub fn admin() -> Self {
        Self {
            has_access: true,
            is_loading: false,
            access_token: Some(ADMIN_TOKEN.to_string()),
            secret_code: Some(ADMIN_CODE.to_string()),
            is_admin_access: true,
        }
    }
}

/// A session record to insert. Inserts are append-only: every grant mints a
/// brand-new token, so there is no read-modify-write cycle on the store.
#[derive(Debug, Clone)]
pub struct NewSessionRecord {
    pub email: String,
    pub phone: String,
    pub first_name: String,
    pub access_token: String,
    /// Uppercase-normalized before storage.
    pub secret_code: String,
    /// Monday of the grant week, local calendar.
    pub week_start: NaiveDate,
}

/// A stored session record. `expires_at` is assigned by the store at insert
/// and gates validity independently of the client-side sliding window.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub id: Uuid,
    pub email: String,
    pub phone: String,
    pub first_name: String,
    pub access_token: String,
    pub secret_code: String,
    pub week_start: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
