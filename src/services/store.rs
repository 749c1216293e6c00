use crate::error::Result;
use crate::models::session::{NewSessionRecord, SessionRecord};
use crate::models::weekly_code::WeeklyCode;
use crate::repositories::{session as session_repo, weekly_code as weekly_code_repo};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use deadpool_postgres::Pool;

/// The persistence collaborator for session records.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Inserts a session record; the store assigns `expires_at`.
    async fn insert(&self, record: NewSessionRecord) -> Result<SessionRecord>;

    /// Point lookup by token, `None` if absent or expired.
    async fn find_valid(&self, access_token: &str) -> Result<Option<SessionRecord>>;
}

/// The persistence collaborator for the weekly unlock code.
#[async_trait]
pub trait WeeklyCodeStore: Send + Sync {
    /// Reads the single active code row, most recent week first.
    async fn find_active(&self) -> Result<Option<WeeklyCode>>;
}

/// The PostgreSQL-backed store.
pub struct PgStore {
    pool: Pool,
    record_ttl_days: i64,
}

impl PgStore {
    /// Creates a new `PgStore`.
    ///
    /// # Arguments
    ///
    /// * `pool` - The database connection pool.
    /// * `record_ttl_days` - The TTL assigned to inserted session records.
    pub fn new(pool: Pool, record_ttl_days: i64) -> Self {
        Self {
            pool,
            record_ttl_days,
        }
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn insert(&self, record: NewSessionRecord) -> Result<SessionRecord> {
        let expires_at = Utc::now() + Duration::days(self.record_ttl_days);
        session_repo::insert(&self.pool, &record, expires_at).await
    }

    async fn find_valid(&self, access_token: &str) -> Result<Option<SessionRecord>> {
        session_repo::find_valid(&self.pool, access_token).await
    }
}

#[async_trait]
impl WeeklyCodeStore for PgStore {
    async fn find_active(&self) -> Result<Option<WeeklyCode>> {
        weekly_code_repo::find_active(&self.pool).await
    }
}
