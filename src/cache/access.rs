use crate::error::Result;
use async_trait::async_trait;

/// Key holding the current session token.
pub const TOKEN_KEY: &str = "secret_access_token";
/// Key holding the epoch-ms timestamp of the last grant or refresh.
pub const TIMESTAMP_KEY: &str = "secret_access_timestamp";
/// Key holding the literal `"true"` while the admin bypass is active.
pub const ADMIN_ACCESS_KEY: &str = "admin_secret_menu_access";

/// The client-held key-value store the controller caches its session in.
///
/// The cache is never the source of truth for a non-admin session; it is a
/// sliding-expiry cache over the backing session record. Every failure on
/// this interface degrades to "no session" at the controller boundary.
#[async_trait]
pub trait AccessCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;
}
