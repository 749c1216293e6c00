use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

/// The external admin-authentication collaborator.
///
/// Not a security boundary on this side: the password check is delegated
/// entirely to the stats-probe endpoint.
#[async_trait]
pub trait AdminAuth: Send + Sync {
    /// Returns `true` if the endpoint accepts the password.
    async fn verify(&self, password: &str) -> Result<bool>;
}

/// Verifies the admin password against the stats-probe endpoint.
pub struct HttpAdminAuth {
    client: Client,
    stats_url: String,
}

impl HttpAdminAuth {
    /// Creates a new `HttpAdminAuth` targeting the given stats endpoint.
    pub fn new(stats_url: String) -> Self {
        Self {
            client: Client::new(),
            stats_url,
        }
    }
}

#[async_trait]
impl AdminAuth for HttpAdminAuth {
    async fn verify(&self, password: &str) -> Result<bool> {
        let response = self
            .client
            .post(&self.stats_url)
            .json(&json!({
                "action": "stats",
                "adminPassword": password,
            }))
            .send()
            .await?;

        let accepted = response.status().is_success();
        tracing::debug!("🔐 Admin stats probe returned {}", response.status());
        Ok(accepted)
    }
}
