use crate::cache::redis::RedisAccessCache;
use crate::clients::admin::{AdminAuth, HttpAdminAuth};
use crate::config::Config;
use crate::error::Result;
use crate::services::access::SecretAccessController;
use crate::services::store::{PgStore, SessionStore, WeeklyCodeStore};
use deadpool_postgres::Pool;
use redis::aio::ConnectionManager;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// One [`SecretAccessController`] per device, keyed by the device cookie.
///
/// Each controller owns the Redis cache namespace for its device, so
/// concurrent requests from the same device share one generation counter.
#[derive(Clone)]
pub struct ControllerRegistry {
    controllers: Arc<RwLock<HashMap<String, Arc<SecretAccessController>>>>,
    redis: ConnectionManager,
    sessions: Arc<dyn SessionStore>,
    codes: Arc<dyn WeeklyCodeStore>,
    admin: Arc<dyn AdminAuth>,
    session_ttl_minutes: i64,
}

impl ControllerRegistry {
    /// Creates a new `ControllerRegistry`.
    pub fn new(
        redis: ConnectionManager,
        sessions: Arc<dyn SessionStore>,
        codes: Arc<dyn WeeklyCodeStore>,
        admin: Arc<dyn AdminAuth>,
        session_ttl_minutes: i64,
    ) -> Self {
        Self {
            controllers: Arc::new(RwLock::new(HashMap::new())),
            redis,
            sessions,
            codes,
            admin,
            session_ttl_minutes,
        }
    }

    /// Gets the controller for a device, creating it on first sight.
    pub async fn get_or_create(&self, device_id: &str) -> Arc<SecretAccessController> {
        {
            let controllers = self.controllers.read().await;
            if let Some(controller) = controllers.get(device_id) {
                return controller.clone();
            }
        }

        let mut controllers = self.controllers.write().await;
        controllers
            .entry(device_id.to_string())
            .or_insert_with(|| {
                let cache = Arc::new(RedisAccessCache::new(
                    self.redis.clone(),
                    format!("secret_menu:{}", device_id),
                ));
                Arc::new(SecretAccessController::new(
                    cache,
                    self.sessions.clone(),
                    self.codes.clone(),
                    self.admin.clone(),
                    self.session_ttl_minutes,
                ))
            })
            .clone()
    }
}

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The database connection pool.
    pub db: Pool,
    /// The Redis connection manager.
    pub redis: ConnectionManager,
    /// The application's configuration.
    pub config: Config,
    /// The admin-authentication collaborator.
    pub admin: Arc<dyn AdminAuth>,
    /// Per-device access controllers.
    pub controllers: ControllerRegistry,
}

impl AppState {
    /// Creates a new `AppState`.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = crate::db::create_pool(&config.database_url)?;
        tracing::info!("✅ PostgreSQL pool initialized");

        let redis_client = redis::Client::open(config.redis_url.as_str())?;
        let redis = ConnectionManager::new(redis_client).await?;
        tracing::info!("✅ Redis connection manager initialized");

        let store = Arc::new(PgStore::new(db.clone(), config.session_record_ttl_days));
        let admin: Arc<dyn AdminAuth> =
            Arc::new(HttpAdminAuth::new(config.admin_stats_url.clone()));

        let controllers = ControllerRegistry::new(
            redis.clone(),
            store.clone(),
            store,
            admin.clone(),
            config.session_ttl_minutes,
        );
        tracing::info!("✅ Controller registry initialized");

        Ok(AppState {
            db,
            redis,
            config: config.clone(),
            admin,
            controllers,
        })
    }
}
