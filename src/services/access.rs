use crate::cache::access::{ADMIN_ACCESS_KEY, AccessCache, TIMESTAMP_KEY, TOKEN_KEY};
use crate::clients::admin::AdminAuth;
use crate::error::Result;
use crate::models::session::{AccessState, NewSessionRecord};
use crate::services::store::{SessionStore, WeeklyCodeStore};
use crate::services::{token, week};
use chrono::{Duration, Local, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// Placeholder identity for anonymous weekly-code grants.
const ANONYMOUS_EMAIL: &str = "anonymous";
const ANONYMOUS_PHONE: &str = "";
const ANONYMOUS_FIRST_NAME: &str = "Anonymous";

/// Single authority for whether the caller may view the secret menu.
///
/// Three unlock paths (weekly code, admin password, quiz consolation grant)
/// converge on the same cached session; non-admin sessions slide-expire
/// after `session_ttl` and are only valid while their backing record exists.
/// Wrong codes, missing records, and backend failures all resolve to the
/// same locked/`false` outcome so the caller cannot tell them apart.
pub struct SecretAccessController {
    cache: Arc<dyn AccessCache>,
    sessions: Arc<dyn SessionStore>,
    codes: Arc<dyn WeeklyCodeStore>,
    admin: Arc<dyn AdminAuth>,
    session_ttl: Duration,
    state: RwLock<AccessState>,
    generation: AtomicU64,
}

impl SecretAccessController {
    /// Creates a new `SecretAccessController`.
    ///
    /// # Arguments
    ///
    /// * `cache` - The client-held key-value store.
    /// * `sessions` - The session record collaborator.
    /// * `codes` - The weekly code collaborator.
    /// * `admin` - The admin-authentication collaborator.
    /// * `session_ttl_minutes` - The sliding session window.
    pub fn new(
        cache: Arc<dyn AccessCache>,
        sessions: Arc<dyn SessionStore>,
        codes: Arc<dyn WeeklyCodeStore>,
        admin: Arc<dyn AdminAuth>,
        session_ttl_minutes: i64,
    ) -> Self {
        Self {
            cache,
            sessions,
            codes,
            admin,
            session_ttl: Duration::minutes(session_ttl_minutes),
            state: RwLock::new(AccessState::initial()),
            generation: AtomicU64::new(0),
        }
    }

    /// Returns a snapshot of the current access state.
    pub async fn state(&self) -> AccessState {
        self.state.read().await.clone()
    }

    /// Re-evaluates access. Idempotent; safe to call on every page load.
    ///
    /// Each call claims a new generation; a check that is superseded by a
    /// later call (or any mutation) before it resolves has its result
    /// discarded instead of clobbering newer state.
    pub async fn check_access(&self) -> AccessState {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let next = match self.resolve_access(generation).await {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!("❌ Access check failed: {}", e);
                AccessState::locked()
            }
        };

        self.commit(generation, next).await
    }

    async fn resolve_access(&self, generation: u64) -> Result<AccessState> {
        // Admin bypass takes precedence, even over corrupt session state.
        if let Some(flag) = self.cache.get(ADMIN_ACCESS_KEY).await? {
            if flag == "true" {
                return Ok(AccessState::admin());
            }
        }

        if let Some(raw) = self.cache.get(TIMESTAMP_KEY).await? {
            let now_ms = Utc::now().timestamp_millis();
            // An unparseable timestamp counts as expired.
            let expired = match raw.parse::<i64>() {
                Ok(granted_at) => now_ms - granted_at > self.session_ttl.num_milliseconds(),
                Err(_) => true,
            };
            if expired {
                tracing::debug!("⏳ Cached session expired, clearing");
                self.clear_session_keys().await;
                return Ok(AccessState::locked());
            }
        }

        let Some(access_token) = self.cache.get(TOKEN_KEY).await? else {
            return Ok(AccessState::locked());
        };

        match self.sessions.find_valid(&access_token).await {
            Ok(Some(record)) => {
                // Only the still-current check may refresh the sliding window.
                if !self.is_current(generation) {
                    return Ok(self.state.read().await.clone());
                }
                self.cache
                    .set(TIMESTAMP_KEY, &Utc::now().timestamp_millis().to_string())
                    .await?;
                tracing::debug!("✅ Session token validated, window renewed");
                Ok(AccessState::unlocked(access_token, record.secret_code))
            }
            Ok(None) => {
                tracing::debug!("🔒 No valid backing record for cached token, clearing");
                self.clear_session_keys().await;
                Ok(AccessState::locked())
            }
            Err(e) => {
                tracing::warn!("❌ Session lookup failed: {}", e);
                self.clear_session_keys().await;
                Ok(AccessState::locked())
            }
        }
    }

    /// Verifies a weekly unlock code.
    ///
    /// Returns `false` for a wrong code, a missing active code, or any
    /// backend failure; the caller cannot distinguish them.
    pub async fn verify_code(&self, code: &str) -> bool {
        match self.try_verify_code(code).await {
            Ok(granted) => granted,
            Err(e) => {
                tracing::warn!("❌ Code verification failed: {}", e);
                false
            }
        }
    }

    async fn try_verify_code(&self, code: &str) -> Result<bool> {
        let Some(active) = self.codes.find_active().await? else {
            tracing::debug!("🔒 No active weekly code");
            return Ok(false);
        };

        let normalized = code.trim().to_uppercase();
        if normalized != active.secret_code.to_uppercase() {
            return Ok(false);
        }

        let access_token = token::generate();
        self.sessions
            .insert(NewSessionRecord {
                email: ANONYMOUS_EMAIL.to_string(),
                phone: ANONYMOUS_PHONE.to_string(),
                first_name: ANONYMOUS_FIRST_NAME.to_string(),
                access_token: access_token.clone(),
                secret_code: normalized.clone(),
                week_start: week::week_start(Local::now().date_naive()),
            })
            .await?;

        if let Err(e) = self.persist_grant(&access_token).await {
            self.clear_session_keys().await;
            return Err(e);
        }

        self.apply(AccessState::unlocked(access_token, normalized)).await;
        tracing::info!("✅ Weekly code accepted, session granted");
        Ok(true)
    }

    /// Verifies the admin password against the external collaborator.
    ///
    /// On success the permanent bypass flag is set; it never expires until
    /// explicitly revoked. Failure or network error returns `false` without
    /// mutating any state.
    pub async fn verify_admin_access(&self, password: &str) -> bool {
        match self.try_verify_admin(password).await {
            Ok(granted) => granted,
            Err(e) => {
                tracing::warn!("❌ Admin verification failed: {}", e);
                false
            }
        }
    }

    async fn try_verify_admin(&self, password: &str) -> Result<bool> {
        if !self.admin.verify(password).await? {
            return Ok(false);
        }

        self.cache.set(ADMIN_ACCESS_KEY, "true").await?;
        self.apply(AccessState::admin()).await;
        tracing::info!("✅ Admin bypass enabled");
        Ok(true)
    }

    /// Grants consolation access to a quiz participant.
    ///
    /// Always mints a brand-new token; duplicate grants for the same person
    /// are not deduplicated. Returns `None` on any persistence error,
    /// leaving prior state unchanged.
    pub async fn grant_access_from_quiz(
        &self,
        email: &str,
        phone: &str,
        first_name: &str,
        secret_code: &str,
    ) -> Option<String> {
        match self
            .try_grant_from_quiz(email, phone, first_name, secret_code)
            .await
        {
            Ok(access_token) => Some(access_token),
            Err(e) => {
                tracing::warn!("❌ Quiz grant failed: {}", e);
                None
            }
        }
    }

    async fn try_grant_from_quiz(
        &self,
        email: &str,
        phone: &str,
        first_name: &str,
        secret_code: &str,
    ) -> Result<String> {
        let access_token = token::generate();
        let normalized = secret_code.trim().to_uppercase();

        self.sessions
            .insert(NewSessionRecord {
                email: email.to_string(),
                phone: phone.to_string(),
                first_name: first_name.to_string(),
                access_token: access_token.clone(),
                secret_code: normalized.clone(),
                week_start: week::week_start(Local::now().date_naive()),
            })
            .await?;

        if let Err(e) = self.persist_grant(&access_token).await {
            self.clear_session_keys().await;
            return Err(e);
        }

        self.apply(AccessState::unlocked(access_token.clone(), normalized))
            .await;
        tracing::info!("✅ Quiz consolation session granted");
        Ok(access_token)
    }

    /// Clears the session cache and the admin bypass, unconditionally
    /// resetting to the fully-locked shape. Best-effort; cache errors are
    /// swallowed.
    pub async fn revoke_access(&self) {
        for key in [TOKEN_KEY, TIMESTAMP_KEY, ADMIN_ACCESS_KEY] {
            if let Err(e) = self.cache.remove(key).await {
                tracing::debug!("Failed to clear {} during revoke: {}", key, e);
            }
        }
        self.apply(AccessState::locked()).await;
        tracing::info!("🔒 Secret menu access revoked");
    }

    async fn persist_grant(&self, access_token: &str) -> Result<()> {
        self.cache.set(TOKEN_KEY, access_token).await?;
        self.cache
            .set(TIMESTAMP_KEY, &Utc::now().timestamp_millis().to_string())
            .await?;
        Ok(())
    }

    async fn clear_session_keys(&self) {
        for key in [TOKEN_KEY, TIMESTAMP_KEY] {
            if let Err(e) = self.cache.remove(key).await {
                tracing::debug!("Failed to clear {}: {}", key, e);
            }
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Commits a check result unless a newer generation superseded it.
    async fn commit(&self, generation: u64, next: AccessState) -> AccessState {
        let mut state = self.state.write().await;
        if self.generation.load(Ordering::SeqCst) == generation {
            *state = next;
        }
        state.clone()
    }

    /// Commits a mutation; mutations always supersede in-flight checks.
    async fn apply(&self, next: AccessState) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.write().await;
        *state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::session::{ADMIN_CODE, ADMIN_TOKEN, SessionRecord};
    use crate::models::weekly_code::WeeklyCode;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicBool;
    use tokio::sync::Notify;
    use uuid::Uuid;

    struct MemoryAccessCache {
        map: Mutex<HashMap<String, String>>,
    }

    impl MemoryAccessCache {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                map: Mutex::new(HashMap::new()),
            })
        }

        fn value(&self, key: &str) -> Option<String> {
            self.map.lock().unwrap().get(key).cloned()
        }

        fn put(&self, key: &str, value: &str) {
            self.map.lock().unwrap().insert(key.to_string(), value.to_string());
        }
    }

    #[async_trait]
    impl AccessCache for MemoryAccessCache {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            Ok(self.map.lock().unwrap().get(key).cloned())
        }

        async fn set(&self, key: &str, value: &str) -> Result<()> {
            self.map.lock().unwrap().insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn remove(&self, key: &str) -> Result<()> {
            self.map.lock().unwrap().remove(key);
            Ok(())
        }
    }

    /// Models a client without persistent local storage.
    struct UnavailableCache;

    #[async_trait]
    impl AccessCache for UnavailableCache {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(AppError::Internal("no local storage".to_string()))
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(AppError::Internal("no local storage".to_string()))
        }

        async fn remove(&self, _key: &str) -> Result<()> {
            Err(AppError::Internal("no local storage".to_string()))
        }
    }

    struct MemoryStore {
        sessions: Mutex<Vec<SessionRecord>>,
        active_code: Mutex<Option<WeeklyCode>>,
        fail_inserts: AtomicBool,
    }

    impl MemoryStore {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                sessions: Mutex::new(Vec::new()),
                active_code: Mutex::new(None),
                fail_inserts: AtomicBool::new(false),
            })
        }

        fn with_active_code(secret_code: &str) -> Arc<Self> {
            let store = Self::new();
            *store.active_code.lock().unwrap() = Some(WeeklyCode {
                week_start: week::week_start(Local::now().date_naive()),
                secret_code: secret_code.to_string(),
                is_active: true,
                created_at: Utc::now(),
            });
            store
        }

        fn seed_session(&self, access_token: &str, secret_code: &str) {
            let now = Utc::now();
            self.sessions.lock().unwrap().push(SessionRecord {
                id: Uuid::new_v4(),
                email: "seed@example.com".to_string(),
                phone: "0600000000".to_string(),
                first_name: "Seed".to_string(),
                access_token: access_token.to_string(),
                secret_code: secret_code.to_string(),
                week_start: week::week_start(now.date_naive()),
                created_at: now,
                expires_at: now + Duration::days(7),
            });
        }
    }

    #[async_trait]
    impl SessionStore for MemoryStore {
        async fn insert(&self, record: NewSessionRecord) -> Result<SessionRecord> {
            if self.fail_inserts.load(Ordering::SeqCst) {
                return Err(AppError::Internal("insert failed".to_string()));
            }
            let now = Utc::now();
            let stored = SessionRecord {
                id: Uuid::new_v4(),
                email: record.email,
                phone: record.phone,
                first_name: record.first_name,
                access_token: record.access_token,
                secret_code: record.secret_code,
                week_start: record.week_start,
                created_at: now,
                expires_at: now + Duration::days(7),
            };
            self.sessions.lock().unwrap().push(stored.clone());
            Ok(stored)
        }

        async fn find_valid(&self, access_token: &str) -> Result<Option<SessionRecord>> {
            let now = Utc::now();
            Ok(self
                .sessions
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.access_token == access_token && r.expires_at > now)
                .cloned())
        }
    }

    #[async_trait]
    impl WeeklyCodeStore for MemoryStore {
        async fn find_active(&self) -> Result<Option<WeeklyCode>> {
            Ok(self.active_code.lock().unwrap().clone())
        }
    }

    /// Blocks `find_valid` until notified, to order a stale check after a
    /// competing mutation.
    struct GatedStore {
        inner: Arc<MemoryStore>,
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl SessionStore for GatedStore {
        async fn insert(&self, record: NewSessionRecord) -> Result<SessionRecord> {
            self.inner.insert(record).await
        }

        async fn find_valid(&self, access_token: &str) -> Result<Option<SessionRecord>> {
            self.gate.notified().await;
            self.inner.find_valid(access_token).await
        }
    }

    struct FakeAdminAuth {
        accept: bool,
    }

    #[async_trait]
    impl AdminAuth for FakeAdminAuth {
        async fn verify(&self, _password: &str) -> Result<bool> {
            Ok(self.accept)
        }
    }

    struct BrokenAdminAuth;

    #[async_trait]
    impl AdminAuth for BrokenAdminAuth {
        async fn verify(&self, _password: &str) -> Result<bool> {
            Err(AppError::Internal("admin endpoint unreachable".to_string()))
        }
    }

    fn controller(
        cache: Arc<MemoryAccessCache>,
        store: Arc<MemoryStore>,
    ) -> SecretAccessController {
        SecretAccessController::new(
            cache,
            store.clone(),
            store,
            Arc::new(FakeAdminAuth { accept: false }),
            30,
        )
    }

    fn now_ms() -> i64 {
        Utc::now().timestamp_millis()
    }

    #[tokio::test]
    async fn fresh_controller_reports_locked_after_first_check() {
        let cache = MemoryAccessCache::new();
        let ctrl = controller(cache, MemoryStore::new());

        assert!(ctrl.state().await.is_loading);

        let state = ctrl.check_access().await;
        assert!(!state.has_access);
        assert!(!state.is_loading);
        assert!(state.access_token.is_none());
    }

    #[tokio::test]
    async fn expired_session_is_cleared() {
        let cache = MemoryAccessCache::new();
        let store = MemoryStore::new();
        store.seed_session("tok-1", "CREPE25");
        cache.put(TOKEN_KEY, "tok-1");
        cache.put(TIMESTAMP_KEY, &(now_ms() - 31 * 60 * 1000).to_string());

        let ctrl = controller(cache.clone(), store);
        let state = ctrl.check_access().await;

        assert!(!state.has_access);
        assert!(!state.is_loading);
        assert!(cache.value(TOKEN_KEY).is_none());
        assert!(cache.value(TIMESTAMP_KEY).is_none());
    }

    #[tokio::test]
    async fn unparseable_timestamp_counts_as_expired() {
        let cache = MemoryAccessCache::new();
        let store = MemoryStore::new();
        store.seed_session("tok-1", "CREPE25");
        cache.put(TOKEN_KEY, "tok-1");
        cache.put(TIMESTAMP_KEY, "garbage");

        let ctrl = controller(cache.clone(), store);
        let state = ctrl.check_access().await;

        assert!(!state.has_access);
        assert!(cache.value(TOKEN_KEY).is_none());
    }

    #[tokio::test]
    async fn admin_flag_takes_precedence_over_corrupt_session() {
        let cache = MemoryAccessCache::new();
        cache.put(ADMIN_ACCESS_KEY, "true");
        cache.put(TOKEN_KEY, "tok-1");
        cache.put(TIMESTAMP_KEY, "garbage");

        let ctrl = controller(cache, MemoryStore::new());
        let state = ctrl.check_access().await;

        assert!(state.has_access);
        assert!(state.is_admin_access);
        assert_eq!(state.access_token.as_deref(), Some(ADMIN_TOKEN));
        assert_eq!(state.secret_code.as_deref(), Some(ADMIN_CODE));
    }

    #[tokio::test]
    async fn missing_backing_record_clears_cache() {
        let cache = MemoryAccessCache::new();
        cache.put(TOKEN_KEY, "ghost");
        cache.put(TIMESTAMP_KEY, &now_ms().to_string());

        let ctrl = controller(cache.clone(), MemoryStore::new());
        let state = ctrl.check_access().await;

        assert!(!state.has_access);
        assert!(cache.value(TOKEN_KEY).is_none());
    }

    #[tokio::test]
    async fn unavailable_cache_reports_locked_not_fatal() {
        let store = MemoryStore::new();
        let ctrl = SecretAccessController::new(
            Arc::new(UnavailableCache),
            store.clone(),
            store,
            Arc::new(FakeAdminAuth { accept: false }),
            30,
        );

        let state = ctrl.check_access().await;
        assert!(!state.has_access);
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn valid_session_renews_sliding_window() {
        let cache = MemoryAccessCache::new();
        let store = MemoryStore::new();
        store.seed_session("tok-1", "CREPE25");
        cache.put(TOKEN_KEY, "tok-1");
        let seeded = now_ms() - 5_000;
        cache.put(TIMESTAMP_KEY, &seeded.to_string());

        let ctrl = controller(cache.clone(), store);

        let state = ctrl.check_access().await;
        assert!(state.has_access);
        assert_eq!(state.secret_code.as_deref(), Some("CREPE25"));
        let first: i64 = cache.value(TIMESTAMP_KEY).unwrap().parse().unwrap();
        assert!(first > seeded);

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let state = ctrl.check_access().await;
        assert!(state.has_access);
        let second: i64 = cache.value(TIMESTAMP_KEY).unwrap().parse().unwrap();
        assert!(second > first);
    }

    #[tokio::test]
    async fn code_verification_is_case_insensitive() {
        let store = MemoryStore::with_active_code("CREPE25");

        let lower = controller(MemoryAccessCache::new(), store.clone());
        assert!(lower.verify_code("crepe25").await);
        assert!(lower.state().await.has_access);
        assert!(!lower.state().await.is_admin_access);

        let upper = controller(MemoryAccessCache::new(), store);
        assert!(upper.verify_code("CREPE25").await);
    }

    #[tokio::test]
    async fn wrong_code_leaves_state_untouched() {
        let cache = MemoryAccessCache::new();
        let ctrl = controller(cache.clone(), MemoryStore::with_active_code("CREPE25"));

        assert!(!ctrl.verify_code("WRONG").await);

        assert!(!ctrl.state().await.has_access);
        assert!(cache.value(TOKEN_KEY).is_none());
        assert!(cache.value(TIMESTAMP_KEY).is_none());
    }

    #[tokio::test]
    async fn no_active_code_fails_verification() {
        let ctrl = controller(MemoryAccessCache::new(), MemoryStore::new());
        assert!(!ctrl.verify_code("CREPE25").await);
    }

    #[tokio::test]
    async fn insert_failure_is_indistinguishable_from_wrong_code() {
        let cache = MemoryAccessCache::new();
        let store = MemoryStore::with_active_code("CREPE25");
        store.fail_inserts.store(true, Ordering::SeqCst);

        let ctrl = controller(cache.clone(), store);

        assert!(!ctrl.verify_code("CREPE25").await);
        assert!(!ctrl.state().await.has_access);
        assert!(cache.value(TOKEN_KEY).is_none());
        assert!(cache.value(TIMESTAMP_KEY).is_none());
    }

    #[tokio::test]
    async fn quiz_grant_then_reload_restores_access() {
        let cache = MemoryAccessCache::new();
        let store = MemoryStore::new();

        let ctrl = controller(cache.clone(), store.clone());
        let access_token = ctrl
            .grant_access_from_quiz("a@b.com", "0600000000", "Ana", "CREPE25")
            .await;
        let access_token = access_token.expect("quiz grant should issue a token");
        assert_eq!(cache.value(TOKEN_KEY).as_deref(), Some(access_token.as_str()));

        // A fresh controller over the same cache and store simulates a reload.
        let reloaded = controller(cache, store);
        let state = reloaded.check_access().await;
        assert!(state.has_access);
        assert_eq!(state.secret_code.as_deref(), Some("CREPE25"));
        assert!(!state.is_admin_access);
        assert_eq!(state.access_token.as_deref(), Some(access_token.as_str()));
    }

    #[tokio::test]
    async fn quiz_grant_returns_none_on_persistence_error() {
        let cache = MemoryAccessCache::new();
        let store = MemoryStore::new();
        store.fail_inserts.store(true, Ordering::SeqCst);

        let ctrl = controller(cache.clone(), store);
        let granted = ctrl
            .grant_access_from_quiz("a@b.com", "0600000000", "Ana", "CREPE25")
            .await;

        assert!(granted.is_none());
        assert!(!ctrl.state().await.has_access);
        assert!(cache.value(TOKEN_KEY).is_none());
    }

    #[tokio::test]
    async fn admin_password_unlocks_and_persists_bypass() {
        let cache = MemoryAccessCache::new();
        let store = MemoryStore::new();
        let ctrl = SecretAccessController::new(
            cache.clone(),
            store.clone(),
            store.clone(),
            Arc::new(FakeAdminAuth { accept: true }),
            30,
        );

        assert!(ctrl.verify_admin_access("hunter2").await);
        assert_eq!(cache.value(ADMIN_ACCESS_KEY).as_deref(), Some("true"));
        let state = ctrl.state().await;
        assert!(state.has_access);
        assert!(state.is_admin_access);

        // The bypass survives a reload and ignores the session window.
        let reloaded = controller(cache, store);
        assert!(reloaded.check_access().await.has_access);
    }

    #[tokio::test]
    async fn rejected_admin_password_mutates_nothing() {
        let cache = MemoryAccessCache::new();
        let ctrl = controller(cache.clone(), MemoryStore::new());

        assert!(!ctrl.verify_admin_access("wrong").await);
        assert!(cache.value(ADMIN_ACCESS_KEY).is_none());
        assert!(!ctrl.state().await.has_access);
    }

    #[tokio::test]
    async fn admin_network_error_mutates_nothing() {
        let cache = MemoryAccessCache::new();
        let store = MemoryStore::new();
        let ctrl = SecretAccessController::new(
            cache.clone(),
            store.clone(),
            store,
            Arc::new(BrokenAdminAuth),
            30,
        );

        assert!(!ctrl.verify_admin_access("hunter2").await);
        assert!(cache.value(ADMIN_ACCESS_KEY).is_none());
    }

    #[tokio::test]
    async fn revocation_is_complete() {
        let cache = MemoryAccessCache::new();
        let store = MemoryStore::with_active_code("CREPE25");
        cache.put(ADMIN_ACCESS_KEY, "true");

        let ctrl = controller(cache.clone(), store.clone());
        assert!(ctrl.verify_code("CREPE25").await);

        ctrl.revoke_access().await;

        let state = ctrl.state().await;
        assert!(!state.has_access);
        assert!(!state.is_loading);
        assert!(state.access_token.is_none());
        assert!(cache.value(TOKEN_KEY).is_none());
        assert!(cache.value(TIMESTAMP_KEY).is_none());
        assert!(cache.value(ADMIN_ACCESS_KEY).is_none());

        assert!(!ctrl.check_access().await.has_access);

        // A fresh controller over the same cache is locked too.
        let reloaded = controller(cache, store);
        assert!(!reloaded.check_access().await.has_access);
    }

    #[tokio::test]
    async fn stale_check_result_is_discarded() {
        let cache = MemoryAccessCache::new();
        let inner = MemoryStore::new();
        inner.seed_session("tok-1", "CREPE25");
        cache.put(TOKEN_KEY, "tok-1");
        cache.put(TIMESTAMP_KEY, &now_ms().to_string());

        let gate = Arc::new(Notify::new());
        let gated = Arc::new(GatedStore {
            inner: inner.clone(),
            gate: gate.clone(),
        });

        let ctrl = Arc::new(SecretAccessController::new(
            cache.clone(),
            gated,
            inner,
            Arc::new(FakeAdminAuth { accept: false }),
            30,
        ));

        let in_flight = tokio::spawn({
            let ctrl = ctrl.clone();
            async move { ctrl.check_access().await }
        });
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        // Revoke while the lookup is still in flight, then let it resolve.
        ctrl.revoke_access().await;
        gate.notify_one();

        let stale = in_flight.await.unwrap();
        assert!(!stale.has_access);
        assert!(!ctrl.state().await.has_access);
        // The superseded check must not have re-written the session window.
        assert!(cache.value(TIMESTAMP_KEY).is_none());
    }
}
