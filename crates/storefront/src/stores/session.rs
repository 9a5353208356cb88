//! Session store: who is signed in, and with which token.

use easytrade_core::UserSession;
use secrecy::SecretString;
use tracing::{debug, warn};

use super::storage::{Storage, keys};
use super::StoreError;

/// Token assigned when the backend logs a user in without issuing one.
pub const PLACEHOLDER_TOKEN: &str = "mock_session_token_placeholder";

/// Where a login lands when no destination was remembered.
pub const DEFAULT_DESTINATION: &str = "/dashboard";

const LOGIN_PATH: &str = "/login";

/// Views that stay put on logout instead of bouncing to the login page.
const AUTH_VIEWS: [&str; 2] = [LOGIN_PATH, "/register"];

/// Signed-in identity mirrored into [`Storage`].
///
/// The identity lives under [`keys::USER`] and the token under
/// [`keys::TOKEN`]; a session is only restored when both are present.
pub struct SessionStore<S> {
    storage: S,
    user: Option<UserSession>,
    token: Option<SecretString>,
    loading: bool,
}

impl<S> std::fmt::Debug for SessionStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("user", &self.user)
            .field("loading", &self.loading)
            .finish_non_exhaustive()
    }
}

/// Accept only site-relative paths (`/x`, never `//host` or `/\host`).
#[must_use]
pub fn is_site_relative(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\")
}

impl<S: Storage> SessionStore<S> {
    /// A store that has not read its storage yet.
    pub const fn new(storage: S) -> Self {
        Self {
            storage,
            user: None,
            token: None,
            loading: true,
        }
    }

    /// Build a store and restore any persisted session.
    ///
    /// # Errors
    ///
    /// Returns the storage failure if the persisted entries cannot be read.
    pub async fn load(storage: S) -> Result<Self, StoreError> {
        let mut store = Self::new(storage);
        store.initialize().await?;
        Ok(store)
    }

    /// Restore the persisted identity and token.
    ///
    /// A corrupt identity discards both entries and leaves the store signed
    /// out.
    ///
    /// # Errors
    ///
    /// Returns the storage failure if the persisted entries cannot be read.
    pub async fn initialize(&mut self) -> Result<(), StoreError> {
        let user = self.storage.get(keys::USER).await?;
        let token = self.storage.get(keys::TOKEN).await?;

        if let (Some(user), Some(token)) = (user, token) {
            match serde_json::from_str::<UserSession>(&user) {
                Ok(user) => {
                    self.user = Some(user);
                    self.token = Some(SecretString::from(token));
                }
                Err(e) => {
                    warn!(error = %e, "Discarding unreadable session");
                    self.storage.remove(keys::USER).await?;
                    self.storage.remove(keys::TOKEN).await?;
                }
            }
        }

        self.loading = false;
        Ok(())
    }

    /// True until [`initialize`](Self::initialize) has run.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub const fn user(&self) -> Option<&UserSession> {
        self.user.as_ref()
    }

    #[must_use]
    pub const fn token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Sign in, replacing any current session.
    ///
    /// Returns the path to navigate to: the remembered destination (which
    /// is consumed) or [`DEFAULT_DESTINATION`].
    ///
    /// # Errors
    ///
    /// Returns the storage failure; the previous session stays current.
    pub async fn login(
        &mut self,
        user: UserSession,
        token: Option<String>,
    ) -> Result<String, StoreError> {
        let token = token
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| PLACEHOLDER_TOKEN.to_string());
        let snapshot = serde_json::to_string(&user)?;

        let previous_user = self.storage.get(keys::USER).await?;
        self.storage.set(keys::USER, snapshot).await?;
        if let Err(e) = self.storage.set(keys::TOKEN, token.clone()).await {
            // The old token is still stored; put its identity back with it.
            self.restore(keys::USER, previous_user).await;
            return Err(e);
        }

        debug!(username = %user.username, "Session started");
        self.user = Some(user);
        self.token = Some(SecretString::from(token));
        self.loading = false;

        self.take_destination().await
    }

    /// Sign out.
    ///
    /// Returns where to navigate next: the login page, or `None` when the
    /// visitor is already on an authentication view.
    ///
    /// # Errors
    ///
    /// Returns the storage failure; the session stays current.
    pub async fn logout(&mut self, current_path: &str) -> Result<Option<&'static str>, StoreError> {
        let previous_user = self.storage.get(keys::USER).await?;
        self.storage.remove(keys::USER).await?;
        if let Err(e) = self.storage.remove(keys::TOKEN).await {
            self.restore(keys::USER, previous_user).await;
            return Err(e);
        }

        debug!("Session ended");
        self.user = None;
        self.token = None;

        Ok((!AUTH_VIEWS.contains(&current_path)).then_some(LOGIN_PATH))
    }

    /// Remember where to send the visitor after the next login.
    ///
    /// Returns `false` (and stores nothing) unless `path` is site-relative.
    ///
    /// # Errors
    ///
    /// Returns the storage failure.
    pub async fn remember_destination(&self, path: &str) -> Result<bool, StoreError> {
        if !is_site_relative(path) {
            return Ok(false);
        }
        self.storage.set(keys::CALLBACK_URL, path.to_string()).await?;
        Ok(true)
    }

    /// Put back a slot overwritten by a half-finished write.
    async fn restore(&self, key: &str, previous: Option<String>) {
        let restored = match previous {
            Some(value) => self.storage.set(key, value).await,
            None => self.storage.remove(key).await,
        };
        if let Err(e) = restored {
            warn!(error = %e, key, "Failed to restore session slot");
        }
    }

    /// Read and clear the remembered destination.
    async fn take_destination(&self) -> Result<String, StoreError> {
        let Some(path) = self.storage.get(keys::CALLBACK_URL).await? else {
            return Ok(DEFAULT_DESTINATION.to_string());
        };
        self.storage.remove(keys::CALLBACK_URL).await?;

        Ok(if is_site_relative(&path) {
            path
        } else {
            DEFAULT_DESTINATION.to_string()
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use easytrade_core::UserId;
    use secrecy::ExposeSecret;

    use super::*;
    use crate::stores::MemoryStorage;

    /// Storage whose token slot rejects writes.
    #[derive(Clone, Default)]
    struct LockedToken(MemoryStorage);

    impl Storage for LockedToken {
        async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.0.get(key).await
        }

        async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
            if key == keys::TOKEN {
                return Err(StoreError::Backend("token slot is locked".to_string()));
            }
            self.0.set(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<(), StoreError> {
            if key == keys::TOKEN {
                return Err(StoreError::Backend("token slot is locked".to_string()));
            }
            self.0.remove(key).await
        }
    }

    fn thabo() -> UserSession {
        UserSession {
            user_id: UserId::from(12),
            username: "thabo".to_string(),
        }
    }

    #[tokio::test]
    async fn test_loading_until_initialized() {
        let mut store = SessionStore::new(MemoryStorage::new());
        assert!(store.is_loading());
        store.initialize().await.unwrap();
        assert!(!store.is_loading());
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_persists_and_restores() {
        let storage = MemoryStorage::new();
        let mut store = SessionStore::load(storage.clone()).await.unwrap();

        let destination = store.login(thabo(), Some("jwt".to_string())).await.unwrap();
        assert_eq!(destination, DEFAULT_DESTINATION);

        let restored = SessionStore::load(storage).await.unwrap();
        assert_eq!(restored.user(), Some(&thabo()));
        assert_eq!(restored.token().unwrap().expose_secret(), "jwt");
    }

    #[tokio::test]
    async fn test_login_without_token_uses_placeholder() {
        let mut store = SessionStore::load(MemoryStorage::new()).await.unwrap();
        store.login(thabo(), None).await.unwrap();
        assert_eq!(store.token().unwrap().expose_secret(), PLACEHOLDER_TOKEN);
    }

    #[tokio::test]
    async fn test_second_login_overwrites() {
        let storage = MemoryStorage::new();
        let mut store = SessionStore::load(storage.clone()).await.unwrap();
        store.login(thabo(), Some("first".to_string())).await.unwrap();

        let lindi = UserSession {
            user_id: UserId::from("u-7"),
            username: "lindi".to_string(),
        };
        store.login(lindi.clone(), Some("second".to_string())).await.unwrap();

        let restored = SessionStore::load(storage).await.unwrap();
        assert_eq!(restored.user(), Some(&lindi));
        assert_eq!(restored.token().unwrap().expose_secret(), "second");
    }

    #[tokio::test]
    async fn test_destination_is_one_shot() {
        let mut store = SessionStore::load(MemoryStorage::new()).await.unwrap();
        assert!(store.remember_destination("/products/7").await.unwrap());

        assert_eq!(store.login(thabo(), None).await.unwrap(), "/products/7");
        assert_eq!(store.login(thabo(), None).await.unwrap(), DEFAULT_DESTINATION);
    }

    #[tokio::test]
    async fn test_only_site_relative_destinations() {
        let storage = MemoryStorage::new();
        let store = SessionStore::load(storage.clone()).await.unwrap();
        assert!(!store.remember_destination("https://evil.example").await.unwrap());
        assert!(!store.remember_destination("//evil.example").await.unwrap());
        assert!(!store.remember_destination("/\\evil.example").await.unwrap());
        assert!(storage.raw(keys::CALLBACK_URL).await.is_none());
    }

    #[tokio::test]
    async fn test_tampered_destination_falls_back() {
        let storage = MemoryStorage::new();
        storage
            .set(keys::CALLBACK_URL, "//evil.example".to_string())
            .await
            .unwrap();
        let mut store = SessionStore::load(storage.clone()).await.unwrap();

        assert_eq!(store.login(thabo(), None).await.unwrap(), DEFAULT_DESTINATION);
        assert!(storage.raw(keys::CALLBACK_URL).await.is_none());
    }

    #[tokio::test]
    async fn test_logout_destination() {
        let storage = MemoryStorage::new();
        let mut store = SessionStore::load(storage.clone()).await.unwrap();

        store.login(thabo(), None).await.unwrap();
        assert_eq!(store.logout("/dashboard").await.unwrap(), Some("/login"));
        assert!(!store.is_authenticated());
        assert!(storage.raw(keys::USER).await.is_none());
        assert!(storage.raw(keys::TOKEN).await.is_none());

        store.login(thabo(), None).await.unwrap();
        assert_eq!(store.logout("/register").await.unwrap(), None);
        assert_eq!(store.logout("/login").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_identity_is_discarded() {
        let storage = MemoryStorage::new();
        storage.set(keys::USER, "{broken".to_string()).await.unwrap();
        storage.set(keys::TOKEN, "jwt".to_string()).await.unwrap();

        let store = SessionStore::load(storage.clone()).await.unwrap();
        assert!(!store.is_authenticated());
        assert!(store.token().is_none());
        assert!(storage.raw(keys::USER).await.is_none());
        assert!(storage.raw(keys::TOKEN).await.is_none());
    }

    #[tokio::test]
    async fn test_identity_without_token_is_not_restored() {
        let storage = MemoryStorage::new();
        storage
            .set(keys::USER, serde_json::to_string(&thabo()).unwrap())
            .await
            .unwrap();

        let store = SessionStore::load(storage).await.unwrap();
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn test_failed_login_keeps_previous_state() {
        let storage = MemoryStorage::new();
        let mut store = SessionStore::load(storage.clone()).await.unwrap();

        storage.fail_writes(true);
        assert!(store.login(thabo(), None).await.is_err());
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn test_failed_token_write_restores_previous_identity() {
        let memory = MemoryStorage::new();
        let mut store = SessionStore::load(memory.clone()).await.unwrap();
        store.login(thabo(), Some("first".to_string())).await.unwrap();

        let mut store = SessionStore::load(LockedToken(memory.clone())).await.unwrap();
        let lindi = UserSession {
            user_id: UserId::from("u-7"),
            username: "lindi".to_string(),
        };
        assert!(store.login(lindi, Some("second".to_string())).await.is_err());
        assert_eq!(store.user(), Some(&thabo()));

        let restored = SessionStore::load(memory).await.unwrap();
        assert_eq!(restored.user(), Some(&thabo()));
        assert_eq!(restored.token().unwrap().expose_secret(), "first");
    }

    #[tokio::test]
    async fn test_failed_first_login_leaves_nothing_behind() {
        let storage = LockedToken::default();
        let mut store = SessionStore::load(storage.clone()).await.unwrap();

        assert!(store.login(thabo(), None).await.is_err());
        assert!(!store.is_authenticated());
        assert!(storage.0.raw(keys::USER).await.is_none());
    }

    #[tokio::test]
    async fn test_failed_logout_keeps_session_restorable() {
        let memory = MemoryStorage::new();
        let mut store = SessionStore::load(memory.clone()).await.unwrap();
        store.login(thabo(), Some("jwt".to_string())).await.unwrap();

        let mut store = SessionStore::load(LockedToken(memory.clone())).await.unwrap();
        assert!(store.logout("/dashboard").await.is_err());
        assert!(store.is_authenticated());

        let restored = SessionStore::load(memory).await.unwrap();
        assert_eq!(restored.user(), Some(&thabo()));
        assert_eq!(restored.token().unwrap().expose_secret(), "jwt");
    }
}
