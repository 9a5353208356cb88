//! Durable key-value storage backing the visitor stores.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;
use tower_sessions::Session;

use super::StoreError;

/// Storage keys, one per persisted slot.
pub mod keys {
    /// JSON array of cart items.
    pub const CART: &str = "easytrade_cart";
    /// JSON-encoded [`UserSession`](easytrade_core::UserSession).
    pub const USER: &str = "easytrade_user";
    /// Bearer token, stored as plain text.
    pub const TOKEN: &str = "easytrade_token";
    /// Where to go after the next login. Read once, then cleared.
    pub const CALLBACK_URL: &str = "easytrade_callbackUrl";
}

/// String key-value storage owned by one visitor.
///
/// Values are raw serialized snapshots; the stores own the encoding.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    fn set(&self, key: &str, value: String)
    -> impl Future<Output = Result<(), StoreError>> + Send;

    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Storage kept in the visitor's server-side session.
///
/// The session layer saves changes when the response is sent.
#[derive(Clone, Debug)]
pub struct SessionStorage {
    session: Session,
}

impl SessionStorage {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

impl Storage for SessionStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.session.get::<String>(key).await?)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        Ok(self.session.insert(key, value).await?)
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.session.remove_value(key).await?;
        Ok(())
    }
}

/// In-process storage, used by tests and tooling.
///
/// Clones share the same entries.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `set`/`remove` fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Current raw value under `key`.
    pub async fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().await.get(key).cloned()
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("storage is read-only".to_string()));
        }
        Ok(())
    }
}

impl Storage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.raw(key).await)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.check_writable()?;
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_memory_storage_round_trip() {
        let storage = MemoryStorage::new();
        storage.set(keys::TOKEN, "abc".to_string()).await.unwrap();
        assert_eq!(storage.get(keys::TOKEN).await.unwrap().as_deref(), Some("abc"));

        storage.remove(keys::TOKEN).await.unwrap();
        assert!(storage.get(keys::TOKEN).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_storage_write_failure() {
        let storage = MemoryStorage::new();
        storage.fail_writes(true);
        assert!(storage.set(keys::CART, "[]".to_string()).await.is_err());
        assert!(storage.raw(keys::CART).await.is_none());
    }

    #[tokio::test]
    async fn test_session_storage_round_trip() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let storage = SessionStorage::new(session);

        storage
            .set(keys::USER, r#"{"userId":1,"username":"thabo"}"#.to_string())
            .await
            .unwrap();
        assert!(storage.get(keys::USER).await.unwrap().is_some());

        storage.remove(keys::USER).await.unwrap();
        assert!(storage.get(keys::USER).await.unwrap().is_none());
    }
}
