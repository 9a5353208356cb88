//! Per-visitor state containers.
//!
//! Each browser gets its own [`CartStore`] and [`SessionStore`], built for
//! the request from that browser's [`Storage`]. A mutation computes the next
//! state, persists a snapshot, and only then commits in memory, so a failed
//! write leaves the store exactly as it was.

mod cart;
mod session;
mod storage;

pub use cart::CartStore;
pub use session::{DEFAULT_DESTINATION, PLACEHOLDER_TOKEN, SessionStore, is_site_relative};
pub use storage::{MemoryStorage, SessionStorage, Storage, keys};

use easytrade_core::CartError;
use thiserror::Error;

/// Errors raised by the visitor stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The request has no session attached (the session layer is missing).
    #[error("client storage is not available for this request")]
    Unavailable,

    /// The backing storage failed.
    #[error("client storage failed: {0}")]
    Backend(String),

    /// A snapshot could not be serialized.
    #[error("could not encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),

    /// The requested cart change is not allowed.
    #[error(transparent)]
    Cart(#[from] CartError),
}

impl From<tower_sessions::session::Error> for StoreError {
    fn from(err: tower_sessions::session::Error) -> Self {
        Self::Backend(err.to_string())
    }
}
