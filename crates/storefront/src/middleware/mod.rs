//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions over an expiring in-memory store)
//!
//! The visitor extractors in [`auth`] read the session attached by layer 4.

pub mod auth;
pub mod request_id;
pub mod session;

pub use auth::{AuthRejection, RequireAuth, ShoppingCart, Visitor, login_redirect};
pub use request_id::request_id_middleware;
pub use session::{SessionCache, create_session_layer};
