//! EasyTrade Core - Shared domain types and client-side logic.
//!
//! This crate provides the pieces of the storefront that do not touch the
//! network or any storage medium:
//! - `types` - Opaque identifiers, prices, and timestamps
//! - `models` - Products, users, and the signed-in identity
//! - `cart` - Cart contents with merge-on-add and quantity rules
//! - `pagination` - Page marker computation for paginated views
//! - `forms` - Listing and auth form validation with per-field errors
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no session handling. The storefront crate wraps these in stores
//! that persist to the visitor's session and in a gateway that talks to the
//! marketplace API.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod forms;
pub mod models;
pub mod pagination;
pub mod types;

pub use cart::{Cart, CartError, CartItem};
pub use forms::{
    ActionOutcome, Field, FieldErrors, ListingDraft, ListingInput, ListingMode, LoginInput,
    RegisterInput,
};
pub use models::{DashboardSummary, Product, ProductPage, User, UserSession};
pub use pagination::{PageMarker, Pagination, page_markers};
pub use types::*;
