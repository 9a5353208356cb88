//! Core types for EasyTrade.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod timestamp;

pub use id::*;
pub use price::{CurrencyCode, Price, PriceError};
