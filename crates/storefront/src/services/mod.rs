//! Business logic that spans the marketplace client and the visitor stores.

pub mod listings;
