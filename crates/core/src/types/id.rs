//! Opaque identifiers for marketplace entities.
//!
//! The marketplace API hands out identifiers that are sometimes JSON numbers
//! and sometimes strings. The storefront never does arithmetic or ordering on
//! them, it only compares them for equality and echoes them back into URLs, so
//! every identifier is held in its textual form.
//!
//! Use the `define_id!` macro to create type-safe wrappers that prevent mixing
//! identifiers of different entity types.

use serde::Deserialize;

/// Wire shape accepted for any identifier.
#[doc(hidden)]
#[derive(Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Signed(i64),
    Unsigned(u64),
    Text(String),
}

impl RawId {
    #[doc(hidden)]
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Signed(n) => n.to_string(),
            Self::Unsigned(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }
}

/// Returns the integer value of `raw` when it is the canonical rendering of one.
///
/// `"42"` yields `Some(42)`, while `"042"` and `"abc"` yield `None` so they
/// survive a serialize/deserialize cycle unchanged.
#[doc(hidden)]
#[must_use]
pub fn canonical_integer(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().filter(|n| n.to_string() == raw)
}

/// Macro to define an opaque ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Deserialize` from either a JSON number or a JSON string
/// - `Serialize` back to a number when the text is a canonical integer
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - `Display`, `FromStr`, `From<i64>`, `From<&str>` and `From<String>`
///
/// # Example
///
/// ```rust
/// # use easytrade_core::define_id;
/// define_id!(OrderId);
///
/// let from_number: OrderId = serde_json::from_str("7").unwrap();
/// let from_text: OrderId = "7".parse().unwrap();
/// assert_eq!(from_number, from_text);
/// assert_eq!(serde_json::to_string(&from_text).unwrap(), "7");
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(String);

        impl $name {
            /// Create an ID from its textual form.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the textual form of the ID.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::convert::Infallible;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Ok(Self(s.to_owned()))
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id.to_string())
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> ::core::result::Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                match $crate::types::id::canonical_integer(&self.0) {
                    Some(n) => serializer.serialize_i64(n),
                    None => serializer.serialize_str(&self.0),
                }
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                let raw = <$crate::types::id::RawId as ::serde::Deserialize>::deserialize(
                    deserializer,
                )?;
                Ok(Self(raw.into_text()))
            }
        }
    };
}

define_id!(ProductId);
define_id!(UserId);
