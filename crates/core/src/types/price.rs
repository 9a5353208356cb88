//! Type-safe price representation using decimal arithmetic.
//!
//! Listing prices are positive amounts with at most cent precision. Values
//! typed by a seller go through [`Price::parse`]; values coming back from the
//! marketplace API are trusted as-is.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceError {
    /// The input is not a number.
    #[error("price is not a valid number")]
    Invalid,
    /// The amount is zero or negative.
    #[error("price must be greater than zero")]
    NotPositive,
    /// The amount has more precision than the minor currency unit.
    #[error("price must be a whole number of cents")]
    SubCent,
}

/// A listing price.
///
/// Serialized as a JSON number, which is what the marketplace API expects.
///
/// ## Examples
///
/// ```
/// use easytrade_core::Price;
///
/// assert!(Price::parse("19.99").is_ok());
/// assert!(Price::parse("19.999").is_err()); // sub-cent
/// assert!(Price::parse("0").is_err());      // not positive
/// assert_eq!(Price::parse("249.5").unwrap().display(), "R249.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Price {
    /// Number of decimal places in the minor currency unit.
    pub const MINOR_UNIT_SCALE: u32 = 2;

    /// Validate a decimal amount as a listing price.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is not positive or is not a whole
    /// number of cents.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount <= Decimal::ZERO {
            return Err(PriceError::NotPositive);
        }

        let cents = amount
            .checked_mul(Decimal::ONE_HUNDRED)
            .ok_or(PriceError::Invalid)?;
        if !cents.fract().is_zero() {
            return Err(PriceError::SubCent);
        }

        Ok(Self(amount))
    }

    /// Parse a price typed into a form.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Invalid`] for non-numeric input, otherwise the
    /// errors of [`Price::new`].
    pub fn parse(raw: &str) -> Result<Self, PriceError> {
        let amount = Decimal::from_str(raw.trim()).map_err(|_| PriceError::Invalid)?;
        Self::new(amount)
    }

    /// Create a price from a whole number of cents.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::NotPositive`] when `cents` is zero or negative.
    pub fn from_cents(cents: i64) -> Result<Self, PriceError> {
        Self::new(Decimal::new(cents, Self::MINOR_UNIT_SCALE))
    }

    /// The amount in the currency's standard unit.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Format for display (e.g., "R19.99").
    #[must_use]
    pub fn display(&self) -> String {
        CurrencyCode::default().format(self.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// ISO 4217 currency codes the marketplace trades in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    ZAR,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::ZAR => "R",
        }
    }

    /// Format an arbitrary amount (e.g. a cart total) in this currency.
    #[must_use]
    pub fn format(self, amount: Decimal) -> String {
        format!("{}{:.2}", self.symbol(), amount.round_dp(Price::MINOR_UNIT_SCALE))
    }
}
