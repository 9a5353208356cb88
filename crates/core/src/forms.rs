//! Form validation.
//!
//! Listing forms are checked field by field so every problem is reported at
//! once, keyed by the field it belongs to. The same [`ListingInput::validate`]
//! runs when the form is first submitted and again inside the write action
//! that talks to the marketplace API.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Price;

pub const NAME_REQUIRED: &str = "Product name is required.";
pub const DESCRIPTION_TOO_LONG: &str = "Description cannot exceed 500 characters.";
pub const PRICE_INVALID: &str = "Please enter a valid price.";
pub const PRICE_NOT_POSITIVE: &str = "Price must be greater than R0.";
pub const PRICE_SUB_CENT: &str = "Price must be in a valid currency format (e.g., 123.45).";
pub const PRICE_REQUIRED: &str = "Price is required.";
pub const VALIDATION_FAILED: &str = "Validation Error: Please check input fields.";

/// Longest description accepted, in characters.
pub const DESCRIPTION_MAX_CHARS: usize = 500;

/// Form field an error is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Name,
    Description,
    Price,
    /// Failures reported by the marketplace API rather than a form field.
    Api,
}

impl Field {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Description => "description",
            Self::Price => "price",
            Self::Api => "api",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "description" => Ok(Self::Description),
            "price" => Ok(Self::Price),
            "api" => Ok(Self::Api),
            _ => Err(()),
        }
    }
}

/// Error messages grouped by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<Field, Vec<String>>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Errors for a single field.
    #[must_use]
    pub fn single(field: Field, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: Field, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    #[must_use]
    pub fn get(&self, field: Field) -> &[String] {
        self.0.get(&field).map_or(&[][..], Vec::as_slice)
    }

    /// Messages for a field looked up by its form name. Unknown names have none.
    #[must_use]
    pub fn named(&self, field: &str) -> &[String] {
        field.parse::<Field>().map_or(&[][..], |f| self.get(f))
    }

    #[must_use]
    pub fn first(&self, field: Field) -> Option<&str> {
        self.get(field).first().map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, field: Field) -> bool {
        !self.get(field).is_empty()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fields that have at least one error, in a stable order.
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.0.keys().copied()
    }
}

/// Result of a write action, rendered back into the form that triggered it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActionOutcome {
    pub success: bool,
    pub message: Option<String>,
    pub errors: FieldErrors,
}

impl ActionOutcome {
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            errors: FieldErrors::new(),
        }
    }

    /// A failure reported by the marketplace API.
    #[must_use]
    pub fn api_error(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            success: false,
            message: Some(format!("API Error: {message}")),
            errors: FieldErrors::single(Field::Api, message),
        }
    }

    #[must_use]
    pub fn validation(errors: FieldErrors) -> Self {
        Self {
            success: false,
            message: Some(VALIDATION_FAILED.to_string()),
            errors,
        }
    }
}

/// Whether a listing form creates a new product or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingMode {
    Create,
    /// Price may be left blank to keep the current one.
    Update,
}

/// Raw listing form fields, as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListingInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
}

/// A listing form that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingDraft {
    pub name: String,
    pub description: Option<String>,
    /// Always present in [`ListingMode::Create`].
    pub price: Option<Price>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

impl ListingInput {
    /// Check every field and collect all problems.
    ///
    /// # Errors
    ///
    /// Returns the per-field messages when any field is invalid.
    pub fn validate(&self, mode: ListingMode) -> Result<ListingDraft, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.push(Field::Name, NAME_REQUIRED);
        }

        let description = non_blank(self.description.as_deref());
        if description.is_some_and(|d| d.chars().count() > DESCRIPTION_MAX_CHARS) {
            errors.push(Field::Description, DESCRIPTION_TOO_LONG);
        }

        let price = match non_blank(self.price.as_deref()) {
            Some(raw) => check_price(raw, &mut errors),
            None => {
                if mode == ListingMode::Create {
                    errors.push(Field::Price, PRICE_REQUIRED);
                }
                None
            }
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ListingDraft {
            name: name.to_string(),
            description: description.map(ToString::to_string),
            price,
        })
    }
}

fn check_price(raw: &str, errors: &mut FieldErrors) -> Option<Price> {
    let Ok(amount) = Decimal::from_str(raw.trim()) else {
        errors.push(Field::Price, PRICE_INVALID);
        return None;
    };

    if amount <= Decimal::ZERO {
        errors.push(Field::Price, PRICE_NOT_POSITIVE);
    }
    match amount.checked_mul(Decimal::ONE_HUNDRED) {
        Some(cents) if !cents.fract().is_zero() => errors.push(Field::Price, PRICE_SUB_CENT),
        Some(_) => {}
        None => errors.push(Field::Price, PRICE_INVALID),
    }

    Price::new(amount).ok()
}

pub const CREDENTIALS_REQUIRED: &str = "Username and password are required.";
pub const ALL_FIELDS_REQUIRED: &str = "All fields are required.";
pub const PASSWORDS_DIFFER: &str = "Passwords do not match.";
pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters long.";

/// Shortest password accepted at registration.
pub const PASSWORD_MIN_CHARS: usize = 6;

/// Login form fields.
#[derive(Clone, Default, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for LoginInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginInput")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl LoginInput {
    /// # Errors
    ///
    /// Returns the message to show when a credential is missing.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.username.trim().is_empty() || self.password.is_empty() {
            return Err(CREDENTIALS_REQUIRED);
        }
        Ok(())
    }
}

/// Registration form fields.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

impl fmt::Debug for RegisterInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterInput")
            .field("name", &self.name)
            .field("surname", &self.surname)
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl RegisterInput {
    /// Checks run in order; the first failure wins.
    ///
    /// # Errors
    ///
    /// Returns the message to show above the form.
    pub fn validate(&self) -> Result<(), &'static str> {
        let required = [
            &self.name,
            &self.surname,
            &self.username,
            &self.email,
            &self.password,
            &self.confirm_password,
        ];
        if required.iter().any(|v| v.trim().is_empty()) {
            return Err(ALL_FIELDS_REQUIRED);
        }
        if self.password != self.confirm_password {
            return Err(PASSWORDS_DIFFER);
        }
        if self.password.chars().count() < PASSWORD_MIN_CHARS {
            return Err(PASSWORD_TOO_SHORT);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn listing(name: &str, description: Option<&str>, price: Option<&str>) -> ListingInput {
        ListingInput {
            name: name.to_string(),
            description: description.map(ToString::to_string),
            price: price.map(ToString::to_string),
        }
    }

    #[test]
    fn test_valid_listing() {
        let draft = listing("Desk Lamp", Some("Warm light"), Some("249.50"))
            .validate(ListingMode::Create)
            .unwrap();
        assert_eq!(draft.name, "Desk Lamp");
        assert_eq!(draft.price, Some(Price::parse("249.5").unwrap()));
    }

    #[test]
    fn test_price_rules() {
        for (raw, message) in [
            ("0", PRICE_NOT_POSITIVE),
            ("-4", PRICE_NOT_POSITIVE),
            ("19.999", PRICE_SUB_CENT),
            ("cheap", PRICE_INVALID),
        ] {
            let errors = listing("Lamp", None, Some(raw))
                .validate(ListingMode::Create)
                .unwrap_err();
            assert_eq!(errors.get(Field::Price), [message], "{raw}");
        }

        assert!(
            listing("Lamp", None, Some("19.99"))
                .validate(ListingMode::Create)
                .is_ok()
        );
    }

    #[test]
    fn test_empty_name_only_flags_name() {
        let errors = listing("  ", None, Some("10"))
            .validate(ListingMode::Create)
            .unwrap_err();
        assert_eq!(errors.get(Field::Name), [NAME_REQUIRED]);
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec![Field::Name]);
    }

    #[test]
    fn test_errors_do_not_suppress_each_other() {
        let long = "x".repeat(DESCRIPTION_MAX_CHARS + 1);
        let errors = listing("", Some(&long), Some("abc"))
            .validate(ListingMode::Create)
            .unwrap_err();
        assert!(errors.contains(Field::Name));
        assert!(errors.contains(Field::Description));
        assert!(errors.contains(Field::Price));
    }

    #[test]
    fn test_description_limit_counts_characters() {
        let exactly = "é".repeat(DESCRIPTION_MAX_CHARS);
        assert!(
            listing("Lamp", Some(&exactly), Some("1"))
                .validate(ListingMode::Create)
                .is_ok()
        );
    }

    #[test]
    fn test_blank_fields_are_absent() {
        let draft = listing("Lamp", Some(""), Some(" "))
            .validate(ListingMode::Update)
            .unwrap();
        assert_eq!(draft.description, None);
        assert_eq!(draft.price, None);
    }

    #[test]
    fn test_create_requires_price() {
        let errors = listing("Lamp", None, None)
            .validate(ListingMode::Create)
            .unwrap_err();
        assert_eq!(errors.first(Field::Price), Some(PRICE_REQUIRED));
    }

    #[test]
    fn test_api_outcome() {
        let outcome = ActionOutcome::api_error("Forbidden");
        assert!(!outcome.success);
        assert_eq!(outcome.message.as_deref(), Some("API Error: Forbidden"));
        assert_eq!(outcome.errors.named("api"), ["Forbidden"]);
    }

    #[test]
    fn test_login_requires_both() {
        let input = LoginInput {
            username: "thabo".to_string(),
            password: String::new(),
        };
        assert_eq!(input.validate(), Err(CREDENTIALS_REQUIRED));
    }

    #[test]
    fn test_register_rules_in_order() {
        let mut input = RegisterInput {
            name: "Thabo".to_string(),
            surname: "Nkosi".to_string(),
            username: "thabo".to_string(),
            email: "thabo@example.com".to_string(),
            password: "abc".to_string(),
            confirm_password: "abd".to_string(),
        };
        assert_eq!(input.validate(), Err(PASSWORDS_DIFFER));

        input.confirm_password = "abc".to_string();
        assert_eq!(input.validate(), Err(PASSWORD_TOO_SHORT));

        input.password = "secret1".to_string();
        input.confirm_password = "secret1".to_string();
        assert!(input.validate().is_ok());

        input.email.clear();
        assert_eq!(input.validate(), Err(ALL_FIELDS_REQUIRED));
    }
}
