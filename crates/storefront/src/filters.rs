//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Shortens text to a card-sized excerpt on a character boundary.
///
/// Usage in templates: `{{ description|excerpt }}`
#[askama::filter_fn]
pub fn excerpt(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(shorten(&value.to_string(), EXCERPT_CHARS))
}

/// Returns "item" or "items" for a count.
///
/// Usage in templates: `{{ count|items_label }}`
#[askama::filter_fn]
pub fn items_label(count: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(if count.to_string() == "1" { "item" } else { "items" })
}

const EXCERPT_CHARS: usize = 120;

fn shorten(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{}…", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorten_leaves_short_text() {
        assert_eq!(shorten("  Brass lamp ", 120), "Brass lamp");
    }

    #[test]
    fn test_shorten_counts_characters() {
        let text = "é".repeat(130);
        let short = shorten(&text, 120);
        assert_eq!(short.chars().count(), 121);
        assert!(short.ends_with('…'));
    }
}
