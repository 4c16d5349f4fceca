//! Validation rules for beat records.

use crate::error::CoreError;
use crate::types::Cents;

/// Maximum title length in characters.
pub const MAX_TITLE_LEN: usize = 200;

/// Maximum slug length in bytes.
pub const MAX_SLUG_LEN: usize = 120;

/// Validate a beat title: non-blank and at most [`MAX_TITLE_LEN`] characters.
pub fn validate_title(title: &str) -> Result<(), CoreError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Title must not be empty".into()));
    }
    if trimmed.chars().count() > MAX_TITLE_LEN {
        return Err(CoreError::Validation(format!(
            "Title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate the three tier prices: each positive, and non-decreasing from
/// basic to trackout to unlimited.
pub fn validate_prices(basic: Cents, trackout: Cents, unlimited: Cents) -> Result<(), CoreError> {
    if basic <= 0 || trackout <= 0 || unlimited <= 0 {
        return Err(CoreError::Validation(
            "All license prices must be greater than zero".into(),
        ));
    }
    if basic > trackout || trackout > unlimited {
        return Err(CoreError::Validation(
            "License prices must not decrease from basic to trackout to unlimited".into(),
        ));
    }
    Ok(())
}

/// Derive a URL slug from a title.
///
/// Lower-cases ASCII alphanumerics, transliterates accented letters via
/// [`crate::delivery::ascii_sanitize`], and joins words with `-`.
pub fn slugify(title: &str) -> String {
    let ascii = crate::delivery::ascii_sanitize(title).to_ascii_lowercase();
    let mut slug = String::with_capacity(ascii.len());
    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    let mut slug = slug.to_string();
    slug.truncate(MAX_SLUG_LEN);
    slug.trim_end_matches('-').to_string()
}
