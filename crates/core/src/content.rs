//! Editable site content pages.

use crate::error::CoreError;
use crate::license::LicenseTier;

pub const PAGE_FAQ: &str = "faq";
pub const PAGE_TERMS: &str = "terms";
pub const PAGE_PRIVACY: &str = "privacy";

/// Slugs served by the public content endpoint.
pub const PAGE_SLUGS: &[&str] = &[PAGE_FAQ, PAGE_TERMS, PAGE_PRIVACY];

/// Whether `slug` names a public page (as opposed to a license description).
pub fn is_page_slug(slug: &str) -> bool {
    PAGE_SLUGS.contains(&slug)
}

/// Whether `slug` names a license tier description.
pub fn is_license_slug(slug: &str) -> bool {
    LicenseTier::ALL.iter().any(|t| t.content_slug() == slug)
}

/// Accept any page or license slug; reject everything else.
pub fn validate_slug(slug: &str) -> Result<(), CoreError> {
    if is_page_slug(slug) || is_license_slug(slug) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Unknown content slug '{slug}'"
        )))
    }
}

/// Title used for a page that has not been written yet.
pub fn default_title(slug: &str) -> &'static str {
    match slug {
        PAGE_FAQ => "Frequently Asked Questions",
        PAGE_TERMS => "Terms of Service",
        PAGE_PRIVACY => "Privacy Policy",
        _ => "License",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_and_license_slugs_are_valid() {
        for slug in ["faq", "terms", "privacy", "license-basic", "license-unlimited"] {
            assert!(validate_slug(slug).is_ok(), "{slug} should be valid");
        }
        assert!(validate_slug("about").is_err());
    }

    #[test]
    fn license_slugs_are_not_pages() {
        assert!(!is_page_slug("license-trackout"));
        assert!(is_license_slug("license-trackout"));
    }
}
