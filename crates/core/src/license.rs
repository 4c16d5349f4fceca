//! License tiers and the assets each tier unlocks.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Cents;

/// Tier name stored in `order_items.license_tier` for the entry-level lease.
pub const TIER_BASIC: &str = "basic";
/// Tier name for the trackout lease (master + stems).
pub const TIER_TRACKOUT: &str = "trackout";
/// Tier name for the unlimited license (master + stems, no caps).
pub const TIER_UNLIMITED: &str = "unlimited";

/// Valid tier values, in ascending order of rights.
const VALID_TIERS: &[&str] = &[TIER_BASIC, TIER_TRACKOUT, TIER_UNLIMITED];

/// The three purchase levels of a beat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseTier {
    Basic,
    Trackout,
    Unlimited,
}

impl LicenseTier {
    pub const ALL: [LicenseTier; 3] = [Self::Basic, Self::Trackout, Self::Unlimited];

    /// Parse from the database `license_tier` column.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            TIER_BASIC => Ok(Self::Basic),
            TIER_TRACKOUT => Ok(Self::Trackout),
            TIER_UNLIMITED => Ok(Self::Unlimited),
            other => Err(CoreError::Validation(format!(
                "Invalid license tier '{other}'. Must be one of: {VALID_TIERS:?}"
            ))),
        }
    }

    /// Database name value.
    pub fn name(self) -> &'static str {
        match self {
            Self::Basic => TIER_BASIC,
            Self::Trackout => TIER_TRACKOUT,
            Self::Unlimited => TIER_UNLIMITED,
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Basic => "Basic Lease",
            Self::Trackout => "Trackout Lease",
            Self::Unlimited => "Unlimited License",
        }
    }

    /// Whether the tier includes the separated multitrack stems.
    pub fn includes_stems(self) -> bool {
        matches!(self, Self::Trackout | Self::Unlimited)
    }

    /// Content slug holding the editable description for this tier.
    pub fn content_slug(self) -> &'static str {
        match self {
            Self::Basic => "license-basic",
            Self::Trackout => "license-trackout",
            Self::Unlimited => "license-unlimited",
        }
    }

    /// Description used when no content row has been written yet.
    pub fn default_description(self) -> &'static str {
        match self {
            Self::Basic => {
                "High-quality master file for non-profit and limited commercial use. \
                 Up to 50,000 streams and one music video."
            }
            Self::Trackout => {
                "Master file plus the separated stems for mixing. \
                 Up to 500,000 streams and unlimited music videos."
            }
            Self::Unlimited => {
                "Master file and stems with unlimited streams, sales, and performances."
            }
        }
    }

    /// Select this tier's price from the three per-beat prices.
    pub fn price_of(self, basic: Cents, trackout: Cents, unlimited: Cents) -> Cents {
        match self {
            Self::Basic => basic,
            Self::Trackout => trackout,
            Self::Unlimited => unlimited,
        }
    }
}

impl std::fmt::Display for LicenseTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Reject stems access for tiers that do not include them.
pub fn ensure_stems_allowed(tier: LicenseTier) -> Result<(), CoreError> {
    if tier.includes_stems() {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!(
            "The {} does not include stems. Upgrade to a Trackout or Unlimited license.",
            tier.label()
        )))
    }
}
