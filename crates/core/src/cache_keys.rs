//! Cache key namespaces, TTLs, and write-side invalidation mapping.
//!
//! Keys are `<namespace>:<rest>`. Invalidation works on key prefixes, so
//! every key for a given concern must start with that concern's namespace.

use std::time::Duration;

use crate::content::is_license_slug;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Namespaces
// ---------------------------------------------------------------------------

pub const NS_BEATS: &str = "beats:";
pub const NS_CONTENT: &str = "content:";
pub const NS_LICENSES: &str = "licenses:";
pub const NS_ORDERS: &str = "orders:";
pub const NS_USERS: &str = "users:";

// ---------------------------------------------------------------------------
// TTLs
// ---------------------------------------------------------------------------

pub const TTL_BEAT_LIST: Duration = Duration::from_secs(5 * 60);
pub const TTL_BEAT_DETAIL: Duration = Duration::from_secs(10 * 60);
pub const TTL_CONTENT: Duration = Duration::from_secs(60 * 60);
pub const TTL_LICENSES: Duration = Duration::from_secs(60 * 60);
pub const TTL_ORDER_STATS: Duration = Duration::from_secs(5 * 60);
pub const TTL_PROFILE: Duration = Duration::from_secs(5 * 60);

// ---------------------------------------------------------------------------
// Key builders
// ---------------------------------------------------------------------------

/// Catalog listing key; `normalized_query` must be a canonical rendering of
/// the filter so equal filters share an entry.
pub fn beat_list(normalized_query: &str) -> String {
    format!("{NS_BEATS}list:{normalized_query}")
}

pub fn beats_featured() -> String {
    format!("{NS_BEATS}featured")
}

pub fn beat_detail(id: DbId) -> String {
    format!("{NS_BEATS}detail:{id}")
}

pub fn content_page(slug: &str) -> String {
    format!("{NS_CONTENT}{slug}")
}

pub fn licenses_all() -> String {
    format!("{NS_LICENSES}all")
}

pub fn order_stats() -> String {
    format!("{NS_ORDERS}stats")
}

/// Prefix shared by every key cached for one user.
pub fn user_scope(user_id: DbId) -> String {
    format!("{NS_USERS}{user_id}:")
}

pub fn user_profile(user_id: DbId) -> String {
    format!("{}profile", user_scope(user_id))
}

// ---------------------------------------------------------------------------
// Invalidation
// ---------------------------------------------------------------------------

/// Write-side events that make cached reads stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidationEvent {
    /// A beat was created, updated, deleted, or activated.
    BeatChanged,
    /// A content page was written.
    ContentChanged(String),
    /// An order was placed or changed status.
    OrderPlaced,
    /// A user's account details or password changed.
    ProfileChanged(DbId),
}

impl InvalidationEvent {
    /// Key prefixes to delete for this event.
    pub fn prefixes(&self) -> Vec<String> {
        match self {
            Self::BeatChanged => vec![NS_BEATS.to_string()],
            Self::ContentChanged(slug) => {
                let mut prefixes = vec![content_page(slug)];
                if is_license_slug(slug) {
                    prefixes.push(NS_LICENSES.to_string());
                }
                prefixes
            }
            Self::OrderPlaced => vec![NS_ORDERS.to_string()],
            Self::ProfileChanged(user_id) => vec![user_scope(*user_id)],
        }
    }
}
