//! Catalog query parameters: sorting, filter validation, pagination.
//!
//! Repositories receive an already-validated [`CatalogFilter`]; the sort
//! order is an enum so no user input is ever interpolated into SQL.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Cents;

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// Default number of beats per catalog page.
pub const DEFAULT_PAGE_LIMIT: i64 = 20;

/// Maximum number of beats per catalog page.
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Inclusive BPM bounds accepted anywhere a tempo is stored or filtered.
pub const MIN_BPM: i32 = 1;
pub const MAX_BPM: i32 = 400;

/// Maximum search term length.
pub const MAX_SEARCH_LEN: usize = 100;

/// Clamp a user-provided limit to `[1, max]`, using `default` when absent.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

/// Clamp a user-provided offset to non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeatSort {
    #[default]
    Newest,
    Oldest,
    PriceAsc,
    PriceDesc,
    Title,
    Bpm,
}

impl BeatSort {
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "newest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            "price_asc" => Ok(Self::PriceAsc),
            "price_desc" => Ok(Self::PriceDesc),
            "title" => Ok(Self::Title),
            "bpm" => Ok(Self::Bpm),
            other => Err(CoreError::Validation(format!(
                "Invalid sort '{other}'. Must be one of: newest, oldest, price_asc, price_desc, title, bpm"
            ))),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::Title => "title",
            Self::Bpm => "bpm",
        }
    }

    /// `ORDER BY` clause body. Featured beats always lead; `id` breaks ties
    /// so pagination is stable.
    pub fn order_by_sql(self) -> &'static str {
        match self {
            Self::Newest => "featured DESC, created_at DESC, id DESC",
            Self::Oldest => "featured DESC, created_at ASC, id ASC",
            Self::PriceAsc => "featured DESC, price_basic_cents ASC, id ASC",
            Self::PriceDesc => "featured DESC, price_basic_cents DESC, id DESC",
            Self::Title => "featured DESC, lower(title) ASC, id ASC",
            Self::Bpm => "featured DESC, bpm ASC NULLS LAST, id ASC",
        }
    }
}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// Validated catalog filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    pub search: Option<String>,
    pub genre: Option<String>,
    pub musical_key: Option<String>,
    pub bpm_min: Option<i32>,
    pub bpm_max: Option<i32>,
    pub max_price_cents: Option<Cents>,
    pub featured: Option<bool>,
    pub sort: BeatSort,
    pub limit: i64,
    pub offset: i64,
}

/// Unvalidated catalog parameters as they arrive from a query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogParams {
    pub search: Option<String>,
    pub genre: Option<String>,
    pub musical_key: Option<String>,
    pub bpm_min: Option<i32>,
    pub bpm_max: Option<i32>,
    pub max_price_cents: Option<Cents>,
    pub featured: Option<bool>,
    pub sort: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl CatalogParams {
    /// Validate and normalize into a [`CatalogFilter`].
    ///
    /// Blank strings are treated as absent; the search term is trimmed.
    pub fn into_filter(self) -> Result<CatalogFilter, CoreError> {
        let search = non_blank(self.search);
        if let Some(term) = &search {
            if term.chars().count() > MAX_SEARCH_LEN {
                return Err(CoreError::Validation(format!(
                    "Search term must be at most {MAX_SEARCH_LEN} characters"
                )));
            }
        }

        for bpm in [self.bpm_min, self.bpm_max].into_iter().flatten() {
            validate_bpm(bpm)?;
        }
        if let (Some(min), Some(max)) = (self.bpm_min, self.bpm_max) {
            if min > max {
                return Err(CoreError::Validation(format!(
                    "bpm_min ({min}) must not exceed bpm_max ({max})"
                )));
            }
        }

        if let Some(price) = self.max_price_cents {
            if price < 0 {
                return Err(CoreError::Validation(
                    "max_price_cents must not be negative".into(),
                ));
            }
        }

        let sort = match non_blank(self.sort) {
            Some(name) => BeatSort::from_name(&name)?,
            None => BeatSort::default(),
        };

        Ok(CatalogFilter {
            search,
            genre: non_blank(self.genre),
            musical_key: non_blank(self.musical_key),
            bpm_min: self.bpm_min,
            bpm_max: self.bpm_max,
            max_price_cents: self.max_price_cents,
            featured: self.featured,
            sort,
            limit: clamp_limit(self.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT),
            offset: clamp_offset(self.offset),
        })
    }
}

impl CatalogFilter {
    /// Canonical rendering used as the cache key suffix.
    ///
    /// Text filters are lower-cased because the repository matches them
    /// case-insensitively.
    pub fn cache_key(&self) -> String {
        fn opt<T: std::fmt::Display>(v: &Option<T>) -> String {
            v.as_ref().map(|v| v.to_string()).unwrap_or_default()
        }
        let lower = |v: &Option<String>| v.as_deref().map(str::to_lowercase).unwrap_or_default();
        format!(
            "q={}&genre={}&key={}&bpm={}-{}&price={}&featured={}&sort={}&limit={}&offset={}",
            lower(&self.search),
            lower(&self.genre),
            lower(&self.musical_key),
            opt(&self.bpm_min),
            opt(&self.bpm_max),
            opt(&self.max_price_cents),
            opt(&self.featured),
            self.sort.name(),
            self.limit,
            self.offset,
        )
    }
}

/// Reject a tempo outside [`MIN_BPM`]..=[`MAX_BPM`].
pub fn validate_bpm(bpm: i32) -> Result<(), CoreError> {
    if (MIN_BPM..=MAX_BPM).contains(&bpm) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "BPM must be between {MIN_BPM} and {MAX_BPM}, got {bpm}"
        )))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
