//! Repository for the `beats` table.
//!
//! Every public read goes through [`visible_sql`] so the storefront and the
//! admin diagnostics agree on what "visible" means.

use beatstore_core::catalog::CatalogFilter;
use beatstore_core::types::{DbId, Timestamp};
use beatstore_core::visibility::{pending_activation_sql, visible_sql};
use sqlx::PgPool;

use crate::models::beat::{Beat, CreateBeat, UpdateBeat};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, title, slug, description, genre, bpm, musical_key, tags, \
    price_basic_cents, price_trackout_cents, price_unlimited_cents, \
    preview_public_id, artwork_url, master_key, master_legacy_url, stems_key, \
    is_active, featured, scheduled_release_at, created_by, created_at, updated_at";

/// Catalog filter conditions. `$1` is `now`; `$2..=$8` are the filter
/// values, each ignored when NULL.
const FILTER_CONDITIONS: &str = "\
    ($2::text IS NULL \
        OR title ILIKE $2 \
        OR description ILIKE $2 \
        OR EXISTS (SELECT 1 FROM unnest(tags) AS t(tag) WHERE t.tag ILIKE $2)) \
    AND ($3::text IS NULL OR lower(genre) = lower($3)) \
    AND ($4::text IS NULL OR lower(musical_key) = lower($4)) \
    AND ($5::int IS NULL OR bpm >= $5) \
    AND ($6::int IS NULL OR bpm <= $6) \
    AND ($7::bigint IS NULL OR price_basic_cents <= $7) \
    AND ($8::bool IS NULL OR featured = $8)";

/// Build an `ILIKE` pattern matching `term` anywhere, escaping wildcards.
pub fn contains_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Provides CRUD, catalog, and release operations for beats.
pub struct BeatRepo;

impl BeatRepo {
    /// Insert a new beat, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateBeat) -> Result<Beat, sqlx::Error> {
        let query = format!(
            "INSERT INTO beats (title, slug, description, genre, bpm, musical_key, tags, \
                price_basic_cents, price_trackout_cents, price_unlimited_cents, \
                preview_public_id, artwork_url, master_key, master_legacy_url, stems_key, \
                is_active, featured, scheduled_release_at, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, '{{}}'::text[]), $8, $9, $10, \
                $11, $12, $13, $14, $15, COALESCE($16, false), COALESCE($17, false), $18, $19) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Beat>(&query)
            .bind(&input.title)
            .bind(&input.slug)
            .bind(&input.description)
            .bind(&input.genre)
            .bind(input.bpm)
            .bind(&input.musical_key)
            .bind(&input.tags)
            .bind(input.price_basic_cents)
            .bind(input.price_trackout_cents)
            .bind(input.price_unlimited_cents)
            .bind(&input.preview_public_id)
            .bind(&input.artwork_url)
            .bind(&input.master_key)
            .bind(&input.master_legacy_url)
            .bind(&input.stems_key)
            .bind(input.is_active)
            .bind(input.featured)
            .bind(input.scheduled_release_at)
            .bind(input.created_by)
            .fetch_one(pool)
            .await
    }

    /// Find a beat by id regardless of visibility.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Beat>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM beats WHERE id = $1");
        sqlx::query_as::<_, Beat>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a beat by id only if it is publicly visible at `now`.
    pub async fn find_visible(
        pool: &PgPool,
        id: DbId,
        now: Timestamp,
    ) -> Result<Option<Beat>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM beats WHERE id = $1 AND {}",
            visible_sql("$2")
        );
        sqlx::query_as::<_, Beat>(&query)
            .bind(id)
            .bind(now)
            .fetch_optional(pool)
            .await
    }

    /// List visible beats matching `filter`, returning the page and the
    /// total number of matches.
    pub async fn list_visible(
        pool: &PgPool,
        filter: &CatalogFilter,
        now: Timestamp,
    ) -> Result<(Vec<Beat>, i64), sqlx::Error> {
        let visible = visible_sql("$1");
        let search = filter.search.as_deref().map(contains_pattern);

        let list_query = format!(
            "SELECT {COLUMNS} FROM beats \
             WHERE {visible} AND {FILTER_CONDITIONS} \
             ORDER BY {} \
             LIMIT $9 OFFSET $10",
            filter.sort.order_by_sql()
        );
        let items = sqlx::query_as::<_, Beat>(&list_query)
            .bind(now)
            .bind(&search)
            .bind(&filter.genre)
            .bind(&filter.musical_key)
            .bind(filter.bpm_min)
            .bind(filter.bpm_max)
            .bind(filter.max_price_cents)
            .bind(filter.featured)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(pool)
            .await?;

        let count_query =
            format!("SELECT COUNT(*) FROM beats WHERE {visible} AND {FILTER_CONDITIONS}");
        let (total,): (i64,) = sqlx::query_as(&count_query)
            .bind(now)
            .bind(&search)
            .bind(&filter.genre)
            .bind(&filter.musical_key)
            .bind(filter.bpm_min)
            .bind(filter.bpm_max)
            .bind(filter.max_price_cents)
            .bind(filter.featured)
            .fetch_one(pool)
            .await?;

        Ok((items, total))
    }

    /// Visible featured beats, newest first.
    pub async fn list_featured(
        pool: &PgPool,
        now: Timestamp,
        limit: i64,
    ) -> Result<Vec<Beat>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM beats \
             WHERE featured = true AND {} \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2",
            visible_sql("$1")
        );
        sqlx::query_as::<_, Beat>(&query)
            .bind(now)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Soonest future release among active beats. Such beats become visible
    /// on their own, so cached listings must not outlive this instant.
    pub async fn next_scheduled_release(
        pool: &PgPool,
        now: Timestamp,
    ) -> Result<Option<Timestamp>, sqlx::Error> {
        let (next,): (Option<Timestamp>,) = sqlx::query_as(
            "SELECT MIN(scheduled_release_at) FROM beats \
             WHERE is_active = true AND scheduled_release_at > $1",
        )
        .bind(now)
        .fetch_one(pool)
        .await?;
        Ok(next)
    }

    /// List all beats for the back-office, newest first.
    pub async fn list_all(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Beat>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM beats ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, Beat>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Beats with a schedule that are not yet visible: future releases and
    /// past-due ones still waiting for activation. Soonest first.
    pub async fn list_scheduled(pool: &PgPool, now: Timestamp) -> Result<Vec<Beat>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM beats \
             WHERE scheduled_release_at IS NOT NULL AND NOT {} \
             ORDER BY scheduled_release_at ASC, id ASC",
            visible_sql("$1")
        );
        sqlx::query_as::<_, Beat>(&query)
            .bind(now)
            .fetch_all(pool)
            .await
    }

    /// Update a beat. Only non-`None` fields are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateBeat,
    ) -> Result<Option<Beat>, sqlx::Error> {
        let query = format!(
            "UPDATE beats SET \
                title = COALESCE($2, title), \
                slug = COALESCE($3, slug), \
                description = COALESCE($4, description), \
                genre = COALESCE($5, genre), \
                bpm = COALESCE($6, bpm), \
                musical_key = COALESCE($7, musical_key), \
                tags = COALESCE($8, tags), \
                price_basic_cents = COALESCE($9, price_basic_cents), \
                price_trackout_cents = COALESCE($10, price_trackout_cents), \
                price_unlimited_cents = COALESCE($11, price_unlimited_cents), \
                preview_public_id = COALESCE($12, preview_public_id), \
                artwork_url = COALESCE($13, artwork_url), \
                master_key = COALESCE($14, master_key), \
                master_legacy_url = COALESCE($15, master_legacy_url), \
                stems_key = COALESCE($16, stems_key), \
                is_active = COALESCE($17, is_active), \
                featured = COALESCE($18, featured), \
                scheduled_release_at = CASE WHEN $20 THEN NULL \
                    ELSE COALESCE($19, scheduled_release_at) END \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Beat>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.slug)
            .bind(&input.description)
            .bind(&input.genre)
            .bind(input.bpm)
            .bind(&input.musical_key)
            .bind(&input.tags)
            .bind(input.price_basic_cents)
            .bind(input.price_trackout_cents)
            .bind(input.price_unlimited_cents)
            .bind(&input.preview_public_id)
            .bind(&input.artwork_url)
            .bind(&input.master_key)
            .bind(&input.master_legacy_url)
            .bind(&input.stems_key)
            .bind(input.is_active)
            .bind(input.featured)
            .bind(input.scheduled_release_at)
            .bind(input.clear_schedule)
            .fetch_optional(pool)
            .await
    }

    /// Delete a beat, returning the deleted row so its remote assets can be
    /// cleaned up. Fails with a foreign-key error if any order references it.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<Option<Beat>, sqlx::Error> {
        let query = format!("DELETE FROM beats WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Beat>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Activate every beat whose scheduled release has passed and is still
    /// inactive, in a single statement. Returns the number activated.
    ///
    /// Only ever sets `is_active = true`; re-running affects zero rows until
    /// another beat becomes due.
    pub async fn activate_scheduled(pool: &PgPool, now: Timestamp) -> Result<u64, sqlx::Error> {
        let query = format!(
            "UPDATE beats SET is_active = true WHERE {}",
            pending_activation_sql("$1")
        );
        let result = sqlx::query(&query).bind(now).execute(pool).await?;
        Ok(result.rows_affected())
    }
}
