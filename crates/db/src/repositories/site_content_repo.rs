//! Repository for the `site_content` table.

use sqlx::PgPool;

use crate::models::site_content::{SiteContent, UpsertSiteContent};

const COLUMNS: &str = "slug, title, body, updated_at";

pub struct SiteContentRepo;

impl SiteContentRepo {
    pub async fn find(pool: &PgPool, slug: &str) -> Result<Option<SiteContent>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM site_content WHERE slug = $1");
        sqlx::query_as::<_, SiteContent>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// Fetch several slugs at once; missing slugs are simply absent.
    pub async fn find_many(
        pool: &PgPool,
        slugs: &[&str],
    ) -> Result<Vec<SiteContent>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM site_content WHERE slug = ANY($1) ORDER BY slug");
        let slugs: Vec<String> = slugs.iter().map(|s| s.to_string()).collect();
        sqlx::query_as::<_, SiteContent>(&query)
            .bind(&slugs)
            .fetch_all(pool)
            .await
    }

    /// Create or replace a content page.
    pub async fn upsert(
        pool: &PgPool,
        slug: &str,
        input: &UpsertSiteContent,
    ) -> Result<SiteContent, sqlx::Error> {
        let query = format!(
            "INSERT INTO site_content (slug, title, body) VALUES ($1, $2, $3) \
             ON CONFLICT (slug) DO UPDATE SET title = EXCLUDED.title, body = EXCLUDED.body \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SiteContent>(&query)
            .bind(slug)
            .bind(&input.title)
            .bind(&input.body)
            .fetch_one(pool)
            .await
    }
}
