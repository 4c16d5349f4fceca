//! Repository for the `orders` and `order_items` tables.

use beatstore_core::order_status::OrderStatus;
use beatstore_core::types::DbId;
use sqlx::PgPool;

use crate::models::order::{
    CreateOrder, Order, OrderItem, OrderStats, OrderWithItems, Purchase, StatusTotal,
};

const COLUMNS: &str = "id, customer_email, customer_name, status, total_cents, \
    payment_reference, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, order_id, beat_id, license_tier, price_cents, created_at";

/// Provides order creation, lookup, and purchase verification.
pub struct OrderRepo;

impl OrderRepo {
    /// Insert an order and all of its items in one transaction.
    ///
    /// `total_cents` is the sum of the item prices.
    pub async fn create(pool: &PgPool, input: &CreateOrder) -> Result<OrderWithItems, sqlx::Error> {
        let total: i64 = input.items.iter().map(|i| i.price_cents).sum();
        let status = input
            .status
            .as_deref()
            .unwrap_or(OrderStatus::Pending.name());

        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO orders (customer_email, customer_name, status, total_cents, payment_reference) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        let order = sqlx::query_as::<_, Order>(&query)
            .bind(&input.customer_email)
            .bind(&input.customer_name)
            .bind(status)
            .bind(total)
            .bind(&input.payment_reference)
            .fetch_one(&mut *tx)
            .await?;

        let item_query = format!(
            "INSERT INTO order_items (order_id, beat_id, license_tier, price_cents) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {ITEM_COLUMNS}"
        );
        let mut items = Vec::with_capacity(input.items.len());
        for item in &input.items {
            let row = sqlx::query_as::<_, OrderItem>(&item_query)
                .bind(order.id)
                .bind(item.beat_id)
                .bind(&item.license_tier)
                .bind(item.price_cents)
                .fetch_one(&mut *tx)
                .await?;
            items.push(row);
        }

        tx.commit().await?;
        Ok(OrderWithItems { order, items })
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Order>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE id = $1");
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find an order with its items.
    pub async fn find_with_items(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<OrderWithItems>, sqlx::Error> {
        let Some(order) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let items = Self::list_items(pool, id).await?;
        Ok(Some(OrderWithItems { order, items }))
    }

    pub async fn list_items(pool: &PgPool, order_id: DbId) -> Result<Vec<OrderItem>, sqlx::Error> {
        let query = format!("SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id");
        sqlx::query_as::<_, OrderItem>(&query)
            .bind(order_id)
            .fetch_all(pool)
            .await
    }

    /// List orders newest first, optionally filtered by status.
    pub async fn list(
        pool: &PgPool,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Order>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM orders \
             WHERE ($1::text IS NULL OR status = $1) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Order counts and revenue grouped by status.
    pub async fn stats(pool: &PgPool) -> Result<OrderStats, sqlx::Error> {
        let totals = sqlx::query_as::<_, StatusTotal>(
            "SELECT status, COUNT(*) AS count, COALESCE(SUM(total_cents), 0)::bigint AS total_cents \
             FROM orders GROUP BY status ORDER BY status",
        )
        .fetch_all(pool)
        .await?;
        Ok(OrderStats::from_totals(totals))
    }

    /// Set an order's status. Returns `None` if the order does not exist.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        status: OrderStatus,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!("UPDATE orders SET status = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .bind(status.name())
            .fetch_optional(pool)
            .await
    }

    /// Find the purchase line entitling `email` to `beat_id` on `order_id`.
    ///
    /// The email match is case-insensitive. If the order holds the beat more
    /// than once, the highest license tier wins. The order status is
    /// returned, not filtered, so callers can tell an unpaid order apart from
    /// a missing one.
    pub async fn find_purchase(
        pool: &PgPool,
        order_id: DbId,
        email: &str,
        beat_id: DbId,
    ) -> Result<Option<Purchase>, sqlx::Error> {
        sqlx::query_as::<_, Purchase>(
            "SELECT o.id AS order_id, o.status, oi.beat_id, oi.license_tier \
             FROM orders o \
             JOIN order_items oi ON oi.order_id = o.id \
             WHERE o.id = $1 AND lower(o.customer_email) = lower($2) AND oi.beat_id = $3 \
             ORDER BY CASE oi.license_tier \
                WHEN 'unlimited' THEN 3 WHEN 'trackout' THEN 2 ELSE 1 END DESC \
             LIMIT 1",
        )
        .bind(order_id)
        .bind(email.trim())
        .bind(beat_id)
        .fetch_optional(pool)
        .await
    }
}
