//! Order and order item models and DTOs.

use beatstore_core::error::CoreError;
use beatstore_core::license::LicenseTier;
use beatstore_core::order_status::OrderStatus;
use beatstore_core::types::{Cents, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `orders` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: DbId,
    pub customer_email: String,
    pub customer_name: Option<String>,
    pub status: String,
    pub total_cents: Cents,
    /// Opaque identifier assigned by the payment processor.
    pub payment_reference: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Order {
    pub fn status(&self) -> Result<OrderStatus, CoreError> {
        OrderStatus::from_name(&self.status)
    }
}

/// A row from the `order_items` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrderItem {
    pub id: DbId,
    pub order_id: DbId,
    pub beat_id: DbId,
    pub license_tier: String,
    pub price_cents: Cents,
    pub created_at: Timestamp,
}

/// An order together with its line items.
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Per-status order totals.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct StatusTotal {
    pub status: String,
    pub count: i64,
    pub total_cents: Cents,
}

/// Back-office order summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStats {
    pub total_orders: i64,
    /// Sum over orders whose status grants downloads.
    pub revenue_cents: Cents,
    pub by_status: Vec<StatusTotal>,
}

impl OrderStats {
    pub fn from_totals(by_status: Vec<StatusTotal>) -> Self {
        let total_orders = by_status.iter().map(|s| s.count).sum();
        let revenue_cents = by_status
            .iter()
            .filter(|s| OrderStatus::from_name(&s.status).is_ok_and(OrderStatus::grants_downloads))
            .map(|s| s.total_cents)
            .sum();
        Self {
            total_orders,
            revenue_cents,
            by_status,
        }
    }
}

/// The line of a purchase that entitles a customer to a beat's files.
#[derive(Debug, Clone, FromRow)]
pub struct Purchase {
    pub order_id: DbId,
    pub status: String,
    pub beat_id: DbId,
    pub license_tier: String,
}

impl Purchase {
    pub fn status(&self) -> Result<OrderStatus, CoreError> {
        OrderStatus::from_name(&self.status)
    }

    pub fn tier(&self) -> Result<LicenseTier, CoreError> {
        LicenseTier::from_name(&self.license_tier)
    }
}

/// DTO for inserting an order with its items in one transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrder {
    pub customer_email: String,
    pub customer_name: Option<String>,
    /// Defaults to `pending`.
    pub status: Option<String>,
    pub payment_reference: Option<String>,
    pub items: Vec<CreateOrderItem>,
}

/// DTO for one line of a [`CreateOrder`]. Prices are resolved by the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderItem {
    pub beat_id: DbId,
    pub license_tier: String,
    pub price_cents: Cents,
}
