//! Admin order management.
//!
//! Orders normally arrive from the payment flow; the create endpoint exists
//! for manual and offline sales.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use beatstore_core::cache_keys::{self, InvalidationEvent, TTL_ORDER_STATS};
use beatstore_core::catalog::{clamp_limit, clamp_offset, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use beatstore_core::error::CoreError;
use beatstore_core::license::LicenseTier;
use beatstore_core::order_status::OrderStatus;
use beatstore_core::types::DbId;
use beatstore_db::models::order::{
    CreateOrder, CreateOrderItem, Order, OrderStats, OrderWithItems,
};
use beatstore_db::repositories::{BeatRepo, OrderRepo};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Request body for `POST /admin/orders`. Prices come from the beats.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub customer_email: String,
    pub customer_name: Option<String>,
    pub status: Option<String>,
    pub payment_reference: Option<String>,
    #[validate(length(min = 1, message = "must contain at least one item"))]
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderItemRequest {
    pub beat_id: DbId,
    pub license_tier: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/orders
pub async fn list_orders(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<ListOrdersQuery>,
) -> AppResult<Json<DataResponse<Vec<Order>>>> {
    let status = params
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(OrderStatus::from_name)
        .transpose()?;
    let limit = clamp_limit(params.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);
    let offset = clamp_offset(params.offset);

    let orders = OrderRepo::list(&state.pool, status.map(OrderStatus::name), limit, offset).await?;
    Ok(Json(DataResponse { data: orders }))
}

/// GET /api/v1/admin/orders/stats
///
/// Cached until the next order write.
pub async fn order_stats(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<OrderStats>>> {
    let pool = &state.pool;
    let stats = state
        .cache
        .get_or_compute(&cache_keys::order_stats(), TTL_ORDER_STATS, move || async move {
            Ok::<_, AppError>(OrderRepo::stats(pool).await?)
        })
        .await?;
    Ok(Json(DataResponse { data: stats }))
}

/// GET /api/v1/admin/orders/{id}
pub async fn get_order(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<OrderWithItems>>> {
    let order = OrderRepo::find_with_items(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Order", id }))?;
    Ok(Json(DataResponse { data: order }))
}

/// POST /api/v1/admin/orders
pub async fn create_order(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateOrderRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let status = input
        .status
        .as_deref()
        .map(OrderStatus::from_name)
        .transpose()?
        .unwrap_or(OrderStatus::Pending);

    let mut items = Vec::with_capacity(input.items.len());
    for item in &input.items {
        let tier = LicenseTier::from_name(&item.license_tier)?;
        let beat = BeatRepo::find_by_id(&state.pool, item.beat_id)
            .await?
            .ok_or(AppError::Core(CoreError::NotFound {
                entity: "Beat",
                id: item.beat_id,
            }))?;
        items.push(CreateOrderItem {
            beat_id: beat.id,
            license_tier: tier.name().to_string(),
            price_cents: beat.price_for(tier),
        });
    }

    let order = OrderRepo::create(
        &state.pool,
        &CreateOrder {
            customer_email: input.customer_email.trim().to_string(),
            customer_name: input.customer_name,
            status: Some(status.name().to_string()),
            payment_reference: input.payment_reference,
            items,
        },
    )
    .await?;
    state.cache.invalidate(&InvalidationEvent::OrderPlaced).await;

    tracing::info!(
        order_id = order.order.id,
        total_cents = order.order.total_cents,
        user_id = admin.user_id,
        "Manual order created"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: order })))
}

/// PUT /api/v1/admin/orders/{id}/status
pub async fn update_status(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateStatusRequest>,
) -> AppResult<Json<DataResponse<Order>>> {
    let status = OrderStatus::from_name(&input.status)?;
    let order = OrderRepo::update_status(&state.pool, id, status)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Order", id }))?;
    state.cache.invalidate(&InvalidationEvent::OrderPlaced).await;

    tracing::info!(order_id = id, status = %status, user_id = admin.user_id, "Order status changed");
    Ok(Json(DataResponse { data: order }))
}
