use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    services::fulfillment::{FulfillItemRequest, FulfillItemResponse, FulfillOrderResponse},
    services::orders::{
        AddOrderItemRequest, CreateOrderRequest, OrderDetailResponse, OrderItemResponse,
        OrderResponse, PendingFulfillmentOrder,
    },
    ApiResponse, ApiResult, AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct OrderListQuery {
    /// Filter by order status (PENDING, PROCESSING, FULFILLED, CANCELLED)
    pub status: Option<String>,
}

/// Create a new order
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Order created", body = OrderResponse),
        (status = 400, description = "Validation failed", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateOrderRequest>,
) -> ApiResult<OrderResponse> {
    let order = state
        .services
        .orders
        .create_order(request, user.user_id)
        .await?;
    Ok(Json(ApiResponse::success(order)))
}

/// List orders, newest first
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    params(OrderListQuery),
    responses((status = 200, description = "Order list returned")),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> ApiResult<Vec<OrderResponse>> {
    let orders = state.services.orders.list_orders(query.status).await?;
    Ok(Json(ApiResponse::success(orders)))
}

/// Orders awaiting fulfillment, with per-line remaining quantities and
/// current stock availability
#[utoipa::path(
    get,
    path = "/api/v1/orders/pending-fulfillment",
    responses((status = 200, description = "Pending fulfillment queue returned")),
    tag = "orders"
)]
pub async fn pending_fulfillment(
    State(state): State<AppState>,
) -> ApiResult<Vec<PendingFulfillmentOrder>> {
    let orders = state.services.orders.pending_fulfillment().await?;
    Ok(Json(ApiResponse::success(orders)))
}

/// Get an order with its line items
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order returned", body = OrderDetailResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<OrderDetailResponse> {
    let order = state.services.orders.get_order(id).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Add a line item to a PENDING order
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/items",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = AddOrderItemRequest,
    responses(
        (status = 200, description = "Line added", body = OrderItemResponse),
        (status = 400, description = "Order not modifiable", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order or item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn add_order_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthUser,
    Json(request): Json<AddOrderItemRequest>,
) -> ApiResult<OrderItemResponse> {
    let line = state.services.orders.add_item(id, request).await?;
    Ok(Json(ApiResponse::success(line)))
}

/// Delete an order that has no confirmed transactions
#[utoipa::path(
    delete,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order deleted"),
        (status = 400, description = "Order not deletable", body = crate::errors::ErrorResponse),
        (status = 409, description = "Order has confirmed transactions", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthUser,
) -> ApiResult<String> {
    let order_number = state.services.orders.delete_order(id).await?;
    Ok(Json(
        ApiResponse::success(order_number).with_message("Order deleted successfully"),
    ))
}

/// Partially fulfill one order line
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/fulfill-item",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = FulfillItemRequest,
    responses(
        (status = 200, description = "Line fulfilled", body = FulfillItemResponse),
        (status = 400, description = "Quantity exceeds remaining or order not pending", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn fulfill_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
    Json(request): Json<FulfillItemRequest>,
) -> ApiResult<FulfillItemResponse> {
    let result = state
        .services
        .fulfillment
        .fulfill_item(id, request, user.user_id)
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

/// Fulfill every outstanding line of an order, all-or-nothing
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/bulk-fulfill",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order fulfilled", body = FulfillOrderResponse),
        (status = 422, description = "Insufficient stock for one or more lines", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn bulk_fulfill(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
) -> ApiResult<FulfillOrderResponse> {
    let result = state
        .services
        .fulfillment
        .bulk_fulfill(id, user.user_id)
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

/// Fulfill an entire order in one shot at full requested quantities
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/fulfill",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order fulfilled", body = FulfillOrderResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn fulfill_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
) -> ApiResult<FulfillOrderResponse> {
    let result = state
        .services
        .fulfillment
        .fulfill_order(id, user.user_id)
        .await?;
    Ok(Json(ApiResponse::success(result)))
}
