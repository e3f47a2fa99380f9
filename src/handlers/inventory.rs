use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    services::stock_ledger::StockLevelResponse,
    services::transactions::{CreateTransactionRequest, TransactionFilter, TransactionResponse},
    ApiResponse, ApiResult, AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct TransactionListQuery {
    pub item_id: Option<Uuid>,
    /// Filter by movement type (IN, OUT, ADJUST)
    pub transaction_type: Option<String>,
    /// Filter by lifecycle status (PENDING, CONFIRMED, CANCELLED)
    pub status: Option<String>,
}

/// List inventory transactions, newest first
#[utoipa::path(
    get,
    path = "/api/v1/inventory/transactions",
    params(TransactionListQuery),
    responses((status = 200, description = "Transaction list returned")),
    tag = "inventory"
)]
pub async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<TransactionListQuery>,
) -> ApiResult<Vec<TransactionResponse>> {
    let filter = TransactionFilter {
        item_id: query.item_id,
        transaction_type: query.transaction_type,
        status: query.status,
    };
    let transactions = state.services.transactions.list_transactions(filter).await?;
    Ok(Json(ApiResponse::success(transactions)))
}

/// Record a manual inventory movement as a PENDING transaction
#[utoipa::path(
    post,
    path = "/api/v1/inventory/transactions",
    request_body = CreateTransactionRequest,
    responses(
        (status = 200, description = "Transaction recorded", body = TransactionResponse),
        (status = 400, description = "Validation failed", body = crate::errors::ErrorResponse),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn create_transaction(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateTransactionRequest>,
) -> ApiResult<TransactionResponse> {
    let transaction = state
        .services
        .transactions
        .create_transaction(request, user.user_id)
        .await?;
    Ok(Json(ApiResponse::success(transaction)))
}

/// Get a single transaction
#[utoipa::path(
    get,
    path = "/api/v1/inventory/transactions/{id}",
    params(("id" = Uuid, Path, description = "Transaction id")),
    responses(
        (status = 200, description = "Transaction returned", body = TransactionResponse),
        (status = 404, description = "Transaction not found", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<TransactionResponse> {
    let transaction = state.services.transactions.get_transaction(id).await?;
    Ok(Json(ApiResponse::success(transaction)))
}

/// Confirm a PENDING transaction, applying its ledger effect
#[utoipa::path(
    post,
    path = "/api/v1/inventory/transactions/{id}/confirm",
    params(("id" = Uuid, Path, description = "Transaction id")),
    responses(
        (status = 200, description = "Transaction confirmed", body = TransactionResponse),
        (status = 404, description = "Transaction not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Transaction already processed", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn confirm_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
) -> ApiResult<TransactionResponse> {
    let transaction = state
        .services
        .transactions
        .confirm_transaction(id, user.user_id)
        .await?;
    Ok(Json(ApiResponse::success(transaction)))
}

/// Get the stock ledger row for an item (all zeros when the item has
/// never moved)
#[utoipa::path(
    get,
    path = "/api/v1/inventory/stock/{item_id}",
    params(("item_id" = Uuid, Path, description = "Item id")),
    responses((status = 200, description = "Stock level returned", body = StockLevelResponse)),
    tag = "inventory"
)]
pub async fn get_stock(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> ApiResult<StockLevelResponse> {
    let stock = state.services.stock_ledger.get_stock(item_id).await?;
    Ok(Json(ApiResponse::success(stock)))
}
