use axum::{
    extract::{Path, State},
    response::Json,
};
use uuid::Uuid;

use crate::{services::items::ItemResponse, ApiResponse, ApiResult, AppState};

/// List active items with their stock levels
#[utoipa::path(
    get,
    path = "/api/v1/items",
    responses(
        (status = 200, description = "Item list returned"),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "items"
)]
pub async fn list_items(State(state): State<AppState>) -> ApiResult<Vec<ItemResponse>> {
    let items = state.services.items.list_items().await?;
    Ok(Json(ApiResponse::success(items)))
}

/// Get a single item with its stock levels
#[utoipa::path(
    get,
    path = "/api/v1/items/{id}",
    params(("id" = Uuid, Path, description = "Item id")),
    responses(
        (status = 200, description = "Item returned", body = ItemResponse),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "items"
)]
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<ItemResponse> {
    let item = state.services.items.get_item(id).await?;
    Ok(Json(ApiResponse::success(item)))
}
