use axum::{extract::State, response::Json};

use crate::{
    auth::AuthUser,
    services::returns::{ProcessReturnRequest, ReturnableItemResponse},
    services::transactions::TransactionResponse,
    ApiResponse, ApiResult, AppState,
};

/// Confirmed OUT movements with an outstanding returnable balance
#[utoipa::path(
    get,
    path = "/api/v1/inventory/returnable-items",
    responses((status = 200, description = "Returnable items returned")),
    tag = "returns"
)]
pub async fn returnable_items(
    State(state): State<AppState>,
) -> ApiResult<Vec<ReturnableItemResponse>> {
    let items = state.services.returns.returnable_items().await?;
    Ok(Json(ApiResponse::success(items)))
}

/// Record a return settlement against a returnable OUT transaction. The
/// settlement is created PENDING; stock is credited on confirmation.
#[utoipa::path(
    post,
    path = "/api/v1/inventory/process-return",
    request_body = ProcessReturnRequest,
    responses(
        (status = 200, description = "Return recorded", body = TransactionResponse),
        (status = 400, description = "Quantity exceeds outstanding returnable", body = crate::errors::ErrorResponse),
        (status = 404, description = "Original transaction not found", body = crate::errors::ErrorResponse)
    ),
    tag = "returns"
)]
pub async fn process_return(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<ProcessReturnRequest>,
) -> ApiResult<TransactionResponse> {
    let settlement = state
        .services
        .returns
        .process_return(request, user.user_id)
        .await?;
    Ok(Json(ApiResponse::success(settlement)))
}
