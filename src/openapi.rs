//! OpenAPI documentation for the Stockroom API.

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::errors::{ErrorResponse, StockShortage};
use crate::handlers;
use crate::services::fulfillment::{
    FulfillItemRequest, FulfillItemResponse, FulfillOrderResponse, FulfilledLine,
};
use crate::services::items::ItemResponse;
use crate::services::orders::{
    AddOrderItemRequest, CreateOrderRequest, OrderDetailResponse, OrderItemResponse,
    OrderResponse, PendingFulfillmentItem, PendingFulfillmentOrder,
};
use crate::services::returns::{ProcessReturnRequest, ReturnableItemResponse};
use crate::services::stock_ledger::StockLevelResponse;
use crate::services::transactions::{CreateTransactionRequest, TransactionResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::items::list_items,
        handlers::items::get_item,
        handlers::orders::create_order,
        handlers::orders::list_orders,
        handlers::orders::pending_fulfillment,
        handlers::orders::get_order,
        handlers::orders::add_order_item,
        handlers::orders::delete_order,
        handlers::orders::fulfill_item,
        handlers::orders::bulk_fulfill,
        handlers::orders::fulfill_order,
        handlers::inventory::list_transactions,
        handlers::inventory::create_transaction,
        handlers::inventory::get_transaction,
        handlers::inventory::confirm_transaction,
        handlers::inventory::get_stock,
        handlers::returns::returnable_items,
        handlers::returns::process_return,
    ),
    components(schemas(
        ErrorResponse,
        StockShortage,
        ItemResponse,
        StockLevelResponse,
        CreateTransactionRequest,
        TransactionResponse,
        CreateOrderRequest,
        AddOrderItemRequest,
        OrderResponse,
        OrderItemResponse,
        OrderDetailResponse,
        PendingFulfillmentItem,
        PendingFulfillmentOrder,
        FulfillItemRequest,
        FulfillItemResponse,
        FulfilledLine,
        FulfillOrderResponse,
        ProcessReturnRequest,
        ReturnableItemResponse,
    )),
    tags(
        (name = "items", description = "Item master and stock visibility"),
        (name = "inventory", description = "Inventory transactions and the stock ledger"),
        (name = "orders", description = "Order management and fulfillment"),
        (name = "returns", description = "Customer return processing")
    ),
    info(
        title = "Stockroom API",
        description = "Single-tenant inventory and order management API"
    )
)]
pub struct ApiDoc;

/// Swagger UI mounted at `/docs`, serving the spec at
/// `/api-docs/openapi.json`.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
