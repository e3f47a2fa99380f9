use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Standard error payload for HTTP responses
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Unprocessable Entity")
    pub error: String,
    /// Human-readable error description
    pub message: String,
    /// Per-item shortage detail for stock errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortages: Option<Vec<StockShortage>>,
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
}

/// One item that could not be satisfied by available stock. Carries enough
/// context for the caller to decide a remedy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StockShortage {
    pub item_code: String,
    pub requested: Decimal,
    pub available: Decimal,
}

fn format_shortages(shortages: &[StockShortage]) -> String {
    shortages
        .iter()
        .map(|s| {
            format!(
                "{}: need {}, available {}",
                s.item_code, s.requested, s.available
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::error::DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Insufficient stock: {}", format_shortages(.0))]
    InsufficientStock(Vec<StockShortage>),

    #[error("Fulfill quantity {requested} exceeds remaining quantity {remaining}")]
    ExceedsRemaining {
        requested: Decimal,
        remaining: Decimal,
    },

    #[error("Return quantity {requested} exceeds outstanding returnable quantity {outstanding}")]
    ExceedsOutstanding {
        requested: Decimal,
        outstanding: Decimal,
    },

    #[error("Transaction already processed: {0}")]
    AlreadyProcessed(String),

    #[error("Order has confirmed transactions: {0}")]
    HasConfirmedTransactions(String),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Convenience constructor for a single-item shortage.
    pub fn insufficient_stock(
        item_code: impl Into<String>,
        requested: Decimal,
        available: Decimal,
    ) -> Self {
        ServiceError::InsufficientStock(vec![StockShortage {
            item_code: item_code.into(),
            requested,
            available,
        }])
    }

    /// Returns the HTTP status code for this error.
    /// Single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_)
            | Self::InvalidState(_)
            | Self::ExceedsRemaining { .. }
            | Self::ExceedsOutstanding { .. } => StatusCode::BAD_REQUEST,
            Self::InsufficientStock(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::AlreadyProcessed(_) | Self::HasConfirmedTransactions(_) => StatusCode::CONFLICT,
            Self::DatabaseError(_) | Self::EventError(_) | Self::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the error message suitable for HTTP responses. Infrastructure
    /// failures return generic messages to avoid leaking implementation
    /// details; business-rule failures keep their full context.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::EventError(_) | Self::InternalError(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    fn shortages(&self) -> Option<Vec<StockShortage>> {
        match self {
            Self::InsufficientStock(shortages) => Some(shortages.clone()),
            _ => None,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            shortages: self.shortages(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}
