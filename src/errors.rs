use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

fn current_request_id() -> Option<String> {
    crate::tracing::current_request_id().map(|rid| rid.as_str().to_string())
}

/// Error payload returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "Unprocessable Entity",
    "message": "Insufficient stock: requested 12 units of product 550e8400-e29b-41d4-a716-446655440000, 4.5 in stock",
    "details": null,
    "request_id": "req-abc123xyz",
    "timestamp": "2025-06-09T10:30:00.000Z"
}))]
pub struct ErrorResponse {
    /// Canonical reason for the HTTP status ("Not Found", "Conflict", ...).
    #[schema(example = "Not Found")]
    pub error: String,
    /// What went wrong, in operator-readable form.
    #[schema(example = "Product with ID 550e8400-e29b-41d4-a716-446655440000 not found")]
    pub message: String,
    /// Optional extra context, such as per-field validation output.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "Field 'quantity' must be positive")]
    pub details: Option<String>,
    /// Correlates the response with server-side log lines.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "req-abc123xyz")]
    pub request_id: Option<String>,
    /// When the failure happened, RFC 3339.
    #[schema(example = "2025-06-09T10:30:00.000Z")]
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::error::DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Requested quantity is non-positive, carries more than 3 decimals, or
    /// is fractional for a product sold in whole units.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Requested quantity exceeds the product's cached aggregate stock.
    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    /// The aggregate stock and the active-lot sum disagree. Integrity fault;
    /// the operation is never partially applied.
    #[error("Insufficient lot coverage: {0}")]
    InsufficientLotCoverage(String),

    /// Replenishment carried a non-positive quantity or a negative cost.
    #[error("Invalid lot data: {0}")]
    InvalidLotData(String),

    /// A concurrent writer changed lot or stock state under this operation.
    /// Safe to retry after re-reading current state.
    #[error("Transaction conflict: {0}")]
    TransactionConflict(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Single source of truth for the error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_)
            | Self::BadRequest(_)
            | Self::InvalidQuantity(_)
            | Self::InvalidLotData(_)
            | Self::InvalidStatus(_) => StatusCode::BAD_REQUEST,
            Self::InsufficientStock(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::TransactionConflict(_) => StatusCode::CONFLICT,
            Self::DatabaseError(_) | Self::InsufficientLotCoverage(_) | Self::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message used in the HTTP body. Database and wrapped errors collapse to
    /// a generic line so connection strings and backtraces stay out of
    /// responses.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::Other(_) => "Internal server error".to_string(),
            // Everything else, lot-coverage faults included, surfaces verbatim;
            // those messages carry the ids and quantities operators reconcile with.
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            details: None,
            request_id: current_request_id(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(body)).into_response()
    }
}
