use axum::{extract::State, response::Json};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::entities::stock_movement::MovementReason;
use crate::handlers::movements::MovementResponse;
use crate::handlers::products::{LotResponse, ProductResponse};
use crate::identity::Identity;
use crate::services::inventory::{ConsumeRequest, NewLot, ProductRef, ReplenishInput};
use crate::{ApiResponse, ApiResult, AppState};

/// One incoming batch as the API receives it.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct LotPayload {
    /// Supplier batch label; informational, not unique.
    #[validate(length(min = 1, message = "batch_number must not be empty"))]
    pub batch_number: String,
    /// Quantity received, at most 3 decimal places.
    pub quantity: Decimal,
    /// Total paid for the batch; the unit cost is derived from it.
    pub total_cost: Decimal,
    /// Defaults to now. Backdating slots the lot into FIFO order by date.
    pub entry_date: Option<DateTime<Utc>>,
    pub expiration_date: Option<NaiveDate>,
}

impl From<LotPayload> for NewLot {
    fn from(payload: LotPayload) -> Self {
        NewLot {
            batch_number: payload.batch_number,
            total_cost: payload.total_cost,
            quantity: payload.quantity,
            entry_date: payload.entry_date,
            expiration_date: payload.expiration_date,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ReplenishRequest {
    pub product_id: Uuid,
    #[validate]
    pub lot: LotPayload,
    /// Also updates the product's sale price alongside the restock.
    pub sale_price: Option<Decimal>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReplenishResponse {
    pub product: ProductResponse,
    pub lot: LotResponse,
    pub movement: MovementResponse,
}

/// Why stock leaves the shelf. Purchases are not an option here; stock only
/// enters through the replenish operations.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConsumeReason {
    Sale,
    Internal,
    Loss,
}

impl From<ConsumeReason> for MovementReason {
    fn from(reason: ConsumeReason) -> Self {
        match reason {
            ConsumeReason::Sale => MovementReason::Sale,
            ConsumeReason::Internal => MovementReason::Internal,
            ConsumeReason::Loss => MovementReason::Loss,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ConsumeStockRequest {
    pub product_id: Uuid,
    /// Quantity to deduct, at most 3 decimal places; whole-unit products
    /// reject fractions.
    pub quantity: Decimal,
    pub reason: ConsumeReason,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConsumeResponse {
    pub product: ProductResponse,
    pub movement: MovementResponse,
    /// Lot-cost-weighted value of the consumed quantity.
    pub cogs: Decimal,
    /// Number of lots the deduction was drawn from.
    pub lots_drawn: usize,
}

/// Restock an existing product
#[utoipa::path(
    post,
    path = "/api/v1/inventory/replenish",
    summary = "Replenish stock",
    description = "Creates a lot, raises the product aggregate, refreshes the cached unit cost \
                   and appends the IN movement in one transaction. Requires X-Tenant-Id and \
                   X-Acting-User headers.",
    request_body = ReplenishRequest,
    responses(
        (status = 200, description = "Stock replenished", body = ApiResponse<ReplenishResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid lot data or headers", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Concurrent write conflict; retry", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "inventory"
)]
pub async fn replenish_stock(
    State(state): State<AppState>,
    identity: Identity,
    Json(request): Json<ReplenishRequest>,
) -> ApiResult<ReplenishResponse> {
    request.validate()?;

    let input = ReplenishInput {
        product: ProductRef::Existing(request.product_id),
        lot: request.lot.into(),
        sale_price: request.sale_price,
    };
    let outcome = state
        .services
        .inventory
        .replenish(identity.tenant_id, &identity.actor, input)
        .await?;

    Ok(Json(ApiResponse::success(ReplenishResponse {
        product: ProductResponse::from(outcome.product),
        lot: LotResponse::from(outcome.lot),
        movement: MovementResponse::from(outcome.movement),
    })))
}

/// Deduct stock oldest lot first
#[utoipa::path(
    post,
    path = "/api/v1/inventory/consume",
    summary = "Consume stock",
    description = "Draws the quantity from the product's active lots in FIFO order, books the \
                   COGS on an OUT movement and lowers the aggregate, all in one transaction. \
                   Requires X-Tenant-Id and X-Acting-User headers.",
    request_body = ConsumeStockRequest,
    responses(
        (status = 200, description = "Stock consumed", body = ApiResponse<ConsumeResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid quantity or headers", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Concurrent write conflict; retry", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse),
        (status = 500, description = "Lot inventory disagrees with the aggregate", body = crate::errors::ErrorResponse),
    ),
    tag = "inventory"
)]
pub async fn consume_stock(
    State(state): State<AppState>,
    identity: Identity,
    Json(request): Json<ConsumeStockRequest>,
) -> ApiResult<ConsumeResponse> {
    let consume = ConsumeRequest {
        product_id: request.product_id,
        quantity: request.quantity,
        reason: request.reason.into(),
    };
    let outcome = state
        .services
        .inventory
        .consume(identity.tenant_id, &identity.actor, consume, Vec::new())
        .await?;

    Ok(Json(ApiResponse::success(ConsumeResponse {
        product: ProductResponse::from(outcome.product),
        movement: MovementResponse::from(outcome.movement),
        cogs: outcome.cogs,
        lots_drawn: outcome.lots_drawn,
    })))
}
