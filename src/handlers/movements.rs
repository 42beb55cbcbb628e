use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::entities::stock_movement::{self, MovementReason, MovementType};
use crate::identity::TenantId;
use crate::services::movements::MovementFilter;
use crate::{ApiResponse, ApiResult, AppState, PaginatedResponse};

/// One row of the movement journal, exactly as audited.
#[derive(Debug, Serialize, ToSchema)]
pub struct MovementResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    /// Name snapshot taken when the movement was written; survives product
    /// deletion.
    pub product_name: String,
    pub movement_type: MovementType,
    pub reason: MovementReason,
    pub quantity: Decimal,
    /// COGS portion; present on OUT movements only.
    pub cost_value: Option<Decimal>,
    /// Revenue; present on OUT movements with reason `sale` only.
    pub sale_value: Option<Decimal>,
    pub performed_by: String,
    pub occurred_at: DateTime<Utc>,
}

impl From<stock_movement::Model> for MovementResponse {
    fn from(model: stock_movement::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            product_name: model.product_name,
            movement_type: model.movement_type,
            reason: model.reason,
            quantity: model.quantity,
            cost_value: model.cost_value,
            sale_value: model.sale_value,
            performed_by: model.performed_by,
            occurred_at: model.occurred_at,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct MovementListQuery {
    /// Page number, 1-based.
    pub page: Option<u64>,
    /// Page size; clamped to the configured maximum.
    pub limit: Option<u64>,
    pub product_id: Option<Uuid>,
    /// `in` or `out`.
    pub movement_type: Option<MovementType>,
    /// Inclusive lower bound on `occurred_at` (RFC 3339).
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `occurred_at` (RFC 3339).
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ProductMovementsQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub movement_type: Option<MovementType>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// List stock movements
#[utoipa::path(
    get,
    path = "/api/v1/movements",
    summary = "List movements",
    description = "Paginated movement journal for the tenant, most recent first",
    params(MovementListQuery),
    responses(
        (status = 200, description = "Movements retrieved", body = ApiResponse<PaginatedResponse<MovementResponse>>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Missing or malformed tenant header", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "movements"
)]
pub async fn list_movements(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
    Query(query): Query<MovementListQuery>,
) -> ApiResult<PaginatedResponse<MovementResponse>> {
    let (page, limit) = super::page_window(&state.config, query.page, query.limit);
    let filter = MovementFilter {
        product_id: query.product_id,
        movement_type: query.movement_type,
        from: query.from,
        to: query.to,
    };

    let (movements, total) = state
        .services
        .movements
        .list_movements(tenant_id, filter, page, limit)
        .await?;

    Ok(Json(ApiResponse::success(PaginatedResponse {
        items: movements.into_iter().map(MovementResponse::from).collect(),
        total,
        page,
        limit,
        total_pages: super::total_pages(total, limit),
    })))
}

/// List the movements of one product
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}/movements",
    summary = "List product movements",
    description = "Movement journal filtered to one product, most recent first",
    params(
        ("id" = Uuid, Path, description = "Product id"),
        ProductMovementsQuery
    ),
    responses(
        (status = 200, description = "Movements retrieved", body = ApiResponse<PaginatedResponse<MovementResponse>>),
        (status = 400, description = "Missing or malformed tenant header", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "movements"
)]
pub async fn list_product_movements(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
    Path(id): Path<Uuid>,
    Query(query): Query<ProductMovementsQuery>,
) -> ApiResult<PaginatedResponse<MovementResponse>> {
    let (page, limit) = super::page_window(&state.config, query.page, query.limit);
    let filter = MovementFilter {
        product_id: Some(id),
        movement_type: query.movement_type,
        from: query.from,
        to: query.to,
    };

    let (movements, total) = state
        .services
        .movements
        .list_movements(tenant_id, filter, page, limit)
        .await?;

    Ok(Json(ApiResponse::success(PaginatedResponse {
        items: movements.into_iter().map(MovementResponse::from).collect(),
        total,
        page,
        limit,
        total_pages: super::total_pages(total, limit),
    })))
}
