use axum::{
    extract::{Query, State},
    response::Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::entities::financial_entry::{self, EntryKind};
use crate::identity::TenantId;
use crate::services::financial_entries::EntryFilter;
use crate::{ApiResponse, ApiResult, AppState, PaginatedResponse};

#[derive(Debug, Serialize, ToSchema)]
pub struct FinancialEntryResponse {
    pub id: Uuid,
    pub kind: EntryKind,
    pub description: String,
    pub amount: Decimal,
    /// Set when the entry was produced by an appointment checkout.
    pub appointment_id: Option<Uuid>,
    pub recorded_by: String,
    pub entry_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl From<financial_entry::Model> for FinancialEntryResponse {
    fn from(model: financial_entry::Model) -> Self {
        Self {
            id: model.id,
            kind: model.kind,
            description: model.description,
            amount: model.amount,
            appointment_id: model.appointment_id,
            recorded_by: model.recorded_by,
            entry_date: model.entry_date,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct EntryListQuery {
    /// Page number, 1-based.
    pub page: Option<u64>,
    /// Page size; clamped to the configured maximum.
    pub limit: Option<u64>,
    /// `income` or `expense`.
    pub kind: Option<EntryKind>,
    pub appointment_id: Option<Uuid>,
    /// Inclusive lower bound on `entry_date` (YYYY-MM-DD).
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on `entry_date` (YYYY-MM-DD).
    pub to: Option<NaiveDate>,
}

/// List financial entries
#[utoipa::path(
    get,
    path = "/api/v1/financial-entries",
    summary = "List financial entries",
    description = "Paginated cash book for the tenant, newest entry date first. Entries are \
                   written by appointment checkout; this endpoint exists for reconciliation.",
    params(EntryListQuery),
    responses(
        (status = 200, description = "Entries retrieved", body = ApiResponse<PaginatedResponse<FinancialEntryResponse>>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Missing or malformed tenant header", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "financial-entries"
)]
pub async fn list_financial_entries(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
    Query(query): Query<EntryListQuery>,
) -> ApiResult<PaginatedResponse<FinancialEntryResponse>> {
    let (page, limit) = super::page_window(&state.config, query.page, query.limit);
    let filter = EntryFilter {
        kind: query.kind,
        appointment_id: query.appointment_id,
        from: query.from,
        to: query.to,
    };

    let (entries, total) = state
        .services
        .financial_entries
        .list_entries(tenant_id, filter, page, limit)
        .await?;

    Ok(Json(ApiResponse::success(PaginatedResponse {
        items: entries
            .into_iter()
            .map(FinancialEntryResponse::from)
            .collect(),
        total,
        page,
        limit,
        total_pages: super::total_pages(total, limit),
    })))
}
