use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::entities::appointment::{self, AppointmentStatus};
use crate::errors::ServiceError;
use crate::handlers::movements::MovementResponse;
use crate::identity::{Identity, TenantId};
use crate::services::appointments::NewAppointment;
use crate::services::checkout::SupplyLine;
use crate::{ApiResponse, ApiResult, AppState};

#[derive(Debug, Serialize, ToSchema)]
pub struct AppointmentResponse {
    pub id: Uuid,
    pub customer_name: String,
    pub service_name: String,
    pub service_price: Decimal,
    pub scheduled_at: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<appointment::Model> for AppointmentResponse {
    fn from(model: appointment::Model) -> Self {
        Self {
            id: model.id,
            customer_name: model.customer_name,
            service_name: model.service_name,
            service_price: model.service_price,
            scheduled_at: model.scheduled_at,
            status: model.status,
            completed_at: model.completed_at,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateAppointmentRequest {
    #[validate(length(min = 1, message = "customer_name must not be empty"))]
    pub customer_name: String,
    #[validate(length(min = 1, message = "service_name must not be empty"))]
    pub service_name: String,
    /// Price charged at checkout; becomes the income entry amount.
    pub service_price: Decimal,
    pub scheduled_at: DateTime<Utc>,
}

/// One supply deduction requested at checkout.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct SupplyLinePayload {
    pub product_id: Uuid,
    pub quantity: Decimal,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CheckoutRequest {
    /// Products used during the appointment. May be empty; the appointment
    /// then completes without touching stock.
    #[serde(default)]
    pub supplies: Vec<SupplyLinePayload>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub appointment: AppointmentResponse,
    /// One OUT movement per supply line, in request order.
    pub movements: Vec<MovementResponse>,
    pub total_cogs: Decimal,
    /// Income entry written for the service price.
    pub income_entry_id: Uuid,
}

/// Create an appointment
#[utoipa::path(
    post,
    path = "/api/v1/appointments",
    summary = "Create appointment",
    description = "Registers a scheduled appointment. Requires X-Tenant-Id and X-Acting-User \
                   headers.",
    request_body = CreateAppointmentRequest,
    responses(
        (status = 201, description = "Appointment created", body = ApiResponse<AppointmentResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid appointment data", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "appointments"
)]
pub async fn create_appointment(
    State(state): State<AppState>,
    identity: Identity,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AppointmentResponse>>), ServiceError> {
    request.validate()?;

    let created = state
        .services
        .appointments
        .create_appointment(
            identity.tenant_id,
            NewAppointment {
                customer_name: request.customer_name,
                service_name: request.service_name,
                service_price: request.service_price,
                scheduled_at: request.scheduled_at,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(AppointmentResponse::from(created))),
    ))
}

/// Get an appointment
#[utoipa::path(
    get,
    path = "/api/v1/appointments/{id}",
    summary = "Get appointment",
    params(("id" = Uuid, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "Appointment retrieved", body = ApiResponse<AppointmentResponse>),
        (status = 400, description = "Missing or malformed tenant header", body = crate::errors::ErrorResponse),
        (status = 404, description = "Appointment not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "appointments"
)]
pub async fn get_appointment(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
    Path(id): Path<Uuid>,
) -> ApiResult<AppointmentResponse> {
    let appointment = state
        .services
        .appointments
        .get_appointment(tenant_id, id)
        .await?;
    Ok(Json(ApiResponse::success(AppointmentResponse::from(
        appointment,
    ))))
}

/// Check out an appointment
#[utoipa::path(
    post,
    path = "/api/v1/appointments/{id}/checkout",
    summary = "Check out appointment",
    description = "Deducts each supply line from stock with reason `internal` and, in the same \
                   transaction as the final deduction, flips the appointment to completed and \
                   records the income entry. If any deduction fails the appointment stays \
                   scheduled and no income is booked. Requires X-Tenant-Id and X-Acting-User \
                   headers.",
    params(("id" = Uuid, Path, description = "Appointment id")),
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Appointment checked out", body = ApiResponse<CheckoutResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid quantity, headers, or appointment already completed", body = crate::errors::ErrorResponse),
        (status = 404, description = "Appointment or product not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Concurrent write conflict; retry", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock for a supply line", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "appointments"
)]
pub async fn checkout_appointment(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(request): Json<CheckoutRequest>,
) -> ApiResult<CheckoutResponse> {
    let supplies: Vec<SupplyLine> = request
        .supplies
        .into_iter()
        .map(|line| SupplyLine {
            product_id: line.product_id,
            quantity: line.quantity,
        })
        .collect();

    let outcome = state
        .services
        .checkout
        .checkout(identity.tenant_id, &identity.actor, id, supplies)
        .await?;

    Ok(Json(ApiResponse::success(CheckoutResponse {
        appointment: AppointmentResponse::from(outcome.appointment),
        movements: outcome
            .movements
            .into_iter()
            .map(MovementResponse::from)
            .collect(),
        total_cogs: outcome.total_cogs,
        income_entry_id: outcome.income_entry_id,
    })))
}
