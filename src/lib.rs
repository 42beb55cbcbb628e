//! SalonStock API Library
//!
//! Backend for salon and barbershop management: a lot-tracked FIFO inventory
//! ledger, stock movement auditing, and appointment checkout.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod identity;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: Arc<events::EventSender>,
    pub services: handlers::AppServices,
}

/// Envelope wrapping every successful JSON body. Failures go through
/// [`errors::ErrorResponse`] instead.
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

/// Per-response metadata: the request id (when one is in scope) and the
/// server-side timestamp.
#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        let request_id =
            crate::tracing::current_request_id().map(|rid| rid.as_str().to_string());
        Self {
            request_id,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Page of results plus the paging math the client needs for navigation.
#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    /// 400-style rejection listing each failed field check.
    pub fn validation_errors(errors: Vec<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some("Validation failed".to_string()),
            errors: Some(errors),
            meta: Some(ResponseMeta::capture()),
        }
    }
}

/// Handler return type for JSON endpoints.
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// All v1 API routes, mounted under `/api/v1` by the binary.
pub fn api_v1_routes() -> Router<AppState> {
    let products = Router::new()
        .route(
            "/products",
            get(handlers::products::list_products).post(handlers::products::create_product),
        )
        .route(
            "/products/low-stock",
            get(handlers::products::low_stock_products),
        )
        .route(
            "/products/:id",
            get(handlers::products::get_product)
                .put(handlers::products::update_product)
                .delete(handlers::products::delete_product),
        )
        .route(
            "/products/:id/lots",
            get(handlers::products::list_product_lots),
        )
        .route(
            "/products/:id/movements",
            get(handlers::movements::list_product_movements),
        );

    let inventory = Router::new()
        .route(
            "/inventory/replenish",
            post(handlers::inventory::replenish_stock),
        )
        .route(
            "/inventory/consume",
            post(handlers::inventory::consume_stock),
        );

    let appointments = Router::new()
        .route(
            "/appointments",
            post(handlers::appointments::create_appointment),
        )
        .route(
            "/appointments/:id",
            get(handlers::appointments::get_appointment),
        )
        .route(
            "/appointments/:id/checkout",
            post(handlers::appointments::checkout_appointment),
        );

    let reporting = Router::new()
        .route("/movements", get(handlers::movements::list_movements))
        .route(
            "/financial-entries",
            get(handlers::financial_entries::list_financial_entries),
        );

    Router::new()
        .route("/status", get(api_status))
        .merge(products)
        .merge(inventory)
        .merge(appointments)
        .merge(reporting)
}

async fn api_status(State(state): State<AppState>) -> ApiResult<Value> {
    let body = json!({
        "status": "ok",
        "service": "salonstock-api",
        "version": env!("CARGO_PKG_VERSION"),
        "git": option_env!("GIT_HASH").unwrap_or("unknown"),
        "build_time": option_env!("BUILD_TIME").unwrap_or("unknown"),
        "environment": state.config.environment,
        "timestamp": Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(body)))
}

/// Liveness probe; reports database connectivity without failing the request.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Value> {
    let database = if state.db.ping().await.is_ok() {
        "healthy"
    } else {
        "unhealthy"
    };

    let body = json!({
        "status": database,
        "checks": {
            "database": database,
        },
        "timestamp": Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(body)))
}
