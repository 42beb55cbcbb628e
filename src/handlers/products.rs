use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::entities::product::{self, MeasureUnit, UseType};
use crate::entities::product_lot;
use crate::errors::ServiceError;
use crate::handlers::inventory::LotPayload;
use crate::identity::{Identity, TenantId};
use crate::services::inventory::{NewProduct, ProductRef, ReplenishInput};
use crate::services::products::{ProductListFilter, ProductUpdate};
use crate::{ApiResponse, ApiResult, AppState, PaginatedResponse};

/// Catalog view of a product. `lots` is populated on detail reads only.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub use_type: UseType,
    pub measure_unit: MeasureUnit,
    pub measure_value: Decimal,
    pub min_stock: Decimal,
    pub current_stock: Decimal,
    /// Unit cost of the most recent replenishment.
    pub cost_price: Decimal,
    pub sale_price: Option<Decimal>,
    /// True when `current_stock` is at or below `min_stock`.
    pub low_stock: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lots: Option<Vec<LotResponse>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductResponse {
    pub fn with_lots(model: product::Model, lots: Vec<product_lot::Model>) -> Self {
        let mut response = Self::from(model);
        response.lots = Some(lots.into_iter().map(LotResponse::from).collect());
        response
    }
}

impl From<product::Model> for ProductResponse {
    fn from(model: product::Model) -> Self {
        let low_stock = model.current_stock <= model.min_stock;
        Self {
            id: model.id,
            name: model.name,
            category: model.category,
            use_type: model.use_type,
            measure_unit: model.measure_unit,
            measure_value: model.measure_value,
            min_stock: model.min_stock,
            current_stock: model.current_stock,
            cost_price: model.cost_price,
            sale_price: model.sale_price,
            low_stock,
            lots: None,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LotResponse {
    pub id: Uuid,
    pub batch_number: String,
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
    pub initial_quantity: Decimal,
    pub current_quantity: Decimal,
    /// FIFO ordering key; oldest entry is drawn first.
    pub entry_date: DateTime<Utc>,
    pub expiration_date: Option<chrono::NaiveDate>,
    pub is_active: bool,
}

impl From<product_lot::Model> for LotResponse {
    fn from(model: product_lot::Model) -> Self {
        Self {
            id: model.id,
            batch_number: model.batch_number,
            unit_cost: model.unit_cost,
            total_cost: model.total_cost,
            initial_quantity: model.initial_quantity,
            current_quantity: model.current_quantity,
            entry_date: model.entry_date,
            expiration_date: model.expiration_date,
            is_active: model.is_active,
        }
    }
}

/// Body of `POST /products`: the SKU and the first batch that stocks it,
/// committed together.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    pub category: Option<String>,
    pub use_type: UseType,
    pub measure_unit: MeasureUnit,
    /// Package size in `measure_unit` (e.g. 500 on a milliliter product).
    pub measure_value: Decimal,
    /// Reorder threshold; defaults to zero (never flagged).
    #[serde(default)]
    pub min_stock: Decimal,
    /// Required for resale products.
    pub sale_price: Option<Decimal>,
    #[validate]
    pub initial_lot: LotPayload,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    pub category: Option<String>,
    pub min_stock: Option<Decimal>,
    pub measure_value: Option<Decimal>,
    pub sale_price: Option<Decimal>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ProductListQuery {
    /// Page number, 1-based.
    pub page: Option<u64>,
    /// Page size; clamped to the configured maximum.
    pub limit: Option<u64>,
    /// Substring match on the product name.
    pub search: Option<String>,
    pub category: Option<String>,
}

/// List products in the catalog
#[utoipa::path(
    get,
    path = "/api/v1/products",
    summary = "List products",
    description = "Paginated product catalog for the tenant named by X-Tenant-Id, name ascending",
    params(ProductListQuery),
    responses(
        (status = 200, description = "Products retrieved", body = ApiResponse<PaginatedResponse<ProductResponse>>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Missing or malformed tenant header", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
    Query(query): Query<ProductListQuery>,
) -> ApiResult<PaginatedResponse<ProductResponse>> {
    let (page, limit) = super::page_window(&state.config, query.page, query.limit);
    let filter = ProductListFilter {
        search: query.search,
        category: query.category,
    };

    let (products, total) = state
        .services
        .products
        .list_products(tenant_id, filter, page, limit)
        .await?;

    Ok(Json(ApiResponse::success(PaginatedResponse {
        items: products.into_iter().map(ProductResponse::from).collect(),
        total,
        page,
        limit,
        total_pages: super::total_pages(total, limit),
    })))
}

/// Create a product stocked by its first lot
#[utoipa::path(
    post,
    path = "/api/v1/products",
    summary = "Create product",
    description = "Creates the SKU, its first lot and the purchase movement in one transaction. \
                   Requires X-Tenant-Id and X-Acting-User headers.",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created and stocked", body = ApiResponse<ProductResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid product or lot data", body = crate::errors::ErrorResponse),
        (status = 409, description = "Concurrent write conflict", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    identity: Identity,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProductResponse>>), ServiceError> {
    if let Err(validation_errors) = request.validate() {
        let errors: Vec<String> = validation_errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                let field = field.to_string();
                errors.iter().map(move |error| {
                    format!(
                        "{}: {}",
                        field,
                        error.message.as_ref().unwrap_or(&"Invalid value".into())
                    )
                })
            })
            .collect();
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::validation_errors(errors)),
        ));
    }

    let input = ReplenishInput {
        product: ProductRef::New(NewProduct {
            name: request.name,
            category: request.category,
            use_type: request.use_type,
            measure_unit: request.measure_unit,
            measure_value: request.measure_value,
            min_stock: request.min_stock,
        }),
        lot: request.initial_lot.into(),
        sale_price: request.sale_price,
    };

    let outcome = state
        .services
        .inventory
        .replenish(identity.tenant_id, &identity.actor, input)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(ProductResponse::with_lots(
            outcome.product,
            vec![outcome.lot],
        ))),
    ))
}

/// Get a product with its active lots
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    summary = "Get product",
    description = "One product with its active lots in FIFO draw order",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product retrieved", body = ApiResponse<ProductResponse>),
        (status = 400, description = "Missing or malformed tenant header", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
    Path(id): Path<Uuid>,
) -> ApiResult<ProductResponse> {
    let (product, lots) = state
        .services
        .products
        .get_product_with_lots(tenant_id, id)
        .await?;
    Ok(Json(ApiResponse::success(ProductResponse::with_lots(
        product, lots,
    ))))
}

/// Update catalog fields of a product
#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    summary = "Update product",
    description = "Changes catalog-only fields. Stock, cost and lot state move exclusively \
                   through the replenish and consume operations.",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ApiResponse<ProductResponse>),
        (status = 400, description = "Invalid field value", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateProductRequest>,
) -> ApiResult<ProductResponse> {
    request.validate()?;

    let update = ProductUpdate {
        name: request.name,
        category: request.category,
        min_stock: request.min_stock,
        measure_value: request.measure_value,
        sale_price: request.sale_price,
    };
    let updated = state
        .services
        .products
        .update_product(identity.tenant_id, id, update)
        .await?;
    Ok(Json(ApiResponse::success(ProductResponse::from(updated))))
}

/// Delete a product
#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    summary = "Delete product",
    description = "Administrative removal. Movement history keeps the product name snapshot \
                   and stays readable afterwards.",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product deleted", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Missing or malformed headers", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    state
        .services
        .products
        .delete_product(identity.tenant_id, id)
        .await?;
    Ok(Json(ApiResponse::success(json!({
        "id": id,
        "deleted": true
    }))))
}

/// List products at or below their reorder threshold
#[utoipa::path(
    get,
    path = "/api/v1/products/low-stock",
    summary = "List low-stock products",
    description = "Products whose current stock is at or below min_stock, name ascending",
    responses(
        (status = 200, description = "Low-stock products retrieved", body = ApiResponse<Vec<ProductResponse>>),
        (status = 400, description = "Missing or malformed tenant header", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "products"
)]
pub async fn low_stock_products(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
) -> ApiResult<Vec<ProductResponse>> {
    let products = state.services.products.low_stock_products(tenant_id).await?;
    Ok(Json(ApiResponse::success(
        products.into_iter().map(ProductResponse::from).collect(),
    )))
}

/// List the active lots of a product
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}/lots",
    summary = "List product lots",
    description = "Active lots in FIFO draw order (entry date, then lot id)",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Lots retrieved", body = ApiResponse<Vec<LotResponse>>),
        (status = 400, description = "Missing or malformed tenant header", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "products"
)]
pub async fn list_product_lots(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<LotResponse>> {
    let (_, lots) = state
        .services
        .products
        .get_product_with_lots(tenant_id, id)
        .await?;
    Ok(Json(ApiResponse::success(
        lots.into_iter().map(LotResponse::from).collect(),
    )))
}
