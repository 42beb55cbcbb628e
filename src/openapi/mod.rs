use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "SalonStock API",
        version = "1.0.0",
        description = r#"
# SalonStock Inventory and Checkout API

Backend for salon and barbershop management. Stock is tracked per lot and
consumed oldest lot first (FIFO), so every deduction carries the exact cost
of the goods that left the shelf.

## Features

- **Product catalog**: SKUs measured in units, grams or milliliters, split
  between resale and internal use
- **Lot-tracked stock**: every replenishment is its own lot with its own
  unit cost; consumption drains lots in entry-date order
- **Movement journal**: immutable IN/OUT audit trail with COGS and revenue
- **Appointment checkout**: completes the appointment, deducts its supplies
  and books the income entry atomically
- **Financial entries**: read-only cash book fed by checkout

## Tenancy

Every ledger-touching endpoint requires an `X-Tenant-Id` header carrying the
tenant UUID. Mutating endpoints additionally require `X-Acting-User`, an
opaque actor label recorded on movements and financial entries. Missing or
malformed headers produce `400 Bad Request`.

## Error Handling

Errors use a consistent response format with appropriate HTTP status codes:

```json
{
  "error": "Unprocessable Entity",
  "message": "Insufficient stock: requested 12 of 'Argan Oil' but only 4.5 in stock",
  "request_id": "8f0d7e0e-8c3a-4b6e-9d35-0a2f6a1f55aa",
  "timestamp": "2026-01-01T00:00:00Z"
}
```

`409 Conflict` marks a concurrent-write collision and is safe to retry after
re-reading current state.

## Pagination

List endpoints accept `page` (1-based) and `limit` query parameters; `limit`
is clamped to the configured maximum.
        "#,
        contact(
            name = "SalonStock Support",
            email = "dev@salonstock.app",
            url = "https://salonstock.app"
        ),
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "https://api.salonstock.app", description = "Production server"),
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "products", description = "Product catalog and lot reads"),
        (name = "inventory", description = "Replenish and consume operations"),
        (name = "movements", description = "Stock movement journal reads"),
        (name = "appointments", description = "Appointments and checkout"),
        (name = "financial-entries", description = "Cash book reads"),
    ),
    paths(
        // Products
        crate::handlers::products::list_products,
        crate::handlers::products::create_product,
        crate::handlers::products::get_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,
        crate::handlers::products::low_stock_products,
        crate::handlers::products::list_product_lots,

        // Inventory operations
        crate::handlers::inventory::replenish_stock,
        crate::handlers::inventory::consume_stock,

        // Movement reporting
        crate::handlers::movements::list_movements,
        crate::handlers::movements::list_product_movements,

        // Appointments
        crate::handlers::appointments::create_appointment,
        crate::handlers::appointments::get_appointment,
        crate::handlers::appointments::checkout_appointment,

        // Financial entries
        crate::handlers::financial_entries::list_financial_entries,
    ),
    components(
        schemas(
            // Common types
            crate::ApiResponse<serde_json::Value>,
            crate::PaginatedResponse<serde_json::Value>,

            // Product types
            crate::handlers::products::ProductResponse,
            crate::handlers::products::LotResponse,
            crate::handlers::products::CreateProductRequest,
            crate::handlers::products::UpdateProductRequest,
            crate::entities::product::UseType,
            crate::entities::product::MeasureUnit,

            // Inventory types
            crate::handlers::inventory::LotPayload,
            crate::handlers::inventory::ReplenishRequest,
            crate::handlers::inventory::ReplenishResponse,
            crate::handlers::inventory::ConsumeReason,
            crate::handlers::inventory::ConsumeStockRequest,
            crate::handlers::inventory::ConsumeResponse,

            // Movement types
            crate::handlers::movements::MovementResponse,
            crate::entities::stock_movement::MovementType,
            crate::entities::stock_movement::MovementReason,

            // Appointment types
            crate::handlers::appointments::AppointmentResponse,
            crate::handlers::appointments::CreateAppointmentRequest,
            crate::handlers::appointments::SupplyLinePayload,
            crate::handlers::appointments::CheckoutRequest,
            crate::handlers::appointments::CheckoutResponse,
            crate::entities::appointment::AppointmentStatus,

            // Financial entry types
            crate::handlers::financial_entries::FinancialEntryResponse,
            crate::entities::financial_entry::EntryKind,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
