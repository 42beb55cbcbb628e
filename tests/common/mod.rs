use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request},
    routing::get,
    Router,
};
use rust_decimal::Decimal;
use salonstock_api::{
    config::AppConfig,
    db,
    entities::product::{MeasureUnit, UseType},
    events::{self, EventSender},
    handlers::AppServices,
    identity::{ACTING_USER_HEADER, TENANT_ID_HEADER},
    services::inventory::{NewLot, NewProduct, ProductRef, ReplenishInput, ReplenishOutcome},
    AppState,
};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

/// Staff member stamped on seeded writes and default mutating requests.
pub const TEST_ACTOR: &str = "ana.souza";

/// Helper harness wiring the full application router to a throwaway SQLite
/// database. Each instance owns its own database file, so tests run in
/// parallel without sharing state.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    /// Tenant every helper scopes to unless a test overrides it.
    pub tenant_id: Uuid,
    _db_dir: tempfile::TempDir,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with a freshly migrated database.
    pub async fn new() -> Self {
        let db_dir = tempfile::tempdir().expect("create temp dir for test database");
        let db_path = db_dir.path().join("salonstock_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        // SQLite struggles with concurrent writers; a single pooled
        // connection serializes everything through one handle.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("open the test database");
        db::run_migrations(&pool)
            .await
            .expect("migrate the test database");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = Arc::new(EventSender::new(event_tx));
        let event_task = tokio::spawn(events::process_events(event_rx));

        let services = AppServices::new(db_arc.clone(), event_sender.clone());

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };

        let router = Router::new()
            .route("/health", get(salonstock_api::health_check))
            .nest("/api/v1", salonstock_api::api_v1_routes())
            .layer(axum::middleware::from_fn(
                salonstock_api::middleware_helpers::request_id::request_id_middleware,
            ))
            .with_state(state.clone());

        Self {
            router,
            state,
            tenant_id: Uuid::new_v4(),
            _db_dir: db_dir,
            _event_task: event_task,
        }
    }

    /// Send a request against the router with explicit headers.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("serialize request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("assemble request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible router call")
    }

    /// GET scoped to the default tenant.
    pub async fn get(&self, uri: &str) -> axum::response::Response {
        self.get_as(self.tenant_id, uri).await
    }

    /// GET scoped to an explicit tenant.
    pub async fn get_as(&self, tenant_id: Uuid, uri: &str) -> axum::response::Response {
        let tenant = tenant_id.to_string();
        self.request(Method::GET, uri, None, &[(TENANT_ID_HEADER, tenant.as_str())])
            .await
    }

    /// Mutating request as the default tenant and actor.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let tenant = self.tenant_id.to_string();
        self.request(
            method,
            uri,
            body,
            &[
                (TENANT_ID_HEADER, tenant.as_str()),
                (ACTING_USER_HEADER, TEST_ACTOR),
            ],
        )
        .await
    }

    /// POST as the default tenant and actor.
    pub async fn post(&self, uri: &str, body: Value) -> axum::response::Response {
        self.send(Method::POST, uri, Some(body)).await
    }

    /// Seed a fractional-unit product with one lot through the inventory
    /// service, bypassing the HTTP layer.
    pub async fn seed_product(
        &self,
        name: &str,
        quantity: Decimal,
        total_cost: Decimal,
    ) -> ReplenishOutcome {
        self.state
            .services
            .inventory
            .replenish(
                self.tenant_id,
                TEST_ACTOR,
                ReplenishInput {
                    product: ProductRef::New(NewProduct {
                        name: name.to_string(),
                        category: Some("hair".to_string()),
                        use_type: UseType::Internal,
                        measure_unit: MeasureUnit::Milliliter,
                        measure_value: Decimal::from(500),
                        min_stock: Decimal::ONE,
                    }),
                    lot: NewLot {
                        batch_number: format!("SEED-{}", &Uuid::new_v4().to_string()[..8]),
                        total_cost,
                        quantity,
                        entry_date: None,
                        expiration_date: None,
                    },
                    sale_price: None,
                },
            )
            .await
            .expect("seed product for tests")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}
