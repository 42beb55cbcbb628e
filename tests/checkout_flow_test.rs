//! End-to-end tests for the appointment checkout flow.
//!
//! Tests cover:
//! - Appointment creation and retrieval
//! - Checkout consuming supplies, completing the appointment and booking income
//! - Checkout without supplies
//! - Failed checkouts leaving no completion or income behind
//! - Status guards on already-settled appointments

mod common;

use axum::{body, http::Method, response::Response};
use chrono::{Duration, Utc};
use common::{TestApp, TEST_ACTOR};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use salonstock_api::entities::appointment::{self, AppointmentStatus};
use sea_orm::{ActiveModelTrait, Set};
use serde_json::{json, Value};
use uuid::Uuid;

async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

fn dec_field(value: &Value) -> Decimal {
    value
        .as_str()
        .unwrap_or_else(|| panic!("expected decimal string, got {value}"))
        .parse()
        .expect("decimal parses")
}

async fn create_appointment(app: &TestApp, customer: &str, price: Decimal) -> String {
    let response = app
        .post(
            "/api/v1/appointments",
            json!({
                "customer_name": customer,
                "service_name": "Hydration Treatment",
                "service_price": price,
                "scheduled_at": (Utc::now() + Duration::hours(2)).to_rfc3339()
            }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let body = response_json(response).await;
    assert_eq!(body["data"]["status"], json!("scheduled"));
    body["data"]["id"].as_str().expect("appointment id").to_string()
}

#[tokio::test]
async fn appointments_can_be_created_and_fetched() {
    let app = TestApp::new().await;
    let id = create_appointment(&app, "Laura Prado", dec!(55)).await;

    let fetched = response_json(app.get(&format!("/api/v1/appointments/{}", id)).await).await;
    assert_eq!(fetched["data"]["customer_name"], json!("Laura Prado"));
    assert_eq!(fetched["data"]["service_name"], json!("Hydration Treatment"));
    assert_eq!(dec_field(&fetched["data"]["service_price"]), dec!(55));
    assert_eq!(fetched["data"]["status"], json!("scheduled"));
    assert!(fetched["data"]["completed_at"].is_null());

    let missing = app
        .get(&format!("/api/v1/appointments/{}", Uuid::new_v4()))
        .await;
    assert_eq!(missing.status(), 404);
}

#[tokio::test]
async fn checkout_consumes_supplies_completes_and_books_income() {
    let app = TestApp::new().await;
    let seeded = app.seed_product("Treatment Ampoule", dec!(10), dec!(100)).await;
    let appointment_id = create_appointment(&app, "Laura Prado", dec!(55)).await;

    let response = app
        .post(
            &format!("/api/v1/appointments/{}/checkout", appointment_id),
            json!({
                "supplies": [
                    {"product_id": seeded.product.id, "quantity": 2.5}
                ]
            }),
        )
        .await;
    assert_eq!(response.status(), 200);

    let body = response_json(response).await;
    let data = &body["data"];
    assert_eq!(data["appointment"]["status"], json!("completed"));
    assert!(!data["appointment"]["completed_at"].is_null());
    // 2.5 units at unit cost 10.
    assert_eq!(dec_field(&data["total_cogs"]), dec!(25));

    let movements = data["movements"].as_array().expect("movements");
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0]["movement_type"], json!("out"));
    assert_eq!(movements[0]["reason"], json!("internal"));
    assert_eq!(dec_field(&movements[0]["quantity"]), dec!(2.5));
    assert_eq!(dec_field(&movements[0]["cost_value"]), dec!(25));
    assert!(movements[0]["sale_value"].is_null());

    let income_entry_id = data["income_entry_id"].as_str().expect("income entry id");

    // The income entry is visible in the financial listing.
    let entries = response_json(app.get("/api/v1/financial-entries").await).await;
    assert_eq!(entries["data"]["total"], json!(1));
    let entry = &entries["data"]["items"][0];
    assert_eq!(entry["id"], json!(income_entry_id));
    assert_eq!(entry["kind"], json!("income"));
    assert_eq!(dec_field(&entry["amount"]), dec!(55));
    assert_eq!(entry["appointment_id"], json!(appointment_id));
    assert_eq!(entry["recorded_by"], json!(TEST_ACTOR));
    assert!(
        entry["description"]
            .as_str()
            .expect("description")
            .contains("Hydration Treatment"),
        "unexpected description: {}",
        entry["description"]
    );

    // Stock went down by the consumed amount.
    let detail = response_json(
        app.get(&format!("/api/v1/products/{}", seeded.product.id))
            .await,
    )
    .await;
    assert_eq!(dec_field(&detail["data"]["current_stock"]), dec!(7.5));
}

#[tokio::test]
async fn checkout_without_supplies_still_completes_and_books_income() {
    let app = TestApp::new().await;
    let appointment_id = create_appointment(&app, "Renata Lima", dec!(40)).await;

    let response = app
        .post(
            &format!("/api/v1/appointments/{}/checkout", appointment_id),
            json!({}),
        )
        .await;
    assert_eq!(response.status(), 200);

    let body = response_json(response).await;
    assert_eq!(body["data"]["appointment"]["status"], json!("completed"));
    assert_eq!(body["data"]["movements"].as_array().expect("movements").len(), 0);
    assert_eq!(dec_field(&body["data"]["total_cogs"]), dec!(0));

    let entries = response_json(app.get("/api/v1/financial-entries").await).await;
    assert_eq!(entries["data"]["total"], json!(1));
    assert_eq!(dec_field(&entries["data"]["items"][0]["amount"]), dec!(40));
}

#[tokio::test]
async fn failed_checkout_leaves_no_completion_income_or_deduction() {
    let app = TestApp::new().await;
    let seeded = app.seed_product("Scarce Serum", dec!(1), dec!(20)).await;
    let appointment_id = create_appointment(&app, "Bruno Dias", dec!(70)).await;

    let response = app
        .post(
            &format!("/api/v1/appointments/{}/checkout", appointment_id),
            json!({
                "supplies": [
                    {"product_id": seeded.product.id, "quantity": 5}
                ]
            }),
        )
        .await;
    assert_eq!(response.status(), 422);

    // Nothing from the failed checkout survived.
    let fetched = response_json(
        app.get(&format!("/api/v1/appointments/{}", appointment_id))
            .await,
    )
    .await;
    assert_eq!(fetched["data"]["status"], json!("scheduled"));
    assert!(fetched["data"]["completed_at"].is_null());

    let entries = response_json(app.get("/api/v1/financial-entries").await).await;
    assert_eq!(entries["data"]["total"], json!(0));

    let detail = response_json(
        app.get(&format!("/api/v1/products/{}", seeded.product.id))
            .await,
    )
    .await;
    assert_eq!(dec_field(&detail["data"]["current_stock"]), dec!(1));

    let movements = response_json(app.get("/api/v1/movements?movement_type=out").await).await;
    assert_eq!(movements["data"]["total"], json!(0));
}

#[tokio::test]
async fn checkout_failing_on_the_last_line_keeps_earlier_deductions_but_not_completion() {
    let app = TestApp::new().await;
    let plentiful = app.seed_product("Plentiful Oil", dec!(10), dec!(100)).await;
    let scarce = app.seed_product("Scarce Serum", dec!(1), dec!(20)).await;
    let appointment_id = create_appointment(&app, "Carla Mota", dec!(90)).await;

    let response = app
        .post(
            &format!("/api/v1/appointments/{}/checkout", appointment_id),
            json!({
                "supplies": [
                    {"product_id": plentiful.product.id, "quantity": 2},
                    {"product_id": scarce.product.id, "quantity": 5}
                ]
            }),
        )
        .await;
    assert_eq!(response.status(), 422);

    // Supply lines commit one at a time. The first line stands, but the
    // completion and income ride on the final line and rolled back with it.
    let detail = response_json(
        app.get(&format!("/api/v1/products/{}", plentiful.product.id))
            .await,
    )
    .await;
    assert_eq!(dec_field(&detail["data"]["current_stock"]), dec!(8));

    let fetched = response_json(
        app.get(&format!("/api/v1/appointments/{}", appointment_id))
            .await,
    )
    .await;
    assert_eq!(fetched["data"]["status"], json!("scheduled"));

    let entries = response_json(app.get("/api/v1/financial-entries").await).await;
    assert_eq!(entries["data"]["total"], json!(0));
}

#[tokio::test]
async fn completed_appointments_cannot_be_checked_out_again() {
    let app = TestApp::new().await;
    let appointment_id = create_appointment(&app, "Joana Reis", dec!(35)).await;

    let first = app
        .post(
            &format!("/api/v1/appointments/{}/checkout", appointment_id),
            json!({}),
        )
        .await;
    assert_eq!(first.status(), 200);

    let second = app
        .post(
            &format!("/api/v1/appointments/{}/checkout", appointment_id),
            json!({}),
        )
        .await;
    assert_eq!(second.status(), 400);
    let body = response_json(second).await;
    assert!(
        body["message"]
            .as_str()
            .expect("message")
            .contains("already completed"),
        "unexpected message: {}",
        body["message"]
    );

    // Only the first checkout booked income.
    let entries = response_json(app.get("/api/v1/financial-entries").await).await;
    assert_eq!(entries["data"]["total"], json!(1));
}

#[tokio::test]
async fn canceled_appointments_cannot_be_checked_out() {
    let app = TestApp::new().await;

    let now = Utc::now();
    let canceled = appointment::ActiveModel {
        id: Set(Uuid::new_v4()),
        tenant_id: Set(app.tenant_id),
        customer_name: Set("No Show".to_string()),
        service_name: Set("Cut".to_string()),
        service_price: Set(dec!(30)),
        scheduled_at: Set(now - Duration::hours(1)),
        status: Set(AppointmentStatus::Canceled),
        completed_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(app.state.db.as_ref())
    .await
    .expect("insert canceled appointment");

    let response = app
        .post(
            &format!("/api/v1/appointments/{}/checkout", canceled.id),
            json!({}),
        )
        .await;
    assert_eq!(response.status(), 400);
    let body = response_json(response).await;
    assert!(
        body["message"]
            .as_str()
            .expect("message")
            .contains("already canceled"),
        "unexpected message: {}",
        body["message"]
    );
}

#[tokio::test]
async fn checkout_of_unknown_appointment_returns_not_found() {
    let app = TestApp::new().await;

    let response = app
        .post(
            &format!("/api/v1/appointments/{}/checkout", Uuid::new_v4()),
            json!({}),
        )
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn financial_entries_filter_by_kind_and_appointment() {
    let app = TestApp::new().await;
    let first = create_appointment(&app, "Client One", dec!(50)).await;
    let second = create_appointment(&app, "Client Two", dec!(80)).await;

    for id in [&first, &second] {
        let response = app
            .post(&format!("/api/v1/appointments/{}/checkout", id), json!({}))
            .await;
        assert_eq!(response.status(), 200);
    }

    let all = response_json(app.get("/api/v1/financial-entries").await).await;
    assert_eq!(all["data"]["total"], json!(2));

    let incomes = response_json(app.get("/api/v1/financial-entries?kind=income").await).await;
    assert_eq!(incomes["data"]["total"], json!(2));

    let expenses = response_json(app.get("/api/v1/financial-entries?kind=expense").await).await;
    assert_eq!(expenses["data"]["total"], json!(0));

    let scoped = response_json(
        app.get(&format!("/api/v1/financial-entries?appointment_id={}", first))
            .await,
    )
    .await;
    assert_eq!(scoped["data"]["total"], json!(1));
    assert_eq!(dec_field(&scoped["data"]["items"][0]["amount"]), dec!(50));
}
