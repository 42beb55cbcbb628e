//! Concurrency behavior of the stock ledger: guarded writes must keep the
//! product aggregate and its lots consistent no matter how requests interleave.

mod common;

use assert_matches::assert_matches;
use common::{TestApp, TEST_ACTOR};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use salonstock_api::entities::stock_movement::MovementReason;
use salonstock_api::errors::ServiceError;
use salonstock_api::services::inventory::{
    fifo::LotDraw, lots, ConsumeRequest, NewLot, ProductRef, ReplenishInput,
};
use sea_orm::TransactionTrait;

#[tokio::test]
async fn concurrent_consumption_never_oversells() {
    let app = TestApp::new().await;
    let seeded = app.seed_product("Contended Oil", dec!(10), dec!(100)).await;
    let product_id = seeded.product.id;

    // 20 single-unit consumptions race for 10 units of stock.
    let mut tasks = Vec::new();
    for _ in 0..20 {
        let service = app.state.services.inventory.clone();
        let tenant = app.tenant_id;
        tasks.push(tokio::spawn(async move {
            service
                .consume(
                    tenant,
                    TEST_ACTOR,
                    ConsumeRequest {
                        product_id,
                        quantity: dec!(1),
                        reason: MovementReason::Internal,
                    },
                    Vec::new(),
                )
                .await
                .is_ok()
        }));
    }

    let mut successes = 0;
    for task in tasks {
        if task.await.expect("consumption task completes") {
            successes += 1;
        }
    }
    assert_eq!(
        successes, 10,
        "exactly the available stock should be consumed; got {}",
        successes
    );

    let (product, active_lots) = app
        .state
        .services
        .products
        .get_product_with_lots(app.tenant_id, product_id)
        .await
        .expect("product read back");
    assert_eq!(product.current_stock, Decimal::ZERO);
    assert!(active_lots.is_empty(), "every lot should be exhausted");
}

#[tokio::test]
async fn stale_lot_draws_are_rejected() {
    let app = TestApp::new().await;
    let seeded = app.seed_product("Guarded Oil", dec!(10), dec!(100)).await;

    // A plan computed against a quantity the lot no longer holds.
    let stale = LotDraw {
        lot_id: seeded.lot.id,
        expected_quantity: dec!(4),
        take: dec!(4),
        remaining_after: dec!(0),
        unit_cost: seeded.lot.unit_cost,
    };

    let txn = app.state.db.begin().await.expect("begin transaction");
    let result = lots::apply_draw(&txn, app.tenant_id, &stale).await;
    txn.rollback().await.expect("rollback");

    assert_matches!(result, Err(ServiceError::TransactionConflict(_)));
}

#[tokio::test]
async fn aggregate_tracks_the_sum_of_active_lots() {
    let app = TestApp::new().await;
    let seeded = app.seed_product("Ledger Oil", dec!(6), dec!(60)).await;
    let product_id = seeded.product.id;
    let inventory = &app.state.services.inventory;

    inventory
        .replenish(
            app.tenant_id,
            TEST_ACTOR,
            ReplenishInput {
                product: ProductRef::Existing(product_id),
                lot: NewLot {
                    batch_number: "TOP-UP".to_string(),
                    total_cost: dec!(50),
                    quantity: dec!(4),
                    entry_date: None,
                    expiration_date: None,
                },
                sale_price: None,
            },
        )
        .await
        .expect("replenish");

    inventory
        .consume(
            app.tenant_id,
            TEST_ACTOR,
            ConsumeRequest {
                product_id,
                quantity: dec!(7),
                reason: MovementReason::Internal,
            },
            Vec::new(),
        )
        .await
        .expect("consume");

    let (product, active_lots) = app
        .state
        .services
        .products
        .get_product_with_lots(app.tenant_id, product_id)
        .await
        .expect("product read back");
    let lot_total: Decimal = active_lots.iter().map(|lot| lot.current_quantity).sum();
    assert_eq!(product.current_stock, dec!(3));
    assert_eq!(
        lot_total, product.current_stock,
        "active lots must add up to the cached aggregate"
    );
}

#[tokio::test]
async fn failed_extra_write_rolls_back_the_whole_consumption() {
    let app = TestApp::new().await;
    let seeded = app.seed_product("Rollback Oil", dec!(10), dec!(100)).await;
    let product_id = seeded.product.id;

    let failing_write: salonstock_api::services::inventory::ExtraWrite = Box::new(|_txn| {
        Box::pin(async {
            Err(ServiceError::ValidationError(
                "caller write failed".to_string(),
            ))
        })
    });

    let result = app
        .state
        .services
        .inventory
        .consume(
            app.tenant_id,
            TEST_ACTOR,
            ConsumeRequest {
                product_id,
                quantity: dec!(3),
                reason: MovementReason::Internal,
            },
            vec![failing_write],
        )
        .await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));

    // The ledger writes that preceded the extra write rolled back with it.
    let (product, active_lots) = app
        .state
        .services
        .products
        .get_product_with_lots(app.tenant_id, product_id)
        .await
        .expect("product read back");
    assert_eq!(product.current_stock, dec!(10));
    assert_eq!(active_lots.len(), 1);
    assert_eq!(active_lots[0].current_quantity, dec!(10));

    let (movements, total) = app
        .state
        .services
        .movements
        .list_movements(
            app.tenant_id,
            salonstock_api::services::movements::MovementFilter::default(),
            1,
            50,
        )
        .await
        .expect("movements read back");
    // Only the seeding replenishment is on record.
    assert_eq!(total, 1);
    assert_eq!(movements.len(), 1);
}
