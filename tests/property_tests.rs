//! Property-based tests for the FIFO consumption planner.
//!
//! These exercise `plan_consumption` across generated lot configurations to
//! check the invariants unit tests only sample: draws cover exactly the
//! request, stay in lot order, drain every lot before touching the next, and
//! price the consumption from the drawn lots alone.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use salonstock_api::entities::product_lot;
use salonstock_api::errors::ServiceError;
use salonstock_api::services::inventory::fifo::{plan_consumption, round_money, round_quantity};
use uuid::Uuid;

fn quantity_strategy() -> impl Strategy<Value = Decimal> {
    // 0.001 through 1000.000 at three decimal places.
    (1i64..=1_000_000).prop_map(|n| Decimal::new(n, 3))
}

fn unit_cost_strategy() -> impl Strategy<Value = Decimal> {
    // 0.0001 through 100.0000 at four decimal places.
    (1i64..=1_000_000).prop_map(|n| Decimal::new(n, 4))
}

fn lots_strategy() -> impl Strategy<Value = Vec<product_lot::Model>> {
    prop::collection::vec((quantity_strategy(), unit_cost_strategy()), 1..8).prop_map(|specs| {
        let tenant_id = Uuid::new_v4();
        let product_id = Uuid::new_v4();
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap();
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (quantity, unit_cost))| product_lot::Model {
                id: Uuid::new_v4(),
                tenant_id,
                product_id,
                batch_number: format!("B-{i}"),
                total_cost: round_money(unit_cost * quantity),
                unit_cost,
                initial_quantity: quantity,
                current_quantity: quantity,
                entry_date: base + Duration::days(i as i64),
                expiration_date: None,
                is_active: true,
                created_at: base,
                updated_at: base,
            })
            .collect()
    })
}

fn total_quantity(lots: &[product_lot::Model]) -> Decimal {
    lots.iter().map(|lot| lot.current_quantity).sum()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn covered_requests_are_allocated_exactly(
        lots in lots_strategy(),
        percent in 1u32..=100,
    ) {
        let total = total_quantity(&lots);
        let request = round_quantity(total * Decimal::from(percent) / dec!(100));
        prop_assume!(request > Decimal::ZERO);

        let plan = plan_consumption(&lots, request).expect("request within stock must plan");

        let allocated: Decimal = plan.draws.iter().map(|draw| draw.take).sum();
        prop_assert_eq!(allocated, request, "draws must cover the request exactly");

        for draw in &plan.draws {
            prop_assert!(draw.take > Decimal::ZERO);
            prop_assert!(draw.take <= draw.expected_quantity);
            prop_assert_eq!(
                draw.remaining_after,
                round_quantity(draw.expected_quantity - draw.take)
            );
        }

        let expected_cogs = round_money(
            plan.draws
                .iter()
                .map(|draw| draw.take * draw.unit_cost)
                .sum(),
        );
        prop_assert_eq!(plan.cogs, expected_cogs);
    }

    #[test]
    fn draws_follow_lot_order_and_drain_before_moving_on(
        lots in lots_strategy(),
        percent in 1u32..=100,
    ) {
        let total = total_quantity(&lots);
        let request = round_quantity(total * Decimal::from(percent) / dec!(100));
        prop_assume!(request > Decimal::ZERO);

        let plan = plan_consumption(&lots, request).expect("request within stock must plan");

        // Draws hit a prefix of the lots in their given order.
        prop_assert!(plan.draws.len() <= lots.len());
        for (draw, lot) in plan.draws.iter().zip(lots.iter()) {
            prop_assert_eq!(draw.lot_id, lot.id);
        }

        // Every draw except the last one must empty its lot.
        for draw in &plan.draws[..plan.draws.len().saturating_sub(1)] {
            prop_assert!(
                draw.exhausts_lot(),
                "an inner draw left {} in lot {}",
                draw.remaining_after,
                draw.lot_id
            );
        }
    }

    #[test]
    fn requests_beyond_the_lots_always_fail(
        lots in lots_strategy(),
        excess in 1i64..=1_000_000,
    ) {
        let request = total_quantity(&lots) + Decimal::new(excess, 3);

        prop_assert!(matches!(
            plan_consumption(&lots, request),
            Err(ServiceError::InsufficientLotCoverage(_))
        ));
    }

    #[test]
    fn non_positive_requests_are_rejected(
        lots in lots_strategy(),
        magnitude in 0i64..=1_000_000,
    ) {
        let request = -Decimal::new(magnitude, 3);

        let result = plan_consumption(&lots, request);
        prop_assert!(matches!(result, Err(ServiceError::InvalidQuantity(_))));
    }

    #[test]
    fn cogs_never_exceeds_the_value_of_all_lots(
        lots in lots_strategy(),
        percent in 1u32..=100,
    ) {
        let total = total_quantity(&lots);
        let request = round_quantity(total * Decimal::from(percent) / dec!(100));
        prop_assume!(request > Decimal::ZERO);

        let plan = plan_consumption(&lots, request).expect("request within stock must plan");

        let full_value = round_money(
            lots.iter()
                .map(|lot| lot.current_quantity * lot.unit_cost)
                .sum(),
        );
        prop_assert!(plan.cogs >= Decimal::ZERO);
        prop_assert!(plan.cogs <= full_value);
    }
}
