//! FIFO consumption planning.
//!
//! Pure decision logic: given a product snapshot and its active lots in
//! first-in-first-out order, decide how much to take from each lot and what
//! the consumed quantity cost. No I/O happens here; the coordinator reads the
//! lots inside its transaction and applies the returned draws.

use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use crate::entities::{product, product_lot};
use crate::errors::ServiceError;

/// Decimal places carried by every quantity column.
pub const QUANTITY_SCALE: u32 = 3;
/// Decimal places carried by every money column.
pub const MONEY_SCALE: u32 = 4;

pub fn round_quantity(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(QUANTITY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// One planned deduction from a single lot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotDraw {
    pub lot_id: Uuid,
    /// Quantity the lot held when the plan was computed. Guarded updates
    /// filter on this value to detect concurrent writers.
    pub expected_quantity: Decimal,
    pub take: Decimal,
    pub remaining_after: Decimal,
    pub unit_cost: Decimal,
}

impl LotDraw {
    /// True when this draw empties the lot, which retires it permanently.
    pub fn exhausts_lot(&self) -> bool {
        self.remaining_after <= Decimal::ZERO
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumptionPlan {
    pub draws: Vec<LotDraw>,
    pub cogs: Decimal,
}

/// Checks every precondition of a consumption before any write is issued.
pub fn validate_consumption(
    product: &product::Model,
    quantity: Decimal,
) -> Result<(), ServiceError> {
    if quantity <= Decimal::ZERO {
        return Err(ServiceError::InvalidQuantity(
            "quantity must be positive".to_string(),
        ));
    }
    if round_quantity(quantity) != quantity {
        return Err(ServiceError::InvalidQuantity(format!(
            "quantity {} has more than {} decimal places",
            quantity, QUANTITY_SCALE
        )));
    }
    if product.requires_whole_units() && quantity.fract() != Decimal::ZERO {
        return Err(ServiceError::InvalidQuantity(format!(
            "product '{}' is tracked in whole units",
            product.name
        )));
    }
    if quantity > product.current_stock {
        return Err(ServiceError::InsufficientStock(format!(
            "requested {} of '{}' but only {} in stock",
            quantity, product.name, product.current_stock
        )));
    }
    Ok(())
}

/// Walks the lots oldest first and allocates the requested quantity.
///
/// `lots` must already be in FIFO order (entry date ascending, id ascending)
/// and restricted to active lots. If the lots run out before the request is
/// covered the cached aggregate overstates real inventory; that is an
/// integrity fault and the whole operation fails rather than booking the
/// shortfall at zero cost.
pub fn plan_consumption(
    lots: &[product_lot::Model],
    requested: Decimal,
) -> Result<ConsumptionPlan, ServiceError> {
    if requested <= Decimal::ZERO {
        return Err(ServiceError::InvalidQuantity(
            "quantity must be positive".to_string(),
        ));
    }

    let mut remaining = round_quantity(requested);
    let mut cogs = Decimal::ZERO;
    let mut draws = Vec::new();

    for lot in lots {
        if remaining <= Decimal::ZERO {
            break;
        }
        if lot.current_quantity <= Decimal::ZERO {
            continue;
        }

        let take = lot.current_quantity.min(remaining);
        cogs += take * lot.unit_cost;
        remaining = round_quantity(remaining - take);
        draws.push(LotDraw {
            lot_id: lot.id,
            expected_quantity: lot.current_quantity,
            take,
            remaining_after: round_quantity(lot.current_quantity - take),
            unit_cost: lot.unit_cost,
        });
    }

    if remaining > Decimal::ZERO {
        return Err(ServiceError::InsufficientLotCoverage(format!(
            "active lots fall {} short of the requested quantity; aggregate stock disagrees with lot inventory",
            remaining
        )));
    }

    Ok(ConsumptionPlan {
        draws,
        cogs: round_money(cogs),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::product::{MeasureUnit, UseType};
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;
    use test_case::test_case;

    fn product(use_type: UseType, unit: MeasureUnit, stock: Decimal) -> product::Model {
        let now = Utc::now();
        product::Model {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            name: "Argan Oil".to_string(),
            category: Some("hair".to_string()),
            use_type,
            measure_unit: unit,
            measure_value: dec!(500),
            min_stock: dec!(2),
            current_stock: stock,
            cost_price: dec!(10),
            sale_price: Some(dec!(25)),
            created_at: now,
            updated_at: now,
        }
    }

    fn lot(age_days: i64, quantity: Decimal, unit_cost: Decimal) -> product_lot::Model {
        let now = Utc::now();
        product_lot::Model {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            batch_number: format!("B-{}", age_days),
            total_cost: unit_cost * quantity,
            unit_cost,
            initial_quantity: quantity,
            current_quantity: quantity,
            entry_date: now - Duration::days(age_days),
            expiration_date: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn takes_from_the_oldest_lot_first() {
        let lots = vec![lot(10, dec!(5), dec!(10)), lot(5, dec!(5), dec!(20))];

        let plan = plan_consumption(&lots, dec!(7)).unwrap();

        assert_eq!(plan.draws.len(), 2);
        assert_eq!(plan.draws[0].take, dec!(5));
        assert!(plan.draws[0].exhausts_lot());
        assert_eq!(plan.draws[1].take, dec!(2));
        assert_eq!(plan.draws[1].remaining_after, dec!(3));
        assert!(!plan.draws[1].exhausts_lot());
        assert_eq!(plan.cogs, dec!(90));
    }

    #[test]
    fn consuming_exactly_the_total_exhausts_every_lot() {
        let lots = vec![lot(3, dec!(2.5), dec!(4)), lot(1, dec!(1.5), dec!(6))];

        let plan = plan_consumption(&lots, dec!(4)).unwrap();

        assert!(plan.draws.iter().all(LotDraw::exhausts_lot));
        assert_eq!(plan.cogs, dec!(19));
    }

    #[test]
    fn a_single_lot_covers_small_requests() {
        let lots = vec![lot(1, dec!(10), dec!(2.5))];

        let plan = plan_consumption(&lots, dec!(0.25)).unwrap();

        assert_eq!(plan.draws.len(), 1);
        assert_eq!(plan.draws[0].remaining_after, dec!(9.75));
        assert_eq!(plan.cogs, dec!(0.625));
    }

    #[test]
    fn shortfall_is_an_integrity_fault_not_a_free_consumption() {
        let lots = vec![lot(2, dec!(3), dec!(10))];

        let err = plan_consumption(&lots, dec!(5)).unwrap_err();
        assert!(matches!(err, ServiceError::InsufficientLotCoverage(_)));
    }

    #[test]
    fn no_active_lots_means_no_coverage() {
        let err = plan_consumption(&[], dec!(1)).unwrap_err();
        assert!(matches!(err, ServiceError::InsufficientLotCoverage(_)));
    }

    #[test]
    fn drained_lots_are_skipped_without_a_draw() {
        let mut empty = lot(9, dec!(5), dec!(10));
        empty.current_quantity = Decimal::ZERO;
        let lots = vec![empty, lot(1, dec!(4), dec!(8))];

        let plan = plan_consumption(&lots, dec!(2)).unwrap();

        assert_eq!(plan.draws.len(), 1);
        assert_eq!(plan.cogs, dec!(16));
    }

    #[test_case(dec!(0) ; "zero")]
    #[test_case(dec!(-3) ; "negative")]
    #[test_case(dec!(1.2345) ; "four decimal places")]
    fn validation_rejects_bad_quantities(quantity: Decimal) {
        let product = product(UseType::Internal, MeasureUnit::Milliliter, dec!(100));
        let err = validate_consumption(&product, quantity).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidQuantity(_)));
    }

    #[test]
    fn resale_products_only_move_in_whole_units() {
        let product = product(UseType::Resale, MeasureUnit::Unit, dec!(10));
        let err = validate_consumption(&product, dec!(1.5)).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidQuantity(_)));
        assert!(validate_consumption(&product, dec!(2)).is_ok());
    }

    #[test]
    fn fractional_draws_are_fine_for_measured_products() {
        let product = product(UseType::Internal, MeasureUnit::Milliliter, dec!(100));
        assert!(validate_consumption(&product, dec!(12.375)).is_ok());
    }

    #[test]
    fn requests_beyond_the_aggregate_are_insufficient_stock() {
        let product = product(UseType::Internal, MeasureUnit::Gram, dec!(4));
        let err = validate_consumption(&product, dec!(4.001)).unwrap_err();
        assert!(matches!(err, ServiceError::InsufficientStock(_)));
    }

    #[test]
    fn rounding_is_midpoint_away_from_zero() {
        assert_eq!(round_quantity(dec!(1.2345)), dec!(1.235));
        assert_eq!(round_quantity(dec!(-1.2345)), dec!(-1.235));
        assert_eq!(round_money(dec!(0.00005)), dec!(0.0001));
    }
}
