//! Lot persistence.
//!
//! Lots are created by replenishment and drawn down by consumption, always
//! inside the coordinator's transaction. Draws are guarded writes filtered on
//! the quantity read earlier in the same transaction; a miss means a
//! concurrent consumer already changed the lot.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use super::fifo::{round_money, round_quantity, LotDraw};
use crate::entities::product_lot::{self, Entity as ProductLot};
use crate::errors::ServiceError;

/// Data for one incoming batch.
#[derive(Debug, Clone)]
pub struct NewLot {
    pub batch_number: String,
    pub total_cost: Decimal,
    pub quantity: Decimal,
    pub entry_date: Option<DateTime<Utc>>,
    pub expiration_date: Option<NaiveDate>,
}

pub fn validate_new_lot(lot: &NewLot) -> Result<(), ServiceError> {
    if lot.quantity <= Decimal::ZERO {
        return Err(ServiceError::InvalidLotData(
            "lot quantity must be positive".to_string(),
        ));
    }
    if round_quantity(lot.quantity) != lot.quantity {
        return Err(ServiceError::InvalidLotData(format!(
            "lot quantity {} has more than 3 decimal places",
            lot.quantity
        )));
    }
    if lot.total_cost < Decimal::ZERO {
        return Err(ServiceError::InvalidLotData(
            "lot cost must not be negative".to_string(),
        ));
    }
    Ok(())
}

/// Unit cost carried by every quantity drawn from this batch.
pub fn unit_cost_of(lot: &NewLot) -> Decimal {
    round_money(lot.total_cost / lot.quantity)
}

/// Active lots for a product, oldest entry first, ties broken by id.
pub async fn active_lots_in_fifo_order<C: ConnectionTrait>(
    conn: &C,
    tenant_id: Uuid,
    product_id: Uuid,
) -> Result<Vec<product_lot::Model>, ServiceError> {
    let lots = ProductLot::find()
        .filter(product_lot::Column::TenantId.eq(tenant_id))
        .filter(product_lot::Column::ProductId.eq(product_id))
        .filter(product_lot::Column::IsActive.eq(true))
        .order_by_asc(product_lot::Column::EntryDate)
        .order_by_asc(product_lot::Column::Id)
        .all(conn)
        .await?;
    Ok(lots)
}

pub async fn create_lot(
    txn: &DatabaseTransaction,
    tenant_id: Uuid,
    product_id: Uuid,
    lot: &NewLot,
) -> Result<product_lot::Model, ServiceError> {
    let now = Utc::now();
    let model = product_lot::ActiveModel {
        id: Set(Uuid::new_v4()),
        tenant_id: Set(tenant_id),
        product_id: Set(product_id),
        batch_number: Set(lot.batch_number.clone()),
        total_cost: Set(round_money(lot.total_cost)),
        unit_cost: Set(unit_cost_of(lot)),
        initial_quantity: Set(lot.quantity),
        current_quantity: Set(lot.quantity),
        entry_date: Set(lot.entry_date.unwrap_or(now)),
        expiration_date: Set(lot.expiration_date),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let created = model.insert(txn).await?;
    Ok(created)
}

/// Applies one planned draw as a guarded write.
///
/// `is_active` flips to false exactly when the draw empties the lot; retired
/// lots never come back, they remain as cost history.
pub async fn apply_draw(
    txn: &DatabaseTransaction,
    tenant_id: Uuid,
    draw: &LotDraw,
) -> Result<(), ServiceError> {
    let result = ProductLot::update_many()
        .col_expr(
            product_lot::Column::CurrentQuantity,
            Expr::value(draw.remaining_after),
        )
        .col_expr(product_lot::Column::IsActive, Expr::value(!draw.exhausts_lot()))
        .col_expr(product_lot::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(product_lot::Column::Id.eq(draw.lot_id))
        .filter(product_lot::Column::TenantId.eq(tenant_id))
        .filter(product_lot::Column::IsActive.eq(true))
        .filter(product_lot::Column::CurrentQuantity.eq(draw.expected_quantity))
        .exec(txn)
        .await?;

    if result.rows_affected == 0 {
        return Err(ServiceError::TransactionConflict(format!(
            "lot {} was changed by a concurrent writer",
            draw.lot_id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn new_lot(quantity: Decimal, total_cost: Decimal) -> NewLot {
        NewLot {
            batch_number: "B-001".to_string(),
            total_cost,
            quantity,
            entry_date: None,
            expiration_date: None,
        }
    }

    #[test]
    fn unit_cost_divides_cost_over_the_batch() {
        assert_eq!(unit_cost_of(&new_lot(dec!(10), dec!(100))), dec!(10));
        assert_eq!(unit_cost_of(&new_lot(dec!(3), dec!(10))), dec!(3.3333));
    }

    #[test]
    fn rejects_empty_and_negative_batches() {
        let err = validate_new_lot(&new_lot(dec!(0), dec!(10))).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidLotData(_)));

        let err = validate_new_lot(&new_lot(dec!(-2), dec!(10))).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidLotData(_)));

        let err = validate_new_lot(&new_lot(dec!(5), dec!(-0.01))).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidLotData(_)));
    }

    #[test]
    fn rejects_overly_precise_quantities() {
        let err = validate_new_lot(&new_lot(dec!(1.0001), dec!(10))).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidLotData(_)));
    }

    #[test]
    fn free_stock_is_a_valid_batch() {
        assert!(validate_new_lot(&new_lot(dec!(5), dec!(0))).is_ok());
        assert_eq!(unit_cost_of(&new_lot(dec!(5), dec!(0))), dec!(0));
    }
}
