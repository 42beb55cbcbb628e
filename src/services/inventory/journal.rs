//! Movement journal.
//!
//! Append-only: one row per completed IN or OUT operation, inserted in the
//! same transaction as the product and lot writes it documents. The core
//! never updates or deletes movements; reporting reads them elsewhere.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseTransaction, Set};
use uuid::Uuid;

use crate::entities::product;
use crate::entities::stock_movement::{self, MovementReason, MovementType};
use crate::errors::ServiceError;

pub struct NewMovement<'a> {
    pub product: &'a product::Model,
    pub movement_type: MovementType,
    pub reason: MovementReason,
    pub quantity: Decimal,
    /// COGS, only for OUT movements. IN movements price their stock on the
    /// lot itself.
    pub cost_value: Option<Decimal>,
    /// Revenue, only for OUT movements with reason sale.
    pub sale_value: Option<Decimal>,
    pub performed_by: &'a str,
}

pub async fn append(
    txn: &DatabaseTransaction,
    record: NewMovement<'_>,
) -> Result<stock_movement::Model, ServiceError> {
    let now = Utc::now();
    let model = stock_movement::ActiveModel {
        id: Set(Uuid::new_v4()),
        tenant_id: Set(record.product.tenant_id),
        product_id: Set(record.product.id),
        product_name: Set(record.product.name.clone()),
        movement_type: Set(record.movement_type),
        reason: Set(record.reason),
        quantity: Set(record.quantity),
        cost_value: Set(record.cost_value),
        sale_value: Set(record.sale_value),
        performed_by: Set(record.performed_by.to_string()),
        occurred_at: Set(now),
        created_at: Set(now),
    };
    let created = model.insert(txn).await?;
    Ok(created)
}
