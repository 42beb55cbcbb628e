//! Product aggregate state.
//!
//! `current_stock` is a denormalized accelerator of the active-lot sum, so
//! its delta is applied in the same transaction as the lot writes, guarded on
//! the value read at the start of the operation.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    Set,
};
use uuid::Uuid;

use super::fifo::{round_money, round_quantity};
use crate::entities::product::{self, Entity as Product, MeasureUnit, UseType};
use crate::errors::ServiceError;

/// Catalog data for a SKU created on first replenishment.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub category: Option<String>,
    pub use_type: UseType,
    pub measure_unit: MeasureUnit,
    pub measure_value: Decimal,
    pub min_stock: Decimal,
}

pub async fn load_product<C: ConnectionTrait>(
    conn: &C,
    tenant_id: Uuid,
    product_id: Uuid,
) -> Result<product::Model, ServiceError> {
    Product::find_by_id(product_id)
        .filter(product::Column::TenantId.eq(tenant_id))
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
}

/// Inserts a new SKU with zero stock. Stock and cost arrive through the
/// replenishment that carries this product's first lot.
pub async fn create_product(
    txn: &DatabaseTransaction,
    tenant_id: Uuid,
    data: &NewProduct,
    sale_price: Option<Decimal>,
) -> Result<product::Model, ServiceError> {
    if data.use_type == UseType::Resale && sale_price.is_none() {
        return Err(ServiceError::ValidationError(
            "resale products require a sale price".to_string(),
        ));
    }

    let now = Utc::now();
    let model = product::ActiveModel {
        id: Set(Uuid::new_v4()),
        tenant_id: Set(tenant_id),
        name: Set(data.name.clone()),
        category: Set(data.category.clone()),
        use_type: Set(data.use_type),
        measure_unit: Set(data.measure_unit),
        measure_value: Set(data.measure_value),
        min_stock: Set(round_quantity(data.min_stock)),
        current_stock: Set(Decimal::ZERO),
        cost_price: Set(Decimal::ZERO),
        sale_price: Set(sale_price.map(round_money)),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let created = model.insert(txn).await?;
    Ok(created)
}

/// Decrements the cached aggregate for a consumption. Guarded on the stock
/// value from the product snapshot; a miss means a concurrent writer.
pub async fn apply_stock_decrement(
    txn: &DatabaseTransaction,
    snapshot: &product::Model,
    quantity: Decimal,
) -> Result<Decimal, ServiceError> {
    let new_stock = round_quantity(snapshot.current_stock - quantity);

    let result = Product::update_many()
        .col_expr(product::Column::CurrentStock, Expr::value(new_stock))
        .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(product::Column::Id.eq(snapshot.id))
        .filter(product::Column::TenantId.eq(snapshot.tenant_id))
        .filter(product::Column::CurrentStock.eq(snapshot.current_stock))
        .exec(txn)
        .await?;

    if result.rows_affected == 0 {
        return Err(ServiceError::TransactionConflict(format!(
            "stock of product {} was changed by a concurrent writer",
            snapshot.id
        )));
    }
    Ok(new_stock)
}

/// Increments the aggregate for a replenishment and refreshes the cached unit
/// cost, plus the sale price when the caller supplied one.
pub async fn apply_replenishment(
    txn: &DatabaseTransaction,
    snapshot: &product::Model,
    quantity: Decimal,
    unit_cost: Decimal,
    sale_price: Option<Decimal>,
) -> Result<Decimal, ServiceError> {
    let new_stock = round_quantity(snapshot.current_stock + quantity);

    let mut update = Product::update_many()
        .col_expr(product::Column::CurrentStock, Expr::value(new_stock))
        .col_expr(product::Column::CostPrice, Expr::value(unit_cost))
        .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()));
    if let Some(price) = sale_price {
        update = update.col_expr(
            product::Column::SalePrice,
            Expr::value(Some(round_money(price))),
        );
    }

    let result = update
        .filter(product::Column::Id.eq(snapshot.id))
        .filter(product::Column::TenantId.eq(snapshot.tenant_id))
        .filter(product::Column::CurrentStock.eq(snapshot.current_stock))
        .exec(txn)
        .await?;

    if result.rows_affected == 0 {
        return Err(ServiceError::TransactionConflict(format!(
            "stock of product {} was changed by a concurrent writer",
            snapshot.id
        )));
    }
    Ok(new_stock)
}
