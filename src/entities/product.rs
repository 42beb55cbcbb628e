use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::Display;
use utoipa::ToSchema;
use uuid::Uuid;

/// Stock-keeping unit tracked by the inventory ledger.
///
/// `current_stock` is a denormalized sum of the product's active lot
/// quantities and is only ever written inside the same transaction that
/// mutates the lots backing it.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    #[sea_orm(nullable)]
    pub category: Option<String>,
    pub use_type: UseType,
    pub measure_unit: MeasureUnit,
    /// Package size in `measure_unit` (e.g. 500 on a milliliter product).
    #[sea_orm(column_type = "Decimal(Some((19, 3)))")]
    pub measure_value: Decimal,
    /// Reorder threshold for the low-stock listing.
    #[sea_orm(column_type = "Decimal(Some((19, 3)))")]
    pub min_stock: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 3)))")]
    pub current_stock: Decimal,
    /// Unit cost of the most recent replenishment.
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub cost_price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub sale_price: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product_lot::Entity")]
    Lots,
    #[sea_orm(has_many = "super::stock_movement::Entity")]
    Movements,
}

impl Related<super::product_lot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lots.def()
    }
}

impl Related<super::stock_movement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Movements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether consumption quantities for this product must be whole numbers.
    pub fn requires_whole_units(&self) -> bool {
        self.use_type == UseType::Resale || self.measure_unit.is_whole()
    }
}

/// How a product leaves the shelf: sold to a customer or used up in-house.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    ToSchema,
    Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UseType {
    #[sea_orm(string_value = "resale")]
    Resale,
    #[sea_orm(string_value = "internal")]
    Internal,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    ToSchema,
    Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MeasureUnit {
    #[sea_orm(string_value = "unit")]
    Unit,
    #[sea_orm(string_value = "liter")]
    Liter,
    #[sea_orm(string_value = "milliliter")]
    Milliliter,
    #[sea_orm(string_value = "kilogram")]
    Kilogram,
    #[sea_orm(string_value = "gram")]
    Gram,
}

impl MeasureUnit {
    /// Units that cannot be split into fractional quantities.
    pub fn is_whole(&self) -> bool {
        matches!(self, MeasureUnit::Unit)
    }
}
