//! Product catalog reads and catalog-only mutations.
//!
//! Stock, cost and sale-price-on-restock go through the inventory
//! coordinator; this service only touches fields with no ledger meaning.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set,
};
use sea_orm::sea_query::Expr;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::product::{self, Entity as Product};
use crate::entities::product_lot;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::inventory::fifo::{round_money, round_quantity};
use crate::services::inventory::{ledger, lots};

#[derive(Debug, Clone, Default)]
pub struct ProductListFilter {
    /// Case-insensitive substring match on the product name.
    pub search: Option<String>,
    pub category: Option<String>,
}

/// Catalog fields a `PUT /products/{id}` may change. `None` leaves a field
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub min_stock: Option<Decimal>,
    pub measure_value: Option<Decimal>,
    pub sale_price: Option<Decimal>,
}

#[derive(Clone)]
pub struct ProductService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl ProductService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self))]
    pub async fn get_product(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
    ) -> Result<product::Model, ServiceError> {
        ledger::load_product(self.db_pool.as_ref(), tenant_id, product_id).await
    }

    /// A product together with its active lots in draw order.
    #[instrument(skip(self))]
    pub async fn get_product_with_lots(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
    ) -> Result<(product::Model, Vec<product_lot::Model>), ServiceError> {
        let product = ledger::load_product(self.db_pool.as_ref(), tenant_id, product_id).await?;
        let lots =
            lots::active_lots_in_fifo_order(self.db_pool.as_ref(), tenant_id, product_id).await?;
        Ok((product, lots))
    }

    /// Paginated catalog listing, name ascending.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        tenant_id: Uuid,
        filter: ProductListFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<product::Model>, u64), ServiceError> {
        let mut condition = Condition::all().add(product::Column::TenantId.eq(tenant_id));
        if let Some(search) = &filter.search {
            condition = condition.add(product::Column::Name.contains(search));
        }
        if let Some(category) = &filter.category {
            condition = condition.add(product::Column::Category.eq(category));
        }

        let paginator = Product::find()
            .filter(condition)
            .order_by_asc(product::Column::Name)
            .paginate(self.db_pool.as_ref(), per_page);

        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((products, total))
    }

    /// Products at or below their reorder threshold.
    #[instrument(skip(self))]
    pub async fn low_stock_products(
        &self,
        tenant_id: Uuid,
    ) -> Result<Vec<product::Model>, ServiceError> {
        let products = Product::find()
            .filter(product::Column::TenantId.eq(tenant_id))
            .filter(
                Expr::col(product::Column::CurrentStock)
                    .lte(Expr::col(product::Column::MinStock)),
            )
            .order_by_asc(product::Column::Name)
            .all(self.db_pool.as_ref())
            .await?;
        Ok(products)
    }

    #[instrument(skip(self, update))]
    pub async fn update_product(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
        update: ProductUpdate,
    ) -> Result<product::Model, ServiceError> {
        let product =
            ledger::load_product(self.db_pool.as_ref(), tenant_id, product_id).await?;

        let mut active: product::ActiveModel = product.into();
        if let Some(name) = update.name {
            active.name = Set(name);
        }
        if let Some(category) = update.category {
            active.category = Set(Some(category));
        }
        if let Some(min_stock) = update.min_stock {
            if min_stock < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "min_stock must not be negative".to_string(),
                ));
            }
            active.min_stock = Set(round_quantity(min_stock));
        }
        if let Some(measure_value) = update.measure_value {
            if measure_value <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "measure_value must be positive".to_string(),
                ));
            }
            active.measure_value = Set(round_quantity(measure_value));
        }
        if let Some(sale_price) = update.sale_price {
            if sale_price < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "sale_price must not be negative".to_string(),
                ));
            }
            active.sale_price = Set(Some(round_money(sale_price)));
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(self.db_pool.as_ref()).await?;

        info!(product_id = %updated.id, "Product updated");
        self.publish(Event::ProductUpdated(updated.id)).await;
        Ok(updated)
    }

    /// Administrative delete. Lots and movements are left in place; movement
    /// rows carry a name snapshot and stay meaningful without the product.
    #[instrument(skip(self))]
    pub async fn delete_product(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
    ) -> Result<(), ServiceError> {
        let result = Product::delete_many()
            .filter(product::Column::Id.eq(product_id))
            .filter(product::Column::TenantId.eq(tenant_id))
            .exec(self.db_pool.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Product {} not found",
                product_id
            )));
        }

        info!(%product_id, "Product deleted");
        self.publish(Event::ProductDeleted(product_id)).await;
        Ok(())
    }

    async fn publish(&self, event: Event) {
        if let Err(e) = self.event_sender.send(event).await {
            warn!(error = %e, "Failed to publish product event");
        }
    }
}
