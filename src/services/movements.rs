//! Movement reporting reads.
//!
//! The journal is written by the inventory coordinator only; this service is
//! the read path for audit and sell-through reporting. Listings are plain
//! non-transactional reads and may trail in-flight ledger writes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use tracing::instrument;
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::stock_movement::{self, Entity as StockMovement, MovementType};
use crate::errors::ServiceError;

#[derive(Debug, Clone, Default)]
pub struct MovementFilter {
    pub product_id: Option<Uuid>,
    pub movement_type: Option<MovementType>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct MovementService {
    db_pool: Arc<DbPool>,
}

impl MovementService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Paginated movement history, most recent first.
    #[instrument(skip(self))]
    pub async fn list_movements(
        &self,
        tenant_id: Uuid,
        filter: MovementFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<stock_movement::Model>, u64), ServiceError> {
        let mut condition = Condition::all().add(stock_movement::Column::TenantId.eq(tenant_id));
        if let Some(product_id) = filter.product_id {
            condition = condition.add(stock_movement::Column::ProductId.eq(product_id));
        }
        if let Some(movement_type) = filter.movement_type {
            condition = condition.add(stock_movement::Column::MovementType.eq(movement_type));
        }
        if let Some(from) = filter.from {
            condition = condition.add(stock_movement::Column::OccurredAt.gte(from));
        }
        if let Some(to) = filter.to {
            condition = condition.add(stock_movement::Column::OccurredAt.lte(to));
        }

        let paginator = StockMovement::find()
            .filter(condition)
            .order_by_desc(stock_movement::Column::OccurredAt)
            .order_by_desc(stock_movement::Column::Id)
            .paginate(self.db_pool.as_ref(), per_page);

        let total = paginator.num_items().await?;
        let movements = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((movements, total))
    }
}
