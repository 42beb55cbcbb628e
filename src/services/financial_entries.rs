//! Financial ledger reads.
//!
//! Entries are written by the checkout collaborator inside the inventory
//! transaction; this read path exists for reconciliation against the
//! appointment and movement history.

use std::sync::Arc;

use chrono::NaiveDate;
use sea_orm::{ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use tracing::instrument;
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::financial_entry::{self, Entity as FinancialEntry, EntryKind};
use crate::errors::ServiceError;

#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    pub kind: Option<EntryKind>,
    pub appointment_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Clone)]
pub struct FinancialEntryService {
    db_pool: Arc<DbPool>,
}

impl FinancialEntryService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Paginated ledger listing, newest entry date first.
    #[instrument(skip(self))]
    pub async fn list_entries(
        &self,
        tenant_id: Uuid,
        filter: EntryFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<financial_entry::Model>, u64), ServiceError> {
        let mut condition = Condition::all().add(financial_entry::Column::TenantId.eq(tenant_id));
        if let Some(kind) = filter.kind {
            condition = condition.add(financial_entry::Column::Kind.eq(kind));
        }
        if let Some(appointment_id) = filter.appointment_id {
            condition = condition.add(financial_entry::Column::AppointmentId.eq(appointment_id));
        }
        if let Some(from) = filter.from {
            condition = condition.add(financial_entry::Column::EntryDate.gte(from));
        }
        if let Some(to) = filter.to {
            condition = condition.add(financial_entry::Column::EntryDate.lte(to));
        }

        let paginator = FinancialEntry::find()
            .filter(condition)
            .order_by_desc(financial_entry::Column::EntryDate)
            .order_by_desc(financial_entry::Column::CreatedAt)
            .paginate(self.db_pool.as_ref(), per_page);

        let total = paginator.num_items().await?;
        let entries = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((entries, total))
    }
}
