//! Appointment checkout.
//!
//! Checkout deducts each supply line through the inventory coordinator with
//! reason `internal` and bundles its own two writes (appointment status to
//! completed, one financial income entry) into the final line's transaction.
//! The appointment therefore completes only if every deduction committed; a
//! checkout without supplies performs the two writes in a transaction of its
//! own.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionError,
    TransactionTrait,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::appointment::{self, AppointmentStatus, Entity as Appointment};
use crate::entities::financial_entry::{self, EntryKind};
use crate::entities::stock_movement::{self, MovementReason};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::appointments::AppointmentService;
use crate::services::inventory::{ConsumeRequest, ExtraWrite, InventoryService};

/// One supply deduction requested by the checkout screen.
#[derive(Debug, Clone, Copy)]
pub struct SupplyLine {
    pub product_id: Uuid,
    pub quantity: Decimal,
}

pub struct CheckoutOutcome {
    pub appointment: appointment::Model,
    pub movements: Vec<stock_movement::Model>,
    pub total_cogs: Decimal,
    pub income_entry_id: Uuid,
}

#[derive(Clone)]
pub struct CheckoutService {
    db_pool: Arc<DbPool>,
    inventory: Arc<InventoryService>,
    appointments: Arc<AppointmentService>,
    event_sender: Arc<EventSender>,
}

impl CheckoutService {
    pub fn new(
        db_pool: Arc<DbPool>,
        inventory: Arc<InventoryService>,
        appointments: Arc<AppointmentService>,
        event_sender: Arc<EventSender>,
    ) -> Self {
        Self {
            db_pool,
            inventory,
            appointments,
            event_sender,
        }
    }

    #[instrument(skip(self, supplies))]
    pub async fn checkout(
        &self,
        tenant_id: Uuid,
        actor: &str,
        appointment_id: Uuid,
        supplies: Vec<SupplyLine>,
    ) -> Result<CheckoutOutcome, ServiceError> {
        let appointment = self
            .appointments
            .get_appointment(tenant_id, appointment_id)
            .await?;
        if appointment.status != AppointmentStatus::Scheduled {
            return Err(ServiceError::InvalidStatus(format!(
                "appointment {} is already {}",
                appointment_id, appointment.status
            )));
        }

        let completed_at = Utc::now();
        let income_entry_id = Uuid::new_v4();
        let mut completion_writes: Vec<ExtraWrite> = vec![
            status_write(tenant_id, appointment_id, completed_at),
            income_write(tenant_id, income_entry_id, &appointment, actor),
        ];

        let mut movements = Vec::with_capacity(supplies.len());
        let mut total_cogs = Decimal::ZERO;

        if supplies.is_empty() {
            let writes = std::mem::take(&mut completion_writes);
            self.db_pool
                .transaction::<_, (), ServiceError>(move |txn| {
                    Box::pin(async move {
                        for write in writes {
                            write(txn).await?;
                        }
                        Ok(())
                    })
                })
                .await
                .map_err(|e| match e {
                    TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
                    TransactionError::Transaction(service_err) => service_err,
                })?;
        } else {
            let final_index = supplies.len() - 1;
            for (index, line) in supplies.into_iter().enumerate() {
                let extra_writes = if index == final_index {
                    std::mem::take(&mut completion_writes)
                } else {
                    Vec::new()
                };

                let outcome = self
                    .inventory
                    .consume(
                        tenant_id,
                        actor,
                        ConsumeRequest {
                            product_id: line.product_id,
                            quantity: line.quantity,
                            reason: MovementReason::Internal,
                        },
                        extra_writes,
                    )
                    .await?;
                total_cogs += outcome.cogs;
                movements.push(outcome.movement);
            }
        }

        let appointment = self
            .appointments
            .get_appointment(tenant_id, appointment_id)
            .await?;

        info!(
            %appointment_id,
            supplies_consumed = movements.len(),
            %total_cogs,
            income = %appointment.service_price,
            "Appointment checked out"
        );

        self.publish(Event::AppointmentCheckedOut {
            appointment_id,
            supplies_consumed: movements.len(),
            income: appointment.service_price,
        })
        .await;
        self.publish(Event::FinancialEntryRecorded {
            entry_id: income_entry_id,
            kind: EntryKind::Income.to_string(),
            amount: appointment.service_price,
        })
        .await;

        Ok(CheckoutOutcome {
            appointment,
            movements,
            total_cogs,
            income_entry_id,
        })
    }

    async fn publish(&self, event: Event) {
        if let Err(e) = self.event_sender.send(event).await {
            warn!(error = %e, "Failed to publish checkout event");
        }
    }
}

/// Flips the appointment to completed, guarded on it still being scheduled.
fn status_write(
    tenant_id: Uuid,
    appointment_id: Uuid,
    completed_at: DateTime<Utc>,
) -> ExtraWrite {
    Box::new(move |txn| {
        Box::pin(async move {
            let result = Appointment::update_many()
                .col_expr(
                    appointment::Column::Status,
                    Expr::value(AppointmentStatus::Completed),
                )
                .col_expr(
                    appointment::Column::CompletedAt,
                    Expr::value(Some(completed_at)),
                )
                .col_expr(appointment::Column::UpdatedAt, Expr::value(completed_at))
                .filter(appointment::Column::Id.eq(appointment_id))
                .filter(appointment::Column::TenantId.eq(tenant_id))
                .filter(appointment::Column::Status.eq(AppointmentStatus::Scheduled))
                .exec(txn)
                .await?;

            if result.rows_affected == 0 {
                return Err(ServiceError::TransactionConflict(format!(
                    "appointment {} changed during checkout",
                    appointment_id
                )));
            }
            Ok(())
        })
    })
}

/// Records the appointment price as an income entry.
fn income_write(
    tenant_id: Uuid,
    entry_id: Uuid,
    appointment: &appointment::Model,
    actor: &str,
) -> ExtraWrite {
    let description = format!(
        "Checkout: {} for {}",
        appointment.service_name, appointment.customer_name
    );
    let amount = appointment.service_price;
    let appointment_id = appointment.id;
    let recorded_by = actor.to_string();

    Box::new(move |txn| {
        Box::pin(async move {
            let now = Utc::now();
            financial_entry::ActiveModel {
                id: Set(entry_id),
                tenant_id: Set(tenant_id),
                kind: Set(EntryKind::Income),
                description: Set(description),
                amount: Set(amount),
                appointment_id: Set(Some(appointment_id)),
                recorded_by: Set(recorded_by),
                entry_date: Set(now.date_naive()),
                created_at: Set(now),
            }
            .insert(txn)
            .await?;
            Ok(())
        })
    })
}
