//! Inventory transaction coordination.
//!
//! One logical inventory operation (a replenishment, or a consumption plus
//! any caller-supplied side writes) commits atomically across the product
//! aggregate, the lot set and the movement journal. Lot state is always read
//! inside the transaction that writes it; stale reads are caught by guarded
//! updates and surface as [`ServiceError::TransactionConflict`].

pub mod fifo;
pub mod journal;
pub mod ledger;
pub mod lots;

use std::sync::Arc;
use std::time::Instant;

use futures::future::BoxFuture;
use rust_decimal::Decimal;
use sea_orm::{DatabaseTransaction, TransactionError, TransactionTrait};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::stock_movement::{self, MovementReason, MovementType};
use crate::entities::{product, product_lot};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

pub use ledger::NewProduct;
pub use lots::NewLot;

/// A caller-supplied write executed inside the coordinator's transaction
/// after the ledger writes. If it fails, the whole operation rolls back.
pub type ExtraWrite = Box<
    dyn for<'a> FnOnce(&'a DatabaseTransaction) -> BoxFuture<'a, Result<(), ServiceError>> + Send,
>;

/// Which SKU a replenishment targets.
#[derive(Debug)]
pub enum ProductRef {
    Existing(Uuid),
    New(NewProduct),
}

#[derive(Debug)]
pub struct ReplenishInput {
    pub product: ProductRef,
    pub lot: NewLot,
    /// Also updates the product's sale price alongside the restock.
    pub sale_price: Option<Decimal>,
}

#[derive(Debug, Clone, Copy)]
pub struct ConsumeRequest {
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub reason: MovementReason,
}

pub struct ReplenishOutcome {
    pub product: product::Model,
    pub lot: product_lot::Model,
    pub movement: stock_movement::Model,
    pub created_product: bool,
}

#[derive(Debug)]
pub struct ConsumeOutcome {
    pub product: product::Model,
    pub movement: stock_movement::Model,
    pub cogs: Decimal,
    pub lots_drawn: usize,
}

#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl InventoryService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Restocks a SKU: creates the lot, bumps the aggregate, refreshes the
    /// cached unit cost and appends the IN movement, all in one transaction.
    /// With [`ProductRef::New`] the SKU itself is created in the same commit.
    #[instrument(skip(self, input))]
    pub async fn replenish(
        &self,
        tenant_id: Uuid,
        performed_by: &str,
        input: ReplenishInput,
    ) -> Result<ReplenishOutcome, ServiceError> {
        lots::validate_new_lot(&input.lot)?;
        if input.sale_price.is_some_and(|price| price < Decimal::ZERO) {
            return Err(ServiceError::ValidationError(
                "sale_price must not be negative".to_string(),
            ));
        }

        let performed_by = performed_by.to_string();
        let start = Instant::now();
        let result = self
            .db
            .transaction::<_, ReplenishOutcome, ServiceError>(move |txn| {
                Box::pin(async move {
                    let (product, created_product) = match &input.product {
                        ProductRef::Existing(id) => {
                            (ledger::load_product(txn, tenant_id, *id).await?, false)
                        }
                        ProductRef::New(data) => (
                            ledger::create_product(txn, tenant_id, data, input.sale_price).await?,
                            true,
                        ),
                    };

                    let lot = lots::create_lot(txn, tenant_id, product.id, &input.lot).await?;
                    ledger::apply_replenishment(
                        txn,
                        &product,
                        lot.current_quantity,
                        lot.unit_cost,
                        input.sale_price,
                    )
                    .await?;
                    let movement = journal::append(
                        txn,
                        journal::NewMovement {
                            product: &product,
                            movement_type: MovementType::In,
                            reason: MovementReason::Purchase,
                            quantity: lot.current_quantity,
                            cost_value: None,
                            sale_value: None,
                            performed_by: &performed_by,
                        },
                    )
                    .await?;

                    let product = ledger::load_product(txn, tenant_id, product.id).await?;
                    Ok(ReplenishOutcome {
                        product,
                        lot,
                        movement,
                        created_product,
                    })
                })
            })
            .await
            .map_err(flatten_transaction_error);
        crate::db::record_transaction_metrics("replenish", start, result.is_ok());
        let outcome = result?;

        info!(
            product_id = %outcome.product.id,
            lot_id = %outcome.lot.id,
            quantity = %outcome.lot.initial_quantity,
            unit_cost = %outcome.lot.unit_cost,
            created_product = outcome.created_product,
            "Replenished stock"
        );

        if outcome.created_product {
            self.publish(Event::ProductCreated(outcome.product.id)).await;
        }
        self.publish(Event::StockReplenished {
            product_id: outcome.product.id,
            lot_id: outcome.lot.id,
            quantity: outcome.lot.initial_quantity,
        })
        .await;

        Ok(outcome)
    }

    /// Consumes stock oldest lot first and books the COGS on an OUT movement.
    ///
    /// `extra_writes` lets the caller bundle its own writes (an appointment
    /// status flip, a financial entry) into the same commit; they run after
    /// the ledger writes and abort the whole operation on failure.
    #[instrument(skip(self, extra_writes))]
    pub async fn consume(
        &self,
        tenant_id: Uuid,
        performed_by: &str,
        request: ConsumeRequest,
        extra_writes: Vec<ExtraWrite>,
    ) -> Result<ConsumeOutcome, ServiceError> {
        let performed_by = performed_by.to_string();
        let start = Instant::now();
        let result = self
            .db
            .transaction::<_, ConsumeOutcome, ServiceError>(move |txn| {
                Box::pin(async move {
                    let product = ledger::load_product(txn, tenant_id, request.product_id).await?;
                    fifo::validate_consumption(&product, request.quantity)?;

                    let active_lots =
                        lots::active_lots_in_fifo_order(txn, tenant_id, product.id).await?;
                    let plan = fifo::plan_consumption(&active_lots, request.quantity)?;

                    for draw in &plan.draws {
                        lots::apply_draw(txn, tenant_id, draw).await?;
                    }
                    ledger::apply_stock_decrement(txn, &product, request.quantity).await?;

                    let sale_value = match request.reason {
                        MovementReason::Sale => product
                            .sale_price
                            .map(|price| fifo::round_money(price * request.quantity)),
                        _ => None,
                    };
                    let movement = journal::append(
                        txn,
                        journal::NewMovement {
                            product: &product,
                            movement_type: MovementType::Out,
                            reason: request.reason,
                            quantity: request.quantity,
                            cost_value: Some(plan.cogs),
                            sale_value,
                            performed_by: &performed_by,
                        },
                    )
                    .await?;

                    for write in extra_writes {
                        write(txn).await?;
                    }

                    let product = ledger::load_product(txn, tenant_id, product.id).await?;
                    Ok(ConsumeOutcome {
                        product,
                        movement,
                        cogs: plan.cogs,
                        lots_drawn: plan.draws.len(),
                    })
                })
            })
            .await
            .map_err(flatten_transaction_error);
        crate::db::record_transaction_metrics("consume", start, result.is_ok());
        let outcome = result?;

        info!(
            product_id = %outcome.product.id,
            quantity = %outcome.movement.quantity,
            reason = %outcome.movement.reason,
            cogs = %outcome.cogs,
            lots_drawn = outcome.lots_drawn,
            "Consumed stock"
        );

        self.publish(Event::StockConsumed {
            product_id: outcome.product.id,
            quantity: outcome.movement.quantity,
            reason: outcome.movement.reason.to_string(),
            cogs: outcome.cogs,
        })
        .await;
        if outcome.product.current_stock <= outcome.product.min_stock {
            self.publish(Event::LowStock {
                product_id: outcome.product.id,
                current_stock: outcome.product.current_stock,
                min_stock: outcome.product.min_stock,
            })
            .await;
        }

        Ok(outcome)
    }

    async fn publish(&self, event: Event) {
        if let Err(e) = self.event_sender.send(event).await {
            warn!(error = %e, "Failed to publish inventory event");
        }
    }
}

fn flatten_transaction_error(err: TransactionError<ServiceError>) -> ServiceError {
    match err {
        TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
        TransactionError::Transaction(service_err) => service_err,
    }
}
