use metrics::counter;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Events published after a state change has been committed.
///
/// Publishing is best effort: the channel is drained by [`process_events`]
/// and a full or closed channel never rolls back the write that produced
/// the event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeleted(Uuid),
    StockReplenished {
        product_id: Uuid,
        lot_id: Uuid,
        quantity: Decimal,
    },
    StockConsumed {
        product_id: Uuid,
        quantity: Decimal,
        reason: String,
        cogs: Decimal,
    },
    LowStock {
        product_id: Uuid,
        current_stock: Decimal,
        min_stock: Decimal,
    },
    AppointmentCheckedOut {
        appointment_id: Uuid,
        supplies_consumed: usize,
        income: Decimal,
    },
    FinancialEntryRecorded {
        entry_id: Uuid,
        kind: String,
        amount: Decimal,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Drains the event channel, logging each event and keeping counters current.
/// Runs until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::LowStock {
                product_id,
                current_stock,
                min_stock,
            } => {
                warn!(
                    %product_id,
                    %current_stock,
                    %min_stock,
                    "Stock fell below the configured minimum"
                );
                counter!("salonstock_inventory.low_stock_alerts", 1);
            }
            Event::StockConsumed {
                product_id,
                quantity,
                reason,
                cogs,
            } => {
                info!(%product_id, %quantity, %reason, %cogs, "Stock consumed");
                counter!("salonstock_inventory.consumptions", 1, "reason" => reason);
            }
            Event::StockReplenished {
                product_id,
                lot_id,
                quantity,
            } => {
                info!(%product_id, %lot_id, %quantity, "Stock replenished");
                counter!("salonstock_inventory.replenishments", 1);
            }
            Event::AppointmentCheckedOut {
                appointment_id,
                supplies_consumed,
                income,
            } => {
                info!(%appointment_id, supplies_consumed, %income, "Appointment checked out");
                counter!("salonstock_appointments.checkouts", 1);
            }
            Event::FinancialEntryRecorded { entry_id, kind, amount } => {
                info!(%entry_id, %kind, %amount, "Financial entry recorded");
                counter!("salonstock_finance.entries", 1, "kind" => kind);
            }
            other => {
                info!(event = ?other, "Event recorded");
            }
        }
    }

    warn!("Event processing loop has ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn loop_drains_events_and_exits_when_senders_drop() {
        let (tx, rx) = mpsc::channel(8);
        let worker = tokio::spawn(process_events(rx));

        let sender = EventSender::new(tx);
        sender
            .send(Event::StockReplenished {
                product_id: Uuid::new_v4(),
                lot_id: Uuid::new_v4(),
                quantity: dec!(10),
            })
            .await
            .unwrap();
        sender
            .send(Event::LowStock {
                product_id: Uuid::new_v4(),
                current_stock: dec!(1),
                min_stock: dec!(5),
            })
            .await
            .unwrap();

        drop(sender);
        worker.await.unwrap();
    }

    #[tokio::test]
    async fn send_fails_once_the_receiver_is_gone() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let sender = EventSender::new(tx);
        let result = sender.send(Event::ProductCreated(Uuid::new_v4())).await;
        assert!(result.is_err());
    }
}
