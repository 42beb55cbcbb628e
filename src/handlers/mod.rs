pub mod appointments;
pub mod financial_entries;
pub mod inventory;
pub mod movements;
pub mod products;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::appointments::AppointmentService;
use crate::services::checkout::CheckoutService;
use crate::services::financial_entries::FinancialEntryService;
use crate::services::inventory::InventoryService;
use crate::services::movements::MovementService;
use crate::services::products::ProductService;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub inventory: Arc<InventoryService>,
    pub products: Arc<ProductService>,
    pub movements: Arc<MovementService>,
    pub appointments: Arc<AppointmentService>,
    pub checkout: Arc<CheckoutService>,
    pub financial_entries: Arc<FinancialEntryService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        let inventory = Arc::new(InventoryService::new(db_pool.clone(), event_sender.clone()));
        let appointments = Arc::new(AppointmentService::new(db_pool.clone()));
        let checkout = Arc::new(CheckoutService::new(
            db_pool.clone(),
            inventory.clone(),
            appointments.clone(),
            event_sender.clone(),
        ));

        Self {
            products: Arc::new(ProductService::new(db_pool.clone(), event_sender)),
            movements: Arc::new(MovementService::new(db_pool.clone())),
            financial_entries: Arc::new(FinancialEntryService::new(db_pool)),
            inventory,
            appointments,
            checkout,
        }
    }
}

/// Resolves the (page, per_page) window for a list endpoint, clamping the
/// requested size to the configured maximum.
pub(crate) fn page_window(config: &AppConfig, page: Option<u64>, limit: Option<u64>) -> (u64, u64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit
        .unwrap_or(config.api_default_page_size as u64)
        .clamp(1, config.api_max_page_size as u64);
    (page, limit)
}

pub(crate) fn total_pages(total: u64, limit: u64) -> u64 {
    (total + limit - 1) / limit
}

#[cfg(test)]
mod pagination_tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig::new(
            "sqlite::memory:".into(),
            "127.0.0.1".into(),
            8080,
            "development".into(),
        )
    }

    #[test]
    fn page_window_applies_defaults() {
        let cfg = config();
        assert_eq!(page_window(&cfg, None, None), (1, 20));
    }

    #[test]
    fn page_window_clamps_to_configured_maximum() {
        let cfg = config();
        assert_eq!(page_window(&cfg, Some(3), Some(10_000)), (3, 100));
        assert_eq!(page_window(&cfg, Some(0), Some(0)), (1, 1));
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(41, 20), 3);
        assert_eq!(total_pages(40, 20), 2);
    }
}
