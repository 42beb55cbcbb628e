// Core ledger
pub mod inventory;

// Catalog and reporting reads
pub mod movements;
pub mod products;

// Appointment flow and its financial side
pub mod appointments;
pub mod checkout;
pub mod financial_entries;
