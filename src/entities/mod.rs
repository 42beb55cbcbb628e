pub mod appointment;
pub mod financial_entry;
pub mod product;
pub mod product_lot;
pub mod stock_movement;
