//! Services module for invoicing-service.

pub mod allocator;
pub mod catalog;
pub mod database;
pub mod error;
pub mod invoices;
pub mod memory;
pub mod metrics;
pub mod query;
pub mod reconcile;
pub mod repository;
pub mod unit_of_work;
pub mod validation;

pub use catalog::CatalogService;
pub use database::Database;
pub use error::InvoiceError;
pub use invoices::InvoiceService;
pub use memory::MemoryStore;
pub use metrics::{get_metrics, init_metrics};
