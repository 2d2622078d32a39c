//! Domain models for invoicing-service.

mod catalog;
mod invoice;
mod line_item;
mod summary;

pub use catalog::{CatalogItem, CatalogItemFilter, Customer};
pub use invoice::{
    Invoice, InvoiceDraft, InvoiceHeader, InvoiceListRow, NewInvoice, PaymentStatus,
};
pub use line_item::{InvoiceLineItem, LineItemInput};
pub use summary::{InvoiceSummary, SummaryValues};
