//! Storage seams. The service layer only ever talks to these traits.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    CatalogItem, CatalogItemFilter, Customer, Invoice, InvoiceHeader, InvoiceLineItem,
    InvoiceListRow, InvoiceSummary, LineItemInput, NewInvoice, SummaryValues,
};
use crate::services::query::{InvoiceFilter, PageRequest};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated")]
    UniqueViolation,

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                StoreError::UniqueViolation
            }
            other => StoreError::Database(anyhow::Error::new(other)),
        }
    }
}

/// Result of inserting an invoice header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertedInvoice {
    pub id: i64,
    pub rows: u64,
}

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Customer>, StoreError>;

    /// Live customers, most recent first, with the total count.
    async fn list(&self, page: PageRequest) -> Result<(Vec<Customer>, u64), StoreError>;
}

#[async_trait]
pub trait CatalogItemRepository: Send + Sync {
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<CatalogItem>, StoreError>;

    async fn list(
        &self,
        filter: &CatalogItemFilter,
        page: PageRequest,
    ) -> Result<(Vec<CatalogItem>, u64), StoreError>;
}

#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    /// Live invoice by external code.
    async fn find_by_code(&self, invoice_code: &str) -> Result<Option<Invoice>, StoreError>;

    async fn find_summary(&self, invoice_id: i64) -> Result<Option<InvoiceSummary>, StoreError>;

    async fn find_line_items(&self, invoice_id: i64) -> Result<Vec<InvoiceLineItem>, StoreError>;

    /// One page of the filtered listing plus the filtered total.
    async fn list(
        &self,
        filter: &InvoiceFilter,
        page: PageRequest,
    ) -> Result<(Vec<InvoiceListRow>, u64), StoreError>;

    async fn begin(&self) -> Result<Box<dyn InvoiceUnitOfWork>, StoreError>;
}

/// Every invoice write runs inside one of these. Dropping it without
/// `commit` discards all of its writes.
#[async_trait]
pub trait InvoiceUnitOfWork: Send {
    /// Count of all invoice rows, live or soft-deleted. Serializes concurrent
    /// allocations until this unit of work ends.
    async fn count_invoices(&mut self) -> Result<i64, StoreError>;

    async fn insert_invoice(&mut self, invoice: &NewInvoice) -> Result<InsertedInvoice, StoreError>;

    async fn insert_summary(
        &mut self,
        invoice_id: i64,
        values: &SummaryValues,
    ) -> Result<u64, StoreError>;

    async fn insert_line_items(
        &mut self,
        invoice_id: i64,
        items: &[LineItemInput],
    ) -> Result<u64, StoreError>;

    /// Only touches a live header.
    async fn update_invoice(
        &mut self,
        invoice_id: i64,
        header: &InvoiceHeader,
    ) -> Result<u64, StoreError>;

    async fn update_summary(
        &mut self,
        invoice_id: i64,
        values: &SummaryValues,
    ) -> Result<u64, StoreError>;

    /// Live line items as seen by this unit of work.
    async fn line_items(&mut self, invoice_id: i64) -> Result<Vec<InvoiceLineItem>, StoreError>;

    async fn insert_line_item(
        &mut self,
        invoice_id: i64,
        item: &LineItemInput,
    ) -> Result<u64, StoreError>;

    async fn update_line_item(&mut self, row_id: i64, item: &LineItemInput)
        -> Result<u64, StoreError>;

    async fn delete_line_item(&mut self, row_id: i64) -> Result<u64, StoreError>;

    /// Soft-deletes the live header with this code, returning its internal id.
    async fn soft_delete_invoice(&mut self, invoice_code: &str) -> Result<Option<i64>, StoreError>;

    /// Soft-deletes the summary and live line items of an invoice.
    async fn soft_delete_dependents(&mut self, invoice_id: i64) -> Result<u64, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;
}
