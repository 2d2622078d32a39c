//! In-process store implementing every storage seam.
//!
//! A unit of work holds the table lock for its whole lifetime and writes to a
//! private copy of the tables; `commit` swaps the copy in, anything else
//! throws it away. Reads made through the repositories while a unit of work
//! is open wait for it to finish.

use std::collections::HashSet;
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::models::{
    CatalogItem, CatalogItemFilter, Customer, Invoice, InvoiceHeader, InvoiceLineItem,
    InvoiceListRow, InvoiceSummary, LineItemInput, NewInvoice, SummaryValues,
};
use crate::services::query::{contains_ignore_case, matches_all, InvoiceFilter, PageRequest};
use crate::services::repository::{
    CatalogItemRepository, CustomerRepository, InsertedInvoice, InvoiceRepository,
    InvoiceUnitOfWork, StoreError, StoreHealth,
};

/// One-shot failures a test can arm before driving the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    /// The next bulk line-item insert silently drops its last row.
    ShortLineItemInsert,
    /// The next single line-item delete affects no rows.
    LineItemDeleteMisses,
    /// The next allocation count is one lower than the real count.
    StaleInvoiceCount,
    /// The next commit fails.
    CommitFails,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    customers: Vec<Customer>,
    items: Vec<CatalogItem>,
    invoices: Vec<Invoice>,
    summaries: Vec<InvoiceSummary>,
    line_items: Vec<InvoiceLineItem>,
    invoice_seq: i64,
    summary_seq: i64,
    line_item_seq: i64,
}

/// Snapshot of one invoice's rows, soft-deleted ones included.
#[derive(Debug, Clone)]
pub struct StoredInvoice {
    pub invoice: Invoice,
    pub summary: Option<InvoiceSummary>,
    pub line_items: Vec<InvoiceLineItem>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    faults: Arc<StdMutex<HashSet<Fault>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_customer(&self, id: i64, name: &str, city: &str, country: &str) -> Customer {
        let now = Utc::now();
        let customer = Customer {
            id,
            name: name.to_string(),
            address: format!("{} Main Street", id),
            city: city.to_string(),
            postcode: format!("{:05}", id),
            country: country.to_string(),
            created_utc: now,
            updated_utc: now,
            deleted_utc: None,
        };
        self.tables.lock().await.customers.push(customer.clone());
        customer
    }

    pub async fn add_item(&self, id: i64, name: &str, item_type: &str) -> CatalogItem {
        let now = Utc::now();
        let item = CatalogItem {
            id,
            name: name.to_string(),
            item_type: item_type.to_string(),
            created_utc: now,
            updated_utc: now,
            deleted_utc: None,
        };
        self.tables.lock().await.items.push(item.clone());
        item
    }

    pub fn arm(&self, fault: Fault) {
        self.faults
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(fault);
    }

    /// Total invoice rows, live or soft-deleted.
    pub async fn invoice_rows(&self) -> usize {
        self.tables.lock().await.invoices.len()
    }

    pub async fn summary_rows(&self) -> usize {
        self.tables.lock().await.summaries.len()
    }

    pub async fn line_item_rows(&self) -> usize {
        self.tables.lock().await.line_items.len()
    }

    pub async fn stored_invoice(&self, invoice_code: &str) -> Option<StoredInvoice> {
        let tables = self.tables.lock().await;
        let invoice = tables
            .invoices
            .iter()
            .find(|i| i.invoice_code == invoice_code)?
            .clone();
        let summary = tables
            .summaries
            .iter()
            .find(|s| s.invoice_id == invoice.id)
            .cloned();
        let line_items = tables
            .line_items
            .iter()
            .filter(|l| l.invoice_id == invoice.id)
            .cloned()
            .collect();

        Some(StoredInvoice {
            invoice,
            summary,
            line_items,
        })
    }
}

fn take_fault(faults: &StdMutex<HashSet<Fault>>, fault: Fault) -> bool {
    faults
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .remove(&fault)
}

fn paginate<T>(rows: Vec<T>, page: PageRequest) -> (Vec<T>, u64) {
    let total = rows.len() as u64;
    let page_rows = rows
        .into_iter()
        .skip(page.offset().max(0) as usize)
        .take(page.limit as usize)
        .collect();
    (page_rows, total)
}

impl Tables {
    fn list_rows(&self) -> Vec<InvoiceListRow> {
        self.invoices
            .iter()
            .filter(|invoice| invoice.deleted_utc.is_none())
            .filter_map(|invoice| {
                let summary = self
                    .summaries
                    .iter()
                    .find(|s| s.invoice_id == invoice.id && s.deleted_utc.is_none())?;
                let customer = self.customers.iter().find(|c| c.id == invoice.customer_id)?;
                Some(InvoiceListRow {
                    id: invoice.id,
                    invoice_code: invoice.invoice_code.clone(),
                    subject: invoice.subject.clone(),
                    issue_date: invoice.issue_date,
                    due_date: invoice.due_date,
                    customer_name: customer.name.clone(),
                    total_items: summary.total_items,
                    is_paid: summary.is_paid,
                })
            })
            .collect()
    }

    fn live_line_items(&self, invoice_id: i64) -> Vec<InvoiceLineItem> {
        self.line_items
            .iter()
            .filter(|l| l.invoice_id == invoice_id && l.deleted_utc.is_none())
            .cloned()
            .collect()
    }

    fn push_line_item(&mut self, invoice_id: i64, item: &LineItemInput) -> Result<(), StoreError> {
        let duplicate = self.line_items.iter().any(|l| {
            l.invoice_id == invoice_id && l.item_id == item.item_id && l.deleted_utc.is_none()
        });
        if duplicate {
            return Err(StoreError::UniqueViolation);
        }

        self.line_item_seq += 1;
        let now = Utc::now();
        self.line_items.push(InvoiceLineItem {
            id: self.line_item_seq,
            invoice_id,
            item_id: item.item_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
            amount: item.amount,
            created_utc: now,
            updated_utc: now,
            deleted_utc: None,
        });
        Ok(())
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl CustomerRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Customer>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.customers.iter().find(|c| c.id == id).cloned())
    }

    async fn list(&self, page: PageRequest) -> Result<(Vec<Customer>, u64), StoreError> {
        let tables = self.tables.lock().await;
        let mut customers: Vec<Customer> = tables
            .customers
            .iter()
            .filter(|c| c.deleted_utc.is_none())
            .cloned()
            .collect();
        customers.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(paginate(customers, page))
    }
}

#[async_trait]
impl CatalogItemRepository for MemoryStore {
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<CatalogItem>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .items
            .iter()
            .filter(|item| ids.contains(&item.id))
            .cloned()
            .collect())
    }

    async fn list(
        &self,
        filter: &CatalogItemFilter,
        page: PageRequest,
    ) -> Result<(Vec<CatalogItem>, u64), StoreError> {
        let tables = self.tables.lock().await;
        let mut items: Vec<CatalogItem> = tables
            .items
            .iter()
            .filter(|item| item.deleted_utc.is_none())
            .filter(|item| {
                filter
                    .item_type
                    .as_deref()
                    .is_none_or(|t| contains_ignore_case(&item.item_type, t))
            })
            .filter(|item| {
                filter
                    .name
                    .as_deref()
                    .is_none_or(|n| contains_ignore_case(&item.name, n))
            })
            .cloned()
            .collect();
        items.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(paginate(items, page))
    }
}

#[async_trait]
impl InvoiceRepository for MemoryStore {
    async fn find_by_code(&self, invoice_code: &str) -> Result<Option<Invoice>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .invoices
            .iter()
            .find(|i| i.invoice_code == invoice_code && i.deleted_utc.is_none())
            .cloned())
    }

    async fn find_summary(&self, invoice_id: i64) -> Result<Option<InvoiceSummary>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .summaries
            .iter()
            .find(|s| s.invoice_id == invoice_id && s.deleted_utc.is_none())
            .cloned())
    }

    async fn find_line_items(&self, invoice_id: i64) -> Result<Vec<InvoiceLineItem>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.live_line_items(invoice_id))
    }

    async fn list(
        &self,
        filter: &InvoiceFilter,
        page: PageRequest,
    ) -> Result<(Vec<InvoiceListRow>, u64), StoreError> {
        let predicates = filter.predicates();
        let tables = self.tables.lock().await;
        let mut rows: Vec<InvoiceListRow> = tables
            .list_rows()
            .into_iter()
            .filter(|row| matches_all(&predicates, row))
            .collect();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(paginate(rows, page))
    }

    async fn begin(&self) -> Result<Box<dyn InvoiceUnitOfWork>, StoreError> {
        let guard = self.tables.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryUnitOfWork {
            guard,
            working,
            faults: self.faults.clone(),
        }))
    }
}

pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
    faults: Arc<StdMutex<HashSet<Fault>>>,
}

impl MemoryUnitOfWork {
    fn fault(&self, fault: Fault) -> bool {
        take_fault(&self.faults, fault)
    }
}

#[async_trait]
impl InvoiceUnitOfWork for MemoryUnitOfWork {
    async fn count_invoices(&mut self) -> Result<i64, StoreError> {
        let count = self.working.invoices.len() as i64;
        if self.fault(Fault::StaleInvoiceCount) {
            return Ok((count - 1).max(0));
        }
        Ok(count)
    }

    async fn insert_invoice(&mut self, invoice: &NewInvoice) -> Result<InsertedInvoice, StoreError> {
        if self
            .working
            .invoices
            .iter()
            .any(|i| i.invoice_code == invoice.invoice_code)
        {
            return Err(StoreError::UniqueViolation);
        }

        self.working.invoice_seq += 1;
        let now = Utc::now();
        let id = self.working.invoice_seq;
        self.working.invoices.push(Invoice {
            id,
            invoice_code: invoice.invoice_code.clone(),
            issue_date: invoice.header.issue_date,
            due_date: invoice.header.due_date,
            subject: invoice.header.subject.clone(),
            customer_id: invoice.header.customer_id,
            created_utc: now,
            updated_utc: now,
            deleted_utc: None,
        });

        Ok(InsertedInvoice { id, rows: 1 })
    }

    async fn insert_summary(
        &mut self,
        invoice_id: i64,
        values: &SummaryValues,
    ) -> Result<u64, StoreError> {
        if self.working.summaries.iter().any(|s| s.invoice_id == invoice_id) {
            return Err(StoreError::UniqueViolation);
        }

        self.working.summary_seq += 1;
        let now = Utc::now();
        self.working.summaries.push(InvoiceSummary {
            id: self.working.summary_seq,
            invoice_id,
            total_items: values.total_items,
            subtotal: values.subtotal,
            tax: values.tax,
            grand_total: values.grand_total,
            is_paid: values.is_paid,
            created_utc: now,
            updated_utc: now,
            deleted_utc: None,
        });
        Ok(1)
    }

    async fn insert_line_items(
        &mut self,
        invoice_id: i64,
        items: &[LineItemInput],
    ) -> Result<u64, StoreError> {
        let take = if self.fault(Fault::ShortLineItemInsert) {
            items.len().saturating_sub(1)
        } else {
            items.len()
        };

        for item in &items[..take] {
            self.working.push_line_item(invoice_id, item)?;
        }
        Ok(take as u64)
    }

    async fn update_invoice(
        &mut self,
        invoice_id: i64,
        header: &InvoiceHeader,
    ) -> Result<u64, StoreError> {
        let Some(invoice) = self
            .working
            .invoices
            .iter_mut()
            .find(|i| i.id == invoice_id && i.deleted_utc.is_none())
        else {
            return Ok(0);
        };

        invoice.issue_date = header.issue_date;
        invoice.due_date = header.due_date;
        invoice.subject = header.subject.clone();
        invoice.customer_id = header.customer_id;
        invoice.updated_utc = Utc::now();
        Ok(1)
    }

    async fn update_summary(
        &mut self,
        invoice_id: i64,
        values: &SummaryValues,
    ) -> Result<u64, StoreError> {
        let Some(summary) = self
            .working
            .summaries
            .iter_mut()
            .find(|s| s.invoice_id == invoice_id && s.deleted_utc.is_none())
        else {
            return Ok(0);
        };

        summary.total_items = values.total_items;
        summary.subtotal = values.subtotal;
        summary.tax = values.tax;
        summary.grand_total = values.grand_total;
        summary.is_paid = values.is_paid;
        summary.updated_utc = Utc::now();
        Ok(1)
    }

    async fn line_items(&mut self, invoice_id: i64) -> Result<Vec<InvoiceLineItem>, StoreError> {
        Ok(self.working.live_line_items(invoice_id))
    }

    async fn insert_line_item(
        &mut self,
        invoice_id: i64,
        item: &LineItemInput,
    ) -> Result<u64, StoreError> {
        self.working.push_line_item(invoice_id, item)?;
        Ok(1)
    }

    async fn update_line_item(
        &mut self,
        row_id: i64,
        item: &LineItemInput,
    ) -> Result<u64, StoreError> {
        let Some(row) = self
            .working
            .line_items
            .iter_mut()
            .find(|l| l.id == row_id && l.deleted_utc.is_none())
        else {
            return Ok(0);
        };

        row.quantity = item.quantity;
        row.unit_price = item.unit_price;
        row.amount = item.amount;
        row.updated_utc = Utc::now();
        Ok(1)
    }

    async fn delete_line_item(&mut self, row_id: i64) -> Result<u64, StoreError> {
        if self.fault(Fault::LineItemDeleteMisses) {
            return Ok(0);
        }

        let Some(row) = self
            .working
            .line_items
            .iter_mut()
            .find(|l| l.id == row_id && l.deleted_utc.is_none())
        else {
            return Ok(0);
        };

        row.deleted_utc = Some(Utc::now());
        Ok(1)
    }

    async fn soft_delete_invoice(&mut self, invoice_code: &str) -> Result<Option<i64>, StoreError> {
        let Some(invoice) = self
            .working
            .invoices
            .iter_mut()
            .find(|i| i.invoice_code == invoice_code && i.deleted_utc.is_none())
        else {
            return Ok(None);
        };

        invoice.deleted_utc = Some(Utc::now());
        Ok(Some(invoice.id))
    }

    async fn soft_delete_dependents(&mut self, invoice_id: i64) -> Result<u64, StoreError> {
        let now = Utc::now();
        let mut rows = 0;

        for summary in self
            .working
            .summaries
            .iter_mut()
            .filter(|s| s.invoice_id == invoice_id && s.deleted_utc.is_none())
        {
            summary.deleted_utc = Some(now);
            rows += 1;
        }
        for line in self
            .working
            .line_items
            .iter_mut()
            .filter(|l| l.invoice_id == invoice_id && l.deleted_utc.is_none())
        {
            line.deleted_utc = Some(now);
            rows += 1;
        }

        Ok(rows)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        if take_fault(&self.faults, Fault::CommitFails) {
            return Err(StoreError::Database(anyhow::anyhow!("commit rejected")));
        }

        let MemoryUnitOfWork {
            mut guard, working, ..
        } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Store seeded with three customers and four catalog items.
pub async fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.add_customer(1, "Acme Widgets", "Jakarta", "Indonesia").await;
    store.add_customer(2, "Globex Corporation", "Bandung", "Indonesia").await;
    store.add_customer(3, "Initech", "Surabaya", "Indonesia").await;
    store.add_item(1, "Design Consultation", "service").await;
    store.add_item(2, "Landing Page", "service").await;
    store.add_item(3, "Printed Brochure", "product").await;
    store.add_item(4, "Hosting (monthly)", "service").await;
    store
}
