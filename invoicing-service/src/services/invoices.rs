//! Invoice lifecycle: listing, detail projection and the transactional
//! create, edit and delete paths.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use service_core::response::{Paginated, Pagination};
use tracing::{info, instrument, warn};

use crate::dtos::invoices::{
    CustomerView, InvoiceDetail, InvoiceItemView, InvoiceListItem, SummaryView,
};
use crate::models::{Invoice, InvoiceDraft, NewInvoice, PaymentStatus};
use crate::services::allocator::{next_code, MAX_CREATE_ATTEMPTS};
use crate::services::error::{InvoiceError, Step};
use crate::services::metrics::INVOICE_OPERATIONS_TOTAL;
use crate::services::query::{InvoiceFilter, PageRequest};
use crate::services::reconcile::{self, LineItemOp};
use crate::services::repository::{
    CatalogItemRepository, CustomerRepository, InvoiceRepository, InvoiceUnitOfWork, StoreError,
};
use crate::services::validation::ValidationGateway;

mod list_steps {
    use super::Step;
    pub const QUERY: Step = Step::new("list invoices", 0);
}

mod detail_steps {
    use super::Step;
    pub const INVOICE: Step = Step::new("find invoice", 0);
    pub const SUMMARY: Step = Step::new("find invoice summary", 1);
    pub const LINE_ITEMS: Step = Step::new("find invoice items", 2);
    pub const CATALOG: Step = Step::new("find catalog items", 3);
    pub const CUSTOMER: Step = Step::new("find customer", 4);
}

mod create_steps {
    use super::Step;
    pub const CUSTOMER: Step = Step::new("validate customer", 0);
    pub const ITEMS: Step = Step::new("validate items", 1);
    pub const BEGIN: Step = Step::new("begin transaction", 2);
    pub const ALLOCATE: Step = Step::new("allocate invoice code", 3);
    pub const INSERT_HEADER: Step = Step::new("insert invoice", 4);
    pub const VERIFY_HEADER: Step = Step::new("verify invoice insert", 5);
    pub const INSERT_SUMMARY: Step = Step::new("insert invoice summary", 6);
    pub const VERIFY_SUMMARY: Step = Step::new("verify invoice summary insert", 7);
    pub const INSERT_ITEMS: Step = Step::new("insert invoice items", 8);
    pub const VERIFY_ITEMS: Step = Step::new("verify invoice items insert", 9);
    pub const COMMIT: Step = Step::new("commit transaction", 10);
}

mod edit_steps {
    use super::Step;
    pub const INVOICE: Step = Step::new("find invoice", 0);
    pub const CUSTOMER: Step = Step::new("validate customer", 1);
    pub const ITEMS: Step = Step::new("validate items", 2);
    pub const BEGIN: Step = Step::new("begin transaction", 3);
    pub const UPDATE_HEADER: Step = Step::new("update invoice", 4);
    pub const UPDATE_SUMMARY: Step = Step::new("update invoice summary", 5);
    pub const READ_ITEMS: Step = Step::new("read invoice items", 6);
    pub const APPLY_ITEMS: Step = Step::new("apply invoice item changes", 7);
    pub const COMMIT: Step = Step::new("commit transaction", 8);
}

mod delete_steps {
    use super::Step;
    pub const INVOICE: Step = Step::new("find invoice", 0);
    pub const BEGIN: Step = Step::new("begin transaction", 1);
    pub const DELETE_HEADER: Step = Step::new("delete invoice", 2);
    pub const DELETE_DEPENDENTS: Step = Step::new("delete invoice summary and items", 3);
    pub const COMMIT: Step = Step::new("commit transaction", 4);
}

fn ensure_rows(affected: u64, expected: u64, step: Step) -> Result<(), InvoiceError> {
    if affected < expected {
        return Err(step.fail(format!(
            "affected {} rows, expected at least {}",
            affected, expected
        )));
    }
    Ok(())
}

/// Commits on success, rolls back otherwise. The outcome's error wins over
/// any rollback error.
async fn finish<T>(
    uow: Box<dyn InvoiceUnitOfWork>,
    outcome: Result<T, InvoiceError>,
    commit: Step,
) -> Result<T, InvoiceError> {
    match outcome {
        Ok(value) => {
            uow.commit().await.map_err(|e| commit.fail(e))?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = uow.rollback().await {
                warn!(error = %rollback_err, "Rollback failed");
            }
            Err(err)
        }
    }
}

pub struct InvoiceService {
    invoices: Arc<dyn InvoiceRepository>,
    customers: Arc<dyn CustomerRepository>,
    items: Arc<dyn CatalogItemRepository>,
    gateway: ValidationGateway,
}

impl InvoiceService {
    pub fn new(
        invoices: Arc<dyn InvoiceRepository>,
        customers: Arc<dyn CustomerRepository>,
        items: Arc<dyn CatalogItemRepository>,
    ) -> Self {
        let gateway = ValidationGateway::new(customers.clone(), items.clone());
        Self {
            invoices,
            customers,
            items,
            gateway,
        }
    }

    #[instrument(skip(self))]
    pub async fn list_invoices(
        &self,
        filter: &InvoiceFilter,
        page: PageRequest,
    ) -> Result<Paginated<InvoiceListItem>, InvoiceError> {
        let (rows, total) = self
            .invoices
            .list(filter, page)
            .await
            .map_err(|e| list_steps::QUERY.unknown(e))?;

        Ok(Paginated {
            results: rows.into_iter().map(InvoiceListItem::from).collect(),
            pagination: Pagination::new(page.page, page.limit, total),
        })
    }

    async fn find_live_invoice(
        &self,
        invoice_code: &str,
        step: Step,
    ) -> Result<Invoice, InvoiceError> {
        self.invoices
            .find_by_code(invoice_code)
            .await
            .map_err(|e| step.unknown(e))?
            .ok_or(InvoiceError::InvoiceNotFound)
    }

    /// Header, summary, line items, catalog names and customer in one view.
    #[instrument(skip(self))]
    pub async fn get_invoice_detail(
        &self,
        invoice_code: &str,
    ) -> Result<InvoiceDetail, InvoiceError> {
        let invoice = self
            .find_live_invoice(invoice_code, detail_steps::INVOICE)
            .await?;

        let summary = self
            .invoices
            .find_summary(invoice.id)
            .await
            .map_err(|e| detail_steps::SUMMARY.unknown(e))?
            .ok_or(InvoiceError::SummaryNotFound)?;

        let line_items = self
            .invoices
            .find_line_items(invoice.id)
            .await
            .map_err(|e| detail_steps::LINE_ITEMS.unknown(e))?;
        if line_items.is_empty() {
            return Err(InvoiceError::ItemsNotFound);
        }

        let item_ids: Vec<i64> = line_items
            .iter()
            .map(|line| line.item_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let names: HashMap<i64, String> = self
            .items
            .find_by_ids(&item_ids)
            .await
            .map_err(|e| detail_steps::CATALOG.unknown(e))?
            .into_iter()
            .map(|item| (item.id, item.name))
            .collect();

        let customer = self
            .customers
            .find_by_id(invoice.customer_id)
            .await
            .map_err(|e| detail_steps::CUSTOMER.unknown(e))?
            .ok_or(InvoiceError::CustomerNotFound)?;

        let items = line_items
            .into_iter()
            .map(|line| {
                let name = names.get(&line.item_id).cloned().ok_or_else(|| {
                    warn!(item_id = line.item_id, "Line item references a missing catalog item");
                    InvoiceError::CatalogItemNotFound
                })?;
                Ok(InvoiceItemView {
                    item_id: line.item_id,
                    name,
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    amount: line.amount,
                })
            })
            .collect::<Result<Vec<_>, InvoiceError>>()?;

        Ok(InvoiceDetail {
            invoice_id: invoice.invoice_code,
            subject: invoice.subject,
            issue_date: invoice.issue_date,
            due_date: invoice.due_date,
            customer: CustomerView::from(customer),
            items,
            summary: SummaryView {
                status: PaymentStatus::from_paid_flag(summary.is_paid),
                total_items: summary.total_items,
                sub_total: summary.subtotal,
                tax: summary.tax,
                grand_total: summary.grand_total,
            },
        })
    }

    /// Validates references, then writes header, summary and line items in
    /// one transaction. Returns the allocated invoice code.
    #[instrument(skip(self, draft), fields(customer_id = draft.header.customer_id))]
    pub async fn create_invoice(&self, draft: InvoiceDraft) -> Result<String, InvoiceError> {
        self.gateway
            .validate_customer(draft.header.customer_id, create_steps::CUSTOMER)
            .await?;
        self.gateway
            .validate_items(&draft.item_ids(), create_steps::ITEMS)
            .await?;

        let mut attempt = 1;
        loop {
            match self.try_create(&draft).await {
                Err(InvoiceError::DuplicateCode) if attempt < MAX_CREATE_ATTEMPTS => {
                    warn!(attempt, "Invoice code collided, retrying create");
                    attempt += 1;
                }
                Ok(code) => {
                    INVOICE_OPERATIONS_TOTAL.with_label_values(&["create"]).inc();
                    info!(invoice_code = %code, "Invoice created");
                    return Ok(code);
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn try_create(&self, draft: &InvoiceDraft) -> Result<String, InvoiceError> {
        let mut uow = self
            .invoices
            .begin()
            .await
            .map_err(|e| create_steps::BEGIN.fail(e))?;
        let outcome = write_new_invoice(uow.as_mut(), draft).await;
        finish(uow, outcome, create_steps::COMMIT).await
    }

    /// Overwrites header and summary and reconciles line items of a live invoice.
    #[instrument(skip(self, draft))]
    pub async fn edit_invoice(
        &self,
        invoice_code: &str,
        draft: InvoiceDraft,
    ) -> Result<String, InvoiceError> {
        let invoice = self
            .find_live_invoice(invoice_code, edit_steps::INVOICE)
            .await?;
        self.gateway
            .validate_customer(draft.header.customer_id, edit_steps::CUSTOMER)
            .await?;
        self.gateway
            .validate_items(&draft.item_ids(), edit_steps::ITEMS)
            .await?;

        let mut uow = self
            .invoices
            .begin()
            .await
            .map_err(|e| edit_steps::BEGIN.fail(e))?;
        let outcome = rewrite_invoice(uow.as_mut(), invoice.id, &draft).await;
        finish(uow, outcome, edit_steps::COMMIT).await?;

        INVOICE_OPERATIONS_TOTAL.with_label_values(&["edit"]).inc();
        info!(invoice_code = %invoice.invoice_code, "Invoice edited");
        Ok(invoice.invoice_code)
    }

    /// Soft-deletes the invoice together with its summary and line items.
    #[instrument(skip(self))]
    pub async fn delete_invoice(&self, invoice_code: &str) -> Result<(), InvoiceError> {
        let invoice = self
            .find_live_invoice(invoice_code, delete_steps::INVOICE)
            .await?;

        let mut uow = self
            .invoices
            .begin()
            .await
            .map_err(|e| delete_steps::BEGIN.fail(e))?;
        let outcome = remove_invoice(uow.as_mut(), &invoice.invoice_code).await;
        finish(uow, outcome, delete_steps::COMMIT).await?;

        INVOICE_OPERATIONS_TOTAL.with_label_values(&["delete"]).inc();
        info!(invoice_code = %invoice.invoice_code, "Invoice deleted");
        Ok(())
    }
}

async fn write_new_invoice(
    uow: &mut dyn InvoiceUnitOfWork,
    draft: &InvoiceDraft,
) -> Result<String, InvoiceError> {
    let count = uow
        .count_invoices()
        .await
        .map_err(|e| create_steps::ALLOCATE.fail(e))?;
    let invoice_code = next_code(count);

    let inserted = uow
        .insert_invoice(&NewInvoice {
            invoice_code: invoice_code.clone(),
            header: draft.header.clone(),
        })
        .await
        .map_err(|e| match e {
            StoreError::UniqueViolation => InvoiceError::DuplicateCode,
            other => create_steps::INSERT_HEADER.fail(other),
        })?;
    ensure_rows(inserted.rows, 1, create_steps::VERIFY_HEADER)?;

    let rows = uow
        .insert_summary(inserted.id, &draft.summary)
        .await
        .map_err(|e| create_steps::INSERT_SUMMARY.fail(e))?;
    ensure_rows(rows, 1, create_steps::VERIFY_SUMMARY)?;

    let rows = uow
        .insert_line_items(inserted.id, &draft.items)
        .await
        .map_err(|e| create_steps::INSERT_ITEMS.fail(e))?;
    ensure_rows(rows, draft.items.len() as u64, create_steps::VERIFY_ITEMS)?;

    Ok(invoice_code)
}

async fn rewrite_invoice(
    uow: &mut dyn InvoiceUnitOfWork,
    invoice_id: i64,
    draft: &InvoiceDraft,
) -> Result<(), InvoiceError> {
    let rows = uow
        .update_invoice(invoice_id, &draft.header)
        .await
        .map_err(|e| edit_steps::UPDATE_HEADER.fail(e))?;
    ensure_rows(rows, 1, edit_steps::UPDATE_HEADER)?;

    let rows = uow
        .update_summary(invoice_id, &draft.summary)
        .await
        .map_err(|e| edit_steps::UPDATE_SUMMARY.fail(e))?;
    ensure_rows(rows, 1, edit_steps::UPDATE_SUMMARY)?;

    let existing = uow
        .line_items(invoice_id)
        .await
        .map_err(|e| edit_steps::READ_ITEMS.fail(e))?;

    for op in reconcile::plan(invoice_id, &existing, &draft.items) {
        let rows = match &op {
            LineItemOp::Insert { invoice_id, item } => uow.insert_line_item(*invoice_id, item).await,
            LineItemOp::Update { row_id, item } => uow.update_line_item(*row_id, item).await,
            LineItemOp::Delete { row_id } => uow.delete_line_item(*row_id).await,
        }
        .map_err(|e| edit_steps::APPLY_ITEMS.fail(e))?;

        if rows < 1 {
            warn!(?op, "Line item change affected no rows");
        }
        ensure_rows(rows, 1, edit_steps::APPLY_ITEMS)?;
    }

    Ok(())
}

async fn remove_invoice(
    uow: &mut dyn InvoiceUnitOfWork,
    invoice_code: &str,
) -> Result<(), InvoiceError> {
    let invoice_id = uow
        .soft_delete_invoice(invoice_code)
        .await
        .map_err(|e| delete_steps::DELETE_HEADER.fail(e))?
        .ok_or_else(|| {
            // A concurrent delete won between lookup and write.
            warn!(invoice_code, "Invoice no longer live at delete");
            InvoiceError::InvoiceNotFound
        })?;

    uow.soft_delete_dependents(invoice_id)
        .await
        .map_err(|e| delete_steps::DELETE_DEPENDENTS.fail(e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InvoiceHeader, LineItemInput, SummaryValues};
    use crate::services::memory::{seeded_store, Fault, MemoryStore};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn line(item_id: i64, quantity: i64, unit_price: i64) -> LineItemInput {
        let quantity = Decimal::from(quantity);
        let unit_price = Decimal::from(unit_price);
        LineItemInput {
            item_id,
            quantity,
            unit_price,
            amount: quantity * unit_price,
        }
    }

    fn draft(customer_id: i64, items: Vec<LineItemInput>) -> InvoiceDraft {
        let subtotal: Decimal = items.iter().map(|i| i.amount).sum();
        InvoiceDraft {
            header: InvoiceHeader {
                issue_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                due_date: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
                subject: "Website refresh".to_string(),
                customer_id,
            },
            summary: SummaryValues {
                total_items: items.len() as i32,
                subtotal,
                tax: dec!(0),
                grand_total: subtotal,
                is_paid: false,
            },
            items,
        }
    }

    async fn service() -> (InvoiceService, MemoryStore) {
        let store = seeded_store().await;
        let shared = Arc::new(store.clone());
        (
            InvoiceService::new(shared.clone(), shared.clone(), shared),
            store,
        )
    }

    #[tokio::test]
    async fn test_create_allocates_sequential_codes() {
        let (service, _) = service().await;
        let first = service.create_invoice(draft(1, vec![line(1, 1, 100)])).await.unwrap();
        let second = service.create_invoice(draft(2, vec![line(2, 1, 100)])).await.unwrap();
        assert_eq!(first, "0001");
        assert_eq!(second, "0002");
    }

    #[tokio::test]
    async fn test_unknown_customer_writes_nothing() {
        let (service, store) = service().await;
        let err = service
            .create_invoice(draft(404, vec![line(1, 1, 100)]))
            .await
            .unwrap_err();
        assert!(matches!(err, InvoiceError::CustomerNotFound));
        assert_eq!(store.invoice_rows().await, 0);
        assert_eq!(store.summary_rows().await, 0);
        assert_eq!(store.line_item_rows().await, 0);
    }

    #[tokio::test]
    async fn test_short_bulk_insert_rolls_back_header_and_summary() {
        let (service, store) = service().await;
        store.arm(Fault::ShortLineItemInsert);

        let err = service
            .create_invoice(draft(1, vec![line(1, 1, 100), line(2, 2, 50)]))
            .await
            .unwrap_err();

        assert!(matches!(err, InvoiceError::Transaction { code: 9, .. }));
        assert_eq!(err.to_string(), "something went wrong [9]");
        assert_eq!(store.invoice_rows().await, 0);
        assert_eq!(store.summary_rows().await, 0);
        assert_eq!(store.line_item_rows().await, 0);
    }

    #[tokio::test]
    async fn test_code_collision_retries_with_fresh_count() {
        let (service, store) = service().await;
        service.create_invoice(draft(1, vec![line(1, 1, 100)])).await.unwrap();

        store.arm(Fault::StaleInvoiceCount);
        let code = service.create_invoice(draft(1, vec![line(2, 1, 100)])).await.unwrap();

        assert_eq!(code, "0002");
        assert_eq!(store.invoice_rows().await, 2);
    }

    #[tokio::test]
    async fn test_failed_commit_leaves_no_rows() {
        let (service, store) = service().await;
        store.arm(Fault::CommitFails);

        let err = service
            .create_invoice(draft(1, vec![line(1, 1, 100)]))
            .await
            .unwrap_err();

        assert!(matches!(err, InvoiceError::Transaction { code: 10, .. }));
        assert_eq!(store.invoice_rows().await, 0);
    }

    #[tokio::test]
    async fn test_edit_reconciles_line_items() {
        let (service, store) = service().await;
        let code = service
            .create_invoice(draft(1, vec![line(1, 1, 100), line(2, 1, 100), line(3, 1, 100)]))
            .await
            .unwrap();
        let before = store.stored_invoice(&code).await.unwrap();
        let row_of = |item_id: i64| {
            before
                .line_items
                .iter()
                .find(|l| l.item_id == item_id)
                .map(|l| l.id)
                .unwrap()
        };

        let mut edited = draft(2, vec![line(2, 5, 100), line(3, 1, 90), line(4, 1, 20)]);
        edited.summary.is_paid = true;
        service.edit_invoice(&code, edited).await.unwrap();

        let after = store.stored_invoice(&code).await.unwrap();
        assert_eq!(after.invoice.customer_id, 2);
        let summary = after.summary.unwrap();
        assert!(summary.is_paid);
        assert_eq!(summary.total_items, 3);

        let live: Vec<_> = after
            .line_items
            .iter()
            .filter(|l| l.deleted_utc.is_none())
            .collect();
        assert_eq!(live.len(), 3);
        // Updates keep their row ids.
        let b = live.iter().find(|l| l.item_id == 2).unwrap();
        assert_eq!(b.id, row_of(2));
        assert_eq!(b.quantity, dec!(5));
        // The dropped item is soft-deleted, not removed.
        let a = after.line_items.iter().find(|l| l.item_id == 1).unwrap();
        assert!(a.deleted_utc.is_some());
    }

    #[tokio::test]
    async fn test_edit_failure_leaves_prior_state() {
        let (service, store) = service().await;
        let code = service
            .create_invoice(draft(1, vec![line(1, 1, 100), line(2, 1, 100)]))
            .await
            .unwrap();

        store.arm(Fault::LineItemDeleteMisses);
        let err = service
            .edit_invoice(&code, draft(3, vec![line(2, 9, 100)]))
            .await
            .unwrap_err();
        assert!(matches!(err, InvoiceError::Transaction { code: 7, .. }));

        let stored = store.stored_invoice(&code).await.unwrap();
        assert_eq!(stored.invoice.customer_id, 1);
        assert_eq!(stored.summary.unwrap().total_items, 2);
        assert!(stored.line_items.iter().all(|l| l.deleted_utc.is_none()));
        assert!(stored
            .line_items
            .iter()
            .all(|l| l.quantity == dec!(1)));
    }

    #[tokio::test]
    async fn test_edit_unknown_invoice() {
        let (service, _) = service().await;
        let err = service
            .edit_invoice("0042", draft(1, vec![line(1, 1, 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, InvoiceError::InvoiceNotFound));
    }

    #[tokio::test]
    async fn test_edit_with_invalid_items_writes_nothing() {
        let (service, store) = service().await;
        let code = service.create_invoice(draft(1, vec![line(1, 1, 100)])).await.unwrap();

        let err = service
            .edit_invoice(&code, draft(1, vec![line(99, 1, 100)]))
            .await
            .unwrap_err();
        assert!(matches!(err, InvoiceError::InvalidItems));
        assert_eq!(store.line_item_rows().await, 1);
    }

    #[tokio::test]
    async fn test_delete_cascades_soft_delete() {
        let (service, store) = service().await;
        let code = service
            .create_invoice(draft(1, vec![line(1, 1, 100), line(2, 1, 100)]))
            .await
            .unwrap();

        service.delete_invoice(&code).await.unwrap();

        let stored = store.stored_invoice(&code).await.unwrap();
        assert!(stored.invoice.deleted_utc.is_some());
        assert!(stored.summary.unwrap().deleted_utc.is_some());
        assert!(stored.line_items.iter().all(|l| l.deleted_utc.is_some()));

        assert!(matches!(
            service.get_invoice_detail(&code).await.unwrap_err(),
            InvoiceError::InvoiceNotFound
        ));
        assert!(matches!(
            service.delete_invoice(&code).await.unwrap_err(),
            InvoiceError::InvoiceNotFound
        ));
    }

    #[tokio::test]
    async fn test_delete_losing_race_reports_not_found() {
        let (service, store) = service().await;
        let code = service.create_invoice(draft(1, vec![line(1, 1, 100)])).await.unwrap();
        service.delete_invoice(&code).await.unwrap();

        // Lookup already passed; the header is gone by the time the write runs.
        let mut uow = store.begin().await.unwrap();
        let err = remove_invoice(uow.as_mut(), &code).await.unwrap_err();
        assert!(matches!(err, InvoiceError::InvoiceNotFound));
        uow.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn test_codes_keep_counting_after_delete() {
        let (service, _) = service().await;
        let first = service.create_invoice(draft(1, vec![line(1, 1, 100)])).await.unwrap();
        service.delete_invoice(&first).await.unwrap();

        let next = service.create_invoice(draft(1, vec![line(1, 1, 100)])).await.unwrap();
        assert_eq!(next, "0002");
    }

    #[tokio::test]
    async fn test_detail_denormalizes_names() {
        let (service, _) = service().await;
        let code = service
            .create_invoice(draft(1, vec![line(1, 2, 150), line(3, 10, 5)]))
            .await
            .unwrap();

        let detail = service.get_invoice_detail(&code).await.unwrap();
        assert_eq!(detail.customer.name, "Acme Widgets");
        assert_eq!(detail.summary.status, PaymentStatus::Unpaid);
        assert_eq!(detail.summary.grand_total, dec!(350));
        let names: Vec<&str> = detail.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Design Consultation", "Printed Brochure"]);
    }

    #[tokio::test]
    async fn test_list_paginates_most_recent_first() {
        let (service, _) = service().await;
        for _ in 0..3 {
            service.create_invoice(draft(1, vec![line(1, 1, 100)])).await.unwrap();
        }

        let page = service
            .list_invoices(&InvoiceFilter::default(), PageRequest::new(Some(1), Some(2)))
            .await
            .unwrap();
        let codes: Vec<&str> = page.results.iter().map(|r| r.invoice_id.as_str()).collect();
        assert_eq!(codes, vec!["0003", "0002"]);
        assert_eq!(page.pagination.total_items, 3);
        assert!(page.pagination.has_next);
    }
}
