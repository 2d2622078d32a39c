//! PostgreSQL unit of work: one `sqlx` transaction per invoice write.

use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder, Transaction};
use tracing::instrument;

use crate::models::{InvoiceHeader, InvoiceLineItem, LineItemInput, NewInvoice, SummaryValues};
use crate::services::database::LINE_ITEM_COLUMNS;
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::repository::{InsertedInvoice, InvoiceUnitOfWork, StoreError};

/// Advisory lock key guarding invoice code allocation.
const INVOICE_CODE_LOCK: i64 = 0x1e_701c_e5;

pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

impl PgUnitOfWork {
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl InvoiceUnitOfWork for PgUnitOfWork {
    #[instrument(skip(self))]
    async fn count_invoices(&mut self) -> Result<i64, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["count_invoices"])
            .start_timer();

        // Held until commit or rollback.
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(INVOICE_CODE_LOCK)
            .execute(&mut *self.tx)
            .await?;

        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM invoices")
            .fetch_one(&mut *self.tx)
            .await?;

        timer.observe_duration();

        Ok(count)
    }

    #[instrument(skip(self, invoice), fields(invoice_code = %invoice.invoice_code))]
    async fn insert_invoice(&mut self, invoice: &NewInvoice) -> Result<InsertedInvoice, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_invoice"])
            .start_timer();

        let ids = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO invoices (invoice_code, issue_date, due_date, subject, customer_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&invoice.invoice_code)
        .bind(invoice.header.issue_date)
        .bind(invoice.header.due_date)
        .bind(&invoice.header.subject)
        .bind(invoice.header.customer_id)
        .fetch_all(&mut *self.tx)
        .await?;

        timer.observe_duration();

        Ok(InsertedInvoice {
            id: ids.first().copied().unwrap_or_default(),
            rows: ids.len() as u64,
        })
    }

    #[instrument(skip(self, values))]
    async fn insert_summary(
        &mut self,
        invoice_id: i64,
        values: &SummaryValues,
    ) -> Result<u64, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_summary"])
            .start_timer();

        let result = sqlx::query(
            r#"
            INSERT INTO invoice_summary (invoice_id, total_items, subtotal, tax, grand_total, is_paid)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(invoice_id)
        .bind(values.total_items)
        .bind(values.subtotal)
        .bind(values.tax)
        .bind(values.grand_total)
        .bind(values.is_paid)
        .execute(&mut *self.tx)
        .await?;

        timer.observe_duration();

        Ok(result.rows_affected())
    }

    #[instrument(skip(self, items), fields(count = items.len()))]
    async fn insert_line_items(
        &mut self,
        invoice_id: i64,
        items: &[LineItemInput],
    ) -> Result<u64, StoreError> {
        if items.is_empty() {
            return Ok(0);
        }

        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_line_items"])
            .start_timer();

        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO invoice_items (invoice_id, item_id, quantity, unit_price, amount) ",
        );
        builder.push_values(items, |mut row, item| {
            row.push_bind(invoice_id)
                .push_bind(item.item_id)
                .push_bind(item.quantity)
                .push_bind(item.unit_price)
                .push_bind(item.amount);
        });

        let result = builder.build().execute(&mut *self.tx).await?;

        timer.observe_duration();

        Ok(result.rows_affected())
    }

    #[instrument(skip(self, header))]
    async fn update_invoice(
        &mut self,
        invoice_id: i64,
        header: &InvoiceHeader,
    ) -> Result<u64, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_invoice"])
            .start_timer();

        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET issue_date = $2, due_date = $3, subject = $4, customer_id = $5, updated_utc = NOW()
            WHERE id = $1 AND deleted_utc IS NULL
            "#,
        )
        .bind(invoice_id)
        .bind(header.issue_date)
        .bind(header.due_date)
        .bind(&header.subject)
        .bind(header.customer_id)
        .execute(&mut *self.tx)
        .await?;

        timer.observe_duration();

        Ok(result.rows_affected())
    }

    #[instrument(skip(self, values))]
    async fn update_summary(
        &mut self,
        invoice_id: i64,
        values: &SummaryValues,
    ) -> Result<u64, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_summary"])
            .start_timer();

        let result = sqlx::query(
            r#"
            UPDATE invoice_summary
            SET total_items = $2, subtotal = $3, tax = $4, grand_total = $5, is_paid = $6,
                updated_utc = NOW()
            WHERE invoice_id = $1 AND deleted_utc IS NULL
            "#,
        )
        .bind(invoice_id)
        .bind(values.total_items)
        .bind(values.subtotal)
        .bind(values.tax)
        .bind(values.grand_total)
        .bind(values.is_paid)
        .execute(&mut *self.tx)
        .await?;

        timer.observe_duration();

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn line_items(&mut self, invoice_id: i64) -> Result<Vec<InvoiceLineItem>, StoreError> {
        let items = sqlx::query_as::<_, InvoiceLineItem>(&format!(
            "SELECT {LINE_ITEM_COLUMNS} FROM invoice_items \
             WHERE invoice_id = $1 AND deleted_utc IS NULL ORDER BY id FOR UPDATE"
        ))
        .bind(invoice_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(items)
    }

    #[instrument(skip(self, item), fields(item_id = item.item_id))]
    async fn insert_line_item(
        &mut self,
        invoice_id: i64,
        item: &LineItemInput,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO invoice_items (invoice_id, item_id, quantity, unit_price, amount)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(invoice_id)
        .bind(item.item_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.amount)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self, item))]
    async fn update_line_item(
        &mut self,
        row_id: i64,
        item: &LineItemInput,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE invoice_items
            SET quantity = $2, unit_price = $3, amount = $4, updated_utc = NOW()
            WHERE id = $1 AND deleted_utc IS NULL
            "#,
        )
        .bind(row_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.amount)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn delete_line_item(&mut self, row_id: i64) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE invoice_items SET deleted_utc = NOW() WHERE id = $1 AND deleted_utc IS NULL",
        )
        .bind(row_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn soft_delete_invoice(&mut self, invoice_code: &str) -> Result<Option<i64>, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_invoice"])
            .start_timer();

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE invoices SET deleted_utc = NOW()
            WHERE invoice_code = $1 AND deleted_utc IS NULL
            RETURNING id
            "#,
        )
        .bind(invoice_code)
        .fetch_optional(&mut *self.tx)
        .await?;

        timer.observe_duration();

        Ok(id)
    }

    #[instrument(skip(self))]
    async fn soft_delete_dependents(&mut self, invoice_id: i64) -> Result<u64, StoreError> {
        let summary = sqlx::query(
            "UPDATE invoice_summary SET deleted_utc = NOW() \
             WHERE invoice_id = $1 AND deleted_utc IS NULL",
        )
        .bind(invoice_id)
        .execute(&mut *self.tx)
        .await?;

        let items = sqlx::query(
            "UPDATE invoice_items SET deleted_utc = NOW() \
             WHERE invoice_id = $1 AND deleted_utc IS NULL",
        )
        .bind(invoice_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(summary.rows_affected() + items.rows_affected())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
