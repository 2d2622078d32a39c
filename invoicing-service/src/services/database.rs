//! PostgreSQL storage for invoicing-service.

use async_trait::async_trait;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder};
use std::time::Duration;
use tracing::{info, instrument};

use crate::models::{
    CatalogItem, CatalogItemFilter, Customer, Invoice, InvoiceLineItem, InvoiceListRow,
    InvoiceSummary,
};
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::query::{count_query, like_pattern, listing_query, InvoiceFilter, PageRequest};
use crate::services::repository::{
    CatalogItemRepository, CustomerRepository, InvoiceRepository, InvoiceUnitOfWork, StoreError,
    StoreHealth,
};
use crate::services::unit_of_work::PgUnitOfWork;

pub(crate) const INVOICE_COLUMNS: &str = "id, invoice_code, issue_date, due_date, subject, \
     customer_id, created_utc, updated_utc, deleted_utc";

pub(crate) const LINE_ITEM_COLUMNS: &str = "id, invoice_id, item_id, quantity, unit_price, \
     amount, created_utc, updated_utc, deleted_utc";

const SUMMARY_COLUMNS: &str = "id, invoice_id, total_items, subtotal, tax, grand_total, is_paid, \
     created_utc, updated_utc, deleted_utc";

const CUSTOMER_COLUMNS: &str = "id, name, address, city, postcode, country, created_utc, \
     updated_utc, deleted_utc";

const ITEM_COLUMNS: &str = "id, name, item_type, created_utc, updated_utc, deleted_utc";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "invoicing-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl StoreHealth for Database {
    #[instrument(skip(self))]
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl CustomerRepository for Database {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> Result<Option<Customer>, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_customer"])
            .start_timer();

        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        timer.observe_duration();

        Ok(customer)
    }

    #[instrument(skip(self))]
    async fn list(&self, page: PageRequest) -> Result<(Vec<Customer>, u64), StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_customers"])
            .start_timer();

        let listing = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE deleted_utc IS NULL \
             ORDER BY id DESC LIMIT $1 OFFSET $2"
        );
        let (customers, total) = tokio::try_join!(
            sqlx::query_as::<_, Customer>(&listing)
                .bind(page.limit())
                .bind(page.offset())
                .fetch_all(&self.pool),
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM customers WHERE deleted_utc IS NULL"
            )
            .fetch_one(&self.pool),
        )?;

        timer.observe_duration();

        Ok((customers, total.max(0) as u64))
    }
}

fn push_item_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &CatalogItemFilter) {
    if let Some(item_type) = filter.item_type.as_deref().filter(|s| !s.is_empty()) {
        builder
            .push(" AND item_type ILIKE ")
            .push_bind(like_pattern(item_type));
    }
    if let Some(name) = filter.name.as_deref().filter(|s| !s.is_empty()) {
        builder.push(" AND name ILIKE ").push_bind(like_pattern(name));
    }
}

#[async_trait]
impl CatalogItemRepository for Database {
    #[instrument(skip(self))]
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<CatalogItem>, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_items"])
            .start_timer();

        let items = sqlx::query_as::<_, CatalogItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        timer.observe_duration();

        Ok(items)
    }

    #[instrument(skip(self))]
    async fn list(
        &self,
        filter: &CatalogItemFilter,
        page: PageRequest,
    ) -> Result<(Vec<CatalogItem>, u64), StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_items"])
            .start_timer();

        let mut listing = QueryBuilder::<Postgres>::new(format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE deleted_utc IS NULL"
        ));
        push_item_filter(&mut listing, filter);
        listing
            .push(" ORDER BY id DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let mut count =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM items WHERE deleted_utc IS NULL");
        push_item_filter(&mut count, filter);

        let (items, total) = tokio::try_join!(
            listing.build_query_as::<CatalogItem>().fetch_all(&self.pool),
            count.build_query_scalar::<i64>().fetch_one(&self.pool),
        )?;

        timer.observe_duration();

        Ok((items, total.max(0) as u64))
    }
}

#[async_trait]
impl InvoiceRepository for Database {
    #[instrument(skip(self))]
    async fn find_by_code(&self, invoice_code: &str) -> Result<Option<Invoice>, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_invoice"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices \
             WHERE invoice_code = $1 AND deleted_utc IS NULL"
        ))
        .bind(invoice_code)
        .fetch_optional(&self.pool)
        .await?;

        timer.observe_duration();

        Ok(invoice)
    }

    #[instrument(skip(self))]
    async fn find_summary(&self, invoice_id: i64) -> Result<Option<InvoiceSummary>, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_summary"])
            .start_timer();

        let summary = sqlx::query_as::<_, InvoiceSummary>(&format!(
            "SELECT {SUMMARY_COLUMNS} FROM invoice_summary \
             WHERE invoice_id = $1 AND deleted_utc IS NULL"
        ))
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await?;

        timer.observe_duration();

        Ok(summary)
    }

    #[instrument(skip(self))]
    async fn find_line_items(&self, invoice_id: i64) -> Result<Vec<InvoiceLineItem>, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_line_items"])
            .start_timer();

        let items = sqlx::query_as::<_, InvoiceLineItem>(&format!(
            "SELECT {LINE_ITEM_COLUMNS} FROM invoice_items \
             WHERE invoice_id = $1 AND deleted_utc IS NULL ORDER BY id"
        ))
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        timer.observe_duration();

        Ok(items)
    }

    #[instrument(skip(self, filter))]
    async fn list(
        &self,
        filter: &InvoiceFilter,
        page: PageRequest,
    ) -> Result<(Vec<InvoiceListRow>, u64), StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_invoices"])
            .start_timer();

        let predicates = filter.predicates();
        let mut listing = listing_query(&predicates, page);
        let mut count = count_query(&predicates);

        // The first failure drops the other query mid-flight.
        let (rows, total) = tokio::try_join!(
            listing.build_query_as::<InvoiceListRow>().fetch_all(&self.pool),
            count.build_query_scalar::<i64>().fetch_one(&self.pool),
        )?;

        timer.observe_duration();

        Ok((rows, total.max(0) as u64))
    }

    #[instrument(skip(self))]
    async fn begin(&self) -> Result<Box<dyn InvoiceUnitOfWork>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork::new(tx)))
    }
}
