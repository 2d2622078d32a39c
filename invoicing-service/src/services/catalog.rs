//! Read-only listings of the customer and item catalogs.

use std::sync::Arc;

use service_core::response::{Paginated, Pagination};
use tracing::instrument;

use crate::models::{CatalogItem, CatalogItemFilter, Customer};
use crate::services::error::{InvoiceError, Step};
use crate::services::query::PageRequest;
use crate::services::repository::{CatalogItemRepository, CustomerRepository};

const LIST_CUSTOMERS: Step = Step::new("list customers", 0);
const LIST_ITEMS: Step = Step::new("list items", 0);

pub struct CatalogService {
    customers: Arc<dyn CustomerRepository>,
    items: Arc<dyn CatalogItemRepository>,
}

impl CatalogService {
    pub fn new(
        customers: Arc<dyn CustomerRepository>,
        items: Arc<dyn CatalogItemRepository>,
    ) -> Self {
        Self { customers, items }
    }

    #[instrument(skip(self))]
    pub async fn list_customers(
        &self,
        page: PageRequest,
    ) -> Result<Paginated<Customer>, InvoiceError> {
        let (results, total) = self
            .customers
            .list(page)
            .await
            .map_err(|e| LIST_CUSTOMERS.unknown(e))?;

        Ok(Paginated {
            results,
            pagination: Pagination::new(page.page, page.limit, total),
        })
    }

    #[instrument(skip(self))]
    pub async fn list_items(
        &self,
        filter: &CatalogItemFilter,
        page: PageRequest,
    ) -> Result<Paginated<CatalogItem>, InvoiceError> {
        let (results, total) = self
            .items
            .list(filter, page)
            .await
            .map_err(|e| LIST_ITEMS.unknown(e))?;

        Ok(Paginated {
            results,
            pagination: Pagination::new(page.page, page.limit, total),
        })
    }
}
