//! Catalog reference checks that run before any invoice write.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::warn;

use crate::models::{CatalogItem, Customer};
use crate::services::error::{InvoiceError, Step};
use crate::services::repository::{CatalogItemRepository, CustomerRepository};

#[derive(Clone)]
pub struct ValidationGateway {
    customers: Arc<dyn CustomerRepository>,
    items: Arc<dyn CatalogItemRepository>,
}

impl ValidationGateway {
    pub fn new(
        customers: Arc<dyn CustomerRepository>,
        items: Arc<dyn CatalogItemRepository>,
    ) -> Self {
        Self { customers, items }
    }

    pub async fn validate_customer(
        &self,
        customer_id: i64,
        step: Step,
    ) -> Result<Customer, InvoiceError> {
        self.customers
            .find_by_id(customer_id)
            .await
            .map_err(|e| step.unknown(e))?
            .ok_or_else(|| {
                warn!(customer_id, "Customer reference does not resolve");
                InvoiceError::CustomerNotFound
            })
    }

    /// Every id must resolve and appear once.
    pub async fn validate_items(
        &self,
        item_ids: &[i64],
        step: Step,
    ) -> Result<Vec<CatalogItem>, InvoiceError> {
        let distinct: HashSet<i64> = item_ids.iter().copied().collect();
        if distinct.len() != item_ids.len() {
            warn!(?item_ids, "Duplicate item references in request");
            return Err(InvoiceError::InvalidItems);
        }

        let ids: Vec<i64> = distinct.into_iter().collect();
        let resolved = self
            .items
            .find_by_ids(&ids)
            .await
            .map_err(|e| step.unknown(e))?;

        if resolved.len() != ids.len() {
            warn!(
                requested = ids.len(),
                resolved = resolved.len(),
                "Item references do not resolve"
            );
            return Err(InvoiceError::InvalidItems);
        }

        Ok(resolved)
    }
}
