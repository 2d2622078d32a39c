//! Customer and catalog item models. Owned by the catalog; read-only here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Customer billed by an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub city: String,
    pub postcode: String,
    pub country: String,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_utc: Option<DateTime<Utc>>,
}

/// Sellable catalog item referenced by line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_utc: Option<DateTime<Utc>>,
}

/// Substring filters for the item listing.
#[derive(Debug, Clone, Default)]
pub struct CatalogItemFilter {
    pub item_type: Option<String>,
    pub name: Option<String>,
}
