//! Line item model for invoicing-service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Line item on an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct InvoiceLineItem {
    pub id: i64,
    pub invoice_id: i64,
    pub item_id: i64,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub amount: Decimal,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
    pub deleted_utc: Option<DateTime<Utc>>,
}

/// Requested line: one catalog item with its quantity and prices.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItemInput {
    pub item_id: i64,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub amount: Decimal,
}
