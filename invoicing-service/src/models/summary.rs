//! Invoice summary model: the 1:1 totals and payment record.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct InvoiceSummary {
    pub id: i64,
    pub invoice_id: i64,
    pub total_items: i32,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub grand_total: Decimal,
    pub is_paid: bool,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
    pub deleted_utc: Option<DateTime<Utc>>,
}

/// Values written on create and overwritten wholesale on edit.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryValues {
    pub total_items: i32,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub grand_total: Decimal,
    pub is_paid: bool,
}
