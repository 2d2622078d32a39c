//! Invoice header model for invoicing-service.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::{LineItemInput, SummaryValues};

/// Payment status as shown to callers, derived from the summary's paid flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    Unpaid,
}

impl PaymentStatus {
    /// Anything other than `"paid"` filters for unpaid invoices.
    pub fn from_string(s: &str) -> Self {
        match s {
            "paid" => PaymentStatus::Paid,
            _ => PaymentStatus::Unpaid,
        }
    }

    pub fn from_paid_flag(is_paid: bool) -> Self {
        if is_paid {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Unpaid
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(self, PaymentStatus::Paid)
    }
}

/// Invoice header row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub id: i64,
    pub invoice_code: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub subject: String,
    pub customer_id: i64,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
    pub deleted_utc: Option<DateTime<Utc>>,
}

/// Caller-editable header fields.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceHeader {
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub subject: String,
    pub customer_id: i64,
}

/// Input for inserting a header; the code comes from the allocator.
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub invoice_code: String,
    pub header: InvoiceHeader,
}

/// One row of the invoice ⋈ summary ⋈ customer listing.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct InvoiceListRow {
    pub id: i64,
    pub invoice_code: String,
    pub subject: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub customer_name: String,
    pub total_items: i32,
    pub is_paid: bool,
}

/// Validated create/edit payload: header, requested lines and summary values.
#[derive(Debug, Clone)]
pub struct InvoiceDraft {
    pub header: InvoiceHeader,
    pub items: Vec<LineItemInput>,
    pub summary: SummaryValues,
}

impl InvoiceDraft {
    pub fn item_ids(&self) -> Vec<i64> {
        self.items.iter().map(|item| item.item_id).collect()
    }
}
