//! Invoice request and response shapes.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError};

use crate::models::{
    Customer, InvoiceDraft, InvoiceHeader, InvoiceListRow, LineItemInput,
    PaymentStatus, SummaryValues,
};
use crate::services::error::InvoiceError;
use crate::services::query::{InvoiceFilter, PageRequest};

const DATE_FORMAT: &str = "%Y-%m-%d";

fn parse_date(value: &str, field: &'static str) -> Result<NaiveDate, InvoiceError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| InvoiceError::InvalidDate { field })
}

fn parse_optional_date(
    value: Option<&str>,
    field: &'static str,
) -> Result<Option<NaiveDate>, InvoiceError> {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => parse_date(value, field).map(Some),
        None => Ok(None),
    }
}

/// Form-built query strings send every key, so `totalItems=` means no filter.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)?.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("subject is required".into());
        return Err(err);
    }
    Ok(())
}

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListInvoicesParams {
    pub invoice_id: Option<String>,
    pub subject: Option<String>,
    pub customer: Option<String>,
    pub issue_date: Option<String>,
    pub due_date: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub total_items: Option<i32>,
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 1000, message = "limit must be between 1 and 1000"))]
    pub limit: Option<u32>,
}

impl ListInvoicesParams {
    pub fn into_parts(self) -> Result<(InvoiceFilter, PageRequest), InvoiceError> {
        let filter = InvoiceFilter {
            invoice_code: self.invoice_id,
            subject: self.subject,
            customer_name: self.customer,
            issue_date: parse_optional_date(self.issue_date.as_deref(), "issueDate")?,
            due_date: parse_optional_date(self.due_date.as_deref(), "dueDate")?,
            // Zero carries no meaning as a line count.
            total_items: self.total_items.filter(|n| *n != 0),
            status: self
                .status
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(PaymentStatus::from_string),
        };

        Ok((filter, PageRequest::new(self.page, self.limit)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItemRequest {
    #[validate(range(min = 1, message = "itemId must be positive"))]
    pub item_id: i64,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub amount: Decimal,
}

impl InvoiceItemRequest {
    fn into_input(self) -> Result<LineItemInput, InvoiceError> {
        if self.quantity <= Decimal::ZERO {
            return Err(InvoiceError::InvalidQuantity);
        }

        Ok(LineItemInput {
            item_id: self.item_id,
            quantity: self.quantity,
            unit_price: self.unit_price,
            amount: self.amount,
        })
    }
}

/// `totalItems` is accepted for compatibility; the stored count is always
/// the number of submitted line items.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSummaryRequest {
    pub total_items: Option<i32>,
    pub sub_total: Decimal,
    pub tax: Decimal,
    pub grand_total: Decimal,
    #[serde(default)]
    pub is_paid: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    pub issue_date: String,
    pub due_date: String,
    #[validate(custom(function = "not_blank"))]
    pub subject: String,
    #[validate(range(min = 1, message = "customerId must be positive"))]
    pub customer_id: i64,
    #[validate(length(min = 1, message = "at least one invoice item is required"), nested)]
    pub invoice_items: Vec<InvoiceItemRequest>,
    #[validate(nested)]
    pub invoice_summary: InvoiceSummaryRequest,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EditInvoiceRequest {
    #[validate(length(min = 1, message = "invoiceId is required"))]
    pub invoice_id: String,
    pub issue_date: String,
    pub due_date: String,
    #[validate(custom(function = "not_blank"))]
    pub subject: String,
    #[validate(range(min = 1, message = "customerId must be positive"))]
    pub customer_id: i64,
    #[validate(length(min = 1, message = "at least one invoice item is required"), nested)]
    pub invoice_items: Vec<InvoiceItemRequest>,
    #[validate(nested)]
    pub invoice_summary: InvoiceSummaryRequest,
}

fn build_draft(
    issue_date: &str,
    due_date: &str,
    subject: String,
    customer_id: i64,
    items: Vec<InvoiceItemRequest>,
    summary: InvoiceSummaryRequest,
) -> Result<InvoiceDraft, InvoiceError> {
    let header = InvoiceHeader {
        issue_date: parse_date(issue_date, "issueDate")?,
        due_date: parse_date(due_date, "dueDate")?,
        subject,
        customer_id,
    };

    let items = items
        .into_iter()
        .map(InvoiceItemRequest::into_input)
        .collect::<Result<Vec<_>, _>>()?;

    let summary = SummaryValues {
        total_items: i32::try_from(items.len()).unwrap_or(i32::MAX),
        subtotal: summary.sub_total,
        tax: summary.tax,
        grand_total: summary.grand_total,
        is_paid: summary.is_paid,
    };

    Ok(InvoiceDraft {
        header,
        items,
        summary,
    })
}

impl CreateInvoiceRequest {
    pub fn into_draft(self) -> Result<InvoiceDraft, InvoiceError> {
        build_draft(
            &self.issue_date,
            &self.due_date,
            self.subject,
            self.customer_id,
            self.invoice_items,
            self.invoice_summary,
        )
    }
}

impl EditInvoiceRequest {
    /// The external code of the invoice to edit plus the replacement draft.
    pub fn into_parts(self) -> Result<(String, InvoiceDraft), InvoiceError> {
        let draft = build_draft(
            &self.issue_date,
            &self.due_date,
            self.subject,
            self.customer_id,
            self.invoice_items,
            self.invoice_summary,
        )?;
        Ok((self.invoice_id, draft))
    }
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceIdResponse {
    pub invoice_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceListItem {
    pub invoice_id: String,
    pub subject: String,
    pub customer_name: String,
    pub status: PaymentStatus,
    pub total_items: i32,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
}

impl From<InvoiceListRow> for InvoiceListItem {
    fn from(row: InvoiceListRow) -> Self {
        Self {
            invoice_id: row.invoice_code,
            subject: row.subject,
            customer_name: row.customer_name,
            status: PaymentStatus::from_paid_flag(row.is_paid),
            total_items: row.total_items,
            issue_date: row.issue_date,
            due_date: row.due_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerView {
    pub name: String,
    pub address: String,
    pub city: String,
    pub country: String,
    pub postcode: String,
}

impl From<Customer> for CustomerView {
    fn from(customer: Customer) -> Self {
        Self {
            name: customer.name,
            address: customer.address,
            city: customer.city,
            country: customer.country,
            postcode: customer.postcode,
        }
    }
}

/// A line item with its catalog name resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItemView {
    pub item_id: i64,
    pub name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryView {
    pub status: PaymentStatus,
    pub total_items: i32,
    pub sub_total: Decimal,
    pub tax: Decimal,
    pub grand_total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDetail {
    pub invoice_id: String,
    pub subject: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub customer: CustomerView,
    pub items: Vec<InvoiceItemView>,
    pub summary: SummaryView,
}
