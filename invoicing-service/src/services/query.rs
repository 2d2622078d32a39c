//! Filter/query engine for the invoice listing.
//!
//! An [`InvoiceFilter`] is translated once into a list of [`Predicate`]s. The
//! same list is rendered into the listing query and its count query, and is
//! also what the in-process store matches rows against, so the returned page
//! and the reported total can never disagree about which rows qualify.

use chrono::NaiveDate;
use sqlx::{Postgres, QueryBuilder};

use crate::models::{InvoiceListRow, PaymentStatus};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

const INVOICE_LIST_FROM: &str = " FROM invoices i \
     JOIN invoice_summary s ON s.invoice_id = i.id AND s.deleted_utc IS NULL \
     JOIN customers c ON c.id = i.customer_id \
     WHERE i.deleted_utc IS NULL";

const INVOICE_LIST_COLUMNS: &str = "SELECT i.id, i.invoice_code, i.subject, i.issue_date, \
     i.due_date, c.name AS customer_name, s.total_items, s.is_paid";

/// 1-indexed page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(DEFAULT_PAGE).max(1),
            limit: limit.unwrap_or(DEFAULT_LIMIT).max(1),
        }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Caller-facing listing filter. Every field is optional and they combine with AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvoiceFilter {
    pub invoice_code: Option<String>,
    pub subject: Option<String>,
    pub customer_name: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub total_items: Option<i32>,
    pub status: Option<PaymentStatus>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    CodeEquals(String),
    SubjectContains(String),
    IssueDate(NaiveDate),
    DueDate(NaiveDate),
    TotalItems(i32),
    Paid(bool),
    CustomerNameContains(String),
}

impl InvoiceFilter {
    /// Empty strings are treated as absent.
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();

        if let Some(code) = non_empty(&self.invoice_code) {
            predicates.push(Predicate::CodeEquals(code.to_string()));
        }
        if let Some(subject) = non_empty(&self.subject) {
            predicates.push(Predicate::SubjectContains(subject.to_string()));
        }
        if let Some(date) = self.issue_date {
            predicates.push(Predicate::IssueDate(date));
        }
        if let Some(date) = self.due_date {
            predicates.push(Predicate::DueDate(date));
        }
        if let Some(total) = self.total_items {
            predicates.push(Predicate::TotalItems(total));
        }
        if let Some(status) = self.status {
            predicates.push(Predicate::Paid(status.is_paid()));
        }
        if let Some(name) = non_empty(&self.customer_name) {
            predicates.push(Predicate::CustomerNameContains(name.to_string()));
        }

        predicates
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl Predicate {
    fn push_sql(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        match self {
            Predicate::CodeEquals(code) => {
                builder.push(" AND i.invoice_code = ").push_bind(code.clone());
            }
            Predicate::SubjectContains(subject) => {
                builder
                    .push(" AND i.subject ILIKE ")
                    .push_bind(like_pattern(subject));
            }
            Predicate::IssueDate(date) => {
                builder.push(" AND i.issue_date = ").push_bind(*date);
            }
            Predicate::DueDate(date) => {
                builder.push(" AND i.due_date = ").push_bind(*date);
            }
            Predicate::TotalItems(total) => {
                builder.push(" AND s.total_items = ").push_bind(*total);
            }
            Predicate::Paid(is_paid) => {
                builder.push(" AND s.is_paid = ").push_bind(*is_paid);
            }
            Predicate::CustomerNameContains(name) => {
                builder.push(" AND c.name ILIKE ").push_bind(like_pattern(name));
            }
        }
    }

    /// In-process evaluation with the same semantics as the rendered SQL.
    pub fn matches(&self, row: &InvoiceListRow) -> bool {
        match self {
            Predicate::CodeEquals(code) => row.invoice_code == *code,
            Predicate::SubjectContains(subject) => contains_ignore_case(&row.subject, subject),
            Predicate::IssueDate(date) => row.issue_date == *date,
            Predicate::DueDate(date) => row.due_date == *date,
            Predicate::TotalItems(total) => row.total_items == *total,
            Predicate::Paid(is_paid) => row.is_paid == *is_paid,
            Predicate::CustomerNameContains(name) => {
                contains_ignore_case(&row.customer_name, name)
            }
        }
    }
}

pub fn matches_all(predicates: &[Predicate], row: &InvoiceListRow) -> bool {
    predicates.iter().all(|p| p.matches(row))
}

pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// `%needle%` with LIKE metacharacters in the user input escaped.
pub fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn push_predicates(builder: &mut QueryBuilder<'_, Postgres>, predicates: &[Predicate]) {
    for predicate in predicates {
        predicate.push_sql(builder);
    }
}

/// Paginated listing over invoice ⋈ summary ⋈ customer, most recent first.
pub fn listing_query(predicates: &[Predicate], page: PageRequest) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(INVOICE_LIST_COLUMNS);
    builder.push(INVOICE_LIST_FROM);
    push_predicates(&mut builder, predicates);
    builder
        .push(" ORDER BY i.id DESC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    builder
}

pub fn count_query(predicates: &[Predicate]) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*)");
    builder.push(INVOICE_LIST_FROM);
    push_predicates(&mut builder, predicates);
    builder
}
