//! Domain error taxonomy and its translation to HTTP errors.

use std::fmt::Display;

use service_core::error::AppError;
use thiserror::Error;

use crate::services::metrics::ERRORS_TOTAL;

#[derive(Debug, Error)]
pub enum InvoiceError {
    #[error("data customers not found")]
    CustomerNotFound,

    #[error("data invoice not found")]
    InvoiceNotFound,

    #[error("data invoice summary not found")]
    SummaryNotFound,

    #[error("data invoice items not found")]
    ItemsNotFound,

    #[error("data items not found")]
    CatalogItemNotFound,

    #[error("there is invalid items")]
    InvalidItems,

    #[error("invalid {field}, expected YYYY-MM-DD")]
    InvalidDate { field: &'static str },

    #[error("quantity must be greater than zero")]
    InvalidQuantity,

    #[error("invoice code already allocated")]
    DuplicateCode,

    /// A transactional step failed or affected fewer rows than expected.
    #[error("something went wrong [{code}]")]
    Transaction { step: &'static str, code: u8 },

    #[error("something went wrong [{code}]")]
    Unknown { code: u8 },
}

impl InvoiceError {
    pub fn error_type(&self) -> &'static str {
        match self {
            InvoiceError::CustomerNotFound
            | InvoiceError::InvoiceNotFound
            | InvoiceError::SummaryNotFound
            | InvoiceError::ItemsNotFound
            | InvoiceError::CatalogItemNotFound => "not_found",
            InvoiceError::InvalidItems
            | InvoiceError::InvalidDate { .. }
            | InvoiceError::InvalidQuantity => "validation",
            InvoiceError::DuplicateCode => "conflict",
            InvoiceError::Transaction { .. } => "transaction",
            InvoiceError::Unknown { .. } => "unknown",
        }
    }
}

/// A labelled, numbered point in an operation. The number is the only part
/// of a failure callers ever see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub label: &'static str,
    pub code: u8,
}

impl Step {
    pub const fn new(label: &'static str, code: u8) -> Self {
        Self { label, code }
    }

    /// Logs `err` against this step and returns the transaction failure.
    pub fn fail(self, err: impl Display) -> InvoiceError {
        tracing::error!(step = self.label, code = self.code, error = %err, "Invoice write step failed");
        InvoiceError::Transaction {
            step: self.label,
            code: self.code,
        }
    }

    /// Logs `err` against this step and returns the generic read failure.
    pub fn unknown(self, err: impl Display) -> InvoiceError {
        tracing::error!(step = self.label, code = self.code, error = %err, "Invoice read step failed");
        InvoiceError::Unknown { code: self.code }
    }
}

impl From<InvoiceError> for AppError {
    fn from(err: InvoiceError) -> Self {
        ERRORS_TOTAL.with_label_values(&[err.error_type()]).inc();

        let message = anyhow::anyhow!(err.to_string());
        match err {
            InvoiceError::CustomerNotFound
            | InvoiceError::InvoiceNotFound
            | InvoiceError::SummaryNotFound
            | InvoiceError::ItemsNotFound
            | InvoiceError::CatalogItemNotFound => AppError::NotFound(message),
            InvoiceError::InvalidItems
            | InvoiceError::InvalidDate { .. }
            | InvoiceError::InvalidQuantity => AppError::BadRequest(message),
            InvoiceError::DuplicateCode => AppError::Conflict(message),
            InvoiceError::Transaction { .. } | InvoiceError::Unknown { .. } => {
                AppError::InternalError(message)
            }
        }
    }
}
