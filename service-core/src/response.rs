//! Response envelopes shared by every HTTP endpoint.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;

pub const MESSAGE_SUCCESS: &str = "success";

/// `{status, message, data, errors}` wrapper returned by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: String,
    pub message: String,
    pub data: T,
    pub errors: Vec<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: StatusCode::OK.as_u16().to_string(),
            message: MESSAGE_SUCCESS.to_string(),
            data,
            errors: Vec::new(),
        }
    }
}

impl ApiResponse<Value> {
    /// Failure envelope: empty object payload, optional detail list.
    pub fn failure(status: StatusCode, message: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            status: status.as_u16().to_string(),
            message: message.into(),
            data: Value::Object(Default::default()),
            errors,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self
            .status
            .parse::<u16>()
            .ok()
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (status, Json(self)).into_response()
    }
}

/// Page metadata attached to every listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub total_pages: u64,
    pub total_items: u64,
    pub limit: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

impl Pagination {
    /// `page` is 1-indexed; `limit` must be non-zero (enforced by request validation).
    pub fn new(page: u32, limit: u32, total_items: u64) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            total_items.div_ceil(u64::from(limit))
        };

        Self {
            page,
            total_pages,
            total_items,
            limit,
            has_next: u64::from(page) < total_pages,
            has_previous: page > 1,
        }
    }
}

/// A page of results plus its metadata.
#[derive(Debug, Serialize)]
pub struct Paginated<T: Serialize> {
    pub results: Vec<T>,
    pub pagination: Pagination,
}
