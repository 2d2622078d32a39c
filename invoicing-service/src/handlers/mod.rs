pub mod catalog;
pub mod health;
pub mod invoices;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Query};
use service_core::error::{AppError, MESSAGE_BAD_REQUEST};
use validator::Validate;

/// Unwraps a JSON body and runs its field validation.
pub(crate) fn validated_json<T: Validate>(
    payload: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let Json(body) = payload.map_err(|rejection| {
        tracing::warn!(error = %rejection.body_text(), "Rejected request body");
        AppError::BadRequest(anyhow::anyhow!(MESSAGE_BAD_REQUEST))
    })?;
    body.validate()?;
    Ok(body)
}

/// Unwraps query parameters and runs their field validation.
pub(crate) fn validated_query<T: Validate>(
    params: Result<Query<T>, QueryRejection>,
) -> Result<T, AppError> {
    let Query(params) = params.map_err(|rejection| {
        tracing::warn!(error = %rejection.body_text(), "Rejected query string");
        AppError::BadRequest(anyhow::anyhow!(MESSAGE_BAD_REQUEST))
    })?;
    params.validate()?;
    Ok(params)
}
