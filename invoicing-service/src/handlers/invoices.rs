//! Invoice HTTP handlers.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Path, Query, State};
use service_core::error::AppError;
use service_core::response::{ApiResponse, Paginated};

use crate::dtos::invoices::{
    CreateInvoiceRequest, EditInvoiceRequest, InvoiceDetail, InvoiceIdResponse, InvoiceListItem,
    ListInvoicesParams,
};
use crate::handlers::{validated_json, validated_query};
use crate::startup::AppState;

/// GET /v1/invoices
pub async fn list_invoices(
    State(state): State<AppState>,
    params: Result<Query<ListInvoicesParams>, QueryRejection>,
) -> Result<ApiResponse<Paginated<InvoiceListItem>>, AppError> {
    let (filter, page) = validated_query(params)?.into_parts()?;
    let listing = state.invoices.list_invoices(&filter, page).await?;
    Ok(ApiResponse::success(listing))
}

/// GET /v1/invoices/:invoice_id
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<String>,
) -> Result<ApiResponse<InvoiceDetail>, AppError> {
    let detail = state.invoices.get_invoice_detail(&invoice_id).await?;
    Ok(ApiResponse::success(detail))
}

/// POST /v1/invoices
pub async fn create_invoice(
    State(state): State<AppState>,
    payload: Result<Json<CreateInvoiceRequest>, JsonRejection>,
) -> Result<ApiResponse<InvoiceIdResponse>, AppError> {
    let draft = validated_json(payload)?.into_draft()?;
    let invoice_id = state.invoices.create_invoice(draft).await?;
    Ok(ApiResponse::success(InvoiceIdResponse { invoice_id }))
}

/// PATCH /v1/invoices
pub async fn edit_invoice(
    State(state): State<AppState>,
    payload: Result<Json<EditInvoiceRequest>, JsonRejection>,
) -> Result<ApiResponse<InvoiceIdResponse>, AppError> {
    let (invoice_code, draft) = validated_json(payload)?.into_parts()?;
    let invoice_id = state.invoices.edit_invoice(&invoice_code, draft).await?;
    Ok(ApiResponse::success(InvoiceIdResponse { invoice_id }))
}

/// DELETE /v1/invoices/:invoice_id
pub async fn delete_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<String>,
) -> Result<ApiResponse<String>, AppError> {
    state.invoices.delete_invoice(&invoice_id).await?;
    Ok(ApiResponse::success(format!(
        "success delete invoice data with id {}",
        invoice_id
    )))
}
