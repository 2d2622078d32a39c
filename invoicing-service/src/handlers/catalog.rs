//! Customer and item catalog listings.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use service_core::error::AppError;
use service_core::response::{ApiResponse, Paginated};

use crate::dtos::catalog::{ListCustomersParams, ListItemsParams};
use crate::handlers::validated_query;
use crate::models::{CatalogItem, Customer};
use crate::startup::AppState;

/// GET /v1/customers
pub async fn list_customers(
    State(state): State<AppState>,
    params: Result<Query<ListCustomersParams>, QueryRejection>,
) -> Result<ApiResponse<Paginated<Customer>>, AppError> {
    let page = validated_query(params)?.page_request();
    let listing = state.catalog.list_customers(page).await?;
    Ok(ApiResponse::success(listing))
}

/// GET /v1/items
pub async fn list_items(
    State(state): State<AppState>,
    params: Result<Query<ListItemsParams>, QueryRejection>,
) -> Result<ApiResponse<Paginated<CatalogItem>>, AppError> {
    let (filter, page) = validated_query(params)?.into_parts();
    let listing = state.catalog.list_items(&filter, page).await?;
    Ok(ApiResponse::success(listing))
}
