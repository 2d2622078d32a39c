use serde::Deserialize;
use validator::Validate;

use crate::models::CatalogItemFilter;
use crate::services::query::PageRequest;

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ListCustomersParams {
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 1000, message = "limit must be between 1 and 1000"))]
    pub limit: Option<u32>,
}

impl ListCustomersParams {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ListItemsParams {
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    pub name: Option<String>,
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 1000, message = "limit must be between 1 and 1000"))]
    pub limit: Option<u32>,
}

impl ListItemsParams {
    pub fn into_parts(self) -> (CatalogItemFilter, PageRequest) {
        let page = PageRequest::new(self.page, self.limit);
        (
            CatalogItemFilter {
                item_type: self.item_type,
                name: self.name,
            },
            page,
        )
    }
}
