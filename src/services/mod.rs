// gemstore/src/services/mod.rs

//! Business logic, one module per concern. Handlers stay thin; everything
//! that touches the database lives here.

pub mod auth_service;
pub mod cart_service;
pub mod catalog_service;
pub mod order_service;

use serde::Serialize;

/// Pagination metadata returned alongside any paged listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
  pub page: i64,
  pub limit: i64,
  pub total_items: i64,
  pub total_pages: i64,
}

impl Pagination {
  pub fn new(page: i64, limit: i64, total_items: i64) -> Self {
    let total_pages = if total_items == 0 { 0 } else { (total_items + limit - 1) / limit };
    Self { page, limit, total_items, total_pages }
  }
}

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

/// Clamps client-supplied paging parameters and derives the SQL offset.
pub(crate) fn page_window(page: Option<i64>, limit: Option<i64>) -> (i64, i64, i64) {
  let page = page.unwrap_or(1).max(1);
  let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
  (page, limit, (page - 1) * limit)
}
