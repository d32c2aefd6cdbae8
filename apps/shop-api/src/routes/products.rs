//! Catalog endpoints.
//!
//! - `GET /api/products` - filtered, sorted, paginated listing
//! - `GET /api/products/{id}` - one product

use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use shop_core::validation::{
    validate_page, validate_page_size, validate_price_filter, validate_search_query, validate_sort,
};
use shop_core::{Money, Product};
use shop_db::ProductQuery;
use ts_rs::TS;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Raw query of `GET /api/products`, validated into a [`ProductQuery`].
#[derive(Debug, Default, Deserialize)]
pub struct ProductListParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub category_id: Option<i64>,
    pub price_min: Option<Money>,
    pub price_max: Option<Money>,
    pub sort: Option<String>,
    pub q: Option<String>,
}

impl ProductListParams {
    fn into_query(self) -> Result<ProductQuery, ApiError> {
        Ok(ProductQuery {
            category_id: self.category_id,
            price_min: validate_price_filter("price_min", self.price_min)?,
            price_max: validate_price_filter("price_max", self.price_max)?,
            search: validate_search_query(self.q.as_deref())?,
            sort: validate_sort(self.sort.as_deref())?,
            page: validate_page(self.page)?,
            page_size: validate_page_size(self.page_size)?,
        })
    }
}

/// One page of the catalog.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct ProductListResponse {
    pub items: Vec<Product>,
    pub page: i64,
    pub page_size: i64,
    /// Matches across all pages
    pub total: i64,
}

/// `GET /api/products`
pub async fn list_products(
    State(state): State<AppState>,
    params: Result<Query<ProductListParams>, QueryRejection>,
) -> ApiResult<Json<ProductListResponse>> {
    let Query(params) = params?;
    let query = params.into_query()?;

    let page = state.db.products().list(&query).await?;

    Ok(Json(ProductListResponse {
        items: page.items,
        page: query.page,
        page_size: query.page_size,
        total: page.total,
    }))
}

/// `GET /api/products/{id}`
pub async fn get_product(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Product>> {
    let Path(id) = id?;

    state
        .db
        .products()
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product", &id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_core::ProductSort;

    #[test]
    fn test_defaults() {
        let query = ProductListParams::default().into_query().unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, shop_core::DEFAULT_PAGE_SIZE);
        assert_eq!(query.sort, ProductSort::Newest);
        assert!(query.search.is_none());
    }

    #[test]
    fn test_invalid_page_size_rejected() {
        let params = ProductListParams {
            page_size: Some(101),
            ..Default::default()
        };
        let err = params.into_query().unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_unknown_sort_rejected() {
        let params = ProductListParams {
            sort: Some("name".to_string()),
            ..Default::default()
        };
        assert!(params.into_query().is_err());
    }
}
