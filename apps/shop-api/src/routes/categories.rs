//! `GET /api/categories`

use axum::extract::State;
use axum::Json;
use shop_core::Category;

use crate::error::ApiResult;
use crate::AppState;

/// All categories, ordered by name.
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    let categories = state.db.categories().list().await?;
    Ok(Json(categories))
}
