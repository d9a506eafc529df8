//! Catalog home page

use axum::{extract::State, Json};

use crate::{error::AppResult, services::catalog::IndexStats, AppState};

/// Counts of books, copies, authors and genres
#[utoipa::path(
    get,
    path = "/catalog/",
    tag = "catalog",
    responses(
        (status = 200, description = "Catalog statistics", body = IndexStats)
    )
)]
pub async fn index(State(state): State<AppState>) -> AppResult<Json<IndexStats>> {
    let stats = state.services.catalog.index_stats().await?;
    Ok(Json(stats))
}
