//! Categories API endpoints.

use api_types::{
    Created,
    category::{CategoryNew, CategoryView},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use uuid::Uuid;

use crate::{ApiResult, created, ok, server::ServerState, user::CurrentUser};

fn map_category(category: engine::Category) -> CategoryView {
    CategoryView {
        id: category.id,
        name: category.name,
    }
}

pub async fn list(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
) -> ApiResult<Vec<CategoryView>> {
    let categories = state
        .engine
        .list_categories(&user_id)
        .await?
        .into_iter()
        .map(map_category)
        .collect();

    Ok(ok(categories))
}

pub async fn create(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Json(payload): Json<CategoryNew>,
) -> ApiResult<Created> {
    let id = state.engine.new_category(&user_id, &payload.name).await?;
    Ok(created(id))
}

pub async fn rename(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(category_id): Path<Uuid>,
    Json(payload): Json<CategoryNew>,
) -> ApiResult<()> {
    state
        .engine
        .rename_category(&user_id, category_id, &payload.name)
        .await?;
    Ok(ok(()))
}

/// Deletes a category; its transactions stay, uncategorized.
pub async fn remove(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(category_id): Path<Uuid>,
) -> ApiResult<()> {
    state.engine.delete_category(&user_id, category_id).await?;
    Ok(ok(()))
}
