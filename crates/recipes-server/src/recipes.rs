//! Recipe endpoints.
//!
//! Reads of the whole collection go through the listing cache. Single
//! reads and writes hit the store directly; each successful write then
//! invalidates the cached listing before the response is sent.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection, rejection::QueryRejection},
};
use recipes_api::{ApiError, ApiResult, MessageResponse};
use recipes_auth::SessionContext;
use recipes_core::{Recipe, RecipeDraft, RecipeId, filter_by_tag, now_utc};
use serde::Deserialize;
use tracing::info;

use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub tag: Option<String>,
}

fn parse_id(raw: &str) -> ApiResult<RecipeId> {
    Ok(raw.parse::<RecipeId>()?)
}

fn parse_draft(payload: Result<Json<RecipeDraft>, JsonRejection>) -> ApiResult<RecipeDraft> {
    let Json(draft) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    draft.validate()?;
    Ok(draft)
}

/// `GET /recipes`
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Recipe>>> {
    let recipes = state.listing.listing(state.storage.as_ref()).await?;
    Ok(Json(recipes))
}

/// `GET /recipes/search?tag=`
pub async fn search(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<Json<Vec<Recipe>>> {
    let Query(params) = params.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let tag = params
        .tag
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("query parameter 'tag' is required"))?;

    let recipes = state.listing.listing(state.storage.as_ref()).await?;
    Ok(Json(filter_by_tag(recipes, &tag)))
}

/// `GET /recipes/{id}`
pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Recipe>> {
    let id = parse_id(&id)?;
    state
        .storage
        .find_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("recipe {id} not found")))
}

/// `POST /recipes`
pub async fn create(
    State(state): State<AppState>,
    session: SessionContext,
    payload: Result<Json<RecipeDraft>, JsonRejection>,
) -> ApiResult<Json<Recipe>> {
    let draft = parse_draft(payload)?;
    let recipe = draft.into_recipe(RecipeId::generate(), now_utc());

    state.storage.insert(&recipe).await?;
    state.listing.invalidate().await?;

    info!(id = %recipe.id, user = %session.username, "recipe created");
    Ok(Json(recipe))
}

/// `PUT /recipes/{id}`
pub async fn update(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<String>,
    payload: Result<Json<RecipeDraft>, JsonRejection>,
) -> ApiResult<MessageResponse> {
    let id = parse_id(&id)?;
    let draft = parse_draft(payload)?;

    state.storage.update_fields(&id, &draft).await?;
    state.listing.invalidate().await?;

    info!(id = %id, user = %session.username, "recipe updated");
    Ok(MessageResponse::new("Recipe has been updated"))
}

/// `DELETE /recipes/{id}`
pub async fn delete(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<String>,
) -> ApiResult<MessageResponse> {
    let id = parse_id(&id)?;

    state.storage.delete(&id).await?;
    state.listing.invalidate().await?;

    info!(id = %id, user = %session.username, "recipe deleted");
    Ok(MessageResponse::new("Recipe deleted successfully"))
}
