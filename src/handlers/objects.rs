use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::engine::catalog;
use crate::models::{ConfigRecord, ObjectKind, OwnerQuery, SaveObjectRequest};
use crate::AppState;

use super::ApiError;

/// Save a configuration object from an editing context. Variables the
/// object references are registered against its template in the same write.
pub async fn save_object(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SaveObjectRequest>,
) -> Result<Json<ConfigRecord>, ApiError> {
    let saved = state
        .store
        .apply(|s| catalog::save_config_object(s, req.object, &req.owner))
        .await?;
    tracing::debug!("Saved {} {} from {}", saved.kind().label(), saved.object().id(), req.owner);
    Ok(Json(saved))
}

pub async fn delete_object(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(ObjectKind, String)>,
    Query(query): Query<OwnerQuery>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .apply(|s| catalog::delete_config_object(s, kind, &id, &query.owner).map(|next| (next, ())))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
