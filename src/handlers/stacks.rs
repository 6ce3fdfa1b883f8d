use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::engine::catalog;
use crate::engine::resolution::{resolve_all, resolve_variable, ResolutionScope};
use crate::models::*;
use crate::AppState;

use super::{created, ApiError};

// ========== Stack CRUD ==========

pub async fn list_stacks(State(state): State<Arc<AppState>>) -> Json<Vec<TemplateStack>> {
    Json(state.store.snapshot().await.stacks.clone())
}

pub async fn get_stack(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TemplateStack>, ApiError> {
    let snapshot = state.store.snapshot().await;
    let stack = snapshot
        .stack(&id)
        .cloned()
        .ok_or_else(|| ApiError::not_found("stack"))?;
    Ok(Json(stack))
}

pub async fn create_stack(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateStackRequest>,
) -> Result<(StatusCode, Json<TemplateStack>), ApiError> {
    let stack = state.store.apply(|s| catalog::create_stack(s, &req)).await?;
    tracing::info!("Created stack {} with {} template(s)", stack.name, stack.templates.len());
    Ok(created(stack))
}

pub async fn update_stack(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<CreateStackRequest>,
) -> Result<Json<TemplateStack>, ApiError> {
    let stack = state.store.apply(|s| catalog::update_stack(s, &id, &req)).await?;
    Ok(Json(stack))
}

pub async fn delete_stack(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .apply(|s| catalog::delete_stack(s, &id).map(|next| (next, ())))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ========== Stack Variables ==========

/// Set a stack-level value for a variable; an empty value clears it
pub async fn set_variable(
    State(state): State<Arc<AppState>>,
    Path((id, name)): Path<(String, String)>,
    Json(req): Json<SetMappingRequest>,
) -> Result<Json<TemplateStack>, ApiError> {
    let stack = state
        .store
        .apply(|s| catalog::set_stack_variable_mapping(s, &id, &name, &req.value))
        .await?;
    Ok(Json(stack))
}

/// Every variable visible in the stack, with its resolution layers
pub async fn resolve_variables(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ResolvedVariablesResponse>, ApiError> {
    let snapshot = state.store.snapshot().await;
    let stack = snapshot.stack(&id).ok_or_else(|| ApiError::not_found("stack"))?;
    Ok(Json(resolve_all(&ResolutionScope::stack(&snapshot, stack))))
}

/// One variable resolved in the stack's scope
pub async fn resolve_one(
    State(state): State<Arc<AppState>>,
    Path((id, name)): Path<(String, String)>,
) -> Result<Json<ResolvedVariable>, ApiError> {
    let snapshot = state.store.snapshot().await;
    let stack = snapshot.stack(&id).ok_or_else(|| ApiError::not_found("stack"))?;
    Ok(Json(resolve_variable(&name, &ResolutionScope::stack(&snapshot, stack))))
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::{app, send};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_mapping_then_resolve() {
        let app = app();
        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/stacks/edge-stack/variables/$wan_ip",
            Some(json!({"value": "198.51.100.2/30"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, Method::GET, "/api/stacks/edge-stack/variables/$wan_ip", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["value"], "198.51.100.2/30");
        assert_eq!(body["source"], "stack");

        let (status, body) = send(&app, Method::GET, "/api/stacks/edge-stack/variables/resolved", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["variables"]["$wan_ip"], "198.51.100.2/30");
    }

    #[tokio::test]
    async fn test_mapping_type_checked() {
        let (status, body) = send(
            &app(),
            Method::PUT,
            "/api/stacks/edge-stack/variables/$wan_ip",
            Some(json!({"value": "not an address"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("$wan_ip"));
    }

    #[tokio::test]
    async fn test_unknown_variable_has_no_definition() {
        let (status, body) = send(&app(), Method::GET, "/api/stacks/edge-stack/variables/$nothing", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "unset");
        assert_eq!(body["tooltip"], "no definition found");
    }

    #[tokio::test]
    async fn test_stack_with_unknown_template_rejected() {
        let (status, _) = send(
            &app(),
            Method::POST,
            "/api/stacks",
            Some(json!({"name": "Broken", "templates": ["ghost"]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
