use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::engine::catalog;
use crate::models::*;
use crate::AppState;

use super::{created, ApiError};

/// List all templates
pub async fn list_templates(State(state): State<Arc<AppState>>) -> Json<Vec<Template>> {
    Json(state.store.snapshot().await.templates.clone())
}

/// Get a single template by ID
pub async fn get_template(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Template>, ApiError> {
    let snapshot = state.store.snapshot().await;
    let template = snapshot
        .template(&id)
        .cloned()
        .ok_or_else(|| ApiError::not_found("template"))?;
    Ok(Json(template))
}

/// Create a new template
pub async fn create_template(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<Template>), ApiError> {
    let template = state.store.apply(|s| catalog::create_template(s, &req)).await?;
    tracing::info!("Created template {} ({})", template.name, template.id);
    Ok(created(template))
}

/// Update an existing template's name and description
pub async fn update_template(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<CreateTemplateRequest>,
) -> Result<Json<Template>, ApiError> {
    let template = state.store.apply(|s| catalog::update_template(s, &id, &req)).await?;
    Ok(Json(template))
}

/// Delete a template
pub async fn delete_template(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .apply(|s| catalog::delete_template(s, &id).map(|next| (next, ())))
        .await?;
    tracing::info!("Deleted template {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Which objects reference each of the template's variables
pub async fn get_usages(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TemplateUsageReport>, ApiError> {
    let snapshot = state.store.snapshot().await;
    Ok(Json(catalog::template_usages(&snapshot, &id)?))
}

// ========== Variable Definitions ==========

pub async fn add_variable(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(def): Json<VariableDefinition>,
) -> Result<(StatusCode, Json<Template>), ApiError> {
    let template = state
        .store
        .apply(|s| catalog::add_variable_definition(s, &id, def))
        .await?;
    Ok(created(template))
}

pub async fn edit_variable(
    State(state): State<Arc<AppState>>,
    Path((id, name)): Path<(String, String)>,
    Json(def): Json<VariableDefinition>,
) -> Result<Json<Template>, ApiError> {
    let template = state
        .store
        .apply(|s| catalog::edit_variable_definition(s, &id, &name, def))
        .await?;
    Ok(Json(template))
}

pub async fn delete_variable(
    State(state): State<Arc<AppState>>,
    Path((id, name)): Path<(String, String)>,
) -> Result<Json<Template>, ApiError> {
    let template = state
        .store
        .apply(|s| catalog::delete_variable_definition(s, &id, &name))
        .await?;
    Ok(Json(template))
}

/// Scan raw field values for `$name` references and register them
pub async fn extract_variables(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ExtractVariablesRequest>,
) -> Result<Json<Template>, ApiError> {
    let template = state
        .store
        .apply(|s| catalog::extract_variables(s, &id, &req))
        .await?;
    Ok(Json(template))
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::{app, send};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_template_lifecycle() {
        let app = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/templates",
            Some(json!({"id": "lab", "name": "Lab Template"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], "lab");

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/templates",
            Some(json!({"id": "lab", "name": "Again"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/templates/lab/variables",
            Some(json!({"name": "$mgmt_ip", "type": "IP Netmask", "default_value": "192.0.2.10/24"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["variables"][0]["name"], "$mgmt_ip");

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/templates/lab/variables",
            Some(json!({"name": "$bad", "type": "IP Netmask", "default_value": "nope"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/templates/lab/variables/extract",
            Some(json!({"origin": "lab interface", "fields": {"ip": "$lab_ip", "hostname": "$lab_fqdn"}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["variables"].as_array().unwrap().len(), 3);

        let (status, _) = send(&app, Method::DELETE, "/api/templates/lab", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(&app, Method::GET, "/api/templates/lab", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "template not found");
    }

    #[tokio::test]
    async fn test_usages_unknown_template() {
        let (status, _) = send(&app(), Method::GET, "/api/templates/ghost/usages", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
