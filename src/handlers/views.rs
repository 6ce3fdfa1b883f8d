use axum::{extract::State, Json};
use std::sync::Arc;

use crate::engine::compositor::compose_view;
use crate::engine::membership::resolve_label;
use crate::models::{ComposedView, LabelRequest, Selection, SourceLabel, TemplateStack};
use crate::AppState;

/// Compose the effective view for a selection
pub async fn compose(State(state): State<Arc<AppState>>, Json(selection): Json<Selection>) -> Json<ComposedView> {
    let snapshot = state.store.snapshot().await;
    let view = compose_view(&snapshot, &selection, &state.config.fallback_stack_label);
    tracing::debug!("Composed {:?} view with {} row(s)", view.mode, view.rows().count());
    Json(view)
}

/// Which stack an object owned by `source_template_id` is presented under
pub async fn label(State(state): State<Arc<AppState>>, Json(req): Json<LabelRequest>) -> Json<SourceLabel> {
    let snapshot = state.store.snapshot().await;
    let candidates: Vec<&TemplateStack> = match &req.stacks {
        Some(ids) => ids.iter().filter_map(|id| snapshot.stack(id)).collect(),
        None => snapshot.stacks.iter().collect(),
    };
    let hints: Vec<&str> = req.hints.iter().map(String::as_str).collect();
    Json(resolve_label(
        &req.source_template_id,
        &candidates,
        &hints,
        &state.config.fallback_stack_label,
    ))
}
