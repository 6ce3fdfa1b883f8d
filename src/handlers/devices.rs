use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::engine::catalog;
use crate::models::{CreateDeviceGroupRequest, CreateDeviceRequest, Device, DeviceGroup};
use crate::AppState;

use super::{created, ApiError};

// ========== Device Groups ==========

pub async fn list_device_groups(State(state): State<Arc<AppState>>) -> Json<Vec<DeviceGroup>> {
    Json(state.store.snapshot().await.device_groups.clone())
}

pub async fn create_device_group(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateDeviceGroupRequest>,
) -> Result<(StatusCode, Json<DeviceGroup>), ApiError> {
    let group = state.store.apply(|s| catalog::create_device_group(s, &req)).await?;
    Ok(created(group))
}

// ========== Devices ==========

pub async fn list_devices(State(state): State<Arc<AppState>>) -> Json<Vec<Device>> {
    Json(state.store.snapshot().await.devices.clone())
}

pub async fn create_device(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateDeviceRequest>,
) -> Result<(StatusCode, Json<Device>), ApiError> {
    let device = state.store.apply(|s| catalog::create_device(s, &req)).await?;
    tracing::info!("Registered device {} in group {}", device.hostname, device.device_group);
    Ok(created(device))
}
