//! Field monitoring handlers

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use shared::{GeoPoint, MoistureStressTier, PrecisionAlert};

use crate::error::{AppError, AppResult};
use crate::services::cache::{CacheStats, CachedAnalysis};
use crate::services::prescription::export_prescription_csv;
use crate::services::{MonitorFieldRequest, MonitoringResult};
use crate::AppState;

/// Body of a monitoring request; the field id comes from the path
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorFieldBody {
    pub geometry: Vec<GeoPoint>,
    #[serde(default)]
    pub crop_type: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub moisture_tier: Option<MoistureStressTier>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepResponse {
    pub removed: usize,
}

/// Run a monitoring cycle for a field
pub async fn monitor_field(
    State(state): State<AppState>,
    Path(field_id): Path<String>,
    Json(body): Json<MonitorFieldBody>,
) -> AppResult<Json<MonitoringResult>> {
    let request = MonitorFieldRequest {
        field_id,
        geometry: body.geometry,
        crop_type: body.crop_type,
        user_id: body.user_id,
        chat_id: body.chat_id,
        phone: body.phone,
        moisture_tier: body.moisture_tier,
    };

    let result = state.monitor.monitor_field(request).await?;
    Ok(Json(result))
}

/// Last cached analysis for a field
pub async fn get_analysis(
    State(state): State<AppState>,
    Path(field_id): Path<String>,
) -> AppResult<Json<CachedAnalysis>> {
    shared::validate_field_id(&field_id)?;

    let cached = state
        .monitor
        .cache()
        .analysis()
        .get(&field_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Analysis for field {}", field_id)))?;

    Ok(Json(cached))
}

/// Last cached alerts for a field
pub async fn get_alerts(
    State(state): State<AppState>,
    Path(field_id): Path<String>,
) -> AppResult<Json<Vec<PrecisionAlert>>> {
    shared::validate_field_id(&field_id)?;

    let alerts = state
        .monitor
        .cache()
        .alerts()
        .get(&field_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Alerts for field {}", field_id)))?;

    Ok(Json(alerts))
}

/// Variable-rate prescription as CSV
pub async fn get_prescription(
    State(state): State<AppState>,
    Path(field_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    shared::validate_field_id(&field_id)?;

    let cached = state
        .monitor
        .cache()
        .analysis()
        .get(&field_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Analysis for field {}", field_id)))?;

    let csv = export_prescription_csv(&cached.zones)?;
    let disposition = format!("attachment; filename=\"{}-prescription.csv\"", field_id);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}

pub async fn cache_stats(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.monitor.cache().stats().await)
}

/// Evict expired cache entries now
pub async fn sweep_cache(State(state): State<AppState>) -> Json<SweepResponse> {
    let removed = state.monitor.cache().sweep_expired().await;
    Json(SweepResponse { removed })
}
