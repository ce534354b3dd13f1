//! WebAssembly module for Field Health Intelligence
//!
//! Provides offline, client-side evaluation for:
//! - Field area
//! - Field health analysis from cached statistics
//! - Geometry-only fallback estimates
//! - Alert rules and variable-rate zones
//!
//! Structured values cross the boundary as JSON strings.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use shared::engine::{AlertEvaluator, FallbackEstimator, FieldHealthAnalyzer, ZoneGenerator};
use shared::{
    CropType, FieldGeometry, FieldHealthAnalysis, GeoPoint, MoistureStressTier, PrecisionAlert,
    VariableRateZone, VegetationStatistics,
};

fn log_error(message: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::error_1(&JsValue::from_str(message));
    #[cfg(not(target_arch = "wasm32"))]
    let _ = message;
}

/// Errors stay plain strings until they cross into JavaScript
fn into_js(message: String) -> JsValue {
    log_error(&message);
    JsValue::from_str(&message)
}

fn describe(context: &str, err: impl std::fmt::Display) -> String {
    format!("{}: {}", context, err)
}

fn parse_geometry(geometry_json: &str) -> Result<FieldGeometry, String> {
    let points: Vec<GeoPoint> =
        serde_json::from_str(geometry_json).map_err(|e| describe("Invalid geometry JSON", e))?;
    FieldGeometry::new(points).map_err(|e| describe("Invalid geometry", e))
}

fn parse_tier(tier: Option<String>) -> Result<Option<MoistureStressTier>, String> {
    tier.filter(|t| !t.trim().is_empty())
        .map(|t| t.parse::<MoistureStressTier>())
        .transpose()
        .map_err(|e| describe("Invalid moisture tier", e))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| describe("Serialization failed", e))
}

/// Planar area of a field in square degrees
#[wasm_bindgen]
pub fn field_area(geometry_json: &str) -> Result<f64, JsValue> {
    Ok(parse_geometry(geometry_json).map_err(into_js)?.area())
}

/// Analyze NDVI statistics; `seed` makes problem-area sampling repeatable
#[wasm_bindgen]
pub fn analyze_field(geometry_json: &str, stats_json: &str, seed: u32) -> Result<String, JsValue> {
    analyze(geometry_json, stats_json, seed).map_err(into_js)
}

fn analyze(geometry_json: &str, stats_json: &str, seed: u32) -> Result<String, String> {
    let geometry = parse_geometry(geometry_json)?;
    let stats: VegetationStatistics =
        serde_json::from_str(stats_json).map_err(|e| describe("Invalid statistics JSON", e))?;

    let mut rng = StdRng::seed_from_u64(u64::from(seed));
    let analysis = FieldHealthAnalyzer::default()
        .analyze(&geometry, &stats, &mut rng)
        .map_err(|e| describe("Analysis failed", e))?;

    to_json(&analysis)
}

/// Geometry-only estimate for when no statistics are cached
#[wasm_bindgen]
pub fn estimate_fallback(geometry_json: &str, reason: &str) -> Result<String, JsValue> {
    let geometry = parse_geometry(geometry_json).map_err(into_js)?;
    to_json(&FallbackEstimator::default().estimate(&geometry, reason)).map_err(into_js)
}

/// Harvest timing alerts for a crop at the given NDVI
#[wasm_bindgen]
pub fn check_harvest_timing(field_id: &str, ndvi: f64, crop: &str) -> Result<String, JsValue> {
    let alerts = AlertEvaluator::default()
        .check_harvest_timing(field_id, ndvi, &CropType::parse(crop))
        .map_err(|e| into_js(describe("Harvest check failed", e)))?;
    to_json(&alerts).map_err(into_js)
}

/// Moisture stress tier for an NDMI mean
#[wasm_bindgen]
pub fn classify_moisture_tier(ndmi_mean: f64) -> String {
    let tier = MoistureStressTier::from_ndmi(ndmi_mean);
    serde_json::to_value(tier)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Evaluation {
    zones: Vec<VariableRateZone>,
    alerts: Vec<PrecisionAlert>,
}

/// Zones and every alert rule for a previously computed analysis
#[wasm_bindgen]
pub fn evaluate_alerts(
    field_id: &str,
    analysis_json: &str,
    ndvi: f64,
    crop: &str,
    moisture_tier: Option<String>,
) -> Result<String, JsValue> {
    evaluate(field_id, analysis_json, ndvi, crop, moisture_tier).map_err(into_js)
}

fn evaluate(
    field_id: &str,
    analysis_json: &str,
    ndvi: f64,
    crop: &str,
    moisture_tier: Option<String>,
) -> Result<String, String> {
    let analysis: FieldHealthAnalysis =
        serde_json::from_str(analysis_json).map_err(|e| describe("Invalid analysis JSON", e))?;
    let tier = parse_tier(moisture_tier)?;

    let zones = ZoneGenerator::default().generate(&analysis, tier);
    let alerts = AlertEvaluator::default().evaluate(
        field_id,
        &analysis,
        ndvi,
        &CropType::parse(crop),
        tier,
        &zones,
    );

    to_json(&Evaluation { zones, alerts })
}
