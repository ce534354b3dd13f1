//! Vegetation statistics API client
//!
//! Requests per-interval index statistics over a field polygon. Response bodies
//! are walked defensively: every nested level is checked before it is read, and
//! anything unexpected is reported as a malformed response so the caller can
//! fall back to the geometry-only estimate.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use shared::{FieldGeometry, TimeRange, VegetationIndex, VegetationStatistics};
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Source of vegetation index statistics
#[async_trait]
pub trait StatisticsProvider: Send + Sync {
    /// Fetch aggregate statistics of `index` over `geometry` within `range`
    async fn fetch_vegetation_stats(
        &self,
        geometry: &FieldGeometry,
        range: &TimeRange,
        index: VegetationIndex,
    ) -> AppResult<VegetationStatistics>;

    /// Cheap reachability check used for connectivity tracking
    async fn probe(&self) -> AppResult<()> {
        Ok(())
    }
}

/// HTTP client for the statistics API
#[derive(Clone)]
pub struct StatisticsClient {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

/// Request body for a statistics query
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatisticsRequest<'a> {
    geometry: GeoJsonPolygon,
    time_range: &'a TimeRange,
    index: VegetationIndex,
    aggregation_interval: &'static str,
}

#[derive(Debug, Serialize)]
struct GeoJsonPolygon {
    #[serde(rename = "type")]
    kind: &'static str,
    coordinates: Vec<Vec<[f64; 2]>>,
}

impl StatisticsClient {
    /// Create a new StatisticsClient
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("HTTP client build failed: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn map_transport_error(&self, e: reqwest::Error) -> AppError {
        if e.is_timeout() {
            AppError::ProviderTimeout(self.timeout.as_millis() as u64)
        } else {
            AppError::ProviderUnavailable(format!("request failed: {}", e))
        }
    }
}

#[async_trait]
impl StatisticsProvider for StatisticsClient {
    async fn fetch_vegetation_stats(
        &self,
        geometry: &FieldGeometry,
        range: &TimeRange,
        index: VegetationIndex,
    ) -> AppResult<VegetationStatistics> {
        let url = format!("{}/statistics", self.base_url);
        let request = StatisticsRequest {
            geometry: GeoJsonPolygon {
                kind: "Polygon",
                coordinates: vec![geometry.to_geojson_ring()],
            },
            time_range: range,
            index,
            aggregation_interval: "P1D",
        };

        tracing::debug!(%index, "Requesting vegetation statistics");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ProviderUnavailable(format!(
                "statistics API error: {} - {}",
                status, body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::MalformedProviderResponse(format!("invalid JSON: {}", e)))?;

        extract_statistics(&body, index)
    }

    async fn probe(&self) -> AppResult<()> {
        // Any HTTP answer means the provider is reachable
        self.client
            .head(&self.base_url)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| self.map_transport_error(e))
    }
}

/// Pull the most recent interval's statistics for `index` out of a response
///
/// Expected shape:
/// `{"data": [{"outputs": {"<index>": {"bands": {"B0": {"stats": {...}}}}}}]}`
pub fn extract_statistics(body: &Value, index: VegetationIndex) -> AppResult<VegetationStatistics> {
    let intervals = body
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| AppError::MalformedProviderResponse("missing data array".to_string()))?;

    let output_key = index.as_str().to_ascii_lowercase();

    // Intervals are chronological; prefer the latest one that has usable stats
    let stats = intervals
        .iter()
        .rev()
        .find_map(|interval| interval_statistics(interval, &output_key))
        .ok_or_else(|| {
            AppError::MalformedProviderResponse(format!(
                "no interval with {} statistics",
                index
            ))
        })?;

    stats
        .validate()
        .map_err(|e| AppError::MalformedProviderResponse(e.to_string()))?;

    Ok(stats)
}

fn interval_statistics(interval: &Value, output_key: &str) -> Option<VegetationStatistics> {
    let outputs = interval.get("outputs")?.as_object()?;
    let output = outputs.get(output_key).or_else(|| outputs.get("default"))?;
    let stats = output.get("bands")?.get("B0")?.get("stats")?;

    Some(VegetationStatistics::new(
        stats.get("mean")?.as_f64()?,
        stats.get("min")?.as_f64()?,
        stats.get("max")?.as_f64()?,
        stats.get("stDev")?.as_f64()?,
    ))
}
