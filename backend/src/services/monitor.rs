//! Field monitoring orchestration
//!
//! One monitoring cycle:
//! 1. validate and close the field geometry
//! 2. reuse cached imagery, or fetch NDVI and NDMI concurrently while online
//! 3. analyze (or fall back to the geometry-only estimate)
//! 4. run the alert checks and zone generation concurrently, each isolated
//! 5. cache, persist in the background, and dispatch to the user if given
//!
//! Offline with no imagery, the last cached analysis is served instead.
//! Having nothing cached in that state is the only hard failure.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use shared::engine::{AlertEvaluator, FallbackEstimator, FieldHealthAnalyzer, ZoneGenerator};
use shared::{
    AlertPolicy, AnalysisPolicy, CropType, FieldGeometry, FieldHealthAnalysis, FieldResult,
    GeoPoint, MoistureStressTier, PrecisionAlert, TimeRange, VariableRateZone, VegetationIndex,
    VegetationStatistics, ZonePolicy,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinError;

use super::cache::{CachedAnalysis, ImagerySnapshot, OfflineCache};
use super::connectivity::{ConnectivityObserver, SubscriptionId};
use super::dispatcher::{AlertDispatcher, DispatchReport};
use super::notification::DispatchTarget;
use super::persistence::PersistenceCollaborator;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::external::StatisticsProvider;

/// Input for one monitoring cycle
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorFieldRequest {
    pub field_id: String,
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

impl MonitorFieldRequest {
    fn dispatch_target(&self) -> Option<DispatchTarget> {
        self.user_id.as_ref().map(|user_id| DispatchTarget {
            user_id: user_id.clone(),
            chat_id: self.chat_id.clone(),
            phone: self.phone.clone(),
        })
    }
}

/// Where a result's analysis came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// Statistics fetched during this cycle
    Live,
    /// Statistics reused from the imagery cache
    CachedImagery,
    /// Offline: previous analysis served from the analysis cache
    CachedAnalysis,
    /// Statistics unavailable: geometry-only estimate
    Fallback,
}

/// Output of one monitoring cycle
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringResult {
    pub field_id: String,
    pub analysis: FieldHealthAnalysis,
    pub zones: Vec<VariableRateZone>,
    pub alerts: Vec<PrecisionAlert>,
    pub recommendations: Vec<String>,
    pub moisture_tier: Option<MoistureStressTier>,
    pub data_source: DataSource,
    pub online: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispatch: Option<DispatchReport>,
    pub generated_at: DateTime<Utc>,
}

/// Tunables for [`FieldMonitor`]
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub analysis: AnalysisPolicy,
    pub zones: ZonePolicy,
    pub alerts: AlertPolicy,
    pub provider_timeout: Duration,
    pub lookback_days: i64,
    pub random_seed: Option<u64>,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            analysis: AnalysisPolicy::default(),
            zones: ZonePolicy::default(),
            alerts: AlertPolicy::default(),
            provider_timeout: Duration::from_secs(15),
            lookback_days: 10,
            random_seed: None,
        }
    }
}

impl MonitorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            analysis: config.analysis.clone(),
            zones: config.zones.clone(),
            alerts: config.alerts.clone(),
            provider_timeout: config.statistics.timeout(),
            lookback_days: config.statistics.lookback_days,
            random_seed: config.monitoring.random_seed,
        }
    }
}

/// Collaborators a [`FieldMonitor`] is wired to
pub struct MonitorDeps {
    pub provider: Arc<dyn StatisticsProvider>,
    pub cache: Arc<OfflineCache>,
    pub dispatcher: Arc<AlertDispatcher>,
    pub persistence: Arc<dyn PersistenceCollaborator>,
    pub connectivity: Arc<dyn ConnectivityObserver>,
}

pub struct FieldMonitor {
    provider: Arc<dyn StatisticsProvider>,
    cache: Arc<OfflineCache>,
    dispatcher: Arc<AlertDispatcher>,
    persistence: Arc<dyn PersistenceCollaborator>,
    connectivity: Arc<dyn ConnectivityObserver>,
    subscription: SubscriptionId,
    online: Arc<AtomicBool>,
    analyzer: FieldHealthAnalyzer,
    fallback: FallbackEstimator,
    zone_generator: ZoneGenerator,
    evaluator: AlertEvaluator,
    rng: Mutex<StdRng>,
    provider_timeout: Duration,
    lookback_days: i64,
}

impl FieldMonitor {
    pub fn new(deps: MonitorDeps, settings: MonitorSettings) -> Self {
        let online = Arc::new(AtomicBool::new(deps.connectivity.current_status()));
        let flag = online.clone();
        let subscription = deps
            .connectivity
            .subscribe(Arc::new(move |status| flag.store(status, Ordering::SeqCst)));

        let rng = match settings.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            provider: deps.provider,
            cache: deps.cache,
            dispatcher: deps.dispatcher,
            persistence: deps.persistence,
            connectivity: deps.connectivity,
            subscription,
            online,
            analyzer: FieldHealthAnalyzer::new(settings.analysis.clone()),
            fallback: FallbackEstimator::new(settings.analysis),
            zone_generator: ZoneGenerator::new(settings.zones),
            evaluator: AlertEvaluator::new(settings.alerts),
            rng: Mutex::new(rng),
            provider_timeout: settings.provider_timeout,
            lookback_days: settings.lookback_days,
        }
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    pub fn cache(&self) -> &Arc<OfflineCache> {
        &self.cache
    }

    /// Run one monitoring cycle for a field
    pub async fn monitor_field(&self, request: MonitorFieldRequest) -> AppResult<MonitoringResult> {
        shared::validate_field_id(&request.field_id)?;
        if let Some(crop) = &request.crop_type {
            shared::validate_crop_name(crop)?;
        }
        let geometry = FieldGeometry::new(request.geometry.clone())?;
        let crop = request
            .crop_type
            .as_deref()
            .map(CropType::parse)
            .unwrap_or_default();
        let field_id = request.field_id.as_str();
        let online = self.is_online();

        tracing::info!(field_id, %crop, online, "Monitoring field");

        let (snapshot, mut data_source, fetch_failure) =
            match self.cache.imagery().get(field_id).await {
                Some(snapshot) => (Some(snapshot), DataSource::CachedImagery, None),
                None if online => match self.fetch_imagery(&geometry).await {
                    (snapshot, None) => {
                        self.cache.imagery().put(field_id, snapshot.clone()).await;
                        (Some(snapshot), DataSource::Live, None)
                    }
                    // NDMI may still have arrived; keep it for the moisture tier
                    (snapshot, Some(e)) => {
                        if e.is_provider_failure() {
                            tracing::warn!(field_id, error = %e, "Statistics unavailable, using fallback estimate");
                        } else {
                            tracing::error!(field_id, error = %e, "Statistics fetch failed, using fallback estimate");
                        }
                        (Some(snapshot), DataSource::Fallback, Some(e.to_string()))
                    }
                },
                None => return self.serve_offline(field_id).await,
            };

        let ndvi_stats = snapshot.as_ref().and_then(|s| s.ndvi);
        let analysis = match &ndvi_stats {
            Some(stats) => {
                let analyzed = {
                    let mut rng = self.rng.lock().unwrap_or_else(|p| p.into_inner());
                    self.analyzer.analyze(&geometry, stats, &mut *rng)
                };
                match analyzed {
                    Ok(analysis) => analysis,
                    Err(e) => {
                        tracing::warn!(field_id, error = %e, "Statistics rejected, using fallback estimate");
                        data_source = DataSource::Fallback;
                        self.fallback.estimate(&geometry, &e.to_string())
                    }
                }
            }
            None => self.fallback.estimate(
                &geometry,
                fetch_failure.as_deref().unwrap_or("statistics unavailable"),
            ),
        };

        let moisture_tier = request.moisture_tier.or_else(|| {
            snapshot
                .as_ref()
                .and_then(|s| s.ndmi)
                .filter(|stats| stats.mean.is_finite())
                .map(|stats| MoistureStressTier::from_ndmi(stats.mean))
        });

        // Rules read the measured mean when the analysis used it
        let ndvi = match &ndvi_stats {
            Some(stats) if !analysis.is_fallback() => stats.mean,
            _ => analysis.field_health,
        };

        let (zones, alerts) = self
            .run_checks(field_id, &analysis, ndvi, &crop, moisture_tier)
            .await;

        self.cache
            .analysis()
            .put(
                field_id,
                CachedAnalysis {
                    analysis: analysis.clone(),
                    zones: zones.clone(),
                    moisture_tier,
                    crop_type: crop.clone(),
                    ndvi,
                },
            )
            .await;
        self.cache.alerts().put(field_id, alerts.clone()).await;

        self.persist_in_background(field_id, &analysis, &alerts);

        let dispatch = match request.dispatch_target() {
            Some(target) => Some(self.dispatcher.dispatch(&alerts, &target).await),
            None => None,
        };

        tracing::info!(
            field_id,
            field_health = analysis.field_health,
            band = %analysis.health_band(),
            alerts = alerts.len(),
            zones = zones.len(),
            source = ?data_source,
            "Monitoring cycle complete"
        );

        Ok(MonitoringResult {
            field_id: field_id.to_string(),
            recommendations: with_zone_summary(&analysis, &zones),
            analysis,
            zones,
            alerts,
            moisture_tier,
            data_source,
            online,
            dispatch,
            generated_at: Utc::now(),
        })
    }

    async fn fetch_index(
        &self,
        geometry: &FieldGeometry,
        range: &TimeRange,
        index: VegetationIndex,
    ) -> AppResult<VegetationStatistics> {
        tokio::time::timeout(
            self.provider_timeout,
            self.provider.fetch_vegetation_stats(geometry, range, index),
        )
        .await
        .unwrap_or_else(|_| Err(AppError::ProviderTimeout(self.provider_timeout.as_millis() as u64)))
    }

    /// Fetch NDVI and NDMI together
    ///
    /// The snapshot carries whichever index arrived. The error is the NDVI
    /// failure, if any; a missing NDMI only means no moisture tier.
    async fn fetch_imagery(&self, geometry: &FieldGeometry) -> (ImagerySnapshot, Option<AppError>) {
        let range = TimeRange::last_days(self.lookback_days);

        let (ndvi, ndmi) = tokio::join!(
            self.fetch_index(geometry, &range, VegetationIndex::Ndvi),
            self.fetch_index(geometry, &range, VegetationIndex::Ndmi),
        );

        let ndmi = match ndmi {
            Ok(stats) => Some(stats),
            Err(e) => {
                tracing::debug!(error = %e, "NDMI unavailable, moisture tier will not be derived");
                None
            }
        };
        let (ndvi, ndvi_error) = match ndvi {
            Ok(stats) => (Some(stats), None),
            Err(e) => (None, Some(e)),
        };

        let snapshot = ImagerySnapshot {
            ndvi,
            ndmi,
            fetched_at: Utc::now(),
        };
        (snapshot, ndvi_error)
    }

    /// Water stress, nutrient and harvest checks plus zoning, each in its own task
    async fn run_checks(
        &self,
        field_id: &str,
        analysis: &FieldHealthAnalysis,
        ndvi: f64,
        crop: &CropType,
        moisture_tier: Option<MoistureStressTier>,
    ) -> (Vec<VariableRateZone>, Vec<PrecisionAlert>) {
        let water = {
            let evaluator = self.evaluator.clone();
            let field_id = field_id.to_string();
            tokio::spawn(async move {
                let found = moisture_tier
                    .map(|tier| evaluator.check_water_stress(&field_id, tier))
                    .unwrap_or_default();
                FieldResult::Ok(found)
            })
        };
        let nutrient = {
            let evaluator = self.evaluator.clone();
            let field_id = field_id.to_string();
            let field_health = analysis.field_health;
            tokio::spawn(async move { evaluator.check_nutrient_deficiency(&field_id, ndvi, field_health) })
        };
        let harvest = {
            let evaluator = self.evaluator.clone();
            let field_id = field_id.to_string();
            let crop = crop.clone();
            tokio::spawn(async move { evaluator.check_harvest_timing(&field_id, ndvi, &crop) })
        };
        let zoning = {
            let generator = self.zone_generator.clone();
            let analysis = analysis.clone();
            tokio::spawn(async move { generator.generate(&analysis, moisture_tier) })
        };

        let (water, nutrient, harvest, zoning) = tokio::join!(water, nutrient, harvest, zoning);

        let mut alerts = Vec::new();
        collect_check(field_id, "water_stress", water, &mut alerts);
        collect_check(field_id, "nutrient_deficiency", nutrient, &mut alerts);
        collect_check(field_id, "harvest_timing", harvest, &mut alerts);

        let zones = zoning.unwrap_or_else(|e| {
            tracing::warn!(field_id, error = %e, "Zone generation failed");
            Vec::new()
        });
        alerts.extend(self.evaluator.variable_rate_summary(field_id, &zones));

        (zones, alerts)
    }

    async fn serve_offline(&self, field_id: &str) -> AppResult<MonitoringResult> {
        let cached = self
            .cache
            .analysis()
            .get(field_id)
            .await
            .ok_or_else(|| AppError::NoCachedDataOffline {
                field_id: field_id.to_string(),
            })?;

        let alerts = match self.cache.alerts().get(field_id).await {
            Some(alerts) => alerts,
            None => {
                tracing::debug!(field_id, "Recomputing alerts from cached analysis");
                self.evaluator.evaluate(
                    field_id,
                    &cached.analysis,
                    cached.ndvi,
                    &cached.crop_type,
                    cached.moisture_tier,
                    &cached.zones,
                )
            }
        };

        tracing::info!(field_id, "Offline, serving cached analysis");

        Ok(MonitoringResult {
            field_id: field_id.to_string(),
            recommendations: with_zone_summary(&cached.analysis, &cached.zones),
            analysis: cached.analysis,
            zones: cached.zones,
            alerts,
            moisture_tier: cached.moisture_tier,
            data_source: DataSource::CachedAnalysis,
            online: false,
            dispatch: None,
            generated_at: Utc::now(),
        })
    }

    fn persist_in_background(&self, field_id: &str, analysis: &FieldHealthAnalysis, alerts: &[PrecisionAlert]) {
        let persistence = self.persistence.clone();
        let field_id = field_id.to_string();
        let analysis = analysis.clone();
        let alerts = alerts.to_vec();

        tokio::spawn(async move {
            if let Err(e) = persistence.save_analysis(&field_id, &analysis).await {
                tracing::warn!(field_id = %field_id, error = %e, "Failed to persist analysis");
            }
            for alert in &alerts {
                if let Err(e) = persistence.save_alert(alert).await {
                    tracing::warn!(alert_id = %alert.id, error = %e, "Failed to persist alert");
                }
            }
        });
    }
}

impl Drop for FieldMonitor {
    fn drop(&mut self) {
        self.connectivity.unsubscribe(self.subscription);
    }
}

fn collect_check(
    field_id: &str,
    check: &str,
    outcome: Result<FieldResult<Vec<PrecisionAlert>>, JoinError>,
    alerts: &mut Vec<PrecisionAlert>,
) {
    match outcome {
        Ok(Ok(found)) => alerts.extend(found),
        Ok(Err(e)) => tracing::warn!(field_id, check, error = %e, "Alert check failed"),
        Err(e) => tracing::error!(field_id, check, error = %e, "Alert check panicked"),
    }
}

/// Analysis recommendations, plus a zoning note when zones exist
fn with_zone_summary(analysis: &FieldHealthAnalysis, zones: &[VariableRateZone]) -> Vec<String> {
    let mut recommendations = analysis.recommendations.clone();
    if !zones.is_empty() {
        recommendations.push(format!(
            "{} variable-rate zone(s) mapped. Download the prescription to apply inputs where they are needed.",
            zones.len()
        ));
    }
    recommendations
}
