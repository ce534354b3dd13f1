//! In-memory collaborators shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use field_health_backend::error::{AppError, AppResult};
use field_health_backend::external::StatisticsProvider;
use field_health_backend::services::notification::{
    DeliveryReceipt, DispatchTarget, InAppNotification, InAppNotificationStore, NotificationChannel,
};
use field_health_backend::services::{
    AlertDispatcher, Clock, ConnectivityMonitor, FieldMonitor, MonitorDeps, MonitorSettings,
    OfflineCache, PersistenceCollaborator,
};
use shared::{FieldGeometry, FieldHealthAnalysis, GeoPoint, PrecisionAlert, TimeRange, VegetationIndex, VegetationStatistics};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

// ============================================================================
// Clock
// ============================================================================

/// Clock that only moves when told to
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(Utc::now()),
        })
    }

    pub fn advance(&self, by: ChronoDuration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

// ============================================================================
// Statistics provider
// ============================================================================

#[derive(Clone)]
pub enum Reply {
    Stats(VegetationStatistics),
    Unavailable,
    Malformed,
    Hang,
}

/// Provider with a scripted reply per index
pub struct MockProvider {
    ndvi: Mutex<Reply>,
    ndmi: Mutex<Reply>,
    pub calls: AtomicUsize,
}

impl MockProvider {
    pub fn new(ndvi: Reply, ndmi: Reply) -> Arc<Self> {
        Arc::new(Self {
            ndvi: Mutex::new(ndvi),
            ndmi: Mutex::new(ndmi),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn set_ndvi(&self, reply: Reply) {
        *self.ndvi.lock().unwrap() = reply;
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatisticsProvider for MockProvider {
    async fn fetch_vegetation_stats(
        &self,
        _geometry: &FieldGeometry,
        _range: &TimeRange,
        index: VegetationIndex,
    ) -> AppResult<VegetationStatistics> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = match index {
            VegetationIndex::Ndvi => self.ndvi.lock().unwrap().clone(),
            VegetationIndex::Ndmi => self.ndmi.lock().unwrap().clone(),
        };
        match reply {
            Reply::Stats(stats) => Ok(stats),
            Reply::Unavailable => Err(AppError::ProviderUnavailable("503 Service Unavailable".into())),
            Reply::Malformed => Err(AppError::MalformedProviderResponse("missing data array".into())),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(AppError::ProviderUnavailable("unreachable".into()))
            }
        }
    }
}

// ============================================================================
// Persistence
// ============================================================================

#[derive(Default)]
pub struct RecordingPersistence {
    pub alerts: Mutex<Vec<PrecisionAlert>>,
    pub analyses: Mutex<Vec<(String, FieldHealthAnalysis)>>,
}

#[async_trait]
impl PersistenceCollaborator for RecordingPersistence {
    async fn save_alert(&self, alert: &PrecisionAlert) -> AppResult<()> {
        self.alerts.lock().unwrap().push(alert.clone());
        Ok(())
    }

    async fn save_analysis(&self, field_id: &str, analysis: &FieldHealthAnalysis) -> AppResult<uuid::Uuid> {
        self.analyses
            .lock()
            .unwrap()
            .push((field_id.to_string(), analysis.clone()));
        Ok(uuid::Uuid::new_v4())
    }
}

/// Persistence whose backing store is down
#[derive(Default)]
pub struct FailingPersistence {
    pub attempts: AtomicUsize,
}

impl FailingPersistence {
    pub fn attempt_count(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PersistenceCollaborator for FailingPersistence {
    async fn save_alert(&self, _alert: &PrecisionAlert) -> AppResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(AppError::Persistence("connection refused".into()))
    }

    async fn save_analysis(&self, _field_id: &str, _analysis: &FieldHealthAnalysis) -> AppResult<uuid::Uuid> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(AppError::Persistence("connection refused".into()))
    }
}

// ============================================================================
// Notification channels
// ============================================================================

/// Channel that records every message it is asked to send
pub struct RecordingChannel {
    pub name: &'static str,
    pub sent: Mutex<Vec<String>>,
}

impl RecordingChannel {
    pub fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    fn name(&self) -> &'static str {
        self.name
    }

    fn accepts(&self, _target: &DispatchTarget) -> bool {
        true
    }

    async fn send(&self, _target: &DispatchTarget, message: &str) -> AppResult<DeliveryReceipt> {
        self.sent.lock().unwrap().push(message.to_string());
        Ok(DeliveryReceipt::new(self.name, Some(format!("msg-{}", self.sent_count()))))
    }
}

/// Channel that always fails
pub struct FailingChannel;

#[async_trait]
impl NotificationChannel for FailingChannel {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn accepts(&self, _target: &DispatchTarget) -> bool {
        true
    }

    async fn send(&self, _target: &DispatchTarget, _message: &str) -> AppResult<DeliveryReceipt> {
        Err(AppError::ChannelDelivery {
            channel: "failing".into(),
            message: "gateway rejected message".into(),
        })
    }
}

/// Channel that never answers
pub struct StalledChannel;

#[async_trait]
impl NotificationChannel for StalledChannel {
    fn name(&self) -> &'static str {
        "stalled"
    }

    fn accepts(&self, _target: &DispatchTarget) -> bool {
        true
    }

    async fn send(&self, _target: &DispatchTarget, _message: &str) -> AppResult<DeliveryReceipt> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(DeliveryReceipt::new("stalled", None))
    }
}

/// In-app store that forwards each batch to a channel
pub struct ChannelInAppStore {
    tx: mpsc::UnboundedSender<Vec<InAppNotification>>,
}

impl ChannelInAppStore {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Vec<InAppNotification>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

#[async_trait]
impl InAppNotificationStore for ChannelInAppStore {
    async fn insert_batch(&self, notifications: Vec<InAppNotification>) -> AppResult<usize> {
        let count = notifications.len();
        self.tx
            .send(notifications)
            .map_err(|e| AppError::Persistence(e.to_string()))?;
        Ok(count)
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// Square field of roughly 0.001 degrees on a side
pub fn square_field() -> Vec<GeoPoint> {
    vec![
        GeoPoint::new(13.7500, 100.5000),
        GeoPoint::new(13.7500, 100.5010),
        GeoPoint::new(13.7510, 100.5010),
        GeoPoint::new(13.7510, 100.5000),
    ]
}

pub fn stats(mean: f64, std_dev: f64) -> VegetationStatistics {
    VegetationStatistics::new(mean, mean - 2.0 * std_dev, mean + 2.0 * std_dev, std_dev)
}

pub struct Harness<P = RecordingPersistence> {
    pub monitor: FieldMonitor,
    pub provider: Arc<MockProvider>,
    pub cache: Arc<OfflineCache>,
    pub clock: Arc<ManualClock>,
    pub connectivity: Arc<ConnectivityMonitor>,
    pub persistence: Arc<P>,
}

pub fn harness(provider: Arc<MockProvider>, dispatcher: AlertDispatcher) -> Harness {
    harness_with(provider, dispatcher, Arc::new(RecordingPersistence::default()))
}

pub fn harness_with<P>(provider: Arc<MockProvider>, dispatcher: AlertDispatcher, persistence: Arc<P>) -> Harness<P>
where
    P: PersistenceCollaborator + 'static,
{
    let clock = ManualClock::new();
    let cache = Arc::new(OfflineCache::new(ChronoDuration::hours(24), clock.clone()).unwrap());
    let connectivity = Arc::new(ConnectivityMonitor::new(true));

    let settings = MonitorSettings {
        provider_timeout: Duration::from_millis(200),
        random_seed: Some(42),
        ..MonitorSettings::default()
    };

    let monitor = FieldMonitor::new(
        MonitorDeps {
            provider: provider.clone(),
            cache: cache.clone(),
            dispatcher: Arc::new(dispatcher),
            persistence: persistence.clone(),
            connectivity: connectivity.clone(),
        },
        settings,
    );

    Harness {
        monitor,
        provider,
        cache,
        clock,
        connectivity,
        persistence,
    }
}

pub fn quiet_dispatcher() -> AlertDispatcher {
    AlertDispatcher::new(Duration::from_millis(200))
}
