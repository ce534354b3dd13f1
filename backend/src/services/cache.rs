//! Offline TTL cache
//!
//! Three independent namespaces keyed by field id:
//! - imagery: the last statistics snapshot fetched for a field
//! - analysis: the last analysis together with its zones and moisture tier
//! - alerts: the last evaluated alert set
//!
//! Entries expire `ttl` after they were written. Reads never refresh the TTL;
//! an expired entry found on read is removed and reported as a miss.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use shared::{
    CropType, FieldHealthAnalysis, MoistureStressTier, PrecisionAlert, VariableRateZone,
    VegetationStatistics,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};

/// Time source for expiry decisions
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Statistics fetched for a field in one monitoring cycle
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagerySnapshot {
    pub ndvi: Option<VegetationStatistics>,
    pub ndmi: Option<VegetationStatistics>,
    pub fetched_at: DateTime<Utc>,
}

/// Analysis outputs kept for offline reads and prescription export
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedAnalysis {
    pub analysis: FieldHealthAnalysis,
    pub zones: Vec<VariableRateZone>,
    pub moisture_tier: Option<MoistureStressTier>,
    pub crop_type: CropType,
    /// Index value the alert rules were evaluated against
    pub ndvi: f64,
}

/// A cached payload with its lifetime
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
    pub field_id: String,
    pub payload: T,
    pub cached_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Cache namespace identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheNamespace {
    Imagery,
    Analysis,
    Alerts,
}

impl std::fmt::Display for CacheNamespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheNamespace::Imagery => write!(f, "imagery"),
            CacheNamespace::Analysis => write!(f, "analysis"),
            CacheNamespace::Alerts => write!(f, "alerts"),
        }
    }
}

/// Per-namespace occupancy
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceStats {
    pub namespace: CacheNamespace,
    pub entries: usize,
    pub approximate_bytes: usize,
}

/// Occupancy of every namespace
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub namespaces: Vec<NamespaceStats>,
    pub total_entries: usize,
    pub total_bytes: usize,
}

struct Slots<T> {
    entries: HashMap<String, CacheEntry<T>>,
    /// (expires_at, field_id), ordered so sweeps stop at the first live entry
    expiry_index: BTreeSet<(DateTime<Utc>, String)>,
}

impl<T> Default for Slots<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            expiry_index: BTreeSet::new(),
        }
    }
}

impl<T> Slots<T> {
    fn remove(&mut self, field_id: &str) -> Option<CacheEntry<T>> {
        let entry = self.entries.remove(field_id)?;
        self.expiry_index
            .remove(&(entry.expires_at, field_id.to_string()));
        Some(entry)
    }
}

/// One typed TTL namespace
pub struct TtlStore<T> {
    namespace: CacheNamespace,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    slots: RwLock<Slots<T>>,
}

impl<T> TtlStore<T>
where
    T: Clone + Serialize + Send + Sync,
{
    pub(crate) fn new(namespace: CacheNamespace, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            namespace,
            ttl,
            clock,
            slots: RwLock::new(Slots::default()),
        }
    }

    /// Store `payload` for `field_id`, replacing any previous entry
    pub async fn put(&self, field_id: &str, payload: T) -> CacheEntry<T> {
        let now = self.clock.now();
        let entry = CacheEntry {
            field_id: field_id.to_string(),
            payload,
            cached_at: now,
            expires_at: now + self.ttl,
        };

        let mut slots = self.slots.write().await;
        slots.remove(field_id);
        slots
            .expiry_index
            .insert((entry.expires_at, field_id.to_string()));
        slots.entries.insert(field_id.to_string(), entry.clone());

        tracing::debug!(namespace = %self.namespace, field_id, expires_at = %entry.expires_at, "Cached entry");
        entry
    }

    /// Fetch the live entry for `field_id`
    pub async fn get_entry(&self, field_id: &str) -> Option<CacheEntry<T>> {
        let now = self.clock.now();

        {
            let slots = self.slots.read().await;
            match slots.entries.get(field_id) {
                None => return None,
                Some(entry) if !entry.is_expired(now) => return Some(entry.clone()),
                Some(_) => {}
            }
        }

        // Expired: evict under the write lock, re-checking in case of a fresh put
        let mut slots = self.slots.write().await;
        let expired = slots
            .entries
            .get(field_id)
            .map(|entry| entry.is_expired(now))
            .unwrap_or(false);
        if expired {
            slots.remove(field_id);
            tracing::debug!(namespace = %self.namespace, field_id, "Evicted expired entry on read");
            return None;
        }
        slots.entries.get(field_id).cloned()
    }

    /// Fetch the live payload for `field_id`
    pub async fn get(&self, field_id: &str) -> Option<T> {
        self.get_entry(field_id).await.map(|entry| entry.payload)
    }

    /// Remove every entry whose expiry is at or before now
    pub async fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let mut slots = self.slots.write().await;

        let due: Vec<(DateTime<Utc>, String)> = slots
            .expiry_index
            .iter()
            .take_while(|(expires_at, _)| *expires_at <= now)
            .cloned()
            .collect();

        for (_, field_id) in &due {
            slots.remove(field_id);
        }
        due.len()
    }

    pub async fn stats(&self) -> NamespaceStats {
        let slots = self.slots.read().await;
        let approximate_bytes = slots
            .entries
            .values()
            .map(|entry| serde_json::to_vec(&entry.payload).map(|b| b.len()).unwrap_or(0))
            .sum();

        NamespaceStats {
            namespace: self.namespace,
            entries: slots.entries.len(),
            approximate_bytes,
        }
    }
}

/// The three offline namespaces behind one handle
pub struct OfflineCache {
    imagery: TtlStore<ImagerySnapshot>,
    analysis: TtlStore<CachedAnalysis>,
    alerts: TtlStore<Vec<PrecisionAlert>>,
}

impl OfflineCache {
    /// Entries must outlive the write, so `ttl` has to be positive
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> AppResult<Self> {
        if ttl <= Duration::zero() {
            return Err(AppError::Configuration(format!(
                "cache TTL must be positive, got {} seconds",
                ttl.num_seconds()
            )));
        }

        Ok(Self {
            imagery: TtlStore::new(CacheNamespace::Imagery, ttl, clock.clone()),
            analysis: TtlStore::new(CacheNamespace::Analysis, ttl, clock.clone()),
            alerts: TtlStore::new(CacheNamespace::Alerts, ttl, clock),
        })
    }

    /// Cache with the wall clock and a TTL in hours
    pub fn with_ttl_hours(hours: i64) -> AppResult<Self> {
        Self::new(Duration::hours(hours), Arc::new(SystemClock))
    }

    pub fn imagery(&self) -> &TtlStore<ImagerySnapshot> {
        &self.imagery
    }

    pub fn analysis(&self) -> &TtlStore<CachedAnalysis> {
        &self.analysis
    }

    pub fn alerts(&self) -> &TtlStore<Vec<PrecisionAlert>> {
        &self.alerts
    }

    /// Sweep every namespace, returning the total number of entries removed
    pub async fn sweep_expired(&self) -> usize {
        let removed = self.imagery.sweep_expired().await
            + self.analysis.sweep_expired().await
            + self.alerts.sweep_expired().await;

        tracing::info!(removed, "Swept expired cache entries");
        removed
    }

    pub async fn stats(&self) -> CacheStats {
        let namespaces = vec![
            self.imagery.stats().await,
            self.analysis.stats().await,
            self.alerts.stats().await,
        ];
        CacheStats {
            total_entries: namespaces.iter().map(|n| n.entries).sum(),
            total_bytes: namespaces.iter().map(|n| n.approximate_bytes).sum(),
            namespaces,
        }
    }
}
