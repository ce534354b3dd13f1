//! Common types used across the platform

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A geographic point in decimal degrees
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Exact coordinate equality, used for ring closure checks
    pub fn coincides_with(&self, other: &GeoPoint) -> bool {
        self.lat == other.lat && self.lng == other.lng
    }
}

/// Time window for statistics queries
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeRange {
    /// Window ending now and covering the previous `days` days
    pub fn last_days(days: i64) -> Self {
        let to = Utc::now();
        Self {
            from: to - Duration::days(days),
            to,
        }
    }
}
