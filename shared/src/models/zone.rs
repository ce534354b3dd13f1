//! Variable-rate treatment zone models

use serde::{Deserialize, Serialize};

use crate::types::GeoPoint;

/// Input a zone prescribes a different application rate for
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ZoneKind {
    Fertilizer,
    Irrigation,
    Seeding,
}

impl std::fmt::Display for ZoneKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ZoneKind::Fertilizer => write!(f, "fertilizer"),
            ZoneKind::Irrigation => write!(f, "irrigation"),
            ZoneKind::Seeding => write!(f, "seeding"),
        }
    }
}

/// A sub-area of a field recommended for a non-average application rate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VariableRateZone {
    /// Closed outline of the zone
    pub polygon: Vec<GeoPoint>,
    pub index_value: f64,
    pub kind: ZoneKind,
    pub application_rate_multiplier: f64,
    /// Fraction of input saved versus uniform application, in [0, 1]
    pub savings_potential: f64,
}

impl VariableRateZone {
    /// Zone center, taken from the outline's vertices
    pub fn center(&self) -> Option<GeoPoint> {
        crate::geometry::centroid(&self.polygon)
    }
}
