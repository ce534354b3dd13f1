//! Field health analysis models

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::GeoPoint;

/// Where an analysis came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    /// Derived from vegetation index statistics
    Satellite,
    /// Conservative estimate from geometry alone
    Fallback,
}

/// A sampled low-vigor location inside a field
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ProblemArea {
    pub lat: f64,
    pub lng: f64,
    pub ndvi: f64,
}

impl ProblemArea {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

/// Health assessment for one field
///
/// Built fresh by the analyzer or the fallback estimator and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldHealthAnalysis {
    /// Clamped to [0, 1]
    pub field_health: f64,
    pub problem_areas: Vec<ProblemArea>,
    /// Tonnes per hectare, one decimal place
    #[serde(with = "rust_decimal::serde::float")]
    pub yield_prediction: Decimal,
    pub soil_analysis: BTreeMap<String, serde_json::Value>,
    pub recommendations: Vec<String>,
    pub analysis_type: AnalysisType,
}

impl FieldHealthAnalysis {
    pub fn health_band(&self) -> HealthBand {
        HealthBand::from_health(self.field_health)
    }

    pub fn is_fallback(&self) -> bool {
        self.analysis_type == AnalysisType::Fallback
    }
}

/// Health bands that drive tiered recommendations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HealthBand {
    /// Above 0.8
    Excellent,
    /// 0.6 to 0.8
    Good,
    /// 0.4 to 0.6
    Moderate,
    /// Below 0.4
    Poor,
}

impl HealthBand {
    pub fn from_health(health: f64) -> Self {
        if health > 0.8 {
            HealthBand::Excellent
        } else if health > 0.6 {
            HealthBand::Good
        } else if health > 0.4 {
            HealthBand::Moderate
        } else {
            HealthBand::Poor
        }
    }
}

impl std::fmt::Display for HealthBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthBand::Excellent => write!(f, "Excellent"),
            HealthBand::Good => write!(f, "Good"),
            HealthBand::Moderate => write!(f, "Moderate"),
            HealthBand::Poor => write!(f, "Poor"),
        }
    }
}
