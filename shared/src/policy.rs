//! Heuristic policy constants
//!
//! None of these values are calibrated agronomy. They are kept here so a
//! deployment can replace them through configuration.

use serde::{Deserialize, Serialize};

/// Constants used by the analyzer and the fallback estimator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisPolicy {
    /// Tonnes per hectare at full health
    pub yield_coefficient: f64,
    /// Standard deviation above which problem areas are sampled
    pub problem_area_std_dev: f64,
    pub max_problem_areas: usize,
    /// Half-width of the square problem areas are scattered in
    pub jitter_degrees: f64,
    /// Upper bound of the random NDVI offset applied to problem areas
    pub ndvi_jitter_max: f64,
    pub high_variability_std_dev: f64,
    pub low_index_mean: f64,
    pub healthy_canopy_mean: f64,
    pub fallback_health: f64,
    /// Regional baseline yield in tonnes per hectare
    pub baseline_yield: f64,
    pub fallback_yield_factor: f64,
}

impl Default for AnalysisPolicy {
    fn default() -> Self {
        Self {
            yield_coefficient: 5.0,
            problem_area_std_dev: 0.1,
            max_problem_areas: 3,
            jitter_degrees: 0.0005,
            ndvi_jitter_max: 0.1,
            high_variability_std_dev: 0.15,
            low_index_mean: 0.3,
            healthy_canopy_mean: 0.7,
            fallback_health: 0.65,
            baseline_yield: 3.5,
            fallback_yield_factor: 0.8,
        }
    }
}

/// Constants used when deriving variable-rate zones
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ZonePolicy {
    /// Problem areas below this NDVI get a fertilizer zone
    pub fertilizer_ndvi_threshold: f64,
    pub zone_radius_degrees: f64,
    pub fertilizer_rate_multiplier: f64,
    pub fertilizer_savings: f64,
    pub irrigation_rate_multiplier: f64,
    pub irrigation_savings: f64,
}

impl Default for ZonePolicy {
    fn default() -> Self {
        Self {
            fertilizer_ndvi_threshold: 0.4,
            zone_radius_degrees: 0.001,
            fertilizer_rate_multiplier: 1.5,
            fertilizer_savings: 0.25,
            irrigation_rate_multiplier: 1.3,
            irrigation_savings: 0.30,
        }
    }
}

/// Thresholds used by the nutrient deficiency rule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlertPolicy {
    pub nutrient_ndvi_threshold: f64,
    pub nutrient_health_threshold: f64,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            nutrient_ndvi_threshold: 0.4,
            nutrient_health_threshold: 0.5,
        }
    }
}
