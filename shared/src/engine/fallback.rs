//! Geometry-only estimate used when index statistics are unavailable

use std::collections::BTreeMap;

use serde_json::json;

use crate::models::{AnalysisType, FieldGeometry, FieldHealthAnalysis};
use crate::policy::AnalysisPolicy;

use super::round_yield;

const FALLBACK_RECOMMENDATIONS: &[&str] = &[
    "Conduct a soil test to establish nutrient levels.",
    "Check that irrigation is adequate for the current growth stage.",
    "Scout the field weekly for pests and disease.",
    "Contact your local agricultural extension service for tailored advice.",
];

/// Produces a conservative analysis from field geometry alone
///
/// This is the guaranteed non-empty result of every degraded path, so it has
/// no failure mode.
#[derive(Debug, Clone, Default)]
pub struct FallbackEstimator {
    policy: AnalysisPolicy,
}

impl FallbackEstimator {
    pub fn new(policy: AnalysisPolicy) -> Self {
        Self { policy }
    }

    /// Estimate field health; `reason` records why statistics were unusable
    pub fn estimate(&self, geometry: &FieldGeometry, reason: &str) -> FieldHealthAnalysis {
        let area = geometry.area();

        let mut soil_analysis = BTreeMap::new();
        soil_analysis.insert("source".to_string(), json!("geometry_only"));
        soil_analysis.insert("areaSquareDegrees".to_string(), json!(area));
        soil_analysis.insert("fallbackReason".to_string(), json!(reason));

        FieldHealthAnalysis {
            field_health: self.policy.fallback_health.clamp(0.0, 1.0),
            problem_areas: Vec::new(),
            yield_prediction: round_yield(
                self.policy.baseline_yield * self.policy.fallback_yield_factor,
            ),
            soil_analysis,
            recommendations: FALLBACK_RECOMMENDATIONS
                .iter()
                .map(|r| r.to_string())
                .collect(),
            analysis_type: AnalysisType::Fallback,
        }
    }
}
