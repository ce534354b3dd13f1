//! Vegetation statistics to field health assessment

use std::collections::BTreeMap;

use rand::Rng;
use serde_json::json;

use crate::error::FieldResult;
use crate::models::{
    AnalysisType, FieldGeometry, FieldHealthAnalysis, HealthBand, ProblemArea,
    VegetationIndex, VegetationStatistics,
};
use crate::policy::AnalysisPolicy;
use crate::types::GeoPoint;

use super::round_yield;

/// Converts index statistics into a [`FieldHealthAnalysis`]
#[derive(Debug, Clone, Default)]
pub struct FieldHealthAnalyzer {
    policy: AnalysisPolicy,
}

impl FieldHealthAnalyzer {
    pub fn new(policy: AnalysisPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &AnalysisPolicy {
        &self.policy
    }

    /// Analyze NDVI statistics for a field
    ///
    /// Fails only when the statistics contain non-finite values; callers fall
    /// back to the geometry-only estimate in that case.
    pub fn analyze<R: Rng + ?Sized>(
        &self,
        geometry: &FieldGeometry,
        stats: &VegetationStatistics,
        rng: &mut R,
    ) -> FieldResult<FieldHealthAnalysis> {
        stats.validate()?;

        let field_health = stats.mean.clamp(0.0, 1.0);
        let problem_areas = self.sample_problem_areas(geometry.centroid(), stats, rng);
        let yield_prediction = round_yield(field_health * self.policy.yield_coefficient);
        let recommendations = self.recommendations(field_health, stats);

        let mut soil_analysis = BTreeMap::new();
        soil_analysis.insert("index".to_string(), json!(VegetationIndex::Ndvi.as_str()));
        soil_analysis.insert("meanIndex".to_string(), json!(stats.mean));
        soil_analysis.insert("minIndex".to_string(), json!(stats.min));
        soil_analysis.insert("maxIndex".to_string(), json!(stats.max));
        soil_analysis.insert("stdDev".to_string(), json!(stats.std_dev));
        soil_analysis.insert(
            "healthBand".to_string(),
            json!(HealthBand::from_health(field_health)),
        );
        soil_analysis.insert("problemAreaCount".to_string(), json!(problem_areas.len()));

        Ok(FieldHealthAnalysis {
            field_health,
            problem_areas,
            yield_prediction,
            soil_analysis,
            recommendations,
            analysis_type: AnalysisType::Satellite,
        })
    }

    /// Scatter up to `max_problem_areas` low-vigor samples around the centroid
    fn sample_problem_areas<R: Rng + ?Sized>(
        &self,
        center: GeoPoint,
        stats: &VegetationStatistics,
        rng: &mut R,
    ) -> Vec<ProblemArea> {
        if stats.std_dev <= self.policy.problem_area_std_dev {
            return Vec::new();
        }

        // Float-to-int casts saturate, so huge deviations still cap at the max
        let count = ((stats.std_dev * 10.0).floor() as usize).min(self.policy.max_problem_areas);
        let spread = self.policy.jitter_degrees.abs();

        (0..count)
            .map(|_| {
                let lat = center.lat + rng.gen_range(-spread..=spread);
                let lng = center.lng + rng.gen_range(-spread..=spread);
                let index_jitter = if self.policy.ndvi_jitter_max > 0.0 {
                    rng.gen_range(0.0..self.policy.ndvi_jitter_max)
                } else {
                    0.0
                };
                let ndvi = (stats.mean - stats.std_dev - index_jitter).clamp(0.0, 1.0);
                ProblemArea { lat, lng, ndvi }
            })
            .collect()
    }

    /// Tiered health recommendations followed by variability and canopy notes
    fn recommendations(&self, field_health: f64, stats: &VegetationStatistics) -> Vec<String> {
        let mut recs: Vec<String> = match HealthBand::from_health(field_health) {
            HealthBand::Excellent => vec![
                "Field health is excellent. Maintain current management practices.",
                "Continue weekly monitoring to catch changes early.",
            ],
            HealthBand::Good => vec![
                "Field health is good. Optimize irrigation scheduling to sustain growth.",
                "Consider a foliar feed to boost crop vigor.",
            ],
            HealthBand::Moderate => vec![
                "Field health is moderate. Investigate irrigation coverage and soil conditions.",
                "Test soil nutrient levels.",
                "Apply fertilizer based on soil test results.",
            ],
            HealthBand::Poor => vec![
                "Field health is poor. Scout for pest and disease pressure.",
                "Check irrigation system integrity for leaks or blockages.",
                "Verify seeding density and germination.",
                "Commission a full soil analysis.",
            ],
        }
        .into_iter()
        .map(String::from)
        .collect();

        if stats.std_dev > self.policy.high_variability_std_dev {
            recs.push(
                "High spatial variability detected. Consider zone management with variable-rate application."
                    .to_string(),
            );
        }

        if stats.mean < self.policy.low_index_mean {
            recs.push(
                "Low vegetation index indicates a sparse or stressed canopy.".to_string(),
            );
        } else if stats.mean > self.policy.healthy_canopy_mean {
            recs.push("Vegetation index indicates a healthy, dense canopy.".to_string());
        }

        recs
    }
}
