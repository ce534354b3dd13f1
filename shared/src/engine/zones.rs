//! Variable-rate zone derivation from sampled problem areas

use crate::geometry;
use crate::models::{FieldHealthAnalysis, MoistureStressTier, VariableRateZone, ZoneKind};
use crate::policy::ZonePolicy;

/// Builds treatment zones around an analysis's problem areas
#[derive(Debug, Clone, Default)]
pub struct ZoneGenerator {
    policy: ZonePolicy,
}

impl ZoneGenerator {
    pub fn new(policy: ZonePolicy) -> Self {
        Self { policy }
    }

    /// Each problem area yields zero, one or two zones
    pub fn generate(
        &self,
        analysis: &FieldHealthAnalysis,
        moisture: Option<MoistureStressTier>,
    ) -> Vec<VariableRateZone> {
        let irrigate = moisture.map(|tier| tier.needs_irrigation()).unwrap_or(false);
        let mut zones = Vec::new();

        for area in &analysis.problem_areas {
            let outline = geometry::octagon(area.point(), self.policy.zone_radius_degrees);

            if area.ndvi < self.policy.fertilizer_ndvi_threshold {
                zones.push(VariableRateZone {
                    polygon: outline.clone(),
                    index_value: area.ndvi,
                    kind: ZoneKind::Fertilizer,
                    application_rate_multiplier: self.policy.fertilizer_rate_multiplier,
                    savings_potential: self.policy.fertilizer_savings.clamp(0.0, 1.0),
                });
            }

            if irrigate {
                zones.push(VariableRateZone {
                    polygon: outline,
                    index_value: area.ndvi,
                    kind: ZoneKind::Irrigation,
                    application_rate_multiplier: self.policy.irrigation_rate_multiplier,
                    savings_potential: self.policy.irrigation_savings.clamp(0.0, 1.0),
                });
            }
        }

        zones
    }
}
