//! Crop-aware alert rules
//!
//! Every check is a pure function of its inputs. The backend runs them
//! concurrently and isolates failures per check.

use crate::error::{FieldError, FieldResult};
use crate::models::{
    AlertSeverity, AlertType, CropType, FieldHealthAnalysis, MoistureStressTier, PrecisionAlert,
    VariableRateZone,
};
use crate::policy::AlertPolicy;

/// Evaluates water stress, nutrient deficiency and harvest timing rules
#[derive(Debug, Clone, Default)]
pub struct AlertEvaluator {
    policy: AlertPolicy,
}

impl AlertEvaluator {
    pub fn new(policy: AlertPolicy) -> Self {
        Self { policy }
    }

    /// Critical and high moisture stress raise an irrigation alert
    pub fn check_water_stress(&self, field_id: &str, tier: MoistureStressTier) -> Vec<PrecisionAlert> {
        match tier {
            MoistureStressTier::Critical => vec![PrecisionAlert::new(
                field_id,
                AlertType::WaterStress,
                AlertSeverity::Critical,
                "Critical water stress detected. Irrigate within 24 hours to prevent yield loss."
                    .to_string(),
                true,
            )],
            MoistureStressTier::High => vec![PrecisionAlert::new(
                field_id,
                AlertType::WaterStress,
                AlertSeverity::High,
                "High water stress detected. Increase irrigation frequency by about 30%."
                    .to_string(),
                true,
            )],
            MoistureStressTier::Medium | MoistureStressTier::Low => Vec::new(),
        }
    }

    /// Low NDVI together with low overall health suggests a nutrient problem
    pub fn check_nutrient_deficiency(
        &self,
        field_id: &str,
        ndvi: f64,
        field_health: f64,
    ) -> FieldResult<Vec<PrecisionAlert>> {
        ensure_finite("ndvi", ndvi)?;
        ensure_finite("fieldHealth", field_health)?;

        if ndvi < self.policy.nutrient_ndvi_threshold
            && field_health < self.policy.nutrient_health_threshold
        {
            return Ok(vec![PrecisionAlert::new(
                field_id,
                AlertType::NutrientDeficiency,
                AlertSeverity::High,
                format!(
                    "Possible nutrient deficiency: NDVI is {:.2} and field health is {:.0}%. \
                     Run a soil test and apply fertilizer as recommended.",
                    ndvi,
                    field_health * 100.0
                ),
                true,
            )]);
        }

        Ok(Vec::new())
    }

    /// Compare canopy senescence against the crop's harvest thresholds
    pub fn check_harvest_timing(
        &self,
        field_id: &str,
        ndvi: f64,
        crop: &CropType,
    ) -> FieldResult<Vec<PrecisionAlert>> {
        ensure_finite("ndvi", ndvi)?;

        let thresholds = crop.harvest_thresholds();

        if ndvi <= thresholds.late {
            Ok(vec![PrecisionAlert::new(
                field_id,
                AlertType::HarvestTiming,
                AlertSeverity::High,
                format!(
                    "The {} crop is past optimal maturity (NDVI {:.2}). Harvest immediately to avoid losses.",
                    crop, ndvi
                ),
                true,
            )])
        } else if ndvi <= thresholds.optimal {
            Ok(vec![PrecisionAlert::new(
                field_id,
                AlertType::HarvestTiming,
                AlertSeverity::Medium,
                format!(
                    "The {} crop is entering its optimal harvest window (NDVI {:.2}). Plan harvest within 1-2 weeks.",
                    crop, ndvi
                ),
                true,
            )])
        } else {
            Ok(Vec::new())
        }
    }

    /// Informational alert summarising generated treatment zones
    pub fn variable_rate_summary(&self, field_id: &str, zones: &[VariableRateZone]) -> Vec<PrecisionAlert> {
        let best = zones.iter().max_by(|a, b| {
            a.savings_potential
                .partial_cmp(&b.savings_potential)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        match best {
            Some(zone) => vec![PrecisionAlert::new(
                field_id,
                AlertType::VariableRate,
                AlertSeverity::Low,
                format!(
                    "{} variable-rate zone(s) identified. Targeted {} application could save up to {:.0}% of inputs.",
                    zones.len(),
                    zone.kind,
                    zone.savings_potential * 100.0
                ),
                false,
            )
            .with_geometry(zone.polygon.clone())],
            None => Vec::new(),
        }
    }

    /// Run every rule sequentially, dropping any rule that fails
    ///
    /// Used where no runtime is available (offline recomputation, WASM).
    pub fn evaluate(
        &self,
        field_id: &str,
        analysis: &FieldHealthAnalysis,
        ndvi: f64,
        crop: &CropType,
        moisture: Option<MoistureStressTier>,
        zones: &[VariableRateZone],
    ) -> Vec<PrecisionAlert> {
        let mut alerts = Vec::new();
        if let Some(tier) = moisture {
            alerts.extend(self.check_water_stress(field_id, tier));
        }
        alerts.extend(
            self.check_nutrient_deficiency(field_id, ndvi, analysis.field_health)
                .unwrap_or_default(),
        );
        alerts.extend(self.check_harvest_timing(field_id, ndvi, crop).unwrap_or_default());
        alerts.extend(self.variable_rate_summary(field_id, zones));
        alerts
    }
}

fn ensure_finite(name: &str, value: f64) -> FieldResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(FieldError::InvalidInput {
            field: name.to_string(),
            message: "value is not a finite number".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ZoneKind;
    use crate::types::GeoPoint;

    fn evaluator() -> AlertEvaluator {
        AlertEvaluator::default()
    }

    #[test]
    fn test_water_stress_critical() {
        let alerts = evaluator().check_water_stress("f1", MoistureStressTier::Critical);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, AlertSeverity::Critical);
        assert!(alerts[0].message.contains("24 hours"));
        assert!(alerts[0].action_required);
    }

    #[test]
    fn test_water_stress_high() {
        let alerts = evaluator().check_water_stress("f1", MoistureStressTier::High);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, AlertSeverity::High);
        assert!(alerts[0].message.contains("30%"));
    }

    #[test]
    fn test_water_stress_low_and_medium_silent() {
        assert!(evaluator().check_water_stress("f1", MoistureStressTier::Low).is_empty());
        assert!(evaluator().check_water_stress("f1", MoistureStressTier::Medium).is_empty());
    }

    #[test]
    fn test_nutrient_deficiency_requires_both_conditions() {
        let alerts = evaluator().check_nutrient_deficiency("f1", 0.25, 0.25).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, AlertSeverity::High);
        assert!(alerts[0].message.contains("0.25"));

        assert!(evaluator().check_nutrient_deficiency("f1", 0.25, 0.6).unwrap().is_empty());
        assert!(evaluator().check_nutrient_deficiency("f1", 0.45, 0.3).unwrap().is_empty());
    }

    #[test]
    fn test_nutrient_deficiency_rejects_nan() {
        assert!(evaluator().check_nutrient_deficiency("f1", f64::NAN, 0.2).is_err());
    }

    #[test]
    fn test_harvest_timing_maize() {
        let window = evaluator().check_harvest_timing("f1", 0.25, &CropType::Maize).unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].severity, AlertSeverity::Medium);
        assert!(window[0].message.contains("harvest window"));

        let late = evaluator().check_harvest_timing("f1", 0.15, &CropType::Maize).unwrap();
        assert_eq!(late.len(), 1);
        assert_eq!(late[0].severity, AlertSeverity::High);
        assert!(late[0].message.contains("immediately"));

        assert!(evaluator().check_harvest_timing("f1", 0.5, &CropType::Maize).unwrap().is_empty());
    }

    #[test]
    fn test_harvest_timing_boundaries() {
        // optimal is inclusive, late is inclusive
        let at_optimal = evaluator().check_harvest_timing("f1", 0.3, &CropType::Maize).unwrap();
        assert_eq!(at_optimal[0].severity, AlertSeverity::Medium);
        let at_late = evaluator().check_harvest_timing("f1", 0.2, &CropType::Maize).unwrap();
        assert_eq!(at_late[0].severity, AlertSeverity::High);
    }

    #[test]
    fn test_harvest_timing_per_crop() {
        let tomato = evaluator().check_harvest_timing("f1", 0.35, &CropType::Tomato).unwrap();
        assert_eq!(tomato[0].severity, AlertSeverity::Medium);
        let cassava = evaluator().check_harvest_timing("f1", 0.35, &CropType::Cassava).unwrap();
        assert!(cassava.is_empty());
        let unknown = evaluator()
            .check_harvest_timing("f1", 0.25, &CropType::parse("sorghum"))
            .unwrap();
        assert_eq!(unknown[0].severity, AlertSeverity::Medium);
    }

    #[test]
    fn test_variable_rate_summary() {
        assert!(evaluator().variable_rate_summary("f1", &[]).is_empty());

        let zone = VariableRateZone {
            polygon: crate::geometry::octagon(GeoPoint::new(0.0, 0.0), 0.001),
            index_value: 0.2,
            kind: ZoneKind::Irrigation,
            application_rate_multiplier: 1.3,
            savings_potential: 0.3,
        };
        let alerts = evaluator().variable_rate_summary("f1", &[zone]);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::VariableRate);
        assert_eq!(alerts[0].severity, AlertSeverity::Low);
        assert!(!alerts[0].action_required);
        assert!(alerts[0].geometry.is_some());
        assert!(alerts[0].message.contains("30%"));
    }
}
