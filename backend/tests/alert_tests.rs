//! Alert rule integration tests
//!
//! Tests for the crop-aware alert rules including:
//! - Harvest timing windows per crop
//! - Water stress tiers
//! - Nutrient deficiency conditions
//! - Whole-pipeline bounds: analysis, zoning and alerts for arbitrary statistics

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::engine::{AlertEvaluator, FieldHealthAnalyzer, ZoneGenerator};
use shared::{
    AlertSeverity, AlertType, CropType, FieldGeometry, GeoPoint, MoistureStressTier,
    VegetationStatistics,
};

fn square() -> FieldGeometry {
    FieldGeometry::new(vec![
        GeoPoint::new(-1.2921, 36.8219),
        GeoPoint::new(-1.2921, 36.8229),
        GeoPoint::new(-1.2911, 36.8229),
        GeoPoint::new(-1.2911, 36.8219),
    ])
    .unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Maize at 0.25 is inside the harvest window
    #[test]
    fn test_maize_harvest_window() {
        let alerts = AlertEvaluator::default()
            .check_harvest_timing("f1", 0.25, &CropType::Maize)
            .unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, AlertSeverity::Medium);
        assert!(alerts[0].message.contains("harvest window"));
    }

    /// Maize at 0.15 is past maturity
    #[test]
    fn test_maize_past_maturity() {
        let alerts = AlertEvaluator::default()
            .check_harvest_timing("f1", 0.15, &CropType::Maize)
            .unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, AlertSeverity::High);
        assert!(alerts[0].message.contains("immediately"));
    }

    #[test]
    fn test_maize_still_growing() {
        assert!(AlertEvaluator::default()
            .check_harvest_timing("f1", 0.5, &CropType::Maize)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_water_stress_tiers() {
        let evaluator = AlertEvaluator::default();
        let critical = evaluator.check_water_stress("f1", MoistureStressTier::Critical);
        assert_eq!(critical.len(), 1);
        assert_eq!(critical[0].severity, AlertSeverity::Critical);
        assert!(evaluator.check_water_stress("f1", MoistureStressTier::Low).is_empty());
    }

    #[test]
    fn test_crop_names_parse_case_insensitively() {
        assert_eq!(CropType::parse("Maize"), CropType::Maize);
        assert_eq!(CropType::parse(" BEANS "), CropType::Beans);
        assert!(matches!(CropType::parse("teff"), CropType::Other(_)));
    }

    #[test]
    fn test_ndmi_tier_boundaries() {
        assert_eq!(MoistureStressTier::from_ndmi(-0.01), MoistureStressTier::Critical);
        assert_eq!(MoistureStressTier::from_ndmi(0.0), MoistureStressTier::High);
        assert_eq!(MoistureStressTier::from_ndmi(0.1), MoistureStressTier::Medium);
        assert_eq!(MoistureStressTier::from_ndmi(0.2), MoistureStressTier::Low);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn crop_strategy() -> impl Strategy<Value = CropType> {
        prop_oneof![
            Just(CropType::Maize),
            Just(CropType::Beans),
            Just(CropType::Tomato),
            Just(CropType::Cassava),
            "[a-z]{3,10}".prop_map(|name| CropType::parse(&name)),
        ]
    }

    fn tier_strategy() -> impl Strategy<Value = Option<MoistureStressTier>> {
        prop_oneof![
            Just(None),
            Just(Some(MoistureStressTier::Low)),
            Just(Some(MoistureStressTier::Medium)),
            Just(Some(MoistureStressTier::High)),
            Just(Some(MoistureStressTier::Critical)),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        // ====================================================================
        // Harvest timing
        // ====================================================================

        /// At most one harvest alert, and its severity tracks the thresholds
        #[test]
        fn prop_harvest_alert_matches_thresholds(ndvi in -1.0f64..1.0, crop in crop_strategy()) {
            let alerts = AlertEvaluator::default().check_harvest_timing("f1", ndvi, &crop).unwrap();
            let thresholds = crop.harvest_thresholds();

            prop_assert!(alerts.len() <= 1);
            match alerts.first() {
                Some(alert) if ndvi <= thresholds.late => prop_assert_eq!(alert.severity, AlertSeverity::High),
                Some(alert) => {
                    prop_assert!(ndvi <= thresholds.optimal);
                    prop_assert_eq!(alert.severity, AlertSeverity::Medium);
                }
                None => prop_assert!(ndvi > thresholds.optimal),
            }
        }

        /// Non-finite input is rejected, never turned into an alert
        #[test]
        fn prop_non_finite_ndvi_rejected(crop in crop_strategy()) {
            let evaluator = AlertEvaluator::default();
            prop_assert!(evaluator.check_harvest_timing("f1", f64::NAN, &crop).is_err());
            prop_assert!(evaluator.check_harvest_timing("f1", f64::INFINITY, &crop).is_err());
        }

        // ====================================================================
        // Whole pipeline
        // ====================================================================

        /// Arbitrary statistics always produce bounded, well-formed output
        #[test]
        fn prop_pipeline_bounds(
            mean in -1.0f64..1.0,
            std_dev in 0.0f64..1.0,
            seed in any::<u64>(),
            crop in crop_strategy(),
            tier in tier_strategy(),
        ) {
            let geometry = square();
            let stats = VegetationStatistics::new(mean, mean - std_dev, mean + std_dev, std_dev);
            let mut rng = StdRng::seed_from_u64(seed);

            let analysis = FieldHealthAnalyzer::default().analyze(&geometry, &stats, &mut rng).unwrap();
            let zones = ZoneGenerator::default().generate(&analysis, tier);
            let alerts = AlertEvaluator::default().evaluate("f1", &analysis, mean, &crop, tier, &zones);

            prop_assert!((0.0..=1.0).contains(&analysis.field_health));
            prop_assert!(analysis.problem_areas.len() <= 3);
            prop_assert!(analysis.problem_areas.iter().all(|p| p.ndvi >= 0.0));
            prop_assert!(zones.len() <= 2 * analysis.problem_areas.len());
            prop_assert!(zones.iter().all(|z| (0.0..=1.0).contains(&z.savings_potential)));
            prop_assert!(zones.iter().all(|z| z.polygon.first() == z.polygon.last()));
            prop_assert!(alerts.iter().all(|a| a.field_id == "f1" && !a.resolved));
            prop_assert!(alerts.iter().filter(|a| a.alert_type == AlertType::VariableRate).count() <= 1);
        }
    }
}
