//! Variable-rate prescription export
//!
//! One CSV row per zone, located at the zone's center, for loading into
//! sprayer and irrigation controllers.

use serde::Serialize;
use shared::{VariableRateZone, ZoneKind};

use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize)]
pub struct PrescriptionRow {
    pub zone: usize,
    pub kind: ZoneKind,
    pub lat: f64,
    pub lng: f64,
    pub index_value: f64,
    pub rate_multiplier: f64,
    pub savings_potential: f64,
}

/// Zones without a usable outline are left out
pub fn prescription_rows(zones: &[VariableRateZone]) -> Vec<PrescriptionRow> {
    zones
        .iter()
        .enumerate()
        .filter_map(|(i, zone)| {
            let center = zone.center()?;
            Some(PrescriptionRow {
                zone: i + 1,
                kind: zone.kind,
                lat: center.lat,
                lng: center.lng,
                index_value: zone.index_value,
                rate_multiplier: zone.application_rate_multiplier,
                savings_potential: zone.savings_potential,
            })
        })
        .collect()
}

/// Render zones as CSV with a header row, even when there are no zones
pub fn export_prescription_csv(zones: &[VariableRateZone]) -> AppResult<String> {
    let rows = prescription_rows(zones);
    let mut wtr = csv::Writer::from_writer(vec![]);

    if rows.is_empty() {
        wtr.write_record([
            "zone",
            "kind",
            "lat",
            "lng",
            "index_value",
            "rate_multiplier",
            "savings_potential",
        ])
        .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
    }

    for row in &rows {
        wtr.serialize(row)
            .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::geometry::octagon;
    use shared::GeoPoint;

    #[test]
    fn test_empty_export_has_header() {
        let csv = export_prescription_csv(&[]).unwrap();
        assert_eq!(
            csv.trim(),
            "zone,kind,lat,lng,index_value,rate_multiplier,savings_potential"
        );
    }

    #[test]
    fn test_rows_follow_zone_order() {
        let zones = vec![
            VariableRateZone {
                polygon: octagon(GeoPoint::new(13.75, 100.5), 0.001),
                index_value: 0.07,
                kind: ZoneKind::Fertilizer,
                application_rate_multiplier: 1.5,
                savings_potential: 0.25,
            },
            VariableRateZone {
                polygon: octagon(GeoPoint::new(13.75, 100.5), 0.001),
                index_value: 0.07,
                kind: ZoneKind::Irrigation,
                application_rate_multiplier: 1.3,
                savings_potential: 0.3,
            },
        ];

        let csv = export_prescription_csv(&zones).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "zone,kind,lat,lng,index_value,rate_multiplier,savings_potential"
        );
        assert!(lines[1].starts_with("1,fertilizer,"));
        assert!(lines[2].starts_with("2,irrigation,"));
    }
}
