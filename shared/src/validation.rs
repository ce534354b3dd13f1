//! Validation utilities for field monitoring inputs

use crate::error::{FieldError, FieldResult};
use crate::types::GeoPoint;

/// Maximum length accepted for external field identifiers
pub const MAX_FIELD_ID_LEN: usize = 128;

/// Maximum length accepted for crop names
pub const MAX_CROP_NAME_LEN: usize = 64;

// ============================================================================
// Geometry Validations
// ============================================================================

/// Validate that every point is a finite WGS84 coordinate
pub fn validate_coordinates(points: &[GeoPoint]) -> FieldResult<()> {
    for (i, p) in points.iter().enumerate() {
        if !p.lat.is_finite() || !p.lng.is_finite() {
            return Err(FieldError::InvalidGeometry(format!(
                "point {} has a non-finite coordinate",
                i
            )));
        }
        if !(-90.0..=90.0).contains(&p.lat) {
            return Err(FieldError::InvalidGeometry(format!(
                "point {} latitude {} is outside [-90, 90]",
                i, p.lat
            )));
        }
        if !(-180.0..=180.0).contains(&p.lng) {
            return Err(FieldError::InvalidGeometry(format!(
                "point {} longitude {} is outside [-180, 180]",
                i, p.lng
            )));
        }
    }
    Ok(())
}

// ============================================================================
// Identifier Validations
// ============================================================================

/// Validate an external field identifier (alphanumeric, `-`, `_`, `.`)
pub fn validate_field_id(field_id: &str) -> FieldResult<()> {
    if field_id.is_empty() {
        return Err(invalid("fieldId", "field id cannot be empty"));
    }
    if field_id.len() > MAX_FIELD_ID_LEN {
        return Err(invalid("fieldId", "field id is too long"));
    }
    if !field_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(invalid(
            "fieldId",
            "field id may only contain letters, digits, '-', '_' and '.'",
        ));
    }
    Ok(())
}

/// Validate a free-form crop name
pub fn validate_crop_name(crop: &str) -> FieldResult<()> {
    let trimmed = crop.trim();
    if trimmed.is_empty() {
        return Err(invalid("cropType", "crop type cannot be empty"));
    }
    if trimmed.len() > MAX_CROP_NAME_LEN {
        return Err(invalid("cropType", "crop type is too long"));
    }
    Ok(())
}

fn invalid(field: &str, message: &str) -> FieldError {
    FieldError::InvalidInput {
        field: field.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_coordinates_valid() {
        let points = [
            GeoPoint::new(-1.2921, 36.8219), // Nairobi
            GeoPoint::new(6.5244, 3.3792),   // Lagos
            GeoPoint::new(90.0, 180.0),
        ];
        assert!(validate_coordinates(&points).is_ok());
    }

    #[test]
    fn test_validate_coordinates_out_of_range() {
        assert!(validate_coordinates(&[GeoPoint::new(91.0, 0.0)]).is_err());
        assert!(validate_coordinates(&[GeoPoint::new(0.0, -180.5)]).is_err());
        assert!(validate_coordinates(&[GeoPoint::new(f64::NAN, 0.0)]).is_err());
    }

    #[test]
    fn test_validate_field_id() {
        assert!(validate_field_id("farm-12_field.3").is_ok());
        assert!(validate_field_id("").is_err());
        assert!(validate_field_id("field/1").is_err());
        assert!(validate_field_id(&"x".repeat(MAX_FIELD_ID_LEN + 1)).is_err());
    }

    #[test]
    fn test_validate_crop_name() {
        assert!(validate_crop_name("maize").is_ok());
        assert!(validate_crop_name("   ").is_err());
    }
}
