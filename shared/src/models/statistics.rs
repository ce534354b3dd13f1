//! Vegetation index statistics and moisture stress tiers

use serde::{Deserialize, Serialize};

use crate::error::{FieldError, FieldResult};

/// Remote-sensing index a statistics payload was computed over
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum VegetationIndex {
    /// Normalized Difference Vegetation Index
    Ndvi,
    /// Normalized Difference Moisture Index
    Ndmi,
}

impl VegetationIndex {
    pub fn as_str(&self) -> &'static str {
        match self {
            VegetationIndex::Ndvi => "NDVI",
            VegetationIndex::Ndmi => "NDMI",
        }
    }
}

impl std::fmt::Display for VegetationIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Aggregate statistics of one index over a field polygon and time window
///
/// Values are nominally in [-1, 1]. Consumers clamp rather than trust them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VegetationStatistics {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
}

impl VegetationStatistics {
    pub fn new(mean: f64, min: f64, max: f64, std_dev: f64) -> Self {
        Self {
            mean,
            min,
            max,
            std_dev,
        }
    }

    /// Reject payloads that cannot be reasoned about at all
    pub fn validate(&self) -> FieldResult<()> {
        let values = [
            ("mean", self.mean),
            ("min", self.min),
            ("max", self.max),
            ("stdDev", self.std_dev),
        ];
        for (name, value) in values {
            if !value.is_finite() {
                return Err(FieldError::InvalidStatistics(format!(
                    "{} is not a finite number",
                    name
                )));
            }
        }
        if self.std_dev < 0.0 {
            return Err(FieldError::InvalidStatistics(
                "stdDev cannot be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Coarse irrigation-need classification derived from a moisture index
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MoistureStressTier {
    Low,
    Medium,
    High,
    Critical,
}

impl MoistureStressTier {
    /// Classify an NDMI mean; drier canopies have lower NDMI
    pub fn from_ndmi(ndmi_mean: f64) -> Self {
        if ndmi_mean < 0.0 {
            MoistureStressTier::Critical
        } else if ndmi_mean < 0.1 {
            MoistureStressTier::High
        } else if ndmi_mean < 0.2 {
            MoistureStressTier::Medium
        } else {
            MoistureStressTier::Low
        }
    }

    /// Whether the tier warrants irrigation zoning
    pub fn needs_irrigation(&self) -> bool {
        matches!(self, MoistureStressTier::High | MoistureStressTier::Critical)
    }
}

impl std::str::FromStr for MoistureStressTier {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(MoistureStressTier::Low),
            "medium" => Ok(MoistureStressTier::Medium),
            "high" => Ok(MoistureStressTier::High),
            "critical" => Ok(MoistureStressTier::Critical),
            other => Err(FieldError::InvalidInput {
                field: "moistureTier".to_string(),
                message: format!("unknown moisture stress tier '{}'", other),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistics_validation() {
        assert!(VegetationStatistics::new(0.5, 0.1, 0.9, 0.1).validate().is_ok());
        assert!(VegetationStatistics::new(f64::NAN, 0.1, 0.9, 0.1).validate().is_err());
        assert!(VegetationStatistics::new(0.5, 0.1, f64::INFINITY, 0.1).validate().is_err());
        assert!(VegetationStatistics::new(0.5, 0.1, 0.9, -0.1).validate().is_err());
    }

    #[test]
    fn test_statistics_json_shape() {
        let stats = VegetationStatistics::new(0.25, 0.05, 0.6, 0.18);
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["stdDev"], 0.18);
    }

    #[test]
    fn test_moisture_tier_from_ndmi() {
        assert_eq!(MoistureStressTier::from_ndmi(-0.2), MoistureStressTier::Critical);
        assert_eq!(MoistureStressTier::from_ndmi(0.05), MoistureStressTier::High);
        assert_eq!(MoistureStressTier::from_ndmi(0.15), MoistureStressTier::Medium);
        assert_eq!(MoistureStressTier::from_ndmi(0.35), MoistureStressTier::Low);
    }

    #[test]
    fn test_moisture_tier_parse() {
        assert_eq!("Critical".parse::<MoistureStressTier>().unwrap(), MoistureStressTier::Critical);
        assert!("flooded".parse::<MoistureStressTier>().is_err());
    }

    #[test]
    fn test_irrigation_need() {
        assert!(MoistureStressTier::Critical.needs_irrigation());
        assert!(MoistureStressTier::High.needs_irrigation());
        assert!(!MoistureStressTier::Medium.needs_irrigation());
        assert!(!MoistureStressTier::Low.needs_irrigation());
    }
}
