//! Precision agriculture alert models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::GeoPoint;

/// Rule family an alert came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    WaterStress,
    NutrientDeficiency,
    HarvestTiming,
    VariableRate,
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertType::WaterStress => write!(f, "Water Stress"),
            AlertType::NutrientDeficiency => write!(f, "Nutrient Deficiency"),
            AlertType::HarvestTiming => write!(f, "Harvest Timing"),
            AlertType::VariableRate => write!(f, "Variable Rate"),
        }
    }
}

/// Alert urgency; drives channel selection when dispatching
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertSeverity::Low => write!(f, "low"),
            AlertSeverity::Medium => write!(f, "medium"),
            AlertSeverity::High => write!(f, "high"),
            AlertSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// An alert raised for one field during a monitoring cycle
///
/// `resolved` is only ever changed by the farmer's action downstream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PrecisionAlert {
    pub id: Uuid,
    pub field_id: String,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Vec<GeoPoint>>,
    pub action_required: bool,
    pub created_at: DateTime<Utc>,
    pub resolved: bool,
}

impl PrecisionAlert {
    /// New unresolved alert stamped with the current time
    pub fn new(
        field_id: &str,
        alert_type: AlertType,
        severity: AlertSeverity,
        message: String,
        action_required: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            field_id: field_id.to_string(),
            alert_type,
            severity,
            message,
            geometry: None,
            action_required,
            created_at: Utc::now(),
            resolved: false,
        }
    }

    pub fn with_geometry(mut self, geometry: Vec<GeoPoint>) -> Self {
        self.geometry = Some(geometry);
        self
    }

    /// Short title for notification channels
    pub fn title(&self) -> String {
        format!("{} Alert ({})", self.alert_type, self.severity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_json_enums() {
        let alert = PrecisionAlert::new(
            "field-1",
            AlertType::NutrientDeficiency,
            AlertSeverity::High,
            "Low NDVI".to_string(),
            true,
        );
        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["alertType"], "nutrient_deficiency");
        assert_eq!(json["severity"], "high");
        assert_eq!(json["fieldId"], "field-1");
        assert_eq!(json["resolved"], false);
        assert!(json.get("geometry").is_none());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(AlertSeverity::Critical > AlertSeverity::High);
        assert!(AlertSeverity::High > AlertSeverity::Medium);
        assert!(AlertSeverity::Medium > AlertSeverity::Low);
    }

    #[test]
    fn test_alert_title() {
        let alert = PrecisionAlert::new(
            "f",
            AlertType::WaterStress,
            AlertSeverity::Critical,
            String::new(),
            true,
        );
        assert_eq!(alert.title(), "Water Stress Alert (critical)");
    }
}
