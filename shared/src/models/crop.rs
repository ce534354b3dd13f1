//! Crop models and per-crop harvest thresholds

use serde::{Deserialize, Serialize};

/// NDVI thresholds marking harvest readiness as the canopy senesces
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct HarvestThresholds {
    /// At or below this the crop is inside its harvest window
    pub optimal: f64,
    /// At or below this harvest is overdue
    pub late: f64,
}

/// Crops with known harvest thresholds
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CropType {
    Maize,
    Beans,
    Tomato,
    Cassava,
    /// Any other crop; uses maize thresholds
    Other(String),
}

impl CropType {
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "maize" | "corn" => CropType::Maize,
            "beans" | "bean" => CropType::Beans,
            "tomato" | "tomatoes" => CropType::Tomato,
            "cassava" => CropType::Cassava,
            _ => CropType::Other(name.trim().to_string()),
        }
    }

    pub fn harvest_thresholds(&self) -> HarvestThresholds {
        match self {
            CropType::Maize | CropType::Other(_) => HarvestThresholds {
                optimal: 0.3,
                late: 0.2,
            },
            CropType::Beans => HarvestThresholds {
                optimal: 0.25,
                late: 0.15,
            },
            CropType::Tomato => HarvestThresholds {
                optimal: 0.4,
                late: 0.3,
            },
            CropType::Cassava => HarvestThresholds {
                optimal: 0.2,
                late: 0.1,
            },
        }
    }
}

impl Default for CropType {
    fn default() -> Self {
        CropType::Maize
    }
}

impl std::fmt::Display for CropType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CropType::Maize => write!(f, "maize"),
            CropType::Beans => write!(f, "beans"),
            CropType::Tomato => write!(f, "tomato"),
            CropType::Cassava => write!(f, "cassava"),
            CropType::Other(name) => write!(f, "{}", name),
        }
    }
}

impl From<String> for CropType {
    fn from(name: String) -> Self {
        CropType::parse(&name)
    }
}

impl From<&str> for CropType {
    fn from(name: &str) -> Self {
        CropType::parse(name)
    }
}

impl From<CropType> for String {
    fn from(crop: CropType) -> Self {
        crop.to_string()
    }
}
