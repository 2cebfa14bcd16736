use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::day_entry::{coerce_number, lenient_text};

/// Fields of a `garmin-dives` document needed for summary statistics. Values of
/// the wrong type read as absent so the dive itself still counts.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiveSummary {
    #[serde(default, deserialize_with = "lenient_number")]
    pub duration_seconds: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub max_depth_meters: Option<f64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub dive_type: Option<String>,
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(coerce_number(&Value::deserialize(deserializer)?))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiveType {
    Course,
    Instructing,
    Recreational,
}

impl DiveType {
    /// Case-insensitive; surrounding whitespace is ignored.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "course" => Some(DiveType::Course),
            "instructing" => Some(DiveType::Instructing),
            "recreational" => Some(DiveType::Recreational),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DiveType::Course => "course",
            DiveType::Instructing => "instructing",
            DiveType::Recreational => "recreational",
        }
    }
}

impl DiveSummary {
    pub fn kind(&self) -> Option<DiveType> {
        self.dive_type.as_deref().and_then(DiveType::parse)
    }
}

/// Pointer to a neighbouring dive in start-time order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjacentDive {
    pub start_time_local: String,
}

impl AdjacentDive {
    pub fn from_doc(doc: &serde_json::Value) -> Option<Self> {
        let start = doc.get("startTimeLocal")?.as_str()?.trim();
        (!start.is_empty()).then(|| AdjacentDive {
            start_time_local: start.to_string(),
        })
    }
}
