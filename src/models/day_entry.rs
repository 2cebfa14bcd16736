use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::dates::parse_stored_date;
use crate::stats::fields::StatField;

/// One calendar day of self-tracked metrics, as stored in `day-entries`.
///
/// Older documents carry flat fields (`moodRating`, `weight`, `dives`,
/// `minutesPainted`, `note`); newer ones carry typed tracker blocks. Both may be present.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayEntry {
    #[serde(deserialize_with = "deserialize_stored_date")]
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "lenient_trackers")]
    pub trackers: Vec<Tracker>,
    #[serde(default)]
    pub mood_rating: Option<Value>,
    #[serde(default)]
    pub weight: Option<Value>,
    #[serde(default)]
    pub dives: Option<Value>,
    #[serde(default)]
    pub minutes_painted: Option<Value>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub note: Option<String>,
}

/// Tracker block keyed by its `blockType` tag. At most one per kind per entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "blockType", rename_all = "lowercase")]
pub enum Tracker {
    Mood(TrackerBlock),
    Weight(TrackerBlock),
    Diving(TrackerBlock),
    Painting(TrackerBlock),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackerBlock {
    /// Number for weight/diving/painting, numeric string for mood (select option).
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub note: Option<String>,
}

impl Tracker {
    pub fn field(&self) -> Option<StatField> {
        match self {
            Tracker::Mood(_) => Some(StatField::Mood),
            Tracker::Weight(_) => Some(StatField::Weight),
            Tracker::Diving(_) => Some(StatField::Diving),
            Tracker::Painting(_) => Some(StatField::Painting),
            Tracker::Unknown => None,
        }
    }

    pub fn block(&self) -> Option<&TrackerBlock> {
        match self {
            Tracker::Mood(b) | Tracker::Weight(b) | Tracker::Diving(b) | Tracker::Painting(b) => {
                Some(b)
            }
            Tracker::Unknown => None,
        }
    }
}

impl DayEntry {
    pub fn flat_value(&self, field: StatField) -> Option<&Value> {
        match field {
            StatField::Mood => self.mood_rating.as_ref(),
            StatField::Weight => self.weight.as_ref(),
            StatField::Diving => self.dives.as_ref(),
            StatField::Painting => self.minutes_painted.as_ref(),
        }
    }

    pub fn tracker(&self, field: StatField) -> Option<&TrackerBlock> {
        self.trackers
            .iter()
            .find(|t| t.field() == Some(field))
            .and_then(Tracker::block)
    }

    /// Numeric value for `field`: the flat field wins, the tracker block fills in
    /// when the flat field is absent or not numeric.
    pub fn numeric_value(&self, field: StatField) -> Option<f64> {
        self.flat_value(field)
            .and_then(coerce_number)
            .or_else(|| {
                self.tracker(field)
                    .and_then(|b| b.value.as_ref())
                    .and_then(coerce_number)
            })
    }

    /// Non-blank note on the field's tracker block.
    pub fn tracker_note(&self, field: StatField) -> Option<&str> {
        self.tracker(field)
            .and_then(|b| b.note.as_deref())
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }
}

/// Numbers and numeric strings become `f64`; everything else, including blank
/// strings and non-finite results, is treated as absent.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.parse::<f64>().ok()?
        }
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn deserialize_stored_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_stored_date(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognized date \"{}\"", raw)))
}

/// A block that does not parse (no `blockType`, wrong shape) becomes `Unknown`
/// instead of failing the whole entry. A non-array `trackers` reads as empty.
fn lenient_trackers<'de, D>(deserializer: D) -> Result<Vec<Tracker>, D::Error>
where
    D: Deserializer<'de>,
{
    let blocks = match Value::deserialize(deserializer)? {
        Value::Array(blocks) => blocks,
        _ => return Ok(Vec::new()),
    };
    Ok(blocks
        .into_iter()
        .map(|block| serde_json::from_value(block).unwrap_or(Tracker::Unknown))
        .collect())
}

/// Strings pass through; any other JSON value reads as absent.
pub(crate) fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(Some(text)),
        _ => Ok(None),
    }
}
