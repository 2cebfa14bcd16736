use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::Serialize;

/// One of the four tracked day-entry metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatField {
    Mood,
    Weight,
    Diving,
    Painting,
}

/// Every accepted spelling, canonical first, then the pre-tracker flat field names.
const ALIASES: &[(&str, StatField)] = &[
    ("mood", StatField::Mood),
    ("weight", StatField::Weight),
    ("diving", StatField::Diving),
    ("painting", StatField::Painting),
    ("moodRating", StatField::Mood),
    ("dives", StatField::Diving),
    ("minutesPainted", StatField::Painting),
];

impl StatField {
    pub const ALL: [StatField; 4] = [
        StatField::Mood,
        StatField::Weight,
        StatField::Diving,
        StatField::Painting,
    ];

    /// Resolves a canonical or legacy name. Matching is exact.
    pub fn normalize(name: &str) -> Option<Self> {
        ALIASES
            .iter()
            .find(|(alias, _)| *alias == name)
            .map(|(_, field)| *field)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatField::Mood => "mood",
            StatField::Weight => "weight",
            StatField::Diving => "diving",
            StatField::Painting => "painting",
        }
    }

    /// Top-level document attribute used before tracker blocks existed.
    pub fn legacy_key(self) -> &'static str {
        match self {
            StatField::Mood => "moodRating",
            StatField::Weight => "weight",
            StatField::Diving => "dives",
            StatField::Painting => "minutesPainted",
        }
    }

    /// Decimal places used when rendering series values.
    pub fn precision(self) -> u32 {
        match self {
            StatField::Weight => 2,
            _ => 1,
        }
    }

    /// Closed integer range for fields that have a fixed-bucket histogram.
    pub fn value_range(self) -> Option<RangeInclusive<i64>> {
        match self {
            StatField::Mood => Some(1..=10),
            StatField::Diving => Some(0..=5),
            StatField::Weight | StatField::Painting => None,
        }
    }

    pub fn supports_distribution(self) -> bool {
        self.value_range().is_some()
    }

    /// Comma-separated canonical names for error messages.
    pub fn allowed_names() -> String {
        Self::ALL
            .iter()
            .map(|f| f.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for StatField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid field parameter. Allowed fields: {}", StatField::allowed_names())]
pub struct UnknownField;

impl FromStr for StatField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::normalize(s).ok_or(UnknownField)
    }
}
