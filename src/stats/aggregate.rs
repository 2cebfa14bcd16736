//! Summary statistics over a bag of extracted values. Order of input is irrelevant.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::fields::StatField;

pub fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

pub fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(sum(values) / values.len() as f64)
    }
}

/// Middle element, or the mean of the two middle elements for an even count.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Consistency {
    pub standard_deviation: Option<f64>,
    pub variance: Option<f64>,
    pub coefficient_of_variation: Option<f64>,
}

/// Population variance (divisor `n`), its square root, and `sd / mean`
/// (absent when the mean is zero).
pub fn consistency(values: &[f64]) -> Consistency {
    let Some(mean) = average(values) else {
        return Consistency::default();
    };
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    let standard_deviation = variance.sqrt();
    Consistency {
        standard_deviation: Some(standard_deviation),
        variance: Some(variance),
        coefficient_of_variation: (mean != 0.0).then(|| standard_deviation / mean),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MinMax {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

pub fn min_max(values: &[f64]) -> MinMax {
    values.iter().fold(MinMax::default(), |acc, &v| MinMax {
        min: Some(acc.min.map_or(v, |m| m.min(v))),
        max: Some(acc.max.map_or(v, |m| m.max(v))),
    })
}

/// Histogram keyed by the stringified value, kept in ascending numeric key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Distribution {
    buckets: Vec<(String, u64)>,
}

impl Distribution {
    pub fn from_values(values: &[f64]) -> Self {
        let mut counts: HashMap<String, u64> = HashMap::new();
        for v in values {
            *counts.entry(value_key(*v)).or_insert(0) += 1;
        }
        let mut buckets: Vec<(String, u64)> = counts.into_iter().collect();
        buckets.sort_by(|(a, _), (b, _)| compare_keys(a, b));
        Self { buckets }
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        self.buckets
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, count)| *count)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.buckets.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.buckets.iter().map(|(_, c)| c).sum()
    }
}

impl Serialize for Distribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.buckets.len()))?;
        for (key, count) in &self.buckets {
            map.serialize_entry(key, count)?;
        }
        map.end()
    }
}

/// Restricts a histogram to the field's closed range, with a zero for every
/// missing integer. Values outside the range are dropped. Fields without a
/// range get the histogram back unchanged.
pub fn fill_distribution_gaps(distribution: &Distribution, field: StatField) -> Distribution {
    let Some(range) = field.value_range() else {
        return distribution.clone();
    };
    let buckets = range
        .map(|i| {
            let key = i.to_string();
            let count = distribution.get(&key).unwrap_or(0);
            (key, count)
        })
        .collect();
    Distribution { buckets }
}

/// Rounds half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// `3.0` → `"3"`, `2.5` → `"2.5"`
fn value_key(value: f64) -> String {
    value.to_string()
}

fn compare_keys(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.cmp(b),
    }
}
