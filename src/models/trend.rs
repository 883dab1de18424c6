//! Trend tuples comparing a current window against the previous one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Direction of a metric relative to the comparison window.
///
/// For lower-is-better metrics `Up` still means "improved".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Neutral,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendDirection::Up => write!(f, "up"),
            TrendDirection::Down => write!(f, "down"),
            TrendDirection::Neutral => write!(f, "neutral"),
        }
    }
}

/// `{value, trend, change}` for one metric. `change` is a non-negative percentage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendTuple {
    pub value: f64,
    pub trend: TrendDirection,
    pub change: f64,
}

impl TrendTuple {
    pub fn neutral(value: f64) -> Self {
        Self {
            value,
            trend: TrendDirection::Neutral,
            change: 0.0,
        }
    }
}

/// Metric name to trend tuple, serialized as a flat JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrendReport(BTreeMap<String, TrendTuple>);

impl TrendReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, metric: impl Into<String>, tuple: TrendTuple) {
        self.0.insert(metric.into(), tuple);
    }

    pub fn get(&self, metric: &str) -> Option<&TrendTuple> {
        self.0.get(metric)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TrendTuple)> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_serializes_flat() {
        let mut report = TrendReport::new();
        report.insert(
            "aim_rating",
            TrendTuple {
                value: 80.0,
                trend: TrendDirection::Up,
                change: 100.0,
            },
        );

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["aim_rating"]["trend"], "up");
        assert_eq!(json["aim_rating"]["change"], 100.0);
    }

    #[test]
    fn test_neutral_tuple() {
        let t = TrendTuple::neutral(12.5);
        assert_eq!(t.trend, TrendDirection::Neutral);
        assert_eq!(t.change, 0.0);
        assert_eq!(t.value, 12.5);
    }
}
