//! Trend comparison between the current and previous windows.

use super::round_to;
use crate::models::{TrendDirection, TrendReport, TrendTuple};

/// Compare unrounded `current` and `previous` aggregates.
///
/// `change` is the absolute percentage difference relative to `previous`,
/// rounded to one decimal: 100 when only `previous` is 0, 0 when both are.
/// The direction follows the sign of `current - previous` and is inverted
/// for lower-is-better metrics. Only `value` is rounded to `decimals`.
pub fn build_trend(
    current: f64,
    previous: f64,
    lower_is_better: bool,
    decimals: u32,
) -> TrendTuple {
    let value = round_to(current, decimals);
    if previous == 0.0 {
        if current == 0.0 {
            return TrendTuple::neutral(value);
        }
        return TrendTuple {
            value,
            trend: direction(current, lower_is_better),
            change: 100.0,
        };
    }

    let delta = current - previous;
    let change = round_to((delta / previous * 100.0).abs(), 1);

    TrendTuple {
        value,
        trend: direction(delta, lower_is_better),
        change,
    }
}

fn direction(delta: f64, lower_is_better: bool) -> TrendDirection {
    let improved = if lower_is_better {
        delta < 0.0
    } else {
        delta > 0.0
    };
    if delta == 0.0 {
        TrendDirection::Neutral
    } else if improved {
        TrendDirection::Up
    } else {
        TrendDirection::Down
    }
}

/// A metric compared across windows, both sides unrounded.
#[derive(Debug, Clone, Copy)]
pub struct MetricPair {
    pub name: &'static str,
    pub current: f64,
    pub previous: f64,
    pub lower_is_better: bool,
    /// Decimals for the reported value
    pub decimals: u32,
}

impl MetricPair {
    pub fn higher(name: &'static str, current: f64, previous: f64) -> Self {
        Self {
            name,
            current,
            previous,
            lower_is_better: false,
            decimals: 1,
        }
    }

    pub fn lower(name: &'static str, current: f64, previous: f64) -> Self {
        Self {
            lower_is_better: true,
            ..Self::higher(name, current, previous)
        }
    }

    pub fn with_decimals(mut self, decimals: u32) -> Self {
        self.decimals = decimals;
        self
    }
}

/// Build a report from metric pairs.
pub fn build_report(pairs: &[MetricPair]) -> TrendReport {
    let mut report = TrendReport::new();
    for pair in pairs {
        report.insert(
            pair.name,
            build_trend(
                pair.current,
                pair.previous,
                pair.lower_is_better,
                pair.decimals,
            ),
        );
    }
    report
}
