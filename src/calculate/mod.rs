//! Statistics calculation engine.
//!
//! Pure reductions over match facts:
//! - Aim accuracy, crosshair placement and aim rating
//! - Clutch success rates
//! - Per-map summaries with role complexion
//! - Overview and impact rating
//! - Current vs previous window trends
//!
//! Values stay unrounded through aggregation and are rounded once, when
//! written into an output struct.

pub mod aim;
pub mod clutch;
pub mod complexion;
pub mod maps;
pub mod overview;
pub mod trend;

pub use aim::{aggregate_aim, RawAim};
pub use clutch::{aggregate_clutches, RawClutchRates};
pub use complexion::{ComplexionError, ComplexionOutcome, ComplexionScorer, SummaryComplexionScorer};
pub use maps::{aggregate_maps, raw_map_rates, MatchOutcomes, RawMapRates};
pub use overview::{aggregate_overview, impact_rating, RawOverview};
pub use trend::build_trend;

/// `numerator / denominator`, or 0 when the denominator is 0.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// `part / whole * 100`, or 0 when `whole` is 0.
pub fn percentage(part: u32, whole: u32) -> f64 {
    ratio(part as f64, whole as f64) * 100.0
}

/// Arithmetic mean, 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    ratio(values.iter().sum(), values.len() as f64)
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Clamp into the 0-100 score range.
pub fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}
