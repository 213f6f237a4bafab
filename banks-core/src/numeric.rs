//! Numeric coercion, rounding and formatting rules.
//!
//! These are the exact rules the pipeline applies; they do not depend on any
//! table library's defaults.
//!
//! - Coercion: drop the cell's final character (unit marker or trailing
//!   newline), trim, parse as `f64`. Anything empty, unparseable or non-finite
//!   becomes `None`.
//! - Rounding: half to even at two decimals, on the value scaled by 100.
//! - Formatting: USD values are echoed in shortest round-trip form, derived
//!   values always carry a fractional part.

/// Coerce a raw metric cell into a number.
pub fn coerce_metric(raw: &str) -> Option<f64> {
    let mut chars = raw.chars();
    chars.next_back()?;
    let stripped = chars.as_str().trim();
    if stripped.is_empty() {
        return None;
    }
    stripped.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Magnitude from which an `f64` has no sub-cent digits left to round.
const NO_CENT_FRACTION: f64 = 4_503_599_627_370_496.0 / 100.0;

/// Round to two decimals, ties to even.
///
/// Values too large to carry a fractional cent are returned unchanged, so a
/// finite input always gives a finite output.
pub fn round_half_even_2(value: f64) -> f64 {
    if !value.is_finite() || value.abs() >= NO_CENT_FRACTION {
        return value;
    }
    let scaled = value * 100.0;
    let floor = scaled.floor();
    let diff = scaled - floor;
    let rounded = if diff > 0.5 {
        floor + 1.0
    } else if diff < 0.5 {
        floor
    } else if floor % 2.0 == 0.0 {
        floor
    } else {
        floor + 1.0
    };
    rounded / 100.0
}

/// Format a USD metric for export.
pub fn format_usd(value: f64) -> String {
    format!("{value}")
}

/// Format a derived currency value for export (`80.0`, `345.25`).
pub fn format_derived(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}
