//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Convert an angle in degrees into radians.
pub fn deg_to_rad<T>(degrees: T) -> T
where
    T: Float
{
    degrees.to_radians()
}

/// Convert an angle in radians into degrees.
pub fn rad_to_deg<T>(radians: T) -> T
where
    T: Float
{
    radians.to_degrees()
}

/// Returns true if both values are nonzero and of opposite sign.
///
/// Zero (of either sign) never conflicts with anything.
pub fn signs_conflict<T>(a: T, b: T) -> bool
where
    T: Float
{
    let zero = T::zero();

    a != zero && b != zero && a.is_sign_positive() != b.is_sign_positive()
}

/// Format a value with at most `decimals` decimal places, trimming trailing
/// zeros. Infinite values are shown with the infinity marker and NaN as an
/// empty string.
pub fn format_trimmed(value: f64, decimals: usize) -> String {
    if value.is_nan() {
        return String::new()
    }
    if value.is_infinite() {
        return if value > 0.0 { "∞".into() } else { "-∞".into() }
    }

    let text = format!("{:.*}", decimals, value);
    let text = if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
    else {
        text
    };

    // Don't show negative zero
    if text == "-0" {
        "0".into()
    }
    else {
        text
    }
}
