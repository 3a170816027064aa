//! Numeric conversion helpers centralizing safe casts and display rounding.

use num_traits::cast::cast;

/// Floor a f64 and cast it to usize, returning 0 for non-finite or negative values.
#[must_use]
pub fn floor_f64_to_usize(value: f64) -> usize {
    if !value.is_finite() || value < 0.0 {
        return 0;
    }
    cast::<f64, usize>(value.floor()).unwrap_or(0)
}

/// Ceil a f64 and cast it to usize, returning 0 for non-finite or negative values.
#[must_use]
pub fn ceil_f64_to_usize(value: f64) -> usize {
    if !value.is_finite() || value < 0.0 {
        return 0;
    }
    cast::<f64, usize>(value.ceil()).unwrap_or(0)
}

/// Round a f64 and clamp it to the i32 range, returning 0 for NaN values.
#[must_use]
pub fn round_f64_to_i32(value: f64) -> i32 {
    if value.is_nan() {
        return 0;
    }
    let min = cast::<i32, f64>(i32::MIN).unwrap_or(f64::MIN);
    let max = cast::<i32, f64>(i32::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(min, max).round();
    cast::<f64, i32>(clamped).unwrap_or(0)
}

/// Round a f64 and clamp it to the i64 range, returning 0 for NaN values.
#[must_use]
pub fn round_f64_to_i64(value: f64) -> i64 {
    if value.is_nan() {
        return 0;
    }
    let min = cast::<i64, f64>(i64::MIN).unwrap_or(f64::MIN);
    let max = cast::<i64, f64>(i64::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(min, max).round();
    cast::<f64, i64>(clamped).unwrap_or(0)
}

/// Convert usize to f64 while allowing precision loss in a single location.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

/// Round to a fixed number of decimal places for display-stable output.
#[must_use]
pub fn round_places(value: f64, places: i32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// Format a rounded currency amount with thousands separators ("12,345").
#[must_use]
pub fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (offset, ch) in digits.chars().enumerate() {
        if offset > 0 && (digits.len() - offset) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0 {
        grouped.insert(0, '-');
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_casts_guard_non_finite_and_negative() {
        assert_eq!(floor_f64_to_usize(2.9), 2);
        assert_eq!(floor_f64_to_usize(-1.0), 0);
        assert_eq!(floor_f64_to_usize(f64::NAN), 0);
        assert_eq!(ceil_f64_to_usize(2.1), 3);
        assert_eq!(ceil_f64_to_usize(f64::INFINITY), 0);
    }

    #[test]
    fn rounders_cover_ranges() {
        assert_eq!(round_f64_to_i32(49.5), 50);
        assert_eq!(round_f64_to_i32(f64::NAN), 0);
        assert_eq!(round_f64_to_i64(12_344.6), 12_345);
        assert_eq!(round_f64_to_i64(f64::from(i32::MAX) * 2.0), 4_294_967_294);
    }

    #[test]
    fn round_places_matches_display_contract() {
        assert!((round_places(1.234_567, 4) - 1.234_6).abs() < 1e-12);
        assert!((round_places(-0.005, 2) + 0.01).abs() < 1e-12);
        assert!((round_places(f64::NAN, 2) - 0.0).abs() < 1e-12);
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(12_345), "12,345");
        assert_eq!(format_thousands(1_234_567), "1,234,567");
        assert_eq!(format_thousands(-5_000), "-5,000");
    }
}
