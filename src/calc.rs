use std::cmp::Ordering;

/// Half-up rounding used across the portal's reports:
/// `Int(10^p * x + 0.5) / 10^p`
pub fn round_off(x: f64, places: i32) -> f64 {
    let scale = 10_f64.powi(places);
    ((scale * x) + 0.5).floor() / scale
}

pub fn round_off_1_decimal(x: f64) -> f64 {
    round_off(x, 1)
}

pub fn round_off_2_decimals(x: f64) -> f64 {
    round_off(x, 2)
}

/// Arithmetic mean; empty input is 0.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / (values.len() as f64)
}

/// Population standard deviation of `values` measured around `center`
/// (which is not necessarily the mean of `values`).
pub fn population_std_dev(values: &[f64], center: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values
        .iter()
        .map(|v| (v - center).powi(2))
        .sum::<f64>()
        / (values.len() as f64);
    variance.sqrt()
}

/// Mean of both halves of a chronological series split at `floor(n/2)`.
/// Returns `None` when there are fewer than two values.
pub fn split_half_means(values: &[f64]) -> Option<(f64, f64)> {
    if values.len() < 2 {
        return None;
    }
    let mid = values.len() / 2;
    Some((
        round_off_2_decimals(mean(&values[..mid])),
        round_off_2_decimals(mean(&values[mid..])),
    ))
}

/// Descending comparison for scores; NaN compares equal so sorts stay stable.
pub fn cmp_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}
