/// Rounds to two decimals, resolving exact halves to the even neighbour.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Rounds the exact decimal expansion of `value` to two places.
///
/// Unlike [`round2`], no intermediate `value * 100.0` is formed, so
/// `12.005` (stored just above the half) becomes `12.01`.
pub fn round2_exact(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{value:.2}").parse().unwrap_or(value)
}

/// Percentage of `part` in `total`. Returns 0.0 when `total` is zero.
pub fn pct(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}
