//! The synthetic value written into variables no read supplied.
//!
//! Every element a rank writes at step `s` of `n` is
//! `rank + (s - 1) / 10^digits(n - 1)`, so the integer part names the
//! producing rank and the fraction names the step.

/// Number of decimal digits in `n`; `digits(0) == 1`.
pub fn digits(n: u64) -> u32 {
    n.checked_ilog10().map_or(1, |d| d + 1)
}

/// Divisor that turns a 0-based step index into the fractional part.
pub fn step_divisor(steps: u64) -> f64 {
    10f64.powi(digits(steps.saturating_sub(1)) as i32)
}

/// Value rank `rank` writes at 1-based `step` of a `steps`-step run.
///
/// Consumers use this to check what they read.
///
/// ```
/// use weir_engine::expected_value;
///
/// assert_eq!(expected_value(3, 1, 2), 3.0);
/// assert_eq!(expected_value(3, 2, 2), 3.1);
/// assert_eq!(expected_value(0, 12, 100), 0.11);
/// ```
pub fn expected_value(rank: usize, step: u64, steps: u64) -> f64 {
    rank as f64 + step.saturating_sub(1) as f64 / step_divisor(steps)
}
