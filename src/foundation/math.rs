/// Clamp into `[0, 1]`, mapping NaN to 0.
pub(crate) fn clamp01(t: f64) -> f64 {
    if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) }
}

/// Frame-rate independent low-pass factor for a time constant of `secs`.
///
/// `secs <= 0` means "no smoothing" and returns 1.
pub(crate) fn smoothing_alpha(dt: f64, secs: f64) -> f64 {
    if secs <= 0.0 || !secs.is_finite() {
        return 1.0;
    }
    if dt <= 0.0 {
        return 0.0;
    }
    1.0 - (-dt / secs).exp()
}

pub(crate) fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
