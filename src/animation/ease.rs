/// Easing functions used to map normalized animation progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ease {
    /// Linear interpolation.
    #[default]
    Linear,
    /// Quadratic ease-in.
    InQuad,
    /// Quadratic ease-out.
    OutQuad,
    /// Quadratic ease-in/out.
    InOutQuad,
    /// Cubic ease-in.
    InCubic,
    /// Cubic ease-out.
    OutCubic,
    /// Cubic ease-in/out.
    InOutCubic,
    /// Sinusoidal ease-in/out, used for ambient idle motion.
    InOutSine,
    /// Exponential ease-out.
    OutExpo,
    /// Overshooting ease-out (`s = 1.70158`).
    OutBack,
    /// CSS-style cubic bezier with control points `(x1, y1)` and `(x2, y2)`.
    CubicBezier {
        /// First control point x, in `[0, 1]`.
        x1: f64,
        /// First control point y.
        y1: f64,
        /// Second control point x, in `[0, 1]`.
        x2: f64,
        /// Second control point y.
        y2: f64,
    },
}

impl Ease {
    /// Apply this easing function to normalized progress `t` in `[0, 1]`.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::InQuad => t * t,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(2) / 2.0)
                }
            }
            Self::InCubic => t * t * t,
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
            Self::InOutSine => -((std::f64::consts::PI * t).cos() - 1.0) / 2.0,
            Self::OutExpo => {
                if t >= 1.0 {
                    1.0
                } else {
                    1.0 - 2f64.powf(-10.0 * t)
                }
            }
            Self::OutBack => {
                const C1: f64 = 1.70158;
                const C3: f64 = C1 + 1.0;
                1.0 + C3 * (t - 1.0).powi(3) + C1 * (t - 1.0).powi(2)
            }
            Self::CubicBezier { x1, y1, x2, y2 } => cubic_bezier(x1, y1, x2, y2, t),
        }
    }

    /// Check curve parameters (bezier x coordinates must stay in `[0, 1]`).
    pub fn validate(self) -> bool {
        match self {
            Self::CubicBezier { x1, y1, x2, y2 } => {
                [x1, y1, x2, y2].iter().all(|v| v.is_finite())
                    && (0.0..=1.0).contains(&x1)
                    && (0.0..=1.0).contains(&x2)
            }
            _ => true,
        }
    }
}

fn bezier_coord(p1: f64, p2: f64, s: f64) -> f64 {
    let inv = 1.0 - s;
    3.0 * inv * inv * s * p1 + 3.0 * inv * s * s * p2 + s * s * s
}

fn bezier_slope(p1: f64, p2: f64, s: f64) -> f64 {
    let inv = 1.0 - s;
    3.0 * inv * inv * p1 + 6.0 * inv * s * (p2 - p1) + 3.0 * s * s * (1.0 - p2)
}

fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64, t: f64) -> f64 {
    if t <= 0.0 || t >= 1.0 {
        return t;
    }

    // Newton first, bisection when the slope flattens out.
    let mut s = t;
    for _ in 0..8 {
        let err = bezier_coord(x1, x2, s) - t;
        if err.abs() < 1e-7 {
            return bezier_coord(y1, y2, s);
        }
        let d = bezier_slope(x1, x2, s);
        if d.abs() < 1e-6 {
            break;
        }
        s = (s - err / d).clamp(0.0, 1.0);
    }

    let (mut lo, mut hi) = (0.0, 1.0);
    s = t;
    for _ in 0..48 {
        let x = bezier_coord(x1, x2, s);
        if (x - t).abs() < 1e-7 {
            break;
        }
        if x < t {
            lo = s;
        } else {
            hi = s;
        }
        s = (lo + hi) / 2.0;
    }
    bezier_coord(y1, y2, s)
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
