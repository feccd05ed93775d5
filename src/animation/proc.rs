use crate::animation::ease::Ease;
use crate::animation::timeline::{Position, Timeline};
use crate::animation::tween::{LoopMode, Repeat, Tween};
use crate::foundation::core::{TargetId, Vec2};
use crate::foundation::error::{ScrublineError, ScrublineResult};

/// Injectable randomness for decorative motion.
///
/// Decorative drift is the only randomized behaviour in the engine; seeding it makes traces
/// reproducible.
pub trait RandomSource {
    /// Uniform sample in `[0, 1)`.
    fn next_f64(&mut self) -> f64;

    /// Uniform sample in `[lo, hi)`.
    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

/// SplitMix64 generator.
#[derive(Clone, Copy, Debug)]
pub struct Rng64 {
    state: u64,
}

impl Rng64 {
    /// Seeded generator.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Next raw 64-bit value.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

impl RandomSource for Rng64 {
    fn next_f64(&mut self) -> f64 {
        // 53 bits of precision.
        let v = self.next_u64() >> 11;
        (v as f64) * (1.0 / ((1u64 << 53) as f64))
    }
}

/// Parameters for ambient floating motion.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DriftSpec {
    /// Maximum translation away from the rest pose, per axis (pixels).
    pub amplitude: Vec2,
    /// Maximum rotation away from the rest pose (degrees).
    pub rotation_deg: f64,
    /// Half-period range in seconds; each target picks a value in `[min, max)`.
    pub half_period: (f64, f64),
    /// Easing for each swing.
    pub ease: Ease,
}

impl Default for DriftSpec {
    fn default() -> Self {
        Self {
            amplitude: Vec2::new(6.0, 10.0),
            rotation_deg: 3.0,
            half_period: (1.6, 2.8),
            ease: Ease::InOutSine,
        }
    }
}

impl DriftSpec {
    fn validate(&self) -> ScrublineResult<()> {
        let (lo, hi) = self.half_period;
        if !(lo.is_finite() && hi.is_finite()) || lo <= 0.0 || hi < lo {
            return Err(ScrublineError::animation(
                "drift half_period must satisfy 0 < min <= max",
            ));
        }
        if !(self.amplitude.x.is_finite()
            && self.amplitude.y.is_finite()
            && self.rotation_deg.is_finite())
        {
            return Err(ScrublineError::animation("drift amplitudes must be finite"));
        }
        Ok(())
    }
}

/// Build an infinite yoyo timeline that floats `targets` around their rest pose.
///
/// Each target gets its own seeded direction, period and phase so neighbours do not move in
/// lockstep.
pub fn drift_loop(
    targets: &[TargetId],
    spec: DriftSpec,
    rng: &mut dyn RandomSource,
) -> ScrublineResult<Timeline> {
    spec.validate()?;
    let mut tl = Timeline::new();
    for &target in targets {
        let half = rng.range(spec.half_period.0, spec.half_period.1);
        let dx = sign(&mut *rng) * rng.range(0.5, 1.0) * spec.amplitude.x;
        let dy = sign(&mut *rng) * rng.range(0.5, 1.0) * spec.amplitude.y;
        let rot = sign(&mut *rng) * rng.range(0.0, 1.0) * spec.rotation_deg;
        let phase = rng.range(0.0, half);

        let tween = Tween::new(target, half)
            .to("x", dx)
            .to("y", dy)
            .to("rotation", rot)
            .ease(spec.ease)
            .delay(phase)
            .repeat(Repeat::Infinite(LoopMode::Yoyo));
        tl = tl.add(tween, Position::at(0.0))?;
    }
    Ok(tl)
}

fn sign(rng: &mut dyn RandomSource) -> f64 {
    if rng.next_f64() < 0.5 { -1.0 } else { 1.0 }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/proc.rs"]
mod tests;
