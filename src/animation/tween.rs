use crate::animation::ease::Ease;
use crate::animation::target::{AnimatableHost, WriteMode, WriteSet};
use crate::animation::value::{Lerp, PropValue, PropertyKey};
use crate::foundation::core::TargetId;
use crate::foundation::error::{ScrublineError, ScrublineResult};

/// Looping strategy for infinitely repeating tweens and timelines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopMode {
    /// Jump back to the start at every iteration boundary.
    Restart,
    /// Alternate forward and time-reversed iterations.
    Yoyo,
}

/// Repeat count for a tween or timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Repeat {
    /// Play `1 + n` iterations.
    Count(u32),
    /// Repeat forever. Only legal for idle-loop animations.
    Infinite(LoopMode),
}

impl Default for Repeat {
    fn default() -> Self {
        Self::Count(0)
    }
}

impl Repeat {
    /// Return `true` for [`Repeat::Infinite`].
    pub fn is_infinite(self) -> bool {
        matches!(self, Self::Infinite(_))
    }
}

/// Maps a local time onto `(iteration, fraction)` for repeat/yoyo playback.
///
/// Shared by tweens and timelines so both follow the same repeat semantics.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct RepeatClock {
    pub(crate) duration: f64,
    pub(crate) repeat: Repeat,
    pub(crate) yoyo: bool,
    pub(crate) repeat_delay: f64,
}

impl RepeatClock {
    /// Length of all iterations, `INFINITY` for infinite repeats.
    pub(crate) fn total(self) -> f64 {
        match self.repeat {
            Repeat::Count(n) => {
                let n = f64::from(n);
                self.duration * (n + 1.0) + self.repeat_delay * n
            }
            Repeat::Infinite(_) => f64::INFINITY,
        }
    }

    pub(crate) fn reverses(self, iteration: u64) -> bool {
        let yoyo = match self.repeat {
            Repeat::Count(_) => self.yoyo,
            Repeat::Infinite(mode) => mode == LoopMode::Yoyo,
        };
        yoyo && iteration % 2 == 1
    }

    /// Direction-corrected fraction of one iteration in `[0, 1]` (not yet eased).
    ///
    /// Returns `(fraction, reversed)`; callers ease `fraction` and the reversed flag tells them
    /// the curve is being played time-reversed.
    pub(crate) fn locate(self, t: f64) -> (f64, bool) {
        if !(t >= 0.0) {
            return (0.0, false);
        }
        let last = match self.repeat {
            Repeat::Count(n) => Some(u64::from(n)),
            Repeat::Infinite(_) => None,
        };

        if self.duration <= 0.0 {
            let iteration = last.unwrap_or(0);
            return (1.0, self.reverses(iteration));
        }

        if let Some(last) = last
            && t >= self.total()
        {
            return (1.0, self.reverses(last));
        }

        let cycle = self.duration + self.repeat_delay;
        let mut iteration = (t / cycle).floor().max(0.0) as u64;
        if let Some(last) = last {
            iteration = iteration.min(last);
        }
        let within = t - (iteration as f64) * cycle;
        let frac = (within / self.duration).clamp(0.0, 1.0);
        (frac, self.reverses(iteration))
    }

    pub(crate) fn iteration_local(self, t: f64) -> f64 {
        let (frac, reversed) = self.locate(t);
        let local = frac * self.duration;
        if reversed { self.duration - local } else { local }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Endpoint {
    Fixed(PropValue),
    /// Read from the target the first time the tween is evaluated, then frozen.
    Captured(Option<PropValue>),
    /// Captured like `Captured`, then shifted by `delta`.
    Offset {
        delta: PropValue,
        resolved: Option<PropValue>,
    },
}

#[derive(Clone, Debug, PartialEq)]
struct PropTrack {
    key: PropertyKey,
    from: Endpoint,
    to: Endpoint,
}

/// A single property-interpolation instruction on one target.
///
/// `to` tracks capture their start value from the target on first evaluation; `from` tracks
/// capture their end value; `from_to` tracks are fully explicit. After capture, evaluation is a
/// pure function of local time.
#[derive(Clone, Debug, PartialEq)]
pub struct Tween {
    target: TargetId,
    tracks: Vec<PropTrack>,
    duration: f64,
    ease: Ease,
    delay: f64,
    repeat: Repeat,
    yoyo: bool,
    repeat_delay: f64,
}

impl Tween {
    /// Start a tween on `target` lasting `duration` seconds per iteration.
    pub fn new(target: TargetId, duration: f64) -> Self {
        Self {
            target,
            tracks: Vec::new(),
            duration,
            ease: Ease::Linear,
            delay: 0.0,
            repeat: Repeat::default(),
            yoyo: false,
            repeat_delay: 0.0,
        }
    }

    /// Animate `key` from its current value to `value`.
    pub fn to(mut self, key: impl Into<PropertyKey>, value: impl Into<PropValue>) -> Self {
        self.tracks.push(PropTrack {
            key: key.into(),
            from: Endpoint::Captured(None),
            to: Endpoint::Fixed(value.into()),
        });
        self
    }

    /// Animate `key` from its current value by `delta` (`"+=N"` style).
    pub fn by(mut self, key: impl Into<PropertyKey>, delta: impl Into<PropValue>) -> Self {
        self.tracks.push(PropTrack {
            key: key.into(),
            from: Endpoint::Captured(None),
            to: Endpoint::Offset {
                delta: delta.into(),
                resolved: None,
            },
        });
        self
    }

    /// Animate `key` from `value` to its current value.
    pub fn from(mut self, key: impl Into<PropertyKey>, value: impl Into<PropValue>) -> Self {
        self.tracks.push(PropTrack {
            key: key.into(),
            from: Endpoint::Fixed(value.into()),
            to: Endpoint::Captured(None),
        });
        self
    }

    /// Animate `key` between two explicit values.
    pub fn from_to(
        mut self,
        key: impl Into<PropertyKey>,
        from: impl Into<PropValue>,
        to: impl Into<PropValue>,
    ) -> Self {
        self.tracks.push(PropTrack {
            key: key.into(),
            from: Endpoint::Fixed(from.into()),
            to: Endpoint::Fixed(to.into()),
        });
        self
    }

    /// Set the easing curve.
    pub fn ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    /// Hold the start pose for `secs` before interpolating.
    pub fn delay(mut self, secs: f64) -> Self {
        self.delay = secs;
        self
    }

    /// Set repeat count or infinite loop semantics.
    pub fn repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    /// Reverse odd iterations of a finite repeat.
    pub fn yoyo(mut self, yoyo: bool) -> Self {
        self.yoyo = yoyo;
        self
    }

    /// Pause between iterations.
    pub fn repeat_delay(mut self, secs: f64) -> Self {
        self.repeat_delay = secs;
        self
    }

    /// Target addressed by this tween.
    pub fn target(&self) -> TargetId {
        self.target
    }

    /// Properties written by this tween.
    pub fn keys(&self) -> impl Iterator<Item = &PropertyKey> {
        self.tracks.iter().map(|t| &t.key)
    }

    /// Lead-in before interpolation begins.
    pub fn start_delay(&self) -> f64 {
        self.delay
    }

    /// Repeat setting.
    pub fn repeat_mode(&self) -> Repeat {
        self.repeat
    }

    /// Length including delay and all iterations; `INFINITY` for infinite repeats.
    pub fn total_duration(&self) -> f64 {
        self.delay + self.clock().total()
    }

    fn clock(&self) -> RepeatClock {
        RepeatClock {
            duration: self.duration,
            repeat: self.repeat,
            yoyo: self.yoyo,
            repeat_delay: self.repeat_delay,
        }
    }

    /// Validate static invariants.
    pub fn validate(&self) -> ScrublineResult<()> {
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(ScrublineError::animation(
                "Tween duration must be finite and >= 0",
            ));
        }
        if !self.delay.is_finite() || self.delay < 0.0 {
            return Err(ScrublineError::animation("Tween delay must be finite and >= 0"));
        }
        if !self.repeat_delay.is_finite() || self.repeat_delay < 0.0 {
            return Err(ScrublineError::animation(
                "Tween repeat_delay must be finite and >= 0",
            ));
        }
        if self.repeat.is_infinite() && self.duration + self.repeat_delay <= 0.0 {
            return Err(ScrublineError::animation(
                "infinite Tween needs a non-zero iteration length",
            ));
        }
        if !self.ease.validate() {
            return Err(ScrublineError::animation("Tween ease parameters are invalid"));
        }
        for track in &self.tracks {
            for end in [&track.from, &track.to] {
                let v = match end {
                    Endpoint::Fixed(v) | Endpoint::Offset { delta: v, .. } => v,
                    Endpoint::Captured(_) => continue,
                };
                if !v.is_finite() {
                    return Err(ScrublineError::animation(format!(
                        "Tween value for '{}' is not finite",
                        track.key
                    )));
                }
                if matches!(end, Endpoint::Offset { .. }) && matches!(v, PropValue::Color(_)) {
                    return Err(ScrublineError::animation(format!(
                        "Tween offset for '{}' must be a number or vector",
                        track.key
                    )));
                }
            }
        }
        Ok(())
    }

    /// Eased interpolation factor at `local` seconds after the tween's placement.
    ///
    /// Zero until the delay has elapsed, including for zero-duration tweens.
    pub fn eased_progress(&self, local: f64) -> f64 {
        if !(local >= self.delay) {
            return 0.0;
        }
        let (frac, reversed) = self.clock().locate(local - self.delay);
        let frac = if reversed { 1.0 - frac } else { frac };
        self.ease.apply(frac)
    }

    /// Evaluate at `local` seconds and queue resulting writes into `out`.
    pub(crate) fn render<H>(&mut self, local: f64, host: &H, out: &mut WriteSet, mode: WriteMode)
    where
        H: AnimatableHost + ?Sized,
    {
        if !host.contains(self.target) {
            out.note_missing(self.target);
            return;
        }

        if !(local >= self.delay) {
            // Not started: write start values already known and capture nothing else.
            for track in &mut self.tracks {
                if matches!(
                    track.from,
                    Endpoint::Captured(None) | Endpoint::Offset { resolved: None, .. }
                ) {
                    continue;
                }
                let from = resolve(&mut track.from, host, out, self.target, &track.key);
                resolve(&mut track.to, host, out, self.target, &track.key);
                if let Some(from) = from {
                    out.put(self.target, &track.key, from, mode);
                }
            }
            return;
        }

        let k = self.eased_progress(local);
        for track in &mut self.tracks {
            let from = resolve(&mut track.from, host, out, self.target, &track.key);
            let to = resolve(&mut track.to, host, out, self.target, &track.key);
            let (Some(from), Some(to)) = (from, to) else {
                continue;
            };
            out.put(self.target, &track.key, PropValue::lerp(&from, &to, k), mode);
        }
    }

    /// Forget captured endpoints so the next evaluation re-reads the target.
    pub fn invalidate_captures(&mut self) {
        for track in &mut self.tracks {
            for end in [&mut track.from, &mut track.to] {
                match end {
                    Endpoint::Captured(v) | Endpoint::Offset { resolved: v, .. } => *v = None,
                    Endpoint::Fixed(_) => {}
                }
            }
        }
    }
}

impl Tween {
    /// Take over endpoints `previous` already captured, track by track, when target and key match.
    pub(crate) fn adopt_captures(&mut self, previous: &Tween) {
        if self.target != previous.target {
            return;
        }
        for (mine, theirs) in self.tracks.iter_mut().zip(&previous.tracks) {
            if mine.key != theirs.key {
                continue;
            }
            for (end, prev) in [(&mut mine.from, &theirs.from), (&mut mine.to, &theirs.to)] {
                match (end, prev) {
                    (Endpoint::Captured(slot @ None), Endpoint::Captured(Some(v)))
                    | (
                        Endpoint::Offset { resolved: slot @ None, .. },
                        Endpoint::Offset { resolved: Some(v), .. },
                    ) => *slot = Some(*v),
                    _ => {}
                }
            }
        }
    }
}

fn resolve<H>(
    end: &mut Endpoint,
    host: &H,
    out: &WriteSet,
    target: TargetId,
    key: &PropertyKey,
) -> Option<PropValue>
where
    H: AnimatableHost + ?Sized,
{
    match end {
        Endpoint::Fixed(v) => Some(*v),
        Endpoint::Captured(Some(v)) => Some(*v),
        Endpoint::Captured(slot) => {
            let v = out.read(host, target, key)?;
            *slot = Some(v);
            Some(v)
        }
        Endpoint::Offset {
            resolved: Some(v), ..
        } => Some(*v),
        Endpoint::Offset { delta, resolved } => {
            let v = out.read(host, target, key)?.offset_by(*delta)?;
            *resolved = Some(v);
            Some(v)
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/tween.rs"]
mod tests;
