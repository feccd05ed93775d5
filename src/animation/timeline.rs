use crate::animation::target::{AnimatableHost, WriteMode, WriteSet};
use crate::animation::tween::{Repeat, RepeatClock, Tween};
use crate::foundation::core::TargetId;
use crate::foundation::error::{ScrublineError, ScrublineResult};
use std::collections::BTreeMap;

const MAX_CUE_ITERATIONS: u64 = 64;

/// Where a child is placed inside its parent timeline.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    /// Seconds from the timeline start.
    Absolute(f64),
    /// Seconds after the previous entry ends (negative values overlap).
    AfterPrevious(f64),
    /// Seconds after the previous entry starts.
    WithPrevious(f64),
    /// Seconds after a named label.
    Label(String, f64),
}

impl Default for Position {
    fn default() -> Self {
        Self::AfterPrevious(0.0)
    }
}

impl Position {
    /// Shorthand for [`Position::AfterPrevious`].
    pub fn after(offset: f64) -> Self {
        Self::AfterPrevious(offset)
    }

    /// Shorthand for [`Position::WithPrevious`].
    pub fn with_previous(offset: f64) -> Self {
        Self::WithPrevious(offset)
    }

    /// Shorthand for [`Position::Absolute`].
    pub fn at(secs: f64) -> Self {
        Self::Absolute(secs)
    }
}

/// A timeline entry.
#[derive(Clone, Debug, PartialEq)]
pub enum Child {
    /// Leaf interpolation.
    Tween(Tween),
    /// Nested timeline.
    Timeline(Box<Timeline>),
    /// Zero-length marker reported when playback crosses it.
    Cue(String),
    /// Zero-length named position; does not count as "previous" for relative placement.
    Label(String),
}

impl From<Tween> for Child {
    fn from(t: Tween) -> Self {
        Self::Tween(t)
    }
}

impl From<Timeline> for Child {
    fn from(t: Timeline) -> Self {
        Self::Timeline(Box::new(t))
    }
}

impl Child {
    fn total_duration(&self) -> f64 {
        match self {
            Self::Tween(t) => t.total_duration(),
            Self::Timeline(t) => t.total_duration(),
            Self::Cue(_) | Self::Label(_) => 0.0,
        }
    }

    fn lead_in(&self) -> f64 {
        match self {
            Self::Tween(t) => t.start_delay(),
            _ => 0.0,
        }
    }

    fn render<H>(&mut self, local: f64, host: &H, out: &mut WriteSet, mode: WriteMode)
    where
        H: AnimatableHost + ?Sized,
    {
        match self {
            Self::Tween(t) => t.render(local, host, out, mode),
            Self::Timeline(t) => {
                let inner = t.local_time(local);
                t.render_local(inner, host, out, mode);
            }
            Self::Cue(_) | Self::Label(_) => {}
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Entry {
    position: Position,
    child: Child,
    start: f64,
}

/// Ordered, time-positioned collection of tweens, nested timelines and cues.
///
/// Relative positions are resolved whenever an entry is added; once a timeline is handed to a
/// scheduler only its playhead changes. Setting the playhead re-applies every child's state, so
/// the same playhead always yields the same target state.
#[derive(Clone, Debug, PartialEq)]
pub struct Timeline {
    entries: Vec<Entry>,
    order: Vec<usize>,
    labels: BTreeMap<String, f64>,
    duration: f64,
    repeat: Repeat,
    yoyo: bool,
    repeat_delay: f64,
    playhead: f64,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Timeline {
    /// Create an empty timeline.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            order: Vec::new(),
            labels: BTreeMap::new(),
            duration: 0.0,
            repeat: Repeat::default(),
            yoyo: false,
            repeat_delay: 0.0,
            playhead: 0.0,
        }
    }

    /// Set repeat count or infinite loop semantics for the whole timeline.
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

    /// Append a child at `position`.
    pub fn add(mut self, child: impl Into<Child>, position: Position) -> ScrublineResult<Self> {
        let child = child.into();
        match &child {
            Child::Tween(t) => t.validate()?,
            Child::Timeline(t) => t.validate()?,
            Child::Cue(_) => {}
            Child::Label(name) => {
                if self.labels.contains_key(name) {
                    return Err(ScrublineError::animation(format!(
                        "duplicate timeline label '{name}'"
                    )));
                }
            }
        }
        self.entries.push(Entry {
            position,
            child,
            start: 0.0,
        });
        if let Err(e) = self.resolve() {
            self.entries.pop();
            self.resolve()?;
            return Err(e);
        }
        Ok(self)
    }

    /// Append a tween right after the previous entry.
    pub fn then(self, tween: Tween) -> ScrublineResult<Self> {
        self.add(tween, Position::default())
    }

    /// Add a named label.
    pub fn label(self, name: impl Into<String>, position: Position) -> ScrublineResult<Self> {
        self.add(Child::Label(name.into()), position)
    }

    /// Add a cue reported as [`EngineEvent::Cue`](crate::EngineEvent::Cue) during playback.
    pub fn cue(self, name: impl Into<String>, position: Position) -> ScrublineResult<Self> {
        self.add(Child::Cue(name.into()), position)
    }

    /// Place `tweens` one after another, `each` seconds apart.
    ///
    /// The first tween lands at `position`; every following one starts `each` seconds after the
    /// previous one started. An empty list leaves the timeline unchanged.
    pub fn stagger(
        mut self,
        tweens: impl IntoIterator<Item = Tween>,
        each: f64,
        position: Position,
    ) -> ScrublineResult<Self> {
        if !each.is_finite() || each < 0.0 {
            return Err(ScrublineError::animation(
                "stagger interval must be finite and >= 0",
            ));
        }
        let mut next = position;
        for tween in tweens {
            self = self.add(tween, next)?;
            next = Position::WithPrevious(each);
        }
        Ok(self)
    }

    /// Walk entries in insertion order and rebuild the absolute offset table.
    fn resolve(&mut self) -> ScrublineResult<()> {
        let mut labels = BTreeMap::new();
        let mut prev_start = 0.0f64;
        let mut prev_end = 0.0f64;
        let mut duration = 0.0f64;

        for entry in &mut self.entries {
            let start = match &entry.position {
                Position::Absolute(t) => *t,
                Position::AfterPrevious(d) => prev_end + d,
                Position::WithPrevious(d) => prev_start + d,
                Position::Label(name, d) => {
                    let base = labels.get(name).copied().ok_or_else(|| {
                        ScrublineError::animation(format!("unknown timeline label '{name}'"))
                    })?;
                    base + d
                }
            };
            if !start.is_finite() {
                return Err(ScrublineError::animation(
                    "timeline entry cannot be placed after an infinitely repeating child",
                ));
            }
            if start < 0.0 {
                return Err(ScrublineError::animation(format!(
                    "timeline entry resolves to negative offset {start}"
                )));
            }
            entry.start = start;

            if let Child::Label(name) = &entry.child {
                labels.insert(name.clone(), start);
                continue;
            }
            let end = start + entry.child.total_duration();
            prev_start = start;
            prev_end = end;
            duration = duration.max(end);
        }

        let mut order: Vec<usize> = (0..self.entries.len()).collect();
        order.sort_by(|&a, &b| {
            let ea = &self.entries[a];
            let eb = &self.entries[b];
            (ea.start + ea.child.lead_in()).total_cmp(&(eb.start + eb.child.lead_in()))
        });

        self.labels = labels;
        self.order = order;
        self.duration = duration;
        Ok(())
    }

    /// Validate repeat settings and children.
    pub fn validate(&self) -> ScrublineResult<()> {
        if !self.repeat_delay.is_finite() || self.repeat_delay < 0.0 {
            return Err(ScrublineError::animation(
                "Timeline repeat_delay must be finite and >= 0",
            ));
        }
        if self.repeat.is_infinite() && self.duration + self.repeat_delay <= 0.0 {
            return Err(ScrublineError::animation(
                "infinite Timeline needs a non-zero iteration length",
            ));
        }
        for e in &self.entries {
            match &e.child {
                Child::Tween(t) => t.validate()?,
                Child::Timeline(t) => t.validate()?,
                Child::Cue(_) | Child::Label(_) => {}
            }
        }
        Ok(())
    }

    fn clock(&self) -> RepeatClock {
        RepeatClock {
            duration: self.duration,
            repeat: self.repeat,
            yoyo: self.yoyo,
            repeat_delay: self.repeat_delay,
        }
    }

    /// Length of one iteration: the latest child end.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Length of all iterations; `INFINITY` when anything repeats forever.
    pub fn total_duration(&self) -> f64 {
        if !self.duration.is_finite() {
            return f64::INFINITY;
        }
        self.clock().total()
    }

    /// Return `true` when this timeline or any child repeats forever.
    pub fn is_infinite(&self) -> bool {
        self.total_duration().is_infinite()
    }

    /// Resolved absolute start of each non-label entry, in insertion order.
    pub fn resolved_offsets(&self) -> Vec<f64> {
        self.entries
            .iter()
            .filter(|e| !matches!(e.child, Child::Label(_)))
            .map(|e| e.start)
            .collect()
    }

    /// Resolved offset of a label.
    pub fn label_offset(&self, name: &str) -> Option<f64> {
        self.labels.get(name).copied()
    }

    /// Current playhead in seconds.
    pub fn playhead(&self) -> f64 {
        self.playhead
    }

    /// Playhead as a fraction of the total duration (`0` for infinite or empty timelines).
    pub fn progress(&self) -> f64 {
        let total = self.total_duration();
        if total.is_finite() && total > 0.0 {
            self.playhead / total
        } else {
            0.0
        }
    }

    /// Every target addressed anywhere in this timeline.
    pub fn targets(&self) -> Vec<TargetId> {
        let mut out = Vec::new();
        for e in &self.entries {
            match &e.child {
                Child::Tween(t) => out.push(t.target()),
                Child::Timeline(t) => out.extend(t.targets()),
                Child::Cue(_) | Child::Label(_) => {}
            }
        }
        out.sort();
        out.dedup();
        out
    }

    pub(crate) fn clamp_playhead(&self, t: f64) -> f64 {
        if t.is_nan() {
            return 0.0;
        }
        t.clamp(0.0, self.total_duration())
    }

    /// Map a raw playhead onto the time inside the current iteration.
    pub(crate) fn local_time(&self, t: f64) -> f64 {
        if !self.duration.is_finite() {
            return t.max(0.0);
        }
        self.clock().iteration_local(t)
    }

    pub(crate) fn render_local<H>(&mut self, t: f64, host: &H, out: &mut WriteSet, mode: WriteMode)
    where
        H: AnimatableHost + ?Sized,
    {
        for i in 0..self.order.len() {
            let entry = &mut self.entries[self.order[i]];
            let local = t - entry.start;
            let started = local >= entry.child.lead_in();
            let child_mode = if started { mode } else { WriteMode::FillMissing };
            entry.child.render(local, host, out, child_mode);
        }
    }

    /// Store `t` (clamped to `[0, total]`) without touching any target.
    pub(crate) fn store_playhead(&mut self, t: f64) -> f64 {
        self.playhead = self.clamp_playhead(t);
        self.playhead
    }

    /// Evaluate the stored playhead into `out`.
    pub(crate) fn render_into<H>(&mut self, host: &H, out: &mut WriteSet)
    where
        H: AnimatableHost + ?Sized,
    {
        let local = self.local_time(self.playhead);
        self.render_local(local, host, out, WriteMode::Overwrite);
    }

    /// Clamp `t` to `[0, total]`, evaluate every child and write the result onto `host`.
    ///
    /// Returns targets that were missing; they are skipped, never fatal.
    pub fn set_playhead<H>(&mut self, t: f64, host: &mut H) -> Vec<TargetId>
    where
        H: AnimatableHost + ?Sized,
    {
        self.store_playhead(t);
        let mut out = WriteSet::new();
        self.render_into(&*host, &mut out);
        out.apply(host)
    }

    /// Collect cues crossed while the playhead moves from `from` to `to` (raw time).
    ///
    /// Forward motion reports cues in `(from, to]`, backward motion in `[to, from)`.
    /// `include_from` additionally reports cues sitting exactly on `from`.
    pub(crate) fn crossed_cues(&self, from: f64, to: f64, include_from: bool, out: &mut Vec<String>) {
        if from == to && !include_from {
            return;
        }
        let (lo, hi) = if to >= from { (from, to) } else { (to, from) };

        if !self.duration.is_finite() || self.duration <= 0.0 {
            self.cues_in_window(lo, hi, from, to, include_from, out);
            return;
        }

        let clock = self.clock();
        let cycle = self.duration + self.repeat_delay;
        let last_iter = match self.repeat {
            Repeat::Count(n) => u64::from(n),
            Repeat::Infinite(_) => u64::MAX,
        };
        let first = ((lo.max(0.0)) / cycle).floor() as u64;
        let last = ((hi.max(0.0)) / cycle).floor() as u64;
        let last = last.min(last_iter).min(first.saturating_add(MAX_CUE_ITERATIONS));

        for k in first..=last {
            let base = k as f64 * cycle;
            let reversed = clock.reverses(k);
            let map = |raw: f64| {
                let local = (raw - base).clamp(0.0, self.duration);
                if reversed { self.duration - local } else { local }
            };
            let (a, b) = (map(from), map(to));
            let (wlo, whi) = if a <= b { (a, b) } else { (b, a) };
            self.cues_in_window(wlo, whi, a, b, include_from && k == first, out);
        }
    }

    fn cues_in_window(
        &self,
        lo: f64,
        hi: f64,
        from: f64,
        to: f64,
        include_from: bool,
        out: &mut Vec<String>,
    ) {
        let forward = to >= from;
        for &i in &self.order {
            let e = &self.entries[i];
            match &e.child {
                Child::Cue(name) => {
                    let c = e.start;
                    let hit = if forward {
                        (c > lo || (include_from && c == lo)) && c <= hi
                    } else {
                        c >= lo && (c < hi || (include_from && c == hi))
                    };
                    if hit {
                        out.push(name.clone());
                    }
                }
                Child::Timeline(t) => {
                    t.crossed_cues(from - e.start, to - e.start, include_from, out);
                }
                Child::Tween(_) | Child::Label(_) => {}
            }
        }
    }

    /// Copy captured endpoints from a structurally matching `previous` build of this timeline.
    ///
    /// Used when a timeline is rebuilt for a new viewport: the rebuilt one keeps interpolating
    /// to or from the values the original read before it started moving anything.
    pub(crate) fn adopt_captures(&mut self, previous: &Timeline) {
        for (mine, theirs) in self.entries.iter_mut().zip(&previous.entries) {
            match (&mut mine.child, &theirs.child) {
                (Child::Tween(a), Child::Tween(b)) => a.adopt_captures(b),
                (Child::Timeline(a), Child::Timeline(b)) => a.adopt_captures(b),
                _ => {}
            }
        }
    }

    /// Forget every captured `to`/`from` endpoint in this timeline.
    pub fn invalidate_captures(&mut self) {
        for e in &mut self.entries {
            match &mut e.child {
                Child::Tween(t) => t.invalidate_captures(),
                Child::Timeline(t) => t.invalidate_captures(),
                Child::Cue(_) | Child::Label(_) => {}
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/timeline.rs"]
mod tests;
