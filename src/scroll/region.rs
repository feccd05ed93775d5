use crate::animation::target::{LayoutProvider, PinPose};
use crate::foundation::core::{Rect, TargetId, Vec2};
use crate::foundation::error::{ScrublineError, ScrublineResult};
use crate::foundation::math::clamp01;
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

/// One edge of a trigger region.
///
/// The marker resolves to the scroll offset at which the point
/// `anchor_frac * anchor height + anchor_px` on the anchor meets the point
/// `viewport_frac * viewport height + viewport_px` on the viewport.
///
/// The text form is `"<anchor edge> <viewport edge>"`, each edge being `top`, `center`, `bottom`,
/// a percentage (`"25%"`) or pixels (`"120px"`), optionally followed by `+=N` / `-=N` pixels:
/// `"top bottom"`, `"center 80%"`, `"bottom+=200 top"`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Marker {
    /// Fraction of the anchor's height.
    pub anchor_frac: f64,
    /// Pixel offset added on the anchor side.
    pub anchor_px: f64,
    /// Fraction of the viewport height.
    pub viewport_frac: f64,
    /// Pixel offset added on the viewport side.
    pub viewport_px: f64,
}

impl Marker {
    /// Marker from two fractions.
    pub const fn new(anchor_frac: f64, viewport_frac: f64) -> Self {
        Self {
            anchor_frac,
            anchor_px: 0.0,
            viewport_frac,
            viewport_px: 0.0,
        }
    }

    /// Anchor top meets viewport bottom: the anchor starts entering the screen.
    pub const fn top_bottom() -> Self {
        Self::new(0.0, 1.0)
    }

    /// Anchor top meets viewport top.
    pub const fn top_top() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Anchor bottom meets viewport top: the anchor has just left the screen.
    pub const fn bottom_top() -> Self {
        Self::new(1.0, 0.0)
    }

    /// Anchor bottom meets viewport bottom.
    pub const fn bottom_bottom() -> Self {
        Self::new(1.0, 1.0)
    }

    /// Shift the anchor point by `px` (positive moves the marker later).
    pub fn offset(mut self, px: f64) -> Self {
        self.anchor_px += px;
        self
    }

    /// Absolute scroll coordinate of this marker.
    pub fn resolve(&self, anchor_doc: Rect, viewport_height: f64) -> f64 {
        anchor_doc.y0 + anchor_doc.height() * self.anchor_frac + self.anchor_px
            - (viewport_height * self.viewport_frac + self.viewport_px)
    }

    fn validate(&self) -> ScrublineResult<()> {
        let all = [
            self.anchor_frac,
            self.anchor_px,
            self.viewport_frac,
            self.viewport_px,
        ];
        if all.iter().any(|v| !v.is_finite()) {
            return Err(ScrublineError::scroll("marker values must be finite"));
        }
        Ok(())
    }
}

fn parse_edge(s: &str) -> ScrublineResult<(f64, f64)> {
    let (base, shift) = match s.find("+=").or_else(|| s.find("-=")) {
        Some(i) => {
            let sign = if s[i..].starts_with('-') { -1.0 } else { 1.0 };
            let n: f64 = s[i + 2..]
                .trim_end_matches("px")
                .parse()
                .map_err(|_| ScrublineError::scroll(format!("bad marker offset in '{s}'")))?;
            (&s[..i], sign * n)
        }
        None => (s, 0.0),
    };
    let (frac, px) = match base {
        "top" => (0.0, 0.0),
        "center" => (0.5, 0.0),
        "bottom" => (1.0, 0.0),
        _ if base.ends_with('%') => {
            let pct: f64 = base[..base.len() - 1]
                .parse()
                .map_err(|_| ScrublineError::scroll(format!("bad marker percentage '{base}'")))?;
            (pct / 100.0, 0.0)
        }
        _ => {
            let px: f64 = base
                .trim_end_matches("px")
                .parse()
                .map_err(|_| ScrublineError::scroll(format!("unknown marker edge '{base}'")))?;
            (0.0, px)
        }
    };
    Ok((frac, px + shift))
}

fn fmt_edge(f: &mut fmt::Formatter<'_>, frac: f64, px: f64) -> fmt::Result {
    if frac == 0.0 {
        f.write_str("top")?;
    } else if frac == 0.5 {
        f.write_str("center")?;
    } else if frac == 1.0 {
        f.write_str("bottom")?;
    } else {
        write!(f, "{}%", frac * 100.0)?;
    }
    if px > 0.0 {
        write!(f, "+={px}")?;
    } else if px < 0.0 {
        write!(f, "-={}", -px)?;
    }
    Ok(())
}

impl FromStr for Marker {
    type Err = ScrublineError;

    fn from_str(s: &str) -> ScrublineResult<Self> {
        let mut parts = s.split_whitespace();
        let (Some(a), Some(v), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(ScrublineError::scroll(format!(
                "marker '{s}' must be '<anchor edge> <viewport edge>'"
            )));
        };
        let (anchor_frac, anchor_px) = parse_edge(a)?;
        let (viewport_frac, viewport_px) = parse_edge(v)?;
        let m = Self {
            anchor_frac,
            anchor_px,
            viewport_frac,
            viewport_px,
        };
        m.validate()?;
        Ok(m)
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_edge(f, self.anchor_frac, self.anchor_px)?;
        f.write_str(" ")?;
        fmt_edge(f, self.viewport_frac, self.viewport_px)
    }
}

impl TryFrom<String> for Marker {
    type Error = ScrublineError;

    fn try_from(s: String) -> ScrublineResult<Self> {
        s.parse()
    }
}

impl From<Marker> for String {
    fn from(m: Marker) -> Self {
        m.to_string()
    }
}

/// How scroll progress drives a bound timeline.
///
/// Serialized as `false` (off), `true` (direct), a number of seconds (smoothed) or `"default"`.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "ScrubRepr", into = "ScrubRepr")]
pub enum Scrub {
    /// Region only dispatches discrete transitions.
    Off,
    /// Progress maps straight onto the playhead.
    #[default]
    Direct,
    /// Progress is low-pass filtered with this time constant (seconds).
    Smoothed(f64),
    /// Use `EngineOpts::default_scrub_smoothing_secs`.
    Default,
}

impl Scrub {
    /// Smoothing time constant, `None` for direct.
    pub fn smoothing_secs(self, fallback: Option<f64>) -> Option<f64> {
        match self {
            Scrub::Off | Scrub::Direct => None,
            Scrub::Smoothed(s) => Some(s),
            Scrub::Default => fallback,
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
enum ScrubRepr {
    Flag(bool),
    Secs(f64),
    Keyword(String),
}

impl TryFrom<ScrubRepr> for Scrub {
    type Error = String;

    fn try_from(r: ScrubRepr) -> Result<Self, String> {
        match r {
            ScrubRepr::Flag(false) => Ok(Scrub::Off),
            ScrubRepr::Flag(true) => Ok(Scrub::Direct),
            ScrubRepr::Secs(s) if s.is_finite() && s > 0.0 => Ok(Scrub::Smoothed(s)),
            ScrubRepr::Secs(s) if s == 0.0 => Ok(Scrub::Direct),
            ScrubRepr::Secs(s) => Err(format!("scrub smoothing must be finite and >= 0, got {s}")),
            ScrubRepr::Keyword(k) if k == "default" => Ok(Scrub::Default),
            ScrubRepr::Keyword(k) => Err(format!("unknown scrub mode '{k}'")),
        }
    }
}

impl From<Scrub> for ScrubRepr {
    fn from(s: Scrub) -> Self {
        match s {
            Scrub::Off => ScrubRepr::Flag(false),
            Scrub::Direct => ScrubRepr::Flag(true),
            Scrub::Smoothed(secs) => ScrubRepr::Secs(secs),
            Scrub::Default => ScrubRepr::Keyword("default".to_owned()),
        }
    }
}

/// A scroll interval defined relative to an anchor target.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TriggerRegion {
    /// Target whose layout defines the markers (and which gets pinned).
    pub anchor: TargetId,
    /// Where the region starts.
    #[serde(default = "Marker::top_bottom")]
    pub start: Marker,
    /// Where the region ends.
    #[serde(default = "Marker::bottom_top")]
    pub end: Marker,
    /// When set, the region ends this many pixels after its start and `end` is ignored.
    #[serde(default)]
    pub span: Option<f64>,
    /// Switch the anchor to viewport-fixed positioning once the end marker is passed.
    #[serde(default)]
    pub pin: bool,
    /// Scrub behavior.
    #[serde(default)]
    pub scrub: Scrub,
}

impl TriggerRegion {
    /// Region spanning the whole time `anchor` is on screen.
    pub fn new(anchor: TargetId) -> Self {
        Self {
            anchor,
            start: Marker::top_bottom(),
            end: Marker::bottom_top(),
            span: None,
            pin: false,
            scrub: Scrub::Direct,
        }
    }

    /// Set the start marker.
    pub fn start(mut self, m: Marker) -> Self {
        self.start = m;
        self
    }

    /// Set the end marker.
    pub fn end(mut self, m: Marker) -> Self {
        self.end = m;
        self
    }

    /// End the region `px` scroll pixels after the start marker (`end: "+=600"`).
    pub fn span(mut self, px: f64) -> Self {
        self.span = Some(px);
        self
    }

    /// Enable or disable pinning.
    pub fn pin(mut self, pin: bool) -> Self {
        self.pin = pin;
        self
    }

    /// Set scrub behavior.
    pub fn scrub(mut self, scrub: Scrub) -> Self {
        self.scrub = scrub;
        self
    }

    /// Validate marker values and smoothing.
    pub fn validate(&self) -> ScrublineResult<()> {
        self.start.validate()?;
        self.end.validate()?;
        if let Some(px) = self.span
            && !(px.is_finite() && px >= 0.0)
        {
            return Err(ScrublineError::scroll("region span must be finite and >= 0"));
        }
        if let Scrub::Smoothed(s) = self.scrub
            && !(s.is_finite() && s >= 0.0)
        {
            return Err(ScrublineError::scroll(
                "scrub smoothing must be finite and >= 0",
            ));
        }
        Ok(())
    }

    /// Resolve markers against current layout. `None` when the anchor is not mounted.
    pub fn resolve<L>(&self, layout: &L) -> Option<ResolvedRegion>
    where
        L: LayoutProvider + ?Sized,
    {
        let vp = layout.viewport();
        let flow = layout.flow_bounds(self.anchor)?;
        let anchor_doc = flow + Vec2::new(0.0, vp.scroll);
        let start = self.start.resolve(anchor_doc, vp.height);
        let end = match self.span {
            Some(px) => start + px,
            None => self.end.resolve(anchor_doc, vp.height),
        };
        Some(ResolvedRegion {
            start,
            end,
            anchor_doc,
        })
    }
}

/// Position of the scroll coordinate relative to a region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    /// Above the start marker.
    Before,
    /// Between the markers, both inclusive.
    Inside,
    /// Past the end marker.
    After,
}

/// Discrete transition between zones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleEvent {
    /// Before -> Inside.
    EnterForward,
    /// Inside -> After.
    LeaveForward,
    /// After -> Inside.
    EnterBackward,
    /// Inside -> Before.
    LeaveBackward,
}

impl ToggleEvent {
    /// Return `true` for either enter transition.
    pub fn is_enter(self) -> bool {
        matches!(self, ToggleEvent::EnterForward | ToggleEvent::EnterBackward)
    }
}

/// Transitions fired when the classification changes from `from` to `to`.
///
/// Skipping straight across the region fires both of the crossed transitions, in order.
pub fn zone_transitions(from: Zone, to: Zone) -> SmallVec<[ToggleEvent; 2]> {
    use ToggleEvent::*;
    let mut out = SmallVec::new();
    match (from, to) {
        (Zone::Before, Zone::Inside) => out.push(EnterForward),
        (Zone::Inside, Zone::After) => out.push(LeaveForward),
        (Zone::After, Zone::Inside) => out.push(EnterBackward),
        (Zone::Inside, Zone::Before) => out.push(LeaveBackward),
        (Zone::Before, Zone::After) => out.extend([EnterForward, LeaveForward]),
        (Zone::After, Zone::Before) => out.extend([EnterBackward, LeaveBackward]),
        _ => {}
    }
    out
}

/// A region with markers resolved to absolute scroll coordinates.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct ResolvedRegion {
    /// Start marker in scroll pixels.
    pub start: f64,
    /// End marker in scroll pixels.
    pub end: f64,
    /// Anchor's in-flow box in document coordinates.
    pub anchor_doc: Rect,
}

impl ResolvedRegion {
    /// Region from explicit markers; the anchor box is empty.
    pub fn from_markers(start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            anchor_doc: Rect::ZERO,
        }
    }

    /// Return `true` when `start >= end`.
    pub fn is_degenerate(&self) -> bool {
        !(self.start < self.end)
    }

    // Degenerate regions collapse to one side: past it when it sits at or above the top of the
    // scrollable range, otherwise never reached.
    fn degenerate_reached(&self) -> bool {
        self.start <= 0.0
    }

    /// Progress in `[0, 1]` for a smoothed scroll position.
    pub fn progress(&self, position: f64) -> f64 {
        if self.is_degenerate() {
            return if self.degenerate_reached() { 1.0 } else { 0.0 };
        }
        clamp01((position - self.start) / (self.end - self.start))
    }

    /// Zone for a smoothed scroll position.
    pub fn zone(&self, position: f64) -> Zone {
        if self.is_degenerate() {
            return if self.degenerate_reached() {
                Zone::After
            } else {
                Zone::Before
            };
        }
        if position < self.start {
            Zone::Before
        } else if position > self.end {
            Zone::After
        } else {
            Zone::Inside
        }
    }

    /// Viewport-fixed pose that keeps the anchor where it sits when scroll equals the end marker.
    pub fn pin_pose(&self) -> PinPose {
        PinPose {
            rect: self.anchor_doc - Vec2::new(0.0, self.end),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scroll/region.rs"]
mod tests;
