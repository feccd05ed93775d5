use crate::foundation::error::{ScrublineError, ScrublineResult};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Scheduler configuration.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineOpts {
    /// Quiet period after the last viewport size change before regions are recomputed.
    pub resize_debounce_secs: f64,
    /// Upper bound on one frame's time step; longer gaps (tab switches) are clamped.
    pub max_frame_dt_secs: f64,
    /// Seed for decorative randomness.
    pub seed: u64,
    /// Smoothing used by regions that ask for [`Scrub::Default`](crate::Scrub::Default).
    pub default_scrub_smoothing_secs: Option<f64>,
    /// Bound on completion/transition chaining within one tick.
    pub max_event_rounds: u32,
}

impl Default for EngineOpts {
    fn default() -> Self {
        Self {
            resize_debounce_secs: 0.15,
            max_frame_dt_secs: 0.1,
            seed: 0,
            default_scrub_smoothing_secs: None,
            max_event_rounds: 16,
        }
    }
}

impl EngineOpts {
    /// Check value ranges.
    pub fn validate(&self) -> ScrublineResult<()> {
        if !(self.resize_debounce_secs.is_finite() && self.resize_debounce_secs >= 0.0) {
            return Err(ScrublineError::validation(
                "resize_debounce_secs must be finite and >= 0",
            ));
        }
        if !(self.max_frame_dt_secs.is_finite() && self.max_frame_dt_secs > 0.0) {
            return Err(ScrublineError::validation(
                "max_frame_dt_secs must be finite and > 0",
            ));
        }
        if let Some(s) = self.default_scrub_smoothing_secs
            && !(s.is_finite() && s >= 0.0)
        {
            return Err(ScrublineError::validation(
                "default_scrub_smoothing_secs must be finite and >= 0",
            ));
        }
        if self.max_event_rounds == 0 {
            return Err(ScrublineError::validation("max_event_rounds must be > 0"));
        }
        Ok(())
    }

    /// Parse and validate options from JSON text.
    pub fn from_json_str(s: &str) -> ScrublineResult<Self> {
        let opts: Self = serde_json::from_str(s)
            .map_err(|e| ScrublineError::serde(format!("parse engine options: {e}")))?;
        opts.validate()?;
        Ok(opts)
    }

    /// Parse and validate options from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> ScrublineResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            ScrublineError::validation(format!("open engine options '{}': {e}", path.display()))
        })?;
        let opts: Self = serde_json::from_reader(BufReader::new(f))
            .map_err(|e| ScrublineError::serde(format!("parse engine options: {e}")))?;
        opts.validate()?;
        Ok(opts)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/opts.rs"]
mod tests;
