/// Convenience result type used across scrubline.
pub type ScrublineResult<T> = Result<T, ScrublineError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Only construction-time problems surface as errors. Per-frame evaluation never fails: missing
/// targets and stale handles degrade to logged no-ops.
#[derive(thiserror::Error, Debug)]
pub enum ScrublineError {
    /// Invalid user-provided data (durations, offsets, options).
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while building tweens or timelines.
    #[error("animation error: {0}")]
    Animation(String),

    /// Errors while building trigger regions or scroll bindings.
    #[error("scroll error: {0}")]
    Scroll(String),

    /// Errors while loading or building a scene description.
    #[error("scene error: {0}")]
    Scene(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScrublineError {
    /// Build a [`ScrublineError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ScrublineError::Animation`] value.
    pub fn animation(msg: impl Into<String>) -> Self {
        Self::Animation(msg.into())
    }

    /// Build a [`ScrublineError::Scroll`] value.
    pub fn scroll(msg: impl Into<String>) -> Self {
        Self::Scroll(msg.into())
    }

    /// Build a [`ScrublineError::Scene`] value.
    pub fn scene(msg: impl Into<String>) -> Self {
        Self::Scene(msg.into())
    }

    /// Build a [`ScrublineError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
