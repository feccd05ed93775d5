use crate::foundation::core::Vec2;
use crate::foundation::error::{ScrublineError, ScrublineResult};
use std::fmt;

/// Interpolation contract for animated value types.
pub trait Lerp: Sized {
    /// Interpolate from `a` to `b` with normalized factor `t`.
    ///
    /// `t` may leave `[0, 1]` for overshooting curves.
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        a + (b - a) * t
    }
}

impl Lerp for Vec2 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Vec2::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
    }
}

/// Straight-alpha RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Build a color from channels.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn parse_hex(s: &str) -> ScrublineResult<Self> {
        let hex = s
            .strip_prefix('#')
            .ok_or_else(|| ScrublineError::validation(format!("color '{s}' must start with '#'")))?;
        if !hex.is_ascii() {
            return Err(ScrublineError::validation(format!(
                "color '{s}' has non-hex digit"
            )));
        }
        let byte = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|e| ScrublineError::validation(format!("color '{s}': {e}")))
        };
        match hex.len() {
            3 => {
                let mut out = [0u8; 3];
                for (slot, c) in out.iter_mut().zip(hex.chars()) {
                    let v = c.to_digit(16).ok_or_else(|| {
                        ScrublineError::validation(format!("color '{s}' has non-hex digit"))
                    })? as u8;
                    *slot = v * 17;
                }
                Ok(Self::new(out[0], out[1], out[2], 255))
            }
            6 => Ok(Self::new(byte(0)?, byte(2)?, byte(4)?, 255)),
            8 => Ok(Self::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => Err(ScrublineError::validation(format!(
                "color '{s}' must have 3, 6 or 8 hex digits"
            ))),
        }
    }
}

impl fmt::Display for Rgba8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:02x}{:02x}{:02x}{:02x}",
            self.r, self.g, self.b, self.a
        )
    }
}

impl serde::Serialize for Rgba8 {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Rgba8 {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl Lerp for Rgba8 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        fn lerp_u8(a: u8, b: u8, t: f64) -> u8 {
            let a = f64::from(a);
            let b = f64::from(b);
            (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
        }

        Self {
            r: lerp_u8(a.r, b.r, t),
            g: lerp_u8(a.g, b.g, t),
            b: lerp_u8(a.b, b.b, t),
            a: lerp_u8(a.a, b.a, t),
        }
    }
}

/// Name of an animatable property.
///
/// Serialized as a plain string; unknown names become [`PropertyKey::Custom`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PropertyKey {
    /// Horizontal translation in pixels.
    X,
    /// Vertical translation in pixels.
    Y,
    /// Uniform scale factor.
    Scale,
    /// Rotation in degrees.
    Rotation,
    /// Opacity in `[0, 1]`.
    Opacity,
    /// Any other numeric, vector or color property (e.g. `"fill"`, `"stroke_dashoffset"`).
    Custom(String),
}

impl PropertyKey {
    /// Borrow the canonical string name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Scale => "scale",
            Self::Rotation => "rotation",
            Self::Opacity => "opacity",
            Self::Custom(name) => name,
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        match s {
            "x" => Self::X,
            "y" => Self::Y,
            "scale" => Self::Scale,
            "rotation" => Self::Rotation,
            "opacity" => Self::Opacity,
            other => Self::Custom(other.to_owned()),
        }
    }
}

impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        match Self::from(s.as_str()) {
            Self::Custom(_) => Self::Custom(s),
            known => known,
        }
    }
}

impl From<PropertyKey> for String {
    fn from(k: PropertyKey) -> Self {
        match k {
            PropertyKey::Custom(name) => name,
            other => other.as_str().to_owned(),
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value that can be written onto a target property.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum PropValue {
    /// Plain number.
    Scalar(f64),
    /// Two-component vector (`{"x": .., "y": ..}`).
    Vec2(Vec2),
    /// Color (`"#rrggbbaa"`).
    Color(Rgba8),
}

impl PropValue {
    /// Return the scalar payload, if any.
    pub fn as_scalar(self) -> Option<f64> {
        match self {
            Self::Scalar(v) => Some(v),
            _ => None,
        }
    }

    /// Return `true` when both values carry the same variant.
    pub fn same_kind(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// `self + delta` for scalars and vectors; colors have no offset.
    pub fn offset_by(self, delta: Self) -> Option<Self> {
        match (self, delta) {
            (Self::Scalar(a), Self::Scalar(d)) => Some(Self::Scalar(a + d)),
            (Self::Vec2(a), Self::Vec2(d)) => Some(Self::Vec2(a + d)),
            _ => None,
        }
    }

    pub(crate) fn is_finite(&self) -> bool {
        match self {
            Self::Scalar(v) => v.is_finite(),
            Self::Vec2(v) => v.x.is_finite() && v.y.is_finite(),
            Self::Color(_) => true,
        }
    }
}

impl From<f64> for PropValue {
    fn from(v: f64) -> Self {
        Self::Scalar(v)
    }
}

impl From<Vec2> for PropValue {
    fn from(v: Vec2) -> Self {
        Self::Vec2(v)
    }
}

impl From<Rgba8> for PropValue {
    fn from(v: Rgba8) -> Self {
        Self::Color(v)
    }
}

impl Lerp for PropValue {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        match (a, b) {
            (Self::Scalar(a), Self::Scalar(b)) => Self::Scalar(<f64 as Lerp>::lerp(a, b, t)),
            (Self::Vec2(a), Self::Vec2(b)) => Self::Vec2(<Vec2 as Lerp>::lerp(a, b, t)),
            (Self::Color(a), Self::Color(b)) => Self::Color(Rgba8::lerp(a, b, t)),
            // Mismatched kinds cannot blend; switch at the end of the segment.
            _ => {
                if t >= 1.0 {
                    *b
                } else {
                    *a
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/value.rs"]
mod tests;
