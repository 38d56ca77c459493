/// Colour layer: value type, renderer hints, and the two colourisers.
///
/// ```text
///   metadata ──► path::resolve ──┬──► category  (palette / default / hash hue)
///                                └──► gradient  (numeric value → spectrum)
///                                          │
///                                          ▼
///                                        Shade  (colour + opacity + wireframe)
/// ```
pub mod category;
pub mod gradient;

use std::fmt;
use std::str::FromStr;

use log::warn;
use palette::{Hsl, IntoColor, Mix, Srgb};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Color – an 8-bit sRGB triple
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("unrecognised colour `{0}`")]
    Unrecognized(String),
    #[error("malformed {kind} colour `{input}`")]
    Malformed { kind: &'static str, input: String },
}

/// Implementation-neutral display colour. Serialised as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Color { red, green, blue }
    }

    /// Build from hue in degrees and saturation/lightness in `0..=1`.
    pub fn from_hsl(hue: f32, saturation: f32, lightness: f32) -> Self {
        let hsl = Hsl::new(hue, saturation, lightness);
        let rgb: Srgb = hsl.into_color();
        rgb.into_format::<u8>().into()
    }

    /// Linear blend in sRGB space; `factor` 0 is `self`, 1 is `other`.
    pub fn mix(self, other: Color, factor: f32) -> Color {
        let a: Srgb = Srgb::<u8>::from(self).into_format();
        let b: Srgb = Srgb::<u8>::from(other).into_format();
        a.mix(b, factor.clamp(0.0, 1.0)).into_format::<u8>().into()
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

impl From<Srgb<u8>> for Color {
    fn from(rgb: Srgb<u8>) -> Self {
        Color::rgb(rgb.red, rgb.green, rgb.blue)
    }
}

impl From<Color> for Srgb<u8> {
    fn from(c: Color) -> Self {
        Srgb::new(c.red, c.green, c.blue)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_hex()
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Accepts `#rrggbb`, `#rgb`, bare hex, `rgb(r, g, b)`, `hsl(h, s%, l%)` and
/// CSS colour names.
impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let lower = input.to_ascii_lowercase();

        if let Some(args) = functional_args(&lower, "rgb") {
            return parse_rgb_args(&args).ok_or_else(|| ColorParseError::Malformed {
                kind: "rgb",
                input: input.to_string(),
            });
        }
        if let Some(args) = functional_args(&lower, "hsl") {
            return parse_hsl_args(&args).ok_or_else(|| ColorParseError::Malformed {
                kind: "hsl",
                input: input.to_string(),
            });
        }
        if let Some(named) = palette::named::from_str(&lower) {
            return Ok(named.into());
        }
        lower
            .parse::<Srgb<u8>>()
            .map(Color::from)
            .map_err(|_| ColorParseError::Unrecognized(input.to_string()))
    }
}

/// `name(a, b, c)` → `["a", "b", "c"]`.
fn functional_args(s: &str, name: &str) -> Option<Vec<String>> {
    let inner = s.strip_prefix(name)?.trim_start().strip_prefix('(')?.strip_suffix(')')?;
    Some(inner.split(',').map(|a| a.trim().to_string()).collect())
}

fn parse_rgb_args(args: &[String]) -> Option<Color> {
    let [r, g, b] = args else {
        return None;
    };
    Some(Color::rgb(r.parse().ok()?, g.parse().ok()?, b.parse().ok()?))
}

fn parse_hsl_args(args: &[String]) -> Option<Color> {
    let [h, s, l] = args else {
        return None;
    };
    let hue: f32 = h.strip_suffix("deg").unwrap_or(h.as_str()).trim().parse().ok()?;
    let percent = |p: &String| -> Option<f32> {
        let v: f32 = p.strip_suffix('%')?.trim().parse().ok()?;
        Some((v / 100.0).clamp(0.0, 1.0))
    };
    Some(Color::from_hsl(hue, percent(s)?, percent(l)?))
}

/// Read a colour out of a raw config value: a colour string or a `0xRRGGBB`
/// integer. Anything unusable is logged and dropped.
pub(crate) fn color_from_json(raw: &JsonValue) -> Option<Color> {
    let parsed = match raw {
        JsonValue::String(s) => s.parse::<Color>().map_err(|e| e.to_string()),
        JsonValue::Number(n) => match n.as_u64() {
            Some(v) if v <= 0xff_ffff => Ok(Color::rgb((v >> 16) as u8, (v >> 8) as u8, v as u8)),
            _ => Err(format!("colour number {n} out of range")),
        },
        other => Err(format!("unsupported colour value {other}")),
    };
    match parsed {
        Ok(c) => Some(c),
        Err(e) => {
            warn!("ignoring colour: {e}");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Shade – what the renderer is asked to paint
// ---------------------------------------------------------------------------

/// Colour plus the material hints the renderer needs to draw it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Shade {
    pub color: Color,
    pub opacity: f32,
    pub wireframe: bool,
}

impl Shade {
    /// Faint wireframe used when a gradient value is not numeric.
    pub const UNDETERMINED: Shade = Shade {
        color: Color::rgb(0x70, 0x80, 0xa0),
        opacity: 0.04,
        wireframe: true,
    };

    pub const fn solid(color: Color) -> Self {
        Shade {
            color,
            opacity: 1.0,
            wireframe: false,
        }
    }

    pub fn is_undetermined(&self) -> bool {
        *self == Shade::UNDETERMINED
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_hex_forms() {
        assert_eq!("#ff0000".parse::<Color>(), Ok(Color::rgb(255, 0, 0)));
        assert_eq!("#0f0".parse::<Color>(), Ok(Color::rgb(0, 255, 0)));
        assert_eq!("0000FF".parse::<Color>(), Ok(Color::rgb(0, 0, 255)));
    }

    #[test]
    fn test_parse_functional_and_named() {
        assert_eq!("rgb(10, 20, 30)".parse::<Color>(), Ok(Color::rgb(10, 20, 30)));
        assert_eq!("hsl(0, 100%, 50%)".parse::<Color>(), Ok(Color::rgb(255, 0, 0)));
        assert_eq!("Red".parse::<Color>(), Ok(Color::rgb(255, 0, 0)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            "not-a-colour".parse::<Color>(),
            Err(ColorParseError::Unrecognized(_))
        ));
        assert!(matches!(
            "rgb(1, 2)".parse::<Color>(),
            Err(ColorParseError::Malformed { kind: "rgb", .. })
        ));
    }

    #[test]
    fn test_hex_display_and_serde() {
        let c = Color::rgb(0x70, 0x80, 0xa0);
        assert_eq!(c.to_string(), "#7080a0");
        assert_eq!(serde_json::to_value(c).unwrap(), json!("#7080a0"));
        let back: Color = serde_json::from_value(json!("#7080a0")).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_mix_endpoints() {
        let blue = Color::rgb(0, 0, 255);
        let red = Color::rgb(255, 0, 0);
        assert_eq!(blue.mix(red, 0.0), blue);
        assert_eq!(blue.mix(red, 1.0), red);
        assert_eq!(blue.mix(red, 2.0), red);
    }

    #[test]
    fn test_color_from_json() {
        assert_eq!(color_from_json(&json!(0x7080a0)), Some(Color::rgb(0x70, 0x80, 0xa0)));
        assert_eq!(color_from_json(&json!("blue")), Some(Color::rgb(0, 0, 255)));
        assert_eq!(color_from_json(&json!(true)), None);
        assert_eq!(color_from_json(&json!(0x1_000_000)), None);
    }

    #[test]
    fn test_undetermined_shade() {
        assert!(Shade::UNDETERMINED.is_undetermined());
        assert!(Shade::UNDETERMINED.wireframe);
        assert!(!Shade::solid(Color::rgb(0x70, 0x80, 0xa0)).is_undetermined());
    }
}
