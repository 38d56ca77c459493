use log::warn;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::{color_from_json, Color, Shade};
use crate::data::model::Metadata;
use crate::data::path::resolve;

// ---------------------------------------------------------------------------
// Spectrum – piecewise-linear colour ramp over a numeric domain
// ---------------------------------------------------------------------------

/// Colour ramp over `[min, max]`. Values outside the domain are clamped.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    colors: Vec<Color>,
    /// Stop positions in `0..=1`, one per colour, non-decreasing.
    positions: Vec<f64>,
    min: f64,
    max: f64,
}

impl Spectrum {
    pub const DEFAULT_MIN: f64 = 0.0;
    pub const DEFAULT_MAX: f64 = 100.0;

    /// Red → yellow → green → blue.
    pub fn default_colors() -> Vec<Color> {
        vec![
            Color::rgb(0xff, 0x00, 0x00),
            Color::rgb(0xff, 0xff, 0x00),
            Color::rgb(0x00, 0xff, 0x00),
            Color::rgb(0x00, 0x00, 0xff),
        ]
    }

    /// Equally spaced stops. An empty colour list falls back to the default
    /// ramp.
    pub fn new(colors: Vec<Color>, min: f64, max: f64) -> Self {
        let colors = if colors.is_empty() {
            Self::default_colors()
        } else {
            colors
        };
        let positions = equal_positions(colors.len());
        Spectrum {
            colors,
            positions,
            min,
            max,
        }
    }

    /// Place stops at explicit normalised positions. Positions that are not
    /// one-per-colour, in `0..=1` and non-decreasing are ignored.
    pub fn with_stops(mut self, stops: &[f64]) -> Self {
        let valid = stops.len() == self.colors.len()
            && stops.iter().all(|p| (0.0..=1.0).contains(p))
            && stops.windows(2).all(|w| w[0] <= w[1]);
        if valid {
            self.positions = stops.to_vec();
        } else {
            warn!(
                "ignoring spectrum stops {stops:?}: need {} ascending positions in 0..=1",
                self.colors.len()
            );
        }
        self
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn domain(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    /// Value at each stop, for legends.
    pub fn stop_values(&self) -> Vec<(f64, Color)> {
        self.positions
            .iter()
            .zip(&self.colors)
            .map(|(p, c)| (self.min + p * (self.max - self.min), *c))
            .collect()
    }

    /// Interpolated colour at `value`, clamped to the domain. A degenerate
    /// domain (`max <= min`) paints everything with the first colour.
    pub fn color_at(&self, value: f64) -> Color {
        let first = self.colors[0];
        if self.colors.len() == 1 || !(self.max > self.min) || value.is_nan() {
            return first;
        }
        let t = (value.clamp(self.min, self.max) - self.min) / (self.max - self.min);

        let last = self.positions.len() - 1;
        if t <= self.positions[0] {
            return first;
        }
        if t >= self.positions[last] {
            return self.colors[last];
        }
        let i = self
            .positions
            .windows(2)
            .position(|w| t >= w[0] && t <= w[1])
            .unwrap_or(last - 1);
        let (lo, hi) = (self.positions[i], self.positions[i + 1]);
        let width = hi - lo;
        let local = if width > 0.0 { (t - lo) / width } else { 1.0 };
        self.colors[i].mix(self.colors[i + 1], local as f32)
    }
}

impl Default for Spectrum {
    fn default() -> Self {
        Spectrum::new(Vec::new(), Self::DEFAULT_MIN, Self::DEFAULT_MAX)
    }
}

fn equal_positions(n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => (0..n).map(|i| i as f64 / (n - 1) as f64).collect(),
    }
}

// ---------------------------------------------------------------------------
// Gradient colour spec
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGradientSpec {
    property: String,
    #[serde(default)]
    min_value: Option<f64>,
    #[serde(default)]
    max_value: Option<f64>,
    #[serde(default, alias = "gradientColors")]
    spectrum_colors: Vec<JsonValue>,
    #[serde(default)]
    stops: Option<Vec<f64>>,
}

/// Colour by numeric value along a spectrum. The spectrum is built once when
/// the spec is parsed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawGradientSpec")]
pub struct GradientColorSpec {
    pub property: String,
    pub spectrum: Spectrum,
}

impl From<RawGradientSpec> for GradientColorSpec {
    fn from(raw: RawGradientSpec) -> Self {
        let colors: Vec<Color> = raw.spectrum_colors.iter().filter_map(color_from_json).collect();
        let mut spectrum = Spectrum::new(
            colors,
            raw.min_value.unwrap_or(Spectrum::DEFAULT_MIN),
            raw.max_value.unwrap_or(Spectrum::DEFAULT_MAX),
        );
        if let Some(stops) = raw.stops {
            spectrum = spectrum.with_stops(&stops);
        }
        GradientColorSpec {
            property: raw.property,
            spectrum,
        }
    }
}

impl GradientColorSpec {
    pub fn new(property: impl Into<String>, spectrum: Spectrum) -> Self {
        GradientColorSpec {
            property: property.into(),
            spectrum,
        }
    }
}

/// Shade for the numeric value at `spec.property`, or the undetermined
/// marker when it cannot be read as a finite number.
pub fn shade_for(metadata: &Metadata, spec: &GradientColorSpec) -> Shade {
    match resolve(metadata, &spec.property).and_then(|v| v.to_number()) {
        Some(n) => Shade::solid(spec.spectrum.color_at(n)),
        None => Shade::UNDETERMINED,
    }
}
