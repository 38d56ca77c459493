use std::collections::BTreeMap;

use log::warn;
use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;

use super::{color_from_json, Color};
use crate::data::model::{label_for, Metadata};
use crate::data::path::resolve;

/// Saturation and lightness of hash-derived category colours.
const HASH_SATURATION: f32 = 0.5;
const HASH_LIGHTNESS: f32 = 0.3;

// ---------------------------------------------------------------------------
// Category colour spec
// ---------------------------------------------------------------------------

/// Colour by discrete value: explicit palette, then default, then hash hue.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CategoryColorSpec {
    pub property: String,
    #[serde(
        default,
        rename = "default",
        alias = "defaultColor",
        deserialize_with = "lenient_color"
    )]
    pub default_color: Option<Color>,
    /// Canonical value label → colour.
    #[serde(
        default,
        rename = "values",
        alias = "palette",
        deserialize_with = "lenient_palette"
    )]
    pub palette: BTreeMap<String, Color>,
}

fn lenient_color<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Color>, D::Error> {
    let raw = Option::<JsonValue>::deserialize(d)?;
    Ok(raw.as_ref().and_then(color_from_json))
}

fn lenient_palette<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<BTreeMap<String, Color>, D::Error> {
    let entries = match Option::<JsonValue>::deserialize(d)? {
        None | Some(JsonValue::Null) => return Ok(BTreeMap::new()),
        Some(JsonValue::Object(entries)) => entries,
        Some(other) => {
            warn!("category palette {other} is not an object; ignoring it");
            return Ok(BTreeMap::new());
        }
    };
    Ok(entries
        .into_iter()
        .filter_map(|(label, v)| color_from_json(&v).map(|c| (label, c)))
        .collect())
}

impl CategoryColorSpec {
    pub fn new(property: impl Into<String>) -> Self {
        CategoryColorSpec {
            property: property.into(),
            default_color: None,
            palette: BTreeMap::new(),
        }
    }

    pub fn with_default(mut self, color: Color) -> Self {
        self.default_color = Some(color);
        self
    }

    pub fn with_entry(mut self, label: impl Into<String>, color: Color) -> Self {
        self.palette.insert(label.into(), color);
        self
    }

    /// Colour for an already-rendered value label.
    pub fn color_for_label(&self, label: &str) -> Color {
        self.palette
            .get(label)
            .copied()
            .or(self.default_color)
            .unwrap_or_else(|| hash_color(label))
    }
}

// ---------------------------------------------------------------------------
// Colouring
// ---------------------------------------------------------------------------

/// Colour a node's metadata by the value at `spec.property`.
pub fn color_for(metadata: &Metadata, spec: &CategoryColorSpec) -> Color {
    let label = label_for(resolve(metadata, &spec.property));
    spec.color_for_label(&label)
}

/// 32-bit rolling hash over UTF-16 code units, `h = h * 31 + unit` with
/// wrapping `i32` arithmetic, reduced to a hue in `0..360`.
pub fn category_hue(label: &str) -> u16 {
    let hash = label.encode_utf16().fold(0i32, |hash, unit| {
        (hash << 5).wrapping_sub(hash).wrapping_add(i32::from(unit))
    });
    (hash.unsigned_abs() % 360) as u16
}

/// `hsl(hue, 50%, 30%)` for the hue of `label`.
pub fn hash_color(label: &str) -> Color {
    Color::from_hsl(
        f32::from(category_hue(label)),
        HASH_SATURATION,
        HASH_LIGHTNESS,
    )
}
