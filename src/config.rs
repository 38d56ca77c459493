use std::path::Path;

use log::warn;
use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::color::category::CategoryColorSpec;
use crate::color::gradient::GradientColorSpec;
use crate::data::filter::FilterSpec;

// ---------------------------------------------------------------------------
// Colour rule
// ---------------------------------------------------------------------------

/// Which colouriser (if any) paints the nodes that pass the filter.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ColorSpec {
    Category(CategoryColorSpec),
    Gradient(GradientColorSpec),
    /// Unknown `type`: nodes stay uncoloured.
    #[serde(other)]
    Unrecognized,
}

/// A `colorBy` that cannot be read at all degrades to `Unrecognized`
/// instead of failing the whole config.
fn lenient_color_spec<'de, D: Deserializer<'de>>(d: D) -> Result<Option<ColorSpec>, D::Error> {
    let Some(raw) = Option::<JsonValue>::deserialize(d)? else {
        return Ok(None);
    };
    match ColorSpec::deserialize(&raw) {
        Ok(spec) => {
            if spec == ColorSpec::Unrecognized {
                warn!("unknown colorBy type in {raw}; colours left unchanged");
            }
            Ok(Some(spec))
        }
        Err(e) => {
            warn!("unusable colorBy {raw}: {e}; colours left unchanged");
            Ok(Some(ColorSpec::Unrecognized))
        }
    }
}

/// `"filterBy": null` means no filter, same as leaving the key out.
fn nullable_filter<'de, D: Deserializer<'de>>(d: D) -> Result<FilterSpec, D::Error> {
    Ok(Option::<FilterSpec>::deserialize(d)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Classification config
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Filter and colour rules for one viewer session. Built once, then shared
/// read-only by every classification call.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationConfig {
    #[serde(default, deserialize_with = "nullable_filter")]
    pub filter_by: FilterSpec,
    #[serde(default, deserialize_with = "lenient_color_spec")]
    pub color_by: Option<ColorSpec>,
    #[serde(default, alias = "ghostOthers")]
    pub ghost_non_matching: bool,
}

impl ClassificationConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_json_value(value: JsonValue) -> Result<Self, ConfigError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn with_color(mut self, color_by: ColorSpec) -> Self {
        self.color_by = Some(color_by);
        self
    }
}

/// Load a [`ClassificationConfig`] from a JSON file.
pub fn load_config(path: &Path) -> Result<ClassificationConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    ClassificationConfig::from_json_str(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::FilterRule;
    use serde_json::json;

    #[test]
    fn test_parse_full_config() {
        let config = ClassificationConfig::from_json_value(json!({
            "filterBy": {"level": {"not": ["0"]}, "category": ["Walls", "Floors"]},
            "colorBy": {
                "type": "gradient",
                "property": "area",
                "minValue": 0,
                "maxValue": 100,
                "spectrumColors": ["#0000ff", "#ff0000"]
            },
            "ghostNonMatching": true
        }))
        .unwrap();
        assert_eq!(config.filter_by.len(), 2);
        assert!(matches!(config.filter_by.get("category"), Some(FilterRule::SetMembership(_))));
        assert!(matches!(config.color_by, Some(ColorSpec::Gradient(_))));
        assert!(config.ghost_non_matching);
    }

    #[test]
    fn test_empty_config_defaults() {
        let config = ClassificationConfig::from_json_str("{}").unwrap();
        assert!(config.filter_by.is_empty());
        assert_eq!(config.color_by, None);
        assert!(!config.ghost_non_matching);
    }

    #[test]
    fn test_null_filter_passes_everything() {
        let config = ClassificationConfig::from_json_value(json!({
            "filterBy": null,
            "ghostNonMatching": true
        }))
        .unwrap();
        assert!(config.filter_by.is_empty());
        assert!(config.ghost_non_matching);
    }

    #[test]
    fn test_ghost_others_alias() {
        let config = ClassificationConfig::from_json_value(json!({"ghostOthers": true})).unwrap();
        assert!(config.ghost_non_matching);
    }

    #[test]
    fn test_unknown_color_type_is_unrecognized() {
        let config = ClassificationConfig::from_json_value(json!({
            "colorBy": {"type": "texture", "property": "x"}
        }))
        .unwrap();
        assert_eq!(config.color_by, Some(ColorSpec::Unrecognized));
    }

    #[test]
    fn test_malformed_color_by_is_unrecognized() {
        let config = ClassificationConfig::from_json_value(json!({
            "colorBy": {"type": "category"}
        }))
        .unwrap();
        assert_eq!(config.color_by, Some(ColorSpec::Unrecognized));

        let config = ClassificationConfig::from_json_value(json!({"colorBy": "red"})).unwrap();
        assert_eq!(config.color_by, Some(ColorSpec::Unrecognized));
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(matches!(
            ClassificationConfig::from_json_str("{"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("view.json");
        std::fs::write(&path, r#"{"filterBy": {"level": "2"}}"#).unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.filter_by.len(), 1);

        let missing = load_config(&dir.path().join("nope.json"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
