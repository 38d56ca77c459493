use std::cmp::Ordering;
use std::collections::BTreeMap;

use log::warn;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::model::{Metadata, MetadataValue};
use super::path::resolve;

// ---------------------------------------------------------------------------
// Filter rule: one predicate over one property value
// ---------------------------------------------------------------------------

/// A value filter for one property, tagged once when the config is parsed.
///
/// Raw JSON maps onto the variants by shape:
/// * array → [`FilterRule::SetMembership`]
/// * object with `not`, `lte` or `gte` → [`FilterRule::RangeExclusion`]
/// * anything else → [`FilterRule::ExactValue`] of the raw value
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "JsonValue")]
pub enum FilterRule {
    ExactValue(MetadataValue),
    SetMembership(Vec<MetadataValue>),
    RangeExclusion {
        exclude: Option<Vec<MetadataValue>>,
        lower_bound: Option<MetadataValue>,
        upper_bound: Option<MetadataValue>,
    },
}

impl From<JsonValue> for FilterRule {
    fn from(raw: JsonValue) -> Self {
        match raw {
            JsonValue::Array(items) => {
                FilterRule::SetMembership(items.into_iter().map(MetadataValue::from).collect())
            }
            JsonValue::Object(mut map)
                if ["not", "lte", "gte"].iter().any(|k| map.contains_key(*k)) =>
            {
                let exclude = map.remove("not").map(|not| match not {
                    JsonValue::Array(items) => {
                        items.into_iter().map(MetadataValue::from).collect()
                    }
                    single => {
                        warn!("filter `not` should be an array, got {single}; excluding it alone");
                        vec![MetadataValue::from(single)]
                    }
                });
                FilterRule::RangeExclusion {
                    exclude,
                    lower_bound: map.remove("gte").map(MetadataValue::from),
                    upper_bound: map.remove("lte").map(MetadataValue::from),
                }
            }
            other => FilterRule::ExactValue(MetadataValue::from(other)),
        }
    }
}

impl FilterRule {
    /// Does `value` (or its absence) satisfy this rule?
    ///
    /// A missing value never equals anything and fails every bound check;
    /// it does pass a rule that only excludes values.
    pub fn matches(&self, value: Option<&MetadataValue>) -> bool {
        match self {
            FilterRule::ExactValue(expected) => {
                value.is_some_and(|v| v.strict_eq(expected))
            }
            FilterRule::SetMembership(allowed) => {
                value.is_some_and(|v| allowed.iter().any(|a| v.strict_eq(a)))
            }
            FilterRule::RangeExclusion {
                exclude,
                lower_bound,
                upper_bound,
            } => {
                if let (Some(excluded), Some(v)) = (exclude, value) {
                    if excluded.iter().any(|e| v.strict_eq(e)) {
                        return false;
                    }
                }
                if let Some(upper) = upper_bound {
                    if !satisfies(value, upper, |o| o != Ordering::Greater) {
                        return false;
                    }
                }
                if let Some(lower) = lower_bound {
                    if !satisfies(value, lower, |o| o != Ordering::Less) {
                        return false;
                    }
                }
                true
            }
        }
    }
}

fn satisfies(
    value: Option<&MetadataValue>,
    bound: &MetadataValue,
    accept: impl Fn(Ordering) -> bool,
) -> bool {
    value
        .and_then(|v| v.compare(bound))
        .is_some_and(accept)
}

// ---------------------------------------------------------------------------
// Filter spec: property path → rule, all must hold
// ---------------------------------------------------------------------------

/// Property path → rule. Sorted by path so evaluation order (and therefore
/// short-circuiting) is reproducible.
pub type FilterSpec = BTreeMap<String, FilterRule>;

/// True when every rule in `spec` matches the value at its path.
/// A missing or empty spec lets everything through.
pub fn passes(metadata: &Metadata, spec: Option<&FilterSpec>) -> bool {
    let Some(spec) = spec else {
        return true;
    };
    spec.iter()
        .all(|(path, rule)| rule.matches(resolve(metadata, path)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rule(raw: JsonValue) -> FilterRule {
        FilterRule::from(raw)
    }

    fn int(i: i64) -> MetadataValue {
        MetadataValue::Integer(i)
    }

    fn metadata(value: JsonValue) -> Metadata {
        match MetadataValue::from(value) {
            MetadataValue::Map(map) => map,
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn test_rule_shape_tagging() {
        assert!(matches!(rule(json!([1, 2])), FilterRule::SetMembership(_)));
        assert!(matches!(rule(json!({"lte": 3})), FilterRule::RangeExclusion { .. }));
        assert!(matches!(rule(json!("x")), FilterRule::ExactValue(_)));
        // Object without range keys is matched as a raw value.
        assert!(matches!(
            rule(json!({"name": "x"})),
            FilterRule::ExactValue(MetadataValue::Map(_))
        ));
    }

    #[test]
    fn test_exact_value_is_strict() {
        let r = rule(json!("2"));
        assert!(r.matches(Some(&MetadataValue::String("2".into()))));
        assert!(!r.matches(Some(&int(2))));
        assert!(!r.matches(None));
    }

    #[test]
    fn test_set_membership() {
        let r = rule(json!([1, 2, 3]));
        assert!(r.matches(Some(&int(3))));
        assert!(!r.matches(Some(&int(4))));
        assert!(!r.matches(None));
    }

    #[test]
    fn test_range_inclusive_bounds() {
        let r = rule(json!({"gte": 5}));
        assert!(r.matches(Some(&int(5))));
        assert!(!r.matches(Some(&MetadataValue::Float(4.999))));

        let r = rule(json!({"lte": 10}));
        assert!(r.matches(Some(&int(10))));
        assert!(!r.matches(Some(&MetadataValue::Float(10.5))));
    }

    #[test]
    fn test_exclusion_wins_over_bound() {
        let r = rule(json!({"lte": 10, "not": [10]}));
        assert!(!r.matches(Some(&int(10))));
        assert!(r.matches(Some(&int(9))));
    }

    #[test]
    fn test_missing_value_fails_both_bounds() {
        assert!(!rule(json!({"lte": 10})).matches(None));
        assert!(!rule(json!({"gte": 0})).matches(None));
        assert!(rule(json!({"not": ["0"]})).matches(None));
    }

    #[test]
    fn test_mismatched_types_fail_bounds() {
        let r = rule(json!({"gte": 1}));
        assert!(!r.matches(Some(&MetadataValue::String("2".into()))));
        assert!(!r.matches(Some(&MetadataValue::Null)));
    }

    #[test]
    fn test_scalar_not_is_single_exclusion() {
        let r = rule(json!({"not": "0"}));
        assert!(!r.matches(Some(&MetadataValue::String("0".into()))));
        assert!(r.matches(Some(&MetadataValue::String("1".into()))));
    }

    #[test]
    fn test_passes_empty_and_absent_spec() {
        let md = metadata(json!({"a": 1}));
        assert!(passes(&md, None));
        assert!(passes(&md, Some(&FilterSpec::new())));
    }

    #[test]
    fn test_passes_requires_all_rules() {
        let md = metadata(json!({"level": "2", "props": {"area": 45.2}}));
        let mut spec = FilterSpec::new();
        spec.insert("level".into(), rule(json!({"not": ["0"]})));
        spec.insert("props.area".into(), rule(json!({"gte": 40, "lte": 50})));
        assert!(passes(&md, Some(&spec)));

        spec.insert("category".into(), rule(json!("Walls")));
        assert!(!passes(&md, Some(&spec)));
    }

    #[test]
    fn test_filter_spec_deserializes() {
        let spec: FilterSpec =
            serde_json::from_value(json!({"level": {"not": ["0"]}, "kind": ["a", "b"]}))
                .unwrap();
        assert_eq!(spec.len(), 2);
        assert_eq!(spec.keys().next().map(String::as_str), Some("kind"));
    }
}
