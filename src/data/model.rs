use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Label used wherever a missing property has to be rendered as text.
pub const MISSING_LABEL: &str = "undefined";

/// Root of a node's metadata: key → nested value.
pub type Metadata = BTreeMap<String, MetadataValue>;

// ---------------------------------------------------------------------------
// MetadataValue – one value inside a node's nested metadata
// ---------------------------------------------------------------------------

/// A dynamically-typed metadata value, recursive over lists and maps.
///
/// `==`, `Ord` and `Hash` are *identity* relations (total, NaN equals NaN) so
/// values can live in `BTreeSet`s. Filter semantics use [`strict_eq`] and
/// [`compare`] instead.
///
/// [`strict_eq`]: MetadataValue::strict_eq
/// [`compare`]: MetadataValue::compare
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "JsonValue", into = "JsonValue")]
pub enum MetadataValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    List(Vec<MetadataValue>),
    Map(Metadata),
    Null,
}

// -- Manual Eq/Ord so we can put MetadataValue in BTreeSet --

impl PartialEq for MetadataValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MetadataValue {}

impl PartialOrd for MetadataValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MetadataValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use MetadataValue::*;
        fn discriminant(v: &MetadataValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
                List(_) => 5,
                Map(_) => 6,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            (List(a), List(b)) => a.cmp(b),
            (Map(a), Map(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl std::hash::Hash for MetadataValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            MetadataValue::String(s) => s.hash(state),
            MetadataValue::Integer(i) => i.hash(state),
            MetadataValue::Float(f) => f.to_bits().hash(state),
            MetadataValue::Bool(b) => b.hash(state),
            MetadataValue::List(items) => items.hash(state),
            MetadataValue::Map(map) => map.hash(state),
            MetadataValue::Null => {}
        }
    }
}

/// Canonical stringification, shared by legends and the category hash.
impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::String(s) => write!(f, "{s}"),
            MetadataValue::Integer(i) => write!(f, "{i}"),
            MetadataValue::Float(v) => write!(f, "{}", format_float(*v)),
            MetadataValue::Bool(b) => write!(f, "{b}"),
            MetadataValue::Null => write!(f, "null"),
            MetadataValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            MetadataValue::Map(_) => {
                let json: JsonValue = self.clone().into();
                write!(f, "{json}")
            }
        }
    }
}

fn format_float(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_infinite() {
        let label = if v > 0.0 { "Infinity" } else { "-Infinity" };
        label.to_string()
    } else if v == 0.0 {
        // -0.0 prints as "0" too
        "0".to_string()
    } else {
        // Number-to-string as a JavaScript viewer prints it, so labels and
        // hash hues agree: "1e-7", "1.5e+21", "2" for 2.0.
        ryu_js::Buffer::new().format_finite(v).to_string()
    }
}

impl MetadataValue {
    /// Try to interpret the value as an `f64` without any coercion.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetadataValue::Float(v) => Some(*v),
            MetadataValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Metadata> {
        match self {
            MetadataValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Coerce to a finite number for gradient colouring.
    ///
    /// Numbers pass through, strings are trimmed and parsed, booleans map to
    /// 1/0. Everything else (and any non-finite result) is `None`.
    pub fn to_number(&self) -> Option<f64> {
        let n = match self {
            MetadataValue::Integer(_) | MetadataValue::Float(_) => self.as_f64()?,
            MetadataValue::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                trimmed.parse::<f64>().ok()?
            }
            MetadataValue::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            _ => return None,
        };
        n.is_finite().then_some(n)
    }

    /// Strict equality: no coercion between strings, numbers and booleans.
    ///
    /// Integers and floats are one numeric type and compare by value; NaN
    /// equals nothing. Lists and maps compare element-wise.
    pub fn strict_eq(&self, other: &MetadataValue) -> bool {
        use MetadataValue::*;
        match (self, other) {
            (Integer(a), Integer(b)) => a == b,
            (Integer(_) | Float(_), Integer(_) | Float(_)) => {
                self.as_f64() == other.as_f64()
            }
            (String(a), String(b)) => a == b,
            (Bool(a), Bool(b)) => a == b,
            (Null, Null) => true,
            (List(a), List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.strict_eq(y))
            }
            (Map(a), Map(b)) => {
                a.len() == b.len()
                    && a
                        .iter()
                        .zip(b)
                        .all(|((ka, va), (kb, vb))| ka == kb && va.strict_eq(vb))
            }
            _ => false,
        }
    }

    /// Ordering used by range bounds. `None` means the pair is unordered and
    /// any bound check on it fails.
    pub fn compare(&self, other: &MetadataValue) -> Option<Ordering> {
        use MetadataValue::*;
        match (self, other) {
            (Integer(a), Integer(b)) => Some(a.cmp(b)),
            (Integer(_) | Float(_), Integer(_) | Float(_)) => {
                self.as_f64()?.partial_cmp(&other.as_f64()?)
            }
            (String(a), String(b)) => Some(a.cmp(b)),
            (Bool(a), Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

// -- JSON conversion --

impl From<JsonValue> for MetadataValue {
    fn from(val: JsonValue) -> Self {
        match val {
            JsonValue::String(s) => MetadataValue::String(s),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    MetadataValue::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    MetadataValue::Float(f)
                } else {
                    MetadataValue::String(n.to_string())
                }
            }
            JsonValue::Bool(b) => MetadataValue::Bool(b),
            JsonValue::Null => MetadataValue::Null,
            JsonValue::Array(items) => {
                MetadataValue::List(items.into_iter().map(MetadataValue::from).collect())
            }
            JsonValue::Object(map) => MetadataValue::Map(
                map.into_iter()
                    .map(|(k, v)| (k, MetadataValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<MetadataValue> for JsonValue {
    fn from(val: MetadataValue) -> Self {
        match val {
            MetadataValue::String(s) => JsonValue::String(s),
            MetadataValue::Integer(i) => JsonValue::from(i),
            // Non-finite floats have no JSON form.
            MetadataValue::Float(f) => serde_json::Number::from_f64(f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            MetadataValue::Bool(b) => JsonValue::Bool(b),
            MetadataValue::Null => JsonValue::Null,
            MetadataValue::List(items) => {
                JsonValue::Array(items.into_iter().map(JsonValue::from).collect())
            }
            MetadataValue::Map(map) => JsonValue::Object(
                map.into_iter().map(|(k, v)| (k, JsonValue::from(v))).collect(),
            ),
        }
    }
}

/// Render an optional (possibly missing) value with the canonical conversion.
pub fn label_for(value: Option<&MetadataValue>) -> String {
    value.map_or_else(|| MISSING_LABEL.to_string(), |v| v.to_string())
}

// ---------------------------------------------------------------------------
// NodeKind / SceneNode – what the renderer hands us
// ---------------------------------------------------------------------------

/// Renderable kind of a scene node, parsed case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    #[default]
    Mesh,
    Line,
    Points,
    Group,
    Other(String),
}

impl NodeKind {
    /// Only mesh-like nodes get a ghosted stand-in when they fail a filter.
    pub fn is_ghostable(&self) -> bool {
        matches!(self, NodeKind::Mesh)
    }
}

impl From<String> for NodeKind {
    fn from(s: String) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "mesh" => NodeKind::Mesh,
            "line" | "linesegments" => NodeKind::Line,
            "points" | "point" => NodeKind::Points,
            "group" | "object3d" => NodeKind::Group,
            _ => NodeKind::Other(s),
        }
    }
}

impl From<&str> for NodeKind {
    fn from(s: &str) -> Self {
        NodeKind::from(s.to_string())
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Mesh => write!(f, "mesh"),
            NodeKind::Line => write!(f, "line"),
            NodeKind::Points => write!(f, "points"),
            NodeKind::Group => write!(f, "group"),
            NodeKind::Other(s) => write!(f, "{s}"),
        }
    }
}

/// A renderable entity as seen by the classifier: an id, a kind tag and its
/// nested metadata. Borrowed read-only during classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    pub id: String,
    #[serde(default)]
    pub kind: NodeKind,
    #[serde(default)]
    pub metadata: Metadata,
}

impl SceneNode {
    pub fn new(id: impl Into<String>, kind: NodeKind, metadata: Metadata) -> Self {
        SceneNode {
            id: id.into(),
            kind,
            metadata,
        }
    }

    /// Copy of this node with its metadata stripped, so the stand-in can
    /// never match a filter downstream.
    pub fn ghost_clone(&self) -> SceneNode {
        SceneNode {
            id: self.id.clone(),
            kind: self.kind.clone(),
            metadata: Metadata::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strict_eq_no_coercion() {
        let two = MetadataValue::Integer(2);
        assert!(two.strict_eq(&MetadataValue::Float(2.0)));
        assert!(!two.strict_eq(&MetadataValue::String("2".into())));
        assert!(!MetadataValue::Bool(true).strict_eq(&MetadataValue::Integer(1)));
        assert!(!MetadataValue::Float(f64::NAN).strict_eq(&MetadataValue::Float(f64::NAN)));
    }

    #[test]
    fn test_strict_eq_structural() {
        let a = MetadataValue::from(json!({"a": [1, 2], "b": "x"}));
        let b = MetadataValue::from(json!({"a": [1.0, 2], "b": "x"}));
        let c = MetadataValue::from(json!({"a": [1, 3], "b": "x"}));
        assert!(a.strict_eq(&b));
        assert!(!a.strict_eq(&c));
    }

    #[test]
    fn test_compare_mixed_types_unordered() {
        let n = MetadataValue::Integer(5);
        assert_eq!(n.compare(&MetadataValue::Float(4.5)), Some(Ordering::Greater));
        assert_eq!(n.compare(&MetadataValue::String("5".into())), None);
        assert_eq!(MetadataValue::Null.compare(&MetadataValue::Null), None);
        assert_eq!(
            MetadataValue::String("b".into()).compare(&MetadataValue::String("a".into())),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn test_to_number() {
        assert_eq!(MetadataValue::String(" 45.2 ".into()).to_number(), Some(45.2));
        assert_eq!(MetadataValue::String("abc".into()).to_number(), None);
        assert_eq!(MetadataValue::String("".into()).to_number(), None);
        assert_eq!(MetadataValue::String("inf".into()).to_number(), None);
        assert_eq!(MetadataValue::Bool(true).to_number(), Some(1.0));
        assert_eq!(MetadataValue::Null.to_number(), None);
        assert_eq!(MetadataValue::Integer(7).to_number(), Some(7.0));
    }

    #[test]
    fn test_display_canonical() {
        assert_eq!(MetadataValue::Float(3.0).to_string(), "3");
        assert_eq!(MetadataValue::Float(-0.0).to_string(), "0");
        assert_eq!(MetadataValue::Float(45.2).to_string(), "45.2");
        assert_eq!(MetadataValue::from(json!([1, "a", true])).to_string(), "1,a,true");
        assert_eq!(MetadataValue::from(json!({"b": 1, "a": 2})).to_string(), r#"{"a":2,"b":1}"#);
        assert_eq!(label_for(None), "undefined");
    }

    #[test]
    fn test_display_uses_exponent_outside_plain_range() {
        assert_eq!(MetadataValue::Float(1e-7).to_string(), "1e-7");
        assert_eq!(MetadataValue::Float(0.000001).to_string(), "0.000001");
        assert_eq!(MetadataValue::Float(1.5e21).to_string(), "1.5e+21");
        assert_eq!(MetadataValue::Float(1e21).to_string(), "1e+21");
        assert_eq!(MetadataValue::Float(1e20).to_string(), "100000000000000000000");
        assert_eq!(MetadataValue::Float(f64::NAN).to_string(), "NaN");
        assert_eq!(label_for(Some(&MetadataValue::Float(2.5e-8))), "2.5e-8");
    }

    #[test]
    fn test_node_kind_parsing() {
        assert_eq!(NodeKind::from("Mesh"), NodeKind::Mesh);
        assert_eq!(NodeKind::from("LineSegments"), NodeKind::Line);
        assert_eq!(NodeKind::from("Sprite"), NodeKind::Other("Sprite".into()));
        assert!(NodeKind::Mesh.is_ghostable());
        assert!(!NodeKind::Group.is_ghostable());
    }

    #[test]
    fn test_ghost_clone_strips_metadata() {
        let mut metadata = Metadata::new();
        metadata.insert("level".into(), MetadataValue::String("0".into()));
        let node = SceneNode::new("wall-1", NodeKind::Mesh, metadata);
        let ghost = node.ghost_clone();
        assert!(ghost.metadata.is_empty());
        assert_eq!(ghost.id, "wall-1");
        assert_eq!(node.metadata.len(), 1);
    }

    #[test]
    fn test_scene_node_deserialize_defaults() {
        let node: SceneNode =
            serde_json::from_value(json!({"id": "n1", "metadata": {"a": {"b": 1}}})).unwrap();
        assert_eq!(node.kind, NodeKind::Mesh);
        assert!(matches!(node.metadata.get("a"), Some(MetadataValue::Map(_))));
    }
}
