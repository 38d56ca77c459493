use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::Value as JsonValue;

use super::model::{Metadata, MetadataValue, NodeKind, SceneNode};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load scene nodes from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.json` – `[{ "id": ..., "kind": ..., "metadata": {...} }, ...]` or `{ "nodes": [...] }`
/// * `.csv`  – one node per row; dotted headers build nested metadata
pub fn load_file(path: &Path) -> Result<Vec<SceneNode>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let nodes = match ext.as_str() {
        "json" => load_json(path)?,
        "csv" => load_csv(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };
    log::info!("loaded {} nodes from {}", nodes.len(), path.display());
    Ok(nodes)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema:
///
/// ```json
/// [
///   { "id": "wall-1", "kind": "mesh", "metadata": { "level": "2", "props": { "area": 45.2 } } },
///   { "id": "wall-2", "category": "Walls", "level": "0" }
/// ]
/// ```
///
/// When `metadata` is absent every key other than `id` and `kind` is
/// metadata. A missing id becomes `node-<row>`, a missing kind `mesh`.
fn load_json(path: &Path) -> Result<Vec<SceneNode>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;
    nodes_from_json(root)
}

/// Build nodes from an already-parsed JSON document.
pub fn nodes_from_json(root: JsonValue) -> Result<Vec<SceneNode>> {
    let records = match root {
        JsonValue::Array(records) => records,
        JsonValue::Object(mut obj) => match obj.remove("nodes") {
            Some(JsonValue::Array(records)) => records,
            _ => bail!("Expected a JSON array or an object with a `nodes` array"),
        },
        _ => bail!("Expected a JSON array or an object with a `nodes` array"),
    };

    records
        .into_iter()
        .enumerate()
        .map(|(i, rec)| {
            let JsonValue::Object(mut obj) = rec else {
                bail!("Row {i} is not a JSON object");
            };

            let id = match obj.remove("id") {
                Some(JsonValue::String(s)) => s,
                Some(JsonValue::Number(n)) => n.to_string(),
                _ => format!("node-{i}"),
            };
            let kind = match obj.remove("kind").or_else(|| obj.remove("type")) {
                Some(JsonValue::String(s)) => NodeKind::from(s),
                _ => NodeKind::default(),
            };
            let metadata = match obj.remove("metadata").or_else(|| obj.remove("userData")) {
                Some(JsonValue::Object(md)) => json_object_to_metadata(md),
                Some(JsonValue::Null) => Metadata::new(),
                Some(other) => bail!("Row {i}: `metadata` must be an object, got {other}"),
                None => json_object_to_metadata(obj),
            };

            Ok(SceneNode::new(id, kind, metadata))
        })
        .collect()
}

fn json_object_to_metadata(obj: serde_json::Map<String, JsonValue>) -> Metadata {
    obj.into_iter()
        .map(|(k, v)| (k, MetadataValue::from(v)))
        .collect()
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout:  header row with column names.
/// `id` and `kind` columns are optional; every other column is metadata.
/// A header like `props.area` nests the value as `{ "props": { "area": ... } }`.
fn load_csv(path: &Path) -> Result<Vec<SceneNode>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let id_idx = headers.iter().position(|h| h == "id");
    let kind_idx = headers.iter().position(|h| h == "kind");

    let mut nodes = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let id = id_idx
            .and_then(|i| record.get(i))
            .filter(|s| !s.is_empty())
            .map_or_else(|| format!("node-{row_no}"), str::to_string);
        let kind = kind_idx
            .and_then(|i| record.get(i))
            .filter(|s| !s.is_empty())
            .map_or_else(NodeKind::default, NodeKind::from);

        let mut metadata = Metadata::new();
        for (col_idx, value) in record.iter().enumerate() {
            if Some(col_idx) == id_idx || Some(col_idx) == kind_idx {
                continue;
            }
            let Some(col_name) = headers.get(col_idx) else {
                bail!("CSV row {row_no} has more fields than headers");
            };
            insert_nested(&mut metadata, col_name, guess_metadata_type(value))
                .with_context(|| format!("CSV row {row_no}, column `{col_name}`"))?;
        }

        nodes.push(SceneNode::new(id, kind, metadata));
    }

    Ok(nodes)
}

/// Insert `value` at a dotted `path`, creating intermediate maps.
fn insert_nested(metadata: &mut Metadata, path: &str, value: MetadataValue) -> Result<()> {
    let mut segments: Vec<&str> = path.split('.').collect();
    let Some(last) = segments.pop() else {
        bail!("empty column name");
    };
    let mut current = metadata;
    for segment in segments {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| MetadataValue::Map(Metadata::new()));
        current = match entry {
            MetadataValue::Map(map) => map,
            _ => bail!("`{segment}` is both a value and a group"),
        };
    }
    current.insert(last.to_string(), value);
    Ok(())
}

fn guess_metadata_type(s: &str) -> MetadataValue {
    if s.is_empty() {
        return MetadataValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return MetadataValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return MetadataValue::Float(f);
    }
    if s == "true" || s == "false" {
        return MetadataValue::Bool(s == "true");
    }
    MetadataValue::String(s.to_string())
}
