use super::model::{Metadata, MetadataValue};

// ---------------------------------------------------------------------------
// Property path resolution
// ---------------------------------------------------------------------------

/// Resolve a dot-separated `path` against nested metadata.
///
/// Every segment but the last must land on a [`MetadataValue::Map`]; a
/// missing key or any other shape on the way down yields `None`. The final
/// value is returned untouched. An empty path never resolves.
pub fn resolve<'a>(metadata: &'a Metadata, path: &str) -> Option<&'a MetadataValue> {
    if path.is_empty() {
        return None;
    }
    let mut segments = path.split('.');
    let last = segments.next_back()?;

    let mut current = metadata;
    for segment in segments {
        current = current.get(segment)?.as_map()?;
    }
    current.get(last)
}
