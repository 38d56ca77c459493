/// Data layer: node model, property paths, filtering, and loading.
///
/// Architecture:
/// ```text
///  .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Vec<SceneNode>
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  model    │  SceneNode { id, kind, metadata }
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐     ┌────────┐
///   │  filter   │ ──► │  path   │  resolve "a.b.c" in nested metadata
///   └──────────┘     └────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod path;
