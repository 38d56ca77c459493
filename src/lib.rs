//! Rule-driven visibility and colour classification for scene graph nodes.
//!
//! Given a node's nested metadata and a [`ClassificationConfig`], decide
//! whether the node is visible, ghosted or hidden and which colour it gets.
//! Classification is a pure function of its inputs, so batches run in
//! parallel with no coordination.
//!
//! ```
//! use scene_classify::{classify, ClassificationConfig, ClassificationResult};
//! use scene_classify::data::loader::nodes_from_json;
//! use serde_json::json;
//!
//! let nodes = nodes_from_json(json!([{ "id": "w1", "level": "0" }])).unwrap();
//! let config = ClassificationConfig::from_json_value(json!({
//!     "filterBy": { "level": { "not": ["0"] } },
//!     "ghostNonMatching": false
//! }))
//! .unwrap();
//! assert_eq!(classify(&nodes[0], Some(&config)), ClassificationResult::Hidden);
//! ```

pub mod color;
pub mod config;
pub mod data;
pub mod pipeline;
pub mod session;

pub use color::{Color, Shade};
pub use config::{load_config, ClassificationConfig, ColorSpec, ConfigError};
pub use data::model::{Metadata, MetadataValue, NodeKind, SceneNode};
pub use pipeline::{classify, classify_batch, ClassificationResult, GhostHint};
pub use session::ViewerSession;
