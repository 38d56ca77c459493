use log::debug;
use rayon::prelude::*;
use serde::Serialize;

use crate::color::{category, gradient, Shade};
use crate::config::{ClassificationConfig, ColorSpec};
use crate::data::filter::passes;
use crate::data::model::SceneNode;

// ---------------------------------------------------------------------------
// Classification result
// ---------------------------------------------------------------------------

/// Material hint for a ghosted stand-in: the renderer keeps the node's own
/// material at this opacity, makes it non-interactive and drops its metadata.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GhostHint {
    pub opacity: f32,
}

impl GhostHint {
    pub const DEFAULT: GhostHint = GhostHint { opacity: 0.05 };
}

/// Per-node decision handed back to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", content = "material", rename_all = "lowercase")]
pub enum ClassificationResult {
    Hidden,
    Ghosted(GhostHint),
    /// `None` leaves the node's existing material untouched.
    Visible(Option<Shade>),
}

impl ClassificationResult {
    pub fn is_visible(&self) -> bool {
        matches!(self, ClassificationResult::Visible(_))
    }

    pub fn shade(&self) -> Option<Shade> {
        match self {
            ClassificationResult::Visible(shade) => *shade,
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Decide visibility and colour for one node. Pure: same inputs, same output.
pub fn classify(node: &SceneNode, config: Option<&ClassificationConfig>) -> ClassificationResult {
    let Some(config) = config else {
        return ClassificationResult::Visible(None);
    };

    if !passes(&node.metadata, Some(&config.filter_by)) {
        return if config.ghost_non_matching && node.kind.is_ghostable() {
            ClassificationResult::Ghosted(GhostHint::DEFAULT)
        } else {
            ClassificationResult::Hidden
        };
    }

    let shade = match &config.color_by {
        None | Some(ColorSpec::Unrecognized) => None,
        Some(ColorSpec::Category(spec)) => {
            Some(Shade::solid(category::color_for(&node.metadata, spec)))
        }
        Some(ColorSpec::Gradient(spec)) => Some(gradient::shade_for(&node.metadata, spec)),
    };
    ClassificationResult::Visible(shade)
}

/// Classify every node in parallel. Output order matches `nodes`.
pub fn classify_batch(
    nodes: &[SceneNode],
    config: Option<&ClassificationConfig>,
) -> Vec<ClassificationResult> {
    let results: Vec<ClassificationResult> =
        nodes.par_iter().map(|node| classify(node, config)).collect();
    debug!(
        "classified {} nodes, {} visible",
        results.len(),
        results.iter().filter(|r| r.is_visible()).count()
    );
    results
}
