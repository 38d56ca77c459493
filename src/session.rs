use std::collections::BTreeSet;

use serde::Serialize;

use crate::color::{category, Color, Shade};
use crate::config::{ClassificationConfig, ColorSpec};
use crate::data::model::{label_for, MetadataValue, SceneNode};
use crate::data::path::resolve;
use crate::pipeline::{classify_batch, ClassificationResult, GhostHint};

// ---------------------------------------------------------------------------
// Viewer session state
// ---------------------------------------------------------------------------

/// Loaded nodes plus the active classification, independent of rendering.
#[derive(Debug, Default)]
pub struct ViewerSession {
    nodes: Vec<SceneNode>,
    config: Option<ClassificationConfig>,
    /// One result per node, same order (cached).
    results: Vec<ClassificationResult>,
}

/// Tally of one classification pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub visible: usize,
    pub ghosted: usize,
    pub hidden: usize,
    pub colored: usize,
    pub undetermined: usize,
}

/// A node after its decision has been applied, ready for the draw list.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderedNode<'a> {
    Visible {
        node: &'a SceneNode,
        shade: Option<Shade>,
    },
    /// Metadata-stripped stand-in.
    Ghost { node: SceneNode, hint: GhostHint },
}

impl ViewerSession {
    pub fn new(nodes: Vec<SceneNode>) -> Self {
        let mut session = ViewerSession {
            nodes,
            config: None,
            results: Vec::new(),
        };
        session.reclassify();
        session
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    pub fn config(&self) -> Option<&ClassificationConfig> {
        self.config.as_ref()
    }

    pub fn results(&self) -> &[ClassificationResult] {
        &self.results
    }

    /// Swap the active config and re-classify everything.
    pub fn set_config(&mut self, config: Option<ClassificationConfig>) {
        self.config = config;
        self.reclassify();
    }

    fn reclassify(&mut self) {
        self.results = classify_batch(&self.nodes, self.config.as_ref());
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary {
            total: self.results.len(),
            ..Summary::default()
        };
        for result in &self.results {
            match result {
                ClassificationResult::Hidden => summary.hidden += 1,
                ClassificationResult::Ghosted(_) => summary.ghosted += 1,
                ClassificationResult::Visible(shade) => {
                    summary.visible += 1;
                    match shade {
                        Some(s) if s.is_undetermined() => summary.undetermined += 1,
                        Some(_) => summary.colored += 1,
                        None => {}
                    }
                }
            }
        }
        summary
    }

    /// Apply every decision: hidden nodes drop out, ghosted ones become
    /// metadata-free clones, visible ones carry their shade.
    pub fn render_set(&self) -> Vec<RenderedNode<'_>> {
        self.nodes
            .iter()
            .zip(&self.results)
            .filter_map(|(node, result)| match result {
                ClassificationResult::Hidden => None,
                ClassificationResult::Ghosted(hint) => Some(RenderedNode::Ghost {
                    node: node.ghost_clone(),
                    hint: *hint,
                }),
                ClassificationResult::Visible(shade) => Some(RenderedNode::Visible {
                    node,
                    shade: *shade,
                }),
            })
            .collect()
    }

    /// Sorted distinct values of `property` across all nodes.
    pub fn unique_values(&self, property: &str) -> BTreeSet<MetadataValue> {
        self.nodes
            .iter()
            .filter_map(|n| resolve(&n.metadata, property).cloned())
            .collect()
    }

    /// Legend entries (label → colour) for the active colour rule.
    ///
    /// Category: one entry per distinct label among visible nodes.
    /// Gradient: one entry per spectrum stop.
    pub fn legend_entries(&self) -> Vec<(String, Color)> {
        let Some(color_by) = self.config.as_ref().and_then(|c| c.color_by.as_ref()) else {
            return Vec::new();
        };
        match color_by {
            ColorSpec::Category(spec) => {
                let labels: BTreeSet<String> = self
                    .nodes
                    .iter()
                    .zip(&self.results)
                    .filter(|(_, r)| r.is_visible())
                    .map(|(n, _)| label_for(resolve(&n.metadata, &spec.property)))
                    .collect();
                labels
                    .into_iter()
                    .map(|label| {
                        let color = spec.color_for_label(&label);
                        (label, color)
                    })
                    .collect()
            }
            ColorSpec::Gradient(spec) => spec
                .spectrum
                .stop_values()
                .into_iter()
                .map(|(value, color)| (MetadataValue::Float(value).to_string(), color))
                .collect(),
            ColorSpec::Unrecognized => Vec::new(),
        }
    }
}

/// Hash colour for a literal label, as the category colouriser would pick
/// it with no palette or default.
pub fn preview_hash_color(label: &str) -> (u16, Color) {
    (category::category_hue(label), category::hash_color(label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::nodes_from_json;
    use serde_json::json;

    fn session() -> ViewerSession {
        let nodes = nodes_from_json(json!([
            {"id": "a", "kind": "mesh", "metadata": {"level": "0", "cat": "Walls", "area": 10}},
            {"id": "b", "kind": "mesh", "metadata": {"level": "1", "cat": "Floors", "area": "n/a"}},
            {"id": "c", "kind": "line", "metadata": {"level": "0", "cat": "Walls", "area": 50}},
            {"id": "d", "kind": "mesh", "metadata": {"level": "2", "cat": "Walls", "area": 90}}
        ]))
        .unwrap();
        ViewerSession::new(nodes)
    }

    fn config(color_by: serde_json::Value) -> ClassificationConfig {
        ClassificationConfig::from_json_value(json!({
            "filterBy": {"level": {"not": ["0"]}},
            "colorBy": color_by,
            "ghostNonMatching": true
        }))
        .unwrap()
    }

    #[test]
    fn test_no_config_everything_visible() {
        let s = session();
        assert_eq!(s.summary().visible, 4);
        assert_eq!(s.render_set().len(), 4);
        assert!(s.legend_entries().is_empty());
    }

    #[test]
    fn test_summary_and_render_set() {
        let mut s = session();
        s.set_config(Some(config(json!({
            "type": "gradient", "property": "area", "spectrumColors": ["#0000ff", "#ff0000"]
        }))));
        let summary = s.summary();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.visible, 2);
        assert_eq!(summary.ghosted, 1);
        assert_eq!(summary.hidden, 1);
        assert_eq!(summary.colored, 1);
        assert_eq!(summary.undetermined, 1);

        let rendered = s.render_set();
        assert_eq!(rendered.len(), 3);
        match &rendered[0] {
            RenderedNode::Ghost { node, hint } => {
                assert_eq!(node.id, "a");
                assert!(node.metadata.is_empty());
                assert_eq!(*hint, GhostHint::DEFAULT);
            }
            other => panic!("expected ghost, got {other:?}"),
        }
        // The original node keeps its metadata.
        assert!(!s.nodes()[0].metadata.is_empty());
    }

    #[test]
    fn test_category_legend_from_visible_nodes() {
        let mut s = session();
        s.set_config(Some(config(json!({
            "type": "category", "property": "cat", "values": {"Walls": "#ff0000"}
        }))));
        let legend = s.legend_entries();
        let labels: Vec<&str> = legend.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["Floors", "Walls"]);
        assert_eq!(legend[1].1, Color::rgb(255, 0, 0));
        assert_eq!(legend[0].1, category::hash_color("Floors"));
    }

    #[test]
    fn test_gradient_legend_lists_stops() {
        let mut s = session();
        s.set_config(Some(config(json!({
            "type": "gradient", "property": "area", "minValue": 0, "maxValue": 100,
            "spectrumColors": ["#0000ff", "#00ff00", "#ff0000"]
        }))));
        let labels: Vec<String> = s.legend_entries().into_iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["0", "50", "100"]);
    }

    #[test]
    fn test_unique_values_sorted() {
        let s = session();
        let cats: Vec<String> = s.unique_values("cat").iter().map(|v| v.to_string()).collect();
        assert_eq!(cats, vec!["Floors", "Walls"]);
        assert!(s.unique_values("missing").is_empty());
    }

    #[test]
    fn test_preview_hash_color() {
        assert_eq!(preview_hash_color("Steel").0, 299);
    }
}
