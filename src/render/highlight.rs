//! Hover outline selection.
//!
//! Recomputed from scratch on every pointer move or frame; nothing carries
//! over between calls except the last result, which the outline pass reads.

use crate::render::{Camera, Picker};
use crate::scene::{NodeId, Scene, SceneRegistry};
use glam::Vec2;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HoverState {
    pub hovered_id: Option<String>,
}

/// Mesh nodes the outline pass should draw this frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightSet {
    nodes: Vec<NodeId>,
}

impl HighlightSet {
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[cfg(test)]
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.binary_search(&node).is_ok()
    }
}

/// Outline set for a hovered element: its visible, pickable member meshes.
pub fn highlight_for(hovered: Option<&str>, registry: &SceneRegistry, scene: &Scene) -> HighlightSet {
    let Some(id) = hovered else {
        return HighlightSet::default();
    };
    let mut nodes: Vec<NodeId> = registry
        .element_nodes(id)
        .iter()
        .copied()
        .filter(|&node| {
            scene.is_visible_in_world(node)
                && scene
                    .node(node)
                    .map(|entry| entry.pickable && entry.shape != crate::scene::Shape::Group)
                    .unwrap_or(false)
        })
        .collect();
    nodes.sort_unstable();
    HighlightSet { nodes }
}

#[derive(Debug, Default)]
pub struct HoverHighlighter {
    state: HoverState,
    highlight: HighlightSet,
}

impl HoverHighlighter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_pointer_move(
        &mut self,
        ndc: Vec2,
        camera: &Camera,
        scene: &Scene,
        registry: &SceneRegistry,
    ) -> &HighlightSet {
        let hits = Picker::pick(ndc, camera, scene);
        let hovered = registry
            .resolve_nearest(&hits)
            .map(|element| element.id.clone());
        self.highlight = highlight_for(hovered.as_deref(), registry, scene);
        if self.state.hovered_id != hovered {
            log::trace!("Hover changed: {:?} -> {:?}", self.state.hovered_id, hovered);
        }
        self.state.hovered_id = hovered;
        &self.highlight
    }

    /// Pointer left the canvas.
    pub fn clear(&mut self) {
        self.state = HoverState::default();
        self.highlight = HighlightSet::default();
    }

    pub fn state(&self) -> &HoverState {
        &self.state
    }

    pub fn highlight(&self) -> &HighlightSet {
        &self.highlight
    }
}
