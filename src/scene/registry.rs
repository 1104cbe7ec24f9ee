//! Logical element registry and hit resolution.
//!
//! Every node is assigned, once at setup, to the nearest ancestor (or itself)
//! that roots a registered element. Resolving a picked node is then a single
//! index lookup instead of a parent walk per click.

use crate::render::PickHit;
use crate::scene::layout::{ElementDesc, LayoutError};
use crate::scene::{NodeId, Scene};
use std::collections::HashMap;

/// What a logical element does when clicked.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", content = "view", rename_all = "snake_case")]
pub enum ElementKind {
    /// Navigates the camera to the named view.
    View(String),
    /// Flips the toggle with the same id as the element.
    Toggle,
    /// Hoverable only.
    Inert,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalElement {
    pub id: String,
    pub kind: ElementKind,
}

#[derive(Debug, Default)]
pub struct SceneRegistry {
    elements: Vec<LogicalElement>,
    by_id: HashMap<String, usize>,
    /// Element index owning each node, indexed by `NodeId`.
    owner: Vec<Option<usize>>,
    /// Nodes owned by each element, in arena order.
    members: Vec<Vec<NodeId>>,
}

impl SceneRegistry {
    pub fn build(scene: &Scene, descs: &[ElementDesc]) -> Result<Self, LayoutError> {
        let mut registry = Self::default();
        let mut root_of: HashMap<NodeId, usize> = HashMap::new();

        for desc in descs {
            if registry.by_id.contains_key(&desc.id) {
                return Err(LayoutError::DuplicateElement(desc.id.clone()));
            }
            let node = scene
                .node_id(&desc.node)
                .ok_or_else(|| LayoutError::UnknownElementNode {
                    element: desc.id.clone(),
                    node: desc.node.clone(),
                })?;
            let index = registry.elements.len();
            if let Some(&first) = root_of.get(&node) {
                return Err(LayoutError::SharedElementNode {
                    node: desc.node.clone(),
                    first: registry.elements[first].id.clone(),
                    second: desc.id.clone(),
                });
            }
            registry.elements.push(LogicalElement {
                id: desc.id.clone(),
                kind: desc.kind.clone(),
            });
            registry.by_id.insert(desc.id.clone(), index);
            root_of.insert(node, index);
        }

        // Parents precede children in the arena, so one forward pass is enough.
        registry.owner = vec![None; scene.len()];
        registry.members = vec![Vec::new(); registry.elements.len()];
        for (id, node) in scene.nodes() {
            let owner = root_of
                .get(&id)
                .copied()
                .or_else(|| node.parent.and_then(|parent| registry.owner[parent.index()]));
            registry.owner[id.index()] = owner;
            if let Some(index) = owner {
                registry.members[index].push(id);
            }
        }

        log::debug!(
            "Scene registry built: {} elements over {} nodes",
            registry.elements.len(),
            scene.len()
        );
        Ok(registry)
    }

    pub fn elements(&self) -> &[LogicalElement] {
        &self.elements
    }

    /// All nodes belonging to an element's group, including nested meshes.
    pub fn element_nodes(&self, id: &str) -> &[NodeId] {
        self.by_id
            .get(id)
            .map(|&index| self.members[index].as_slice())
            .unwrap_or(&[])
    }

    /// Map a struck node to the logical element that owns it, if any.
    pub fn resolve(&self, node: NodeId) -> Option<&LogicalElement> {
        self.owner
            .get(node.index())
            .copied()
            .flatten()
            .map(|index| &self.elements[index])
    }

    /// Resolve only the nearest hit; farther hits are occluded even if they
    /// would resolve to an element themselves.
    pub fn resolve_nearest(&self, hits: &[PickHit]) -> Option<&LogicalElement> {
        hits.first().and_then(|hit| self.resolve(hit.node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{NodeDesc, Shape};
    use glam::Vec3;

    fn node(name: &str, parent: Option<&str>) -> NodeDesc {
        NodeDesc {
            name: name.to_string(),
            parent: parent.map(str::to_string),
            shape: Shape::Box {
                half_extents: Vec3::splat(0.5),
            },
            translation: Vec3::ZERO,
            visible: true,
            pickable: true,
            material: None,
        }
    }

    fn element(id: &str, node: &str, kind: ElementKind) -> ElementDesc {
        ElementDesc {
            id: id.to_string(),
            node: node.to_string(),
            kind,
        }
    }

    fn fixture() -> (Scene, SceneRegistry) {
        let mut scene = Scene::new();
        for desc in [
            node("wall", None),
            node("panel", None),
            node("panel-board", Some("panel")),
            node("toggle-0", Some("panel")),
            node("toggle-0-base", Some("toggle-0")),
            node("toggle-0-knob", Some("toggle-0")),
        ] {
            scene.add_node(&desc).unwrap();
        }
        let registry = SceneRegistry::build(
            &scene,
            &[
                element("panel", "panel", ElementKind::Inert),
                element("toggle[0]", "toggle-0", ElementKind::Toggle),
            ],
        )
        .unwrap();
        (scene, registry)
    }

    #[test]
    fn submeshes_resolve_to_their_group() {
        let (scene, registry) = fixture();
        for name in ["toggle-0", "toggle-0-base", "toggle-0-knob"] {
            let id = scene.node_id(name).unwrap();
            assert_eq!(registry.resolve(id).unwrap().id, "toggle[0]");
        }
    }

    #[test]
    fn nearest_registered_ancestor_wins() {
        let (scene, registry) = fixture();
        let board = scene.node_id("panel-board").unwrap();
        assert_eq!(registry.resolve(board).unwrap().id, "panel");
        assert_eq!(registry.element_nodes("panel").len(), 2);
        assert_eq!(registry.element_nodes("toggle[0]").len(), 3);
    }

    #[test]
    fn background_nodes_resolve_to_none() {
        let (scene, registry) = fixture();
        let wall = scene.node_id("wall").unwrap();
        assert!(registry.resolve(wall).is_none());
        assert!(registry.element_nodes("missing").is_empty());
    }

    #[test]
    fn only_first_hit_is_resolved() {
        let (scene, registry) = fixture();
        let hits = [
            PickHit {
                node: scene.node_id("wall").unwrap(),
                distance: 1.0,
                point: Vec3::ZERO,
            },
            PickHit {
                node: scene.node_id("toggle-0-knob").unwrap(),
                distance: 2.0,
                point: Vec3::ZERO,
            },
        ];
        assert!(registry.resolve_nearest(&hits).is_none());
        assert_eq!(
            registry.resolve_nearest(&hits[1..]).unwrap().kind,
            ElementKind::Toggle
        );
        assert!(registry.resolve_nearest(&[]).is_none());
    }

    #[test]
    fn elements_sharing_a_root_fail() {
        let (scene, _) = fixture();
        let result = SceneRegistry::build(
            &scene,
            &[
                element("toggle[0]", "toggle-0", ElementKind::Toggle),
                element("toggle-info", "toggle-0", ElementKind::Inert),
            ],
        );
        assert!(matches!(
            result,
            Err(LayoutError::SharedElementNode { first, second, .. })
                if first == "toggle[0]" && second == "toggle-info"
        ));
    }

    #[test]
    fn element_on_unknown_node_fails() {
        let (scene, _) = fixture();
        let result = SceneRegistry::build(
            &scene,
            &[element("ghost", "nowhere", ElementKind::Inert)],
        );
        assert!(matches!(result, Err(LayoutError::UnknownElementNode { .. })));
    }
}
