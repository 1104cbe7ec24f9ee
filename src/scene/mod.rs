pub mod layout;
pub mod registry;
pub mod showroom;

use glam::Vec3;
use std::collections::HashMap;

pub use layout::{LayoutError, NodeDesc, ShowroomLayout};
pub use registry::{ElementKind, SceneRegistry};

/// Index of a node in the scene arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Pickable geometry attached to a node, in node-local space.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    /// Pure grouping node, never intersected.
    Group,
    Box { half_extents: Vec3 },
    Sphere { radius: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightKind {
    Hemisphere,
    Point,
    Spot,
}

/// Light-specific data, keyed by `id` for enable/disable.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LightData {
    pub id: String,
    pub kind: LightKind,
    pub color: [f32; 3],
    pub intensity: f32,
    pub position: Vec3,
    #[serde(default)]
    pub enabled: bool,
    /// Name of a visual helper node; helpers are never pickable.
    #[serde(default)]
    pub helper: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: String,
    pub parent: Option<NodeId>,
    pub shape: Shape,
    pub translation: Vec3,
    pub visible: bool,
    pub pickable: bool,
    pub material: Option<String>,
}

/// Writes the interaction core is allowed to make into the scene.
///
/// Targets are addressed by the same names used in the layout. Unknown names
/// are ignored by implementations (with a warning), never fatal.
pub trait SceneEffects {
    fn set_light_enabled(&mut self, light: &str, enabled: bool);
    fn set_material(&mut self, node: &str, material: &str);
    fn set_visible(&mut self, node: &str, visible: bool);
    fn set_node_translation(&mut self, node: NodeId, translation: Vec3);
}

/// Static scene description. Nodes are stored parent-first, so a parent's
/// `NodeId` is always lower than its children's.
#[derive(Debug, Default)]
pub struct Scene {
    nodes: Vec<SceneNode>,
    by_name: HashMap<String, NodeId>,
    lights: Vec<LightData>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the arena from validated layout descriptions.
    pub fn from_layout(layout: &ShowroomLayout) -> Result<Self, LayoutError> {
        let mut scene = Self::new();
        for desc in &layout.nodes {
            scene.add_node(desc)?;
        }
        for light in &layout.lights {
            if let Some(helper) = &light.helper {
                if let Some(id) = scene.node_id(helper) {
                    scene.nodes[id.index()].pickable = false;
                }
            }
            scene.lights.push(light.clone());
        }
        Ok(scene)
    }

    pub fn add_node(&mut self, desc: &NodeDesc) -> Result<NodeId, LayoutError> {
        if self.by_name.contains_key(&desc.name) {
            return Err(LayoutError::DuplicateNode(desc.name.clone()));
        }
        let parent = match &desc.parent {
            Some(parent) => Some(self.node_id(parent).ok_or_else(|| {
                LayoutError::UnknownParent {
                    node: desc.name.clone(),
                    parent: parent.clone(),
                }
            })?),
            None => None,
        };
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(SceneNode {
            name: desc.name.clone(),
            parent,
            shape: desc.shape,
            translation: desc.translation,
            visible: desc.visible,
            pickable: desc.pickable,
            material: desc.material.clone(),
        });
        self.by_name.insert(desc.name.clone(), id);
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.index())
    }

    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    #[cfg(test)]
    pub fn node_by_name(&self, name: &str) -> Option<&SceneNode> {
        self.node_id(name).and_then(|id| self.node(id))
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId(index as u32), node))
    }

    pub fn world_translation(&self, id: NodeId) -> Vec3 {
        let mut translation = Vec3::ZERO;
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(node) = self.node(current) else {
                break;
            };
            translation += node.translation;
            cursor = node.parent;
        }
        translation
    }

    /// A node is rendered only if it and every ancestor are visible.
    pub fn is_visible_in_world(&self, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            match self.node(current) {
                Some(node) if node.visible => cursor = node.parent,
                _ => return false,
            }
        }
        true
    }

    #[cfg(test)]
    pub fn lights(&self) -> &[LightData] {
        &self.lights
    }

    #[cfg(test)]
    pub fn light(&self, id: &str) -> Option<&LightData> {
        self.lights.iter().find(|light| light.id == id)
    }

    pub fn enabled_lights(&self) -> Vec<&str> {
        self.lights
            .iter()
            .filter(|light| light.enabled)
            .map(|light| light.id.as_str())
            .collect()
    }
}

impl SceneEffects for Scene {
    fn set_light_enabled(&mut self, light: &str, enabled: bool) {
        let Some(entry) = self.lights.iter_mut().find(|entry| entry.id == light) else {
            log::warn!("Light '{}' not found in scene", light);
            return;
        };
        entry.enabled = enabled;
        if let Some(helper) = entry.helper.clone() {
            self.set_visible(&helper, enabled);
        }
    }

    fn set_material(&mut self, node: &str, material: &str) {
        match self.by_name.get(node) {
            Some(id) => {
                let entry = &mut self.nodes[id.index()];
                log::debug!("Material of '{}': {:?} -> {}", node, entry.material, material);
                entry.material = Some(material.to_string());
            }
            None => log::warn!("Material target '{}' not found in scene", node),
        }
    }

    fn set_visible(&mut self, node: &str, visible: bool) {
        match self.by_name.get(node) {
            Some(id) => self.nodes[id.index()].visible = visible,
            None => log::warn!("Visibility target '{}' not found in scene", node),
        }
    }

    fn set_node_translation(&mut self, node: NodeId, translation: Vec3) {
        if let Some(entry) = self.nodes.get_mut(node.index()) {
            entry.translation = translation;
        }
    }
}
