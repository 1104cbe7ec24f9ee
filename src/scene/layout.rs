use crate::app::views::{ViewDescriptor, ViewEffect};
use crate::scene::{ElementKind, LightData, Shape};
use crate::ui::{ToggleDesc, ToggleEffect};
use glam::Vec3;
use std::collections::{HashMap, HashSet};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate node name '{0}'")]
    DuplicateNode(String),
    #[error("node '{node}' references unknown or later-declared parent '{parent}'")]
    UnknownParent { node: String, parent: String },
    #[error("duplicate logical element '{0}'")]
    DuplicateElement(String),
    #[error("element '{element}' is bound to unknown node '{node}'")]
    UnknownElementNode { element: String, node: String },
    #[error("elements '{first}' and '{second}' share root node '{node}'")]
    SharedElementNode {
        node: String,
        first: String,
        second: String,
    },
    #[error("duplicate view '{0}'")]
    DuplicateView(String),
    #[error("unknown view '{0}'")]
    UnknownView(String),
    #[error("duplicate toggle '{0}'")]
    DuplicateToggle(String),
    #[error("toggle '{0}' has no logical element of kind toggle")]
    ToggleWithoutElement(String),
    #[error("'{owner}' references unknown node '{node}'")]
    UnknownNode { owner: String, node: String },
    #[error("duplicate light '{0}'")]
    DuplicateLight(String),
    #[error("'{owner}' references unknown light '{light}'")]
    UnknownLight { owner: String, light: String },
    #[error("light '{light}' is switched by toggle '{toggle}' and also by '{other}'")]
    LightOwnedByToggle {
        light: String,
        toggle: String,
        other: String,
    },
    #[error("'{0}' has a negative or non-finite duration")]
    InvalidDuration(String),
}

pub type Result<T> = std::result::Result<T, LayoutError>;

fn default_true() -> bool {
    true
}

/// One scene node as written in the layout file. Parents must be declared
/// before their children.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NodeDesc {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    pub shape: Shape,
    #[serde(default)]
    pub translation: Vec3,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "default_true")]
    pub pickable: bool,
    #[serde(default)]
    pub material: Option<String>,
}

/// Binds a logical element id to the root node of the group it owns.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ElementDesc {
    pub id: String,
    pub node: String,
    pub kind: ElementKind,
}

/// Vertical idle oscillation of the showcased model.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BobDesc {
    pub node: String,
    pub amplitude: f32,
    /// Angular speed in radians per second.
    pub speed: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProjectionDesc {
    pub fov_y_deg: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for ProjectionDesc {
    fn default() -> Self {
        Self {
            fov_y_deg: 75.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Everything a showroom session consumes at start-up.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ShowroomLayout {
    pub nodes: Vec<NodeDesc>,
    #[serde(default)]
    pub lights: Vec<LightData>,
    #[serde(default)]
    pub elements: Vec<ElementDesc>,
    pub views: Vec<ViewDescriptor>,
    #[serde(default)]
    pub toggles: Vec<ToggleDesc>,
    /// View the camera is placed at when the session starts.
    pub initial_view: String,
    /// View flown to right after start-up (the intro fly-in).
    #[serde(default)]
    pub landing_view: Option<String>,
    #[serde(default)]
    pub bob: Option<BobDesc>,
    #[serde(default)]
    pub projection: ProjectionDesc,
}

impl ShowroomLayout {
    /// Check every cross reference by name before anything is built.
    ///
    /// A light switched by a toggle belongs to that toggle alone, so the
    /// toggle's state always matches whether the light is on.
    pub fn validate(&self) -> Result<()> {
        let mut node_names: HashSet<&str> = HashSet::new();
        for node in &self.nodes {
            if let Some(parent) = &node.parent {
                if !node_names.contains(parent.as_str()) {
                    return Err(LayoutError::UnknownParent {
                        node: node.name.clone(),
                        parent: parent.clone(),
                    });
                }
            }
            if !node_names.insert(node.name.as_str()) {
                return Err(LayoutError::DuplicateNode(node.name.clone()));
            }
        }
        let check_node = |owner: &str, node: &str| -> Result<()> {
            if node_names.contains(node) {
                Ok(())
            } else {
                Err(LayoutError::UnknownNode {
                    owner: owner.to_string(),
                    node: node.to_string(),
                })
            }
        };

        let mut light_ids: HashSet<&str> = HashSet::new();
        for light in &self.lights {
            if !light_ids.insert(light.id.as_str()) {
                return Err(LayoutError::DuplicateLight(light.id.clone()));
            }
            if let Some(helper) = &light.helper {
                check_node(&light.id, helper)?;
            }
        }
        let check_light = |owner: &str, light: &str| -> Result<()> {
            if light_ids.contains(light) {
                Ok(())
            } else {
                Err(LayoutError::UnknownLight {
                    owner: owner.to_string(),
                    light: light.to_string(),
                })
            }
        };

        let mut view_names: HashSet<&str> = HashSet::new();
        for view in &self.views {
            if !view_names.insert(view.name.as_str()) {
                return Err(LayoutError::DuplicateView(view.name.clone()));
            }
            if !view.duration_secs.is_finite() || view.duration_secs < 0.0 {
                return Err(LayoutError::InvalidDuration(view.name.clone()));
            }
            for effect in view.on_enter.iter().chain(view.on_exit.iter()) {
                match effect {
                    ViewEffect::EnableLights(lights) | ViewEffect::DisableLights(lights) => {
                        for light in lights {
                            check_light(&view.name, light)?;
                        }
                    }
                    ViewEffect::ShowNodes(nodes) | ViewEffect::HideNodes(nodes) => {
                        for node in nodes {
                            check_node(&view.name, node)?;
                        }
                    }
                }
            }
        }
        if !view_names.contains(self.initial_view.as_str()) {
            return Err(LayoutError::UnknownView(self.initial_view.clone()));
        }
        if let Some(landing) = &self.landing_view {
            if !view_names.contains(landing.as_str()) {
                return Err(LayoutError::UnknownView(landing.clone()));
            }
        }

        let mut element_ids: HashSet<&str> = HashSet::new();
        let mut element_roots: HashMap<&str, &str> = HashMap::new();
        let mut toggle_elements: HashSet<&str> = HashSet::new();
        for element in &self.elements {
            if !element_ids.insert(element.id.as_str()) {
                return Err(LayoutError::DuplicateElement(element.id.clone()));
            }
            if !node_names.contains(element.node.as_str()) {
                return Err(LayoutError::UnknownElementNode {
                    element: element.id.clone(),
                    node: element.node.clone(),
                });
            }
            if let Some(first) = element_roots.insert(element.node.as_str(), element.id.as_str()) {
                return Err(LayoutError::SharedElementNode {
                    node: element.node.clone(),
                    first: first.to_string(),
                    second: element.id.clone(),
                });
            }
            match &element.kind {
                ElementKind::View(target) if !view_names.contains(target.as_str()) => {
                    return Err(LayoutError::UnknownView(target.clone()));
                }
                ElementKind::Toggle => {
                    toggle_elements.insert(element.id.as_str());
                }
                _ => {}
            }
        }

        let mut toggle_ids: HashSet<&str> = HashSet::new();
        let mut toggle_lights: HashMap<&str, &str> = HashMap::new();
        for toggle in &self.toggles {
            if !toggle_ids.insert(toggle.id.as_str()) {
                return Err(LayoutError::DuplicateToggle(toggle.id.clone()));
            }
            if !toggle_elements.contains(toggle.id.as_str()) {
                return Err(LayoutError::ToggleWithoutElement(toggle.id.clone()));
            }
            match &toggle.effect {
                ToggleEffect::Lights { lights } => {
                    for light in lights {
                        check_light(&toggle.id, light)?;
                        if let Some(owner) = toggle_lights.insert(light.as_str(), toggle.id.as_str()) {
                            return Err(LayoutError::LightOwnedByToggle {
                                light: light.clone(),
                                toggle: owner.to_string(),
                                other: toggle.id.clone(),
                            });
                        }
                    }
                }
                ToggleEffect::Material { node, .. } => check_node(&toggle.id, node)?,
            }
            if let Some(knob) = &toggle.knob {
                check_node(&toggle.id, &knob.node)?;
                if !knob.duration_secs.is_finite() || knob.duration_secs < 0.0 {
                    return Err(LayoutError::InvalidDuration(toggle.id.clone()));
                }
            }
        }

        for view in &self.views {
            for effect in view.on_enter.iter().chain(view.on_exit.iter()) {
                let (ViewEffect::EnableLights(lights) | ViewEffect::DisableLights(lights)) = effect
                else {
                    continue;
                };
                for light in lights {
                    if let Some(toggle) = toggle_lights.get(light.as_str()) {
                        return Err(LayoutError::LightOwnedByToggle {
                            light: light.clone(),
                            toggle: toggle.to_string(),
                            other: view.name.clone(),
                        });
                    }
                }
            }
        }

        if let Some(bob) = &self.bob {
            check_node("bob", &bob.node)?;
        }

        Ok(())
    }
}

pub fn save_layout_to_file(layout: &ShowroomLayout, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(layout)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn load_layout_from_file(path: &Path) -> Result<ShowroomLayout> {
    let json = std::fs::read_to_string(path)?;
    let layout: ShowroomLayout = serde_json::from_str(&json)?;
    layout.validate()?;
    Ok(layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::showroom::default_layout;

    #[test]
    fn default_layout_is_valid() {
        default_layout().validate().unwrap();
    }

    #[test]
    fn default_layout_survives_file_roundtrip() {
        let layout = default_layout();
        let mut path = std::env::temp_dir();
        let nonce = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        path.push(format!(
            "showroom_layout_{}_{}.json",
            std::process::id(),
            nonce
        ));

        save_layout_to_file(&layout, &path).unwrap();
        let loaded = load_layout_from_file(&path).unwrap();
        assert_eq!(loaded, layout);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn minimal_json_fills_defaults() {
        let json = r#"{
            "nodes": [{ "name": "root", "shape": { "type": "group" } }],
            "views": [{
                "name": "overview",
                "camera_position": [0.0, 5.0, 25.0],
                "camera_target": [0.0, 0.0, 0.0],
                "duration_secs": 1.5
            }],
            "initial_view": "overview"
        }"#;
        let layout: ShowroomLayout = serde_json::from_str(json).unwrap();
        layout.validate().unwrap();
        assert!(layout.nodes[0].visible);
        assert!(layout.nodes[0].pickable);
        assert!(layout.landing_view.is_none());
        assert_eq!(layout.projection, ProjectionDesc::default());
    }

    #[test]
    fn duplicate_view_is_rejected() {
        let mut layout = default_layout();
        let copy = layout.views[0].clone();
        layout.views.push(copy);
        assert!(matches!(layout.validate(), Err(LayoutError::DuplicateView(_))));
    }

    #[test]
    fn element_pointing_at_missing_view_is_rejected() {
        let mut layout = default_layout();
        layout.elements.push(ElementDesc {
            id: "ghost-button".to_string(),
            node: layout.nodes[0].name.clone(),
            kind: ElementKind::View("nowhere".to_string()),
        });
        assert!(matches!(layout.validate(), Err(LayoutError::UnknownView(name)) if name == "nowhere"));
    }

    #[test]
    fn toggle_needs_matching_element() {
        let mut layout = default_layout();
        layout.elements.retain(|element| element.kind != ElementKind::Toggle);
        assert!(matches!(
            layout.validate(),
            Err(LayoutError::ToggleWithoutElement(_))
        ));
    }

    fn view_mut<'a>(layout: &'a mut ShowroomLayout, name: &str) -> &'a mut ViewDescriptor {
        layout
            .views
            .iter_mut()
            .find(|view| view.name == name)
            .unwrap()
    }

    #[test]
    fn misspelled_toggle_light_is_rejected() {
        let mut layout = default_layout();
        layout.toggles[2].effect = ToggleEffect::Lights {
            lights: vec!["spot-frnt".to_string()],
        };
        assert!(matches!(
            layout.validate(),
            Err(LayoutError::UnknownLight { owner, light }) if owner == "toggle[2]" && light == "spot-frnt"
        ));
    }

    #[test]
    fn material_toggle_on_missing_node_is_rejected() {
        let mut layout = default_layout();
        layout.toggles[3].effect = ToggleEffect::Material {
            node: "capsule".to_string(),
            active: "matte".to_string(),
            inactive: "glass".to_string(),
        };
        assert!(matches!(
            layout.validate(),
            Err(LayoutError::UnknownNode { node, .. }) if node == "capsule"
        ));
    }

    #[test]
    fn view_effect_targets_must_exist() {
        let mut layout = default_layout();
        view_mut(&mut layout, "showcase").on_enter =
            Some(ViewEffect::EnableLights(vec!["disco-ball".to_string()]));
        assert!(matches!(
            layout.validate(),
            Err(LayoutError::UnknownLight { owner, .. }) if owner == "showcase"
        ));

        let mut layout = default_layout();
        view_mut(&mut layout, "controlPanel").on_exit =
            Some(ViewEffect::HideNodes(vec!["back-buton".to_string()]));
        assert!(matches!(
            layout.validate(),
            Err(LayoutError::UnknownNode { owner, .. }) if owner == "controlPanel"
        ));
    }

    #[test]
    fn duplicate_light_is_rejected() {
        let mut layout = default_layout();
        let copy = layout.lights[0].clone();
        layout.lights.push(copy);
        assert!(matches!(layout.validate(), Err(LayoutError::DuplicateLight(_))));
    }

    #[test]
    fn view_cannot_switch_a_toggle_owned_light() {
        let mut layout = default_layout();
        if let Some(ViewEffect::EnableLights(lights)) = &mut view_mut(&mut layout, "overview").on_enter {
            lights.push("spot-front".to_string());
        }
        assert!(matches!(
            layout.validate(),
            Err(LayoutError::LightOwnedByToggle { light, toggle, other })
                if light == "spot-front" && toggle == "toggle[2]" && other == "overview"
        ));
    }

    #[test]
    fn two_toggles_cannot_share_a_light() {
        let mut layout = default_layout();
        layout.toggles[1].effect = ToggleEffect::Lights {
            lights: vec!["point-green-0".to_string()],
        };
        assert!(matches!(
            layout.validate(),
            Err(LayoutError::LightOwnedByToggle { toggle, other, .. })
                if toggle == "toggle[0]" && other == "toggle[1]"
        ));
    }

    #[test]
    fn elements_cannot_share_a_root_node() {
        let mut layout = default_layout();
        layout.elements.push(ElementDesc {
            id: "model-info".to_string(),
            node: "panel-button".to_string(),
            kind: ElementKind::Inert,
        });
        assert!(matches!(
            layout.validate(),
            Err(LayoutError::SharedElementNode { first, second, .. })
                if first == "control-panel-button" && second == "model-info"
        ));
    }

    #[test]
    fn child_before_parent_is_rejected() {
        let mut layout = default_layout();
        layout.nodes.reverse();
        assert!(matches!(
            layout.validate(),
            Err(LayoutError::UnknownParent { .. })
        ));
    }
}
