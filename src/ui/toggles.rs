use crate::app::tween::{Ease, Tween};
use crate::app::InteractionError;
use crate::scene::layout::LayoutError;
use crate::scene::{NodeId, Scene, SceneEffects};
use glam::Vec3;
use std::collections::HashMap;

/// Scene change bound to a toggle, selected by its new state.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToggleEffect {
    /// Lights follow the toggle: on when active, off when inactive.
    Lights { lights: Vec<String> },
    /// Swap a node's material between two named materials.
    Material {
        node: String,
        active: String,
        inactive: String,
    },
}

impl ToggleEffect {
    fn apply(&self, active: bool, scene: &mut impl SceneEffects) {
        match self {
            Self::Lights { lights } => {
                for light in lights {
                    scene.set_light_enabled(light, active);
                }
            }
            Self::Material {
                node,
                active: on,
                inactive: off,
            } => scene.set_material(node, if active { on } else { off }),
        }
    }
}

/// Slider knob that travels between its rest (inactive) position and
/// `rest + travel` (active).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct KnobDesc {
    pub node: String,
    pub travel: Vec3,
    pub duration_secs: f32,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToggleDesc {
    pub id: String,
    pub effect: ToggleEffect,
    #[serde(default)]
    pub knob: Option<KnobDesc>,
    #[serde(default)]
    pub initially_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleState {
    pub id: String,
    pub active: bool,
    /// Number of flips whose side effect has been applied.
    pub applied_index: u64,
}

#[derive(Debug)]
struct Knob {
    node: NodeId,
    rest: Vec3,
    travel: Vec3,
    duration: f32,
    position: Vec3,
    tween: Option<Tween<Vec3>>,
}

impl Knob {
    fn slot(&self, active: bool) -> Vec3 {
        if active {
            self.rest + self.travel
        } else {
            self.rest
        }
    }
}

#[derive(Debug)]
struct ToggleEntry {
    state: ToggleState,
    flips: u64,
    effect: ToggleEffect,
    knob: Option<Knob>,
}

/// Control-panel switches. Each toggle animates independently; there is no
/// shared lock between them or with camera transitions.
#[derive(Debug, Default)]
pub struct ToggleRegistry {
    entries: Vec<ToggleEntry>,
    by_id: HashMap<String, usize>,
}

impl ToggleRegistry {
    /// Build from layout descriptions and bring the scene in line with each
    /// toggle's initial state. The initial sync does not count as a flip.
    pub fn new(descs: &[ToggleDesc], scene: &mut Scene) -> Result<Self, LayoutError> {
        let mut registry = Self::default();
        for desc in descs {
            if registry.by_id.contains_key(&desc.id) {
                return Err(LayoutError::DuplicateToggle(desc.id.clone()));
            }
            let knob = match &desc.knob {
                Some(knob) => {
                    let node = scene.node_id(&knob.node).ok_or_else(|| LayoutError::UnknownNode {
                        owner: desc.id.clone(),
                        node: knob.node.clone(),
                    })?;
                    let rest = scene.node(node).map(|entry| entry.translation).unwrap_or_default();
                    let mut knob = Knob {
                        node,
                        rest,
                        travel: knob.travel,
                        duration: knob.duration_secs,
                        position: rest,
                        tween: None,
                    };
                    knob.position = knob.slot(desc.initially_active);
                    scene.set_node_translation(node, knob.position);
                    Some(knob)
                }
                None => None,
            };
            desc.effect.apply(desc.initially_active, scene);

            registry.by_id.insert(desc.id.clone(), registry.entries.len());
            registry.entries.push(ToggleEntry {
                state: ToggleState {
                    id: desc.id.clone(),
                    active: desc.initially_active,
                    applied_index: 0,
                },
                flips: 0,
                effect: desc.effect.clone(),
                knob,
            });
        }
        Ok(registry)
    }

    /// Flip a toggle, apply exactly the side effect for its new state, and
    /// start the knob moving. Returns the new state.
    pub fn flip(&mut self, id: &str, scene: &mut impl SceneEffects) -> Result<bool, InteractionError> {
        let &index = self
            .by_id
            .get(id)
            .ok_or_else(|| InteractionError::UnknownToggle(id.to_string()))?;
        let entry = &mut self.entries[index];
        debug_assert_eq!(entry.state.applied_index, entry.flips);

        entry.flips += 1;
        entry.state.active = !entry.state.active;
        entry.effect.apply(entry.state.active, scene);
        entry.state.applied_index = entry.flips;

        if let Some(knob) = &mut entry.knob {
            // Retarget from wherever the knob currently is.
            knob.tween = Some(Tween::new(
                knob.position,
                knob.slot(entry.state.active),
                knob.duration,
                Ease::Power1InOut,
            ));
        }

        log::debug!("Toggle '{}' -> {}", id, entry.state.active);
        Ok(entry.state.active)
    }

    /// Advance every moving knob and write its position into the scene.
    pub fn tick(&mut self, dt: f32, scene: &mut impl SceneEffects) {
        for entry in &mut self.entries {
            let Some(knob) = &mut entry.knob else {
                continue;
            };
            let Some(tween) = &mut knob.tween else {
                continue;
            };
            knob.position = tween.advance(dt);
            if tween.is_finished() {
                knob.tween = None;
            }
            scene.set_node_translation(knob.node, knob.position);
        }
    }

    #[cfg(test)]
    pub fn state(&self, id: &str) -> Option<&ToggleState> {
        self.by_id.get(id).map(|&index| &self.entries[index].state)
    }

    #[cfg(test)]
    pub fn is_active(&self, id: &str) -> Option<bool> {
        self.state(id).map(|state| state.active)
    }

    pub fn states(&self) -> impl Iterator<Item = &ToggleState> {
        self.entries.iter().map(|entry| &entry.state)
    }

    #[cfg(test)]
    pub fn animating(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| {
                entry
                    .knob
                    .as_ref()
                    .is_some_and(|knob| knob.tween.is_some())
            })
            .count()
    }

    #[cfg(test)]
    pub fn knob_position(&self, id: &str) -> Option<Vec3> {
        self.by_id
            .get(id)
            .and_then(|&index| self.entries[index].knob.as_ref())
            .map(|knob| knob.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::views::tests::RecordingEffects;
    use crate::scene::{NodeDesc, Shape};

    fn knob_node(name: &str, x: f32) -> NodeDesc {
        NodeDesc {
            name: name.to_string(),
            parent: None,
            shape: Shape::Box {
                half_extents: Vec3::splat(0.1),
            },
            translation: Vec3::new(x, 0.0, 0.0),
            visible: true,
            pickable: true,
            material: None,
        }
    }

    fn light_toggle(id: &str, light: &str, knob: &str) -> ToggleDesc {
        ToggleDesc {
            id: id.to_string(),
            effect: ToggleEffect::Lights {
                lights: vec![light.to_string()],
            },
            knob: Some(KnobDesc {
                node: knob.to_string(),
                travel: Vec3::new(0.4, 0.0, 0.0),
                duration_secs: 0.3,
            }),
            initially_active: false,
        }
    }

    fn fixture() -> (Scene, ToggleRegistry) {
        let mut scene = Scene::new();
        scene.add_node(&knob_node("knob-1", 0.0)).unwrap();
        scene.add_node(&knob_node("knob-2", 1.0)).unwrap();
        let registry = ToggleRegistry::new(
            &[
                light_toggle("toggle[1]", "spot-left", "knob-1"),
                light_toggle("toggle[2]", "spot-front", "knob-2"),
                ToggleDesc {
                    id: "toggle[3]".to_string(),
                    effect: ToggleEffect::Material {
                        node: "capsule".to_string(),
                        active: "matte".to_string(),
                        inactive: "glass".to_string(),
                    },
                    knob: None,
                    initially_active: false,
                },
            ],
            &mut scene,
        )
        .unwrap();
        (scene, registry)
    }

    #[test]
    fn double_click_restores_state_with_one_effect_per_flip() {
        let (_, mut toggles) = fixture();
        let mut effects = RecordingEffects::default();

        assert!(toggles.flip("toggle[2]", &mut effects).unwrap());
        assert!(!toggles.flip("toggle[2]", &mut effects).unwrap());

        assert_eq!(toggles.is_active("toggle[2]"), Some(false));
        assert_eq!(
            effects.lights,
            vec![
                ("spot-front".to_string(), true),
                ("spot-front".to_string(), false)
            ]
        );
        assert_eq!(toggles.state("toggle[2]").unwrap().applied_index, 2);
    }

    #[test]
    fn material_toggle_swaps_between_named_materials() {
        let (_, mut toggles) = fixture();
        let mut effects = RecordingEffects::default();
        toggles.flip("toggle[3]", &mut effects).unwrap();
        toggles.flip("toggle[3]", &mut effects).unwrap();
        assert_eq!(
            effects.materials,
            vec![
                ("capsule".to_string(), "matte".to_string()),
                ("capsule".to_string(), "glass".to_string())
            ]
        );
        assert!(effects.lights.is_empty());
    }

    #[test]
    fn unknown_toggle_changes_nothing() {
        let (_, mut toggles) = fixture();
        let mut effects = RecordingEffects::default();
        assert!(matches!(
            toggles.flip("toggle[9]", &mut effects),
            Err(InteractionError::UnknownToggle(_))
        ));
        assert!(effects.lights.is_empty());
        assert!(toggles.states().all(|state| !state.active && state.applied_index == 0));
    }

    #[test]
    fn knobs_animate_concurrently_and_land_on_their_slots() {
        let (_, mut toggles) = fixture();
        let mut effects = RecordingEffects::default();
        toggles.flip("toggle[1]", &mut effects).unwrap();
        toggles.flip("toggle[2]", &mut effects).unwrap();
        assert_eq!(toggles.animating(), 2);

        toggles.tick(0.1, &mut effects);
        let mid = toggles.knob_position("toggle[1]").unwrap();
        assert!(mid.x > 0.0 && mid.x < 0.4);

        for _ in 0..10 {
            toggles.tick(0.1, &mut effects);
        }
        assert_eq!(toggles.animating(), 0);
        let first = toggles.knob_position("toggle[1]").unwrap();
        let second = toggles.knob_position("toggle[2]").unwrap();
        assert!((first - Vec3::new(0.4, 0.0, 0.0)).length() < 1e-6);
        assert!((second - Vec3::new(1.4, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn flip_mid_animation_retargets_from_current_position() {
        let (_, mut toggles) = fixture();
        let mut effects = RecordingEffects::default();
        toggles.flip("toggle[1]", &mut effects).unwrap();
        toggles.tick(0.15, &mut effects);
        let halfway = toggles.knob_position("toggle[1]").unwrap();
        toggles.flip("toggle[1]", &mut effects).unwrap();
        toggles.tick(0.0, &mut effects);
        assert_eq!(toggles.knob_position("toggle[1]"), Some(halfway));
        for _ in 0..10 {
            toggles.tick(0.1, &mut effects);
        }
        assert_eq!(toggles.knob_position("toggle[1]"), Some(Vec3::ZERO));
    }

    #[test]
    fn initial_state_is_synced_into_scene() {
        let mut scene = Scene::new();
        scene.add_node(&knob_node("knob", 0.0)).unwrap();
        let mut desc = light_toggle("toggle[0]", "hemisphere", "knob");
        desc.initially_active = true;
        let toggles = ToggleRegistry::new(&[desc], &mut scene).unwrap();
        assert_eq!(toggles.is_active("toggle[0]"), Some(true));
        assert_eq!(toggles.state("toggle[0]").unwrap().applied_index, 0);
        assert_eq!(
            scene.node_by_name("knob").unwrap().translation,
            Vec3::new(0.4, 0.0, 0.0)
        );
    }

    #[test]
    fn knob_on_missing_node_fails() {
        let mut scene = Scene::new();
        let result = ToggleRegistry::new(&[light_toggle("toggle[0]", "l", "ghost")], &mut scene);
        assert!(matches!(result, Err(LayoutError::UnknownNode { .. })));
    }
}
