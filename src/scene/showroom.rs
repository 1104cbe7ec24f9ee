//! Built-in showroom: a closed room, a showcase stand with the model on top,
//! a wall-side control panel with four switches, and the room lighting.

use crate::app::tween::Ease;
use crate::app::views::{ViewDescriptor, ViewEffect};
use crate::scene::layout::{BobDesc, ElementDesc, NodeDesc, ProjectionDesc, ShowroomLayout};
use crate::scene::{ElementKind, LightData, LightKind, Shape};
use crate::ui::{KnobDesc, ToggleDesc, ToggleEffect};
use glam::Vec3;

/// Floor height shared by the room and the showcase.
const FLOOR_Y: f32 = -12.1;
const ROOM_SIZE: f32 = 250.0;
const PANEL_ORIGIN: Vec3 = Vec3::new(14.0, 0.0, 5.0);
const TOGGLE_COUNT: usize = 4;

const MAIN_LIGHTS: [&str; 4] = ["hemisphere", "spot-left", "spot-right", "spot-right-down"];

fn group(name: &str, parent: Option<&str>, translation: Vec3) -> NodeDesc {
    NodeDesc {
        name: name.to_string(),
        parent: parent.map(str::to_string),
        shape: Shape::Group,
        translation,
        visible: true,
        pickable: true,
        material: None,
    }
}

fn cuboid(name: &str, parent: &str, translation: Vec3, half_extents: Vec3, material: &str) -> NodeDesc {
    NodeDesc {
        name: name.to_string(),
        parent: Some(parent.to_string()),
        shape: Shape::Box { half_extents },
        translation,
        visible: true,
        pickable: true,
        material: Some(material.to_string()),
    }
}

fn helper(name: &str, position: Vec3, visible: bool) -> NodeDesc {
    NodeDesc {
        name: name.to_string(),
        parent: None,
        shape: Shape::Sphere { radius: 0.5 },
        translation: position,
        visible,
        pickable: false,
        material: None,
    }
}

fn light(id: &str, kind: LightKind, color: [f32; 3], intensity: f32, position: Vec3) -> LightData {
    LightData {
        id: id.to_string(),
        kind,
        color,
        intensity,
        position,
        enabled: false,
        helper: Some(format!("{id}-helper")),
    }
}

fn view(name: &str, position: Vec3, target: Vec3, duration_secs: f32) -> ViewDescriptor {
    ViewDescriptor {
        name: name.to_string(),
        camera_position: position,
        camera_target: target,
        duration_secs,
        ease: Ease::Power1InOut,
        on_enter: None,
        on_exit: None,
    }
}

fn room_nodes(nodes: &mut Vec<NodeDesc>) {
    let half = ROOM_SIZE / 2.0;
    let thin = 0.05;
    nodes.push(group("room", None, Vec3::new(0.0, FLOOR_Y, 0.0)));
    let panels = [
        ("floor", Vec3::ZERO, Vec3::new(half, thin, half), "floor"),
        ("wall-behind", Vec3::new(0.0, half, -half), Vec3::new(half, half, thin), "wall"),
        ("wall-front", Vec3::new(0.0, half, half), Vec3::new(half, half, thin), "wall"),
        ("wall-left", Vec3::new(-half, half, 0.0), Vec3::new(thin, half, half), "wall"),
        ("wall-right", Vec3::new(half, half, 0.0), Vec3::new(thin, half, half), "wall"),
        ("ceiling", Vec3::new(0.0, ROOM_SIZE, 0.0), Vec3::new(half, thin, half), "wall"),
    ];
    for (name, translation, half_extents, material) in panels {
        nodes.push(cuboid(name, "room", translation, half_extents, material));
    }
}

fn showcase_nodes(nodes: &mut Vec<NodeDesc>) {
    let box_height = 0.3;
    let column_height = 7.0;
    let capsule_radius = 3.0;
    let capsule_length = 5.0;
    let cap_segment = 2.1;

    nodes.push(group("showcase", None, Vec3::new(0.0, FLOOR_Y, 0.0)));
    nodes.push(cuboid(
        "stand-base",
        "showcase",
        Vec3::new(0.0, box_height / 2.0, 0.0),
        Vec3::new(2.5, box_height / 2.0, 2.5),
        "marble",
    ));
    nodes.push(cuboid(
        "stand-column",
        "showcase",
        Vec3::new(0.0, box_height + column_height / 2.0, 0.0),
        Vec3::new(2.0, column_height / 2.0, 2.0),
        "marble",
    ));
    nodes.push(cuboid(
        "showcase-model",
        "showcase",
        Vec3::new(
            0.0,
            column_height + capsule_length / 2.0 + cap_segment + box_height,
            0.0,
        ),
        Vec3::new(capsule_radius, capsule_radius + capsule_length / 2.0, capsule_radius),
        "glass",
    ));
}

fn control_panel_nodes(nodes: &mut Vec<NodeDesc>) {
    // Pedestal button in front of the showcase that opens the panel view.
    nodes.push(group("panel-button", None, Vec3::new(8.0, -9.0, 10.0)));
    nodes.push(cuboid(
        "panel-button-cap",
        "panel-button",
        Vec3::ZERO,
        Vec3::splat(0.8),
        "button",
    ));

    nodes.push(group("control-panel", None, PANEL_ORIGIN));
    nodes.push(cuboid(
        "panel-board",
        "control-panel",
        Vec3::ZERO,
        Vec3::new(3.0, 2.0, 0.1),
        "panel",
    ));

    let mut back = group("back-button", Some("control-panel"), Vec3::new(0.0, 1.3, 0.2));
    back.visible = false;
    nodes.push(back);
    nodes.push(cuboid(
        "back-button-cap",
        "back-button",
        Vec3::ZERO,
        Vec3::new(0.6, 0.3, 0.1),
        "button",
    ));

    for index in 0..TOGGLE_COUNT {
        let name = format!("toggle-{index}");
        let x = -1.95 + 1.3 * index as f32;
        nodes.push(group(&name, Some("control-panel"), Vec3::new(x, -0.5, 0.2)));
        nodes.push(cuboid(
            &format!("{name}-base"),
            &name,
            Vec3::ZERO,
            Vec3::new(0.5, 0.2, 0.1),
            "switch-base",
        ));
        nodes.push(cuboid(
            &format!("{name}-knob"),
            &name,
            Vec3::new(-0.25, 0.0, 0.15),
            Vec3::new(0.15, 0.25, 0.15),
            "switch-knob",
        ));
    }
}

fn lights() -> Vec<LightData> {
    let mut lights = vec![
        light("hemisphere", LightKind::Hemisphere, [0.77, 0.77, 0.77], 0.25, Vec3::new(0.0, 50.0, 0.0)),
        light("spot-left", LightKind::Spot, [1.0, 1.0, 1.0], 1.0, Vec3::new(-25.0, 5.0, -10.0)),
        light("spot-right", LightKind::Spot, [1.0, 1.0, 1.0], 1.0, Vec3::new(25.0, 5.0, -10.0)),
        light("spot-right-down", LightKind::Spot, [1.0, 1.0, 1.0], 0.5, Vec3::new(0.0, 100.0, 0.0)),
        light("spot-front", LightKind::Spot, [1.0, 1.0, 1.0], 1.0, Vec3::new(0.0, 25.0, -50.0)),
    ];
    // Fixed scatter so every run lights the room the same way.
    let scatter = [
        ("point-green-0", [0.0, 1.0, 0.0], Vec3::new(-18.0, 2.0, 12.0)),
        ("point-green-1", [0.0, 1.0, 0.0], Vec3::new(20.0, 4.0, -16.0)),
        ("point-red-0", [1.0, 0.0, 0.0], Vec3::new(-22.0, 7.0, -8.0)),
        ("point-red-1", [1.0, 0.0, 0.0], Vec3::new(16.0, 3.0, 21.0)),
    ];
    for (id, color, position) in scatter {
        lights.push(light(id, LightKind::Point, color, 0.5, position));
    }
    lights
}

fn elements() -> Vec<ElementDesc> {
    let mut elements = vec![
        ElementDesc {
            id: "control-panel-button".to_string(),
            node: "panel-button".to_string(),
            kind: ElementKind::View("controlPanel".to_string()),
        },
        ElementDesc {
            id: "back-button".to_string(),
            node: "back-button".to_string(),
            kind: ElementKind::View("overview".to_string()),
        },
        ElementDesc {
            id: "showcase-model".to_string(),
            node: "showcase-model".to_string(),
            kind: ElementKind::View("showcase".to_string()),
        },
        ElementDesc {
            id: "control-panel".to_string(),
            node: "control-panel".to_string(),
            kind: ElementKind::Inert,
        },
    ];
    for index in 0..TOGGLE_COUNT {
        elements.push(ElementDesc {
            id: format!("toggle[{index}]"),
            node: format!("toggle-{index}"),
            kind: ElementKind::Toggle,
        });
    }
    elements
}

fn views() -> Vec<ViewDescriptor> {
    let mut overview = view("overview", Vec3::new(0.0, 5.0, 25.0), Vec3::ZERO, 2.0);
    overview.on_enter = Some(ViewEffect::EnableLights(
        MAIN_LIGHTS.iter().map(|id| id.to_string()).collect(),
    ));

    let mut control_panel = view(
        "controlPanel",
        PANEL_ORIGIN + Vec3::new(0.0, 0.0, 7.0),
        PANEL_ORIGIN,
        1.5,
    );
    control_panel.on_enter = Some(ViewEffect::ShowNodes(vec!["back-button".to_string()]));
    control_panel.on_exit = Some(ViewEffect::HideNodes(vec!["back-button".to_string()]));

    vec![
        view("intro", Vec3::new(-25.0, 25.0, 25.0), Vec3::ZERO, 0.0),
        overview,
        control_panel,
        view("showcase", Vec3::new(0.0, 2.0, 12.0), Vec3::ZERO, 1.5),
    ]
}

fn toggles() -> Vec<ToggleDesc> {
    let knob = |index: usize| {
        Some(KnobDesc {
            node: format!("toggle-{index}-knob"),
            travel: Vec3::new(0.5, 0.0, 0.0),
            duration_secs: 0.3,
        })
    };
    let lights = |ids: &[&str]| ToggleEffect::Lights {
        lights: ids.iter().map(|id| id.to_string()).collect(),
    };
    vec![
        ToggleDesc {
            id: "toggle[0]".to_string(),
            effect: lights(&["point-green-0", "point-green-1"]),
            knob: knob(0),
            initially_active: false,
        },
        ToggleDesc {
            id: "toggle[1]".to_string(),
            effect: lights(&["point-red-0", "point-red-1"]),
            knob: knob(1),
            initially_active: false,
        },
        ToggleDesc {
            id: "toggle[2]".to_string(),
            effect: lights(&["spot-front"]),
            knob: knob(2),
            initially_active: false,
        },
        ToggleDesc {
            id: "toggle[3]".to_string(),
            effect: ToggleEffect::Material {
                node: "showcase-model".to_string(),
                active: "matte".to_string(),
                inactive: "glass".to_string(),
            },
            knob: knob(3),
            initially_active: false,
        },
    ]
}

pub fn default_layout() -> ShowroomLayout {
    let lights = lights();
    let mut nodes = Vec::new();
    room_nodes(&mut nodes);
    showcase_nodes(&mut nodes);
    control_panel_nodes(&mut nodes);
    for light in &lights {
        if let Some(name) = &light.helper {
            nodes.push(helper(name, light.position, light.enabled));
        }
    }

    ShowroomLayout {
        nodes,
        lights,
        elements: elements(),
        views: views(),
        toggles: toggles(),
        initial_view: "intro".to_string(),
        landing_view: Some("overview".to_string()),
        bob: Some(BobDesc {
            node: "showcase-model".to_string(),
            amplitude: 0.25,
            speed: 2.0,
        }),
        projection: ProjectionDesc::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Scene, SceneRegistry};

    #[test]
    fn every_toggle_has_a_knob_inside_its_group() {
        let layout = default_layout();
        let scene = Scene::from_layout(&layout).unwrap();
        let registry = SceneRegistry::build(&scene, &layout.elements).unwrap();
        for toggle in &layout.toggles {
            let knob = toggle.knob.as_ref().unwrap();
            let id = scene.node_id(&knob.node).unwrap();
            assert_eq!(registry.resolve(id).unwrap().id, toggle.id);
        }
    }

    #[test]
    fn light_helpers_are_never_pickable() {
        let layout = default_layout();
        let scene = Scene::from_layout(&layout).unwrap();
        for light in scene.lights() {
            let helper = scene.node_by_name(light.helper.as_deref().unwrap()).unwrap();
            assert!(!helper.pickable);
        }
    }

    #[test]
    fn main_lights_start_off() {
        let layout = default_layout();
        let scene = Scene::from_layout(&layout).unwrap();
        assert!(scene.enabled_lights().is_empty());
        assert!(MAIN_LIGHTS.iter().all(|id| scene.light(id).is_some()));
    }
}
