//! Showroom session: owns the scene, camera and every interaction component,
//! and routes pointer input between them.
//!
//! Per tick, in order: camera transition, toggle knobs, user orbit (only when
//! input is enabled), model bob, hover re-evaluation.

use crate::app::views::{ViewController, ViewEvent};
use crate::app::InteractionError;
use crate::render::{Camera, HighlightSet, HoverHighlighter, HoverState, OrbitControls, Picker};
use crate::scene::layout::{BobDesc, ShowroomLayout};
use crate::scene::{ElementKind, LayoutError, NodeId, Scene, SceneEffects, SceneRegistry};
use crate::ui::ToggleRegistry;
use glam::{Vec2, Vec3};

/// What a click did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    ViewRequested(String),
    Toggled { id: String, active: bool },
}

struct ModelBob {
    node: NodeId,
    rest: Vec3,
    amplitude: f32,
    speed: f32,
}

impl ModelBob {
    fn new(desc: &BobDesc, scene: &Scene) -> Option<Self> {
        let node = scene.node_id(&desc.node)?;
        let rest = scene.node(node)?.translation;
        Some(Self {
            node,
            rest,
            amplitude: desc.amplitude,
            speed: desc.speed,
        })
    }

    fn offset(&self, elapsed: f32) -> Vec3 {
        self.rest + Vec3::Y * (self.amplitude * (elapsed * self.speed).sin())
    }
}

pub struct ShowroomSession {
    scene: Scene,
    camera: Camera,
    registry: SceneRegistry,
    views: ViewController,
    toggles: ToggleRegistry,
    hover: HoverHighlighter,
    orbit: OrbitControls,
    bob: Option<ModelBob>,
    pointer: Option<Vec2>,
    elapsed: f32,
    disposed: bool,
}

impl ShowroomSession {
    /// Build every component from a layout. The camera starts at the layout's
    /// initial view, whose `on_enter` runs here, and, if a landing view is
    /// set, immediately flies there.
    pub fn init(layout: &ShowroomLayout, aspect: f32) -> Result<Self, LayoutError> {
        layout.validate()?;
        let mut scene = Scene::from_layout(layout)?;
        let registry = SceneRegistry::build(&scene, &layout.elements)?;
        let toggles = ToggleRegistry::new(&layout.toggles, &mut scene)?;
        let mut views = ViewController::new(layout.views.clone(), &layout.initial_view)?;
        let camera = Camera::new(views.current().pose(), layout.projection, aspect);
        let bob = layout
            .bob
            .as_ref()
            .and_then(|desc| ModelBob::new(desc, &scene));

        views.enter_initial(&mut scene);
        if let Some(landing) = &layout.landing_view {
            if let Err(err) = views.request_view(landing, camera.pose, &mut scene) {
                log::debug!("Landing view not started: {}", err);
            }
        }

        log::info!(
            "Showroom session ready: {} nodes, {} elements, {} toggles, view '{}'",
            scene.len(),
            registry.elements().len(),
            layout.toggles.len(),
            views.current().name
        );

        Ok(Self {
            scene,
            camera,
            registry,
            views,
            toggles,
            hover: HoverHighlighter::new(),
            orbit: OrbitControls::default(),
            bob,
            pointer: None,
            elapsed: 0.0,
            disposed: false,
        })
    }

    pub fn tick(&mut self, dt: f32) {
        if self.disposed {
            return;
        }
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.elapsed += dt;

        if let Some(pose) = self.views.tick(dt, &mut self.scene) {
            self.camera.pose = pose;
        }
        self.toggles.tick(dt, &mut self.scene);

        if self.views.input_enabled() {
            self.orbit.update(&mut self.camera.pose);
        } else {
            self.orbit.halt();
        }

        if let Some(bob) = &self.bob {
            let translation = bob.offset(self.elapsed);
            self.scene.set_node_translation(bob.node, translation);
        }

        // The camera or scene may have moved under a stationary pointer.
        if let Some(ndc) = self.pointer {
            self.hover
                .on_pointer_move(ndc, &self.camera, &self.scene, &self.registry);
        }
    }

    pub fn on_pointer_move(&mut self, ndc: Vec2) -> &HighlightSet {
        if self.disposed {
            return self.hover.highlight();
        }
        self.pointer = Some(ndc);
        self.hover
            .on_pointer_move(ndc, &self.camera, &self.scene, &self.registry)
    }

    pub fn on_pointer_leave(&mut self) {
        self.pointer = None;
        self.hover.clear();
    }

    /// Resolve the nearest element under the pointer and dispatch it.
    pub fn on_click(&mut self, ndc: Vec2) -> Result<ClickOutcome, InteractionError> {
        if self.disposed {
            return Err(InteractionError::SessionDisposed);
        }
        let hits = Picker::pick(ndc, &self.camera, &self.scene);
        if let Some(hit) = hits.first() {
            log::trace!(
                "Click hit '{}' at {:?} ({:.2} away)",
                self.scene.node(hit.node).map_or("?", |node| node.name.as_str()),
                hit.point,
                hit.distance
            );
        }
        let element = self
            .registry
            .resolve_nearest(&hits)
            .cloned()
            .ok_or(InteractionError::UnknownElement)?;

        let outcome = match element.kind {
            ElementKind::View(target) => {
                self.views
                    .request_view(&target, self.camera.pose, &mut self.scene)?;
                self.orbit.halt();
                ClickOutcome::ViewRequested(target)
            }
            ElementKind::Toggle => {
                let active = self.toggles.flip(&element.id, &mut self.scene)?;
                ClickOutcome::Toggled {
                    id: element.id,
                    active,
                }
            }
            ElementKind::Inert => return Err(InteractionError::UnknownElement),
        };
        Ok(outcome)
    }

    /// Pointer drag, in radians. Ignored while a transition owns the camera.
    pub fn on_orbit(&mut self, yaw_delta: f32, pitch_delta: f32) -> bool {
        if self.disposed || !self.views.input_enabled() {
            return false;
        }
        self.orbit.rotate(yaw_delta, pitch_delta);
        true
    }

    pub fn on_zoom(&mut self, delta: f32) -> bool {
        if self.disposed || !self.views.input_enabled() {
            return false;
        }
        self.orbit.zoom(delta);
        true
    }

    pub fn request_view(&mut self, name: &str) -> Result<(), InteractionError> {
        if self.disposed {
            return Err(InteractionError::SessionDisposed);
        }
        self.views
            .request_view(name, self.camera.pose, &mut self.scene)?;
        self.orbit.halt();
        Ok(())
    }

    pub fn resize(&mut self, aspect: f32) {
        self.camera.set_aspect(aspect);
    }

    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.pointer = None;
        self.hover.clear();
        self.orbit.halt();
        log::info!("Showroom session disposed after {:.1}s", self.elapsed);
    }

    #[cfg(test)]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn input_enabled(&self) -> bool {
        self.views.input_enabled()
    }

    pub fn highlight(&self) -> &HighlightSet {
        self.hover.highlight()
    }

    pub fn hover_state(&self) -> &HoverState {
        self.hover.state()
    }

    #[cfg(test)]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    #[cfg(test)]
    pub fn registry(&self) -> &SceneRegistry {
        &self.registry
    }

    pub fn views(&self) -> &ViewController {
        &self.views
    }

    pub fn toggles(&self) -> &ToggleRegistry {
        &self.toggles
    }

    pub fn drain_view_events(&mut self) -> Vec<ViewEvent> {
        self.views.drain_events()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::showroom::default_layout;

    const DT: f32 = 1.0 / 60.0;

    fn settle(session: &mut ShowroomSession) {
        for _ in 0..600 {
            if !session.views().is_transitioning() {
                return;
            }
            session.tick(DT);
        }
        panic!("transition never settled");
    }

    /// NDC of a node's world position as seen by the session camera.
    fn ndc_of(session: &ShowroomSession, node: &str) -> Vec2 {
        let scene = session.scene();
        let id = scene.node_id(node).unwrap();
        let world = scene.world_translation(id);
        let camera = session.camera();
        let clip = camera.projection_matrix() * camera.view_matrix();
        clip.project_point3(world).truncate()
    }

    fn ready_session() -> ShowroomSession {
        let mut session = ShowroomSession::init(&default_layout(), 16.0 / 9.0).unwrap();
        settle(&mut session);
        session
    }

    #[test]
    fn intro_lands_on_overview_and_enables_main_lights() {
        let mut session = ShowroomSession::init(&default_layout(), 16.0 / 9.0).unwrap();
        assert_eq!(session.views().current().name, "intro");
        assert_eq!(session.views().pending().unwrap().name, "overview");
        assert!(!session.input_enabled());
        assert!(session.scene().light("hemisphere").map_or(false, |l| !l.enabled));

        settle(&mut session);
        assert_eq!(session.views().current().name, "overview");
        assert!(session.input_enabled());
        assert!(session.scene().light("hemisphere").unwrap().enabled);
        assert!(session.scene().light("spot-left").unwrap().enabled);
    }

    #[test]
    fn clicking_control_panel_button_flies_to_panel() {
        let mut session = ready_session();
        let ndc = ndc_of(&session, "panel-button-cap");
        assert_eq!(
            session.on_click(ndc).unwrap(),
            ClickOutcome::ViewRequested("controlPanel".to_string())
        );
        assert!(!session.input_enabled());
        assert_eq!(session.views().current().name, "overview");
        assert_eq!(session.views().pending().unwrap().name, "controlPanel");

        let duration = session.views().pending().unwrap().duration_secs;
        let mut elapsed = 0.0;
        while elapsed + DT < duration {
            session.tick(DT);
            elapsed += DT;
            assert!(!session.on_orbit(0.1, 0.0));
        }
        settle(&mut session);
        assert_eq!(session.views().current().name, "controlPanel");
        assert!(session.input_enabled());
        assert!(session.views().pending().is_none());
        assert_eq!(session.camera().pose, session.views().current().pose());
    }

    #[test]
    fn second_request_mid_flight_is_dropped() {
        let mut session = ready_session();
        session.request_view("controlPanel").unwrap();
        session.tick(0.3);
        let pose = session.camera().pose;
        assert!(matches!(
            session.request_view("overview"),
            Err(InteractionError::RejectedTransition { .. })
        ));
        assert_eq!(session.views().pending().unwrap().name, "controlPanel");
        assert_eq!(session.camera().pose, pose);
    }

    #[test]
    fn toggle_two_clicks_switches_light_on_then_off() {
        let mut session = ready_session();
        session.request_view("controlPanel").unwrap();
        settle(&mut session);

        let ndc = ndc_of(&session, "toggle-2-base");
        assert_eq!(
            session.on_click(ndc).unwrap(),
            ClickOutcome::Toggled {
                id: "toggle[2]".to_string(),
                active: true
            }
        );
        assert!(session.scene().light("spot-front").unwrap().enabled);
        // Toggle knobs do not gate camera input.
        assert!(session.input_enabled());

        let ndc = ndc_of(&session, "toggle-2-base");
        session.on_click(ndc).unwrap();
        let state = session.toggles().state("toggle[2]").unwrap();
        assert!(!state.active);
        assert_eq!(state.applied_index, 2);
        assert!(!session.scene().light("spot-front").unwrap().enabled);
    }

    #[test]
    fn back_button_returns_to_overview() {
        let mut session = ready_session();
        assert!(!session.scene().node_by_name("back-button").unwrap().visible);
        session.request_view("controlPanel").unwrap();
        settle(&mut session);
        assert!(session.scene().node_by_name("back-button").unwrap().visible);

        let ndc = ndc_of(&session, "back-button-cap");
        assert_eq!(
            session.on_click(ndc).unwrap(),
            ClickOutcome::ViewRequested("overview".to_string())
        );
        assert!(!session.scene().node_by_name("back-button").unwrap().visible);
        settle(&mut session);
        assert_eq!(session.views().current().name, "overview");
    }

    #[test]
    fn starting_in_panel_view_shows_back_button() {
        let mut layout = default_layout();
        layout.initial_view = "controlPanel".to_string();
        layout.landing_view = None;
        let mut session = ShowroomSession::init(&layout, 16.0 / 9.0).unwrap();
        assert_eq!(session.views().current().name, "controlPanel");
        assert!(session.input_enabled());
        assert!(session.scene().node_by_name("back-button").unwrap().visible);

        let ndc = ndc_of(&session, "back-button-cap");
        assert_eq!(
            session.on_click(ndc).unwrap(),
            ClickOutcome::ViewRequested("overview".to_string())
        );
    }

    #[test]
    fn hover_over_empty_space_is_empty() {
        let mut session = ready_session();
        // Near the top edge the overview camera only sees the back wall.
        let set = session.on_pointer_move(Vec2::new(0.0, 0.99)).clone();
        assert!(set.is_empty());
        assert_eq!(session.hover_state().hovered_id, None);
        assert!(matches!(
            session.on_click(Vec2::new(0.0, 0.99)),
            Err(InteractionError::UnknownElement)
        ));
    }

    #[test]
    fn hover_follows_camera_under_still_pointer() {
        let mut session = ready_session();
        let ndc = ndc_of(&session, "panel-button-cap");
        session.on_pointer_move(ndc);
        assert_eq!(
            session.hover_state().hovered_id.as_deref(),
            Some("control-panel-button")
        );
        assert!(!session.highlight().is_empty());

        session.request_view("controlPanel").unwrap();
        settle(&mut session);
        assert_ne!(
            session.hover_state().hovered_id.as_deref(),
            Some("control-panel-button")
        );
    }

    #[test]
    fn stalled_frame_still_finishes_transition_on_time() {
        let mut session = ready_session();
        session.request_view("controlPanel").unwrap();
        let duration = session.views().pending().unwrap().duration_secs;
        session.tick(duration + 0.5);
        assert_eq!(session.views().current().name, "controlPanel");
        assert!(session.input_enabled());
        assert_eq!(session.camera().pose, session.views().current().pose());
    }

    #[test]
    fn orbit_moves_camera_only_when_enabled() {
        let mut session = ready_session();
        let before = session.camera().pose;
        assert!(session.on_orbit(0.2, 0.0));
        session.tick(DT);
        assert_ne!(session.camera().pose, before);
        assert_eq!(session.camera().pose.target, before.target);
    }

    #[test]
    fn showcase_model_bobs_over_time() {
        let mut session = ready_session();
        let id = session.scene().node_id("showcase-model").unwrap();
        let mut heights = Vec::new();
        for _ in 0..120 {
            session.tick(DT);
            heights.push(session.scene().node(id).unwrap().translation.y);
        }
        let min = heights.iter().copied().fold(f32::MAX, f32::min);
        let max = heights.iter().copied().fold(f32::MIN, f32::max);
        assert!(max - min > 0.1);
        assert!(max - min <= 0.5 + 1e-4);
    }

    #[test]
    fn disposed_session_ignores_input() {
        let mut session = ready_session();
        session.dispose();
        assert!(session.is_disposed());
        assert!(matches!(
            session.on_click(Vec2::ZERO),
            Err(InteractionError::SessionDisposed)
        ));
        assert!(!session.on_orbit(0.1, 0.1));
        let pose = session.camera().pose;
        session.tick(1.0);
        assert_eq!(session.camera().pose, pose);
    }
}
