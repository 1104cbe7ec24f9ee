//! Camera view state machine.
//!
//! The controller is either settled on one named view, or transitioning
//! towards another (`pending`). While a transition is in flight every new
//! request is dropped rather than queued or allowed to interrupt, and user
//! camera input stays disabled until the transition settles.

use crate::app::tween::{Ease, Tween};
use crate::app::{InteractionError, RejectReason};
use crate::render::CameraPose;
use crate::scene::layout::LayoutError;
use crate::scene::SceneEffects;
use glam::Vec3;
use std::collections::HashMap;

/// Scene writes run when a view is entered or left.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", content = "targets", rename_all = "snake_case")]
pub enum ViewEffect {
    EnableLights(Vec<String>),
    DisableLights(Vec<String>),
    ShowNodes(Vec<String>),
    HideNodes(Vec<String>),
}

impl ViewEffect {
    pub fn apply(&self, scene: &mut impl SceneEffects) {
        match self {
            Self::EnableLights(lights) => {
                for light in lights {
                    scene.set_light_enabled(light, true);
                }
            }
            Self::DisableLights(lights) => {
                for light in lights {
                    scene.set_light_enabled(light, false);
                }
            }
            Self::ShowNodes(nodes) => {
                for node in nodes {
                    scene.set_visible(node, true);
                }
            }
            Self::HideNodes(nodes) => {
                for node in nodes {
                    scene.set_visible(node, false);
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ViewDescriptor {
    pub name: String,
    pub camera_position: Vec3,
    pub camera_target: Vec3,
    /// Duration of the transition *into* this view.
    pub duration_secs: f32,
    #[serde(default)]
    pub ease: Ease,
    #[serde(default)]
    pub on_enter: Option<ViewEffect>,
    #[serde(default)]
    pub on_exit: Option<ViewEffect>,
}

impl ViewDescriptor {
    pub fn pose(&self) -> CameraPose {
        CameraPose::new(self.camera_position, self.camera_target)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    Started { from: String, to: String },
    Settled { view: String },
}

#[derive(Debug)]
struct Transition {
    target: usize,
    tween: Tween<CameraPose>,
}

pub struct ViewController {
    views: Vec<ViewDescriptor>,
    by_name: HashMap<String, usize>,
    current: usize,
    pending: Option<Transition>,
    input_enabled: bool,
    events: Vec<ViewEvent>,
}

impl ViewController {
    pub fn new(views: Vec<ViewDescriptor>, initial: &str) -> Result<Self, LayoutError> {
        let mut by_name = HashMap::new();
        for (index, view) in views.iter().enumerate() {
            if by_name.insert(view.name.clone(), index).is_some() {
                return Err(LayoutError::DuplicateView(view.name.clone()));
            }
        }
        let current = *by_name
            .get(initial)
            .ok_or_else(|| LayoutError::UnknownView(initial.to_string()))?;
        Ok(Self {
            views,
            by_name,
            current,
            pending: None,
            input_enabled: true,
            events: Vec::new(),
        })
    }

    pub fn current(&self) -> &ViewDescriptor {
        &self.views[self.current]
    }

    pub fn pending(&self) -> Option<&ViewDescriptor> {
        self.pending
            .as_ref()
            .map(|transition| &self.views[transition.target])
    }

    #[cfg(test)]
    pub fn is_transitioning(&self) -> bool {
        self.pending.is_some()
    }

    pub fn input_enabled(&self) -> bool {
        self.input_enabled
    }

    #[cfg(test)]
    pub fn view(&self, name: &str) -> Option<&ViewDescriptor> {
        self.by_name.get(name).map(|&index| &self.views[index])
    }

    /// Progress of the running transition in [0, 1].
    pub fn progress(&self) -> Option<f32> {
        self.pending
            .as_ref()
            .map(|transition| transition.tween.progress())
    }

    /// Run the starting view's `on_enter` once, as if the session had flown
    /// into it. Call before any transition is requested.
    pub fn enter_initial(&self, scene: &mut impl SceneEffects) {
        if self.pending.is_some() {
            return;
        }
        if let Some(effect) = &self.views[self.current].on_enter {
            effect.apply(scene);
        }
    }

    /// Start animating from `from` (the live camera pose) to `target`.
    ///
    /// Dropped if a transition is already running or `target` is the current
    /// view. On acceptance the current view's `on_exit` runs immediately and
    /// input is disabled until the transition settles.
    pub fn request_view(
        &mut self,
        target: &str,
        from: CameraPose,
        scene: &mut impl SceneEffects,
    ) -> Result<(), InteractionError> {
        let &index = self
            .by_name
            .get(target)
            .ok_or_else(|| InteractionError::UnknownView(target.to_string()))?;
        if let Some(pending) = self.pending() {
            return Err(InteractionError::RejectedTransition {
                requested: target.to_string(),
                reason: RejectReason::InFlight {
                    pending: pending.name.clone(),
                },
            });
        }
        if index == self.current {
            return Err(InteractionError::RejectedTransition {
                requested: target.to_string(),
                reason: RejectReason::AlreadyCurrent,
            });
        }

        if let Some(effect) = &self.views[self.current].on_exit {
            effect.apply(scene);
        }
        let to = &self.views[index];
        self.pending = Some(Transition {
            target: index,
            tween: Tween::new(from, to.pose(), to.duration_secs, to.ease),
        });
        self.input_enabled = false;
        self.events.push(ViewEvent::Started {
            from: self.views[self.current].name.clone(),
            to: to.name.clone(),
        });
        log::debug!(
            "View transition {} -> {} ({:.2}s)",
            self.views[self.current].name,
            to.name,
            to.duration_secs
        );
        Ok(())
    }

    /// Advance the running transition by `dt` seconds. Returns the camera
    /// pose to write this frame, or `None` when settled.
    pub fn tick(&mut self, dt: f32, scene: &mut impl SceneEffects) -> Option<CameraPose> {
        let transition = self.pending.as_mut()?;
        let pose = transition.tween.advance(dt);
        if transition.tween.is_finished() {
            self.settle(scene);
        }
        Some(pose)
    }

    fn settle(&mut self, scene: &mut impl SceneEffects) {
        let Some(transition) = self.pending.take() else {
            return;
        };
        let view = &self.views[transition.target];
        if let Some(effect) = &view.on_enter {
            effect.apply(scene);
        }
        self.current = transition.target;
        self.input_enabled = true;
        self.events.push(ViewEvent::Settled {
            view: view.name.clone(),
        });
        log::info!("Settled on view '{}'", view.name);
    }

    pub fn drain_events(&mut self) -> Vec<ViewEvent> {
        std::mem::take(&mut self.events)
    }
}
