#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Scene lifecycle for the Commute journey.
//!
//! A [`SceneDirector`] owns the collision map shared with the movement
//! controller. Loading a scene rebuilds the map from a [`SceneLayout`], resets
//! the controller, and installs a [`SceneScript`] that turns movement events
//! into [`SceneCue`] values for the presentation layer.

mod layout;
mod script;

use std::rc::Rc;

use commute_core::{Event, SceneId};
use commute_system_movement::GridMovementController;
use commute_world::{CollisionMap, SharedCollisionMap};

pub use self::layout::{ColliderLayout, LayoutError, SceneLayout, TriggerLayout};
pub use self::script::{SceneCue, SceneScript};

/// Loads and unloads scenes against a movement controller.
#[derive(Debug)]
pub struct SceneDirector {
    map: SharedCollisionMap,
    active: Option<ActiveScene>,
}

#[derive(Debug)]
struct ActiveScene {
    layout: SceneLayout,
    script: SceneScript,
}

impl SceneDirector {
    /// Creates a director with an empty collision map and no scene loaded.
    #[must_use]
    pub fn new() -> Self {
        Self {
            map: CollisionMap::shared(),
            active: None,
        }
    }

    /// Handle to the collision map the director maintains.
    #[must_use]
    pub fn collision_map(&self) -> SharedCollisionMap {
        Rc::clone(&self.map)
    }

    /// Replaces the active scene with `layout`.
    ///
    /// The map is rebuilt, the controller loses all per-scene state and is
    /// placed on the spawn cell, and the bed cell is registered if present.
    pub fn load(&mut self, layout: SceneLayout, controller: &mut GridMovementController) {
        if self.active.is_some() {
            let _ = self.unload(controller);
        }

        let mut script = SceneScript::new(&layout);
        {
            let mut map = self.map.borrow_mut();
            map.clear();
            let reports = layout.populate(&mut map);
            for (collider, report) in layout.colliders().iter().zip(&reports) {
                if let Some(text) = collider.memory() {
                    script.add_memory(report.id(), text.to_owned());
                }
            }
            log::info!(
                "loaded scene `{}` ({}) with {} colliders",
                layout.id(),
                layout.title(),
                map.len()
            );
        }

        controller.bind_collision_map(Rc::clone(&self.map));
        controller.reset_for_scene();
        let spawn = layout.spawn();
        controller.set_logical_position(spawn.x(), spawn.z());
        if let Some(bed) = layout.bed() {
            controller.register_bed_cell(bed.x(), bed.z());
        }

        self.active = Some(ActiveScene { layout, script });
    }

    /// Tears down the active scene, returning its identifier.
    pub fn unload(&mut self, controller: &mut GridMovementController) -> Option<SceneId> {
        let active = self.active.take()?;
        controller.reset_for_scene();
        self.map.borrow_mut().clear();
        log::info!("unloaded scene `{}`", active.layout.id());
        Some(active.layout.id())
    }

    /// Runs the active script over `events`. Without a scene no cues are produced.
    pub fn handle(&mut self, events: &[Event]) -> Vec<SceneCue> {
        let mut cues = Vec::new();
        if let Some(active) = self.active.as_mut() {
            active.script.handle(events, &mut cues);
        }
        cues
    }

    /// Identifier of the loaded scene.
    #[must_use]
    pub fn active_scene(&self) -> Option<SceneId> {
        self.active.as_ref().map(|active| active.layout.id())
    }

    /// Layout of the loaded scene.
    #[must_use]
    pub fn layout(&self) -> Option<&SceneLayout> {
        self.active.as_ref().map(|active| &active.layout)
    }

    /// Script of the loaded scene.
    #[must_use]
    pub fn script(&self) -> Option<&SceneScript> {
        self.active.as_ref().map(|active| &active.script)
    }
}

impl Default for SceneDirector {
    fn default() -> Self {
        Self::new()
    }
}
