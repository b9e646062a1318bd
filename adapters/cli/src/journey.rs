//! Runtime glue joining input, movement, and scene progression.

use std::time::Duration;

use anyhow::{Context, Result};
use commute_core::{Event, SceneId};
use commute_rendering::{Color, GridPresentation, KeyboardRouter, MoveKey, Scene};
use commute_system_movement::{GridMovementController, MovementTuning, PoseRecorder};
use commute_system_scene::{SceneCue, SceneDirector, SceneLayout};

const AVATAR_REST_HEIGHT: f32 = 0.5;
const FLOOR_COLOR: Color = Color::from_rgb_u8(36, 38, 46);

/// Everything emitted while advancing a single frame.
#[derive(Debug, Default)]
pub(crate) struct FrameReport {
    pub(crate) events: Vec<Event>,
    pub(crate) cues: Vec<SceneCue>,
}

/// A play session from the starting scene until the final goal.
#[derive(Debug)]
pub(crate) struct Journey {
    controller: GridMovementController,
    director: SceneDirector,
    router: KeyboardRouter,
    complete: bool,
}

impl Journey {
    pub(crate) fn new(tuning: MovementTuning, start: SceneId) -> Result<Self> {
        let mut controller =
            GridMovementController::with_tuning(tuning).context("invalid movement tuning")?;
        controller.bind_avatar(Box::new(PoseRecorder::new(AVATAR_REST_HEIGHT)));

        let mut journey = Self {
            controller,
            director: SceneDirector::new(),
            router: KeyboardRouter::new(),
            complete: false,
        };
        journey.enter(start)?;
        Ok(journey)
    }

    fn enter(&mut self, scene: SceneId) -> Result<()> {
        let layout = SceneLayout::builtin(scene)
            .with_context(|| format!("failed to load built-in scene `{scene}`"))?;
        self.director.load(layout, &mut self.controller);
        Ok(())
    }

    /// Routes fresh key presses to the controller, returning how many moves were queued.
    pub(crate) fn press(&mut self, keys: &[MoveKey]) -> usize {
        self.router.route(keys, &mut self.controller)
    }

    pub(crate) fn release(&mut self, keys: &[MoveKey]) {
        for key in keys {
            self.router.release(*key);
        }
    }

    /// Advances one frame and applies any scene change the script requested.
    pub(crate) fn advance(&mut self, dt: Duration) -> Result<FrameReport> {
        let mut report = FrameReport::default();
        self.controller.update(dt, &mut report.events);
        report.cues = self.director.handle(&report.events);

        for cue in &report.cues {
            match cue {
                SceneCue::AdvanceScene(next) => self.enter(*next)?,
                SceneCue::JourneyComplete => self.complete = true,
                SceneCue::Narration(_) | SceneCue::Memory { .. } => {}
            }
        }
        Ok(report)
    }

    /// Whether the avatar has nothing left to animate or execute.
    pub(crate) fn is_settled(&self) -> bool {
        !self.controller.is_stepping()
            && !self.controller.is_bumping()
            && !self.controller.is_bed_transitioning()
            && self.controller.queue_depth() == 0
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.complete
    }

    pub(crate) fn active_scene(&self) -> Option<SceneId> {
        self.director.active_scene()
    }

    pub(crate) fn controller(&self) -> &GridMovementController {
        &self.controller
    }

    /// Builds the presentation snapshot for the active scene.
    pub(crate) fn snapshot(&self) -> Result<Scene> {
        let layout = self
            .director
            .layout()
            .context("no scene is loaded")?;
        let grid = GridPresentation::new(
            layout.width(),
            layout.depth(),
            self.controller.tuning().cell_size,
            FLOOR_COLOR,
        )
        .context("scene layout cannot be presented")?;

        let mut scene = Scene::new(layout.title(), grid);
        self.refresh(&mut scene);
        Ok(scene)
    }

    /// Updates `scene` in place, rebuilding it when the active scene changed.
    pub(crate) fn present(&self, scene: &mut Scene) -> Result<()> {
        let current = self.director.layout().map(SceneLayout::title);
        if current != Some(scene.title.as_str()) {
            let mut next = self.snapshot()?;
            next.debug_visible = scene.debug_visible;
            next.narration = scene.narration.take();
            *scene = next;
            return Ok(());
        }
        self.refresh(scene);
        Ok(())
    }

    fn refresh(&self, scene: &mut Scene) {
        let map = self.director.collision_map();
        let map = map.borrow();
        scene.refresh(&map, &self.controller);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commute_core::GridPosition;

    const FRAME: Duration = Duration::from_millis(16);

    fn walk(journey: &mut Journey, keys: &[MoveKey]) -> Vec<SceneCue> {
        let mut cues = Vec::new();
        for key in keys {
            assert_eq!(journey.press(&[*key]), 1);
            journey.release(&[*key]);
            for _ in 0..500 {
                let report = journey.advance(FRAME).expect("frame advances");
                cues.extend(report.cues);
                if journey.is_settled() {
                    break;
                }
            }
        }
        cues
    }

    #[test]
    fn leaving_the_apartment_loads_the_street() {
        let mut journey =
            Journey::new(MovementTuning::default(), SceneId::Apartment).expect("journey");

        let cues = walk(&mut journey, &[MoveKey::D; 5]);

        assert!(cues.contains(&SceneCue::AdvanceScene(SceneId::Street)));
        assert_eq!(journey.active_scene(), Some(SceneId::Street));
        assert_eq!(
            journey.controller().logical_position(),
            GridPosition::new(0, 1)
        );
    }

    #[test]
    fn present_rebuilds_scene_after_transition() {
        let mut journey =
            Journey::new(MovementTuning::default(), SceneId::Lobby).expect("journey");
        let mut scene = journey.snapshot().expect("snapshot");
        scene.debug_visible = true;
        assert_eq!(scene.title, "Meridian Tower Lobby");

        let _ = walk(
            &mut journey,
            &[
                MoveKey::W,
                MoveKey::W,
                MoveKey::D,
                MoveKey::D,
                MoveKey::W,
                MoveKey::W,
            ],
        );
        journey.present(&mut scene).expect("present");

        assert_eq!(journey.active_scene(), Some(SceneId::Office));
        assert_eq!(scene.title, "Fourteenth Floor");
        assert_eq!(scene.grid.columns, 8);
        assert!(scene.debug_visible);
    }

    #[test]
    fn office_goal_completes_the_journey() {
        let mut journey =
            Journey::new(MovementTuning::default(), SceneId::Office).expect("journey");

        let _ = walk(
            &mut journey,
            &[
                MoveKey::W,
                MoveKey::W,
                MoveKey::W,
                MoveKey::D,
                MoveKey::D,
                MoveKey::D,
            ],
        );

        assert!(journey.is_complete());
    }
}
