#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic grid movement controller for the Commute avatar.
//!
//! The controller owns two representations of the avatar's location. The
//! *logical* grid position changes the instant a move is validated, so game
//! logic querying mid-step already sees the destination. The *visual*
//! position lags behind through interpolation and is meant for rendering and
//! camera framing only.
//!
//! Each call to [`GridMovementController::update`] runs exactly one branch of
//! the state machine, in priority order: bed transition, bump, step, idle.

mod animation;
mod avatar;
mod hooks;
mod queue;
mod tuning;

use std::{collections::BTreeMap, fmt, time::Duration};

use commute_core::{Direction, Event, GridPosition};
use commute_world::{Collider, SharedCollisionMap};
use glam::Vec3;

use self::animation::{BedTransition, BumpAnimation, StepAnimation};
use self::hooks::BedHook;
use self::queue::MovementQueue;

pub use self::animation::{rotate_towards, smooth_step, wrap_angle};
pub use self::avatar::{AvatarPose, AvatarRig, PoseRecorder};
pub use self::hooks::{CellHook, CellReaction, TagHook};
pub use self::tuning::{MovementTuning, TuningError};

type InteractableCallback = Box<dyn FnMut(&Collider)>;

/// Authoritative avatar position and motion state machine.
pub struct GridMovementController {
    tuning: MovementTuning,
    logical: GridPosition,
    rest: Vec3,
    hop: f32,
    lunge: Vec3,
    yaw: f32,
    target_yaw: f32,
    queue: MovementQueue,
    step: Option<StepAnimation>,
    bump: Option<BumpAnimation>,
    bed: BedTransition,
    bed_cell: Option<GridPosition>,
    cell_hooks: BTreeMap<GridPosition, Box<dyn CellHook>>,
    avatar: Option<Box<dyn AvatarRig>>,
    collision_map: Option<SharedCollisionMap>,
    interactable_callback: Option<InteractableCallback>,
    pending_events: Vec<Event>,
    warned_missing_map: bool,
}

impl GridMovementController {
    /// Creates a controller using the default tuning, standing at the origin.
    #[must_use]
    pub fn new() -> Self {
        Self::build(MovementTuning::default())
    }

    /// Creates a controller with validated tuning.
    pub fn with_tuning(tuning: MovementTuning) -> Result<Self, TuningError> {
        tuning.validate()?;
        Ok(Self::build(tuning))
    }

    fn build(tuning: MovementTuning) -> Self {
        let facing = Direction::Backward.facing_angle();
        Self {
            queue: MovementQueue::with_capacity(tuning.queue_capacity),
            tuning,
            logical: GridPosition::default(),
            rest: Vec3::ZERO,
            hop: 0.0,
            lunge: Vec3::ZERO,
            yaw: facing,
            target_yaw: facing,
            step: None,
            bump: None,
            bed: BedTransition::default(),
            bed_cell: None,
            cell_hooks: BTreeMap::new(),
            avatar: None,
            collision_map: None,
            interactable_callback: None,
            pending_events: Vec::new(),
            warned_missing_map: false,
        }
    }

    /// Associates the avatar handle and snaps its visual position to the
    /// current logical position.
    pub fn bind_avatar(&mut self, avatar: Box<dyn AvatarRig>) {
        self.avatar = Some(avatar);
        self.rest = self.cell_to_world(self.logical);
        self.apply_pose();
    }

    /// Associates the collision map used to validate moves.
    ///
    /// Without a map every destination is walkable; a warning is logged the
    /// first time a move is validated in that state.
    pub fn bind_collision_map(&mut self, map: SharedCollisionMap) {
        self.collision_map = Some(map);
        self.warned_missing_map = false;
    }

    /// Installs the callback invoked when an interactable collider blocks a move.
    pub fn on_interactable_blocked<F>(&mut self, callback: F)
    where
        F: FnMut(&Collider) + 'static,
    {
        self.interactable_callback = Some(Box::new(callback));
    }

    /// Registers the bed cell for the current scene, replacing any previous one.
    pub fn register_bed_cell(&mut self, x: i32, z: i32) {
        self.clear_bed_cell();
        let cell = GridPosition::new(x, z);
        self.register_cell_hook(cell, Box::new(BedHook));
        self.bed_cell = Some(cell);
    }

    /// Removes the bed cell and returns the avatar to a standing posture.
    pub fn clear_bed_cell(&mut self) {
        if let Some(cell) = self.bed_cell {
            let _ = self.clear_cell_hook(cell);
        }
        if self.bed.set_target(false) {
            self.pending_events
                .push(Event::BedStateChanged { in_bed: false });
        }
        self.bed = BedTransition::default();
    }

    /// Attaches a hook consulted whenever a step onto `cell` completes.
    ///
    /// Replacing the hook on the bed cell unregisters the bed.
    pub fn register_cell_hook(&mut self, cell: GridPosition, hook: Box<dyn CellHook>) {
        if self.bed_cell == Some(cell) {
            self.bed_cell = None;
        }
        if let Some(previous) = self.cell_hooks.insert(cell, hook) {
            log::debug!("replaced cell hook {previous:?} at {cell}");
        }
    }

    /// Detaches the hook attached to `cell`, if any.
    pub fn clear_cell_hook(&mut self, cell: GridPosition) -> Option<Box<dyn CellHook>> {
        if self.bed_cell == Some(cell) {
            self.bed_cell = None;
        }
        self.cell_hooks.remove(&cell)
    }

    /// Forces the bed-transition target without moving the grid position.
    pub fn set_in_bed(&mut self, in_bed: bool) {
        if self.bed.set_target(in_bed) {
            self.pending_events.push(Event::BedStateChanged { in_bed });
        }
    }

    /// Queues a directional move.
    ///
    /// Returns `false` without side effects when the queue is full or a bump
    /// is playing. While in bed with an empty queue the accepted move also
    /// wakes the avatar; it stays queued and runs once standing.
    pub fn enqueue_move(&mut self, direction: Direction) -> bool {
        if self.bump.is_some() {
            return false;
        }

        let was_empty = self.queue.is_empty();
        if !self.queue.push(direction) {
            return false;
        }

        if was_empty && self.bed.in_bed() {
            self.set_in_bed(false);
        }
        true
    }

    /// Teleports the avatar, bypassing animation and the queue.
    ///
    /// Any in-flight step or bump is discarded so it cannot drag the visual
    /// position back toward the previous cell.
    pub fn set_logical_position(&mut self, x: i32, z: i32) {
        self.logical = GridPosition::new(x, z);
        self.step = None;
        self.bump = None;
        self.hop = 0.0;
        self.lunge = Vec3::ZERO;
        self.rest = self.cell_to_world(self.logical);
        self.apply_pose();
    }

    /// Discards all per-scene state ahead of a scene transition.
    pub fn reset_for_scene(&mut self) {
        self.queue.clear();
        self.step = None;
        self.bump = None;
        self.hop = 0.0;
        self.lunge = Vec3::ZERO;
        self.bed = BedTransition::default();
        self.bed_cell = None;
        self.cell_hooks.clear();
        self.pending_events.clear();
        self.target_yaw = self.yaw;
        self.rest = self.cell_to_world(self.logical);
    }

    /// Advances the state machine by one frame, appending emitted events.
    ///
    /// A controller without a bound avatar skips the frame.
    pub fn update(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if self.avatar.is_none() {
            return;
        }

        out_events.append(&mut self.pending_events);
        let dt = dt.as_secs_f32();

        if self.bed.is_transitioning() {
            self.bed.advance(dt, self.tuning.bed_transition_speed);
            if self.bed.value() > 0.0 {
                self.hop = 0.0;
            }
            self.apply_pose();
            return;
        }

        if self.bump.is_some() {
            self.advance_bump(dt);
        } else if self.step.is_some() {
            self.advance_step(dt, out_events);
        } else if !self.queue.is_empty() {
            self.start_next_move(out_events);
        }

        self.yaw = rotate_towards(self.yaw, self.target_yaw, self.tuning.rotation_speed * dt);
        self.apply_pose();
    }

    fn advance_bump(&mut self, dt: f32) {
        let Some(bump) = self.bump.as_mut() else {
            return;
        };

        let progress = bump.advance(dt, self.tuning.bump_duration);
        if progress >= 1.0 {
            self.lunge = Vec3::ZERO;
            self.bump = None;
            return;
        }

        let distance = self.tuning.bump_distance * self.tuning.cell_size;
        self.lunge = bump.lunge_at(progress, distance);
    }

    fn advance_step(&mut self, dt: f32, out_events: &mut Vec<Event>) {
        let Some(step) = self.step.as_mut() else {
            return;
        };

        let progress = step.advance(dt, self.tuning.step_duration);
        if progress < 1.0 {
            self.rest = step.position_at(progress);
            self.hop = if self.bed.value() > 0.0 {
                0.0
            } else {
                StepAnimation::hop_at(progress, self.tuning.hop_height)
            };
            return;
        }

        let direction = step.direction();
        self.rest = step.destination();
        self.rest.y = self.rest_height();
        self.hop = 0.0;
        self.step = None;

        let position = self.logical;
        log::debug!("step {direction:?} completed at {position}");
        self.react_to_arrival(position, direction, out_events);
        out_events.push(Event::MoveCompleted {
            position,
            direction,
        });
    }

    fn react_to_arrival(
        &mut self,
        cell: GridPosition,
        direction: Direction,
        out_events: &mut Vec<Event>,
    ) {
        let Some(hook) = self.cell_hooks.get_mut(&cell) else {
            return;
        };

        match hook.on_enter(cell, direction) {
            Some(CellReaction::EnterBed) => {
                if self.bed.set_target(true) {
                    out_events.push(Event::BedStateChanged { in_bed: true });
                }
            }
            Some(CellReaction::Tag(tag)) => {
                out_events.push(Event::SpecialCellEntered { cell, tag });
            }
            None => {}
        }
    }

    fn start_next_move(&mut self, out_events: &mut Vec<Event>) {
        if self.bed.in_bed() {
            // Moves queued while already lying down wake the avatar first.
            self.set_in_bed(false);
            out_events.append(&mut self.pending_events);
            return;
        }

        let Some(direction) = self.queue.pop() else {
            return;
        };
        self.target_yaw = direction.facing_angle();

        let from = self.logical;
        let candidate = from.offset(direction);
        match self.probe(candidate) {
            Probe::Walkable => {
                self.logical = candidate;
                let destination = self.cell_to_world(candidate);
                self.step = Some(StepAnimation::new(direction, self.rest, destination));
            }
            Probe::Blocked(collider) => {
                log::debug!(
                    "move {direction:?} from {from} blocked at {candidate} by {:?}",
                    collider.as_ref().and_then(Collider::interaction)
                );
                out_events.push(Event::MoveBlocked {
                    from,
                    direction,
                    blocked: candidate,
                });
                if let Some(collider) = collider {
                    self.notify_interactable(&collider, candidate, out_events);
                }
                self.bump = Some(BumpAnimation::new(direction));
            }
        }
    }

    fn probe(&mut self, candidate: GridPosition) -> Probe {
        let Some(map) = self.collision_map.as_ref() else {
            if !self.warned_missing_map {
                log::warn!("no collision map bound; treating every cell as walkable");
                self.warned_missing_map = true;
            }
            return Probe::Walkable;
        };

        let map = map.borrow();
        if map.is_walkable_at(candidate) {
            Probe::Walkable
        } else {
            Probe::Blocked(map.collider_at(candidate.x(), candidate.z()).cloned())
        }
    }

    fn notify_interactable(
        &mut self,
        collider: &Collider,
        cell: GridPosition,
        out_events: &mut Vec<Event>,
    ) {
        let Some(kind) = collider.interaction() else {
            return;
        };

        if let Some(hook) = collider.contact_hook() {
            hook(collider);
        }
        if let Some(callback) = self.interactable_callback.as_mut() {
            callback(collider);
        }
        out_events.push(Event::InteractableBlocked {
            collider: collider.id(),
            kind,
            cell,
        });
    }

    fn rest_height(&self) -> f32 {
        self.avatar
            .as_ref()
            .map_or(0.0, |avatar| avatar.rest_height())
    }

    fn cell_to_world(&self, cell: GridPosition) -> Vec3 {
        let size = self.tuning.cell_size;
        Vec3::new(
            cell.x() as f32 * size,
            self.rest_height(),
            cell.z() as f32 * size,
        )
    }

    fn apply_pose(&mut self) {
        let pose = self.pose();
        if let Some(avatar) = self.avatar.as_mut() {
            avatar.apply_pose(pose);
        }
    }

    /// Logical grid position used by all game logic.
    #[must_use]
    pub fn logical_position(&self) -> GridPosition {
        self.logical
    }

    /// Interpolated world-space position for rendering and camera framing.
    #[must_use]
    pub fn visual_position(&self) -> Vec3 {
        self.rest + Vec3::Y * self.hop + self.lunge + self.bed.offset(&self.tuning)
    }

    /// Full transform for the current frame.
    #[must_use]
    pub fn pose(&self) -> AvatarPose {
        AvatarPose {
            position: self.visual_position(),
            yaw: self.yaw,
            pitch: self.bed.pitch(),
        }
    }

    /// Current heading in radians.
    #[must_use]
    pub fn facing(&self) -> f32 {
        self.yaw
    }

    /// Reports whether a step animation is in progress.
    #[must_use]
    pub fn is_stepping(&self) -> bool {
        self.step.is_some()
    }

    /// Reports whether a bump animation is in progress.
    #[must_use]
    pub fn is_bumping(&self) -> bool {
        self.bump.is_some()
    }

    /// Direction of the bump in progress, if any.
    #[must_use]
    pub fn bump_direction(&self) -> Option<Direction> {
        self.bump.map(|bump| bump.direction())
    }

    /// Number of pending moves.
    #[must_use]
    pub fn queue_depth(&self) -> usize {
        self.queue.len()
    }

    /// Pending moves in execution order.
    #[must_use]
    pub fn queued_moves(&self) -> Vec<Direction> {
        self.queue.iter().collect()
    }

    /// Whether the avatar's posture target is lying in bed.
    #[must_use]
    pub fn is_in_bed(&self) -> bool {
        self.bed.in_bed()
    }

    /// Posture scalar: `0.0` standing, `1.0` fully lying.
    #[must_use]
    pub fn bed_transition(&self) -> f32 {
        self.bed.value()
    }

    /// Reports whether the posture is still animating toward its target.
    #[must_use]
    pub fn is_bed_transitioning(&self) -> bool {
        self.bed.is_transitioning()
    }

    /// Bed cell registered for the current scene.
    #[must_use]
    pub fn bed_cell(&self) -> Option<GridPosition> {
        self.bed_cell
    }

    /// Tuning the controller was built with.
    #[must_use]
    pub fn tuning(&self) -> &MovementTuning {
        &self.tuning
    }

    /// Read-only snapshot for the debug overlay.
    #[must_use]
    pub fn debug_snapshot(&self) -> MovementDebug {
        MovementDebug {
            position: self.logical,
            queue_depth: self.queue.len(),
            queued: self.queued_moves(),
            moving: self.is_stepping() || self.is_bumping(),
            bumping: self.bump_direction(),
            in_bed: self.bed.in_bed(),
            bed_transition: self.bed.value(),
        }
    }
}

impl Default for GridMovementController {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GridMovementController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridMovementController")
            .field("logical", &self.logical)
            .field("visual", &self.visual_position())
            .field("queue", &self.queue)
            .field("step", &self.step)
            .field("bump", &self.bump)
            .field("bed", &self.bed)
            .field("bed_cell", &self.bed_cell)
            .field("cell_hooks", &self.cell_hooks)
            .field("avatar_bound", &self.avatar.is_some())
            .field("collision_map_bound", &self.collision_map.is_some())
            .finish()
    }
}

/// Live movement state displayed by the debug overlay.
#[derive(Clone, Debug, PartialEq)]
pub struct MovementDebug {
    /// Logical grid position.
    pub position: GridPosition,
    /// Number of pending moves.
    pub queue_depth: usize,
    /// Pending moves in execution order.
    pub queued: Vec<Direction>,
    /// Whether a step or bump is animating.
    pub moving: bool,
    /// Direction of the bump in progress.
    pub bumping: Option<Direction>,
    /// Whether the posture target is lying in bed.
    pub in_bed: bool,
    /// Posture scalar between standing and lying.
    pub bed_transition: f32,
}

enum Probe {
    Walkable,
    Blocked(Option<Collider>),
}
