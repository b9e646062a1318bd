//! Seam between the controller and whatever renders the avatar.

use std::{cell::Cell, rc::Rc};

use glam::Vec3;

/// Transform the controller pushes to the bound avatar every frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AvatarPose {
    /// World-space position, including hop, bump, and posture offsets.
    pub position: Vec3,
    /// Heading around the vertical axis in radians.
    pub yaw: f32,
    /// Backward tip in radians; `-π/2` when lying flat.
    pub pitch: f32,
}

/// Renderable, movable avatar bound to a movement controller.
pub trait AvatarRig {
    /// Height of the avatar's origin above the floor when standing at rest.
    fn rest_height(&self) -> f32;

    /// Applies the pose computed for the current frame.
    fn apply_pose(&mut self, pose: AvatarPose);
}

/// Avatar rig that only remembers the most recent pose.
///
/// Clones share the recorded pose, so a caller can keep one clone while the
/// controller owns another. Used for headless runs and tests.
#[derive(Clone, Debug, Default)]
pub struct PoseRecorder {
    rest_height: f32,
    last: Rc<Cell<Option<AvatarPose>>>,
}

impl PoseRecorder {
    /// Creates a recorder for an avatar resting at `rest_height`.
    #[must_use]
    pub fn new(rest_height: f32) -> Self {
        Self {
            rest_height,
            last: Rc::new(Cell::new(None)),
        }
    }

    /// Most recent pose applied by the controller.
    #[must_use]
    pub fn last_pose(&self) -> Option<AvatarPose> {
        self.last.get()
    }
}

impl AvatarRig for PoseRecorder {
    fn rest_height(&self) -> f32 {
        self.rest_height
    }

    fn apply_pose(&mut self, pose: AvatarPose) {
        self.last.set(Some(pose));
    }
}
