//! Polled-progress animations driven by the movement controller.
//!
//! Every animation advances by frame delta and clamps its progress to `1.0`,
//! so overshooting a nominal duration by part of a frame is harmless.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use commute_core::Direction;
use glam::Vec3;

use crate::tuning::MovementTuning;

/// Smooth-step easing `t²(3 − 2t)` over the clamped unit interval.
#[must_use]
pub fn smooth_step(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Wraps an angle into `[-π, π)`.
#[must_use]
pub fn wrap_angle(angle: f32) -> f32 {
    (angle + PI).rem_euclid(TAU) - PI
}

/// Turns `current` toward `target` by at most `max_delta`, taking the shorter
/// path around the ±π boundary.
#[must_use]
pub fn rotate_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    let difference = wrap_angle(target - current);
    if difference.abs() <= max_delta {
        return target;
    }
    wrap_angle(current + difference.signum() * max_delta)
}

/// Unit world-space vector pointing along a grid direction.
pub(crate) fn world_direction(direction: Direction) -> Vec3 {
    let (dx, dz) = direction.delta();
    Vec3::new(dx as f32, 0.0, dz as f32)
}

/// Interpolation between two cell centres with a vertical hop.
#[derive(Clone, Copy, Debug)]
pub(crate) struct StepAnimation {
    direction: Direction,
    from: Vec3,
    to: Vec3,
    elapsed: f32,
}

impl StepAnimation {
    pub(crate) fn new(direction: Direction, from: Vec3, to: Vec3) -> Self {
        Self {
            direction,
            from,
            to,
            elapsed: 0.0,
        }
    }

    pub(crate) fn direction(&self) -> Direction {
        self.direction
    }

    pub(crate) fn destination(&self) -> Vec3 {
        self.to
    }

    pub(crate) fn advance(&mut self, dt: f32, duration: f32) -> f32 {
        self.elapsed += dt;
        self.progress(duration)
    }

    pub(crate) fn progress(&self, duration: f32) -> f32 {
        (self.elapsed / duration.max(f32::EPSILON)).clamp(0.0, 1.0)
    }

    /// Rest-height position along the step for the given progress.
    pub(crate) fn position_at(&self, progress: f32) -> Vec3 {
        self.from.lerp(self.to, smooth_step(progress))
    }

    /// Half-sine hop peaking mid-step.
    pub(crate) fn hop_at(progress: f32, hop_height: f32) -> f32 {
        (progress.clamp(0.0, 1.0) * PI).sin() * hop_height
    }
}

/// Two-phase lunge toward a blocked cell and back.
#[derive(Clone, Copy, Debug)]
pub(crate) struct BumpAnimation {
    direction: Direction,
    elapsed: f32,
}

impl BumpAnimation {
    pub(crate) fn new(direction: Direction) -> Self {
        Self {
            direction,
            elapsed: 0.0,
        }
    }

    pub(crate) fn direction(&self) -> Direction {
        self.direction
    }

    pub(crate) fn advance(&mut self, dt: f32, duration: f32) -> f32 {
        self.elapsed += dt;
        (self.elapsed / duration.max(f32::EPSILON)).clamp(0.0, 1.0)
    }

    /// Fraction of the lunge distance covered at the given progress.
    ///
    /// The first half eases out toward the blocked cell, the second half eases
    /// back to rest. Both ends evaluate to exactly zero.
    pub(crate) fn extension_at(progress: f32) -> f32 {
        let progress = progress.clamp(0.0, 1.0);
        if progress < 0.5 {
            smooth_step(progress / 0.5)
        } else {
            1.0 - smooth_step((progress - 0.5) / 0.5)
        }
    }

    /// Offset from the rest position at the given progress.
    pub(crate) fn lunge_at(&self, progress: f32, distance: f32) -> Vec3 {
        world_direction(self.direction) * (distance * Self::extension_at(progress))
    }
}

/// Scalar posture animation between standing (`0.0`) and lying (`1.0`).
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct BedTransition {
    value: f32,
    in_bed: bool,
}

impl BedTransition {
    pub(crate) fn value(&self) -> f32 {
        self.value
    }

    pub(crate) fn in_bed(&self) -> bool {
        self.in_bed
    }

    /// Sets the target posture, returning `true` when the target changed.
    pub(crate) fn set_target(&mut self, in_bed: bool) -> bool {
        let changed = self.in_bed != in_bed;
        self.in_bed = in_bed;
        changed
    }

    pub(crate) fn target_value(&self) -> f32 {
        if self.in_bed {
            1.0
        } else {
            0.0
        }
    }

    pub(crate) fn is_transitioning(&self) -> bool {
        self.value != self.target_value()
    }

    /// Moves the value toward the target at `speed` full transitions per second.
    pub(crate) fn advance(&mut self, dt: f32, speed: f32) {
        let target = self.target_value();
        let max_delta = (speed * dt).max(0.0);
        let remaining = target - self.value;
        if remaining.abs() <= max_delta {
            self.value = target;
        } else {
            self.value = (self.value + remaining.signum() * max_delta).clamp(0.0, 1.0);
        }
    }

    /// Backward tip applied to the avatar, from upright to flat.
    pub(crate) fn pitch(&self) -> f32 {
        -FRAC_PI_2 * self.value
    }

    /// Offset added to the avatar's rest position for the current posture.
    ///
    /// The vertical component blends a sine arc, which lifts the avatar clear
    /// of the mattress mid-transition, with a linear rise to bed height.
    pub(crate) fn offset(&self, tuning: &MovementTuning) -> Vec3 {
        let value = self.value;
        let arc = (value * PI).sin() * tuning.bed_arc_height;
        let rise = value * tuning.bed_height;
        Vec3::new(0.0, arc + rise, value * tuning.bed_lateral_offset)
    }
}
