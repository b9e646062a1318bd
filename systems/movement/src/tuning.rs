//! Tunable constants that shape movement timing and posture animation.

use serde::Deserialize;
use thiserror::Error;

/// Timing and distance constants consumed by the movement controller.
///
/// Durations are expressed in seconds, distances in world units unless noted
/// otherwise. Every field has a default so partial TOML documents are valid.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MovementTuning {
    /// Maximum number of pending moves.
    pub queue_capacity: usize,
    /// Duration of a single step animation.
    pub step_duration: f32,
    /// Peak height of the hop performed mid-step.
    pub hop_height: f32,
    /// Duration of the full bump animation, both phases included.
    pub bump_duration: f32,
    /// Lunge distance toward a blocked cell, measured in cells.
    pub bump_distance: f32,
    /// Full standing/lying transitions completed per second.
    pub bed_transition_speed: f32,
    /// Height above rest the avatar settles at when lying in bed.
    pub bed_height: f32,
    /// Extra height of the arc traced while getting in or out of bed.
    pub bed_arc_height: f32,
    /// Offset along Z applied when fully lying, away from the pillow.
    pub bed_lateral_offset: f32,
    /// Angular speed used to turn toward the facing direction, in radians per second.
    pub rotation_speed: f32,
    /// Side length of a grid cell in world units.
    pub cell_size: f32,
}

impl MovementTuning {
    /// Parses tuning overrides from a TOML document and validates them.
    pub fn from_toml_str(source: &str) -> Result<Self, TuningError> {
        let tuning: Self = toml::from_str(source)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Checks that every duration, rate, and size is usable.
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.queue_capacity == 0 {
            return Err(TuningError::ZeroQueueCapacity);
        }

        let positive = [
            ("step_duration", self.step_duration),
            ("bump_duration", self.bump_duration),
            ("bed_transition_speed", self.bed_transition_speed),
            ("rotation_speed", self.rotation_speed),
            ("cell_size", self.cell_size),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(TuningError::NonPositive { field, value });
            }
        }

        let non_negative = [
            ("hop_height", self.hop_height),
            ("bump_distance", self.bump_distance),
            ("bed_height", self.bed_height),
            ("bed_arc_height", self.bed_arc_height),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(TuningError::Negative { field, value });
            }
        }

        if !self.bed_lateral_offset.is_finite() {
            return Err(TuningError::NonFinite {
                field: "bed_lateral_offset",
            });
        }

        Ok(())
    }
}

impl Default for MovementTuning {
    fn default() -> Self {
        Self {
            queue_capacity: 3,
            step_duration: 0.2,
            hop_height: 0.12,
            bump_duration: 0.16,
            bump_distance: 0.15,
            bed_transition_speed: 2.0,
            bed_height: 0.45,
            bed_arc_height: 0.25,
            bed_lateral_offset: 0.3,
            rotation_speed: 10.0,
            cell_size: 1.0,
        }
    }
}

/// Errors raised while loading or validating [`MovementTuning`].
#[derive(Debug, Error)]
pub enum TuningError {
    /// The TOML document could not be parsed.
    #[error("failed to parse movement tuning: {0}")]
    Parse(#[from] toml::de::Error),
    /// The queue must hold at least one move.
    #[error("queue_capacity must be at least 1")]
    ZeroQueueCapacity,
    /// A duration, rate, or size was zero, negative, or not finite.
    #[error("{field} must be positive (received {value})")]
    NonPositive {
        /// Name of the offending field.
        field: &'static str,
        /// Value that failed validation.
        value: f32,
    },
    /// A height or distance was negative or not finite.
    #[error("{field} must not be negative (received {value})")]
    Negative {
        /// Name of the offending field.
        field: &'static str,
        /// Value that failed validation.
        value: f32,
    },
    /// A value was NaN or infinite.
    #[error("{field} must be finite")]
    NonFinite {
        /// Name of the offending field.
        field: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        MovementTuning::default()
            .validate()
            .expect("default tuning validates");
        assert_eq!(MovementTuning::default().queue_capacity, 3);
        assert_eq!(MovementTuning::default().bed_transition_speed, 2.0);
    }

    #[test]
    fn partial_documents_keep_defaults() {
        let tuning = MovementTuning::from_toml_str("step_duration = 0.5\nqueue_capacity = 5\n")
            .expect("valid tuning");
        assert_eq!(tuning.step_duration, 0.5);
        assert_eq!(tuning.queue_capacity, 5);
        assert_eq!(tuning.bump_duration, MovementTuning::default().bump_duration);
    }

    #[test]
    fn rejects_zero_capacity_and_non_positive_durations() {
        assert!(matches!(
            MovementTuning::from_toml_str("queue_capacity = 0"),
            Err(TuningError::ZeroQueueCapacity)
        ));
        assert!(matches!(
            MovementTuning::from_toml_str("step_duration = 0.0"),
            Err(TuningError::NonPositive {
                field: "step_duration",
                ..
            })
        ));
        assert!(matches!(
            MovementTuning::from_toml_str("hop_height = -1.0"),
            Err(TuningError::Negative { .. })
        ));
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(matches!(
            MovementTuning::from_toml_str("teleport = true"),
            Err(TuningError::Parse(_))
        ));
    }
}
