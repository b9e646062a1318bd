#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Commute engine.
//!
//! This crate defines the value types and the event surface that connect the
//! collision map, the grid movement controller, scene scripts, and adapters.
//! Adapters translate raw input into directional moves, the controller
//! validates them against the collision map, and then emits [`Event`] values
//! that scene scripts react to deterministically.

use std::{
    error::Error,
    f32::consts::{FRAC_PI_2, PI},
    fmt,
    str::FromStr,
};

use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Commute.";

/// Location of a single grid cell expressed as `x` and `z` coordinates.
///
/// Grid cells are the quantum of movement. Equality is exact integer
/// comparison; negative coordinates are valid so scenes may be authored around
/// an arbitrary origin.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GridPosition {
    x: i32,
    z: i32,
}

impl GridPosition {
    /// Creates a new grid position.
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Column of the cell along the world X axis.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Row of the cell along the world Z axis.
    #[must_use]
    pub const fn z(&self) -> i32 {
        self.z
    }

    /// Returns the adjacent cell reached by stepping once in `direction`.
    #[must_use]
    pub const fn offset(self, direction: Direction) -> Self {
        let (dx, dz) = direction.delta();
        Self {
            x: self.x.saturating_add(dx),
            z: self.z.saturating_add(dz),
        }
    }

    /// Computes the Manhattan distance between two grid positions.
    #[must_use]
    pub fn manhattan_distance(self, other: GridPosition) -> u32 {
        self.x.abs_diff(other.x) + self.z.abs_diff(other.z)
    }
}

impl fmt::Display for GridPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Cardinal movement directions available to the avatar.
///
/// The unit deltas and facing angles are fixed properties of the coordinate
/// system and never vary by scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Movement toward decreasing `z`.
    Forward,
    /// Movement toward increasing `z`.
    Backward,
    /// Movement toward decreasing `x`.
    Left,
    /// Movement toward increasing `x`.
    Right,
}

impl Direction {
    /// Every direction in a stable order.
    pub const ALL: [Direction; 4] = [
        Direction::Forward,
        Direction::Backward,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit grid delta `(dx, dz)` applied by a single step.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Forward => (0, -1),
            Self::Backward => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    /// Yaw in radians the avatar turns to when facing this direction.
    #[must_use]
    pub const fn facing_angle(self) -> f32 {
        match self {
            Self::Forward => PI,
            Self::Backward => 0.0,
            Self::Left => -FRAC_PI_2,
            Self::Right => FRAC_PI_2,
        }
    }

    /// Direction that undoes a step in this direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Direction of the single step leading from `from` to `to`, if adjacent.
    #[must_use]
    pub fn between(from: GridPosition, to: GridPosition) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|direction| from.offset(*direction) == to)
    }
}

/// Interaction tag attached to colliders that are more than simple obstacles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    /// Bed the avatar can lie down in.
    Bed,
    /// Door leading elsewhere.
    Door,
    /// Elevator between floors.
    Elevator,
    /// Collectible memory interaction.
    Memory,
}

/// Unique identifier assigned to a registered collider.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ColliderId(u32);

impl ColliderId {
    /// Creates a new collider identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Events broadcast by the movement controller while advancing frames.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// A step animation finished and the avatar rests on a new cell.
    MoveCompleted {
        /// Logical grid position reached by the step.
        position: GridPosition,
        /// Direction that was just executed.
        direction: Direction,
    },
    /// A dequeued move was rejected by the collision map.
    MoveBlocked {
        /// Cell the avatar occupies and remains on.
        from: GridPosition,
        /// Direction of the rejected move.
        direction: Direction,
        /// Cell that refused entry.
        blocked: GridPosition,
    },
    /// A move was rejected by an interactable collider.
    InteractableBlocked {
        /// Identifier of the collider that refused entry.
        collider: ColliderId,
        /// Interaction tag carried by the collider.
        kind: InteractionKind,
        /// Cell that refused entry.
        cell: GridPosition,
    },
    /// The avatar's bed target changed.
    BedStateChanged {
        /// Whether the avatar is now heading into bed.
        in_bed: bool,
    },
    /// A step completed on a cell carrying a tagged cell hook.
    SpecialCellEntered {
        /// Cell that was entered.
        cell: GridPosition,
        /// Tag reported by the hook.
        tag: String,
    },
}

/// Hand-built scenes the avatar travels through, in story order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneId {
    /// Starting apartment with the bed.
    Apartment,
    /// Street crossing outside the apartment.
    Street,
    /// Office building lobby.
    Lobby,
    /// Office floor where the journey ends.
    Office,
}

impl SceneId {
    /// Every scene in story order.
    pub const ALL: [SceneId; 4] = [
        SceneId::Apartment,
        SceneId::Street,
        SceneId::Lobby,
        SceneId::Office,
    ];

    /// Scene that follows this one, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Apartment => Some(Self::Street),
            Self::Street => Some(Self::Lobby),
            Self::Lobby => Some(Self::Office),
            Self::Office => None,
        }
    }

    /// Stable lowercase identifier used by layouts and the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Apartment => "apartment",
            Self::Street => "street",
            Self::Lobby => "lobby",
            Self::Office => "office",
        }
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SceneId {
    type Err = UnknownSceneError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|scene| scene.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| UnknownSceneError {
                name: value.to_owned(),
            })
    }
}

/// Error returned when parsing an unrecognised scene name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownSceneError {
    name: String,
}

impl UnknownSceneError {
    /// Name that failed to parse.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for UnknownSceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown scene `{}` (expected apartment, street, lobby or office)",
            self.name
        )
    }
}

impl Error for UnknownSceneError {}
