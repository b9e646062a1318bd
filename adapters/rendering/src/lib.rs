#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Commute adapters.

mod input;

use anyhow::Result as AnyResult;
use commute_core::{GridPosition, InteractionKind};
use commute_system_movement::{GridMovementController, MovementDebug};
use commute_world::CollisionMap;
use glam::Vec3;
use std::{error::Error, fmt, time::Duration};

pub use self::input::{KeyboardRouter, MoveKey};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct FrameInput {
    /// Movement keys that went down on this frame, in press order.
    pub pressed: Vec<MoveKey>,
    /// Movement keys that went up on this frame.
    pub released: Vec<MoveKey>,
    /// Whether the debug overlay toggle was pressed on this frame.
    pub toggle_debug: bool,
}

/// Describes the rectangular floor of a scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridPresentation {
    /// Number of columns along X.
    pub columns: u32,
    /// Number of rows along Z.
    pub rows: u32,
    /// Side length of a cell in world units.
    pub cell_size: f32,
    /// Color used for walkable floor.
    pub floor_color: Color,
}

impl GridPresentation {
    /// Creates a new grid descriptor.
    ///
    /// Returns an error when the grid has no cells or the cell size is not positive.
    pub fn new(
        columns: u32,
        rows: u32,
        cell_size: f32,
        floor_color: Color,
    ) -> std::result::Result<Self, RenderingError> {
        if columns == 0 || rows == 0 {
            return Err(RenderingError::EmptyGrid { columns, rows });
        }
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(RenderingError::InvalidCellSize { cell_size });
        }

        Ok(Self {
            columns,
            rows,
            cell_size,
            floor_color,
        })
    }

    /// Width of the grid in world units.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.columns as f32 * self.cell_size
    }

    /// Depth of the grid in world units.
    #[must_use]
    pub fn depth(&self) -> f32 {
        self.rows as f32 * self.cell_size
    }
}

/// Occupied cell drawn by adapters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColliderPresentation {
    /// Occupied cell.
    pub cell: GridPosition,
    /// Interaction tag, `None` for plain obstacles.
    pub interaction: Option<InteractionKind>,
}

/// Avatar transform in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AvatarPresentation {
    /// Interpolated world position.
    pub position: Vec3,
    /// Heading in radians.
    pub yaw: f32,
    /// Posture between standing (`0.0`) and lying (`1.0`).
    pub lying: f32,
}

/// Read-only movement state shown when the debug overlay is enabled.
#[derive(Clone, Debug, PartialEq)]
pub struct DebugOverlay {
    /// Latest controller snapshot.
    pub movement: MovementDebug,
}

impl DebugOverlay {
    /// Formats the overlay as display lines.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let movement = &self.movement;
        let queued: Vec<String> = movement
            .queued
            .iter()
            .map(|direction| format!("{direction:?}"))
            .collect();
        vec![
            format!("cell {}", movement.position),
            format!("queue {} [{}]", movement.queue_depth, queued.join(", ")),
            format!("moving {}", movement.moving),
            match movement.bumping {
                Some(direction) => format!("bump {direction:?}"),
                None => "bump -".to_owned(),
            },
            format!(
                "in bed {} ({:.2})",
                movement.in_bed, movement.bed_transition
            ),
        ]
    }
}

/// Scene description combining the floor grid, colliders and the avatar.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Title of the loaded scene.
    pub title: String,
    /// Floor grid.
    pub grid: GridPresentation,
    /// Occupied cells in stable order.
    pub colliders: Vec<ColliderPresentation>,
    /// Bed cell, if the scene has one.
    pub bed: Option<GridPosition>,
    /// Avatar transform.
    pub avatar: AvatarPresentation,
    /// Most recent narration line.
    pub narration: Option<String>,
    /// Whether adapters should draw [`Scene::debug`].
    pub debug_visible: bool,
    /// Debug overlay contents.
    pub debug: Option<DebugOverlay>,
}

impl Scene {
    /// Creates an empty scene over `grid`.
    #[must_use]
    pub fn new<T>(title: T, grid: GridPresentation) -> Self
    where
        T: Into<String>,
    {
        Self {
            title: title.into(),
            grid,
            colliders: Vec::new(),
            bed: None,
            avatar: AvatarPresentation {
                position: Vec3::ZERO,
                yaw: 0.0,
                lying: 0.0,
            },
            narration: None,
            debug_visible: false,
            debug: None,
        }
    }

    /// Copies collider occupancy and avatar state into the scene.
    pub fn refresh(&mut self, map: &CollisionMap, controller: &GridMovementController) {
        self.colliders = map
            .occupied_cells()
            .into_iter()
            .map(|(cell, collider)| ColliderPresentation {
                cell,
                interaction: collider.interaction(),
            })
            .collect();
        self.bed = controller.bed_cell();

        let pose = controller.pose();
        self.avatar = AvatarPresentation {
            position: pose.position,
            yaw: pose.yaw,
            lying: controller.bed_transition(),
        };
        self.debug = Some(DebugOverlay {
            movement: controller.debug_snapshot(),
        });
    }

    /// Replaces the narration line.
    pub fn narrate<T>(&mut self, line: T)
    where
        T: Into<String>,
    {
        self.narration = Some(line.into());
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Commute scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta and the
    /// input captured by the adapter, and may mutate the scene before it is
    /// rendered.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// The grid must contain at least one cell.
    EmptyGrid {
        /// Provided column count.
        columns: u32,
        /// Provided row count.
        rows: u32,
    },
    /// Cell size must be positive and finite.
    InvalidCellSize {
        /// Provided cell size that failed validation.
        cell_size: f32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGrid { columns, rows } => {
                write!(f, "grid must contain cells (received {columns}x{rows})")
            }
            Self::InvalidCellSize { cell_size } => {
                write!(f, "cell_size must be positive (received {cell_size})")
            }
        }
    }
}

impl Error for RenderingError {}
