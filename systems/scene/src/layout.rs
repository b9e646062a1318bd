//! Declarative scene layouts loaded from TOML.

use commute_core::{GridPosition, InteractionKind, SceneId};
use commute_world::{rect_cells, Collider, ColliderKind, CollisionMap, RegistrationReport};
use serde::Deserialize;
use thiserror::Error;

const APARTMENT: &str = include_str!("../scenes/apartment.toml");
const STREET: &str = include_str!("../scenes/street.toml");
const LOBBY: &str = include_str!("../scenes/lobby.toml");
const OFFICE: &str = include_str!("../scenes/office.toml");

/// Hand-authored description of a single scene.
///
/// Cells live in `0..width` by `0..depth`. Every cell not covered by a
/// collider is walkable floor.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneLayout {
    id: SceneId,
    title: String,
    width: u32,
    depth: u32,
    spawn: GridPosition,
    #[serde(default)]
    bed: Option<GridPosition>,
    #[serde(default)]
    colliders: Vec<ColliderLayout>,
    #[serde(default)]
    triggers: Vec<TriggerLayout>,
}

impl SceneLayout {
    /// Parses and validates a layout from a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, LayoutError> {
        let layout: Self = toml::from_str(source)?;
        layout.validate()?;
        Ok(layout)
    }

    /// Loads one of the layouts shipped with the game.
    pub fn builtin(scene: SceneId) -> Result<Self, LayoutError> {
        let source = match scene {
            SceneId::Apartment => APARTMENT,
            SceneId::Street => STREET,
            SceneId::Lobby => LOBBY,
            SceneId::Office => OFFICE,
        };
        let layout = Self::from_toml_str(source)?;
        if layout.id != scene {
            return Err(LayoutError::MismatchedId {
                expected: scene,
                found: layout.id,
            });
        }
        Ok(layout)
    }

    /// Checks bounds, footprints, and that spawn and bed cells are walkable.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.width == 0 || self.depth == 0 {
            return Err(LayoutError::EmptyBounds { scene: self.id });
        }

        for (index, collider) in self.colliders.iter().enumerate() {
            let rect = collider.rect.filter(|rect| !rect.is_empty());
            if collider.cells.is_empty() && rect.is_none() {
                return Err(LayoutError::EmptyFootprint { index });
            }
            // Rectangles are bounds-checked by their corners, never enumerated.
            let stray = collider
                .cells
                .iter()
                .copied()
                .chain(rect.iter().flat_map(|rect| rect.corners()))
                .find(|cell| !self.contains(*cell));
            if let Some(cell) = stray {
                return Err(self.out_of_bounds(format!("collider #{index}"), cell));
            }
            if collider.memory.is_some() && collider.kind != ColliderTag::Memory {
                return Err(LayoutError::StrayMemory { index });
            }
        }

        for (index, trigger) in self.triggers.iter().enumerate() {
            if !self.contains(trigger.cell) {
                return Err(self.out_of_bounds(format!("trigger #{index}"), trigger.cell));
            }
        }

        self.check_walkable("spawn", self.spawn)?;
        if let Some(bed) = self.bed {
            self.check_walkable("bed", bed)?;
        }
        Ok(())
    }

    fn check_walkable(&self, what: &'static str, cell: GridPosition) -> Result<(), LayoutError> {
        if !self.contains(cell) {
            return Err(self.out_of_bounds(what.to_owned(), cell));
        }
        match self
            .colliders
            .iter()
            .position(|collider| collider.covers(cell))
        {
            Some(index) => Err(LayoutError::Obstructed { what, cell, index }),
            None => Ok(()),
        }
    }

    fn contains(&self, cell: GridPosition) -> bool {
        let inside = |value: i32, extent: u32| value >= 0 && (value as u32) < extent;
        inside(cell.x(), self.width) && inside(cell.z(), self.depth)
    }

    fn out_of_bounds(&self, what: String, cell: GridPosition) -> LayoutError {
        LayoutError::OutOfBounds {
            what,
            cell,
            width: self.width,
            depth: self.depth,
        }
    }

    /// Registers every collider with `map`, in declaration order.
    ///
    /// The returned reports line up index-for-index with [`Self::colliders`].
    pub fn populate(&self, map: &mut CollisionMap) -> Vec<RegistrationReport> {
        self.colliders
            .iter()
            .map(|collider| map.register(Collider::with_kind(collider.kind(), collider.cells())))
            .collect()
    }

    /// Scene this layout describes.
    #[must_use]
    pub fn id(&self) -> SceneId {
        self.id
    }

    /// Human-readable scene title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Number of columns along X.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows along Z.
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Cell the avatar is placed on when the scene loads.
    #[must_use]
    pub fn spawn(&self) -> GridPosition {
        self.spawn
    }

    /// Bed cell, if the scene has one.
    #[must_use]
    pub fn bed(&self) -> Option<GridPosition> {
        self.bed
    }

    /// Collider declarations.
    #[must_use]
    pub fn colliders(&self) -> &[ColliderLayout] {
        &self.colliders
    }

    /// Trigger declarations.
    #[must_use]
    pub fn triggers(&self) -> &[TriggerLayout] {
        &self.triggers
    }
}

/// Collider declaration inside a scene layout.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColliderLayout {
    kind: ColliderTag,
    #[serde(default)]
    cells: Vec<GridPosition>,
    #[serde(default)]
    rect: Option<RectLayout>,
    #[serde(default)]
    memory: Option<String>,
}

impl ColliderLayout {
    /// Collider kind registered with the collision map.
    #[must_use]
    pub fn kind(&self) -> ColliderKind {
        match self.kind {
            ColliderTag::Static => ColliderKind::Static,
            ColliderTag::Bed => ColliderKind::Interactable(InteractionKind::Bed),
            ColliderTag::Door => ColliderKind::Interactable(InteractionKind::Door),
            ColliderTag::Elevator => ColliderKind::Interactable(InteractionKind::Elevator),
            ColliderTag::Memory => ColliderKind::Interactable(InteractionKind::Memory),
        }
    }

    /// Explicit cells followed by the rectangle's cells, if any.
    #[must_use]
    pub fn cells(&self) -> Vec<GridPosition> {
        let mut cells = self.cells.clone();
        if let Some(rect) = self.rect {
            cells.extend(rect_cells(
                GridPosition::new(rect.x, rect.z),
                rect.width,
                rect.depth,
            ));
        }
        cells
    }

    fn covers(&self, cell: GridPosition) -> bool {
        self.cells.contains(&cell) || self.rect.map_or(false, |rect| rect.covers(cell))
    }

    /// Line recalled when the avatar bumps into a memory collider.
    #[must_use]
    pub fn memory(&self) -> Option<&str> {
        self.memory.as_deref()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ColliderTag {
    Static,
    Bed,
    Door,
    Elevator,
    Memory,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
struct RectLayout {
    x: i32,
    z: i32,
    width: u32,
    depth: u32,
}

impl RectLayout {
    fn is_empty(&self) -> bool {
        self.width == 0 || self.depth == 0
    }

    fn far_x(&self) -> i64 {
        i64::from(self.x) + i64::from(self.width) - 1
    }

    fn far_z(&self) -> i64 {
        i64::from(self.z) + i64::from(self.depth) - 1
    }

    /// Origin followed by the opposite corner, saturated to the grid range.
    fn corners(&self) -> [GridPosition; 2] {
        let clamp = |value: i64| i32::try_from(value).unwrap_or(i32::MAX);
        [
            GridPosition::new(self.x, self.z),
            GridPosition::new(clamp(self.far_x()), clamp(self.far_z())),
        ]
    }

    fn covers(&self, cell: GridPosition) -> bool {
        let (x, z) = (i64::from(cell.x()), i64::from(cell.z()));
        !self.is_empty()
            && (i64::from(self.x)..=self.far_x()).contains(&x)
            && (i64::from(self.z)..=self.far_z()).contains(&z)
    }
}

/// Narration or progression trigger fired when a step completes on its cell.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TriggerLayout {
    cell: GridPosition,
    #[serde(default)]
    narration: Option<String>,
    #[serde(default)]
    once: bool,
    #[serde(default)]
    goal: bool,
}

impl TriggerLayout {
    /// Cell the trigger watches.
    #[must_use]
    pub fn cell(&self) -> GridPosition {
        self.cell
    }

    /// Line shown when the trigger fires.
    #[must_use]
    pub fn narration(&self) -> Option<&str> {
        self.narration.as_deref()
    }

    /// Whether the trigger fires a single time per load.
    #[must_use]
    pub fn once(&self) -> bool {
        self.once
    }

    /// Whether reaching the cell ends the scene.
    #[must_use]
    pub fn goal(&self) -> bool {
        self.goal
    }
}

/// Errors raised while loading a scene layout.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// The document is not valid layout TOML.
    #[error("failed to parse scene layout: {0}")]
    Parse(#[from] toml::de::Error),
    /// Width or depth is zero.
    #[error("scene `{scene}` has no cells")]
    EmptyBounds {
        /// Offending scene.
        scene: SceneId,
    },
    /// A collider declares neither cells nor a non-empty rectangle.
    #[error("collider #{index} has an empty footprint")]
    EmptyFootprint {
        /// Position of the collider in the layout.
        index: usize,
    },
    /// A cell lies outside the scene bounds.
    #[error("{what} at {cell} lies outside the {width}x{depth} scene")]
    OutOfBounds {
        /// Element that referenced the cell.
        what: String,
        /// Offending cell.
        cell: GridPosition,
        /// Scene width.
        width: u32,
        /// Scene depth.
        depth: u32,
    },
    /// The spawn or bed cell is covered by a collider.
    #[error("{what} cell {cell} is covered by collider #{index}")]
    Obstructed {
        /// Either `spawn` or `bed`.
        what: &'static str,
        /// Offending cell.
        cell: GridPosition,
        /// Position of the covering collider in the layout.
        index: usize,
    },
    /// Memory text attached to a collider that is not a memory.
    #[error("collider #{index} carries memory text but is not a memory")]
    StrayMemory {
        /// Position of the collider in the layout.
        index: usize,
    },
    /// A built-in asset declares a different scene than requested.
    #[error("layout for `{expected}` declares scene `{found}`")]
    MismatchedId {
        /// Scene that was requested.
        expected: SceneId,
        /// Scene the document declares.
        found: SceneId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLOSET: &str = r#"
        id = "apartment"
        title = "Closet"
        width = 3
        depth = 3
        spawn = { x = 1, z = 1 }

        [[colliders]]
        kind = "static"
        rect = { x = 0, z = 0, width = 3, depth = 1 }
    "#;

    #[test]
    fn parses_minimal_layout() {
        let layout = SceneLayout::from_toml_str(CLOSET).expect("valid layout");
        assert_eq!(layout.id(), SceneId::Apartment);
        assert_eq!(layout.spawn(), GridPosition::new(1, 1));
        assert_eq!(layout.bed(), None);
        assert_eq!(layout.colliders()[0].cells().len(), 3);
        assert!(layout.triggers().is_empty());
    }

    #[test]
    fn rejects_spawn_inside_collider() {
        let source = CLOSET.replace("spawn = { x = 1, z = 1 }", "spawn = { x = 1, z = 0 }");
        let error = SceneLayout::from_toml_str(&source).expect_err("spawn is covered");
        assert!(matches!(
            error,
            LayoutError::Obstructed {
                what: "spawn",
                index: 0,
                ..
            }
        ));
    }

    #[test]
    fn rejects_bed_outside_bounds() {
        let source = CLOSET.replace("spawn =", "bed = { x = 5, z = 1 }\nspawn =");
        let error = SceneLayout::from_toml_str(&source).expect_err("bed is outside");
        assert!(matches!(error, LayoutError::OutOfBounds { .. }));
    }

    #[test]
    fn rejects_empty_footprint() {
        let source = CLOSET.replace("rect = { x = 0, z = 0, width = 3, depth = 1 }", "");
        let error = SceneLayout::from_toml_str(&source).expect_err("no cells");
        assert!(matches!(error, LayoutError::EmptyFootprint { index: 0 }));
    }

    #[test]
    fn rejects_memory_text_on_static_collider() {
        let source = CLOSET.replace(
            "kind = \"static\"",
            "kind = \"static\"\nmemory = \"nothing\"",
        );
        let error = SceneLayout::from_toml_str(&source).expect_err("stray memory");
        assert!(matches!(error, LayoutError::StrayMemory { index: 0 }));
    }

    #[test]
    fn rejects_unknown_fields() {
        let source = format!("{CLOSET}\nweather = \"rain\"\n");
        assert!(matches!(
            SceneLayout::from_toml_str(&source),
            Err(LayoutError::Parse(_))
        ));
    }

    #[test]
    fn oversized_rect_is_rejected_by_its_far_corner() {
        let source = CLOSET.replace(
            "rect = { x = 0, z = 0, width = 3, depth = 1 }",
            "rect = { x = 0, z = 0, width = 4294967295, depth = 4294967295 }",
        );
        let error = SceneLayout::from_toml_str(&source).expect_err("rect exceeds scene");
        match error {
            LayoutError::OutOfBounds { what, cell, .. } => {
                assert_eq!(what, "collider #0");
                assert_eq!(cell, GridPosition::new(i32::MAX, i32::MAX));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rect_reaching_one_past_the_edge_is_rejected() {
        let source = CLOSET.replace("width = 3, depth = 1", "width = 4, depth = 1");
        let error = SceneLayout::from_toml_str(&source).expect_err("rect exceeds scene");
        assert!(matches!(
            error,
            LayoutError::OutOfBounds { cell, .. } if cell == GridPosition::new(3, 0)
        ));
    }

    #[test]
    fn zero_sized_rect_without_cells_is_an_empty_footprint() {
        let source = CLOSET.replace("width = 3, depth = 1", "width = 0, depth = 1");
        let error = SceneLayout::from_toml_str(&source).expect_err("no cells");
        assert!(matches!(error, LayoutError::EmptyFootprint { index: 0 }));
    }

    #[test]
    fn bed_covered_by_rect_interior_is_obstructed() {
        let source = CLOSET
            .replace("width = 3, depth = 1", "width = 3, depth = 2")
            .replace(
                "spawn = { x = 1, z = 1 }",
                "spawn = { x = 1, z = 2 }\nbed = { x = 2, z = 1 }",
            );
        let error = SceneLayout::from_toml_str(&source).expect_err("bed is covered");
        assert!(matches!(
            error,
            LayoutError::Obstructed {
                what: "bed",
                index: 0,
                ..
            }
        ));
    }

    #[test]
    fn every_builtin_layout_is_valid() {
        for scene in SceneId::ALL {
            let layout = SceneLayout::builtin(scene).expect("builtin layout");
            assert_eq!(layout.id(), scene);
            assert!(!layout.colliders().is_empty());
        }
    }

    #[test]
    fn populate_registers_colliders_in_order() {
        let layout = SceneLayout::from_toml_str(CLOSET).expect("valid layout");
        let mut map = CollisionMap::new();
        let reports = layout.populate(&mut map);

        assert_eq!(reports.len(), 1);
        assert!(reports[0].is_clean());
        assert!(!map.is_walkable(2, 0));
        assert!(map.is_walkable(1, 1));
    }
}
