//! Occupancy records registered with the collision map.

use std::{collections::HashSet, fmt, rc::Rc};

use commute_core::{ColliderId, GridPosition, InteractionKind};

/// Callback invoked when the avatar attempts to enter an interactable cell.
pub type ContactHook = Rc<dyn Fn(&Collider)>;

/// Distinguishes plain obstacles from interactable occupants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColliderKind {
    /// Permanently blocks movement into its cells.
    Static,
    /// Blocks movement like a static collider but carries an interaction tag.
    Interactable(InteractionKind),
}

/// Registered occupancy record covering one or more grid cells.
#[derive(Clone)]
pub struct Collider {
    id: ColliderId,
    kind: ColliderKind,
    cells: Vec<GridPosition>,
    contact_hook: Option<ContactHook>,
}

impl Collider {
    /// Creates a static collider covering the provided cells.
    #[must_use]
    pub fn fixed<I>(cells: I) -> Self
    where
        I: IntoIterator<Item = GridPosition>,
    {
        Self::with_kind(ColliderKind::Static, cells)
    }

    /// Creates an interactable collider covering the provided cells.
    #[must_use]
    pub fn interactable<I>(kind: InteractionKind, cells: I) -> Self
    where
        I: IntoIterator<Item = GridPosition>,
    {
        Self::with_kind(ColliderKind::Interactable(kind), cells)
    }

    /// Creates a collider of the given kind covering the provided cells.
    ///
    /// Duplicate cells are collapsed while preserving first-seen order.
    #[must_use]
    pub fn with_kind<I>(kind: ColliderKind, cells: I) -> Self
    where
        I: IntoIterator<Item = GridPosition>,
    {
        let mut seen = HashSet::new();
        let footprint: Vec<GridPosition> = cells
            .into_iter()
            .filter(|cell| seen.insert(*cell))
            .collect();

        Self {
            id: ColliderId::new(0),
            kind,
            cells: footprint,
            contact_hook: None,
        }
    }

    /// Attaches a callback invoked whenever a move into this collider is rejected.
    #[must_use]
    pub fn with_contact_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Collider) + 'static,
    {
        self.contact_hook = Some(Rc::new(hook));
        self
    }

    /// Identifier allocated by the collision map on registration.
    #[must_use]
    pub const fn id(&self) -> ColliderId {
        self.id
    }

    pub(crate) fn assign_id(&mut self, id: ColliderId) {
        self.id = id;
    }

    /// Kind of occupant described by the record.
    #[must_use]
    pub const fn kind(&self) -> ColliderKind {
        self.kind
    }

    /// Interaction tag, present only for interactable colliders.
    #[must_use]
    pub const fn interaction(&self) -> Option<InteractionKind> {
        match self.kind {
            ColliderKind::Static => None,
            ColliderKind::Interactable(kind) => Some(kind),
        }
    }

    /// Cells claimed by the collider at registration time.
    #[must_use]
    pub fn cells(&self) -> &[GridPosition] {
        &self.cells
    }

    /// Callback attached to the collider, if any.
    #[must_use]
    pub fn contact_hook(&self) -> Option<&ContactHook> {
        self.contact_hook.as_ref()
    }
}

impl fmt::Debug for Collider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collider")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("cells", &self.cells)
            .field("contact_hook", &self.contact_hook.is_some())
            .finish()
    }
}

/// Enumerates every cell of the axis-aligned rectangle anchored at `origin`.
///
/// Zero-sized rectangles produce no cells.
#[must_use]
pub fn rect_cells(origin: GridPosition, width: u32, depth: u32) -> Vec<GridPosition> {
    let width = i32::try_from(width).unwrap_or(i32::MAX);
    let depth = i32::try_from(depth).unwrap_or(i32::MAX);
    let mut cells = Vec::new();
    for dz in 0..depth {
        for dx in 0..width {
            cells.push(GridPosition::new(
                origin.x().saturating_add(dx),
                origin.z().saturating_add(dz),
            ));
        }
    }
    cells
}
