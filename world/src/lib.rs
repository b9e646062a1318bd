#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative collision state for Commute scenes.
//!
//! The [`CollisionMap`] is the single source of truth for whether the avatar
//! may occupy a grid cell. Scenes populate it on load and clear it on unload;
//! the movement controller only ever queries it.

mod collider;

use std::{
    cell::RefCell,
    collections::{BTreeMap, HashMap},
    rc::Rc,
};

use commute_core::{ColliderId, GridPosition};

pub use collider::{rect_cells, Collider, ColliderKind, ContactHook};

/// Collision map shared between the owning scene and the movement controller.
pub type SharedCollisionMap = Rc<RefCell<CollisionMap>>;

/// Registry mapping grid cells to the collider occupying them.
///
/// A cell maps to at most one collider. Registering a collider over cells
/// already claimed by another collider overwrites them; the overwritten cells
/// are reported through [`RegistrationReport`] and logged.
#[derive(Debug)]
pub struct CollisionMap {
    cells: HashMap<GridPosition, ColliderId>,
    colliders: BTreeMap<ColliderId, Collider>,
    next_collider_id: ColliderId,
}

impl CollisionMap {
    /// Creates an empty collision map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cells: HashMap::new(),
            colliders: BTreeMap::new(),
            next_collider_id: ColliderId::new(0),
        }
    }

    /// Wraps a fresh map in the shared handle used by scenes and controllers.
    #[must_use]
    pub fn shared() -> SharedCollisionMap {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Inserts an occupancy record, associating every footprint cell with it.
    pub fn register(&mut self, mut collider: Collider) -> RegistrationReport {
        let id = self.allocate_id();
        collider.assign_id(id);

        let mut overwritten = Vec::new();
        for cell in collider.cells() {
            if let Some(previous) = self.cells.insert(*cell, id) {
                overwritten.push(Overwrite {
                    cell: *cell,
                    previous,
                });
            }
        }

        if !overwritten.is_empty() {
            log::warn!(
                "collider {} overwrote {} cell(s) owned by other colliders",
                id.get(),
                overwritten.len()
            );
            for overwrite in &overwritten {
                self.prune_if_orphaned(overwrite.previous);
            }
        }

        let _ = self.colliders.insert(id, collider);
        RegistrationReport { id, overwritten }
    }

    /// Removes a collider and releases the cells it still owns.
    pub fn unregister(&mut self, id: ColliderId) -> Option<Collider> {
        let collider = self.colliders.remove(&id)?;
        for cell in collider.cells() {
            if self.cells.get(cell) == Some(&id) {
                let _ = self.cells.remove(cell);
            }
        }
        Some(collider)
    }

    /// Reports whether no collider is associated with the cell.
    #[must_use]
    pub fn is_walkable(&self, x: i32, z: i32) -> bool {
        !self.cells.contains_key(&GridPosition::new(x, z))
    }

    /// Reports whether no collider is associated with the grid position.
    #[must_use]
    pub fn is_walkable_at(&self, cell: GridPosition) -> bool {
        self.is_walkable(cell.x(), cell.z())
    }

    /// Looks up the collider occupying the cell.
    #[must_use]
    pub fn collider_at(&self, x: i32, z: i32) -> Option<&Collider> {
        self.cells
            .get(&GridPosition::new(x, z))
            .and_then(|id| self.colliders.get(id))
    }

    /// Looks up a collider by identifier.
    #[must_use]
    pub fn collider(&self, id: ColliderId) -> Option<&Collider> {
        self.colliders.get(&id)
    }

    /// Removes all registrations and resets identifier allocation.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.colliders.clear();
        self.next_collider_id = ColliderId::new(0);
    }

    /// Number of registered colliders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    /// Reports whether no collider is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    /// Occupied cells paired with their collider, sorted by cell.
    #[must_use]
    pub fn occupied_cells(&self) -> Vec<(GridPosition, &Collider)> {
        let mut occupied: Vec<(GridPosition, &Collider)> = self
            .cells
            .iter()
            .filter_map(|(cell, id)| self.colliders.get(id).map(|collider| (*cell, collider)))
            .collect();
        occupied.sort_by_key(|(cell, _)| *cell);
        occupied
    }

    fn allocate_id(&mut self) -> ColliderId {
        let id = self.next_collider_id;
        self.next_collider_id = ColliderId::new(id.get().saturating_add(1));
        id
    }

    fn prune_if_orphaned(&mut self, id: ColliderId) {
        let still_owns_cells = self.colliders.get(&id).map_or(false, |collider| {
            collider
                .cells()
                .iter()
                .any(|cell| self.cells.get(cell) == Some(&id))
        });
        if !still_owns_cells {
            let _ = self.colliders.remove(&id);
        }
    }
}

impl Default for CollisionMap {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of a collider registration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistrationReport {
    id: ColliderId,
    overwritten: Vec<Overwrite>,
}

impl RegistrationReport {
    /// Identifier allocated to the registered collider.
    #[must_use]
    pub const fn id(&self) -> ColliderId {
        self.id
    }

    /// Cells that previously belonged to another collider.
    #[must_use]
    pub fn overwritten(&self) -> &[Overwrite] {
        &self.overwritten
    }

    /// Reports whether the registration displaced no other collider.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.overwritten.is_empty()
    }
}

/// Single cell whose ownership moved to a newer collider.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Overwrite {
    /// Cell that changed hands.
    pub cell: GridPosition,
    /// Collider that owned the cell before the registration.
    pub previous: ColliderId,
}
