//! Special-cell behaviours layered onto the movement controller.

use std::fmt;

use commute_core::{Direction, GridPosition};

/// Behaviour a special cell requests once a step onto it completes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CellReaction {
    /// Lie down in bed.
    EnterBed,
    /// Report a tagged arrival to scene scripts.
    Tag(String),
}

/// Hook attached to a grid cell, consulted when a step onto it completes.
pub trait CellHook: fmt::Debug {
    /// Returns the reaction, if any, to arriving on `cell` via `direction`.
    fn on_enter(&mut self, cell: GridPosition, direction: Direction) -> Option<CellReaction>;
}

/// Sends the avatar to bed whenever it steps onto the registered bed cell.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct BedHook;

impl CellHook for BedHook {
    fn on_enter(&mut self, _cell: GridPosition, _direction: Direction) -> Option<CellReaction> {
        Some(CellReaction::EnterBed)
    }
}

/// Reports the same tag on every arrival, e.g. a desk the avatar sits at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagHook {
    tag: String,
}

impl TagHook {
    /// Creates a hook that reports `tag` on every arrival.
    #[must_use]
    pub fn new<T>(tag: T) -> Self
    where
        T: Into<String>,
    {
        Self { tag: tag.into() }
    }
}

impl CellHook for TagHook {
    fn on_enter(&mut self, _cell: GridPosition, _direction: Direction) -> Option<CellReaction> {
        Some(CellReaction::Tag(self.tag.clone()))
    }
}
