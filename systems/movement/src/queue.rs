//! Bounded FIFO of pending directional moves.

use std::collections::VecDeque;

use commute_core::Direction;

/// Ordered queue of pending moves that never grows past its capacity.
#[derive(Clone, Debug)]
pub(crate) struct MovementQueue {
    pending: VecDeque<Direction>,
    capacity: usize,
}

impl MovementQueue {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a move, returning `false` without side effects when full.
    pub(crate) fn push(&mut self, direction: Direction) -> bool {
        if self.pending.len() >= self.capacity {
            return false;
        }
        self.pending.push_back(direction);
        true
    }

    pub(crate) fn pop(&mut self) -> Option<Direction> {
        self.pending.pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.pending.clear();
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = Direction> + '_ {
        self.pending.iter().copied()
    }
}
