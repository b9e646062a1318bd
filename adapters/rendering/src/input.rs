//! Translation of raw movement keys into queued moves.

use std::collections::BTreeSet;

use commute_core::Direction;
use commute_system_movement::GridMovementController;

/// Keys that steer the avatar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MoveKey {
    /// `W` key.
    W,
    /// `A` key.
    A,
    /// `S` key.
    S,
    /// `D` key.
    D,
    /// Up arrow.
    ArrowUp,
    /// Down arrow.
    ArrowDown,
    /// Left arrow.
    ArrowLeft,
    /// Right arrow.
    ArrowRight,
}

impl MoveKey {
    /// Every movement key.
    pub const ALL: [MoveKey; 8] = [
        MoveKey::W,
        MoveKey::A,
        MoveKey::S,
        MoveKey::D,
        MoveKey::ArrowUp,
        MoveKey::ArrowDown,
        MoveKey::ArrowLeft,
        MoveKey::ArrowRight,
    ];

    /// Direction the key requests.
    #[must_use]
    pub const fn direction(self) -> Direction {
        match self {
            Self::W | Self::ArrowUp => Direction::Forward,
            Self::S | Self::ArrowDown => Direction::Backward,
            Self::A | Self::ArrowLeft => Direction::Left,
            Self::D | Self::ArrowRight => Direction::Right,
        }
    }

    /// Parses a single WASD letter, ignoring case.
    #[must_use]
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_lowercase() {
            'w' => Some(Self::W),
            'a' => Some(Self::A),
            's' => Some(Self::S),
            'd' => Some(Self::D),
            _ => None,
        }
    }
}

/// Forwards key presses to the controller, one move per physical press.
///
/// A held key produces a single move; it must be released before it can
/// queue another.
#[derive(Clone, Debug, Default)]
pub struct KeyboardRouter {
    held: BTreeSet<MoveKey>,
}

impl KeyboardRouter {
    /// Creates a router with no keys held.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a press and returns the direction it requests, unless it is a repeat.
    pub fn press(&mut self, key: MoveKey) -> Option<Direction> {
        self.held.insert(key).then(|| key.direction())
    }

    /// Records that `key` went up.
    pub fn release(&mut self, key: MoveKey) {
        let _ = self.held.remove(&key);
    }

    /// Whether `key` is currently held.
    #[must_use]
    pub fn is_held(&self, key: MoveKey) -> bool {
        self.held.contains(&key)
    }

    /// Enqueues a move for each fresh press, returning how many were accepted.
    pub fn route(&mut self, presses: &[MoveKey], controller: &mut GridMovementController) -> usize {
        presses
            .iter()
            .filter_map(|key| self.press(*key))
            .filter(|direction| controller.enqueue_move(*direction))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrows_and_letters_share_directions() {
        assert_eq!(MoveKey::W.direction(), MoveKey::ArrowUp.direction());
        assert_eq!(MoveKey::A.direction(), Direction::Left);
        assert_eq!(MoveKey::ArrowDown.direction(), Direction::Backward);
        assert_eq!(MoveKey::from_letter('D'), Some(MoveKey::D));
        assert_eq!(MoveKey::from_letter('x'), None);
    }

    #[test]
    fn repeats_are_suppressed_until_release() {
        let mut router = KeyboardRouter::new();
        assert_eq!(router.press(MoveKey::D), Some(Direction::Right));
        assert_eq!(router.press(MoveKey::D), None);
        assert!(router.is_held(MoveKey::D));

        router.release(MoveKey::D);
        assert_eq!(router.press(MoveKey::D), Some(Direction::Right));
    }

    #[test]
    fn route_counts_only_accepted_moves() {
        let mut router = KeyboardRouter::new();
        let mut controller = GridMovementController::new();

        let accepted = router.route(
            &[
                MoveKey::W,
                MoveKey::W,
                MoveKey::A,
                MoveKey::S,
                MoveKey::ArrowRight,
            ],
            &mut controller,
        );

        assert_eq!(accepted, 3);
        assert_eq!(controller.queue_depth(), 3);
        assert_eq!(
            controller.queued_moves(),
            vec![Direction::Forward, Direction::Left, Direction::Backward]
        );
    }
}
