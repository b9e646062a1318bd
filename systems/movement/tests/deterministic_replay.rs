use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    rc::Rc,
    time::Duration,
};

use commute_core::{Direction, Event, GridPosition, InteractionKind};
use commute_system_movement::{GridMovementController, PoseRecorder};
use commute_world::{Collider, CollisionMap};

#[test]
fn deterministic_replay_produces_identical_outcomes() {
    let first = replay(scripted_inputs());
    let second = replay(scripted_inputs());

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.fingerprint(), second.fingerprint());
}

#[test]
fn scripted_route_ends_in_bed() {
    let outcome = replay(scripted_inputs());

    assert_eq!(outcome.position, GridPosition::new(0, 1));
    assert!(outcome.in_bed);

    let completed: Vec<GridPosition> = outcome
        .events
        .iter()
        .filter_map(|event| match event {
            Event::MoveCompleted { position, .. } => Some(*position),
            _ => None,
        })
        .collect();
    assert_eq!(
        completed,
        vec![
            GridPosition::new(0, -1),
            GridPosition::new(-1, -1),
            GridPosition::new(0, -1),
            GridPosition::new(0, 0),
            GridPosition::new(0, 1),
        ]
    );

    let blocked = outcome
        .events
        .iter()
        .filter(|event| matches!(event, Event::MoveBlocked { .. }))
        .count();
    assert_eq!(blocked, 2);
    assert!(outcome.events.iter().any(|event| matches!(
        event,
        Event::InteractableBlocked {
            kind: InteractionKind::Memory,
            ..
        }
    )));
}

fn replay(inputs: Vec<Input>) -> ReplayOutcome {
    let map = CollisionMap::shared();
    {
        let mut map = map.borrow_mut();
        let _ = map.register(Collider::fixed([GridPosition::new(1, -1)]));
        let _ = map.register(Collider::interactable(
            InteractionKind::Memory,
            [GridPosition::new(-1, 0)],
        ));
    }

    let mut controller = GridMovementController::new();
    controller.bind_avatar(Box::new(PoseRecorder::new(0.5)));
    controller.bind_collision_map(Rc::clone(&map));
    controller.register_bed_cell(0, 1);

    let mut events = Vec::new();
    let mut accepted = Vec::new();
    for input in inputs {
        match input {
            Input::Press(direction) => accepted.push(controller.enqueue_move(direction)),
            Input::Frames { count, dt } => {
                for _ in 0..count {
                    controller.update(dt, &mut events);
                }
            }
        }
    }

    let visual = controller.visual_position();
    ReplayOutcome {
        position: controller.logical_position(),
        in_bed: controller.is_in_bed(),
        visual_bits: [visual.x.to_bits(), visual.y.to_bits(), visual.z.to_bits()],
        facing_bits: controller.facing().to_bits(),
        accepted,
        events,
    }
}

fn scripted_inputs() -> Vec<Input> {
    let settle = Input::Frames {
        count: 60,
        dt: Duration::from_millis(16),
    };
    [
        Direction::Forward,
        Direction::Right,
        Direction::Left,
        Direction::Backward,
        Direction::Right,
        Direction::Backward,
        Direction::Backward,
    ]
    .into_iter()
    .flat_map(|direction| [Input::Press(direction), settle])
    .collect()
}

#[derive(Clone, Copy, Debug)]
enum Input {
    Press(Direction),
    Frames { count: u32, dt: Duration },
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ReplayOutcome {
    position: GridPosition,
    in_bed: bool,
    visual_bits: [u32; 3],
    facing_bits: u32,
    accepted: Vec<bool>,
    events: Vec<Event>,
}

impl ReplayOutcome {
    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}
