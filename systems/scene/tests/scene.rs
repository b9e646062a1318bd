use std::time::Duration;

use commute_core::{Direction, GridPosition, SceneId};
use commute_system_movement::{GridMovementController, PoseRecorder};
use commute_system_scene::{SceneCue, SceneDirector, SceneLayout};

const FRAME: Duration = Duration::from_millis(16);

fn director_with(scene: SceneId) -> (SceneDirector, GridMovementController) {
    let mut controller = GridMovementController::new();
    controller.bind_avatar(Box::new(PoseRecorder::new(0.5)));
    let mut director = SceneDirector::new();
    director.load(
        SceneLayout::builtin(scene).expect("builtin layout"),
        &mut controller,
    );
    (director, controller)
}

fn walk(
    director: &mut SceneDirector,
    controller: &mut GridMovementController,
    moves: &[Direction],
) -> Vec<SceneCue> {
    let mut cues = Vec::new();
    for direction in moves {
        assert!(controller.enqueue_move(*direction), "{direction:?} rejected");
        for _ in 0..500 {
            let mut events = Vec::new();
            controller.update(FRAME, &mut events);
            cues.extend(director.handle(&events));
            let settled = !controller.is_stepping()
                && !controller.is_bumping()
                && !controller.is_bed_transitioning()
                && controller.queue_depth() == 0;
            if settled {
                break;
            }
        }
    }
    cues
}

#[test]
fn load_places_avatar_on_spawn_and_registers_bed() {
    let (director, controller) = director_with(SceneId::Apartment);

    assert_eq!(director.active_scene(), Some(SceneId::Apartment));
    assert_eq!(controller.logical_position(), GridPosition::new(1, 1));
    assert_eq!(controller.bed_cell(), Some(GridPosition::new(5, 3)));

    let map = director.collision_map();
    let map = map.borrow();
    assert!(!map.is_walkable(0, 0));
    assert!(!map.is_walkable(2, 2));
    assert!(map.is_walkable(6, 1));
}

#[test]
fn reaching_the_front_door_advances_to_the_street() {
    let (mut director, mut controller) = director_with(SceneId::Apartment);

    let cues = walk(&mut director, &mut controller, &[Direction::Right; 5]);

    assert_eq!(controller.logical_position(), GridPosition::new(6, 1));
    assert_eq!(
        cues,
        vec![
            SceneCue::Narration("The coffee machine is still warm.".to_owned()),
            SceneCue::Narration("You lock the door behind you.".to_owned()),
            SceneCue::AdvanceScene(SceneId::Street),
        ]
    );
}

#[test]
fn bumping_a_memory_recalls_it_once() {
    let (mut director, mut controller) = director_with(SceneId::Apartment);

    let cues = walk(
        &mut director,
        &mut controller,
        &[Direction::Backward, Direction::Right, Direction::Right],
    );

    assert_eq!(controller.logical_position(), GridPosition::new(1, 2));
    assert_eq!(cues.len(), 1);
    assert!(matches!(&cues[0], SceneCue::Memory { text, .. } if text.contains("lake house")));
    assert_eq!(director.script().map(|script| script.recalled_count()), Some(1));
}

#[test]
fn stepping_onto_the_bed_lies_down() {
    let (mut director, mut controller) = director_with(SceneId::Apartment);

    let _ = walk(
        &mut director,
        &mut controller,
        &[
            Direction::Right,
            Direction::Right,
            Direction::Right,
            Direction::Right,
            Direction::Backward,
            Direction::Backward,
        ],
    );

    assert_eq!(controller.logical_position(), GridPosition::new(5, 3));
    assert!(controller.is_in_bed());
    assert_eq!(controller.bed_transition(), 1.0);
}

#[test]
fn loading_the_next_scene_resets_the_controller() {
    let (mut director, mut controller) = director_with(SceneId::Apartment);
    controller.set_logical_position(5, 2);
    let _ = walk(&mut director, &mut controller, &[Direction::Backward]);
    assert!(controller.is_in_bed());

    director.load(
        SceneLayout::builtin(SceneId::Street).expect("builtin layout"),
        &mut controller,
    );

    assert_eq!(director.active_scene(), Some(SceneId::Street));
    assert_eq!(controller.logical_position(), GridPosition::new(0, 1));
    assert!(!controller.is_in_bed());
    assert_eq!(controller.bed_transition(), 0.0);
    assert_eq!(controller.bed_cell(), None);

    let map = director.collision_map();
    let map = map.borrow();
    assert!(map.is_walkable(2, 2), "apartment colliders must not leak");
    assert!(!map.is_walkable(5, 1));
}

#[test]
fn unload_clears_map_and_silences_script() {
    let (mut director, mut controller) = director_with(SceneId::Lobby);

    assert_eq!(director.unload(&mut controller), Some(SceneId::Lobby));
    assert_eq!(director.unload(&mut controller), None);
    assert!(director.collision_map().borrow().is_empty());
    assert_eq!(director.active_scene(), None);

    let cues = walk(&mut director, &mut controller, &[Direction::Forward]);
    assert!(cues.is_empty());
}

#[test]
fn lobby_elevator_leads_to_the_office() {
    let (mut director, mut controller) = director_with(SceneId::Lobby);

    let cues = walk(
        &mut director,
        &mut controller,
        &[
            Direction::Forward,
            Direction::Forward,
            Direction::Right,
            Direction::Forward,
            Direction::Right,
            Direction::Forward,
            Direction::Forward,
        ],
    );

    assert_eq!(controller.logical_position(), GridPosition::new(5, 1));
    assert_eq!(
        cues,
        vec![
            SceneCue::Narration("The receptionist nods without looking up.".to_owned()),
            SceneCue::Narration("The elevator chimes.".to_owned()),
            SceneCue::AdvanceScene(SceneId::Office),
        ]
    );
}

#[test]
fn office_goal_completes_the_journey() {
    let (mut director, mut controller) = director_with(SceneId::Office);

    let cues = walk(
        &mut director,
        &mut controller,
        &[
            Direction::Forward,
            Direction::Forward,
            Direction::Forward,
            Direction::Right,
            Direction::Right,
            Direction::Right,
        ],
    );

    assert_eq!(controller.logical_position(), GridPosition::new(4, 1));
    assert_eq!(cues.last(), Some(&SceneCue::JourneyComplete));
}
