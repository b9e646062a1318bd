//! Narration and progression rules reacting to movement events.

use std::collections::{BTreeMap, BTreeSet};

use commute_core::{ColliderId, Event, GridPosition, InteractionKind, SceneId};

use crate::layout::SceneLayout;

/// Instruction emitted by a scene script for the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SceneCue {
    /// Show a line of narration.
    Narration(String),
    /// A memory was recalled by bumping into its collider.
    Memory {
        /// Collider that holds the memory.
        collider: ColliderId,
        /// Recalled line.
        text: String,
    },
    /// Load the given scene next.
    AdvanceScene(SceneId),
    /// The final goal was reached.
    JourneyComplete,
}

#[derive(Clone, Debug)]
struct Trigger {
    narration: Option<String>,
    once: bool,
    goal: bool,
    fired: bool,
}

/// Per-scene trigger state. Built fresh each time a scene loads.
#[derive(Clone, Debug)]
pub struct SceneScript {
    scene: SceneId,
    triggers: BTreeMap<GridPosition, Vec<Trigger>>,
    memories: BTreeMap<ColliderId, String>,
    recalled: BTreeSet<ColliderId>,
}

impl SceneScript {
    /// Creates a script without memories for `layout`.
    #[must_use]
    pub fn new(layout: &SceneLayout) -> Self {
        let mut triggers: BTreeMap<GridPosition, Vec<Trigger>> = BTreeMap::new();
        for trigger in layout.triggers() {
            triggers.entry(trigger.cell()).or_default().push(Trigger {
                narration: trigger.narration().map(str::to_owned),
                once: trigger.once(),
                goal: trigger.goal(),
                fired: false,
            });
        }

        Self {
            scene: layout.id(),
            triggers,
            memories: BTreeMap::new(),
            recalled: BTreeSet::new(),
        }
    }

    /// Attaches the line recalled when `collider` is first bumped.
    pub fn add_memory(&mut self, collider: ColliderId, text: String) {
        let _ = self.memories.insert(collider, text);
    }

    /// Number of memories recalled so far in this scene.
    #[must_use]
    pub fn recalled_count(&self) -> usize {
        self.recalled.len()
    }

    /// Translates movement events into cues, in event order.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<SceneCue>) {
        for event in events {
            match event {
                Event::MoveCompleted { position, .. } => self.arrive(*position, out),
                Event::InteractableBlocked {
                    collider,
                    kind: InteractionKind::Memory,
                    ..
                } => self.recall(*collider, out),
                _ => {}
            }
        }
    }

    fn arrive(&mut self, cell: GridPosition, out: &mut Vec<SceneCue>) {
        let Some(triggers) = self.triggers.get_mut(&cell) else {
            return;
        };

        for trigger in triggers.iter_mut() {
            if trigger.once && trigger.fired {
                continue;
            }
            trigger.fired = true;

            if let Some(line) = &trigger.narration {
                out.push(SceneCue::Narration(line.clone()));
            }
            if trigger.goal {
                out.push(match self.scene.next() {
                    Some(next) => SceneCue::AdvanceScene(next),
                    None => SceneCue::JourneyComplete,
                });
            }
        }
    }

    fn recall(&mut self, collider: ColliderId, out: &mut Vec<SceneCue>) {
        let Some(text) = self.memories.get(&collider) else {
            return;
        };
        if self.recalled.insert(collider) {
            log::info!("memory recalled in {}: {text}", self.scene);
            out.push(SceneCue::Memory {
                collider,
                text: text.clone(),
            });
        }
    }
}
