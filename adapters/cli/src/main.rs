#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the Commute experience.

mod journey;

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use commute_core::{Event, SceneId, WELCOME_BANNER};
use commute_rendering::{Color, MoveKey, Presentation, RenderingBackend};
use commute_rendering_macroquad::MacroquadBackend;
use commute_system_movement::MovementTuning;
use commute_system_scene::SceneCue;

use self::journey::Journey;

/// Upper bound on frames simulated per scripted move before giving up.
const MAX_FRAMES_PER_MOVE: u32 = 10_000;

/// Walk to work, one cell at a time.
#[derive(Debug, Parser)]
#[command(name = "commute", version)]
struct Args {
    /// Scene to start in.
    #[arg(long, default_value = "apartment")]
    scene: SceneId,
    /// TOML file overriding movement tuning.
    #[arg(long)]
    tuning: Option<PathBuf>,
    /// Run without a window, replaying `--moves`.
    #[arg(long)]
    headless: bool,
    /// Scripted moves as a string of W/A/S/D letters.
    #[arg(long, default_value = "")]
    moves: String,
    /// Fixed frame length in milliseconds for headless runs.
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,
    /// Synchronise presentation with the display refresh rate.
    #[arg(long)]
    vsync: bool,
    /// Print frame timing once per second.
    #[arg(long)]
    show_fps: bool,
}

/// Entry point for the Commute command-line interface.
fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    println!("{WELCOME_BANNER}");

    let tuning = match &args.tuning {
        Some(path) => load_tuning(path)?,
        None => MovementTuning::default(),
    };
    log::info!("starting in {} with {tuning:?}", args.scene);

    if args.headless {
        run_headless(&args, tuning)
    } else {
        run_windowed(&args, tuning)
    }
}

fn load_tuning(path: &Path) -> Result<MovementTuning> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read tuning file {}", path.display()))?;
    MovementTuning::from_toml_str(&source)
        .with_context(|| format!("invalid tuning file {}", path.display()))
}

fn parse_moves(moves: &str) -> Result<Vec<MoveKey>> {
    moves
        .chars()
        .filter(|letter| !letter.is_whitespace())
        .map(|letter| {
            MoveKey::from_letter(letter)
                .ok_or_else(|| anyhow!("unexpected move `{letter}`; use W, A, S or D"))
        })
        .collect()
}

fn run_headless(args: &Args, tuning: MovementTuning) -> Result<()> {
    if args.frame_ms == 0 {
        bail!("--frame-ms must be positive");
    }
    let keys = parse_moves(&args.moves)?;
    let frame = Duration::from_millis(args.frame_ms);
    let mut journey = Journey::new(tuning, args.scene)?;

    for key in keys {
        if journey.press(&[key]) == 0 {
            println!("move {:?} dropped", key.direction());
        }
        journey.release(&[key]);

        let mut frames = 0;
        loop {
            let report = journey.advance(frame)?;
            for event in &report.events {
                println!("{}", describe_event(event));
            }
            for cue in &report.cues {
                println!("{}", describe_cue(cue));
            }
            if journey.is_settled() || journey.is_complete() {
                break;
            }
            frames += 1;
            if frames >= MAX_FRAMES_PER_MOVE {
                bail!("movement did not settle after {frames} frames");
            }
        }

        if journey.is_complete() {
            break;
        }
    }

    let controller = journey.controller();
    println!(
        "finished in {} at {}{}",
        journey
            .active_scene()
            .map_or_else(|| "no scene".to_owned(), |scene| scene.to_string()),
        controller.logical_position(),
        if controller.is_in_bed() { " (in bed)" } else { "" },
    );
    Ok(())
}

fn run_windowed(args: &Args, tuning: MovementTuning) -> Result<()> {
    let mut journey = Journey::new(tuning, args.scene)?;
    let scene = journey.snapshot()?;
    let presentation = Presentation::new("Commute", Color::from_rgb_u8(14, 14, 20), scene);

    MacroquadBackend::new()
        .with_vsync(args.vsync)
        .with_show_fps(args.show_fps)
        .run(presentation, move |dt, input, scene| {
            journey.release(&input.released);
            let _ = journey.press(&input.pressed);
            if input.toggle_debug {
                scene.debug_visible = !scene.debug_visible;
            }

            match journey.advance(dt) {
                Ok(report) => {
                    for cue in &report.cues {
                        match cue {
                            SceneCue::Narration(line) => scene.narrate(line.clone()),
                            SceneCue::Memory { text, .. } => scene.narrate(text.clone()),
                            SceneCue::JourneyComplete => scene.narrate("You made it."),
                            SceneCue::AdvanceScene(_) => {}
                        }
                    }
                }
                Err(error) => log::error!("frame failed: {error:#}"),
            }

            if let Err(error) = journey.present(scene) {
                log::error!("failed to present scene: {error:#}");
            }
        })
        .context("rendering backend failed")
}

fn describe_event(event: &Event) -> String {
    match event {
        Event::MoveCompleted {
            position,
            direction,
        } => format!("moved {direction:?} to {position}"),
        Event::MoveBlocked {
            from,
            direction,
            blocked,
        } => format!("bumped {direction:?} from {from} into {blocked}"),
        Event::InteractableBlocked { kind, cell, .. } => format!("touched {kind:?} at {cell}"),
        Event::BedStateChanged { in_bed: true } => "lying down".to_owned(),
        Event::BedStateChanged { in_bed: false } => "getting up".to_owned(),
        Event::SpecialCellEntered { cell, tag } => format!("entered {tag} at {cell}"),
    }
}

fn describe_cue(cue: &SceneCue) -> String {
    match cue {
        SceneCue::Narration(line) => format!("> {line}"),
        SceneCue::Memory { text, .. } => format!("> (memory) {text}"),
        SceneCue::AdvanceScene(next) => format!("-- entering {next} --"),
        SceneCue::JourneyComplete => "-- journey complete --".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_moves_accepts_mixed_case_and_spaces() {
        let keys = parse_moves("wA s d").expect("valid moves");
        assert_eq!(keys, vec![MoveKey::W, MoveKey::A, MoveKey::S, MoveKey::D]);
    }

    #[test]
    fn parse_moves_rejects_unknown_letters() {
        assert!(parse_moves("wq").is_err());
    }

    #[test]
    fn args_parse_scene_names() {
        let args = Args::try_parse_from(["commute", "--scene", "office", "--headless"])
            .expect("valid arguments");
        assert_eq!(args.scene, SceneId::Office);
        assert!(args.headless);
        assert_eq!(args.frame_ms, 16);

        assert!(Args::try_parse_from(["commute", "--scene", "moon"]).is_err());
    }
}
