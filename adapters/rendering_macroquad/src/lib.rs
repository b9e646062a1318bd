#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Commute.
//!
//! Scenes are drawn top-down: X runs right and Z runs down the screen. The
//! game has no sound, so macroquad is built without its `audio` feature.

use anyhow::Result;
use commute_core::{GridPosition, InteractionKind};
use commute_rendering::{
    AvatarPresentation, ColliderPresentation, FrameInput, MoveKey, Presentation,
    RenderingBackend, Scene,
};
use glam::Vec2;
use macroquad::input::{is_key_pressed, is_key_released, KeyCode};
use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

const MOVE_KEYS: [(KeyCode, MoveKey); 8] = [
    (KeyCode::W, MoveKey::W),
    (KeyCode::A, MoveKey::A),
    (KeyCode::S, MoveKey::S),
    (KeyCode::D, MoveKey::D),
    (KeyCode::Up, MoveKey::ArrowUp),
    (KeyCode::Down, MoveKey::ArrowDown),
    (KeyCode::Left, MoveKey::ArrowLeft),
    (KeyCode::Right, MoveKey::ArrowRight),
];

const NARRATION_BAND: f32 = 64.0;

/// Snapshot of edge-triggered keyboard shortcuts observed during a single frame.
#[derive(Clone, Copy, Debug, Default)]
struct KeyboardShortcuts {
    /// `Escape` quits the game loop.
    quit_requested: bool,
    /// `F3` toggles the debug overlay.
    toggle_debug: bool,
}

impl KeyboardShortcuts {
    fn poll() -> Self {
        Self {
            quit_requested: is_key_pressed(KeyCode::Escape),
            toggle_debug: is_key_pressed(KeyCode::F3),
        }
    }
}

/// Rendering backend implemented on top of macroquad.
#[derive(Debug, Default)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures whether the backend prints frame timing metrics once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct FrameBreakdown {
    frame: Duration,
    simulation: Duration,
    render: Duration,
}

#[derive(Debug, Default)]
struct FpsCounter {
    elapsed: Duration,
    frames: u32,
    frame_times: VecDeque<Duration>,
    window_duration: Duration,
    simulation_accum: Duration,
    render_accum: Duration,
}

#[derive(Clone, Copy, Debug)]
struct FpsMetrics {
    per_second: f32,
    trailing_ten_seconds: f32,
    avg_simulation: Duration,
    avg_render: Duration,
}

impl FpsCounter {
    /// Records a rendered frame and returns the per-second and trailing ten-second averages once
    /// one second has elapsed.
    fn record_frame(&mut self, breakdown: FrameBreakdown) -> Option<FpsMetrics> {
        self.elapsed += breakdown.frame;
        self.frames = self.frames.saturating_add(1);
        self.simulation_accum += breakdown.simulation;
        self.render_accum += breakdown.render;

        self.frame_times.push_back(breakdown.frame);
        self.window_duration += breakdown.frame;

        let trailing_window = Duration::from_secs(10);
        while self.window_duration > trailing_window {
            if let Some(removed) = self.frame_times.pop_front() {
                self.window_duration = self.window_duration.saturating_sub(removed);
            } else {
                break;
            }
        }

        if self.elapsed < Duration::from_secs(1) {
            return None;
        }

        let seconds = self.elapsed.as_secs_f32();
        let frames = self.frames.max(1);
        let per_second = self.frames as f32 / seconds;
        let window_seconds = self.window_duration.as_secs_f32();
        let trailing_ten_seconds = if window_seconds <= f32::EPSILON {
            per_second
        } else {
            self.frame_times.len() as f32 / window_seconds
        };
        let metrics = FpsMetrics {
            per_second,
            trailing_ten_seconds,
            avg_simulation: self.simulation_accum / frames,
            avg_render: self.render_accum / frames,
        };

        self.elapsed = Duration::ZERO;
        self.frames = 0;
        self.simulation_accum = Duration::ZERO;
        self.render_accum = Duration::ZERO;
        Some(metrics)
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
        } = self;

        let Presentation {
            window_title,
            clear_color,
            scene,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: 960,
            window_height: 720,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        macroquad::Window::from_config(config, async move {
            let mut scene = scene;
            let background = to_macroquad_color(clear_color);
            let mut fps_counter = FpsCounter::default();

            loop {
                let keyboard = KeyboardShortcuts::poll();
                if keyboard.quit_requested {
                    break;
                }

                macroquad::window::clear_background(background);

                let dt_seconds = macroquad::time::get_frame_time();
                let frame_dt = Duration::from_secs_f32(dt_seconds.max(0.0));
                let frame_input = gather_frame_input(keyboard);

                let simulation_start = Instant::now();
                update_scene(frame_dt, frame_input, &mut scene);
                let simulation = simulation_start.elapsed();

                let screen_width = macroquad::window::screen_width();
                let screen_height = macroquad::window::screen_height();
                let metrics = SceneMetrics::from_scene(&scene, screen_width, screen_height);

                let render_start = Instant::now();
                draw_floor(&scene, &metrics);
                draw_colliders(&scene.colliders, &metrics);
                if let Some(bed) = scene.bed {
                    draw_bed(bed, &metrics);
                }
                draw_avatar(&scene.avatar, &metrics);
                draw_captions(&scene, screen_height);
                if scene.debug_visible {
                    draw_debug_overlay(&scene);
                }
                let render = render_start.elapsed();

                let fps_metrics = fps_counter.record_frame(FrameBreakdown {
                    frame: frame_dt,
                    simulation,
                    render,
                });
                if show_fps {
                    if let Some(FpsMetrics {
                        per_second,
                        trailing_ten_seconds,
                        avg_simulation,
                        avg_render,
                    }) = fps_metrics
                    {
                        println!(
                            "FPS: {:.2} (10s avg: {:.2}) | sim: {:>6.2}ms render: {:>6.2}ms",
                            per_second,
                            trailing_ten_seconds,
                            avg_simulation.as_secs_f64() * 1_000.0,
                            avg_render.as_secs_f64() * 1_000.0,
                        );
                    }
                }

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

fn gather_frame_input(keyboard: KeyboardShortcuts) -> FrameInput {
    frame_input_from_observations(is_key_pressed, is_key_released, keyboard.toggle_debug)
}

fn frame_input_from_observations<P, R>(pressed: P, released: R, toggle_debug: bool) -> FrameInput
where
    P: Fn(KeyCode) -> bool,
    R: Fn(KeyCode) -> bool,
{
    FrameInput {
        pressed: MOVE_KEYS
            .iter()
            .filter(|(code, _)| pressed(*code))
            .map(|(_, key)| *key)
            .collect(),
        released: MOVE_KEYS
            .iter()
            .filter(|(code, _)| released(*code))
            .map(|(_, key)| *key)
            .collect(),
        toggle_debug,
    }
}

#[derive(Clone, Copy, Debug)]
struct SceneMetrics {
    offset_x: f32,
    offset_y: f32,
    cell_step: f32,
    columns: u32,
    rows: u32,
    world_to_cells: f32,
}

impl SceneMetrics {
    fn from_scene(scene: &Scene, screen_width: f32, screen_height: f32) -> Self {
        let grid = scene.grid;
        let available_height = (screen_height - NARRATION_BAND).max(0.0);
        let columns = grid.columns.max(1) as f32;
        let rows = grid.rows.max(1) as f32;
        let cell_step = (screen_width / columns).min(available_height / rows);

        Self {
            offset_x: ((screen_width - cell_step * columns) * 0.5).max(0.0),
            offset_y: ((available_height - cell_step * rows) * 0.5).max(0.0),
            cell_step,
            columns: grid.columns,
            rows: grid.rows,
            world_to_cells: 1.0 / grid.cell_size,
        }
    }

    fn cell_origin(&self, cell: GridPosition) -> Vec2 {
        Vec2::new(
            self.offset_x + cell.x() as f32 * self.cell_step,
            self.offset_y + cell.z() as f32 * self.cell_step,
        )
    }

    /// Screen position of the centre of the avatar.
    fn avatar_center(&self, avatar: &AvatarPresentation) -> Vec2 {
        let x = avatar.position.x * self.world_to_cells + 0.5;
        let z = avatar.position.z * self.world_to_cells + 0.5;
        Vec2::new(
            self.offset_x + x * self.cell_step,
            self.offset_y + z * self.cell_step,
        )
    }
}

/// Heading of `yaw` projected onto the screen plane.
fn facing_vector(yaw: f32) -> Vec2 {
    Vec2::new(yaw.sin(), yaw.cos())
}

fn collider_color(collider: &ColliderPresentation) -> commute_rendering::Color {
    use commute_rendering::Color;

    match collider.interaction {
        None => Color::from_rgb_u8(72, 72, 84),
        Some(InteractionKind::Bed) => Color::from_rgb_u8(120, 96, 160),
        Some(InteractionKind::Door) => Color::from_rgb_u8(150, 105, 60),
        Some(InteractionKind::Elevator) => Color::from_rgb_u8(140, 150, 160),
        Some(InteractionKind::Memory) => Color::from_rgb_u8(230, 190, 80),
    }
}

fn draw_floor(scene: &Scene, metrics: &SceneMetrics) {
    let floor = to_macroquad_color(scene.grid.floor_color);
    let lines = to_macroquad_color(scene.grid.floor_color.lighten(0.15));
    let width = metrics.columns as f32 * metrics.cell_step;
    let height = metrics.rows as f32 * metrics.cell_step;
    macroquad::shapes::draw_rectangle(metrics.offset_x, metrics.offset_y, width, height, floor);

    for column in 0..=metrics.columns {
        let x = metrics.offset_x + column as f32 * metrics.cell_step;
        macroquad::shapes::draw_line(x, metrics.offset_y, x, metrics.offset_y + height, 1.0, lines);
    }
    for row in 0..=metrics.rows {
        let y = metrics.offset_y + row as f32 * metrics.cell_step;
        macroquad::shapes::draw_line(metrics.offset_x, y, metrics.offset_x + width, y, 1.0, lines);
    }
}

fn draw_colliders(colliders: &[ColliderPresentation], metrics: &SceneMetrics) {
    for collider in colliders {
        let origin = metrics.cell_origin(collider.cell);
        macroquad::shapes::draw_rectangle(
            origin.x,
            origin.y,
            metrics.cell_step,
            metrics.cell_step,
            to_macroquad_color(collider_color(collider)),
        );
    }
}

fn draw_bed(bed: GridPosition, metrics: &SceneMetrics) {
    let origin = metrics.cell_origin(bed);
    let inset = metrics.cell_step * 0.1;
    macroquad::shapes::draw_rectangle(
        origin.x + inset,
        origin.y + inset,
        metrics.cell_step - 2.0 * inset,
        metrics.cell_step - 2.0 * inset,
        to_macroquad_color(commute_rendering::Color::from_rgb_u8(190, 200, 230)),
    );
}

fn draw_avatar(avatar: &AvatarPresentation, metrics: &SceneMetrics) {
    let center = metrics.avatar_center(avatar);
    let radius = metrics.cell_step * (0.3 + 0.08 * avatar.lying);
    let body = to_macroquad_color(commute_rendering::Color::from_rgb_u8(220, 90, 80));
    macroquad::shapes::draw_circle(center.x, center.y, radius, body);

    let tip = center + facing_vector(avatar.yaw) * radius;
    macroquad::shapes::draw_line(
        center.x,
        center.y,
        tip.x,
        tip.y,
        3.0,
        macroquad::color::WHITE,
    );
}

fn draw_captions(scene: &Scene, screen_height: f32) {
    let _ = macroquad::text::draw_text(&scene.title, 12.0, 24.0, 24.0, macroquad::color::WHITE);
    if let Some(line) = &scene.narration {
        let _ = macroquad::text::draw_text(
            line,
            12.0,
            screen_height - NARRATION_BAND * 0.4,
            26.0,
            macroquad::color::LIGHTGRAY,
        );
    }
}

fn draw_debug_overlay(scene: &Scene) {
    let Some(overlay) = &scene.debug else {
        return;
    };
    for (index, line) in overlay.lines().iter().enumerate() {
        let _ = macroquad::text::draw_text(
            line,
            12.0,
            52.0 + index as f32 * 20.0,
            20.0,
            macroquad::color::YELLOW,
        );
    }
}

fn to_macroquad_color(color: commute_rendering::Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use commute_rendering::{Color, GridPresentation};
    use glam::Vec3;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn scene(columns: u32, rows: u32, cell_size: f32) -> Scene {
        let grid = GridPresentation::new(columns, rows, cell_size, Color::from_rgb_u8(0, 0, 0))
            .expect("valid grid");
        Scene::new("test", grid)
    }

    fn assert_vec2_close(actual: Vec2, expected: Vec2) {
        assert!(
            (actual - expected).abs().max_element() <= 1e-4,
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn frame_input_collects_movement_keys_in_stable_order() {
        let input = frame_input_from_observations(
            |code| matches!(code, KeyCode::Right | KeyCode::W),
            |code| code == KeyCode::S,
            true,
        );

        assert_eq!(input.pressed, vec![MoveKey::W, MoveKey::ArrowRight]);
        assert_eq!(input.released, vec![MoveKey::S]);
        assert!(input.toggle_debug);
    }

    #[test]
    fn scene_metrics_fit_grid_above_narration_band() {
        let metrics = SceneMetrics::from_scene(&scene(8, 4, 1.0), 800.0, 464.0);

        assert_eq!(metrics.cell_step, 100.0);
        assert_eq!(metrics.offset_x, 0.0);
        assert_eq!(metrics.offset_y, 0.0);
        assert_vec2_close(
            metrics.cell_origin(GridPosition::new(2, 3)),
            Vec2::new(200.0, 300.0),
        );
    }

    #[test]
    fn avatar_center_scales_world_units_to_cells() {
        let metrics = SceneMetrics::from_scene(&scene(4, 4, 2.0), 400.0, 464.0);
        let avatar = AvatarPresentation {
            position: Vec3::new(2.0, 0.5, 4.0),
            yaw: 0.0,
            lying: 0.0,
        };

        assert_vec2_close(metrics.avatar_center(&avatar), Vec2::new(150.0, 250.0));
    }

    #[test]
    fn facing_vector_matches_grid_directions() {
        assert_vec2_close(facing_vector(0.0), Vec2::new(0.0, 1.0));
        assert_vec2_close(facing_vector(PI), Vec2::new(0.0, -1.0));
        assert_vec2_close(facing_vector(FRAC_PI_2), Vec2::new(1.0, 0.0));
        assert_vec2_close(facing_vector(-FRAC_PI_2), Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn memories_stand_out_from_obstacles() {
        let wall = ColliderPresentation {
            cell: GridPosition::new(0, 0),
            interaction: None,
        };
        let memory = ColliderPresentation {
            interaction: Some(InteractionKind::Memory),
            ..wall
        };
        assert_ne!(collider_color(&wall), collider_color(&memory));
    }

    #[test]
    fn fps_counter_reports_average_frames_per_second() {
        let mut counter = FpsCounter::default();
        let frame = FrameBreakdown {
            frame: Duration::from_millis(100),
            simulation: Duration::from_millis(2),
            render: Duration::from_millis(4),
        };

        for _ in 0..9 {
            assert!(counter.record_frame(frame).is_none());
        }
        let metrics = counter.record_frame(frame).expect("one second elapsed");

        assert!((metrics.per_second - 10.0).abs() < 1e-3);
        assert!((metrics.trailing_ten_seconds - 10.0).abs() < 1e-3);
        assert_eq!(metrics.avg_simulation, Duration::from_millis(2));
        assert_eq!(metrics.avg_render, Duration::from_millis(4));
    }
}
