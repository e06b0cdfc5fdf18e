//! Per-frame draw list
//!
//! Turns the post-update run state into vertex batches and text items and
//! hands them to a [`RenderTarget`]. Layers are submitted back to front:
//! background, depth layers, walls, center, player, overlay.

use glam::Vec2;

use super::shapes;
use super::vertex::{colors, grayscale, Vertex};
use crate::consts::{FLASH_MAX, PLAYER_OFFSET, PLAYER_SIZE};
use crate::data::Color;
use crate::highscores::format_time;
use crate::settings::Settings;
use crate::sim::{RunState, SideGeometry};

/// Far enough to cover any screen
const BACKGROUND_RADIUS: f32 = 4000.0;
const CENTER_OUTLINE: f32 = 5.0;
const PLAYER_HALF_WIDTH: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Background,
    Depth,
    Walls,
    Center,
    Player,
    Overlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    Message,
    Hud,
    Debug,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub kind: TextKind,
    pub text: String,
    pub color: Color,
}

/// Draw submission boundary
pub trait RenderTarget {
    fn submit(&mut self, layer: Layer, vertices: &[Vertex]);
    fn text(&mut self, item: TextItem);
}

/// Target that keeps everything it receives; used headless and in tests
#[derive(Debug, Default, Clone)]
pub struct FrameCollector {
    pub batches: Vec<(Layer, Vec<Vertex>)>,
    pub texts: Vec<TextItem>,
}

impl FrameCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self, layer: Layer) -> usize {
        self.batches
            .iter()
            .filter(|(l, _)| *l == layer)
            .map(|(_, v)| v.len())
            .sum()
    }

    pub fn has_text(&self, kind: TextKind, needle: &str) -> bool {
        self.texts
            .iter()
            .any(|t| t.kind == kind && t.text.contains(needle))
    }

    pub fn clear(&mut self) {
        self.batches.clear();
        self.texts.clear();
    }
}

impl RenderTarget for FrameCollector {
    fn submit(&mut self, layer: Layer, vertices: &[Vertex]) {
        self.batches.push((layer, vertices.to_vec()));
    }

    fn text(&mut self, item: TextItem) {
        self.texts.push(item);
    }
}

/// Forward an externally built batch
pub fn forward(target: &mut dyn RenderTarget, layer: Layer, vertices: &[Vertex]) {
    if !vertices.is_empty() {
        target.submit(layer, vertices);
    }
}

/// HUD facts the run state does not carry
#[derive(Debug, Clone, Copy, Default)]
pub struct HudInfo {
    pub best_time: Option<f32>,
}

struct Palette<'a> {
    settings: &'a Settings,
}

impl Palette<'_> {
    fn apply(&self, color: Color) -> Color {
        if self.settings.black_and_white {
            grayscale(color)
        } else {
            color
        }
    }
}

/// Build and submit the whole frame for a run
pub fn render_run(run: &RunState, settings: &Settings, hud: &HudInfo, target: &mut dyn RenderTarget) {
    let palette = Palette { settings };
    let rotation = run.status.rotation;
    let geometry = run.geometry();

    forward(target, Layer::Background, &background(run, &geometry, rotation, &palette));

    let depth_mult = settings.effective_three_d(run.level.three_d_effect_multiplier);
    if depth_mult != 0.0 {
        forward(
            target,
            Layer::Depth,
            &depth_layers(run, &geometry, rotation, depth_mult, settings, &palette),
        );
    }

    let main = palette.apply(run.style.main_color);
    forward(target, Layer::Walls, &walls(run, &geometry, rotation, main));

    let mut center = shapes::polygon(run.status.radius, geometry.sides, rotation, palette.apply(run.style.color(0)));
    center.extend(shapes::polygon_outline(
        run.status.radius,
        CENTER_OUTLINE,
        geometry.sides,
        rotation,
        main,
    ));
    forward(target, Layer::Center, &center);

    forward(
        target,
        Layer::Player,
        &shapes::pointer(
            run.status.radius + PLAYER_OFFSET,
            PLAYER_SIZE,
            run.player.angle,
            PLAYER_HALF_WIDTH,
            rotation,
            main,
        ),
    );

    if settings.flash && run.status.flash_effect > 0.0 {
        let mut color = colors::FLASH;
        color[3] = (run.status.flash_effect / FLASH_MAX).clamp(0.0, 1.0);
        forward(target, Layer::Overlay, &shapes::fullscreen_quad(BACKGROUND_RADIUS, color));
    }

    texts(run, settings, hud, target);
}

fn background(run: &RunState, geometry: &SideGeometry, rotation: f32, palette: &Palette) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity(geometry.sides as usize * 3);
    for side in 0..geometry.sides {
        let from = geometry.side_start(side);
        vertices.extend(shapes::sector(
            BACKGROUND_RADIUS,
            from,
            from + geometry.span,
            rotation,
            palette.apply(run.style.color(side as usize)),
        ));
    }
    vertices
}

fn walls(run: &RunState, geometry: &SideGeometry, rotation: f32, color: Color) -> Vec<Vertex> {
    let level = &run.level;
    let floor = run.status.radius;
    let mut vertices = Vec::with_capacity(run.walls.len() * 6);
    for wall in &run.walls {
        let from = geometry.side_start(wall.side) - level.wall_angle_left;
        let to = geometry.side_start(wall.side) + geometry.span + level.wall_angle_right;
        let outer = wall.outer_distance();
        if outer <= floor {
            continue;
        }
        let inner_from = (wall.distance + level.wall_skew_left).clamp(floor, outer);
        let inner_to = (wall.distance + level.wall_skew_right).clamp(floor, outer);
        vertices.extend(shapes::band(inner_from, inner_to, outer, from, to, rotation, color));
    }
    vertices
}

fn depth_layers(
    run: &RunState,
    geometry: &SideGeometry,
    rotation: f32,
    mult: f32,
    settings: &Settings,
    palette: &Palette,
) -> Vec<Vertex> {
    let style = &run.style;
    let layers = style.three_d_depth.min(settings.three_d_max_depth);
    let step = style.three_d_skew * style.three_d_spacing * mult * run.status.pulse_3d.max(0.0) * 10.0;
    let mut vertices = Vec::new();
    // Farthest layer first
    for layer in (1..=layers).rev() {
        let color = palette.apply(style.depth_color(layer));
        let mut batch = walls(run, geometry, rotation, color);
        batch.extend(shapes::polygon_outline(
            run.status.radius,
            CENTER_OUTLINE,
            geometry.sides,
            rotation,
            color,
        ));
        shapes::translate(&mut batch, Vec2::new(0.0, -step * layer as f32));
        vertices.extend(batch);
    }
    vertices
}

fn texts(run: &RunState, settings: &Settings, hud: &HudInfo, target: &mut dyn RenderTarget) {
    if let Some(message) = run.timelines.messages.visible() {
        target.text(TextItem {
            kind: TextKind::Message,
            text: message.to_string(),
            color: colors::TEXT,
        });
    }

    let mut time = format_time(run.status.current_time);
    if let Some(best) = hud.best_time {
        time.push_str(&format!(" / best {}", format_time(best)));
    }
    target.text(TextItem {
        kind: TextKind::Hud,
        text: time,
        color: colors::TEXT,
    });

    if run.status.score_invalid {
        target.text(TextItem {
            kind: TextKind::Hud,
            text: "score invalid".to_string(),
            color: colors::WARNING,
        });
    }
    if settings.invincible {
        target.text(TextItem {
            kind: TextKind::Hud,
            text: "invincible".to_string(),
            color: colors::WARNING,
        });
    }

    if settings.debug_text {
        let effective = run.effective();
        let lines = [
            format!("difficulty {:.2}", run.status.difficulty_mult),
            format!("speed {:.2} delay {:.2}", effective.speed, effective.delay),
            format!("rotation {:.3}", effective.rotation),
            format!("sides {} walls {}", run.geometry().sides, run.walls.len()),
        ];
        for text in lines {
            target.text(TextItem {
                kind: TextKind::Debug,
                text,
                color: colors::TEXT,
            });
        }
    }
}
