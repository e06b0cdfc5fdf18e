//! Hexagon Core - gameplay engine for a rotating-hexagon arcade level
//!
//! Core modules:
//! - `sim`: Per-frame simulation (status, timelines, difficulty, walls, update driver)
//! - `script`: Level scripting host (rhai) with a queued script -> host surface
//! - `game`: Level lifecycle (new game, death, restart, menu hand-off)
//! - `renderer`: Draw-list generation for the render collaborator
//! - `data`: Level, style and music parameter sets
//! - `assets`, `audio`, `highscores`, `settings`: collaborator boundaries

pub mod assets;
pub mod audio;
pub mod data;
pub mod game;
pub mod highscores;
pub mod renderer;
pub mod script;
pub mod settings;
pub mod sim;

pub use assets::{AssetProvider, DirAssets, LoadError, MemoryAssets};
pub use data::{LevelData, MusicData, StyleData};
pub use game::{Collaborators, DeathReason, HexagonGame, MenuHandle, RunPhase, RunResult};
pub use highscores::{ScoreBoard, ScoreKey, ScoreSink};
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
///
/// Level data is authored in 60 Hz frame units by tradition; everything here
/// is already converted to seconds.
pub mod consts {
    /// Fixed simulation timestep used by the bundled frame driver
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Smallest side count that still closes a polygon
    pub const MIN_SIDES: u32 = 3;
    pub const MAX_SIDES: u32 = 64;

    /// Walls spawn this far from the center and travel inward
    pub const WALL_SPAWN_DISTANCE: f32 = 1600.0;
    /// Wall travel speed (units/s) at an effective speed of 1.0
    pub const WALL_SPEED_UNIT: f32 = 300.0;
    pub const MAX_WALL_THICKNESS: f32 = WALL_SPAWN_DISTANCE;

    /// Player sits this far outside the pulsing center radius
    pub const PLAYER_OFFSET: f32 = 7.3;
    /// Player triangle half-width for rendering
    pub const PLAYER_SIZE: f32 = 7.3;
    /// Player angular speed (degrees/s)
    pub const PLAYER_SPEED: f32 = 567.0;
    /// Player angular speed while focused (degrees/s)
    pub const PLAYER_FOCUS_SPEED: f32 = 277.5;
    /// Minimum time between two 180 degree swaps
    pub const SWAP_COOLDOWN: f32 = 0.6;

    /// Camera rotation (degrees/s) for a rotation speed of 1.0
    pub const ROTATION_UNIT: f32 = 600.0;
    /// Extra rotation (degrees/s) at the peak of a fast spin
    pub const FAST_SPIN_UNIT: f32 = 17.0 / 3.5 * 60.0;

    /// Full-intensity screen flash
    pub const FLASH_MAX: f32 = 255.0;
    /// Flash decay per second
    pub const FLASH_DECAY: f32 = 180.0;
    /// Beat pulse decay per second
    pub const BEAT_PULSE_DECAY: f32 = 120.0;
}

/// Normalize an angle in degrees to [0, 360)
#[inline]
pub fn normalize_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Convert polar (r, degrees) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, degrees: f32) -> Vec2 {
    let theta = degrees.to_radians();
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Smootherstep between `edge0` and `edge1`
pub fn smoother_step(edge0: f32, edge1: f32, x: f32) -> f32 {
    if (edge1 - edge0).abs() <= f32::EPSILON {
        return if x >= edge1 { 1.0 } else { 0.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}
