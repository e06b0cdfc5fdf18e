//! Level parameters
//!
//! Everything a level file declares about pacing, geometry and the static event
//! schedule. Time-based values are in seconds, rates are per second.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{MAX_SIDES, MIN_SIDES};
use crate::sim::events::TimedEvent;

/// Rejected level value mutation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LevelValueError {
    #[error("unknown level value `{0}`")]
    Unknown(String),
    #[error("level value `{name}` rejected non-finite input {value}")]
    NonFinite { name: String, value: f32 },
    #[error("level value `{0}` cannot be divided by zero")]
    DivideByZero(String),
}

/// Names accepted by [`LevelData::set_value`] / [`LevelData::value`]
pub const LEVEL_VALUE_NAMES: &[&str] = &[
    "speed_multiplier",
    "speed_increment",
    "delay_multiplier",
    "delay_increment",
    "rotation_speed",
    "rotation_increment",
    "rotation_speed_max",
    "fast_spin",
    "increment_time",
    "difficulty_increment",
    "sides",
    "sides_min",
    "sides_max",
    "wall_skew_left",
    "wall_skew_right",
    "wall_angle_left",
    "wall_angle_right",
    "radius_min",
    "pulse_min",
    "pulse_max",
    "pulse_speed",
    "pulse_speed_r",
    "pulse_delay_max",
    "pulse_delay_half_max",
    "beat_pulse_max",
    "beat_pulse_delay_max",
    "3d_effect_multiplier",
];

/// Static level parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelData {
    pub id: String,
    pub name: String,
    pub description: String,
    pub author: String,

    /// Style used for colors and 3D layers
    pub style_id: String,
    /// Music track started with the run
    pub music_id: String,
    /// Script source loaded at level start (path understood by the asset provider)
    pub script_file: Option<String>,

    pub speed_multiplier: f32,
    /// Added to `speed_multiplier` on every difficulty increment
    pub speed_increment: f32,
    pub delay_multiplier: f32,
    /// Added to `delay_multiplier` on every difficulty increment
    pub delay_increment: f32,
    pub rotation_speed: f32,
    /// Added to `|rotation_speed|` on every difficulty increment
    pub rotation_increment: f32,
    /// Cap for `|rotation_speed|`; zero means uncapped
    pub rotation_speed_max: f32,
    /// Duration of the fast spin that follows an increment
    pub fast_spin: f32,
    /// Survival time between difficulty increments
    pub increment_time: f32,
    /// Added to the difficulty multiplier on every increment
    pub difficulty_increment: f32,

    pub sides: u32,
    /// Range used for random side changes
    pub sides_min: u32,
    pub sides_max: u32,

    pub wall_skew_left: f32,
    pub wall_skew_right: f32,
    pub wall_angle_left: f32,
    pub wall_angle_right: f32,

    pub radius_min: f32,
    pub pulse_min: f32,
    pub pulse_max: f32,
    /// Pulse growth per second
    pub pulse_speed: f32,
    /// Pulse shrink per second
    pub pulse_speed_r: f32,
    pub pulse_delay_max: f32,
    pub pulse_delay_half_max: f32,
    pub beat_pulse_max: f32,
    /// Beat period when the music declares no BPM
    pub beat_pulse_delay_max: f32,

    #[serde(rename = "3d_effect_multiplier")]
    pub three_d_effect_multiplier: f32,

    /// Allow the 180 degree swap input
    pub swap_enabled: bool,

    /// Static event schedule, offsets relative to level start
    pub events: Vec<TimedEvent>,
}

impl Default for LevelData {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            description: String::new(),
            author: String::new(),
            style_id: String::new(),
            music_id: String::new(),
            script_file: None,
            speed_multiplier: 1.0,
            speed_increment: 0.0,
            delay_multiplier: 1.0,
            delay_increment: 0.0,
            rotation_speed: 0.0,
            rotation_increment: 0.0,
            rotation_speed_max: 0.0,
            fast_spin: 0.0,
            increment_time: 15.0,
            difficulty_increment: 0.1,
            sides: 6,
            sides_min: 6,
            sides_max: 6,
            wall_skew_left: 0.0,
            wall_skew_right: 0.0,
            wall_angle_left: 0.0,
            wall_angle_right: 0.0,
            radius_min: 72.0,
            pulse_min: 75.0,
            pulse_max: 80.0,
            pulse_speed: 0.0,
            pulse_speed_r: 0.0,
            pulse_delay_max: 0.0,
            pulse_delay_half_max: 0.0,
            beat_pulse_max: 0.0,
            beat_pulse_delay_max: 0.0,
            three_d_effect_multiplier: 1.0,
            swap_enabled: false,
            events: Vec::new(),
        }
    }
}

fn clamp_sides(sides: u32) -> u32 {
    sides.clamp(MIN_SIDES, MAX_SIDES)
}

impl LevelData {
    /// Clamp loaded values into their valid ranges
    pub fn normalized(mut self) -> Self {
        self.sides = clamp_sides(self.sides);
        self.sides_min = clamp_sides(self.sides_min);
        self.sides_max = clamp_sides(self.sides_max).max(self.sides_min);
        self.speed_multiplier = self.speed_multiplier.max(0.0);
        self.delay_multiplier = self.delay_multiplier.max(0.0);
        self.increment_time = self.increment_time.max(0.0);
        self.difficulty_increment = self.difficulty_increment.max(0.0);
        self.rotation_speed_max = self.rotation_speed_max.max(0.0);
        if self.pulse_min <= 0.0 {
            self.pulse_min = 1.0;
        }
        self.pulse_max = self.pulse_max.max(self.pulse_min);
        self.radius_min = self.radius_min.max(0.0);
        self
    }

    pub fn set_speed_multiplier(&mut self, value: f32) -> Result<f32, LevelValueError> {
        self.set_value("speed_multiplier", value)
    }

    pub fn set_delay_multiplier(&mut self, value: f32) -> Result<f32, LevelValueError> {
        self.set_value("delay_multiplier", value)
    }

    pub fn set_rotation_speed(&mut self, value: f32) -> Result<f32, LevelValueError> {
        self.set_value("rotation_speed", value)
    }

    /// Set the side count, clamped to the closed-polygon range. Returns the applied count.
    pub fn set_sides(&mut self, sides: i64) -> u32 {
        let clamped = sides.clamp(MIN_SIDES as i64, MAX_SIDES as i64) as u32;
        if clamped as i64 != sides {
            log::warn!("Side count {} clamped to {}", sides, clamped);
        }
        self.sides = clamped;
        clamped
    }

    /// Read a numeric level value by name
    pub fn value(&self, name: &str) -> Option<f32> {
        let v = match name {
            "speed_multiplier" => self.speed_multiplier,
            "speed_increment" => self.speed_increment,
            "delay_multiplier" => self.delay_multiplier,
            "delay_increment" => self.delay_increment,
            "rotation_speed" => self.rotation_speed,
            "rotation_increment" => self.rotation_increment,
            "rotation_speed_max" => self.rotation_speed_max,
            "fast_spin" => self.fast_spin,
            "increment_time" => self.increment_time,
            "difficulty_increment" => self.difficulty_increment,
            "sides" => self.sides as f32,
            "sides_min" => self.sides_min as f32,
            "sides_max" => self.sides_max as f32,
            "wall_skew_left" => self.wall_skew_left,
            "wall_skew_right" => self.wall_skew_right,
            "wall_angle_left" => self.wall_angle_left,
            "wall_angle_right" => self.wall_angle_right,
            "radius_min" => self.radius_min,
            "pulse_min" => self.pulse_min,
            "pulse_max" => self.pulse_max,
            "pulse_speed" => self.pulse_speed,
            "pulse_speed_r" => self.pulse_speed_r,
            "pulse_delay_max" => self.pulse_delay_max,
            "pulse_delay_half_max" => self.pulse_delay_half_max,
            "beat_pulse_max" => self.beat_pulse_max,
            "beat_pulse_delay_max" => self.beat_pulse_delay_max,
            "3d_effect_multiplier" => self.three_d_effect_multiplier,
            _ => return None,
        };
        Some(v)
    }

    /// Set a numeric level value by name.
    ///
    /// Inputs are clamped to the range the simulation can handle; the applied
    /// value is returned. Non-finite inputs and unknown names are rejected and
    /// leave the level untouched.
    pub fn set_value(&mut self, name: &str, value: f32) -> Result<f32, LevelValueError> {
        if !value.is_finite() {
            return Err(LevelValueError::NonFinite {
                name: name.to_string(),
                value,
            });
        }

        let applied = match name {
            "speed_multiplier" => {
                self.speed_multiplier = value.max(0.0);
                self.speed_multiplier
            }
            "speed_increment" => {
                self.speed_increment = value;
                value
            }
            "delay_multiplier" => {
                self.delay_multiplier = value.max(0.0);
                self.delay_multiplier
            }
            "delay_increment" => {
                self.delay_increment = value;
                value
            }
            "rotation_speed" => {
                self.rotation_speed = value;
                value
            }
            "rotation_increment" => {
                self.rotation_increment = value;
                value
            }
            "rotation_speed_max" => {
                self.rotation_speed_max = value.max(0.0);
                self.rotation_speed_max
            }
            "fast_spin" => {
                self.fast_spin = value.max(0.0);
                self.fast_spin
            }
            "increment_time" => {
                self.increment_time = value.max(0.0);
                self.increment_time
            }
            "difficulty_increment" => {
                // Negative increments would let the multiplier fall within a run
                self.difficulty_increment = value.max(0.0);
                self.difficulty_increment
            }
            "sides" => self.set_sides(value.round() as i64) as f32,
            "sides_min" => {
                self.sides_min = clamp_sides(value.round().max(0.0) as u32);
                self.sides_max = self.sides_max.max(self.sides_min);
                self.sides_min as f32
            }
            "sides_max" => {
                self.sides_max = clamp_sides(value.round().max(0.0) as u32).max(self.sides_min);
                self.sides_max as f32
            }
            "wall_skew_left" => {
                self.wall_skew_left = value;
                value
            }
            "wall_skew_right" => {
                self.wall_skew_right = value;
                value
            }
            "wall_angle_left" => {
                self.wall_angle_left = value;
                value
            }
            "wall_angle_right" => {
                self.wall_angle_right = value;
                value
            }
            "radius_min" => {
                self.radius_min = value.max(0.0);
                self.radius_min
            }
            "pulse_min" => {
                self.pulse_min = value.max(1.0);
                self.pulse_max = self.pulse_max.max(self.pulse_min);
                self.pulse_min
            }
            "pulse_max" => {
                self.pulse_max = value.max(self.pulse_min);
                self.pulse_max
            }
            "pulse_speed" => {
                self.pulse_speed = value.max(0.0);
                self.pulse_speed
            }
            "pulse_speed_r" => {
                self.pulse_speed_r = value.max(0.0);
                self.pulse_speed_r
            }
            "pulse_delay_max" => {
                self.pulse_delay_max = value.max(0.0);
                self.pulse_delay_max
            }
            "pulse_delay_half_max" => {
                self.pulse_delay_half_max = value.max(0.0);
                self.pulse_delay_half_max
            }
            "beat_pulse_max" => {
                self.beat_pulse_max = value.max(0.0);
                self.beat_pulse_max
            }
            "beat_pulse_delay_max" => {
                self.beat_pulse_delay_max = value.max(0.0);
                self.beat_pulse_delay_max
            }
            "3d_effect_multiplier" => {
                self.three_d_effect_multiplier = value;
                value
            }
            _ => return Err(LevelValueError::Unknown(name.to_string())),
        };
        Ok(applied)
    }

    /// All numeric values, for read-only script snapshots
    pub fn numeric_values(&self) -> Vec<(&'static str, f32)> {
        LEVEL_VALUE_NAMES
            .iter()
            .filter_map(|&name| self.value(name).map(|v| (name, v)))
            .collect()
    }
}
