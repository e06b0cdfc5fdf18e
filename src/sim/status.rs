//! Live run status
//!
//! One `HexagonGameStatus` exists per active run. It is created from the level
//! data at run start, mutated by the update driver every tick and thrown away on
//! restart or menu return.

use serde::{Deserialize, Serialize};

use crate::data::LevelData;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HexagonGameStatus {
    /// Survival time (seconds), frozen during time-stop
    pub current_time: f32,
    /// Time since the last difficulty increment
    pub increment_time: f32,
    /// Remaining time-stop (seconds)
    pub time_stop: f32,

    /// Difficulty multiplier; only grows within a run
    pub difficulty_mult: f32,
    /// Number of increments so far
    pub increments: u32,
    pub increment_enabled: bool,
    /// Script asked for an increment on the next tick
    pub force_increment: bool,

    pub random_side_changes_enabled: bool,
    /// A side change waits for the walls to clear
    pub must_change_sides: bool,

    /// Camera rotation (degrees)
    pub rotation: f32,
    /// +1 or -1, flipped by increments and scripts
    pub rotation_direction: f32,
    /// Remaining fast spin (seconds)
    pub fast_spin: f32,

    /// Time fed to the pulse waveforms
    pub pulse_time: f32,
    pub pulse: f32,
    pub beat_pulse: f32,
    /// Center polygon radius
    pub radius: f32,

    /// Screen flash intensity (0-255)
    pub flash_effect: f32,

    /// Time fed to the depth pulse
    pub depth_time: f32,
    pub pulse_3d: f32,

    pub has_died: bool,
    pub must_restart: bool,
    pub score_invalid: bool,
    /// First attempt at this level since entering it from the menu
    pub first_play: bool,
}

impl HexagonGameStatus {
    pub fn new(level: &LevelData, difficulty_mult: f32, first_play: bool) -> Self {
        let difficulty_mult = if difficulty_mult.is_finite() && difficulty_mult > 0.0 {
            difficulty_mult
        } else {
            1.0
        };
        Self {
            current_time: 0.0,
            increment_time: 0.0,
            time_stop: 0.0,
            difficulty_mult,
            increments: 0,
            increment_enabled: true,
            force_increment: false,
            random_side_changes_enabled: true,
            must_change_sides: false,
            rotation: 0.0,
            rotation_direction: 1.0,
            fast_spin: 0.0,
            pulse_time: 0.0,
            pulse: level.pulse_min,
            beat_pulse: 0.0,
            radius: level.radius_min,
            flash_effect: 0.0,
            depth_time: 0.0,
            pulse_3d: 0.0,
            has_died: false,
            must_restart: false,
            score_invalid: false,
            first_play,
        }
    }

    pub fn is_time_stopped(&self) -> bool {
        self.time_stop > 0.0
    }

    /// Raise the difficulty multiplier; negative steps are ignored
    pub fn raise_difficulty(&mut self, step: f32) {
        if step.is_finite() && step > 0.0 {
            self.difficulty_mult += step;
        }
        self.increments += 1;
    }
}
