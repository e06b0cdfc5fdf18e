//! Difficulty scaling
//!
//! Effective values are always derived from the level data and the current
//! difficulty multiplier; nothing here keeps state. Speed grows faster with
//! difficulty than delay shrinks.

use crate::data::LevelData;

pub const SPEED_EXPONENT: f32 = 0.65;
pub const DELAY_EXPONENT: f32 = 0.10;

/// Effective wall speed multiplier
#[inline]
pub fn effective_speed(speed_mult: f32, difficulty_mult: f32) -> f32 {
    speed_mult * difficulty_mult.max(0.0).powf(SPEED_EXPONENT)
}

/// Effective delay multiplier (scales script waits between patterns)
#[inline]
pub fn effective_delay(delay_mult: f32, difficulty_mult: f32) -> f32 {
    let divisor = difficulty_mult.max(f32::MIN_POSITIVE).powf(DELAY_EXPONENT);
    delay_mult / divisor
}

/// Signed rotation speed, magnitude capped by `max` when `max` is positive
#[inline]
pub fn effective_rotation(rotation_speed: f32, max: f32, direction: f32) -> f32 {
    let magnitude = if max > 0.0 {
        rotation_speed.abs().min(max)
    } else {
        rotation_speed.abs()
    };
    magnitude * rotation_speed.signum() * direction.signum()
}

/// Effective values for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Effective {
    pub speed: f32,
    pub delay: f32,
    pub rotation: f32,
}

impl Effective {
    pub fn compute(level: &LevelData, difficulty_mult: f32, rotation_direction: f32) -> Self {
        Self {
            speed: effective_speed(level.speed_multiplier, difficulty_mult),
            delay: effective_delay(level.delay_multiplier, difficulty_mult),
            rotation: effective_rotation(
                level.rotation_speed,
                level.rotation_speed_max,
                rotation_direction,
            ),
        }
    }
}
