//! Side geometry, walls and the player
//!
//! Everything is laid out in polar coordinates around the center: side `i`
//! covers the angular sector `[i * span, (i + 1) * span)` degrees, walls are
//! radial bands inside one sector that travel inward, and the player is a point
//! orbiting just outside the pulsing center radius.
//!
//! Camera rotation is purely visual and never enters these coordinates.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::normalize_degrees;

/// Geometry derived from the side count
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SideGeometry {
    pub sides: u32,
    /// Angular width of one side (degrees)
    pub span: f32,
}

impl SideGeometry {
    pub fn new(sides: u32) -> Self {
        let sides = sides.clamp(MIN_SIDES, MAX_SIDES);
        Self {
            sides,
            span: 360.0 / sides as f32,
        }
    }

    /// Side index containing `angle` (degrees)
    pub fn side_of(&self, angle: f32) -> u32 {
        let side = (normalize_degrees(angle) / self.span).floor() as u32;
        side.min(self.sides - 1)
    }

    /// Start angle of a side (degrees)
    pub fn side_start(&self, side: u32) -> f32 {
        side as f32 * self.span
    }

    /// Map any script-supplied side index onto a valid side
    pub fn wrap_side(&self, side: i64) -> u32 {
        side.rem_euclid(self.sides as i64) as u32
    }
}

/// A wall band travelling toward the center
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    pub side: u32,
    /// Distance of the inner edge from the center
    pub distance: f32,
    pub thickness: f32,
    /// Inward speed (units/s), fixed at spawn time
    pub speed: f32,
    /// Distance covered by the last `advance`
    #[serde(default)]
    pub travelled: f32,
}

impl Wall {
    pub fn new(side: u32, thickness: f32, speed: f32) -> Self {
        Self {
            side,
            distance: WALL_SPAWN_DISTANCE,
            thickness: thickness.clamp(0.0, MAX_WALL_THICKNESS),
            speed: speed.max(0.0),
            travelled: 0.0,
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.travelled = self.speed * dt.max(0.0);
        self.distance -= self.travelled;
    }

    /// Outer edge has passed the center
    pub fn is_gone(&self) -> bool {
        self.distance + self.thickness <= 0.0
    }

    pub fn outer_distance(&self) -> f32 {
        self.distance + self.thickness
    }

    /// Does the band cover `radius`?
    pub fn covers(&self, radius: f32) -> bool {
        self.distance <= radius && radius <= self.outer_distance()
    }

    /// Does the band, or the stretch it crossed during the last step, cover `radius`?
    pub fn swept_covers(&self, radius: f32) -> bool {
        self.distance <= radius && radius <= self.outer_distance() + self.travelled
    }
}

/// The player cursor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Angle around the center (degrees, world space)
    pub angle: f32,
    /// Remaining swap cooldown (seconds)
    pub swap_cooldown: f32,
}

impl Default for Player {
    fn default() -> Self {
        Self::at(240.0)
    }
}

impl Player {
    pub fn at(angle: f32) -> Self {
        let angle = normalize_degrees(angle);
        Self {
            angle,
            swap_cooldown: 0.0,
        }
    }

    /// Angle the player would reach after moving for `dt`
    pub fn next_angle(&self, movement: i8, focused: bool, dt: f32) -> f32 {
        let speed = if focused { PLAYER_FOCUS_SPEED } else { PLAYER_SPEED };
        normalize_degrees(self.angle + movement.signum() as f32 * speed * dt)
    }

    pub fn move_to(&mut self, angle: f32) {
        self.angle = normalize_degrees(angle);
    }

    /// Jump to the opposite side if the cooldown allows it
    pub fn try_swap(&mut self) -> bool {
        if self.swap_cooldown > 0.0 {
            return false;
        }
        self.move_to(self.angle + 180.0);
        self.swap_cooldown = SWAP_COOLDOWN;
        true
    }

    pub fn tick_cooldown(&mut self, dt: f32) {
        self.swap_cooldown = (self.swap_cooldown - dt).max(0.0);
    }
}
