//! Run state
//!
//! Everything one playthrough owns: its private copy of the level data (which
//! events and scripts mutate), the status, the three timelines, walls, player
//! and the seeded RNG. Dropping a `RunState` ends the run.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::difficulty::Effective;
use super::events::ValueOp;
use super::status::HexagonGameStatus;
use super::timeline::Timelines;
use super::wall::{Player, SideGeometry, Wall};
use crate::consts::WALL_SPEED_UNIT;
use crate::data::{LevelData, LevelValueError, MusicData, StyleData};
use crate::script::HostSnapshot;

#[derive(Debug, Clone)]
pub struct RunState {
    pub level_id: String,
    pub level: LevelData,
    pub style: StyleData,
    pub music: MusicData,
    pub status: HexagonGameStatus,
    pub timelines: Timelines,
    pub walls: Vec<Wall>,
    pub player: Player,
    geometry: SideGeometry,
    rng: Pcg32,
    seed: u64,
}

impl RunState {
    pub fn new(
        level_id: impl Into<String>,
        level: LevelData,
        style: StyleData,
        music: MusicData,
        difficulty_mult: f32,
        first_play: bool,
        seed: u64,
    ) -> Self {
        let level = level.normalized();
        let status = HexagonGameStatus::new(&level, difficulty_mult, first_play);
        let mut timelines = Timelines::default();
        timelines.reset(&level.events);
        Self {
            level_id: level_id.into(),
            geometry: SideGeometry::new(level.sides),
            level,
            style,
            music,
            status,
            timelines,
            walls: Vec::new(),
            player: Player::default(),
            rng: Pcg32::seed_from_u64(seed),
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn geometry(&self) -> SideGeometry {
        self.geometry
    }

    pub fn effective(&self) -> Effective {
        Effective::compute(
            &self.level,
            self.status.difficulty_mult,
            self.status.rotation_direction,
        )
    }

    /// Seconds between beat pulses: the track tempo wins over the level value
    pub fn beat_period(&self) -> f32 {
        self.music
            .beat_period()
            .unwrap_or(self.level.beat_pulse_delay_max)
    }

    /// Set a named level value through its validator
    pub fn set_level_value(&mut self, name: &str, value: f32) -> Result<f32, LevelValueError> {
        self.apply_value_op(ValueOp::Set, name, value)
    }

    pub fn apply_value_op(
        &mut self,
        op: ValueOp,
        name: &str,
        value: f32,
    ) -> Result<f32, LevelValueError> {
        let applied = op.apply(&mut self.level, name, value)?;
        if name == "sides" {
            self.sync_geometry();
        }
        Ok(applied)
    }

    pub fn set_sides(&mut self, sides: i64) -> u32 {
        let applied = self.level.set_sides(sides);
        self.sync_geometry();
        applied
    }

    /// Re-derive the side geometry; walls on vanished sides wrap around
    fn sync_geometry(&mut self) {
        if self.geometry.sides == self.level.sides {
            return;
        }
        self.geometry = SideGeometry::new(self.level.sides);
        let geometry = self.geometry;
        for wall in &mut self.walls {
            wall.side = geometry.wrap_side(wall.side as i64);
        }
        log::debug!("Side count now {}", geometry.sides);
    }

    /// Random side count within the level's range
    pub fn random_side_count(&mut self) -> i64 {
        let min = self.level.sides_min;
        let max = self.level.sides_max.max(min);
        self.rng.random_range(min..=max) as i64
    }

    /// Spawn a wall at the spawn distance, moving at the current effective speed
    pub fn spawn_wall(&mut self, side: i64, thickness: f32, speed_adj: f32) {
        let side = self.geometry.wrap_side(side);
        let speed = self.effective().speed * speed_adj * WALL_SPEED_UNIT;
        self.walls.push(Wall::new(side, thickness, speed));
    }

    /// Read-only view handed to scripts
    pub fn snapshot(&self) -> HostSnapshot {
        let effective = self.effective();
        HostSnapshot {
            sides: self.geometry.sides,
            speed_mult: effective.speed,
            delay_mult: effective.delay,
            difficulty_mult: self.status.difficulty_mult,
            rotation_speed: self.level.rotation_speed,
            level_time: self.status.current_time,
            values: self
                .level
                .numeric_values()
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        }
    }
}
