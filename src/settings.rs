//! Game settings and preferences
//!
//! Persisted as a JSON file next to the level pack. Missing fields take their
//! defaults so older files keep loading.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Visual Effects ===
    /// Radius pulse
    pub pulse: bool,
    /// Beat pulse on top of the radius pulse
    pub beat_pulse: bool,
    /// Depth layers under the walls
    pub three_d: bool,
    /// Upper bound on the number of depth layers drawn
    pub three_d_max_depth: u32,
    /// Scales the level's 3D effect multiplier
    pub three_d_multiplier: f32,
    /// Screen flash on death and events
    pub flash: bool,
    /// Camera rotation
    pub rotation: bool,
    pub black_and_white: bool,
    pub show_messages: bool,

    // === Audio ===
    pub sound: bool,
    pub music: bool,
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,

    // === Gameplay ===
    /// Walls never kill
    pub invincible: bool,
    /// Restart immediately after death
    pub auto_restart: bool,
    /// Practice runs are never recorded
    pub practice: bool,
    /// Difficulty multiplier new runs start from
    pub difficulty_mult: f32,

    // === HUD ===
    /// Show live values (difficulty, speed, rotation) in the HUD
    pub debug_text: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pulse: true,
            beat_pulse: true,
            three_d: true,
            three_d_max_depth: 100,
            three_d_multiplier: 1.0,
            flash: true,
            rotation: true,
            black_and_white: false,
            show_messages: true,

            sound: true,
            music: true,
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.7,

            invincible: false,
            auto_restart: false,
            practice: false,
            difficulty_mult: 1.0,

            debug_text: false,
        }
    }
}

impl Settings {
    /// Whether a run with these settings may set a score.
    ///
    /// Anything that makes the level easier to read or survive disqualifies.
    pub fn is_eligible_for_score(&self) -> bool {
        !self.invincible
            && !self.practice
            && self.rotation
            && self.pulse
            && self.beat_pulse
            && !self.black_and_white
    }

    /// Effective depth multiplier for a level
    pub fn effective_three_d(&self, level_multiplier: f32) -> f32 {
        if self.three_d {
            level_multiplier * self.three_d_multiplier
        } else {
            0.0
        }
    }

    /// Load settings from `path`, falling back to defaults
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Malformed settings file {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("Settings saved");
        Ok(())
    }
}
