//! Audio routing
//!
//! The simulation never talks to an audio device. It asks the
//! [`AudioManager`] for sounds and music; the manager applies the player's
//! sound/music settings and volumes, then forwards to an [`AudioSink`].

use std::cell::RefCell;
use std::rc::Rc;

use crate::data::MusicData;

/// Sound effect types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundEffect {
    /// Run start
    Go,
    /// Difficulty increment
    LevelUp,
    /// Message shown, menu return
    Beep,
    /// Player hit a wall
    Death,
    /// Played right after the death sound
    GameOver,
    /// Finished run beat the stored best
    NewBest,
    /// Sound requested by a level by id
    Custom(String),
}

impl SoundEffect {
    pub fn from_id(id: &str) -> Self {
        match id {
            "go" => SoundEffect::Go,
            "level_up" => SoundEffect::LevelUp,
            "beep" => SoundEffect::Beep,
            "death" => SoundEffect::Death,
            "game_over" => SoundEffect::GameOver,
            "new_best" => SoundEffect::NewBest,
            other => SoundEffect::Custom(other.to_string()),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            SoundEffect::Go => "go",
            SoundEffect::LevelUp => "level_up",
            SoundEffect::Beep => "beep",
            SoundEffect::Death => "death",
            SoundEffect::GameOver => "game_over",
            SoundEffect::NewBest => "new_best",
            SoundEffect::Custom(id) => id,
        }
    }
}

/// Audio device boundary
pub trait AudioSink {
    fn play_sound(&mut self, effect: &SoundEffect, volume: f32);
    /// Start `music` at `start` seconds into the track
    fn play_music(&mut self, music: &MusicData, start: f32, volume: f32);
    fn stop_music(&mut self);
}

/// Sink that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play_sound(&mut self, effect: &SoundEffect, _volume: f32) {
        log::trace!("sound {}", effect.id());
    }

    fn play_music(&mut self, music: &MusicData, start: f32, _volume: f32) {
        log::trace!("music {} from {:.2}s", music.id, start);
    }

    fn stop_music(&mut self) {}
}

/// Something that reached the sink
#[derive(Debug, Clone, PartialEq)]
pub enum AudioEvent {
    Sound(SoundEffect),
    Music { id: String, start: f32 },
    StopMusic,
}

/// Sink that records what it was asked to play; handles share the log
#[derive(Debug, Default, Clone)]
pub struct MemoryAudio {
    log: Rc<RefCell<Vec<AudioEvent>>>,
}

impl MemoryAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AudioEvent> {
        self.log.borrow().clone()
    }

    pub fn count(&self, effect: &SoundEffect) -> usize {
        self.log
            .borrow()
            .iter()
            .filter(|e| matches!(e, AudioEvent::Sound(s) if s == effect))
            .count()
    }
}

impl AudioSink for MemoryAudio {
    fn play_sound(&mut self, effect: &SoundEffect, _volume: f32) {
        self.log.borrow_mut().push(AudioEvent::Sound(effect.clone()));
    }

    fn play_music(&mut self, music: &MusicData, start: f32, _volume: f32) {
        self.log.borrow_mut().push(AudioEvent::Music {
            id: music.id.clone(),
            start,
        });
    }

    fn stop_music(&mut self) {
        self.log.borrow_mut().push(AudioEvent::StopMusic);
    }
}

/// Audio manager for the game
pub struct AudioManager {
    sink: Box<dyn AudioSink>,
    master_volume: f32,
    sfx_volume: f32,
    music_volume: f32,
    sound_enabled: bool,
    music_enabled: bool,
    muted: bool,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new(Box::new(NullAudio))
    }
}

impl AudioManager {
    pub fn new(sink: Box<dyn AudioSink>) -> Self {
        Self {
            sink,
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.7,
            sound_enabled: true,
            music_enabled: true,
            muted: false,
        }
    }

    /// Pick up toggles and volumes from the settings
    pub fn apply_settings(&mut self, settings: &crate::settings::Settings) {
        self.sound_enabled = settings.sound;
        self.music_enabled = settings.music;
        self.set_master_volume(settings.master_volume);
        self.set_sfx_volume(settings.sfx_volume);
        self.set_music_volume(settings.music_volume);
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Set music volume (0.0 - 1.0)
    pub fn set_music_volume(&mut self, vol: f32) {
        self.music_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn effective_volume(&self, channel: f32) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * channel
        }
    }

    /// Play a sound effect
    pub fn play(&mut self, effect: SoundEffect) {
        let vol = self.effective_volume(self.sfx_volume);
        if !self.sound_enabled || vol <= 0.0 {
            return;
        }
        self.sink.play_sound(&effect, vol);
    }

    pub fn play_music(&mut self, music: &MusicData, start: f32) {
        let vol = self.effective_volume(self.music_volume);
        if !self.music_enabled || vol <= 0.0 {
            return;
        }
        self.sink.play_music(music, start, vol);
    }

    pub fn stop_music(&mut self) {
        self.sink.stop_music();
    }
}
