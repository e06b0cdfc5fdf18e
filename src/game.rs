//! Level lifecycle
//!
//! `HexagonGame` owns at most one run and moves it through
//! `Idle -> Playing -> Dying -> (Playing | Idle)`. It loads levels through the
//! asset collaborator, forwards frames to the simulation tick, finalizes scores
//! on death and hands control back to the menu.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::assets::{AssetProvider, LoadError};
use crate::audio::{AudioManager, AudioSink, NullAudio, SoundEffect};
use crate::consts::{FLASH_MAX, SIM_DT};
use crate::data::{LevelData, LevelValueError, MusicData, StyleData};
use crate::highscores::{ScoreBoard, ScoreKey, ScoreSink};
use crate::renderer::{self, HudInfo, Layer, RenderTarget, Vertex};
use crate::script::{rhai_factory, ScriptFactory, ScriptHost};
use crate::settings::Settings;
use crate::sim::tick::{execute_event, run_script, update_visuals};
use crate::sim::{
    tick, CollisionCheck, HexagonGameStatus, RunState, SectorCollision, TickContext, TickInput,
    TickOutcome, TimedEvent,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// No run loaded
    Idle,
    Playing,
    /// Player died; visuals keep running until restart or exit
    Dying,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathReason {
    /// Touched a wall; ignored while invincible
    Collision,
    /// Requested by the host or a script; always kills
    Forced,
}

/// Finalized result of one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub level_id: String,
    pub difficulty_mult: f32,
    pub time: f32,
    pub increments: u32,
    pub new_best: bool,
    /// False when the run was not score-eligible
    pub recorded: bool,
}

/// Leftover frame time below this is float noise, not another step
const STEP_EPSILON: f32 = 1e-6;

/// Menu collaborator
pub trait MenuHandle {
    fn enter_menu(&mut self, result: Option<RunResult>);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullMenu;

impl MenuHandle for NullMenu {
    fn enter_menu(&mut self, result: Option<RunResult>) {
        if let Some(result) = result {
            log::info!("Run over: {} survived {:.3}s", result.level_id, result.time);
        }
    }
}

/// Everything the lifecycle talks to
pub struct Collaborators {
    pub assets: Box<dyn AssetProvider>,
    pub audio: Box<dyn AudioSink>,
    pub scores: Box<dyn ScoreSink>,
    pub menu: Box<dyn MenuHandle>,
    pub collision: Box<dyn CollisionCheck>,
    pub script: ScriptFactory,
}

impl Collaborators {
    /// Silent audio, in-memory scores, no menu, rhai scripts
    pub fn headless(assets: impl AssetProvider + 'static) -> Self {
        Self {
            assets: Box::new(assets),
            audio: Box::new(NullAudio),
            scores: Box::new(ScoreBoard::new()),
            menu: Box::new(NullMenu),
            collision: Box::new(SectorCollision),
            script: rhai_factory(),
        }
    }
}

/// Unmodified level assets, kept for restarts
#[derive(Debug, Clone)]
struct LevelBundle {
    id: String,
    level: LevelData,
    style: StyleData,
    music: MusicData,
    /// (file name, source)
    script: Option<(String, String)>,
}

pub struct HexagonGame {
    settings: Settings,
    phase: RunPhase,
    run: Option<RunState>,
    script: ScriptHost,
    audio: AudioManager,
    assets: Box<dyn AssetProvider>,
    scores: Box<dyn ScoreSink>,
    menu: Box<dyn MenuHandle>,
    collision: Box<dyn CollisionCheck>,
    script_factory: ScriptFactory,
    bundle: Option<LevelBundle>,
    restart_id: String,
    difficulty: f32,
    input: TickInput,
    last_result: Option<RunResult>,
    score_finalized: bool,
    seeds: Pcg32,
}

impl HexagonGame {
    pub fn new(collaborators: Collaborators, settings: Settings, seed: u64) -> Self {
        let mut audio = AudioManager::new(collaborators.audio);
        audio.apply_settings(&settings);
        Self {
            difficulty: settings.difficulty_mult,
            settings,
            phase: RunPhase::Idle,
            run: None,
            script: ScriptHost::empty(),
            audio,
            assets: collaborators.assets,
            scores: collaborators.scores,
            menu: collaborators.menu,
            collision: collaborators.collision,
            script_factory: collaborators.script,
            bundle: None,
            restart_id: String::new(),
            input: TickInput::default(),
            last_result: None,
            score_finalized: false,
            seeds: Pcg32::seed_from_u64(seed),
        }
    }

    // ---- lifecycle ----

    /// Load `id` and start playing it.
    ///
    /// Everything is loaded and compiled before the current run is replaced,
    /// so a failed load leaves the game as it was.
    pub fn new_game(&mut self, id: &str, first_play: bool, difficulty: f32) -> Result<(), LoadError> {
        let bundle = match &self.bundle {
            // Restarts reuse the pristine copy; entering from the menu reloads
            Some(bundle) if bundle.id == id && !first_play => bundle.clone(),
            _ => self.load_bundle(id)?,
        };
        let seed: u64 = self.seeds.random();
        let script = match &bundle.script {
            Some((file, source)) => ScriptHost::compile(&self.script_factory, file, source, seed)?,
            None => ScriptHost::empty(),
        };

        let mut run = RunState::new(
            id,
            bundle.level.clone(),
            bundle.style.clone(),
            bundle.music.clone(),
            difficulty,
            first_play,
            seed,
        );
        if !self.settings.is_eligible_for_score() {
            run.status.score_invalid = true;
            log::warn!("Settings are not score-eligible; this run will not be recorded");
        }

        // Tear down the previous run
        self.bundle = Some(bundle);
        self.script = script;
        self.run = None;
        self.audio.stop_music();

        self.script.sync(run.snapshot());
        {
            let mut ctx = TickContext {
                script: &mut self.script,
                audio: &mut self.audio,
                collision: self.collision.as_ref(),
                settings: &self.settings,
            };
            run_script(&mut run, &mut ctx, "on_load", &[]);
        }

        let start = if first_play {
            run.music.first_segment()
        } else {
            run.music.random_segment(&mut self.seeds)
        };
        self.audio.play_music(&run.music, start);
        self.audio.play(SoundEffect::Go);

        log::info!(
            "Started level {} (difficulty {:.2}, seed {})",
            id,
            run.status.difficulty_mult,
            seed
        );
        self.restart_id = id.to_string();
        self.difficulty = run.status.difficulty_mult;
        self.run = Some(run);
        self.phase = RunPhase::Playing;
        self.score_finalized = false;
        self.last_result = None;
        self.input = TickInput::default();
        Ok(())
    }

    fn load_bundle(&self, id: &str) -> Result<LevelBundle, LoadError> {
        let level = self.assets.level(id)?;
        let style = self.assets.style(&level.style_id)?;
        let music = if level.music_id.is_empty() {
            MusicData::default()
        } else {
            self.assets.music(&level.music_id)?
        };
        let script = match &level.script_file {
            Some(file) => Some((file.clone(), self.assets.script(file)?)),
            None => None,
        };
        log::info!("Loaded level {} ({})", id, level.name);
        Ok(LevelBundle {
            id: id.to_string(),
            level,
            style,
            music,
            script,
        })
    }

    /// Replay the last level from scratch
    pub fn restart(&mut self) -> Result<(), LoadError> {
        let id = self.restart_id.clone();
        self.new_game(&id, false, self.difficulty)
    }

    pub fn change_level(&mut self, id: &str, first_time: bool) -> Result<(), LoadError> {
        self.new_game(id, first_time, self.difficulty)
    }

    /// Advance by `frame_time` seconds. Playing runs are stepped in slices of
    /// at most `SIM_DT`, the last one taking the remainder, and stop at the
    /// first slice that ends the run.
    ///
    /// Never fails; load errors on restart or level change send the player
    /// back to the menu.
    pub fn update(&mut self, frame_time: f32) {
        if !frame_time.is_finite() {
            return;
        }
        let dt = frame_time.max(0.0);

        match self.phase {
            RunPhase::Idle => {}
            RunPhase::Playing => {
                if self.input.exit {
                    self.go_to_menu(false);
                    return;
                }
                let Some(run) = self.run.as_mut() else {
                    return;
                };
                let mut ctx = TickContext {
                    script: &mut self.script,
                    audio: &mut self.audio,
                    collision: self.collision.as_ref(),
                    settings: &self.settings,
                };
                let mut remaining = dt;
                let mut outcome = TickOutcome::Continue;
                while remaining > STEP_EPSILON {
                    let step = remaining.min(SIM_DT);
                    outcome = tick(run, &self.input, step, &mut ctx);
                    remaining -= step;
                    if outcome != TickOutcome::Continue {
                        break;
                    }
                }
                self.handle_outcome(outcome);
            }
            RunPhase::Dying => {
                if let Some(run) = self.run.as_mut() {
                    update_visuals(run, dt, &self.settings);
                }
                let must_restart = self.run.as_ref().is_some_and(|r| r.status.must_restart);
                if self.input.exit {
                    self.go_to_menu(true);
                } else if self.input.restart || must_restart {
                    if let Err(e) = self.restart() {
                        log::error!("Restart failed: {}", e);
                        self.go_to_menu(true);
                    }
                }
            }
        }
    }

    fn handle_outcome(&mut self, outcome: TickOutcome) {
        match outcome {
            TickOutcome::Continue => {}
            TickOutcome::Died => self.death(DeathReason::Collision),
            TickOutcome::ChangeLevel(id) => {
                if let Err(e) = self.change_level(&id, true) {
                    log::error!("Level change to {} failed: {}", id, e);
                    self.go_to_menu(false);
                }
            }
            TickOutcome::ToMenu => self.go_to_menu(false),
        }
    }

    /// End the run. Only acts while playing; collision deaths are ignored
    /// while invincible.
    pub fn death(&mut self, reason: DeathReason) {
        if self.phase != RunPhase::Playing {
            return;
        }
        if reason == DeathReason::Collision && self.settings.invincible {
            return;
        }
        let Some(run) = self.run.as_mut() else {
            return;
        };

        run.status.has_died = true;
        if self.settings.flash {
            run.status.flash_effect = FLASH_MAX;
        }
        self.audio.play(SoundEffect::Death);
        self.audio.play(SoundEffect::GameOver);
        self.audio.stop_music();
        log::info!(
            "Died ({:?}) after {:.3}s on {}",
            reason,
            run.status.current_time,
            run.level_id
        );

        self.finalize_score();
        if let Some(run) = self.run.as_mut() {
            run.status.must_restart = self.settings.auto_restart;
        }
        self.phase = RunPhase::Dying;
    }

    fn finalize_score(&mut self) {
        if self.score_finalized {
            return;
        }
        let Some(run) = self.run.as_ref() else {
            return;
        };
        self.score_finalized = true;

        let mut result = RunResult {
            level_id: run.level_id.clone(),
            difficulty_mult: run.status.difficulty_mult,
            time: run.status.current_time,
            increments: run.status.increments,
            new_best: false,
            recorded: false,
        };
        if run.status.score_invalid {
            log::warn!("Score for {} not recorded (invalid run)", run.level_id);
        } else {
            let key = ScoreKey::new(result.level_id.clone(), self.difficulty);
            result.new_best = self.scores.submit(&key, result.time, result.increments);
            result.recorded = true;
            if result.new_best {
                self.audio.play(SoundEffect::NewBest);
            }
        }
        self.last_result = Some(result);
    }

    /// Leave the run and hand control to the menu
    pub fn go_to_menu(&mut self, send_score: bool) {
        if let Some(run) = self.run.as_mut() {
            let mut ctx = TickContext {
                script: &mut self.script,
                audio: &mut self.audio,
                collision: self.collision.as_ref(),
                settings: &self.settings,
            };
            run_script(run, &mut ctx, "on_unload", &[]);
        }
        self.audio.stop_music();
        self.audio.play(SoundEffect::Beep);

        let result = if send_score { self.last_result.clone() } else { None };
        self.menu.enter_menu(result);

        self.run = None;
        self.script = ScriptHost::empty();
        self.phase = RunPhase::Idle;
        self.input = TickInput::default();
        log::info!("Returned to menu");
    }

    /// Mark the current run as not eligible for a score
    pub fn invalidate_score(&mut self) {
        if let Some(run) = self.run.as_mut() {
            if !run.status.score_invalid {
                log::warn!("Score invalidated for {}", run.level_id);
            }
            run.status.score_invalid = true;
        }
    }

    /// Run events relative to `time`: due ones now, later ones on the event
    /// timeline at their remaining offset.
    pub fn execute_events(&mut self, events: &[TimedEvent], time: f32) {
        let mut outcome = None;
        if let Some(run) = self.run.as_mut() {
            let mut ctx = TickContext {
                script: &mut self.script,
                audio: &mut self.audio,
                collision: self.collision.as_ref(),
                settings: &self.settings,
            };
            for timed in events {
                if timed.time <= time {
                    if let Some(o) = execute_event(run, &timed.event, &mut ctx) {
                        outcome = Some(o);
                        break;
                    }
                } else {
                    let at = run.timelines.events.clock() + (timed.time - time);
                    run.timelines.events.schedule(at, timed.event.clone());
                }
            }
        }
        if let Some(outcome) = outcome {
            self.handle_outcome(outcome);
        }
    }

    // ---- rendering ----

    pub fn render(&self, target: &mut dyn RenderTarget) {
        let Some(run) = self.run.as_ref() else {
            return;
        };
        let key = ScoreKey::new(run.level_id.clone(), self.difficulty);
        let hud = HudInfo {
            best_time: self.scores.best(&key),
        };
        renderer::render_run(run, &self.settings, &hud, target);
    }

    /// Forward an extra batch to the target
    pub fn render_drawable(&self, target: &mut dyn RenderTarget, layer: Layer, vertices: &[Vertex]) {
        renderer::forward(target, layer, vertices);
    }

    // ---- input & settings ----

    pub fn set_input(&mut self, input: TickInput) {
        self.input = input;
    }

    pub fn input(&self) -> &TickInput {
        &self.input
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace the settings; an ineligible change invalidates the running score
    pub fn set_settings(&mut self, settings: Settings) {
        self.audio.apply_settings(&settings);
        self.settings = settings;
        if !self.settings.is_eligible_for_score() {
            self.invalidate_score();
        }
    }

    pub fn audio_mut(&mut self) -> &mut AudioManager {
        &mut self.audio
    }

    // ---- getters ----

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn run(&self) -> Option<&RunState> {
        self.run.as_ref()
    }

    pub fn run_mut(&mut self) -> Option<&mut RunState> {
        self.run.as_mut()
    }

    pub fn status(&self) -> Option<&HexagonGameStatus> {
        self.run.as_ref().map(|r| &r.status)
    }

    pub fn script(&self) -> &ScriptHost {
        &self.script
    }

    pub fn restart_id(&self) -> &str {
        &self.restart_id
    }

    pub fn last_result(&self) -> Option<&RunResult> {
        self.last_result.as_ref()
    }

    pub fn difficulty(&self) -> f32 {
        self.difficulty
    }

    pub fn current_time(&self) -> f32 {
        self.status().map_or(0.0, |s| s.current_time)
    }

    pub fn speed_multiplier(&self) -> f32 {
        self.run.as_ref().map_or(0.0, |r| r.effective().speed)
    }

    pub fn delay_multiplier(&self) -> f32 {
        self.run.as_ref().map_or(0.0, |r| r.effective().delay)
    }

    pub fn rotation_speed(&self) -> f32 {
        self.run.as_ref().map_or(0.0, |r| r.level.rotation_speed)
    }

    pub fn sides(&self) -> Option<u32> {
        self.run.as_ref().map(|r| r.geometry().sides)
    }

    // ---- setters ----

    pub fn set_speed_multiplier(&mut self, value: f32) -> Result<f32, LevelValueError> {
        self.set_level_value("speed_multiplier", value)
    }

    pub fn set_delay_multiplier(&mut self, value: f32) -> Result<f32, LevelValueError> {
        self.set_level_value("delay_multiplier", value)
    }

    pub fn set_rotation_speed(&mut self, value: f32) -> Result<f32, LevelValueError> {
        self.set_level_value("rotation_speed", value)
    }

    /// Set the side count of the running level; `None` without a run
    pub fn set_sides(&mut self, sides: i64) -> Option<u32> {
        self.run.as_mut().map(|r| r.set_sides(sides))
    }

    fn set_level_value(&mut self, name: &str, value: f32) -> Result<f32, LevelValueError> {
        match self.run.as_mut() {
            Some(run) => run.set_level_value(name, value),
            None => Err(LevelValueError::Unknown(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::assets::MemoryAssets;
    use crate::audio::MemoryAudio;
    use crate::sim::LevelEvent;

    /// Score sink that counts submissions
    #[derive(Clone, Default)]
    struct CountingScores {
        submitted: Rc<RefCell<Vec<(ScoreKey, f32)>>>,
    }

    impl ScoreSink for CountingScores {
        fn best(&self, key: &ScoreKey) -> Option<f32> {
            self.submitted
                .borrow()
                .iter()
                .filter(|(k, _)| k == key)
                .map(|(_, t)| *t)
                .reduce(f32::max)
        }

        fn submit(&mut self, key: &ScoreKey, time: f32, _increments: u32) -> bool {
            let best = self.best(key);
            self.submitted.borrow_mut().push((key.clone(), time));
            best.is_none_or(|b| time > b)
        }
    }

    #[derive(Clone, Default)]
    struct RecordingMenu {
        results: Rc<RefCell<Vec<Option<RunResult>>>>,
    }

    impl MenuHandle for RecordingMenu {
        fn enter_menu(&mut self, result: Option<RunResult>) {
            self.results.borrow_mut().push(result);
        }
    }

    struct Fixture {
        game: HexagonGame,
        scores: CountingScores,
        menu: RecordingMenu,
        audio: MemoryAudio,
    }

    fn assets(script: &str) -> MemoryAssets {
        let level = LevelData {
            name: "Test".into(),
            style_id: "plain".into(),
            music_id: "track".into(),
            script_file: Some("test.rhai".into()),
            rotation_speed: 0.1,
            ..Default::default()
        };
        MemoryAssets::new()
            .with_level("test", level)
            .with_style("plain", StyleData::default())
            .with_music(
                "track",
                MusicData {
                    segments: vec![3.0, 10.0, 20.0],
                    ..Default::default()
                },
            )
            .with_script("test.rhai", script)
    }

    fn fixture(script: &str, settings: Settings) -> Fixture {
        let scores = CountingScores::default();
        let menu = RecordingMenu::default();
        let audio = MemoryAudio::new();
        let collaborators = Collaborators {
            assets: Box::new(assets(script)),
            audio: Box::new(audio.clone()),
            scores: Box::new(scores.clone()),
            menu: Box::new(menu.clone()),
            collision: Box::new(SectorCollision),
            script: rhai_factory(),
        };
        Fixture {
            game: HexagonGame::new(collaborators, settings, 42),
            scores,
            menu,
            audio,
        }
    }

    fn play(game: &mut HexagonGame, frames: usize) {
        for _ in 0..frames {
            game.update(SIM_DT);
        }
    }

    #[test]
    fn test_new_game_enters_playing() {
        let mut f = fixture("fn on_load() { message_add(\"hi\", 1.0); }", Settings::default());
        f.game.new_game("test", true, 1.0).unwrap();
        assert_eq!(f.game.phase(), RunPhase::Playing);
        assert_eq!(f.game.restart_id(), "test");
        assert_eq!(f.audio.count(&SoundEffect::Go), 1);
        assert!(f
            .audio
            .events()
            .iter()
            .any(|e| matches!(e, crate::audio::AudioEvent::Music { start, .. } if *start == 3.0)));

        play(&mut f.game, 1);
        assert_eq!(
            f.game.run().and_then(|r| r.timelines.messages.visible()),
            Some("hi")
        );
    }

    #[test]
    fn test_missing_level_keeps_state() {
        let mut f = fixture("", Settings::default());
        assert!(matches!(
            f.game.new_game("nope", true, 1.0),
            Err(LoadError::NotFound { .. })
        ));
        assert_eq!(f.game.phase(), RunPhase::Idle);

        f.game.new_game("test", true, 1.0).unwrap();
        assert!(f.game.new_game("nope", true, 1.0).is_err());
        assert_eq!(f.game.phase(), RunPhase::Playing);
        assert_eq!(f.game.restart_id(), "test");
    }

    #[test]
    fn test_compile_error_is_a_load_error() {
        let mut f = fixture("fn on_step( {", Settings::default());
        assert!(matches!(
            f.game.new_game("test", true, 1.0),
            Err(LoadError::Script(_))
        ));
        assert!(f.game.run().is_none());
    }

    #[test]
    fn test_death_finalizes_score_once() {
        let mut f = fixture("", Settings::default());
        f.game.new_game("test", true, 1.0).unwrap();
        play(&mut f.game, 30);

        f.game.death(DeathReason::Forced);
        f.game.death(DeathReason::Forced);
        assert_eq!(f.game.phase(), RunPhase::Dying);
        assert_eq!(f.scores.submitted.borrow().len(), 1);
        assert_eq!(f.audio.count(&SoundEffect::Death), 1);
        assert_eq!(f.audio.count(&SoundEffect::NewBest), 1);

        let result = f.game.last_result().cloned().unwrap();
        assert!(result.recorded);
        assert!(result.new_best);
        assert!((result.time - 0.5).abs() < 1e-3);
        assert_eq!(f.game.status().map(|s| s.flash_effect), Some(FLASH_MAX));
    }

    #[test]
    fn test_collision_death_from_tick() {
        let mut f = fixture("", Settings::default());
        f.game.new_game("test", true, 1.0).unwrap();
        let run = f.game.run_mut().unwrap();
        let side = run.geometry().side_of(run.player.angle) as i64;
        run.spawn_wall(side, 200.0, 1.0);

        play(&mut f.game, 600);
        assert_eq!(f.game.phase(), RunPhase::Dying);
        assert_eq!(f.scores.submitted.borrow().len(), 1);
    }

    #[test]
    fn test_invincible_ignores_collision_but_not_forced() {
        let settings = Settings {
            invincible: true,
            ..Default::default()
        };
        let mut f = fixture("", settings);
        f.game.new_game("test", true, 1.0).unwrap();
        assert!(f.game.status().unwrap().score_invalid);

        f.game.death(DeathReason::Collision);
        assert_eq!(f.game.phase(), RunPhase::Playing);

        f.game.death(DeathReason::Forced);
        assert_eq!(f.game.phase(), RunPhase::Dying);
        assert!(f.scores.submitted.borrow().is_empty());
        assert_eq!(f.game.last_result().map(|r| r.recorded), Some(false));
    }

    #[test]
    fn test_restart_resets_run() {
        let mut f = fixture("", Settings::default());
        f.game.new_game("test", true, 1.0).unwrap();
        play(&mut f.game, 1000);
        assert!(f.game.status().unwrap().difficulty_mult > 1.0);
        f.game.death(DeathReason::Forced);

        f.game.set_input(TickInput {
            restart: true,
            ..Default::default()
        });
        f.game.update(SIM_DT);

        assert_eq!(f.game.phase(), RunPhase::Playing);
        let run = f.game.run().unwrap();
        assert_eq!(run.status.current_time, 0.0);
        assert_eq!(run.status.difficulty_mult, 1.0);
        assert!(!run.status.first_play);
        assert_eq!(run.timelines.main.clock(), 0.0);
        assert_eq!(run.timelines.events.clock(), 0.0);
        assert_eq!(run.level.rotation_speed, 0.1);
        assert!(run.walls.is_empty());
        // Restart input is one-shot
        assert!(!f.game.input().restart);
    }

    #[test]
    fn test_auto_restart() {
        let settings = Settings {
            auto_restart: true,
            ..Default::default()
        };
        let mut f = fixture("", settings);
        f.game.new_game("test", true, 1.0).unwrap();
        f.game.death(DeathReason::Forced);
        f.game.update(SIM_DT);
        assert_eq!(f.game.phase(), RunPhase::Playing);
        assert_eq!(f.audio.count(&SoundEffect::Go), 2);
    }

    #[test]
    fn test_exit_while_dying_sends_result() {
        let mut f = fixture("", Settings::default());
        f.game.new_game("test", true, 1.0).unwrap();
        play(&mut f.game, 10);
        f.game.death(DeathReason::Forced);
        f.game.set_input(TickInput {
            exit: true,
            ..Default::default()
        });
        f.game.update(SIM_DT);

        assert_eq!(f.game.phase(), RunPhase::Idle);
        assert!(f.game.run().is_none());
        let results = f.menu.results.borrow();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].as_ref().map(|r| r.level_id.as_str()), Some("test"));
    }

    #[test]
    fn test_menu_from_playing_sends_nothing() {
        let mut f = fixture("", Settings::default());
        f.game.new_game("test", true, 1.0).unwrap();
        f.game.go_to_menu(true);
        assert_eq!(f.menu.results.borrow().as_slice(), &[None]);
        assert!(f.scores.submitted.borrow().is_empty());
        assert_eq!(f.audio.count(&SoundEffect::Beep), 1);
    }

    #[test]
    fn test_failing_script_keeps_ticking() {
        let mut f = fixture("fn on_update(dt) { throw \"boom\"; }", Settings::default());
        f.game.new_game("test", true, 1.0).unwrap();
        play(&mut f.game, 20);
        assert_eq!(f.game.phase(), RunPhase::Playing);
        assert_eq!(f.game.script().failures(), 20);
        assert!(f.game.current_time() > 0.3);
    }

    #[test]
    fn test_execute_events_splits_due_and_later() {
        let mut f = fixture("", Settings::default());
        f.game.new_game("test", true, 1.0).unwrap();
        let events = vec![
            TimedEvent {
                time: 0.0,
                event: LevelEvent::IncrementStop,
            },
            TimedEvent {
                time: 1.0,
                event: LevelEvent::Menu,
            },
        ];
        f.game.execute_events(&events, 0.5);
        assert!(!f.game.status().unwrap().increment_enabled);
        assert_eq!(f.game.phase(), RunPhase::Playing);

        play(&mut f.game, 35);
        assert_eq!(f.game.phase(), RunPhase::Idle);
    }

    #[test]
    fn test_bundled_pack_plays() {
        let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("levels");
        let assets = crate::assets::DirAssets::new(root);
        let mut game = HexagonGame::new(Collaborators::headless(assets), Settings::default(), 3);

        game.new_game("hexagon", true, 1.0).unwrap();
        play(&mut game, 120);
        assert_eq!(game.phase(), RunPhase::Playing);
        assert_eq!(game.script().failures(), 0);
        assert!(!game.run().unwrap().walls.is_empty());

        game.change_level("square", true).unwrap();
        assert_eq!(game.sides(), Some(4));
        assert!(!game.script().is_loaded());
    }

    #[test]
    fn test_update_advances_by_frame_time() {
        let mut f = fixture("", Settings::default());
        f.game.new_game("test", true, 1.0).unwrap();
        f.game.update(0.5);
        assert!((f.game.current_time() - 0.5).abs() < 1e-4);
        f.game.update(0.01);
        assert!((f.game.current_time() - 0.51).abs() < 1e-4);
        f.game.update(0.0);
        assert!((f.game.current_time() - 0.51).abs() < 1e-4);
    }

    #[test]
    fn test_thin_wall_kills_at_low_frame_rate() {
        let mut f = fixture("", Settings::default());
        f.game.new_game("test", true, 1.0).unwrap();
        f.game.set_speed_multiplier(1.6).unwrap();
        let run = f.game.run_mut().unwrap();
        let side = run.geometry().side_of(run.player.angle) as i64;
        run.spawn_wall(side, 24.0, 1.0);

        for _ in 0..60 {
            f.game.update(0.13);
        }
        assert_eq!(f.game.phase(), RunPhase::Dying);
        assert_eq!(f.scores.submitted.borrow().len(), 1);
        // Death cuts the frame short
        let time = f.game.last_result().map(|r| r.time).unwrap();
        assert!(time < 60.0 * 0.13);
    }

    #[test]
    fn test_first_play_reloads_assets() {
        let mut f = fixture("", Settings::default());
        f.game.new_game("test", true, 1.0).unwrap();
        // Stale cached copy stands in for an edited level file
        if let Some(bundle) = f.game.bundle.as_mut() {
            bundle.level.speed_multiplier = 9.0;
        }
        f.game.restart().unwrap();
        assert_eq!(f.game.run().unwrap().level.speed_multiplier, 9.0);

        f.game.new_game("test", true, 1.0).unwrap();
        assert_eq!(f.game.run().unwrap().level.speed_multiplier, 1.0);
    }

    #[test]
    fn test_setters_and_render() {
        let mut f = fixture("", Settings::default());
        assert!(f.game.set_speed_multiplier(2.0).is_err());
        f.game.new_game("test", true, 1.0).unwrap();
        assert_eq!(f.game.set_speed_multiplier(2.0), Ok(2.0));
        assert_eq!(f.game.speed_multiplier(), 2.0);
        assert_eq!(f.game.set_sides(100), Some(64));
        assert_eq!(f.game.sides(), Some(64));
        assert!(f.game.set_rotation_speed(f32::NAN).is_err());

        let mut frame = renderer::FrameCollector::new();
        f.game.render(&mut frame);
        assert_eq!(frame.vertex_count(Layer::Background), 64 * 3);
        f.game
            .render_drawable(&mut frame, Layer::Overlay, &[Vertex::new(0.0, 0.0, [1.0; 4])]);
        assert_eq!(frame.vertex_count(Layer::Overlay), 1);
    }
}
