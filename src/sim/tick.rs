//! Fixed timestep simulation tick
//!
//! One call advances a run by `dt` seconds. The order of the steps matters:
//! time-stop short-circuits everything except messages and cosmetics, events
//! run before the main timeline so they can reshape the level first, and the
//! death check runs last against the final wall positions.

use super::collision::CollisionCheck;
use super::events::LevelEvent;
use super::pulse::{beat_pulse_at, depth_pulse_at, radius, PulseParams};
use super::state::RunState;
use super::timeline::TimelineAction;
use crate::audio::{AudioManager, SoundEffect};
use crate::consts::*;
use crate::script::{ScriptCommand, ScriptHost, ScriptValue};
use crate::settings::Settings;
use crate::{normalize_degrees, smoother_step};

/// Input commands for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    /// -1 counter-clockwise, 0 still, +1 clockwise
    pub movement: i8,
    /// Slow movement
    pub focus: bool,
    /// Jump to the opposite side (levels with swap enabled)
    pub swap: bool,
    pub restart: bool,
    pub exit: bool,
}

/// Collaborators a tick talks to
pub struct TickContext<'a> {
    pub script: &'a mut ScriptHost,
    pub audio: &'a mut AudioManager,
    pub collision: &'a dyn CollisionCheck,
    pub settings: &'a Settings,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Continue,
    /// Player touched a wall
    Died,
    /// An event asked for another level
    ChangeLevel(String),
    /// An event asked for the menu
    ToMenu,
}

/// Advance the run by one fixed timestep
pub fn tick(run: &mut RunState, input: &TickInput, dt: f32, ctx: &mut TickContext) -> TickOutcome {
    // Time-stop freezes gameplay; messages and cosmetics keep going
    if run.status.is_time_stopped() {
        run.status.time_stop = (run.status.time_stop - dt).max(0.0);
        advance_messages(run, dt, ctx);
        update_flash(run, dt);
        update_3d(run, dt, ctx.settings);
        return TickOutcome::Continue;
    }

    // Time and difficulty
    run.status.current_time += dt;
    run.status.increment_time += dt;
    update_increment(run, ctx);

    // Events, messages, per-frame script hook
    for event in run.timelines.events.advance(dt) {
        if let Some(outcome) = execute_event(run, &event, ctx) {
            return outcome;
        }
    }
    advance_messages(run, dt, ctx);
    run_script(run, ctx, "on_update", &[ScriptValue::Float(dt as f64)]);

    update_level(run, dt, ctx);
    update_player(run, input, dt, ctx);
    update_walls(run, dt);
    update_rotation(run, dt, ctx.settings);

    update_pulse(run, dt, ctx.settings);
    update_flash(run, dt);
    update_3d(run, dt, ctx.settings);

    let fatal = ctx
        .collision
        .check_swept(
            &run.geometry(),
            &run.walls,
            run.player.angle,
            run.status.radius + PLAYER_OFFSET,
        )
        .hit;
    if fatal && !ctx.settings.invincible {
        return TickOutcome::Died;
    }
    TickOutcome::Continue
}

/// Cosmetic updates that keep running after death
pub fn update_visuals(run: &mut RunState, dt: f32, settings: &Settings) {
    update_rotation(run, dt, settings);
    update_pulse(run, dt, settings);
    update_flash(run, dt);
    update_3d(run, dt, settings);
}

fn update_increment(run: &mut RunState, ctx: &mut TickContext) {
    let interval = run.level.increment_time;
    if run.status.force_increment {
        run.status.force_increment = false;
        increment_difficulty(run, ctx);
    }
    if !run.status.increment_enabled || interval <= 0.0 {
        return;
    }
    while run.status.increment_time >= interval {
        run.status.increment_time -= interval;
        increment_difficulty(run, ctx);
    }
}

/// One difficulty step: faster, spinning the other way, maybe more sides
pub fn increment_difficulty(run: &mut RunState, ctx: &mut TickContext) {
    ctx.audio.play(SoundEffect::LevelUp);

    let level = &mut run.level;
    let rotation = level.rotation_speed + level.rotation_increment * level.rotation_speed.signum();
    let rotation = if level.rotation_speed_max > 0.0 {
        rotation.clamp(-level.rotation_speed_max, level.rotation_speed_max)
    } else {
        rotation
    };
    if let Err(e) = level.set_rotation_speed(rotation) {
        log::warn!("Rotation increment rejected: {}", e);
    }
    run.status.rotation_direction = -run.status.rotation_direction;
    run.status.fast_spin = level.fast_spin;

    let speed = level.speed_multiplier + level.speed_increment;
    let delay = level.delay_multiplier + level.delay_increment;
    if let Err(e) = level
        .set_speed_multiplier(speed)
        .and_then(|_| level.set_delay_multiplier(delay))
    {
        log::warn!("Pacing increment rejected: {}", e);
    }

    let step = level.difficulty_increment;
    run.status.raise_difficulty(step);
    if run.status.random_side_changes_enabled {
        run.status.must_change_sides = true;
    }
    log::debug!(
        "Increment {} at {:.2}s: difficulty {:.2}",
        run.status.increments,
        run.status.current_time,
        run.status.difficulty_mult
    );

    run_script(run, ctx, "on_increment", &[]);
}

fn advance_messages(run: &mut RunState, dt: f32, ctx: &mut TickContext) {
    for text in run.timelines.messages.advance(dt) {
        log::debug!("Message: {}", text);
        ctx.audio.play(SoundEffect::Beep);
    }
}

fn add_message(run: &mut RunState, settings: &Settings, text: &str, duration: f32, important: bool) {
    if !settings.show_messages {
        return;
    }
    // Regular messages only show the first time a level is played
    if !important && !run.status.first_play {
        return;
    }
    run.timelines.messages.add(text, duration);
}

fn update_level(run: &mut RunState, dt: f32, ctx: &mut TickContext) {
    if run.status.must_change_sides && run.walls.is_empty() {
        let sides = run.random_side_count();
        let applied = run.set_sides(sides);
        run.status.must_change_sides = false;
        log::debug!("Side change to {}", applied);
    }

    for action in run.timelines.main.advance(dt) {
        match action {
            TimelineAction::SpawnWall {
                side,
                thickness,
                speed_adj,
            } => run.spawn_wall(side, thickness, speed_adj),
            TimelineAction::CallScript { function } => run_script(run, ctx, &function, &[]),
        }
    }

    if run.timelines.main.is_finished() && !run.status.must_change_sides {
        run.timelines.main.reset();
        run_script(run, ctx, "on_step", &[]);
    }
}

fn update_player(run: &mut RunState, input: &TickInput, dt: f32, ctx: &mut TickContext) {
    run.player.tick_cooldown(dt);
    let reach = run.status.radius + PLAYER_OFFSET;

    if input.swap && run.level.swap_enabled && run.player.try_swap() {
        ctx.audio.play(SoundEffect::Custom("swap".into()));
    }

    if input.movement == 0 {
        return;
    }
    let next = run.player.next_angle(input.movement, input.focus, dt);
    let blocked = ctx
        .collision
        .check(&run.geometry(), &run.walls, next, reach)
        .hit;
    if !blocked {
        run.player.move_to(next);
    }
}

fn update_walls(run: &mut RunState, dt: f32) {
    for wall in &mut run.walls {
        wall.advance(dt);
    }
    run.walls.retain(|w| !w.is_gone());
}

fn update_rotation(run: &mut RunState, dt: f32, settings: &Settings) {
    let effective = run.effective().rotation;
    let spin = if run.status.fast_spin > 0.0 {
        effective.signum()
            * smoother_step(0.0, run.level.fast_spin, run.status.fast_spin)
            * FAST_SPIN_UNIT
    } else {
        0.0
    };
    run.status.fast_spin = (run.status.fast_spin - dt).max(0.0);
    if settings.rotation {
        run.status.rotation =
            normalize_degrees(run.status.rotation + (effective * ROTATION_UNIT + spin) * dt);
    }
}

fn update_pulse(run: &mut RunState, dt: f32, settings: &Settings) {
    let period = run.beat_period();
    let status = &mut run.status;
    status.pulse_time += dt;
    status.pulse = if settings.pulse {
        PulseParams::from_level(&run.level).value_at(status.pulse_time)
    } else {
        run.level.pulse_min
    };
    status.beat_pulse = if settings.beat_pulse {
        beat_pulse_at(status.pulse_time, run.level.beat_pulse_max, period)
    } else {
        0.0
    };
    status.radius = radius(
        run.level.radius_min,
        status.pulse,
        run.level.pulse_min,
        status.beat_pulse,
    );
}

fn update_flash(run: &mut RunState, dt: f32) {
    run.status.flash_effect = (run.status.flash_effect - FLASH_DECAY * dt).max(0.0);
}

fn update_3d(run: &mut RunState, dt: f32, settings: &Settings) {
    if settings.effective_three_d(run.level.three_d_effect_multiplier) == 0.0 {
        return;
    }
    run.status.depth_time += dt;
    run.status.pulse_3d = depth_pulse_at(
        run.status.depth_time,
        run.style.three_d_pulse_min,
        run.style.three_d_pulse_max,
        run.style.three_d_pulse_speed,
    );
}

/// Call a script function and apply what it queued
pub fn run_script(run: &mut RunState, ctx: &mut TickContext, function: &str, args: &[ScriptValue]) {
    if !ctx.script.has_function(function, args.len()) {
        return;
    }
    ctx.script.sync(run.snapshot());
    let outcome = ctx.script.run_function::<()>(function, args);
    apply_script_commands(run, outcome.commands, ctx);
}

/// Apply queued script commands in order, validating each one
pub fn apply_script_commands(run: &mut RunState, commands: Vec<ScriptCommand>, ctx: &mut TickContext) {
    for command in commands {
        match command {
            ScriptCommand::SetLevelValue { name, value } => {
                if let Err(e) = run.set_level_value(&name, value) {
                    log::warn!("Script mutation rejected: {}", e);
                }
            }
            ScriptCommand::Wall {
                side,
                thickness,
                speed_adj,
            } => run.timelines.main.append(TimelineAction::SpawnWall {
                side,
                thickness,
                speed_adj,
            }),
            ScriptCommand::Wait(duration) => run.timelines.main.wait(duration),
            ScriptCommand::ScheduleCall(function) => run
                .timelines
                .main
                .append(TimelineAction::CallScript { function }),
            ScriptCommand::Message {
                text,
                duration,
                important,
            } => add_message(run, ctx.settings, &text, duration, important),
            ScriptCommand::ClearMessages => run.timelines.messages.clear(),
            ScriptCommand::TimeStop(duration) => run.status.time_stop = duration.max(0.0),
            ScriptCommand::Flash(intensity) => flash(run, ctx.settings, intensity),
            ScriptCommand::RequestSideChange => run.status.must_change_sides = true,
            ScriptCommand::ForceIncrement => run.status.force_increment = true,
            ScriptCommand::ReverseRotation => {
                run.status.rotation_direction = -run.status.rotation_direction
            }
            ScriptCommand::PlaySound(id) => ctx.audio.play(SoundEffect::from_id(&id)),
            ScriptCommand::ClearTimeline => run.timelines.main.clear(),
            ScriptCommand::SetIncrementEnabled(enabled) => run.status.increment_enabled = enabled,
            ScriptCommand::SetSideChangesEnabled(enabled) => {
                run.status.random_side_changes_enabled = enabled
            }
        }
    }
}

fn flash(run: &mut RunState, settings: &Settings, intensity: f32) {
    if settings.flash {
        run.status.flash_effect = intensity.clamp(0.0, FLASH_MAX);
    }
}

/// Execute one level event. Returns an outcome when the event ends the run.
pub fn execute_event(run: &mut RunState, event: &LevelEvent, ctx: &mut TickContext) -> Option<TickOutcome> {
    if let Some((op, name, value)) = event.value_op() {
        if let Err(e) = run.apply_value_op(op, name, value) {
            log::warn!("Level event rejected: {}", e);
        }
        return None;
    }

    match event {
        LevelEvent::MessageAdd { message, duration } => {
            add_message(run, ctx.settings, message, *duration, false)
        }
        LevelEvent::MessageImportantAdd { message, duration } => {
            add_message(run, ctx.settings, message, *duration, true)
        }
        LevelEvent::MessageClear => run.timelines.messages.clear(),
        LevelEvent::TimeStop { duration } => run.status.time_stop = duration.max(0.0),
        LevelEvent::TimelineWait { duration } => run.timelines.main.wait(*duration),
        LevelEvent::TimelineClear => run.timelines.main.clear(),
        LevelEvent::IncrementStop => run.status.increment_enabled = false,
        LevelEvent::IncrementStart => run.status.increment_enabled = true,
        LevelEvent::SideChangingStop => run.status.random_side_changes_enabled = false,
        LevelEvent::SideChangingRestart => run.status.random_side_changes_enabled = true,
        LevelEvent::Flash { intensity } => flash(run, ctx.settings, *intensity),
        LevelEvent::RotationReverse => {
            run.status.rotation_direction = -run.status.rotation_direction
        }
        LevelEvent::PlaySound { id } => ctx.audio.play(SoundEffect::from_id(id)),
        LevelEvent::ScriptCall { function } => run_script(run, ctx, function, &[]),
        LevelEvent::LevelChange { id } => return Some(TickOutcome::ChangeLevel(id.clone())),
        LevelEvent::Menu => return Some(TickOutcome::ToMenu),
        LevelEvent::LevelFloatSet { .. }
        | LevelEvent::LevelFloatAdd { .. }
        | LevelEvent::LevelFloatSubtract { .. }
        | LevelEvent::LevelFloatMultiply { .. }
        | LevelEvent::LevelFloatDivide { .. } => {}
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::MemoryAudio;
    use crate::data::{LevelData, MusicData, StyleData};
    use crate::script::{rhai_factory, ScriptHost};
    use crate::sim::collision::SectorCollision;
    use crate::sim::events::TimedEvent;
    use crate::sim::wall::Wall;

    struct Harness {
        run: RunState,
        script: ScriptHost,
        audio: AudioManager,
        sink: MemoryAudio,
        settings: Settings,
    }

    impl Harness {
        fn new(level: LevelData) -> Self {
            let sink = MemoryAudio::new();
            Self {
                run: RunState::new(
                    "test",
                    level,
                    StyleData::default(),
                    MusicData::default(),
                    1.0,
                    true,
                    7,
                ),
                script: ScriptHost::empty(),
                audio: AudioManager::new(Box::new(sink.clone())),
                sink,
                settings: Settings::default(),
            }
        }

        fn with_script(mut self, source: &str) -> Self {
            self.script = ScriptHost::compile(&rhai_factory(), "test", source, 7).unwrap();
            self
        }

        fn step(&mut self, input: &TickInput) -> TickOutcome {
            let mut ctx = TickContext {
                script: &mut self.script,
                audio: &mut self.audio,
                collision: &SectorCollision,
                settings: &self.settings,
            };
            tick(&mut self.run, input, SIM_DT, &mut ctx)
        }

        fn steps(&mut self, n: usize) -> TickOutcome {
            let input = TickInput::default();
            for _ in 0..n {
                let outcome = self.step(&input);
                if outcome != TickOutcome::Continue {
                    return outcome;
                }
            }
            TickOutcome::Continue
        }
    }

    #[test]
    fn test_difficulty_rises_once_per_interval() {
        let mut h = Harness::new(LevelData::default());
        h.steps(899);
        assert_eq!(h.run.status.difficulty_mult, 1.0);
        assert_eq!(h.run.status.increments, 0);

        h.steps(101);
        assert!((h.run.status.difficulty_mult - 1.1).abs() < 1e-5);
        assert_eq!(h.run.status.increments, 1);

        h.steps(900);
        assert!((h.run.status.difficulty_mult - 1.2).abs() < 1e-5);
        assert_eq!(h.run.status.increments, 2);
        assert_eq!(h.sink.count(&SoundEffect::LevelUp), 2);
    }

    #[test]
    fn test_increment_reverses_rotation_and_grows_speed() {
        let level = LevelData {
            rotation_speed: 0.1,
            rotation_increment: 0.05,
            rotation_speed_max: 0.12,
            speed_increment: 0.2,
            fast_spin: 1.0,
            ..Default::default()
        };
        let mut h = Harness::new(level);
        // A parked wall keeps the requested side change pending
        h.run.walls.push(Wall {
            side: 0,
            distance: 1000.0,
            thickness: 10.0,
            speed: 0.0,
            travelled: 0.0,
        });
        let direction = h.run.status.rotation_direction;
        h.run.status.force_increment = true;
        h.steps(1);

        assert_eq!(h.run.status.rotation_direction, -direction);
        assert!((h.run.level.rotation_speed - 0.12).abs() < 1e-6);
        assert!((h.run.level.speed_multiplier - 1.2).abs() < 1e-6);
        assert!(h.run.status.fast_spin > 0.0);
        assert!(h.run.status.must_change_sides);
    }

    #[test]
    fn test_time_stop_freezes_gameplay() {
        let mut h = Harness::new(LevelData::default());
        h.run.walls.push(Wall::new(0, 40.0, 300.0));
        h.run.timelines.messages.add("hold", 5.0);
        h.run.status.time_stop = 0.5;
        h.run.status.flash_effect = 100.0;

        h.steps(10);
        assert_eq!(h.run.status.current_time, 0.0);
        assert_eq!(h.run.walls[0].distance, WALL_SPAWN_DISTANCE);
        assert!(h.run.status.flash_effect < 100.0);
        assert_eq!(h.run.timelines.messages.visible(), Some("hold"));
        assert_eq!(h.run.timelines.events.clock(), 0.0);

        h.steps(40);
        assert!(h.run.status.current_time > 0.0);
    }

    #[test]
    fn test_wall_kills_player() {
        let mut h = Harness::new(LevelData::default());
        let side = h.run.geometry().side_of(h.run.player.angle) as i64;
        h.run.spawn_wall(side, 200.0, 1.0);
        // 1600 units at 300/s
        let outcome = h.steps(600);
        assert_eq!(outcome, TickOutcome::Died);
    }

    #[test]
    fn test_invincible_survives() {
        let mut h = Harness::new(LevelData::default());
        h.settings.invincible = true;
        let side = h.run.geometry().side_of(h.run.player.angle) as i64;
        h.run.spawn_wall(side, 200.0, 1.0);
        assert_eq!(h.steps(600), TickOutcome::Continue);
    }

    #[test]
    fn test_movement_is_blocked_by_walls() {
        let mut h = Harness::new(LevelData::default());
        let geo = h.run.geometry();
        let side = geo.side_of(h.run.player.angle);
        // Park a wall on the neighbouring side, right at the player radius
        h.run.walls.push(Wall {
            side: geo.wrap_side(side as i64 + 1),
            distance: 0.0,
            thickness: 500.0,
            speed: 0.0,
            travelled: 0.0,
        });
        h.run.player = crate::sim::wall::Player::at(geo.side_start(side) + geo.span - 1.0);
        let before = h.run.player.angle;
        let input = TickInput {
            movement: 1,
            ..Default::default()
        };
        h.step(&input);
        assert_eq!(h.run.player.angle, before);

        let back = TickInput {
            movement: -1,
            ..Default::default()
        };
        h.step(&back);
        assert!(h.run.player.angle < before);
    }

    #[test]
    fn test_events_fire_in_schedule() {
        let level = LevelData {
            events: vec![
                TimedEvent {
                    time: 0.0,
                    event: LevelEvent::MessageAdd {
                        message: "welcome".into(),
                        duration: 2.0,
                    },
                },
                TimedEvent {
                    time: 0.5,
                    event: LevelEvent::LevelFloatSet {
                        value_name: "sides".into(),
                        value: 5.0,
                    },
                },
                TimedEvent {
                    time: 1.0,
                    event: LevelEvent::LevelChange { id: "next".into() },
                },
            ],
            ..Default::default()
        };
        let mut h = Harness::new(level);
        h.steps(1);
        assert_eq!(h.run.timelines.messages.visible(), Some("welcome"));
        assert_eq!(h.sink.count(&SoundEffect::Beep), 1);

        h.steps(31);
        assert_eq!(h.run.geometry().sides, 5);

        assert_eq!(h.steps(60), TickOutcome::ChangeLevel("next".into()));
    }

    #[test]
    fn test_messages_skip_on_replay() {
        let mut h = Harness::new(LevelData::default());
        h.run.status.first_play = false;
        let mut ctx = TickContext {
            script: &mut h.script,
            audio: &mut h.audio,
            collision: &SectorCollision,
            settings: &h.settings,
        };
        let regular = LevelEvent::MessageAdd {
            message: "tip".into(),
            duration: 1.0,
        };
        let important = LevelEvent::MessageImportantAdd {
            message: "warning".into(),
            duration: 1.0,
        };
        execute_event(&mut h.run, &regular, &mut ctx);
        execute_event(&mut h.run, &important, &mut ctx);
        h.run.timelines.messages.advance(0.0);
        assert_eq!(h.run.timelines.messages.visible(), Some("warning"));
        assert_eq!(h.run.timelines.messages.pending(), 1);
    }

    #[test]
    fn test_script_step_refills_timeline() {
        let mut h = Harness::new(LevelData::default()).with_script(
            r#"
            fn on_step() {
                wall(get_random_side(), 40);
                wait(1.0);
            }
            "#,
        );
        h.steps(1);
        assert_eq!(h.run.walls.len(), 0);
        h.steps(1);
        assert_eq!(h.run.walls.len(), 1);
        h.steps(70);
        assert_eq!(h.run.walls.len(), 2);
    }

    #[test]
    fn test_failing_script_leaves_status_untouched() {
        let mut h = Harness::new(LevelData::default()).with_script(
            r#"
            fn on_update(dt) {
                set_speed_mult(5.0);
                flash(200);
                throw "broken";
            }
            "#,
        );
        h.steps(10);
        assert_eq!(h.run.level.speed_multiplier, 1.0);
        assert_eq!(h.run.status.flash_effect, 0.0);
        assert_eq!(h.script.failures(), 10);
        assert!(h.run.status.current_time > 0.15);
    }

    #[test]
    fn test_script_commands_apply_in_order() {
        let mut h = Harness::new(LevelData::default());
        let mut ctx = TickContext {
            script: &mut h.script,
            audio: &mut h.audio,
            collision: &SectorCollision,
            settings: &h.settings,
        };
        apply_script_commands(
            &mut h.run,
            vec![
                ScriptCommand::SetLevelValue {
                    name: "sides".into(),
                    value: 8.0,
                },
                ScriptCommand::SetLevelValue {
                    name: "bogus".into(),
                    value: 1.0,
                },
                ScriptCommand::Flash(999.0),
                ScriptCommand::TimeStop(1.5),
                ScriptCommand::ReverseRotation,
                ScriptCommand::SetIncrementEnabled(false),
            ],
            &mut ctx,
        );
        assert_eq!(h.run.geometry().sides, 8);
        assert_eq!(h.run.status.flash_effect, FLASH_MAX);
        assert_eq!(h.run.status.time_stop, 1.5);
        assert_eq!(h.run.status.rotation_direction, -1.0);
        assert!(!h.run.status.increment_enabled);
    }

    #[test]
    fn test_side_change_waits_for_walls() {
        let level = LevelData {
            sides_min: 4,
            sides_max: 4,
            ..Default::default()
        };
        let mut h = Harness::new(level);
        h.run.walls.push(Wall {
            side: 0,
            distance: 500.0,
            thickness: 10.0,
            speed: 0.0,
            travelled: 0.0,
        });
        h.run.status.must_change_sides = true;
        h.steps(2);
        assert_eq!(h.run.geometry().sides, 6);

        h.run.walls.clear();
        h.steps(1);
        assert_eq!(h.run.geometry().sides, 4);
        assert!(!h.run.status.must_change_sides);
    }

    #[test]
    fn test_disabled_pulse_pins_radius() {
        let level = LevelData {
            pulse_min: 75.0,
            pulse_max: 85.0,
            pulse_speed: 10.0,
            pulse_speed_r: 10.0,
            beat_pulse_max: 10.0,
            beat_pulse_delay_max: 0.5,
            ..Default::default()
        };
        let mut h = Harness::new(level);
        h.settings.pulse = false;
        h.settings.beat_pulse = false;
        h.steps(30);
        assert_eq!(h.run.status.radius, h.run.level.radius_min);
    }

    /// Shortest signed angle from `a` to `b`
    fn turned(a: f32, b: f32) -> f32 {
        let d = (b - a).rem_euclid(360.0);
        if d > 180.0 { d - 360.0 } else { d }
    }

    #[test]
    fn test_rotation_follows_effective_speed() {
        let level = LevelData {
            rotation_speed: 0.1,
            ..Default::default()
        };
        let mut h = Harness::new(level);
        let expected = h.run.effective().rotation * ROTATION_UNIT * SIM_DT;
        assert!(expected.abs() > 0.5);

        let before = h.run.status.rotation;
        h.steps(1);
        assert!((turned(before, h.run.status.rotation) - expected).abs() < 1e-3);

        {
            let mut ctx = TickContext {
                script: &mut h.script,
                audio: &mut h.audio,
                collision: &SectorCollision,
                settings: &h.settings,
            };
            execute_event(&mut h.run, &LevelEvent::RotationReverse, &mut ctx);
        }
        let before = h.run.status.rotation;
        h.steps(1);
        assert!((turned(before, h.run.status.rotation) + expected).abs() < 1e-3);

        h.settings.rotation = false;
        let before = h.run.status.rotation;
        h.steps(10);
        assert_eq!(h.run.status.rotation, before);
    }

    #[test]
    fn test_depth_pulse_needs_3d() {
        let mut h = Harness::new(LevelData::default());
        h.settings.three_d = false;
        h.steps(20);
        assert_eq!(h.run.status.depth_time, 0.0);
        assert_eq!(h.run.status.pulse_3d, 0.0);

        let level = LevelData {
            three_d_effect_multiplier: 0.0,
            ..Default::default()
        };
        let mut h = Harness::new(level);
        h.steps(20);
        assert_eq!(h.run.status.depth_time, 0.0);
        assert_eq!(h.run.status.pulse_3d, 0.0);

        let mut h = Harness::new(LevelData::default());
        h.steps(20);
        let t = h.run.status.depth_time;
        assert!((t - 20.0 * SIM_DT).abs() < 1e-4);
        let style = &h.run.style;
        let expected = depth_pulse_at(
            t,
            style.three_d_pulse_min,
            style.three_d_pulse_max,
            style.three_d_pulse_speed,
        );
        assert_eq!(h.run.status.pulse_3d, expected);
        assert!(h.run.status.pulse_3d > 0.0);
    }

    #[test]
    fn test_long_tick_raises_once_per_crossing() {
        let mut h = Harness::new(LevelData::default());
        let mut ctx = TickContext {
            script: &mut h.script,
            audio: &mut h.audio,
            collision: &SectorCollision,
            settings: &h.settings,
        };
        tick(&mut h.run, &TickInput::default(), 31.0, &mut ctx);
        assert_eq!(h.run.status.increments, 2);
        assert!((h.run.status.difficulty_mult - 1.2).abs() < 1e-5);
        assert!((h.run.status.increment_time - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_thin_fast_wall_still_kills() {
        let level = LevelData {
            speed_multiplier: 1.6,
            ..Default::default()
        };
        let mut h = Harness::new(level);
        let side = h.run.geometry().side_of(h.run.player.angle) as i64;
        h.run.spawn_wall(side, 24.0, 1.0);
        let mut died = false;
        for _ in 0..60 {
            let mut ctx = TickContext {
                script: &mut h.script,
                audio: &mut h.audio,
                collision: &SectorCollision,
                settings: &h.settings,
            };
            if tick(&mut h.run, &TickInput::default(), 0.13, &mut ctx) == TickOutcome::Died {
                died = true;
                break;
            }
        }
        assert!(died);
    }
}
