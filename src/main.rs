//! Headless runner
//!
//! Plays one level of a level pack with a scripted input pattern and reports
//! the run. Usage: `hexagon-core [pack dir] [level id] [seconds]`.

use std::path::PathBuf;

use hexagon_core::assets::DirAssets;
use hexagon_core::consts::{MAX_SUBSTEPS, SIM_DT};
use hexagon_core::highscores::{format_time, ScoreBoard};
use hexagon_core::renderer::FrameCollector;
use hexagon_core::script::rhai_factory;
use hexagon_core::sim::{SectorCollision, TickInput};
use hexagon_core::{Collaborators, HexagonGame, RunPhase, Settings};

/// Frame time of the simulated display
const FRAME_TIME: f32 = 1.0 / 144.0;

struct Driver {
    game: HexagonGame,
    accumulator: f32,
}

impl Driver {
    /// Run fixed simulation steps for one display frame
    fn frame(&mut self, dt: f32) {
        self.accumulator += dt.min(0.1);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.game.update(SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
    }
}

/// Sway left and right, switching direction every 1.5 seconds
fn autopilot(time: f32) -> TickInput {
    let phase = (time / 1.5) as u32;
    TickInput {
        movement: if phase % 2 == 0 { 1 } else { -1 },
        ..Default::default()
    }
}

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let root = PathBuf::from(args.next().unwrap_or_else(|| "levels".to_string()));
    let requested = args.next();
    let seconds: f32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(60.0);

    let assets = DirAssets::new(&root);
    let level_id = match requested {
        Some(id) => id,
        None => match assets.level_ids() {
            Ok(ids) if !ids.is_empty() => ids[0].clone(),
            Ok(_) => {
                log::error!("No levels in {}", root.display());
                std::process::exit(1);
            }
            Err(e) => {
                log::error!("{}", e);
                std::process::exit(1);
            }
        },
    };

    let settings = Settings::load(&root.join("settings.json"));
    let difficulty = settings.difficulty_mult;
    let collaborators = Collaborators {
        scores: Box::new(ScoreBoard::open(root.join("scores.json"))),
        collision: Box::new(SectorCollision),
        script: rhai_factory(),
        ..Collaborators::headless(assets)
    };
    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let mut game = HexagonGame::new(collaborators, settings, seed);

    log::info!("Hexagon Core (headless) starting {}", level_id);
    if let Err(e) = game.new_game(&level_id, true, difficulty) {
        log::error!("Could not start {}: {}", level_id, e);
        std::process::exit(1);
    }

    let mut driver = Driver {
        game,
        accumulator: 0.0,
    };
    let mut frame = FrameCollector::new();
    let mut elapsed = 0.0;
    while elapsed < seconds && driver.game.phase() == RunPhase::Playing {
        let input = autopilot(driver.game.current_time());
        driver.game.set_input(input);
        driver.frame(FRAME_TIME);

        frame.clear();
        driver.game.render(&mut frame);
        elapsed += FRAME_TIME;
    }

    match driver.game.phase() {
        RunPhase::Dying => {
            if let Some(result) = driver.game.last_result() {
                println!(
                    "{}: died at {} ({} increments{})",
                    result.level_id,
                    format_time(result.time),
                    result.increments,
                    if result.new_best { ", new best" } else { "" }
                );
            }
        }
        RunPhase::Playing => {
            println!("{}: survived {}", level_id, format_time(driver.game.current_time()));
            driver.game.go_to_menu(false);
        }
        RunPhase::Idle => println!("{}: left to menu", level_id),
    }
}
