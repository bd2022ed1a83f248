/// Entry point and game loop.

mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::fs::OpenOptions;
use std::time::{Duration, Instant};

use log::{error, info, LevelFilter};
use rand::Rng;

use config::{GameConfig, LoggingConfig};
use domain::entity::FrameInput;
use domain::rng::game_rng;
use error::GameError;
use sim::event::GameEvent;
use sim::step;
use sim::world::{GameState, Phase};
use ui::gamepad::GamepadState;
use ui::input::{merge_movement, InputState};
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    let config = GameConfig::load();

    match init_logging(&config.logging) {
        Ok(true) => info!("campus-rpg {} starting", env!("CARGO_PKG_VERSION")),
        Ok(false) => {}
        Err(e) => eprintln!("Warning: logging disabled: {e}"),
    }

    // No randomness, no game: fail before touching the terminal.
    let mut rng = match game_rng(config.seed) {
        Ok(r) => r,
        Err(e) => {
            let e = GameError::from(e);
            error!("{e}");
            eprintln!("Fatal: {e}");
            std::process::exit(1);
        }
    };
    if let Some(seed) = config.seed {
        info!("using fixed seed {seed}");
    }

    let mut state = GameState::new(config);
    let mut renderer = Renderer::new();

    let mut kb = InputState::new();
    match renderer.init() {
        Ok(enhanced) => kb.honor_release = enhanced,
        Err(e) => {
            eprintln!("Terminal init failed: {e}");
            return;
        }
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut state, &mut renderer, &mut kb, sound.as_ref(), &mut rng);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        error!("game loop aborted: {e}");
        eprintln!("Game error: {e}");
    }

    info!("exiting after {} ticks (cleared: {})", state.tick, state.cleared);
    println!();
    if state.cleared {
        println!("Your credits are safe! Thanks for playing.");
    } else {
        println!("Thanks for playing.");
    }
}

/// Route `log` output into the configured file. The terminal is in raw
/// alternate-screen mode while playing, so nothing goes to the console.
/// Returns false when no log file is configured.
fn init_logging(cfg: &LoggingConfig) -> Result<bool, GameError> {
    let path = match &cfg.file {
        Some(p) => p,
        None => return Ok(false),
    };
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let level = cfg.level.parse::<LevelFilter>().unwrap_or(LevelFilter::Info);

    env_logger::Builder::new()
        .filter_level(level)
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init()
        .map_err(|e| GameError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
    Ok(true)
}

fn game_loop<R: Rng>(
    state: &mut GameState,
    renderer: &mut Renderer,
    kb: &mut InputState,
    sound: Option<&SoundEngine>,
    rng: &mut R,
) -> Result<(), GameError> {
    let mut gp = GamepadState::new();
    gp.load_button_config(&state.config.gamepad);
    if gp.connected {
        info!("gamepad detected");
    }
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(state.config.speed.tick_rate_ms);

    // Edge-triggered presses survive until the next tick consumes them.
    let mut pending_attack = false;
    let mut pending_confirm = false;

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() || gp.quit_pressed() {
            info!("quit requested in {:?} phase", state.phase);
            break;
        }

        match state.phase {
            Phase::Battle => pending_attack |= kb.attack_pressed() || gp.attack_pressed(),
            Phase::Ending => pending_confirm |= kb.confirm_pressed() || gp.confirm_pressed(),
            Phase::Map => {}
        }

        if last_tick.elapsed() >= tick_rate {
            let input = FrameInput {
                movement: merge_movement(kb.movement(), gp.movement()),
                attack: std::mem::take(&mut pending_attack),
                confirm: std::mem::take(&mut pending_confirm),
            };
            let events = step::step(state, input, rng);
            process_sound_events(sound, &events);
            if events.contains(&GameEvent::QuitRequested) {
                break;
            }
            last_tick = Instant::now();
        }

        renderer.render(state)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn process_sound_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for event in events {
        match event {
            GameEvent::MapEntered { .. } => sfx.play_map_enter(),
            GameEvent::EncounterStarted => sfx.play_encounter(),
            GameEvent::BossAppeared => sfx.play_boss(),
            GameEvent::EnemyHit { .. } => sfx.play_hit(),
            GameEvent::EnemyDefeated => sfx.play_victory(),
            GameEvent::BossDefeated => sfx.play_ending(),
            _ => {}
        }
    }
}
