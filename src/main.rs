//! Brick Pilot entry point
//!
//! Headless driver: lets the autopilot play for a fixed number of ticks and
//! prints a JSON summary.
//!
//! Usage: `brick-pilot [tuning.json] [ticks]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use brick_pilot::Tuning;
    use brick_pilot::sim::{GameEvent, GamePhase, GameState, TickInput, tick};

    env_logger::init();
    log::info!("Brick Pilot (headless) starting...");

    let mut args = std::env::args().skip(1);
    let tuning = match args.next() {
        Some(path) => Tuning::load_or_default(path),
        None => Tuning::default(),
    };
    let ticks: u64 = args
        .next()
        .and_then(|raw| match raw.parse() {
            Ok(ticks) => Some(ticks),
            Err(e) => {
                log::warn!("Invalid tick count {raw:?}: {e}");
                None
            }
        })
        .unwrap_or(36_000);

    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    let mut state = GameState::new(tuning, seed);
    log::info!("Game initialized with seed: {}", seed);

    let advance = TickInput {
        action: true,
        ..Default::default()
    };
    let engage = TickInput {
        toggle_autopilot: true,
        ..Default::default()
    };
    let idle = TickInput::default();

    let mut games = 1u32;
    let mut levels_cleared = 0u32;
    let mut bricks_destroyed = 0u64;
    for _ in 0..ticks {
        let input = match state.phase {
            GamePhase::LevelComplete | GamePhase::GameOver => &advance,
            _ if !state.autopilot.enabled => &engage,
            _ => &idle,
        };
        tick(&mut state, input);

        for event in state.drain_events() {
            match event {
                GameEvent::BrickDestroyed { .. } => bricks_destroyed += 1,
                GameEvent::LevelCleared { .. } => levels_cleared += 1,
                GameEvent::GameOver { .. } => games += 1,
                _ => {}
            }
        }
    }

    let summary = serde_json::json!({
        "seed": seed,
        "ticks": ticks,
        "games": games,
        "levels_cleared": levels_cleared,
        "bricks_destroyed": bricks_destroyed,
        "score": state.score,
        "level": state.level,
        "lives": state.lives,
        "credits": state.credits,
        "best": {
            "score": state.scoreboard.best_score,
            "level": state.scoreboard.best_level,
            "credits": state.scoreboard.best_credits,
        },
        "top_record": state.scoreboard.top_score(),
        "records": state.scoreboard.records,
    });
    match serde_json::to_string_pretty(&summary) {
        Ok(text) => println!("{text}"),
        Err(e) => log::error!("Failed to serialize summary: {e}"),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // No headless driver on wasm; embed the library instead
}
