use std::io::{self, BufRead, Write};

use anyhow::{anyhow, Context};
use tracing::info;

use geoguess_state::{
    telemetry, AppState, Config, FileCatalog, GameManager, Location, RandomRoundSource,
};

fn parse_guess(line: &str) -> anyhow::Result<Location> {
    let (lat, lon) = line
        .split_once(',')
        .ok_or_else(|| anyhow!("expected 'lat,lon', got '{}'", line.trim()))?;
    let lat: f64 = lat.trim().parse().context("latitude is not a number")?;
    let lon: f64 = lon.trim().parse().context("longitude is not a number")?;
    Ok(Location::new(lat, lon)?)
}

fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    telemetry::init(&config.log_filter)?;

    let catalog = FileCatalog::open(&config.data_dir)
        .with_context(|| format!("loading catalog from {}", config.data_dir.display()))?;
    let games = GameManager::with_settings(config.rounds_per_game, config.round_id_policy);
    let mut app = AppState::with_manager(games, RandomRoundSource::new(catalog));

    let game_id = app.create_game()?.id;
    info!(%game_id, "Starting game");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut stdout = io::stdout();

    loop {
        let state = app.get_state(&game_id)?;
        let Some(round_id) = state.current_round_id else {
            break;
        };
        let round = &state.rounds[state.current_round_index];
        writeln!(
            stdout,
            "Round {}/{}: {}",
            state.current_round_index + 1,
            state.rounds.len(),
            round.image_url
        )?;
        write!(stdout, "Your guess (lat,lon): ")?;
        stdout.flush()?;

        let Some(line) = lines.next() else {
            info!(%game_id, "Input closed before the game finished");
            return Ok(());
        };
        let guess = match parse_guess(&line?) {
            Ok(guess) => guess,
            Err(e) => {
                writeln!(stdout, "{e:#}")?;
                continue;
            }
        };

        let outcome = app.submit_guess(&game_id, round_id, guess)?;
        writeln!(stdout, "{}", serde_json::to_string_pretty(&outcome)?)?;
    }

    writeln!(
        stdout,
        "{}",
        serde_json::to_string_pretty(&app.get_state(&game_id)?)?
    )?;
    Ok(())
}
