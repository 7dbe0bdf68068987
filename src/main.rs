//! # PB Clock Application Entry Point
//!
//! Wires the configuration, source adapters, store and board together and
//! drives the two timers:
//! - **Slow tick** (default 600s): full refresh cycle in a spawned task,
//!   followed by a full board render
//! - **Fast tick** (default 1s): clock cell only
//!
//! The refresh never runs on the timer task itself, so a slow source can't
//! hold up the clock. `--once` runs a single cycle, prints the board and
//! exits.

// Test modules
#[cfg(test)]
mod tests;

use anyhow::Context;
use chrono::Utc;
use chrono_tz::Tz;
use parking_lot::Mutex;
use pbclock_lib::board::AsciiBoard;
use pbclock_lib::cells::{self, CellSpec, RenderContext, BOARD, CLOCK_CELL};
use pbclock_lib::config::Config;
use pbclock_lib::refresh::{Adapters, Refresher};
use pbclock_lib::sources::http_client;
use pbclock_lib::store::{self, DataStore};
use std::env;
use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;
use tracing_subscriber::EnvFilter;

const BOARD_ROWS: usize = 2;
const BOARD_COLS: usize = 4;

/// The parts of [`Config`] the timer loop needs after startup.
#[derive(Clone, Copy, Debug)]
struct Settings {
    tz: Tz,
    launch_margin: chrono::Duration,
    refresh_interval: Duration,
    clock_interval: Duration,
    interactive: bool,
}

impl Settings {
    fn from_config(config: &Config, interactive: bool) -> Self {
        Self {
            tz: config.location.timezone,
            launch_margin: config.launch_margin(),
            refresh_interval: config.refresh_interval(),
            clock_interval: config.clock_interval(),
            interactive,
        }
    }

    fn render_context(&self) -> RenderContext {
        RenderContext {
            now: Utc::now(),
            tz: self.tz,
            launch_margin: self.launch_margin,
        }
    }
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they don't interleave with the board on stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let run_once = env::args().any(|arg| arg == "--once");
    let config = Config::load();
    info!(
        location = %config.location.name,
        postal_code = %config.location.postal_code,
        refresh_secs = config.schedule.refresh_interval_secs,
        "Starting PB Clock"
    );

    let client = http_client(config.http_timeout()).context("building HTTP client")?;
    let refresher = Arc::new(Refresher::new(
        Adapters::from_config(&config, client),
        store::shared(DataStore::default()),
        config.adapter_timeout(),
    ));
    let interactive = std::io::stdout().is_terminal();
    let settings = Settings::from_config(&config, interactive);
    let board = Arc::new(Mutex::new(
        AsciiBoard::new(BOARD_ROWS, BOARD_COLS).with_color(interactive),
    ));

    let rt = tokio::runtime::Runtime::new()?;

    if run_once {
        let report = rt.block_on(refresher.refresh());
        info!(?report, "Single refresh finished");
        redraw(&refresher, &board, &settings, &BOARD, false);
        return Ok(());
    }

    rt.block_on(run(refresher, board, settings));
    Ok(())
}

/// Timer loop; returns on Ctrl-C.
async fn run(refresher: Arc<Refresher>, board: Arc<Mutex<AsciiBoard>>, settings: Settings) {
    let mut slow = interval(settings.refresh_interval);
    slow.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut fast = interval(settings.clock_interval);
    fast.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = slow.tick() => {
                let refresher = Arc::clone(&refresher);
                let board = Arc::clone(&board);
                tokio::spawn(async move {
                    if refresher.refresh().await.is_some() {
                        redraw(&refresher, &board, &settings, &BOARD, settings.interactive);
                    }
                });
            }
            _ = fast.tick() => {
                redraw(&refresher, &board, &settings, &[CLOCK_CELL], settings.interactive);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl-C, shutting down");
                break;
            }
        }
    }
}

/// Render `cells` from a fresh store snapshot and print the board.
fn redraw(
    refresher: &Refresher,
    board: &Mutex<AsciiBoard>,
    settings: &Settings,
    cells: &[CellSpec],
    clear_screen: bool,
) {
    let snapshot = refresher.store().read().clone();
    let ctx = settings.render_context();

    let mut board = board.lock();
    cells::render_cells(cells, &snapshot, &ctx, &mut *board);
    if clear_screen {
        print!("\x1b[2J\x1b[H");
    }
    print!("{}", board.draw());
}
