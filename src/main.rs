// ============================================================================
// main.rs — WASD Viewport Controls
// Entry point. Parses the command line, initializes logging, and runs either
// the interactive viewport or a headless replay.
// ============================================================================

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use wasd_viewport::app::{App, AppConfig};
use wasd_viewport::config::{clamp_step, NavConfig, DEFAULT_STEP, DEFAULT_TICK_MS};
use wasd_viewport::headless;
use winit::event_loop::EventLoop;

#[derive(Parser, Debug)]
#[command(name = "wasd-viewport")]
#[command(about = "Alt + WASDQE fly navigation for a 3D viewport camera")]
struct Cli {
    /// Initial move step (clamped to 0.01..=0.20)
    #[arg(long, default_value_t = DEFAULT_STEP)]
    step: f32,

    /// Movement tick period in milliseconds
    #[arg(long, default_value_t = DEFAULT_TICK_MS)]
    tick_ms: u64,

    /// Cap on world units travelled per tick
    #[arg(long)]
    max_tick_distance: Option<f32>,

    /// Install the controls at start-up
    #[arg(long)]
    enabled: bool,

    /// Replay a JSON key script without opening a window
    #[arg(long, value_name = "SCRIPT")]
    headless: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if let Some(script) = &cli.headless {
        let summary = headless::run_headless(script)?;
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let nav = NavConfig {
        step_size: clamp_step(cli.step),
        tick_ms: cli.tick_ms,
        max_tick_distance: cli.max_tick_distance,
        ..NavConfig::default()
    };

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let mut app = App::new(AppConfig {
        nav,
        start_enabled: cli.enabled,
    });
    event_loop.run_app(&mut app).context("Event loop terminated with an error")?;
    Ok(())
}
