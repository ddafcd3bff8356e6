// ============================================================================
// headless.rs — WASD Viewport Controls
// Replays a scripted key sequence against an in-memory viewport on a
// simulated clock. No window, no GPU.
// ============================================================================

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::{NavConfig, MAX_REPLAY_MS};
use crate::controller::NavigationController;
use crate::input::InputEvent;
use crate::scene::Viewport;

#[derive(Clone, Debug, Deserialize)]
pub struct CameraStart {
    pub position: Vec3,
    pub target: Vec3,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TimedEvent {
    pub at_ms: u64,
    #[serde(flatten)]
    pub event: InputEvent,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ReplayScript {
    #[serde(default)]
    pub config: NavConfig,
    #[serde(default)]
    pub camera: Option<CameraStart>,
    pub events: Vec<TimedEvent>,
    /// Defaults to the last event's timestamp.
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

impl ReplayScript {
    /// Last simulated millisecond: `duration_ms` or the last event's time.
    pub fn end_ms(&self) -> u64 {
        self.duration_ms
            .or_else(|| self.events.last().map(|e| e.at_ms))
            .unwrap_or(0)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ReplaySummary {
    pub ticks: u32,
    pub distance_travelled: f32,
    pub final_position: [f32; 3],
    pub final_center_of_interest: [f32; 3],
}

pub fn load_script(path: &Path) -> anyhow::Result<ReplayScript> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read replay script {}", path.display()))?;
    parse_script(&text).with_context(|| format!("Invalid replay script {}", path.display()))
}

pub fn parse_script(text: &str) -> anyhow::Result<ReplayScript> {
    let mut script: ReplayScript = serde_json::from_str(text)?;
    if script.events.windows(2).any(|w| w[1].at_ms < w[0].at_ms) {
        log::warn!("Replay events are out of order; sorting by timestamp");
        script.events.sort_by_key(|e| e.at_ms);
    }
    if script.end_ms() > MAX_REPLAY_MS {
        bail!(
            "replay runs for {} ms, longer than the {} ms limit",
            script.end_ms(),
            MAX_REPLAY_MS
        );
    }
    if let Some(cam) = &script.camera {
        if cam.position.distance(cam.target) <= f32::EPSILON {
            bail!("camera position and target coincide");
        }
    }
    Ok(script)
}

/// Run the script to completion, advancing the clock one millisecond at a
/// time and polling the controller the way the event loop would.
pub fn replay(script: &ReplayScript) -> ReplaySummary {
    let mut viewport = Viewport::default();
    if let Some(cam) = &script.camera {
        viewport.camera.look_at(cam.position, cam.target);
    }

    let mut controller = NavigationController::new(script.config.clone());
    controller.install(&mut viewport);

    let end_ms = script.end_ms().min(MAX_REPLAY_MS);

    let start = Instant::now();
    let mut pending = script.events.iter().peekable();
    let mut ticks = 0;
    let mut distance_travelled = 0.0;

    for ms in 0..=end_ms {
        let now = start + Duration::from_millis(ms);
        while let Some(timed) = pending.next_if(|e| e.at_ms <= ms) {
            controller.handle_event(timed.event, now, &mut viewport);
        }
        let before = viewport.camera.position;
        ticks += controller.poll(now, &mut viewport);
        distance_travelled += viewport.camera.position.distance(before);
    }

    let skipped = pending.count();
    if skipped > 0 {
        log::warn!("{} events after duration_ms were not replayed", skipped);
    }

    controller.uninstall(&mut viewport);

    let frame = viewport.camera.frame();
    ReplaySummary {
        ticks,
        distance_travelled,
        final_position: frame.position.to_array(),
        final_center_of_interest: frame.center_of_interest.to_array(),
    }
}

pub fn run_headless(path: &Path) -> anyhow::Result<ReplaySummary> {
    let script = load_script(path)?;
    log::info!(
        "Headless replay: {} events, step {:.3}, tick {} ms",
        script.events.len(),
        script.config.step_size,
        script.config.tick_ms
    );
    let summary = replay(&script);
    log::info!(
        "Replay finished: {} ticks, {:.3} units travelled, camera at {:?}",
        summary.ticks,
        summary.distance_travelled,
        summary.final_position
    );
    Ok(summary)
}
