// ============================================================================
// config.rs — WASD Viewport Controls
// Navigation constants, runtime configuration, and slider/step mapping.
// ============================================================================

use std::time::Duration;

use serde::Deserialize;

// ======================== Constants ========================

pub const STEP_MIN: f32 = 0.01;
pub const STEP_MAX: f32 = 0.20;
pub const DEFAULT_STEP: f32 = 0.1;

/// Damping applied on top of the distance-to-COI scale.
pub const MOVE_SCALE_FACTOR: f32 = 0.1;

/// Lower is smoother, at a small cost in host work per second.
pub const DEFAULT_TICK_MS: u64 = 5;

/// Longest accepted tick period. Larger values are clamped.
pub const MAX_TICK_MS: u64 = 1000;

/// Slider integers map to step sizes via `value / SLIDER_SCALE`.
pub const SLIDER_SCALE: f32 = 100.0;

/// Ticks replayed in one poll after the event loop stalls.
pub const MAX_CATCH_UP_TICKS: u32 = 8;

/// Longest simulated run a replay script may request (one hour).
pub const MAX_REPLAY_MS: u64 = 60 * 60 * 1000;

/// Window title and overlay label.
pub const TOOL_TITLE: &str = "WASD Viewport Controls";
pub const OVERLAY_HELP: &str = "Use Alt + WASDQE, Alt+F - frame selected";

// ======================== Runtime Config ========================

/// Runtime navigation parameters. Every field has a default so partial
/// overrides deserialize cleanly from replay scripts.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    pub step_size: f32,
    pub tick_ms: u64,
    pub move_scale_factor: f32,
    /// Upper bound on world units travelled in one tick. `None` keeps the
    /// unbounded distance-to-COI scaling.
    pub max_tick_distance: Option<f32>,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            step_size: DEFAULT_STEP,
            tick_ms: DEFAULT_TICK_MS,
            move_scale_factor: MOVE_SCALE_FACTOR,
            max_tick_distance: None,
        }
    }
}

impl NavConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms.clamp(1, MAX_TICK_MS))
    }
}

// ======================== Step Mapping ========================

pub fn clamp_step(step: f32) -> f32 {
    if step.is_nan() {
        return DEFAULT_STEP;
    }
    step.clamp(STEP_MIN, STEP_MAX)
}

/// Inclusive integer range shown by the step slider.
pub fn slider_range() -> std::ops::RangeInclusive<i32> {
    slider_from_raw(STEP_MIN)..=slider_from_raw(STEP_MAX)
}

/// Slider value → step size. Out-of-range inputs are clamped.
pub fn step_from_slider(value: i32) -> f32 {
    clamp_step(value as f32 / SLIDER_SCALE)
}

/// Step size → nearest slider value, kept inside the slider range.
pub fn slider_from_step(step: f32) -> i32 {
    let range = slider_range();
    slider_from_raw(clamp_step(step)).clamp(*range.start(), *range.end())
}

fn slider_from_raw(step: f32) -> i32 {
    (step * SLIDER_SCALE).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slider_range_matches_step_bounds() {
        assert_eq!(slider_range(), 1..=20);
    }

    #[test]
    fn step_from_slider_clamps_out_of_range_values() {
        assert!((step_from_slider(10) - 0.10).abs() < 1e-6);
        assert!((step_from_slider(-50) - STEP_MIN).abs() < 1e-6);
        assert!((step_from_slider(0) - STEP_MIN).abs() < 1e-6);
        assert!((step_from_slider(500) - STEP_MAX).abs() < 1e-6);
        assert!((step_from_slider(i32::MAX) - STEP_MAX).abs() < 1e-6);
    }

    #[test]
    fn slider_from_step_rounds_and_clamps() {
        assert_eq!(slider_from_step(0.1), 10);
        assert_eq!(slider_from_step(0.126), 13);
        assert_eq!(slider_from_step(5.0), 20);
        assert_eq!(slider_from_step(-1.0), 1);
    }

    #[test]
    fn clamp_step_rejects_nan() {
        assert_eq!(clamp_step(f32::NAN), DEFAULT_STEP);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg: NavConfig = serde_json::from_str(r#"{ "tick_ms": 10 }"#).unwrap();
        assert_eq!(cfg.tick_ms, 10);
        assert_eq!(cfg.step_size, DEFAULT_STEP);
        assert!(cfg.max_tick_distance.is_none());
        assert_eq!(cfg.tick_interval(), Duration::from_millis(10));
    }

    #[test]
    fn tick_interval_is_bounded() {
        let huge = NavConfig { tick_ms: u64::MAX, ..NavConfig::default() };
        assert_eq!(huge.tick_interval(), Duration::from_millis(MAX_TICK_MS));
        let zero = NavConfig { tick_ms: 0, ..NavConfig::default() };
        assert_eq!(zero.tick_interval(), Duration::from_millis(1));
    }
}
