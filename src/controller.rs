// ============================================================================
// controller.rs — WASD Viewport Controls
// Navigation controller: key routing, tick scheduling, and camera updates.
// ============================================================================

use std::time::{Duration, Instant};

use glam::Vec3;

use crate::camera::StepParams;
use crate::config::{NavConfig, OVERLAY_HELP, TOOL_TITLE};
use crate::host::{OverlaySlot, PanelKind, ViewportHost};
use crate::input::{InputEvent, Key, KeyAction, KeyEventKind, MovementState};
use crate::scheduler::TickScheduler;

/// Overlay slot for the "controls active" status line.
pub const STATUS_SLOT: OverlaySlot = OverlaySlot { section: 5, block: 1 };

pub struct NavigationController {
    state: MovementState,
    scheduler: TickScheduler,
    config: NavConfig,
    installed: bool,
}

impl Default for NavigationController {
    fn default() -> Self {
        Self::new(NavConfig::default())
    }
}

impl NavigationController {
    pub fn new(config: NavConfig) -> Self {
        Self {
            state: MovementState::new(config.step_size),
            scheduler: TickScheduler::new(config.tick_interval()),
            config,
            installed: false,
        }
    }

    pub fn state(&self) -> &MovementState {
        &self.state
    }

    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    pub fn is_installed(&self) -> bool {
        self.installed
    }

    /// True while the movement timer is running.
    pub fn is_moving(&self) -> bool {
        self.scheduler.is_active()
    }

    /// Effective tick period after clamping.
    pub fn tick_period(&self) -> Duration {
        self.scheduler.period()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    pub fn step_size(&self) -> f32 {
        self.state.step_size()
    }

    pub fn set_step_size(&mut self, step: f32) {
        self.state.set_step_size(step);
        log::debug!("Move step: {:.3}", self.state.step_size());
    }

    // ---- Install lifecycle ----

    /// Subscribe to host input and show the status overlay. Returns `false`
    /// when already installed.
    pub fn install(&mut self, host: &mut impl ViewportHost) -> bool {
        if self.installed {
            return false;
        }
        host.subscribe_input();
        host.show_overlay(STATUS_SLOT, &format!("{TOOL_TITLE}\t{OVERLAY_HELP}"));
        self.installed = true;
        log::info!("Viewport controls installed");
        true
    }

    /// Unsubscribe, stop the timer and drop any chord still held. Returns
    /// `false` when not installed.
    pub fn uninstall(&mut self, host: &mut impl ViewportHost) -> bool {
        if !self.installed {
            return false;
        }
        host.unsubscribe_input();
        if host.has_overlay(STATUS_SLOT) {
            host.remove_overlay(STATUS_SLOT);
        }
        self.scheduler.stop();
        self.state.release_all();
        self.installed = false;
        log::info!("Viewport controls removed");
        true
    }

    /// Panel toggle: install when checked, uninstall when not.
    pub fn set_enabled(&mut self, enabled: bool, host: &mut impl ViewportHost) -> bool {
        if enabled {
            self.install(host)
        } else {
            self.uninstall(host)
        }
    }

    // ---- Key routing ----

    pub fn handle_event(&mut self, event: InputEvent, now: Instant, host: &mut impl ViewportHost) {
        if !self.installed {
            return;
        }
        match event.kind {
            KeyEventKind::Down => self.on_key_down(event.key, event.repeat, now, host),
            KeyEventKind::Up => self.on_key_up(event.key, event.repeat),
        }
    }

    pub fn on_key_down(
        &mut self,
        key: Key,
        repeat: bool,
        now: Instant,
        host: &mut impl ViewportHost,
    ) {
        match self.state.on_key_down(key, repeat) {
            KeyAction::StartMotion => {
                if self.scheduler.start(now) {
                    log::debug!("Movement timer started");
                }
            }
            KeyAction::FrameSelection => {
                log::debug!("Frame selection");
                host.frame_selection();
            }
            KeyAction::StopMotion | KeyAction::None => {}
        }
    }

    pub fn on_key_up(&mut self, key: Key, repeat: bool) {
        if self.state.on_key_up(key, repeat) == KeyAction::StopMotion && self.scheduler.stop() {
            log::debug!("Movement timer stopped");
        }
    }

    // ---- Ticking ----

    /// Run every tick due at `now`. Returns the number of ticks run.
    pub fn poll(&mut self, now: Instant, host: &mut impl ViewportHost) -> u32 {
        let ticks = self.scheduler.poll(now);
        for _ in 0..ticks {
            self.tick(host);
        }
        ticks
    }

    /// One movement update. Returns the new camera position when the camera
    /// moved. A tick that finds the chord released does nothing; stopping the
    /// timer is left to the key handlers.
    pub fn tick(&mut self, host: &mut impl ViewportHost) -> Option<Vec3> {
        if !self.state.wants_motion() {
            return None;
        }

        let Some(local_dir) = self.state.composite_direction() else {
            log::trace!("Tick skipped: directions cancel out");
            return None;
        };

        let panel = match host.focused_panel() {
            Some(panel) if panel.kind == PanelKind::Viewport3d => panel,
            _ => {
                log::trace!("Tick skipped: no focused 3D viewport");
                return None;
            }
        };
        let Some(camera) = host.active_camera(panel.id) else {
            log::trace!("Tick skipped: viewport has no camera");
            return None;
        };

        let frame = host.camera_frame(camera);
        let params = StepParams {
            step_size: self.state.step_size(),
            move_scale_factor: self.config.move_scale_factor,
            max_distance: self.config.max_tick_distance,
        };
        let Some(position) = frame.stepped_position(local_dir, &params) else {
            log::trace!("Tick skipped: degenerate camera orientation");
            return None;
        };

        host.set_camera_position(camera, position);
        host.request_redraw();
        Some(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::testing::{Call, RecordingHost, CAMERA, VIEWPORT};
    use crate::host::{Panel, PanelId};

    fn installed() -> (NavigationController, RecordingHost) {
        let mut ctl = NavigationController::default();
        let mut host = RecordingHost::default();
        assert!(ctl.install(&mut host));
        host.clear_calls();
        (ctl, host)
    }

    fn press(ctl: &mut NavigationController, host: &mut RecordingHost, keys: &[Key]) {
        let now = Instant::now();
        for key in keys {
            ctl.handle_event(InputEvent::down(*key), now, host);
        }
    }

    #[test]
    fn hold_forward_moves_toward_coi() {
        let (mut ctl, mut host) = installed();
        press(&mut ctl, &mut host, &[Key::Alt, Key::W]);
        assert!(ctl.is_moving());

        let moved = ctl.tick(&mut host).unwrap();
        assert!((moved - Vec3::new(0.0, 0.0, 9.9)).length() < 1e-5);
        assert_eq!(
            host.calls(),
            vec![
                Call::FocusedPanel,
                Call::ActiveCamera(VIEWPORT.id),
                Call::CameraFrame(CAMERA),
                Call::SetPosition(CAMERA, moved),
                Call::Redraw,
            ]
        );
    }

    #[test]
    fn opposing_keys_make_no_host_calls() {
        let (mut ctl, mut host) = installed();
        press(&mut ctl, &mut host, &[Key::Alt, Key::A, Key::D]);
        assert!(ctl.is_moving());
        assert!(ctl.tick(&mut host).is_none());
        assert!(host.calls().is_empty());
        assert_eq!(host.frame.position, Vec3::new(0.0, 0.0, 10.0));
    }

    #[test]
    fn non_viewport_focus_stops_after_focus_query() {
        let (mut ctl, mut host) = installed();
        host.focus = Some(Panel { id: PanelId(2), kind: PanelKind::Other });
        press(&mut ctl, &mut host, &[Key::Alt, Key::W]);
        assert!(ctl.tick(&mut host).is_none());
        assert_eq!(host.calls(), vec![Call::FocusedPanel]);

        host.clear_calls();
        host.focus = None;
        assert!(ctl.tick(&mut host).is_none());
        assert_eq!(host.calls(), vec![Call::FocusedPanel]);
    }

    #[test]
    fn modifier_release_stops_timer() {
        let (mut ctl, mut host) = installed();
        press(&mut ctl, &mut host, &[Key::Alt, Key::W, Key::E]);
        ctl.handle_event(InputEvent::up(Key::Alt), Instant::now(), &mut host);
        assert!(!ctl.is_moving());
        assert_eq!(ctl.state().held_count(), 0);
        // W still physically down; its release must not restart anything.
        ctl.handle_event(InputEvent::up(Key::W), Instant::now(), &mut host);
        assert!(!ctl.is_moving());
    }

    #[test]
    fn stale_tick_after_release_is_a_no_op() {
        let (mut ctl, mut host) = installed();
        let t0 = Instant::now();
        ctl.handle_event(InputEvent::down(Key::Alt), t0, &mut host);
        ctl.handle_event(InputEvent::down(Key::W), t0, &mut host);
        // Release lands in the state without going through the handler,
        // as if it raced the timer.
        ctl.state.on_key_up(Key::Alt, false);
        assert!(ctl.is_moving());
        assert_eq!(ctl.poll(t0 + Duration::from_millis(20), &mut host), 4);
        assert!(host.calls().is_empty());
        assert!(ctl.is_moving());
    }

    #[test]
    fn poll_runs_due_ticks() {
        let (mut ctl, mut host) = installed();
        let t0 = Instant::now();
        ctl.handle_event(InputEvent::down(Key::Alt), t0, &mut host);
        ctl.handle_event(InputEvent::down(Key::S), t0, &mut host);

        assert_eq!(ctl.poll(t0 + Duration::from_millis(2), &mut host), 0);
        assert_eq!(ctl.poll(t0 + Duration::from_millis(10), &mut host), 2);
        // Backward with a COI that travels along: 10 -> 10.1 -> 10.2
        assert!((host.frame.position.z - 10.2).abs() < 1e-4);
    }

    #[test]
    fn frame_key_delegates_to_host() {
        let (mut ctl, mut host) = installed();
        press(&mut ctl, &mut host, &[Key::Alt, Key::F]);
        ctl.handle_event(InputEvent::down(Key::F).repeated(), Instant::now(), &mut host);
        assert_eq!(host.calls(), vec![Call::FrameSelection]);
        assert!(!ctl.is_moving());
    }

    #[test]
    fn double_enable_is_a_no_op() {
        let mut ctl = NavigationController::default();
        let mut host = RecordingHost::default();
        assert!(ctl.set_enabled(true, &mut host));
        assert!(!ctl.set_enabled(true, &mut host));
        assert_eq!(host.subscriptions, 1);
        assert!(host.has_overlay(STATUS_SLOT));

        assert!(ctl.set_enabled(false, &mut host));
        assert!(!ctl.set_enabled(false, &mut host));
        assert_eq!(host.subscriptions, 0);
        assert!(!host.has_overlay(STATUS_SLOT));
    }

    #[test]
    fn uninstall_stops_timer_and_drops_chord() {
        let (mut ctl, mut host) = installed();
        press(&mut ctl, &mut host, &[Key::Alt, Key::D]);
        assert!(ctl.uninstall(&mut host));
        assert!(!ctl.is_moving());
        assert!(!ctl.state().chord_active());

        // Events are ignored while uninstalled.
        press(&mut ctl, &mut host, &[Key::Alt, Key::D]);
        assert!(!ctl.is_moving());
        assert_eq!(ctl.state().held_count(), 0);
    }

    #[test]
    fn oversized_tick_period_is_clamped_not_fatal() {
        let mut ctl = NavigationController::new(NavConfig {
            tick_ms: u64::MAX,
            ..NavConfig::default()
        });
        let mut host = RecordingHost::default();
        ctl.install(&mut host);

        let t0 = Instant::now();
        ctl.handle_event(InputEvent::down(Key::Alt), t0, &mut host);
        ctl.handle_event(InputEvent::down(Key::W), t0, &mut host);
        assert!(ctl.is_moving());
        assert_eq!(ctl.tick_period(), Duration::from_millis(crate::config::MAX_TICK_MS));
        assert_eq!(ctl.next_deadline(), Some(t0 + ctl.tick_period()));
    }

    #[test]
    fn step_size_changes_are_clamped() {
        let mut ctl = NavigationController::default();
        ctl.set_step_size(9.0);
        assert_eq!(ctl.step_size(), crate::config::STEP_MAX);
    }

    #[test]
    fn timer_tracks_chord_and_keys_for_every_interleaving() {
        let alphabet = [
            InputEvent::down(Key::Alt),
            InputEvent::up(Key::Alt),
            InputEvent::down(Key::W),
            InputEvent::up(Key::W),
            InputEvent::down(Key::S),
            InputEvent::up(Key::S),
            InputEvent::down(Key::W).repeated(),
            InputEvent::up(Key::W).repeated(),
        ];
        let len = 5;
        let total = alphabet.len().pow(len as u32);
        for mut code in 0..total {
            let (mut ctl, mut host) = installed();
            let now = Instant::now();
            for _ in 0..len {
                let event = alphabet[code % alphabet.len()];
                code /= alphabet.len();
                ctl.handle_event(event, now, &mut host);
                assert_eq!(ctl.is_moving(), ctl.state().wants_motion(), "after {event:?}");
            }
        }
    }
}
