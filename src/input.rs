// ============================================================================
// input.rs — WASD Viewport Controls
// Key classification and held-key state for chorded navigation.
// ============================================================================

use std::collections::HashSet;

use glam::Vec3;
use serde::Deserialize;

use crate::config::{clamp_step, DEFAULT_STEP};

// ======================== Keys ========================

/// Host-agnostic key identifiers. Adapters map platform keys onto these;
/// anything the controller does not care about becomes `Other`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub enum Key {
    Alt,
    W,
    A,
    S,
    D,
    Q,
    E,
    F,
    Other,
}

/// Navigation keys and their camera-local directions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NavKey {
    Left,
    Right,
    Forward,
    Backward,
    Up,
    Down,
}

/// Camera-local unit direction for every navigation key.
pub const DIRECTIONS: [(NavKey, Vec3); 6] = [
    (NavKey::Left, Vec3::new(-1.0, 0.0, 0.0)),
    (NavKey::Right, Vec3::new(1.0, 0.0, 0.0)),
    (NavKey::Forward, Vec3::new(0.0, 0.0, -1.0)),
    (NavKey::Backward, Vec3::new(0.0, 0.0, 1.0)),
    (NavKey::Up, Vec3::new(0.0, 1.0, 0.0)),
    (NavKey::Down, Vec3::new(0.0, -1.0, 0.0)),
];

impl NavKey {
    pub fn from_key(key: Key) -> Option<Self> {
        match key {
            Key::A => Some(Self::Left),
            Key::D => Some(Self::Right),
            Key::W => Some(Self::Forward),
            Key::S => Some(Self::Backward),
            Key::E => Some(Self::Up),
            Key::Q => Some(Self::Down),
            _ => None,
        }
    }

    pub fn direction(self) -> Vec3 {
        DIRECTIONS
            .iter()
            .find(|(k, _)| *k == self)
            .map_or(Vec3::ZERO, |(_, dir)| *dir)
    }
}

// ======================== Events ========================

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyEventKind {
    Down,
    Up,
}

/// One raw key transition as delivered by the host.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct InputEvent {
    pub kind: KeyEventKind,
    pub key: Key,
    #[serde(default)]
    pub repeat: bool,
}

impl InputEvent {
    pub fn down(key: Key) -> Self {
        Self { kind: KeyEventKind::Down, key, repeat: false }
    }

    pub fn up(key: Key) -> Self {
        Self { kind: KeyEventKind::Up, key, repeat: false }
    }

    pub fn repeated(mut self) -> Self {
        self.repeat = true;
        self
    }
}

/// What the controller must do after a key transition was classified.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum KeyAction {
    None,
    StartMotion,
    StopMotion,
    FrameSelection,
}

// ======================== Movement State ========================

/// Held navigation keys, the modifier chord, and the configured step.
#[derive(Clone, Debug)]
pub struct MovementState {
    held: HashSet<NavKey>,
    chord_active: bool,
    step_size: f32,
}

impl Default for MovementState {
    fn default() -> Self {
        Self::new(DEFAULT_STEP)
    }
}

impl MovementState {
    pub fn new(step_size: f32) -> Self {
        Self {
            held: HashSet::new(),
            chord_active: false,
            step_size: clamp_step(step_size),
        }
    }

    pub fn chord_active(&self) -> bool {
        self.chord_active
    }

    pub fn is_held(&self, key: NavKey) -> bool {
        self.held.contains(&key)
    }

    pub fn held_count(&self) -> usize {
        self.held.len()
    }

    pub fn step_size(&self) -> f32 {
        self.step_size
    }

    pub fn set_step_size(&mut self, step: f32) {
        self.step_size = clamp_step(step);
    }

    /// True when ticks should produce motion.
    pub fn wants_motion(&self) -> bool {
        self.chord_active && !self.held.is_empty()
    }

    pub fn on_key_down(&mut self, key: Key, repeat: bool) -> KeyAction {
        if key == Key::Alt {
            self.chord_active = true;
            return KeyAction::None;
        }
        if !self.chord_active || repeat {
            return KeyAction::None;
        }
        if key == Key::F {
            return KeyAction::FrameSelection;
        }
        match NavKey::from_key(key) {
            Some(nav) => {
                self.held.insert(nav);
                KeyAction::StartMotion
            }
            None => KeyAction::None,
        }
    }

    pub fn on_key_up(&mut self, key: Key, repeat: bool) -> KeyAction {
        if key == Key::Alt {
            self.chord_active = false;
            self.held.clear();
        } else if !repeat {
            if let Some(nav) = NavKey::from_key(key) {
                self.held.remove(&nav);
            }
        }

        if self.wants_motion() {
            KeyAction::None
        } else {
            KeyAction::StopMotion
        }
    }

    /// Drop the chord and every held key.
    pub fn release_all(&mut self) {
        self.chord_active = false;
        self.held.clear();
    }

    /// Normalized sum of the held keys' directions, or `None` when they
    /// cancel out.
    pub fn composite_direction(&self) -> Option<Vec3> {
        let sum: Vec3 = DIRECTIONS
            .iter()
            .filter(|(key, _)| self.held.contains(key))
            .map(|(_, dir)| *dir)
            .sum();
        if sum.length_squared() > 0.0 {
            Some(sum.normalize())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chorded() -> MovementState {
        let mut state = MovementState::default();
        state.on_key_down(Key::Alt, false);
        state
    }

    #[test]
    fn nav_keys_need_the_chord() {
        let mut state = MovementState::default();
        assert_eq!(state.on_key_down(Key::W, false), KeyAction::None);
        assert_eq!(state.held_count(), 0);

        state.on_key_down(Key::Alt, false);
        assert_eq!(state.on_key_down(Key::W, false), KeyAction::StartMotion);
        assert!(state.is_held(NavKey::Forward));
        assert!(state.wants_motion());
    }

    #[test]
    fn modifier_release_clears_everything() {
        let mut state = chorded();
        state.on_key_down(Key::W, false);
        state.on_key_down(Key::A, false);
        state.on_key_down(Key::E, false);

        assert_eq!(state.on_key_up(Key::Alt, false), KeyAction::StopMotion);
        assert!(!state.chord_active());
        assert_eq!(state.held_count(), 0);
    }

    #[test]
    fn auto_repeat_never_changes_membership() {
        let mut state = chorded();
        assert_eq!(state.on_key_down(Key::D, true), KeyAction::None);
        assert_eq!(state.held_count(), 0);

        state.on_key_down(Key::D, false);
        assert_eq!(state.on_key_down(Key::D, true), KeyAction::None);
        assert_eq!(state.on_key_up(Key::D, true), KeyAction::None);
        assert!(state.is_held(NavKey::Right));

        assert_eq!(state.on_key_up(Key::D, false), KeyAction::StopMotion);
        assert!(!state.is_held(NavKey::Right));
    }

    #[test]
    fn releasing_one_of_two_keys_keeps_motion() {
        let mut state = chorded();
        state.on_key_down(Key::W, false);
        state.on_key_down(Key::D, false);
        assert_eq!(state.on_key_up(Key::W, false), KeyAction::None);
        assert!(state.wants_motion());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let mut state = chorded();
        assert_eq!(state.on_key_down(Key::Other, false), KeyAction::None);
        assert_eq!(state.held_count(), 0);
        assert!(state.chord_active());
    }

    #[test]
    fn frame_key_fires_once_per_press_under_chord() {
        let mut state = MovementState::default();
        assert_eq!(state.on_key_down(Key::F, false), KeyAction::None);

        state.on_key_down(Key::Alt, false);
        assert_eq!(state.on_key_down(Key::F, false), KeyAction::FrameSelection);
        assert_eq!(state.on_key_down(Key::F, true), KeyAction::None);
        assert_eq!(state.held_count(), 0);
    }

    #[test]
    fn composite_is_normalized_sum() {
        let mut state = chorded();
        state.on_key_down(Key::W, false);
        state.on_key_down(Key::D, false);
        let dir = state.composite_direction().unwrap();
        let expected = Vec3::new(1.0, 0.0, -1.0).normalize();
        assert!((dir - expected).length() < 1e-6);

        state.on_key_down(Key::E, false);
        let dir = state.composite_direction().unwrap();
        assert!((dir.length() - 1.0).abs() < 1e-6);
        assert!((dir - Vec3::new(1.0, 1.0, -1.0).normalize()).length() < 1e-6);
    }

    #[test]
    fn opposite_pairs_cancel() {
        for (a, b) in [(Key::A, Key::D), (Key::W, Key::S), (Key::Q, Key::E)] {
            let mut state = chorded();
            state.on_key_down(a, false);
            state.on_key_down(b, false);
            assert!(state.composite_direction().is_none(), "{a:?}+{b:?}");
        }
    }

    #[test]
    fn every_subset_sums_table_entries() {
        let keys = [Key::A, Key::D, Key::W, Key::S, Key::E, Key::Q];
        for mask in 0u32..(1 << keys.len()) {
            let mut state = chorded();
            let mut expected = Vec3::ZERO;
            for (i, key) in keys.iter().enumerate() {
                if mask & (1 << i) != 0 {
                    state.on_key_down(*key, false);
                    expected += NavKey::from_key(*key).unwrap().direction();
                }
            }
            match state.composite_direction() {
                Some(dir) => assert!((dir - expected.normalize()).length() < 1e-5),
                None => assert_eq!(expected, Vec3::ZERO),
            }
        }
    }

    #[test]
    fn step_size_is_clamped() {
        let mut state = MovementState::new(3.0);
        assert_eq!(state.step_size(), crate::config::STEP_MAX);
        state.set_step_size(-1.0);
        assert_eq!(state.step_size(), crate::config::STEP_MIN);
    }

    #[test]
    fn events_deserialize_from_script_form() {
        let ev: InputEvent =
            serde_json::from_str(r#"{ "kind": "down", "key": "W" }"#).unwrap();
        assert_eq!(ev, InputEvent::down(Key::W));
        let ev: InputEvent =
            serde_json::from_str(r#"{ "kind": "up", "key": "Alt", "repeat": true }"#).unwrap();
        assert_eq!(ev, InputEvent::up(Key::Alt).repeated());
    }
}
