// ============================================================================
// scene.rs — WASD Viewport Controls
// Viewport: the single-camera scene host driven by the navigation controller,
// plus the line geometry it draws.
// ============================================================================

use std::collections::BTreeMap;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::camera::{CameraFrame, ViewCamera};
use crate::host::{CameraId, OverlaySlot, Panel, PanelId, PanelKind, ViewportHost};

// ======================== Constants ========================

pub const VIEWPORT_PANEL: PanelId = PanelId(0);
pub const TOOL_PANEL: PanelId = PanelId(1);
pub const VIEWPORT_CAMERA: CameraId = CameraId(0);

pub const GRID_HALF_EXTENT: i32 = 20;
pub const GRID_MAJOR_EVERY: i32 = 5;

// ======================== Selection ========================

/// Axis-aligned bounds of the selected object.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Selection {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            min: Vec3::new(-1.0, 0.0, -1.0),
            max: Vec3::new(1.0, 2.0, 1.0),
        }
    }
}

impl Selection {
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn radius(&self) -> f32 {
        (self.max - self.min).length() * 0.5
    }

    fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(b.x, b.y, b.z),
            Vec3::new(a.x, b.y, b.z),
        ]
    }
}

// ======================== Viewport ========================

/// Scene host for one 3D viewport and its tool panel.
pub struct Viewport {
    pub camera: ViewCamera,
    pub selection: Selection,
    pub aspect: f32,
    window_focused: bool,
    panel_has_keyboard: bool,
    input_subscribed: bool,
    overlays: BTreeMap<OverlaySlot, String>,
    redraw_requested: bool,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            camera: ViewCamera::default(),
            selection: Selection::default(),
            aspect: 16.0 / 9.0,
            window_focused: true,
            panel_has_keyboard: false,
            input_subscribed: false,
            overlays: BTreeMap::new(),
            redraw_requested: false,
        }
    }
}

impl Viewport {
    pub fn set_window_focused(&mut self, focused: bool) {
        self.window_focused = focused;
    }

    /// Whether a panel widget (rather than the 3D view) owns keyboard input.
    pub fn set_panel_has_keyboard(&mut self, has_keyboard: bool) {
        self.panel_has_keyboard = has_keyboard;
    }

    pub fn input_subscribed(&self) -> bool {
        self.input_subscribed
    }

    pub fn overlays(&self) -> impl Iterator<Item = (&OverlaySlot, &String)> {
        self.overlays.iter()
    }

    pub fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.redraw_requested)
    }

    /// Distance at which the selection's bounding sphere fills the view.
    fn fit_distance(&self) -> f32 {
        let half_v = self.camera.fovy * 0.5;
        let half_h = (half_v.tan() * self.aspect).atan();
        let half = half_v.min(half_h).max(1e-3);
        (self.selection.radius() / half.sin()).max(self.camera.znear * 2.0)
    }
}

impl ViewportHost for Viewport {
    fn focused_panel(&self) -> Option<Panel> {
        if !self.window_focused {
            return None;
        }
        Some(if self.panel_has_keyboard {
            Panel { id: TOOL_PANEL, kind: PanelKind::Other }
        } else {
            Panel { id: VIEWPORT_PANEL, kind: PanelKind::Viewport3d }
        })
    }

    fn active_camera(&self, panel: PanelId) -> Option<CameraId> {
        (panel == VIEWPORT_PANEL).then_some(VIEWPORT_CAMERA)
    }

    fn camera_frame(&self, _camera: CameraId) -> CameraFrame {
        self.camera.frame()
    }

    fn set_camera_position(&mut self, _camera: CameraId, position: Vec3) {
        self.camera.position = position;
    }

    fn request_redraw(&mut self) {
        self.redraw_requested = true;
    }

    fn frame_selection(&mut self) {
        let center = self.selection.center();
        let to_center = center - self.camera.position;
        let forward = if to_center.length_squared() > f32::EPSILON {
            to_center.normalize()
        } else {
            self.camera.forward()
        };
        let distance = self.fit_distance();
        self.camera.look_at(center - forward * distance, center);
        self.redraw_requested = true;
        log::debug!(
            "Framed selection at {:?} from {:.2} units",
            center,
            distance
        );
    }

    fn subscribe_input(&mut self) {
        self.input_subscribed = true;
    }

    fn unsubscribe_input(&mut self) {
        self.input_subscribed = false;
    }

    fn show_overlay(&mut self, slot: OverlaySlot, label: &str) {
        self.overlays.insert(slot, label.to_string());
        self.redraw_requested = true;
    }

    fn remove_overlay(&mut self, slot: OverlaySlot) {
        self.overlays.remove(&slot);
        self.redraw_requested = true;
    }

    fn has_overlay(&self, slot: OverlaySlot) -> bool {
        self.overlays.contains_key(&slot)
    }
}

// ======================== Line Geometry ========================

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

const GRID_MINOR: [f32; 3] = [0.22, 0.22, 0.26];
const GRID_MAJOR: [f32; 3] = [0.36, 0.36, 0.42];
const AXIS_X: [f32; 3] = [0.85, 0.25, 0.25];
const AXIS_Y: [f32; 3] = [0.30, 0.80, 0.30];
const AXIS_Z: [f32; 3] = [0.30, 0.45, 0.90];
const SELECTION: [f32; 3] = [0.95, 0.80, 0.20];

fn push_line(out: &mut Vec<LineVertex>, a: Vec3, b: Vec3, color: [f32; 3]) {
    out.push(LineVertex { position: a.to_array(), color });
    out.push(LineVertex { position: b.to_array(), color });
}

/// Ground grid, world axes and the selection wireframe as a line list.
pub fn scene_lines(selection: &Selection) -> Vec<LineVertex> {
    let mut out = Vec::new();
    let n = GRID_HALF_EXTENT;
    let extent = n as f32;

    for i in -n..=n {
        if i == 0 {
            continue;
        }
        let color = if i % GRID_MAJOR_EVERY == 0 { GRID_MAJOR } else { GRID_MINOR };
        let t = i as f32;
        push_line(&mut out, Vec3::new(t, 0.0, -extent), Vec3::new(t, 0.0, extent), color);
        push_line(&mut out, Vec3::new(-extent, 0.0, t), Vec3::new(extent, 0.0, t), color);
    }

    push_line(&mut out, Vec3::new(-extent, 0.0, 0.0), Vec3::new(extent, 0.0, 0.0), AXIS_X);
    push_line(&mut out, Vec3::ZERO, Vec3::new(0.0, extent * 0.25, 0.0), AXIS_Y);
    push_line(&mut out, Vec3::new(0.0, 0.0, -extent), Vec3::new(0.0, 0.0, extent), AXIS_Z);

    let c = selection.corners();
    for i in 0..4 {
        push_line(&mut out, c[i], c[(i + 1) % 4], SELECTION);
        push_line(&mut out, c[i + 4], c[(i + 1) % 4 + 4], SELECTION);
        push_line(&mut out, c[i], c[i + 4], SELECTION);
    }

    out
}
