// ============================================================================
// host.rs — WASD Viewport Controls
// The scene/UI capabilities the navigation controller needs from its host.
// ============================================================================

use glam::Vec3;

use crate::camera::CameraFrame;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PanelId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CameraId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PanelKind {
    Viewport3d,
    Other,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Panel {
    pub id: PanelId,
    pub kind: PanelKind,
}

/// Fixed on-screen overlay position. Sections 0-4 run left to right along
/// the top edge, 5-9 along the bottom; blocks stack inward from the edge.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OverlaySlot {
    pub section: u8,
    pub block: u8,
}

impl OverlaySlot {
    pub const SECTION_COUNT: u8 = 10;

    pub fn new(section: u8, block: u8) -> Self {
        Self { section: section.min(Self::SECTION_COUNT - 1), block }
    }

    pub fn is_bottom(&self) -> bool {
        self.section >= Self::SECTION_COUNT / 2
    }

    /// Column 0..5 across the screen.
    pub fn column(&self) -> u8 {
        self.section % (Self::SECTION_COUNT / 2)
    }
}

/// Scene and window services. All calls are synchronous and assumed to
/// succeed once a camera has been resolved.
pub trait ViewportHost {
    /// Panel holding keyboard focus, if any.
    fn focused_panel(&self) -> Option<Panel>;

    fn active_camera(&self, panel: PanelId) -> Option<CameraId>;

    fn camera_frame(&self, camera: CameraId) -> CameraFrame;

    fn set_camera_position(&mut self, camera: CameraId, position: Vec3);

    fn request_redraw(&mut self);

    /// Look at and frame the current selection.
    fn frame_selection(&mut self);

    /// Start routing main-window key events to the controller.
    fn subscribe_input(&mut self);

    fn unsubscribe_input(&mut self);

    fn show_overlay(&mut self, slot: OverlaySlot, label: &str);

    fn remove_overlay(&mut self, slot: OverlaySlot);

    fn has_overlay(&self, slot: OverlaySlot) -> bool;
}
