// ============================================================================
// lib.rs — WASD Viewport Controls
// Alt-chord fly navigation for a 3D viewport camera. The controller core
// (input, scheduler, camera math) talks to its host only through
// `host::ViewportHost`; the remaining modules make up the bundled winit host.
// ============================================================================

pub mod app;
pub mod camera;
pub mod config;
pub mod controller;
pub mod headless;
pub mod host;
pub mod hud;
pub mod input;
pub mod panel;
pub mod pipeline;
pub mod scene;
pub mod scheduler;
