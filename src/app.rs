// ============================================================================
// app.rs — WASD Viewport Controls
// winit event-loop handler: window, GPU, egui tool panel, HUD, and the key
// adapter feeding the navigation controller.
// ============================================================================

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes},
};

use crate::config::{NavConfig, TOOL_TITLE};
use crate::controller::NavigationController;
use crate::hud::{HudContent, HudRenderer};
use crate::input::{InputEvent, Key, KeyEventKind};
use crate::panel;
use crate::pipeline::{create_scene_pipeline, ScenePipeline};
use crate::scene::{scene_lines, Viewport};

// ======================== Application ========================

pub struct App {
    state: Option<AppState>,
    config: AppConfig,
}

#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub nav: NavConfig,
    /// Install the controls at start-up instead of waiting for the panel.
    pub start_enabled: bool,
}

struct AppState {
    // GPU
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    scene: ScenePipeline,

    // Window
    window: Arc<Window>,

    // Navigation
    viewport: Viewport,
    controller: NavigationController,

    // HUD
    hud: HudRenderer,

    // egui
    egui_ctx: egui::Context,
    egui_winit_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        Self { state: None, config }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        match AppState::new(event_loop, &self.config) {
            Ok(state) => {
                state.window.request_redraw();
                self.state = Some(state);
            }
            Err(err) => {
                log::error!("Start-up failed: {:#}", err);
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(state) = &mut self.state else {
            return;
        };

        state.controller.poll(Instant::now(), &mut state.viewport);
        if state.viewport.take_redraw_request() {
            state.window.request_redraw();
        }

        // Sleep until the next movement tick, or until the next event.
        match state.controller.next_deadline() {
            Some(deadline) => event_loop.set_control_flow(ControlFlow::WaitUntil(deadline)),
            None => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = &mut self.state else {
            return;
        };

        // Pass events to egui first
        let egui_response = state.egui_winit_state.on_window_event(&state.window, &event);
        if egui_response.repaint {
            state.window.request_redraw();
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(KeyCode::Escape) = event.physical_key {
                    if event.state.is_pressed() {
                        event_loop.exit();
                        return;
                    }
                }
                // The main window sees every key; the controller decides
                // whether the focused panel is a viewport at tick time.
                if state.viewport.input_subscribed() {
                    if let Some(input) = translate_key_event(&event) {
                        state.controller.handle_event(input, Instant::now(), &mut state.viewport);
                    }
                }
            }

            WindowEvent::Focused(focused) => {
                on_focus_changed(
                    &mut state.viewport,
                    &mut state.controller,
                    focused,
                    Instant::now(),
                );
            }

            WindowEvent::Resized(new_size) => {
                if new_size.width > 0 && new_size.height > 0 {
                    state.surface_config.width = new_size.width;
                    state.surface_config.height = new_size.height;
                    state.surface.configure(&state.device, &state.surface_config);
                    state.viewport.aspect = new_size.width as f32 / new_size.height as f32;
                }
            }

            WindowEvent::RedrawRequested => {
                redraw(state);
            }

            _ => {}
        }
    }
}

// ======================== Key Adapter ========================

/// The modifier release is lost when focus leaves mid-chord, so one is
/// synthesized here.
fn on_focus_changed(
    viewport: &mut Viewport,
    controller: &mut NavigationController,
    focused: bool,
    now: Instant,
) {
    viewport.set_window_focused(focused);
    if !focused && viewport.input_subscribed() {
        controller.handle_event(InputEvent::up(Key::Alt), now, viewport);
    }
}

fn translate_key(code: KeyCode) -> Key {
    match code {
        KeyCode::AltLeft | KeyCode::AltRight => Key::Alt,
        KeyCode::KeyW => Key::W,
        KeyCode::KeyA => Key::A,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyD => Key::D,
        KeyCode::KeyQ => Key::Q,
        KeyCode::KeyE => Key::E,
        KeyCode::KeyF => Key::F,
        _ => Key::Other,
    }
}

/// Physical keys keep WASD positional on non-QWERTY layouts.
fn translate_key_event(event: &KeyEvent) -> Option<InputEvent> {
    let PhysicalKey::Code(code) = event.physical_key else {
        return None;
    };
    let kind = match event.state {
        ElementState::Pressed => KeyEventKind::Down,
        ElementState::Released => KeyEventKind::Up,
    };
    Some(InputEvent {
        kind,
        key: translate_key(code),
        repeat: event.repeat,
    })
}

// ======================== Initialization ========================

impl AppState {
    fn new(event_loop: &ActiveEventLoop, config: &AppConfig) -> anyhow::Result<Self> {
        let window_attrs = WindowAttributes::default()
            .with_title(TOOL_TITLE)
            .with_inner_size(winit::dpi::LogicalSize::new(1280u32, 720u32));

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .context("Failed to create window")?,
        );

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create surface")?;

        let (device, queue, surface_config) =
            pollster::block_on(init_gpu(&instance, &surface, &window))?;

        surface.configure(&device, &surface_config);

        let mut viewport = Viewport::default();
        viewport.aspect = surface_config.width as f32 / surface_config.height as f32;

        let scene = create_scene_pipeline(
            &device,
            surface_config.format,
            &scene_lines(&viewport.selection),
        );
        let hud = HudRenderer::new(&device, &queue, surface_config.format);

        // ---- Initialize egui ----
        let egui_ctx = egui::Context::default();
        let mut visuals = egui::Visuals::dark();
        visuals.window_fill = egui::Color32::from_rgba_premultiplied(27, 27, 35, 235);
        egui_ctx.set_visuals(visuals);

        let egui_winit_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            event_loop,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        let egui_renderer = egui_wgpu::Renderer::new(
            &device,
            surface_config.format,
            None,
            1,
            false,
        );

        let mut controller = NavigationController::new(config.nav.clone());
        if config.start_enabled {
            controller.install(&mut viewport);
        }

        log::info!(
            "Viewport ready: {}x{}, step {:.3}, tick {} ms",
            surface_config.width,
            surface_config.height,
            controller.step_size(),
            controller.tick_period().as_millis()
        );

        Ok(Self {
            device,
            queue,
            surface,
            surface_config,
            scene,
            window,
            viewport,
            controller,
            hud,
            egui_ctx,
            egui_winit_state,
            egui_renderer,
        })
    }
}

async fn init_gpu(
    instance: &wgpu::Instance,
    surface: &wgpu::Surface<'_>,
    window: &Window,
) -> anyhow::Result<(wgpu::Device, wgpu::Queue, wgpu::SurfaceConfiguration)> {
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(surface),
            force_fallback_adapter: false,
        })
        .await
        .context("Failed to find a suitable GPU adapter")?;

    log::info!("GPU: {}", adapter.get_info().name);

    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("viewport_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: Default::default(),
            },
            None,
        )
        .await
        .context("Failed to create device")?;

    let size = window.inner_size();
    let surface_caps = surface.get_capabilities(&adapter);
    let surface_format = surface_caps
        .formats
        .iter()
        .find(|f| f.is_srgb())
        .copied()
        .or_else(|| surface_caps.formats.first().copied())
        .context("Surface reports no texture formats")?;

    let surface_config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format: surface_format,
        width: size.width.max(1),
        height: size.height.max(1),
        present_mode: wgpu::PresentMode::AutoVsync,
        alpha_mode: surface_caps.alpha_modes[0],
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    };

    Ok((device, queue, surface_config))
}

// ======================== Frame Rendering ========================

fn redraw(state: &mut AppState) {
    // ---- egui frame ----
    let raw_input = state.egui_winit_state.take_egui_input(&state.window);
    let full_output = state.egui_ctx.run(raw_input, |ctx| {
        panel::render_control_panel(ctx, &mut state.controller, &mut state.viewport);
    });
    state
        .egui_winit_state
        .handle_platform_output(&state.window, full_output.platform_output);

    // A focused panel widget takes keyboard focus away from the 3D view.
    state
        .viewport
        .set_panel_has_keyboard(state.egui_ctx.wants_keyboard_input());

    // Upload camera uniform
    state.queue.write_buffer(
        &state.scene.camera_buffer,
        0,
        bytemuck::bytes_of(&state.viewport.camera.uniforms(state.viewport.aspect)),
    );

    // ---- Prepare HUD ----
    let win_w = state.surface_config.width;
    let win_h = state.surface_config.height;
    let content = HudContent {
        overlays: state
            .viewport
            .overlays()
            .map(|(slot, label)| (*slot, label.as_str()))
            .collect(),
        readout: build_readout_text(state),
    };
    if let Err(e) = state
        .hud
        .prepare(&state.device, &state.queue, &content, win_w, win_h)
    {
        log::warn!("HUD prepare failed: {}", e);
    }

    let output = match state.surface.get_current_texture() {
        Ok(t) => t,
        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
            state.surface.configure(&state.device, &state.surface_config);
            return;
        }
        Err(e) => {
            log::error!("Surface error: {:?}", e);
            return;
        }
    };

    let view = output
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());

    let mut encoder = state
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

    // Scene + HUD pass
    {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("scene_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: 0.09,
                        g: 0.09,
                        b: 0.11,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        state.scene.draw(&mut pass);
        if let Err(e) = state.hud.render(&mut pass) {
            log::warn!("HUD render failed: {}", e);
        }
    }

    state.queue.submit(std::iter::once(encoder.finish()));

    // ---- egui render pass (on top of the scene, separate encoder) ----
    let paint_jobs = state
        .egui_ctx
        .tessellate(full_output.shapes, full_output.pixels_per_point);

    for (id, image_delta) in &full_output.textures_delta.set {
        state
            .egui_renderer
            .update_texture(&state.device, &state.queue, *id, image_delta);
    }

    let screen_descriptor = egui_wgpu::ScreenDescriptor {
        size_in_pixels: [win_w, win_h],
        pixels_per_point: full_output.pixels_per_point,
    };

    let mut egui_encoder = state
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("egui_encoder"),
        });

    state.egui_renderer.update_buffers(
        &state.device,
        &state.queue,
        &mut egui_encoder,
        &paint_jobs,
        &screen_descriptor,
    );

    render_egui_pass(
        &state.egui_renderer,
        &mut egui_encoder,
        &view,
        &paint_jobs,
        &screen_descriptor,
    );

    state.queue.submit(std::iter::once(egui_encoder.finish()));
    output.present();

    for id in &full_output.textures_delta.free {
        state.egui_renderer.free_texture(id);
    }
    state.hud.trim();
}

fn build_readout_text(state: &AppState) -> String {
    let frame = state.viewport.camera.frame();
    let p = frame.position;
    format!(
        "Cam ({:.2}, {:.2}, {:.2})   COI {:.2}   Step {:.3}{}",
        p.x,
        p.y,
        p.z,
        frame.scale_metric(),
        state.controller.step_size(),
        if state.controller.is_moving() { "   [MOVING]" } else { "" },
    )
}

/// Render egui paint jobs into a render pass.
/// Extracted as a free function to decouple the egui::Renderer lifetime
/// from the AppState borrow, allowing the render pass encoder to be local.
fn render_egui_pass(
    renderer: &egui_wgpu::Renderer,
    encoder: &mut wgpu::CommandEncoder,
    view: &wgpu::TextureView,
    paint_jobs: &[egui::ClippedPrimitive],
    screen_descriptor: &egui_wgpu::ScreenDescriptor,
) {
    let pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("egui_render_pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Load,
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });
    // forget_lifetime converts RenderPass<'encoder> → RenderPass<'static>
    // which is required by egui_wgpu::Renderer::render in wgpu 24.
    let mut pass = pass.forget_lifetime();
    renderer.render(&mut pass, paint_jobs, screen_descriptor);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ViewportHost;

    #[test]
    fn navigation_keys_map_by_physical_position() {
        assert_eq!(translate_key(KeyCode::AltLeft), Key::Alt);
        assert_eq!(translate_key(KeyCode::AltRight), Key::Alt);
        assert_eq!(translate_key(KeyCode::KeyW), Key::W);
        assert_eq!(translate_key(KeyCode::KeyQ), Key::Q);
        assert_eq!(translate_key(KeyCode::KeyF), Key::F);
        assert_eq!(translate_key(KeyCode::KeyZ), Key::Other);
        assert_eq!(translate_key(KeyCode::ShiftLeft), Key::Other);
    }

    #[test]
    fn focus_loss_releases_held_chord() {
        let mut viewport = Viewport::default();
        let mut controller = NavigationController::default();
        controller.install(&mut viewport);

        let t0 = Instant::now();
        controller.handle_event(InputEvent::down(Key::Alt), t0, &mut viewport);
        controller.handle_event(InputEvent::down(Key::W), t0, &mut viewport);
        assert!(controller.is_moving());

        on_focus_changed(&mut viewport, &mut controller, false, t0);
        assert!(!controller.is_moving());
        assert!(!controller.state().chord_active());
        assert_eq!(controller.state().held_count(), 0);
        assert!(viewport.focused_panel().is_none());

        // Regaining focus does not restart motion on its own.
        on_focus_changed(&mut viewport, &mut controller, true, t0);
        assert!(!controller.is_moving());
        assert!(viewport.focused_panel().is_some());
    }
}
