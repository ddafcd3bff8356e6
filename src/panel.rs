// ============================================================================
// panel.rs — WASD Viewport Controls
// egui tool window: enable toggle and move-step slider. Every value shown is
// read back from the controller each frame.
// ============================================================================

use crate::config::{slider_from_step, slider_range, step_from_slider, TOOL_TITLE};
use crate::controller::NavigationController;
use crate::host::ViewportHost;

pub fn enable_label(installed: bool) -> &'static str {
    if installed {
        "DISABLE"
    } else {
        "ENABLE"
    }
}

pub fn render_control_panel(
    ctx: &egui::Context,
    controller: &mut NavigationController,
    host: &mut impl ViewportHost,
) {
    egui::Window::new(TOOL_TITLE)
        .default_pos(egui::pos2(10.0, 40.0))
        .resizable(false)
        .collapsible(true)
        .show(ctx, |ui| {
            render_enable_toggle(ui, controller, host);
            ui.add_space(4.0);
            render_step_slider(ui, controller);
            ui.separator();
            ui.label(
                egui::RichText::new("Alt + W/S forward/back, A/D left/right, E/Q up/down\nAlt + F frame selected")
                    .small()
                    .color(egui::Color32::from_rgb(150, 200, 150)),
            );
        });
}

fn render_enable_toggle(
    ui: &mut egui::Ui,
    controller: &mut NavigationController,
    host: &mut impl ViewportHost,
) {
    let mut checked = controller.is_installed();
    let button = egui::Button::new(enable_label(checked)).selected(checked);
    if ui.add_sized([ui.available_width(), 24.0], button).clicked() {
        checked = !checked;
        controller.set_enabled(checked, host);
    }
}

fn render_step_slider(ui: &mut egui::Ui, controller: &mut NavigationController) {
    ui.horizontal(|ui| {
        ui.label("Move step:");
        let mut value = slider_from_step(controller.step_size());
        let slider = egui::Slider::new(&mut value, slider_range())
            .step_by(1.0)
            .show_value(false);
        if ui.add(slider).changed() {
            controller.set_step_size(step_from_slider(value));
        }
        ui.label(format!("{:.3}", controller.step_size()));
    });
}
