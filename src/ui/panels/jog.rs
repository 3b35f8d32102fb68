// PrintBench - ui/panels/jog.rs
//
// Jog section of the left sidebar: a cross of X/Y buttons, a Z pair, step
// presets, and the feed rate. Writes `pending_jog`; gui.rs composes and
// sends the G-code.
//
// The whole section is disabled until the link accepts motion, so a jog
// can never be queued against a locked or absent controller.

use crate::app::state::AppState;
use crate::core::gcode::JogAxis;
use crate::ui::theme;
use crate::util::constants;

const JOG_BUTTON: egui::Vec2 = egui::Vec2::new(44.0, 28.0);

/// Render the jog section.
pub fn render(ui: &mut egui::Ui, state: &mut AppState) {
    ui.label(egui::RichText::new("Jog").strong());

    let enabled = state.link.state().accepts_motion();
    if !enabled {
        ui.label(
            egui::RichText::new("Connect and unlock to enable jogging.")
                .small()
                .color(theme::DIM),
        );
    }

    ui.add_enabled_ui(enabled, |ui| {
        let step = state.settings.jog_step_mm;

        // X/Y cross.
        egui::Grid::new("jog_xy")
            .spacing([4.0, 4.0])
            .show(ui, |ui| {
                ui.label("");
                if jog_button(ui, "Y+") {
                    state.pending_jog = Some((JogAxis::Y, step));
                }
                ui.label("");
                ui.end_row();

                if jog_button(ui, "X-") {
                    state.pending_jog = Some((JogAxis::X, -step));
                }
                ui.label("");
                if jog_button(ui, "X+") {
                    state.pending_jog = Some((JogAxis::X, step));
                }
                ui.end_row();

                ui.label("");
                if jog_button(ui, "Y-") {
                    state.pending_jog = Some((JogAxis::Y, -step));
                }
                ui.label("");
                ui.end_row();
            });

        ui.horizontal(|ui| {
            if jog_button(ui, "Z+") {
                state.pending_jog = Some((JogAxis::Z, step));
            }
            if jog_button(ui, "Z-") {
                state.pending_jog = Some((JogAxis::Z, -step));
            }
        });

        ui.add_space(4.0);

        // Step presets.
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("Step").small());
            for &preset in constants::JOG_STEP_PRESETS_MM {
                let active = (state.settings.jog_step_mm - preset).abs() < f64::EPSILON;
                let label = if preset < 1.0 {
                    format!("{preset}")
                } else {
                    format!("{preset:.0}")
                };
                let colour = if active {
                    theme::ACCENT
                } else {
                    ui.style().visuals.text_color()
                };
                if ui
                    .add(egui::Button::new(egui::RichText::new(label).small().color(colour)).small())
                    .clicked()
                {
                    state.settings.jog_step_mm = preset;
                }
            }
            ui.label(egui::RichText::new("mm").small().color(theme::DIM));
        });

        // Feed rate.
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("Feed").small());
            ui.add(
                egui::DragValue::new(&mut state.settings.jog_feed_mm_min)
                    .range(constants::MIN_JOG_FEED_MM_MIN..=constants::MAX_JOG_FEED_MM_MIN)
                    .speed(10.0)
                    .suffix(" mm/min"),
            );
        });
    });
}

fn jog_button(ui: &mut egui::Ui, label: &str) -> bool {
    ui.add_sized(JOG_BUTTON, egui::Button::new(label)).clicked()
}
