// PrintBench - ui/panels/model.rs
//
// Model and job section of the left sidebar: STL selection / show / slice,
// print settings, and the G-code job controls. Writes the corresponding
// pending flags; gui.rs performs the file work and spawns jobs.

use crate::app::state::AppState;
use crate::ui::theme;
use crate::util::constants;

/// Render the model, settings, and job sections.
pub fn render(ui: &mut egui::Ui, state: &mut AppState) {
    render_stl_section(ui, state);
    ui.separator();
    render_settings_section(ui, state);
    ui.separator();
    render_gcode_section(ui, state);
}

// =============================================================================
// STL handler
// =============================================================================

fn render_stl_section(ui: &mut egui::Ui, state: &mut AppState) {
    ui.label(egui::RichText::new("Model").strong());

    match &state.stl_path {
        Some(path) => {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("?");
            ui.label(egui::RichText::new(name).small())
                .on_hover_text(path.display().to_string());
        }
        None => {
            ui.label(
                egui::RichText::new("No STL selected.")
                    .small()
                    .color(theme::DIM),
            );
        }
    }

    ui.horizontal(|ui| {
        if ui.button("Open STL\u{2026}").clicked() {
            if let Some(path) = rfd::FileDialog::new()
                .add_filter("STL files", &["stl", "STL"])
                .pick_file()
            {
                state.pending_select_stl = Some(path);
            }
            // Cancelled dialog: previous selection stays untouched.
        }

        let has_stl = state.stl_path.is_some();
        if ui
            .add_enabled(has_stl, egui::Button::new("Show"))
            .on_hover_text("Load the model into the 3D viewport")
            .clicked()
        {
            state.pending_show_stl = state.stl_path.clone();
        }
    });

    // Slice controls: button while idle, spinner + progress + cancel while
    // a job runs.
    if state.slice_in_progress {
        ui.horizontal(|ui| {
            ui.spinner();
            if state.planes_total > 0 {
                ui.label(format!(
                    "Slicing\u{2026} {}/{}",
                    state.planes_completed, state.planes_total
                ));
            } else {
                ui.label("Slicing\u{2026}");
            }
            if ui.small_button("Cancel").clicked() {
                state.request_cancel_slice = true;
            }
        });
    } else {
        ui.horizontal(|ui| {
            if ui
                .add_enabled(state.stl_path.is_some(), egui::Button::new("Slice"))
                .on_hover_text("Cut the model into layer images")
                .clicked()
            {
                state.pending_slice = state.stl_path.clone();
            }
            if !state.layers.is_empty() {
                ui.label(
                    egui::RichText::new(format!("{} layers", state.layers.len()))
                        .small()
                        .color(theme::ACCENT),
                );
                if ui.small_button("View").clicked() {
                    state.show_slice_viewer = true;
                }
            }
        });
    }
}

// =============================================================================
// Print settings
// =============================================================================

fn render_settings_section(ui: &mut egui::Ui, state: &mut AppState) {
    ui.label(egui::RichText::new("Print settings").strong());

    egui::Grid::new("print_settings")
        .num_columns(2)
        .spacing([8.0, 4.0])
        .show(ui, |ui| {
            ui.label(egui::RichText::new("Ball \u{2300}").small());
            ui.add(
                egui::DragValue::new(&mut state.settings.ball_diameter_mm)
                    .range(constants::MIN_DIAMETER_MM..=constants::MAX_DIAMETER_MM)
                    .speed(0.05)
                    .suffix(" mm"),
            );
            ui.end_row();

            ui.label(egui::RichText::new("Nozzle \u{2300}").small());
            ui.add(
                egui::DragValue::new(&mut state.settings.nozzle_diameter_mm)
                    .range(constants::MIN_DIAMETER_MM..=constants::MAX_DIAMETER_MM)
                    .speed(0.05)
                    .suffix(" mm"),
            );
            ui.end_row();

            ui.label(egui::RichText::new("Layer height").small());
            ui.add(
                egui::DragValue::new(&mut state.settings.layer_height_mm)
                    .range(constants::MIN_LAYER_HEIGHT_MM..=constants::MAX_LAYER_HEIGHT_MM)
                    .speed(0.05)
                    .suffix(" mm"),
            );
            ui.end_row();
        });
}

// =============================================================================
// G-code handler
// =============================================================================

fn render_gcode_section(ui: &mut egui::Ui, state: &mut AppState) {
    ui.label(egui::RichText::new("G-code job").strong());

    match &state.gcode_path {
        Some(path) => {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("?");
            ui.label(egui::RichText::new(name).small())
                .on_hover_text(path.display().to_string());
        }
        None => {
            ui.label(
                egui::RichText::new("No job loaded.")
                    .small()
                    .color(theme::DIM),
            );
        }
    }

    if let Some(summary) = &state.gcode_summary {
        ui.label(
            egui::RichText::new(summary.describe())
                .small()
                .color(theme::DIM),
        );
    }

    ui.horizontal(|ui| {
        if ui.button("Open G-code\u{2026}").clicked() {
            if let Some(path) = rfd::FileDialog::new()
                .add_filter("G-code files", &["gcode", "gc", "nc", "ngc", "tap"])
                .pick_file()
            {
                state.pending_open_gcode = Some(path);
            }
        }

        if state.stream_in_progress {
            ui.spinner();
            ui.label(format!("{}/{}", state.stream_sent, state.stream_total));
            if ui.small_button("Cancel").clicked() {
                state.request_cancel_stream = true;
            }
        } else {
            let can_print =
                state.gcode_path.is_some() && state.link.state().accepts_motion();
            let print = ui
                .add_enabled(can_print, egui::Button::new("Print"))
                .on_hover_text(if state.link.state().accepts_motion() {
                    "Stream the job to the printer console"
                } else {
                    "Connect and unlock first"
                });
            if print.clicked() {
                state.pending_stream = state.gcode_path.clone();
            }
        }
    });
}
