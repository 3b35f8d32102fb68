// PrintBench - ui/panels/summary.rs
//
// Slice summary dialog: mesh statistics, stack size, duration, and any
// warnings from the session. Opened from the View menu or after a job.

use crate::app::state::AppState;
use crate::ui::theme;

/// Render the summary dialog when `state.show_summary` is set.
pub fn render(ctx: &egui::Context, state: &mut AppState) {
    if !state.show_summary {
        return;
    }

    let mut open = state.show_summary;
    egui::Window::new("Slice Summary")
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            match &state.slice_summary {
                Some(summary) => {
                    let name = summary
                        .path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or("?");
                    ui.label(egui::RichText::new(name).strong());
                    ui.add_space(4.0);

                    egui::Grid::new("slice_summary_grid")
                        .num_columns(2)
                        .spacing([12.0, 2.0])
                        .show(ui, |ui| {
                            ui.label("Triangles");
                            ui.label(summary.triangle_count.to_string());
                            ui.end_row();

                            let d = [
                                summary.bounds_max[0] - summary.bounds_min[0],
                                summary.bounds_max[1] - summary.bounds_min[1],
                                summary.bounds_max[2] - summary.bounds_min[2],
                            ];
                            ui.label("Size");
                            ui.label(format!("{:.1} x {:.1} x {:.1} mm", d[0], d[1], d[2]));
                            ui.end_row();

                            ui.label("Layer height");
                            ui.label(format!("{:.3} mm", summary.layer_height_mm));
                            ui.end_row();

                            ui.label("Layers");
                            ui.label(summary.layer_count.to_string());
                            ui.end_row();

                            if summary.empty_planes > 0 {
                                ui.label("Empty planes");
                                ui.label(summary.empty_planes.to_string());
                                ui.end_row();
                            }

                            ui.label("Duration");
                            ui.label(format!("{:.2} s", summary.duration.as_secs_f64()));
                            ui.end_row();
                        });
                }
                None => {
                    ui.label(egui::RichText::new("No slice job has completed yet.").color(theme::DIM));
                }
            }

            if !state.warnings.is_empty() {
                ui.add_space(6.0);
                ui.label(
                    egui::RichText::new(format!("{} warning(s)", state.warnings.len()))
                        .strong()
                        .color(theme::WARNING),
                );
                egui::ScrollArea::vertical()
                    .id_salt("summary_warnings")
                    .max_height(120.0)
                    .show(ui, |ui| {
                        for warning in &state.warnings {
                            ui.label(
                                egui::RichText::new(warning).small().color(theme::WARNING),
                            );
                        }
                    });
            }
        });
    state.show_summary = open;
}
