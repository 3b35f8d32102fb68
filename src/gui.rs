// PrintBench - gui.rs
//
// Top-level eframe::App implementation.
// Wires together all UI panels and manages the slice / stream job
// lifecycles: drains progress channels, executes pending-action flags
// written by panels, lays out the panels.

use std::sync::Arc;

use crate::app::slice_job::SliceManager;
use crate::app::state::AppState;
use crate::app::stream_job::StreamManager;
use crate::core::mesh::TriMesh;
use crate::core::model::{SliceProgress, StreamProgress};
use crate::core::raster::RasterConfig;
use crate::core::slice::SliceConfig;
use crate::platform::config::PlatformPaths;
use crate::ui;
use crate::ui::panels::slices::SliceViewer;
use crate::ui::viewport::Viewport3d;

/// The PrintBench application.
pub struct PrintBenchApp {
    pub state: AppState,
    pub slice_manager: SliceManager,
    pub stream_manager: StreamManager,
    viewport: Viewport3d,
    slice_viewer: SliceViewer,
    paths: PlatformPaths,
}

impl PrintBenchApp {
    /// Create a new application instance with the given state.
    pub fn new(state: AppState, paths: PlatformPaths) -> Self {
        Self {
            state,
            slice_manager: SliceManager::new(),
            stream_manager: StreamManager::new(),
            viewport: Viewport3d::new(),
            slice_viewer: SliceViewer::default(),
            paths,
        }
    }

    fn save_session(&self) {
        let file = self.paths.session_file();
        if let Err(e) = self.state.to_session().save(&file) {
            tracing::warn!(path = %file.display(), error = %e, "Could not save session");
        }
    }

    // -------------------------------------------------------------------------
    // Progress draining
    // -------------------------------------------------------------------------

    fn drain_slice_progress(&mut self) -> bool {
        let messages = self.slice_manager.poll_progress();
        let had_messages = !messages.is_empty();

        for msg in messages {
            match msg {
                SliceProgress::Started { path } => {
                    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("?");
                    self.state.status_message = format!("Slicing {name}\u{2026}");
                    self.state.slice_in_progress = true;
                }
                SliceProgress::MeshLoaded {
                    triangle_count, ..
                } => {
                    self.state.status_message =
                        format!("Mesh loaded ({triangle_count} triangles). Cutting\u{2026}");
                }
                SliceProgress::PlanesPlanned { total_planes } => {
                    self.state.planes_total = total_planes;
                }
                SliceProgress::LayerBatch {
                    layers,
                    completed_planes,
                    ..
                } => {
                    self.state.layers.extend(layers);
                    self.state.planes_completed = completed_planes;
                }
                SliceProgress::Completed { summary } => {
                    self.state.status_message = format!(
                        "Slice complete: {} layers in {:.2}s",
                        summary.layer_count,
                        summary.duration.as_secs_f64()
                    );
                    self.state.slice_summary = Some(summary);
                    self.state.slice_in_progress = false;
                    self.state.clamp_selection();
                    // A fresh stack invalidates the viewer's texture cache
                    // and is worth looking at right away.
                    self.slice_viewer.invalidate();
                    self.state.show_slice_viewer = !self.state.layers.is_empty();
                    self.save_session();
                }
                SliceProgress::Warning { message } => {
                    tracing::warn!(warning = %message, "Slice warning");
                    self.state.warnings.push(message);
                }
                SliceProgress::Failed { error } => {
                    self.state.status_message = format!("Slice failed: {error}");
                    self.state.warnings.push(error);
                    self.state.slice_in_progress = false;
                }
                SliceProgress::Cancelled => {
                    self.state.status_message = "Slice cancelled.".to_string();
                    self.state.slice_in_progress = false;
                }
            }
        }

        had_messages
    }

    fn drain_stream_progress(&mut self) -> bool {
        let messages = self.stream_manager.poll_progress();
        let had_messages = !messages.is_empty();

        for msg in messages {
            match msg {
                StreamProgress::Started { path, total_lines } => {
                    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("?");
                    self.state
                        .link
                        .note(format!("Streaming {name} ({total_lines} lines)"));
                    self.state.stream_total = total_lines;
                    self.state.stream_sent = 0;
                    self.state.stream_in_progress = true;
                }
                StreamProgress::Lines {
                    lines, sent_lines, ..
                } => {
                    self.state.link.send(&lines);
                    self.state.stream_sent = sent_lines;
                }
                StreamProgress::Completed {
                    sent_lines,
                    duration,
                } => {
                    self.state.link.note(format!(
                        "Job streamed: {sent_lines} lines in {:.1}s",
                        duration.as_secs_f64()
                    ));
                    self.state.status_message = "Job streamed.".to_string();
                    self.state.stream_in_progress = false;
                }
                StreamProgress::Failed { error } => {
                    self.state.status_message = format!("Job stream failed: {error}");
                    self.state.warnings.push(error);
                    self.state.stream_in_progress = false;
                }
                StreamProgress::Cancelled => {
                    self.state.link.note("Job stream cancelled".to_string());
                    self.state.status_message = "Job stream cancelled.".to_string();
                    self.state.stream_in_progress = false;
                }
            }
        }

        had_messages
    }

    // -------------------------------------------------------------------------
    // Pending-action execution
    // -------------------------------------------------------------------------

    fn execute_pending(&mut self) {
        // pending_select_stl: a panel or the menu picked a model file.
        if let Some(path) = self.state.pending_select_stl.take() {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("?");
            self.state.status_message = format!("Selected {name}.");
            self.state.stl_path = Some(path);
        }

        // pending_show_stl: load the mesh into the viewport.
        if let Some(path) = self.state.pending_show_stl.take() {
            match TriMesh::load_stl(&path) {
                Ok(mesh) => {
                    let mesh = Arc::new(mesh);
                    self.viewport.frame_mesh(&mesh);
                    self.state.status_message = format!(
                        "Showing {} ({} triangles).",
                        path.file_name().and_then(|n| n.to_str()).unwrap_or("?"),
                        mesh.triangle_count()
                    );
                    self.state.mesh = Some(mesh);
                }
                Err(e) => {
                    self.state.status_message = format!("Cannot show model: {e}");
                    self.state.warnings.push(e.to_string());
                }
            }
        }

        // request_camera_reset: reframe on the loaded mesh.
        if self.state.request_camera_reset {
            self.state.request_camera_reset = false;
            if let Some(mesh) = self.state.mesh.clone() {
                self.viewport.frame_mesh(&mesh);
            }
        }

        // pending_slice: start a slice job (cancelling any running one).
        if let Some(path) = self.state.pending_slice.take() {
            self.state.clear_slice();
            self.slice_viewer.invalidate();
            self.state.slice_in_progress = true;
            self.slice_manager.start_slice(
                path,
                SliceConfig {
                    layer_height: self.state.settings.layer_height_mm,
                    ..Default::default()
                },
                RasterConfig::square(self.state.raster_size),
            );
        }
        if self.state.request_cancel_slice {
            self.state.request_cancel_slice = false;
            self.slice_manager.cancel_slice();
        }

        // pending_open_gcode: read + scan the job file.
        if let Some(path) = self.state.pending_open_gcode.take() {
            match crate::core::gcode::read_job_file(&path) {
                Ok(content) => {
                    let summary = crate::core::gcode::GcodeSummary::scan(&content);
                    self.state.status_message = format!(
                        "Loaded {}: {}",
                        path.file_name().and_then(|n| n.to_str()).unwrap_or("?"),
                        summary.describe()
                    );
                    self.state.gcode_summary = Some(summary);
                    self.state.gcode_path = Some(path);
                }
                Err(e) => {
                    self.state.status_message = format!("Cannot open job: {e}");
                    self.state.warnings.push(e.to_string());
                }
            }
        }

        // pending_stream: play the job into the console.
        if let Some(path) = self.state.pending_stream.take() {
            if self.state.link.state().accepts_motion() {
                self.state.stream_in_progress = true;
                self.stream_manager.start_stream(path);
            } else {
                self.state.status_message =
                    "Connect and unlock the printer before printing.".to_string();
            }
        }
        if self.state.request_cancel_stream {
            self.state.request_cancel_stream = false;
            self.stream_manager.cancel_stream();
        }

        // Connection actions.
        if self.state.request_connect {
            self.state.request_connect = false;
            let port = self.state.port_input.clone();
            match self.state.link.connect(&port, self.state.baud) {
                Ok(()) => {
                    self.state.status_message =
                        format!("Connected to {} — unlock to enable motion.", port.trim());
                    self.save_session();
                }
                Err(e) => self.state.status_message = e,
            }
        }
        if self.state.request_disconnect {
            self.state.request_disconnect = false;
            if self.state.stream_in_progress {
                self.stream_manager.cancel_stream();
            }
            self.state.link.disconnect();
            self.state.status_message = "Disconnected.".to_string();
        }
        if self.state.request_unlock {
            self.state.request_unlock = false;
            match self.state.link.unlock() {
                Ok(()) => self.state.status_message = "Printer unlocked.".to_string(),
                Err(e) => self.state.status_message = e,
            }
        }

        // pending_jog: compose and send a jog move.
        if let Some((axis, distance)) = self.state.pending_jog.take() {
            let settings = self.state.settings.clone();
            match self.state.link.jog(axis, distance, &settings) {
                Ok(()) => {
                    self.state.status_message = format!("Jog {axis}{distance:+.1} mm.");
                }
                Err(e) => self.state.status_message = e,
            }
        }

        // pending_console_send: a manually typed command.
        if let Some(command) = self.state.pending_console_send.take() {
            if self.state.link.state().is_linked() {
                self.state.link.send(&[command]);
            } else {
                self.state.status_message = "Connect before sending commands.".to_string();
            }
        }
    }

    // -------------------------------------------------------------------------
    // Menu / layout
    // -------------------------------------------------------------------------

    fn menu_bar(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open STL\u{2026}").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("STL files", &["stl", "STL"])
                        .pick_file()
                    {
                        self.state.pending_select_stl = Some(path);
                    }
                    ui.close_menu();
                }
                if ui.button("Open G-code\u{2026}").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("G-code files", &["gcode", "gc", "nc", "ngc", "tap"])
                        .pick_file()
                    {
                        self.state.pending_open_gcode = Some(path);
                    }
                    ui.close_menu();
                }
                ui.separator();

                // Export sub-menu -- enabled only when a stack exists.
                let has_layers = !self.state.layers.is_empty();
                ui.add_enabled_ui(has_layers, |ui| {
                    ui.menu_button("Export Report", |ui| {
                        if ui.button("As CSV\u{2026}").clicked() {
                            self.export_report(ReportFormat::Csv);
                            ui.close_menu();
                        }
                        if ui.button("As JSON\u{2026}").clicked() {
                            self.export_report(ReportFormat::Json);
                            ui.close_menu();
                        }
                    });
                });
                ui.separator();
                if ui.button("Exit").clicked() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });
            ui.menu_button("View", |ui| {
                ui.add_enabled_ui(!self.state.layers.is_empty(), |ui| {
                    if ui.button("Slice Viewer").clicked() {
                        self.state.show_slice_viewer = true;
                        ui.close_menu();
                    }
                });
                ui.add_enabled_ui(self.state.slice_summary.is_some(), |ui| {
                    if ui.button("Slice Summary").clicked() {
                        self.state.show_summary = true;
                        ui.close_menu();
                    }
                });
                ui.separator();
                ui.add_enabled_ui(self.state.mesh.is_some(), |ui| {
                    if ui.button("Reset Camera").clicked() {
                        self.state.request_camera_reset = true;
                        ui.close_menu();
                    }
                });
            });
        });
    }

    fn export_report(&mut self, format: ReportFormat) {
        let (filter, extensions, default_name) = match format {
            ReportFormat::Csv => ("CSV", &["csv"][..], "slice_report.csv"),
            ReportFormat::Json => ("JSON", &["json"][..], "slice_report.json"),
        };

        let Some(dest) = rfd::FileDialog::new()
            .add_filter(filter, extensions)
            .set_file_name(default_name)
            .save_file()
        else {
            return;
        };

        match write_report(&self.state.layers, format, &dest) {
            Ok(n) => self.state.status_message = format!("Exported {n} layer rows."),
            Err(e) => {
                self.state.status_message = format!("Export failed: {e}");
                self.state.warnings.push(e.to_string());
            }
        }
    }
}

#[derive(Clone, Copy)]
enum ReportFormat {
    Csv,
    Json,
}

/// Create the destination file and write the report, funnelling every
/// failure through the typed error hierarchy.
fn write_report(
    layers: &[crate::core::model::SliceLayer],
    format: ReportFormat,
    dest: &std::path::Path,
) -> Result<usize, crate::util::error::PrintBenchError> {
    let file = std::fs::File::create(dest).map_err(|e| crate::util::error::PrintBenchError::Io {
        path: dest.to_path_buf(),
        operation: "create",
        source: e,
    })?;

    let rows = match format {
        ReportFormat::Csv => crate::core::export::export_csv(layers, file, dest)?,
        ReportFormat::Json => crate::core::export::export_json(layers, file, dest)?,
    };
    Ok(rows)
}

impl eframe::App for PrintBenchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Poll background jobs.
        let had_slice = self.drain_slice_progress();
        let had_stream = self.drain_stream_progress();

        // Repaint promptly while any job is active so progress appears
        // without waiting for input events.
        if had_slice || had_stream {
            ctx.request_repaint();
        } else if self.state.slice_in_progress || self.state.stream_in_progress {
            ctx.request_repaint_after(std::time::Duration::from_millis(
                crate::util::constants::JOB_POLL_INTERVAL_MS,
            ));
        }

        // ---- Handle flags set by panels ----
        self.execute_pending();

        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            self.menu_bar(ctx, ui);
        });

        // Status bar
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if self.state.stream_in_progress {
                    ui.label(
                        egui::RichText::new(" \u{25cf} PRINTING ")
                            .strong()
                            .color(egui::Color32::from_rgb(34, 197, 94)),
                    );
                    ui.separator();
                }
                ui.label(&self.state.status_message);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let colour = ui::theme::machine_colour(self.state.link.state());
                    ui.label(
                        egui::RichText::new(self.state.link.state().label()).color(colour),
                    );
                    ui.separator();
                    if !self.state.layers.is_empty() {
                        ui.label(format!("{} layers", self.state.layers.len()));
                    }
                    if !self.state.warnings.is_empty() {
                        ui.label(
                            egui::RichText::new(format!("{} warnings", self.state.warnings.len()))
                                .color(ui::theme::WARNING),
                        );
                    }
                });
            });
        });

        // Console (bottom, above the status bar)
        egui::TopBottomPanel::bottom("console_pane")
            .resizable(true)
            .default_height(ui::theme::CONSOLE_HEIGHT)
            .show(ctx, |ui| {
                ui::panels::console::render(ui, &mut self.state);
            });

        // Left sidebar: connection, jog, model/job sections.
        egui::SidePanel::left("sidebar")
            .default_width(ui::theme::SIDEBAR_WIDTH)
            .resizable(true)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .id_salt("sidebar_scroll")
                    .auto_shrink([false; 2])
                    .show(ui, |ui| {
                        ui::panels::connection::render(ui, &mut self.state);
                        ui.separator();
                        ui::panels::jog::render(ui, &mut self.state);
                        ui.separator();
                        ui::panels::model::render(ui, &mut self.state);
                    });
            });

        // Central panel: 3D viewport.
        egui::CentralPanel::default().show(ctx, |ui| {
            self.viewport.show(ui, self.state.mesh.as_deref());
        });

        // Floating windows.
        self.slice_viewer.render(ctx, &mut self.state);
        ui::panels::summary::render(ctx, &mut self.state);
    }

    /// Called by eframe when the application window is about to close.
    ///
    /// Saves the current session so the next launch can restore it.
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.save_session();
    }
}
