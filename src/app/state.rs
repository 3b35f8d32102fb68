// PrintBench - app/state.rs
//
// Application state management. Holds the connection, model, slice stack,
// job, and console state plus the pending-action flags written by panels
// and consumed by the top-level update loop. Owned by the eframe::App
// implementation.
//
// Panels never touch managers or perform I/O; they write `pending_*` /
// `request_*` fields here and `gui.rs` executes them each frame.

use std::path::PathBuf;
use std::sync::Arc;

use crate::app::printer::PrinterLink;
use crate::app::session::Session;
use crate::core::gcode::{GcodeSummary, JogAxis};
use crate::core::mesh::TriMesh;
use crate::core::model::{PrintSettings, SliceLayer, SliceSummary};
use crate::platform::config::AppConfig;

/// Top-level application state.
#[derive(Debug)]
pub struct AppState {
    // -- Connection --
    /// Port name as typed in the connection panel.
    pub port_input: String,

    /// Selected baud rate.
    pub baud: u32,

    /// Machine state and console transcript.
    pub link: PrinterLink,

    // -- Settings --
    pub settings: PrintSettings,

    // -- Model --
    /// Currently selected STL (None until the user picks one).
    pub stl_path: Option<PathBuf>,

    /// Mesh shown in the 3D viewport (loaded on demand by "Show").
    pub mesh: Option<Arc<TriMesh>>,

    // -- Slice stack --
    /// Whether a slice job is currently in progress.
    pub slice_in_progress: bool,

    /// Rasterised layers of the current stack, bottom first.
    pub layers: Vec<SliceLayer>,

    /// Planes processed so far / planned, for the progress readout.
    pub planes_completed: usize,
    pub planes_total: usize,

    /// Summary from the most recent completed slice job.
    pub slice_summary: Option<SliceSummary>,

    /// Selected layer index in the slice viewer.
    pub selected_layer: usize,

    /// Whether the slice viewer window is open.
    pub show_slice_viewer: bool,

    /// Whether to show the slice summary dialog.
    pub show_summary: bool,

    /// Slice image size (pixels) from config.
    pub raster_size: u32,

    // -- G-code job --
    pub gcode_path: Option<PathBuf>,
    pub gcode_summary: Option<GcodeSummary>,

    /// Whether a job stream is in progress.
    pub stream_in_progress: bool,
    pub stream_sent: usize,
    pub stream_total: usize,

    // -- Status --
    /// Status message for the status bar.
    pub status_message: String,

    /// Non-fatal warnings accumulated during the session.
    pub warnings: Vec<String>,

    // -- Console input --
    pub console_input: String,

    // ---- Pending actions (written by panels, consumed by gui.rs) ----
    /// A panel selected a new STL path.
    pub pending_select_stl: Option<PathBuf>,

    /// A panel requested slicing of this STL.
    pub pending_slice: Option<PathBuf>,

    /// A panel requested loading this STL into the viewport.
    pub pending_show_stl: Option<PathBuf>,

    /// A panel selected a new G-code job file.
    pub pending_open_gcode: Option<PathBuf>,

    /// A panel requested streaming this job.
    pub pending_stream: Option<PathBuf>,

    /// A panel requested the running slice job be cancelled.
    pub request_cancel_slice: bool,

    /// A panel requested the running job stream be cancelled.
    pub request_cancel_stream: bool,

    /// Connection panel actions.
    pub request_connect: bool,
    pub request_disconnect: bool,
    pub request_unlock: bool,

    /// Jog panel action: axis and signed distance (mm).
    pub pending_jog: Option<(JogAxis, f64)>,

    /// Console panel action: a manually typed command.
    pub pending_console_send: Option<String>,

    /// Viewport should reframe its camera on the current mesh.
    pub request_camera_reset: bool,
}

impl AppState {
    /// Create initial state from validated config and an optional restored
    /// session.
    pub fn new(config: &AppConfig, session: Option<Session>) -> Self {
        let session = session.unwrap_or_default();

        let settings = {
            let mut s = session.settings.unwrap_or_default();
            // The config layer height is the default; an explicitly saved
            // session value wins only if the config did not change it.
            if s.layer_height_mm == PrintSettings::default().layer_height_mm {
                s.layer_height_mm = config.layer_height_mm;
            }
            s
        };

        Self {
            port_input: session.port.unwrap_or_else(|| config.port.clone()),
            baud: session.baud.unwrap_or(config.baud),
            link: PrinterLink::new(),
            settings,
            stl_path: session.stl_path,
            mesh: None,
            slice_in_progress: false,
            layers: Vec::new(),
            planes_completed: 0,
            planes_total: 0,
            slice_summary: None,
            selected_layer: 0,
            show_slice_viewer: false,
            show_summary: false,
            raster_size: config.raster_size,
            gcode_path: session.gcode_path,
            gcode_summary: None,
            stream_in_progress: false,
            stream_sent: 0,
            stream_total: 0,
            status_message: "Ready. Open an STL file to begin.".to_string(),
            warnings: Vec::new(),
            console_input: String::new(),
            pending_select_stl: None,
            pending_slice: None,
            pending_show_stl: None,
            pending_open_gcode: None,
            pending_stream: None,
            request_cancel_slice: false,
            request_cancel_stream: false,
            request_connect: false,
            request_disconnect: false,
            request_unlock: false,
            pending_jog: None,
            pending_console_send: None,
            request_camera_reset: false,
        }
    }

    /// The layer currently selected in the slice viewer, if any.
    pub fn selected_layer(&self) -> Option<&SliceLayer> {
        self.layers.get(self.selected_layer)
    }

    /// Clamp the selection to the stack; called whenever the stack changes.
    pub fn clamp_selection(&mut self) {
        if self.layers.is_empty() {
            self.selected_layer = 0;
        } else if self.selected_layer >= self.layers.len() {
            self.selected_layer = self.layers.len() - 1;
        }
    }

    /// Reset slice results ahead of a new job.
    pub fn clear_slice(&mut self) {
        self.layers.clear();
        self.planes_completed = 0;
        self.planes_total = 0;
        self.slice_summary = None;
        self.selected_layer = 0;
        self.show_summary = false;
    }

    /// Snapshot for session persistence.
    pub fn to_session(&self) -> Session {
        Session {
            stl_path: self.stl_path.clone(),
            gcode_path: self.gcode_path.clone(),
            port: Some(self.port_input.clone()),
            baud: Some(self.baud),
            settings: Some(self.settings.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::PrintSettings;

    fn state() -> AppState {
        AppState::new(&AppConfig::default(), None)
    }

    fn layer(index: usize) -> SliceLayer {
        SliceLayer {
            index,
            z: index as f64 + 0.5,
            outline_count: 1,
            closed_count: 1,
            point_count: 4,
            image: image::RgbaImage::new(1, 1),
        }
    }

    #[test]
    fn selection_clamps_to_stack() {
        let mut s = state();
        s.layers = vec![layer(0), layer(1), layer(2)];
        s.selected_layer = 10;
        s.clamp_selection();
        assert_eq!(s.selected_layer, 2);

        s.layers.clear();
        s.clamp_selection();
        assert_eq!(s.selected_layer, 0);
        assert!(s.selected_layer().is_none());
    }

    #[test]
    fn session_restores_connection_defaults() {
        let session = Session {
            port: Some("COM7".to_string()),
            baud: Some(250_000),
            settings: Some(PrintSettings {
                nozzle_diameter_mm: 0.6,
                ..Default::default()
            }),
            ..Default::default()
        };
        let s = AppState::new(&AppConfig::default(), Some(session));
        assert_eq!(s.port_input, "COM7");
        assert_eq!(s.baud, 250_000);
        assert_eq!(s.settings.nozzle_diameter_mm, 0.6);
    }

    #[test]
    fn config_layer_height_applies_when_session_left_default() {
        let config = AppConfig {
            layer_height_mm: 0.25,
            ..Default::default()
        };
        let s = AppState::new(&config, None);
        assert_eq!(s.settings.layer_height_mm, 0.25);
    }

    #[test]
    fn clear_slice_resets_progress_and_selection() {
        let mut s = state();
        s.layers = vec![layer(0)];
        s.planes_total = 5;
        s.planes_completed = 5;
        s.selected_layer = 0;
        s.show_summary = true;

        s.clear_slice();
        assert!(s.layers.is_empty());
        assert_eq!(s.planes_total, 0);
        assert!(!s.show_summary);
    }
}
