// PrintBench - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no UI.
// These types are the shared vocabulary across all layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::util::constants;

// =============================================================================
// Print settings
// =============================================================================

/// User-adjustable machine and slicing settings.
///
/// Persisted in the session file so they survive restarts. Values are
/// clamped at the edit site (settings panel / config validation), so a
/// constructed `PrintSettings` is always in range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintSettings {
    /// Ball diameter in millimetres.
    pub ball_diameter_mm: f64,

    /// Nozzle diameter in millimetres.
    pub nozzle_diameter_mm: f64,

    /// Cutting-plane step used by the slice viewer, in millimetres.
    pub layer_height_mm: f64,

    /// Distance of a single jog move, in millimetres.
    pub jog_step_mm: f64,

    /// Feed rate for jog moves, in millimetres per minute.
    pub jog_feed_mm_min: f64,
}

impl Default for PrintSettings {
    fn default() -> Self {
        Self {
            ball_diameter_mm: constants::DEFAULT_BALL_DIAMETER_MM,
            nozzle_diameter_mm: constants::DEFAULT_NOZZLE_DIAMETER_MM,
            layer_height_mm: constants::DEFAULT_LAYER_HEIGHT_MM,
            jog_step_mm: constants::DEFAULT_JOG_STEP_MM,
            jog_feed_mm_min: constants::DEFAULT_JOG_FEED_MM_MIN,
        }
    }
}

// =============================================================================
// Machine state
// =============================================================================

/// Connection model for the printer link.
///
/// GRBL-style controllers boot into an alarm state after connecting and
/// must be explicitly unlocked before accepting motion commands, hence
/// the three-state model rather than a boolean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MachineState {
    /// No link configured.
    Disconnected,

    /// Link established; controller is alarmed and refuses motion.
    Alarm { port: String, baud: u32 },

    /// Link established and unlocked; motion commands accepted.
    Connected { port: String, baud: u32 },
}

impl MachineState {
    /// True when a link exists, alarmed or not.
    pub fn is_linked(&self) -> bool {
        !matches!(self, Self::Disconnected)
    }

    /// True when motion commands are accepted.
    pub fn accepts_motion(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    /// Short status label for the UI badge.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Disconnected => "offline",
            Self::Alarm { .. } => "alarm",
            Self::Connected { .. } => "ready",
        }
    }
}

// =============================================================================
// Console transcript
// =============================================================================

/// Direction/kind of a console transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleDirection {
    /// A command handed to the printer link.
    Sent,

    /// A local annotation (connect/disconnect, warnings, job markers).
    Note,
}

/// One line of the printer console transcript.
#[derive(Debug, Clone)]
pub struct ConsoleEntry {
    /// Strictly increasing sequence number within the session.
    pub seq: u64,

    /// Wall-clock time the entry was recorded.
    pub timestamp: DateTime<Utc>,

    pub direction: ConsoleDirection,

    pub text: String,
}

// =============================================================================
// Slice stack
// =============================================================================

/// One rasterised cross-section of the model.
#[derive(Debug, Clone)]
pub struct SliceLayer {
    /// Zero-based layer index, bottom layer first.
    pub index: usize,

    /// Height of the cutting plane that produced this layer.
    pub z: f64,

    /// Number of outlines (closed + open) in the cross-section.
    pub outline_count: usize,

    /// Number of closed outlines (these were filled).
    pub closed_count: usize,

    /// Total polyline points across all outlines.
    pub point_count: usize,

    /// Rasterised cross-section, white background, opaque.
    pub image: image::RgbaImage,
}

/// Summary statistics for a completed slice job.
#[derive(Debug, Clone)]
pub struct SliceSummary {
    /// Source STL path.
    pub path: PathBuf,

    /// Triangles in the loaded mesh.
    pub triangle_count: usize,

    /// Mesh bounding box, millimetres.
    pub bounds_min: [f64; 3],
    pub bounds_max: [f64; 3],

    /// Layer height used.
    pub layer_height_mm: f64,

    /// Layers in the resulting stack.
    pub layer_count: usize,

    /// Planes that produced no cross-section and were skipped.
    pub empty_planes: usize,

    /// Wall-clock job duration.
    pub duration: Duration,
}

// =============================================================================
// Slice job progress (for UI updates)
// =============================================================================

/// Progress messages sent from the slice thread to the UI thread.
#[derive(Debug, Clone)]
pub enum SliceProgress {
    /// Job accepted; mesh loading begins.
    Started { path: PathBuf },

    /// Mesh loaded and measured.
    MeshLoaded {
        triangle_count: usize,
        bounds_min: [f64; 3],
        bounds_max: [f64; 3],
    },

    /// Cutting planes generated; rasterisation begins.
    PlanesPlanned { total_planes: usize },

    /// A batch of rasterised layers, streamed in Z order.
    ///
    /// Batched (see LAYER_BATCH_SIZE in util::constants) to amortise channel
    /// overhead while letting the viewer show partial stacks early.
    LayerBatch {
        layers: Vec<SliceLayer>,
        completed_planes: usize,
        total_planes: usize,
    },

    /// Job finished successfully.
    Completed { summary: SliceSummary },

    /// A non-fatal warning occurred (e.g. one plane failed to rasterise).
    Warning { message: String },

    /// Job failed with a fatal error.
    Failed { error: String },

    /// Job was cancelled by the user before completion.
    Cancelled,
}

// =============================================================================
// Job streaming progress
// =============================================================================

/// Progress messages sent from the G-code streaming thread to the UI thread.
#[derive(Debug, Clone)]
pub enum StreamProgress {
    /// Streaming started.
    Started { path: PathBuf, total_lines: usize },

    /// A batch of command lines handed to the link, in file order.
    Lines {
        lines: Vec<String>,
        sent_lines: usize,
        total_lines: usize,
    },

    /// All lines streamed.
    Completed {
        sent_lines: usize,
        duration: Duration,
    },

    /// Streaming failed.
    Failed { error: String },

    /// Streaming was cancelled by the user.
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn machine_state_transitions_expose_motion_gate() {
        let s = MachineState::Disconnected;
        assert!(!s.is_linked());
        assert!(!s.accepts_motion());

        let s = MachineState::Alarm {
            port: "/dev/ttyUSB0".into(),
            baud: 115_200,
        };
        assert!(s.is_linked());
        assert!(!s.accepts_motion());
        assert_eq!(s.label(), "alarm");

        let s = MachineState::Connected {
            port: "/dev/ttyUSB0".into(),
            baud: 115_200,
        };
        assert!(s.accepts_motion());
    }

    #[test]
    fn settings_default_within_documented_ranges() {
        let s = PrintSettings::default();
        assert!(s.layer_height_mm >= constants::MIN_LAYER_HEIGHT_MM);
        assert!(s.layer_height_mm <= constants::MAX_LAYER_HEIGHT_MM);
        assert!(s.nozzle_diameter_mm >= constants::MIN_DIAMETER_MM);
        assert!(s.jog_feed_mm_min <= constants::MAX_JOG_FEED_MM_MIN);
    }

    #[test]
    fn settings_roundtrip_through_json() {
        let s = PrintSettings {
            ball_diameter_mm: 2.5,
            nozzle_diameter_mm: 0.6,
            layer_height_mm: 0.8,
            jog_step_mm: 5.0,
            jog_feed_mm_min: 900.0,
        };
        let text = serde_json::to_string(&s).unwrap();
        let back: PrintSettings = serde_json::from_str(&text).unwrap();
        assert_eq!(s, back);
    }
}
