// PrintBench - ui/theme.rs
//
// Colour scheme, machine-state colour mapping, and layout constants.
// No dependencies on app state or business logic.

use crate::core::model::{ConsoleDirection, MachineState};
use egui::Color32;

/// Badge colour for a machine state.
pub fn machine_colour(state: &MachineState) -> Color32 {
    match state {
        MachineState::Disconnected => Color32::from_rgb(107, 114, 128), // Gray 500
        MachineState::Alarm { .. } => Color32::from_rgb(217, 119, 6),   // Amber 600
        MachineState::Connected { .. } => Color32::from_rgb(34, 197, 94), // Green 500
    }
}

/// Text colour for a console entry.
pub fn console_colour(direction: ConsoleDirection) -> Color32 {
    match direction {
        ConsoleDirection::Sent => Color32::from_rgb(209, 213, 219), // Gray 300
        ConsoleDirection::Note => Color32::from_rgb(96, 165, 250),  // Blue 400
    }
}

/// Accent used for interactive hints and selected values.
pub const ACCENT: Color32 = Color32::from_rgb(96, 165, 250); // Blue 400

/// Warning text.
pub const WARNING: Color32 = Color32::from_rgb(217, 119, 6); // Amber 600

/// Error text.
pub const ERROR: Color32 = Color32::from_rgb(239, 68, 68); // Red 500

/// Dim secondary text.
pub const DIM: Color32 = Color32::from_rgb(156, 163, 175); // Gray 400

/// Viewport background.
pub const VIEWPORT_BG: Color32 = Color32::from_rgb(24, 29, 38);

/// Viewport mesh base colour (lit per face).
pub const MESH_BASE: Color32 = Color32::from_rgb(148, 163, 184);

/// Build plate grid lines.
pub const PLATE_GRID: Color32 = Color32::from_rgb(55, 65, 81);

/// Axis colours (X, Y, Z).
pub const AXIS_X: Color32 = Color32::from_rgb(220, 38, 38);
pub const AXIS_Y: Color32 = Color32::from_rgb(22, 163, 74);
pub const AXIS_Z: Color32 = Color32::from_rgb(37, 99, 235);

/// Layout constants.
pub const SIDEBAR_WIDTH: f32 = 270.0;
pub const CONSOLE_HEIGHT: f32 = 160.0;
pub const SLICE_VIEW_SIZE: f32 = 512.0;
