// PrintBench - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "PrintBench";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "PrintBench";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the configuration file looked up in the platform config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Name of the session file written to the platform data directory.
pub const SESSION_FILE_NAME: &str = "session.json";

// =============================================================================
// Serial connection defaults
// =============================================================================

/// Default serial port name shown on first run.
#[cfg(windows)]
pub const DEFAULT_PORT: &str = "COM3";
#[cfg(not(windows))]
pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";

/// Default baud rate (GRBL's standard rate).
pub const DEFAULT_BAUD: u32 = 115_200;

/// Baud rates offered in the connection panel.
pub const BAUD_RATES: &[u32] = &[9_600, 19_200, 38_400, 57_600, 115_200, 250_000];

// =============================================================================
// Slicing limits
// =============================================================================

/// Default cutting-plane step in millimetres.
pub const DEFAULT_LAYER_HEIGHT_MM: f64 = 1.0;

/// Smallest accepted layer height. Below this a moderately sized model
/// produces tens of thousands of raster layers.
pub const MIN_LAYER_HEIGHT_MM: f64 = 0.05;

/// Largest accepted layer height.
pub const MAX_LAYER_HEIGHT_MM: f64 = 10.0;

/// Geometric tolerance for plane/edge intersection and endpoint matching.
pub const SLICE_TOLERANCE: f64 = 1e-6;

/// Hard upper bound on the number of layers a single slice job may produce.
/// At the default 512x512 RGBA raster each layer costs 1 MiB, so this caps
/// the stack at ~4 GiB worst case; jobs exceeding it fail with a clear error
/// instead of exhausting memory.
pub const MAX_SLICE_LAYERS: usize = 4_096;

/// Number of rasterised layers delivered per progress message.
pub const LAYER_BATCH_SIZE: usize = 8;

// =============================================================================
// Rasterisation
// =============================================================================

/// Default slice image dimensions in pixels.
pub const DEFAULT_RASTER_SIZE: u32 = 512;

/// Accepted range for configured raster size.
pub const MIN_RASTER_SIZE: u32 = 64;
pub const MAX_RASTER_SIZE: u32 = 4_096;

/// Blank border around the model in each slice image, in pixels.
pub const RASTER_MARGIN_PX: u32 = 16;

// =============================================================================
// Jog and machine limits
// =============================================================================

/// Default jog step in millimetres.
pub const DEFAULT_JOG_STEP_MM: f64 = 10.0;

/// Jog step presets offered in the jog panel.
pub const JOG_STEP_PRESETS_MM: &[f64] = &[0.1, 1.0, 10.0, 50.0];

/// Default jog feed rate in millimetres per minute.
pub const DEFAULT_JOG_FEED_MM_MIN: f64 = 1_500.0;

/// Accepted jog feed range (mm/min).
pub const MIN_JOG_FEED_MM_MIN: f64 = 1.0;
pub const MAX_JOG_FEED_MM_MIN: f64 = 20_000.0;

/// Default ball diameter print setting (mm).
pub const DEFAULT_BALL_DIAMETER_MM: f64 = 3.0;

/// Default nozzle diameter print setting (mm).
pub const DEFAULT_NOZZLE_DIAMETER_MM: f64 = 0.4;

/// Accepted range for diameter settings (mm).
pub const MIN_DIAMETER_MM: f64 = 0.05;
pub const MAX_DIAMETER_MM: f64 = 50.0;

// =============================================================================
// G-code job handling
// =============================================================================

/// Job files at or above this size are read through a memory map rather
/// than `fs::read_to_string`.
pub const GCODE_MMAP_THRESHOLD: u64 = 8 * 1024 * 1024; // 8 MB

/// Number of streamed job lines recorded per progress message.
pub const STREAM_BATCH_SIZE: usize = 64;

/// Pacing delay between streamed line batches, in milliseconds. Keeps the
/// console readable while a job plays out instead of dumping the whole file
/// in one frame.
pub const STREAM_BATCH_DELAY_MS: u64 = 25;

/// Maximum console entries retained; older entries are discarded oldest-first.
pub const MAX_CONSOLE_ENTRIES: usize = 10_000;

// =============================================================================
// UI
// =============================================================================

/// Default body font size in points.
pub const DEFAULT_FONT_SIZE: f32 = 14.0;

/// Accepted font size range.
pub const MIN_FONT_SIZE: f32 = 9.0;
pub const MAX_FONT_SIZE: f32 = 24.0;

/// Repaint interval while a background job is active (ms).
pub const JOB_POLL_INTERVAL_MS: u64 = 50;

// =============================================================================
// Logging
// =============================================================================

/// Default log level when neither RUST_LOG, --debug, nor config specify one.
pub const DEFAULT_LOG_LEVEL: &str = "info";
