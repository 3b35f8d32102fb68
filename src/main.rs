// PrintBench - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. Configuration loading and validation
// 3. Logging initialisation (debug mode support)
// 4. Session restore
// 5. eframe GUI launch

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod gui;

// Re-export modules from the library crate so that `gui.rs` can use
// `crate::app::...`, `crate::core::...` etc.
pub use printbench::app;
pub use printbench::core;
pub use printbench::platform;
pub use printbench::ui;
pub use printbench::util;

use clap::Parser;
use std::path::PathBuf;

/// Compile-time-embedded icon PNG bytes (64x64 RGBA).
///
/// Using `include_bytes!` ensures the asset is baked into the binary so the
/// icon is always available regardless of the working directory at runtime.
static ICON_PNG: &[u8] = include_bytes!("../assets/icon.png");

/// Decode the embedded PNG and return an `eframe`-compatible `IconData`.
///
/// Falls back to a transparent 1x1 placeholder if decoding fails so the
/// application always launches rather than panicking on a missing asset.
fn load_icon() -> egui::IconData {
    use image::ImageDecoder;

    match image::codecs::png::PngDecoder::new(std::io::Cursor::new(ICON_PNG)) {
        Ok(decoder) => {
            let (w, h) = decoder.dimensions();
            match image::DynamicImage::from_decoder(decoder) {
                Ok(img) => {
                    let rgba = img.into_rgba8();
                    egui::IconData {
                        rgba: rgba.into_raw(),
                        width: w,
                        height: h,
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to decode icon PNG; using placeholder");
                    placeholder_icon()
                }
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to open icon PNG decoder; using placeholder");
            placeholder_icon()
        }
    }
}

/// 1x1 transparent RGBA icon used when the real icon cannot be loaded.
fn placeholder_icon() -> egui::IconData {
    egui::IconData {
        rgba: vec![0u8; 4],
        width: 1,
        height: 1,
    }
}

/// PrintBench - desktop workbench for small 3D printers.
///
/// Open an STL to preview and slice it into layer images, compose jog and
/// unlock commands, and inspect G-code jobs before streaming them.
#[derive(Parser, Debug)]
#[command(name = "PrintBench", version, about)]
struct Cli {
    /// STL file to pre-select (opens nothing if omitted).
    stl: Option<PathBuf>,

    /// Serial port name (overrides config and session).
    #[arg(long)]
    port: Option<String>,

    /// Baud rate (overrides config and session).
    #[arg(long)]
    baud: Option<u32>,

    /// Cutting-plane step in millimetres (overrides config and session).
    #[arg(short = 'l', long = "layer-height")]
    layer_height: Option<f64>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() {
    let cli = Cli::parse();

    // Resolve platform paths and load config before logging init so the
    // [logging] level can participate in filter selection. Config warnings
    // are carried into the GUI state below, so nothing is lost to the
    // not-yet-initialised logger.
    let platform_paths = platform::config::PlatformPaths::resolve();
    let (config, mut warnings) = platform::config::load_config(&platform_paths.config_dir);

    util::logging::init(cli.debug, config.log_level.as_deref());

    tracing::info!(
        version = util::constants::APP_VERSION,
        debug = cli.debug,
        "PrintBench starting"
    );

    // Restore the previous session (best-effort).
    let session = app::session::Session::load(&platform_paths.session_file());

    // Create application state: config defaults, then session, then CLI.
    let mut state = app::state::AppState::new(&config, session);

    if let Some(port) = cli.port {
        state.port_input = port;
    }
    if let Some(baud) = cli.baud {
        if util::constants::BAUD_RATES.contains(&baud) {
            state.baud = baud;
        } else {
            warnings.push(format!(
                "--baud {baud} is not a supported rate ({:?}); using {}.",
                util::constants::BAUD_RATES,
                state.baud
            ));
        }
    }
    if let Some(h) = cli.layer_height {
        if h.is_finite()
            && (util::constants::MIN_LAYER_HEIGHT_MM..=util::constants::MAX_LAYER_HEIGHT_MM)
                .contains(&h)
        {
            state.settings.layer_height_mm = h;
        } else {
            warnings.push(format!(
                "--layer-height {h} is out of range ({}-{} mm); using {}.",
                util::constants::MIN_LAYER_HEIGHT_MM,
                util::constants::MAX_LAYER_HEIGHT_MM,
                state.settings.layer_height_mm
            ));
        }
    }
    if let Some(path) = cli.stl {
        state.stl_path = Some(path);
    }

    for warning in &warnings {
        tracing::warn!(warning = %warning, "Startup warning");
    }
    state.warnings.extend(warnings);

    // Launch the GUI.
    //
    // The icon is applied at two levels:
    //   1. OS-level (Windows EXE resource) — embedded by build.rs via winres.
    //   2. Runtime (eframe viewport) — loaded here from the PNG asset.
    let icon_data = load_icon();

    let dark_mode = config.dark_mode;
    let font_size = config.font_size;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(format!(
                "{} v{}",
                util::constants::APP_NAME,
                util::constants::APP_VERSION
            ))
            .with_inner_size([1280.0, 840.0])
            .with_min_inner_size([900.0, 560.0])
            .with_icon(icon_data),
        ..Default::default()
    };

    let result = eframe::run_native(
        util::constants::APP_NAME,
        native_options,
        Box::new(move |cc| {
            cc.egui_ctx.set_theme(if dark_mode {
                egui::Theme::Dark
            } else {
                egui::Theme::Light
            });
            configure_text_size(&cc.egui_ctx, font_size);
            Ok(Box::new(gui::PrintBenchApp::new(state, platform_paths)))
        }),
    );

    if let Err(e) = result {
        tracing::error!(error = %e, "Failed to launch GUI");
        eprintln!("Error: Failed to launch PrintBench GUI: {e}");
        std::process::exit(1);
    }
}

/// Apply the configured body font size to the egui context.
fn configure_text_size(ctx: &egui::Context, font_size: f32) {
    if (font_size - util::constants::DEFAULT_FONT_SIZE).abs() < f32::EPSILON {
        return;
    }
    ctx.style_mut(|style| {
        for font in style.text_styles.values_mut() {
            font.size *= font_size / util::constants::DEFAULT_FONT_SIZE;
        }
    });
}
