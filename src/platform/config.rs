// PrintBench - platform/config.rs
//
// Platform path resolution and config.toml loading with startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance. Invalid config values never abort startup:
// each produces an actionable warning and falls back to its default.

use directories::ProjectDirs;
use std::path::{Path, PathBuf};

use crate::util::constants;

/// Resolved platform paths for PrintBench data and configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/printbench/).
    pub config_dir: PathBuf,

    /// Data directory for the session file.
    pub data_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to the current directory if platform dirs cannot be
    /// determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            let data_dir = proj_dirs.data_dir().to_path_buf();

            tracing::debug!(
                config = %config_dir.display(),
                data = %data_dir.display(),
                "Platform paths resolved"
            );

            Self {
                config_dir,
                data_dir,
            }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            let fallback = PathBuf::from(".");
            Self {
                config_dir: fallback.clone(),
                data_dir: fallback,
            }
        }
    }

    /// Full path of the session file.
    pub fn session_file(&self) -> PathBuf {
        self.data_dir.join(constants::SESSION_FILE_NAME)
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility -- a newer
/// config file can be used with an older binary without crashing.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[serial]` section.
    pub serial: SerialSection,
    /// `[slicing]` section.
    pub slicing: SlicingSection,
    /// `[ui]` section.
    pub ui: UiSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[serial]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct SerialSection {
    /// Default port name pre-filled in the connection panel.
    pub port: Option<String>,
    /// Default baud rate.
    pub baud: Option<u32>,
}

/// `[slicing]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct SlicingSection {
    /// Cutting-plane step in millimetres.
    pub layer_height_mm: Option<f64>,
    /// Slice image size in pixels (square).
    pub raster_size: Option<u32>,
}

/// `[ui]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct UiSection {
    /// Theme: "dark" or "light".
    pub theme: Option<String>,
    /// Body font size in points.
    pub font_size: Option<f32>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// Validated application configuration derived from `config.toml`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // -- Serial --
    /// Default port name.
    pub port: String,
    /// Default baud rate.
    pub baud: u32,

    // -- Slicing --
    /// Cutting-plane step in millimetres.
    pub layer_height_mm: f64,
    /// Slice image size in pixels.
    pub raster_size: u32,

    // -- UI --
    /// Dark mode (true) or light mode (false).
    pub dark_mode: bool,
    /// Body font size in points.
    pub font_size: f32,

    // -- Logging --
    /// Logging level string (consumed before tracing is available).
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: constants::DEFAULT_PORT.to_string(),
            baud: constants::DEFAULT_BAUD,
            layer_height_mm: constants::DEFAULT_LAYER_HEIGHT_MM,
            raster_size: constants::DEFAULT_RASTER_SIZE,
            dark_mode: true,
            font_size: constants::DEFAULT_FONT_SIZE,
            log_level: None,
        }
    }
}

/// Load and validate `config.toml` from the given config directory.
///
/// Returns `AppConfig` with validated values and a list of non-fatal
/// warnings. A missing file is a first-run default; an unparseable file
/// falls back to defaults with a warning so the application still starts.
pub fn load_config(config_dir: &Path) -> (AppConfig, Vec<String>) {
    let config_path = config_dir.join(constants::CONFIG_FILE_NAME);

    let mut warnings: Vec<String> = Vec::new();

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), warnings);
    }

    let content = match std::fs::read_to_string(&config_path) {
        Ok(c) => c,
        Err(e) => {
            let msg = format!(
                "Could not read config file '{}': {e}. Using defaults.",
                config_path.display()
            );
            tracing::warn!("{}", msg);
            warnings.push(msg);
            return (AppConfig::default(), warnings);
        }
    };

    let raw: RawConfig = match toml::from_str(&content) {
        Ok(r) => r,
        Err(e) => {
            let err = crate::util::error::ConfigError::TomlParse {
                path: config_path.clone(),
                source: e,
            };
            let msg = format!(
                "{err}. Using defaults. See config.example.toml for the expected format."
            );
            tracing::warn!("{}", msg);
            warnings.push(msg);
            return (AppConfig::default(), warnings);
        }
    };

    tracing::info!(path = %config_path.display(), "Loaded config.toml");

    (validate(raw, &mut warnings), warnings)
}

/// Validate raw values against named constants, accumulating all warnings.
fn validate(raw: RawConfig, warnings: &mut Vec<String>) -> AppConfig {
    let mut config = AppConfig::default();

    // -- Serial: port --
    if let Some(port) = raw.serial.port {
        if port.trim().is_empty() {
            warnings.push("[serial] port is empty. Using platform default.".to_string());
        } else {
            config.port = port;
        }
    }

    // -- Serial: baud --
    if let Some(baud) = raw.serial.baud {
        if constants::BAUD_RATES.contains(&baud) {
            config.baud = baud;
        } else {
            warnings.push(format!(
                "[serial] baud = {baud} is not a supported rate ({:?}). Using default ({}).",
                constants::BAUD_RATES,
                constants::DEFAULT_BAUD,
            ));
        }
    }

    // -- Slicing: layer_height_mm --
    if let Some(h) = raw.slicing.layer_height_mm {
        if h.is_finite()
            && (constants::MIN_LAYER_HEIGHT_MM..=constants::MAX_LAYER_HEIGHT_MM).contains(&h)
        {
            config.layer_height_mm = h;
        } else {
            warnings.push(format!(
                "[slicing] layer_height_mm = {h} is out of range ({}-{}). Using default ({}).",
                constants::MIN_LAYER_HEIGHT_MM,
                constants::MAX_LAYER_HEIGHT_MM,
                constants::DEFAULT_LAYER_HEIGHT_MM,
            ));
        }
    }

    // -- Slicing: raster_size --
    if let Some(size) = raw.slicing.raster_size {
        if (constants::MIN_RASTER_SIZE..=constants::MAX_RASTER_SIZE).contains(&size) {
            config.raster_size = size;
        } else {
            warnings.push(format!(
                "[slicing] raster_size = {size} is out of range ({}-{}). Using default ({}).",
                constants::MIN_RASTER_SIZE,
                constants::MAX_RASTER_SIZE,
                constants::DEFAULT_RASTER_SIZE,
            ));
        }
    }

    // -- UI: theme --
    if let Some(ref theme) = raw.ui.theme {
        match theme.to_lowercase().as_str() {
            "dark" => config.dark_mode = true,
            "light" => config.dark_mode = false,
            other => {
                warnings.push(format!(
                    "[ui] theme = \"{other}\" is not recognised. Expected \"dark\" or \"light\". Using default (dark).",
                ));
            }
        }
    }

    // -- UI: font_size --
    if let Some(size) = raw.ui.font_size {
        if (constants::MIN_FONT_SIZE..=constants::MAX_FONT_SIZE).contains(&size) {
            config.font_size = size;
        } else {
            warnings.push(format!(
                "[ui] font_size = {size} is out of range ({}-{}). Using default ({}).",
                constants::MIN_FONT_SIZE,
                constants::MAX_FONT_SIZE,
                constants::DEFAULT_FONT_SIZE,
            ));
        }
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.clone());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default (info).",
            ));
        }
    }

    if !warnings.is_empty() {
        tracing::warn!(count = warnings.len(), "Config validation produced warnings");
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> (AppConfig, Vec<String>) {
        let raw: RawConfig = toml::from_str(text).unwrap();
        let mut warnings = Vec::new();
        let config = validate(raw, &mut warnings);
        (config, warnings)
    }

    #[test]
    fn empty_config_is_all_defaults_no_warnings() {
        let (config, warnings) = parse("");
        assert!(warnings.is_empty());
        assert_eq!(config.baud, constants::DEFAULT_BAUD);
        assert_eq!(config.layer_height_mm, constants::DEFAULT_LAYER_HEIGHT_MM);
        assert!(config.dark_mode);
    }

    #[test]
    fn valid_values_are_applied() {
        let (config, warnings) = parse(
            r#"
[serial]
port = "/dev/ttyACM0"
baud = 250000

[slicing]
layer_height_mm = 0.5
raster_size = 1024

[ui]
theme = "light"
font_size = 16.0

[logging]
level = "debug"
"#,
        );
        assert!(warnings.is_empty(), "{warnings:?}");
        assert_eq!(config.port, "/dev/ttyACM0");
        assert_eq!(config.baud, 250_000);
        assert_eq!(config.layer_height_mm, 0.5);
        assert_eq!(config.raster_size, 1024);
        assert!(!config.dark_mode);
        assert_eq!(config.font_size, 16.0);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn out_of_range_values_warn_and_fall_back() {
        let (config, warnings) = parse(
            r#"
[serial]
baud = 1234

[slicing]
layer_height_mm = 500.0
raster_size = 7

[ui]
theme = "solarized"
"#,
        );
        assert_eq!(warnings.len(), 4, "{warnings:?}");
        assert_eq!(config.baud, constants::DEFAULT_BAUD);
        assert_eq!(config.layer_height_mm, constants::DEFAULT_LAYER_HEIGHT_MM);
        assert_eq!(config.raster_size, constants::DEFAULT_RASTER_SIZE);
        assert!(config.dark_mode);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let (_, warnings) = parse("[future]\nshiny = true\n");
        assert!(warnings.is_empty());
    }
}
