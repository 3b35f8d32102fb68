// PrintBench - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// No string-based error propagation; every error keeps its causal chain
// for diagnostic logging.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all PrintBench operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum PrintBenchError {
    /// STL loading or mesh construction failed.
    Mesh(MeshError),

    /// Slicing pipeline failed.
    Slice(SliceError),

    /// G-code reading or scanning failed.
    Gcode(GcodeError),

    /// Report export failed.
    Export(ExportError),

    /// Configuration loading or validation failed.
    Config(ConfigError),

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for PrintBenchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mesh(e) => write!(f, "Mesh error: {e}"),
            Self::Slice(e) => write!(f, "Slice error: {e}"),
            Self::Gcode(e) => write!(f, "G-code error: {e}"),
            Self::Export(e) => write!(f, "Export error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for PrintBenchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Mesh(e) => Some(e),
            Self::Slice(e) => Some(e),
            Self::Gcode(e) => Some(e),
            Self::Export(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<MeshError> for PrintBenchError {
    fn from(e: MeshError) -> Self {
        Self::Mesh(e)
    }
}

impl From<SliceError> for PrintBenchError {
    fn from(e: SliceError) -> Self {
        Self::Slice(e)
    }
}

impl From<GcodeError> for PrintBenchError {
    fn from(e: GcodeError) -> Self {
        Self::Gcode(e)
    }
}

impl From<ExportError> for PrintBenchError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

// ---------------------------------------------------------------------------
// Mesh errors
// ---------------------------------------------------------------------------

/// Errors from STL loading and mesh construction.
#[derive(Debug)]
pub enum MeshError {
    /// The STL file could not be opened.
    Open { path: PathBuf, source: io::Error },

    /// The STL payload could not be decoded.
    Decode { path: PathBuf, source: io::Error },

    /// The file decoded successfully but contains no faces.
    Empty { path: PathBuf },
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { path, source } => {
                write!(f, "cannot open '{}': {source}", path.display())
            }
            Self::Decode { path, source } => {
                write!(f, "cannot decode STL '{}': {source}", path.display())
            }
            Self::Empty { path } => {
                write!(f, "STL '{}' contains no triangles", path.display())
            }
        }
    }
}

impl std::error::Error for MeshError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Open { source, .. } | Self::Decode { source, .. } => Some(source),
            Self::Empty { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Slice errors
// ---------------------------------------------------------------------------

/// Errors from the slicing pipeline.
#[derive(Debug)]
pub enum SliceError {
    /// The configured layer height is outside the accepted range.
    InvalidLayerHeight { value: f64, min: f64, max: f64 },

    /// The plane count for this mesh/layer-height combination exceeds the
    /// hard layer cap.
    TooManyLayers { requested: usize, max: usize },
}

impl fmt::Display for SliceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLayerHeight { value, min, max } => write!(
                f,
                "layer height {value} mm is outside the accepted range ({min}-{max} mm)"
            ),
            Self::TooManyLayers { requested, max } => write!(
                f,
                "slicing would produce {requested} layers (maximum {max}); \
                 increase the layer height"
            ),
        }
    }
}

impl std::error::Error for SliceError {}

// ---------------------------------------------------------------------------
// G-code errors
// ---------------------------------------------------------------------------

/// Errors from G-code job reading and scanning.
#[derive(Debug)]
pub enum GcodeError {
    /// The job file could not be read.
    Read { path: PathBuf, source: io::Error },

    /// The job file is not valid UTF-8.
    NotUtf8 { path: PathBuf },

    /// A jog parameter was rejected.
    InvalidJog { reason: String },
}

impl fmt::Display for GcodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "cannot read '{}': {source}", path.display())
            }
            Self::NotUtf8 { path } => {
                write!(f, "'{}' is not valid UTF-8 text", path.display())
            }
            Self::InvalidJog { reason } => write!(f, "invalid jog request: {reason}"),
        }
    }
}

impl std::error::Error for GcodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Export errors
// ---------------------------------------------------------------------------

/// Errors from slice report export.
#[derive(Debug)]
pub enum ExportError {
    /// CSV serialisation or writing failed.
    Csv {
        path: PathBuf,
        source: csv::Error,
    },

    /// JSON serialisation failed.
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Underlying file write failed.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv { path, source } => {
                write!(f, "CSV export to '{}' failed: {source}", path.display())
            }
            Self::Json { path, source } => {
                write!(f, "JSON export to '{}' failed: {source}", path.display())
            }
            Self::Io { path, source } => {
                write!(f, "cannot write '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Csv { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading.
///
/// Note: out-of-range values are NOT errors — they produce warnings and
/// fall back to defaults so the application always starts. These variants
/// cover the unrecoverable cases only.
#[derive(Debug)]
pub enum ConfigError {
    /// config.toml could not be parsed at all.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "cannot parse '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_includes_path_context() {
        let err = PrintBenchError::Io {
            path: PathBuf::from("/tmp/part.stl"),
            operation: "read",
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/tmp/part.stl"), "missing path in: {msg}");
        assert!(msg.contains("read"), "missing operation in: {msg}");
    }

    #[test]
    fn error_chain_preserves_source() {
        use std::error::Error;
        let err = PrintBenchError::Mesh(MeshError::Open {
            path: PathBuf::from("part.stl"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        });
        let mesh_err = err.source().expect("mesh error");
        assert!(mesh_err.source().is_some(), "io source lost");
    }
}
