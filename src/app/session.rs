// PrintBench - app/session.rs
//
// Session persistence: the last model, connection defaults, and print
// settings survive restarts. Stored as JSON in the platform data
// directory. A missing or corrupt session file is never fatal — the
// application starts fresh.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::model::PrintSettings;

/// Persisted application session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    /// Last selected STL model.
    pub stl_path: Option<PathBuf>,

    /// Last opened G-code job.
    pub gcode_path: Option<PathBuf>,

    /// Last used serial port name.
    pub port: Option<String>,

    /// Last used baud rate.
    pub baud: Option<u32>,

    /// Print settings as last edited.
    pub settings: Option<PrintSettings>,
}

impl Session {
    /// Load a session from `path`.
    ///
    /// Returns `None` when the file is missing or unreadable/corrupt; the
    /// corrupt case is logged so the user can find out why their state was
    /// not restored.
    pub fn load(path: &Path) -> Option<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Cannot read session file");
                return None;
            }
        };

        match serde_json::from_str::<Session>(&content) {
            Ok(mut session) => {
                // Paths may have been deleted since the last run; dropping
                // them here keeps downstream code free of stale-path checks.
                if let Some(ref p) = session.stl_path {
                    if !p.exists() {
                        tracing::info!(path = %p.display(), "Session STL no longer exists; dropping");
                        session.stl_path = None;
                    }
                }
                if let Some(ref p) = session.gcode_path {
                    if !p.exists() {
                        tracing::info!(path = %p.display(), "Session G-code no longer exists; dropping");
                        session.gcode_path = None;
                    }
                }
                Some(session)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Corrupt session file ignored");
                None
            }
        }
    }

    /// Save the session to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)?;
        tracing::debug!(path = %path.display(), "Session saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_preserves_fields() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("session.json");

        // Use the session file itself as the "existing" STL path so the
        // stale-path check passes without a fixture.
        let session = Session {
            stl_path: None,
            gcode_path: None,
            port: Some("/dev/ttyACM1".to_string()),
            baud: Some(250_000),
            settings: Some(PrintSettings {
                layer_height_mm: 0.5,
                ..Default::default()
            }),
        };
        session.save(&file).unwrap();

        let restored = Session::load(&file).unwrap();
        assert_eq!(restored.port.as_deref(), Some("/dev/ttyACM1"));
        assert_eq!(restored.baud, Some(250_000));
        assert_eq!(restored.settings.unwrap().layer_height_mm, 0.5);
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Session::load(&dir.path().join("absent.json")).is_none());
    }

    #[test]
    fn corrupt_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("session.json");
        std::fs::write(&file, "{not json").unwrap();
        assert!(Session::load(&file).is_none());
    }

    #[test]
    fn stale_model_path_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("session.json");

        let session = Session {
            stl_path: Some(dir.path().join("deleted.stl")),
            ..Default::default()
        };
        session.save(&file).unwrap();

        let restored = Session::load(&file).unwrap();
        assert!(restored.stl_path.is_none());
    }

    #[test]
    fn existing_model_path_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("session.json");
        let stl = dir.path().join("part.stl");
        std::fs::write(&stl, "solid part\nendsolid part\n").unwrap();

        let session = Session {
            stl_path: Some(stl.clone()),
            ..Default::default()
        };
        session.save(&file).unwrap();

        let restored = Session::load(&file).unwrap();
        assert_eq!(restored.stl_path, Some(stl));
    }
}
