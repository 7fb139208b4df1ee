/// Error types for DevSleuth core.
///
/// Missing properties and lookup misses are not errors; they surface as
/// invalid properties and absent nodes. What remains is I/O around the
/// settings and dump files, CSV export and the worker thread.
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for DevSleuth core operations.
pub type Result<T> = std::result::Result<T, DevSleuthError>;

#[derive(Error, Debug)]
pub enum DevSleuthError {
    /// Settings file could not be read or written.
    #[error("settings file {path}: {source}")]
    SettingsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Settings file is not valid JSON.
    #[error("settings file {path} is malformed: {source}")]
    SettingsFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Device dump could not be read.
    #[error("device dump {path}: {source}")]
    DumpIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Device dump is not valid JSON or does not describe a device tree.
    #[error("device dump {path} is malformed: {source}")]
    DumpFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The background refresh thread could not be started.
    #[error("failed to spawn refresh worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    /// Export target could not be created.
    #[error("export file {path}: {source}")]
    ExportIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV export failed.
    #[error("export failed: {0}")]
    Export(#[from] csv::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_settings_io() {
        let err = DevSleuthError::SettingsIo {
            path: PathBuf::from("settings.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "settings file settings.json: denied");
    }

    #[test]
    fn test_error_display_worker_spawn() {
        let err = DevSleuthError::WorkerSpawn(std::io::Error::other("no threads"));
        assert_eq!(err.to_string(), "failed to spawn refresh worker: no threads");
    }
}
