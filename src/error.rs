use std::path::PathBuf;
use thiserror::Error;

use crate::utils::constants::{EXIT_CONFIG_ERROR, EXIT_IO_ERROR, EXIT_MALFORMED_RECORD};

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot open '{}' for {mode}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        mode: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Malformed record in {source_name} at line {line}: {reason}")]
    MalformedRecord {
        source_name: String,
        line: u64,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration load error: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid pollutant: {0}")]
    InvalidPollutant(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProcessingError {
    pub fn open_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileAccess {
            path: path.into(),
            mode: "reading",
            source,
        }
    }

    pub fn open_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileAccess {
            path: path.into(),
            mode: "writing",
            source,
        }
    }

    /// Process exit status for this error. Argument errors never get here,
    /// clap exits with its own usage status first.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Io(_) | Self::FileAccess { .. } | Self::Csv(_) | Self::Json(_) => EXIT_IO_ERROR,
            Self::Config(_)
            | Self::ConfigLoad(_)
            | Self::Validation(_)
            | Self::InvalidPollutant(_) => EXIT_CONFIG_ERROR,
            Self::MalformedRecord { .. } => EXIT_MALFORMED_RECORD,
        }
    }
}
