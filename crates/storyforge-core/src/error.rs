use std::path::PathBuf;
use thiserror::Error;

use crate::bundler::{BundleError, PluginError};

/// Boxed error returned by user-supplied callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Core error type for storyforge operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read config at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Preset value for `{key}` is malformed: {source}")]
    PresetValue {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Preset `{preset}` failed while applying `{key}`: {message}")]
    Preset {
        preset: String,
        key: String,
        message: String,
    },

    #[error("User build configuration failed: {0}")]
    UserBuildConfig(#[source] BoxError),

    #[error("Dev server cannot {action} while {state}")]
    InvalidState {
        action: &'static str,
        state: &'static str,
    },

    #[error("Dev server was stopped while starting")]
    Bailed,

    #[error(transparent)]
    Bundle(#[from] BundleError),

    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error("{0}")]
    Other(String),
}

impl Error {
    #[must_use]
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

/// Convenience result alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
