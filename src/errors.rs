//! Error taxonomy for the recording controller.
//!
//! Every error here is handled inside the controller and surfaced through the
//! notification/toast surface; nothing propagates as a panic to the host.

use std::path::PathBuf;
use thiserror::Error;

use crate::platform::PermissionScope;
use crate::recorder::backend::BackendError;
use crate::settings::SettingsError;

/// Malformed preference values detected while resolving a session config.
///
/// A config error fails the start attempt before any capture handle is
/// acquired; the controller stays Idle.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid resolution value '{0}' (expected WIDTHxHEIGHT)")]
    InvalidResolution(String),

    #[error("invalid filename timestamp pattern '{0}'")]
    InvalidTimestampPattern(String),

    #[error("save location {path} is unavailable: {source}")]
    SaveLocationUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Errors reported by the media index collaborator.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("media index service unavailable")]
    Unavailable,
    #[error("media scan failed: {0}")]
    Failed(String),
}

/// Top-level error type for controller operations.
#[derive(Error, Debug)]
pub enum RecorderError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("recording already in progress")]
    AlreadyRecording,

    #[error("no recording in progress")]
    NotRecording,

    #[error("capture permission denied ({0})")]
    PermissionDenied(PermissionScope),

    #[error("recorder is shutting down")]
    ChannelClosed,
}
