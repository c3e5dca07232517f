//! Capture/encode backend abstraction.

use thiserror::Error;

use crate::platform::CaptureGrant;
use crate::recorder::config::SessionConfig;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("failed to open capture handle: {0}")]
    OpenFailed(String),

    #[error("failed to pause encoder: {0}")]
    PauseFailed(String),

    #[error("failed to resume encoder: {0}")]
    ResumeFailed(String),

    #[error("failed to stop encoder: {0}")]
    StopFailed(String),
}

/// One capture/encode handle, single-use: opened with a permission grant and
/// a resolved config, then stopped and released exactly once.
///
/// The coordinator owns at most one live backend at a time. `release` must be
/// called after `stop` regardless of whether `stop` succeeded, and must be
/// infallible.
pub trait ScreenRecorder: Send {
    /// Whether the underlying encoder can freeze and continue mid-session.
    fn supports_pause(&self) -> bool;

    fn open(&mut self, grant: &CaptureGrant, config: &SessionConfig) -> Result<(), BackendError>;

    fn pause(&mut self) -> Result<(), BackendError>;

    fn resume(&mut self) -> Result<(), BackendError>;

    /// Finalize the encoder. On failure the output file is considered
    /// corrupt and the coordinator deletes it.
    fn stop(&mut self) -> Result<(), BackendError>;

    /// Tear down the capture handle. Infallible and idempotent.
    fn release(&mut self);
}
