//! screencam - recording session lifecycle controller for a screen recorder.
//!
//! The crate owns the state machine and command serialization for a single
//! screen-recording session: start/pause/resume/stop, shake-to-start gesture
//! arming, notification and overlay synchronization, and post-stop media
//! indexing. Everything platform-specific (the hardware encoder, the
//! notification presenter, overlay surfaces, the media index service) is an
//! external collaborator behind a trait in [`recorder::collaborators`].
//!
//! Entry point: build a [`recorder::collaborators::Collaborators`] bundle,
//! hand it to [`RecordingCoordinator::new`], spawn
//! [`RecordingCoordinator::run`] on a tokio runtime, and drive the session
//! through the returned [`CoordinatorHandle`].

pub mod errors;
pub mod gesture;
pub mod logging;
pub mod platform;
pub mod recorder;
pub mod settings;
pub mod shared;

pub use errors::RecorderError;
pub use recorder::coordinator::{CoordinatorHandle, RecordingCoordinator, RecordingStatus};
pub use recorder::state::RecordingPhase;
