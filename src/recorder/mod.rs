//! Recording session lifecycle.
//!
//! - `state`: pure state machine `(state, event) -> (state, effects)`
//! - `coordinator`: single-owner actor executing the effects
//! - `config`: immutable per-session configuration snapshot
//! - `backend`: capture/encode handle abstraction
//! - `collaborators`: traits for the external surfaces the session syncs

pub mod backend;
pub mod collaborators;
pub mod config;
pub mod coordinator;
pub mod state;

pub use backend::ScreenRecorder;
pub use collaborators::Collaborators;
pub use config::SessionConfig;
pub use coordinator::{CoordinatorHandle, RecordingCoordinator};
pub use state::{RecordingPhase, RecordingState};
