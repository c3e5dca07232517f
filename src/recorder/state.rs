//! Pure state machine for the recording session lifecycle.
//!
//! This module implements the state machine as a pure function:
//! `(State, Event) -> (NewState, Vec<SideEffect>)`
//!
//! Invalid transitions return the current state with empty effects, which is
//! what makes stop-when-idle a safe no-op and a late backend callback during
//! teardown harmless. The state machine never performs I/O; the coordinator
//! executes the returned effects.

use serde::Serialize;
use std::time::{Duration, Instant};

/// Recording lifecycle states. Active-time bookkeeping lives in the variants
/// so pause/resume cycles cannot desynchronize the elapsed counter.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordingState {
    /// No session; ready to accept a start command.
    Idle,

    /// Start accepted, shake detector armed, no capture handle open yet.
    AwaitingGesture,

    /// Encoder running. `elapsed` is active time accumulated before the
    /// current segment; `resumed_at` anchors the running segment.
    Recording {
        resumed_at: Instant,
        elapsed: Duration,
    },

    /// Encoder frozen; `elapsed` is the total active time so far.
    Paused { elapsed: Duration },

    /// Teardown in progress; the session stays logically alive until the
    /// media index callback (or its timeout) fires.
    Stopping { elapsed: Duration },
}

impl Default for RecordingState {
    fn default() -> Self {
        Self::Idle
    }
}

impl RecordingState {
    /// Total active recording time, including the running segment.
    pub fn elapsed(&self) -> Duration {
        match self {
            RecordingState::Idle | RecordingState::AwaitingGesture => Duration::ZERO,
            RecordingState::Recording {
                resumed_at,
                elapsed,
            } => *elapsed + resumed_at.elapsed(),
            RecordingState::Paused { elapsed } | RecordingState::Stopping { elapsed } => *elapsed,
        }
    }

    pub fn phase(&self) -> RecordingPhase {
        match self {
            RecordingState::Idle => RecordingPhase::Idle,
            RecordingState::AwaitingGesture => RecordingPhase::AwaitingGesture,
            RecordingState::Recording { .. } => RecordingPhase::Recording,
            RecordingState::Paused { .. } => RecordingPhase::Paused,
            RecordingState::Stopping { .. } => RecordingPhase::Stopping,
        }
    }
}

/// Serializable label for the current lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecordingPhase {
    #[default]
    Idle,
    AwaitingGesture,
    Recording,
    Paused,
    Stopping,
}

/// Events that can trigger state transitions. User commands and asynchronous
/// callbacks (shake, backend stop, scan completion) are funneled through the
/// same serialized queue, so the machine never sees concurrent events.
#[derive(Debug, Clone)]
pub enum RecordingEvent {
    /// A start command was accepted and its config resolved.
    StartRequested { await_gesture: bool },

    /// The armed shake detector recognized a shake.
    ShakeDetected,

    /// User cancelled the shake wait.
    CancelRequested,

    PauseRequested,
    ResumeRequested,
    StopRequested,

    /// Opening the capture handle failed after the optimistic transition
    /// into Recording.
    OpenFailed,

    /// The backend reported an unsolicited stop (revoked permission,
    /// process pressure). Handled like a stop command, logged as abnormal.
    BackendStopped,

    /// Media indexing finished for the stopped session's output file.
    ScanCompleted,

    /// Media indexing never called back within the deadline.
    ScanTimedOut,

    /// Teardown itself failed; the partial output was discarded.
    TeardownFailed,
}

/// Side effects triggered by state transitions.
///
/// These are returned by `transition()` and executed by the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum SideEffect {
    ArmGesture,
    DisarmGesture,

    /// Open the capture/encode handle, bind auxiliary overlays, post the
    /// recording notification.
    OpenSession,

    PauseBackend,
    ResumeBackend,

    /// Stop the encoder, release the mirroring handle, request indexing.
    Teardown { abnormal: bool },

    ShowWaitingNotification,
    CancelWaitingNotification,

    /// Re-post the ongoing recording notification with the action and
    /// chronometer appropriate for the (new) state.
    RefreshRecordingNotification { paused: bool },

    /// Post the share/edit notification for the finished output file.
    ShowShareNotification,

    NotifyDuplicateStart,
    NotifyFailure,
    Vibrate,

    /// Broadcast a state snapshot to subscribed observers.
    EmitStateChange,
}

/// Pure state transition function.
///
/// Returns the new state and any side effects to execute. Invalid
/// transitions return the current state with an empty effect list.
pub fn transition(
    state: RecordingState,
    event: RecordingEvent,
) -> (RecordingState, Vec<SideEffect>) {
    match (&state, event) {
        (RecordingState::Idle, RecordingEvent::StartRequested { await_gesture: true }) => (
            RecordingState::AwaitingGesture,
            vec![
                SideEffect::ArmGesture,
                SideEffect::ShowWaitingNotification,
                SideEffect::EmitStateChange,
            ],
        ),

        (RecordingState::Idle, RecordingEvent::StartRequested { await_gesture: false }) => (
            RecordingState::Recording {
                resumed_at: Instant::now(),
                elapsed: Duration::ZERO,
            },
            vec![SideEffect::OpenSession, SideEffect::EmitStateChange],
        ),

        // Any start while a session is live is rejected without state change.
        (_, RecordingEvent::StartRequested { .. }) => {
            (state, vec![SideEffect::NotifyDuplicateStart])
        }

        // The detector stays armed so a later shake can stop the session;
        // it is only disarmed on the stop/cancel paths.
        (RecordingState::AwaitingGesture, RecordingEvent::ShakeDetected) => (
            RecordingState::Recording {
                resumed_at: Instant::now(),
                elapsed: Duration::ZERO,
            },
            vec![
                SideEffect::CancelWaitingNotification,
                SideEffect::Vibrate,
                SideEffect::OpenSession,
                SideEffect::EmitStateChange,
            ],
        ),

        // Stop while waiting doubles as cancel; no handle was ever opened.
        (
            RecordingState::AwaitingGesture,
            RecordingEvent::CancelRequested | RecordingEvent::StopRequested,
        ) => (
            RecordingState::Idle,
            vec![
                SideEffect::DisarmGesture,
                SideEffect::CancelWaitingNotification,
                SideEffect::EmitStateChange,
            ],
        ),

        (
            RecordingState::Recording {
                resumed_at,
                elapsed,
            },
            RecordingEvent::PauseRequested,
        ) => (
            RecordingState::Paused {
                elapsed: *elapsed + resumed_at.elapsed(),
            },
            vec![
                SideEffect::PauseBackend,
                SideEffect::RefreshRecordingNotification { paused: true },
                SideEffect::EmitStateChange,
            ],
        ),

        (RecordingState::Paused { elapsed }, RecordingEvent::ResumeRequested) => (
            RecordingState::Recording {
                resumed_at: Instant::now(),
                elapsed: *elapsed,
            },
            vec![
                SideEffect::ResumeBackend,
                SideEffect::RefreshRecordingNotification { paused: false },
                SideEffect::EmitStateChange,
            ],
        ),

        (
            RecordingState::Recording {
                resumed_at,
                elapsed,
            },
            RecordingEvent::StopRequested,
        ) => (
            RecordingState::Stopping {
                elapsed: *elapsed + resumed_at.elapsed(),
            },
            vec![
                SideEffect::Teardown { abnormal: false },
                SideEffect::EmitStateChange,
            ],
        ),

        (RecordingState::Paused { elapsed }, RecordingEvent::StopRequested) => (
            RecordingState::Stopping { elapsed: *elapsed },
            vec![
                SideEffect::Teardown { abnormal: false },
                SideEffect::EmitStateChange,
            ],
        ),

        // A shake while recording toggles a stop.
        (
            RecordingState::Recording {
                resumed_at,
                elapsed,
            },
            RecordingEvent::ShakeDetected,
        ) => (
            RecordingState::Stopping {
                elapsed: *elapsed + resumed_at.elapsed(),
            },
            vec![
                SideEffect::DisarmGesture,
                SideEffect::Teardown { abnormal: false },
                SideEffect::EmitStateChange,
            ],
        ),

        (RecordingState::Paused { elapsed }, RecordingEvent::ShakeDetected) => (
            RecordingState::Stopping { elapsed: *elapsed },
            vec![
                SideEffect::DisarmGesture,
                SideEffect::Teardown { abnormal: false },
                SideEffect::EmitStateChange,
            ],
        ),

        (
            RecordingState::Recording {
                resumed_at,
                elapsed,
            },
            RecordingEvent::BackendStopped,
        ) => (
            RecordingState::Stopping {
                elapsed: *elapsed + resumed_at.elapsed(),
            },
            vec![
                SideEffect::Teardown { abnormal: true },
                SideEffect::EmitStateChange,
            ],
        ),

        (RecordingState::Paused { elapsed }, RecordingEvent::BackendStopped) => (
            RecordingState::Stopping { elapsed: *elapsed },
            vec![
                SideEffect::Teardown { abnormal: true },
                SideEffect::EmitStateChange,
            ],
        ),

        (RecordingState::Recording { .. }, RecordingEvent::OpenFailed) => (
            RecordingState::Idle,
            vec![SideEffect::NotifyFailure, SideEffect::EmitStateChange],
        ),

        (
            RecordingState::Stopping { .. },
            RecordingEvent::ScanCompleted | RecordingEvent::ScanTimedOut,
        ) => (
            RecordingState::Idle,
            vec![
                SideEffect::ShowShareNotification,
                SideEffect::EmitStateChange,
            ],
        ),

        (RecordingState::Stopping { .. }, RecordingEvent::TeardownFailed) => (
            RecordingState::Idle,
            vec![SideEffect::NotifyFailure, SideEffect::EmitStateChange],
        ),

        // Invalid transition: keep the current state, no effects. Covers
        // stop-when-idle, pause on unsupported paths, and late backend
        // callbacks arriving during or after teardown.
        _ => (state, vec![]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording_for(elapsed: Duration, running_for: Duration) -> RecordingState {
        RecordingState::Recording {
            resumed_at: Instant::now() - running_for,
            elapsed,
        }
    }

    #[test]
    fn test_idle_start_opens_session() {
        let (state, effects) = transition(
            RecordingState::Idle,
            RecordingEvent::StartRequested {
                await_gesture: false,
            },
        );
        assert!(matches!(state, RecordingState::Recording { .. }));
        assert_eq!(
            effects,
            vec![SideEffect::OpenSession, SideEffect::EmitStateChange]
        );
    }

    #[test]
    fn test_idle_start_with_gesture_arms_detector() {
        let (state, effects) = transition(
            RecordingState::Idle,
            RecordingEvent::StartRequested {
                await_gesture: true,
            },
        );
        assert_eq!(state, RecordingState::AwaitingGesture);
        assert_eq!(effects[0], SideEffect::ArmGesture);
        assert!(effects.contains(&SideEffect::ShowWaitingNotification));
        assert!(!effects.contains(&SideEffect::OpenSession));
    }

    #[test]
    fn test_shake_starts_recording() {
        let (state, effects) =
            transition(RecordingState::AwaitingGesture, RecordingEvent::ShakeDetected);
        assert!(matches!(state, RecordingState::Recording { .. }));
        assert!(effects.contains(&SideEffect::CancelWaitingNotification));
        assert!(effects.contains(&SideEffect::Vibrate));
        assert!(effects.contains(&SideEffect::OpenSession));
        // the detector must survive the shake-start so it can stop later
        assert!(!effects.contains(&SideEffect::DisarmGesture));
    }

    #[test]
    fn test_cancel_gesture_wait_returns_to_idle() {
        let (state, effects) = transition(
            RecordingState::AwaitingGesture,
            RecordingEvent::CancelRequested,
        );
        assert_eq!(state, RecordingState::Idle);
        assert!(effects.contains(&SideEffect::DisarmGesture));
        assert!(!effects.contains(&SideEffect::OpenSession));
    }

    #[test]
    fn test_stop_while_awaiting_gesture_cancels() {
        let (state, effects) = transition(
            RecordingState::AwaitingGesture,
            RecordingEvent::StopRequested,
        );
        assert_eq!(state, RecordingState::Idle);
        assert!(effects.contains(&SideEffect::CancelWaitingNotification));
        assert!(!effects.iter().any(|e| matches!(e, SideEffect::Teardown { .. })));
    }

    #[test]
    fn test_duplicate_start_is_rejected() {
        for from in [
            RecordingState::AwaitingGesture,
            recording_for(Duration::ZERO, Duration::from_secs(1)),
            RecordingState::Paused {
                elapsed: Duration::from_secs(3),
            },
            RecordingState::Stopping {
                elapsed: Duration::from_secs(3),
            },
        ] {
            let (state, effects) = transition(
                from.clone(),
                RecordingEvent::StartRequested {
                    await_gesture: false,
                },
            );
            assert_eq!(state, from);
            assert_eq!(effects, vec![SideEffect::NotifyDuplicateStart]);
        }
    }

    #[test]
    fn test_pause_accumulates_elapsed() {
        let state = recording_for(Duration::from_secs(5), Duration::from_secs(2));
        let (state, effects) = transition(state, RecordingEvent::PauseRequested);

        let RecordingState::Paused { elapsed } = state else {
            panic!("expected Paused, got {state:?}");
        };
        assert!(elapsed >= Duration::from_secs(7));
        assert!(elapsed < Duration::from_millis(7500));
        assert!(effects.contains(&SideEffect::RefreshRecordingNotification { paused: true }));
    }

    #[test]
    fn test_resume_preserves_elapsed() {
        let (state, effects) = transition(
            RecordingState::Paused {
                elapsed: Duration::from_secs(3),
            },
            RecordingEvent::ResumeRequested,
        );

        let RecordingState::Recording { elapsed, .. } = state else {
            panic!("expected Recording, got {state:?}");
        };
        assert_eq!(elapsed, Duration::from_secs(3));
        assert!(effects.contains(&SideEffect::ResumeBackend));
        assert!(effects.contains(&SideEffect::RefreshRecordingNotification { paused: false }));
    }

    #[test]
    fn test_stop_while_recording_tears_down() {
        let state = recording_for(Duration::ZERO, Duration::from_secs(4));
        let (state, effects) = transition(state, RecordingEvent::StopRequested);
        assert!(matches!(state, RecordingState::Stopping { .. }));
        assert!(effects.contains(&SideEffect::Teardown { abnormal: false }));
    }

    #[test]
    fn test_backend_stop_is_abnormal_teardown() {
        let state = recording_for(Duration::ZERO, Duration::from_secs(4));
        let (state, effects) = transition(state, RecordingEvent::BackendStopped);
        assert!(matches!(state, RecordingState::Stopping { .. }));
        assert!(effects.contains(&SideEffect::Teardown { abnormal: true }));
    }

    #[test]
    fn test_shake_while_recording_stops() {
        let state = recording_for(Duration::ZERO, Duration::from_secs(1));
        let (state, effects) = transition(state, RecordingEvent::ShakeDetected);
        assert!(matches!(state, RecordingState::Stopping { .. }));
        assert!(effects.contains(&SideEffect::DisarmGesture));
        assert!(effects.contains(&SideEffect::Teardown { abnormal: false }));
    }

    #[test]
    fn test_stop_when_idle_is_noop() {
        let (state, effects) = transition(RecordingState::Idle, RecordingEvent::StopRequested);
        assert_eq!(state, RecordingState::Idle);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_pause_when_idle_is_noop() {
        let (state, effects) = transition(RecordingState::Idle, RecordingEvent::PauseRequested);
        assert_eq!(state, RecordingState::Idle);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_late_backend_callback_during_teardown_is_noop() {
        let state = RecordingState::Stopping {
            elapsed: Duration::from_secs(9),
        };
        let (state, effects) = transition(state.clone(), RecordingEvent::BackendStopped);
        assert!(matches!(state, RecordingState::Stopping { .. }));
        assert!(effects.is_empty());
    }

    #[test]
    fn test_scan_completion_shows_share_notification() {
        let state = RecordingState::Stopping {
            elapsed: Duration::from_secs(9),
        };
        let (state, effects) = transition(state, RecordingEvent::ScanCompleted);
        assert_eq!(state, RecordingState::Idle);
        assert!(effects.contains(&SideEffect::ShowShareNotification));
    }

    #[test]
    fn test_scan_timeout_proceeds_anyway() {
        let state = RecordingState::Stopping {
            elapsed: Duration::from_secs(9),
        };
        let (state, effects) = transition(state, RecordingEvent::ScanTimedOut);
        assert_eq!(state, RecordingState::Idle);
        assert!(effects.contains(&SideEffect::ShowShareNotification));
    }

    #[test]
    fn test_open_failure_returns_to_idle() {
        let state = recording_for(Duration::ZERO, Duration::ZERO);
        let (state, effects) = transition(state, RecordingEvent::OpenFailed);
        assert_eq!(state, RecordingState::Idle);
        assert!(effects.contains(&SideEffect::NotifyFailure));
    }

    #[test]
    fn test_teardown_failure_discards_and_notifies() {
        let state = RecordingState::Stopping {
            elapsed: Duration::from_secs(2),
        };
        let (state, effects) = transition(state, RecordingEvent::TeardownFailed);
        assert_eq!(state, RecordingState::Idle);
        assert!(effects.contains(&SideEffect::NotifyFailure));
        assert!(!effects.contains(&SideEffect::ShowShareNotification));
    }

    #[test]
    fn test_elapsed_counts_running_segment() {
        let state = recording_for(Duration::from_secs(10), Duration::from_secs(2));
        let elapsed = state.elapsed();
        assert!(elapsed >= Duration::from_secs(12));
        assert!(elapsed < Duration::from_millis(12500));
    }
}
