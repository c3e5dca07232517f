//! Single-owner coordinator for the recording session.
//!
//! The coordinator is an actor: it owns the state machine, the live backend
//! handle, and the session context, and processes commands strictly one at a
//! time from an mpsc queue. Asynchronous callbacks (open failures, backend
//! loss, media scan completion) arrive on a second channel feeding the same
//! loop, so every event observes a consistent state.
//!
//! [`CoordinatorHandle`] is the cheap, cloneable front: it sends commands and
//! exposes a broadcast stream of state snapshots.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::{broadcast, mpsc, oneshot};
use uuid::Uuid;

use crate::errors::RecorderError;
use crate::platform::{CaptureGrant, DisplayInfo, PermissionOutcome};
use crate::recorder::backend::ScreenRecorder;
use crate::recorder::collaborators::{
    Collaborators, Notification, NotificationAction, OverlayState, GESTURE_WAIT_NOTIFICATION_ID,
    RECORDING_NOTIFICATION_ID, SHARE_NOTIFICATION_ID,
};
use crate::recorder::config::SessionConfig;
use crate::recorder::state::{transition, RecordingEvent, RecordingPhase, RecordingState, SideEffect};

pub const TOAST_STARTED: &str = "Screen recording started";
pub const TOAST_PAUSED: &str = "Screen recording paused";
pub const TOAST_RESUMED: &str = "Screen recording resumed";
pub const TOAST_STOPPED: &str = "Screen recording stopped";
pub const TOAST_ALREADY_ACTIVE: &str = "Screen recording is already active";
pub const TOAST_WAITING_FOR_GESTURE: &str = "Shake your device to start recording";
pub const TOAST_FAILED: &str = "Screen recording failed";

/// How long the stopped session waits for the media index callback before
/// showing the share notification anyway.
const SCAN_TIMEOUT: Duration = Duration::from_secs(30);

const VIBRATION_DURATION: Duration = Duration::from_millis(500);

/// Commands accepted by the coordinator, processed strictly in order.
pub enum Command {
    Start {
        outcome: PermissionOutcome,
        display: DisplayInfo,
        response_tx: oneshot::Sender<Result<(), RecorderError>>,
    },
    Pause,
    Resume,
    Stop {
        response_tx: oneshot::Sender<Result<PathBuf, RecorderError>>,
    },
    CancelGestureWait,
    ShakeDetected,
    /// The backend reported an unsolicited stop.
    BackendStopped,
    Status {
        response_tx: oneshot::Sender<RecordingStatus>,
    },
}

/// Internal events produced by effect execution and background tasks, fed
/// back through the loop so follow-up transitions stay serialized.
enum WorkerEvent {
    OpenFailed,
    BackendLost,
    ScanFinished { timed_out: bool },
    TeardownFailed,
}

/// Observable snapshot of the session state.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RecordingStatus {
    pub phase: RecordingPhase,
    pub elapsed_ms: u64,
    pub output_path: Option<String>,
}

/// Context carried for the lifetime of one session, from accepted start to
/// share notification (or failure).
struct SessionContext {
    id: Uuid,
    grant: CaptureGrant,
    config: SessionConfig,
    overlays_bound: bool,
}

pub struct RecordingCoordinator {
    state: RecordingState,
    collaborators: Collaborators,
    backend: Option<Box<dyn ScreenRecorder>>,
    session: Option<SessionContext>,
    pending_start: Option<oneshot::Sender<Result<(), RecorderError>>>,
    pending_stop: Option<oneshot::Sender<Result<PathBuf, RecorderError>>>,
    command_rx: mpsc::Receiver<Command>,
    worker_rx: mpsc::Receiver<WorkerEvent>,
    worker_tx: mpsc::Sender<WorkerEvent>,
    events: broadcast::Sender<RecordingStatus>,
}

impl RecordingCoordinator {
    pub fn new(collaborators: Collaborators) -> (Self, CoordinatorHandle) {
        let (command_tx, command_rx) = mpsc::channel(16);
        let (worker_tx, worker_rx) = mpsc::channel(64);
        let (events, _) = broadcast::channel(32);

        let coordinator = Self {
            state: RecordingState::Idle,
            collaborators,
            backend: None,
            session: None,
            pending_start: None,
            pending_stop: None,
            command_rx,
            worker_rx,
            worker_tx,
            events: events.clone(),
        };
        let handle = CoordinatorHandle { command_tx, events };
        (coordinator, handle)
    }

    /// Actor loop. Runs until every handle is dropped.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                Some(command) = self.command_rx.recv() => {
                    self.handle_command(command).await;
                }
                Some(event) = self.worker_rx.recv() => {
                    self.handle_worker_event(event).await;
                }
                else => break,
            }
        }
        tracing::debug!(target: "recorder", "coordinator loop exited");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Start {
                outcome,
                display,
                response_tx,
            } => self.handle_start(outcome, display, response_tx).await,
            Command::Pause => self.handle_pause().await,
            Command::Resume => self.handle_resume().await,
            Command::Stop { response_tx } => self.handle_stop(response_tx).await,
            Command::CancelGestureWait => self.apply(RecordingEvent::CancelRequested).await,
            Command::ShakeDetected => self.apply(RecordingEvent::ShakeDetected).await,
            Command::BackendStopped => self.apply(RecordingEvent::BackendStopped).await,
            Command::Status { response_tx } => {
                let _ = response_tx.send(self.snapshot());
            }
        }
    }

    async fn handle_worker_event(&mut self, event: WorkerEvent) {
        let event = match event {
            WorkerEvent::OpenFailed => RecordingEvent::OpenFailed,
            WorkerEvent::BackendLost => RecordingEvent::BackendStopped,
            WorkerEvent::ScanFinished { timed_out: false } => RecordingEvent::ScanCompleted,
            WorkerEvent::ScanFinished { timed_out: true } => RecordingEvent::ScanTimedOut,
            WorkerEvent::TeardownFailed => RecordingEvent::TeardownFailed,
        };
        self.apply(event).await;
    }

    /// Run one event through the state machine and execute the effects.
    /// Follow-up events produced by effects are queued, not recursed into.
    async fn apply(&mut self, event: RecordingEvent) {
        tracing::debug!(target: "recorder", "event {:?} in {:?}", event, self.state.phase());
        let (next, effects) = transition(self.state.clone(), event);
        self.state = next;
        for effect in effects {
            if let Some(follow_up) = self.execute_effect(effect) {
                let _ = self.worker_tx.send(follow_up).await;
            }
        }
    }

    async fn handle_start(
        &mut self,
        outcome: PermissionOutcome,
        display: DisplayInfo,
        response_tx: oneshot::Sender<Result<(), RecorderError>>,
    ) {
        let grant = match outcome {
            PermissionOutcome::Granted(grant) => grant,
            PermissionOutcome::Denied { scope } => {
                tracing::warn!(target: "recorder", "start rejected: {} permission denied", scope);
                let _ = response_tx.send(Err(RecorderError::PermissionDenied(scope)));
                return;
            }
        };

        if self.state.phase() != RecordingPhase::Idle {
            self.apply(RecordingEvent::StartRequested {
                await_gesture: false,
            })
            .await;
            let _ = response_tx.send(Err(RecorderError::AlreadyRecording));
            return;
        }

        let settings = match self.collaborators.settings.load() {
            Ok(settings) => settings,
            Err(e) => {
                tracing::error!(target: "recorder", "failed to load settings: {e}");
                self.collaborators.notifications.toast(TOAST_FAILED);
                let _ = response_tx.send(Err(e.into()));
                return;
            }
        };

        let config = match SessionConfig::resolve(&settings, &display, chrono::Local::now()) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(target: "recorder", "failed to resolve session config: {e}");
                self.collaborators.notifications.toast(TOAST_FAILED);
                let _ = response_tx.send(Err(e.into()));
                return;
            }
        };

        if let (Some(launcher), Some(package)) =
            (&self.collaborators.app_launcher, &settings.launch_app)
        {
            tracing::info!(target: "recorder", "launching {package} before recording");
            launcher.launch(package);
        }

        let await_gesture = settings.shake_gesture;
        self.session = Some(SessionContext {
            id: Uuid::new_v4(),
            grant,
            config,
            overlays_bound: false,
        });
        self.pending_start = Some(response_tx);
        self.apply(RecordingEvent::StartRequested { await_gesture })
            .await;
    }

    async fn handle_pause(&mut self) {
        if self.state.phase() != RecordingPhase::Recording {
            return;
        }
        let supported = self
            .backend
            .as_ref()
            .map(|b| b.supports_pause())
            .unwrap_or(false);
        if !supported {
            tracing::debug!(target: "recorder", "pause ignored: backend cannot pause");
            return;
        }
        self.apply(RecordingEvent::PauseRequested).await;
    }

    async fn handle_resume(&mut self) {
        if self.state.phase() != RecordingPhase::Paused {
            return;
        }
        self.apply(RecordingEvent::ResumeRequested).await;
    }

    async fn handle_stop(
        &mut self,
        response_tx: oneshot::Sender<Result<PathBuf, RecorderError>>,
    ) {
        match self.state.phase() {
            RecordingPhase::Recording | RecordingPhase::Paused => {
                self.pending_stop = Some(response_tx);
                self.apply(RecordingEvent::StopRequested).await;
            }
            RecordingPhase::AwaitingGesture => {
                // Stop while waiting cancels the wait; no file was produced.
                self.apply(RecordingEvent::StopRequested).await;
                let _ = response_tx.send(Err(RecorderError::NotRecording));
            }
            _ => {
                let _ = response_tx.send(Err(RecorderError::NotRecording));
            }
        }
    }

    fn execute_effect(&mut self, effect: SideEffect) -> Option<WorkerEvent> {
        match effect {
            SideEffect::ArmGesture => {
                self.collaborators.gesture.arm();
                None
            }
            SideEffect::DisarmGesture => {
                self.collaborators.gesture.disarm();
                None
            }
            SideEffect::OpenSession => self.open_session(),
            SideEffect::PauseBackend => self.pause_backend(),
            SideEffect::ResumeBackend => self.resume_backend(),
            SideEffect::Teardown { abnormal } => self.teardown(abnormal),
            SideEffect::ShowWaitingNotification => {
                self.collaborators.notifications.post(
                    GESTURE_WAIT_NOTIFICATION_ID,
                    Notification {
                        title: "Waiting for shake".to_string(),
                        text: TOAST_WAITING_FOR_GESTURE.to_string(),
                        ongoing: true,
                        chronometer_base: None,
                        actions: vec![NotificationAction::CancelGestureWait],
                    },
                );
                self.collaborators
                    .notifications
                    .toast(TOAST_WAITING_FOR_GESTURE);
                if let Some(tx) = self.pending_start.take() {
                    let _ = tx.send(Ok(()));
                }
                None
            }
            SideEffect::CancelWaitingNotification => {
                self.collaborators
                    .notifications
                    .cancel(GESTURE_WAIT_NOTIFICATION_ID);
                None
            }
            SideEffect::RefreshRecordingNotification { paused } => {
                self.post_recording_notification(paused);
                self.collaborators
                    .notifications
                    .toast(if paused { TOAST_PAUSED } else { TOAST_RESUMED });
                None
            }
            SideEffect::ShowShareNotification => {
                let path = self
                    .session
                    .as_ref()
                    .map(|s| s.config.output_path.clone())
                    .unwrap_or_default();
                self.collaborators.notifications.post(
                    SHARE_NOTIFICATION_ID,
                    Notification {
                        title: "Recording saved".to_string(),
                        text: path.display().to_string(),
                        ongoing: false,
                        chronometer_base: None,
                        actions: vec![NotificationAction::Share, NotificationAction::Edit],
                    },
                );
                self.collaborators.notifications.toast(TOAST_STOPPED);
                if let Some(tx) = self.pending_stop.take() {
                    let _ = tx.send(Ok(path));
                }
                self.session = None;
                None
            }
            SideEffect::NotifyDuplicateStart => {
                self.collaborators.notifications.toast(TOAST_ALREADY_ACTIVE);
                None
            }
            SideEffect::NotifyFailure => {
                self.collaborators.notifications.toast(TOAST_FAILED);
                self.session = None;
                None
            }
            SideEffect::Vibrate => {
                self.collaborators.notifications.vibrate(VIBRATION_DURATION);
                None
            }
            SideEffect::EmitStateChange => {
                let _ = self.events.send(self.snapshot());
                None
            }
        }
    }

    /// Open the capture handle, bind overlays, post the session notification.
    fn open_session(&mut self) -> Option<WorkerEvent> {
        let (grant, config) = match &self.session {
            Some(session) => (session.grant.clone(), session.config.clone()),
            None => {
                tracing::error!(target: "recorder", "open requested without a session context");
                return Some(WorkerEvent::OpenFailed);
            }
        };

        let mut backend = (self.collaborators.recorder_factory)();
        if let Err(e) = backend.open(&grant, &config) {
            tracing::error!(target: "recorder", "failed to open capture handle: {e}");
            backend.release();
            if let Some(tx) = self.pending_start.take() {
                let _ = tx.send(Err(e.into()));
            }
            return Some(WorkerEvent::OpenFailed);
        }
        self.backend = Some(backend);

        if config.use_floating_controls {
            if let Some(overlay) = self.collaborators.floating_controls.as_mut() {
                overlay.start();
            }
        }
        if config.show_camera_overlay {
            if let Some(overlay) = self.collaborators.camera_overlay.as_mut() {
                overlay.start();
            }
        }
        if let Some(session) = self.session.as_mut() {
            session.overlays_bound = true;
        }
        self.sync_overlays(OverlayState::Recording);

        self.sync_touches(true);

        self.post_recording_notification(false);
        self.collaborators.notifications.toast(TOAST_STARTED);
        if let Some(tx) = self.pending_start.take() {
            let _ = tx.send(Ok(()));
        }

        if let Some(session) = &self.session {
            tracing::info!(
                target: "recorder",
                "session {} recording to {} at {}x{}@{}",
                session.id,
                config.output_path.display(),
                config.width,
                config.height,
                config.frame_rate,
            );
        }
        None
    }

    fn pause_backend(&mut self) -> Option<WorkerEvent> {
        if let Some(backend) = self.backend.as_mut() {
            if let Err(e) = backend.pause() {
                tracing::error!(target: "recorder", "pause failed: {e}");
                return Some(WorkerEvent::BackendLost);
            }
        }
        self.sync_overlays(OverlayState::Paused);
        self.sync_touches(false);
        None
    }

    fn resume_backend(&mut self) -> Option<WorkerEvent> {
        if let Some(backend) = self.backend.as_mut() {
            if let Err(e) = backend.resume() {
                tracing::error!(target: "recorder", "resume failed: {e}");
                return Some(WorkerEvent::BackendLost);
            }
        }
        self.sync_overlays(OverlayState::Recording);
        self.sync_touches(true);
        None
    }

    /// Stop the encoder, release the handle, and kick off media indexing.
    ///
    /// A stop failure means the output file is corrupt: it is deleted and the
    /// user is notified instead of shown a share action.
    fn teardown(&mut self, abnormal: bool) -> Option<WorkerEvent> {
        self.collaborators.gesture.disarm();

        let (floating_on, camera_on, output, bound) = match &self.session {
            Some(session) => (
                session.config.use_floating_controls,
                session.config.show_camera_overlay,
                session.config.output_path.clone(),
                session.overlays_bound,
            ),
            None => {
                tracing::error!(target: "recorder", "teardown requested without a session context");
                return Some(WorkerEvent::TeardownFailed);
            }
        };

        if bound {
            if floating_on {
                if let Some(overlay) = self.collaborators.floating_controls.as_mut() {
                    overlay.stop();
                }
            }
            if camera_on {
                if let Some(overlay) = self.collaborators.camera_overlay.as_mut() {
                    overlay.stop();
                }
            }
        }
        self.sync_touches(false);
        self.collaborators
            .notifications
            .cancel(RECORDING_NOTIFICATION_ID);

        let mut backend = match self.backend.take() {
            Some(backend) => backend,
            None => {
                tracing::error!(target: "recorder", "teardown requested without a live backend");
                return Some(WorkerEvent::TeardownFailed);
            }
        };

        match backend.stop() {
            Ok(()) => {
                backend.release();
                if abnormal {
                    tracing::warn!(
                        target: "recorder",
                        "backend-initiated stop; preserving captured output {}",
                        output.display(),
                    );
                }
                let scanner = Arc::clone(&self.collaborators.scanner);
                let worker_tx = self.worker_tx.clone();
                tokio::spawn(async move {
                    let timed_out =
                        match tokio::time::timeout(SCAN_TIMEOUT, scanner.scan(&output)).await {
                            Ok(Ok(())) => false,
                            Ok(Err(e)) => {
                                tracing::warn!(target: "recorder", "media scan failed: {e}");
                                false
                            }
                            Err(_) => {
                                tracing::warn!(
                                    target: "recorder",
                                    "media scan timed out after {SCAN_TIMEOUT:?}",
                                );
                                true
                            }
                        };
                    let _ = worker_tx.send(WorkerEvent::ScanFinished { timed_out }).await;
                });
                None
            }
            Err(e) => {
                tracing::error!(target: "recorder", "encoder stop failed: {e}");
                backend.release();
                match std::fs::remove_file(&output) {
                    Ok(()) => {
                        tracing::info!(
                            target: "recorder",
                            "deleted corrupt output {}",
                            output.display(),
                        );
                    }
                    Err(io) => {
                        tracing::warn!(
                            target: "recorder",
                            "could not delete corrupt output {}: {io}",
                            output.display(),
                        );
                    }
                }
                if let Some(tx) = self.pending_stop.take() {
                    let _ = tx.send(Err(e.into()));
                }
                Some(WorkerEvent::TeardownFailed)
            }
        }
    }

    fn sync_overlays(&mut self, state: OverlayState) {
        let (floating_on, camera_on, bound) = match &self.session {
            Some(session) => (
                session.config.use_floating_controls,
                session.config.show_camera_overlay,
                session.overlays_bound,
            ),
            None => return,
        };
        if !bound {
            return;
        }
        if floating_on {
            if let Some(overlay) = self.collaborators.floating_controls.as_mut() {
                overlay.set_recording_state(state);
            }
        }
        if camera_on {
            if let Some(overlay) = self.collaborators.camera_overlay.as_mut() {
                overlay.set_recording_state(state);
            }
        }
    }

    /// Best-effort touch visualization toggle, only when the session opted
    /// in.
    fn sync_touches(&self, enabled: bool) {
        let show_touches = self
            .session
            .as_ref()
            .map(|s| s.config.show_touches)
            .unwrap_or(false);
        if show_touches {
            self.collaborators.touch.set_enabled(enabled);
        }
    }

    /// Post the ongoing session notification with the action set and
    /// chronometer matching the current state.
    fn post_recording_notification(&mut self, paused: bool) {
        let supports_pause = self
            .backend
            .as_ref()
            .map(|b| b.supports_pause())
            .unwrap_or(false);

        let mut actions = vec![NotificationAction::Stop];
        if supports_pause {
            actions.push(if paused {
                NotificationAction::Resume
            } else {
                NotificationAction::Pause
            });
        }

        let chronometer_base = if paused {
            None
        } else {
            Some(SystemTime::now() - self.state.elapsed())
        };

        self.collaborators.notifications.post(
            RECORDING_NOTIFICATION_ID,
            Notification {
                title: if paused {
                    "Recording paused".to_string()
                } else {
                    "Recording in progress".to_string()
                },
                text: String::new(),
                ongoing: true,
                chronometer_base,
                actions,
            },
        );
    }

    fn snapshot(&self) -> RecordingStatus {
        RecordingStatus {
            phase: self.state.phase(),
            elapsed_ms: self.state.elapsed().as_millis() as u64,
            output_path: self
                .session
                .as_ref()
                .map(|s| s.config.output_path.display().to_string()),
        }
    }
}

/// Cloneable front for the coordinator actor.
#[derive(Clone)]
pub struct CoordinatorHandle {
    command_tx: mpsc::Sender<Command>,
    events: broadcast::Sender<RecordingStatus>,
}

impl CoordinatorHandle {
    /// Request a session start. Resolves once the capture handle is open (or
    /// the gesture wait is armed), or with the rejection reason.
    pub async fn start(
        &self,
        outcome: PermissionOutcome,
        display: DisplayInfo,
    ) -> Result<(), RecorderError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.command_tx
            .send(Command::Start {
                outcome,
                display,
                response_tx,
            })
            .await
            .map_err(|_| RecorderError::ChannelClosed)?;
        response_rx.await.map_err(|_| RecorderError::ChannelClosed)?
    }

    pub async fn pause(&self) {
        let _ = self.command_tx.send(Command::Pause).await;
    }

    pub async fn resume(&self) {
        let _ = self.command_tx.send(Command::Resume).await;
    }

    /// Request a stop. Resolves with the output path once teardown and media
    /// indexing (or its timeout) complete.
    pub async fn stop(&self) -> Result<PathBuf, RecorderError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.command_tx
            .send(Command::Stop { response_tx })
            .await
            .map_err(|_| RecorderError::ChannelClosed)?;
        response_rx.await.map_err(|_| RecorderError::ChannelClosed)?
    }

    pub async fn cancel_gesture_wait(&self) {
        let _ = self.command_tx.send(Command::CancelGestureWait).await;
    }

    /// Relay a recognized shake from the sensor glue.
    pub async fn shake_detected(&self) {
        let _ = self.command_tx.send(Command::ShakeDetected).await;
    }

    /// Relay an unsolicited backend stop.
    pub async fn backend_stopped(&self) {
        let _ = self.command_tx.send(Command::BackendStopped).await;
    }

    pub async fn status(&self) -> RecordingStatus {
        let (response_tx, response_rx) = oneshot::channel();
        if self
            .command_tx
            .send(Command::Status { response_tx })
            .await
            .is_err()
        {
            return RecordingStatus::default();
        }
        response_rx.await.unwrap_or_default()
    }

    /// Subscribe to state snapshots emitted on every transition.
    pub fn subscribe(&self) -> broadcast::Receiver<RecordingStatus> {
        self.events.subscribe()
    }
}
