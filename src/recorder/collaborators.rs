//! External surfaces the coordinator drives.
//!
//! Each trait mirrors one platform service: notification shade, floating
//! control / camera-preview overlays, touch visualization, the media index,
//! shake sensor arming, and app launching. Production glue implements these
//! against the host platform; tests substitute fakes.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::errors::ScanError;
use crate::recorder::backend::ScreenRecorder;
use crate::settings::SettingsStore;

pub const RECORDING_NOTIFICATION_ID: u32 = 2001;
pub const GESTURE_WAIT_NOTIFICATION_ID: u32 = 2002;
pub const SHARE_NOTIFICATION_ID: u32 = 2003;

/// Action button attached to a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationAction {
    Pause,
    Resume,
    Stop,
    CancelGestureWait,
    Share,
    Edit,
}

/// Content of one posted notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub title: String,
    pub text: String,
    /// Ongoing notifications cannot be dismissed by the user.
    pub ongoing: bool,
    /// Base instant for an elapsed-time chronometer; `now - elapsed` so the
    /// displayed counter continues from the accumulated active time.
    pub chronometer_base: Option<SystemTime>,
    pub actions: Vec<NotificationAction>,
}

/// Notification shade plus transient user feedback (toasts, vibration).
pub trait NotificationSurface: Send {
    fn post(&self, id: u32, notification: Notification);
    fn cancel(&self, id: u32);
    fn toast(&self, message: &str);

    /// Haptic feedback; surfaces without a vibrator ignore it.
    fn vibrate(&self, duration: Duration) {
        let _ = duration;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayState {
    Recording,
    Paused,
}

/// A floating overlay surface bound to the session (controls or camera
/// preview). Started after the capture handle opens, stopped at teardown.
pub trait OverlayService: Send {
    fn start(&mut self);
    fn set_recording_state(&mut self, state: OverlayState);
    fn stop(&mut self);
}

/// Pointer-location visualization toggle. Best effort; failures are the
/// implementation's problem, not the session's.
pub trait TouchVisualizer: Send {
    fn set_enabled(&self, enabled: bool);
}

/// Media index service. Scanning makes the finished recording visible to
/// gallery apps; the share notification waits for it (or a timeout).
#[async_trait]
pub trait MediaScanner: Send + Sync {
    async fn scan(&self, path: &Path) -> Result<(), ScanError>;
}

/// Arms and disarms the platform shake sensor. `disarm` is idempotent.
pub trait GestureControl: Send {
    fn arm(&mut self);
    fn disarm(&mut self);
}

/// Launches another app right before recording starts.
pub trait AppLauncher: Send {
    fn launch(&self, package: &str);
}

/// Produces a fresh backend handle per session.
pub type RecorderFactory = Box<dyn Fn() -> Box<dyn ScreenRecorder> + Send>;

/// Everything the coordinator needs from the outside world.
pub struct Collaborators {
    pub settings: Box<dyn SettingsStore>,
    pub recorder_factory: RecorderFactory,
    pub notifications: Box<dyn NotificationSurface>,
    pub floating_controls: Option<Box<dyn OverlayService>>,
    pub camera_overlay: Option<Box<dyn OverlayService>>,
    pub touch: Box<dyn TouchVisualizer>,
    pub scanner: Arc<dyn MediaScanner>,
    pub gesture: Box<dyn GestureControl>,
    pub app_launcher: Option<Box<dyn AppLauncher>>,
}
