//! Persisted recorder preferences.
//!
//! Settings are read once per session start through a [`SettingsStore`]; the
//! resolved session config is an immutable snapshot, so preference edits made
//! mid-recording only take effect on the next session.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::shared::paths::{ensure_dir, get_storage_dir};

/// Audio input selection. The wire values mirror the preference-screen
/// entries of the original app ("0" through "3").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AudioSource {
    #[default]
    #[serde(rename = "0")]
    None,
    #[serde(rename = "1")]
    Microphone,
    #[serde(rename = "2")]
    InternalDefault,
    #[serde(rename = "3")]
    InternalSubmix,
}

/// How the captured width/height pairing relates to device rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrientationPolicy {
    #[default]
    Auto,
    Portrait,
    Landscape,
}

/// User preferences backing a recording session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecorderSettings {
    /// "WIDTHxHEIGHT"; when unset the resolution is derived from display
    /// metrics at start time.
    pub resolution: Option<String>,
    pub fps: u32,
    pub bitrate: u32,
    pub audio_source: AudioSource,
    /// Recording output directory; when unset a platform default is used.
    pub save_location: Option<PathBuf>,
    /// strftime pattern for the timestamp part of the output filename.
    pub filename_template: String,
    pub filename_prefix: String,
    pub floating_controls: bool,
    pub camera_overlay: bool,
    pub show_touches: bool,
    pub shake_gesture: bool,
    pub orientation: OrientationPolicy,
    /// Optional package/app identifier to launch right before recording.
    pub launch_app: Option<String>,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            resolution: None,
            fps: 30,
            bitrate: 7_130_317,
            audio_source: AudioSource::None,
            save_location: None,
            filename_template: "%Y%m%d_%H%M%S".to_string(),
            filename_prefix: "recording".to_string(),
            floating_controls: false,
            camera_overlay: false,
            show_touches: false,
            shake_gesture: false,
            orientation: OrientationPolicy::Auto,
            launch_app: None,
        }
    }
}

/// Notice that the user picked a new save directory.
#[derive(Debug, Clone)]
pub struct DirectoryChangeNotice {
    pub previous: Option<PathBuf>,
    pub new_location: PathBuf,
}

impl RecorderSettings {
    pub fn apply_directory_change(&mut self, notice: DirectoryChangeNotice) {
        tracing::info!(
            target: "recorder",
            "save location changed: {:?} -> {}",
            notice.previous,
            notice.new_location.display()
        );
        self.save_location = Some(notice.new_location);
    }
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse settings: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Source of persisted preferences, read once per session start.
pub trait SettingsStore: Send {
    fn load(&self) -> Result<RecorderSettings, SettingsError>;
}

/// JSON-file backed settings store. A missing file yields defaults.
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn default_path() -> PathBuf {
        get_storage_dir().join("settings.json")
    }

    pub fn save(&self, settings: &RecorderSettings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            ensure_dir(&parent.to_path_buf())?;
        }
        let contents = serde_json::to_string_pretty(settings)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }

    fn load_from_file(path: &Path) -> Result<RecorderSettings, SettingsError> {
        let contents = std::fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }
}

impl SettingsStore for JsonSettingsStore {
    fn load(&self) -> Result<RecorderSettings, SettingsError> {
        if !self.path.exists() {
            return Ok(RecorderSettings::default());
        }
        Self::load_from_file(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let s = RecorderSettings::default();
        assert_eq!(s.fps, 30);
        assert_eq!(s.bitrate, 7_130_317);
        assert_eq!(s.audio_source, AudioSource::None);
        assert_eq!(s.filename_template, "%Y%m%d_%H%M%S");
        assert_eq!(s.filename_prefix, "recording");
        assert_eq!(s.orientation, OrientationPolicy::Auto);
        assert!(!s.shake_gesture);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSettingsStore::new(dir.path().join("settings.json"));
        let s = store.load().unwrap();
        assert_eq!(s.fps, 30);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSettingsStore::new(dir.path().join("settings.json"));

        let mut s = RecorderSettings::default();
        s.fps = 60;
        s.audio_source = AudioSource::Microphone;
        s.shake_gesture = true;
        store.save(&s).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.fps, 60);
        assert_eq!(loaded.audio_source, AudioSource::Microphone);
        assert!(loaded.shake_gesture);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"fps": 24}"#).unwrap();

        let store = JsonSettingsStore::new(path);
        let s = store.load().unwrap();
        assert_eq!(s.fps, 24);
        assert_eq!(s.bitrate, 7_130_317);
    }

    #[test]
    fn test_audio_source_wire_values() {
        let json = serde_json::to_string(&AudioSource::InternalSubmix).unwrap();
        assert_eq!(json, "\"3\"");
        let parsed: AudioSource = serde_json::from_str("\"1\"").unwrap();
        assert_eq!(parsed, AudioSource::Microphone);
    }

    #[test]
    fn test_apply_directory_change() {
        let mut s = RecorderSettings::default();
        s.apply_directory_change(DirectoryChangeNotice {
            previous: None,
            new_location: PathBuf::from("/tmp/videos"),
        });
        assert_eq!(s.save_location, Some(PathBuf::from("/tmp/videos")));
    }
}
