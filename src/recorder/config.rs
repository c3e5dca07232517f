//! Per-session configuration resolution.
//!
//! A [`SessionConfig`] is an immutable snapshot taken when a start command is
//! accepted: preferences plus display metrics, resolved once. Mid-session
//! preference edits never affect a running session.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};
use std::path::PathBuf;

use crate::errors::ConfigError;
use crate::platform::DisplayInfo;
use crate::settings::{AudioSource, OrientationPolicy, RecorderSettings};
use crate::shared::paths::default_save_dir;

/// Resolved, immutable configuration for one recording session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub width: u32,
    pub height: u32,
    pub density_dpi: u32,
    pub frame_rate: u32,
    pub bitrate: u32,
    pub audio_source: AudioSource,
    pub output_path: PathBuf,
    pub orientation: OrientationPolicy,
    pub use_floating_controls: bool,
    pub show_camera_overlay: bool,
    pub show_touches: bool,
    pub shake_gesture: bool,
}

impl SessionConfig {
    /// Resolve settings and display metrics into a session config.
    ///
    /// Fails on a malformed resolution string, an invalid filename template,
    /// or a save directory that cannot be created. All failures happen before
    /// any capture handle is acquired.
    pub fn resolve(
        settings: &RecorderSettings,
        display: &DisplayInfo,
        now: DateTime<Local>,
    ) -> Result<Self, ConfigError> {
        let (base_width, base_height) = match &settings.resolution {
            Some(spec) => parse_resolution(spec)?,
            None => {
                // Derive from display metrics: natural width paired with the
                // display's long/short aspect ratio.
                let width = display.width_px;
                let height = (width as f32 * display.aspect_ratio()) as u32;
                (width, height)
            }
        };

        let swap = match settings.orientation {
            OrientationPolicy::Auto => display.rotation.is_sideways(),
            OrientationPolicy::Portrait => false,
            OrientationPolicy::Landscape => true,
        };
        let (width, height) = if swap {
            (base_height, base_width)
        } else {
            (base_width, base_height)
        };

        let save_dir = settings
            .save_location
            .clone()
            .unwrap_or_else(default_save_dir);
        std::fs::create_dir_all(&save_dir).map_err(|source| {
            ConfigError::SaveLocationUnavailable {
                path: save_dir.clone(),
                source,
            }
        })?;

        let file_name =
            resolve_file_name(&settings.filename_prefix, &settings.filename_template, now)?;

        Ok(Self {
            width,
            height,
            density_dpi: display.density_dpi,
            frame_rate: settings.fps,
            bitrate: settings.bitrate,
            audio_source: settings.audio_source,
            output_path: save_dir.join(file_name),
            orientation: settings.orientation,
            use_floating_controls: settings.floating_controls,
            show_camera_overlay: settings.camera_overlay,
            show_touches: settings.show_touches,
            shake_gesture: settings.shake_gesture,
        })
    }
}

fn parse_resolution(spec: &str) -> Result<(u32, u32), ConfigError> {
    let invalid = || ConfigError::InvalidResolution(spec.to_string());
    let (w, h) = spec.split_once('x').ok_or_else(invalid)?;
    let width: u32 = w.trim().parse().map_err(|_| invalid())?;
    let height: u32 = h.trim().parse().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(invalid());
    }
    Ok((width, height))
}

/// Build `<prefix>_<timestamp>.mp4` from a strftime template, validating the
/// template before formatting.
fn resolve_file_name(
    prefix: &str,
    template: &str,
    now: DateTime<Local>,
) -> Result<String, ConfigError> {
    let items: Vec<Item<'_>> = StrftimeItems::new(template).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(ConfigError::InvalidTimestampPattern(template.to_string()));
    }
    Ok(format!(
        "{}_{}.mp4",
        prefix,
        now.format_with_items(items.iter())
    ))
}
