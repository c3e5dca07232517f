//! Platform-facing value types.
//!
//! These replace the listener-interface plumbing the host platform uses for
//! permission results and display queries with plain data handed to the
//! controller at start time.

use std::fmt;

/// Opaque capture-permission grant token.
///
/// Produced by the platform's permission flow; the controller never inspects
/// it, only forwards it to the recording backend when opening the capture
/// handle.
#[derive(Debug, Clone)]
pub struct CaptureGrant {
    raw: Vec<u8>,
}

impl CaptureGrant {
    pub fn new(raw: Vec<u8>) -> Self {
        Self { raw }
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }
}

/// What a permission request was about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionScope {
    DisplayCapture,
    AudioCapture,
}

impl fmt::Display for PermissionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionScope::DisplayCapture => write!(f, "display capture"),
            PermissionScope::AudioCapture => write!(f, "audio capture"),
        }
    }
}

/// Result of the capture-permission flow.
#[derive(Debug, Clone)]
pub enum PermissionOutcome {
    Granted(CaptureGrant),
    Denied { scope: PermissionScope },
}

/// Physical display rotation at session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// True for the rotations where the display's width/height pairing is
    /// swapped relative to its natural orientation.
    pub fn is_sideways(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

/// Display metrics sampled when a start command is issued.
#[derive(Debug, Clone)]
pub struct DisplayInfo {
    pub width_px: u32,
    pub height_px: u32,
    pub density_dpi: u32,
    pub rotation: Rotation,
}

impl DisplayInfo {
    /// Long-edge / short-edge ratio of the physical display.
    pub fn aspect_ratio(&self) -> f32 {
        let w = self.width_px as f32;
        let h = self.height_px as f32;
        if w > h {
            w / h
        } else {
            h / w
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sideways_rotations() {
        assert!(!Rotation::Deg0.is_sideways());
        assert!(Rotation::Deg90.is_sideways());
        assert!(!Rotation::Deg180.is_sideways());
        assert!(Rotation::Deg270.is_sideways());
    }

    #[test]
    fn test_aspect_ratio_is_orientation_independent() {
        let portrait = DisplayInfo {
            width_px: 1000,
            height_px: 2000,
            density_dpi: 420,
            rotation: Rotation::Deg0,
        };
        let landscape = DisplayInfo {
            width_px: 2000,
            height_px: 1000,
            density_dpi: 420,
            rotation: Rotation::Deg90,
        };
        assert_eq!(portrait.aspect_ratio(), 2.0);
        assert_eq!(landscape.aspect_ratio(), 2.0);
    }
}
