//! Application Configuration
//!
//! Capture, layout, cool-down and transport settings stored in TOML format.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::capture::{CaptureConfig, Rotation};
use crate::pipeline::PipelineSettings;
use crate::vision::{Rect, Size};

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Camera settings
    #[serde(default)]
    pub capture: CaptureSettings,
    /// Preview viewport settings
    #[serde(default)]
    pub preview: PreviewSettings,
    /// Target region settings
    #[serde(default)]
    pub region: RegionSettings,
    /// Pause-after-match settings
    #[serde(default)]
    pub debounce: DebounceSettings,
    /// Peer notification settings
    #[serde(default)]
    pub transport: TransportSettings,
}

/// Camera-related settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Frames per second delivered by the camera
    pub fps: u32,
    /// Sensor image width in pixels
    pub frame_width: u32,
    /// Sensor image height in pixels
    pub frame_height: u32,
    /// Rotation reported with each frame (0, 90, 180 or 270)
    pub rotation_degrees: u32,
    /// Number of pooled frame buffers
    pub buffer_pool_size: usize,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            fps: 30,
            frame_width: 1080,
            frame_height: 1920,
            rotation_degrees: 0,
            buffer_pool_size: 4,
        }
    }
}

/// Preview viewport, in display units
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewSettings {
    pub width: f32,
    pub height: f32,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            width: 1080.0,
            height: 2220.0,
        }
    }
}

/// Fixed target region, in display units relative to the preview's top-left
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionSettings {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    /// Margin trimmed from the top of the region before mapping
    pub inset: f32,
    /// Swap sensor axes for quarter-turn rotations when mapping
    pub apply_rotation: bool,
}

impl Default for RegionSettings {
    fn default() -> Self {
        Self {
            left: 100.0,
            top: 500.0,
            width: 400.0,
            height: 150.0,
            inset: 50.0,
            apply_rotation: false,
        }
    }
}

/// Pause-after-match settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceSettings {
    /// Cool-down after a match in milliseconds
    pub cooldown_ms: u64,
}

impl Default for DebounceSettings {
    fn default() -> Self {
        Self { cooldown_ms: 5000 }
    }
}

/// Peer notification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportSettings {
    /// Largest notification payload in bytes
    pub max_payload_bytes: usize,
    /// Whether the app holds the permission to notify the peer
    pub permission_granted: bool,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            max_payload_bytes: 512,
            permission_granted: true,
        }
    }
}

impl AppConfig {
    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.capture.fps == 0 {
            bail!("capture.fps must be at least 1");
        }
        if self.capture.buffer_pool_size == 0 {
            bail!("capture.buffer_pool_size must be at least 1");
        }
        Rotation::from_degrees(self.capture.rotation_degrees)?;
        if !(self.preview.width > 0.0 && self.preview.height > 0.0) {
            bail!(
                "preview size must be positive, got {}x{}",
                self.preview.width,
                self.preview.height
            );
        }
        if self.debounce.cooldown_ms == 0 {
            bail!("debounce.cooldown_ms must be at least 1");
        }
        if self.transport.max_payload_bytes == 0 {
            bail!("transport.max_payload_bytes must be at least 1");
        }
        Ok(())
    }

    /// Camera configuration derived from these settings
    pub fn capture_config(&self) -> Result<CaptureConfig> {
        Ok(CaptureConfig {
            fps: self.capture.fps,
            frame_width: self.capture.frame_width,
            frame_height: self.capture.frame_height,
            rotation: Rotation::from_degrees(self.capture.rotation_degrees)?,
            buffer_pool_size: self.capture.buffer_pool_size,
        })
    }

    /// Pipeline tunables derived from these settings
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            inset: self.region.inset,
            apply_rotation: self.region.apply_rotation,
            cooldown: Duration::from_millis(self.debounce.cooldown_ms),
            max_payload_bytes: self.transport.max_payload_bytes,
        }
    }

    /// Target region in display units
    pub fn target_region(&self) -> Rect {
        Rect::from_xywh(
            self.region.left,
            self.region.top,
            self.region.width,
            self.region.height,
        )
    }

    pub fn preview_size(&self) -> Size {
        Size::new(self.preview.width, self.preview.height)
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
