use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::intake::{MAX_IMAGE_BYTES, MAX_VIDEO_BYTES};
use crate::source::{CaptureConstraints, FacingPreference};

const DEFAULT_TICK_MS: u64 = 33;

#[derive(Debug, Deserialize, Default)]
struct StudioConfigFile {
    max_image_bytes: Option<u64>,
    max_video_bytes: Option<u64>,
    video_enabled: Option<bool>,
    tick_ms: Option<u64>,
    capture: Option<CaptureConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct CaptureConfigFile {
    ideal_width: Option<u32>,
    ideal_height: Option<u32>,
    facing: Option<FacingPreference>,
}

#[derive(Debug, Clone)]
pub struct StudioConfig {
    pub max_image_bytes: u64,
    pub max_video_bytes: u64,
    pub video_enabled: bool,
    /// Target period between loop reschedules.
    pub tick_interval: Duration,
    pub capture: CaptureConstraints,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: MAX_IMAGE_BYTES,
            max_video_bytes: MAX_VIDEO_BYTES,
            video_enabled: true,
            tick_interval: Duration::from_millis(DEFAULT_TICK_MS),
            capture: CaptureConstraints::default(),
        }
    }
}

impl StudioConfig {
    /// Read the optional JSON config file named by `SIGHTLOOP_CONFIG`, then
    /// apply `SIGHTLOOP_*` environment overrides, then validate.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("SIGHTLOOP_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: StudioConfigFile) -> Self {
        let defaults = Self::default();
        let capture = CaptureConstraints {
            ideal_width: file
                .capture
                .as_ref()
                .and_then(|capture| capture.ideal_width)
                .unwrap_or(defaults.capture.ideal_width),
            ideal_height: file
                .capture
                .as_ref()
                .and_then(|capture| capture.ideal_height)
                .unwrap_or(defaults.capture.ideal_height),
            facing: file
                .capture
                .and_then(|capture| capture.facing)
                .unwrap_or(defaults.capture.facing),
        };
        Self {
            max_image_bytes: file.max_image_bytes.unwrap_or(defaults.max_image_bytes),
            max_video_bytes: file.max_video_bytes.unwrap_or(defaults.max_video_bytes),
            video_enabled: file.video_enabled.unwrap_or(defaults.video_enabled),
            tick_interval: Duration::from_millis(file.tick_ms.unwrap_or(DEFAULT_TICK_MS)),
            capture,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(raw) = std::env::var("SIGHTLOOP_MAX_IMAGE_BYTES") {
            self.max_image_bytes = raw
                .parse()
                .map_err(|_| anyhow!("SIGHTLOOP_MAX_IMAGE_BYTES must be an integer byte count"))?;
        }
        if let Ok(raw) = std::env::var("SIGHTLOOP_MAX_VIDEO_BYTES") {
            self.max_video_bytes = raw
                .parse()
                .map_err(|_| anyhow!("SIGHTLOOP_MAX_VIDEO_BYTES must be an integer byte count"))?;
        }
        if let Ok(raw) = std::env::var("SIGHTLOOP_VIDEO_ENABLED") {
            self.video_enabled = match raw.trim() {
                "1" | "true" => true,
                "0" | "false" => false,
                _ => return Err(anyhow!("SIGHTLOOP_VIDEO_ENABLED must be true or false")),
            };
        }
        if let Ok(raw) = std::env::var("SIGHTLOOP_TICK_MS") {
            let ms: u64 = raw
                .parse()
                .map_err(|_| anyhow!("SIGHTLOOP_TICK_MS must be an integer number of ms"))?;
            self.tick_interval = Duration::from_millis(ms);
        }
        if let Ok(raw) = std::env::var("SIGHTLOOP_CAMERA_FACING") {
            self.capture.facing = match raw.trim() {
                "user" => FacingPreference::User,
                "environment" => FacingPreference::Environment,
                _ => return Err(anyhow!("SIGHTLOOP_CAMERA_FACING must be user or environment")),
            };
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.max_image_bytes == 0 || self.max_video_bytes == 0 {
            return Err(anyhow!("size ceilings must be greater than zero"));
        }
        if self.tick_interval.is_zero() {
            return Err(anyhow!("tick interval must be greater than zero"));
        }
        if self.capture.ideal_width == 0 || self.capture.ideal_height == 0 {
            return Err(anyhow!("capture dimensions must be greater than zero"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<StudioConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
