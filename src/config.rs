//! Configuration persistence for zonecensus settings

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::FitMode;

/// Serializable color representation for config storage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl ShapeColor {
    /// Build from 8-bit channels (`#0ea5e9` is `from_rgb8(14, 165, 233)`)
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    /// Convert to image crate RGBA format (0-255)
    pub fn to_rgba_u8(self) -> [u8; 4] {
        [
            (self.r * 255.0).round() as u8,
            (self.g * 255.0).round() as u8,
            (self.b * 255.0).round() as u8,
            255,
        ]
    }
}

fn default_zone_color() -> ShapeColor {
    ShapeColor::from_rgb8(14, 165, 233) // Sky
}

fn default_marker_color() -> ShapeColor {
    ShapeColor::from_rgb8(250, 204, 21) // Amber
}

fn default_sketch_color() -> ShapeColor {
    ShapeColor::from_rgb8(244, 63, 94) // Rose
}

fn default_engine_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    // Uploads carry the whole video
    300
}

fn default_sketch_thickness() -> f32 {
    crate::render::geometry::sketch::THICKNESS
}

/// Application configuration persisted between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the detection engine
    #[serde(default = "default_engine_url")]
    pub engine_url: String,
    /// Interval between live count polls
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Timeout for any single engine request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// How the frame is fitted into the operator's display box
    #[serde(default)]
    pub fit_mode: FitMode,
    /// Where exports are written (None = Documents folder)
    #[serde(default)]
    pub export_dir: Option<PathBuf>,
    /// Outline color of committed zones
    #[serde(default = "default_zone_color")]
    pub zone_color: ShapeColor,
    /// Fill color of the crossing direction marker
    #[serde(default = "default_marker_color")]
    pub marker_color: ShapeColor,
    /// Color of the shape still being drawn
    #[serde(default = "default_sketch_color")]
    pub sketch_color: ShapeColor,
    /// Stroke width of the shape still being drawn
    #[serde(default = "default_sketch_thickness")]
    pub sketch_thickness: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine_url: default_engine_url(),
            poll_interval_ms: default_poll_interval_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            fit_mode: FitMode::Fill,
            export_dir: None,
            zone_color: default_zone_color(),
            marker_color: default_marker_color(),
            sketch_color: default_sketch_color(),
            sketch_thickness: default_sketch_thickness(),
        }
    }
}

impl AppConfig {
    /// Directory name under the user's config dir
    pub const ID: &'static str = "zonecensus";

    /// Default location of the config file
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(Self::ID).join("config.json"))
    }

    /// Load configuration from disk, or return defaults if unavailable
    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            log::warn!("No config directory available, using defaults");
            return Self::default();
        };

        if !path.exists() {
            let config = Self::default();
            if let Err(err) = config.save_to(&path) {
                log::warn!("Could not write default config: {:?}", err);
            }
            return config;
        }

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Error loading config, using defaults: {:?}", err);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        log::info!("Wrote config to {}", path.display());
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Directory exports are written to
    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .or_else(dirs::document_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
