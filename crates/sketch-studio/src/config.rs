use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Studio session settings, read from TOML.
///
/// Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    /// Drawable width in physical pixels.
    pub width: f32,
    /// Drawable height in physical pixels.
    pub height: f32,
    pub scale: f32,
    pub zoom: f32,
    /// Content offset in logical pixels.
    pub offset: [f32; 2],
    pub native_scale: f32,
    /// Clear color, linear RGBA.
    pub background: [f32; 4],
    /// `env_logger` filter; falls back to `RUST_LOG`.
    pub log_filter: Option<String>,
    pub fallback_adapter: bool,
    pub dots: Vec<DotSpec>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DotSpec {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    #[serde(default = "opaque_black")]
    pub color: [f32; 4],
}

fn opaque_black() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            width: 512.0,
            height: 512.0,
            scale: 1.0,
            zoom: 1.0,
            offset: [0.0, 0.0],
            native_scale: 1.0,
            background: [1.0, 1.0, 1.0, 1.0],
            log_filter: None,
            fallback_adapter: false,
            dots: vec![
                DotSpec { x: 128.0, y: 128.0, radius: 24.0, color: [0.9, 0.2, 0.2, 1.0] },
                DotSpec { x: 256.0, y: 256.0, radius: 48.0, color: [0.2, 0.4, 0.9, 0.8] },
                DotSpec { x: 384.0, y: 160.0, radius: 12.0, color: opaque_black() },
            ],
        }
    }
}

impl StudioConfig {
    pub fn parse(src: &str) -> Result<Self> {
        toml::from_str(src).context("invalid studio config")
    }

    /// Reads `path`, or returns defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let src = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&src)
    }
}
