//! Configuration file management for wavestack.
//!
//! This module handles loading and saving configuration from a TOML file in the
//! user's config directory. The file is optional: every field has a default.

use anyhow::{anyhow, Context};
use image::Rgba;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use wavestack::Palette;

/// Settings for rendering a whole capture to an image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderConfig {
    /// Height in pixels of each channel's band
    #[serde(default = "default_render_height")]
    pub height: u32,
    /// Number of samples folded into each image column
    #[serde(default = "default_samples_per_pair")]
    pub samples_per_pair: usize,
    /// Waveform color, "#rrggbb" or "#rrggbbaa"
    #[serde(default = "default_foreground")]
    pub foreground: String,
    /// Background color, "#rrggbb" or "#rrggbbaa"
    #[serde(default = "default_background")]
    pub background: String,
}

/// Settings for the live scrolling view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LiveConfig {
    /// Audio device to use. Options:
    /// - "default" for system default device
    /// - numeric index (0, 1, 2, etc.) from `wavestack list-devices`
    /// - device name from `wavestack list-devices`
    #[serde(default = "default_device")]
    pub device: String,
    /// Number of samples per channel folded into each on-screen column
    #[serde(default = "default_samples_per_column")]
    pub samples_per_column: usize,
    /// Redraw interval in milliseconds
    #[serde(default = "default_refresh_ms")]
    pub refresh_ms: u64,
    /// Waveform color, "#rrggbb" or "#rrggbbaa"
    #[serde(default = "default_live_foreground")]
    pub foreground: String,
    /// Background color, "#rrggbb" or "#rrggbbaa"
    #[serde(default = "default_live_background")]
    pub background: String,
}

fn default_render_height() -> u32 {
    128
}

fn default_samples_per_pair() -> usize {
    256
}

fn default_foreground() -> String {
    "#000000".to_string()
}

fn default_background() -> String {
    "#ffffff".to_string()
}

fn default_device() -> String {
    "default".to_string()
}

fn default_samples_per_column() -> usize {
    512
}

fn default_refresh_ms() -> u64 {
    33
}

fn default_live_foreground() -> String {
    "#cee0dc".to_string()
}

fn default_live_background() -> String {
    "#000000".to_string()
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            height: default_render_height(),
            samples_per_pair: default_samples_per_pair(),
            foreground: default_foreground(),
            background: default_background(),
        }
    }
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            samples_per_column: default_samples_per_column(),
            refresh_ms: default_refresh_ms(),
            foreground: default_live_foreground(),
            background: default_live_background(),
        }
    }
}

impl RenderConfig {
    /// # Errors
    /// - If either color is not a valid hex color
    pub fn palette(&self) -> anyhow::Result<Palette> {
        palette_from(&self.foreground, &self.background)
    }
}

impl LiveConfig {
    /// # Errors
    /// - If either color is not a valid hex color
    pub fn palette(&self) -> anyhow::Result<Palette> {
        palette_from(&self.foreground, &self.background)
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WavestackConfig {
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub live: LiveConfig,
}

impl WavestackConfig {
    /// Loads configuration from the user's config directory.
    ///
    /// A missing file is not an error; defaults are used instead.
    ///
    /// # Errors
    /// - If the config directory cannot be determined
    /// - If the config file exists but cannot be read
    /// - If the TOML is malformed
    pub fn load() -> anyhow::Result<Self> {
        let config_path = get_config_path()?;
        if !config_path.exists() {
            tracing::debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        Self::from_toml(&config_content)
            .with_context(|| format!("Invalid config file {}", config_path.display()))
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    /// - If the TOML is malformed
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Saves configuration to the user's config directory.
    ///
    /// # Errors
    /// - If the config directory cannot be determined or created
    /// - If the file cannot be written
    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = get_config_path()?;
        let config_content = toml::to_string_pretty(self)?;
        fs::write(&config_path, config_content)?;
        tracing::info!("Configuration saved to {}", config_path.display());
        Ok(())
    }
}

/// Retrieves the path to the config file, creating its directory if needed.
///
/// # Errors
/// - If the home directory cannot be determined
/// - If the config directory cannot be created
pub fn get_config_path() -> anyhow::Result<PathBuf> {
    let config_dir = dirs::home_dir()
        .ok_or_else(|| anyhow!("Could not determine home directory"))?
        .join(".config")
        .join("wavestack");

    fs::create_dir_all(&config_dir)
        .map_err(|e| anyhow!("Failed to create config directory: {e}"))?;

    Ok(config_dir.join("wavestack.toml"))
}

fn palette_from(foreground: &str, background: &str) -> anyhow::Result<Palette> {
    Ok(Palette::new(parse_color(foreground)?, parse_color(background)?))
}

/// Parses "#rrggbb" or "#rrggbbaa" (the '#' is optional). Alpha defaults to opaque.
///
/// # Errors
/// - If the string is not 6 or 8 hex digits
pub fn parse_color(value: &str) -> anyhow::Result<Rgba<u8>> {
    let hex = value.trim().trim_start_matches('#');
    if !matches!(hex.len(), 6 | 8) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(anyhow!(
            "Invalid color '{value}': expected #rrggbb or #rrggbbaa"
        ));
    }

    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
    let alpha = if hex.len() == 8 { channel(6)? } else { 255 };
    Ok(Rgba([channel(0)?, channel(2)?, channel(4)?, alpha]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#000000").unwrap(), Rgba([0, 0, 0, 255]));
        assert_eq!(parse_color("ff8000").unwrap(), Rgba([255, 128, 0, 255]));
        assert_eq!(parse_color(" #CEE0DC80 ").unwrap(), Rgba([206, 224, 220, 128]));
    }

    #[test]
    fn test_invalid_color() {
        assert!(parse_color("#fff").is_err());
        assert!(parse_color("#gg0000").is_err());
        assert!(parse_color("").is_err());
        assert!(parse_color("#ff00ff0").is_err());
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let config = WavestackConfig::from_toml("[render]\nheight = 64\n").unwrap();
        assert_eq!(config.render.height, 64);
        assert_eq!(config.render.samples_per_pair, default_samples_per_pair());
        assert_eq!(config.live, LiveConfig::default());

        let empty = WavestackConfig::from_toml("").unwrap();
        assert_eq!(empty, WavestackConfig::default());
    }

    #[test]
    fn test_default_palettes_parse() {
        let config = WavestackConfig::default();
        assert_eq!(config.render.palette().unwrap(), Palette::default());
        assert!(config.live.palette().is_ok());
    }

    #[test]
    fn test_round_trip_through_toml() {
        let mut config = WavestackConfig::default();
        config.live.device = "2".to_string();
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(WavestackConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_malformed_toml() {
        assert!(WavestackConfig::from_toml("[render\nheight = ").is_err());
        assert!(WavestackConfig::from_toml("[render]\nheight = \"tall\"").is_err());
    }
}
