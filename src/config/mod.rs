//! Configuration management for wavestack.
//!
//! This module handles loading and saving configuration from a TOML file stored
//! in the user's config directory.

pub mod file;

pub use file::{get_config_path, LiveConfig, RenderConfig, WavestackConfig};
