//! Application command handlers for wavestack.
//!
//! # Commands
//! - `render`: Render a WAV or raw sample file to a stacked waveform PNG
//! - `live`: Scrolling waveform of an audio input device in the terminal
//! - `list_devices`: List available audio input devices
//! - `logs`: Display recent log entries
//! - `config`: Open configuration file in user's preferred editor

pub mod config;
pub mod list_devices;
pub mod live;
pub mod logs;
pub mod render;

pub use config::handle_config;
pub use list_devices::handle_list_devices;
pub use live::handle_live;
pub use logs::handle_logs;
pub use render::{handle_render, RenderOptions};
