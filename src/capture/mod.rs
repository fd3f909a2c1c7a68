//! Live capture feature for wavestack.
//!
//! Captures from an audio input device into scrolling waveform surfaces and
//! shows them in the terminal while recording.

pub mod audio;
pub mod device;
pub mod ui;

pub use audio::LiveCapture;
pub use ui::{LiveCommand, WaveformTui};
