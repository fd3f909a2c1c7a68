//! Streaming audio waveform rendering.
//!
//! See [`waveform`] for the engine. The `wavestack` binary wraps it with WAV
//! and raw-sample input, PNG output and a live scrolling terminal view.

pub mod waveform;

pub use waveform::{
    BoundedSurface, Channel, Composite, ExtremumPair, Palette, Raster, StreamDemuxer,
    UnboundedAggregator,
};
