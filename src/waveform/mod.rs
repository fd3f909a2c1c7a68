//! Waveform rendering engine.
//!
//! Aggregators reduce a stream of samples to one min/max [`ExtremumPair`] per
//! pixel column; the same per-pixel rule draws them on request as a
//! [`Raster`]. Two aggregators are provided:
//!
//! - [`BoundedSurface`]: a scrolling window of the most recent columns, safe
//!   to feed from an audio thread while another thread draws it
//! - [`UnboundedAggregator`]: the whole history, folded at a fixed ratio,
//!   for rendering a capture after the fact
//!
//! [`StreamDemuxer`] splits interleaved multi-channel input across one
//! aggregator per channel and [`Composite`] stacks the resulting rasters.

pub mod bounded;
pub mod demux;
pub mod pair;
pub mod raster;
pub mod stack;
pub mod unbounded;

pub use bounded::{BoundedSurface, SurfaceGuard};
pub use demux::{decode_samples, Channel, RasterFactory, RasterSource, StreamDemuxer};
pub use pair::ExtremumPair;
pub use raster::{
    is_foreground, ColorModel, Palette, Raster, DEFAULT_BACKGROUND, DEFAULT_FOREGROUND,
    TRANSPARENT,
};
pub use stack::Composite;
pub use unbounded::{UnboundedAggregator, UnboundedView};
