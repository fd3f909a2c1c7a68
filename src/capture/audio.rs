//! Live audio capture into scrolling waveform surfaces.
//!
//! The cpal callback runs on the audio thread: it converts the device's
//! samples to `f32` and pushes them through a [`StreamDemuxer`] whose channels
//! fold `samples_per_column` samples into each column of a shared
//! [`BoundedSurface`]. The UI thread reads the same surfaces under their
//! guards.

use anyhow::{anyhow, bail, Result};
use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use wavestack::waveform::RasterSource;
use wavestack::{BoundedSurface, Channel, ExtremumPair, Palette, StreamDemuxer};

use super::device::open_input_device;

/// Demuxer channel that folds raw samples into columns of a shared surface.
pub struct ScrollingChannel {
    surface: Arc<BoundedSurface>,
    samples_per_column: usize,
    pending: Option<ExtremumPair>,
    folded: usize,
}

impl ScrollingChannel {
    /// # Errors
    /// - If `samples_per_column` is zero
    pub fn new(surface: Arc<BoundedSurface>, samples_per_column: usize) -> Result<Self> {
        if samples_per_column == 0 {
            bail!("samples_per_column must be at least 1");
        }

        Ok(Self {
            surface,
            samples_per_column,
            pending: None,
            folded: 0,
        })
    }
}

impl Channel for ScrollingChannel {
    fn ingest(&mut self, pair: ExtremumPair) {
        match self.pending.as_mut() {
            Some(column) => column.widen(pair),
            None => self.pending = Some(pair),
        }
        self.folded += 1;

        if self.folded >= self.samples_per_column {
            if let Some(column) = self.pending.take() {
                self.surface.ingest(column);
            }
            self.folded = 0;
        }
    }

    fn raster_source(&self) -> Option<RasterSource<'_>> {
        Some(RasterSource::Direct(self.surface.as_ref()))
    }
}

/// Captures from an input device into one scrolling surface per channel.
pub struct LiveCapture {
    surfaces: Vec<Arc<BoundedSurface>>,
    /// Active input stream (kept alive during capture)
    _stream: cpal::Stream,
    is_paused: Arc<AtomicBool>,
    sample_rate: u32,
    device_name: String,
}

impl LiveCapture {
    /// Opens the device and starts streaming into freshly created surfaces.
    ///
    /// The surfaces are `width` columns wide and share `pixel_height` rows
    /// between the device's channels.
    ///
    /// # Errors
    /// - If `samples_per_column` is zero
    /// - If the device is not available or cannot be configured
    /// - If the device's sample format is not supported
    /// - If the stream cannot be built or started
    pub fn start(
        device_spec: &str,
        width: u32,
        pixel_height: u32,
        samples_per_column: usize,
        palette: Palette,
    ) -> Result<Self> {
        if samples_per_column == 0 {
            bail!("samples_per_column must be at least 1");
        }

        let device = open_input_device(device_spec)?;
        let device_name = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());
        tracing::info!("Capture device: {}", device_name);

        let device_config = device.default_input_config()?;
        let sample_rate = device_config.sample_rate().0;
        let channel_count = usize::from(device_config.channels());
        let sample_format = device_config.sample_format();
        tracing::debug!(
            "Device configuration: {}Hz, {} channels, {}",
            sample_rate,
            channel_count,
            sample_format
        );

        let channel_height = band_height(pixel_height, channel_count);
        let surfaces = (0..channel_count)
            .map(|_| {
                BoundedSurface::with_palette(width.max(1), channel_height, palette).map(Arc::new)
            })
            .collect::<Result<Vec<_>>>()?;

        let channels = surfaces
            .iter()
            .map(|surface| {
                ScrollingChannel::new(Arc::clone(surface), samples_per_column)
                    .map(|channel| Box::new(channel) as Box<dyn Channel>)
            })
            .collect::<Result<Vec<_>>>()?;
        let demuxer = StreamDemuxer::with_channels(channels)?;

        let is_paused = Arc::new(AtomicBool::new(false));
        let stream_config: cpal::StreamConfig = device_config.into();
        let pause = Arc::clone(&is_paused);
        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, demuxer, pause),
            SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, demuxer, pause),
            SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, demuxer, pause),
            SampleFormat::I32 => build_stream::<i32>(&device, &stream_config, demuxer, pause),
            other => Err(anyhow!("Unsupported sample format: {other}")),
        }?;

        stream.play()?;
        tracing::debug!("Audio stream started");

        Ok(Self {
            surfaces,
            _stream: stream,
            is_paused,
            sample_rate,
            device_name,
        })
    }

    /// One surface per device channel, in channel order.
    pub fn surfaces(&self) -> &[Arc<BoundedSurface>] {
        &self.surfaces
    }

    /// Fits the surfaces to a new canvas size.
    ///
    /// # Errors
    /// - If a surface rejects the new size
    pub fn resize(&self, width: u32, pixel_height: u32) -> Result<()> {
        let channel_height = band_height(pixel_height, self.surfaces.len());
        for surface in &self.surfaces {
            surface.resize(width.max(1), channel_height)?;
        }
        Ok(())
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused.load(Ordering::Relaxed)
    }

    /// Toggles between paused and capturing states.
    pub fn toggle_pause(&self) {
        let paused = !self.is_paused.fetch_xor(true, Ordering::Relaxed);
        if paused {
            tracing::debug!("Capture paused");
        } else {
            tracing::debug!("Capture resumed");
        }
    }
}

/// Rows available to each channel's band, at least one.
fn band_height(pixel_height: u32, channel_count: usize) -> u32 {
    let channels = u32::try_from(channel_count.max(1)).unwrap_or(u32::MAX);
    (pixel_height / channels).max(1)
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut demuxer: StreamDemuxer,
    is_paused: Arc<AtomicBool>,
) -> Result<cpal::Stream>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let mut buffer: Vec<f32> = Vec::new();
    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            if is_paused.load(Ordering::Relaxed) {
                return;
            }
            buffer.clear();
            buffer.extend(data.iter().map(|&s| <f32 as Sample>::from_sample(s)));
            demuxer.write(&buffer);
        },
        |err| {
            tracing::error!("Audio stream error: {}", err);
        },
        None,
    )?;
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrolling_channel_folds_columns() {
        let surface = Arc::new(BoundedSurface::new(4, 8).unwrap());
        let mut channel = ScrollingChannel::new(Arc::clone(&surface), 3).unwrap();

        for value in [0.1, -0.5, 0.2, 0.7, 0.0] {
            channel.ingest(ExtremumPair::sample(value));
        }

        let guard = surface.lock();
        assert_eq!(guard.len(), 1);
        assert_eq!(guard.column(0), Some(ExtremumPair::new(0.2, -0.5)));
    }

    #[test]
    fn test_scrolling_channel_through_demuxer() {
        let left = Arc::new(BoundedSurface::new(4, 8).unwrap());
        let right = Arc::new(BoundedSurface::new(4, 8).unwrap());
        let channels: Vec<Box<dyn Channel>> = vec![
            Box::new(ScrollingChannel::new(Arc::clone(&left), 2).unwrap()),
            Box::new(ScrollingChannel::new(Arc::clone(&right), 2).unwrap()),
        ];
        let mut demuxer = StreamDemuxer::with_channels(channels).unwrap();

        demuxer.write(&[0.5, -0.5, 0.25, -0.25]);

        assert_eq!(left.lock().column(0), Some(ExtremumPair::new(0.5, 0.25)));
        assert_eq!(right.lock().column(0), Some(ExtremumPair::new(-0.25, -0.5)));

        let composite = demuxer.render_all(4, 8);
        assert_eq!(wavestack::Raster::bounds(&composite), (4, 16));
    }

    #[test]
    fn test_zero_samples_per_column_is_rejected() {
        let surface = Arc::new(BoundedSurface::new(4, 8).unwrap());
        assert!(ScrollingChannel::new(Arc::clone(&surface), 0).is_err());
        assert!(ScrollingChannel::new(surface, 1).is_ok());
    }

    #[test]
    fn test_band_height() {
        assert_eq!(band_height(40, 2), 20);
        assert_eq!(band_height(41, 2), 20);
        assert_eq!(band_height(1, 4), 1);
        assert_eq!(band_height(10, 0), 10);
    }
}
