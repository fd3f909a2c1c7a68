//! Render a whole audio capture to a PNG image.
//!
//! Reads a WAV file (any channel count, integer or float samples) or a raw
//! stream of native-endian `f32` samples, folds every channel into a
//! full-history waveform and writes the channels stacked top to bottom.

use anyhow::{anyhow, bail, Context};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use wavestack::{Channel, Palette, Raster, StreamDemuxer, UnboundedAggregator};

use crate::config::{RenderConfig, WavestackConfig};

/// Command-line options for `wavestack render`.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Audio file, or "-" for raw samples on stdin
    pub input: PathBuf,
    /// Where to write the PNG
    pub output: PathBuf,
    /// Treat the input as raw interleaved native-endian f32 samples
    pub raw: bool,
    /// Channel count of raw input
    pub channels: usize,
    pub samples_per_pair: Option<usize>,
    pub height: Option<u32>,
}

/// Samples decoded from the input, with the stream layout they came in.
struct DecodedAudio {
    channels: usize,
    samples: Vec<f32>,
}

/// Renders an audio file to an image using the configured colors and scale.
///
/// # Errors
/// - If the configuration is invalid
/// - If the input cannot be read or decoded, or holds no complete frame
/// - If the image cannot be written
pub fn handle_render(options: RenderOptions) -> Result<(), anyhow::Error> {
    tracing::info!("=== wavestack Render Command ===");

    let config = WavestackConfig::load()?;
    let render = apply_overrides(config.render, &options);
    let palette = render.palette()?;
    if render.height == 0 {
        bail!("Render height must be at least 1 pixel");
    }

    let audio = if options.raw {
        read_raw(&options.input, options.channels)?
    } else {
        read_wav(&options.input)?
    };
    tracing::info!(
        "Decoded {} samples in {} channels from {}",
        audio.samples.len(),
        audio.channels,
        options.input.display()
    );

    let mut demuxer = demuxer_for(audio.channels, render.samples_per_pair, palette)?;
    let frames = demuxer.write(&audio.samples);
    if frames == 0 {
        bail!(
            "No complete {}-channel frame in {}",
            audio.channels,
            options.input.display()
        );
    }

    let columns = frames.div_ceil(render.samples_per_pair);
    let width = u32::try_from(columns).map_err(|_| anyhow!("Input too long to render"))?;
    let image = demuxer.render_all(width, render.height).to_image();

    image
        .save(&options.output)
        .with_context(|| format!("Failed to write {}", options.output.display()))?;

    tracing::info!(
        "Rendered {} frames to {} ({}x{})",
        frames,
        options.output.display(),
        image.width(),
        image.height()
    );
    println!("{}", options.output.display());
    Ok(())
}

fn apply_overrides(mut render: RenderConfig, options: &RenderOptions) -> RenderConfig {
    if let Some(samples_per_pair) = options.samples_per_pair {
        render.samples_per_pair = samples_per_pair;
    }
    if let Some(height) = options.height {
        render.height = height;
    }
    render
}

/// One full-history aggregator per channel, drawn with `palette`.
fn demuxer_for(
    channels: usize,
    samples_per_pair: usize,
    palette: Palette,
) -> anyhow::Result<StreamDemuxer> {
    let channels = (0..channels)
        .map(|_| {
            UnboundedAggregator::new(samples_per_pair)
                .map(|agg| Box::new(agg.with_palette(palette)) as Box<dyn Channel>)
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    StreamDemuxer::with_channels(channels)
}

fn read_raw(path: &Path, channels: usize) -> anyhow::Result<DecodedAudio> {
    let bytes = if path == Path::new("-") {
        let mut bytes = Vec::new();
        io::stdin()
            .lock()
            .read_to_end(&mut bytes)
            .context("Failed to read samples from stdin")?;
        bytes
    } else {
        fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?
    };

    if bytes.len() % 4 != 0 {
        tracing::warn!(
            "Raw input is {} bytes, ignoring {} trailing bytes",
            bytes.len(),
            bytes.len() % 4
        );
    }

    Ok(DecodedAudio {
        channels,
        samples: wavestack::waveform::decode_samples(&bytes),
    })
}

fn read_wav(path: &Path) -> anyhow::Result<DecodedAudio> {
    let reader = hound::WavReader::open(path)
        .with_context(|| format!("Failed to open WAV file {}", path.display()))?;
    let spec = reader.spec();
    tracing::debug!(
        "WAV format: {}Hz, {} channels, {} bits {:?}",
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample,
        spec.sample_format
    );

    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let full_scale = int_full_scale(spec.bits_per_sample);
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / full_scale))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    Ok(DecodedAudio {
        channels: usize::from(spec.channels),
        samples,
    })
}

/// Magnitude of the most negative integer sample, used to map to [-1, 1].
fn int_full_scale(bits_per_sample: u16) -> f32 {
    (1u64 << bits_per_sample.clamp(1, 32).saturating_sub(1)) as f32
}
