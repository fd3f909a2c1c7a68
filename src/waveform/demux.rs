//! Interleaved multi-channel input.
//!
//! A [`StreamDemuxer`] takes raw interleaved samples (as `f32` or as the raw
//! native-endian bytes of a capture buffer) and hands sample `k` to channel
//! `k % channel_count`. Each channel is any [`Channel`] aggregator; when the
//! whole capture is wanted as an image, [`StreamDemuxer::render_all`] stacks
//! every channel that can be drawn.

use anyhow::{bail, Result};

use super::bounded::BoundedSurface;
use super::pair::ExtremumPair;
use super::raster::Raster;
use super::stack::Composite;
use super::unbounded::UnboundedAggregator;

/// Something that builds a raster view on request, at a requested size.
pub trait RasterFactory {
    fn to_raster(&self, width: u32, height: u32) -> Box<dyn Raster + '_>;
}

/// How a channel can be drawn.
pub enum RasterSource<'a> {
    /// The channel is a raster already; its own size is used.
    Direct(&'a dyn Raster),
    /// The channel builds a view at the size the caller asks for.
    Factory(&'a dyn RasterFactory),
}

/// Per-channel aggregator fed by a [`StreamDemuxer`].
pub trait Channel: Send {
    fn ingest(&mut self, pair: ExtremumPair);

    /// Declares how (and whether) this channel can be drawn.
    fn raster_source(&self) -> Option<RasterSource<'_>> {
        None
    }
}

impl RasterFactory for UnboundedAggregator {
    fn to_raster(&self, width: u32, height: u32) -> Box<dyn Raster + '_> {
        Box::new(UnboundedAggregator::to_raster(self, width, height))
    }
}

impl Channel for UnboundedAggregator {
    fn ingest(&mut self, pair: ExtremumPair) {
        UnboundedAggregator::ingest(self, pair);
    }

    fn raster_source(&self) -> Option<RasterSource<'_>> {
        Some(RasterSource::Factory(self))
    }
}

impl Channel for BoundedSurface {
    fn ingest(&mut self, pair: ExtremumPair) {
        BoundedSurface::ingest(self, pair);
    }

    fn raster_source(&self) -> Option<RasterSource<'_>> {
        Some(RasterSource::Direct(self))
    }
}

/// Routes interleaved samples to one aggregator per channel.
pub struct StreamDemuxer {
    channels: Vec<Box<dyn Channel>>,
}

impl StreamDemuxer {
    /// Creates a demuxer with one [`UnboundedAggregator`] per channel.
    ///
    /// # Errors
    /// - If `channel_count` or `samples_per_pair` is zero
    pub fn new(channel_count: usize, samples_per_pair: usize) -> Result<Self> {
        let channels = (0..channel_count)
            .map(|_| {
                UnboundedAggregator::new(samples_per_pair)
                    .map(|agg| Box::new(agg) as Box<dyn Channel>)
            })
            .collect::<Result<Vec<_>>>()?;
        Self::with_channels(channels)
    }

    /// Creates a demuxer over caller-supplied channels, in channel order.
    ///
    /// # Errors
    /// - If `channels` is empty
    pub fn with_channels(channels: Vec<Box<dyn Channel>>) -> Result<Self> {
        if channels.is_empty() {
            bail!("A stream needs at least one channel");
        }

        tracing::debug!("Stream demuxer created with {} channels", channels.len());
        Ok(Self { channels })
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn channels(&self) -> &[Box<dyn Channel>] {
        &self.channels
    }

    /// Routes interleaved samples, one degenerate pair per sample.
    ///
    /// A trailing frame with fewer samples than there are channels is dropped
    /// without being reported. Returns the number of whole frames routed.
    pub fn write(&mut self, samples: &[f32]) -> usize {
        let frames = samples.chunks_exact(self.channels.len());
        let dropped = frames.remainder().len();
        if dropped > 0 {
            tracing::trace!("Dropping {} samples of a partial trailing frame", dropped);
        }

        let mut written = 0;
        for frame in frames {
            for (channel, &sample) in self.channels.iter_mut().zip(frame) {
                channel.ingest(ExtremumPair::sample(sample));
            }
            written += 1;
        }
        written
    }

    /// Decodes native-endian `f32` samples from `bytes` and routes them like
    /// [`write`](Self::write).
    ///
    /// Bytes that do not make up a whole sample are dropped along with any
    /// partial trailing frame. Returns the number of whole frames routed.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> usize {
        let samples = decode_samples(bytes);
        self.write(&samples)
    }

    /// Stacks every drawable channel, top to bottom in channel order.
    ///
    /// Factory channels are asked for a `width` x `height` view; direct
    /// rasters keep their own size. Channels that cannot be drawn are skipped.
    pub fn render_all(&self, width: u32, height: u32) -> Composite<'_> {
        let mut composite = Composite::new();
        for (index, channel) in self.channels.iter().enumerate() {
            match channel.raster_source() {
                Some(RasterSource::Direct(raster)) => composite.push(raster),
                Some(RasterSource::Factory(factory)) => {
                    composite.push(factory.to_raster(width, height))
                }
                None => tracing::trace!("Channel {} has no raster view, skipping", index),
            }
        }
        composite
    }
}

/// Copies native-endian `f32` samples out of a byte buffer.
///
/// The input needs no particular alignment and is never reinterpreted in
/// place. Trailing bytes short of a whole sample are ignored.
pub fn decode_samples(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Channel that records what it was fed.
    #[derive(Clone, Default)]
    struct Recorder {
        seen: Arc<Mutex<Vec<ExtremumPair>>>,
    }

    impl Channel for Recorder {
        fn ingest(&mut self, pair: ExtremumPair) {
            self.seen.lock().unwrap().push(pair);
        }
    }

    impl Recorder {
        fn values(&self) -> Vec<f32> {
            self.seen.lock().unwrap().iter().map(|p| p.max).collect()
        }
    }

    fn recording_demuxer(n: usize) -> (StreamDemuxer, Vec<Recorder>) {
        let recorders: Vec<Recorder> = (0..n).map(|_| Recorder::default()).collect();
        let channels = recorders
            .iter()
            .map(|r| Box::new(r.clone()) as Box<dyn Channel>)
            .collect();
        (StreamDemuxer::with_channels(channels).unwrap(), recorders)
    }

    fn to_bytes(samples: &[f32]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_ne_bytes()).collect()
    }

    #[test]
    fn test_rejects_empty_configuration() {
        assert!(StreamDemuxer::new(0, 4).is_err());
        assert!(StreamDemuxer::new(2, 0).is_err());
        assert!(StreamDemuxer::with_channels(Vec::new()).is_err());
        assert_eq!(StreamDemuxer::new(3, 4).unwrap().channel_count(), 3);
    }

    #[test]
    fn test_routes_round_robin_and_drops_partial_frame() {
        let (mut demuxer, recorders) = recording_demuxer(2);

        let frames = demuxer.write(&[0.0, 0.1, 0.2, 0.3, 0.4]);

        assert_eq!(frames, 2);
        assert_eq!(recorders[0].values(), vec![0.0, 0.2]);
        assert_eq!(recorders[1].values(), vec![0.1, 0.3]);
    }

    #[test]
    fn test_samples_arrive_as_degenerate_pairs() {
        let (mut demuxer, recorders) = recording_demuxer(1);
        demuxer.write(&[-0.5]);
        assert_eq!(
            *recorders[0].seen.lock().unwrap(),
            vec![ExtremumPair::new(-0.5, -0.5)]
        );
    }

    #[test]
    fn test_write_bytes_matches_write() {
        let samples = [0.5, -0.25, 0.75, 1.0, -1.0, 0.125];
        let (mut demuxer, recorders) = recording_demuxer(3);

        let frames = demuxer.write_bytes(&to_bytes(&samples));

        assert_eq!(frames, 2);
        assert_eq!(recorders[0].values(), vec![0.5, 1.0]);
        assert_eq!(recorders[1].values(), vec![-0.25, -1.0]);
        assert_eq!(recorders[2].values(), vec![0.75, 0.125]);
    }

    #[test]
    fn test_write_bytes_drops_trailing_bytes() {
        let mut bytes = to_bytes(&[0.5, -0.5, 0.25]);
        bytes.extend_from_slice(&[1, 2]);
        let (mut demuxer, recorders) = recording_demuxer(2);

        assert_eq!(demuxer.write_bytes(&bytes), 1);
        assert_eq!(recorders[0].values(), vec![0.5]);
        assert_eq!(recorders[1].values(), vec![-0.5]);
    }

    #[test]
    fn test_decode_ignores_alignment() {
        let mut buffer = vec![0u8];
        buffer.extend(to_bytes(&[0.75, -0.125]));
        assert_eq!(decode_samples(&buffer[1..]), vec![0.75, -0.125]);
        assert!(decode_samples(&[0, 0, 0]).is_empty());
    }

    #[test]
    fn test_render_all_stacks_each_channel() {
        let mut demuxer = StreamDemuxer::new(2, 2).unwrap();
        // Channel 0 is loud, channel 1 silent; 8 frames -> 4 columns each.
        for _ in 0..8 {
            demuxer.write(&[1.0, 0.0]);
        }

        let composite = demuxer.render_all(4, 10);
        assert_eq!(composite.len(), 2);
        assert_eq!(composite.bounds(), (4, 20));

        let lit = |y| composite.at(0, y) == Some(crate::waveform::DEFAULT_FOREGROUND);
        // Loud channel: only the lower half of its band.
        assert!(!lit(2));
        assert!(lit(7));
        // Silent channel: only its center line.
        assert!(lit(15));
        assert!(!lit(17));
        assert_eq!(composite.at(0, 20), None);
    }

    #[test]
    fn test_render_all_mixes_capabilities() {
        let bounded = BoundedSurface::new(5, 6).unwrap();
        let channels: Vec<Box<dyn Channel>> = vec![
            Box::new(Recorder::default()),
            Box::new(bounded),
            Box::new(UnboundedAggregator::new(1).unwrap()),
        ];
        let mut demuxer = StreamDemuxer::with_channels(channels).unwrap();
        demuxer.write(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);

        // The recorder is skipped, the bounded surface keeps its own size and
        // the unbounded channel is as wide as its two pairs.
        let composite = demuxer.render_all(100, 4);
        assert_eq!(composite.len(), 2);
        assert_eq!(composite.bounds(), (5, 10));
        assert_eq!(composite.at(2, 6), None);
        assert!(composite.at(1, 6).is_some());
    }
}
