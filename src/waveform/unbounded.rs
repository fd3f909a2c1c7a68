//! Full-history waveform capture.

use anyhow::{bail, Result};
use image::Rgba;

use super::pair::ExtremumPair;
use super::raster::{Palette, Raster};

/// Growable sequence of extremum pairs, each folding `samples_per_pair`
/// ingested pairs.
///
/// Nothing is ever dropped: memory grows with the length of the stream.
#[derive(Debug, Clone)]
pub struct UnboundedAggregator {
    pairs: Vec<ExtremumPair>,
    samples_per_pair: usize,
    /// Samples folded into the last pair so far.
    folded: usize,
    palette: Palette,
}

impl UnboundedAggregator {
    /// # Errors
    /// - If `samples_per_pair` is zero
    pub fn new(samples_per_pair: usize) -> Result<Self> {
        if samples_per_pair == 0 {
            bail!("samples_per_pair must be at least 1");
        }

        Ok(Self {
            pairs: Vec::with_capacity(256),
            samples_per_pair,
            // A fresh aggregator starts a new pair on the first sample.
            folded: samples_per_pair,
            palette: Palette::default(),
        })
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    /// Folds one pair into the output, starting a new output pair every
    /// `samples_per_pair` calls.
    pub fn ingest(&mut self, pair: ExtremumPair) {
        match self.pairs.last_mut() {
            Some(last) if self.folded < self.samples_per_pair => {
                last.widen(pair);
                self.folded += 1;
            }
            _ => {
                self.pairs.push(pair);
                self.folded = 1;
            }
        }
    }

    /// Accumulated pairs, oldest first. The last one may be partial.
    pub fn pairs(&self) -> &[ExtremumPair] {
        &self.pairs
    }

    pub fn samples_per_pair(&self) -> usize {
        self.samples_per_pair
    }

    /// Read-only raster over the accumulated pairs, one column per pair.
    ///
    /// `height` sets the amplitude scale. `width` is currently ignored: the
    /// view is always exactly [`pairs`](Self::pairs)`.len()` columns wide.
    // TODO: fold columns down to `width` once a downsampling rule is settled.
    pub fn to_raster(&self, _width: u32, height: u32) -> UnboundedView<'_> {
        UnboundedView {
            pairs: &self.pairs,
            height,
            palette: self.palette,
        }
    }
}

/// Borrowed raster over an [`UnboundedAggregator`]'s pairs.
#[derive(Debug, Clone, Copy)]
pub struct UnboundedView<'a> {
    pairs: &'a [ExtremumPair],
    height: u32,
    palette: Palette,
}

impl Raster for UnboundedView<'_> {
    fn bounds(&self) -> (u32, u32) {
        let width = u32::try_from(self.pairs.len()).unwrap_or(u32::MAX);
        (width, self.height)
    }

    fn at(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        if y >= self.height {
            return None;
        }
        let pair = self.pairs.get(x as usize)?;
        Some(self.palette.shade(*pair, y, self.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waveform::raster::{DEFAULT_BACKGROUND, DEFAULT_FOREGROUND};

    #[test]
    fn test_zero_samples_per_pair_is_rejected() {
        assert!(UnboundedAggregator::new(0).is_err());
    }

    #[test]
    fn test_folds_groups_of_samples() {
        let samples = [0.1, -0.4, 0.3, 0.9, 0.2, -0.2, 0.5];
        let mut agg = UnboundedAggregator::new(3).unwrap();
        for s in samples {
            agg.ingest(ExtremumPair::sample(s));
        }

        assert_eq!(
            agg.pairs(),
            &[
                ExtremumPair::new(0.3, -0.4),
                ExtremumPair::new(0.9, -0.2),
                ExtremumPair::new(0.5, 0.5),
            ]
        );
    }

    #[test]
    fn test_first_pair_is_not_widened_by_silence() {
        let mut agg = UnboundedAggregator::new(4).unwrap();
        agg.ingest(ExtremumPair::sample(0.5));
        agg.ingest(ExtremumPair::sample(0.25));
        assert_eq!(agg.pairs(), &[ExtremumPair::new(0.5, 0.25)]);
    }

    #[test]
    fn test_one_sample_per_pair_keeps_every_sample() {
        let mut agg = UnboundedAggregator::new(1).unwrap();
        for i in 0..5 {
            agg.ingest(ExtremumPair::sample(i as f32));
        }
        assert_eq!(agg.pairs().len(), 5);
        assert_eq!(agg.pairs()[3], ExtremumPair::sample(3.0));
    }

    #[test]
    fn test_raster_ignores_requested_width() {
        let mut agg = UnboundedAggregator::new(2).unwrap();
        for _ in 0..10 {
            agg.ingest(ExtremumPair::new(1.0, -1.0));
        }

        let view = agg.to_raster(1000, 8);
        assert_eq!(view.bounds(), (5, 8));
        assert_eq!(agg.to_raster(2, 8).bounds(), (5, 8));
        assert_eq!(view.at(5, 4), None);
        assert_eq!(view.at(0, 8), None);
    }

    #[test]
    fn test_raster_uses_height_as_scale() {
        let mut agg = UnboundedAggregator::new(1).unwrap();
        agg.ingest(ExtremumPair::new(0.5, -0.5));

        let view = agg.to_raster(1, 8);
        let lit: Vec<bool> = (0..8)
            .map(|y| view.at(0, y) == Some(DEFAULT_FOREGROUND))
            .collect();
        assert_eq!(lit, [false, false, false, true, true, true, false, false]);

        let view = agg.to_raster(1, 16);
        assert_eq!(view.at(0, 5), Some(DEFAULT_FOREGROUND));
        assert_eq!(view.at(0, 4), Some(DEFAULT_BACKGROUND));
    }

    #[test]
    fn test_empty_raster() {
        let agg = UnboundedAggregator::new(8).unwrap();
        let view = agg.to_raster(100, 10);
        assert_eq!(view.bounds(), (0, 10));
        assert_eq!(view.at(0, 0), None);
    }
}
