//! Fixed-width scrolling waveform.
//!
//! A [`BoundedSurface`] keeps one [`ExtremumPair`] per pixel column in a ring
//! buffer. Once every column has been written, each new pair evicts the
//! oldest one and the image scrolls left by one column. Ingest is O(1): data
//! never moves, the logical-to-physical column mapping is computed when a
//! pixel is read.

use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{bail, Result};
use image::Rgba;

use super::pair::ExtremumPair;
use super::raster::{Palette, Raster};

/// Scrolling waveform of the most recent `width` columns.
///
/// The backing storage sits behind a mutex so an audio thread can ingest
/// while another thread renders. Single calls to [`ingest`](Self::ingest),
/// [`resize`](Self::resize) and [`Raster::at`] lock internally; to read a
/// whole frame without ingestion interleaving, hold the guard returned by
/// [`lock`](Self::lock) for the duration of the read.
pub struct BoundedSurface {
    ring: Mutex<Ring>,
}

struct Ring {
    width: u32,
    height: u32,
    palette: Palette,
    pairs: Box<[ExtremumPair]>,
    /// Next physical column to write.
    write_cursor: usize,
    /// Set once every column has been written at least once.
    wrapped: bool,
    /// Physical column holding logical column 0 (the oldest pair).
    logical_start: usize,
}

impl BoundedSurface {
    /// Creates an empty surface drawn black on white.
    ///
    /// # Errors
    /// - If `width` or `height` is zero
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Self::with_palette(width, height, Palette::default())
    }

    /// Creates an empty surface with explicit colors.
    ///
    /// # Errors
    /// - If `width` or `height` is zero
    pub fn with_palette(width: u32, height: u32, palette: Palette) -> Result<Self> {
        if width == 0 || height == 0 {
            bail!("Waveform surface must be at least 1x1, got {width}x{height}");
        }

        tracing::debug!("Created {}x{} bounded waveform surface", width, height);
        Ok(Self {
            ring: Mutex::new(Ring {
                width,
                height,
                palette,
                pairs: vec![ExtremumPair::SILENCE; width as usize].into_boxed_slice(),
                write_cursor: 0,
                wrapped: false,
                logical_start: 0,
            }),
        })
    }

    /// Acquires exclusive access until the returned guard is dropped.
    pub fn lock(&self) -> SurfaceGuard<'_> {
        // Poisoning is ignored: no ring operation can panic halfway through.
        SurfaceGuard {
            ring: self.ring.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// Appends one column, evicting the oldest once the surface is full.
    pub fn ingest(&self, pair: ExtremumPair) {
        self.lock().ingest(pair);
    }

    /// Changes the surface size. See [`SurfaceGuard::resize`].
    ///
    /// # Errors
    /// - If `width` or `height` is zero
    pub fn resize(&self, width: u32, height: u32) -> Result<()> {
        self.lock().resize(width, height)
    }
}

impl Raster for BoundedSurface {
    fn bounds(&self) -> (u32, u32) {
        self.lock().bounds()
    }

    fn at(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        self.lock().at(x, y)
    }
}

/// Exclusive access to a [`BoundedSurface`], released on drop.
///
/// The guard is itself a [`Raster`], so a consistent frame can be rendered
/// (or stacked into a [`Composite`](super::Composite)) straight from it.
pub struct SurfaceGuard<'a> {
    ring: MutexGuard<'a, Ring>,
}

impl SurfaceGuard<'_> {
    pub fn ingest(&mut self, pair: ExtremumPair) {
        self.ring.ingest(pair);
    }

    /// Changes the surface size.
    ///
    /// With an unchanged width only the height (and so the amplitude scale)
    /// changes. Otherwise the columns are copied in logical order into a new
    /// buffer starting at column 0: the newest columns are cut off when
    /// shrinking, zero-valued columns are appended when growing.
    ///
    /// # Errors
    /// - If `width` or `height` is zero; the surface is left unchanged
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.ring.resize(width, height)
    }

    /// Pair stored at logical column `x`, oldest first.
    pub fn column(&self, x: u32) -> Option<ExtremumPair> {
        self.ring.column(x as usize)
    }

    /// All columns in logical order, including not yet written ones.
    pub fn columns(&self) -> Vec<ExtremumPair> {
        (0..self.ring.pairs.len())
            .map(|x| self.ring.pairs[self.ring.physical(x)])
            .collect()
    }

    /// Number of columns written so far, capped at the width.
    pub fn len(&self) -> usize {
        self.ring.filled()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn palette(&self) -> Palette {
        self.ring.palette
    }
}

impl Raster for SurfaceGuard<'_> {
    fn bounds(&self) -> (u32, u32) {
        (self.ring.width, self.ring.height)
    }

    fn at(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        if y >= self.ring.height {
            return None;
        }
        let pair = self.ring.column(x as usize)?;
        Some(self.ring.palette.shade(pair, y, self.ring.height))
    }
}

impl Ring {
    fn ingest(&mut self, pair: ExtremumPair) {
        self.pairs[self.write_cursor] = pair;
        self.write_cursor = (self.write_cursor + 1) % self.pairs.len();

        if self.write_cursor == 0 {
            self.wrapped = true;
        }
        if self.wrapped {
            self.logical_start = self.write_cursor;
        }
    }

    fn physical(&self, x: usize) -> usize {
        if self.wrapped {
            (x + self.logical_start) % self.pairs.len()
        } else {
            x
        }
    }

    fn column(&self, x: usize) -> Option<ExtremumPair> {
        if x >= self.pairs.len() {
            return None;
        }
        Some(self.pairs[self.physical(x)])
    }

    fn filled(&self) -> usize {
        if self.wrapped {
            self.pairs.len()
        } else {
            self.write_cursor
        }
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            bail!("Cannot resize waveform surface to {width}x{height}");
        }

        if width == self.width {
            self.height = height;
            return Ok(());
        }

        let mut pairs = vec![ExtremumPair::SILENCE; width as usize].into_boxed_slice();
        for (x, slot) in pairs.iter_mut().enumerate().take(self.pairs.len()) {
            *slot = self.pairs[self.physical(x)];
        }

        let kept = self.filled().min(pairs.len());
        tracing::debug!(
            "Resized waveform surface {}x{} -> {}x{} ({} columns kept)",
            self.width,
            self.height,
            width,
            height,
            kept
        );

        // Logical order now equals physical order. A buffer filled to the
        // brim behaves like one that has just wrapped.
        self.wrapped = kept == pairs.len();
        self.write_cursor = if self.wrapped { 0 } else { kept };
        self.logical_start = 0;
        self.pairs = pairs;
        self.width = width;
        self.height = height;
        Ok(())
    }
}
