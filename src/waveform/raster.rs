//! Pull-model raster interface and the per-pixel waveform rule.
//!
//! Every surface in this crate is a [`Raster`]: nothing is drawn ahead of
//! time, pixels are computed from the stored extremum pairs when queried.

use image::{Rgba, RgbaImage};

use super::pair::ExtremumPair;

/// Opaque black.
pub const DEFAULT_FOREGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);
/// Opaque white.
pub const DEFAULT_BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
/// Used by [`Raster::to_image`] for pixels no source claims.
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Pixel layout reported by a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorModel {
    /// 8 bits per channel, red/green/blue/alpha.
    Rgba8,
}

/// A read-only image whose pixels are computed on demand.
///
/// (0, 0) is the top-left corner and y grows downward. `at` must be free of
/// side effects. `None` means "no color": the point lies outside the raster
/// or no source covers it.
pub trait Raster {
    /// Returns `(width, height)`.
    fn bounds(&self) -> (u32, u32);

    fn color_model(&self) -> ColorModel {
        ColorModel::Rgba8
    }

    fn at(&self, x: u32, y: u32) -> Option<Rgba<u8>>;

    /// Materializes the raster into an owned image buffer, for encoders.
    fn to_image(&self) -> RgbaImage {
        let (width, height) = self.bounds();
        RgbaImage::from_fn(width, height, |x, y| self.at(x, y).unwrap_or(TRANSPARENT))
    }
}

impl<R: Raster + ?Sized> Raster for &R {
    fn bounds(&self) -> (u32, u32) {
        (**self).bounds()
    }

    fn color_model(&self) -> ColorModel {
        (**self).color_model()
    }

    fn at(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        (**self).at(x, y)
    }
}

impl<R: Raster + ?Sized> Raster for Box<R> {
    fn bounds(&self) -> (u32, u32) {
        (**self).bounds()
    }

    fn color_model(&self) -> ColorModel {
        (**self).color_model()
    }

    fn at(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        (**self).at(x, y)
    }
}

/// An already materialized frame, e.g. a snapshot taken under a surface guard.
impl Raster for RgbaImage {
    fn bounds(&self) -> (u32, u32) {
        self.dimensions()
    }

    fn at(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        self.get_pixel_checked(x, y).copied()
    }
}

/// Foreground/background pair used to paint a waveform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub foreground: Rgba<u8>,
    pub background: Rgba<u8>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            foreground: DEFAULT_FOREGROUND,
            background: DEFAULT_BACKGROUND,
        }
    }
}

impl Palette {
    pub fn new(foreground: Rgba<u8>, background: Rgba<u8>) -> Self {
        Self {
            foreground,
            background,
        }
    }

    /// Color of row `y` in a column summarized by `pair`.
    pub fn shade(&self, pair: ExtremumPair, y: u32, height: u32) -> Rgba<u8> {
        if is_foreground(pair, y, height) {
            self.foreground
        } else {
            self.background
        }
    }
}

/// Decides whether row `y` of a `height`-tall column is part of the band.
///
/// The center row is always drawn. Above the center the band reaches up to
/// `mid + round(mid * min)`, below it down to `mid + round(mid * max)`; both
/// bounds are exclusive. Amplitudes are not clamped: values past full scale
/// simply fill the half-column and NaN scales to zero.
pub fn is_foreground(pair: ExtremumPair, y: u32, height: u32) -> bool {
    let mid = i64::from(height / 2);
    let y = i64::from(y);

    if y == mid {
        return true;
    }
    if y < mid {
        return mid.saturating_add(scale(mid, pair.min)) < y;
    }
    mid.saturating_add(scale(mid, pair.max)) > y
}

fn scale(mid: i64, amplitude: f32) -> i64 {
    // float -> int casts saturate, NaN becomes 0
    (mid as f32 * amplitude).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(pair: ExtremumPair, height: u32) -> Vec<bool> {
        (0..height).map(|y| is_foreground(pair, y, height)).collect()
    }

    #[test]
    fn test_silence_draws_only_center_line() {
        let rows = column(ExtremumPair::SILENCE, 10);
        for (y, lit) in rows.iter().enumerate() {
            assert_eq!(*lit, y == 5, "row {y}");
        }
    }

    #[test]
    fn test_full_scale_fills_column() {
        // mid = 5: upper band starts after row 0, lower band stops before row 10
        let rows = column(ExtremumPair::new(1.0, -1.0), 10);
        assert!(!rows[0]);
        assert!(rows[1..].iter().all(|lit| *lit));

        let rows = column(ExtremumPair::new(1.0, -1.0), 11);
        assert!(!rows[0]);
        assert!(rows[1..10].iter().all(|lit| *lit));
        assert!(!rows[10]);
    }

    #[test]
    fn test_min_drives_upper_half_and_max_lower_half() {
        // Only positive excursion: the upper half stays empty.
        let rows = column(ExtremumPair::new(0.5, 0.0), 20);
        assert!(rows[..10].iter().all(|lit| !lit));
        assert!(rows[10..15].iter().all(|lit| *lit));
        assert!(rows[15..].iter().all(|lit| !lit));

        // Only negative excursion: the lower half stays empty.
        let rows = column(ExtremumPair::new(0.0, -0.5), 20);
        assert!(rows[..6].iter().all(|lit| !lit));
        assert!(rows[6..=10].iter().all(|lit| *lit));
        assert!(rows[11..].iter().all(|lit| !lit));
    }

    #[test]
    fn test_amplitude_is_rounded() {
        // mid = 5, 5 * 0.3 = 1.5 rounds to 2, so row 6 is lit and 7 is not
        let rows = column(ExtremumPair::new(0.3, 0.0), 10);
        assert!(rows[6]);
        assert!(!rows[7]);
    }

    #[test]
    fn test_out_of_range_amplitudes() {
        let rows = column(ExtremumPair::new(4.0, -4.0), 10);
        assert!(rows[1..].iter().all(|lit| *lit));

        let rows = column(ExtremumPair::new(f32::INFINITY, f32::NEG_INFINITY), 10);
        assert!(rows[1..].iter().all(|lit| *lit));

        let rows = column(ExtremumPair::new(f32::NAN, f32::NAN), 10);
        assert_eq!(rows, column(ExtremumPair::SILENCE, 10));
    }

    #[test]
    fn test_height_one() {
        assert!(is_foreground(ExtremumPair::SILENCE, 0, 1));
    }

    #[test]
    fn test_image_is_a_raster() {
        let image = RgbaImage::from_pixel(2, 3, DEFAULT_FOREGROUND);
        assert_eq!(Raster::bounds(&image), (2, 3));
        assert_eq!(image.at(1, 2), Some(DEFAULT_FOREGROUND));
        assert_eq!(image.at(2, 0), None);
        assert_eq!(image.to_image(), image);
    }

    #[test]
    fn test_palette_shade() {
        let palette = Palette::default();
        assert_eq!(palette.shade(ExtremumPair::SILENCE, 5, 10), DEFAULT_FOREGROUND);
        assert_eq!(palette.shade(ExtremumPair::SILENCE, 0, 10), DEFAULT_BACKGROUND);
    }
}
