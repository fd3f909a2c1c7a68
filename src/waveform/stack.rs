//! Vertical stacking of rasters.

use image::Rgba;

use super::raster::Raster;

/// Rasters stacked top to bottom into one logical raster.
///
/// The composite is as wide as its widest layer and as tall as all layers
/// together, measured on every query: a layer resized after it was pushed
/// moves the bands below it. Layers are borrowed; a composite is cheap to
/// build per frame.
///
/// Points right of a narrower layer (but inside its band) are whatever that
/// layer answers for them; the layers in this crate answer `None`. Stack
/// equal-width layers for a well-defined image.
pub struct Composite<'a> {
    layers: Vec<Box<dyn Raster + 'a>>,
}

impl<'a> Composite<'a> {
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Stacks borrowed rasters in the given order.
    pub fn from_layers<I, R>(layers: I) -> Self
    where
        I: IntoIterator<Item = &'a R>,
        R: Raster + ?Sized + 'a,
    {
        let mut composite = Self::new();
        for layer in layers {
            composite.push(layer);
        }
        composite
    }

    /// Adds a layer below the existing ones.
    pub fn push(&mut self, layer: impl Raster + 'a) {
        self.layers.push(Box::new(layer));
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl Default for Composite<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl Raster for Composite<'_> {
    fn bounds(&self) -> (u32, u32) {
        self.layers.iter().fold((0, 0), |(width, height), layer| {
            let (w, h) = layer.bounds();
            (width.max(w), height.saturating_add(h))
        })
    }

    fn at(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        let mut top = 0u32;
        for layer in &self.layers {
            let (_, height) = layer.bounds();
            let bottom = top.saturating_add(height);
            if y < bottom {
                return layer.at(x, y - top);
            }
            top = bottom;
        }
        None
    }
}
