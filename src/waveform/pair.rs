//! Min/max amplitude summaries.

/// Extremes of the signal over one column (or one group of samples).
///
/// Values are conventionally in `[-1.0, 1.0]` but the type does not enforce
/// it; renderers accept anything, including out-of-range and NaN values.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExtremumPair {
    pub max: f32,
    pub min: f32,
}

impl ExtremumPair {
    pub const SILENCE: ExtremumPair = ExtremumPair { max: 0.0, min: 0.0 };

    pub fn new(max: f32, min: f32) -> Self {
        Self { max, min }
    }

    /// A degenerate pair for a single raw sample.
    pub fn sample(value: f32) -> Self {
        Self {
            max: value,
            min: value,
        }
    }

    /// Widens this pair so it also covers `other`.
    pub fn widen(&mut self, other: ExtremumPair) {
        self.max = self.max.max(other.max);
        self.min = self.min.min(other.min);
    }
}
