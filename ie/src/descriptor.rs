//! Feature descriptors used to compare slot regions with templates.
//!
//! A descriptor is computed once per template (at catalog build time) and once
//! per region. It combines a blurred luma plane, compared with normalized
//! cross-correlation, and a coarse RGB histogram, compared by intersection.
//! Both halves are invariant to small offsets and compression noise, and the
//! correlation half is invariant to uniform brightness changes.

use anyhow::Result;

use crate::Image;

/// Default side length regions and templates are resampled to.
pub const DEFAULT_SIDE: u32 = 32;

const BLUR_SIGMA: f32 = 0.8;
const BINS_PER_CHANNEL: usize = 4;
const STRUCTURAL_WEIGHT: f32 = 0.65;
const HISTOGRAM_WEIGHT: f32 = 1.0 - STRUCTURAL_WEIGHT;
/// Below this norm a luma plane is treated as flat and compared by brightness alone.
const FLAT_NORM: f32 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    side: u32,
    mean: f32,
    norm: f32,
    /// Mean-centered blurred luma, row-major.
    luma: Vec<f32>,
    /// Normalized RGB histogram, sums to 1.
    histogram: Vec<f32>,
}

impl Descriptor {
    pub fn from_image(image: Image, side: u32) -> Result<Self> {
        let owned = image.to_owned_image().resized(side, side)?;
        let blurred = imageproc::filter::gaussian_blur_f32(&owned.to_gray_image(), BLUR_SIGMA);

        let raw = blurred.pixels().map(|p| p.0[0] as f32).collect::<Vec<_>>();
        let mean = raw.iter().sum::<f32>() / raw.len() as f32;
        let luma = raw.iter().map(|v| v - mean).collect::<Vec<_>>();
        let norm = luma.iter().map(|v| v * v).sum::<f32>().sqrt();

        let shift = 8 - BINS_PER_CHANNEL.trailing_zeros();
        let mut histogram = vec![0.0f32; BINS_PER_CHANNEL.pow(3)];
        for c in owned.pixels() {
            let (r, g, b) = ((c.r >> shift) as usize, (c.g >> shift) as usize, (c.b >> shift) as usize);
            histogram[(r * BINS_PER_CHANNEL + g) * BINS_PER_CHANNEL + b] += 1.0;
        }
        let count = owned.pixels().len() as f32;
        for v in &mut histogram {
            *v /= count;
        }

        Ok(Self {
            side,
            mean,
            norm,
            luma,
            histogram,
        })
    }

    pub fn side(&self) -> u32 {
        self.side
    }

    /// Similarity in `[0, 1]`; identical descriptors score exactly 1.0.
    ///
    /// Descriptors of different sizes are incomparable and score 0.0.
    pub fn similarity(&self, other: &Descriptor) -> f32 {
        if self.side != other.side {
            return 0.0;
        }
        if self == other {
            return 1.0;
        }

        let score = STRUCTURAL_WEIGHT * self.structural(other) + HISTOGRAM_WEIGHT * self.histogram_overlap(other);
        score.clamp(0.0, 1.0)
    }

    fn structural(&self, other: &Descriptor) -> f32 {
        match (self.norm < FLAT_NORM, other.norm < FLAT_NORM) {
            (true, true) => 1.0 - (self.mean - other.mean).abs() / 255.0,
            (false, false) => {
                let dot = self
                    .luma
                    .iter()
                    .zip(&other.luma)
                    .map(|(a, b)| a * b)
                    .sum::<f32>();
                (dot / (self.norm * other.norm)).max(0.0)
            }
            // A flat plane carries no structure to correlate with.
            _ => 0.0,
        }
    }

    fn histogram_overlap(&self, other: &Descriptor) -> f32 {
        self.histogram
            .iter()
            .zip(&other.histogram)
            .map(|(a, b)| a.min(*b))
            .sum()
    }
}
