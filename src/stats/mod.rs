// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Statistics of an intensity field, and its mapping onto colours.

mod colormap;
#[cfg(test)]
mod tests;

pub use colormap::*;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, math::median_mut};

/// A summary of an intensity field. If any pixel is NaN, every value here
/// except the counts is NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldStatistics {
    pub num_pixels: usize,
    pub num_nan: usize,
    pub min: f32,
    pub max: f32,
    pub mean: f32,
    /// Population standard deviation.
    pub sdev: f32,
    pub median: f32,
    /// Median absolute deviation from the median.
    pub mad: f32,
}

impl FieldStatistics {
    pub fn compute(values: &[f32]) -> FieldStatistics {
        let num_pixels = values.len();
        let num_nan = values.iter().filter(|v| v.is_nan()).count();
        if num_nan > 0 {
            warn!("{num_nan} of {num_pixels} pixels are NaN; statistics are NaN");
        }
        if num_pixels == 0 || num_nan > 0 {
            return FieldStatistics {
                num_pixels,
                num_nan,
                min: f32::NAN,
                max: f32::NAN,
                mean: f32::NAN,
                sdev: f32::NAN,
                median: f32::NAN,
                mad: f32::NAN,
            };
        }

        let (min, max) = values
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        // Accumulate in double precision; fields can have millions of pixels.
        let n = num_pixels as f64;
        let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
        let variance = values
            .iter()
            .map(|&v| (v as f64 - mean).powi(2))
            .sum::<f64>()
            / n;

        let mut scratch = values.to_vec();
        let median = median_mut(&mut scratch).unwrap_or(f32::NAN);
        scratch
            .iter_mut()
            .zip(values)
            .for_each(|(s, &v)| *s = (v - median).abs());
        let mad = median_mut(&mut scratch).unwrap_or(f32::NAN);

        let stats = FieldStatistics {
            num_pixels,
            num_nan,
            min,
            max,
            mean: mean as f32,
            sdev: variance.sqrt() as f32,
            median,
            mad,
        };
        debug!(
            "N_s: {num_pixels}, S/N: {}, min: {min}, max: {max}, mean: {}, sdev: {}, R_mad: {}, MAD: {mad}, median: {median}",
            stats.snr(),
            stats.mean,
            stats.sdev,
            stats.r_mad()
        );
        stats
    }

    /// Peak over standard deviation.
    pub fn snr(&self) -> f32 {
        self.max / self.sdev
    }

    /// Peak over the median absolute deviation; a robust signal-to-noise.
    pub fn r_mad(&self) -> f32 {
        self.max / self.mad
    }
}

/// The intensities mapped to the ends of the colour scale.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ColorRange {
    /// The field's own minimum and maximum.
    #[default]
    Auto,

    /// Fixed bounds; values outside are clamped.
    Fixed { min: f32, max: f32 },
}

impl ColorRange {
    pub fn fixed(min: f32, max: f32) -> Result<ColorRange, ConfigError> {
        if min.is_finite() && max.is_finite() && min < max {
            Ok(ColorRange::Fixed { min, max })
        } else {
            Err(ConfigError::InvalidColorRange { min, max })
        }
    }

    /// The (min, max) to normalise with.
    pub fn bounds(self, stats: &FieldStatistics) -> (f32, f32) {
        match self {
            ColorRange::Auto => (stats.min, stats.max),
            ColorRange::Fixed { min, max } => (min, max),
        }
    }
}

/// Map each value onto [0, 1] using the given bounds. Values outside the
/// bounds are clamped and NaN stays NaN. If the bounds are equal every value
/// maps to 0.5.
pub fn normalise(values: &[f32], (min, max): (f32, f32)) -> Vec<f32> {
    let range = max - min;
    if range > 0.0 {
        let inv = range.recip();
        values
            .iter()
            .map(|&v| ((v - min) * inv).clamp(0.0, 1.0))
            .collect()
    } else {
        values
            .iter()
            .map(|&v| if v.is_nan() { v } else { 0.5 })
            .collect()
    }
}
