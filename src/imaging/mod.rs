// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Gridless imaging.
//!
//! The brightness of each sky pixel with direction (l, m, n) is evaluated
//! directly from the visibilities:
//!
//! I(l, m, n) = Σ V_ij exp(-2πi (u l + v m + w (n - 1)))
//!
//! where (u, v, w) is the baseline between antennas i and j in wavelengths.
//! Every pixel is independent, so pixels are the unit of parallel work.


use std::collections::BTreeSet;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{debug, trace, warn};
use ndarray::prelude::*;
use ndarray::Zip;
use num_complex::Complex32;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::{
    constants::{L1_WAVELENGTH, TAU},
    error::ConfigError,
    math::{ActiveTrig, Trig},
    obs::VisibilitySample,
    render::Stopwatch,
    sky::{Nside, PixelGeometry},
    PROGRESS_BARS,
};

/// How often (in pixels) the progress bar is advanced.
#[cfg_attr(target_arch = "wasm32", allow(dead_code))]
const PROGRESS_STRIDE: usize = 4096;

/// A baseline's coordinates \[wavelengths\]. u points east, v north and w at the
/// zenith.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Uvw {
    pub u: f64,
    pub v: f64,
    pub w: f64,
}

/// What is divided out of each pixel's sum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumIter, EnumString, Serialize, Deserialize,
)]
pub enum Normalisation {
    /// Divide by the number of baselines contributing to the sum. The image
    /// of a unit point source then peaks at 1 regardless of the array size.
    #[default]
    #[strum(serialize = "baselines")]
    #[serde(rename = "baselines")]
    BaselineCount,

    /// Leave the sum as it is.
    #[strum(serialize = "none")]
    #[serde(rename = "none")]
    None,
}

/// How the complex sum becomes a pixel value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumIter, EnumString, Serialize, Deserialize,
)]
pub enum PixelValue {
    #[default]
    #[strum(serialize = "real")]
    #[serde(rename = "real")]
    Real,

    #[strum(serialize = "amplitude")]
    #[serde(rename = "amplitude")]
    Amplitude,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImagingOptions {
    pub normalisation: Normalisation,
    pub pixel_value: PixelValue,
}

/// One intensity per hemisphere pixel, in pixel-index order.
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityField {
    nside: Nside,
    values: Vec<f32>,
}

impl IntensityField {
    pub fn nside(&self) -> Nside {
        self.nside
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.values
    }

    /// The brightest pixel and its value. NaN pixels are skipped.
    pub fn peak(&self) -> Option<(usize, f32)> {
        self.values
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, v)| !v.is_nan())
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
    }
}

/// The (u, v, w) of every baseline in the sample, in the sample's order.
///
/// # Panics
///
/// Panics if a baseline refers to an antenna without a position.
pub fn baseline_uvws(sample: &VisibilitySample, antennas: &[[f64; 3]]) -> Vec<Uvw> {
    sample
        .baselines()
        .iter()
        .map(|bl| {
            let [xi, yi, zi] = antennas[bl.i];
            let [xj, yj, zj] = antennas[bl.j];
            Uvw {
                u: (xi - xj) / L1_WAVELENGTH,
                v: (yi - yj) / L1_WAVELENGTH,
                w: (zi - zj) / L1_WAVELENGTH,
            }
        })
        .collect()
}

/// A baseline ready for the kernel: its coordinates are pre-multiplied by
/// -2π, so the phase for a pixel is a dot product.
#[derive(Debug, Clone, Copy)]
struct BaselineTerm {
    u: f32,
    v: f32,
    w: f32,
    vis: Complex32,
}

/// Reconstruct the sky from a visibility sample using the trigonometry
/// selected when this crate was built. Only baselines between two of
/// `used_antennas` contribute.
pub fn reconstruct(
    sample: &VisibilitySample,
    antennas: &[[f64; 3]],
    geometry: &PixelGeometry,
    used_antennas: &[usize],
    options: &ImagingOptions,
) -> Result<IntensityField, ConfigError> {
    reconstruct_with::<ActiveTrig>(sample, antennas, geometry, used_antennas, options)
}

/// [`reconstruct`] with an explicit trigonometry backend.
pub fn reconstruct_with<T: Trig>(
    sample: &VisibilitySample,
    antennas: &[[f64; 3]],
    geometry: &PixelGeometry,
    used_antennas: &[usize],
    options: &ImagingOptions,
) -> Result<IntensityField, ConfigError> {
    let terms = select_baselines(sample, antennas, used_antennas)?;
    let nside = geometry.nside();
    let mut values = vec![0.0; geometry.len()];
    if terms.is_empty() {
        debug!("No baselines to image; the field is zero");
        return Ok(IntensityField { nside, values });
    }

    debug!(
        "Imaging {} baselines onto {} pixels (nside {nside}, {} trigonometry)",
        terms.len(),
        geometry.len(),
        T::NAME
    );
    let start = Stopwatch::start();
    let scale = match options.normalisation {
        Normalisation::BaselineCount => (terms.len() as f32).recip(),
        Normalisation::None => 1.0,
    };

    // No threads in the browser.
    #[cfg(target_arch = "wasm32")]
    image_chunked::<T>(&terms, geometry, scale, options.pixel_value, &mut values);
    #[cfg(not(target_arch = "wasm32"))]
    image_parallel::<T>(&terms, geometry, scale, options.pixel_value, &mut values);
    trace!("Reconstruction took {:?}", start.elapsed());

    let num_nan = values.iter().filter(|v| v.is_nan()).count();
    if num_nan > 0 {
        warn!("{num_nan} of {} pixels are NaN", values.len());
    }

    Ok(IntensityField { nside, values })
}

/// Validate the antenna selection and gather the baselines it allows.
fn select_baselines(
    sample: &VisibilitySample,
    antennas: &[[f64; 3]],
    used_antennas: &[usize],
) -> Result<Vec<BaselineTerm>, ConfigError> {
    let num_antennas = antennas.len();
    if let Some(&index) = used_antennas.iter().find(|&&a| a >= num_antennas) {
        return Err(ConfigError::AntennaOutOfRange {
            index,
            num_antennas,
        });
    }
    let used: BTreeSet<usize> = used_antennas.iter().copied().collect();
    if used.len() < 2 {
        return Err(ConfigError::TooFewAntennas { used: used.len() });
    }
    if let Some(index) = sample.max_antenna().filter(|&a| a >= num_antennas) {
        return Err(ConfigError::AntennaOutOfRange {
            index,
            num_antennas,
        });
    }

    let uvws = baseline_uvws(sample, antennas);
    let terms: Vec<BaselineTerm> = sample
        .iter()
        .zip(uvws)
        .filter(|((bl, _), _)| used.contains(&bl.i) && used.contains(&bl.j))
        .map(|((_, vis), Uvw { u, v, w })| BaselineTerm {
            u: (-TAU * u) as f32,
            v: (-TAU * v) as f32,
            w: (-TAU * w) as f32,
            vis,
        })
        .collect();
    trace!(
        "{} of {} baselines use the {} selected antennas",
        terms.len(),
        sample.len(),
        used.len()
    );
    Ok(terms)
}

#[inline(always)]
fn pixel_sum<T: Trig>(terms: &[BaselineTerm], l: f32, m: f32, n: f32) -> Complex32 {
    let n = n - 1.0;
    terms.iter().fold(Complex32::default(), |acc, t| {
        acc + t.vis * T::cexp(t.u * l + t.v * m + t.w * n)
    })
}

#[inline(always)]
fn finish(sum: Complex32, scale: f32, pixel_value: PixelValue) -> f32 {
    match pixel_value {
        PixelValue::Real => sum.re * scale,
        PixelValue::Amplitude => sum.norm() * scale,
    }
}

#[cfg_attr(target_arch = "wasm32", allow(dead_code))]
fn progress_bar(num_pixels: usize) -> ProgressBar {
    ProgressBar::with_draw_target(
        Some(num_pixels as u64),
        if PROGRESS_BARS.load() {
            ProgressDrawTarget::stdout()
        } else {
            ProgressDrawTarget::hidden()
        },
    )
    .with_style(
        ProgressStyle::default_bar()
            .template("{msg:18}: [{wide_bar:.blue}] {pos:2}/{len:2} pixels ({elapsed_precise}<{eta_precise})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    )
    .with_position(0)
    .with_message("Imaging")
}

/// Every pixel on the rayon pool. Each pixel writes only its own slot.
#[cfg_attr(target_arch = "wasm32", allow(dead_code))]
fn image_parallel<T: Trig>(
    terms: &[BaselineTerm],
    geometry: &PixelGeometry,
    scale: f32,
    pixel_value: PixelValue,
    values: &mut [f32],
) {
    let num_pixels = values.len();
    let pb = progress_bar(num_pixels);
    Zip::indexed(ArrayViewMut1::from(values))
        .and(&geometry.l)
        .and(&geometry.m)
        .and(&geometry.n)
        .par_for_each(|i, out, &l, &m, &n| {
            *out = finish(pixel_sum::<T>(terms, l, m, n), scale, pixel_value);
            if i % PROGRESS_STRIDE == 0 {
                pb.inc(PROGRESS_STRIDE.min(num_pixels - i) as u64);
            }
        });
    pb.finish_and_clear();
}

/// Single-threaded imaging, four pixels at a time. The lanes are independent
/// so the compiler can keep them in vector registers.
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
fn image_chunked<T: Trig>(
    terms: &[BaselineTerm],
    geometry: &PixelGeometry,
    scale: f32,
    pixel_value: PixelValue,
    values: &mut [f32],
) {
    const LANES: usize = 4;

    let (l, m, n) = (
        geometry.l.as_slice(),
        geometry.m.as_slice(),
        geometry.n.as_slice(),
    );
    let (Some(l), Some(m), Some(n)) = (l, m, n) else {
        // Non-contiguous geometry never happens in practice, but it can still
        // be imaged one pixel at a time.
        for (i, out) in values.iter_mut().enumerate() {
            let [pl, pm, pn] = geometry.direction(i);
            *out = finish(pixel_sum::<T>(terms, pl, pm, pn), scale, pixel_value);
        }
        return;
    };

    let mut out_chunks = values.chunks_exact_mut(LANES);
    let mut l_chunks = l.chunks_exact(LANES);
    let mut m_chunks = m.chunks_exact(LANES);
    let mut n_chunks = n.chunks_exact(LANES);
    for (((out, l), m), n) in (&mut out_chunks)
        .zip(&mut l_chunks)
        .zip(&mut m_chunks)
        .zip(&mut n_chunks)
    {
        let mut re = [0.0_f32; LANES];
        let mut im = [0.0_f32; LANES];
        for t in terms {
            for lane in 0..LANES {
                let phase = t.u * l[lane] + t.v * m[lane] + t.w * (n[lane] - 1.0);
                let (s, c) = T::sin_cos(phase);
                re[lane] += t.vis.re * c - t.vis.im * s;
                im[lane] += t.vis.re * s + t.vis.im * c;
            }
        }
        for lane in 0..LANES {
            out[lane] = finish(Complex32::new(re[lane], im[lane]), scale, pixel_value);
        }
    }

    for (((out, &l), &m), &n) in out_chunks
        .into_remainder()
        .iter_mut()
        .zip(l_chunks.remainder())
        .zip(m_chunks.remainder())
        .zip(n_chunks.remainder())
    {
        *out = finish(pixel_sum::<T>(terms, l, m, n), scale, pixel_value);
    }
}
