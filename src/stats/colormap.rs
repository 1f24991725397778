// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The cubehelix colour scheme (Green 2011), which brightens monotonically
//! from black to white.

use rayon::prelude::*;

use crate::constants::TAU;

const START: f32 = 1.0;
const ROTATIONS: f32 = -1.5;
const SATURATION: f32 = 1.5;

/// The colour of a normalised intensity, each channel in [0, 1].
pub fn cubehelix(fract: f32) -> [f32; 3] {
    let tau = TAU as f32;
    let angle = tau * (START / 3.0 + 1.0) + tau * ROTATIONS * fract;
    let (sin, cos) = angle.sin_cos();
    let amp = SATURATION * fract * (1.0 - fract) * 0.5;
    let (amp_cos, amp_sin) = (amp * cos, amp * sin);
    [
        (fract - 0.14861 * amp_cos + 1.78277 * amp_sin).clamp(0.0, 1.0),
        (fract - 0.29227 * amp_cos - 0.90649 * amp_sin).clamp(0.0, 1.0),
        (fract + 1.97294 * amp_cos).clamp(0.0, 1.0),
    ]
}

/// [`cubehelix`] quantised to bytes. NaN becomes black.
pub fn cubehelix_rgb(fract: f32) -> [u8; 3] {
    // `as` saturates, and sends NaN to 0.
    cubehelix(fract).map(|c| (c * 255.0).round() as u8)
}

/// Packed RGB triples for normalised intensities.
pub fn to_rgb_bytes(normalised: &[f32]) -> Vec<u8> {
    normalised
        .par_iter()
        .flat_map_iter(|&f| cubehelix_rgb(f))
        .collect()
}
