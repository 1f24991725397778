// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Pixelization of the visible hemisphere.
//!
//! The sky is divided with the HEALPix ring scheme. The visible hemisphere is
//! every pixel whose centre is above the horizon; in ring ordering these are
//! the first `6 nside² - 2 nside` pixels, so a hemisphere pixel index is also
//! its HEALPix index. HEALPix's z axis points at the zenith and its longitude
//! runs opposite to azimuth.

mod healpix;

use std::fmt;

use log::debug;
use ndarray::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{FRAC_PI_2, MAX_NSIDE, TAU},
    error::ConfigError,
    math::Trig,
};

/// The HEALPix resolution parameter. Always a power of two no larger than
/// [`MAX_NSIDE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Nside(u32);

impl Nside {
    pub fn new(nside: u32) -> Result<Nside, ConfigError> {
        if nside == 0 || !nside.is_power_of_two() {
            return Err(ConfigError::InvalidNside { nside });
        }
        if nside > MAX_NSIDE {
            return Err(ConfigError::NsideTooLarge {
                nside,
                max: MAX_NSIDE,
            });
        }
        Ok(Nside(nside))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// The number of pixels covering the visible hemisphere.
    pub fn num_hemisphere_pixels(self) -> usize {
        healpix::north_pixels(self.0) as usize
    }

    /// The number of pixels covering the whole sphere.
    pub fn num_sphere_pixels(self) -> u64 {
        healpix::n_hash(self.0)
    }
}

impl TryFrom<u32> for Nside {
    type Error = ConfigError;

    fn try_from(nside: u32) -> Result<Self, Self::Error> {
        Nside::new(nside)
    }
}

impl From<Nside> for u32 {
    fn from(nside: Nside) -> u32 {
        nside.0
    }
}

impl fmt::Display for Nside {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A direction in horizon coordinates. Both values are in radians; azimuth is
/// measured from north through east.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ElAz {
    pub el: f64,
    pub az: f64,
}

/// Direction cosines. `l` points east, `m` north and `n` at the zenith.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Lmn {
    pub l: f64,
    pub m: f64,
    pub n: f64,
}

impl ElAz {
    pub fn new(el: f64, az: f64) -> ElAz {
        ElAz { el, az }
    }

    pub fn from_degrees(el_deg: f64, az_deg: f64) -> ElAz {
        ElAz {
            el: el_deg.to_radians(),
            az: az_deg.to_radians(),
        }
    }

    pub fn to_lmn(self) -> Lmn {
        let (s_el, c_el) = self.el.sin_cos();
        let (s_az, c_az) = self.az.sin_cos();
        Lmn {
            l: s_az * c_el,
            m: c_az * c_el,
            n: s_el,
        }
    }

    /// Orthographic projection onto the horizon plane as seen looking up:
    /// north is at -y and east at -x. The horizon maps to the unit circle.
    pub fn project(self) -> (f64, f64) {
        let lmn = self.to_lmn();
        (-lmn.l, -lmn.m)
    }
}

/// One cell of the hemisphere.
#[derive(Debug, Clone, PartialEq)]
pub struct SkyPixel {
    pub index: usize,
    pub centre: ElAz,
    /// Corners ordered north, west, south, east (HEALPix sense).
    pub corners: [ElAz; 4],
}

impl SkyPixel {
    pub fn new(nside: Nside, index: usize) -> SkyPixel {
        SkyPixel {
            index,
            centre: healpix::centre(nside.get(), index as u64),
            corners: healpix::corners(nside.get(), index as u64),
        }
    }

    /// The highest elevation of any corner \[radians\].
    pub fn max_corner_elevation(&self) -> f64 {
        self.corners
            .iter()
            .map(|c| c.el)
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

/// All pixels of the visible hemisphere, in index order.
pub fn sky_pixels(nside: Nside) -> Vec<SkyPixel> {
    (0..nside.num_hemisphere_pixels())
        .into_par_iter()
        .map(|i| SkyPixel::new(nside, i))
        .collect()
}

/// The hemisphere pixel containing a direction, or `None` if the direction is
/// not in the visible hemisphere.
pub fn pixel_for_direction(nside: Nside, dir: ElAz) -> Option<usize> {
    // Nothing below the horizon lies inside a hemisphere pixel.
    if !(0.0..=FRAC_PI_2).contains(&dir.el) {
        return None;
    }
    let pix = healpix::pixel(nside.get(), dir) as usize;
    (pix < nside.num_hemisphere_pixels()).then_some(pix)
}

/// The direction vectors of every hemisphere pixel at one resolution, stored
/// as separate single-precision arrays for the imaging kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelGeometry {
    nside: Nside,
    pub(crate) l: Array1<f32>,
    pub(crate) m: Array1<f32>,
    pub(crate) n: Array1<f32>,
}

impl PixelGeometry {
    /// Pixelize the hemisphere. The result depends only on `nside`.
    pub fn compute(nside: Nside) -> PixelGeometry {
        debug!(
            "Pixelizing the hemisphere at nside {nside} ({} pixels)",
            nside.num_hemisphere_pixels()
        );
        let lmns: Vec<[f32; 3]> = (0..nside.num_hemisphere_pixels())
            .into_par_iter()
            .map(|pix| {
                let Lmn { l, m, n } = healpix::centre(nside.get(), pix as u64).to_lmn();
                [l as f32, m as f32, n as f32]
            })
            .collect();

        PixelGeometry::from_directions(nside, lmns)
    }

    pub(crate) fn from_directions<I: IntoIterator<Item = [f32; 3]>>(
        nside: Nside,
        directions: I,
    ) -> PixelGeometry {
        let directions = directions.into_iter();
        let (lower, _) = directions.size_hint();
        let mut l = Vec::with_capacity(lower);
        let mut m = Vec::with_capacity(lower);
        let mut n = Vec::with_capacity(lower);
        for [dl, dm, dn] in directions {
            l.push(dl);
            m.push(dm);
            n.push(dn);
        }
        PixelGeometry {
            nside,
            l: Array1::from(l),
            m: Array1::from(m),
            n: Array1::from(n),
        }
    }

    pub fn nside(&self) -> Nside {
        self.nside
    }

    pub fn len(&self) -> usize {
        self.l.len()
    }

    pub fn is_empty(&self) -> bool {
        self.l.is_empty()
    }

    /// The (l, m, n) of a pixel.
    pub fn direction(&self, index: usize) -> [f32; 3] {
        [self.l[index], self.m[index], self.n[index]]
    }

    /// The horizon direction of a pixel, recovered from its direction
    /// cosines with the given trigonometry.
    pub fn elaz<T: Trig>(&self, index: usize) -> ElAz {
        let [l, m, n] = self.direction(index);
        let az = T::atan2(l, m) as f64;
        let el = T::atan2(n, l.hypot(m)) as f64;
        ElAz::new(el, az.rem_euclid(TAU))
    }

    pub fn directions(&self) -> impl Iterator<Item = [f32; 3]> + '_ {
        self.l
            .iter()
            .zip(self.m.iter())
            .zip(self.n.iter())
            .map(|((&l, &m), &n)| [l, m, n])
    }
}
