// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! HEALPix ring-scheme lookups in horizon coordinates.
//!
//! HEALPix latitude is elevation and its longitude runs opposite to azimuth,
//! so its north pole is the zenith.

use cdshealpix::ring;

use super::ElAz;
use crate::constants::TAU;

/// Number of pixels over the whole sphere.
#[inline]
pub(super) fn n_hash(nside: u32) -> u64 {
    ring::n_hash(nside)
}

/// Number of pixels whose centres lie strictly north of the equator: the
/// polar cap and the first `nside` equatorial rings. These are the first
/// indices in ring order.
#[inline]
pub(super) fn north_pixels(nside: u32) -> u64 {
    let ns = nside as u64;
    2 * ns * (ns - 1) + 4 * ns * ns
}

fn from_lon_lat((lon, lat): (f64, f64)) -> ElAz {
    ElAz {
        el: lat,
        az: (-lon).rem_euclid(TAU),
    }
}

pub(super) fn centre(nside: u32, pix: u64) -> ElAz {
    from_lon_lat(ring::center(nside, pix))
}

/// The four corners of a pixel, ordered north, west, south, east.
pub(super) fn corners(nside: u32, pix: u64) -> [ElAz; 4] {
    let [south, east, north, west] = ring::vertices(nside, pix).map(from_lon_lat);
    [north, west, south, east]
}

/// The pixel containing a direction. The elevation must be within ±π/2.
pub(super) fn pixel(nside: u32, dir: ElAz) -> u64 {
    ring::hash(nside, (-dir.az).rem_euclid(TAU), dir.el)
}
