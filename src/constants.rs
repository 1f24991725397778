// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Useful constants.

Geometry is computed in double precision and only converted to single
precision when it is stored for the imaging kernel.
 */

pub use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

/// Speed of light \[metres/second\].
pub const VEL_C: f64 = 2.99793e8;

/// GPS L1 centre frequency \[Hz\]. All visibilities are assumed to have been
/// observed at this frequency.
pub const L1_FREQUENCY: f64 = 1.57542e9;

/// GPS L1 wavelength \[metres\].
pub const L1_WAVELENGTH: f64 = VEL_C / L1_FREQUENCY;

/// The largest nside accepted. A hemisphere at this resolution has ~400M
/// pixels.
pub const MAX_NSIDE: u32 = 8192;

/// Catalogue sources below this elevation are not drawn \[degrees\].
pub const SOURCE_ELEVATION_LIMIT_DEG: f64 = 20.0;

/// The angular radius of a drawn source marker \[degrees\].
pub const SOURCE_MARKER_RADIUS_DEG: f64 = 2.0;

/// Pixels whose highest corner is below this elevation are not drawn
/// \[radians\].
pub const MIN_DISPLAY_ELEVATION: f64 = 0.07;

/// The width and height of the plot frame, in plot units.
pub const DEFAULT_PLOT_WIDTH: i32 = 4000;
