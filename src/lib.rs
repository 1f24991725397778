// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Gridless imaging of all-sky radio interferometer snapshots.

Visibilities are summed directly onto the pixels of a HEALPix partition of the
visible hemisphere, rather than being gridded and Fourier transformed. The
result can be drawn as SVG or handed back as plain arrays of colours.
 */

pub mod api;
pub mod cache;
pub mod cli;
pub mod constants;
mod error;
pub mod imaging;
pub mod math;
pub mod obs;
pub mod render;
pub mod sky;
pub mod stats;
#[cfg(feature = "wasm")]
pub mod wasm;

use crossbeam_utils::atomic::AtomicCell;

lazy_static::lazy_static! {
    /// Are progress bars being drawn? This should only ever be enabled by
    /// the binary.
    pub static ref PROGRESS_BARS: AtomicCell<bool> = AtomicCell::new(false);
}

// Re-exports.
pub use api::*;
pub use cli::{Gridless, GridlessError};
pub use error::{ConfigError, ImagingError};
pub use imaging::{reconstruct, ImagingOptions, IntensityField, Normalisation, PixelValue};
pub use obs::{Observation, ParseError};
pub use render::{PlotOptions, SkyPlot};
pub use sky::{Nside, PixelGeometry};
pub use stats::{ColorRange, FieldStatistics};
