// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

use crate::error::ConfigError;

/// Why an encoded pixel geometry could not be used.
#[derive(Error, Debug)]
pub enum GeometryDecodeError {
    #[error("Not a pixel geometry blob (bad magic bytes)")]
    BadMagic,

    #[error("Pixel geometry has format version {found}, but version {expected} is required")]
    Version { found: u16, expected: u16 },

    #[error("Pixel geometry has an invalid nside: {0}")]
    Nside(#[from] ConfigError),

    #[error("Pixel geometry is for nside {found}, but nside {expected} was requested")]
    NsideMismatch { found: u32, expected: u32 },

    #[error("Pixel geometry for nside {nside} should have {expected} pixels, but has {found}")]
    PixelCount {
        nside: u32,
        expected: usize,
        found: usize,
    },

    #[error("Pixel geometry has {0} unexpected trailing bytes")]
    TrailingBytes(usize),

    #[error("Pixel geometry is truncated or unreadable: {0}")]
    IO(#[from] std::io::Error),

    #[error("Pixel geometry JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),
}
