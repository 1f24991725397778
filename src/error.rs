// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors shared across the library.

use thiserror::Error;

use crate::{cache::GeometryDecodeError, obs::ParseError};

/// The caller asked for something that cannot be imaged. Nothing is produced
/// when this is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("nside {nside} is invalid; it must be a non-zero power of two")]
    InvalidNside { nside: u32 },

    #[error("nside {nside} is larger than the maximum supported ({max})")]
    NsideTooLarge { nside: u32, max: u32 },

    #[error("At least 2 antennas are needed to form a baseline, but only {used} were selected")]
    TooFewAntennas { used: usize },

    #[error("Antenna index {index} was selected, but there are only {num_antennas} antennas")]
    AntennaOutOfRange { index: usize, num_antennas: usize },

    #[error("Colour range minimum ({min}) must be less than its maximum ({max})")]
    InvalidColorRange { min: f32, max: f32 },
}

/// Everything that can go wrong when imaging through the boundary functions.
#[derive(Error, Debug)]
pub enum ImagingError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("The supplied pixel geometry could not be used: {0}")]
    Geometry(#[from] GeometryDecodeError),
}
