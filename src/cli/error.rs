// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all errors seen by users of the binary. This should be the
//! *only* error enum that the binary shows.

use thiserror::Error;

use super::args::GridlessArgsError;
use crate::{
    cache::GeometryDecodeError,
    error::{ConfigError, ImagingError},
    obs::ParseError,
};

/// The exit code for bad arguments, matching what clap uses.
const EXIT_INVALID_ARGUMENTS: i32 = 2;

#[derive(Error, Debug)]
pub enum GridlessError {
    /// The requested image cannot be made with these settings.
    #[error("{0}")]
    Config(String),

    /// The observation couldn't be understood.
    #[error("{0}\n\nThe input file should be an observation in TART JSON format")]
    Parse(String),

    /// A supplied pixel geometry couldn't be used.
    #[error("{0}")]
    Cache(String),

    /// An error related to argument files.
    #[error("{0}")]
    ArgFile(String),

    #[error("{0}")]
    FileNotFound(String),

    /// A generic error that can't be clarified further, e.g. IO errors.
    #[error("{0}")]
    Generic(String),
}

impl GridlessError {
    /// What the process should exit with.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::ArgFile(_) | Self::FileNotFound(_) => EXIT_INVALID_ARGUMENTS,
            Self::Parse(_) | Self::Cache(_) | Self::Generic(_) => 1,
        }
    }
}

// When changing the error propagation below, ensure `Self::from(e)` uses the
// correct `e`!

impl From<GridlessArgsError> for GridlessError {
    fn from(e: GridlessArgsError) -> Self {
        let s = e.to_string();
        match e {
            GridlessArgsError::NoNside
            | GridlessArgsError::ParseNormalisation(_)
            | GridlessArgsError::ParsePixelValue(_)
            | GridlessArgsError::IncompleteColorRange => Self::Config(s),
            GridlessArgsError::InputFileNotFound(_) => Self::FileNotFound(s),
            GridlessArgsError::Config(e) => Self::from(e),
        }
    }
}

impl From<ConfigError> for GridlessError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

impl From<ParseError> for GridlessError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e.to_string())
    }
}

impl From<GeometryDecodeError> for GridlessError {
    fn from(e: GeometryDecodeError) -> Self {
        Self::Cache(e.to_string())
    }
}

impl From<ImagingError> for GridlessError {
    fn from(e: ImagingError) -> Self {
        match e {
            ImagingError::Config(e) => Self::from(e),
            ImagingError::Parse(e) => Self::from(e),
            ImagingError::Geometry(e) => Self::from(e),
        }
    }
}

impl From<std::io::Error> for GridlessError {
    fn from(e: std::io::Error) -> Self {
        Self::Generic(e.to_string())
    }
}

impl From<toml::ser::Error> for GridlessError {
    fn from(e: toml::ser::Error) -> Self {
        Self::ArgFile(e.to_string())
    }
}
