// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Things shared by the command-line interface: argument files and printers.

mod printers;

pub(crate) use printers::{display_warnings, InfoPrinter, Warn};

use itertools::Itertools;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::imaging::{Normalisation, PixelValue};

lazy_static::lazy_static! {
    pub(super) static ref ARG_FILE_TYPES_COMMA_SEPARATED: String = ArgFileTypes::iter().join(", ");

    pub(super) static ref ARG_FILE_HELP: String =
        format!("All arguments may be specified in a file. Any CLI arguments override arguments set in the file. Supported formats: {}", *ARG_FILE_TYPES_COMMA_SEPARATED);

    pub(super) static ref NORMALISATION_HELP: String =
        format!("How the sum over baselines is scaled. Supported: {}. Default: {}",
                Normalisation::iter().join(", "), Normalisation::default());

    pub(super) static ref PIXEL_VALUE_HELP: String =
        format!("Which part of each pixel's complex sum is imaged. Supported: {}. Default: {}",
                PixelValue::iter().join(", "), PixelValue::default());
}

#[derive(Debug, Display, EnumIter, EnumString)]
pub(super) enum ArgFileTypes {
    #[strum(serialize = "toml")]
    Toml,
    #[strum(serialize = "json")]
    Json,
}

/// Read an argument file into the argument struct the caller expects. The
/// file's type comes from its extension.
macro_rules! unpack_arg_file {
    ($arg_file:expr) => ({
        use std::{fs::File, io::Read, str::FromStr};

        use crate::cli::common::{ArgFileTypes, ARG_FILE_TYPES_COMMA_SEPARATED};

        debug!("Attempting to parse argument file {}", $arg_file.display());

        let mut contents = String::new();
        let arg_file_type = $arg_file
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .and_then(|e| ArgFileTypes::from_str(&e).ok());

        match arg_file_type {
            Some(ArgFileTypes::Toml) => {
                debug!("Parsing toml file...");
                let mut fh = File::open(&$arg_file)?;
                fh.read_to_string(&mut contents)?;
                match toml::from_str(&contents) {
                    Ok(p) => p,
                    Err(err) => {
                        return Err(GridlessError::ArgFile(format!(
                            "Couldn't decode toml structure from {}:\n{err}",
                            $arg_file.display()
                        )))
                    }
                }
            }
            Some(ArgFileTypes::Json) => {
                debug!("Parsing json file...");
                let mut fh = File::open(&$arg_file)?;
                fh.read_to_string(&mut contents)?;
                match serde_json::from_str(&contents) {
                    Ok(p) => p,
                    Err(err) => {
                        return Err(GridlessError::ArgFile(format!(
                            "Couldn't decode json structure from {}:\n{err}",
                            $arg_file.display()
                        )))
                    }
                }
            }

            _ => {
                return Err(GridlessError::ArgFile(format!(
                    "Argument file '{}' doesn't have a recognised file extension! Valid extensions are: {}",
                    $arg_file.display(),
                    *ARG_FILE_TYPES_COMMA_SEPARATED
                )))
            }
        }
    });
}
