// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! User arguments, before and after they're made sense of.

use std::{path::PathBuf, str::FromStr};

use clap::Args;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    common::{InfoPrinter, Warn, ARG_FILE_HELP, NORMALISATION_HELP, PIXEL_VALUE_HELP},
    params::GridlessParams,
    GridlessError,
};
use crate::{
    cache::{GeometryCache, GeometryEncoding},
    error::ConfigError,
    imaging::{ImagingOptions, Normalisation, PixelValue},
    render::PlotOptions,
    sky::Nside,
    stats::ColorRange,
};

pub(super) const DEFAULT_INPUT: &str = "data.json";

/// All booleans must have `#[serde(default)]` annotated, and anything that
/// isn't a boolean must be optional. This allows all arguments to be optional
/// *and* usable in an arguments file.
#[derive(Args, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridlessArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    #[serde(skip)]
    pub args_file: Option<PathBuf>,

    /// The HEALPix resolution of the image. Must be a power of two. The
    /// hemisphere has 6 nside² - 2 nside pixels.
    #[clap(short, long, help_heading = "IMAGING")]
    pub nside: Option<u32>,

    /// The observation to image (TART JSON). Default: data.json
    #[clap(short, long, parse(from_os_str), help_heading = "INPUT FILES")]
    pub file: Option<PathBuf>,

    #[clap(long, help = NORMALISATION_HELP.as_str(), help_heading = "IMAGING")]
    pub normalisation: Option<String>,

    #[clap(long, help = PIXEL_VALUE_HELP.as_str(), help_heading = "IMAGING")]
    pub pixel_value: Option<String>,

    /// A directory to keep pixel geometries in between runs.
    #[clap(long, parse(from_os_str), help_heading = "IMAGING")]
    pub cache_dir: Option<PathBuf>,

    /// The intensity at the bottom of the colour scale. Must be used with
    /// --max-value. Default: the image minimum.
    #[clap(long, allow_hyphen_values = true, help_heading = "PLOTTING")]
    pub min_value: Option<f32>,

    /// The intensity at the top of the colour scale. Must be used with
    /// --min-value. Default: the image maximum.
    #[clap(long, allow_hyphen_values = true, help_heading = "PLOTTING")]
    pub max_value: Option<f32>,

    /// Mark the catalogue sources of the observation.
    #[clap(long, help_heading = "PLOTTING")]
    #[serde(default)]
    pub sources: bool,

    /// Draw a box of image statistics.
    #[clap(long, help_heading = "PLOTTING")]
    #[serde(default)]
    pub stats: bool,

    /// Draw a colour bar.
    #[clap(long, help_heading = "PLOTTING")]
    #[serde(default)]
    pub colorbar: bool,

    /// Don't draw the elevation and azimuth grid.
    #[clap(long, help_heading = "PLOTTING")]
    #[serde(default)]
    pub no_grid: bool,

    /// Embed how long each stage took in the image.
    #[clap(long, help_heading = "PLOTTING")]
    #[serde(default)]
    pub timings: bool,

    /// Instead of an image, write a table of every pixel's direction and
    /// intensity.
    #[clap(long, help_heading = "OUTPUT FILES")]
    #[serde(default)]
    pub pixels: bool,

    /// Where to write the output. Default: gridless_<observation time>.svg
    /// (or .txt with --pixels).
    #[clap(short, long, parse(from_os_str), help_heading = "OUTPUT FILES")]
    pub output: Option<PathBuf>,
}

#[derive(Error, Debug)]
pub(super) enum GridlessArgsError {
    #[error("No nside was specified; use --nside")]
    NoNside,

    #[error("Input file '{}' does not exist", .0.display())]
    InputFileNotFound(PathBuf),

    #[error("Couldn't parse normalisation '{0}'")]
    ParseNormalisation(String),

    #[error("Couldn't parse pixel value '{0}'")]
    ParsePixelValue(String),

    #[error("--min-value and --max-value must be given together")]
    IncompleteColorRange,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl GridlessArgs {
    /// Both command-line and file arguments overlap in terms of what is
    /// available; this function consolidates everything that was specified
    /// into a single struct, preferring CLI arguments.
    ///
    /// This function should only ever merge arguments, and not try to make
    /// sense of them.
    pub(super) fn merge(self) -> Result<GridlessArgs, GridlessError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            // Ensure all of the file args are accounted for by pattern
            // matching.
            let GridlessArgs {
                args_file: _,
                nside,
                file,
                normalisation,
                pixel_value,
                cache_dir,
                min_value,
                max_value,
                sources,
                stats,
                colorbar,
                no_grid,
                timings,
                pixels,
                output,
            } = unpack_arg_file!(arg_file);

            Ok(GridlessArgs {
                args_file: None,
                nside: cli_args.nside.or(nside),
                file: cli_args.file.or(file),
                normalisation: cli_args.normalisation.or(normalisation),
                pixel_value: cli_args.pixel_value.or(pixel_value),
                cache_dir: cli_args.cache_dir.or(cache_dir),
                min_value: cli_args.min_value.or(min_value),
                max_value: cli_args.max_value.or(max_value),
                sources: cli_args.sources || sources,
                stats: cli_args.stats || stats,
                colorbar: cli_args.colorbar || colorbar,
                no_grid: cli_args.no_grid || no_grid,
                timings: cli_args.timings || timings,
                pixels: cli_args.pixels || pixels,
                output: cli_args.output.or(output),
            })
        } else {
            Ok(cli_args)
        }
    }

    /// Check the arguments and turn them into parameters.
    pub(super) fn parse(self) -> Result<GridlessParams, GridlessError> {
        trace!("{:#?}", self);

        let GridlessArgs {
            args_file: _,
            nside,
            file,
            normalisation,
            pixel_value,
            cache_dir,
            min_value,
            max_value,
            sources,
            stats,
            colorbar,
            no_grid,
            timings,
            pixels,
            output,
        } = self;

        let nside = Nside::new(nside.ok_or(GridlessArgsError::NoNside)?)?;
        let input = file.unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT));
        if !input.is_file() {
            return Err(GridlessArgsError::InputFileNotFound(input).into());
        }

        let normalisation = match normalisation {
            None => Normalisation::default(),
            Some(s) => Normalisation::from_str(&s.to_lowercase())
                .map_err(|_| GridlessArgsError::ParseNormalisation(s))?,
        };
        let pixel_value = match pixel_value {
            None => PixelValue::default(),
            Some(s) => PixelValue::from_str(&s.to_lowercase())
                .map_err(|_| GridlessArgsError::ParsePixelValue(s))?,
        };
        let range = match (min_value, max_value) {
            (None, None) => ColorRange::Auto,
            (Some(min), Some(max)) => ColorRange::fixed(min, max)?,
            _ => return Err(GridlessArgsError::IncompleteColorRange.into()),
        };

        if pixels && (sources || stats || colorbar || timings || no_grid) {
            "Plotting options are ignored when writing a pixel table".warn();
        }
        if pixels && range != ColorRange::Auto {
            "The colour range is ignored when writing a pixel table".warn();
        }

        let mut printer = InfoPrinter::new("Imaging set up".into());
        printer.push_line(format!("Input: {}", input.display()).into());
        printer.push_block(vec![
            format!(
                "nside {nside} ({} pixels above the horizon)",
                nside.num_hemisphere_pixels()
            )
            .into(),
            format!("Normalisation: {normalisation}").into(),
            format!("Pixel value: {pixel_value}").into(),
        ]);
        if let Some(dir) = &cache_dir {
            printer.push_line(format!("Geometry cache: {}", dir.display()).into());
        }
        printer.display();

        Ok(GridlessParams {
            input,
            nside,
            imaging: ImagingOptions {
                normalisation,
                pixel_value,
            },
            range,
            plot: PlotOptions {
                grid: !no_grid,
                sources,
                stats,
                colorbar,
                timings,
                ..Default::default()
            },
            cache: cache_dir.map(|d| GeometryCache::new(d, GeometryEncoding::Binary)),
            pixel_table: pixels,
            output,
        })
    }
}
