// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Parameters for a run of the binary, after the arguments were checked.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

use log::{debug, info};

use super::{
    common::{display_warnings, InfoPrinter, Warn},
    GridlessError,
};
use crate::{
    api::SkyImage,
    cache::{self, GeometryCache},
    constants::SOURCE_ELEVATION_LIMIT_DEG,
    imaging::{ImagingOptions, IntensityField},
    math::ActiveTrig,
    obs::Observation,
    render::{write_pixel_table, PlotOptions, Stopwatch},
    sky::{ElAz, Nside, PixelGeometry},
    stats::{ColorRange, FieldStatistics},
};

/// The timestamp format of default output file names.
const OUTPUT_TIME_FORMAT: &str = "%Y_%m_%d_%H_%M_%S";

#[derive(Debug)]
pub(super) struct GridlessParams {
    pub(super) input: PathBuf,
    pub(super) nside: Nside,
    pub(super) imaging: ImagingOptions,
    pub(super) range: ColorRange,
    pub(super) plot: PlotOptions,
    pub(super) cache: Option<GeometryCache>,
    pub(super) pixel_table: bool,
    pub(super) output: Option<PathBuf>,
}

impl GridlessParams {
    pub(super) fn run(self, dry_run: bool) -> Result<(), GridlessError> {
        let GridlessParams {
            input,
            nside,
            imaging,
            range,
            plot,
            cache,
            pixel_table,
            output,
        } = self;

        let start = Stopwatch::start();
        let json = std::fs::read_to_string(&input)?;
        let obs = Observation::from_json(&json)?;
        let parse_time = start.elapsed();
        print_observation(&obs);

        if plot.sources
            && !obs
                .sources
                .iter()
                .any(|s| s.el > SOURCE_ELEVATION_LIMIT_DEG)
        {
            format!("No catalogue sources are above {SOURCE_ELEVATION_LIMIT_DEG}°; none will be marked")
                .warn();
        }

        let output = output.unwrap_or_else(|| {
            let ext = if pixel_table { "txt" } else { "svg" };
            PathBuf::from(format!(
                "gridless_{}.{ext}",
                obs.timestamp.format(OUTPUT_TIME_FORMAT)
            ))
        });
        info!("Output: {}", output.display());
        display_warnings();

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        let start = Stopwatch::start();
        let geometry = cache::geometry(nside, cache.as_ref());
        let geometry_time = start.elapsed();
        debug!("Pixel geometry for nside {nside} ready in {geometry_time:?}");

        let mut image = SkyImage::new(&obs, &geometry, &imaging)?;
        image.timings.parse = parse_time;
        image.timings.geometry = geometry_time;
        print_statistics(&image.stats, &image.field, &geometry);

        let mut f = BufWriter::new(File::create(&output)?);
        if pixel_table {
            write_pixel_table(&image.field, &mut f)?;
        } else {
            let svg = image.plot(&obs, range, &plot);
            write!(f, "{svg}")?;
            f.flush()?;
        }
        info!(
            "Wrote {} in {:.3} s",
            output.display(),
            image.timings.total().as_secs_f64()
        );

        Ok(())
    }
}

fn print_observation(obs: &Observation) {
    let mut printer = InfoPrinter::new("Observation".into());
    let mut block = vec![format!("Taken at {}", obs.timestamp.to_rfc3339()).into()];
    if let Some(name) = &obs.telescope {
        block.push(format!("Telescope: {name}").into());
    }
    if let Some(loc) = &obs.location {
        block.push(
            format!(
                "Location: {:.4}° longitude, {:.4}° latitude, {:.1} m",
                loc.lon, loc.lat, loc.alt
            )
            .into(),
        );
    }
    printer.push_block(block);
    printer.push_block(vec![
        format!("{} antennas", obs.antennas.len()).into(),
        format!("{} baselines", obs.sample.len()).into(),
        format!("{} catalogue sources", obs.sources.len()).into(),
    ]);
    printer.display();
}

fn print_statistics(stats: &FieldStatistics, field: &IntensityField, geometry: &PixelGeometry) {
    let mut printer = InfoPrinter::new("Image statistics".into());
    printer.push_line(format!("{} pixels ({} NaN)", stats.num_pixels, stats.num_nan).into());
    printer.push_block(vec![
        format!("Min: {}", stats.min).into(),
        format!("Max: {}", stats.max).into(),
        format!("Mean: {}", stats.mean).into(),
        format!("StdDev: {}", stats.sdev).into(),
        format!("Median: {}", stats.median).into(),
        format!("MAD: {}", stats.mad).into(),
    ]);
    printer.push_block(vec![
        format!("S/N: {}", stats.snr()).into(),
        format!("R_mad: {}", stats.r_mad()).into(),
    ]);
    if let Some((index, value)) = field.peak() {
        let ElAz { el, az } = geometry.elaz::<ActiveTrig>(index);
        printer.push_line(
            format!(
                "Peak: {value} in pixel {index} (el {:.2}°, az {:.2}°)",
                el.to_degrees(),
                az.to_degrees()
            )
            .into(),
        );
    }
    printer.display();
}
