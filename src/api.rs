// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! One-call entry points, taking observation JSON and returning documents or
//! plain arrays. These are what the browser bindings and the binary use.
//!
//! Pixel geometries are memoised per process (see [`crate::cache::geometry`]),
//! so repeated calls at the same nside only pay for reconstruction.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::trace;

use crate::{
    cache::{self, check_nside, decode, encode_binary},
    error::{ConfigError, ImagingError},
    imaging::{reconstruct, ImagingOptions, IntensityField},
    obs::Observation,
    render::{display_coords, PlotOptions, SkyPlot, Stopwatch, Timings},
    sky::{sky_pixels, Nside, PixelGeometry},
    stats::{normalise, to_rgb_bytes, ColorRange, FieldStatistics},
};

/// A reconstructed image of an observation and its statistics.
#[derive(Debug, Clone)]
pub struct SkyImage {
    pub field: IntensityField,
    pub stats: FieldStatistics,
    /// Only the reconstruction and statistics stages are filled in here;
    /// callers add their own.
    pub timings: Timings,
}

impl SkyImage {
    /// Image every antenna of `obs`.
    pub fn new(
        obs: &Observation,
        geometry: &PixelGeometry,
        options: &ImagingOptions,
    ) -> Result<SkyImage, ConfigError> {
        let mut timings = Timings::default();

        let start = Stopwatch::start();
        let field = reconstruct(
            &obs.sample,
            &obs.antennas,
            geometry,
            &obs.all_antennas(),
            options,
        )?;
        timings.reconstruct = start.elapsed();

        let start = Stopwatch::start();
        let stats = FieldStatistics::compute(field.values());
        timings.statistics = start.elapsed();
        trace!(
            "Reconstruction took {:?}, statistics took {:?}",
            timings.reconstruct,
            timings.statistics
        );

        Ok(SkyImage {
            field,
            stats,
            timings,
        })
    }

    /// Intensities scaled into [0, 1] by `range`.
    pub fn normalised(&self, range: ColorRange) -> Vec<f32> {
        normalise(self.field.values(), range.bounds(&self.stats))
    }

    /// Draw this image. The render stage is timed; timings are only attached
    /// to the plot if `options.timings` is set.
    pub fn plot(
        &mut self,
        obs: &Observation,
        range: ColorRange,
        options: &PlotOptions,
    ) -> SkyPlot {
        let start = Stopwatch::start();
        let plot = SkyPlot::assemble(
            &self.field,
            &self.stats,
            range.bounds(&self.stats),
            &obs.sources,
            options,
        )
        .with_description(describe(obs, self.field.nside()));
        self.timings.render = start.elapsed();
        if options.timings {
            plot.with_timings(self.timings)
        } else {
            plot
        }
    }
}

fn describe(obs: &Observation, nside: Nside) -> String {
    format!(
        "{} at {}, nside {nside}",
        obs.telescope.as_deref().unwrap_or("Gridless image"),
        obs.timestamp.to_rfc3339(),
    )
}

/// Get the geometry, parse, image and draw, timing each stage.
fn image_json<G>(
    json: &str,
    geometry: G,
    plot_options: &PlotOptions,
) -> Result<(String, DateTime<Utc>), ImagingError>
where
    G: FnOnce() -> Result<Arc<PixelGeometry>, ImagingError>,
{
    let start = Stopwatch::start();
    let geometry = geometry()?;
    let geometry_time = start.elapsed();

    let start = Stopwatch::start();
    let obs = Observation::from_json(json)?;
    let parse_time = start.elapsed();

    let mut image = SkyImage::new(&obs, &geometry, &ImagingOptions::default())?;
    image.timings.parse = parse_time;
    image.timings.geometry = geometry_time;
    let plot = image.plot(&obs, ColorRange::Auto, plot_options);
    Ok((plot.to_svg(), obs.timestamp))
}

fn memoised(nside: u32) -> Result<Arc<PixelGeometry>, ImagingError> {
    let nside = Nside::new(nside)?;
    Ok(cache::geometry(nside, None))
}

fn image_options(sources: bool, timings: bool) -> PlotOptions {
    PlotOptions {
        sources,
        colorbar: true,
        timings,
        ..Default::default()
    }
}

/// Image an observation as an SVG document, with a grid and colour bar and
/// optionally its catalogue sources. The observation's timestamp is returned
/// alongside.
pub fn image_from_observation(
    json: &str,
    nside: u32,
    include_sources: bool,
) -> Result<(String, DateTime<Utc>), ImagingError> {
    image_json(
        json,
        || memoised(nside),
        &image_options(include_sources, false),
    )
}

/// Like [`image_from_observation`], but can embed how long each stage took.
pub fn image_from_observation_ext(
    json: &str,
    nside: u32,
    include_timing: bool,
) -> Result<String, ImagingError> {
    image_json(
        json,
        || memoised(nside),
        &image_options(false, include_timing),
    )
    .map(|(svg, _)| svg)
}

/// Image an observation with a grid and a caller-chosen set of overlays. The
/// observation's timestamp is returned alongside.
pub fn image_with_features(
    json: &str,
    nside: u32,
    include_sources: bool,
    include_stats: bool,
    include_colorbar: bool,
) -> Result<(String, DateTime<Utc>), ImagingError> {
    let options = PlotOptions {
        sources: include_sources,
        stats: include_stats,
        colorbar: include_colorbar,
        ..Default::default()
    };
    image_json(json, || memoised(nside), &options)
}

/// Image an observation with a geometry previously exported by
/// [`generate_geometry_binary`], skipping pixelization. The geometry must be
/// for `nside`.
pub fn image_with_precomputed_geometry(
    json: &str,
    nside: u32,
    include_timing: bool,
    geometry: &[u8],
) -> Result<String, ImagingError> {
    let supplied = || -> Result<Arc<PixelGeometry>, ImagingError> {
        let nside = Nside::new(nside)?;
        Ok(Arc::new(check_nside(decode(geometry)?, nside)?))
    };
    image_json(json, supplied, &image_options(false, include_timing)).map(|(svg, _)| svg)
}

fn normalised_values(json: &str, nside: u32) -> Result<Vec<f32>, ImagingError> {
    let geometry = memoised(nside)?;
    let obs = Observation::from_json(json)?;
    let image = SkyImage::new(&obs, &geometry, &ImagingOptions::default())?;
    Ok(image.normalised(ColorRange::Auto))
}

/// Every pixel's intensity, scaled into [0, 1] over the image's range.
pub fn color_values_only(json: &str, nside: u32) -> Result<Vec<f32>, ImagingError> {
    normalised_values(json, nside)
}

/// Every pixel's colour as packed RGB bytes.
pub fn color_bytes_only(json: &str, nside: u32) -> Result<Vec<u8>, ImagingError> {
    normalised_values(json, nside).map(|v| to_rgb_bytes(&v))
}

/// The binary encoding of the pixel geometry for `nside`, for use with
/// [`image_with_precomputed_geometry`].
pub fn generate_geometry_binary(nside: u32) -> Result<Vec<u8>, ConfigError> {
    let nside = Nside::new(nside)?;
    Ok(encode_binary(&cache::geometry(nside, None)))
}

/// The four corners of every pixel as (elevation, azimuth) pairs \[degrees\].
pub fn pixel_corners(nside: u32) -> Result<Vec<f32>, ConfigError> {
    let nside = Nside::new(nside)?;
    Ok(sky_pixels(nside)
        .iter()
        .flat_map(|p| p.corners)
        .flat_map(|c| [c.el.to_degrees() as f32, c.az.to_degrees() as f32])
        .collect())
}

/// The four corners of every pixel in a default-sized plot frame.
pub fn pixel_display_coords(nside: u32) -> Result<Vec<i32>, ConfigError> {
    let nside = Nside::new(nside)?;
    Ok(display_coords(nside, PlotOptions::default().width))
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use serde_json::json;
    use serial_test::serial;

    use super::*;
    use crate::{cache::GeometryDecodeError, obs::ParseError};

    fn observation() -> String {
        let ants = [
            [0.0, 0.0, 0.0],
            [1.3, 0.4, 0.0],
            [-0.6, 1.1, 0.02],
            [0.9, -1.2, -0.01],
            [-1.4, -0.3, 0.0],
        ];
        let mut data = vec![];
        for i in 0..ants.len() {
            for j in i + 1..ants.len() {
                let phase = 0.7 * i as f64 - 0.3 * j as f64;
                data.push(json!({"i": i, "j": j, "re": phase.cos(), "im": phase.sin()}));
            }
        }
        json!({
            "info": {"info": {"name": "Test array"}},
            "ant_pos": ants,
            "data": [{
                "data": {"data": data, "timestamp": "2024-03-01T12:00:00Z"},
                "sources": [
                    {"name": "HIGH", "el": 70.0, "az": 120.0, "jy": 0.0, "r": 0.0},
                    {"name": "LOW", "el": 5.0, "az": 10.0, "jy": 0.0, "r": 0.0},
                ],
            }],
        })
        .to_string()
    }

    #[test]
    #[serial]
    fn test_image_from_observation() {
        let (svg, timestamp) = image_from_observation(&observation(), 4, true).unwrap();
        assert_eq!(timestamp.to_rfc3339(), "2024-03-01T12:00:00+00:00");
        assert!(svg.contains("<desc>Test array at 2024-03-01T12:00:00+00:00, nside 4</desc>"));
        assert!(svg.contains(r#"name="HIGH""#));
        assert!(!svg.contains(r#"name="LOW""#));
        assert!(svg.contains(r#"id="colorbar""#));
        assert!(!svg.contains("<!-- timings"));

        let (svg, _) = image_from_observation(&observation(), 4, false).unwrap();
        assert!(!svg.contains(r#"name="HIGH""#));
    }

    #[test]
    #[serial]
    fn test_image_with_features() {
        for (sources, stats, colorbar) in [
            (false, false, false),
            (true, true, false),
            (false, true, true),
            (true, false, true),
        ] {
            let (svg, timestamp) =
                image_with_features(&observation(), 4, sources, stats, colorbar).unwrap();
            assert_eq!(timestamp.to_rfc3339(), "2024-03-01T12:00:00+00:00");
            assert_eq!(svg.contains(r#"name="HIGH""#), sources);
            assert_eq!(svg.contains(r#"id="statistics""#), stats);
            assert_eq!(svg.contains(r#"id="colorbar""#), colorbar);
            assert!(svg.contains("stroke-dasharray"));
        }

        assert!(matches!(
            image_with_features(&observation(), 6, true, true, true),
            Err(ImagingError::Config(ConfigError::InvalidNside { nside: 6 }))
        ));
    }

    #[test]
    #[serial]
    fn test_timings_are_optional() {
        let svg = image_from_observation_ext(&observation(), 4, true).unwrap();
        assert!(svg.contains("<!-- timings"));
        assert!(svg.contains("total: "));
        let svg = image_from_observation_ext(&observation(), 4, false).unwrap();
        assert!(!svg.contains("<!-- timings"));
    }

    #[test]
    #[serial]
    fn test_precomputed_geometry_matches_fresh() {
        cache::clear_memo();
        let blob = generate_geometry_binary(8).unwrap();
        let from_blob = image_with_precomputed_geometry(&observation(), 8, false, &blob).unwrap();
        cache::clear_memo();
        let fresh = image_from_observation_ext(&observation(), 8, false).unwrap();
        assert_eq!(from_blob, fresh);
    }

    #[test]
    #[serial]
    fn test_precomputed_geometry_must_match_nside() {
        let blob = generate_geometry_binary(4).unwrap();
        let result = image_with_precomputed_geometry(&observation(), 8, false, &blob);
        assert!(matches!(
            result,
            Err(ImagingError::Geometry(GeometryDecodeError::NsideMismatch {
                found: 4,
                expected: 8
            }))
        ));

        let result = image_with_precomputed_geometry(&observation(), 4, false, &blob[..20]);
        assert!(matches!(result, Err(ImagingError::Geometry(_))));
    }

    #[test]
    #[serial]
    fn test_values_and_bytes_agree() {
        let values = color_values_only(&observation(), 8).unwrap();
        let bytes = color_bytes_only(&observation(), 8).unwrap();
        let nside = Nside::new(8).unwrap();
        assert_eq!(values.len(), nside.num_hemisphere_pixels());
        assert_eq!(bytes.len(), 3 * values.len());
        assert!(values.iter().all(|v| (0.0..=1.0).contains(v)));
        assert_abs_diff_eq!(values.iter().copied().fold(f32::MIN, f32::max), 1.0);
        assert_abs_diff_eq!(values.iter().copied().fold(f32::MAX, f32::min), 0.0);
        for (&v, rgb) in values.iter().zip(bytes.chunks_exact(3)) {
            for (c, &b) in crate::stats::cubehelix(v).iter().zip(rgb) {
                assert!((c * 255.0 - b as f32).abs() <= 1.0);
            }
        }
    }

    #[test]
    #[serial]
    fn test_invalid_nside_is_rejected_first() {
        for nside in [0, 3, 12, 16384] {
            assert!(matches!(
                image_from_observation("not json", nside, false),
                Err(ImagingError::Config(_))
            ));
            assert!(matches!(
                color_values_only("not json", nside),
                Err(ImagingError::Config(_))
            ));
            assert!(generate_geometry_binary(nside).is_err());
            assert!(pixel_corners(nside).is_err());
            assert!(pixel_display_coords(nside).is_err());
        }
        assert!(matches!(
            color_bytes_only("not json", 4),
            Err(ImagingError::Parse(ParseError::Json(_)))
        ));
    }

    #[test]
    fn test_pixel_corners() {
        let corners = pixel_corners(2).unwrap();
        assert_eq!(corners.len(), 20 * 4 * 2);
        // Pixel 0 touches the zenith.
        assert!(corners[..8].chunks_exact(2).any(|c| c[0] > 89.9));
        assert!(corners
            .chunks_exact(2)
            .all(|c| (-1e-4..=90.0001).contains(&c[0]) && (-1e-4..=360.0).contains(&c[1])));
        assert_eq!(pixel_display_coords(2).unwrap().len(), 20 * 4 * 2);
    }
}
