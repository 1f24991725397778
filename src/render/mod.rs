// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Turning an intensity field into something to look at.
//!
//! [`SkyPlot`] holds everything needed to draw the hemisphere: coloured pixel
//! polygons, the coordinate grid, source markers, a statistics box and a
//! colour bar, all in one square plot frame. Its [`Display`](std::fmt::Display)
//! implementation writes SVG.

mod svg;

use std::{io::Write, time::Duration};

use log::{debug, trace};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{
        DEFAULT_PLOT_WIDTH, MIN_DISPLAY_ELEVATION, SOURCE_ELEVATION_LIMIT_DEG,
        SOURCE_MARKER_RADIUS_DEG,
    },
    imaging::IntensityField,
    obs::CatalogueSource,
    sky::{pixel_for_direction, sky_pixels, ElAz, Nside, SkyPixel},
    stats::{cubehelix_rgb, normalise, FieldStatistics},
};

/// Zenith distances of the grid's circles \[degrees\].
const GRID_CIRCLES_DEG: [f64; 4] = [10.0, 30.0, 60.0, 90.0];

/// Spacing of the grid's azimuth spokes \[degrees\].
const GRID_SPOKE_STEP_DEG: usize = 30;

const NUM_GRADIENT_STOPS: usize = 11;
const NUM_COLORBAR_LABELS: usize = 6;

/// What to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotOptions {
    pub grid: bool,
    pub sources: bool,
    pub stats: bool,
    pub colorbar: bool,
    /// Embed stage timings when they are available.
    pub timings: bool,
    /// The width and height of the plot frame.
    pub width: i32,
}

impl Default for PlotOptions {
    fn default() -> Self {
        PlotOptions {
            grid: true,
            sources: false,
            stats: false,
            colorbar: false,
            timings: false,
            width: DEFAULT_PLOT_WIDTH,
        }
    }
}

/// Maps projected sky coordinates into the plot frame. The horizon is a
/// circle slightly smaller than the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotCoords {
    pub width: i32,
    pub centre: i32,
    pub scale: f64,
    pub line_width: u32,
}

impl PlotCoords {
    pub fn new(width: i32) -> PlotCoords {
        PlotCoords {
            width,
            centre: (width as f64 / 2.0).round() as i32,
            scale: width as f64 / 2.1,
            line_width: (width / 400).max(1) as u32,
        }
    }

    pub fn xy(&self, x: f64, y: f64) -> (i32, i32) {
        (
            (x * self.scale).round() as i32 + self.centre,
            (y * self.scale).round() as i32 + self.centre,
        )
    }

    pub fn elaz(&self, dir: ElAz) -> (i32, i32) {
        let (x, y) = dir.project();
        self.xy(x, y)
    }

    /// A length in units of the horizon radius.
    pub fn length(&self, d: f64) -> u32 {
        (d * self.scale).round() as u32
    }

    /// The corners of a pixel.
    pub fn polygon(&self, pixel: &SkyPixel) -> [(i32, i32); 4] {
        pixel.corners.map(|c| self.elaz(c))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PixelPolygon {
    pub index: usize,
    pub points: [(i32, i32); 4],
    pub rgb: [u8; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCircle {
    pub cx: i32,
    pub cy: i32,
    pub r: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLine {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceMarker {
    pub name: String,
    pub el_deg: f64,
    pub az_deg: f64,
    pub x: i32,
    pub y: i32,
    pub r: u32,
    /// The hemisphere pixel containing the source.
    pub pixel: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub stats: FieldStatistics,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Colorbar {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Offsets \[percent\] and colours.
    pub stops: Vec<(f32, [u8; 3])>,
    /// Vertical positions within the bar and the intensities there.
    pub labels: Vec<(f32, f32)>,
    pub title: String,
}

/// How long each stage of making an image took.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Timings {
    pub parse: Duration,
    pub geometry: Duration,
    pub reconstruct: Duration,
    pub statistics: Duration,
    pub render: Duration,
}

impl Timings {
    pub fn total(&self) -> Duration {
        self.parse + self.geometry + self.reconstruct + self.statistics + self.render
    }
}

/// Measures how long a stage takes. There is no clock in the browser without
/// calling into JavaScript, so there every stage takes no time.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    #[cfg(not(target_arch = "wasm32"))]
    start: std::time::Instant,
}

impl Stopwatch {
    pub fn start() -> Stopwatch {
        Stopwatch {
            #[cfg(not(target_arch = "wasm32"))]
            start: std::time::Instant::now(),
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    #[cfg(target_arch = "wasm32")]
    pub fn elapsed(&self) -> Duration {
        Duration::ZERO
    }
}

/// Everything drawn on an image of the hemisphere. All coordinates are in the
/// same plot frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SkyPlot {
    pub coords: PlotCoords,
    pub description: Option<String>,
    pub polygons: Vec<PixelPolygon>,
    pub grid_circles: Vec<GridCircle>,
    pub grid_lines: Vec<GridLine>,
    pub sources: Vec<SourceMarker>,
    pub stats_box: Option<StatsBox>,
    pub colorbar: Option<Colorbar>,
    pub timings: Option<Timings>,
}

impl SkyPlot {
    /// Assemble a plot of `field`. `range` is the intensity at either end of
    /// the colour scale. Pixels too close to the horizon are left out.
    pub fn assemble(
        field: &IntensityField,
        stats: &FieldStatistics,
        range: (f32, f32),
        sources: &[CatalogueSource],
        options: &PlotOptions,
    ) -> SkyPlot {
        let coords = PlotCoords::new(options.width);
        let nside = field.nside();
        let normalised = normalise(field.values(), range);

        let polygons: Vec<PixelPolygon> = sky_pixels(nside)
            .into_par_iter()
            .zip(normalised.par_iter())
            .filter(|(pixel, _)| pixel.max_corner_elevation() > MIN_DISPLAY_ELEVATION)
            .map(|(pixel, &f)| PixelPolygon {
                index: pixel.index,
                points: coords.polygon(&pixel),
                rgb: cubehelix_rgb(f),
            })
            .collect();
        trace!(
            "{} of {} pixels are high enough to draw",
            polygons.len(),
            field.len()
        );

        let (grid_circles, grid_lines) = if options.grid {
            (grid_circles(&coords), grid_lines(&coords))
        } else {
            (vec![], vec![])
        };

        let sources = if options.sources {
            source_markers(&coords, nside, sources)
        } else {
            vec![]
        };

        let stats_box = options.stats.then_some(StatsBox {
            x: 50,
            y: 50,
            width: 200,
            height: 140,
            stats: *stats,
        });

        let colorbar = options.colorbar.then(|| colorbar_for(&coords, range));

        SkyPlot {
            coords,
            description: None,
            polygons,
            grid_circles,
            grid_lines,
            sources,
            stats_box,
            colorbar,
            timings: None,
        }
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> SkyPlot {
        self.description = Some(description.into());
        self
    }

    pub fn with_timings(mut self, timings: Timings) -> SkyPlot {
        self.timings = Some(timings);
        self
    }

    /// The plot as an SVG document.
    pub fn to_svg(&self) -> String {
        self.to_string()
    }
}

fn grid_circles(coords: &PlotCoords) -> Vec<GridCircle> {
    GRID_CIRCLES_DEG
        .iter()
        .map(|zd| GridCircle {
            cx: coords.centre,
            cy: coords.centre,
            r: coords.length(zd.to_radians().sin()),
        })
        .collect()
}

/// Spokes from 10° zenith distance out to the horizon.
fn grid_lines(coords: &PlotCoords) -> Vec<GridLine> {
    let inner_el = (90.0 - GRID_CIRCLES_DEG[0]).to_radians();
    (0..360)
        .step_by(GRID_SPOKE_STEP_DEG)
        .map(|az| {
            let az = (az as f64).to_radians();
            let (x1, y1) = coords.elaz(ElAz::new(inner_el, az));
            let (x2, y2) = coords.elaz(ElAz::new(0.0, az));
            GridLine { x1, y1, x2, y2 }
        })
        .collect()
}

fn source_markers(
    coords: &PlotCoords,
    nside: Nside,
    sources: &[CatalogueSource],
) -> Vec<SourceMarker> {
    let r = coords.length(SOURCE_MARKER_RADIUS_DEG.to_radians());
    sources
        .iter()
        .filter(|s| {
            let visible = s.el > SOURCE_ELEVATION_LIMIT_DEG;
            if !visible {
                debug!("Not drawing {} at elevation {}°", s.name, s.el);
            }
            visible
        })
        .map(|s| {
            let dir = s.elaz();
            let (x, y) = coords.elaz(dir);
            SourceMarker {
                name: s.name.clone(),
                el_deg: s.el,
                az_deg: s.az,
                x,
                y,
                r,
                pixel: pixel_for_direction(nside, dir),
            }
        })
        .collect()
}

fn colorbar_for(coords: &PlotCoords, (min, max): (f32, f32)) -> Colorbar {
    let frame = coords.width as f32;
    let width = (frame * 0.03) as i32;
    let height = (frame * 0.9) as i32;
    let stops = (0..NUM_GRADIENT_STOPS)
        .map(|i| {
            let f = i as f32 / (NUM_GRADIENT_STOPS - 1) as f32;
            (f * 100.0, cubehelix_rgb(f))
        })
        .collect();
    let labels = (0..NUM_COLORBAR_LABELS)
        .map(|i| {
            let f = i as f32 / (NUM_COLORBAR_LABELS - 1) as f32;
            (height as f32 * (1.0 - f), min + f * (max - min))
        })
        .collect();
    Colorbar {
        x: coords.width - width - 50,
        y: (frame * 0.05) as i32,
        width,
        height,
        stops,
        labels,
        title: "Intensity".to_string(),
    }
}

/// The corners of every hemisphere pixel in the plot frame, flattened to
/// x0, y0, x1, y1, ... with four corners per pixel.
pub fn display_coords(nside: Nside, width: i32) -> Vec<i32> {
    let coords = PlotCoords::new(width);
    sky_pixels(nside)
        .par_iter()
        .flat_map_iter(|p| coords.polygon(p).into_iter().flat_map(|(x, y)| [x, y]))
        .collect()
}

/// Write one line per pixel: index, elevation and azimuth \[degrees\], l, m,
/// n and intensity.
pub fn write_pixel_table<W: Write>(field: &IntensityField, mut w: W) -> std::io::Result<()> {
    writeln!(w, "# index el_deg az_deg l m n intensity")?;
    for (pixel, value) in sky_pixels(field.nside()).iter().zip(field.values()) {
        let ElAz { el, az } = pixel.centre;
        let lmn = pixel.centre.to_lmn();
        writeln!(
            w,
            "{} {:.6} {:.6} {:.8} {:.8} {:.8} {}",
            pixel.index,
            el.to_degrees(),
            az.to_degrees(),
            lmn.l,
            lmn.m,
            lmn.n,
            value
        )?;
    }
    w.flush()
}
