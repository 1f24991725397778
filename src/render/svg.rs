// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! SVG serialisation of a [`SkyPlot`].

use std::fmt::{self, Display, Formatter, Write};

use super::{Colorbar, SkyPlot, SourceMarker, StatsBox, Timings};

const GRID_COLOUR: &str = "white";
const GRID_DASHES: &str = "50,100";
const SOURCE_COLOUR: &str = "red";

/// Escape text for use in SVG content or attribute values.
struct Escaped<'a>(&'a str);

impl Display for Escaped<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for c in self.0.chars() {
            match c {
                '&' => f.write_str("&amp;")?,
                '<' => f.write_str("&lt;")?,
                '>' => f.write_str("&gt;")?,
                '"' => f.write_str("&quot;")?,
                '\'' => f.write_str("&apos;")?,
                c => f.write_char(c)?,
            }
        }
        Ok(())
    }
}

struct Rgb([u8; 3]);

impl Display for Rgb {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "rgb({r},{g},{b})")
    }
}

impl Display for SkyPlot {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let w = self.coords.width;
        let line_width = self.coords.line_width;
        writeln!(f, r#"<?xml version="1.0" standalone="no"?>"#)?;
        writeln!(
            f,
            r#"<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd">"#
        )?;
        writeln!(
            f,
            r#"<svg width="12cm" height="12cm" viewBox="0 0 {w} {w}" version="1.1" xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">"#
        )?;
        if let Some(desc) = &self.description {
            writeln!(f, "<desc>{}</desc>", Escaped(desc))?;
        }
        if let Some(timings) = &self.timings {
            write_timings(f, timings)?;
        }

        writeln!(
            f,
            r#"<g stroke-opacity="1" stroke-linejoin="round" stroke-width="{line_width}">"#
        )?;
        for p in &self.polygons {
            let colour = Rgb(p.rgb);
            f.write_str(r#"<polygon points=""#)?;
            for (i, (x, y)) in p.points.iter().enumerate() {
                if i > 0 {
                    f.write_char(' ')?;
                }
                write!(f, "{x},{y}")?;
            }
            writeln!(f, r#"" fill="{colour}" stroke="{colour}" />"#)?;
        }
        writeln!(f, "</g>")?;

        for c in &self.grid_circles {
            writeln!(
                f,
                r#"<circle cx="{}" cy="{}" r="{}" stroke-linejoin="round" stroke="{GRID_COLOUR}" stroke-dasharray="{GRID_DASHES}" stroke-width="{line_width}" fill="none" />"#,
                c.cx, c.cy, c.r
            )?;
        }
        for l in &self.grid_lines {
            writeln!(
                f,
                r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{GRID_COLOUR}" stroke-width="{line_width}" stroke-dasharray="{GRID_DASHES}" stroke-linejoin="round" fill="none" />"#,
                l.x1, l.y1, l.x2, l.y2
            )?;
        }

        for s in &self.sources {
            write_source(f, s, line_width)?;
        }
        if let Some(stats_box) = &self.stats_box {
            write_stats_box(f, stats_box)?;
        }
        if let Some(colorbar) = &self.colorbar {
            write_colorbar(f, colorbar)?;
        }
        writeln!(f, "</svg>")
    }
}

fn write_timings(f: &mut Formatter<'_>, t: &Timings) -> fmt::Result {
    writeln!(f, "<!-- timings")?;
    for (stage, d) in [
        ("parse", t.parse),
        ("geometry", t.geometry),
        ("reconstruct", t.reconstruct),
        ("statistics", t.statistics),
        ("render", t.render),
        ("total", t.total()),
    ] {
        writeln!(f, "  {stage}: {:.3} ms", d.as_secs_f64() * 1e3)?;
    }
    writeln!(f, "-->")
}

fn write_source(f: &mut Formatter<'_>, s: &SourceMarker, line_width: u32) -> fmt::Result {
    writeln!(
        f,
        r#"<circle cx="{}" cy="{}" r="{}" fill="none" stroke="{SOURCE_COLOUR}" stroke-width="{line_width}" el="{}" az="{}" name="{}"/>"#,
        s.x,
        s.y,
        s.r,
        s.el_deg,
        s.az_deg,
        Escaped(&s.name)
    )
}

fn write_stats_box(f: &mut Formatter<'_>, b: &StatsBox) -> fmt::Result {
    let s = &b.stats;
    writeln!(
        f,
        r#"<g id="statistics" transform="translate({},{})">"#,
        b.x, b.y
    )?;
    writeln!(
        f,
        r#"<rect width="{}" height="{}" fill="rgba(0,0,0,0.8)" stroke="white" stroke-width="1" opacity="0.9" rx="5"/>"#,
        b.width, b.height
    )?;
    writeln!(
        f,
        r#"<text x="10" y="20" fill="white" font-family="monospace" font-size="12">"#
    )?;
    writeln!(f, r#"<tspan x="10" dy="0">Pixels: {}</tspan>"#, s.num_pixels)?;
    for (label, value) in [
        ("S/N", s.snr()),
        ("Min", s.min),
        ("Max", s.max),
        ("Mean", s.mean),
        ("StdDev", s.sdev),
        ("MAD", s.mad),
        ("Median", s.median),
    ] {
        writeln!(f, r#"<tspan x="10" dy="15">{label}: {value}</tspan>"#)?;
    }
    writeln!(f, "</text>\n</g>")
}

fn write_colorbar(f: &mut Formatter<'_>, c: &Colorbar) -> fmt::Result {
    writeln!(
        f,
        r#"<g id="colorbar" transform="translate({},{})">"#,
        c.x, c.y
    )?;
    writeln!(
        f,
        r#"<defs>
<linearGradient id="colorGradient" x1="0%" y1="100%" x2="0%" y2="0%">"#
    )?;
    for (offset, rgb) in &c.stops {
        writeln!(
            f,
            r#"<stop offset="{offset}%" stop-color="{}"/>"#,
            Rgb(*rgb)
        )?;
    }
    writeln!(f, "</linearGradient>\n</defs>")?;
    writeln!(
        f,
        r#"<rect width="{}" height="{}" fill="url(#colorGradient)" stroke="white" stroke-width="1"/>"#,
        c.width, c.height
    )?;
    for (y, value) in &c.labels {
        writeln!(
            f,
            r#"<text x="{}" y="{y}" fill="white" font-family="Arial, sans-serif" font-size="12" dominant-baseline="middle">{value}</text>"#,
            c.width + 5
        )?;
    }
    writeln!(
        f,
        r#"<text x="{}" y="-10" fill="white" font-family="Arial, sans-serif" font-size="12" text-anchor="middle">{}</text>"#,
        c.width / 2,
        Escaped(&c.title)
    )?;
    writeln!(f, "</g>")
}
