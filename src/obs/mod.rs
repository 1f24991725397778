// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Observations: antenna positions, calibrated visibilities and metadata.

mod dataset;
mod error;

pub use dataset::*;
pub use error::ParseError;

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use log::{debug, trace};
use num_complex::Complex32;

use crate::sky::ElAz;

/// An unordered pair of antenna indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Baseline {
    pub i: usize,
    pub j: usize,
}

impl Baseline {
    pub fn new(i: usize, j: usize) -> Baseline {
        Baseline { i, j }
    }

    /// The same pair with the smaller index first.
    fn canonical(self) -> (usize, usize) {
        (self.i.min(self.j), self.i.max(self.j))
    }

    pub fn uses(self, antenna: usize) -> bool {
        self.i == antenna || self.j == antenna
    }
}

/// One complex visibility per baseline. No baseline appears twice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisibilitySample {
    baselines: Vec<Baseline>,
    vis: Vec<Complex32>,
}

impl VisibilitySample {
    /// Build a sample, rejecting repeated baselines and autocorrelations.
    pub fn new<I>(entries: I) -> Result<VisibilitySample, ParseError>
    where
        I: IntoIterator<Item = (Baseline, Complex32)>,
    {
        let mut seen = HashSet::new();
        let mut baselines = vec![];
        let mut vis = vec![];
        for (entry, (bl, v)) in entries.into_iter().enumerate() {
            if bl.i == bl.j {
                return Err(ParseError::SelfBaseline { entry, i: bl.i });
            }
            if !seen.insert(bl.canonical()) {
                return Err(ParseError::DuplicateBaseline {
                    entry,
                    i: bl.i,
                    j: bl.j,
                });
            }
            baselines.push(bl);
            vis.push(v);
        }
        Ok(VisibilitySample { baselines, vis })
    }

    pub fn len(&self) -> usize {
        self.vis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vis.is_empty()
    }

    pub fn baselines(&self) -> &[Baseline] {
        &self.baselines
    }

    pub fn visibilities(&self) -> &[Complex32] {
        &self.vis
    }

    pub fn iter(&self) -> impl Iterator<Item = (Baseline, Complex32)> + '_ {
        self.baselines.iter().copied().zip(self.vis.iter().copied())
    }

    /// The largest antenna index referenced, if any.
    pub fn max_antenna(&self) -> Option<usize> {
        self.baselines.iter().map(|b| b.i.max(b.j)).max()
    }

    /// Multiply each visibility by g_i g_j exp(-i(φ_i - φ_j)).
    ///
    /// # Panics
    ///
    /// Panics if either slice doesn't cover every antenna in the sample.
    pub fn apply_gains(&mut self, gains: &[f32], phase_offsets: &[f32]) {
        for (bl, v) in self.baselines.iter().zip(self.vis.iter_mut()) {
            let phase = Complex32::new(0.0, -(phase_offsets[bl.i] - phase_offsets[bl.j])).exp();
            *v = *v * gains[bl.i] * gains[bl.j] * phase;
        }
    }
}

/// Everything needed to image one snapshot.
#[derive(Debug, Clone)]
pub struct Observation {
    /// Antenna positions (east, north, up) \[metres\].
    pub antennas: Vec<[f64; 3]>,

    /// Calibrated visibilities.
    pub sample: VisibilitySample,

    pub timestamp: DateTime<Utc>,

    /// Known sources above or below the horizon.
    pub sources: Vec<CatalogueSource>,

    pub location: Option<Location>,

    pub telescope: Option<String>,
}

impl Observation {
    pub fn from_json(json: &str) -> Result<Observation, ParseError> {
        let dataset: Dataset = serde_json::from_str(json)?;
        Observation::from_dataset(dataset)
    }

    /// Validate a dataset and apply its gains. Only the first snapshot is used.
    pub fn from_dataset(dataset: Dataset) -> Result<Observation, ParseError> {
        let Dataset {
            info,
            ant_pos,
            gains,
            data,
        } = dataset;

        let antennas: Vec<[f64; 3]> = ant_pos.into_iter().map(AntennaPosition::xyz).collect();
        if antennas.is_empty() {
            return Err(ParseError::NoAntennas);
        }
        let num_antennas = antennas.len();

        let Snapshot { data: vis, sources } =
            data.into_iter().next().ok_or(ParseError::NoObservations)?;

        let timestamp = DateTime::parse_from_rfc3339(&vis.timestamp)
            .map_err(|source| ParseError::Timestamp {
                value: vis.timestamp.clone(),
                source,
            })?
            .with_timezone(&Utc);

        for (entry, e) in vis.data.iter().enumerate() {
            if e.i >= num_antennas || e.j >= num_antennas {
                return Err(ParseError::BaselineAntennaOutOfRange {
                    entry,
                    i: e.i,
                    j: e.j,
                    num_antennas,
                });
            }
        }
        let mut sample = VisibilitySample::new(
            vis.data
                .iter()
                .map(|e| (Baseline::new(e.i, e.j), Complex32::new(e.re, e.im))),
        )?;

        match gains {
            Some(Gains { gain, phase_offset }) => {
                for (field, got) in [("gain", gain.len()), ("phase_offset", phase_offset.len())] {
                    if got < num_antennas {
                        return Err(ParseError::GainsLength {
                            field,
                            expected: num_antennas,
                            got,
                        });
                    }
                }
                trace!("Applying gains to {} visibilities", sample.len());
                sample.apply_gains(&gain, &phase_offset);
            }
            None => debug!("No gains in the observation; assuming unity"),
        }

        debug!(
            "Observation at {timestamp}: {num_antennas} antennas, {} baselines, {} sources",
            sample.len(),
            sources.len()
        );

        Ok(Observation {
            antennas,
            sample,
            timestamp,
            sources,
            location: info.info.location,
            telescope: info.info.name,
        })
    }

    /// Every antenna index.
    pub fn all_antennas(&self) -> Vec<usize> {
        (0..self.antennas.len()).collect()
    }
}

impl CatalogueSource {
    pub fn elaz(&self) -> ElAz {
        ElAz::from_degrees(self.el, self.az)
    }
}
