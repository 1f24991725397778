// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The on-disk layout of an observation, as downloaded from a telescope.
//! Unknown fields are ignored.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub info: TelescopeInfo,

    pub ant_pos: Vec<AntennaPosition>,

    #[serde(default)]
    pub gains: Option<Gains>,

    pub data: Vec<Snapshot>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelescopeInfo {
    #[serde(default)]
    pub info: TelescopeDetail,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelescopeDetail {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub location: Option<Location>,
}

/// Where the array is. Degrees and metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lon: f64,
    pub lat: f64,
    #[serde(default)]
    pub alt: f64,
}

/// Antenna positions in metres (east, north, up). Either an object or a
/// three-element array.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AntennaPosition {
    Object { x: f64, y: f64, z: f64 },
    Array([f64; 3]),
}

impl AntennaPosition {
    pub fn xyz(self) -> [f64; 3] {
        match self {
            AntennaPosition::Object { x, y, z } => [x, y, z],
            AntennaPosition::Array(a) => a,
        }
    }
}

/// Per-antenna calibration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gains {
    pub gain: Vec<f32>,
    pub phase_offset: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub data: VisData,

    #[serde(default)]
    pub sources: Vec<CatalogueSource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisData {
    pub data: Vec<VisEntry>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VisEntry {
    pub i: usize,
    pub j: usize,
    pub re: f32,
    pub im: f32,
}

/// A known radio source (usually a satellite) in the field. Angles are in
/// degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogueSource {
    pub name: String,
    pub el: f64,
    pub az: f64,

    /// Flux density \[Jy\].
    #[serde(default)]
    pub jy: f64,

    /// Range \[metres\].
    #[serde(default)]
    pub r: f64,
}
