// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// An observation could not be understood. Visibilities are never imputed;
/// the whole observation is rejected.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Couldn't decode the observation JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("The observation has no visibility snapshots (\"data\" is empty)")]
    NoObservations,

    #[error("The observation has no antenna positions (\"ant_pos\" is empty)")]
    NoAntennas,

    #[error("Couldn't parse the timestamp '{value}' at data[0].data.timestamp: {source}")]
    Timestamp {
        value: String,
        source: chrono::ParseError,
    },

    #[error("Visibility data[0].data.data[{entry}] refers to baseline ({i}, {j}), but there are only {num_antennas} antennas")]
    BaselineAntennaOutOfRange {
        entry: usize,
        i: usize,
        j: usize,
        num_antennas: usize,
    },

    #[error("Visibility data[0].data.data[{entry}] correlates antenna {i} with itself")]
    SelfBaseline { entry: usize, i: usize },

    #[error("Visibility data[0].data.data[{entry}] repeats baseline ({i}, {j})")]
    DuplicateBaseline { entry: usize, i: usize, j: usize },

    #[error("gains.{field} has {got} values, but there are {expected} antennas")]
    GainsLength {
        field: &'static str,
        expected: usize,
        got: usize,
    },
}
