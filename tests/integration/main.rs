// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Integration tests.
//!
//! Some help for laying out these tests was taken from:
//! https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html

mod errors;
mod images;

use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
    process::Output,
    str::from_utf8,
};

use assert_cmd::{output::OutputError, Command};
use serde_json::json;

fn gridless() -> Command {
    Command::cargo_bin("gridless").unwrap()
}

fn get_cmd_output(result: Result<Output, OutputError>) -> (String, String) {
    let output = match result {
        Ok(o) => o,
        Err(o) => o.as_output().unwrap().clone(),
    };
    (
        from_utf8(&output.stdout).unwrap().to_string(),
        from_utf8(&output.stderr).unwrap().to_string(),
    )
}

fn make_file_in_dir<T: AsRef<Path>, U: AsRef<Path>>(
    filename: T,
    dir: U,
    contents: &str,
) -> PathBuf {
    let path = dir.as_ref().join(filename);
    let mut f = File::create(&path).expect("couldn't make file");
    f.write_all(contents.as_bytes()).unwrap();
    path
}

/// A small observation: six antennas, all 15 baselines, one source high in
/// the sky and one below the marker cutoff.
fn observation_json() -> String {
    let ants = [
        [0.0, 0.0, 0.0],
        [1.5, 0.2, 0.0],
        [-0.4, 1.3, 0.0],
        [0.8, -1.1, 0.01],
        [-1.2, -0.6, 0.0],
        [0.3, 2.0, -0.01],
    ];
    let mut data = vec![];
    for i in 0..ants.len() {
        for j in i + 1..ants.len() {
            let phase = 0.5 * i as f64 - 0.8 * j as f64;
            data.push(json!({"i": i, "j": j, "re": phase.cos(), "im": phase.sin()}));
        }
    }
    json!({
        "info": {"info": {"name": "Test array", "location": {"lon": 170.5, "lat": -45.9, "alt": 46.5}}},
        "ant_pos": ants,
        "gains": {"gain": [1.0, 1.0, 1.0, 1.0, 1.0, 1.0], "phase_offset": [0.0, 0.0, 0.0, 0.0, 0.0, 0.0]},
        "data": [{
            "data": {"data": data, "timestamp": "2023-07-04T05:06:07.123Z"},
            "sources": [
                {"name": "GPS BIIF-3", "el": 55.0, "az": 200.0, "jy": 0.0, "r": 2.0e7},
                {"name": "QZS-1", "el": 12.0, "az": 330.0, "jy": 0.0, "r": 3.8e7},
            ],
        }],
    })
    .to_string()
}
