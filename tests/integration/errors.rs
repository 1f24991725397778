// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use serde_json::json;
use tempfile::TempDir;

use crate::{get_cmd_output, gridless, make_file_in_dir, observation_json};

#[test]
fn test_invalid_nside() {
    let dir = TempDir::new().unwrap();
    make_file_in_dir("data.json", dir.path(), &observation_json());

    for nside in ["0", "12", "16384"] {
        let cmd = gridless()
            .current_dir(dir.path())
            .args(["--nside", nside])
            .assert()
            .failure()
            .code(2);
        let stderr = String::from_utf8_lossy(&cmd.get_output().stderr).to_string();
        assert!(stderr.starts_with("Error: "), "{stderr}");
        assert!(stderr.contains("nside"), "{stderr}");
    }
    // Nothing was written.
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_missing_nside() {
    let dir = TempDir::new().unwrap();
    make_file_in_dir("data.json", dir.path(), &observation_json());

    let cmd = gridless().current_dir(dir.path()).ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("--nside"), "{stderr}");
}

#[test]
fn test_missing_input_file() {
    let dir = TempDir::new().unwrap();
    gridless()
        .current_dir(dir.path())
        .args(["--nside", "4"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_malformed_observations() {
    let dir = TempDir::new().unwrap();
    let bad_baseline = json!({
        "ant_pos": [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
        "data": [{
            "data": {
                "data": [{"i": 0, "j": 1, "re": 1.0, "im": 0.0}, {"i": 1, "j": 2, "re": 1.0, "im": 0.0}],
                "timestamp": "2023-07-04T05:06:07Z"
            },
        }],
    })
    .to_string();

    for (contents, expected) in [
        ("{ not json", "line 1"),
        (bad_baseline.as_str(), "data[0].data.data[1]"),
    ] {
        let input = make_file_in_dir("bad.json", dir.path(), contents);
        let cmd = gridless()
            .args([
                "--nside",
                "4",
                "--file",
                &format!("{}", input.display()),
            ])
            .assert()
            .failure()
            .code(1);
        let stderr = String::from_utf8_lossy(&cmd.get_output().stderr).to_string();
        assert!(stderr.contains(expected), "{stderr}");
    }
}
