// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use indoc::formatdoc;
use tempfile::TempDir;

use crate::{get_cmd_output, gridless, make_file_in_dir, observation_json};

#[test]
fn test_svg_with_everything() {
    let dir = TempDir::new().unwrap();
    let input = make_file_in_dir("data.json", dir.path(), &observation_json());
    let output = dir.path().join("sky.svg");

    let cmd = gridless()
        .args([
            "--nside",
            "8",
            "--file",
            &format!("{}", input.display()),
            "--sources",
            "--stats",
            "--colorbar",
            "--no-progress-bars",
            "-o",
            &format!("{}", output.display()),
        ])
        .ok();
    assert!(cmd.is_ok(), "gridless failed on a simple observation: {:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("Image statistics"));
    assert!(stdout.contains("Peak: "));

    let svg = std::fs::read_to_string(&output).unwrap();
    assert!(svg.starts_with("<?xml"));
    assert!(svg.contains("<desc>Test array at 2023-07-04T05:06:07.123+00:00, nside 8</desc>"));
    assert!(svg.contains(r#"name="GPS BIIF-3""#));
    assert!(!svg.contains(r#"name="QZS-1""#));
    assert!(svg.contains(r#"id="statistics""#));
    assert!(svg.contains(r#"id="colorbar""#));
    assert!(svg.contains("stroke-dasharray"));
    assert!(svg.matches("<polygon ").count() > 100);
}

#[test]
fn test_default_file_and_output_names() {
    let dir = TempDir::new().unwrap();
    make_file_in_dir("data.json", dir.path(), &observation_json());

    let cmd = gridless()
        .current_dir(dir.path())
        .args(["--nside", "4", "--no-grid", "--no-progress-bars"])
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));

    let output = dir.path().join("gridless_2023_07_04_05_06_07.svg");
    assert!(output.exists());
    let svg = std::fs::read_to_string(output).unwrap();
    assert!(!svg.contains("stroke-dasharray"));
    assert!(!svg.contains(r#"id="colorbar""#));
}

#[test]
fn test_pixel_table() {
    let dir = TempDir::new().unwrap();
    make_file_in_dir("data.json", dir.path(), &observation_json());

    let cmd = gridless()
        .current_dir(dir.path())
        .args(["--nside", "2", "--pixels", "--no-progress-bars"])
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));

    let table = std::fs::read_to_string(dir.path().join("gridless_2023_07_04_05_06_07.txt")).unwrap();
    let lines: Vec<&str> = table.lines().collect();
    // 6 nside² - 2 nside pixels and a header.
    assert_eq!(lines.len(), 21);
    assert!(lines[0].starts_with("# index"));
    for (i, line) in lines[1..].iter().enumerate() {
        let cols: Vec<&str> = line.split_whitespace().collect();
        assert_eq!(cols.len(), 7);
        assert_eq!(cols[0].parse::<usize>().unwrap(), i);
        let el: f64 = cols[1].parse().unwrap();
        assert!((0.0..=90.0).contains(&el));
    }
}

#[test]
fn test_arg_file_and_save_toml() {
    let dir = TempDir::new().unwrap();
    let input = make_file_in_dir("obs.json", dir.path(), &observation_json());
    let output = dir.path().join("from_args.svg");
    let arg_file = make_file_in_dir(
        "args.toml",
        dir.path(),
        &formatdoc! {r#"
            nside = 4
            file = "{}"
            output = "{}"
            stats = true
            normalisation = "none"
        "#, input.display(), output.display()},
    );
    let saved = dir.path().join("saved.toml");

    let cmd = gridless()
        .args([
            &format!("{}", arg_file.display()),
            "--colorbar",
            "--no-progress-bars",
            "--save-toml",
            &format!("{}", saved.display()),
        ])
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));

    let svg = std::fs::read_to_string(&output).unwrap();
    assert!(svg.contains(r#"id="statistics""#));
    assert!(svg.contains(r#"id="colorbar""#));

    let saved = std::fs::read_to_string(saved).unwrap();
    assert!(saved.contains("nside = 4"));
    assert!(saved.contains("colorbar = true"));
    assert!(saved.contains(r#"normalisation = "none""#));
}

#[test]
fn test_geometry_cache_dir_is_populated() {
    let dir = TempDir::new().unwrap();
    let input = make_file_in_dir("data.json", dir.path(), &observation_json());
    let cache = dir.path().join("cache");

    for _ in 0..2 {
        let cmd = gridless()
            .current_dir(dir.path())
            .args([
                "--nside",
                "8",
                "--file",
                &format!("{}", input.display()),
                "--cache-dir",
                &format!("{}", cache.display()),
                "--no-progress-bars",
                "-v",
            ])
            .ok();
        assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    }
    assert!(cache.join("geometry_nside8.bin").exists());
}

#[test]
fn test_dry_run_writes_nothing() {
    let dir = TempDir::new().unwrap();
    make_file_in_dir("data.json", dir.path(), &observation_json());

    let cmd = gridless()
        .current_dir(dir.path())
        .args(["--nside", "4", "--dry-run"])
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    assert!(!dir.path().join("gridless_2023_07_04_05_06_07.svg").exists());
}
