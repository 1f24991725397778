// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::{fs::File, io::Write, path::Path};

use indoc::indoc;
use tempfile::TempDir;

use super::{args::GridlessArgs, *};
use crate::{
    cache::GeometryEncoding,
    error::ConfigError,
    imaging::{Normalisation, PixelValue},
    stats::ColorRange,
};

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    let mut f = File::create(&path).unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    path
}

#[test]
fn test_cli_args_are_parsed() {
    let g = Gridless::try_parse_from([
        "gridless",
        "--nside",
        "16",
        "--file",
        "obs.json",
        "--sources",
        "--min-value",
        "-0.5",
        "--max-value",
        "2",
        "-vv",
        "--dry-run",
    ])
    .unwrap();
    assert_eq!(g.args.nside, Some(16));
    assert_eq!(g.args.file, Some(PathBuf::from("obs.json")));
    assert!(g.args.sources);
    assert!(!g.args.stats);
    assert_eq!(g.args.min_value, Some(-0.5));
    assert_eq!(g.args.max_value, Some(2.0));
    assert_eq!(g.global_opts.verbosity, 2);
    assert!(g.global_opts.dry_run);
}

#[test]
fn test_cli_args_override_toml_file() {
    let dir = TempDir::new().unwrap();
    let arg_file = write(
        dir.path(),
        "args.toml",
        indoc! {r#"
            nside = 8
            file = "from_file.json"
            normalisation = "none"
            stats = true
        "#},
    );
    let merged = GridlessArgs {
        args_file: Some(arg_file),
        nside: Some(32),
        colorbar: true,
        ..Default::default()
    }
    .merge()
    .unwrap();
    assert_eq!(merged.args_file, None);
    assert_eq!(merged.nside, Some(32));
    assert_eq!(merged.file, Some(PathBuf::from("from_file.json")));
    assert_eq!(merged.normalisation.as_deref(), Some("none"));
    assert!(merged.stats);
    assert!(merged.colorbar);
    assert!(!merged.pixels);
}

#[test]
fn test_json_arg_file() {
    let dir = TempDir::new().unwrap();
    let arg_file = write(
        dir.path(),
        "args.JSON",
        r#"{"nside": 4, "pixels": true, "output": "table.txt"}"#,
    );
    let merged = GridlessArgs {
        args_file: Some(arg_file),
        ..Default::default()
    }
    .merge()
    .unwrap();
    assert_eq!(merged.nside, Some(4));
    assert!(merged.pixels);
    assert_eq!(merged.output, Some(PathBuf::from("table.txt")));
}

#[test]
fn test_bad_arg_files() {
    let dir = TempDir::new().unwrap();
    for (name, contents) in [("args.yaml", "nside: 4"), ("args.toml", "nside = ")] {
        let arg_file = write(dir.path(), name, contents);
        let result = GridlessArgs {
            args_file: Some(arg_file),
            ..Default::default()
        }
        .merge();
        match result {
            Err(e @ GridlessError::ArgFile(_)) => assert_eq!(e.exit_code(), 2),
            other => panic!("Expected an arg file error, got {other:?}"),
        }
    }
}

#[test]
fn test_saved_toml_can_be_read_back() {
    let args = GridlessArgs {
        nside: Some(64),
        file: Some(PathBuf::from("obs.json")),
        pixel_value: Some("amplitude".to_string()),
        no_grid: true,
        min_value: Some(0.0),
        max_value: Some(1.5),
        ..Default::default()
    };
    let dir = TempDir::new().unwrap();
    let arg_file = write(dir.path(), "saved.toml", &toml::to_string(&args).unwrap());
    let read = GridlessArgs {
        args_file: Some(arg_file),
        ..Default::default()
    }
    .merge()
    .unwrap();
    assert_eq!(read, args);
}

#[test]
fn test_parse_args_into_params() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "obs.json", "{}");
    let params = GridlessArgs {
        nside: Some(8),
        file: Some(input.clone()),
        normalisation: Some("None".to_string()),
        pixel_value: Some("amplitude".to_string()),
        min_value: Some(-1.0),
        max_value: Some(1.0),
        cache_dir: Some(dir.path().to_path_buf()),
        no_grid: true,
        stats: true,
        ..Default::default()
    }
    .parse()
    .unwrap();
    assert_eq!(params.input, input);
    assert_eq!(params.nside.get(), 8);
    assert_eq!(params.imaging.normalisation, Normalisation::None);
    assert_eq!(params.imaging.pixel_value, PixelValue::Amplitude);
    assert_eq!(params.range, ColorRange::Fixed { min: -1.0, max: 1.0 });
    assert!(!params.plot.grid);
    assert!(params.plot.stats);
    assert!(!params.plot.colorbar);
    assert!(!params.pixel_table);
    assert_eq!(
        params.cache.unwrap().path(params.nside),
        dir.path()
            .join(format!("geometry_nside8.{}", GeometryEncoding::Binary.extension()))
    );
}

#[test]
fn test_invalid_args() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "obs.json", "{}");
    let valid = GridlessArgs {
        nside: Some(8),
        file: Some(input),
        ..Default::default()
    };

    let cases = [
        (
            GridlessArgs {
                nside: None,
                ..valid.clone()
            },
            2,
        ),
        (
            GridlessArgs {
                nside: Some(6),
                ..valid.clone()
            },
            2,
        ),
        (
            GridlessArgs {
                file: Some(dir.path().join("missing.json")),
                ..valid.clone()
            },
            2,
        ),
        (
            GridlessArgs {
                normalisation: Some("sqrt".to_string()),
                ..valid.clone()
            },
            2,
        ),
        (
            GridlessArgs {
                min_value: Some(1.0),
                ..valid.clone()
            },
            2,
        ),
        (
            GridlessArgs {
                min_value: Some(1.0),
                max_value: Some(1.0),
                ..valid.clone()
            },
            2,
        ),
    ];
    for (args, code) in cases {
        let e = args.parse().unwrap_err();
        assert_eq!(e.exit_code(), code, "{e}");
    }

    match (GridlessArgs {
        file: Some(dir.path().join("missing.json")),
        ..valid
    })
    .parse()
    {
        Err(GridlessError::FileNotFound(s)) => assert!(s.contains("missing.json")),
        other => panic!("Expected a missing file error, got {other:?}"),
    }
}

#[test]
fn test_imaging_errors_map_to_exit_codes() {
    let e = GridlessError::from(crate::ImagingError::from(ConfigError::InvalidNside {
        nside: 3,
    }));
    assert_eq!(e.exit_code(), 2);
    let e = GridlessError::from(crate::obs::ParseError::NoAntennas);
    assert!(matches!(e, GridlessError::Parse(_)));
    assert_eq!(e.exit_code(), 1);
}
