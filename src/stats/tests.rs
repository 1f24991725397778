// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;

use super::*;

#[test]
fn test_statistics_of_known_field() {
    let stats = FieldStatistics::compute(&[3.0, 1.0, 100.0, 4.0, 2.0]);
    assert_eq!(stats.num_pixels, 5);
    assert_eq!(stats.num_nan, 0);
    assert_eq!(stats.min, 1.0);
    assert_eq!(stats.max, 100.0);
    assert_abs_diff_eq!(stats.mean, 22.0);
    // sqrt((19² + 21² + 78² + 18² + 20²) / 5)
    assert_abs_diff_eq!(stats.sdev, 39.012_818, epsilon = 1e-4);
    assert_eq!(stats.median, 3.0);
    // |x - 3| = 0, 2, 97, 1, 1
    assert_eq!(stats.mad, 1.0);
    assert_abs_diff_eq!(stats.r_mad(), 100.0);
    assert_abs_diff_eq!(stats.snr(), 100.0 / 39.012_818, epsilon = 1e-4);
}

#[test]
fn test_even_length_median() {
    let stats = FieldStatistics::compute(&[4.0, -1.0, 2.0, 10.0]);
    assert_eq!(stats.median, 3.0);
    // |x - 3| = 1, 4, 1, 7
    assert_eq!(stats.mad, 2.5);
}

#[test]
fn test_statistics_do_not_hide_nan() {
    let stats = FieldStatistics::compute(&[1.0, f32::NAN, 3.0]);
    assert_eq!(stats.num_pixels, 3);
    assert_eq!(stats.num_nan, 1);
    for v in [
        stats.min,
        stats.max,
        stats.mean,
        stats.sdev,
        stats.median,
        stats.mad,
    ] {
        assert!(v.is_nan());
    }
}

#[test]
fn test_statistics_of_empty_field() {
    let stats = FieldStatistics::compute(&[]);
    assert_eq!(stats.num_pixels, 0);
    assert!(stats.mean.is_nan());
}

#[test]
fn test_flat_field() {
    let stats = FieldStatistics::compute(&[0.0; 20]);
    assert_eq!(stats.sdev, 0.0);
    assert_eq!(stats.mad, 0.0);
    let normalised = normalise(&[0.0; 20], ColorRange::Auto.bounds(&stats));
    assert!(normalised.iter().all(|&f| f == 0.5));
}

#[test]
fn test_normalise() {
    let values = [-1.0, 0.0, 1.0, 3.0, f32::NAN];
    let n = normalise(&values, (-1.0, 3.0));
    assert_eq!(&n[..4], &[0.0, 0.25, 0.5, 1.0]);
    assert!(n[4].is_nan());

    // A fixed range clamps.
    let range = ColorRange::fixed(0.0, 1.0).unwrap();
    let stats = FieldStatistics::compute(&values[..4]);
    assert_eq!(range.bounds(&stats), (0.0, 1.0));
    assert_eq!(
        normalise(&values[..4], range.bounds(&stats)),
        vec![0.0, 0.0, 1.0, 1.0]
    );
}

#[test]
fn test_fixed_range_validation() {
    assert!(ColorRange::fixed(0.0, 1.0).is_ok());
    for (min, max) in [(1.0, 1.0), (2.0, 1.0), (f32::NAN, 1.0), (0.0, f32::INFINITY)] {
        assert!(matches!(
            ColorRange::fixed(min, max),
            Err(ConfigError::InvalidColorRange { .. })
        ));
    }
}

#[test]
fn test_cubehelix_ends() {
    assert_eq!(cubehelix(0.0), [0.0, 0.0, 0.0]);
    assert_eq!(cubehelix(1.0), [1.0, 1.0, 1.0]);
    assert_eq!(cubehelix_rgb(0.0), [0, 0, 0]);
    assert_eq!(cubehelix_rgb(1.0), [255, 255, 255]);
    assert_eq!(cubehelix_rgb(f32::NAN), [0, 0, 0]);
}

#[test]
fn test_bytes_agree_with_floats() {
    let normalised: Vec<f32> = (0..1000).map(|i| i as f32 / 999.0).collect();
    let bytes = to_rgb_bytes(&normalised);
    assert_eq!(bytes.len(), 3 * normalised.len());
    for (f, rgb) in normalised.iter().zip(bytes.chunks_exact(3)) {
        for (c, &b) in cubehelix(*f).iter().zip(rgb) {
            assert!((c * 255.0 - b as f32).abs() <= 1.0);
        }
    }
}
