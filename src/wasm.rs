// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Browser bindings. Errors become JavaScript exceptions carrying the
//! error's message.

use wasm_bindgen::prelude::*;

use crate::api;

fn js_error<E: std::fmt::Display>(e: E) -> JsError {
    JsError::new(&e.to_string())
}

/// An SVG document and the time of the observation it shows.
#[wasm_bindgen]
pub struct SvgResult {
    svg_data: String,
    timestamp: f64,
}

#[wasm_bindgen]
impl SvgResult {
    #[wasm_bindgen(getter)]
    pub fn svg_data(&self) -> String {
        self.svg_data.clone()
    }

    /// Milliseconds since the Unix epoch, as used by `Date`.
    #[wasm_bindgen(getter)]
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }
}

#[wasm_bindgen]
pub fn image_from_observation(
    json: &str,
    nside: u32,
    include_sources: bool,
) -> Result<SvgResult, JsError> {
    let (svg_data, timestamp) =
        api::image_from_observation(json, nside, include_sources).map_err(js_error)?;
    Ok(SvgResult {
        svg_data,
        timestamp: timestamp.timestamp_millis() as f64,
    })
}

#[wasm_bindgen]
pub fn image_with_features(
    json: &str,
    nside: u32,
    include_sources: bool,
    include_stats: bool,
    include_colorbar: bool,
) -> Result<SvgResult, JsError> {
    let (svg_data, timestamp) = api::image_with_features(
        json,
        nside,
        include_sources,
        include_stats,
        include_colorbar,
    )
    .map_err(js_error)?;
    Ok(SvgResult {
        svg_data,
        timestamp: timestamp.timestamp_millis() as f64,
    })
}

#[wasm_bindgen]
pub fn image_from_observation_ext(
    json: &str,
    nside: u32,
    include_timing: bool,
) -> Result<String, JsError> {
    api::image_from_observation_ext(json, nside, include_timing).map_err(js_error)
}

#[wasm_bindgen]
pub fn image_with_precomputed_geometry(
    json: &str,
    nside: u32,
    include_timing: bool,
    geometry: &[u8],
) -> Result<String, JsError> {
    api::image_with_precomputed_geometry(json, nside, include_timing, geometry).map_err(js_error)
}

#[wasm_bindgen]
pub fn color_values_only(json: &str, nside: u32) -> Result<Vec<f32>, JsError> {
    api::color_values_only(json, nside).map_err(js_error)
}

#[wasm_bindgen]
pub fn color_bytes_only(json: &str, nside: u32) -> Result<Vec<u8>, JsError> {
    api::color_bytes_only(json, nside).map_err(js_error)
}

#[wasm_bindgen]
pub fn generate_geometry_binary(nside: u32) -> Result<Vec<u8>, JsError> {
    api::generate_geometry_binary(nside).map_err(js_error)
}

#[wasm_bindgen]
pub fn pixel_corners(nside: u32) -> Result<Vec<f32>, JsError> {
    api::pixel_corners(nside).map_err(js_error)
}

#[wasm_bindgen]
pub fn pixel_display_coords(nside: u32) -> Result<Vec<i32>, JsError> {
    api::pixel_display_coords(nside).map_err(js_error)
}
