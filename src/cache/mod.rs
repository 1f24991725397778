// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Caching of pixel geometry.
//!
//! Pixelization depends only on nside, so the direction table for an nside can
//! be computed once and reused. Tables can be encoded densely (binary) or as
//! JSON, kept in a directory across runs, and are memoised within a process.
//! Anything wrong with a stored table makes it a [`CacheLookup::Miss`]; the
//! geometry is then recomputed.

mod error;

pub use error::GeometryDecodeError;

use std::{
    collections::HashMap,
    fs::File,
    io::{BufWriter, Cursor, Read, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::sky::{Nside, PixelGeometry};

/// Bump this whenever the pixelization or either encoding changes; stored
/// tables with another version are never used.
pub const GEOMETRY_FORMAT_VERSION: u16 = 1;

const MAGIC: &[u8; 4] = b"GLGC";

/// Magic, version, nside and pixel count.
const BINARY_HEADER_LEN: usize = 4 + 2 + 4 + 4;

lazy_static::lazy_static! {
    static ref GEOMETRY_MEMO: Mutex<HashMap<Nside, Arc<PixelGeometry>>> = Mutex::new(HashMap::new());
}

/// The ways a pixel geometry can be written down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString)]
pub enum GeometryEncoding {
    #[strum(serialize = "bin")]
    Binary,

    #[strum(serialize = "json")]
    Json,
}

impl GeometryEncoding {
    pub fn extension(self) -> &'static str {
        match self {
            GeometryEncoding::Binary => "bin",
            GeometryEncoding::Json => "json",
        }
    }
}

/// The result of looking for a stored pixel geometry.
#[derive(Debug)]
pub enum CacheLookup {
    Hit(PixelGeometry),
    Miss,
}

impl CacheLookup {
    pub fn hit(self) -> Option<PixelGeometry> {
        match self {
            CacheLookup::Hit(g) => Some(g),
            CacheLookup::Miss => None,
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, CacheLookup::Hit(_))
    }
}

/// Encode a pixel geometry as little-endian `f32` (l, m, n) triples after a
/// short header.
pub fn encode_binary(geometry: &PixelGeometry) -> Vec<u8> {
    let mut bytes = vec![0; BINARY_HEADER_LEN + 12 * geometry.len()];
    bytes[..4].copy_from_slice(MAGIC);
    LittleEndian::write_u16(&mut bytes[4..6], GEOMETRY_FORMAT_VERSION);
    LittleEndian::write_u32(&mut bytes[6..10], geometry.nside().get());
    LittleEndian::write_u32(&mut bytes[10..14], geometry.len() as u32);
    for (chunk, lmn) in bytes[BINARY_HEADER_LEN..]
        .chunks_exact_mut(12)
        .zip(geometry.directions())
    {
        LittleEndian::write_f32_into(&lmn, chunk);
    }
    bytes
}

pub fn decode_binary(bytes: &[u8]) -> Result<PixelGeometry, GeometryDecodeError> {
    let mut cursor = Cursor::new(bytes);
    let mut magic = [0; 4];
    cursor.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(GeometryDecodeError::BadMagic);
    }
    let version = cursor.read_u16::<LittleEndian>()?;
    check_version(version)?;
    let nside = Nside::new(cursor.read_u32::<LittleEndian>()?)?;
    let num_pixels = cursor.read_u32::<LittleEndian>()? as usize;
    check_pixel_count(nside, num_pixels)?;

    // Check the body length before allocating for it.
    let body_len = bytes.len() - BINARY_HEADER_LEN;
    let expected_len = 12 * num_pixels;
    if body_len < expected_len {
        return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
    }
    if body_len > expected_len {
        return Err(GeometryDecodeError::TrailingBytes(body_len - expected_len));
    }

    let mut flat = vec![0.0; 3 * num_pixels];
    cursor.read_f32_into::<LittleEndian>(&mut flat)?;
    Ok(PixelGeometry::from_directions(
        nside,
        flat.chunks_exact(3).map(|c| [c[0], c[1], c[2]]),
    ))
}

#[derive(Serialize, Deserialize)]
struct GeometryJson {
    format_version: u16,
    nside: u32,
    directions: Vec<[f32; 3]>,
}

/// Encode a pixel geometry as human-readable JSON.
pub fn encode_json(geometry: &PixelGeometry) -> Result<String, serde_json::Error> {
    serde_json::to_string(&GeometryJson {
        format_version: GEOMETRY_FORMAT_VERSION,
        nside: geometry.nside().get(),
        directions: geometry.directions().collect(),
    })
}

pub fn decode_json(s: &str) -> Result<PixelGeometry, GeometryDecodeError> {
    let GeometryJson {
        format_version,
        nside,
        directions,
    } = serde_json::from_str(s)?;
    check_version(format_version)?;
    let nside = Nside::new(nside)?;
    check_pixel_count(nside, directions.len())?;
    Ok(PixelGeometry::from_directions(nside, directions))
}

/// Decode either encoding, detecting which from the leading bytes.
pub fn decode(bytes: &[u8]) -> Result<PixelGeometry, GeometryDecodeError> {
    if bytes.starts_with(MAGIC) {
        decode_binary(bytes)
    } else {
        let s = std::str::from_utf8(bytes).map_err(|_| GeometryDecodeError::BadMagic)?;
        decode_json(s)
    }
}

fn check_version(found: u16) -> Result<(), GeometryDecodeError> {
    if found == GEOMETRY_FORMAT_VERSION {
        Ok(())
    } else {
        Err(GeometryDecodeError::Version {
            found,
            expected: GEOMETRY_FORMAT_VERSION,
        })
    }
}

fn check_pixel_count(nside: Nside, found: usize) -> Result<(), GeometryDecodeError> {
    let expected = nside.num_hemisphere_pixels();
    if found == expected {
        Ok(())
    } else {
        Err(GeometryDecodeError::PixelCount {
            nside: nside.get(),
            expected,
            found,
        })
    }
}

/// Require a decoded geometry to be for a particular nside.
pub(crate) fn check_nside(
    geometry: PixelGeometry,
    expected: Nside,
) -> Result<PixelGeometry, GeometryDecodeError> {
    if geometry.nside() == expected {
        Ok(geometry)
    } else {
        Err(GeometryDecodeError::NsideMismatch {
            found: geometry.nside().get(),
            expected: expected.get(),
        })
    }
}

/// Pixel geometries stored as files in a directory, one per nside.
#[derive(Debug, Clone)]
pub struct GeometryCache {
    dir: PathBuf,
    encoding: GeometryEncoding,
}

impl GeometryCache {
    pub fn new<P: AsRef<Path>>(dir: P, encoding: GeometryEncoding) -> GeometryCache {
        GeometryCache {
            dir: dir.as_ref().to_path_buf(),
            encoding,
        }
    }

    pub fn path(&self, nside: Nside) -> PathBuf {
        self.dir.join(format!(
            "geometry_nside{}.{}",
            nside.get(),
            self.encoding.extension()
        ))
    }

    /// Look for the geometry of `nside`. Absent, unreadable, stale or
    /// mismatched files are all misses.
    pub fn load(&self, nside: Nside) -> CacheLookup {
        let path = self.path(nside);
        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) => {
                debug!("Geometry cache miss for nside {nside} ({}): {e}", path.display());
                return CacheLookup::Miss;
            }
        };

        let decoded = match self.encoding {
            GeometryEncoding::Binary => decode_binary(&bytes),
            GeometryEncoding::Json => std::str::from_utf8(&bytes)
                .map_err(|_| GeometryDecodeError::BadMagic)
                .and_then(decode_json),
        }
        .and_then(|g| check_nside(g, nside));

        match decoded {
            Ok(g) => {
                debug!("Geometry cache hit for nside {nside} ({})", path.display());
                CacheLookup::Hit(g)
            }
            Err(e) => {
                debug!("Ignoring cached geometry {}: {e}", path.display());
                CacheLookup::Miss
            }
        }
    }

    /// Write a geometry into the cache directory. The file is written under a
    /// temporary name and renamed, so readers never see a partial table.
    pub fn store(&self, geometry: &PixelGeometry) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path(geometry.nside());
        let tmp = path.with_extension("partial");
        {
            let mut f = BufWriter::new(File::create(&tmp)?);
            match self.encoding {
                GeometryEncoding::Binary => f.write_all(&encode_binary(geometry))?,
                GeometryEncoding::Json => f.write_all(encode_json(geometry)?.as_bytes())?,
            }
            f.flush()?;
        }
        std::fs::rename(&tmp, &path)?;
        trace!("Stored geometry for nside {} at {}", geometry.nside(), path.display());
        Ok(())
    }
}

/// Get the pixel geometry for `nside`, computing it at most once per process.
/// If a cache directory is given, it is consulted before computing and
/// populated afterwards; problems with it only cost a recomputation.
pub fn geometry(nside: Nside, disk: Option<&GeometryCache>) -> Arc<PixelGeometry> {
    let mut memo = GEOMETRY_MEMO.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(g) = memo.get(&nside) {
        trace!("Using memoised geometry for nside {nside}");
        return Arc::clone(g);
    }

    let g = match disk.map(|c| c.load(nside)) {
        Some(CacheLookup::Hit(g)) => g,
        Some(CacheLookup::Miss) | None => {
            let g = PixelGeometry::compute(nside);
            if let Some(cache) = disk {
                if let Err(e) = cache.store(&g) {
                    warn!("Couldn't write geometry cache {}: {e}", cache.path(nside).display());
                }
            }
            g
        }
    };
    let g = Arc::new(g);
    memo.insert(nside, Arc::clone(&g));
    g
}

/// The resolutions currently memoised in this process.
pub fn memoised_nsides() -> Vec<Nside> {
    let memo = GEOMETRY_MEMO.lock().unwrap_or_else(|e| e.into_inner());
    let mut nsides: Vec<Nside> = memo.keys().copied().collect();
    nsides.sort_unstable();
    nsides
}

/// Forget every memoised geometry.
pub fn clear_memo() {
    GEOMETRY_MEMO
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .clear();
}
