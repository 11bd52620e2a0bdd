//! GeoPackage geometry blob handling.
//!
//! A stored geometry is a fixed 8-byte header (magic, version, flags, srs_id),
//! an optional envelope, and a WKB payload.
// cf. https://www.geopackage.org/spec140/index.html#gpb_format

use crate::error::{OptimizerError, Result};
use wkb::reader::Wkb;

const HEADER_LEN: usize = 8;

/// Bounding box of a single geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Bounds {
    pub minx: f64,
    pub maxx: f64,
    pub miny: f64,
    pub maxy: f64,
}

fn flags_byte(blob: &[u8]) -> Result<u8> {
    if blob.len() < HEADER_LEN {
        return Err(OptimizerError::InvalidGeometryLength {
            len: blob.len(),
            minimum: HEADER_LEN,
        });
    }
    Ok(blob[3])
}

fn envelope_len(flags: u8) -> Result<usize> {
    match flags & 0b0000_1110 {
        0b0000_0000 => Ok(0),  // no envelope
        0b0000_0010 => Ok(32), // [minx, maxx, miny, maxy]
        0b0000_0100 => Ok(48), // [minx, maxx, miny, maxy, minz, maxz]
        0b0000_0110 => Ok(48), // [minx, maxx, miny, maxy, minm, maxm]
        0b0000_1000 => Ok(64), // [minx, maxx, miny, maxy, minz, maxz, minm, maxm]
        _ => Err(OptimizerError::InvalidGeometryFlags(flags)),
    }
}

/// Read the x/y envelope straight out of the header, if the writer stored one.
///
/// Saves a full WKB parse for blobs produced by writers that precompute
/// envelopes; the byte order is governed by the header's endianness bit.
pub(crate) fn header_envelope(blob: &[u8]) -> Result<Option<Bounds>> {
    let flags = flags_byte(blob)?;
    let envelope = envelope_len(flags)?;
    if envelope == 0 {
        return Ok(None);
    }

    let end = HEADER_LEN + envelope;
    if blob.len() < end {
        return Err(OptimizerError::InvalidGeometryLength {
            len: blob.len(),
            minimum: end,
        });
    }

    let little_endian = flags & 0b0000_0001 != 0;
    let mut values = [0.0_f64; 4];
    for (slot, chunk) in values
        .iter_mut()
        .zip(blob[HEADER_LEN..HEADER_LEN + 32].chunks_exact(8))
    {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(chunk);
        *slot = if little_endian {
            f64::from_le_bytes(raw)
        } else {
            f64::from_be_bytes(raw)
        };
    }

    Ok(Some(Bounds {
        minx: values[0],
        maxx: values[1],
        miny: values[2],
        maxy: values[3],
    }))
}

/// Strip GeoPackage header and envelope bytes to access the raw WKB.
pub(crate) fn gpkg_geometry_to_wkb(blob: &[u8]) -> Result<Wkb<'_>> {
    let flags = flags_byte(blob)?;
    let offset = HEADER_LEN + envelope_len(flags)?;
    if blob.len() < offset {
        return Err(OptimizerError::InvalidGeometryLength {
            len: blob.len(),
            minimum: offset,
        });
    }
    Ok(Wkb::try_new(&blob[offset..])?)
}

#[cfg(test)]
pub(crate) fn geometry_to_gpkg_blob<G: geo_traits::GeometryTrait<T = f64>>(
    geometry: &G,
    srs_id: u32,
) -> Vec<u8> {
    let mut wkb_buf = Vec::new();
    wkb::writer::write_geometry(&mut wkb_buf, geometry, &Default::default()).expect("write wkb");

    let mut blob = Vec::with_capacity(HEADER_LEN + wkb_buf.len());
    blob.extend_from_slice(&[
        0x47, // magic
        0x50, // magic
        0x00, // version
        0x01, // flags: little endian, no envelope
    ]);
    blob.extend_from_slice(&srs_id.to_le_bytes());
    blob.extend_from_slice(&wkb_buf);
    blob
}
