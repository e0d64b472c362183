//! PNG decoding that keeps the stored representation intact.
//!
//! The `png` crate is driven with identity transformations so the raster keeps
//! its original color type, bit depth and palette. Interlaced input comes out
//! de-interlaced. bKGD is not exposed by the decoder, so it is read by walking
//! the chunk list directly.

use std::io::Cursor;

use png::{Decoder, Transformations};

use super::{Background, BitDepth, ColorType, DecodeError, RasterImage, Rgb, Transparency};

/// The eight-byte PNG file signature.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Check whether bytes start with the PNG signature.
pub fn is_png(bytes: &[u8]) -> bool {
    bytes.len() >= PNG_SIGNATURE.len() && bytes[..PNG_SIGNATURE.len()] == PNG_SIGNATURE
}

/// Decode a PNG file into a raster.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the signature is missing,
/// `DecodeError::Unsupported` for animated PNGs, and
/// `DecodeError::CorruptedFile` if the stream cannot be decoded.
pub fn decode_png(bytes: &[u8]) -> Result<RasterImage, DecodeError> {
    if !is_png(bytes) {
        return Err(DecodeError::InvalidFormat);
    }

    let mut decoder = Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(Transformations::IDENTITY);
    let mut reader = decoder
        .read_info()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    if reader.info().animation_control.is_some() {
        return Err(DecodeError::Unsupported("animated PNG".to_string()));
    }

    let mut buf = vec![0u8; reader.output_buffer_size()];
    let frame = reader
        .next_frame(&mut buf)
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    let color_type = ColorType::try_from(frame.color_type as u8)?;
    let bit_depth = BitDepth::try_from(frame.bit_depth as u8)?;
    let rows = buf
        .chunks_exact(frame.line_size)
        .take(frame.height as usize)
        .map(<[u8]>::to_vec)
        .collect();

    let mut raster = RasterImage::new(frame.width, frame.height, color_type, bit_depth, rows)?;

    let info = reader.info();
    if let Some(plte) = info.palette.as_deref() {
        // Truecolor images may carry a suggested palette; it is not part of
        // the pixel data and is dropped.
        if color_type == ColorType::Indexed {
            // Entries past 2^depth can never be referenced.
            let palette = plte
                .chunks_exact(3)
                .take(1 << bit_depth.bits())
                .map(|c| Rgb::new(c[0], c[1], c[2]))
                .collect();
            raster = raster.with_palette(palette)?;
        }
    }
    // Ancillary chunks that do not fit the image are ignored, as libpng does.
    let entries = raster.palette().map_or(0, <[Rgb]>::len);
    let depth = bit_depth.bits();
    if let Some(trns) = info.trns.as_deref() {
        if let Some(trns) = parse_transparency(trns, color_type, depth, entries) {
            raster = raster.with_transparency(trns)?;
        }
    }
    if let Some(data) = find_chunk(bytes, *b"bKGD") {
        if let Some(bkgd) = parse_background(data, color_type, depth, entries) {
            raster = raster.with_background(bkgd)?;
        }
    }

    raster.validate()?;
    Ok(raster)
}

fn parse_transparency(
    data: &[u8],
    color_type: ColorType,
    depth: u8,
    palette_entries: usize,
) -> Option<Transparency> {
    match color_type {
        ColorType::Indexed if !data.is_empty() && palette_entries > 0 => {
            let len = data.len().min(palette_entries);
            Some(Transparency::Palette(data[..len].to_vec()))
        }
        ColorType::Grayscale => gray_sample(data, depth).map(Transparency::Gray),
        ColorType::Rgb => {
            rgb_samples(data, depth).map(|(r, g, b)| Transparency::Rgb(r, g, b))
        }
        _ => None,
    }
}

fn parse_background(
    data: &[u8],
    color_type: ColorType,
    depth: u8,
    palette_entries: usize,
) -> Option<Background> {
    match color_type {
        ColorType::Indexed => data
            .first()
            .filter(|&&i| usize::from(i) < palette_entries)
            .map(|&i| Background::Palette(i)),
        ColorType::Grayscale | ColorType::GrayscaleAlpha => {
            gray_sample(data, depth).map(Background::Gray)
        }
        ColorType::Rgb | ColorType::Rgba => {
            rgb_samples(data, depth).map(|(r, g, b)| Background::Rgb(r, g, b))
        }
    }
}

fn gray_sample(data: &[u8], depth: u8) -> Option<u16> {
    if data.len() < 2 {
        return None;
    }
    Some(be16(data, 0)).filter(|&v| fits(v, depth))
}

fn rgb_samples(data: &[u8], depth: u8) -> Option<(u16, u16, u16)> {
    if data.len() < 6 {
        return None;
    }
    let (r, g, b) = (be16(data, 0), be16(data, 2), be16(data, 4));
    (fits(r, depth) && fits(g, depth) && fits(b, depth)).then_some((r, g, b))
}

#[inline]
fn fits(value: u16, depth: u8) -> bool {
    depth >= 16 || u32::from(value) < (1u32 << depth)
}

#[inline]
fn be16(data: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([data[at], data[at + 1]])
}

/// Return the payload of the first chunk of type `kind` that precedes IDAT.
fn find_chunk(bytes: &[u8], kind: [u8; 4]) -> Option<&[u8]> {
    let mut pos = PNG_SIGNATURE.len();
    while pos + 8 <= bytes.len() {
        let len = u32::from_be_bytes(bytes[pos..pos + 4].try_into().ok()?) as usize;
        let tag: [u8; 4] = bytes[pos + 4..pos + 8].try_into().ok()?;
        let start = pos + 8;
        let end = start.checked_add(len)?;
        if end > bytes.len() {
            return None;
        }
        if tag == kind {
            return Some(&bytes[start..end]);
        }
        if &tag == b"IDAT" || &tag == b"IEND" {
            return None;
        }
        pos = end + 4;
    }
    None
}
