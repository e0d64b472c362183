//! Core types for decoded rasters.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for raster decoding and construction.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The input does not start with a recognized image signature.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// The format was recognized but this variant of it is not supported.
    #[error("Unsupported image: {0}")]
    Unsupported(String),

    /// The image stream is corrupted or incomplete.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),

    /// Raster fields are inconsistent with each other.
    #[error("Invalid raster: {0}")]
    InvalidRaster(String),
}

/// PNG color types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ColorType {
    Grayscale = 0,
    Rgb = 2,
    Indexed = 3,
    GrayscaleAlpha = 4,
    Rgba = 6,
}

impl ColorType {
    /// The IHDR color type code.
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Number of samples per pixel.
    #[inline]
    pub fn channels(self) -> u8 {
        match self {
            ColorType::Grayscale | ColorType::Indexed => 1,
            ColorType::GrayscaleAlpha => 2,
            ColorType::Rgb => 3,
            ColorType::Rgba => 4,
        }
    }

    /// Whether `depth` is a legal sample depth for this color type.
    pub fn allows(self, depth: BitDepth) -> bool {
        match self {
            ColorType::Grayscale => true,
            ColorType::Indexed => depth != BitDepth::Sixteen,
            ColorType::Rgb | ColorType::GrayscaleAlpha | ColorType::Rgba => {
                matches!(depth, BitDepth::Eight | BitDepth::Sixteen)
            }
        }
    }
}

impl TryFrom<u8> for ColorType {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ColorType::Grayscale),
            2 => Ok(ColorType::Rgb),
            3 => Ok(ColorType::Indexed),
            4 => Ok(ColorType::GrayscaleAlpha),
            6 => Ok(ColorType::Rgba),
            other => Err(DecodeError::InvalidRaster(format!(
                "unknown color type {other}"
            ))),
        }
    }
}

/// Bits per sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum BitDepth {
    One = 1,
    Two = 2,
    Four = 4,
    Eight = 8,
    Sixteen = 16,
}

impl BitDepth {
    #[inline]
    pub fn bits(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for BitDepth {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(BitDepth::One),
            2 => Ok(BitDepth::Two),
            4 => Ok(BitDepth::Four),
            8 => Ok(BitDepth::Eight),
            16 => Ok(BitDepth::Sixteen),
            other => Err(DecodeError::InvalidRaster(format!(
                "unsupported bit depth {other}"
            ))),
        }
    }
}

/// One palette entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Simple transparency (tRNS) data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transparency {
    /// Alpha values for the leading palette entries.
    Palette(Vec<u8>),
    /// The fully transparent gray sample.
    Gray(u16),
    /// The fully transparent RGB sample.
    Rgb(u16, u16, u16),
}

/// Background color (bKGD).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Background {
    /// Index into the palette.
    Palette(u8),
    Gray(u16),
    Rgb(u16, u16, u16),
}

/// An immutable decoded raster.
///
/// Rows are stored exactly as PNG serializes them before filtering: packed
/// samples for sub-byte depths, big-endian samples for 16-bit depths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    bit_depth: BitDepth,
    color_type: ColorType,
    rows: Vec<Vec<u8>>,
    palette: Option<Vec<Rgb>>,
    transparency: Option<Transparency>,
    background: Option<Background>,
}

impl RasterImage {
    /// Create a raster from its rows, validating dimensions and row lengths.
    ///
    /// Indexed rasters must be given a palette with [`RasterImage::with_palette`]
    /// before they are usable; [`RasterImage::validate`] checks this.
    pub fn new(
        width: u32,
        height: u32,
        color_type: ColorType,
        bit_depth: BitDepth,
        mut rows: Vec<Vec<u8>>,
    ) -> Result<Self, DecodeError> {
        if width == 0 || height == 0 {
            return Err(DecodeError::InvalidRaster(format!(
                "dimensions must be non-zero, got {width}x{height}"
            )));
        }
        if !color_type.allows(bit_depth) {
            return Err(DecodeError::InvalidRaster(format!(
                "bit depth {} is not allowed for {:?}",
                bit_depth.bits(),
                color_type
            )));
        }
        if rows.len() != height as usize {
            return Err(DecodeError::InvalidRaster(format!(
                "expected {height} rows, got {}",
                rows.len()
            )));
        }
        let expected = row_bytes(width, color_type, bit_depth);
        if let Some((y, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != expected) {
            return Err(DecodeError::InvalidRaster(format!(
                "row {y} has {} bytes, expected {expected}",
                row.len()
            )));
        }

        // Padding bits after the last packed sample carry no pixel data.
        let used_bits =
            (width as usize * usize::from(color_type.channels()) * usize::from(bit_depth.bits())) % 8;
        if used_bits != 0 {
            let keep = 0xFFu8 << (8 - used_bits);
            for row in &mut rows {
                if let Some(last) = row.last_mut() {
                    *last &= keep;
                }
            }
        }

        Ok(Self {
            width,
            height,
            bit_depth,
            color_type,
            rows,
            palette: None,
            transparency: None,
            background: None,
        })
    }

    /// Build a raster from one contiguous buffer of `height` rows.
    pub fn from_packed(
        width: u32,
        height: u32,
        color_type: ColorType,
        bit_depth: BitDepth,
        data: &[u8],
    ) -> Result<Self, DecodeError> {
        let stride = row_bytes(width, color_type, bit_depth);
        let expected = stride * height as usize;
        if stride == 0 || data.len() != expected {
            return Err(DecodeError::InvalidRaster(format!(
                "expected {expected} bytes of pixel data, got {}",
                data.len()
            )));
        }
        let rows = data.chunks_exact(stride).map(<[u8]>::to_vec).collect();
        Self::new(width, height, color_type, bit_depth, rows)
    }

    /// Attach a palette. Only legal for indexed rasters.
    pub fn with_palette(mut self, palette: Vec<Rgb>) -> Result<Self, DecodeError> {
        if self.color_type != ColorType::Indexed {
            return Err(DecodeError::InvalidRaster(
                "palette given for a non-indexed raster".to_string(),
            ));
        }
        let max = 1usize << self.bit_depth.bits();
        if palette.is_empty() || palette.len() > max.min(256) {
            return Err(DecodeError::InvalidRaster(format!(
                "palette has {} entries, allowed 1..={}",
                palette.len(),
                max.min(256)
            )));
        }
        self.palette = Some(palette);
        Ok(self)
    }

    /// Attach tRNS data matching the color type.
    pub fn with_transparency(mut self, trns: Transparency) -> Result<Self, DecodeError> {
        let ok = match (&trns, self.color_type) {
            (Transparency::Palette(alpha), ColorType::Indexed) => {
                let entries = self.palette.as_ref().map_or(0, Vec::len);
                !alpha.is_empty() && alpha.len() <= entries
            }
            (Transparency::Gray(v), ColorType::Grayscale) => self.sample_fits(*v),
            (Transparency::Rgb(r, g, b), ColorType::Rgb) => {
                self.sample_fits(*r) && self.sample_fits(*g) && self.sample_fits(*b)
            }
            _ => false,
        };
        if !ok {
            return Err(DecodeError::InvalidRaster(format!(
                "transparency {trns:?} does not fit {:?}/{}",
                self.color_type,
                self.bit_depth.bits()
            )));
        }
        self.transparency = Some(trns);
        Ok(self)
    }

    /// Attach bKGD data matching the color type.
    pub fn with_background(mut self, bkgd: Background) -> Result<Self, DecodeError> {
        let ok = match (bkgd, self.color_type) {
            (Background::Palette(i), ColorType::Indexed) => {
                (i as usize) < self.palette.as_ref().map_or(0, Vec::len)
            }
            (Background::Gray(v), ColorType::Grayscale | ColorType::GrayscaleAlpha) => {
                self.sample_fits(v)
            }
            (Background::Rgb(r, g, b), ColorType::Rgb | ColorType::Rgba) => {
                self.sample_fits(r) && self.sample_fits(g) && self.sample_fits(b)
            }
            _ => false,
        };
        if !ok {
            return Err(DecodeError::InvalidRaster(format!(
                "background {bkgd:?} does not fit {:?}/{}",
                self.color_type,
                self.bit_depth.bits()
            )));
        }
        self.background = Some(bkgd);
        Ok(self)
    }

    /// Check the invariants that builder order cannot enforce.
    pub fn validate(&self) -> Result<(), DecodeError> {
        if self.color_type == ColorType::Indexed && self.palette.is_none() {
            return Err(DecodeError::InvalidRaster(
                "indexed raster without a palette".to_string(),
            ));
        }
        Ok(())
    }

    fn sample_fits(&self, value: u16) -> bool {
        let bits = self.bit_depth.bits();
        bits == 16 || u32::from(value) < (1u32 << bits)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bit_depth(&self) -> BitDepth {
        self.bit_depth
    }

    pub fn color_type(&self) -> ColorType {
        self.color_type
    }

    pub fn rows(&self) -> &[Vec<u8>] {
        &self.rows
    }

    pub fn palette(&self) -> Option<&[Rgb]> {
        self.palette.as_deref()
    }

    pub fn transparency(&self) -> Option<&Transparency> {
        self.transparency.as_ref()
    }

    pub fn background(&self) -> Option<Background> {
        self.background
    }

    /// Bits per pixel across all channels.
    #[inline]
    pub fn bits_per_pixel(&self) -> usize {
        usize::from(self.color_type.channels()) * usize::from(self.bit_depth.bits())
    }

    /// Bytes per unfiltered row.
    #[inline]
    pub fn row_bytes(&self) -> usize {
        row_bytes(self.width, self.color_type, self.bit_depth)
    }

    /// Total size of the unfiltered pixel data in bytes.
    pub fn byte_size(&self) -> usize {
        self.row_bytes() * self.height as usize
    }
}

/// Bytes needed for one row of `width` pixels.
#[inline]
pub fn row_bytes(width: u32, color_type: ColorType, bit_depth: BitDepth) -> usize {
    let bits = width as usize
        * usize::from(color_type.channels())
        * usize::from(bit_depth.bits());
    bits.div_ceil(8)
}

/// Summary of a raster, cheap to serialize across binding boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasterInfo {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: ColorType,
    pub palette_len: usize,
    pub has_transparency: bool,
    pub has_background: bool,
}

impl From<&RasterImage> for RasterInfo {
    fn from(raster: &RasterImage) -> Self {
        Self {
            width: raster.width,
            height: raster.height,
            bit_depth: raster.bit_depth.bits(),
            color_type: raster.color_type,
            palette_len: raster.palette.as_ref().map_or(0, Vec::len),
            has_transparency: raster.transparency.is_some(),
            has_background: raster.background.is_some(),
        }
    }
}
