//! PNG encoding for mcpng.
//!
//! This module provides functionality for:
//! - Describing one encoder configuration as a [`ParameterTuple`]
//! - Serializing a [`RasterImage`] to PNG under a given tuple
//! - The [`Encoder`] contract the search engine parallelizes over
//!
//! # Architecture
//!
//! Encoding is a pure function of (raster, tuple). Every buffer and compressor
//! it needs is created inside the call and dropped before it returns, so any
//! number of threads may encode the same raster at once.
//!
//! # Examples
//!
//! ```ignore
//! use mcpng_core::encode::{encode_png, ParameterTuple};
//!
//! let png_bytes = encode_png(&raster, &ParameterTuple::default()).unwrap();
//! println!("Encoded {} bytes", png_bytes.len());
//! ```

mod deflate;
mod filter;
mod interlace;
mod params;
mod writer;

pub use deflate::zlib_compress;
pub use filter::{apply_filter, RowFilter};
pub use interlace::{adam7_passes, Pass};
pub use params::{
    Filter, FilterMask, InterlaceMode, ParameterTuple, Strategy, DEFAULT_MEMORY_LEVEL,
    MAX_COMPRESSION_LEVEL, MEMORY_LEVELS,
};
pub use writer::{write_png, ChunkWriter};

use thiserror::Error;

use crate::decode::RasterImage;

/// Errors that can occur while encoding one raster under one tuple.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// A tuple field is out of range.
    #[error("Invalid encoder parameters: {0}")]
    InvalidParameters(String),

    /// The raster cannot be encoded.
    #[error("Invalid raster: {0}")]
    InvalidRaster(String),

    /// The deflate stream could not be produced.
    #[error("Deflate failed: {0}")]
    Deflate(String),
}

/// A deterministic, stateless raster encoder.
///
/// Implementations must not share mutable state between calls: the search
/// engine invokes `encode` concurrently from every worker.
pub trait Encoder: Sync {
    fn encode(&self, raster: &RasterImage, params: &ParameterTuple) -> Result<Vec<u8>, EncodeError>;
}

impl<F> Encoder for F
where
    F: Fn(&RasterImage, &ParameterTuple) -> Result<Vec<u8>, EncodeError> + Sync,
{
    fn encode(&self, raster: &RasterImage, params: &ParameterTuple) -> Result<Vec<u8>, EncodeError> {
        self(raster, params)
    }
}

/// The built-in PNG encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngEncoder;

impl Encoder for PngEncoder {
    fn encode(&self, raster: &RasterImage, params: &ParameterTuple) -> Result<Vec<u8>, EncodeError> {
        encode_png(raster, params)
    }
}

/// Encode a raster to PNG bytes under one parameter tuple.
///
/// # Errors
///
/// Returns `EncodeError::InvalidParameters` for out-of-range tuples,
/// `EncodeError::InvalidRaster` for indexed rasters without a palette, and
/// `EncodeError::Deflate` if compression fails.
pub fn encode_png(raster: &RasterImage, params: &ParameterTuple) -> Result<Vec<u8>, EncodeError> {
    params.validate()?;
    raster
        .validate()
        .map_err(|e| EncodeError::InvalidRaster(e.to_string()))?;

    let filtered = filter_image(raster, params);
    let zdata = zlib_compress(&filtered, params.compression_level, params.strategy)?;
    Ok(write_png(raster, params.interlace, &zdata))
}

/// Produce the filtered scanline stream that goes into IDAT.
fn filter_image(raster: &RasterImage, params: &ParameterTuple) -> Vec<u8> {
    let bpp_bits = raster.bits_per_pixel();
    let mut out = Vec::with_capacity(raster.byte_size() + raster.height() as usize * 8);

    match params.interlace {
        InterlaceMode::None => filter_rows(raster.rows(), params.filters, bpp_bits, &mut out),
        InterlaceMode::Adam7 => {
            for pass in adam7_passes(raster) {
                filter_rows(&pass.rows, params.filters, bpp_bits, &mut out);
            }
        }
    }

    out
}

fn filter_rows(rows: &[Vec<u8>], mask: FilterMask, bpp_bits: usize, out: &mut Vec<u8>) {
    let mut filter = RowFilter::new(mask, bpp_bits);
    let mut prev: Option<&[u8]> = None;
    for row in rows {
        filter.filter_row(row, prev, out);
        prev = Some(row.as_slice());
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::{
        encode_png, FilterMask, InterlaceMode, ParameterTuple, Strategy as ZlibStrategy,
        DEFAULT_MEMORY_LEVEL,
    };
    use crate::decode::{decode_png, BitDepth, ColorType, RasterImage};
    use proptest::prelude::*;

    /// Strategy for (color type, bit depth) pairs PNG allows.
    fn format_strategy() -> impl Strategy<Value = (ColorType, BitDepth)> {
        prop_oneof![
            Just((ColorType::Grayscale, BitDepth::One)),
            Just((ColorType::Grayscale, BitDepth::Two)),
            Just((ColorType::Grayscale, BitDepth::Four)),
            Just((ColorType::Grayscale, BitDepth::Eight)),
            Just((ColorType::Grayscale, BitDepth::Sixteen)),
            Just((ColorType::GrayscaleAlpha, BitDepth::Eight)),
            Just((ColorType::Rgb, BitDepth::Eight)),
            Just((ColorType::Rgb, BitDepth::Sixteen)),
            Just((ColorType::Rgba, BitDepth::Eight)),
            Just((ColorType::Rgba, BitDepth::Sixteen)),
        ]
    }

    fn params_strategy() -> impl Strategy<Value = ParameterTuple> {
        (
            prop_oneof![Just(InterlaceMode::None), Just(InterlaceMode::Adam7)],
            (1u8..=31).prop_map(|bits| FilterMask::from_bits(bits << 3).unwrap()),
            0u8..=9,
            prop_oneof![
                Just(ZlibStrategy::Default),
                Just(ZlibStrategy::Filtered),
                Just(ZlibStrategy::HuffmanOnly),
                Just(ZlibStrategy::Rle),
                Just(ZlibStrategy::Fixed),
            ],
        )
            .prop_map(|(interlace, filters, compression_level, strategy)| ParameterTuple {
                interlace,
                filters,
                compression_level,
                memory_level: DEFAULT_MEMORY_LEVEL,
                strategy,
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Property: decoding any encoding reproduces the raster exactly.
        #[test]
        fn prop_lossless_roundtrip(
            (color_type, bit_depth) in format_strategy(),
            width in 1u32..=19,
            height in 1u32..=19,
            seed in any::<u64>(),
            params in params_strategy(),
        ) {
            let stride = crate::decode::row_bytes(width, color_type, bit_depth);
            let mut state = seed | 1;
            let data: Vec<u8> = (0..stride * height as usize)
                .map(|_| {
                    state ^= state << 13;
                    state ^= state >> 7;
                    state ^= state << 17;
                    (state >> 24) as u8
                })
                .collect();
            let raster = RasterImage::from_packed(width, height, color_type, bit_depth, &data).unwrap();

            let png = encode_png(&raster, &params).unwrap();
            let decoded = decode_png(&png).unwrap();
            prop_assert_eq!(decoded, raster);
        }
    }
}
