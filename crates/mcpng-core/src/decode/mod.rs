//! Raster decoding for mcpng.
//!
//! This module provides functionality for:
//! - Decoding PNG files without changing their color type, bit depth or palette
//! - Decoding BMP, GIF, JPEG, PNM and TIFF inputs into an equivalent raster
//! - Inspecting a file's raster layout without running a search
//!
//! # Architecture
//!
//! Decoding happens once per optimization, on the calling thread, before any
//! search job exists. The resulting [`RasterImage`] is immutable and is shared
//! by reference with every worker.
//!
//! # Examples
//!
//! ```ignore
//! use mcpng_core::decode::decode;
//!
//! let bytes = std::fs::read("image.png").unwrap();
//! let raster = decode(&bytes).unwrap();
//! println!("Decoded {}x{} raster", raster.width(), raster.height());
//! ```

mod foreign;
mod png_reader;
mod types;

pub use foreign::{decode_foreign, detect_foreign_format, from_dynamic};
pub use png_reader::{decode_png, is_png, PNG_SIGNATURE};
pub use types::{
    row_bytes, Background, BitDepth, ColorType, DecodeError, RasterImage, RasterInfo, Rgb,
    Transparency,
};

/// Decode any supported input into a raster.
///
/// PNG is recognized by its signature; everything else goes through
/// [`decode_foreign`].
pub fn decode(bytes: &[u8]) -> Result<RasterImage, DecodeError> {
    if is_png(bytes) {
        decode_png(bytes)
    } else {
        decode_foreign(bytes)
    }
}

/// Decode an input and summarize its raster layout.
pub fn inspect(bytes: &[u8]) -> Result<RasterInfo, DecodeError> {
    decode(bytes).map(|raster| RasterInfo::from(&raster))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_dispatches_on_signature() {
        assert!(matches!(decode(b""), Err(DecodeError::InvalidFormat)));
        assert!(matches!(decode(&PNG_SIGNATURE), Err(DecodeError::CorruptedFile(_))));
    }
}
