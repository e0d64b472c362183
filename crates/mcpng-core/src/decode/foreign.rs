//! Decoding of non-PNG inputs (BMP, GIF, JPEG, PNM, TIFF).
//!
//! These formats are decoded with the `image` crate and converted into the
//! closest PNG raster: gray, gray+alpha, RGB or RGBA at 8 or 16 bits.

use std::io::Cursor;

use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, DynamicImage, ImageFormat, ImageReader};

use super::{BitDepth, ColorType, DecodeError, RasterImage};

/// Formats accepted besides PNG.
const FOREIGN_FORMATS: &[ImageFormat] = &[
    ImageFormat::Bmp,
    ImageFormat::Gif,
    ImageFormat::Jpeg,
    ImageFormat::Pnm,
    ImageFormat::Tiff,
];

/// Detect a supported non-PNG format from the leading bytes.
pub fn detect_foreign_format(bytes: &[u8]) -> Option<ImageFormat> {
    image::guess_format(bytes)
        .ok()
        .filter(|format| FOREIGN_FORMATS.contains(format))
}

/// Decode a non-PNG image into a raster.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the format is not one of the
/// supported foreign formats, `DecodeError::Unsupported` for animated GIFs, and
/// `DecodeError::CorruptedFile` if decoding fails.
pub fn decode_foreign(bytes: &[u8]) -> Result<RasterImage, DecodeError> {
    let format = detect_foreign_format(bytes).ok_or(DecodeError::InvalidFormat)?;

    if format == ImageFormat::Gif && gif_frame_count(bytes)? > 1 {
        return Err(DecodeError::Unsupported("animated GIF".to_string()));
    }

    let mut reader = ImageReader::new(Cursor::new(bytes));
    reader.set_format(format);
    let img = reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    from_dynamic(img)
}

fn gif_frame_count(bytes: &[u8]) -> Result<usize, DecodeError> {
    let decoder =
        GifDecoder::new(Cursor::new(bytes)).map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;
    // Only need to know whether there is more than one frame.
    Ok(decoder.into_frames().take(2).count())
}

/// Convert a decoded `image` buffer into a raster without losing precision.
pub fn from_dynamic(img: DynamicImage) -> Result<RasterImage, DecodeError> {
    let (width, height) = (img.width(), img.height());
    match img {
        DynamicImage::ImageLuma8(buf) => packed8(width, height, ColorType::Grayscale, buf.as_raw()),
        DynamicImage::ImageLumaA8(buf) => {
            packed8(width, height, ColorType::GrayscaleAlpha, buf.as_raw())
        }
        DynamicImage::ImageRgb8(buf) => packed8(width, height, ColorType::Rgb, buf.as_raw()),
        DynamicImage::ImageRgba8(buf) => packed8(width, height, ColorType::Rgba, buf.as_raw()),
        DynamicImage::ImageLuma16(buf) => {
            packed16(width, height, ColorType::Grayscale, buf.as_raw())
        }
        DynamicImage::ImageLumaA16(buf) => {
            packed16(width, height, ColorType::GrayscaleAlpha, buf.as_raw())
        }
        DynamicImage::ImageRgb16(buf) => packed16(width, height, ColorType::Rgb, buf.as_raw()),
        DynamicImage::ImageRgba16(buf) => packed16(width, height, ColorType::Rgba, buf.as_raw()),
        // Float and future variants have no PNG equivalent.
        other => {
            let rgba = other.into_rgba16();
            packed16(width, height, ColorType::Rgba, rgba.as_raw())
        }
    }
}

fn packed8(
    width: u32,
    height: u32,
    color_type: ColorType,
    samples: &[u8],
) -> Result<RasterImage, DecodeError> {
    RasterImage::from_packed(width, height, color_type, BitDepth::Eight, samples)
}

fn packed16(
    width: u32,
    height: u32,
    color_type: ColorType,
    samples: &[u16],
) -> Result<RasterImage, DecodeError> {
    // PNG stores 16-bit samples big-endian.
    let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_be_bytes()).collect();
    RasterImage::from_packed(width, height, color_type, BitDepth::Sixteen, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma, Rgb, RgbImage};

    fn bmp_bytes(img: &RgbImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Bmp).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_detect_foreign_format() {
        let img = RgbImage::from_pixel(2, 2, Rgb([1, 2, 3]));
        assert_eq!(detect_foreign_format(&bmp_bytes(&img)), Some(ImageFormat::Bmp));
        assert_eq!(detect_foreign_format(&crate::decode::PNG_SIGNATURE), None);
        assert_eq!(detect_foreign_format(b"hello world"), None);
    }

    #[test]
    fn test_decode_bmp() {
        let img = RgbImage::from_fn(3, 2, |x, y| Rgb([x as u8 * 10, y as u8 * 20, 7]));
        let raster = decode_foreign(&bmp_bytes(&img)).unwrap();
        assert_eq!(raster.width(), 3);
        assert_eq!(raster.height(), 2);
        assert_eq!(raster.color_type(), ColorType::Rgb);
        assert_eq!(raster.bit_depth(), BitDepth::Eight);
        assert_eq!(raster.rows()[1], vec![0, 20, 7, 10, 20, 7, 20, 20, 7]);
    }

    #[test]
    fn test_decode_rejects_unknown() {
        assert!(matches!(decode_foreign(b"garbage"), Err(DecodeError::InvalidFormat)));
    }

    #[test]
    fn test_from_dynamic_sixteen_bit_is_big_endian() {
        let buf: ImageBuffer<Luma<u16>, Vec<u16>> =
            ImageBuffer::from_raw(2, 1, vec![0x0102, 0xA0B0]).unwrap();
        let raster = from_dynamic(DynamicImage::ImageLuma16(buf)).unwrap();
        assert_eq!(raster.color_type(), ColorType::Grayscale);
        assert_eq!(raster.bit_depth(), BitDepth::Sixteen);
        assert_eq!(raster.rows()[0], vec![0x01, 0x02, 0xA0, 0xB0]);
    }

    #[test]
    fn test_from_dynamic_float_falls_back_to_rgba16() {
        let img = DynamicImage::new_rgb32f(2, 2);
        let raster = from_dynamic(img).unwrap();
        assert_eq!(raster.color_type(), ColorType::Rgba);
        assert_eq!(raster.bit_depth(), BitDepth::Sixteen);
        assert_eq!(raster.row_bytes(), 16);
    }
}
