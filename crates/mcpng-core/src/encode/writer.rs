//! PNG chunk serialization.

use crate::decode::{Background, RasterImage, Transparency, PNG_SIGNATURE};

use super::params::InterlaceMode;

/// Largest chunk payload allowed by the PNG format.
const MAX_CHUNK_LEN: usize = 0x7FFF_FFFF;

/// Appends chunks to an in-memory PNG stream.
pub struct ChunkWriter {
    out: Vec<u8>,
}

impl ChunkWriter {
    /// Start a stream with the PNG signature. `capacity` is only a hint.
    pub fn new(capacity: usize) -> Self {
        let mut out = Vec::with_capacity(capacity);
        out.extend_from_slice(&PNG_SIGNATURE);
        Self { out }
    }

    /// Append one chunk: length, type, data, CRC over type and data.
    pub fn chunk(&mut self, kind: &[u8; 4], data: &[u8]) {
        debug_assert!(data.len() <= MAX_CHUNK_LEN);
        self.out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        let crc_start = self.out.len();
        self.out.extend_from_slice(kind);
        self.out.extend_from_slice(data);
        let crc = crc32fast::hash(&self.out[crc_start..]);
        self.out.extend_from_slice(&crc.to_be_bytes());
    }

    pub fn finish(self) -> Vec<u8> {
        self.out
    }
}

/// Serialize a complete PNG from a raster and its compressed image data.
pub fn write_png(raster: &RasterImage, interlace: InterlaceMode, zdata: &[u8]) -> Vec<u8> {
    let mut writer = ChunkWriter::new(zdata.len() + 128);

    writer.chunk(b"IHDR", &ihdr(raster, interlace));

    if let Some(palette) = raster.palette() {
        let plte: Vec<u8> = palette.iter().flat_map(|c| [c.r, c.g, c.b]).collect();
        writer.chunk(b"PLTE", &plte);
    }
    if let Some(trns) = raster.transparency() {
        writer.chunk(b"tRNS", &trns_payload(trns));
    }
    if let Some(bkgd) = raster.background() {
        writer.chunk(b"bKGD", &bkgd_payload(bkgd));
    }

    // A single IDAT saves 12 bytes per extra chunk.
    if zdata.is_empty() {
        writer.chunk(b"IDAT", &[]);
    }
    for part in zdata.chunks(MAX_CHUNK_LEN) {
        writer.chunk(b"IDAT", part);
    }

    writer.chunk(b"IEND", &[]);
    writer.finish()
}

fn ihdr(raster: &RasterImage, interlace: InterlaceMode) -> [u8; 13] {
    let mut ihdr = [0u8; 13];
    ihdr[0..4].copy_from_slice(&raster.width().to_be_bytes());
    ihdr[4..8].copy_from_slice(&raster.height().to_be_bytes());
    ihdr[8] = raster.bit_depth().bits();
    ihdr[9] = raster.color_type().code();
    // Compression method 0 and filter method 0 are the only defined values.
    ihdr[10] = 0;
    ihdr[11] = 0;
    ihdr[12] = interlace.code();
    ihdr
}

fn trns_payload(trns: &Transparency) -> Vec<u8> {
    match trns {
        Transparency::Palette(alpha) => alpha.clone(),
        Transparency::Gray(v) => v.to_be_bytes().to_vec(),
        Transparency::Rgb(r, g, b) => [r, g, b].iter().flat_map(|v| v.to_be_bytes()).collect(),
    }
}

fn bkgd_payload(bkgd: Background) -> Vec<u8> {
    match bkgd {
        Background::Palette(i) => vec![i],
        Background::Gray(v) => v.to_be_bytes().to_vec(),
        Background::Rgb(r, g, b) => [r, g, b].iter().flat_map(|v| v.to_be_bytes()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{BitDepth, ColorType};

    #[test]
    fn test_chunk_layout_and_crc() {
        let mut writer = ChunkWriter::new(0);
        writer.chunk(b"IEND", &[]);
        let bytes = writer.finish();
        assert_eq!(&bytes[..8], &PNG_SIGNATURE);
        // The IEND chunk is fixed: zero length, type, CRC AE 42 60 82.
        assert_eq!(
            &bytes[8..],
            &[0, 0, 0, 0, b'I', b'E', b'N', b'D', 0xAE, 0x42, 0x60, 0x82]
        );
    }

    #[test]
    fn test_ihdr_fields() {
        let raster =
            RasterImage::from_packed(300, 2, ColorType::Rgba, BitDepth::Eight, &[0u8; 2400])
                .unwrap();
        let ihdr = ihdr(&raster, InterlaceMode::Adam7);
        assert_eq!(&ihdr[0..4], &300u32.to_be_bytes());
        assert_eq!(&ihdr[4..8], &2u32.to_be_bytes());
        assert_eq!(ihdr[8], 8);
        assert_eq!(ihdr[9], 6);
        assert_eq!(ihdr[12], 1);
    }

    #[test]
    fn test_payloads() {
        assert_eq!(trns_payload(&Transparency::Gray(0x0102)), vec![1, 2]);
        assert_eq!(
            trns_payload(&Transparency::Rgb(1, 2, 3)),
            vec![0, 1, 0, 2, 0, 3]
        );
        assert_eq!(bkgd_payload(Background::Palette(9)), vec![9]);
        assert_eq!(bkgd_payload(Background::Gray(0xFFFF)), vec![0xFF, 0xFF]);
    }
}
