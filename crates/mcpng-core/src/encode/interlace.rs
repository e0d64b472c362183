//! Adam7 pass extraction.

use crate::decode::RasterImage;

/// (x start, y start, x step, y step) for each of the seven passes.
const ADAM7: [(u32, u32, u32, u32); 7] = [
    (0, 0, 8, 8),
    (4, 0, 8, 8),
    (0, 4, 4, 8),
    (2, 0, 4, 4),
    (0, 2, 2, 4),
    (1, 0, 2, 2),
    (0, 1, 1, 2),
];

/// The reduced image of one Adam7 pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pass {
    pub width: u32,
    pub rows: Vec<Vec<u8>>,
}

/// Number of samples a pass takes along one axis.
#[inline]
fn pass_extent(full: u32, start: u32, step: u32) -> u32 {
    if full > start {
        (full - start).div_ceil(step)
    } else {
        0
    }
}

/// Split a raster into its seven Adam7 passes, dropping empty ones.
pub fn adam7_passes(raster: &RasterImage) -> Vec<Pass> {
    let bpp_bits = raster.bits_per_pixel();
    let mut passes = Vec::with_capacity(ADAM7.len());

    for &(x0, y0, dx, dy) in &ADAM7 {
        let width = pass_extent(raster.width(), x0, dx);
        let height = pass_extent(raster.height(), y0, dy);
        if width == 0 || height == 0 {
            continue;
        }

        let row_len = (width as usize * bpp_bits).div_ceil(8);
        let rows = (0..height)
            .map(|py| {
                let src = &raster.rows()[(y0 + py * dy) as usize];
                let mut dst = vec![0u8; row_len];
                for px in 0..width {
                    let sx = (x0 + px * dx) as usize;
                    copy_pixel(src, sx, &mut dst, px as usize, bpp_bits);
                }
                dst
            })
            .collect();

        passes.push(Pass { width, rows });
    }

    passes
}

/// Copy pixel `sx` of `src` to pixel `dx` of `dst`.
#[inline]
fn copy_pixel(src: &[u8], sx: usize, dst: &mut [u8], dx: usize, bpp_bits: usize) {
    if bpp_bits >= 8 {
        let n = bpp_bits / 8;
        dst[dx * n..dx * n + n].copy_from_slice(&src[sx * n..sx * n + n]);
        return;
    }

    // Sub-byte samples are packed most significant bits first.
    let mask = (1u8 << bpp_bits) - 1;
    let src_bit = sx * bpp_bits;
    let value = (src[src_bit / 8] >> (8 - bpp_bits - src_bit % 8)) & mask;
    let dst_bit = dx * bpp_bits;
    dst[dst_bit / 8] |= value << (8 - bpp_bits - dst_bit % 8);
}
