//! Scanline filtering.
//!
//! Each row is written as one filter-type byte followed by the filtered bytes.
//! When more than one filter is allowed, the row's filter is picked with the
//! minimum-sum-of-absolute-differences heuristic libpng uses.

use super::params::{Filter, FilterMask};

/// Apply `filter` to `row`, writing residuals into `out`.
///
/// `prev` is the previous row of the same pass, or `None` for the first row.
/// `bpp` is the filter distance in bytes (at least 1).
pub fn apply_filter(filter: Filter, row: &[u8], prev: Option<&[u8]>, bpp: usize, out: &mut [u8]) {
    debug_assert_eq!(row.len(), out.len());
    let above = |i: usize| prev.map_or(0, |p| p[i]);

    match filter {
        Filter::None => out.copy_from_slice(row),
        Filter::Sub => {
            for i in 0..row.len() {
                let left = if i >= bpp { row[i - bpp] } else { 0 };
                out[i] = row[i].wrapping_sub(left);
            }
        }
        Filter::Up => {
            for i in 0..row.len() {
                out[i] = row[i].wrapping_sub(above(i));
            }
        }
        Filter::Avg => {
            for i in 0..row.len() {
                let left = if i >= bpp { u16::from(row[i - bpp]) } else { 0 };
                let avg = ((left + u16::from(above(i))) / 2) as u8;
                out[i] = row[i].wrapping_sub(avg);
            }
        }
        Filter::Paeth => {
            for i in 0..row.len() {
                let (left, upper_left) = if i >= bpp {
                    (row[i - bpp], above(i - bpp))
                } else {
                    (0, 0)
                };
                out[i] = row[i].wrapping_sub(paeth_predictor(left, above(i), upper_left));
            }
        }
    }
}

#[inline]
fn paeth_predictor(a: u8, b: u8, c: u8) -> u8 {
    let p = i16::from(a) + i16::from(b) - i16::from(c);
    let pa = (p - i16::from(a)).abs();
    let pb = (p - i16::from(b)).abs();
    let pc = (p - i16::from(c)).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

/// Heuristic cost of a filtered row: residuals read as signed bytes.
#[inline]
fn row_cost(residuals: &[u8]) -> u64 {
    residuals
        .iter()
        .map(|&v| u64::from((v as i8).unsigned_abs()))
        .sum()
}

/// Reusable scratch space for filtering rows of one pass.
pub struct RowFilter {
    mask: FilterMask,
    bpp: usize,
    candidate: Vec<u8>,
    best: Vec<u8>,
}

impl RowFilter {
    pub fn new(mask: FilterMask, bits_per_pixel: usize) -> Self {
        Self {
            mask,
            bpp: bits_per_pixel.div_ceil(8).max(1),
            candidate: Vec::new(),
            best: Vec::new(),
        }
    }

    /// Filter one row and append the filter byte plus residuals to `out`.
    pub fn filter_row(&mut self, row: &[u8], prev: Option<&[u8]>, out: &mut Vec<u8>) {
        self.best.resize(row.len(), 0);

        if let Some(filter) = self.mask.single() {
            apply_filter(filter, row, prev, self.bpp, &mut self.best);
            out.push(filter.code());
            out.extend_from_slice(&self.best);
            return;
        }

        self.candidate.resize(row.len(), 0);
        let mut best_filter = None;
        let mut best_cost = u64::MAX;
        for filter in self.mask.filters() {
            apply_filter(filter, row, prev, self.bpp, &mut self.candidate);
            let cost = row_cost(&self.candidate);
            if cost < best_cost {
                best_cost = cost;
                best_filter = Some(filter);
                std::mem::swap(&mut self.best, &mut self.candidate);
            }
        }

        let filter = best_filter.unwrap_or(Filter::None);
        if best_filter.is_none() {
            self.best.copy_from_slice(row);
        }
        out.push(filter.code());
        out.extend_from_slice(&self.best);
    }
}
