//! Encoder parameter tuples.
//!
//! A [`ParameterTuple`] is one point in the PNG encoder's configuration space.
//! The numeric codes follow libpng and zlib so tuples read the same way as the
//! equivalent `png_set_*` calls.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::EncodeError;

/// Interlace method written to IHDR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InterlaceMode {
    #[default]
    None,
    Adam7,
}

impl InterlaceMode {
    pub fn code(self) -> u8 {
        match self {
            InterlaceMode::None => 0,
            InterlaceMode::Adam7 => 1,
        }
    }
}

/// One PNG scanline filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Filter {
    None = 0,
    Sub = 1,
    Up = 2,
    Avg = 3,
    Paeth = 4,
}

impl Filter {
    /// All filters in heuristic tie-break order.
    pub const ALL: [Filter; 5] = [
        Filter::None,
        Filter::Sub,
        Filter::Up,
        Filter::Avg,
        Filter::Paeth,
    ];

    /// The filter-type byte that prefixes a filtered row.
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// A non-empty set of filters the encoder may choose from per row.
///
/// Bit values match libpng's `PNG_FILTER_*` masks.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct FilterMask(u8);

impl FilterMask {
    pub const NONE: FilterMask = FilterMask(0x08);
    pub const SUB: FilterMask = FilterMask(0x10);
    pub const UP: FilterMask = FilterMask(0x20);
    pub const AVG: FilterMask = FilterMask(0x40);
    pub const PAETH: FilterMask = FilterMask(0x80);
    pub const ALL: FilterMask = FilterMask(0xF8);

    /// Build a mask from raw libpng bits. Returns `None` if no filter bit is set
    /// or bits outside the filter range are present.
    pub const fn from_bits(bits: u8) -> Option<Self> {
        if bits == 0 || bits & !Self::ALL.0 != 0 {
            None
        } else {
            Some(FilterMask(bits))
        }
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Union of two masks.
    #[inline]
    pub const fn union(self, other: FilterMask) -> FilterMask {
        FilterMask(self.0 | other.0)
    }

    #[inline]
    pub fn contains(self, filter: Filter) -> bool {
        self.0 & Self::of(filter).0 != 0
    }

    /// The mask containing only `filter`.
    pub const fn of(filter: Filter) -> FilterMask {
        match filter {
            Filter::None => Self::NONE,
            Filter::Sub => Self::SUB,
            Filter::Up => Self::UP,
            Filter::Avg => Self::AVG,
            Filter::Paeth => Self::PAETH,
        }
    }

    /// Filters in this mask, in tie-break order.
    pub fn filters(self) -> impl Iterator<Item = Filter> {
        Filter::ALL.into_iter().filter(move |f| self.contains(*f))
    }

    /// The filter if the mask selects exactly one.
    pub fn single(self) -> Option<Filter> {
        let mut it = self.filters();
        match (it.next(), it.next()) {
            (Some(f), None) => Some(f),
            _ => None,
        }
    }
}

impl Default for FilterMask {
    fn default() -> Self {
        Self::ALL
    }
}

impl TryFrom<u8> for FilterMask {
    type Error = EncodeError;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        Self::from_bits(bits).ok_or_else(|| {
            EncodeError::InvalidParameters(format!("invalid filter mask {bits:#04x}"))
        })
    }
}

impl From<FilterMask> for u8 {
    fn from(mask: FilterMask) -> u8 {
        mask.0
    }
}

impl fmt::Debug for FilterMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FilterMask({self})")
    }
}

impl fmt::Display for FilterMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::ALL {
            return f.write_str("all");
        }
        let names: Vec<&str> = self
            .filters()
            .map(|filter| match filter {
                Filter::None => "none",
                Filter::Sub => "sub",
                Filter::Up => "up",
                Filter::Avg => "avg",
                Filter::Paeth => "paeth",
            })
            .collect();
        f.write_str(&names.join("|"))
    }
}

/// zlib compression strategy. Codes match `Z_DEFAULT_STRATEGY` and friends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Strategy {
    #[default]
    Default,
    Filtered,
    HuffmanOnly,
    Rle,
    Fixed,
}

impl Strategy {
    #[inline]
    pub fn code(self) -> i32 {
        match self {
            Strategy::Default => 0,
            Strategy::Filtered => 1,
            Strategy::HuffmanOnly => 2,
            Strategy::Rle => 3,
            Strategy::Fixed => 4,
        }
    }
}

/// Highest zlib compression level.
pub const MAX_COMPRESSION_LEVEL: u8 = 9;
/// Lowest and highest zlib memory level.
pub const MEMORY_LEVELS: std::ops::RangeInclusive<u8> = 1..=9;
/// zlib's default memory level.
pub const DEFAULT_MEMORY_LEVEL: u8 = 8;

/// One combination of encoder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParameterTuple {
    pub interlace: InterlaceMode,
    pub filters: FilterMask,
    pub compression_level: u8,
    pub memory_level: u8,
    pub strategy: Strategy,
}

impl ParameterTuple {
    /// Check that every field is in range.
    pub fn validate(&self) -> Result<(), EncodeError> {
        if self.compression_level > MAX_COMPRESSION_LEVEL {
            return Err(EncodeError::InvalidParameters(format!(
                "compression level {} is above {MAX_COMPRESSION_LEVEL}",
                self.compression_level
            )));
        }
        if !MEMORY_LEVELS.contains(&self.memory_level) {
            return Err(EncodeError::InvalidParameters(format!(
                "memory level {} is outside {MEMORY_LEVELS:?}",
                self.memory_level
            )));
        }
        Ok(())
    }
}

impl Default for ParameterTuple {
    /// libpng's defaults: no interlace, adaptive filtering, level 6.
    fn default() -> Self {
        Self {
            interlace: InterlaceMode::None,
            filters: FilterMask::ALL,
            compression_level: 6,
            memory_level: DEFAULT_MEMORY_LEVEL,
            strategy: Strategy::Default,
        }
    }
}

impl fmt::Display for ParameterTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "i={:?} f={} zc={} zm={} zs={:?}",
            self.interlace, self.filters, self.compression_level, self.memory_level, self.strategy
        )
    }
}
