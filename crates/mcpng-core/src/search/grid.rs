//! Effort levels and the parameter grid they select.

use serde::{Deserialize, Serialize};

use crate::decode::RasterImage;
use crate::encode::{FilterMask, InterlaceMode, ParameterTuple, Strategy, DEFAULT_MEMORY_LEVEL};

use super::Job;

/// How hard to search, clamped to `0..=7`.
///
/// Level 0 has an empty grid and means "do not brute-force".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub struct EffortLevel(u8);

impl EffortLevel {
    pub const MIN: EffortLevel = EffortLevel(0);
    pub const MAX: EffortLevel = EffortLevel(7);
    pub const DEFAULT: EffortLevel = EffortLevel(5);

    /// Clamp any integer into the supported range.
    pub fn new(level: i32) -> Self {
        EffortLevel(level.clamp(i32::from(Self::MIN.0), i32::from(Self::MAX.0)) as u8)
    }

    #[inline]
    pub fn get(self) -> u8 {
        self.0
    }

    pub fn preset(self) -> &'static Preset {
        &PRESETS[usize::from(self.0)]
    }

    /// Number of jobs this level generates.
    pub fn job_count(self) -> usize {
        self.preset().len()
    }

    /// Every supported level, lowest first.
    pub fn all() -> impl Iterator<Item = EffortLevel> {
        (Self::MIN.0..=Self::MAX.0).map(EffortLevel)
    }
}

impl Default for EffortLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<i32> for EffortLevel {
    fn from(level: i32) -> Self {
        Self::new(level)
    }
}

impl From<EffortLevel> for i32 {
    fn from(level: EffortLevel) -> i32 {
        i32::from(level.0)
    }
}

/// Candidate values for each tuple field at one effort level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub interlace: &'static [InterlaceMode],
    pub filters: &'static [FilterMask],
    pub compression_levels: &'static [u8],
    pub memory_levels: &'static [u8],
    pub strategies: &'static [Strategy],
}

impl Preset {
    /// Size of the Cartesian product.
    pub fn len(&self) -> usize {
        self.interlace.len()
            * self.filters.len()
            * self.compression_levels.len()
            * self.memory_levels.len()
            * self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Enumerate tuples with interlace varying slowest and strategy fastest.
    pub fn tuples(&self) -> impl Iterator<Item = ParameterTuple> + '_ {
        self.interlace.iter().flat_map(move |&interlace| {
            self.filters.iter().flat_map(move |&filters| {
                self.compression_levels.iter().flat_map(move |&compression_level| {
                    self.memory_levels.iter().flat_map(move |&memory_level| {
                        self.strategies.iter().map(move |&strategy| ParameterTuple {
                            interlace,
                            filters,
                            compression_level,
                            memory_level,
                            strategy,
                        })
                    })
                })
            })
        })
    }

    /// True if every candidate set of `self` contains the matching set of `other`.
    pub fn includes(&self, other: &Preset) -> bool {
        fn subset<T: PartialEq>(small: &[T], big: &[T]) -> bool {
            small.iter().all(|v| big.contains(v))
        }
        other.is_empty()
            || (subset(other.interlace, self.interlace)
                && subset(other.filters, self.filters)
                && subset(other.compression_levels, self.compression_levels)
                && subset(other.memory_levels, self.memory_levels)
                && subset(other.strategies, self.strategies))
    }
}

const NO_INTERLACE: &[InterlaceMode] = &[InterlaceMode::None];
const BOTH_INTERLACE: &[InterlaceMode] = &[InterlaceMode::None, InterlaceMode::Adam7];

const SUB_UP: FilterMask = FilterMask::SUB.union(FilterMask::UP);
const SUB_AVG: FilterMask = FilterMask::SUB.union(FilterMask::AVG);
const SUB_PAETH: FilterMask = FilterMask::SUB.union(FilterMask::PAETH);
const UP_AVG: FilterMask = FilterMask::UP.union(FilterMask::AVG);
const UP_PAETH: FilterMask = FilterMask::UP.union(FilterMask::PAETH);
const AVG_PAETH: FilterMask = FilterMask::AVG.union(FilterMask::PAETH);

const SINGLE_FILTERS: &[FilterMask] = &[
    FilterMask::ALL,
    FilterMask::NONE,
    FilterMask::SUB,
    FilterMask::UP,
    FilterMask::AVG,
    FilterMask::PAETH,
];
const PAIR_FILTERS: &[FilterMask] = &[
    FilterMask::ALL,
    FilterMask::NONE,
    FilterMask::SUB,
    FilterMask::UP,
    FilterMask::AVG,
    FilterMask::PAETH,
    SUB_UP,
    SUB_AVG,
    SUB_PAETH,
    UP_AVG,
    UP_PAETH,
    AVG_PAETH,
];
const TRIPLE_FILTERS: &[FilterMask] = &[
    FilterMask::ALL,
    FilterMask::NONE,
    FilterMask::SUB,
    FilterMask::UP,
    FilterMask::AVG,
    FilterMask::PAETH,
    SUB_UP,
    SUB_AVG,
    SUB_PAETH,
    UP_AVG,
    UP_PAETH,
    AVG_PAETH,
    SUB_UP.union(FilterMask::AVG),
    SUB_UP.union(FilterMask::PAETH),
    SUB_AVG.union(FilterMask::PAETH),
];

const DEFAULT_MEMORY: &[u8] = &[DEFAULT_MEMORY_LEVEL];

const EMPTY: Preset = Preset {
    interlace: &[],
    filters: &[],
    compression_levels: &[],
    memory_levels: &[],
    strategies: &[],
};

/// Presets indexed by effort level.
pub static PRESETS: [Preset; 8] = [
    EMPTY,
    Preset {
        interlace: NO_INTERLACE,
        filters: &[FilterMask::ALL],
        compression_levels: &[9],
        memory_levels: DEFAULT_MEMORY,
        strategies: &[Strategy::Default],
    },
    Preset {
        interlace: NO_INTERLACE,
        filters: &[FilterMask::ALL, FilterMask::NONE],
        compression_levels: &[9],
        memory_levels: DEFAULT_MEMORY,
        strategies: &[Strategy::Default, Strategy::Filtered],
    },
    Preset {
        interlace: NO_INTERLACE,
        filters: SINGLE_FILTERS,
        compression_levels: &[9],
        memory_levels: DEFAULT_MEMORY,
        strategies: &[Strategy::Default, Strategy::Filtered],
    },
    Preset {
        interlace: NO_INTERLACE,
        filters: SINGLE_FILTERS,
        compression_levels: &[9, 8],
        memory_levels: DEFAULT_MEMORY,
        strategies: &[Strategy::Default, Strategy::Filtered, Strategy::HuffmanOnly],
    },
    Preset {
        interlace: BOTH_INTERLACE,
        filters: SINGLE_FILTERS,
        compression_levels: &[9, 8],
        memory_levels: DEFAULT_MEMORY,
        strategies: &[Strategy::Default, Strategy::Filtered, Strategy::HuffmanOnly],
    },
    Preset {
        interlace: BOTH_INTERLACE,
        filters: PAIR_FILTERS,
        compression_levels: &[9, 8, 7],
        memory_levels: DEFAULT_MEMORY,
        strategies: &[
            Strategy::Default,
            Strategy::Filtered,
            Strategy::HuffmanOnly,
            Strategy::Rle,
        ],
    },
    Preset {
        interlace: BOTH_INTERLACE,
        filters: TRIPLE_FILTERS,
        compression_levels: &[9, 8, 7, 6, 5, 4, 3],
        memory_levels: DEFAULT_MEMORY,
        strategies: &[
            Strategy::Default,
            Strategy::Filtered,
            Strategy::HuffmanOnly,
            Strategy::Rle,
            Strategy::Fixed,
        ],
    },
];

/// Wrap every tuple of the level's grid into a job over `raster`.
///
/// Sequence numbers follow generation order and start at zero.
pub fn generate_jobs(raster: &RasterImage, level: EffortLevel) -> Vec<Job<'_>> {
    level
        .preset()
        .tuples()
        .enumerate()
        .map(|(seq, params)| Job { seq, params, raster })
        .collect()
}


#[cfg(test)]
mod proptests {
    use super::EffortLevel;
    use proptest::prelude::*;

    proptest! {
        /// Property: higher effort never yields fewer jobs.
        #[test]
        fn prop_job_count_monotonic(a in -10i32..20, b in -10i32..20) {
            let (lo, hi) = (EffortLevel::new(a.min(b)), EffortLevel::new(a.max(b)));
            prop_assert!(lo.job_count() <= hi.job_count());
            prop_assert!(hi.preset().includes(lo.preset()));
        }
    }
}
