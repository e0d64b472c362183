//! mcpng Core - Parallel exhaustive PNG re-encoding
//!
//! This crate decodes an image once, encodes it under every parameter tuple of
//! an effort level's grid on a pool of worker threads, and keeps the smallest
//! PNG. The output is lossless and identical for any worker count.
//!
//! # Module Structure
//!
//! - `decode` - PNG and foreign-format raster sources
//! - `encode` - Parameter tuples and the PNG encoder
//! - `search` - Grid generation, job queue, worker pool, reduction
//! - `config` - Optimizer settings
//! - `optimize` - The end-to-end pipeline

pub mod config;
pub mod decode;
pub mod encode;
pub mod error;
pub mod optimize;
pub mod search;

pub use config::{BypassPolicy, OptimizerConfig};
pub use decode::{decode, inspect, DecodeError, RasterImage, RasterInfo};
pub use encode::{encode_png, EncodeError, Encoder, ParameterTuple, PngEncoder};
pub use error::OptimizeError;
pub use optimize::{optimize, Optimized, Optimizer, SearchReport};
pub use search::{search, EffortLevel, SearchError, SearchOptions, SearchOutcome};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
