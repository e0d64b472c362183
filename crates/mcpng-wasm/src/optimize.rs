//! Optimization WASM bindings.
//!
//! # Functions
//!
//! - [`optimize_png`] - Optimize at an effort level with default settings
//! - [`optimize_png_with_config`] - Optimize with a full config and get a report
//! - [`inspect_png`] - Describe an input's raster without searching
//! - [`effort_level_jobs`] - Grid size of an effort level
//!
//! Browsers cannot spawn threads from plain WASM, so searches run on the
//! calling thread.

use crate::types::{JsOptimized, JsOptimizerConfig, JsRasterInfo};
use mcpng_core::{EffortLevel, Optimizer};
use wasm_bindgen::prelude::*;

/// Optimize a PNG (or BMP, GIF, JPEG, PNM, TIFF) and return the smallest PNG.
///
/// # Arguments
/// * `bytes` - The input file
/// * `level` - Effort level, clamped to 0..=7
///
/// # Errors
/// Returns an error if the input cannot be decoded or no encoding succeeds.
#[wasm_bindgen]
pub fn optimize_png(bytes: &[u8], level: i32) -> Result<Vec<u8>, JsValue> {
    mcpng_core::optimize(bytes, level).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Optimize with a config object such as `{ effort_level: 6, bypass: "passthrough" }`.
///
/// Missing fields take their defaults.
#[wasm_bindgen]
pub fn optimize_png_with_config(bytes: &[u8], config: JsValue) -> Result<JsOptimized, JsValue> {
    let config = JsOptimizerConfig::from_json(config)?;
    Optimizer::new(config.inner().clone())
        .optimize(bytes)
        .map(JsOptimized::from)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Decode an input and describe its raster.
#[wasm_bindgen]
pub fn inspect_png(bytes: &[u8]) -> Result<JsRasterInfo, JsValue> {
    mcpng_core::inspect(bytes)
        .map(JsRasterInfo::from)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Number of encodings an effort level tries.
#[wasm_bindgen]
pub fn effort_level_jobs(level: i32) -> usize {
    EffortLevel::new(level).job_count()
}

/// Tests for optimize bindings.
///
/// Note: Functions returning `Result<T, JsValue>` only work on wasm32 targets.
/// The pipeline itself is covered by the tests in `mcpng_core::optimize`.
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effort_level_jobs() {
        assert_eq!(effort_level_jobs(-1), 0);
        assert_eq!(effort_level_jobs(1), 1);
        assert_eq!(effort_level_jobs(5), 72);
        assert_eq!(effort_level_jobs(100), 1050);
    }
}
