//! WASM-compatible wrapper types.
//!
//! These types wrap the core mcpng types and expose them to JavaScript through
//! getters, converting enums to their PNG codes or names.

use mcpng_core::{OptimizerConfig, RasterInfo, SearchReport};
use wasm_bindgen::prelude::*;

/// Raster layout of a decoded input.
#[wasm_bindgen]
pub struct JsRasterInfo {
    inner: RasterInfo,
}

#[wasm_bindgen]
impl JsRasterInfo {
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    #[wasm_bindgen(getter)]
    pub fn bit_depth(&self) -> u8 {
        self.inner.bit_depth
    }

    /// PNG color type code (0, 2, 3, 4 or 6).
    #[wasm_bindgen(getter)]
    pub fn color_type(&self) -> u8 {
        self.inner.color_type.code()
    }

    /// Number of palette entries, 0 for non-indexed rasters.
    #[wasm_bindgen(getter)]
    pub fn palette_len(&self) -> usize {
        self.inner.palette_len
    }

    #[wasm_bindgen(getter)]
    pub fn has_transparency(&self) -> bool {
        self.inner.has_transparency
    }

    #[wasm_bindgen(getter)]
    pub fn has_background(&self) -> bool {
        self.inner.has_background
    }
}

impl From<RasterInfo> for JsRasterInfo {
    fn from(inner: RasterInfo) -> Self {
        Self { inner }
    }
}

/// Optimizer settings wrapper for JavaScript
#[wasm_bindgen]
pub struct JsOptimizerConfig {
    inner: OptimizerConfig,
}

#[wasm_bindgen]
impl JsOptimizerConfig {
    /// Create a config with default values
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            inner: OptimizerConfig::default(),
        }
    }

    #[wasm_bindgen(getter)]
    pub fn effort_level(&self) -> u8 {
        self.inner.effort_level.get()
    }

    /// Set the effort level; values outside 0..=7 are clamped.
    #[wasm_bindgen(setter)]
    pub fn set_effort_level(&mut self, value: i32) {
        self.inner = self.inner.clone().with_effort_level(value);
    }

    #[wasm_bindgen(getter)]
    pub fn keep_smaller_input(&self) -> bool {
        self.inner.keep_smaller_input
    }

    #[wasm_bindgen(setter)]
    pub fn set_keep_smaller_input(&mut self, value: bool) {
        self.inner.keep_smaller_input = value;
    }

    /// Serialize to a plain JS object
    pub fn to_json(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Deserialize from a plain JS object; missing fields take defaults
    pub fn from_json(value: JsValue) -> Result<JsOptimizerConfig, JsValue> {
        let inner: OptimizerConfig =
            serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self { inner })
    }
}

impl Default for JsOptimizerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl JsOptimizerConfig {
    pub(crate) fn inner(&self) -> &OptimizerConfig {
        &self.inner
    }
}

/// Optimized PNG bytes plus the search report.
#[wasm_bindgen]
pub struct JsOptimized {
    bytes: Vec<u8>,
    report: SearchReport,
}

#[wasm_bindgen]
impl JsOptimized {
    /// Returns the PNG bytes as a Uint8Array (copied out of WASM memory).
    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn input_size(&self) -> usize {
        self.report.input_size
    }

    #[wasm_bindgen(getter)]
    pub fn output_size(&self) -> usize {
        self.report.output_size
    }

    /// Number of parameter combinations tried.
    #[wasm_bindgen(getter)]
    pub fn jobs(&self) -> usize {
        self.report.jobs
    }

    #[wasm_bindgen(getter)]
    pub fn kept_input(&self) -> bool {
        self.report.kept_input
    }

    /// The full report as a plain JS object
    pub fn report(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.report).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

impl From<mcpng_core::Optimized> for JsOptimized {
    fn from(optimized: mcpng_core::Optimized) -> Self {
        Self {
            bytes: optimized.bytes,
            report: optimized.report,
        }
    }
}
