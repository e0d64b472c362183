//! mcpng WASM - WebAssembly bindings for mcpng
//!
//! This crate exposes the mcpng-core optimizer to JavaScript/TypeScript.
//!
//! # Module Structure
//!
//! - `types` - WASM-compatible wrappers for configs, reports and raster info
//! - `optimize` - Optimization and inspection bindings
//!
//! # Usage
//!
//! ```typescript
//! import init, { optimize_png, inspect_png } from '@mcpng/wasm';
//!
//! await init();
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const info = inspect_png(bytes);
//! const smaller = optimize_png(bytes, 5);
//! console.log(`${info.width}x${info.height}: ${bytes.length} -> ${smaller.length}`);
//! ```

use wasm_bindgen::prelude::*;

mod optimize;
mod types;

pub use optimize::{effort_level_jobs, inspect_png, optimize_png, optimize_png_with_config};
pub use types::{JsOptimized, JsOptimizerConfig, JsRasterInfo};

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    mcpng_core::VERSION.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
        assert_eq!(version(), env!("CARGO_PKG_VERSION"));
    }
}
