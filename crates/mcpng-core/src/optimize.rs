//! The decode, search, select pipeline.

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::config::{BypassPolicy, OptimizerConfig};
use crate::decode::{self, RasterImage};
use crate::encode::{Encoder, ParameterTuple, PngEncoder};
use crate::error::OptimizeError;
use crate::search::{generate_jobs, search, EffortLevel};

/// What happened while optimizing one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchReport {
    pub input_size: usize,
    pub output_size: usize,
    pub effort_level: u8,
    /// Jobs attempted; zero when the grid was empty.
    pub jobs: usize,
    pub failed: usize,
    pub workers: usize,
    /// Tuple that produced the output, unless the input was kept.
    pub params: Option<ParameterTuple>,
    /// The grid was empty and the bypass policy applied.
    pub bypassed: bool,
    /// The output is the input, byte for byte.
    pub kept_input: bool,
}

impl SearchReport {
    /// Bytes saved; negative when the output grew.
    pub fn saved(&self) -> i64 {
        self.input_size as i64 - self.output_size as i64
    }
}

/// Optimized bytes and the report that explains them.
#[derive(Debug, Clone)]
pub struct Optimized {
    pub bytes: Vec<u8>,
    pub report: SearchReport,
}

/// Runs the full pipeline under one configuration.
#[derive(Debug, Clone)]
pub struct Optimizer<E = PngEncoder> {
    config: OptimizerConfig,
    encoder: E,
}

impl Optimizer<PngEncoder> {
    pub fn new(config: OptimizerConfig) -> Self {
        Self::with_encoder(config, PngEncoder)
    }
}

impl Default for Optimizer<PngEncoder> {
    fn default() -> Self {
        Self::new(OptimizerConfig::default())
    }
}

impl<E: Encoder> Optimizer<E> {
    pub fn with_encoder(config: OptimizerConfig, encoder: E) -> Self {
        Self { config, encoder }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Decode `bytes`, search the configured grid, and return the smallest PNG.
    ///
    /// # Errors
    ///
    /// Returns `OptimizeError::Decode` before any job runs if the input cannot
    /// be read, `OptimizeError::Search` if no job succeeds, and
    /// `OptimizeError::Encode` if the bypass re-encode fails.
    #[instrument(skip_all, fields(input_len = bytes.len(), level = self.config.effort_level.get()))]
    pub fn optimize(&self, bytes: &[u8]) -> Result<Optimized, OptimizeError> {
        let input_is_png = decode::is_png(bytes);
        let raster = decode::decode(bytes)?;
        debug!(
            width = raster.width(),
            height = raster.height(),
            color_type = ?raster.color_type(),
            bit_depth = raster.bit_depth().bits(),
            "decoded input"
        );

        let level = self.config.effort_level;
        let jobs = generate_jobs(&raster, level);

        let mut report = SearchReport {
            input_size: bytes.len(),
            output_size: 0,
            effort_level: level.get(),
            jobs: jobs.len(),
            failed: 0,
            workers: 0,
            params: None,
            bypassed: jobs.is_empty(),
            kept_input: false,
        };

        let (output, params) = if jobs.is_empty() {
            if self.config.bypass == BypassPolicy::Passthrough && input_is_png {
                debug!("empty grid, passing input through");
                return Ok(self.keep_input(bytes, report));
            }
            self.reencode(&raster)?
        } else {
            let outcome = search(jobs, &self.encoder, &self.config.search_options())?;
            report.failed = outcome.failed;
            report.workers = outcome.workers;
            (outcome.best.bytes, outcome.best.params)
        };

        if input_is_png && self.config.keep_smaller_input && bytes.len() < output.len() {
            debug!(best = output.len(), "input is already smaller than every candidate");
            return Ok(self.keep_input(bytes, report));
        }

        report.output_size = output.len();
        report.params = Some(params);
        info!(
            input = report.input_size,
            output = report.output_size,
            jobs = report.jobs,
            failed = report.failed,
            workers = report.workers,
            params = %params,
            "optimized"
        );
        Ok(Optimized {
            bytes: output,
            report,
        })
    }

    fn reencode(&self, raster: &RasterImage) -> Result<(Vec<u8>, ParameterTuple), OptimizeError> {
        let params = ParameterTuple::default();
        debug!(%params, "empty grid, re-encoding once");
        let output = self.encoder.encode(raster, &params)?;
        Ok((output, params))
    }

    fn keep_input(&self, bytes: &[u8], mut report: SearchReport) -> Optimized {
        report.output_size = bytes.len();
        report.kept_input = true;
        info!(input = report.input_size, jobs = report.jobs, "kept input unchanged");
        Optimized {
            bytes: bytes.to_vec(),
            report,
        }
    }
}

/// Optimize with default settings at the given effort level.
///
/// The level is clamped to `0..=7`.
pub fn optimize(bytes: &[u8], effort_level: i32) -> Result<Vec<u8>, OptimizeError> {
    let config = OptimizerConfig {
        effort_level: EffortLevel::new(effort_level),
        ..OptimizerConfig::default()
    };
    Optimizer::new(config).optimize(bytes).map(|optimized| optimized.bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{decode, BitDepth, ColorType, Rgb};
    use crate::encode::{encode_png, EncodeError, FilterMask, Strategy};
    use crate::search::SearchError;

    fn gradient() -> RasterImage {
        let data: Vec<u8> = (0..32 * 32)
            .flat_map(|i| {
                let (x, y) = (i % 32, i / 32);
                [(x * 8) as u8, (y * 8) as u8, ((x + y) * 4) as u8]
            })
            .collect();
        RasterImage::from_packed(32, 32, ColorType::Rgb, BitDepth::Eight, &data).unwrap()
    }

    /// A deliberately poor encoding of `raster`.
    fn bloated(raster: &RasterImage) -> Vec<u8> {
        let params = ParameterTuple {
            filters: FilterMask::NONE,
            compression_level: 0,
            ..ParameterTuple::default()
        };
        encode_png(raster, &params).unwrap()
    }

    fn config(level: i32) -> OptimizerConfig {
        OptimizerConfig {
            pin_workers: false,
            ..OptimizerConfig::default().with_effort_level(level)
        }
    }

    #[test]
    fn test_optimize_shrinks_and_roundtrips() {
        let raster = gradient();
        let input = bloated(&raster);
        let optimized = Optimizer::new(config(3)).optimize(&input).unwrap();

        assert!(optimized.bytes.len() < input.len());
        assert_eq!(decode(&optimized.bytes).unwrap(), raster);
        let report = optimized.report;
        assert_eq!(report.jobs, 12);
        assert_eq!(report.output_size, optimized.bytes.len());
        assert!(report.params.is_some());
        assert!(!report.bypassed && !report.kept_input);
        assert!(report.saved() > 0);
    }

    #[test]
    fn test_higher_level_is_never_larger() {
        let input = bloated(&gradient());
        let sizes: Vec<usize> = (1..=5)
            .map(|level| optimize(&input, level).unwrap().len())
            .collect();
        assert!(sizes.windows(2).all(|w| w[1] <= w[0]), "{sizes:?}");
    }

    #[test]
    fn test_output_is_deterministic() {
        let input = bloated(&gradient());
        let a = Optimizer::new(config(4).with_workers(1)).optimize(&input).unwrap();
        let b = Optimizer::new(config(4).with_workers(6)).optimize(&input).unwrap();
        assert_eq!(a.bytes, b.bytes);
        assert_eq!(a.report.params, b.report.params);
    }

    #[test]
    fn test_level_zero_reencodes_by_default() {
        let raster = gradient();
        let input = bloated(&raster);
        let optimized = Optimizer::new(config(0)).optimize(&input).unwrap();
        assert!(optimized.report.bypassed);
        assert_eq!(optimized.report.jobs, 0);
        assert_eq!(optimized.report.params, Some(ParameterTuple::default()));
        assert_eq!(
            optimized.bytes,
            encode_png(&raster, &ParameterTuple::default()).unwrap()
        );
    }

    #[test]
    fn test_level_zero_passthrough() {
        let input = bloated(&gradient());
        let config = OptimizerConfig {
            bypass: BypassPolicy::Passthrough,
            ..config(0)
        };
        let optimized = Optimizer::new(config).optimize(&input).unwrap();
        assert_eq!(optimized.bytes, input);
        assert!(optimized.report.bypassed && optimized.report.kept_input);
    }

    #[test]
    fn test_keeps_smaller_input() {
        let raster = gradient();
        let tight = encode_png(&raster, &ParameterTuple { compression_level: 9, ..Default::default() }).unwrap();
        // Only offer stored (level 0) encodings so the input always wins.
        let encoder = |r: &RasterImage, p: &ParameterTuple| {
            encode_png(r, &ParameterTuple { compression_level: 0, ..*p })
        };
        let optimized = Optimizer::with_encoder(config(2), encoder).optimize(&tight).unwrap();
        assert_eq!(optimized.bytes, tight);
        assert!(optimized.report.kept_input);
        assert_eq!(optimized.report.params, None);

        let no_keep = OptimizerConfig {
            keep_smaller_input: false,
            ..config(2)
        };
        let optimized = Optimizer::with_encoder(no_keep, encoder).optimize(&tight).unwrap();
        assert!(optimized.bytes.len() > tight.len());
    }

    #[test]
    fn test_decode_error_aborts_before_search() {
        let err = optimize(b"definitely not an image", 5).unwrap_err();
        assert!(matches!(err, OptimizeError::Decode(_)));
    }

    #[test]
    fn test_all_jobs_failing_is_search_error() {
        let input = bloated(&gradient());
        let encoder =
            |_: &RasterImage, _: &ParameterTuple| Err::<Vec<u8>, _>(EncodeError::Deflate("x".into()));
        let err = Optimizer::with_encoder(config(2), encoder).optimize(&input).unwrap_err();
        assert!(matches!(
            err,
            OptimizeError::Search(SearchError::Exhausted { attempted: 4, failed: 4 })
        ));
    }

    #[test]
    fn test_palette_image_keeps_metadata() {
        let rows: Vec<Vec<u8>> = (0..8u8).map(|y| (0..8u8).map(|x| (x + y) % 4).collect()).collect();
        let raster = RasterImage::new(8, 8, ColorType::Indexed, BitDepth::Eight, rows)
            .unwrap()
            .with_palette(vec![
                Rgb::new(0, 0, 0),
                Rgb::new(255, 0, 0),
                Rgb::new(0, 255, 0),
                Rgb::new(0, 0, 255),
            ])
            .unwrap();
        let input = bloated(&raster);
        let output = optimize(&input, 3).unwrap();
        let decoded = decode(&output).unwrap();
        assert_eq!(decoded, raster);
        assert_eq!(decoded.palette().map(<[Rgb]>::len), Some(4));
    }

    #[test]
    fn test_foreign_input_is_reencoded_even_with_passthrough() {
        let raster = gradient();
        let mut bmp = Vec::new();
        let pixels: Vec<u8> = raster.rows().concat();
        image::RgbImage::from_raw(32, 32, pixels)
            .unwrap()
            .write_to(&mut std::io::Cursor::new(&mut bmp), image::ImageFormat::Bmp)
            .unwrap();

        let config = OptimizerConfig {
            bypass: BypassPolicy::Passthrough,
            ..config(0)
        };
        let optimized = Optimizer::new(config).optimize(&bmp).unwrap();
        assert!(decode::is_png(&optimized.bytes));
        assert_eq!(decode(&optimized.bytes).unwrap(), raster);
        assert!(!optimized.report.kept_input);
    }

    #[test]
    fn test_report_strategy_is_from_grid() {
        let input = bloated(&gradient());
        let optimized = Optimizer::new(config(1)).optimize(&input).unwrap();
        let params = optimized.report.params.unwrap();
        assert_eq!(params.strategy, Strategy::Default);
        assert_eq!(params.compression_level, 9);
        assert_eq!(optimized.report.workers, 1);
    }
}
