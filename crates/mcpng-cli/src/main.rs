//! `mcpng` - optimize PNG files from the command line.

mod args;

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use mcpng_core::{Optimized, Optimizer};
use tracing::error;

use crate::args::Args;

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.log_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    args.validate()?;
    let optimizer = Optimizer::new(args.build_config()?);

    let mut failed = 0;
    for input in &args.files {
        let output = args.output_path(input);
        match process(&optimizer, input, &output) {
            Ok(optimized) => println!("{}", summary(input, &optimized)),
            Err(err) => {
                error!(file = %input.display(), "{err:#}");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(anyhow!("{failed} of {} files failed", args.files.len()));
    }
    Ok(())
}

fn process(optimizer: &Optimizer, input: &Path, output: &Path) -> Result<Optimized> {
    let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let optimized = optimizer
        .optimize(&bytes)
        .with_context(|| format!("optimizing {}", input.display()))?;
    fs::write(output, &optimized.bytes).with_context(|| format!("writing {}", output.display()))?;
    Ok(optimized)
}

/// One report line per file.
fn summary(input: &Path, optimized: &Optimized) -> String {
    let report = &optimized.report;
    let pct = if report.input_size == 0 {
        0.0
    } else {
        report.saved() as f64 * 100.0 / report.input_size as f64
    };
    let how = match (&report.params, report.kept_input) {
        (_, true) => "input kept".to_string(),
        (Some(params), false) => params.to_string(),
        (None, false) => String::new(),
    };
    format!(
        "{}: {} -> {} bytes ({pct:.1}% saved, {} jobs) [{how}]",
        input.display(),
        report.input_size,
        report.output_size,
        report.jobs
    )
}
