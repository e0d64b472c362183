//! Command-line arguments and how they map onto an optimizer config.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use mcpng_core::{BypassPolicy, OptimizerConfig};

#[derive(Parser, Debug)]
#[command(name = "mcpng", version, about = "Losslessly shrink PNG files by trying many encoder settings in parallel")]
pub struct Args {
    /// Effort level, 0..=7 (0 skips the search)
    #[arg(short = 'o', long = "level", allow_negative_numbers = true)]
    pub level: Option<i32>,

    /// Worker threads (0 = one per processing unit)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Do not pin workers to cores
    #[arg(long, default_value_t = false)]
    pub no_pin: bool,

    /// What to do at effort level 0
    #[arg(long, value_enum)]
    pub bypass: Option<Bypass>,

    /// JSON file with optimizer settings; flags override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output file (single input only)
    #[arg(long, conflicts_with = "suffix")]
    pub out: Option<PathBuf>,

    /// Write `<stem><SUFFIX>.png` next to each input instead of overwriting
    #[arg(long)]
    pub suffix: Option<String>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Input files (PNG, BMP, GIF, JPEG, PNM, TIFF)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Bypass {
    Reencode,
    Passthrough,
}

impl From<Bypass> for BypassPolicy {
    fn from(bypass: Bypass) -> Self {
        match bypass {
            Bypass::Reencode => BypassPolicy::Reencode,
            Bypass::Passthrough => BypassPolicy::Passthrough,
        }
    }
}

impl Args {
    /// Default tracing directive for the verbosity flag.
    pub fn log_directive(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }

    /// Load the config file, if any, then apply flag overrides.
    pub fn build_config(&self) -> Result<OptimizerConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => OptimizerConfig::default(),
        };

        if let Some(level) = self.level {
            config = config.with_effort_level(level);
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if self.no_pin {
            config.pin_workers = false;
        }
        if let Some(bypass) = self.bypass {
            config.bypass = bypass.into();
        }
        Ok(config)
    }

    /// Check combinations clap cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.out.is_some() && self.files.len() > 1 {
            bail!("--out takes a single input, got {}", self.files.len());
        }
        Ok(())
    }

    /// Where the optimized version of `input` is written.
    pub fn output_path(&self, input: &Path) -> PathBuf {
        if let Some(out) = &self.out {
            return out.clone();
        }
        match &self.suffix {
            Some(suffix) => {
                let stem = input.file_stem().unwrap_or_default().to_string_lossy();
                input.with_file_name(format!("{stem}{suffix}.png"))
            }
            None => input.with_extension("png"),
        }
    }
}
