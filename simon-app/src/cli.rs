use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rand::SeedableRng;
use rand::rngs::StdRng;
use simon_experiment::{Blocks, EngineConfig, TerminationPolicy};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Policy {
    /// End the trial at the first wrong press
    StopOnMismatch,
    /// Always collect as many presses as the sequence is long
    FullLength,
}

impl From<Policy> for TerminationPolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::StopOnMismatch => TerminationPolicy::StopOnMismatch,
            Policy::FullLength => TerminationPolicy::FullLength,
        }
    }
}

/// Simon task: watch a sequence of lit buttons, then repeat it.
#[derive(Debug, Parser)]
#[command(name = "simon", version)]
pub struct Args {
    /// JSON file with `practice` and `main` trial lists
    #[arg(short, long, conflicts_with = "random")]
    pub blocks: Option<PathBuf>,

    /// Generate random blocks with sequences of this length
    #[arg(long)]
    pub random: Option<usize>,

    /// Trials per block for --random
    #[arg(long, default_value_t = 4)]
    pub trials: usize,

    /// Seed for --random
    #[arg(long, requires = "random")]
    pub seed: Option<u64>,

    /// Where the trial records are written
    #[arg(short, long, default_value = "simon_results.json")]
    pub output: PathBuf,

    #[arg(long, default_value_t = 270)]
    pub interval_ms: u64,

    #[arg(long, default_value_t = 220)]
    pub blink_ms: u64,

    #[arg(long, value_enum, default_value_t = Policy::StopOnMismatch)]
    pub policy: Policy,

    /// Log tones instead of playing them
    #[arg(long)]
    pub mute: bool,

    /// Run in a window instead of fullscreen
    #[arg(long)]
    pub windowed: bool,
}

impl Args {
    pub fn engine(&self) -> Result<EngineConfig> {
        EngineConfig::new(self.interval_ms, self.blink_ms, self.policy.into())
            .context("invalid --interval-ms/--blink-ms")
    }

    pub fn load_blocks(&self) -> Result<Blocks> {
        if let Some(path) = &self.blocks {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read block file {}", path.display()))?;
            return Blocks::from_json(&json)
                .with_context(|| format!("invalid block file {}", path.display()));
        }

        match (self.random, self.seed) {
            (Some(length), Some(seed)) => {
                Blocks::random(length, self.trials, &mut StdRng::seed_from_u64(seed))
                    .context("cannot generate random blocks")
            }
            (Some(length), None) => Blocks::random(length, self.trials, &mut rand::rng())
                .context("cannot generate random blocks"),
            (None, _) => Ok(Blocks::standard()),
        }
    }
}
