use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "alpenblumen")]
#[command(about = "Walk a field of cone mountains and pair up the alpine flowers", long_about = None)]
pub(crate) struct Args {
    /// Terrain-only walk: no flowers, no HUD, smaller logical viewport
    #[arg(long, default_value_t = false)]
    pub(crate) demo: bool,

    /// Seed for reproducible terrain (random when omitted)
    #[arg(long)]
    pub(crate) seed: Option<u64>,

    /// Nominal tick length in milliseconds (5..=200)
    #[arg(long, default_value_t = 20)]
    pub(crate) tick_ms: u64,

    /// Monochrome braille output
    #[arg(long, default_value_t = false)]
    pub(crate) no_color: bool,

    /// Write log output to this file (filter with RUST_LOG)
    #[arg(long)]
    pub(crate) log_file: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Variant {
    Full,
    Demo,
}

#[derive(Clone, Debug)]
pub(crate) struct Settings {
    pub(crate) variant: Variant,
    pub(crate) seed: Option<u64>,
    pub(crate) tick: Duration,
    pub(crate) enable_color: bool,
    pub(crate) log_file: Option<PathBuf>,
}

impl From<Args> for Settings {
    fn from(args: Args) -> Self {
        Self {
            variant: if args.demo {
                Variant::Demo
            } else {
                Variant::Full
            },
            seed: args.seed,
            tick: Duration::from_millis(args.tick_ms.clamp(5, 200)),
            enable_color: !args.no_color,
            log_file: args.log_file,
        }
    }
}

/// Sends `log` output to the given file. Without one, logging stays off:
/// stderr would tear the raw-mode screen.
pub(crate) fn init_logging(path: Option<&PathBuf>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("could not create log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .context("logger already initialised")?;
    Ok(())
}
