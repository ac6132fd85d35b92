use std::path::PathBuf;

use anyhow::{Context, Result};
use cjspack::{
    BundleOrchestrator,
    config::Config,
    types::{Instantiation, Platform},
};
use clap::{ArgAction, Parser};
use log::{LevelFilter, debug};

/// Bundle a CommonJS entry file and everything it requires into one script
#[derive(Debug, Parser)]
#[command(name = "cjspack", version, about)]
struct Cli {
    /// Entry JavaScript file
    #[arg(short, long)]
    entry: PathBuf,

    /// Where to write the bundle
    #[arg(short, long)]
    output: PathBuf,

    /// Project root containing the package directory (defaults to the entry's directory)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Value of process.env.NODE_ENV used to prune guarded branches
    #[arg(long)]
    env: Option<String>,

    /// Minify the emitted bundle
    #[arg(long)]
    minify: bool,

    /// Host platform; decides whether built-ins like `fs` may be required
    #[arg(long, value_enum)]
    platform: Option<Platform>,

    /// Whether module bodies run once (memoized) or on every require (reexecute)
    #[arg(long, value_enum)]
    instantiation: Option<Instantiation>,

    /// Define process.env.NODE_ENV inside the bundle
    #[arg(long)]
    process_shim: bool,

    /// Configuration file to use instead of ./cjspack.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// CLI flags override every other configuration layer
    fn apply_to(&self, config: &mut Config) {
        if let Some(root) = &self.root {
            config.root = Some(root.clone());
        }
        if let Some(env) = &self.env {
            config.env.clone_from(env);
        }
        if self.minify {
            config.minify = true;
        }
        if let Some(platform) = self.platform {
            config.platform = platform;
        }
        if let Some(instantiation) = self.instantiation {
            config.instantiation = instantiation;
        }
        if self.process_shim {
            config.process_shim = true;
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply_to(&mut config);
    debug!("Effective configuration: {config:?}");

    BundleOrchestrator::new(config)
        .bundle_to_file(&cli.entry, &cli.output)
        .with_context(|| format!("Failed to bundle {}", cli.entry.display()))?;
    Ok(())
}
