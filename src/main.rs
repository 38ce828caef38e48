//! tvchart CLI
//!
//! Developer tooling for the chart widget:
//! - Print a default configuration
//! - Resolve a UTC offset to the engine timezone
//! - Compute chart dimensions for a viewport
//! - Show the engine options a controller would build

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tvchart::{
    generate_default_config, timezone, ChartBinding, ChartDimensions, Config, ResponsiveSizer,
    ViewportState, WidgetOptions,
};

#[derive(Parser)]
#[command(name = "tvchart")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Inspect TradingView widget configuration")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Configuration helpers
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Resolve the engine timezone for a UTC offset
    Timezone {
        /// Host offset in minutes behind UTC (browser convention, UTC+2 = -120).
        /// Defaults to the local clock.
        #[arg(long, allow_hyphen_values = true)]
        offset_minutes: Option<i32>,
    },

    /// Compute chart dimensions for a viewport
    Size {
        /// Viewport width (px)
        #[arg(long)]
        width: u32,
        /// Viewport height (px)
        #[arg(long)]
        height: u32,
    },

    /// Print the engine options JSON for a binding
    Options {
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        interval: String,
        /// Instrument id handed to the datafeed
        #[arg(long, default_value = "")]
        instrument: String,
        #[arg(long, allow_hyphen_values = true)]
        offset_minutes: Option<i32>,
        /// Viewport width (px); omit to use the configured fallback
        #[arg(long)]
        width: Option<u32>,
        #[arg(long, default_value = "900")]
        height: u32,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print a commented default config file
    Init,
    /// Print the effective configuration
    Show,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => Config::load_default(),
    };

    init_logging(&config);

    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Init => print!("{}", generate_default_config()),
            ConfigAction::Show => println!("{:#?}", config),
        },

        Commands::Timezone { offset_minutes } => {
            let hours = offset_hours(offset_minutes);
            let identifier = timezone::resolve(hours)?;
            println!("UTC{:+} → {}", hours, identifier);
            if let Some(all) = timezone::identifiers(hours) {
                tracing::debug!(candidates = ?all, "Timezone candidates");
            }
        }

        Commands::Size { width, height } => {
            let dims = compute_dimensions(&config, Some((width, height)))?;
            let sizer_flags = tvchart::Breakpoints::from_width(width, &config.layout);
            println!(
                "narrow={} book={} → width={} height={}",
                sizer_flags.narrow, sizer_flags.book, dims.width, dims.height
            );
        }

        Commands::Options {
            symbol,
            interval,
            instrument,
            offset_minutes,
            width,
            height,
        } => {
            let binding = ChartBinding::new(&symbol, &instrument, &interval);
            binding.validate()?;

            let zone = timezone::resolve(offset_hours(offset_minutes))?;
            let dims = compute_dimensions(&config, width.map(|w| (w, height)))?;
            let options = WidgetOptions::build(&config.chart, &binding, zone, dims);

            println!("{}", serde_json::to_string_pretty(&options)?);
        }
    }

    Ok(())
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("tvchart={}", config.logging.level))
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn offset_hours(offset_minutes: Option<i32>) -> f64 {
    offset_minutes
        .map(timezone::offset_hours_from_host)
        .unwrap_or_else(timezone::local_offset_hours)
}

fn compute_dimensions(
    config: &Config,
    viewport: Option<(u32, u32)>,
) -> anyhow::Result<ChartDimensions> {
    let mut sizer = ResponsiveSizer::new(config.layout.clone());
    if let Some((width, height)) = viewport {
        let Some(viewport) = ViewportState::new(width, height) else {
            bail!("viewport must be non-zero, got {width}x{height}");
        };
        sizer.capture(viewport);
    }

    let fallback = ChartDimensions::new(
        config.chart.fallback_width.clone(),
        config.chart.fallback_height.clone(),
    );
    Ok(sizer.dimensions(&fallback))
}
