//! DemandLab CLI: list items, run a forecast, write the sample table.
//!
//! Commands:
//! - `items`: list the item identifiers of a table with their row counts
//! - `run`: load, train, forecast, score, and optionally export one item
//! - `sample`: write the deterministic synthetic sales table

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use demandlab_core::data::sample::{generate_rows, to_csv_bytes};
use demandlab_core::data::SampleSpec;
use demandlab_runner::session::DEFAULT_FALLBACK;
use demandlab_runner::{run_pipeline, InputChoice, PresetDefaults, RunOptions};

#[derive(Parser)]
#[command(
    name = "demandlab",
    about = "DemandLab CLI: single-item demand forecasting"
)]
struct Cli {
    /// Log verbosity when RUST_LOG is unset (error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct InputArgs {
    /// Sales table (CSV with Item/SKU, Date, Quantity/Sales_Qty columns).
    #[arg(long)]
    input: Option<PathBuf>,

    /// Table used when --input is not given.
    #[arg(long, default_value = DEFAULT_FALLBACK)]
    fallback: PathBuf,

    /// Use the built-in synthetic sample instead of a file.
    #[arg(long, default_value_t = false, conflicts_with = "input")]
    synthetic: bool,
}

impl InputArgs {
    fn choice(&self) -> InputChoice {
        match (&self.input, self.synthetic) {
            (_, true) => InputChoice::Synthetic,
            (Some(path), false) => InputChoice::File(path.clone()),
            (None, false) => InputChoice::Fallback,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List item identifiers and their row counts.
    Items {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Train, forecast, and score one item.
    Run {
        #[command(flatten)]
        input: InputArgs,

        /// Item to forecast. Defaults to the first item in sorted order.
        #[arg(long)]
        item: Option<String>,

        /// Forecast horizon in days (7-180).
        #[arg(long)]
        horizon: Option<u32>,

        /// Prediction interval width in percent (50-99).
        #[arg(long)]
        confidence: Option<u32>,

        /// Trailing rows held out for scoring (0 disables scoring).
        #[arg(long)]
        hold_out: Option<usize>,

        /// Trend mode: linear or flat.
        #[arg(long)]
        trend: Option<String>,

        /// JSON or TOML preset with a [defaults] table.
        #[arg(long)]
        preset: Option<PathBuf>,

        /// Write {item}_forecast.csv and {item}_forecast.xlsx here.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print the run summary as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Write the synthetic sales table.
    Sample {
        /// Output path.
        #[arg(long, default_value = DEFAULT_FALLBACK)]
        out: PathBuf,

        /// Item identifiers. Defaults to SKU-001, SKU-002, SKU-003.
        #[arg(long, value_delimiter = ',')]
        items: Vec<String>,

        /// First date (YYYY-MM-DD).
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Number of days per item.
        #[arg(long, default_value_t = 365)]
        days: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Commands::Items { input } => run_items(input),
        Commands::Run {
            input,
            item,
            horizon,
            confidence,
            hold_out,
            trend,
            preset,
            output_dir,
            json,
        } => {
            let options = RunOptions {
                input: input.choice(),
                fallback: input.fallback,
                item,
                preset,
                overrides: PresetDefaults {
                    horizon_days: horizon,
                    conf_pct: confidence,
                    test_tail_days: hold_out,
                    trend_mode: trend,
                },
                output_dir,
            };
            run_forecast(&options, json)
        }
        Commands::Sample {
            out,
            items,
            start,
            days,
        } => run_sample(out, items, start, days),
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_items(input: InputArgs) -> Result<()> {
    let options = RunOptions {
        input: input.choice(),
        fallback: input.fallback,
        ..Default::default()
    };
    let table = options.load_table()?;
    let grouped = table.group();

    println!("{} items, {} rows", grouped.item_count(), grouped.row_count());
    for item in grouped.item_ids() {
        let rows = grouped.rows_for(item)?.len();
        println!("  {item:<20} {rows:>8}");
    }
    Ok(())
}

fn run_forecast(options: &RunOptions, json: bool) -> Result<()> {
    let summary = run_pipeline(options)?;
    if json {
        println!("{}", summary.to_json().context("failed to serialize summary")?);
    } else {
        print!("{}", summary.render_text());
    }
    Ok(())
}

fn run_sample(out: PathBuf, items: Vec<String>, start: Option<NaiveDate>, days: usize) -> Result<()> {
    let defaults = SampleSpec::default();
    let spec = SampleSpec {
        items: if items.is_empty() { defaults.items } else { items },
        start: start.unwrap_or(defaults.start),
        days,
    };
    let bytes = to_csv_bytes(&generate_rows(&spec))?;

    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(&out, &bytes).with_context(|| format!("failed to write {}", out.display()))?;
    println!(
        "Wrote {} ({} items x {} days)",
        out.display(),
        spec.items.len(),
        spec.days
    );
    Ok(())
}
