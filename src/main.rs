//! Recovery Forecast CLI
//!
//! Command-line interface for browsing a write-off dataset, running
//! recovery forecasts and exporting the sellable-account sheets.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};

use recovery_forecast::account::DEFAULT_DATASET_PATH;
use recovery_forecast::format::human_format;
use recovery_forecast::forecast::ForecastRequest;
use recovery_forecast::portfolio::DEFAULT_DENSITY_BINS;
use recovery_forecast::report::{export_details, summary_rows, write_curves_csv, write_summary_csv};
use recovery_forecast::{load_dataset, portfolio_view, Dataset, ForecastRunner, ProductType, Vintage};

#[derive(Parser)]
#[command(name = "recovery-forecast")]
#[command(about = "Recovery forecasting for written-off loan portfolios", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the vintages of a dataset with account counts
    Vintages {
        /// Write-off dataset CSV
        #[arg(default_value = DEFAULT_DATASET_PATH)]
        dataset: PathBuf,
    },

    /// Forecast recovery and select sellable accounts per target rate
    Forecast {
        /// Write-off dataset CSV
        #[arg(default_value = DEFAULT_DATASET_PATH)]
        dataset: PathBuf,

        /// Vintage to include (YYYY-MM); repeatable. Defaults to the two latest
        #[arg(short, long = "vintage")]
        vintages: Vec<Vintage>,

        /// Forecast horizon in months after charge-off
        #[arg(long)]
        horizon_months: Option<u32>,

        /// Annual discount rate in percent
        #[arg(long)]
        discount_rate: Option<f64>,

        /// Report monthly instead of cumulative curve rates
        #[arg(long)]
        incremental: bool,

        /// JSON request file; flags override its fields
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory to write the detail workbook (one sheet per target rate) into
        #[arg(long)]
        export_dir: Option<PathBuf>,

        /// Write recovery curves as CSV to this file
        #[arg(long)]
        curves: Option<PathBuf>,

        /// Print the full outcome as JSON instead of the summary table
        #[arg(long)]
        json: bool,
    },

    /// Summarise what has been recovered so far
    Portfolio {
        /// Write-off dataset CSV
        #[arg(default_value = DEFAULT_DATASET_PATH)]
        dataset: PathBuf,

        /// Vintage to include (YYYY-MM); repeatable. Defaults to the two latest
        #[arg(short, long = "vintage")]
        vintages: Vec<Vintage>,

        /// Bins per axis of the density grid
        #[arg(long, default_value_t = DEFAULT_DENSITY_BINS)]
        bins: usize,

        /// Print the full view as JSON
        #[arg(long)]
        json: bool,
    },
}

fn read_dataset(path: &Path) -> Result<Dataset> {
    load_dataset(path).with_context(|| format!("Failed to load dataset {}", path.display()))
}

fn selection(dataset: &Dataset, vintages: Vec<Vintage>) -> Vec<Vintage> {
    if vintages.is_empty() {
        dataset.default_selection()
    } else {
        vintages
    }
}

fn list_vintages(path: &Path) -> Result<()> {
    let dataset = read_dataset(path)?;
    println!("{:>8} {:>10}", "Vintage", "Accounts");
    println!("{}", "-".repeat(19));
    for (vintage, count) in dataset.vintage_counts() {
        println!("{:>8} {:>10}", vintage.to_string(), count);
    }
    let default: Vec<String> = dataset.default_selection().iter().map(|v| v.to_string()).collect();
    println!("\nDefault selection: {}", default.join(", "));
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_forecast(
    path: &Path,
    vintages: Vec<Vintage>,
    horizon_months: Option<u32>,
    discount_rate: Option<f64>,
    incremental: bool,
    config: Option<PathBuf>,
    export_dir: Option<PathBuf>,
    curves: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let mut request = match &config {
        Some(config) => ForecastRequest::from_json_path(config)
            .with_context(|| format!("Failed to read request {}", config.display()))?,
        None => ForecastRequest::default(),
    };

    let mut runner = ForecastRunner::new(read_dataset(path)?);
    if !vintages.is_empty() || request.vintages.is_empty() {
        request.vintages = selection(runner.dataset(), vintages);
    }
    if let Some(months) = horizon_months {
        request.horizon_months = months;
    }
    if let Some(rate) = discount_rate {
        request.discount_rate_pct = rate;
    }
    if incremental {
        request.cumulative = false;
    }

    let outcome = runner.run(&request).context("Forecast failed")?;
    let Some(outcome) = outcome else {
        println!("Selected vintages contain no accounts, nothing to forecast");
        return Ok(());
    };

    if json {
        let stdout = std::io::stdout();
        serde_json::to_writer_pretty(stdout.lock(), &*outcome).context("Failed to write JSON")?;
        println!();
    } else {
        let ranked = outcome.ranking.len();
        println!(
            "Forecast within next {} months at {}% discount rate: {} accounts ranked, {} excluded",
            request.horizon_months,
            request.discount_rate_pct,
            ranked,
            outcome.ranking.excluded.len()
        );
        let pl = outcome.ranking.accounts.iter().filter(|a| a.info.product_type == ProductType::PersonalLoan).count();
        println!("  {} PL / {} Visa\n", human_format(pl as f64), human_format((ranked - pl) as f64));
        write_summary_csv(std::io::stdout().lock(), &summary_rows(&outcome)).context("Failed to write summary")?;
    }

    if let Some(curves) = curves {
        let file = std::fs::File::create(&curves).with_context(|| format!("Failed to create {}", curves.display()))?;
        write_curves_csv(file, &outcome.curves).context("Failed to write curves")?;
        eprintln!("Recovery curves written to: {}", curves.display());
    }

    if let Some(root) = export_dir {
        let path = export_details(&root, &outcome).context("Failed to export detail workbook")?;
        eprintln!("Detail workbook written to: {}", path.display());
    }

    Ok(())
}

fn show_portfolio(path: &Path, vintages: Vec<Vintage>, bins: usize, json: bool) -> Result<()> {
    let dataset = read_dataset(path)?;
    let vintages = selection(&dataset, vintages);
    let Some(view) = portfolio_view(&dataset, &vintages, bins).context("Portfolio view failed")? else {
        println!("Selected vintages contain no accounts");
        return Ok(());
    };

    if json {
        serde_json::to_writer_pretty(std::io::stdout().lock(), &view).context("Failed to write JSON")?;
        println!();
        return Ok(());
    }

    let mut out = std::io::stdout().lock();
    writeln!(out, "{:>8} {:>8} {:>10} {:>14} {:>14}", "Product", "Vintage", "Accounts", "Write-off", "Recovered")?;
    writeln!(out, "{}", "-".repeat(58))?;
    for segment in &view.segments {
        writeln!(
            out,
            "{:>8} {:>8} {:>10} {:>14} {:>14}",
            segment.product_type.label(),
            segment.vintage.to_string(),
            segment.accounts,
            format!("${}", human_format(segment.write_off)),
            format!("${}", human_format(segment.already_recovered)),
        )?;
    }
    writeln!(out)?;
    for product in ProductType::ALL {
        let (accounts, write_off, recovered) = view.product_totals(product);
        let rate = if write_off > 0.0 { recovered / write_off * 100.0 } else { 0.0 };
        writeln!(
            out,
            "{}: {} accounts, ${} written off, ${} recovered (%{})",
            product.label(),
            human_format(accounts as f64),
            human_format(write_off),
            human_format(recovered),
            human_format(rate)
        )?;
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Vintages { dataset } => list_vintages(&dataset),
        Commands::Forecast {
            dataset,
            vintages,
            horizon_months,
            discount_rate,
            incremental,
            config,
            export_dir,
            curves,
            json,
        } => run_forecast(
            &dataset,
            vintages,
            horizon_months,
            discount_rate,
            incremental,
            config,
            export_dir,
            curves,
            json,
        ),
        Commands::Portfolio {
            dataset,
            vintages,
            bins,
            json,
        } => show_portfolio(&dataset, vintages, bins, json),
    }
}
