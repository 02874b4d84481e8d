use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use ohlcv_dashboard::logging;
use ohlcv_dashboard::pipeline;
use ohlcv_dashboard::report::{self, ChartSpec};
use ohlcv_dashboard::types::DisplayFlags;
use ohlcv_dashboard::web;

#[derive(Parser)]
#[command(name = "ohlcv-dashboard", about = "Interactive OHLCV stock dashboard")]
struct Cli {
    /// Run mode: web or headless
    #[arg(long, default_value = "web")]
    mode: String,

    /// Web server port (web mode only)
    #[arg(long, default_value = "3000")]
    port: u16,

    /// CSV file to load at startup (required in headless mode)
    #[arg(long)]
    file: Option<PathBuf>,

    /// Hide the EDA summary section
    #[arg(long)]
    no_eda: bool,

    /// Hide the visualization section
    #[arg(long)]
    no_visuals: bool,

    /// Hide the key metrics section
    #[arg(long)]
    no_metrics: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();

    let flags = DisplayFlags {
        show_eda: !cli.no_eda,
        show_visuals: !cli.no_visuals,
        show_metrics: !cli.no_metrics,
    };

    match cli.mode.as_str() {
        "web" => web::run(cli.port, cli.file).await?,
        "headless" => run_headless(cli.file, flags)?,
        other => eprintln!("Unknown mode: {other}. Use --mode web|headless"),
    }

    Ok(())
}

/// Load one file, print the gated report sections, exit. Used for scripted
/// smoke runs of the same pipeline the web view renders.
fn run_headless(file: Option<PathBuf>, flags: DisplayFlags) -> anyhow::Result<()> {
    let path = file.context("--file is required in headless mode")?;
    let bytes =
        std::fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
    let table = pipeline::load_bytes(&bytes)?;
    let report = report::build_report(&table, flags);

    println!("=== ohlcv-dashboard (headless) ===");
    println!("File: {} ({} rows)", path.display(), report.rows);
    println!();

    if let Some(eda) = &report.eda {
        println!("=== Data Overview ===");
        println!("  Shape: {} rows x {} columns", eda.rows, eda.columns);
        println!();
        println!("  Missing values:");
        for c in &eda.missing {
            if c.missing > 0 {
                println!("    {:<24} {}", c.column, c.missing);
            }
        }
        println!();
        println!("  Descriptive statistics:");
        println!(
            "    {:<8} {:>8} {:>14} {:>14} {:>14} {:>14}",
            "column", "count", "mean", "std", "min", "max"
        );
        for d in &eda.describe {
            println!(
                "    {:<8} {:>8} {:>14} {:>14} {:>14} {:>14}",
                d.column,
                d.count,
                fmt_opt(d.mean),
                fmt_opt(d.std),
                fmt_opt(d.min),
                fmt_opt(d.max)
            );
        }
        println!();
    }

    if let Some(charts) = &report.charts {
        println!("=== Visual Explorations ===");
        for chart in charts {
            match chart {
                ChartSpec::HistogramGrid { title, panels }
                | ChartSpec::HistogramPair { title, panels } => {
                    println!("  {:<42} {} panels", title, panels.len())
                }
                ChartSpec::TimeSeries { title, dates, series } => {
                    println!("  {:<42} {} series x {} points", title, series.len(), dates.len())
                }
                ChartSpec::Heatmap { title, labels, .. } => {
                    println!("  {:<42} {}x{} matrix", title, labels.len(), labels.len())
                }
                ChartSpec::Scatter { title, points, .. } => {
                    println!("  {:<42} {} points", title, points.len())
                }
                ChartSpec::MonthlyBars { title, months, .. } => {
                    println!("  {:<42} {} buckets", title, months.len())
                }
            }
        }
        println!();
    }

    if let Some(metrics) = &report.metrics {
        println!("=== Key Metrics ===");
        println!("  Avg Daily Return:      {}", metrics.avg_daily_return_display);
        println!("  Volatility (Std Dev):  {}", metrics.return_volatility_display);
        println!("  Avg Trading Volume:    {}", metrics.avg_volume_display);
    }

    Ok(())
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.2}")).unwrap_or_else(|| "-".to_string())
}
