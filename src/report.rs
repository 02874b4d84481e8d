//! Presentation layer: pure functions from the enriched table (plus the
//! three display flags) to serializable artifacts. Nothing here knows about
//! axum or the frontend; chart specs are plain data.

use serde::Serialize;

use crate::stats::{self, Histogram};
use crate::types::{col, DisplayFlags, PriceTable, CORRELATION_COLUMNS};

const HEAD_ROWS: usize = 5;
const GRID_BINS: usize = 30;
const CHANGE_BINS: usize = 50;

/// Columns covered by the describe() block.
const DESCRIBE_COLUMNS: &[&str] = &[col::OPEN, col::HIGH, col::LOW, col::CLOSE, col::VOLUME];

// ── Artifacts ──

#[derive(Debug, Serialize)]
pub struct DashboardReport {
    pub rows: usize,
    pub eda: Option<EdaSummary>,
    pub charts: Option<Vec<ChartSpec>>,
    pub metrics: Option<KeyMetrics>,
}

#[derive(Debug, Serialize)]
pub struct EdaSummary {
    pub rows: usize,
    pub columns: usize,
    pub missing: Vec<ColumnCount>,
    pub dtypes: Vec<ColumnType>,
    pub head: Vec<HeadRow>,
    pub describe: Vec<DescribeColumn>,
}

#[derive(Debug, Serialize)]
pub struct ColumnCount {
    pub column: String,
    pub missing: usize,
}

#[derive(Debug, Serialize)]
pub struct ColumnType {
    pub column: String,
    pub dtype: String,
}

/// One of the first rows of the enriched table, raw and derived columns
/// together, keyed by their display names.
#[derive(Debug, Serialize)]
pub struct HeadRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Open")]
    pub open: f64,
    #[serde(rename = "High")]
    pub high: f64,
    #[serde(rename = "Low")]
    pub low: f64,
    #[serde(rename = "Close")]
    pub close: f64,
    #[serde(rename = "Volume")]
    pub volume: i64,
    #[serde(rename = "Trades")]
    pub trades: i64,
    #[serde(rename = "VWAP")]
    pub vwap: f64,
    #[serde(rename = "Daily_Return")]
    pub daily_return: Option<f64>,
    #[serde(rename = "MA5")]
    pub ma5: Option<f64>,
    #[serde(rename = "MA20")]
    pub ma20: Option<f64>,
    #[serde(rename = "MA50")]
    pub ma50: Option<f64>,
    #[serde(rename = "Volume_Change")]
    pub volume_change: Option<f64>,
    #[serde(rename = "High_Low_Difference")]
    pub high_low_difference: f64,
    #[serde(rename = "Rolling_Volatility_20")]
    pub rolling_volatility_20: Option<f64>,
    #[serde(rename = "Rolling_Mean_20")]
    pub rolling_mean_20: Option<f64>,
    #[serde(rename = "Month")]
    pub month: u32,
}

/// describe()-style statistics for one column.
#[derive(Debug, Serialize)]
pub struct DescribeColumn {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub q50: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Serialize)]
pub struct HistogramPanel {
    pub name: String,
    #[serde(flatten)]
    pub histogram: Histogram,
}

/// A renderable chart, decoupled from any drawing toolkit. The frontend
/// dispatches on `kind`.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartSpec {
    HistogramGrid { title: String, panels: Vec<HistogramPanel> },
    HistogramPair { title: String, panels: Vec<HistogramPanel> },
    TimeSeries { title: String, dates: Vec<String>, series: Vec<Series> },
    Heatmap { title: String, labels: Vec<String>, matrix: Vec<Vec<Option<f64>>> },
    Scatter { title: String, x_label: String, y_label: String, points: Vec<[f64; 2]> },
    MonthlyBars { title: String, months: Vec<u32>, values: Vec<Option<f64>> },
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyMetrics {
    pub avg_daily_return: Option<f64>,
    pub avg_daily_return_display: String,
    pub return_volatility: Option<f64>,
    pub return_volatility_display: String,
    pub avg_volume: Option<f64>,
    pub avg_volume_display: String,
}

// ── Builders ──

/// Assemble the report for one render cycle. Each flag independently gates
/// its section; the table is never mutated.
pub fn build_report(table: &PriceTable, flags: DisplayFlags) -> DashboardReport {
    DashboardReport {
        rows: table.len(),
        eda: flags.show_eda.then(|| build_eda(table)),
        charts: flags.show_visuals.then(|| build_charts(table)),
        metrics: flags.show_metrics.then(|| build_metrics(table)),
    }
}

pub fn build_eda(table: &PriceTable) -> EdaSummary {
    let missing = table
        .missing_counts()
        .into_iter()
        .map(|(column, missing)| ColumnCount { column: column.to_string(), missing })
        .collect();
    let dtypes: Vec<ColumnType> = table
        .column_types()
        .into_iter()
        .map(|(column, dtype)| ColumnType { column: column.to_string(), dtype: dtype.to_string() })
        .collect();
    let head = (0..table.len().min(HEAD_ROWS))
        .map(|i| HeadRow {
            date: table.dates[i].to_string(),
            open: table.open[i],
            high: table.high[i],
            low: table.low[i],
            close: table.close[i],
            volume: table.volume[i],
            trades: table.trades[i],
            vwap: table.vwap[i],
            daily_return: table.daily_return[i],
            ma5: table.ma5[i],
            ma20: table.ma20[i],
            ma50: table.ma50[i],
            volume_change: table.volume_change[i],
            high_low_difference: table.high_low_difference[i],
            rolling_volatility_20: table.rolling_volatility_20[i],
            rolling_mean_20: table.rolling_mean_20[i],
            month: table.month[i],
        })
        .collect();
    let describe = DESCRIBE_COLUMNS
        .iter()
        .filter_map(|name| {
            let values = dense_values(table, name)?;
            Some(describe_column(name, &values))
        })
        .collect();
    EdaSummary {
        rows: table.len(),
        columns: dtypes.len(),
        missing,
        dtypes,
        head,
        describe,
    }
}

pub fn build_charts(table: &PriceTable) -> Vec<ChartSpec> {
    let dates: Vec<String> = table.dates.iter().map(|d| d.to_string()).collect();
    let mut charts = Vec::with_capacity(9);

    charts.push(ChartSpec::HistogramGrid {
        title: "Price Distribution Histograms".to_string(),
        panels: histogram_panels(table, DESCRIBE_COLUMNS, GRID_BINS),
    });

    charts.push(ChartSpec::TimeSeries {
        title: "Stock Prices Over Time".to_string(),
        dates: dates.clone(),
        series: named_series(table, &[col::OPEN, col::HIGH, col::LOW, col::CLOSE]),
    });

    charts.push(ChartSpec::TimeSeries {
        title: "Trading Volume Over Time".to_string(),
        dates: dates.clone(),
        series: named_series(table, &[col::VOLUME]),
    });

    charts.push(ChartSpec::TimeSeries {
        title: "Close Price with Moving Averages".to_string(),
        dates: dates.clone(),
        series: vec![
            series(table, col::CLOSE, "Close Price"),
            series(table, col::MA5, "5-day MA"),
            series(table, col::MA20, "20-day MA"),
            series(table, col::MA50, "50-day MA"),
        ]
        .into_iter()
        .flatten()
        .collect(),
    });

    charts.push(ChartSpec::HistogramPair {
        title: "Distribution of Returns & Volume Change".to_string(),
        panels: vec![
            histogram_of(&table.daily_return, "Daily Return", CHANGE_BINS),
            histogram_of(&table.volume_change, "Volume Change", CHANGE_BINS),
        ]
        .into_iter()
        .flatten()
        .collect(),
    });

    charts.push(correlation_heatmap(table));

    charts.push(ChartSpec::TimeSeries {
        title: "Rolling Volatility (20 Days)".to_string(),
        dates,
        series: named_series(table, &[col::ROLLING_VOLATILITY_20]),
    });

    let points = table
        .volume_change
        .iter()
        .zip(table.daily_return.iter())
        .filter_map(|(x, y)| Some([(*x)?, (*y)?]))
        .collect();
    charts.push(ChartSpec::Scatter {
        title: "Volume Change vs Daily Return".to_string(),
        x_label: "Volume Change".to_string(),
        y_label: "Daily Return".to_string(),
        points,
    });

    charts.push(ChartSpec::MonthlyBars {
        title: "Average Daily Return by Month".to_string(),
        months: (1..=12).collect(),
        values: monthly_mean_returns(table),
    });

    charts
}

pub fn build_metrics(table: &PriceTable) -> KeyMetrics {
    let returns: Vec<f64> = table.daily_return.iter().flatten().copied().collect();
    let volume: Vec<f64> = table.volume.iter().map(|&v| v as f64).collect();

    let avg_daily_return = stats::mean(&returns);
    let return_volatility = stats::sample_std(&returns);
    let avg_volume = stats::mean(&volume);

    KeyMetrics {
        avg_daily_return,
        avg_daily_return_display: fixed4(avg_daily_return),
        return_volatility,
        return_volatility_display: fixed4(return_volatility),
        avg_volume,
        avg_volume_display: thousands(avg_volume),
    }
}

/// Mean Daily_Return per calendar month, slots 1–12, `None` for months the
/// data never touches.
pub fn monthly_mean_returns(table: &PriceTable) -> Vec<Option<f64>> {
    let mut sums = [0.0_f64; 12];
    let mut counts = [0_usize; 12];
    for (m, r) in table.month.iter().zip(table.daily_return.iter()) {
        if let Some(x) = r {
            let slot = (*m as usize - 1).min(11);
            sums[slot] += x;
            counts[slot] += 1;
        }
    }
    (0..12)
        .map(|i| if counts[i] > 0 { Some(sums[i] / counts[i] as f64) } else { None })
        .collect()
}

// ── Helpers ──

fn dense_values(table: &PriceTable, name: &str) -> Option<Vec<f64>> {
    Some(table.numeric(name)?.into_iter().flatten().collect())
}

fn describe_column(name: &str, values: &[f64]) -> DescribeColumn {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    DescribeColumn {
        column: name.to_string(),
        count: values.len(),
        mean: stats::mean(values),
        std: stats::sample_std(values),
        min: sorted.first().copied(),
        q25: stats::quantile(&sorted, 0.25),
        q50: stats::quantile(&sorted, 0.50),
        q75: stats::quantile(&sorted, 0.75),
        max: sorted.last().copied(),
    }
}

fn series(table: &PriceTable, column: &str, label: &str) -> Option<Series> {
    Some(Series { name: label.to_string(), values: table.numeric(column)? })
}

fn named_series(table: &PriceTable, columns: &[&str]) -> Vec<Series> {
    columns.iter().filter_map(|c| series(table, c, c)).collect()
}

fn histogram_panels(table: &PriceTable, columns: &[&str], bins: usize) -> Vec<HistogramPanel> {
    columns
        .iter()
        .filter_map(|name| {
            let values = dense_values(table, name)?;
            let histogram = stats::histogram(&values, bins)?;
            Some(HistogramPanel { name: name.to_string(), histogram })
        })
        .collect()
}

fn histogram_of(values: &[Option<f64>], label: &str, bins: usize) -> Option<HistogramPanel> {
    let defined: Vec<f64> = values.iter().flatten().copied().collect();
    let histogram = stats::histogram(&defined, bins)?;
    Some(HistogramPanel { name: label.to_string(), histogram })
}

fn correlation_heatmap(table: &PriceTable) -> ChartSpec {
    let columns: Vec<Vec<Option<f64>>> = CORRELATION_COLUMNS
        .iter()
        .filter_map(|name| table.numeric(name))
        .collect();
    let matrix = columns
        .iter()
        .map(|a| columns.iter().map(|b| stats::pearson(a, b)).collect())
        .collect();
    ChartSpec::Heatmap {
        title: "Correlation Matrix Heatmap".to_string(),
        labels: CORRELATION_COLUMNS.iter().map(|s| s.to_string()).collect(),
        matrix,
    }
}

fn fixed4(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.4}"),
        None => "n/a".to_string(),
    }
}

/// Thousands-separated, zero decimals: 14532607.8 → "14,532,608".
fn thousands(value: Option<f64>) -> String {
    let Some(v) = value else {
        return "n/a".to_string();
    };
    let digits = (v.abs().round() as u64).to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if v < 0.0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
