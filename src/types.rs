use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ── Column names (CSV header + derived) ──

pub mod col {
    pub const DATE: &str = "Date";
    pub const OPEN: &str = "Open";
    pub const HIGH: &str = "High";
    pub const LOW: &str = "Low";
    pub const CLOSE: &str = "Close";
    pub const VOLUME: &str = "Volume";
    pub const TRADES: &str = "Trades";
    pub const VWAP: &str = "VWAP";
    pub const DAILY_RETURN: &str = "Daily_Return";
    pub const MA5: &str = "MA5";
    pub const MA20: &str = "MA20";
    pub const MA50: &str = "MA50";
    pub const VOLUME_CHANGE: &str = "Volume_Change";
    pub const HIGH_LOW_DIFFERENCE: &str = "High_Low_Difference";
    pub const ROLLING_VOLATILITY_20: &str = "Rolling_Volatility_20";
    pub const ROLLING_MEAN_20: &str = "Rolling_Mean_20";
    pub const MONTH: &str = "Month";
}

/// Columns that must be present in the uploaded CSV header.
pub const REQUIRED_COLUMNS: &[&str] = &[
    col::DATE,
    col::OPEN,
    col::HIGH,
    col::LOW,
    col::CLOSE,
    col::VOLUME,
    col::TRADES,
    col::VWAP,
];

/// Fixed column subset for the correlation heatmap.
pub const CORRELATION_COLUMNS: &[&str] = &[
    col::OPEN,
    col::HIGH,
    col::LOW,
    col::CLOSE,
    col::VWAP,
    col::VOLUME,
    col::DAILY_RETURN,
    col::MA5,
    col::MA20,
    col::MA50,
    col::VOLUME_CHANGE,
    col::HIGH_LOW_DIFFERENCE,
];

// ── Input Types (deserialized from CSV) ──

/// One row as it appears in the uploaded file. Unlisted columns are ignored
/// by the reader. `Trades` is optional at this stage: rows missing it are
/// dropped during ingestion instead of failing the load.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
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
    pub trades: Option<f64>,
    #[serde(rename = "VWAP")]
    pub vwap: f64,
}

/// A validated daily record: date parsed, Trades present.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    pub trades: i64,
    pub vwap: f64,
}

// ── The enriched table ──

/// Columnar price table with all derived columns. Built once per uploaded
/// file and never mutated afterwards; rolling columns are `None` wherever
/// their trailing window is incomplete.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    pub dates: Vec<NaiveDate>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    /// Winsorized at the 1st/99th percentile of the uploaded distribution.
    pub volume: Vec<i64>,
    pub trades: Vec<i64>,
    pub vwap: Vec<f64>,
    pub daily_return: Vec<Option<f64>>,
    pub ma5: Vec<Option<f64>>,
    pub ma20: Vec<Option<f64>>,
    pub ma50: Vec<Option<f64>>,
    pub volume_change: Vec<Option<f64>>,
    pub high_low_difference: Vec<f64>,
    pub rolling_volatility_20: Vec<Option<f64>>,
    pub rolling_mean_20: Vec<Option<f64>>,
    pub month: Vec<u32>,
}

impl PriceTable {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Every column in display order, with its logical data type.
    pub fn column_types(&self) -> Vec<(&'static str, &'static str)> {
        vec![
            (col::DATE, "date"),
            (col::OPEN, "f64"),
            (col::HIGH, "f64"),
            (col::LOW, "f64"),
            (col::CLOSE, "f64"),
            (col::VOLUME, "i64"),
            (col::TRADES, "i64"),
            (col::VWAP, "f64"),
            (col::DAILY_RETURN, "f64"),
            (col::MA5, "f64"),
            (col::MA20, "f64"),
            (col::MA50, "f64"),
            (col::VOLUME_CHANGE, "f64"),
            (col::HIGH_LOW_DIFFERENCE, "f64"),
            (col::ROLLING_VOLATILITY_20, "f64"),
            (col::ROLLING_MEAN_20, "f64"),
            (col::MONTH, "u32"),
        ]
    }

    /// Numeric view of a column by name, integral columns widened to f64.
    /// Returns `None` for unknown names.
    pub fn numeric(&self, name: &str) -> Option<Vec<Option<f64>>> {
        fn dense(values: &[f64]) -> Vec<Option<f64>> {
            values.iter().map(|&v| Some(v)).collect()
        }
        match name {
            col::OPEN => Some(dense(&self.open)),
            col::HIGH => Some(dense(&self.high)),
            col::LOW => Some(dense(&self.low)),
            col::CLOSE => Some(dense(&self.close)),
            col::VWAP => Some(dense(&self.vwap)),
            col::VOLUME => Some(self.volume.iter().map(|&v| Some(v as f64)).collect()),
            col::TRADES => Some(self.trades.iter().map(|&v| Some(v as f64)).collect()),
            col::DAILY_RETURN => Some(self.daily_return.clone()),
            col::MA5 => Some(self.ma5.clone()),
            col::MA20 => Some(self.ma20.clone()),
            col::MA50 => Some(self.ma50.clone()),
            col::VOLUME_CHANGE => Some(self.volume_change.clone()),
            col::HIGH_LOW_DIFFERENCE => Some(dense(&self.high_low_difference)),
            col::ROLLING_VOLATILITY_20 => Some(self.rolling_volatility_20.clone()),
            col::ROLLING_MEAN_20 => Some(self.rolling_mean_20.clone()),
            col::MONTH => Some(self.month.iter().map(|&m| Some(m as f64)).collect()),
            _ => None,
        }
    }

    /// `None` count per column, in display order.
    pub fn missing_counts(&self) -> Vec<(&'static str, usize)> {
        fn nones(values: &[Option<f64>]) -> usize {
            values.iter().filter(|v| v.is_none()).count()
        }
        vec![
            (col::DATE, 0),
            (col::OPEN, 0),
            (col::HIGH, 0),
            (col::LOW, 0),
            (col::CLOSE, 0),
            (col::VOLUME, 0),
            (col::TRADES, 0),
            (col::VWAP, 0),
            (col::DAILY_RETURN, nones(&self.daily_return)),
            (col::MA5, nones(&self.ma5)),
            (col::MA20, nones(&self.ma20)),
            (col::MA50, nones(&self.ma50)),
            (col::VOLUME_CHANGE, nones(&self.volume_change)),
            (col::HIGH_LOW_DIFFERENCE, 0),
            (col::ROLLING_VOLATILITY_20, nones(&self.rolling_volatility_20)),
            (col::ROLLING_MEAN_20, nones(&self.rolling_mean_20)),
            (col::MONTH, 0),
        ]
    }
}

// ── Display flags ──

/// The three independent section toggles. All default to on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DisplayFlags {
    pub show_eda: bool,
    pub show_visuals: bool,
    pub show_metrics: bool,
}

impl Default for DisplayFlags {
    fn default() -> Self {
        Self { show_eda: true, show_visuals: true, show_metrics: true }
    }
}
