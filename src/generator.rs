//! Synthetic daily OHLCV data for tests and benches: a seeded random walk
//! with plausible intraday ranges and volumes.

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::ParsedRow;

const BASE_PRICE: f64 = 750.0;
const BASE_VOLUME: i64 = 1_200_000;

pub struct PriceSeriesGenerator {
    rng: StdRng,
    date: NaiveDate,
    close: f64,
}

impl PriceSeriesGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            date: NaiveDate::from_ymd_opt(2019, 1, 1).unwrap(),
            close: BASE_PRICE,
        }
    }

    /// Generate the next trading day. Consecutive calendar days; the close
    /// drifts up to ±2% per day and never goes below 1.0.
    pub fn next_row(&mut self) -> ParsedRow {
        let prev_close = self.close;
        let close = (prev_close * (1.0 + self.rng.gen_range(-0.02..0.02))).max(1.0);
        let open = prev_close * (1.0 + self.rng.gen_range(-0.005..0.005));
        let high = open.max(close) * (1.0 + self.rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - self.rng.gen_range(0.0..0.01));
        let volume = (BASE_VOLUME as f64 * self.rng.gen_range(0.4..2.5)) as i64;
        let trades = self.rng.gen_range(8_000..40_000);
        let vwap = low + (high - low) * self.rng.gen_range(0.3..0.7);

        let date = self.date;
        self.date = self.date.succ_opt().unwrap();
        self.close = close;

        ParsedRow { date, open, high, low, close, volume, trades, vwap }
    }

    pub fn rows(&mut self, n: usize) -> Vec<ParsedRow> {
        (0..n).map(|_| self.next_row()).collect()
    }

    /// Complete CSV document with the required header, for ingestion tests
    /// and benches.
    pub fn csv_document(&mut self, rows: usize) -> String {
        use std::fmt::Write;

        let mut out = String::from("Date,Open,High,Low,Close,Volume,Trades,VWAP\n");
        for r in self.rows(rows) {
            let _ = writeln!(
                out,
                "{},{:.2},{:.2},{:.2},{:.2},{},{},{:.2}",
                r.date, r.open, r.high, r.low, r.close, r.volume, r.trades, r.vwap
            );
        }
        out
    }
}
