//! CSV ingestion: header validation, date parsing, row filtering.
//!
//! Fails the whole load on a missing required column or an unparseable
//! date; rows without a Trades value are silently dropped.

use chrono::NaiveDate;
use csv::ReaderBuilder;
use tracing::debug;

use crate::errors::LoadError;
use crate::types::{ParsedRow, RawRecord, REQUIRED_COLUMNS};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn parse_csv(bytes: &[u8]) -> Result<Vec<ParsedRow>, LoadError> {
    let mut rdr = ReaderBuilder::new().from_reader(bytes);

    let headers = rdr.headers()?.clone();
    for required in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == *required) {
            return Err(LoadError::MissingColumn((*required).to_string()));
        }
    }

    let mut rows = Vec::new();
    let mut dropped = 0usize;
    for (i, record) in rdr.deserialize::<RawRecord>().enumerate() {
        let record = record?;
        let line = i + 2; // header occupies line 1
        let date = NaiveDate::parse_from_str(record.date.trim(), DATE_FORMAT)
            .map_err(|_| LoadError::DateParse { value: record.date.clone(), line })?;

        // Empty field → None; a literal NaN in the column counts as missing too.
        let trades = record.trades.filter(|t| t.is_finite());
        let Some(trades) = trades else {
            dropped += 1;
            continue;
        };

        rows.push(ParsedRow {
            date,
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
            volume: record.volume,
            trades: trades.round() as i64,
            vwap: record.vwap,
        });
    }

    if dropped > 0 {
        debug!(dropped, "dropped records without Trades");
    }
    if rows.is_empty() {
        return Err(LoadError::Empty);
    }

    // Rolling windows assume chronological order; real exports are often
    // reverse-chronological, so sort rather than reject.
    rows.sort_by_key(|r| r.date);
    Ok(rows)
}
