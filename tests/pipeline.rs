//! End-to-end properties of the load + derivation pipeline and the report
//! builder: known deterministic inputs, exact asserts on derived columns.

use chrono::NaiveDate;

use ohlcv_dashboard::errors::LoadError;
use ohlcv_dashboard::generator::PriceSeriesGenerator;
use ohlcv_dashboard::pipeline::{self, TableCache, VOLUME_WINSOR_LIMIT};
use ohlcv_dashboard::report::{self, ChartSpec};
use ohlcv_dashboard::stats;
use ohlcv_dashboard::types::DisplayFlags;

const HEADER: &str = "Date,Open,High,Low,Close,Volume,Trades,VWAP";

fn day(i: u64) -> String {
    let base = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
    (base + chrono::Duration::days(i as i64)).to_string()
}

/// One CSV line; open/high/low/vwap are derived around close to keep
/// fixtures short. `trades` is a raw field so it can be left empty.
fn row(date: &str, close: f64, volume: i64, trades: &str) -> String {
    format!(
        "{date},{:.2},{:.2},{:.2},{:.2},{volume},{trades},{:.2}",
        close * 0.99,
        close * 1.01,
        close * 0.98,
        close,
        close
    )
}

fn csv_doc(rows: &[String]) -> Vec<u8> {
    let mut out = String::from(HEADER);
    out.push('\n');
    for r in rows {
        out.push_str(r);
        out.push('\n');
    }
    out.into_bytes()
}

// ── Test 1: rows with missing Trades are dropped, count never increases ──
#[test]
fn test_row_count_never_increases() {
    let rows: Vec<String> = (0..10)
        .map(|i| {
            let trades = if i % 3 == 0 { "" } else { "1500" };
            row(&day(i), 100.0 + i as f64, 10_000, trades)
        })
        .collect();
    let table = pipeline::load_bytes(&csv_doc(&rows)).unwrap();

    // i = 0, 3, 6, 9 dropped
    assert_eq!(table.len(), 6);
    assert!(table.len() <= rows.len());
}

// ── Test 2: missing required column fails the whole load ──
#[test]
fn test_missing_trades_column_fails() {
    let bytes = b"Date,Open,High,Low,Close,Volume,VWAP\n\
                  2021-01-01,99.0,101.0,98.0,100.0,10000,100.0\n";
    let err = pipeline::load_bytes(bytes).unwrap_err();
    match err {
        LoadError::MissingColumn(col) => assert_eq!(col, "Trades"),
        other => panic!("expected MissingColumn, got {other:?}"),
    }
}

// ── Test 3: unparseable date fails the whole load, with the line number ──
#[test]
fn test_unparseable_date_fails() {
    let rows = vec![
        row(&day(0), 100.0, 10_000, "1500"),
        row("not-a-date", 101.0, 10_000, "1500"),
    ];
    let err = pipeline::load_bytes(&csv_doc(&rows)).unwrap_err();
    match err {
        LoadError::DateParse { value, line } => {
            assert_eq!(value, "not-a-date");
            assert_eq!(line, 3); // header is line 1
        }
        other => panic!("expected DateParse, got {other:?}"),
    }
}

// ── Test 4: Daily_Return definition ──
// closes 100, 110, 99 → None, +0.10, −0.10
#[test]
fn test_daily_return_definition() {
    let rows = vec![
        row(&day(0), 100.0, 10_000, "1500"),
        row(&day(1), 110.0, 10_000, "1500"),
        row(&day(2), 99.0, 10_000, "1500"),
    ];
    let table = pipeline::load_bytes(&csv_doc(&rows)).unwrap();

    assert_eq!(table.daily_return[0], None);
    assert!((table.daily_return[1].unwrap() - 0.10).abs() < 1e-12);
    assert!((table.daily_return[2].unwrap() - (99.0 / 110.0 - 1.0)).abs() < 1e-12);
}

// ── Test 5: moving-average alignment ──
// closes 1..=10: MA5 undefined for i < 4, then the mean of the trailing 5.
#[test]
fn test_moving_average_alignment() {
    let rows: Vec<String> =
        (0..10).map(|i| row(&day(i), (i + 1) as f64, 10_000, "1500")).collect();
    let table = pipeline::load_bytes(&csv_doc(&rows)).unwrap();

    for i in 0..4 {
        assert_eq!(table.ma5[i], None, "MA5[{i}] should be undefined");
    }
    for i in 4..10 {
        let expected = table.close[i - 4..=i].iter().sum::<f64>() / 5.0;
        assert!((table.ma5[i].unwrap() - expected).abs() < 1e-9);
    }
    // 10 rows: MA20 and MA50 never populate
    assert!(table.ma20.iter().all(|v| v.is_none()));
    assert!(table.ma50.iter().all(|v| v.is_none()));
}

// ── Test 6: constant-close scenario ──
// 60 rows at Close=100: zero returns, MAs pinned at 100 once populated,
// zero rolling volatility from row 20 on.
#[test]
fn test_constant_close_scenario() {
    let rows: Vec<String> = (0..60).map(|i| row(&day(i), 100.0, 10_000, "1500")).collect();
    let table = pipeline::load_bytes(&csv_doc(&rows)).unwrap();

    for i in 1..60 {
        assert_eq!(table.daily_return[i], Some(0.0));
    }
    for i in 4..60 {
        assert_eq!(table.ma5[i], Some(100.0));
    }
    for i in 19..60 {
        assert_eq!(table.ma20[i], Some(100.0));
    }
    for i in 49..60 {
        assert_eq!(table.ma50[i], Some(100.0));
    }
    // Daily_Return[0] is None, so the first complete 20-row window ends at 20
    for i in 0..20 {
        assert_eq!(table.rolling_volatility_20[i], None);
        assert_eq!(table.rolling_mean_20[i], None);
    }
    for i in 20..60 {
        assert_eq!(table.rolling_volatility_20[i], Some(0.0));
        assert_eq!(table.rolling_mean_20[i], Some(0.0));
    }
}

// ── Test 7: single extreme Volume outlier is clipped, not removed ──
// 200 rows, volumes 1000 + 10i, one 1000×-scale outlier at i=100. With
// k = ⌊200·0.01⌋ = 2 the outlier clips to the 3rd-largest original value.
#[test]
fn test_volume_outlier_clipped_to_percentile() {
    let rows: Vec<String> = (0..200)
        .map(|i| {
            let volume = if i == 100 { 1_000_000 } else { 1000 + 10 * i as i64 };
            row(&day(i), 100.0, volume, "1500")
        })
        .collect();
    let table = pipeline::load_bytes(&csv_doc(&rows)).unwrap();

    assert_eq!(table.len(), 200);
    // largest normals: 2990 (i=199), 2980 (i=198) → upper bound 2980
    assert_eq!(table.volume[100], 2980);
    // lower tail: 1000, 1010 clip up to 1020
    assert_eq!(table.volume[0], 1020);
    assert_eq!(table.volume[1], 1020);
    assert_eq!(table.volume[2], 1020);
    assert_eq!(table.volume[3], 1030);
}

// ── Test 8: winsorized Volume stays within the original-distribution bounds ──
#[test]
fn test_winsorized_volume_within_bounds() {
    let mut gen = PriceSeriesGenerator::new(7);
    let original: Vec<i64> = gen.rows(500).iter().map(|r| r.volume).collect();
    let (lo, hi) = stats::winsorize_bounds(&original, VOLUME_WINSOR_LIMIT).unwrap();

    // Same seed → same data through the CSV path
    let bytes = PriceSeriesGenerator::new(7).csv_document(500).into_bytes();
    let table = pipeline::load_bytes(&bytes).unwrap();

    assert_eq!(table.len(), 500);
    for &v in &table.volume {
        assert!(v >= lo && v <= hi, "volume {v} escaped [{lo}, {hi}]");
    }
}

// ── Test 9: idempotence + memoization ──
// Identical bytes produce identical derived columns, and the cache hands
// back the same table without recomputing.
#[test]
fn test_idempotent_and_memoized() {
    let bytes = PriceSeriesGenerator::new(42).csv_document(120).into_bytes();

    let a = pipeline::load_bytes(&bytes).unwrap();
    let b = pipeline::load_bytes(&bytes).unwrap();
    assert_eq!(a, b);

    let mut cache = TableCache::new();
    let first = cache.load(&bytes).unwrap();
    let second = cache.load(&bytes).unwrap();
    assert!(!first.cached);
    assert!(second.cached);
    assert!(std::sync::Arc::ptr_eq(&first.table, &second.table));
    assert_eq!(cache.len(), 1);
}

// ── Test 10: unsorted input is sorted by Date before derivation ──
#[test]
fn test_unsorted_input_sorted_before_rolling() {
    // Reverse-chronological file, closes 102, 101, 100 (newest first)
    let rows = vec![
        row(&day(2), 102.0, 10_000, "1500"),
        row(&day(1), 101.0, 10_000, "1500"),
        row(&day(0), 100.0, 10_000, "1500"),
    ];
    let table = pipeline::load_bytes(&csv_doc(&rows)).unwrap();

    assert!(table.dates.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(table.close, vec![100.0, 101.0, 102.0]);
    assert!((table.daily_return[1].unwrap() - (101.0 / 100.0 - 1.0)).abs() < 1e-12);
}

// ── Test 11: extra columns are ignored, empty files are rejected ──
#[test]
fn test_extra_columns_and_empty_input() {
    let bytes = b"Symbol,Date,Open,High,Low,Close,Volume,Trades,VWAP,Turnover\n\
                  ACME,2021-01-01,99.0,101.0,98.0,100.0,10000,1500,100.0,5.5\n\
                  ACME,2021-01-02,100.0,103.0,99.0,102.0,11000,1600,101.0,5.6\n";
    let table = pipeline::load_bytes(bytes).unwrap();
    assert_eq!(table.len(), 2);

    let empty = format!("{HEADER}\n");
    match pipeline::load_bytes(empty.as_bytes()).unwrap_err() {
        LoadError::Empty => {}
        other => panic!("expected Empty, got {other:?}"),
    }

    // All rows missing Trades is the same terminal state
    let all_dropped = csv_doc(&[row(&day(0), 100.0, 10_000, "")]);
    assert!(matches!(pipeline::load_bytes(&all_dropped).unwrap_err(), LoadError::Empty));
}

// ── Test 12: report sections are gated by their flags, independently ──
#[test]
fn test_report_sections_gated() {
    let bytes = PriceSeriesGenerator::new(3).csv_document(90).into_bytes();
    let table = pipeline::load_bytes(&bytes).unwrap();

    let full = report::build_report(&table, DisplayFlags::default());
    assert!(full.eda.is_some());
    assert!(full.metrics.is_some());
    assert_eq!(full.charts.as_ref().map(|c| c.len()), Some(9));

    let flags = DisplayFlags { show_eda: false, show_visuals: true, show_metrics: false };
    let partial = report::build_report(&table, flags);
    assert!(partial.eda.is_none());
    assert!(partial.metrics.is_none());
    assert_eq!(partial.charts.as_ref().map(|c| c.len()), Some(9));

    let none = report::build_report(
        &table,
        DisplayFlags { show_eda: false, show_visuals: false, show_metrics: false },
    );
    assert!(none.eda.is_none() && none.charts.is_none() && none.metrics.is_none());
}

// ── Test 13: report contents — EDA shape, heatmap labels, metric formats ──
#[test]
fn test_report_contents() {
    // Constant data keeps the metric values exact
    let rows: Vec<String> = (0..40).map(|i| row(&day(i), 100.0, 1_234_567, "1500")).collect();
    let table = pipeline::load_bytes(&csv_doc(&rows)).unwrap();
    let report = report::build_report(&table, DisplayFlags::default());

    let eda = report.eda.unwrap();
    assert_eq!(eda.rows, 40);
    assert_eq!(eda.columns, 17);
    assert_eq!(eda.head.len(), 5);
    // Daily_Return has exactly one missing slot (row 0)
    let dr = eda.missing.iter().find(|c| c.column == "Daily_Return").unwrap();
    assert_eq!(dr.missing, 1);
    let ma50 = eda.missing.iter().find(|c| c.column == "MA50").unwrap();
    assert_eq!(ma50.missing, 40); // never populates in 40 rows
    for d in &eda.describe {
        assert_eq!(d.count, 40);
        assert!(d.min <= d.q25 && d.q25 <= d.q50 && d.q50 <= d.q75 && d.q75 <= d.max);
    }

    let charts = report.charts.unwrap();
    let heatmap = charts
        .iter()
        .find_map(|c| match c {
            ChartSpec::Heatmap { labels, matrix, .. } => Some((labels, matrix)),
            _ => None,
        })
        .unwrap();
    assert_eq!(heatmap.0.len(), 12);
    assert_eq!(heatmap.1.len(), 12);
    // Diagonal of defined columns correlates to 1; constant columns are None
    let volume_idx = heatmap.0.iter().position(|l| l == "Volume").unwrap();
    assert!(heatmap.1[volume_idx][volume_idx].is_none()); // zero variance after clipping

    let metrics = report.metrics.unwrap();
    assert_eq!(metrics.avg_daily_return_display, "0.0000");
    assert_eq!(metrics.return_volatility_display, "0.0000");
    assert_eq!(metrics.avg_volume_display, "1,234,567");
}

// ── Test 14: scatter drops undefined rows; monthly bars span 1–12 ──
#[test]
fn test_scatter_and_monthly_bars() {
    let rows: Vec<String> = (0..30).map(|i| row(&day(i), 100.0 + i as f64, 10_000, "1500")).collect();
    let table = pipeline::load_bytes(&csv_doc(&rows)).unwrap();
    let charts = report::build_charts(&table);

    let points = charts
        .iter()
        .find_map(|c| match c {
            ChartSpec::Scatter { points, .. } => Some(points),
            _ => None,
        })
        .unwrap();
    // Row 0 has neither Volume_Change nor Daily_Return
    assert_eq!(points.len(), 29);

    let (months, values) = charts
        .iter()
        .find_map(|c| match c {
            ChartSpec::MonthlyBars { months, values, .. } => Some((months, values)),
            _ => None,
        })
        .unwrap();
    assert_eq!(months.as_slice(), &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
    assert_eq!(values.len(), 12);
    // 30 January days → only month 1 has data
    assert!(values[0].is_some());
    assert!(values[1..].iter().all(|v| v.is_none()));
}
