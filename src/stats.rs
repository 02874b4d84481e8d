//! Numeric kernels for the feature pipeline and the EDA summary.
//!
//! Rolling functions return vectors aligned with their input; a slot is
//! `None` wherever the trailing window is incomplete or contains an
//! undefined value.

use serde::Serialize;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n − 1 denominator). `None` below 2 values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Quantile by linear interpolation between order statistics.
/// `sorted` must be ascending; q in [0, 1].
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        return Some(sorted[lo]);
    }
    let frac = pos - lo as f64;
    Some(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
}

/// Rank-based winsorization bounds with symmetric tail limits.
///
/// With n values and k = ⌊n·limit⌋, the k smallest values clip up to the
/// (k+1)-th smallest and the k largest clip down to the (k+1)-th largest,
/// so every clipped value is an order statistic of the original data.
pub fn winsorize_bounds(values: &[i64], limit: f64) -> Option<(i64, i64)> {
    let n = values.len();
    if n == 0 {
        return None;
    }
    let k = (n as f64 * limit).floor() as usize;
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    Some((sorted[k], sorted[n - k - 1]))
}

/// Clip every value into the rank-based winsorization bounds.
pub fn winsorize(values: &[i64], limit: f64) -> Vec<i64> {
    match winsorize_bounds(values, limit) {
        Some((lo, hi)) if lo <= hi => values.iter().map(|&v| v.clamp(lo, hi)).collect(),
        _ => values.to_vec(),
    }
}

/// Fractional change from the prior value. The first slot is `None`, as is
/// any slot whose prior value is zero.
pub fn pct_change(values: &[f64]) -> Vec<Option<f64>> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            if i == 0 {
                return None;
            }
            let prev = values[i - 1];
            if prev == 0.0 {
                None
            } else {
                Some(v / prev - 1.0)
            }
        })
        .collect()
}

/// Trailing simple moving average over a dense series.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    // Running sum; subtract the value that falls out of the window.
    values
        .iter()
        .enumerate()
        .scan(0.0_f64, move |sum, (i, &v)| {
            *sum += v;
            if i >= window {
                *sum -= values[i - window];
            }
            let out = if i + 1 >= window { Some(*sum / window as f64) } else { None };
            Some(out)
        })
        .collect()
}

/// Trailing mean over an optional series. A window is defined only when all
/// of its inputs are defined.
pub fn rolling_mean_opt(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling_opt(values, window, |w| mean(w))
}

/// Trailing sample standard deviation over an optional series, same window
/// rule as [`rolling_mean_opt`].
pub fn rolling_std_opt(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling_opt(values, window, |w| sample_std(w))
}

fn rolling_opt<F>(values: &[Option<f64>], window: usize, f: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> Option<f64>,
{
    let mut out = vec![None; values.len()];
    if window == 0 {
        return out;
    }
    let mut buf = Vec::with_capacity(window);
    for i in 0..values.len() {
        if i + 1 < window {
            continue;
        }
        buf.clear();
        let complete = values[i + 1 - window..=i].iter().all(|v| {
            if let Some(x) = v {
                buf.push(*x);
                true
            } else {
                false
            }
        });
        if complete {
            out[i] = f(&buf);
        }
    }
    out
}

/// Pearson correlation over pairwise-complete observations. `None` when
/// fewer than two complete pairs exist or either side has zero variance.
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys.iter())
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (x, y) in &pairs {
        sxy += (x - mx) * (y - my);
        sxx += (x - mx) * (x - mx);
        syy += (y - my) * (y - my);
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some(sxy / (sxx * syy).sqrt())
}

// ── Histogram binning ──

#[derive(Debug, Clone, Serialize)]
pub struct Histogram {
    pub start: f64,
    pub bin_width: f64,
    pub counts: Vec<u64>,
}

/// Equal-width bins over [min, max]. The max value lands in the last bin.
/// `None` for empty input; a degenerate (constant) series gets one unit-wide
/// bin centered on the value.
pub fn histogram(values: &[f64], bins: usize) -> Option<Histogram> {
    if values.is_empty() || bins == 0 {
        return None;
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        return Some(Histogram { start: min - 0.5, bin_width: 1.0, counts: vec![values.len() as u64] });
    }
    let width = (max - min) / bins as f64;
    let mut counts = vec![0u64; bins];
    for &v in values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    Some(Histogram { start: min, bin_width: width, counts })
}
