use super::round2;
use serde::Serialize;

/// Descriptive statistics over one numeric distribution. All fields except
/// `count` are absent when no valid sample exists; a single-sample
/// distribution reports a standard deviation of 0.0 (callers note the
/// degenerate case rather than treating it as an error).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSummary {
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub stdev: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub count: usize,
}

impl StatsSummary {
    pub fn empty() -> Self {
        Self {
            mean: None,
            median: None,
            stdev: None,
            min: None,
            max: None,
            count: 0,
        }
    }

    /// True when the sample was too small for a meaningful spread.
    pub fn stdev_is_degenerate(&self) -> bool {
        self.count == 1
    }
}

/// Computes mean, median, sample standard deviation, min and max, rounded
/// to 2 decimals. Non-finite inputs are dropped before anything else.
pub fn summarize(values: &[f64]) -> StatsSummary {
    let mut valid: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if valid.is_empty() {
        return StatsSummary::empty();
    }

    valid.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let count = valid.len();
    let mean = valid.iter().sum::<f64>() / count as f64;

    let median = if count % 2 == 1 {
        valid[count / 2]
    } else {
        (valid[count / 2 - 1] + valid[count / 2]) / 2.0
    };

    let stdev = if count >= 2 {
        let variance = valid
            .iter()
            .map(|value| (value - mean).powi(2))
            .sum::<f64>()
            / (count - 1) as f64;
        variance.sqrt()
    } else {
        0.0
    };

    StatsSummary {
        mean: Some(round2(mean)),
        median: Some(round2(median)),
        stdev: Some(round2(stdev)),
        min: Some(round2(valid[0])),
        max: Some(round2(valid[count - 1])),
        count,
    }
}
