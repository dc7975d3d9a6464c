use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One valuation of the portfolio, taken at a bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquitySnapshot {
    pub timestamp: DateTime<Utc>,
    pub cash: f64,
    pub market_value: f64,
    pub total_value: f64,
}

/// Equity-curve record exposed to reporting: a snapshot plus its return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub cash: f64,
    pub market_value: f64,
    pub total_value: f64,
    /// Fractional change in total value from the previous point (0.0 for the first).
    pub returns: f64,
}

/// Derive the equity curve from snapshots in insertion order.
pub fn equity_curve(snapshots: &[EquitySnapshot]) -> Vec<EquityPoint> {
    let mut prev_total: Option<f64> = None;
    snapshots
        .iter()
        .map(|s| {
            let returns = match prev_total {
                Some(prev) if prev != 0.0 => (s.total_value - prev) / prev,
                _ => 0.0,
            };
            prev_total = Some(s.total_value);
            EquityPoint {
                timestamp: s.timestamp,
                cash: s.cash,
                market_value: s.market_value,
                total_value: s.total_value,
                returns,
            }
        })
        .collect()
}
