//! Performance metrics over a total-value equity curve.
//!
//! Every metric is a pure function of the curve. The curve is sampled once
//! per bar; annualization assumes 252 bars per year.

use serde::{Deserialize, Serialize};

/// Bars per year used for annualization.
pub const BARS_PER_YEAR: f64 = 252.0;

/// Aggregate statistics for a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub cagr: f64,
    pub sharpe: f64,
    pub sortino: f64,
    pub calmar: f64,
    /// Worst peak-to-trough decline, as a negative fraction.
    pub max_drawdown: f64,
    pub annualized_volatility: f64,
    pub bar_count: usize,
}

impl PerformanceMetrics {
    pub fn compute(equity_curve: &[f64]) -> Self {
        let bars = equity_curve.len();
        Self {
            total_return: total_return(equity_curve),
            cagr: cagr(equity_curve, bars),
            sharpe: sharpe_ratio(equity_curve, 0.0),
            sortino: sortino_ratio(equity_curve, 0.0),
            calmar: calmar_ratio(equity_curve, bars),
            max_drawdown: max_drawdown(equity_curve),
            annualized_volatility: annualized_volatility(equity_curve),
            bar_count: bars,
        }
    }
}

fn endpoints(equity_curve: &[f64]) -> Option<(f64, f64)> {
    match equity_curve {
        [first, .., last] => Some((*first, *last)),
        _ => None,
    }
}

/// (final - initial) / initial. Zero for fewer than two points.
pub fn total_return(equity_curve: &[f64]) -> f64 {
    let Some((initial, final_eq)) = endpoints(equity_curve) else {
        return 0.0;
    };
    if initial <= 0.0 {
        return 0.0;
    }
    (final_eq - initial) / initial
}

/// Compound annual growth rate over `bars` bars.
pub fn cagr(equity_curve: &[f64], bars: usize) -> f64 {
    let Some((initial, final_eq)) = endpoints(equity_curve) else {
        return 0.0;
    };
    if bars < 2 || initial <= 0.0 || final_eq <= 0.0 {
        return 0.0;
    }
    let years = bars as f64 / BARS_PER_YEAR;
    (final_eq / initial).powf(1.0 / years) - 1.0
}

/// Annualized Sharpe ratio of per-bar returns.
pub fn sharpe_ratio(equity_curve: &[f64], risk_free_rate: f64) -> f64 {
    let excess = excess_returns(equity_curve, risk_free_rate);
    if excess.len() < 2 {
        return 0.0;
    }
    let std = std_dev(&excess);
    if std < 1e-15 {
        return 0.0;
    }
    mean(&excess) / std * BARS_PER_YEAR.sqrt()
}

/// Annualized Sortino ratio: like Sharpe but only downside deviation counts.
pub fn sortino_ratio(equity_curve: &[f64], risk_free_rate: f64) -> f64 {
    let excess = excess_returns(equity_curve, risk_free_rate);
    if excess.len() < 2 {
        return 0.0;
    }
    let downside: f64 = excess.iter().filter(|&&r| r < 0.0).map(|r| r * r).sum();
    if downside == 0.0 {
        return 0.0;
    }
    let downside_std = (downside / excess.len() as f64).sqrt();
    if downside_std < 1e-15 {
        return 0.0;
    }
    mean(&excess) / downside_std * BARS_PER_YEAR.sqrt()
}

/// CAGR / |max drawdown|. Zero when there is no drawdown or no growth.
pub fn calmar_ratio(equity_curve: &[f64], bars: usize) -> f64 {
    let growth = cagr(equity_curve, bars);
    let dd = max_drawdown(equity_curve);
    if dd >= 0.0 || growth <= 0.0 {
        return 0.0;
    }
    growth / dd.abs()
}

/// Worst decline from a running peak, as a negative fraction.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    for &eq in equity_curve {
        peak = peak.max(eq);
        if peak > 0.0 {
            worst = worst.min((eq - peak) / peak);
        }
    }
    worst
}

pub fn annualized_volatility(equity_curve: &[f64]) -> f64 {
    let returns = bar_returns(equity_curve);
    if returns.len() < 2 {
        return 0.0;
    }
    std_dev(&returns) * BARS_PER_YEAR.sqrt()
}

/// Per-bar fractional returns. A non-positive prior value yields 0.
pub fn bar_returns(equity_curve: &[f64]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}

fn excess_returns(equity_curve: &[f64], risk_free_rate: f64) -> Vec<f64> {
    let per_bar_rf = risk_free_rate / BARS_PER_YEAR;
    bar_returns(equity_curve)
        .into_iter()
        .map(|r| r - per_bar_rf)
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation.
fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn total_return_basic() {
        assert!(approx(total_return(&[100.0, 110.0, 120.0]), 0.2));
        assert_eq!(total_return(&[100.0]), 0.0);
        assert_eq!(total_return(&[]), 0.0);
    }

    #[test]
    fn cagr_one_year_doubling() {
        let mut curve = vec![100.0; 252];
        curve[251] = 200.0;
        assert!(approx(cagr(&curve, 252), 1.0));
    }

    #[test]
    fn max_drawdown_finds_worst_trough() {
        let curve = [100.0, 120.0, 90.0, 130.0, 117.0];
        assert!(approx(max_drawdown(&curve), -0.25));
        assert_eq!(max_drawdown(&[100.0, 101.0, 102.0]), 0.0);
    }

    #[test]
    fn flat_curve_has_zero_ratios() {
        let curve = [100.0; 10];
        let m = PerformanceMetrics::compute(&curve);
        assert_eq!(m.sharpe, 0.0);
        assert_eq!(m.sortino, 0.0);
        assert_eq!(m.calmar, 0.0);
        assert_eq!(m.annualized_volatility, 0.0);
        assert_eq!(m.bar_count, 10);
    }

    #[test]
    fn sortino_zero_without_losses() {
        assert_eq!(sortino_ratio(&[100.0, 101.0, 103.0, 104.0], 0.0), 0.0);
        assert!(sharpe_ratio(&[100.0, 101.0, 103.0, 104.0], 0.0) > 0.0);
    }

    #[test]
    fn calmar_positive_for_growth_with_dip() {
        let curve = [100.0, 110.0, 99.0, 130.0];
        assert!(calmar_ratio(&curve, curve.len()) > 0.0);
    }

    #[test]
    fn bar_returns_guard_non_positive_base() {
        assert_eq!(bar_returns(&[0.0, 10.0]), vec![0.0]);
        assert!(approx(bar_returns(&[10.0, 11.0])[0], 0.1));
    }

    mod props {
        use super::super::*;
        use proptest::prelude::*;

        fn curve() -> impl Strategy<Value = Vec<f64>> {
            prop::collection::vec(1.0f64..1_000_000.0, 2..200)
        }

        proptest! {
            #[test]
            fn drawdown_is_a_fraction_of_peak(c in curve()) {
                let dd = max_drawdown(&c);
                prop_assert!((-1.0..=0.0).contains(&dd));
            }

            #[test]
            fn monotone_curve_never_draws_down(c in curve()) {
                let mut c = c;
                c.sort_by(f64::total_cmp);
                prop_assert_eq!(max_drawdown(&c), 0.0);
                prop_assert!(total_return(&c) >= 0.0);
            }

            #[test]
            fn one_return_per_step(c in curve()) {
                prop_assert_eq!(bar_returns(&c).len(), c.len() - 1);
            }
        }
    }
}
