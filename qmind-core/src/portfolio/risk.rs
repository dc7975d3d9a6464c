//! Drawdown-guarded risk state machine.
//!
//! RUNNING -> HALTED is one-way. While running, the high-water mark tracks the
//! peak total value; once halted it is frozen at its value before the
//! triggering snapshot.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskState {
    Running,
    Halted,
}

/// Fractional decline of `total_value` from `high_water_mark`.
pub fn drawdown(high_water_mark: f64, total_value: f64) -> f64 {
    if high_water_mark <= 0.0 {
        return 0.0;
    }
    (high_water_mark - total_value) / high_water_mark
}

/// Outcome of feeding one valuation to the guard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RiskCheck {
    /// Guard is running and the drawdown is within the limit.
    Within { drawdown: f64 },
    /// This valuation crossed the limit; the guard just halted.
    Tripped { drawdown: f64 },
    /// Guard was already halted; nothing evaluated.
    AlreadyHalted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskGuard {
    state: RiskState,
    high_water_mark: f64,
    max_drawdown_pct: f64,
}

impl RiskGuard {
    pub fn new(initial_value: f64, max_drawdown_pct: f64) -> Self {
        Self {
            state: RiskState::Running,
            high_water_mark: initial_value,
            max_drawdown_pct,
        }
    }

    pub fn state(&self) -> RiskState {
        self.state
    }

    pub fn is_halted(&self) -> bool {
        self.state == RiskState::Halted
    }

    pub fn high_water_mark(&self) -> f64 {
        self.high_water_mark
    }

    pub fn max_drawdown_pct(&self) -> f64 {
        self.max_drawdown_pct
    }

    /// Update the high-water mark with `total_value` and trip if the drawdown
    /// strictly exceeds the limit.
    pub fn observe(&mut self, total_value: f64) -> RiskCheck {
        if self.is_halted() {
            return RiskCheck::AlreadyHalted;
        }
        self.high_water_mark = self.high_water_mark.max(total_value);
        let dd = drawdown(self.high_water_mark, total_value);
        if dd > self.max_drawdown_pct {
            self.state = RiskState::Halted;
            RiskCheck::Tripped { drawdown: dd }
        } else {
            RiskCheck::Within { drawdown: dd }
        }
    }
}
