//! Loop state machine and run result types.

use serde::{Deserialize, Serialize};

/// Simulation loop states.
///
/// `HaltedExit`, `Exhausted` and `Failed` are terminal. Only `Failed`
/// carries no exit reason: the run ended with an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoopState {
    /// Waiting to pull the next bar.
    Streaming,
    /// Resolving events caused by the current bar.
    Draining,
    /// The drawdown guard tripped; no further bars are read.
    HaltedExit,
    /// The data source ran out of bars.
    Exhausted,
    /// A component returned an error mid-drain; the undrained events were
    /// discarded.
    Failed,
}

impl LoopState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            LoopState::HaltedExit | LoopState::Exhausted | LoopState::Failed
        )
    }

    pub fn exit_reason(self) -> Option<ExitReason> {
        match self {
            LoopState::HaltedExit => Some(ExitReason::Halted),
            LoopState::Exhausted => Some(ExitReason::Exhausted),
            LoopState::Streaming | LoopState::Draining | LoopState::Failed => None,
        }
    }
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    Halted,
    Exhausted,
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitReason::Halted => write!(f, "HALTED"),
            ExitReason::Exhausted => write!(f, "EXHAUSTED"),
        }
    }
}

/// Counters accumulated by the simulation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub exit_reason: ExitReason,
    pub bars_processed: usize,
    /// Orders handed to the execution simulator.
    pub orders_submitted: usize,
    pub fills_applied: usize,
    /// Orders the simulator could not price.
    pub orders_dropped: usize,
}
