//! Engines that dispatch events between the kernel components.
//!
//! [`Engine`] is the deterministic simulation loop: pull one bar, push it as a
//! Market event, drain the queue, repeat until the data runs out or the
//! drawdown guard halts trading. [`LiveEngine`] runs the same dispatch against
//! a blocking queue fed by a producer thread.

pub mod event_loop;
pub mod live;
pub mod state;

pub use event_loop::Engine;
pub use live::{spawn_replay_feed, LiveEngine, LiveSummary};
pub use state::{ExitReason, LoopState, RunSummary};

use thiserror::Error;

use crate::execution::ExecutionError;
use crate::portfolio::PortfolioError;
use crate::strategy::StrategyError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Strategy(#[from] StrategyError),

    #[error(transparent)]
    Portfolio(#[from] PortfolioError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("simulation already failed and cannot be resumed")]
    Aborted,
}
