//! Execution: the simulated fill model and the live venue boundary.

pub mod simulator;
pub mod venue;

pub use simulator::{ExecutionError, ExecutionSimulator, DEFAULT_COMMISSION};
pub use venue::{ExecutionVenue, OrderAck, PaperVenue, VenueError};
