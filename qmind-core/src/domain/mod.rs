//! Domain types: bars and the closed event taxonomy that flows through the kernel.

pub mod bar;
pub mod event;

pub use bar::Bar;
pub use event::{
    Event, EventKind, FillEvent, MarketEvent, OrderEvent, OrderKind, OrderSide, SignalEvent,
    SignalKind, DEFAULT_SIGNAL_STRENGTH,
};
