//! Aligned periodic triggering and live price capture on each beat.

mod coordinator;
mod scheduler;

pub use coordinator::HeartbeatCoordinator;
pub use scheduler::{
    BeatHandler, HandlerFn, HeartbeatScheduler, StopOutcome, handler_fn, next_beat_delay,
};
