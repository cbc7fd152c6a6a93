//! Background Tasks Module
//!
//! The TTL sweeper that runs alongside every cache, and the one-shot signal
//! used to stop it.

mod shutdown;
mod sweeper;

pub use shutdown::{shutdown_channel, ShutdownListener, ShutdownSignal};
pub use sweeper::{spawn_sweeper, sweep_expired, SweeperState};
