//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Run:
//!     Install signals → spawn listener task → wait on first of
//!     { termination signal, Shutdown token } → return ShutdownCause
//!
//! Shutdown (shutdown.rs):
//!     Token fired (signal / listener exit / cancel) → run unblocks
//!
//! Stop:
//!     Drain trigger → stop accepting → drain connections (bounded) → release socket
//!
//! Signals (signals.rs):
//!     SIGHUP/SIGINT/SIGTERM/SIGQUIT → unblock run
//! ```
//!
//! # Design Decisions
//! - Cancellation and draining are separate: `run` returning does not stop
//!   the listener, `stop` does
//! - Shutdown has timeout: after the deadline `stop` returns and in-flight
//!   connections are detached, bounded by the request timeout

use std::fmt;

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownCause};
pub use signals::Signal;

/// Server lifecycle states.
///
/// ```text
/// Created → Running → Stopping → Stopped
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Running,
    Stopping,
    Stopped,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Created => "created",
            LifecycleState::Running => "running",
            LifecycleState::Stopping => "stopping",
            LifecycleState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}
