//! Minimal HTTP service lifecycle wrapper.
//!
//! Starts an HTTP listener, dispatches registered routes, answers liveness
//! checks on `/healthz`, and stops cleanly on termination signals or
//! internal cancellation.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;

pub use config::schema::ServerConfig;
pub use http::{HealthResponder, Server, ServerError, ServerHandle, VersionSource};
pub use lifecycle::{LifecycleState, Shutdown, ShutdownCause};
pub use routing::{Route, RouteRegistry};
