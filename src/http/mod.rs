//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum serve, lifecycle, graceful drain)
//!     → registered routes (routing::RouteRegistry)
//!     → health.rs (echo headers, stamp Version, 200)
//!         → client_ip.rs (X-Forwarded-For / X-Real-IP / peer)
//! ```

pub mod client_ip;
pub mod health;
pub mod server;

pub use client_ip::client_ip;
pub use health::{HealthResponder, VersionSource, HEALTH_PATH, VERSION_HEADER};
pub use server::{Server, ServerError, ServerHandle};
