//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route bindings (path, handler)
//!     → registry.rs (validate, dedupe, keep order)
//!     → axum Router (path matching is axum's)
//!     → frozen into the listener when the server starts
//! ```
//!
//! # Design Decisions
//! - Registration happens before start; the router is immutable at runtime
//! - Duplicate paths: first registration wins
//! - Pattern matching and wildcards are left to axum

pub mod registry;

pub use registry::{Route, RouteRegistry};
