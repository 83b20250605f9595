//! Network layer.
//!
//! # Data Flow
//! ```text
//! Bind address (config / constructor)
//!     → listener.rs (normalize, bind)
//!     → TcpListener handed to axum::serve
//! ```

pub mod listener;
