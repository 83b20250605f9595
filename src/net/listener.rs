//! TCP listener setup.
//!
//! # Responsibilities
//! - Normalize configured bind addresses (`:8080` binds all interfaces)
//! - Bind the listening socket

use std::io;

use tokio::net::TcpListener;

/// Expand a port-only address (`:8080`) to the IPv4 wildcard host.
pub fn normalize_bind_address(addr: &str) -> String {
    let addr = addr.trim();
    if addr.starts_with(':') {
        format!("0.0.0.0{addr}")
    } else {
        addr.to_string()
    }
}

/// Bind a TCP listener on `addr`.
pub async fn bind(addr: &str) -> io::Result<TcpListener> {
    let addr = normalize_bind_address(addr);
    let listener = TcpListener::bind(addr.as_str()).await?;

    tracing::info!(
        address = %listener.local_addr()?,
        "Listener bound"
    );

    Ok(listener)
}
