//! Originating client address resolution.
//!
//! Resolution order (first non-empty wins):
//! 1. `X-Forwarded-For`, first comma-separated entry
//! 2. `X-Real-IP`
//! 3. Host portion of the peer address
//!
//! An unresolvable address is the empty string, not an error.

use axum::http::HeaderMap;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
pub const X_REAL_IP: &str = "x-real-ip";

/// Resolve the best-known client IP from request headers and the raw peer address.
pub fn client_ip(headers: &HeaderMap, remote_addr: &str) -> String {
    let forwarded = header_str(headers, X_FORWARDED_FOR)
        .split(',')
        .next()
        .unwrap_or_default()
        .trim();
    if !forwarded.is_empty() {
        return forwarded.to_string();
    }

    let real_ip = header_str(headers, X_REAL_IP).trim();
    if !real_ip.is_empty() {
        return real_ip.to_string();
    }

    split_host(remote_addr.trim()).unwrap_or_default().to_string()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// Host part of `host:port` or `[v6]:port`. `None` if there is no port or
/// an unbracketed host contains colons.
fn split_host(addr: &str) -> Option<&str> {
    if let Some(rest) = addr.strip_prefix('[') {
        let (host, tail) = rest.split_once(']')?;
        tail.strip_prefix(':')?;
        return Some(host);
    }

    let (host, _port) = addr.rsplit_once(':')?;
    if host.contains(':') {
        return None;
    }
    Some(host)
}
