//! Liveness endpoint.
//!
//! # Responsibilities
//! - Echo every inbound request header onto the response
//! - Stamp a `Version` header from the injected [`VersionSource`]
//! - Answer `200` with body `200`
//! - Log one access line with the resolved client IP
//!
//! # Design Decisions
//! - The version is injected, never read from hidden globals; whether it is
//!   re-read per request is the caller's choice of source
//! - `host`, `content-length` and `transfer-encoding` describe the request
//!   message and are not echoed
//! - The handler cannot fail

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use axum::extract::{ConnectInfo, MatchedPath, Request, State};
use axum::http::header::{CONTENT_LENGTH, HOST, TRANSFER_ENCODING};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;

use crate::config::{HealthConfig, VersionMode};
use crate::http::client_ip::client_ip;
use crate::observability::metrics;
use crate::routing::Route;

pub const HEALTH_PATH: &str = "/healthz";
pub const HEALTH_BODY: &str = "200";
pub const VERSION_HEADER: HeaderName = HeaderName::from_static("version");

const NOT_ECHOED: [HeaderName; 3] = [HOST, CONTENT_LENGTH, TRANSFER_ENCODING];

/// Metric label for requests that reached a handler without a matched route.
const UNMATCHED_PATH: &str = "unmatched";

/// Where the `Version` header value comes from.
#[derive(Debug, Clone)]
pub enum VersionSource {
    /// Read the environment variable on every request; unset reads as empty.
    Env { var: String },
    /// Injected value, swappable at runtime without a restart.
    Shared(Arc<ArcSwap<String>>),
}

impl VersionSource {
    pub fn env(var: impl Into<String>) -> Self {
        VersionSource::Env { var: var.into() }
    }

    pub fn fixed(version: impl Into<String>) -> Self {
        VersionSource::Shared(Arc::new(ArcSwap::from_pointee(version.into())))
    }

    pub fn from_config(config: &HealthConfig) -> Self {
        match config.version_mode {
            VersionMode::Env => Self::env(config.version_env.clone()),
            VersionMode::Static => Self::fixed(config.version.clone()),
        }
    }

    /// The version to report right now.
    pub fn current(&self) -> String {
        match self {
            VersionSource::Env { var } => std::env::var(var).unwrap_or_default(),
            VersionSource::Shared(version) => version.load().as_ref().clone(),
        }
    }

    /// Replace a shared version. Returns `false` for env-backed sources.
    pub fn set(&self, version: impl Into<String>) -> bool {
        match self {
            VersionSource::Env { .. } => false,
            VersionSource::Shared(current) => {
                current.store(Arc::new(version.into()));
                true
            }
        }
    }
}

impl Default for VersionSource {
    fn default() -> Self {
        Self::env("VERSION")
    }
}

/// The health request handler and its injected configuration.
#[derive(Debug, Clone, Default)]
pub struct HealthResponder {
    version: VersionSource,
}

impl HealthResponder {
    pub fn new(version: VersionSource) -> Self {
        Self { version }
    }

    pub fn from_config(config: &HealthConfig) -> Self {
        Self::new(VersionSource::from_config(config))
    }

    pub fn version(&self) -> &VersionSource {
        &self.version
    }

    /// Bind this responder to [`HEALTH_PATH`] for any method.
    pub fn route(self) -> Route {
        self.route_at(HEALTH_PATH)
    }

    pub fn route_at(self, path: impl Into<String>) -> Route {
        Route::new(path, any(health_handler).with_state(self))
    }

    /// Build the response for a request with `headers` from `remote_addr`.
    pub fn respond(&self, headers: &HeaderMap, remote_addr: &str) -> Response {
        let status = StatusCode::OK;
        let mut response = (status, HEALTH_BODY).into_response();

        let echoed = response.headers_mut();
        for (name, value) in headers {
            if NOT_ECHOED.contains(name) {
                continue;
            }
            echoed.insert(name.clone(), value.clone());
        }

        let version = self.version.current();
        let value = HeaderValue::from_str(&version).unwrap_or_else(|_| {
            tracing::warn!(version = %version, "Version is not a valid header value; sending empty");
            HeaderValue::from_static("")
        });
        echoed.insert(VERSION_HEADER, value);

        let ip = client_ip(headers, remote_addr);
        tracing::info!(client = %ip, status = status.as_u16(), "Health check served");

        response
    }
}

async fn health_handler(State(responder): State<HealthResponder>, request: Request) -> Response {
    let start = Instant::now();
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_default();

    let response = responder.respond(request.headers(), &remote_addr);
    metrics::record_request(metric_path(&request), response.status().as_u16(), start);
    response
}

/// Route pattern used as the metric label, keeping label cardinality bounded
/// by the number of registered routes.
fn metric_path(request: &Request) -> &str {
    request
        .extensions()
        .get::<MatchedPath>()
        .map_or(UNMATCHED_PATH, MatchedPath::as_str)
}
