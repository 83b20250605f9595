//! Route registration and router assembly.
//!
//! # Responsibilities
//! - Store (path, handler) bindings in registration order
//! - Reject bindings axum cannot mount: no leading '/', `:`/`*` segments,
//!   patterns that conflict with an earlier route
//! - Resolve duplicate and conflicting paths: first registration wins
//! - Build the axum `Router` the listener dispatches through

use axum::routing::MethodRouter;
use axum::Router;

/// An immutable (path pattern, handler) binding.
#[derive(Clone)]
pub struct Route {
    path: String,
    handler: MethodRouter,
}

impl Route {
    /// Bind `handler` to `path`. The path uses axum's pattern syntax.
    pub fn new(path: impl Into<String>, handler: MethodRouter) -> Self {
        Self {
            path: path.into(),
            handler,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route").field("path", &self.path).finish()
    }
}

/// Why a binding was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteRejection {
    #[error("path must start with '/'")]
    MissingLeadingSlash,

    #[error("path segments must use `{{name}}`/`{{*rest}}` captures, not `:`/`*` prefixes")]
    LegacyCapture,

    #[error("path is already registered")]
    Duplicate,

    #[error("{0}")]
    Conflict(String),
}

/// Ordered set of route bindings.
///
/// Every accepted path has also been inserted into a `matchit` router, the
/// matcher axum mounts routes on, so `build_router` never sees a pattern it
/// would refuse.
#[derive(Default)]
pub struct RouteRegistry {
    routes: Vec<Route>,
    matcher: matchit::Router<()>,
}

impl std::fmt::Debug for RouteRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteRegistry").field("routes", &self.routes).finish()
    }
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check `path` and reserve it in the matcher.
    fn admit(&mut self, path: &str) -> Result<(), RouteRejection> {
        if !path.starts_with('/') {
            return Err(RouteRejection::MissingLeadingSlash);
        }
        if path
            .split('/')
            .any(|segment| segment.starts_with(':') || segment.starts_with('*'))
        {
            return Err(RouteRejection::LegacyCapture);
        }
        if self.contains(path) {
            return Err(RouteRejection::Duplicate);
        }
        self.matcher
            .insert(path, ())
            .map_err(|e| RouteRejection::Conflict(e.to_string()))
    }

    /// Append routes, returning how many were accepted.
    pub fn register(&mut self, routes: impl IntoIterator<Item = Route>) -> usize {
        let mut accepted = 0;
        for route in routes {
            if let Err(reason) = self.admit(&route.path) {
                tracing::warn!(path = %route.path, %reason, "Rejected route; first registration wins");
                continue;
            }
            tracing::debug!(path = %route.path, "Route registered");
            self.routes.push(route);
            accepted += 1;
        }
        accepted
    }

    pub fn contains(&self, path: &str) -> bool {
        self.routes.iter().any(|r| r.path == path)
    }

    /// Registered paths in registration order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(Route::path)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Mount every binding on a fresh router.
    pub fn build_router(&self) -> Router {
        self.routes
            .iter()
            .fold(Router::new(), |router, route| {
                router.route(&route.path, route.handler.clone())
            })
    }
}
