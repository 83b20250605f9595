//! HTTP server lifecycle.
//!
//! # Responsibilities
//! - Own the route registry until the server starts
//! - Bind and serve on a background task with graceful shutdown
//! - Block `run` on the first of: termination signal, cancellation token
//! - Drain in-flight requests on `stop`, bounded by the shutdown timeout;
//!   stragglers are detached, not closed
//!
//! # States
//! ```text
//! Created ──run──▶ Running ──signal / listener exit / cancel──▶ Stopping ──stop──▶ Stopped
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::lifecycle::signals::{next_signal, TerminationSignals};
use crate::lifecycle::{LifecycleState, Shutdown, ShutdownCause};
use crate::net::listener;
use crate::routing::{Route, RouteRegistry};

const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors surfaced by the server lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("listener failed: {0}")]
    Serve(#[source] std::io::Error),

    #[error("failed to install signal handlers: {0}")]
    Signal(#[source] std::io::Error),

    #[error("server already started (state: {0})")]
    AlreadyStarted(LifecycleState),

    #[error("listener task failed: {0}")]
    Task(String),
}

/// Cloneable handle for observing and cancelling a server from other tasks.
#[derive(Clone)]
pub struct ServerHandle {
    shutdown: Shutdown,
    bound: watch::Receiver<Option<SocketAddr>>,
}

impl ServerHandle {
    /// Unblock `run` with [`ShutdownCause::Requested`].
    pub fn cancel(&self) -> bool {
        self.shutdown.trigger(ShutdownCause::Requested)
    }

    /// The cause recorded by the cancellation token, if it has fired.
    pub fn cause(&self) -> Option<ShutdownCause> {
        self.shutdown.cause()
    }

    /// Wait for the listener to bind. `None` if the lifecycle ends first.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        let mut bound = self.bound.clone();
        tokio::select! {
            biased;
            addr = bound.wait_for(Option::is_some) => addr.ok().and_then(|addr| *addr),
            _ = self.shutdown.wait() => *self.bound.borrow(),
        }
    }
}

/// HTTP server with signal-aware lifecycle.
pub struct Server {
    addr: String,
    routes: RouteRegistry,
    shutdown: Shutdown,
    drain: watch::Sender<bool>,
    bound: Arc<watch::Sender<Option<SocketAddr>>>,
    task: Option<JoinHandle<Result<(), ServerError>>>,
    state: LifecycleState,
    shutdown_timeout: Duration,
    request_timeout: Duration,
    handle_signals: bool,
}

impl Server {
    /// Create a server that will listen on `addr` (`host:port` or `:port`).
    pub fn new(addr: impl Into<String>) -> Self {
        let (drain, _) = watch::channel(false);
        let (bound, _) = watch::channel(None);
        Self {
            addr: addr.into(),
            routes: RouteRegistry::new(),
            shutdown: Shutdown::new(),
            drain,
            bound: Arc::new(bound),
            task: None,
            state: LifecycleState::Created,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            handle_signals: true,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.listener.bind_address.clone())
            .with_shutdown_timeout(Duration::from_secs(config.shutdown.timeout_secs))
            .with_request_timeout(Duration::from_secs(config.timeouts.request_secs))
            .with_signal_handling(config.shutdown.handle_signals)
    }

    /// Upper bound on draining in `stop`. Connections still open afterwards
    /// are detached and end with their handler or the request timeout.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Whether `run` subscribes to termination signals.
    pub fn with_signal_handling(mut self, enabled: bool) -> Self {
        self.handle_signals = enabled;
        self
    }

    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            shutdown: self.shutdown.clone(),
            bound: self.bound.subscribe(),
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// The bound address once the listener is up.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.bound.borrow()
    }

    /// Register routes. Only takes effect before `run`.
    pub fn register(&mut self, routes: impl IntoIterator<Item = Route>) {
        if self.state != LifecycleState::Created {
            tracing::warn!(state = %self.state, "Ignoring route registration after start");
            return;
        }
        self.routes.register(routes);
    }

    fn build_router(&self) -> Router {
        #[allow(deprecated)]
        let timeout = TimeoutLayer::new(self.request_timeout);
        self.routes
            .build_router()
            .layer(timeout)
            .layer(TraceLayer::new_for_http())
    }

    /// Start serving and wait for a termination trigger.
    ///
    /// Returns the cause that unblocked the wait. A listener that failed to
    /// bind or serve is reported as an error. The listener keeps serving
    /// after a signal until [`Server::stop`] is called.
    pub async fn run(&mut self) -> Result<ShutdownCause, ServerError> {
        if self.state != LifecycleState::Created {
            return Err(ServerError::AlreadyStarted(self.state));
        }

        let mut signals = if self.handle_signals {
            Some(TerminationSignals::install().map_err(ServerError::Signal)?)
        } else {
            None
        };

        let app = self.build_router();
        self.task = Some(tokio::spawn(serve(
            self.addr.clone(),
            app,
            self.shutdown.clone(),
            self.drain.subscribe(),
            self.bound.clone(),
        )));
        self.state = LifecycleState::Running;
        tracing::info!(address = %self.addr, routes = self.routes.len(), "Server running");

        tokio::select! {
            signal = next_signal(&mut signals) => {
                tracing::info!(%signal, "Server received termination signal");
                self.shutdown.trigger(ShutdownCause::Signal(signal));
            }
            _ = self.shutdown.wait() => {}
        }

        let cause = self.shutdown.wait().await;
        self.state = LifecycleState::Stopping;
        tracing::info!(%cause, "Server unblocked");

        if cause == ShutdownCause::ListenerExited {
            if let Some(task) = self.task.take() {
                join_listener(task).await?;
            }
        }

        Ok(cause)
    }

    /// Gracefully stop the listener. Safe to call more than once.
    pub async fn stop(&mut self) -> Result<(), ServerError> {
        if self.state == LifecycleState::Stopped {
            tracing::debug!("Server already stopped");
            return Ok(());
        }

        self.state = LifecycleState::Stopping;
        self.shutdown.trigger(ShutdownCause::Requested);
        self.drain.send_replace(true);

        let result = match self.task.take() {
            Some(mut task) => match tokio::time::timeout(self.shutdown_timeout, &mut task).await {
                Ok(joined) => flatten_join(joined),
                Err(_) => {
                    tracing::warn!(
                        timeout_secs = self.shutdown_timeout.as_secs_f64(),
                        "Graceful shutdown timed out; detaching in-flight connections"
                    );
                    task.abort();
                    Ok(())
                }
            },
            None => Ok(()),
        };

        self.state = LifecycleState::Stopped;
        tracing::info!("Server stopped");
        result
    }
}

async fn join_listener(task: JoinHandle<Result<(), ServerError>>) -> Result<(), ServerError> {
    flatten_join(task.await)
}

fn flatten_join(
    joined: Result<Result<(), ServerError>, tokio::task::JoinError>,
) -> Result<(), ServerError> {
    joined.map_err(|e| ServerError::Task(e.to_string()))?
}

/// Listener task: serve until drained or failed, then fire the token.
async fn serve(
    addr: String,
    app: Router,
    shutdown: Shutdown,
    drain: watch::Receiver<bool>,
    bound: Arc<watch::Sender<Option<SocketAddr>>>,
) -> Result<(), ServerError> {
    let result = listen(addr, app, drain, &bound).await;
    match &result {
        Ok(()) => tracing::info!("Listener stopped"),
        Err(e) => tracing::error!(error = %e, "Listener terminated"),
    }
    shutdown.trigger(ShutdownCause::ListenerExited);
    result
}

async fn listen(
    addr: String,
    app: Router,
    mut drain: watch::Receiver<bool>,
    bound: &watch::Sender<Option<SocketAddr>>,
) -> Result<(), ServerError> {
    let listener = listener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind { addr: addr.clone(), source })?;
    let local_addr = listener
        .local_addr()
        .map_err(|source| ServerError::Bind { addr, source })?;
    bound.send_replace(Some(local_addr));

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move {
            // A dropped server also drains.
            let _ = drain.wait_for(|draining| *draining).await;
            tracing::info!("Draining connections");
        })
        .await
        .map_err(ServerError::Serve)
}
