//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use healthz_server::{Route, Server, ServerError, ServerHandle, ShutdownCause};
use tokio::task::JoinHandle;

pub type Running = JoinHandle<(Server, Result<ShutdownCause, ServerError>)>;

/// A server on an ephemeral loopback port with signal handling off.
pub fn test_server(routes: impl IntoIterator<Item = Route>) -> Server {
    let mut server = Server::new("127.0.0.1:0")
        .with_signal_handling(false)
        .with_shutdown_timeout(Duration::from_secs(5));
    server.register(routes);
    server
}

/// Run `server` on a background task and wait until it is listening.
pub async fn start(mut server: Server) -> (ServerHandle, SocketAddr, Running) {
    let handle = server.handle();
    let running = tokio::spawn(async move {
        let cause = server.run().await;
        (server, cause)
    });

    let addr = tokio::time::timeout(Duration::from_secs(5), handle.local_addr())
        .await
        .expect("server did not bind in time")
        .expect("server ended before binding");

    (handle, addr, running)
}

/// Wait for `run` to return, bounded by one second.
pub async fn unblocked(running: Running) -> (Server, Result<ShutdownCause, ServerError>) {
    tokio::time::timeout(Duration::from_secs(1), running)
        .await
        .expect("run did not return in time")
        .expect("run task panicked")
}

/// Client that never reuses connections, so shutdown is not held open by idle sockets.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
