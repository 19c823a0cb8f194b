//! # Alert Server
//!
//! An `axum` server exposing two routes for operational testing:
//!
//! - `GET /` answers 200 with an empty body.
//! - `GET /simulateError` emits one error-level event, which the alert layer
//!   turns into an SMS, and answers 500.
//!
//! The server stops when the shutdown channel fires.

use axum::{http::StatusCode, routing::get, Router};
use std::future::Future;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, trace};

/// Builds the route table.
pub fn router() -> Router {
    Router::new()
        .route("/", get(index))
        .route("/simulateError", get(simulate_error))
}

async fn index() -> StatusCode {
    StatusCode::OK
}

async fn simulate_error() -> StatusCode {
    error!("This should trigger error handling!");
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Owns the bound listener until `run` consumes it.
pub struct AlertServer {
    listener: TcpListener,
    shutdown_rx: watch::Receiver<bool>,
}

impl AlertServer {
    /// Creates a new `AlertServer` but does not start serving.
    ///
    /// # Arguments
    ///
    /// * `listener` - A `TcpListener` that has already been bound to an address.
    /// * `shutdown_rx` - A watch channel receiver for graceful shutdown.
    pub fn new(listener: TcpListener, shutdown_rx: watch::Receiver<bool>) -> Self {
        Self {
            listener,
            shutdown_rx,
        }
    }

    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Returns a future that serves requests until a shutdown signal is received.
    pub fn run(self) -> impl Future<Output = ()> {
        let mut shutdown_rx = self.shutdown_rx;
        let listener = self.listener;

        async move {
            if let Ok(addr) = listener.local_addr() {
                info!(%addr, "HTTP server listening.");
            }
            let shutdown = async move {
                // A dropped sender counts as a shutdown request too.
                let _ = shutdown_rx.wait_for(|stop| *stop).await;
                trace!("HTTP server received shutdown signal.");
            };
            if let Err(e) = axum::serve(listener, router())
                .with_graceful_shutdown(shutdown)
                .await
            {
                error!("HTTP server error: {}", e);
            }
            trace!("HTTP server task finished.");
        }
    }
}
