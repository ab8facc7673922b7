//! `WerewolfServer` builder and serve loop.
//!
//! This is the entry point for running the werewolf server. It ties
//! together all the layers: transport → session → registry → rules.

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use werewolf_game::{Registry, Rules};

use crate::{ServerConfig, WerewolfError, handler};

/// Shared server state passed to every request handler and session loop.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The registry
/// sits behind a single async mutex; nothing holds it across network I/O.
pub(crate) struct ServerState<R: Rules> {
    pub(crate) registry: Mutex<Registry>,
    pub(crate) rules: R,
    pub(crate) config: ServerConfig,
}

impl<R: Rules> ServerState<R> {
    pub(crate) fn new(rules: R, config: ServerConfig) -> Self {
        Self {
            registry: Mutex::new(Registry::new()),
            rules,
            config,
        }
    }
}

/// Builder for configuring and starting a werewolf server.
///
/// # Example
///
/// ```rust,no_run
/// use werewolf::prelude::*;
///
/// # async fn run() -> Result<(), WerewolfError> {
/// let server = WerewolfServer::builder()
///     .bind("0.0.0.0:43200")
///     .reset_key("hunter2")
///     .build(NoRules)
///     .await?;
/// server.run().await
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct WerewolfServerBuilder {
    config: ServerConfig,
}

impl WerewolfServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every setting at once.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets where `GET /new` redirects after a reset.
    pub fn reset_redirect(mut self, target: &str) -> Self {
        self.config.reset_redirect = target.to_string();
        self
    }

    /// Requires `?key=<key>` on `GET /new`.
    pub fn reset_key(mut self, key: &str) -> Self {
        self.config.reset_key = Some(key.to_string());
        self
    }

    /// Binds the listener and wires the routes to `rules`.
    ///
    /// # Errors
    /// Returns [`WerewolfError::Io`] if the address can't be bound.
    pub async fn build<R: Rules>(self, rules: R) -> Result<WerewolfServer, WerewolfError> {
        let listener = TcpListener::bind(&self.config.bind_addr)
            .await
            .inspect_err(|e| {
                tracing::error!(addr = %self.config.bind_addr, error = %e, "failed to bind");
            })?;

        let state = Arc::new(ServerState::new(rules, self.config));
        Ok(WerewolfServer {
            listener,
            router: handler::routes(state),
        })
    }
}

/// A bound werewolf server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct WerewolfServer {
    listener: TcpListener,
    router: Router,
}

impl WerewolfServer {
    /// Creates a new builder.
    pub fn builder() -> WerewolfServerBuilder {
        WerewolfServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// The application router, sharing this server's registry.
    ///
    /// Requests sent through a clone see (and change) the same state as
    /// connections accepted by [`run()`](Self::run).
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serves HTTP and WebSocket connections until the process exits.
    ///
    /// # Errors
    /// Returns [`WerewolfError::Io`] if the listener fails.
    pub async fn run(self) -> Result<(), WerewolfError> {
        if let Ok(addr) = self.listener.local_addr() {
            tracing::info!(%addr, "werewolf server listening");
        }
        axum::serve(self.listener, self.router).await?;
        Ok(())
    }
}
