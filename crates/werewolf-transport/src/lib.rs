//! Connection adapters for the werewolf server.
//!
//! Provides the [`Connection`] trait and its two implementations:
//!
//! - [`WebSocketConnection`] — backed by an upgraded axum WebSocket
//! - [`PlaceholderConnection`] — no transport at all; lets a player exist
//!   before any client has connected
//!
//! [`Adapter`] is the closed set of the two. Sessions hold an `Adapter`
//! and swap it on reconnection; the session loop is written once against
//! the [`Connection`] contract.

#![allow(async_fn_in_trait)]

mod error;
mod placeholder;
mod websocket;

pub use error::TransportError;
pub use placeholder::PlaceholderConnection;
pub use websocket::WebSocketConnection;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocates the next process-unique id.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A single connection that can send and receive bytes.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends data to the remote peer.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next message from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}

/// The connection currently attached to a player session.
#[derive(Debug)]
pub enum Adapter {
    /// A real client on the other end of a WebSocket.
    Live(WebSocketConnection),

    /// No client yet (or none since the last reset of the adapter).
    Placeholder(PlaceholderConnection),
}

impl Adapter {
    /// Creates a fresh placeholder adapter.
    pub fn placeholder() -> Self {
        Self::Placeholder(PlaceholderConnection::new())
    }

    /// Returns `true` if a real transport is attached.
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live(_))
    }
}

impl From<WebSocketConnection> for Adapter {
    fn from(conn: WebSocketConnection) -> Self {
        Self::Live(conn)
    }
}

impl From<PlaceholderConnection> for Adapter {
    fn from(conn: PlaceholderConnection) -> Self {
        Self::Placeholder(conn)
    }
}

impl Connection for Adapter {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        match self {
            Self::Live(conn) => conn.send(data).await,
            Self::Placeholder(conn) => conn.send(data).await,
        }
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        match self {
            Self::Live(conn) => conn.recv().await,
            Self::Placeholder(conn) => conn.recv().await,
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        match self {
            Self::Live(conn) => conn.close().await,
            Self::Placeholder(conn) => conn.close().await,
        }
    }

    fn id(&self) -> ConnectionId {
        match self {
            Self::Live(conn) => conn.id(),
            Self::Placeholder(conn) => conn.id(),
        }
    }
}
