//! A connection with no transport behind it.
//!
//! Used for players that exist before any client has connected, such as
//! the founder manufactured by `POST /games`. Writes are discarded and
//! reads never complete, so a session loop parked on a placeholder waits
//! for its adapter to be swapped instead of spinning.

use crate::{Connection, ConnectionId, TransportError};

/// The pre-attached stand-in for a real connection.
#[derive(Debug)]
pub struct PlaceholderConnection {
    id: ConnectionId,
}

impl PlaceholderConnection {
    /// Creates a placeholder with its own connection id.
    pub fn new() -> Self {
        Self {
            id: ConnectionId::next(),
        }
    }
}

impl Default for PlaceholderConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl Connection for PlaceholderConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        tracing::trace!(id = %self.id, len = data.len(), "placeholder dropped outbound message");
        Ok(())
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        std::future::pending().await
    }

    async fn close(&self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
