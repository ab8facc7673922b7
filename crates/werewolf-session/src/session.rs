//! Session liveness.

use std::time::Instant;

/// Whether a real client is currently being served for a session.
///
/// ```text
///   Detached ──(loop starts on a live adapter)──→ Connected
///       ↑                                              │
///       └──────(adapter closes, errors, or is swapped)─┘
/// ```
///
/// There is no expiry: a detached session lives until its client
/// reconnects or the registry is reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// A session loop is serving a live connection.
    Connected,

    /// No live connection since the given instant.
    Detached { since: Instant },
}

impl SessionState {
    /// Returns `true` if the session is being served right now.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}
