//! The seam between a session loop and whatever acts on its messages.
//!
//! The session crate knows how to read frames from a connection and
//! decode them; it does not know about games or rules. The server
//! implements [`MessageHandler`] to route decoded messages into the
//! registry, and tests implement it to observe the loop.

use std::future::Future;
use std::sync::Arc;

use werewolf_protocol::ClientMessage;

use crate::Player;

/// Receives the events of a running session loop.
///
/// `Send + Sync + 'static` because one handler is shared by every session
/// task for the lifetime of the server.
pub trait MessageHandler: Send + Sync + 'static {
    /// Called once each time a loop starts serving a freshly attached
    /// connection, before any client frame is read. The server uses this
    /// to send the `Welcome` message carrying the player's token.
    fn on_attach(&self, player: &Arc<Player>) -> impl Future<Output = ()> + Send;

    /// Called for every decoded client message, in arrival order.
    fn on_message(
        &self,
        player: &Arc<Player>,
        msg: ClientMessage,
    ) -> impl Future<Output = ()> + Send;
}
