//! Error types for the session layer.

use werewolf_protocol::{GameId, PlayerToken, ProtocolError};
use werewolf_transport::TransportError;

/// Errors that can occur while a session talks to its client or is
/// attached to a game.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A message could not be encoded for the wire.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The current adapter failed to deliver a message.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The player already belongs to a different game. Game membership is
    /// set once and never reassigned.
    #[error("player {player} already belongs to game {current}")]
    AlreadyInGame {
        player: PlayerToken,
        current: GameId,
    },
}
