//! Error types for the game layer.

use werewolf_protocol::GameId;
use werewolf_session::SessionError;

/// Errors that can occur during registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No game with this id exists (never created, or discarded by a reset).
    #[error("game {0} not found")]
    GameNotFound(GameId),

    /// A session refused to join, e.g. it already belongs to another game.
    #[error(transparent)]
    Session(#[from] SessionError),
}
