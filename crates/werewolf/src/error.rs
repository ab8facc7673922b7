//! Unified error type for the werewolf server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use werewolf_game::RegistryError;
use werewolf_protocol::ProtocolError;
use werewolf_session::SessionError;
use werewolf_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum WerewolfError {
    /// A transport-level error (send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, malformed id).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (player already bound to another game).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A registry-level error (unknown game).
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Binding or serving the listener failed.
    #[error("server I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl WerewolfError {
    /// The HTTP status a request handler answers with for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Registry(RegistryError::GameNotFound(_)) => StatusCode::NOT_FOUND,
            Self::Registry(RegistryError::Session(SessionError::AlreadyInGame { .. }))
            | Self::Session(SessionError::AlreadyInGame { .. }) => StatusCode::CONFLICT,
            Self::Protocol(ProtocolError::InvalidId(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WerewolfError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, %status, "request rejected");
        }
        (status, self.to_string()).into_response()
    }
}
