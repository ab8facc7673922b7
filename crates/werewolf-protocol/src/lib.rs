//! Wire-level vocabulary for the werewolf server.
//!
//! - **Identities** ([`PlayerToken`], [`GameId`]) — the 128-bit values that
//!   name sessions and games.
//! - **Listing** ([`GameSummary`]) — the stable projection served by
//!   `GET /games`.
//! - **Session messages** ([`ClientMessage`], [`ServerMessage`]) and the
//!   [`Codec`] that turns them into bytes.
//!
//! This crate knows nothing about connections, sessions, or games. It only
//! defines what they exchange.

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    ClientMessage, GameId, GameSummary, PlayerToken, Recipient, ServerMessage,
};
