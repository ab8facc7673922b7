//! # Werewolf
//!
//! The connection and session layer of a multiplayer Werewolf server.
//!
//! Players connect over WebSockets, either to one implicit global game
//! (`/`) or to a lobby game they picked from the listing (`/games/{id}`).
//! Every client gets a server-issued token in its `Welcome` message and
//! can reconnect with `?id=<token>` to pick up the same session. The
//! actual game rules plug in through the [`Rules`](prelude::Rules) trait.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use werewolf::prelude::*;
//!
//! # async fn run() -> Result<(), WerewolfError> {
//! let server = WerewolfServer::builder()
//!     .bind("0.0.0.0:43200")
//!     .build(NoRules)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod dispatch;
mod error;
mod handler;
mod server;

pub use config::ServerConfig;
pub use error::WerewolfError;
pub use server::{WerewolfServer, WerewolfServerBuilder};

/// Everything needed to run a server and write a rules engine.
pub mod prelude {
    pub use crate::{ServerConfig, WerewolfError, WerewolfServer, WerewolfServerBuilder};
    pub use werewolf_game::{Game, NoRules, Outbound, Roleset, Rules};
    pub use werewolf_protocol::{
        ClientMessage, GameId, GameSummary, PlayerToken, Recipient, ServerMessage,
    };
}
