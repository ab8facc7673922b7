//! Player sessions for the werewolf server.
//!
//! A session is the durable server-side record of one participant:
//!
//! 1. **Identity** — a server-issued [`PlayerToken`](werewolf_protocol::PlayerToken)
//!    the client echoes back to reconnect
//! 2. **Attachment** — the current connection adapter, swapped (never the
//!    session itself) when the client reconnects
//! 3. **Message loop** — an independent task that reads client frames and
//!    hands them to a [`MessageHandler`]
//!
//! # How it fits in the stack
//!
//! ```text
//! Game layer (above)  ← holds sessions in rosters and registry maps
//!     ↕
//! Session layer (this crate)  ← identity, adapter swaps, message loop
//!     ↕
//! Transport layer (below)  ← live WebSocket or placeholder adapter
//! ```

mod error;
mod handler;
mod player;
mod session;

pub use error::SessionError;
pub use handler::MessageHandler;
pub use player::Player;
pub use session::SessionState;
