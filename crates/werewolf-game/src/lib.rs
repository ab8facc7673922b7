//! Games and the session & game registry for the werewolf server.
//!
//! # Key types
//!
//! - [`Registry`] — maps tokens to sessions and ids to games, in both the
//!   global (one implicit game) and lobby (many games) topologies
//! - [`Game`] — one game instance: leader, roster, alive set, phase
//! - [`Rules`] — the trait an external rules engine implements
//! - [`Roleset`] — the role configuration a game is played with

mod error;
mod game;
mod registry;
mod roleset;
mod rules;

pub use error::RegistryError;
pub use game::Game;
pub use registry::{Registry, Resolution, Scope};
pub use roleset::Roleset;
pub use rules::{NoRules, Outbound, Rules};
