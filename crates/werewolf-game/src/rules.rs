//! The `Rules` trait: where the game's actual rules plug in.
//!
//! Phases, role abilities, votes, and win conditions are not this
//! workspace's business. A rules engine implements [`Rules`] and the server
//! calls it with the game already locked, so whatever it changes (alive
//! set, phase, roleset) is serialized with joins from the router.

use serde_json::Value;
use werewolf_protocol::{PlayerToken, Recipient};

use crate::Game;

/// Messages a rules engine wants delivered, paired with who gets them.
pub type Outbound = Vec<(Recipient, Value)>;

/// A game's rules engine.
///
/// Methods take `&self` and the game by reference: the engine keeps its
/// own per-game state inside [`Game`] (phase, roleset, alive set) or
/// behind its own interior mutability.
pub trait Rules: Send + Sync + 'static {
    /// Checks an action before it is applied.
    ///
    /// If this returns `Err`, the action is dropped and the reason is sent
    /// back to the sender. Default: accept everything.
    fn validate_action(
        &self,
        _game: &Game,
        _sender: PlayerToken,
        _action: &Value,
    ) -> Result<(), String> {
        Ok(())
    }

    /// Applies a player's action to the game.
    fn handle_action(
        &self,
        game: &mut Game,
        sender: PlayerToken,
        action: Value,
    ) -> Outbound;

    /// Called after a new member has been added to the roster.
    /// Default: no-op.
    fn on_player_joined(&self, _game: &mut Game, _player: PlayerToken) -> Outbound {
        Vec::new()
    }
}

/// The rules engine used when none is configured: every action is
/// rejected, joins pass silently.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRules;

impl Rules for NoRules {
    fn validate_action(
        &self,
        _game: &Game,
        _sender: PlayerToken,
        _action: &Value,
    ) -> Result<(), String> {
        Err("no rules engine is configured".into())
    }

    fn handle_action(
        &self,
        _game: &mut Game,
        _sender: PlayerToken,
        _action: Value,
    ) -> Outbound {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use werewolf_session::Player;
    use werewolf_transport::Adapter;

    use super::*;

    #[test]
    fn test_no_rules_rejects_actions() {
        let founder = Player::new(Adapter::placeholder());
        let game = Game::new(Arc::clone(&founder)).unwrap();

        let result = NoRules.validate_action(&game, founder.token(), &Value::Null);

        assert!(result.is_err());
    }

    #[test]
    fn test_no_rules_join_hook_is_silent() {
        let founder = Player::new(Adapter::placeholder());
        let mut game = Game::new(Arc::clone(&founder)).unwrap();

        assert!(NoRules.on_player_joined(&mut game, founder.token()).is_empty());
    }
}
