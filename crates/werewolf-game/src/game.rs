//! A single game instance: leader, roster, alive set, roleset, phase.
//!
//! `Game` has no lock of its own. It lives inside the [`Registry`], and
//! every mutation happens while the registry lock is held: joins from the
//! connection router as well as eliminations and phase changes from the
//! rules engine.
//!
//! [`Registry`]: crate::Registry

use std::sync::Arc;

use werewolf_protocol::{GameId, GameSummary, PlayerToken, Recipient};
use werewolf_session::{Player, SessionError};

use crate::Roleset;

/// One running or forming game.
///
/// Invariants, held after every method returns:
/// - the leader is in the roster;
/// - every alive player is in the roster;
/// - the roster only grows.
#[derive(Debug)]
pub struct Game {
    id: GameId,
    leader: Arc<Player>,
    /// Members in join order.
    roster: Vec<Arc<Player>>,
    /// Surviving members, in join order.
    alive: Vec<PlayerToken>,
    roleset: Option<Roleset>,
    phase: u32,
}

impl Game {
    /// Creates a game with `founder` as leader and sole (alive) member.
    ///
    /// # Errors
    /// Returns [`SessionError::AlreadyInGame`] if the founder already
    /// belongs to another game.
    pub fn new(founder: Arc<Player>) -> Result<Self, SessionError> {
        let id = GameId::generate();
        founder.bind_game(id)?;
        Ok(Self {
            id,
            alive: vec![founder.token()],
            roster: vec![Arc::clone(&founder)],
            leader: founder,
            roleset: None,
            phase: 0,
        })
    }

    /// The game's identity.
    pub fn id(&self) -> GameId {
        self.id
    }

    /// The player who created the game.
    pub fn leader(&self) -> &Arc<Player> {
        &self.leader
    }

    /// All members, in join order.
    pub fn roster(&self) -> &[Arc<Player>] {
        &self.roster
    }

    /// Surviving members, in join order.
    pub fn alive(&self) -> impl Iterator<Item = &Arc<Player>> {
        self.roster
            .iter()
            .filter(|p| self.alive.contains(&p.token()))
    }

    /// Number of surviving members.
    pub fn alive_count(&self) -> usize {
        self.alive.len()
    }

    /// Looks up a member by token.
    pub fn member(&self, token: PlayerToken) -> Option<&Arc<Player>> {
        self.roster.iter().find(|p| p.token() == token)
    }

    /// Returns `true` if `token` is in the roster.
    pub fn is_member(&self, token: PlayerToken) -> bool {
        self.member(token).is_some()
    }

    /// Returns `true` if `token` is in the alive set.
    pub fn is_alive(&self, token: PlayerToken) -> bool {
        self.alive.contains(&token)
    }

    /// Adds a player to the roster (and the alive set).
    ///
    /// Idempotent: adding a current member changes nothing and returns
    /// `Ok(false)`. Returns `Ok(true)` when the roster grew.
    ///
    /// # Errors
    /// Returns [`SessionError::AlreadyInGame`] if the player belongs to a
    /// different game.
    pub fn add_player(&mut self, player: Arc<Player>) -> Result<bool, SessionError> {
        if self.is_member(player.token()) {
            return Ok(false);
        }
        player.bind_game(self.id)?;
        tracing::info!(
            game_id = %self.id,
            player_id = %player.token(),
            players = self.roster.len() + 1,
            "player joined game"
        );
        self.alive.push(player.token());
        self.roster.push(player);
        Ok(true)
    }

    /// Removes a player from the alive set. The roster keeps them.
    ///
    /// Returns `true` if the player was alive.
    pub fn eliminate(&mut self, token: PlayerToken) -> bool {
        let before = self.alive.len();
        self.alive.retain(|t| *t != token);
        let eliminated = self.alive.len() != before;
        if eliminated {
            tracing::info!(game_id = %self.id, player_id = %token, "player eliminated");
        }
        eliminated
    }

    /// The selected roleset, if any.
    pub fn roleset(&self) -> Option<&Roleset> {
        self.roleset.as_ref()
    }

    /// Selects the roleset the game will be played with.
    pub fn set_roleset(&mut self, roleset: Roleset) {
        tracing::debug!(game_id = %self.id, roleset = %roleset.name, "roleset selected");
        self.roleset = Some(roleset);
    }

    /// The current phase ordinal.
    pub fn phase(&self) -> u32 {
        self.phase
    }

    /// Sets the phase ordinal.
    pub fn set_phase(&mut self, phase: u32) {
        self.phase = phase;
    }

    /// Moves to the next phase and returns it.
    pub fn advance_phase(&mut self) -> u32 {
        self.phase += 1;
        tracing::debug!(game_id = %self.id, phase = self.phase, "phase advanced");
        self.phase
    }

    /// Resolves a recipient to the roster members it addresses.
    pub fn recipients(&self, recipient: Recipient) -> Vec<Arc<Player>> {
        self.roster
            .iter()
            .filter(|p| recipient.includes(p.token()))
            .cloned()
            .collect()
    }

    /// Projects this game into its listing entry.
    pub fn summary(&self) -> GameSummary {
        GameSummary {
            id: self.id,
            leader: self.leader.name(),
            player_count: self.roster.len(),
            alive_players: self.alive.len(),
            game_phase: self.phase,
            roleset: self.roleset.as_ref().map(|r| r.name.clone()),
            players_needed: self.roleset.as_ref().map(Roleset::players_needed),
        }
    }
}

#[cfg(test)]
mod tests {
    use werewolf_transport::Adapter;

    use super::*;

    fn player() -> Arc<Player> {
        Player::new(Adapter::placeholder())
    }

    /// Checks the structural invariants that must hold at every snapshot.
    fn assert_invariants(game: &Game) {
        assert!(game.is_member(game.leader().token()), "leader must be in roster");
        for token in &game.alive {
            assert!(game.is_member(*token), "alive player must be in roster");
        }
    }

    #[test]
    fn test_new_founder_is_leader_and_only_member() {
        let founder = player();
        let game = Game::new(Arc::clone(&founder)).unwrap();

        assert_eq!(game.leader().token(), founder.token());
        assert_eq!(game.roster().len(), 1);
        assert_eq!(game.alive_count(), 1);
        assert_eq!(founder.game_id(), Some(game.id()));
        assert_invariants(&game);
    }

    #[test]
    fn test_add_player_twice_is_idempotent() {
        let mut game = Game::new(player()).unwrap();
        let p = player();

        assert!(game.add_player(Arc::clone(&p)).unwrap());
        assert!(!game.add_player(Arc::clone(&p)).unwrap());

        assert_eq!(game.roster().len(), 2);
        assert_eq!(game.alive_count(), 2);
        assert_invariants(&game);
    }

    #[test]
    fn test_add_player_keeps_join_order() {
        let founder = player();
        let mut game = Game::new(Arc::clone(&founder)).unwrap();
        let second = player();
        let third = player();
        game.add_player(Arc::clone(&second)).unwrap();
        game.add_player(Arc::clone(&third)).unwrap();

        let order: Vec<_> = game.roster().iter().map(|p| p.token()).collect();
        assert_eq!(order, vec![founder.token(), second.token(), third.token()]);
    }

    #[test]
    fn test_add_player_from_other_game_is_refused() {
        let mut first = Game::new(player()).unwrap();
        let mut second = Game::new(player()).unwrap();
        let p = player();
        first.add_player(Arc::clone(&p)).unwrap();

        let result = second.add_player(p);

        assert!(matches!(result, Err(SessionError::AlreadyInGame { .. })));
        assert_eq!(second.roster().len(), 1);
    }

    #[test]
    fn test_eliminate_shrinks_alive_not_roster() {
        let mut game = Game::new(player()).unwrap();
        let p = player();
        game.add_player(Arc::clone(&p)).unwrap();

        assert!(game.eliminate(p.token()));
        assert!(!game.eliminate(p.token()), "second elimination is a no-op");

        assert_eq!(game.roster().len(), 2);
        assert_eq!(game.alive_count(), 1);
        assert!(!game.is_alive(p.token()));
        assert_eq!(game.alive().count(), 1);
        assert_invariants(&game);
    }

    #[test]
    fn test_summary_reflects_state() {
        let founder = player();
        founder.set_name("Ada");
        let mut game = Game::new(Arc::clone(&founder)).unwrap();
        let p = player();
        game.add_player(Arc::clone(&p)).unwrap();
        game.eliminate(p.token());
        game.set_roleset(Roleset::new("Basic", ["Werewolf", "Villager", "Seer"]));
        game.advance_phase();

        let summary = game.summary();

        assert_eq!(summary.id, game.id());
        assert_eq!(summary.leader, "Ada");
        assert_eq!(summary.player_count, 2);
        assert_eq!(summary.alive_players, 1);
        assert_eq!(summary.game_phase, 1);
        assert_eq!(summary.roleset.as_deref(), Some("Basic"));
        assert_eq!(summary.players_needed, Some(3));
    }

    #[test]
    fn test_recipients_resolve_against_roster() {
        let founder = player();
        let mut game = Game::new(Arc::clone(&founder)).unwrap();
        let p = player();
        game.add_player(Arc::clone(&p)).unwrap();

        assert_eq!(game.recipients(Recipient::All).len(), 2);
        let only = game.recipients(Recipient::Player(p.token()));
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].token(), p.token());
        let others = game.recipients(Recipient::AllExcept(p.token()));
        assert_eq!(others.len(), 1);
        assert_eq!(others[0].token(), founder.token());
    }

    #[test]
    fn test_set_phase_overrides_ordinal() {
        let mut game = Game::new(player()).unwrap();
        game.set_phase(4);
        assert_eq!(game.phase(), 4);
        assert_eq!(game.advance_phase(), 5);
    }
}
