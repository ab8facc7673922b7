//! The session & game registry: who is playing, and in which game.
//!
//! Two topologies live side by side:
//!
//! - **Global scope** — one implicit game, created by the first player to
//!   connect to `/`, plus a process-wide token → player map.
//! - **Game scope** — any number of lobby games created through
//!   `POST /games`, each with its own token → player map. A token is only
//!   ever looked up inside the scope it was issued in.
//!
//! # Concurrency note
//!
//! `Registry` is NOT thread-safe by itself. The server keeps exactly one,
//! behind a single `tokio::sync::Mutex`, and every read-modify-write
//! (resolve, create, join, reset, rules-engine mutation) runs inside one
//! lock acquisition. Nothing here touches the network: adapter swaps only
//! move references, and replaced adapters are handed back to the caller to
//! close after the lock is released.

use std::collections::HashMap;
use std::sync::Arc;

use werewolf_protocol::{GameId, GameSummary, PlayerToken};
use werewolf_session::Player;
use werewolf_transport::Adapter;

use crate::{Game, RegistryError};

/// Where a token is looked up and where new players are registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The implicit global game and its process-wide player map.
    Global,

    /// One lobby game and its own player map.
    Game(GameId),
}

/// The outcome of [`Registry::resolve_or_create`].
#[derive(Debug)]
pub enum Resolution {
    /// The token matched a session in scope; its adapter was swapped.
    Reconnected {
        player: Arc<Player>,
        /// The adapter that was attached before. Close it once the
        /// registry lock has been released.
        replaced: Arc<Adapter>,
    },

    /// A brand-new session was created and registered in scope.
    Created { player: Arc<Player> },
}

impl Resolution {
    /// The resolved session, whichever way it was resolved.
    pub fn player(&self) -> &Arc<Player> {
        match self {
            Self::Reconnected { player, .. } | Self::Created { player } => player,
        }
    }
}

/// A lobby game plus the sessions scoped to it.
#[derive(Debug)]
struct LobbyGame {
    /// Creation order, used to keep the listing stable.
    seq: u64,
    game: Game,
    players: HashMap<PlayerToken, Arc<Player>>,
}

/// Tracks every live session and game in the process.
#[derive(Debug, Default)]
pub struct Registry {
    /// The implicit game served on `/`, if anyone has connected yet.
    current: Option<Game>,

    /// Sessions created through `/`, keyed by token.
    players: HashMap<PlayerToken, Arc<Player>>,

    /// Lobby games, keyed by id.
    games: HashMap<GameId, LobbyGame>,

    next_seq: u64,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------
    // Sessions
    // -----------------------------------------------------------------

    /// Finds the session for `token` in `scope`, or creates a new one.
    ///
    /// - Known token: the existing session is rebound to `adapter` and
    ///   returned as [`Resolution::Reconnected`]. No game is joined.
    /// - No token, a token from another scope, or an unknown token: a new
    ///   session with a freshly issued token is registered in `scope`.
    ///   Client-supplied tokens never become registry keys, so two
    ///   connections presenting the same unknown token get two sessions.
    ///
    /// New sessions are not added to any game; see [`join_global`] and
    /// [`add_member`].
    ///
    /// # Errors
    /// Returns [`RegistryError::GameNotFound`] if `scope` names a game
    /// that doesn't exist.
    ///
    /// [`join_global`]: Self::join_global
    /// [`add_member`]: Self::add_member
    pub fn resolve_or_create(
        &mut self,
        scope: Scope,
        token: Option<PlayerToken>,
        adapter: Adapter,
    ) -> Result<Resolution, RegistryError> {
        let players = self.players_mut(scope)?;

        if let Some(player) = token.and_then(|t| players.get(&t)) {
            let player = Arc::clone(player);
            let replaced = player.rebind(adapter);
            tracing::info!(player_id = %player.token(), ?scope, "reconnecting to player");
            return Ok(Resolution::Reconnected { player, replaced });
        }

        let player = Player::new(adapter);
        players.insert(player.token(), Arc::clone(&player));
        tracing::info!(player_id = %player.token(), ?scope, "creating new player");
        Ok(Resolution::Created { player })
    }

    /// Looks up a session in `scope` without touching it.
    pub fn player(&self, scope: Scope, token: PlayerToken) -> Option<&Arc<Player>> {
        match scope {
            Scope::Global => self.players.get(&token),
            Scope::Game(id) => self.games.get(&id)?.players.get(&token),
        }
    }

    /// Number of sessions registered in `scope`.
    pub fn player_count(&self, scope: Scope) -> usize {
        match scope {
            Scope::Global => self.players.len(),
            Scope::Game(id) => self.games.get(&id).map_or(0, |g| g.players.len()),
        }
    }

    // -----------------------------------------------------------------
    // Games
    // -----------------------------------------------------------------

    /// Creates a lobby game led by `founder`.
    ///
    /// The founder becomes the only roster member and the only session in
    /// the game's scope, so they can later reconnect with their token.
    ///
    /// # Errors
    /// Returns [`RegistryError::Session`] if `founder` already belongs to
    /// a game.
    pub fn create_game(&mut self, founder: Arc<Player>) -> Result<GameId, RegistryError> {
        let game = Game::new(Arc::clone(&founder))?;
        let game_id = game.id();

        let seq = self.next_seq;
        self.next_seq += 1;

        let players = HashMap::from([(founder.token(), founder)]);
        self.games.insert(game_id, LobbyGame { seq, game, players });
        tracing::info!(%game_id, "creating game");
        Ok(game_id)
    }

    /// Puts a new global-scope player into the implicit game.
    ///
    /// The first caller founds the game and becomes its leader; everyone
    /// after joins it. Returns the implicit game's id.
    ///
    /// # Errors
    /// Returns [`RegistryError::Session`] if the player already belongs to
    /// a different game.
    pub fn join_global(&mut self, player: &Arc<Player>) -> Result<GameId, RegistryError> {
        match &mut self.current {
            Some(game) => {
                game.add_player(Arc::clone(player))?;
                Ok(game.id())
            }
            None => {
                let game = Game::new(Arc::clone(player))?;
                let game_id = game.id();
                tracing::info!(%game_id, leader = %player.token(), "creating global game");
                self.current = Some(game);
                Ok(game_id)
            }
        }
    }

    /// Adds `player` to a game's roster.
    ///
    /// Idempotent: returns `Ok(false)` if the player is already a member.
    /// For lobby games the player is also registered in the game's scope.
    ///
    /// # Errors
    /// - [`RegistryError::GameNotFound`] — no such game
    /// - [`RegistryError::Session`] — the player belongs to another game
    pub fn add_member(
        &mut self,
        game_id: GameId,
        player: Arc<Player>,
    ) -> Result<bool, RegistryError> {
        if let Some(lobby) = self.games.get_mut(&game_id) {
            let added = lobby.game.add_player(Arc::clone(&player))?;
            lobby.players.entry(player.token()).or_insert(player);
            return Ok(added);
        }

        match &mut self.current {
            Some(game) if game.id() == game_id => Ok(game.add_player(player)?),
            _ => Err(RegistryError::GameNotFound(game_id)),
        }
    }

    /// Looks up any game, lobby or implicit, by id.
    pub fn game(&self, game_id: GameId) -> Option<&Game> {
        if let Some(lobby) = self.games.get(&game_id) {
            return Some(&lobby.game);
        }
        self.current.as_ref().filter(|g| g.id() == game_id)
    }

    /// Mutable lookup of any game by id.
    ///
    /// This is the path the rules engine mutates a game through, so its
    /// changes are serialized with the router's joins.
    pub fn game_mut(&mut self, game_id: GameId) -> Option<&mut Game> {
        if let Some(lobby) = self.games.get_mut(&game_id) {
            return Some(&mut lobby.game);
        }
        self.current.as_mut().filter(|g| g.id() == game_id)
    }

    /// Returns `true` if a lobby game with this id exists.
    pub fn contains_game(&self, game_id: GameId) -> bool {
        self.games.contains_key(&game_id)
    }

    /// The implicit global game, if one has been founded.
    pub fn current_game(&self) -> Option<&Game> {
        self.current.as_ref()
    }

    /// Number of games, lobby and implicit.
    pub fn game_count(&self) -> usize {
        self.games.len() + usize::from(self.current.is_some())
    }

    // -----------------------------------------------------------------
    // Listing
    // -----------------------------------------------------------------

    /// Projects every known game into its listing entry.
    ///
    /// Lobby games come first in creation order, then the implicit game.
    /// The result is a snapshot: call this under the lock, serialize after
    /// releasing it.
    pub fn list_games(&self) -> Vec<GameSummary> {
        let mut lobby: Vec<&LobbyGame> = self.games.values().collect();
        lobby.sort_by_key(|l| l.seq);

        lobby
            .into_iter()
            .map(|l| l.game.summary())
            .chain(self.current.iter().map(Game::summary))
            .collect()
    }

    // -----------------------------------------------------------------
    // Reset
    // -----------------------------------------------------------------

    /// Discards every game and session in `scope`. Returns how many
    /// sessions were dropped.
    ///
    /// Running session loops are not told. Their sessions are simply no
    /// longer reachable through the registry; game lookups from them fail
    /// and their loops end when their connections do.
    pub fn reset(&mut self, scope: Scope) -> usize {
        let dropped = match scope {
            Scope::Global => {
                self.current = None;
                std::mem::take(&mut self.players).len()
            }
            Scope::Game(id) => self.games.remove(&id).map_or(0, |l| l.players.len()),
        };
        tracing::info!(?scope, sessions = dropped, "registry reset");
        dropped
    }

    fn players_mut(
        &mut self,
        scope: Scope,
    ) -> Result<&mut HashMap<PlayerToken, Arc<Player>>, RegistryError> {
        match scope {
            Scope::Global => Ok(&mut self.players),
            Scope::Game(id) => self
                .games
                .get_mut(&id)
                .map(|l| &mut l.players)
                .ok_or(RegistryError::GameNotFound(id)),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
