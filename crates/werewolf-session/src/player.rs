//! The player session: durable identity plus a swappable connection.
//!
//! A [`Player`] outlives any single connection. When a client reconnects
//! with its token, the registry calls [`Player::rebind`] to swap in the new
//! adapter; the session itself (name, game membership, token) stays put.
//!
//! # Adapter swaps
//!
//! The current adapter lives in a `tokio::sync::watch` channel together
//! with a generation number. A swap replaces both in one step, so any
//! reader sees either the old pair or the new pair, never a mix.
//!
//! Each call to [`Player::spawn`] starts a loop tagged with the generation
//! current at that moment. Loops take turns through a per-player mutex:
//!
//! - a loop whose generation is no longer current exits without reading;
//! - a serving loop stops reading as soon as a newer generation is
//!   published, or when its adapter closes or fails.
//!
//! So at most one loop reads from a player's connection at a time, and
//! none reads from an adapter after it has been swapped out.

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use werewolf_protocol::{
    ClientMessage, Codec, GameId, JsonCodec, PlayerToken, ServerMessage,
};
use werewolf_transport::{Adapter, Connection};

use crate::{MessageHandler, SessionError, SessionState};

/// The adapter a session is attached to, and how many swaps preceded it.
#[derive(Clone)]
struct Attachment {
    generation: u64,
    adapter: Arc<Adapter>,
}

/// One participant, connected or waiting to reconnect.
pub struct Player {
    token: PlayerToken,
    name: RwLock<String>,
    game: OnceLock<GameId>,
    state: Mutex<SessionState>,
    attachment: watch::Sender<Attachment>,
    /// Held by whichever loop is currently serving this player.
    serving: tokio::sync::Mutex<()>,
}

impl Player {
    /// Creates a session with a freshly issued token, attached to `adapter`.
    ///
    /// The session starts detached; it becomes connected when a loop
    /// starts serving a live adapter.
    pub fn new(adapter: Adapter) -> Arc<Self> {
        let token = PlayerToken::generate();
        tracing::debug!(player_id = %token, conn = %adapter.id(), "player session allocated");
        Arc::new(Self {
            token,
            name: RwLock::new(String::new()),
            game: OnceLock::new(),
            state: Mutex::new(SessionState::Detached {
                since: Instant::now(),
            }),
            attachment: watch::Sender::new(Attachment {
                generation: 0,
                adapter: Arc::new(adapter),
            }),
            serving: tokio::sync::Mutex::new(()),
        })
    }

    /// The identity token the client echoes back to reconnect.
    pub fn token(&self) -> PlayerToken {
        self.token
    }

    /// The current display name (empty until the client sets one).
    pub fn name(&self) -> String {
        self.name.read().clone()
    }

    /// Changes the display name.
    pub fn set_name(&self, name: impl Into<String>) {
        *self.name.write() = name.into();
    }

    /// The game this player belongs to, if it has joined one.
    pub fn game_id(&self) -> Option<GameId> {
        self.game.get().copied()
    }

    /// Records the game this player belongs to.
    ///
    /// Binding to the same game again is a no-op.
    ///
    /// # Errors
    /// Returns [`SessionError::AlreadyInGame`] if the player already
    /// belongs to a different game.
    pub fn bind_game(&self, game_id: GameId) -> Result<(), SessionError> {
        let current = *self.game.get_or_init(|| game_id);
        if current == game_id {
            Ok(())
        } else {
            Err(SessionError::AlreadyInGame {
                player: self.token,
                current,
            })
        }
    }

    /// Current liveness.
    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    /// How many times the adapter has been swapped.
    pub fn generation(&self) -> u64 {
        self.attachment.borrow().generation
    }

    /// Returns `true` if the current adapter is backed by a real client.
    pub fn has_live_adapter(&self) -> bool {
        self.attachment.borrow().adapter.is_live()
    }

    /// Swaps in a new adapter and returns the one it replaced.
    ///
    /// This only swaps references; it never touches the network, so it is
    /// safe to call while holding the registry lock. The caller is
    /// responsible for closing the returned adapter once the lock is
    /// released. Any loop serving the old adapter stops reading as soon as
    /// this returns.
    pub fn rebind(&self, adapter: Adapter) -> Arc<Adapter> {
        let incoming = Arc::new(adapter);
        let mut replaced = Arc::clone(&incoming);
        self.attachment.send_modify(|attachment| {
            attachment.generation += 1;
            replaced = std::mem::replace(&mut attachment.adapter, incoming);
        });
        tracing::debug!(
            player_id = %self.token,
            generation = self.generation(),
            replaced = %replaced.id(),
            "adapter rebound"
        );
        replaced
    }

    /// Encodes and sends a message through whatever adapter is current.
    ///
    /// Sending to a player on a placeholder adapter succeeds and the
    /// message is dropped.
    pub async fn send(&self, msg: &ServerMessage) -> Result<(), SessionError> {
        let bytes = JsonCodec.encode(msg)?;
        let adapter = Arc::clone(&self.attachment.borrow().adapter);
        adapter.send(&bytes).await?;
        Ok(())
    }

    /// Starts this player's message loop as an independent task.
    ///
    /// The loop serves the adapter attached right now. Nobody needs to
    /// await the handle: the task ends on its own when the connection
    /// goes away or a newer connection takes over.
    pub fn spawn<H: MessageHandler>(self: &Arc<Self>, handler: Arc<H>) -> JoinHandle<()> {
        let generation = self.generation();
        let player = Arc::clone(self);
        tokio::spawn(async move { player.play(generation, handler).await })
    }

    async fn play<H: MessageHandler>(self: Arc<Self>, generation: u64, handler: Arc<H>) {
        let _serving = self.serving.lock().await;

        let mut attachments = self.attachment.subscribe();
        let current = attachments.borrow_and_update().clone();
        if current.generation != generation {
            tracing::debug!(
                player_id = %self.token,
                generation,
                current = current.generation,
                "newer connection attached, loop not started"
            );
            return;
        }

        if current.adapter.is_live() {
            *self.state.lock() = SessionState::Connected;
        }
        tracing::debug!(player_id = %self.token, generation, "session loop started");
        handler.on_attach(&self).await;

        let reason = loop {
            tokio::select! {
                biased;

                _ = attachments.changed() => break "adapter replaced",

                received = current.adapter.recv() => match received {
                    Ok(Some(data)) => self.dispatch(&data, handler.as_ref()).await,
                    Ok(None) => break "connection closed",
                    Err(e) => {
                        tracing::debug!(player_id = %self.token, error = %e, "recv error");
                        break "receive failed";
                    }
                },
            }
        };

        // A swap already hands the session to the next loop; only a dead
        // connection leaves it detached.
        if self.generation() == generation {
            *self.state.lock() = SessionState::Detached {
                since: Instant::now(),
            };
        }
        tracing::info!(player_id = %self.token, generation, reason, "session loop ended");
    }

    async fn dispatch<H: MessageHandler>(self: &Arc<Self>, data: &[u8], handler: &H) {
        match JsonCodec.decode::<ClientMessage>(data) {
            Ok(msg) => handler.on_message(self, msg).await,
            Err(e) => {
                tracing::debug!(player_id = %self.token, error = %e, "failed to decode client message");
                let reply = ServerMessage::Error {
                    code: 400,
                    message: format!("invalid message: {e}"),
                };
                if let Err(e) = self.send(&reply).await {
                    tracing::debug!(player_id = %self.token, error = %e, "failed to report decode error");
                }
            }
        }
    }
}

impl fmt::Debug for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Player")
            .field("token", &self.token)
            .field("name", &*self.name.read())
            .field("game", &self.game.get())
            .field("generation", &self.generation())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for `Player`, using placeholder adapters so no sockets
    //! are needed. Loops on live sockets are covered by the server's
    //! integration tests.

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    #[derive(Default)]
    struct CountingHandler {
        attaches: AtomicUsize,
        messages: Mutex<Vec<ClientMessage>>,
    }

    impl MessageHandler for CountingHandler {
        async fn on_attach(&self, _player: &Arc<Player>) {
            self.attaches.fetch_add(1, Ordering::SeqCst);
        }

        async fn on_message(&self, _player: &Arc<Player>, msg: ClientMessage) {
            self.messages.lock().push(msg);
        }
    }

    // =====================================================================
    // new() / accessors
    // =====================================================================

    #[test]
    fn test_new_starts_detached_at_generation_zero() {
        let player = Player::new(Adapter::placeholder());

        assert!(!player.state().is_connected());
        assert_eq!(player.generation(), 0);
        assert_eq!(player.name(), "");
        assert_eq!(player.game_id(), None);
        assert!(!player.has_live_adapter());
    }

    #[test]
    fn test_new_players_get_distinct_tokens() {
        let a = Player::new(Adapter::placeholder());
        let b = Player::new(Adapter::placeholder());
        assert_ne!(a.token(), b.token());
    }

    #[test]
    fn test_set_name_updates_name() {
        let player = Player::new(Adapter::placeholder());
        player.set_name("Ada");
        assert_eq!(player.name(), "Ada");
    }

    // =====================================================================
    // bind_game()
    // =====================================================================

    #[test]
    fn test_bind_game_is_set_once() {
        let player = Player::new(Adapter::placeholder());
        let first = GameId::generate();
        let second = GameId::generate();

        player.bind_game(first).expect("first bind succeeds");
        player.bind_game(first).expect("same game is a no-op");
        let result = player.bind_game(second);

        assert!(
            matches!(result, Err(SessionError::AlreadyInGame { current, .. }) if current == first),
            "should refuse to move to another game"
        );
        assert_eq!(player.game_id(), Some(first));
    }

    // =====================================================================
    // rebind()
    // =====================================================================

    #[test]
    fn test_rebind_bumps_generation_and_returns_old_adapter() {
        let player = Player::new(Adapter::placeholder());
        let original_id = player.attachment.borrow().adapter.id();

        let replaced = player.rebind(Adapter::placeholder());

        assert_eq!(replaced.id(), original_id);
        assert_eq!(player.generation(), 1);
        assert_ne!(player.attachment.borrow().adapter.id(), original_id);
    }

    #[test]
    fn test_rebind_keeps_identity() {
        let player = Player::new(Adapter::placeholder());
        player.set_name("Ada");
        let token = player.token();

        player.rebind(Adapter::placeholder());
        player.rebind(Adapter::placeholder());

        assert_eq!(player.token(), token);
        assert_eq!(player.name(), "Ada");
        assert_eq!(player.generation(), 2);
    }

    // =====================================================================
    // send()
    // =====================================================================

    #[tokio::test]
    async fn test_send_on_placeholder_succeeds() {
        let player = Player::new(Adapter::placeholder());
        player
            .send(&ServerMessage::Error {
                code: 500,
                message: "nobody listening".into(),
            })
            .await
            .expect("placeholder swallows writes");
    }

    // =====================================================================
    // spawn() / loop handoff
    // =====================================================================

    #[tokio::test]
    async fn test_spawn_calls_on_attach_once() {
        let player = Player::new(Adapter::placeholder());
        let handler = Arc::new(CountingHandler::default());

        let _loop = player.spawn(Arc::clone(&handler));
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(handler.attaches.load(Ordering::SeqCst), 1);
        assert!(handler.messages.lock().is_empty());
    }

    #[tokio::test]
    async fn test_loop_exits_when_adapter_is_swapped() {
        let player = Player::new(Adapter::placeholder());
        let handler = Arc::new(CountingHandler::default());
        let handle = player.spawn(Arc::clone(&handler));
        tokio::time::sleep(Duration::from_millis(20)).await;

        player.rebind(Adapter::placeholder());

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("loop should stop after the swap")
            .expect("loop task should not panic");
    }

    #[tokio::test]
    async fn test_stale_loop_does_not_start() {
        let player = Player::new(Adapter::placeholder());
        let handler = Arc::new(CountingHandler::default());
        player.rebind(Adapter::placeholder());

        // Generation 0 has been superseded by the rebind above.
        tokio::time::timeout(
            Duration::from_secs(1),
            Arc::clone(&player).play(0, Arc::clone(&handler)),
        )
        .await
        .expect("stale loop returns immediately");

        assert_eq!(handler.attaches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_handoff_starts_next_loop_on_new_adapter() {
        let player = Player::new(Adapter::placeholder());
        let handler = Arc::new(CountingHandler::default());
        let first = player.spawn(Arc::clone(&handler));
        tokio::time::sleep(Duration::from_millis(20)).await;

        player.rebind(Adapter::placeholder());
        let _second = player.spawn(Arc::clone(&handler));

        tokio::time::timeout(Duration::from_secs(1), first)
            .await
            .unwrap()
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(handler.attaches.load(Ordering::SeqCst), 2);
    }
}
