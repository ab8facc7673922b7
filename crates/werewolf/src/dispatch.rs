//! Routing decoded client messages into the registry and the rules engine.
//!
//! Every session loop hands its messages to the shared [`ServerState`].
//! Game mutations happen under the registry lock; the resulting messages
//! are addressed while the lock is held (so recipients match the roster
//! the rules engine saw) and sent after it is released.

use std::sync::Arc;

use werewolf_game::{Game, Outbound, Rules};
use werewolf_protocol::{ClientMessage, ServerMessage};
use werewolf_session::{MessageHandler, Player};

use crate::server::ServerState;

/// One message and the players it goes to.
pub(crate) type Delivery = (Vec<Arc<Player>>, ServerMessage);

/// Resolves rules-engine output against a game's roster.
///
/// Call with the registry lock held; send the result with [`deliver`]
/// after releasing it.
pub(crate) fn address(game: &Game, outbound: Outbound) -> Vec<Delivery> {
    outbound
        .into_iter()
        .map(|(recipient, payload)| {
            (game.recipients(recipient), ServerMessage::Event { payload })
        })
        .collect()
}

/// Sends addressed messages. A failed send only affects that recipient.
///
/// Players with no client attached (e.g. a lobby founder who never
/// connected) are skipped.
pub(crate) async fn deliver(deliveries: Vec<Delivery>) {
    for (players, msg) in deliveries {
        for player in players {
            if !player.has_live_adapter() {
                tracing::trace!(player_id = %player.token(), "no client attached, event dropped");
                continue;
            }
            if let Err(e) = player.send(&msg).await {
                tracing::debug!(player_id = %player.token(), error = %e, "event delivery failed");
            }
        }
    }
}

/// Sends an `Error` frame back to one player.
async fn reply_error(player: &Player, code: u16, message: impl Into<String>) {
    let reply = ServerMessage::Error {
        code,
        message: message.into(),
    };
    if let Err(e) = player.send(&reply).await {
        tracing::debug!(player_id = %player.token(), error = %e, "failed to send error reply");
    }
}

impl<R: Rules> MessageHandler for ServerState<R> {
    async fn on_attach(&self, player: &Arc<Player>) {
        let welcome = ServerMessage::Welcome {
            player_id: player.token(),
            game_id: player.game_id(),
            name: player.name(),
        };
        if let Err(e) = player.send(&welcome).await {
            tracing::debug!(player_id = %player.token(), error = %e, "failed to send welcome");
        }
    }

    async fn on_message(&self, player: &Arc<Player>, msg: ClientMessage) {
        match msg {
            ClientMessage::SetName { name } => {
                tracing::debug!(player_id = %player.token(), %name, "player renamed");
                player.set_name(name);
            }
            ClientMessage::Action { payload } => {
                let sender = player.token();
                let Some(game_id) = player.game_id() else {
                    reply_error(player, 409, "not in a game").await;
                    return;
                };

                // Lock for validate + apply + addressing only; drop before I/O.
                let outcome = {
                    let mut registry = self.registry.lock().await;
                    match registry.game_mut(game_id) {
                        None => Err((404, format!("game {game_id} no longer exists"))),
                        Some(game) if !game.is_member(sender) => {
                            Err((403, "not a member of this game".to_string()))
                        }
                        Some(game) => match self.rules.validate_action(game, sender, &payload) {
                            Err(reason) => Err((422, reason)),
                            Ok(()) => {
                                let outbound = self.rules.handle_action(game, sender, payload);
                                Ok(address(game, outbound))
                            }
                        },
                    }
                };

                match outcome {
                    Ok(deliveries) => deliver(deliveries).await,
                    Err((code, message)) => {
                        tracing::debug!(player_id = %sender, %game_id, code, %message, "action refused");
                        reply_error(player, code, message).await;
                    }
                }
            }
        }
    }
}
