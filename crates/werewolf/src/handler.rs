//! HTTP routes and the connection router.
//!
//! | Route              | What it does                                       |
//! |--------------------|----------------------------------------------------|
//! | `GET /`            | WebSocket, global scope, optional `?id=<token>`    |
//! | `GET /new`         | reset the global scope, redirect (optional `?key=`) |
//! | `GET /games`       | JSON listing of every game                         |
//! | `POST /games`      | create a lobby game with a placeholder founder     |
//! | `GET /games/{id}`  | WebSocket scoped to one game, optional `?id=`      |
//!
//! A WebSocket request is checked (game exists, handshake valid) before
//! anything in the registry changes. Resolution happens only once the
//! upgrade has succeeded:
//!   1. Lock the registry once: resolve the token, join the game if the
//!      session is new, run the rules engine's join hook
//!   2. Release the lock
//!   3. Close the replaced adapter (if any) and start the session loop
//!   4. Send the join hook's messages

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use serde::Serialize;
use werewolf_game::{Registry, Resolution, Rules, Scope};
use werewolf_protocol::{Codec, GameId, GameSummary, JsonCodec, PlayerToken, ServerMessage};
use werewolf_session::Player;
use werewolf_transport::{Adapter, Connection, WebSocketConnection};

use crate::WerewolfError;
use crate::dispatch::{self, Delivery};
use crate::server::ServerState;

type SharedState<R> = Arc<ServerState<R>>;

/// Builds the application router over shared state.
pub(crate) fn routes<R: Rules>(state: SharedState<R>) -> Router {
    Router::new()
        .route("/", get(connect_global::<R>))
        .route("/new", get(reset::<R>))
        .route("/games", get(list_games::<R>).post(create_game::<R>))
        .route("/games/{id}", get(connect_scoped::<R>))
        .with_state(state)
}

/// Query-string pairs in request order.
///
/// Kept as raw pairs so a repeated key (`?id=a&id=b`) never fails
/// extraction; the first value wins.
type QueryPairs = Query<Vec<(String, String)>>;

/// The first value given for `key`, if any.
fn first_param<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Body of a successful `POST /games`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreatedGame {
    game_id: GameId,
    player_id: PlayerToken,
}

// ---------------------------------------------------------------------------
// WebSocket routes
// ---------------------------------------------------------------------------

async fn connect_global<R: Rules>(
    State(state): State<SharedState<R>>,
    Query(params): QueryPairs,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "rejected non-websocket request on /");
            return rejection.into_response();
        }
    };

    let token = PlayerToken::parse_lenient(first_param(&params, "id"));
    upgrade(ws, state, Scope::Global, token)
}

async fn connect_scoped<R: Rules>(
    State(state): State<SharedState<R>>,
    Path(raw_id): Path<String>,
    Query(params): QueryPairs,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let game_id: GameId = match raw_id.parse() {
        Ok(id) => id,
        Err(e) => return WerewolfError::from(e).into_response(),
    };

    // Unknown game → 404 before the upgrade, whatever the token.
    if !state.registry.lock().await.contains_game(game_id) {
        tracing::warn!(%game_id, "connection to unknown game");
        return (StatusCode::NOT_FOUND, format!("game {game_id} not found")).into_response();
    }

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            tracing::debug!(%game_id, error = %rejection, "rejected non-websocket request");
            return rejection.into_response();
        }
    };

    let token = PlayerToken::parse_lenient(first_param(&params, "id"));
    upgrade(ws, state, Scope::Game(game_id), token)
}

fn upgrade<R: Rules>(
    ws: WebSocketUpgrade,
    state: SharedState<R>,
    scope: Scope,
    token: Option<PlayerToken>,
) -> Response {
    ws.on_failed_upgrade(move |e| {
        tracing::debug!(?scope, error = %e, "websocket upgrade failed");
    })
    .on_upgrade(move |socket| attach(state, scope, token, socket))
}

/// A session bound to a new socket, ready for its loop to start.
struct Bound {
    player: Arc<Player>,
    /// The adapter a reconnect displaced.
    replaced: Option<Arc<Adapter>>,
    /// Messages from the rules engine's join hook.
    notices: Vec<Delivery>,
}

/// Binds a freshly upgraded socket to a session and starts its loop.
async fn attach<R: Rules>(
    state: SharedState<R>,
    scope: Scope,
    token: Option<PlayerToken>,
    socket: WebSocket,
) {
    let adapter = Adapter::from(WebSocketConnection::new(socket));
    let conn_id = adapter.id();
    tracing::debug!(%conn_id, ?scope, "websocket attached");

    let bound = {
        let mut registry = state.registry.lock().await;
        bind(&mut registry, &state.rules, scope, token, adapter)
    };

    let Bound {
        player,
        replaced,
        notices,
    } = match bound {
        Ok(Some(bound)) => bound,
        Ok(None) => return,
        Err(adapter) => {
            // The game was reset between the 404 check and the upgrade.
            tracing::warn!(%conn_id, ?scope, "game disappeared before attach");
            refuse(adapter, "game not found").await;
            return;
        }
    };

    if let Some(replaced) = replaced {
        tracing::info!(
            player_id = %player.token(),
            %conn_id,
            took_over_live = player.state().is_connected(),
            "session resumed on new connection"
        );
        tokio::spawn(async move {
            if let Err(e) = replaced.close().await {
                tracing::debug!(conn_id = %replaced.id(), error = %e, "closing replaced adapter failed");
            }
        });
    }

    player.spawn(Arc::clone(&state));
    dispatch::deliver(notices).await;
}

/// The registry half of [`attach`], run under the lock.
///
/// Hands the adapter back if the scoped game no longer exists.
fn bind<R: Rules>(
    registry: &mut Registry,
    rules: &R,
    scope: Scope,
    token: Option<PlayerToken>,
    adapter: Adapter,
) -> Result<Option<Bound>, Adapter> {
    if let Scope::Game(game_id) = scope {
        if !registry.contains_game(game_id) {
            return Err(adapter);
        }
    }

    match registry.resolve_or_create(scope, token, adapter) {
        Ok(Resolution::Reconnected { player, replaced }) => Ok(Some(Bound {
            player,
            replaced: Some(replaced),
            notices: Vec::new(),
        })),
        Ok(Resolution::Created { player }) => {
            let notices = join(registry, rules, scope, &player);
            Ok(Some(Bound {
                player,
                replaced: None,
                notices,
            }))
        }
        Err(e) => {
            tracing::warn!(?scope, error = %e, "could not resolve session");
            Ok(None)
        }
    }
}

/// Puts a brand-new session into its scope's game and runs the join hook.
fn join<R: Rules>(
    registry: &mut Registry,
    rules: &R,
    scope: Scope,
    player: &Arc<Player>,
) -> Vec<Delivery> {
    let joined = match scope {
        Scope::Global => registry.join_global(player),
        Scope::Game(game_id) => registry
            .add_member(game_id, Arc::clone(player))
            .map(|_| game_id),
    };

    match joined {
        Ok(game_id) => registry
            .game_mut(game_id)
            .map(|game| {
                let outbound = rules.on_player_joined(game, player.token());
                dispatch::address(game, outbound)
            })
            .unwrap_or_default(),
        Err(e) => {
            tracing::warn!(player_id = %player.token(), error = %e, "new player could not join");
            Vec::new()
        }
    }
}

/// Tells a client why it can't be attached, then hangs up.
async fn refuse(adapter: Adapter, message: &str) {
    let reply = ServerMessage::Error {
        code: 404,
        message: message.to_string(),
    };
    match JsonCodec.encode(&reply) {
        Ok(bytes) => {
            if let Err(e) = adapter.send(&bytes).await {
                tracing::debug!(conn_id = %adapter.id(), error = %e, "failed to send refusal");
            }
        }
        Err(e) => tracing::debug!(error = %e, "failed to encode refusal"),
    }
    if let Err(e) = adapter.close().await {
        tracing::debug!(conn_id = %adapter.id(), error = %e, "failed to close refused connection");
    }
}

// ---------------------------------------------------------------------------
// Plain HTTP routes
// ---------------------------------------------------------------------------

async fn list_games<R: Rules>(State(state): State<SharedState<R>>) -> Json<Vec<GameSummary>> {
    // Snapshot under the lock; serialization happens after it's released.
    let games = state.registry.lock().await.list_games();
    Json(games)
}

async fn create_game<R: Rules>(
    State(state): State<SharedState<R>>,
) -> Result<impl IntoResponse, WerewolfError> {
    let founder = Player::new(Adapter::placeholder());
    let player_id = founder.token();
    let game_id = state.registry.lock().await.create_game(founder)?;

    let location = format!("/games/{game_id}?id={player_id}");
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(CreatedGame { game_id, player_id }),
    ))
}

async fn reset<R: Rules>(
    State(state): State<SharedState<R>>,
    Query(params): QueryPairs,
) -> Response {
    if let Some(expected) = &state.config.reset_key {
        if first_param(&params, "key") != Some(expected.as_str()) {
            tracing::warn!("reset refused: bad or missing key");
            return (StatusCode::FORBIDDEN, "reset key required").into_response();
        }
    }

    let dropped = state.registry.lock().await.reset(Scope::Global);
    tracing::info!(sessions = dropped, "global game reset");
    Redirect::to(&state.config.reset_redirect).into_response()
}
