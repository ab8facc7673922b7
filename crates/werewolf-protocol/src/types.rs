//! Core protocol types: identities, the game listing, and session messages.
//!
//! Everything in this module either travels on the wire (session messages,
//! the `/games` listing) or is echoed back by clients (identity tokens).

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The durable identity of one player session.
///
/// Handed to the client on first connection (in the `Welcome` message) and
/// echoed back as the `id` query parameter when the client reconnects.
/// 128 bits of randomness laid out as a version-4 UUID, so it prints and
/// parses the same way clients already expect.
///
/// `#[serde(transparent)]` serializes this as the bare UUID string rather
/// than `{ "0": "..." }`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerToken(Uuid);

impl PlayerToken {
    /// Issues a fresh token from the thread-local RNG.
    ///
    /// Tokens are only ever created here, on the server. A client can echo
    /// a token back, but can never choose one.
    pub fn generate() -> Self {
        Self(random_uuid())
    }

    /// Parses a client-supplied value, treating anything malformed as absent.
    ///
    /// Reconnection is best-effort: a garbled `id` parameter means "I'm
    /// new here", never a client error.
    pub fn parse_lenient(raw: Option<&str>) -> Option<Self> {
        raw.and_then(|s| s.trim().parse().ok())
    }
}

impl fmt::Display for PlayerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for PlayerToken {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| ProtocolError::InvalidId(e.to_string()))
    }
}

/// The identity of one game instance.
///
/// Same representation as [`PlayerToken`] but a distinct type: a game id
/// can never be looked up as a player, or the other way round.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct GameId(Uuid);

impl GameId {
    /// Allocates a fresh game identity.
    pub fn generate() -> Self {
        Self(random_uuid())
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for GameId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| ProtocolError::InvalidId(e.to_string()))
    }
}

/// 16 random bytes stamped with the v4 version and variant bits.
fn random_uuid() -> Uuid {
    let bytes: [u8; 16] = rand::rng().random();
    uuid::Builder::from_random_bytes(bytes).into_uuid()
}

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Who should receive a message produced by the rules engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every member of the game's roster.
    All,

    /// One specific player.
    Player(PlayerToken),

    /// Everyone in the roster except one player.
    AllExcept(PlayerToken),
}

impl Recipient {
    /// Returns `true` if `player` is addressed by this recipient.
    pub fn includes(&self, player: PlayerToken) -> bool {
        match self {
            Self::All => true,
            Self::Player(p) => *p == player,
            Self::AllExcept(p) => *p != player,
        }
    }
}

// ---------------------------------------------------------------------------
// GameSummary: the `/games` listing entry
// ---------------------------------------------------------------------------

/// A read-only projection of one game, as listed by `GET /games`.
///
/// Field names on the wire are camelCase. `roleset` and `playersNeeded`
/// are only present once the rules engine has selected a roleset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    /// The game's identity.
    pub id: GameId,

    /// Display name of the player who created the game.
    pub leader: String,

    /// Size of the roster.
    pub player_count: usize,

    /// Size of the alive subset.
    pub alive_players: usize,

    /// Current phase ordinal, as set by the rules engine.
    pub game_phase: u32,

    /// Name of the selected roleset, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roleset: Option<String>,

    /// Number of role slots in the selected roleset, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub players_needed: Option<usize>,
}

// ---------------------------------------------------------------------------
// Session messages
// ---------------------------------------------------------------------------

/// Messages a client sends over its WebSocket.
///
/// Internally tagged: `{ "type": "SetName", "name": "Ada" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Change this player's display name.
    SetName { name: String },

    /// A gameplay action, passed through untouched to the rules engine.
    Action { payload: serde_json::Value },
}

/// Messages the server sends over a player's WebSocket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Sent every time a connection is attached to a session.
    ///
    /// `player_id` is the token the client must echo back to reconnect.
    #[serde(rename_all = "camelCase")]
    Welcome {
        player_id: PlayerToken,
        game_id: Option<GameId>,
        name: String,
    },

    /// Output of the rules engine.
    Event { payload: serde_json::Value },

    /// Something went wrong handling the client's last message.
    Error { code: u16, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_tokens_are_distinct_v4() {
        let a = PlayerToken::generate();
        let b = PlayerToken::generate();
        assert_ne!(a, b);
        assert_eq!(a.0.get_version_num(), 4);
    }

    #[test]
    fn test_token_display_parses_back() {
        let token = PlayerToken::generate();
        let parsed: PlayerToken = token.to_string().parse().unwrap();
        assert_eq!(parsed, token);
    }

    #[test]
    fn test_parse_lenient_malformed_is_absent() {
        assert_eq!(PlayerToken::parse_lenient(None), None);
        assert_eq!(PlayerToken::parse_lenient(Some("")), None);
        assert_eq!(PlayerToken::parse_lenient(Some("not-a-uuid")), None);
    }

    #[test]
    fn test_parse_lenient_valid_is_present() {
        let token = PlayerToken::generate();
        let raw = token.to_string();
        assert_eq!(PlayerToken::parse_lenient(Some(&raw)), Some(token));
    }

    #[test]
    fn test_game_id_rejects_garbage() {
        let result = "nope".parse::<GameId>();
        assert!(matches!(result, Err(ProtocolError::InvalidId(_))));
    }

    #[test]
    fn test_recipient_includes() {
        let me = PlayerToken::generate();
        let you = PlayerToken::generate();
        assert!(Recipient::All.includes(me));
        assert!(Recipient::Player(me).includes(me));
        assert!(!Recipient::Player(me).includes(you));
        assert!(!Recipient::AllExcept(me).includes(me));
        assert!(Recipient::AllExcept(me).includes(you));
    }

    #[test]
    fn test_game_summary_wire_names() {
        let id = GameId::generate();
        let summary = GameSummary {
            id,
            leader: "Ada".into(),
            player_count: 3,
            alive_players: 2,
            game_phase: 1,
            roleset: Some("Basic".into()),
            players_needed: Some(5),
        };

        let json = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["id"], id.to_string());
        assert_eq!(json["leader"], "Ada");
        assert_eq!(json["playerCount"], 3);
        assert_eq!(json["alivePlayers"], 2);
        assert_eq!(json["gamePhase"], 1);
        assert_eq!(json["roleset"], "Basic");
        assert_eq!(json["playersNeeded"], 5);
    }

    #[test]
    fn test_game_summary_without_roleset_omits_fields() {
        let summary = GameSummary {
            id: GameId::generate(),
            leader: String::new(),
            player_count: 1,
            alive_players: 1,
            game_phase: 0,
            roleset: None,
            players_needed: None,
        };

        let json = serde_json::to_value(&summary).unwrap();

        assert!(json.get("roleset").is_none());
        assert!(json.get("playersNeeded").is_none());
    }

    #[test]
    fn test_client_message_tagged_format() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"SetName","name":"Ada"}"#).unwrap();
        assert_eq!(msg, ClientMessage::SetName { name: "Ada".into() });

        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"Action","payload":{"vote":"x"}}"#,
        )
        .unwrap();
        assert!(matches!(msg, ClientMessage::Action { .. }));
    }

    #[test]
    fn test_welcome_uses_camel_case_fields() {
        let player_id = PlayerToken::generate();
        let msg = ServerMessage::Welcome {
            player_id,
            game_id: None,
            name: String::new(),
        };

        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "Welcome");
        assert_eq!(json["playerId"], player_id.to_string());
        assert!(json["gameId"].is_null());
    }
}
