// Protocol messages for client-server communication.
//
// Two enums define the full protocol vocabulary:
// - `ClientMessage`: sent by game clients to the server.
// - `ServerMessage`: sent by the server to game clients.
//
// All types derive `Serialize`/`Deserialize` for JSON framing (see
// `framing.rs`).
//
// The `choice` field is an uninterpreted `String` — the protocol crate never
// validates it. An unrecognized value must come back to the sender as an
// `Error` notice rather than killing the connection at deserialization time,
// so the game layer parses it. This also keeps this crate independent of the
// game-rules code.

use serde::{Deserialize, Serialize};

use crate::types::PlayerId;

/// Messages sent by a client to the server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ClientMessage {
    /// Enter a room under a display name, creating the room if needed.
    JoinRoom { room: String, name: String },
    /// Submit this round's choice ("rock", "paper" or "scissors").
    Choice { choice: String },
    /// Ask the opponent for a rematch after the match ends.
    RequestReplay,
    /// Agree to a rematch.
    AcceptReplay,
    /// Decline a rematch.
    RejectReplay,
    /// Player is leaving gracefully.
    Goodbye,
}

/// Messages sent by the server to a client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ServerMessage {
    /// Roster snapshot — names and scores of everyone in the room.
    RoomUpdate { players: Vec<PlayerEntry> },
    /// Outcome of one resolved round, individualized per recipient.
    RoundResult {
        your_choice: String,
        opponent_choice: String,
        opponent_name: String,
        your_score: u32,
        opponent_score: u32,
        result: String,
        round: u32,
        max_rounds: u32,
    },
    /// The match is over — final verdict text.
    GameOver { winner_text: String },
    /// A rematch is starting; clients should clear stale result displays.
    NewGame,
    /// The other player asked for a rematch.
    ReplayRequested { from: String },
    /// A player declined the rematch.
    ReplayRejected { by: String },
    /// A rejected input — human-readable reason, sent to the sender only.
    Error { message: String },
}

/// One roster row: a player's identity, display name, and score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerEntry {
    pub id: PlayerId,
    pub name: String,
    pub score: u32,
}
