// Rejection taxonomy for inbound messages.
//
// Every variant is a user-input or state-timing violation: the offending
// message is refused, the sender gets the `Display` text as an `Error`
// notice, and no session state changes. None of these is fatal to the room
// or the process, and disconnects are not errors at all — they are a normal
// transition handled in `game.rs`.

use thiserror::Error;

/// Why an inbound message was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Room name empty after trimming.
    #[error("Room name is required")]
    InvalidRoom,
    /// Display name empty after trimming.
    #[error("Name is required")]
    InvalidName,
    /// The room already has two players.
    #[error("Room is full")]
    RoomFull,
    /// A choice arrived before a second player did.
    #[error("Waiting for second player")]
    AwaitingOpponent,
    /// A choice arrived after the final round resolved.
    #[error("Match is already over")]
    MatchConcluded,
    /// The choice value is not one of the three moves.
    #[error("Unknown choice: {0}")]
    InvalidChoice(String),
}
