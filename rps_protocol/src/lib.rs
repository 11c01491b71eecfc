// rps_protocol — wire protocol for the rock-paper-scissors duel server.
//
// This crate defines the message types, framing, and serialization used by
// the game server (`rps_server`) and its clients to communicate over TCP.
// It is shared between both sides and has no dependency on the game-rules
// code.
//
// Module overview:
// - `types.rs`:    `PlayerId` — the server-assigned connection identity.
// - `message.rs`:  Client-to-server and server-to-client message enums, plus
//                  the `PlayerEntry` roster row.
// - `framing.rs`:  Length-delimited framing over any `Read`/`Write` stream:
//                  4-byte big-endian length prefix, then JSON payload.
//
// Design decisions:
// - **JSON serialization.** Human-inspectable on the wire and cheap for
//   messages this small. Binary framing can be swapped in later if it ever
//   matters.
// - **Choices as uninterpreted strings.** The server validates them against
//   the game rules and answers bad values with an `Error` notice instead of
//   dropping the connection. The protocol crate stays rules-agnostic.
// - **No async runtime.** Uses `std::io::Read`/`Write` for framing,
//   compatible with both blocking TCP streams and buffered wrappers.

pub mod framing;
pub mod message;
pub mod types;

pub use framing::{MAX_MESSAGE_SIZE, read_message, write_message};
pub use message::{ClientMessage, PlayerEntry, ServerMessage};
pub use types::PlayerId;
