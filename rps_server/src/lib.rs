// rps_server — two-player rock-paper-scissors match server.
//
// The server pairs two clients into a named room and runs a fixed-length
// best-of-N match: both players submit a choice each round, the server
// resolves it, keeps score, declares a winner after the final round, and
// mediates a mutual-consent rematch. Rooms are created on first join and
// destroyed the instant they empty; everything lives in process memory.
//
// Module overview:
// - `rules.rs`:    `Choice`/`Outcome` and the pure round resolver.
// - `error.rs`:    `GameError` — the rejection taxonomy sent back to clients.
// - `room.rs`:     Per-room state — roster, per-round choices, round counter,
//                  scores, replay votes. Pure data, no I/O.
// - `registry.rs`: The name → room table with create-on-join /
//                  destroy-on-empty lifecycle.
// - `game.rs`:     `GameServer`, the match controller: routes each inbound
//                  message to room/registry operations and emits the
//                  outbound traffic. The core protocol state machine.
// - `server.rs`:   TCP listener, reader threads (one per client), and the
//                  main event loop. Uses `std::net` with a thread-per-reader
//                  architecture and an `mpsc` channel to funnel events into
//                  the single-threaded `GameServer`.
// - `client.rs`:   Blocking `NetClient` used by integration tests and
//                  embedders.
//
// Dependencies: `rps_protocol` (shared message types and framing).
//
// The server can run as a standalone binary (`main.rs`) or be embedded in
// another process via the library API (`start_server`).

pub mod client;
pub mod error;
pub mod game;
pub mod registry;
pub mod room;
pub mod rules;
pub mod server;

pub use client::NetClient;
pub use error::GameError;
pub use server::{ServerConfig, ServerHandle, start_server};
