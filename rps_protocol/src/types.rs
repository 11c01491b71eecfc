// Core ID type for the duel protocol.
//
// The server assigns each TCP connection a compact `PlayerId` at accept time.
// It is stable for the lifetime of the connection and is the key used by the
// server's roster, membership index, and per-round choice map.

use serde::{Deserialize, Serialize};

/// Server-assigned player ID (compact u32, stable per connection).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u32);
