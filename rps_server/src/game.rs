// Match controller: the protocol state machine for every room.
//
// `GameServer` is the central structure that `server.rs` drives. It owns
// three tables:
// - `connections`: player ID → buffered write half of the TCP stream;
// - `memberships`: player ID → room name, the explicit index consulted on
//   every inbound message (a connection without an entry has not joined yet);
// - `registry`: room name → `Room` (pure game state, see `room.rs`).
//
// All methods run on the event loop's single thread, so each inbound message
// is one exclusive state transition: two choices racing in from both players
// of a room are processed strictly one after the other and a round can never
// resolve twice. Rooms never block each other — there is nothing to block on.
//
// Writing to client streams: write errors on a single client are swallowed —
// the reader thread for that client will detect the broken pipe and deliver
// a `Disconnected` event, which cleans everything up through `disconnect()`.
//
// Rejections (`GameError`) go to the offending sender as an `Error` notice
// and leave all state untouched. They are expected protocol outcomes, logged
// at debug level only.

use std::collections::BTreeMap;
use std::io::BufWriter;
use std::net::TcpStream;

use log::{debug, info};
use rps_protocol::framing::write_message;
use rps_protocol::message::{PlayerEntry, ServerMessage};
use rps_protocol::types::PlayerId;

use crate::error::GameError;
use crate::registry::Registry;
use crate::room::MAX_PLAYERS;
use crate::rules::{Choice, Outcome, resolve};

/// Match controller for all rooms on one server.
pub struct GameServer {
    registry: Registry,
    connections: BTreeMap<PlayerId, BufWriter<TcpStream>>,
    memberships: BTreeMap<PlayerId, String>,
    next_player_id: u32,
}

impl GameServer {
    pub fn new(max_rounds: u32) -> Self {
        Self {
            registry: Registry::new(max_rounds),
            connections: BTreeMap::new(),
            memberships: BTreeMap::new(),
            next_player_id: 0,
        }
    }

    /// Register a freshly accepted connection and assign its player ID.
    /// The returned ID tags the reader thread for this connection so that
    /// subsequent events carry the correct identity.
    pub fn register_connection(&mut self, stream: TcpStream) -> PlayerId {
        let id = PlayerId(self.next_player_id);
        self.next_player_id += 1;
        self.connections.insert(id, BufWriter::new(stream));
        info!("player {} connected", id.0);
        id
    }

    /// Join a room, creating it on first use. Trims and validates both
    /// fields; a connection already in a room leaves it first.
    pub fn join(&mut self, id: PlayerId, room_name: &str, player_name: &str) {
        let key = room_name.trim().to_string();
        let name = player_name.trim().to_string();
        if key.is_empty() {
            self.send_error(id, &GameError::InvalidRoom);
            return;
        }
        if name.is_empty() {
            self.send_error(id, &GameError::InvalidName);
            return;
        }

        // Re-joining moves the player: the old room sees the same cleanup
        // as a disconnect.
        if self.memberships.contains_key(&id) {
            self.leave_room(id);
        }

        let created = self.registry.get_mut(&key).is_none();
        let room = self.registry.get_or_create(&key);
        match room.add_player(id, name.clone()) {
            Ok(()) => {
                self.memberships.insert(id, key.clone());
                if created {
                    info!("room {key:?} created");
                }
                info!("player {} ({name}) joined room {key:?}", id.0);
                self.broadcast_roster(&key);
            }
            // Only an existing full room can refuse; a room created by this
            // very join is empty and always accepts.
            Err(e) => self.send_error(id, &e),
        }
    }

    /// Submit a choice for the current round. Silently ignored when the
    /// connection has no room; resubmission overwrites (last write wins).
    /// When both players have submitted, the round resolves.
    pub fn choice(&mut self, id: PlayerId, raw: &str) {
        let Some(key) = self.memberships.get(&id).cloned() else {
            return;
        };
        let choice = match raw.parse::<Choice>() {
            Ok(c) => c,
            Err(e) => {
                self.send_error(id, &e);
                return;
            }
        };
        let Some(room) = self.registry.get_mut(&key) else {
            return;
        };
        if room.concluded() {
            self.send_error(id, &GameError::MatchConcluded);
            return;
        }
        if room.player_count() < MAX_PLAYERS {
            self.send_error(id, &GameError::AwaitingOpponent);
            return;
        }

        room.record_choice(id, choice);
        if room.all_choices_in() {
            self.resolve_round(&key);
        }
    }

    /// Both choices are in: score the round, notify both players, and close
    /// out the match when the final round just resolved.
    fn resolve_round(&mut self, key: &str) {
        let Some(room) = self.registry.get_mut(key) else {
            return;
        };
        let choices = room.take_choices();
        let &[(id_a, choice_a), (id_b, choice_b)] = &choices[..] else {
            return;
        };

        let winner = match resolve(choice_a, choice_b) {
            Outcome::FirstWins => Some(id_a),
            Outcome::SecondWins => Some(id_b),
            Outcome::Draw => None,
        };
        if let Some(w) = winner {
            room.bump_score(w);
        }

        room.advance_round();
        // advance_round already happened, so the completed round is one back.
        let completed = room.round() - 1;
        let max_rounds = room.max_rounds();
        let roster = room.roster();
        let verdict = room.concluded().then(|| match_verdict(&roster));

        self.broadcast_room(key, &ServerMessage::RoomUpdate {
            players: roster.clone(),
        });

        for (you, your_choice, opp, opp_choice) in [
            (id_a, choice_a, id_b, choice_b),
            (id_b, choice_b, id_a, choice_a),
        ] {
            let result = match winner {
                None => "Draw!",
                Some(w) if w == you => "You win!",
                Some(_) => "You lose!",
            };
            let entry_of = |id: PlayerId| roster.iter().find(|e| e.id == id);
            let Some(your_entry) = entry_of(you) else {
                continue;
            };
            let Some(opp_entry) = entry_of(opp) else {
                continue;
            };
            self.send_to(you, &ServerMessage::RoundResult {
                your_choice: your_choice.as_str().into(),
                opponent_choice: opp_choice.as_str().into(),
                opponent_name: opp_entry.name.clone(),
                your_score: your_entry.score,
                opponent_score: opp_entry.score,
                result: result.into(),
                round: completed,
                max_rounds,
            });
        }

        if let Some(winner_text) = verdict {
            info!("room {key:?} match over: {winner_text}");
            self.broadcast_room(key, &ServerMessage::GameOver { winner_text });
        }
    }

    /// Ask the opponent for a rematch. Records the requester's vote and
    /// prompts everyone else in the room.
    pub fn request_replay(&mut self, id: PlayerId) {
        let Some(key) = self.memberships.get(&id).cloned() else {
            return;
        };
        let Some(room) = self.registry.get_mut(&key) else {
            return;
        };
        let Some(from) = room.player(id).map(|p| p.name.clone()) else {
            return;
        };
        room.record_replay_vote(id);

        let others: Vec<PlayerId> = room.player_ids().into_iter().filter(|p| *p != id).collect();
        for other in others {
            self.send_to(other, &ServerMessage::ReplayRequested { from: from.clone() });
        }
    }

    /// Agree to a rematch. Once every current player has voted, the room
    /// restarts: scores zeroed, round 1, fresh roster broadcast, then a
    /// `NewGame` signal so clients drop stale result displays.
    pub fn accept_replay(&mut self, id: PlayerId) {
        let Some(key) = self.memberships.get(&id).cloned() else {
            return;
        };
        let Some(room) = self.registry.get_mut(&key) else {
            return;
        };
        if room.player(id).is_none() {
            return;
        }
        room.record_replay_vote(id);

        if room.replay_agreed() {
            room.reset();
            info!("room {key:?} restarting match");
            self.broadcast_roster(&key);
            self.broadcast_room(&key, &ServerMessage::NewGame);
        }
    }

    /// Decline a rematch: all votes are wiped so a later lone accept cannot
    /// restart, and the whole room learns who declined.
    pub fn reject_replay(&mut self, id: PlayerId) {
        let Some(key) = self.memberships.get(&id).cloned() else {
            return;
        };
        let Some(room) = self.registry.get_mut(&key) else {
            return;
        };
        let Some(by) = room.player(id).map(|p| p.name.clone()) else {
            return;
        };
        room.clear_replay_votes();
        self.broadcast_room(&key, &ServerMessage::ReplayRejected { by });
    }

    /// Connection gone: drop the write half and vacate the room. Not an
    /// error — the remaining player just sees a shorter roster.
    pub fn disconnect(&mut self, id: PlayerId) {
        self.connections.remove(&id);
        self.leave_room(id);
        info!("player {} disconnected", id.0);
    }

    /// Remove the player from their room (pending choice and replay vote go
    /// with them), tell the remainder, and tear the room down if it emptied.
    fn leave_room(&mut self, id: PlayerId) {
        let Some(key) = self.memberships.remove(&id) else {
            return;
        };
        let Some(room) = self.registry.get_mut(&key) else {
            return;
        };
        room.remove_player(id);
        if self.registry.remove_if_empty(&key) {
            info!("room {key:?} destroyed");
        } else {
            self.broadcast_roster(&key);
        }
    }

    pub fn room_count(&self) -> usize {
        self.registry.len()
    }

    fn broadcast_roster(&mut self, key: &str) {
        let Some(room) = self.registry.get_mut(key) else {
            return;
        };
        let players = room.roster();
        self.broadcast_room(key, &ServerMessage::RoomUpdate { players });
    }

    /// Send a message to every player currently in the room.
    fn broadcast_room(&mut self, key: &str, msg: &ServerMessage) {
        let Some(room) = self.registry.get_mut(key) else {
            return;
        };
        let ids = room.player_ids();
        for id in ids {
            self.send_to(id, msg);
        }
    }

    fn send_error(&mut self, id: PlayerId, err: &GameError) {
        debug!("rejecting message from player {}: {err}", id.0);
        self.send_to(id, &ServerMessage::Error {
            message: err.to_string(),
        });
    }

    /// Send a message to a specific player. Silently ignores write errors
    /// (the reader thread will detect the broken pipe).
    fn send_to(&mut self, id: PlayerId, msg: &ServerMessage) {
        if let Some(writer) = self.connections.get_mut(&id) {
            let _ = send_message(writer, msg);
        }
    }
}

/// Final verdict for a finished match: compare the two scores, higher wins.
fn match_verdict(roster: &[PlayerEntry]) -> String {
    let [p1, p2] = roster else {
        // A match can only finish with both seats occupied.
        return "It's a draw!".into();
    };
    if p1.score > p2.score {
        format!("{} wins the game!", p1.name)
    } else if p2.score > p1.score {
        format!("{} wins the game!", p2.name)
    } else {
        "It's a draw!".into()
    }
}

/// Serialize a `ServerMessage` to JSON and write it with length-delimited
/// framing. Returns any I/O error (caller decides whether to log or ignore).
fn send_message(
    writer: &mut BufWriter<TcpStream>,
    msg: &ServerMessage,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_vec(msg)?;
    write_message(writer, &json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::BufReader;
    use std::net::TcpListener;

    use rps_protocol::framing::read_message;

    use super::*;

    /// Create a TCP pair: (client_stream, server_stream) on localhost.
    fn tcp_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).unwrap();
        let (server, _) = listener.accept().unwrap();
        (client, server)
    }

    /// Read a ServerMessage from a TCP stream.
    fn recv(reader: &mut BufReader<TcpStream>) -> ServerMessage {
        let bytes = read_message(reader).unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Register a connection and return (reader over the client side, id).
    fn connect(server: &mut GameServer) -> (BufReader<TcpStream>, PlayerId) {
        let (client, stream) = tcp_pair();
        let id = server.register_connection(stream);
        (BufReader::new(client), id)
    }

    /// Two players joined to room "r1", welcome traffic drained.
    fn joined_pair(
        server: &mut GameServer,
    ) -> (BufReader<TcpStream>, PlayerId, BufReader<TcpStream>, PlayerId) {
        let (mut reader_a, id_a) = connect(server);
        let (mut reader_b, id_b) = connect(server);
        server.join(id_a, "r1", "Alice");
        server.join(id_b, "r1", "Bob");
        // Alice: her own RoomUpdate + the one from Bob's join. Bob: one.
        let _ = recv(&mut reader_a);
        let _ = recv(&mut reader_a);
        let _ = recv(&mut reader_b);
        (reader_a, id_a, reader_b, id_b)
    }

    fn expect_error(reader: &mut BufReader<TcpStream>, expected: &str) {
        match recv(reader) {
            ServerMessage::Error { message } => assert_eq!(message, expected),
            other => panic!("expected Error, got {other:?}"),
        }
    }

    #[test]
    fn join_broadcasts_roster() {
        let mut server = GameServer::new(5);
        let (mut reader_a, id_a) = connect(&mut server);
        server.join(id_a, "r1", "Alice");

        match recv(&mut reader_a) {
            ServerMessage::RoomUpdate { players } => {
                assert_eq!(players.len(), 1);
                assert_eq!(players[0].id, id_a);
                assert_eq!(players[0].name, "Alice");
                assert_eq!(players[0].score, 0);
            }
            other => panic!("expected RoomUpdate, got {other:?}"),
        }

        let (mut reader_b, id_b) = connect(&mut server);
        server.join(id_b, "r1", "Bob");

        // Both players see the two-entry roster.
        match recv(&mut reader_a) {
            ServerMessage::RoomUpdate { players } => assert_eq!(players.len(), 2),
            other => panic!("expected RoomUpdate, got {other:?}"),
        }
        match recv(&mut reader_b) {
            ServerMessage::RoomUpdate { players } => assert_eq!(players.len(), 2),
            other => panic!("expected RoomUpdate, got {other:?}"),
        }
    }

    #[test]
    fn join_trims_names() {
        let mut server = GameServer::new(5);
        let (mut reader_a, id_a) = connect(&mut server);
        server.join(id_a, "  r1  ", "  Alice  ");

        match recv(&mut reader_a) {
            ServerMessage::RoomUpdate { players } => assert_eq!(players[0].name, "Alice"),
            other => panic!("expected RoomUpdate, got {other:?}"),
        }
        // The trimmed key is the real one.
        let (mut reader_b, id_b) = connect(&mut server);
        server.join(id_b, "r1", "Bob");
        match recv(&mut reader_b) {
            ServerMessage::RoomUpdate { players } => assert_eq!(players.len(), 2),
            other => panic!("expected RoomUpdate, got {other:?}"),
        }
    }

    #[test]
    fn join_rejects_blank_fields() {
        let mut server = GameServer::new(5);
        let (mut reader_a, id_a) = connect(&mut server);

        server.join(id_a, "   ", "Alice");
        expect_error(&mut reader_a, "Room name is required");

        server.join(id_a, "r1", "   ");
        expect_error(&mut reader_a, "Name is required");

        assert_eq!(server.room_count(), 0);
    }

    #[test]
    fn third_join_rejected_without_mutation() {
        let mut server = GameServer::new(5);
        let (_reader_a, _ida, _reader_b, _idb) = joined_pair(&mut server);

        let (mut reader_c, id_c) = connect(&mut server);
        server.join(id_c, "r1", "Carol");
        expect_error(&mut reader_c, "Room is full");

        // Carol can still join elsewhere.
        server.join(id_c, "r2", "Carol");
        match recv(&mut reader_c) {
            ServerMessage::RoomUpdate { players } => {
                assert_eq!(players.len(), 1);
                assert_eq!(players[0].name, "Carol");
            }
            other => panic!("expected RoomUpdate, got {other:?}"),
        }
        assert_eq!(server.room_count(), 2);
    }

    #[test]
    fn choice_without_room_is_ignored() {
        let mut server = GameServer::new(5);
        let (_reader, id) = connect(&mut server);
        // No join — nothing should happen, nothing should be sent.
        server.choice(id, "rock");
        assert_eq!(server.room_count(), 0);
    }

    #[test]
    fn choice_alone_gets_awaiting_opponent() {
        let mut server = GameServer::new(5);
        let (mut reader_a, id_a) = connect(&mut server);
        server.join(id_a, "r1", "Alice");
        let _ = recv(&mut reader_a);

        server.choice(id_a, "rock");
        expect_error(&mut reader_a, "Waiting for second player");
    }

    #[test]
    fn invalid_choice_rejected_before_recording() {
        let mut server = GameServer::new(5);
        let (mut reader_a, id_a, mut reader_b, id_b) = joined_pair(&mut server);

        server.choice(id_a, "lizard");
        expect_error(&mut reader_a, "Unknown choice: lizard");

        // The bad value was never recorded: Bob submitting now must not
        // resolve a round.
        server.choice(id_b, "rock");
        server.choice(id_a, "scissors");
        match recv(&mut reader_b) {
            ServerMessage::RoomUpdate { players } => {
                let bob = players.iter().find(|p| p.id == id_b).unwrap();
                assert_eq!(bob.score, 1);
            }
            other => panic!("expected RoomUpdate, got {other:?}"),
        }
    }

    #[test]
    fn round_resolution_scores_and_results() {
        let mut server = GameServer::new(5);
        let (mut reader_a, id_a, mut reader_b, id_b) = joined_pair(&mut server);

        server.choice(id_a, "rock");
        server.choice(id_b, "scissors");

        // Roster first, with Alice at 1 point.
        match recv(&mut reader_a) {
            ServerMessage::RoomUpdate { players } => {
                assert_eq!(players.iter().find(|p| p.id == id_a).unwrap().score, 1);
                assert_eq!(players.iter().find(|p| p.id == id_b).unwrap().score, 0);
            }
            other => panic!("expected RoomUpdate, got {other:?}"),
        }
        let _ = recv(&mut reader_b);

        match recv(&mut reader_a) {
            ServerMessage::RoundResult {
                your_choice,
                opponent_choice,
                opponent_name,
                your_score,
                opponent_score,
                result,
                round,
                max_rounds,
            } => {
                assert_eq!(your_choice, "rock");
                assert_eq!(opponent_choice, "scissors");
                assert_eq!(opponent_name, "Bob");
                assert_eq!(your_score, 1);
                assert_eq!(opponent_score, 0);
                assert_eq!(result, "You win!");
                assert_eq!(round, 1);
                assert_eq!(max_rounds, 5);
            }
            other => panic!("expected RoundResult, got {other:?}"),
        }
        match recv(&mut reader_b) {
            ServerMessage::RoundResult { result, your_score, .. } => {
                assert_eq!(result, "You lose!");
                assert_eq!(your_score, 0);
            }
            other => panic!("expected RoundResult, got {other:?}"),
        }
    }

    #[test]
    fn draw_leaves_scores_untouched() {
        let mut server = GameServer::new(5);
        let (mut reader_a, id_a, mut reader_b, id_b) = joined_pair(&mut server);

        server.choice(id_a, "paper");
        server.choice(id_b, "paper");

        match recv(&mut reader_a) {
            ServerMessage::RoomUpdate { players } => {
                assert!(players.iter().all(|p| p.score == 0));
            }
            other => panic!("expected RoomUpdate, got {other:?}"),
        }
        let _ = recv(&mut reader_b);
        match recv(&mut reader_a) {
            ServerMessage::RoundResult { result, .. } => assert_eq!(result, "Draw!"),
            other => panic!("expected RoundResult, got {other:?}"),
        }
    }

    #[test]
    fn resubmission_overwrites_and_resolves_once() {
        let mut server = GameServer::new(5);
        let (mut reader_a, id_a, mut reader_b, id_b) = joined_pair(&mut server);

        // Alice changes her mind twice before Bob answers — no error, no
        // resolution yet.
        server.choice(id_a, "rock");
        server.choice(id_a, "paper");
        server.choice(id_a, "scissors");

        server.choice(id_b, "paper");

        // Exactly one resolution, using Alice's last value (scissors beats
        // paper).
        let _ = recv(&mut reader_a); // RoomUpdate
        match recv(&mut reader_a) {
            ServerMessage::RoundResult {
                your_choice,
                result,
                your_score,
                round,
                ..
            } => {
                assert_eq!(your_choice, "scissors");
                assert_eq!(result, "You win!");
                assert_eq!(your_score, 1);
                assert_eq!(round, 1);
            }
            other => panic!("expected RoundResult, got {other:?}"),
        }
        let _ = recv(&mut reader_b); // RoomUpdate
        match recv(&mut reader_b) {
            ServerMessage::RoundResult { round, .. } => assert_eq!(round, 1),
            other => panic!("expected RoundResult, got {other:?}"),
        }
    }

    /// Play one round and drain the RoomUpdate + RoundResult from both sides.
    fn play_round(
        server: &mut GameServer,
        reader_a: &mut BufReader<TcpStream>,
        id_a: PlayerId,
        choice_a: &str,
        reader_b: &mut BufReader<TcpStream>,
        id_b: PlayerId,
        choice_b: &str,
    ) {
        server.choice(id_a, choice_a);
        server.choice(id_b, choice_b);
        let _ = recv(reader_a);
        let _ = recv(reader_a);
        let _ = recv(reader_b);
        let _ = recv(reader_b);
    }

    #[test]
    fn match_over_after_final_round() {
        let mut server = GameServer::new(5);
        let (mut reader_a, id_a, mut reader_b, id_b) = joined_pair(&mut server);

        // Alice wins 3, Bob wins 2.
        for _ in 0..3 {
            play_round(&mut server, &mut reader_a, id_a, "rock", &mut reader_b, id_b, "scissors");
        }
        for _ in 0..2 {
            play_round(&mut server, &mut reader_a, id_a, "paper", &mut reader_b, id_b, "scissors");
        }

        match recv(&mut reader_a) {
            ServerMessage::GameOver { winner_text } => {
                assert_eq!(winner_text, "Alice wins the game!");
            }
            other => panic!("expected GameOver, got {other:?}"),
        }
        match recv(&mut reader_b) {
            ServerMessage::GameOver { winner_text } => {
                assert_eq!(winner_text, "Alice wins the game!");
            }
            other => panic!("expected GameOver, got {other:?}"),
        }

        // A sixth submission is refused.
        server.choice(id_a, "rock");
        expect_error(&mut reader_a, "Match is already over");
    }

    #[test]
    fn tied_match_declares_draw() {
        let mut server = GameServer::new(2);
        let (mut reader_a, id_a, mut reader_b, id_b) = joined_pair(&mut server);

        play_round(&mut server, &mut reader_a, id_a, "rock", &mut reader_b, id_b, "scissors");
        play_round(&mut server, &mut reader_a, id_a, "scissors", &mut reader_b, id_b, "rock");

        match recv(&mut reader_a) {
            ServerMessage::GameOver { winner_text } => assert_eq!(winner_text, "It's a draw!"),
            other => panic!("expected GameOver, got {other:?}"),
        }
    }

    #[test]
    fn replay_request_prompts_only_the_other_player() {
        let mut server = GameServer::new(1);
        let (mut reader_a, id_a, mut reader_b, id_b) = joined_pair(&mut server);
        play_round(&mut server, &mut reader_a, id_a, "rock", &mut reader_b, id_b, "scissors");
        let _ = recv(&mut reader_a); // GameOver
        let _ = recv(&mut reader_b);

        server.request_replay(id_a);
        match recv(&mut reader_b) {
            ServerMessage::ReplayRequested { from } => assert_eq!(from, "Alice"),
            other => panic!("expected ReplayRequested, got {other:?}"),
        }

        // Bob accepts: mutual consent, the room restarts.
        server.accept_replay(id_b);
        match recv(&mut reader_a) {
            ServerMessage::RoomUpdate { players } => {
                assert!(players.iter().all(|p| p.score == 0));
            }
            other => panic!("expected RoomUpdate, got {other:?}"),
        }
        match recv(&mut reader_a) {
            ServerMessage::NewGame => {}
            other => panic!("expected NewGame, got {other:?}"),
        }
        let _ = recv(&mut reader_b);
        match recv(&mut reader_b) {
            ServerMessage::NewGame => {}
            other => panic!("expected NewGame, got {other:?}"),
        }

        // Round counter is back at 1: a new round resolves normally.
        server.choice(id_a, "rock");
        server.choice(id_b, "scissors");
        let _ = recv(&mut reader_a);
        match recv(&mut reader_a) {
            ServerMessage::RoundResult { round, your_score, .. } => {
                assert_eq!(round, 1);
                assert_eq!(your_score, 1);
            }
            other => panic!("expected RoundResult, got {other:?}"),
        }
    }

    #[test]
    fn lone_accept_does_not_restart() {
        let mut server = GameServer::new(1);
        let (mut reader_a, id_a, mut reader_b, id_b) = joined_pair(&mut server);
        play_round(&mut server, &mut reader_a, id_a, "rock", &mut reader_b, id_b, "scissors");
        let _ = recv(&mut reader_a);
        let _ = recv(&mut reader_b);

        server.accept_replay(id_a);

        // No restart: a choice from Alice is still refused.
        server.choice(id_a, "rock");
        expect_error(&mut reader_a, "Match is already over");
    }

    #[test]
    fn reject_clears_votes_for_everyone() {
        let mut server = GameServer::new(1);
        let (mut reader_a, id_a, mut reader_b, id_b) = joined_pair(&mut server);
        play_round(&mut server, &mut reader_a, id_a, "rock", &mut reader_b, id_b, "scissors");
        let _ = recv(&mut reader_a);
        let _ = recv(&mut reader_b);

        server.request_replay(id_a);
        let _ = recv(&mut reader_b); // ReplayRequested

        server.reject_replay(id_b);
        match recv(&mut reader_a) {
            ServerMessage::ReplayRejected { by } => assert_eq!(by, "Bob"),
            other => panic!("expected ReplayRejected, got {other:?}"),
        }
        match recv(&mut reader_b) {
            ServerMessage::ReplayRejected { by } => assert_eq!(by, "Bob"),
            other => panic!("expected ReplayRejected, got {other:?}"),
        }

        // Alice's earlier vote is gone: Bob accepting alone (the remaining
        // voter) must not restart.
        server.accept_replay(id_b);
        server.choice(id_b, "rock");
        expect_error(&mut reader_b, "Match is already over");
    }

    #[test]
    fn disconnect_updates_roster_and_tears_down_empty_room() {
        let mut server = GameServer::new(5);
        let (_reader_a, id_a, mut reader_b, id_b) = joined_pair(&mut server);

        server.disconnect(id_a);
        match recv(&mut reader_b) {
            ServerMessage::RoomUpdate { players } => {
                assert_eq!(players.len(), 1);
                assert_eq!(players[0].id, id_b);
            }
            other => panic!("expected RoomUpdate, got {other:?}"),
        }
        assert_eq!(server.room_count(), 1);

        server.disconnect(id_b);
        assert_eq!(server.room_count(), 0);

        // The name is free again and yields a fresh room.
        let (mut reader_c, id_c) = connect(&mut server);
        server.join(id_c, "r1", "Carol");
        match recv(&mut reader_c) {
            ServerMessage::RoomUpdate { players } => {
                assert_eq!(players.len(), 1);
                assert_eq!(players[0].score, 0);
            }
            other => panic!("expected RoomUpdate, got {other:?}"),
        }
    }

    #[test]
    fn disconnect_mid_round_drops_pending_choice() {
        let mut server = GameServer::new(5);
        let (_reader_a, id_a, mut reader_b, id_b) = joined_pair(&mut server);

        server.choice(id_a, "rock");
        server.disconnect(id_a);
        let _ = recv(&mut reader_b); // shrunken roster

        // A replacement joins; Bob's submission alone must not resolve
        // against the departed player's stale choice.
        let (mut reader_c, id_c) = connect(&mut server);
        server.join(id_c, "r1", "Carol");
        let _ = recv(&mut reader_b);
        let _ = recv(&mut reader_c);

        server.choice(id_b, "paper");
        // One choice in a two-player room: nothing resolves yet.
        server.choice(id_c, "rock");
        let _ = recv(&mut reader_b); // RoomUpdate
        match recv(&mut reader_b) {
            ServerMessage::RoundResult { your_choice, result, .. } => {
                assert_eq!(your_choice, "paper");
                assert_eq!(result, "You win!");
            }
            other => panic!("expected RoundResult, got {other:?}"),
        }
    }

    #[test]
    fn rejoin_moves_player_between_rooms() {
        let mut server = GameServer::new(5);
        let (mut reader_a, id_a, mut reader_b, id_b) = joined_pair(&mut server);

        // Alice moves to r2: r1 shrinks to Bob alone.
        server.join(id_a, "r2", "Alice");
        match recv(&mut reader_b) {
            ServerMessage::RoomUpdate { players } => {
                assert_eq!(players.len(), 1);
                assert_eq!(players[0].id, id_b);
            }
            other => panic!("expected RoomUpdate, got {other:?}"),
        }
        match recv(&mut reader_a) {
            ServerMessage::RoomUpdate { players } => {
                assert_eq!(players.len(), 1);
                assert_eq!(players[0].id, id_a);
            }
            other => panic!("expected RoomUpdate, got {other:?}"),
        }
        assert_eq!(server.room_count(), 2);
    }

    #[test]
    fn verdict_text() {
        let entry = |id: u32, name: &str, score: u32| PlayerEntry {
            id: PlayerId(id),
            name: name.into(),
            score,
        };
        assert_eq!(
            match_verdict(&[entry(0, "Alice", 3), entry(1, "Bob", 2)]),
            "Alice wins the game!"
        );
        assert_eq!(
            match_verdict(&[entry(0, "Alice", 1), entry(1, "Bob", 4)]),
            "Bob wins the game!"
        );
        assert_eq!(
            match_verdict(&[entry(0, "Alice", 2), entry(1, "Bob", 2)]),
            "It's a draw!"
        );
    }
}
