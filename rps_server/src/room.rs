// Room state for one two-player contest.
//
// `Room` is pure data plus accessors — it never touches the network. All
// mutation happens through methods called from the server's single-threaded
// event loop (via `GameServer`), so there is no internal locking and no two
// transitions on the same room can interleave.
//
// Invariants:
// - at most 2 players at any time (`add_player` refuses a third);
// - a choice entry exists only for a player currently in the room;
// - replay votes are a subset of current player IDs;
// - `round` stays in [1, max_rounds + 1]; max_rounds + 1 means the match has
//   concluded and the room is awaiting a replay decision.

use std::collections::{BTreeMap, BTreeSet};

use rps_protocol::{PlayerEntry, PlayerId};

use crate::error::GameError;
use crate::rules::Choice;

/// Room capacity — this is strictly a head-to-head game.
pub const MAX_PLAYERS: usize = 2;

/// One player's per-room state.
#[derive(Clone, Debug)]
pub struct Player {
    pub name: String,
    pub score: u32,
}

/// One isolated two-player contest instance.
#[derive(Debug)]
pub struct Room {
    players: BTreeMap<PlayerId, Player>,
    choices: BTreeMap<PlayerId, Choice>,
    round: u32,
    max_rounds: u32,
    replay_votes: BTreeSet<PlayerId>,
}

impl Room {
    pub fn new(max_rounds: u32) -> Self {
        Self {
            players: BTreeMap::new(),
            choices: BTreeMap::new(),
            round: 1,
            max_rounds,
            replay_votes: BTreeSet::new(),
        }
    }

    /// Add a player with a fresh score. Refuses a third player.
    pub fn add_player(&mut self, id: PlayerId, name: String) -> Result<(), GameError> {
        if self.players.len() >= MAX_PLAYERS {
            return Err(GameError::RoomFull);
        }
        self.players.insert(id, Player { name, score: 0 });
        Ok(())
    }

    /// Remove a player along with any pending choice and replay vote.
    /// Returns the removed player, if present.
    pub fn remove_player(&mut self, id: PlayerId) -> Option<Player> {
        self.choices.remove(&id);
        self.replay_votes.remove(&id);
        self.players.remove(&id)
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players.keys().copied().collect()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= MAX_PLAYERS
    }

    /// Record a choice for the in-progress round. Resubmission before the
    /// opponent answers overwrites the earlier value — last write wins.
    pub fn record_choice(&mut self, id: PlayerId, choice: Choice) {
        debug_assert!(self.players.contains_key(&id));
        self.choices.insert(id, choice);
    }

    /// True once every seat has submitted for the current round.
    pub fn all_choices_in(&self) -> bool {
        self.choices.len() == MAX_PLAYERS
    }

    /// Drain this round's choices in player-ID order.
    pub fn take_choices(&mut self) -> Vec<(PlayerId, Choice)> {
        std::mem::take(&mut self.choices).into_iter().collect()
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    /// True once the final round has resolved (round == max_rounds + 1).
    pub fn concluded(&self) -> bool {
        self.round > self.max_rounds
    }

    pub fn advance_round(&mut self) {
        self.round += 1;
    }

    /// Award one point for a round win.
    pub fn bump_score(&mut self, id: PlayerId) {
        if let Some(p) = self.players.get_mut(&id) {
            p.score += 1;
        }
    }

    pub fn record_replay_vote(&mut self, id: PlayerId) {
        debug_assert!(self.players.contains_key(&id));
        self.replay_votes.insert(id);
    }

    pub fn clear_replay_votes(&mut self) {
        self.replay_votes.clear();
    }

    /// Mutual consent: both seats occupied and every current player voted.
    /// A vote from a since-departed player is removed with the player, so a
    /// stale vote can never count toward agreement.
    pub fn replay_agreed(&self) -> bool {
        self.players.len() == MAX_PLAYERS
            && self.players.keys().all(|id| self.replay_votes.contains(id))
    }

    /// Reset for a rematch: round 1, all scores zero, choices and votes
    /// cleared. Membership is untouched.
    pub fn reset(&mut self) {
        self.round = 1;
        self.choices.clear();
        self.replay_votes.clear();
        for p in self.players.values_mut() {
            p.score = 0;
        }
    }

    /// Roster snapshot in wire form.
    pub fn roster(&self) -> Vec<PlayerEntry> {
        self.players
            .iter()
            .map(|(id, p)| PlayerEntry {
                id: *id,
                name: p.name.clone(),
                score: p.score,
            })
            .collect()
    }
}
