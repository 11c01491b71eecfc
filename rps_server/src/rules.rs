// Game rules: the choice enumeration and the round resolver.
//
// `resolve` is a pure function over the 9 choice pairs. Each choice beats
// exactly one other (rock > scissors > paper > rock); equal choices draw.
// No state, no failure cases — invalid input is rejected upstream by
// `Choice::from_str`, so the resolver never sees an unrecognized value.

use std::fmt;
use std::str::FromStr;

use crate::error::GameError;

/// One of the three fixed game moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Choice {
    Rock,
    Paper,
    Scissors,
}

impl Choice {
    /// The choice this one defeats.
    pub fn beats(self) -> Choice {
        match self {
            Choice::Rock => Choice::Scissors,
            Choice::Scissors => Choice::Paper,
            Choice::Paper => Choice::Rock,
        }
    }

    /// Canonical lowercase wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Choice::Rock => "rock",
            Choice::Paper => "paper",
            Choice::Scissors => "scissors",
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Choice {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "rock" => Ok(Choice::Rock),
            "paper" => Ok(Choice::Paper),
            "scissors" => Ok(Choice::Scissors),
            other => Err(GameError::InvalidChoice(other.to_string())),
        }
    }
}

/// The win/lose/draw relationship between two choices in one round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    FirstWins,
    SecondWins,
    Draw,
}

/// Resolve one round. Deterministic and total over all 9 input pairs.
pub fn resolve(a: Choice, b: Choice) -> Outcome {
    if a == b {
        Outcome::Draw
    } else if a.beats() == b {
        Outcome::FirstWins
    } else {
        Outcome::SecondWins
    }
}
