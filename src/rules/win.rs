//! Win evaluation.

use serde::{Deserialize, Serialize};

use crate::core::PlayerId;

/// Outcome of a game.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Winner {
    /// Game still running.
    #[default]
    Undetermined,
    /// Equal scores.
    Tie,
    /// Single winner.
    Player(PlayerId),
}

impl Winner {
    /// Numeric form: -1 undetermined, 0 tie, otherwise the player number.
    #[must_use]
    pub const fn number(self) -> i8 {
        match self {
            Winner::Undetermined => -1,
            Winner::Tie => 0,
            Winner::Player(p) => p.number() as i8,
        }
    }

    /// Check if a player won.
    #[must_use]
    pub fn is_winner(self, player: PlayerId) -> bool {
        self == Winner::Player(player)
    }

    #[must_use]
    pub const fn is_decided(self) -> bool {
        !matches!(self, Winner::Undetermined)
    }
}

impl std::fmt::Display for Winner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Winner::Undetermined => write!(f, "undetermined"),
            Winner::Tie => write!(f, "tie"),
            Winner::Player(p) => write!(f, "{} wins", p),
        }
    }
}

/// Compare final scores.
///
/// ```
/// use memory_match::core::PlayerId;
/// use memory_match::rules::{evaluate, Winner};
///
/// assert_eq!(evaluate(6, 4), Winner::Player(PlayerId::ONE));
/// assert_eq!(evaluate(4, 6), Winner::Player(PlayerId::TWO));
/// assert_eq!(evaluate(5, 5), Winner::Tie);
/// ```
#[must_use]
pub fn evaluate(player_one_score: u32, player_two_score: u32) -> Winner {
    use std::cmp::Ordering;

    match player_one_score.cmp(&player_two_score) {
        Ordering::Greater => Winner::Player(PlayerId::ONE),
        Ordering::Less => Winner::Player(PlayerId::TWO),
        Ordering::Equal => Winner::Tie,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate() {
        assert_eq!(evaluate(6, 4).number(), 1);
        assert_eq!(evaluate(4, 6).number(), 2);
        assert_eq!(evaluate(5, 5).number(), 0);
        assert_eq!(evaluate(0, 0), Winner::Tie);
    }

    #[test]
    fn test_winner_number() {
        assert_eq!(Winner::Undetermined.number(), -1);
        assert_eq!(Winner::Tie.number(), 0);
        assert_eq!(Winner::Player(PlayerId::TWO).number(), 2);
    }

    #[test]
    fn test_is_winner() {
        let result = Winner::Player(PlayerId::TWO);
        assert!(result.is_winner(PlayerId::TWO));
        assert!(!result.is_winner(PlayerId::ONE));
        assert!(!Winner::Tie.is_winner(PlayerId::ONE));
        assert!(!Winner::Undetermined.is_decided());
        assert!(Winner::Tie.is_decided());
    }

    #[test]
    fn test_display() {
        assert_eq!(Winner::Player(PlayerId::ONE).to_string(), "Player 1 wins");
        assert_eq!(Winner::Tie.to_string(), "tie");
    }
}
