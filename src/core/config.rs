//! Session configuration types.
//!
//! A session is configured at construction by providing:
//! - `TurnMode`: two players taking turns, or a single player
//! - `ResolutionTimings`: presentation delays requested between resolution steps
//! - `SessionConfig`: combines both

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::player::{PlayerId, PlayerMap};
use crate::cards::ContainerRef;

/// How many players take part and whether turns alternate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnMode {
    /// Two players; the turn passes on every mismatch.
    #[default]
    TwoPlayer,
    /// One implicit player; no turn switching, no opponent.
    Solo,
}

impl TurnMode {
    /// Number of players in this mode.
    #[must_use]
    pub const fn player_count(self) -> usize {
        match self {
            TurnMode::TwoPlayer => 2,
            TurnMode::Solo => 1,
        }
    }

    /// Does the turn pass to the other player on a mismatch?
    #[must_use]
    pub const fn switches_turns(self) -> bool {
        matches!(self, TurnMode::TwoPlayer)
    }
}

/// Fixed presentation delays between resolution steps.
///
/// The engine never computes these; it only waits for them so the
/// presentation layer can animate flips and moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionTimings {
    /// Pause before a matched pair is moved to the player's container.
    pub match_reveal: Duration,

    /// Pause before a mismatched pair is flipped face down.
    pub mismatch_reveal: Duration,

    /// Pause between hiding a mismatched pair and passing the turn.
    pub turn_switch: Duration,

    /// Pause between the last match and the winner announcement.
    pub game_over: Duration,
}

impl Default for ResolutionTimings {
    fn default() -> Self {
        Self {
            match_reveal: Duration::from_millis(450),
            mismatch_reveal: Duration::from_millis(500),
            turn_switch: Duration::from_millis(300),
            game_over: Duration::from_millis(500),
        }
    }
}

impl ResolutionTimings {
    /// All delays zero. Resolution still runs on the scheduler, just without pauses.
    #[must_use]
    pub const fn instant() -> Self {
        Self {
            match_reveal: Duration::ZERO,
            mismatch_reveal: Duration::ZERO,
            turn_switch: Duration::ZERO,
            game_over: Duration::ZERO,
        }
    }
}

/// Complete session configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Solo or two-player.
    pub mode: TurnMode,

    /// Presentation delays.
    pub timings: ResolutionTimings,

    /// Container handle per player. Length must match `mode.player_count()`.
    pub containers: Vec<ContainerRef>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(TurnMode::TwoPlayer)
    }
}

impl SessionConfig {
    /// Create a config for the given mode with default timings.
    ///
    /// Containers default to `ContainerRef(number)` per player.
    #[must_use]
    pub fn new(mode: TurnMode) -> Self {
        Self {
            mode,
            timings: ResolutionTimings::default(),
            containers: PlayerId::all(mode.player_count())
                .map(|p| ContainerRef::new(u32::from(p.number())))
                .collect(),
        }
    }

    /// Solo configuration.
    #[must_use]
    pub fn solo() -> Self {
        Self::new(TurnMode::Solo)
    }

    /// Set the delays.
    #[must_use]
    pub fn with_timings(mut self, timings: ResolutionTimings) -> Self {
        self.timings = timings;
        self
    }

    /// Set a player's container handle.
    #[must_use]
    pub fn with_container(mut self, player: PlayerId, container: ContainerRef) -> Self {
        assert!(
            player.index() < self.containers.len(),
            "{} does not exist in {:?} mode",
            player,
            self.mode
        );
        self.containers[player.index()] = container;
        self
    }

    /// Containers as a `PlayerMap`.
    #[must_use]
    pub fn container_map(&self) -> PlayerMap<ContainerRef> {
        assert_eq!(
            self.containers.len(),
            self.mode.player_count(),
            "One container per player required"
        );
        PlayerMap::new(self.mode.player_count(), |p| self.containers[p.index()])
    }
}
