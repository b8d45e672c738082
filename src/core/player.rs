//! Player identification and per-player data storage.
//!
//! ## PlayerId
//!
//! Type-safe player identifier. A session has one player (solo) or two.
//! Player numbers are 1-based on the outside (`PlayerId::ONE.number() == 1`)
//! and 0-based internally for indexing.
//!
//! ## PlayerMap
//!
//! Per-player data storage backed by `Vec` for O(1) access.
//! Supports iteration and indexing by `PlayerId`.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

use crate::cards::ContainerRef;

/// Most players a session supports.
pub const MAX_PLAYERS: usize = 2;

/// Player identifier.
///
/// Player indices are 0-based: the first player is `PlayerId(0)`,
/// displayed as "Player 1".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl PlayerId {
    /// The player who moves first.
    pub const ONE: PlayerId = PlayerId(0);

    /// The second player (two-player mode only).
    pub const TWO: PlayerId = PlayerId(1);

    /// Create a player ID from its 1-based player number.
    ///
    /// Returns `None` for anything other than 1 or 2.
    ///
    /// ```
    /// use memory_match::core::PlayerId;
    ///
    /// assert_eq!(PlayerId::from_number(2), Some(PlayerId::TWO));
    /// assert_eq!(PlayerId::from_number(0), None);
    /// assert_eq!(PlayerId::from_number(3), None);
    /// ```
    #[must_use]
    pub const fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::ONE),
            2 => Some(Self::TWO),
            _ => None,
        }
    }

    /// Get the raw player index (0-based).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Get the player number (1-based).
    #[must_use]
    pub const fn number(self) -> u8 {
        self.0 + 1
    }

    /// The other player in a two-player game.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self.0 {
            0 => Self::TWO,
            _ => Self::ONE,
        }
    }

    /// Iterate over all player IDs for a game with `player_count` players.
    pub fn all(player_count: usize) -> impl Iterator<Item = PlayerId> {
        (0..player_count as u8).map(PlayerId)
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Player {}", self.number())
    }
}

/// Per-player session data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Who this is.
    pub id: PlayerId,

    /// Two points per matched pair.
    pub score: u32,

    /// Where this player's matched cards pile up. Opaque to the engine.
    pub container: ContainerRef,
}

impl Player {
    /// Create a player with a zero score.
    #[must_use]
    pub fn new(id: PlayerId, container: ContainerRef) -> Self {
        Self {
            id,
            score: 0,
            container,
        }
    }
}

/// Per-player data storage with O(1) access.
///
/// Backed by a `Vec<T>` with one entry per player.
///
/// ## Example
///
/// ```
/// use memory_match::core::{PlayerId, PlayerMap};
///
/// let mut scores: PlayerMap<u32> = PlayerMap::with_value(2, 0);
/// scores[PlayerId::TWO] += 2;
/// assert_eq!(scores[PlayerId::ONE], 0);
/// assert_eq!(scores[PlayerId::TWO], 2);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerMap<T> {
    data: Vec<T>,
}

impl<T> PlayerMap<T> {
    /// Create a new PlayerMap with values from a factory function.
    ///
    /// The factory receives the `PlayerId` for each player.
    pub fn new(player_count: usize, factory: impl Fn(PlayerId) -> T) -> Self {
        assert!(player_count > 0, "Must have at least 1 player");
        assert!(player_count <= MAX_PLAYERS, "At most 2 players supported");

        let data = PlayerId::all(player_count).map(factory).collect();

        Self { data }
    }

    /// Create a new PlayerMap with all entries set to the same value.
    pub fn with_value(player_count: usize, value: T) -> Self
    where
        T: Clone,
    {
        Self::new(player_count, |_| value.clone())
    }

    /// Get the number of players.
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.data.len()
    }

    /// Check whether a player exists in this map.
    #[must_use]
    pub fn contains(&self, player: PlayerId) -> bool {
        player.index() < self.data.len()
    }

    /// Get a reference to a player's data.
    #[must_use]
    pub fn get(&self, player: PlayerId) -> &T {
        &self.data[player.index()]
    }

    /// Get a mutable reference to a player's data.
    pub fn get_mut(&mut self, player: PlayerId) -> &mut T {
        &mut self.data[player.index()]
    }

    /// Iterate over (PlayerId, &T) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &T)> {
        self.data
            .iter()
            .enumerate()
            .map(|(i, v)| (PlayerId(i as u8), v))
    }

    /// Map every entry into a new `PlayerMap`.
    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> PlayerMap<U> {
        PlayerMap {
            data: self.data.iter().map(f).collect(),
        }
    }
}

impl<T> Index<PlayerId> for PlayerMap<T> {
    type Output = T;

    fn index(&self, player: PlayerId) -> &Self::Output {
        self.get(player)
    }
}

impl<T> IndexMut<PlayerId> for PlayerMap<T> {
    fn index_mut(&mut self, player: PlayerId) -> &mut Self::Output {
        self.get_mut(player)
    }
}
