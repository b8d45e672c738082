//! Card instances - identity plus per-game face/matched state.
//!
//! A `Card` is created once when the deck is built. During play only its
//! `face_up`, `matched` and `destination` fields change, and only through
//! the turn engine.

use serde::{Deserialize, Serialize};

/// The value two cards share that makes them a pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MatchIdentity(pub u32);

impl MatchIdentity {
    /// Create a new identity.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for MatchIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Identity({})", self.0)
    }
}

/// Stable 1-based position of a card in the deck.
///
/// `SelfId(0)` is reserved for "no card" and never resolves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SelfId(pub u32);

impl SelfId {
    /// Create a new self id.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Deck index (`self_id - 1`), or `None` for the reserved zero id.
    #[must_use]
    pub const fn index(self) -> Option<usize> {
        match self.0 {
            0 => None,
            n => Some(n as usize - 1),
        }
    }

    /// Self id of the card at deck index `index`.
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self(index as u32 + 1)
    }
}

impl std::fmt::Display for SelfId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque handle to where a player's matched cards accumulate.
///
/// The engine only passes it through to `Card::set_matched` and the
/// `PairMatched` notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerRef(pub u32);

impl ContainerRef {
    /// Create a new container handle.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

/// A card in a game.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    identity: MatchIdentity,
    self_id: SelfId,
    face_up: bool,
    matched: bool,
    destination: Option<ContainerRef>,
}

impl Card {
    /// Create a face-down, unmatched card.
    #[must_use]
    pub fn new(identity: MatchIdentity, self_id: SelfId) -> Self {
        Self {
            identity,
            self_id,
            face_up: false,
            matched: false,
            destination: None,
        }
    }

    /// The matching identity.
    #[must_use]
    pub fn identity(&self) -> MatchIdentity {
        self.identity
    }

    /// The stable position id.
    #[must_use]
    pub fn self_id(&self) -> SelfId {
        self.self_id
    }

    #[must_use]
    pub fn is_face_up(&self) -> bool {
        self.face_up
    }

    #[must_use]
    pub fn is_matched(&self) -> bool {
        self.matched
    }

    /// Container this card was sent to, once matched.
    #[must_use]
    pub fn destination(&self) -> Option<ContainerRef> {
        self.destination
    }

    /// Flip the card (`None`) or force a face (`Some(face_up)`).
    pub fn toggle_face(&mut self, target: Option<bool>) {
        self.face_up = target.unwrap_or(!self.face_up);
    }

    /// Mark the card matched and record where it goes.
    pub fn set_matched(&mut self, destination: ContainerRef) {
        self.matched = true;
        self.destination = Some(destination);
    }

    /// Back to face-down and unmatched, for reuse in a later session.
    pub fn reset(&mut self) {
        self.face_up = false;
        self.matched = false;
        self.destination = None;
    }
}
