//! Selection buffer: the face-up cards waiting to be compared.

use smallvec::SmallVec;
use serde::{Deserialize, Serialize};

use crate::cards::SelfId;

/// Cards compared per resolution.
pub const PAIR_SIZE: usize = 2;

/// Ordered holder of 0, 1 or 2 selected-but-unresolved cards.
///
/// The first card added is "card A", the second "card B". A card is never
/// held twice and a third card is never accepted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionBuffer {
    cards: SmallVec<[SelfId; PAIR_SIZE]>,
}

impl SelectionBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a card.
    ///
    /// Returns `false` without changing anything if the card is already
    /// held or the buffer is full.
    pub fn try_add(&mut self, card: SelfId) -> bool {
        if self.is_full() || self.contains(card) {
            return false;
        }
        self.cards.push(card);
        true
    }

    /// Empty the buffer.
    pub fn clear(&mut self) {
        self.cards.clear();
    }

    /// Number of cards held.
    #[must_use]
    pub fn count(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.cards.len() >= PAIR_SIZE
    }

    #[must_use]
    pub fn contains(&self, card: SelfId) -> bool {
        self.cards.contains(&card)
    }

    /// `(A, B)` once two cards are held.
    #[must_use]
    pub fn pair(&self) -> Option<(SelfId, SelfId)> {
        match self.cards.as_slice() {
            [a, b] => Some((*a, *b)),
            _ => None,
        }
    }

    /// Held cards in selection order.
    #[must_use]
    pub fn as_slice(&self) -> &[SelfId] {
        &self.cards
    }
}
