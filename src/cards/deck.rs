//! The deck: an ordered, validated collection of cards.
//!
//! The card at index `i` always has self id `i + 1`, and the order never
//! changes once the deck is built. Shuffling happens before self ids are
//! assigned, so a shuffled deck is still indexed by position.
//!
//! Cards live in an `im::Vector` so that handing a copy of the deck to the
//! presentation layer (see `SessionSnapshot`) is O(1).

use im::Vector;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::card::{Card, MatchIdentity, SelfId};
use crate::core::error::{DeckError, DeckResult};
use crate::core::GameRng;

/// An ordered collection of paired cards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    cards: Vector<Card>,
}

impl Deck {
    /// Build a deck from cards already carrying their self ids.
    ///
    /// ## Errors
    ///
    /// Fails if the deck is empty, odd-sized, has an identity that does not
    /// appear exactly twice, or has self ids that are not `1..=len` in order.
    pub fn from_cards(cards: impl IntoIterator<Item = Card>) -> DeckResult<Self> {
        let cards: Vector<Card> = cards.into_iter().collect();
        validate(&cards)?;
        Ok(Self { cards })
    }

    /// Build a deck laying out `identities` in order, assigning self ids 1, 2, ...
    ///
    /// ```
    /// use memory_match::cards::{Deck, MatchIdentity, SelfId};
    ///
    /// let deck = Deck::from_identities([0, 1, 0, 1].map(MatchIdentity::new)).unwrap();
    /// assert_eq!(deck.len(), 4);
    /// assert_eq!(deck.get(SelfId::new(3)).unwrap().identity(), MatchIdentity::new(0));
    /// ```
    pub fn from_identities(identities: impl IntoIterator<Item = MatchIdentity>) -> DeckResult<Self> {
        Self::from_cards(
            identities
                .into_iter()
                .enumerate()
                .map(|(i, identity)| Card::new(identity, SelfId::from_index(i))),
        )
    }

    /// Unshuffled deck of `pair_count` pairs: identities `0..n` followed by `0..n` again.
    pub fn pairs(pair_count: u32) -> DeckResult<Self> {
        Self::from_identities((0..pair_count).chain(0..pair_count).map(MatchIdentity::new))
    }

    /// Shuffled deck of `pair_count` pairs.
    pub fn shuffled(pair_count: u32, rng: &mut GameRng) -> DeckResult<Self> {
        let mut identities: Vec<MatchIdentity> = (0..pair_count)
            .chain(0..pair_count)
            .map(MatchIdentity::new)
            .collect();
        rng.shuffle(&mut identities);
        Self::from_identities(identities)
    }

    /// Number of cards.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Whether `self_id` names a card in this deck.
    #[must_use]
    pub fn contains(&self, self_id: SelfId) -> bool {
        self_id.index().is_some_and(|i| i < self.cards.len())
    }

    /// Look up a card. `None` for the reserved zero id or anything past the end.
    #[must_use]
    pub fn get(&self, self_id: SelfId) -> Option<&Card> {
        self.cards.get(self_id.index()?)
    }

    /// Mutable lookup.
    pub fn get_mut(&mut self, self_id: SelfId) -> Option<&mut Card> {
        let index = self_id.index()?;
        self.cards.get_mut(index)
    }

    /// All cards in self id order.
    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    /// Cheap copy of the underlying vector.
    #[must_use]
    pub fn cards(&self) -> Vector<Card> {
        self.cards.clone()
    }

    /// Number of matched cards.
    #[must_use]
    pub fn matched_count(&self) -> usize {
        self.cards.iter().filter(|c| c.is_matched()).count()
    }

    /// Self ids of all cards still in play.
    pub fn unmatched(&self) -> impl Iterator<Item = SelfId> + '_ {
        self.cards
            .iter()
            .filter(|c| !c.is_matched())
            .map(Card::self_id)
    }

    /// Turn every card face down and unmatched.
    pub fn reset(&mut self) {
        for card in self.cards.iter_mut() {
            card.reset();
        }
    }
}

fn validate(cards: &Vector<Card>) -> DeckResult<()> {
    if cards.is_empty() {
        return Err(DeckError::Empty);
    }
    if cards.len() % 2 != 0 {
        return Err(DeckError::OddSize(cards.len()));
    }

    let mut counts: FxHashMap<MatchIdentity, usize> = FxHashMap::default();
    for (position, card) in cards.iter().enumerate() {
        let expected = SelfId::from_index(position);
        if card.self_id() != expected {
            return Err(DeckError::SelfIdOutOfOrder {
                position,
                expected,
                found: card.self_id(),
            });
        }
        *counts.entry(card.identity()).or_insert(0) += 1;
    }

    // Report the smallest offending identity so errors are stable.
    let mut unpaired: Vec<_> = counts.into_iter().filter(|&(_, count)| count != 2).collect();
    unpaired.sort_unstable();
    match unpaired.first() {
        Some(&(identity, count)) => Err(DeckError::UnpairedIdentity { identity, count }),
        None => Ok(()),
    }
}
