//! Card system: card instances and the deck.
//!
//! ## Key Types
//!
//! - `MatchIdentity`: the value a pair shares
//! - `SelfId`: 1-based stable position in the deck
//! - `ContainerRef`: opaque destination for matched cards
//! - `Card`: identity plus face-up/matched state
//! - `Deck`: validated ordered collection, indexed by `SelfId`

pub mod card;
pub mod deck;

pub use card::{Card, ContainerRef, MatchIdentity, SelfId};
pub use deck::Deck;
