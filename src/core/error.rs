//! Error types for deck construction and the network boundary.
//!
//! Rejected selections are not errors: they come back as
//! `SelectOutcome::Ignored`. Contract breaches by a collaborator panic.

use thiserror::Error;

use crate::cards::{MatchIdentity, SelfId};

/// Problems with a deck handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeckError {
    /// A deck needs at least one pair.
    #[error("deck is empty")]
    Empty,

    /// Cards come in pairs.
    #[error("deck has an odd number of cards ({0})")]
    OddSize(usize),

    /// Each identity must be shared by exactly two cards.
    #[error("identity {identity} appears {count} times, expected 2")]
    UnpairedIdentity {
        identity: MatchIdentity,
        count: usize,
    },

    /// Card at `position` carries the wrong self id.
    #[error("card at position {position} has self id {found}, expected {expected}")]
    SelfIdOutOfOrder {
        position: usize,
        expected: SelfId,
        found: SelfId,
    },
}

/// Problems at the network boundary.
#[derive(Debug, Error)]
pub enum NetError {
    /// Payload could not be encoded or decoded.
    #[error("selection message codec failed: {0}")]
    Codec(#[from] bincode::Error),

    /// Payload named a player that does not exist.
    #[error("invalid player number {0}")]
    InvalidPlayer(u8),

    /// The transport refused the message.
    #[error("transport failed: {0}")]
    Transport(String),
}

/// Result type alias for deck construction.
pub type DeckResult<T> = Result<T, DeckError>;

/// Result type alias for network operations.
pub type NetResult<T> = Result<T, NetError>;
