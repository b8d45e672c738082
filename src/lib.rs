//! # memory-match
//!
//! Turn engine for a memory matching card game: two players (or one)
//! flip cards two at a time looking for pairs.
//!
//! ## Design Principles
//!
//! 1. **Engine is synchronous**: `TurnEngine` is plain state plus rules.
//!    Timing lives in the session, which steps the engine between
//!    presentation delays.
//!
//! 2. **Invalid input is a no-op**: clicks during a check, on matched
//!    cards, or out of turn come back as `SelectOutcome::Ignored`. Only
//!    contract breaches (out-of-range self ids, wrong deck size) panic.
//!
//! 3. **Explicit wiring**: the session is a handle passed to whoever needs
//!    it. Listeners subscribe and unsubscribe explicitly.
//!
//! ## Modules
//!
//! - `core`: Players, configuration, RNG, errors
//! - `cards`: Card state and the deck
//! - `selection`: The 0-2 card selection buffer
//! - `rules`: Turn engine and win evaluation
//! - `events`: Session events, observer hooks, subscriptions
//! - `net`: Selection message codec and transport trait
//! - `session`: The orchestrator

pub mod core;
pub mod cards;
pub mod selection;
pub mod rules;
pub mod events;
pub mod net;
pub mod session;

// Re-export commonly used types
pub use crate::core::{
    DeckError, GameRng, NetError, Player, PlayerId, PlayerMap, ResolutionTimings, SessionConfig,
    TurnMode,
};

pub use crate::cards::{Card, ContainerRef, Deck, MatchIdentity, SelfId};

pub use crate::selection::SelectionBuffer;

pub use crate::rules::{
    evaluate, IgnoreReason, MatchProgress, PairResolution, Phase, SelectOutcome, TurnEngine, Winner,
};

pub use crate::events::{EventHub, SessionEvent, SubscriptionId, TurnObserver};

pub use crate::net::{ChannelSink, SelectionMessage, SelectionSink};

pub use crate::session::{GameSession, SessionSnapshot};
