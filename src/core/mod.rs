//! Core engine types: players, configuration, RNG, errors.
//!
//! These are the building blocks shared by every other module.

pub mod player;
pub mod rng;
pub mod config;
pub mod error;

pub use player::{Player, PlayerId, PlayerMap, MAX_PLAYERS};
pub use rng::GameRng;
pub use config::{ResolutionTimings, SessionConfig, TurnMode};
pub use error::{DeckError, DeckResult, NetError, NetResult};
