//! Game rules: the turn engine and win evaluation.
//!
//! `TurnEngine` decides what a selection means, resolves pairs, keeps
//! score and passes the turn. `evaluate` turns final scores into a
//! `Winner`. Neither knows about timing, networking or listeners.

pub mod engine;
pub mod win;

pub use engine::{
    IgnoreReason, MatchProgress, PairResolution, Phase, SelectOutcome, TurnEngine, POINTS_PER_PAIR,
};
pub use win::{evaluate, Winner};
