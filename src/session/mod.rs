//! Game session orchestration.
//!
//! `GameSession` owns the players, engine and deck of the game on the
//! table. It routes local input offline or online, runs pair resolution as
//! a tokio task with the configured delays, and forwards engine events to
//! subscribers.
//!
//! ## Example
//!
//! ```
//! use memory_match::cards::{Deck, SelfId};
//! use memory_match::core::{PlayerId, ResolutionTimings, SessionConfig};
//! use memory_match::rules::Phase;
//! use memory_match::session::GameSession;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let config = SessionConfig::default().with_timings(ResolutionTimings::instant());
//! let session = GameSession::new(config);
//! session.start(Deck::pairs(2).unwrap()); // [0, 1, 0, 1]
//!
//! session.request_select(SelfId::new(1), PlayerId::ONE);
//! session.request_select(SelfId::new(3), PlayerId::ONE);
//! session.settle().await;
//!
//! assert_eq!(session.score(PlayerId::ONE), 2);
//! assert_eq!(session.phase(), Some(Phase::SelectCards));
//! # }
//! ```

mod game_session;
mod resolution;
mod snapshot;

pub use game_session::GameSession;
pub use snapshot::SessionSnapshot;
