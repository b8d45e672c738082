//! Timed pair resolution.
//!
//! One task per pair. Each step sleeps for its presentation delay, then
//! runs through `Shared::step`, which drops the step if the session was
//! restarted or torn down in the meantime.

use std::sync::Arc;

use tokio::time::sleep;
use tracing::debug;

use super::game_session::Shared;
use crate::core::ResolutionTimings;
use crate::rules::{MatchProgress, PairResolution};

pub(super) async fn run_resolution(
    shared: Arc<Shared>,
    generation: u64,
    timings: ResolutionTimings,
    resolution: PairResolution,
) {
    debug!(?resolution, generation, "resolving pair");

    match resolution {
        PairResolution::Match { .. } => {
            sleep(timings.match_reveal).await;
            let progress = shared.step(generation, |game, events| {
                game.engine.commit_match(&mut game.deck, events)
            });
            if progress != Some(MatchProgress::Complete) {
                return;
            }

            sleep(timings.game_over).await;
            shared.step(generation, |game, events| game.engine.finish(events));
        }
        PairResolution::Mismatch { .. } => {
            sleep(timings.mismatch_reveal).await;
            let hidden = shared.step(generation, |game, events| {
                game.engine.hide_mismatch(&mut game.deck, events);
            });
            if hidden.is_none() {
                return;
            }

            sleep(timings.turn_switch).await;
            shared.step(generation, |game, events| {
                game.engine.switch_turn(&game.deck, events);
            });
        }
    }
}
