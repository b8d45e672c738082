//! Session events and the hook trait the turn engine reports through.
//!
//! The engine never talks to listeners directly. Each mutating call takes a
//! `TurnObserver`; the session passes a buffer, then hands the collected
//! events to its subscribers once the session lock is released.

use serde::{Deserialize, Serialize};

use crate::cards::{ContainerRef, SelfId};
use crate::core::PlayerId;
use crate::rules::{Phase, Winner};

/// Something the presentation layer may want to react to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// The engine entered a new phase.
    PhaseChanged(Phase),

    /// The given player is now current.
    TurnChanged(PlayerId),

    /// Final result. Sent exactly once per game.
    GameOver(Winner),

    /// A card was flipped face up by a selection.
    CardRevealed { card: SelfId, player: PlayerId },

    /// Both cards of a pair go to `destination`.
    PairMatched {
        first: SelfId,
        second: SelfId,
        player: PlayerId,
        destination: ContainerRef,
    },

    /// A mismatched pair was turned face down again.
    PairHidden { first: SelfId, second: SelfId },
}

/// Notification hooks called by the turn engine.
///
/// Only `notify` is required; the named hooks forward to it.
pub trait TurnObserver {
    /// Receive an event.
    fn notify(&mut self, event: SessionEvent);

    fn phase_changed(&mut self, phase: Phase) {
        self.notify(SessionEvent::PhaseChanged(phase));
    }

    fn turn_changed(&mut self, player: PlayerId) {
        self.notify(SessionEvent::TurnChanged(player));
    }

    fn game_over(&mut self, winner: Winner) {
        self.notify(SessionEvent::GameOver(winner));
    }
}

/// Collects events in order.
impl TurnObserver for Vec<SessionEvent> {
    fn notify(&mut self, event: SessionEvent) {
        self.push(event);
    }
}

/// Drops every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct IgnoreEvents;

impl TurnObserver for IgnoreEvents {
    fn notify(&mut self, _event: SessionEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_collects_in_order() {
        let mut log: Vec<SessionEvent> = Vec::new();

        log.phase_changed(Phase::CheckCards);
        log.turn_changed(PlayerId::TWO);
        log.game_over(Winner::Tie);

        assert_eq!(
            log,
            vec![
                SessionEvent::PhaseChanged(Phase::CheckCards),
                SessionEvent::TurnChanged(PlayerId::TWO),
                SessionEvent::GameOver(Winner::Tie),
            ]
        );
    }

    #[test]
    fn test_event_serialization() {
        let event = SessionEvent::PairMatched {
            first: SelfId::new(1),
            second: SelfId::new(3),
            player: PlayerId::ONE,
            destination: ContainerRef::new(1),
        };

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: SessionEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deserialized);
    }
}
