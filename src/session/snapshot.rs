//! Read-only view of a running game.

use im::Vector;
use serde::{Deserialize, Serialize};

use crate::cards::{Card, SelfId};
use crate::core::{Player, PlayerId, PlayerMap};
use crate::rules::{Phase, Winner};

/// Everything the presentation layer needs to draw the table.
///
/// `cards` shares structure with the live deck, so taking a snapshot does
/// not copy the cards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub current_player: PlayerId,
    pub players: PlayerMap<Player>,
    pub matched_total: usize,
    pub card_total: usize,
    pub winner: Winner,
    /// Buffered cards in selection order.
    pub selected: Vec<SelfId>,
    pub cards: Vector<Card>,
}

impl SessionSnapshot {
    /// Look up a card by self id.
    #[must_use]
    pub fn card(&self, self_id: SelfId) -> Option<&Card> {
        self.cards.get(self_id.index()?)
    }

    /// A player's score, zero if the player does not exist.
    #[must_use]
    pub fn score(&self, player: PlayerId) -> u32 {
        if self.players.contains(player) {
            self.players[player].score
        } else {
            0
        }
    }
}
