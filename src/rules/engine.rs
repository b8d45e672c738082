//! Turn engine: who may act, what a selection means, how pairs resolve.
//!
//! The engine is synchronous. Resolution is split into steps so that a
//! driver can put presentation delays between them:
//!
//! ```text
//! request_select ──(2nd card)──> CheckCards
//!     match:    commit_match ──> SelectCards            (same player continues)
//!               commit_match ──> [Complete] finish ──> End
//!     mismatch: hide_mismatch ──> switch_turn ──> SelectCards
//! ```
//!
//! `resolve_immediately` runs the whole sequence with no delays.
//!
//! The deck is not owned by the engine; every call that touches cards
//! borrows it.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::win::{evaluate, Winner};
use crate::cards::{Card, ContainerRef, Deck, SelfId};
use crate::core::{Player, PlayerId, PlayerMap, TurnMode};
use crate::events::{SessionEvent, TurnObserver};
use crate::selection::SelectionBuffer;

/// Points awarded per matched pair.
pub const POINTS_PER_PAIR: u32 = 2;

/// Engine phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Waiting for input.
    #[default]
    SelectCards,
    /// Two cards are up and being resolved. Input is ignored.
    CheckCards,
    /// All pairs matched. Terminal.
    End,
}

/// Why a selection was ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IgnoreReason {
    /// No game running: the session was never started or was torn down.
    NotStarted,
    /// Not in `SelectCards`.
    WrongPhase,
    /// Requesting player is not current (or does not exist in this mode).
    NotYourTurn,
    /// Self id 0: the input did not resolve to a card.
    UnknownCard,
    /// Card is already matched.
    AlreadyMatched,
    /// Card is already in the selection buffer.
    AlreadySelected,
}

/// The two buffered cards and how they compare.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PairResolution {
    Match { first: SelfId, second: SelfId },
    Mismatch { first: SelfId, second: SelfId },
}

impl PairResolution {
    #[must_use]
    pub const fn is_match(self) -> bool {
        matches!(self, PairResolution::Match { .. })
    }

    /// `(A, B)` in selection order.
    #[must_use]
    pub const fn cards(self) -> (SelfId, SelfId) {
        match self {
            PairResolution::Match { first, second } | PairResolution::Mismatch { first, second } => {
                (first, second)
            }
        }
    }
}

/// Result of a selection request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectOutcome {
    /// Nothing changed.
    Ignored(IgnoreReason),
    /// Card flipped up; waiting for a second card.
    Revealed,
    /// Second card flipped up; the engine is now in `CheckCards`.
    PairReady(PairResolution),
    /// Online mode: handed to the network instead of the local engine.
    Forwarded,
}

impl SelectOutcome {
    #[must_use]
    pub const fn is_ignored(self) -> bool {
        matches!(self, SelectOutcome::Ignored(_))
    }
}

/// Result of committing a matched pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchProgress {
    /// More pairs remain; back in `SelectCards`.
    Continue,
    /// Last pair matched; call `finish`.
    Complete,
}

/// Turn and scoring state for one game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnEngine {
    mode: TurnMode,
    players: PlayerMap<Player>,
    current: PlayerId,
    buffer: SelectionBuffer,
    phase: Phase,
    matched_total: usize,
    card_total: usize,
    winner: Winner,
}

impl TurnEngine {
    /// Create an engine for a deck of `card_total` cards.
    ///
    /// Player 1 starts. `containers` must hold one entry per player of `mode`.
    #[must_use]
    pub fn new(mode: TurnMode, containers: &PlayerMap<ContainerRef>, card_total: usize) -> Self {
        assert_eq!(
            containers.player_count(),
            mode.player_count(),
            "One container per player required"
        );
        assert!(
            card_total > 0 && card_total % 2 == 0,
            "Deck size must be a positive even number, got {}",
            card_total
        );

        Self {
            mode,
            players: PlayerMap::new(mode.player_count(), |p| Player::new(p, *containers.get(p))),
            current: PlayerId::ONE,
            buffer: SelectionBuffer::new(),
            phase: Phase::SelectCards,
            matched_total: 0,
            card_total,
            winner: Winner::Undetermined,
        }
    }

    // === Accessors ===

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The player permitted to select.
    #[must_use]
    pub fn current_player(&self) -> PlayerId {
        self.current
    }

    #[must_use]
    pub fn is_current(&self, player: PlayerId) -> bool {
        self.current == player
    }

    #[must_use]
    pub fn players(&self) -> &PlayerMap<Player> {
        &self.players
    }

    /// A player's score. Zero for a player that does not exist in this mode.
    #[must_use]
    pub fn score(&self, player: PlayerId) -> u32 {
        if self.players.contains(player) {
            self.players[player].score
        } else {
            0
        }
    }

    #[must_use]
    pub fn matched_total(&self) -> usize {
        self.matched_total
    }

    #[must_use]
    pub fn card_total(&self) -> usize {
        self.card_total
    }

    #[must_use]
    pub fn winner(&self) -> Winner {
        self.winner
    }

    #[must_use]
    pub fn buffer(&self) -> &SelectionBuffer {
        &self.buffer
    }

    /// Every card has been matched.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.matched_total == self.card_total
    }

    // === Selection ===

    /// Handle "`player` selected card `self_id`".
    ///
    /// Recoverable problems (wrong phase, wrong player, matched or already
    /// selected card, self id 0) return `Ignored` with no state change.
    ///
    /// ## Panics
    ///
    /// If `self_id` is past the end of the deck, or the deck is not the
    /// size this engine was created for. Both mean a collaborator broke its
    /// contract.
    pub fn request_select(
        &mut self,
        deck: &mut Deck,
        self_id: SelfId,
        player: PlayerId,
        observer: &mut impl TurnObserver,
    ) -> SelectOutcome {
        self.check_deck(deck);

        if let Err(reason) = self.validate(deck, self_id, player) {
            debug!(%self_id, %player, ?reason, phase = ?self.phase, "selection ignored");
            return SelectOutcome::Ignored(reason);
        }

        card_mut(deck, self_id).toggle_face(Some(true));
        let added = self.buffer.try_add(self_id);
        assert!(added, "selection buffer rejected {} in SelectCards", self_id);
        debug!(%self_id, %player, pending = self.buffer.count(), "card revealed");
        observer.notify(SessionEvent::CardRevealed {
            card: self_id,
            player,
        });

        if !self.buffer.is_full() {
            return SelectOutcome::Revealed;
        }

        self.set_phase(Phase::CheckCards, observer);
        SelectOutcome::PairReady(self.pending_resolution(deck))
    }

    fn validate(&self, deck: &Deck, self_id: SelfId, player: PlayerId) -> Result<(), IgnoreReason> {
        if self.phase != Phase::SelectCards {
            return Err(IgnoreReason::WrongPhase);
        }
        if !self.players.contains(player) || !self.is_current(player) {
            return Err(IgnoreReason::NotYourTurn);
        }
        if self_id.index().is_none() {
            return Err(IgnoreReason::UnknownCard);
        }
        if card(deck, self_id).is_matched() {
            return Err(IgnoreReason::AlreadyMatched);
        }
        if self.buffer.contains(self_id) {
            return Err(IgnoreReason::AlreadySelected);
        }
        Ok(())
    }

    // === Resolution ===

    /// Compare the two buffered cards.
    ///
    /// ## Panics
    ///
    /// Outside `CheckCards`, or with fewer than two buffered cards.
    #[must_use]
    pub fn pending_resolution(&self, deck: &Deck) -> PairResolution {
        assert_eq!(self.phase, Phase::CheckCards, "No pair is being checked");
        let Some((first, second)) = self.buffer.pair() else {
            panic!(
                "Resolution needs two selected cards, have {}",
                self.buffer.count()
            );
        };

        if card(deck, first).identity() == card(deck, second).identity() {
            PairResolution::Match { first, second }
        } else {
            PairResolution::Mismatch { first, second }
        }
    }

    /// Award the buffered pair to the current player.
    ///
    /// The turn does not pass. Returns `Complete` when this was the last
    /// pair; the engine then stays in `CheckCards` until `finish`.
    pub fn commit_match(&mut self, deck: &mut Deck, observer: &mut impl TurnObserver) -> MatchProgress {
        self.check_deck(deck);
        let PairResolution::Match { first, second } = self.pending_resolution(deck) else {
            panic!("commit_match called on a mismatched pair");
        };

        let player = self.current;
        let destination = self.players[player].container;
        card_mut(deck, first).set_matched(destination);
        card_mut(deck, second).set_matched(destination);

        self.matched_total += 2;
        self.players[player].score += POINTS_PER_PAIR;
        assert!(
            self.matched_total <= self.card_total,
            "Matched {} of {} cards",
            self.matched_total,
            self.card_total
        );

        info!(
            %player,
            %first,
            %second,
            score = self.players[player].score,
            matched = self.matched_total,
            total = self.card_total,
            "pair matched"
        );
        observer.notify(SessionEvent::PairMatched {
            first,
            second,
            player,
            destination,
        });

        if self.is_complete() {
            return MatchProgress::Complete;
        }

        self.buffer.clear();
        self.set_phase(Phase::SelectCards, observer);
        MatchProgress::Continue
    }

    /// Evaluate the winner and enter `End`. Runs once, after the last match.
    pub fn finish(&mut self, observer: &mut impl TurnObserver) -> Winner {
        assert!(
            self.phase == Phase::CheckCards && self.is_complete(),
            "finish called before the last pair was matched (phase {:?}, matched {}/{})",
            self.phase,
            self.matched_total,
            self.card_total
        );

        let winner = match self.mode {
            TurnMode::TwoPlayer => evaluate(
                self.players[PlayerId::ONE].score,
                self.players[PlayerId::TWO].score,
            ),
            TurnMode::Solo => Winner::Player(PlayerId::ONE),
        };

        self.winner = winner;
        self.buffer.clear();
        self.set_phase(Phase::End, observer);
        info!(%winner, "game over");
        observer.game_over(winner);
        winner
    }

    /// Turn a mismatched pair face down.
    pub fn hide_mismatch(&mut self, deck: &mut Deck, observer: &mut impl TurnObserver) {
        self.check_deck(deck);
        let PairResolution::Mismatch { first, second } = self.pending_resolution(deck) else {
            panic!("hide_mismatch called on a matched pair");
        };

        card_mut(deck, first).toggle_face(Some(false));
        card_mut(deck, second).toggle_face(Some(false));

        debug!(%first, %second, player = %self.current, "pair hidden");
        observer.notify(SessionEvent::PairHidden { first, second });
    }

    /// After `hide_mismatch`: pass the turn (two-player mode), clear the
    /// buffer and go back to `SelectCards`.
    pub fn switch_turn(&mut self, deck: &Deck, observer: &mut impl TurnObserver) {
        let (first, second) = self.pending_resolution(deck).cards();
        assert!(
            !card(deck, first).is_face_up() && !card(deck, second).is_face_up(),
            "switch_turn called before the mismatched pair was hidden"
        );

        if self.mode.switches_turns() {
            self.current = self.current.opponent();
            info!(player = %self.current, "turn passes");
            observer.turn_changed(self.current);
        }

        self.buffer.clear();
        self.set_phase(Phase::SelectCards, observer);
    }

    /// Run the whole resolution with no delays.
    ///
    /// Returns the winner if this pair ended the game.
    pub fn resolve_immediately(&mut self, deck: &mut Deck, observer: &mut impl TurnObserver) -> Option<Winner> {
        if self.pending_resolution(deck).is_match() {
            match self.commit_match(deck, observer) {
                MatchProgress::Complete => Some(self.finish(observer)),
                MatchProgress::Continue => None,
            }
        } else {
            self.hide_mismatch(deck, observer);
            self.switch_turn(deck, observer);
            None
        }
    }

    fn set_phase(&mut self, phase: Phase, observer: &mut impl TurnObserver) {
        self.phase = phase;
        observer.phase_changed(phase);
    }

    fn check_deck(&self, deck: &Deck) {
        assert_eq!(
            deck.len(),
            self.card_total,
            "Deck has {} cards, engine expects {}",
            deck.len(),
            self.card_total
        );
    }
}

fn card(deck: &Deck, self_id: SelfId) -> &Card {
    let len = deck.len();
    deck.get(self_id)
        .unwrap_or_else(|| panic!("Self id {} out of range for a deck of {} cards", self_id, len))
}

fn card_mut(deck: &mut Deck, self_id: SelfId) -> &mut Card {
    let len = deck.len();
    deck.get_mut(self_id)
        .unwrap_or_else(|| panic!("Self id {} out of range for a deck of {} cards", self_id, len))
}
