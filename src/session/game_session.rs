//! The game session: owns the players and engine for one table and wires
//! selection input, timed resolution and listeners together.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

use super::resolution::run_resolution;
use super::snapshot::SessionSnapshot;
use crate::cards::{Deck, SelfId};
use crate::core::error::NetResult;
use crate::core::{PlayerId, SessionConfig};
use crate::events::{dispatch_to, EventHub, SessionEvent, SubscriptionId};
use crate::net::{SelectionMessage, SelectionSink};
use crate::rules::{IgnoreReason, Phase, SelectOutcome, TurnEngine, Winner};

/// Where local selections go.
#[derive(Clone)]
enum Route {
    /// Straight into the local engine.
    Offline,
    /// Out through the transport; the echo comes back via `receive_remote`.
    Online(Arc<dyn SelectionSink>),
}

/// Deck and engine of the game currently on the table.
#[derive(Debug)]
pub(super) struct ActiveGame {
    pub(super) deck: Deck,
    pub(super) engine: TurnEngine,
}

#[derive(Debug, Default)]
struct SessionState {
    /// Bumped by `start` and `teardown`. Resolution steps carry the value
    /// they were spawned under and do nothing if it has moved on.
    generation: u64,
    game: Option<ActiveGame>,
}

/// Events waiting for delivery, in the order the engine raised them.
///
/// Events are queued while the state lock is held, so queue order is
/// mutation order. One caller at a time drains the queue; anyone who
/// queues events while a drain is running leaves them to that drainer.
#[derive(Debug, Default)]
struct Outbox {
    queue: VecDeque<SessionEvent>,
    draining: bool,
}

/// Clears the draining flag if a listener panics mid-drain.
struct DrainGuard<'a>(&'a Mutex<Outbox>);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            lock(self.0).draining = false;
        }
    }
}

/// State shared between the session handle and its resolution tasks.
///
/// Lock order: `state`, then `outbox`. `hub` is never held together with
/// either of them.
#[derive(Debug, Default)]
pub(super) struct Shared {
    state: Mutex<SessionState>,
    outbox: Mutex<Outbox>,
    hub: Mutex<EventHub>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Shared {
    /// Run one resolution step if `generation` is still current.
    ///
    /// Events raised by `step` go to listeners after the state lock is
    /// released. Returns `None` when the step was discarded.
    pub(super) fn step<R>(
        &self,
        generation: u64,
        step: impl FnOnce(&mut ActiveGame, &mut Vec<SessionEvent>) -> R,
    ) -> Option<R> {
        let result = {
            let mut state = lock(&self.state);
            if state.generation != generation {
                debug!(
                    step_generation = generation,
                    session_generation = state.generation,
                    "stale resolution step discarded"
                );
                return None;
            }
            let game = state.game.as_mut()?;
            let mut events: Vec<SessionEvent> = Vec::new();
            let result = step(game, &mut events);
            self.enqueue(events);
            result
        };
        self.flush();
        Some(result)
    }

    /// Queue events for delivery. Call with the state lock held.
    fn enqueue(&self, events: Vec<SessionEvent>) {
        if !events.is_empty() {
            lock(&self.outbox).queue.extend(events);
        }
    }

    /// Deliver queued events unless another caller is already doing so.
    ///
    /// Must not be called with the state lock held: listeners may call back
    /// into the session.
    fn flush(&self) {
        {
            let mut outbox = lock(&self.outbox);
            if outbox.draining || outbox.queue.is_empty() {
                return;
            }
            outbox.draining = true;
        }
        let _guard = DrainGuard(&self.outbox);

        loop {
            let batch: Vec<SessionEvent> = {
                let mut outbox = lock(&self.outbox);
                if outbox.queue.is_empty() {
                    outbox.draining = false;
                    return;
                }
                outbox.queue.drain(..).collect()
            };

            let subscribers = lock(&self.hub).snapshot();
            trace!(events = batch.len(), subscribers = subscribers.len(), "dispatching");
            let closed = dispatch_to(&subscribers, &batch);
            if !closed.is_empty() {
                let mut hub = lock(&self.hub);
                for id in closed {
                    debug!(%id, "channel receiver dropped, unsubscribing");
                    hub.unsubscribe(id);
                }
            }
        }
    }
}

/// Handle to a game session.
///
/// Cloning the handle shares the session; hand clones to the presentation
/// and network layers instead of reaching for a global.
///
/// Selections that complete a pair spawn the resolution on the current
/// tokio runtime, so `request_select` and friends must be called from
/// within one.
#[derive(Clone)]
pub struct GameSession {
    config: SessionConfig,
    route: Route,
    shared: Arc<Shared>,
}

impl GameSession {
    /// Offline session: local selections go straight to the engine.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            route: Route::Offline,
            shared: Arc::new(Shared::default()),
        }
    }

    /// Online session: local selections are sent through `sink` and only
    /// applied when they come back through `receive_remote`.
    #[must_use]
    pub fn online(config: SessionConfig, sink: Arc<dyn SelectionSink>) -> Self {
        Self {
            config,
            route: Route::Online(sink),
            shared: Arc::new(Shared::default()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn is_online(&self) -> bool {
        matches!(self.route, Route::Online(_))
    }

    // === Lifecycle ===

    /// Put a deck on the table and create the players. Player 1 starts.
    ///
    /// Replaces any running game; a resolution still pending for the old
    /// game is discarded.
    pub fn start(&self, mut deck: Deck) {
        deck.reset();
        let engine = TurnEngine::new(self.config.mode, &self.config.container_map(), deck.len());
        let first = engine.current_player();

        let generation = {
            let mut state = lock(&self.shared.state);
            state.generation += 1;
            state.game = Some(ActiveGame { deck, engine });
            self.shared.enqueue(vec![
                SessionEvent::PhaseChanged(Phase::SelectCards),
                SessionEvent::TurnChanged(first),
            ]);
            state.generation
        };

        info!(generation, mode = ?self.config.mode, "session started");
        self.shared.flush();
    }

    /// Release the players and the game.
    ///
    /// Matched total and selection buffer go with the engine. A resolution
    /// suspended in a delay wakes up, sees the generation has moved and
    /// stops without touching anything. Listeners stay registered.
    pub fn teardown(&self) {
        let mut state = lock(&self.shared.state);
        state.generation += 1;
        state.game = None;
        info!(generation = state.generation, "session torn down");
    }

    /// Is a game on the table?
    #[must_use]
    pub fn is_active(&self) -> bool {
        lock(&self.shared.state).game.is_some()
    }

    /// Wait for the in-flight resolution, if any, to run to completion.
    ///
    /// A panic inside the resolution (a broken collaborator contract) is
    /// re-raised here.
    pub async fn settle(&self) {
        loop {
            let handle = lock(&self.shared.pending).take();
            let Some(handle) = handle else {
                return;
            };
            if let Err(err) = handle.await {
                if err.is_panic() {
                    std::panic::resume_unwind(err.into_panic());
                }
            }
        }
    }

    // === Input ===

    /// Feed a selection into the engine.
    ///
    /// This is the entry point for both local offline input and messages
    /// received from a peer.
    pub fn request_select(&self, self_id: SelfId, player: PlayerId) -> SelectOutcome {
        let (outcome, generation) = {
            let mut state = lock(&self.shared.state);
            let generation = state.generation;
            let Some(game) = state.game.as_mut() else {
                debug!(%self_id, %player, "selection ignored, no game running");
                return SelectOutcome::Ignored(IgnoreReason::NotStarted);
            };
            let mut events: Vec<SessionEvent> = Vec::new();
            let outcome = game
                .engine
                .request_select(&mut game.deck, self_id, player, &mut events);
            self.shared.enqueue(events);
            (outcome, generation)
        };
        self.shared.flush();

        if let SelectOutcome::PairReady(resolution) = outcome {
            let task = tokio::spawn(run_resolution(
                Arc::clone(&self.shared),
                generation,
                self.config.timings,
                resolution,
            ));
            *lock(&self.shared.pending) = Some(task);
        }

        outcome
    }

    /// A local player clicked a card.
    ///
    /// Offline this is `request_select`. Online the selection is only sent
    /// to the transport and `Forwarded` is returned; nothing changes
    /// locally until the message comes back.
    pub fn select_local(&self, self_id: SelfId, player: PlayerId) -> NetResult<SelectOutcome> {
        match &self.route {
            Route::Offline => Ok(self.request_select(self_id, player)),
            Route::Online(sink) => {
                sink.send_selection(&SelectionMessage::new(self_id, player))?;
                debug!(%self_id, %player, "selection forwarded");
                Ok(SelectOutcome::Forwarded)
            }
        }
    }

    /// Apply an encoded selection received from the transport.
    pub fn receive_remote(&self, bytes: &[u8]) -> NetResult<SelectOutcome> {
        let message = SelectionMessage::decode(bytes)?;
        Ok(self.receive_message(message))
    }

    /// Apply an already decoded selection received from the transport.
    pub fn receive_message(&self, message: SelectionMessage) -> SelectOutcome {
        self.request_select(message.self_id, message.player)
    }

    // === Listeners ===

    /// Register a callback for session events.
    ///
    /// Events arrive in the order the engine raised them, one at a time,
    /// with no session lock held, so callbacks may call back into the
    /// session. A callback runs on whichever thread is draining the event
    /// queue and may see state newer than the event it is handling.
    pub fn subscribe(&self, listener: impl Fn(&SessionEvent) + Send + Sync + 'static) -> SubscriptionId {
        lock(&self.shared.hub).subscribe(listener)
    }

    /// Register a channel receiving every session event, in order.
    ///
    /// Dropping the receiver ends the subscription.
    pub fn subscribe_channel(&self) -> (SubscriptionId, UnboundedReceiver<SessionEvent>) {
        lock(&self.shared.hub).subscribe_channel()
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        lock(&self.shared.hub).unsubscribe(id)
    }

    // === Queries ===

    /// Current phase, `None` when no game is running.
    #[must_use]
    pub fn phase(&self) -> Option<Phase> {
        self.read(|game| game.engine.phase())
    }

    /// Player whose turn it is, `None` when no game is running.
    #[must_use]
    pub fn current_player(&self) -> Option<PlayerId> {
        self.read(|game| game.engine.current_player())
    }

    #[must_use]
    pub fn score(&self, player: PlayerId) -> u32 {
        self.read(|game| game.engine.score(player)).unwrap_or(0)
    }

    /// Matched cards across both players; 0 when no game is running.
    #[must_use]
    pub fn matched_total(&self) -> usize {
        self.read(|game| game.engine.matched_total()).unwrap_or(0)
    }

    #[must_use]
    pub fn winner(&self) -> Winner {
        self.read(|game| game.engine.winner())
            .unwrap_or(Winner::Undetermined)
    }

    /// Full view of the running game.
    #[must_use]
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.read(|game| {
            let engine = &game.engine;
            SessionSnapshot {
                phase: engine.phase(),
                current_player: engine.current_player(),
                players: engine.players().clone(),
                matched_total: engine.matched_total(),
                card_total: engine.card_total(),
                winner: engine.winner(),
                selected: engine.buffer().as_slice().to_vec(),
                cards: game.deck.cards(),
            }
        })
    }

    fn read<R>(&self, f: impl FnOnce(&ActiveGame) -> R) -> Option<R> {
        lock(&self.shared.state).game.as_ref().map(f)
    }
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("mode", &self.config.mode)
            .field("online", &self.is_online())
            .field("phase", &self.phase())
            .finish()
    }
}

/// Lock, ignoring poisoning.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
