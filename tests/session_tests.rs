//! Game session tests.
//!
//! Most of these run on a paused tokio clock, so resolution delays elapse
//! only when the test lets them:
//! - Timed match and mismatch resolution
//! - Teardown and restart while a resolution is sleeping
//! - Listener delivery and unsubscribe
//! - Online routing through a loopback transport
//! - Event order on a multi-thread runtime

use std::sync::{Arc, Mutex};
use std::time::Duration;

use memory_match::cards::{Deck, SelfId};
use memory_match::core::{NetError, PlayerId, ResolutionTimings, SessionConfig};
use memory_match::events::SessionEvent;
use memory_match::net::{ChannelSink, SelectionMessage, SelectionSink};
use memory_match::rules::{IgnoreReason, Phase, SelectOutcome, Winner};
use memory_match::session::GameSession;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio::task::yield_now;
use tokio::time::advance;

/// `[A, B, A, B]` at self ids 1..=4.
fn abab() -> Deck {
    Deck::pairs(2).unwrap()
}

fn select(session: &GameSession, id: u32, player: PlayerId) -> SelectOutcome {
    session.request_select(SelfId::new(id), player)
}

/// Let spawned tasks run until they block on a timer.
async fn run_pending() {
    for _ in 0..8 {
        yield_now().await;
    }
}

fn drain(rx: &mut UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// A match stays face up for the reveal delay, then scores.
#[tokio::test(start_paused = true)]
async fn test_match_waits_for_reveal_delay() {
    let session = GameSession::new(SessionConfig::default());
    session.start(abab());

    assert_eq!(select(&session, 1, PlayerId::ONE), SelectOutcome::Revealed);
    assert!(matches!(select(&session, 3, PlayerId::ONE), SelectOutcome::PairReady(_)));
    assert_eq!(session.phase(), Some(Phase::CheckCards));
    run_pending().await;

    advance(Duration::from_millis(449)).await;
    run_pending().await;
    assert_eq!(session.phase(), Some(Phase::CheckCards));
    assert_eq!(session.score(PlayerId::ONE), 0);

    advance(Duration::from_millis(1)).await;
    run_pending().await;
    assert_eq!(session.phase(), Some(Phase::SelectCards));
    assert_eq!(session.score(PlayerId::ONE), 2);
    assert_eq!(session.matched_total(), 2);
    assert_eq!(session.current_player(), Some(PlayerId::ONE));
}

/// A mismatch hides after its delay, then passes the turn after another.
#[tokio::test(start_paused = true)]
async fn test_mismatch_hides_then_switches() {
    let session = GameSession::new(SessionConfig::default());
    session.start(abab());

    select(&session, 1, PlayerId::ONE);
    select(&session, 2, PlayerId::ONE);
    run_pending().await;

    advance(Duration::from_millis(500)).await;
    run_pending().await;
    let snapshot = session.snapshot().unwrap();
    assert!(!snapshot.card(SelfId::new(1)).unwrap().is_face_up());
    assert!(!snapshot.card(SelfId::new(2)).unwrap().is_face_up());
    assert_eq!(snapshot.phase, Phase::CheckCards);
    assert_eq!(snapshot.current_player, PlayerId::ONE);

    advance(Duration::from_millis(300)).await;
    run_pending().await;
    assert_eq!(session.phase(), Some(Phase::SelectCards));
    assert_eq!(session.current_player(), Some(PlayerId::TWO));
    assert!(session.snapshot().unwrap().selected.is_empty());
}

/// Input during a check changes nothing.
#[tokio::test(start_paused = true)]
async fn test_selection_during_check_ignored() {
    let session = GameSession::new(SessionConfig::default());
    session.start(abab());

    select(&session, 1, PlayerId::ONE);
    select(&session, 2, PlayerId::ONE);
    let before = session.snapshot().unwrap();

    assert_eq!(
        select(&session, 3, PlayerId::ONE),
        SelectOutcome::Ignored(IgnoreReason::WrongPhase)
    );
    assert_eq!(session.snapshot().unwrap(), before);
    session.settle().await;
}

/// A full game ends with exactly one game-over event.
#[tokio::test(start_paused = true)]
async fn test_full_game_events() {
    let session = GameSession::new(SessionConfig::default());
    let (_id, mut rx) = session.subscribe_channel();
    session.start(abab());

    select(&session, 1, PlayerId::ONE);
    select(&session, 3, PlayerId::ONE);
    session.settle().await;
    select(&session, 2, PlayerId::ONE);
    select(&session, 4, PlayerId::ONE);
    session.settle().await;

    assert_eq!(session.phase(), Some(Phase::End));
    assert_eq!(session.winner(), Winner::Player(PlayerId::ONE));
    assert_eq!(session.winner().number(), 1);

    let events = drain(&mut rx);
    assert_eq!(
        &events[..2],
        &[
            SessionEvent::PhaseChanged(Phase::SelectCards),
            SessionEvent::TurnChanged(PlayerId::ONE),
        ]
    );
    let game_overs: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, SessionEvent::GameOver(_)))
        .collect();
    assert_eq!(game_overs, [&SessionEvent::GameOver(Winner::Player(PlayerId::ONE))]);
    assert_eq!(events.last(), Some(&SessionEvent::GameOver(Winner::Player(PlayerId::ONE))));

    // Input after the end is ignored.
    assert_eq!(
        select(&session, 1, PlayerId::ONE),
        SelectOutcome::Ignored(IgnoreReason::WrongPhase)
    );
}

/// The game-over announcement waits for its own delay.
#[tokio::test(start_paused = true)]
async fn test_game_over_delay() {
    let session = GameSession::new(SessionConfig::default());
    session.start(Deck::pairs(1).unwrap());

    select(&session, 1, PlayerId::ONE);
    select(&session, 2, PlayerId::ONE);
    run_pending().await;

    advance(Duration::from_millis(450)).await;
    run_pending().await;
    assert_eq!(session.matched_total(), 2);
    assert_eq!(session.phase(), Some(Phase::CheckCards));
    assert_eq!(session.winner(), Winner::Undetermined);

    advance(Duration::from_millis(500)).await;
    run_pending().await;
    assert_eq!(session.phase(), Some(Phase::End));
    assert_eq!(session.winner(), Winner::Player(PlayerId::ONE));
}

/// Teardown while a resolution sleeps: the late step does nothing.
#[tokio::test(start_paused = true)]
async fn test_teardown_during_resolution() {
    let session = GameSession::new(SessionConfig::default());
    let (_id, mut rx) = session.subscribe_channel();
    session.start(abab());

    select(&session, 1, PlayerId::ONE);
    select(&session, 2, PlayerId::ONE);
    run_pending().await;
    advance(Duration::from_millis(100)).await;

    session.teardown();
    drain(&mut rx);
    session.settle().await;

    assert!(!session.is_active());
    assert_eq!(session.phase(), None);
    assert_eq!(session.matched_total(), 0);
    assert!(session.snapshot().is_none());
    assert!(drain(&mut rx).is_empty());
    assert_eq!(
        select(&session, 3, PlayerId::ONE),
        SelectOutcome::Ignored(IgnoreReason::NotStarted)
    );
}

/// Restarting before a stale step fires: the new game is left alone.
#[tokio::test(start_paused = true)]
async fn test_restart_discards_stale_resolution() {
    let session = GameSession::new(SessionConfig::default());
    session.start(abab());

    select(&session, 1, PlayerId::ONE);
    select(&session, 2, PlayerId::ONE);
    run_pending().await;

    session.start(abab());
    assert_eq!(select(&session, 4, PlayerId::ONE), SelectOutcome::Revealed);
    advance(Duration::from_secs(2)).await;
    run_pending().await;

    let snapshot = session.snapshot().unwrap();
    assert_eq!(snapshot.phase, Phase::SelectCards);
    assert_eq!(snapshot.current_player, PlayerId::ONE);
    assert_eq!(snapshot.selected, vec![SelfId::new(4)]);
    assert!(snapshot.card(SelfId::new(4)).unwrap().is_face_up());
    assert!(!snapshot.card(SelfId::new(1)).unwrap().is_face_up());
}

/// Restarting resets cards that were matched in the previous game.
#[tokio::test(start_paused = true)]
async fn test_start_resets_deck() {
    let session = GameSession::new(SessionConfig::default().with_timings(ResolutionTimings::instant()));
    session.start(abab());
    select(&session, 1, PlayerId::ONE);
    select(&session, 3, PlayerId::ONE);
    session.settle().await;

    let cards = session.snapshot().unwrap().cards;
    let deck = Deck::from_cards(cards).unwrap();
    assert_eq!(deck.matched_count(), 2);

    session.start(deck);
    let snapshot = session.snapshot().unwrap();
    assert_eq!(snapshot.matched_total, 0);
    assert!(snapshot.cards.iter().all(|c| !c.is_matched() && !c.is_face_up()));
    assert_eq!(session.score(PlayerId::ONE), 0);
}

/// Callbacks see events in order and stop after unsubscribing.
#[tokio::test(start_paused = true)]
async fn test_subscribe_and_unsubscribe() {
    let session = GameSession::new(SessionConfig::default());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let id = session.subscribe(move |event| sink.lock().unwrap().push(event.clone()));

    session.start(abab());
    select(&session, 1, PlayerId::ONE);
    assert_eq!(
        seen.lock().unwrap().last(),
        Some(&SessionEvent::CardRevealed {
            card: SelfId::new(1),
            player: PlayerId::ONE,
        })
    );

    assert!(session.unsubscribe(id));
    assert!(!session.unsubscribe(id));
    let count = seen.lock().unwrap().len();
    select(&session, 2, PlayerId::ONE);
    session.settle().await;
    assert_eq!(seen.lock().unwrap().len(), count);
}

/// Listeners may query the session from inside a callback, and see the
/// state the event describes.
#[tokio::test(start_paused = true)]
async fn test_listener_can_read_session() {
    let session = GameSession::new(SessionConfig::default());
    let turns = Arc::new(Mutex::new(Vec::new()));
    let reader = session.clone();
    let out = Arc::clone(&turns);
    session.subscribe(move |event| {
        if let SessionEvent::TurnChanged(player) = event {
            out.lock().unwrap().push((*player, reader.current_player()));
        }
    });

    session.start(abab());
    select(&session, 1, PlayerId::ONE);
    select(&session, 2, PlayerId::ONE);
    session.settle().await;

    assert_eq!(
        *turns.lock().unwrap(),
        vec![
            (PlayerId::ONE, Some(PlayerId::ONE)),
            (PlayerId::TWO, Some(PlayerId::TWO)),
        ]
    );
}

/// Solo sessions keep the turn through a mismatch.
#[tokio::test(start_paused = true)]
async fn test_solo_session() {
    let session = GameSession::new(SessionConfig::solo().with_timings(ResolutionTimings::instant()));
    session.start(abab());

    select(&session, 1, PlayerId::ONE);
    select(&session, 2, PlayerId::ONE);
    session.settle().await;
    assert_eq!(session.current_player(), Some(PlayerId::ONE));
    assert_eq!(
        select(&session, 1, PlayerId::TWO),
        SelectOutcome::Ignored(IgnoreReason::NotYourTurn)
    );

    for (a, b) in [(1, 3), (2, 4)] {
        select(&session, a, PlayerId::ONE);
        select(&session, b, PlayerId::ONE);
        session.settle().await;
    }
    assert_eq!(session.winner(), Winner::Player(PlayerId::ONE));
    assert_eq!(session.score(PlayerId::ONE), 4);
}

// =============================================================================
// Online routing
// =============================================================================

/// Online local input goes to the transport and changes nothing locally.
#[tokio::test(start_paused = true)]
async fn test_online_select_forwards_only() {
    let (tx, mut wire) = unbounded_channel();
    let session = GameSession::online(SessionConfig::default(), Arc::new(ChannelSink::new(tx)));
    session.start(abab());
    let before = session.snapshot().unwrap();

    let outcome = session.select_local(SelfId::new(1), PlayerId::ONE).unwrap();
    assert_eq!(outcome, SelectOutcome::Forwarded);
    assert_eq!(session.snapshot().unwrap(), before);

    let bytes = wire.try_recv().unwrap();
    assert_eq!(
        SelectionMessage::decode(&bytes).unwrap(),
        SelectionMessage::new(SelfId::new(1), PlayerId::ONE)
    );

    // The echo is what applies it.
    assert_eq!(session.receive_remote(&bytes).unwrap(), SelectOutcome::Revealed);
    assert!(session.snapshot().unwrap().card(SelfId::new(1)).unwrap().is_face_up());
}

/// Both peers apply the same messages and end in the same state.
#[tokio::test(start_paused = true)]
async fn test_two_peers_stay_in_step() {
    let (tx, mut wire) = unbounded_channel();
    let config = SessionConfig::default().with_timings(ResolutionTimings::instant());
    let host = GameSession::online(config.clone(), Arc::new(ChannelSink::new(tx.clone())));
    let guest = GameSession::online(config, Arc::new(ChannelSink::new(tx)));
    host.start(abab());
    guest.start(abab());

    let moves = [
        (&host, 1, PlayerId::ONE),
        (&host, 2, PlayerId::ONE),
        (&guest, 1, PlayerId::TWO),
        (&guest, 3, PlayerId::TWO),
    ];
    for (peer, id, player) in moves {
        peer.select_local(SelfId::new(id), player).unwrap();
        let bytes = wire.recv().await.unwrap();
        host.receive_remote(&bytes).unwrap();
        guest.receive_remote(&bytes).unwrap();
        host.settle().await;
        guest.settle().await;
    }

    assert_eq!(host.snapshot(), guest.snapshot());
    assert_eq!(host.score(PlayerId::TWO), 2);
    assert_eq!(host.current_player(), Some(PlayerId::TWO));
}

/// Bad bytes are an error, not a panic.
#[tokio::test(start_paused = true)]
async fn test_receive_remote_rejects_garbage() {
    let session = GameSession::new(SessionConfig::default());
    session.start(abab());

    assert!(session.receive_remote(&[1]).is_err());

    let mut bytes = SelectionMessage::new(SelfId::new(1), PlayerId::ONE).encode().unwrap();
    *bytes.last_mut().unwrap() = 9;
    assert!(matches!(session.receive_remote(&bytes), Err(NetError::InvalidPlayer(9))));
    assert!(session.snapshot().unwrap().selected.is_empty());
}

/// A sink that always fails.
struct Offline;

impl SelectionSink for Offline {
    fn send_selection(&self, _message: &SelectionMessage) -> Result<(), NetError> {
        Err(NetError::Transport("not connected".to_string()))
    }
}

/// Transport failures surface from `select_local`.
#[tokio::test(start_paused = true)]
async fn test_sink_error_propagates() {
    let session = GameSession::online(SessionConfig::default(), Arc::new(Offline));
    session.start(abab());

    let err = session.select_local(SelfId::new(1), PlayerId::ONE).unwrap_err();
    assert!(matches!(err, NetError::Transport(_)));
    assert!(session.snapshot().unwrap().selected.is_empty());
}

// =============================================================================
// Event ordering
// =============================================================================

/// Events of a matched pair, from start to the return to `SelectCards`.
fn matched_pair_events() -> Vec<SessionEvent> {
    vec![
        SessionEvent::PhaseChanged(Phase::SelectCards),
        SessionEvent::TurnChanged(PlayerId::ONE),
        SessionEvent::CardRevealed {
            card: SelfId::new(1),
            player: PlayerId::ONE,
        },
        SessionEvent::CardRevealed {
            card: SelfId::new(3),
            player: PlayerId::ONE,
        },
        SessionEvent::PhaseChanged(Phase::CheckCards),
        SessionEvent::PairMatched {
            first: SelfId::new(1),
            second: SelfId::new(3),
            player: PlayerId::ONE,
            destination: SessionConfig::default().containers[0],
        },
        SessionEvent::PhaseChanged(Phase::SelectCards),
    ]
}

/// With resolution racing the caller on other workers, listeners still
/// get events in the order the engine raised them.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_event_order_on_multi_thread_runtime() {
    for _ in 0..500 {
        let session = GameSession::new(SessionConfig::default().with_timings(ResolutionTimings::instant()));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        session.subscribe(move |event| sink.lock().unwrap().push(event.clone()));

        session.start(abab());
        select(&session, 1, PlayerId::ONE);
        select(&session, 3, PlayerId::ONE);
        session.settle().await;

        let seen = seen.lock().unwrap();
        assert_eq!(*seen, matched_pair_events());
        let last_phase = seen.iter().rev().find_map(|e| match e {
            SessionEvent::PhaseChanged(phase) => Some(*phase),
            _ => None,
        });
        assert_eq!(last_phase, session.phase());
    }
}

/// Channel subscribers see the same order on a multi-thread runtime.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_channel_order_on_multi_thread_runtime() {
    for _ in 0..500 {
        let session = GameSession::new(SessionConfig::default().with_timings(ResolutionTimings::instant()));
        let (_id, mut rx) = session.subscribe_channel();

        session.start(abab());
        select(&session, 1, PlayerId::ONE);
        select(&session, 3, PlayerId::ONE);
        session.settle().await;

        assert_eq!(drain(&mut rx), matched_pair_events());
    }
}

/// A callback that selects a card is not deadlocked, and the events it
/// causes are delivered after the one it is handling.
#[tokio::test(start_paused = true)]
async fn test_listener_can_select() {
    let session = GameSession::new(SessionConfig::default().with_timings(ResolutionTimings::instant()));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let player = session.clone();
    session.subscribe(move |event| {
        sink.lock().unwrap().push(event.clone());
        if let SessionEvent::CardRevealed { card, .. } = event {
            if *card == SelfId::new(1) {
                player.request_select(SelfId::new(3), PlayerId::ONE);
            }
        }
    });

    session.start(abab());
    select(&session, 1, PlayerId::ONE);
    session.settle().await;

    assert_eq!(*seen.lock().unwrap(), matched_pair_events());
    assert_eq!(session.score(PlayerId::ONE), 2);
}

/// Dropping a channel receiver ends its subscription.
#[tokio::test(start_paused = true)]
async fn test_dropped_channel_unsubscribes() {
    let session = GameSession::new(SessionConfig::default());
    let (id, rx) = session.subscribe_channel();
    drop(rx);

    session.start(abab());
    assert!(!session.unsubscribe(id));
}
