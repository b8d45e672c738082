//! Plays one seeded game between two bots with a shared memory of every
//! card they have seen.
//!
//! Usage: `memory_match_demo [seed] [pairs]`. Set `RUST_LOG=debug` to see
//! ignored selections and resolution steps.

use std::time::Duration;

use memory_match::cards::{Deck, MatchIdentity, SelfId};
use memory_match::core::{GameRng, PlayerId, ResolutionTimings, SessionConfig};
use memory_match::rules::Phase;
use memory_match::session::{GameSession, SessionSnapshot};
use rustc_hash::FxHashMap;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Cards seen face up and not yet matched.
#[derive(Default)]
struct Memory {
    seen: FxHashMap<SelfId, MatchIdentity>,
}

impl Memory {
    fn learn(&mut self, snapshot: &SessionSnapshot) {
        for card in snapshot.cards.iter() {
            if card.is_matched() {
                self.seen.remove(&card.self_id());
            } else if card.is_face_up() {
                self.seen.insert(card.self_id(), card.identity());
            }
        }
    }

    /// A remembered card with the same identity as `card`.
    fn partner_of(&self, card: SelfId, identity: MatchIdentity) -> Option<SelfId> {
        self.seen
            .iter()
            .find(|&(&id, &ident)| id != card && ident == identity)
            .map(|(&id, _)| id)
    }

    /// Any remembered pair.
    fn known_pair(&self) -> Option<(SelfId, SelfId)> {
        let mut ids: Vec<_> = self.seen.keys().copied().collect();
        ids.sort_unstable();
        ids.iter().find_map(|&id| {
            let partner = self.partner_of(id, self.seen[&id])?;
            Some((id, partner))
        })
    }
}

/// Prefer cards never seen; fall back to any unmatched card.
fn explore(snapshot: &SessionSnapshot, memory: &Memory, exclude: Option<SelfId>, rng: &mut GameRng) -> Option<SelfId> {
    let open: Vec<SelfId> = snapshot
        .cards
        .iter()
        .filter(|c| !c.is_matched() && Some(c.self_id()) != exclude)
        .map(|c| c.self_id())
        .collect();
    let unseen: Vec<SelfId> = open
        .iter()
        .copied()
        .filter(|id| !memory.seen.contains_key(id))
        .collect();

    rng.choose(if unseen.is_empty() { &open } else { &unseen }).copied()
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let seed: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(42);
    let pairs: u32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(8);

    let rng = GameRng::new(seed);
    let deck = match Deck::shuffled(pairs, &mut rng.for_context("deck")) {
        Ok(deck) => deck,
        Err(err) => {
            error!(%err, pairs, "cannot build deck");
            std::process::exit(1);
        }
    };

    let timings = ResolutionTimings {
        match_reveal: Duration::from_millis(45),
        mismatch_reveal: Duration::from_millis(50),
        turn_switch: Duration::from_millis(30),
        game_over: Duration::from_millis(50),
    };
    let session = GameSession::new(SessionConfig::default().with_timings(timings));
    let listener = session.subscribe(|event| info!(?event, "session event"));

    info!(seed, pairs, "starting game");
    session.start(deck);

    let mut bot_rng = rng.for_context("bots");
    let mut memory = Memory::default();

    while let Some(snapshot) = session.snapshot() {
        if snapshot.phase == Phase::End {
            break;
        }
        memory.learn(&snapshot);
        let player = snapshot.current_player;

        let (first, planned) = match memory.known_pair() {
            Some((a, b)) => (a, Some(b)),
            None => match explore(&snapshot, &memory, None, &mut bot_rng) {
                Some(id) => (id, None),
                None => break,
            },
        };
        let outcome = session.request_select(first, player);
        if outcome.is_ignored() {
            warn!(%first, %player, ?outcome, "bot picked a card it may not select");
            break;
        }

        let second = match planned {
            Some(id) => Some(id),
            None => session.snapshot().and_then(|snapshot| {
                memory.learn(&snapshot);
                let identity = snapshot.card(first)?.identity();
                memory
                    .partner_of(first, identity)
                    .or_else(|| explore(&snapshot, &memory, Some(first), &mut bot_rng))
            }),
        };
        if let Some(second) = second {
            session.request_select(second, player);
        }

        if let Some(snapshot) = session.snapshot() {
            memory.learn(&snapshot);
        }
        session.settle().await;
    }

    session.unsubscribe(listener);
    info!(
        winner = %session.winner(),
        player_one = session.score(PlayerId::ONE),
        player_two = session.score(PlayerId::TWO),
        "final score"
    );
    session.teardown();
}
