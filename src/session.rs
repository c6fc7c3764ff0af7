//! Runs a [`Game`] on timers: one task per ghost, one for the player, a
//! fire-and-forget fetch at start and per player tick, and a one-shot per
//! power pellet.
//!
//! All state sits behind one lock that is only held for the synchronous
//! part of a tick. Every run gets its own cancellation token; stopping
//! cancels it under the lock, and tasks check it under the lock before
//! touching anything, so nothing lands after a stop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::components::Direction;
use crate::config::TimingConfig;
use crate::game::{Game, Outcome, Snapshot, TickOutcome};
use crate::remote::{PredictionSource, VideoFeed};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Started,
    Stopped(Option<Outcome>),
}

pub struct Session {
    shared: Arc<Shared>,
}

struct Shared {
    state: Mutex<Inner>,
    source: Arc<dyn PredictionSource>,
    feed: Arc<dyn VideoFeed>,
    hint: watch::Sender<Option<Direction>>,
    polls: AtomicU64,
    player_tick: Duration,
    scared_for: Duration,
}

struct Inner {
    game: Game,
    token: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
    /// Sequence number of the poll whose answer is in `hint`.
    hint_seq: u64,
}

impl Session {
    pub fn new(
        game: Game,
        source: Arc<dyn PredictionSource>,
        feed: Arc<dyn VideoFeed>,
        timing: &TimingConfig,
    ) -> Self {
        let (hint, _) = watch::channel(None);
        let shared = Shared {
            state: Mutex::new(Inner {
                game,
                token: CancellationToken::new(),
                tasks: Vec::new(),
                hint_seq: 0,
            }),
            source,
            feed,
            hint,
            polls: AtomicU64::new(0),
            player_tick: timing.player_tick(),
            scared_for: timing.scared(),
        };
        Self {
            shared: Arc::new(shared),
        }
    }

    /// The single user action: start a fresh game, or stop the running one.
    /// Must be called from inside a tokio runtime.
    pub fn toggle(&self) -> Transition {
        let mut inner = self.shared.lock();
        if inner.game.is_running() {
            Transition::Stopped(self.shared.halt(&mut inner))
        } else {
            self.shared.launch(&mut inner);
            Transition::Started
        }
    }

    pub fn start(&self) -> bool {
        let mut inner = self.shared.lock();
        self.shared.launch(&mut inner)
    }

    pub fn stop(&self) -> Option<Outcome> {
        let mut inner = self.shared.lock();
        if !inner.game.is_running() {
            return None;
        }
        self.shared.halt(&mut inner)
    }

    pub fn is_running(&self) -> bool {
        self.shared.lock().game.is_running()
    }

    pub fn label(&self) -> &'static str {
        if self.is_running() {
            "RESTART"
        } else {
            "START GAME"
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.shared.lock().game.snapshot()
    }

    /// The latest prediction received during this run.
    pub fn hint(&self) -> Option<Direction> {
        *self.shared.hint.borrow()
    }

    pub fn with_game<R>(&self, f: impl FnOnce(&Game) -> R) -> R {
        f(&self.shared.lock().game)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let mut inner = self.shared.lock();
        cancel_tasks(&mut inner);
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn launch(self: &Arc<Self>, inner: &mut Inner) -> bool {
        if !inner.game.start() {
            return false;
        }
        let token = CancellationToken::new();
        inner.token = token.clone();
        inner.hint_seq = self.polls.load(Ordering::SeqCst);
        self.hint.send_replace(None);
        self.feed.start();

        let periods: Vec<Duration> = inner.game.ghosts().iter().map(|g| g.period()).collect();
        for (slot, period) in periods.into_iter().enumerate() {
            let handle = tokio::spawn(ghost_loop(self.clone(), token.clone(), slot, period));
            inner.tasks.push(handle);
        }
        let handle = tokio::spawn(player_loop(self.clone(), token));
        inner.tasks.push(handle);
        true
    }

    fn halt(&self, inner: &mut Inner) -> Option<Outcome> {
        self.wind_down(inner);
        inner.game.stop()
    }

    /// Everything a stop does besides resetting the game itself.
    fn wind_down(&self, inner: &mut Inner) {
        cancel_tasks(inner);
        self.feed.stop();
        self.hint.send_replace(None);
    }

    /// Returns whether the ghost should keep ticking.
    fn ghost_step(&self, token: &CancellationToken, slot: usize) -> bool {
        let mut inner = self.lock();
        if token.is_cancelled() {
            return false;
        }
        match inner.game.ghost_tick(slot) {
            TickOutcome::Continue | TickOutcome::Scared => true,
            TickOutcome::Idle => false,
            TickOutcome::Finished(_) => {
                self.wind_down(&mut inner);
                false
            }
        }
    }

    /// Returns whether the player should keep ticking.
    fn player_step(self: &Arc<Self>, token: &CancellationToken) -> bool {
        let hint = *self.hint.borrow();
        let mut inner = self.lock();
        if token.is_cancelled() {
            return false;
        }
        match inner.game.player_tick(hint) {
            TickOutcome::Continue => true,
            TickOutcome::Scared => {
                let handle = tokio::spawn(unscare_later(self.clone(), token.clone()));
                inner.tasks.push(handle);
                true
            }
            TickOutcome::Idle => false,
            TickOutcome::Finished(_) => {
                self.wind_down(&mut inner);
                false
            }
        }
    }

    /// Fires off a prediction fetch without waiting for it. A later poll's
    /// answer is never overwritten by an earlier one.
    fn poll_prediction(self: &Arc<Self>, token: &CancellationToken) {
        let seq = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
        let shared = self.clone();
        let token = token.clone();
        tokio::spawn(async move {
            let result = tokio::select! {
                _ = token.cancelled() => return,
                result = shared.source.fetch() => result,
            };
            match result {
                Ok(hint) => shared.store_hint(&token, seq, hint),
                Err(e) => warn!(error = %e, "prediction poll failed"),
            }
        });
    }

    fn store_hint(&self, token: &CancellationToken, seq: u64, hint: Option<Direction>) {
        let mut inner = self.lock();
        if token.is_cancelled() || seq <= inner.hint_seq {
            return;
        }
        inner.hint_seq = seq;
        self.hint.send_replace(hint);
    }

    fn unscare(&self, token: &CancellationToken) {
        let mut inner = self.lock();
        if !token.is_cancelled() {
            inner.game.unscare_all();
        }
    }
}

fn cancel_tasks(inner: &mut Inner) {
    inner.token.cancel();
    for task in inner.tasks.drain(..) {
        task.abort();
    }
}

async fn ghost_loop(shared: Arc<Shared>, token: CancellationToken, slot: usize, period: Duration) {
    let mut ticks = interval_at(Instant::now() + period, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticks.tick() => {}
        }
        if !shared.ghost_step(&token, slot) {
            break;
        }
    }
    debug!(slot, "ghost timer finished");
}

async fn player_loop(shared: Arc<Shared>, token: CancellationToken) {
    let period = shared.player_tick;
    let mut ticks = interval_at(Instant::now() + period, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(?period, "player timer started");
    // so the first tick already has an answer to go on
    shared.poll_prediction(&token);
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticks.tick() => {}
        }
        shared.poll_prediction(&token);
        if !shared.player_step(&token) {
            break;
        }
    }
    debug!("player timer finished");
}

async fn unscare_later(shared: Arc<Shared>, token: CancellationToken) {
    tokio::select! {
        _ = token.cancelled() => {}
        _ = tokio::time::sleep(shared.scared_for) => shared.unscare(&token),
    }
}
