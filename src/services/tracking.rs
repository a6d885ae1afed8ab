// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live session tracking.
//!
//! The tracker is either idle or holds one active [`TrackingSession`]. While
//! active, a background ticker recomputes the elapsed duration once per tick
//! interval. All mutation (caller operations and ticks) goes through a single
//! mutex, so updates are applied one at a time in arrival order.
//!
//! Persistence:
//! - `trackingSession` mirrors the active session and is removed on stop
//! - `sessionHistory` receives a snapshot of every stopped session

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::models::{ArchivedSession, ExerciseEntry, HistoryStats, TrackingSession};
use crate::services::notify::{Notice, Notifier};
use crate::store::{keys, load_json, save_json, KeyValueStore};
use crate::time_utils::{format_utc_rfc3339, Clock};

/// Tracks one fitness session at a time.
pub struct SessionTracker {
    shared: Arc<Shared>,
}

struct Shared {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    notifier: Notifier,
    tick_interval: Duration,
    restore_window: chrono::Duration,
    state: Mutex<TrackerState>,
    updates: watch::Sender<Option<TrackingSession>>,
}

#[derive(Default)]
struct TrackerState {
    session: Option<TrackingSession>,
    /// Cancels the ticker of the current session
    ticker: Option<CancellationToken>,
}

impl SessionTracker {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        notifier: Notifier,
        tick_interval: Duration,
        restore_window: Duration,
    ) -> Self {
        let (updates, _) = watch::channel(None);
        Self {
            shared: Arc::new(Shared {
                store,
                clock,
                notifier,
                tick_interval: tick_interval.max(Duration::from_millis(1)),
                restore_window: chrono::Duration::from_std(restore_window)
                    .unwrap_or_else(|_| chrono::Duration::days(365)),
                state: Mutex::new(TrackerState::default()),
                updates,
            }),
        }
    }

    // ─── Read Side ───────────────────────────────────────────────

    pub fn is_active(&self) -> bool {
        self.shared.lock().session.is_some()
    }

    /// Snapshot of the active session, if any.
    pub fn current(&self) -> Option<TrackingSession> {
        self.shared.lock().session.clone()
    }

    /// Receive every change to the active session (`None` while idle).
    pub fn subscribe(&self) -> watch::Receiver<Option<TrackingSession>> {
        self.shared.updates.subscribe()
    }

    /// Archived sessions, oldest first. Malformed history reads as empty.
    pub fn history(&self) -> Vec<ArchivedSession> {
        self.shared.load_history()
    }

    pub fn stats(&self) -> HistoryStats {
        HistoryStats::from_history(&self.history())
    }

    // ─── Lifecycle ───────────────────────────────────────────────

    /// Start a new session, discarding any session already in progress.
    ///
    /// Returns the ticker's cancellation token. Cancelling it stops duration
    /// updates without ending the session; `stop()` cancels it as well.
    pub fn start(&self) -> CancellationToken {
        let shared = &self.shared;
        let now = shared.clock.now();

        let token = {
            let mut state = shared.lock();
            if let Some(previous) = state.ticker.take() {
                previous.cancel();
            }

            let session = TrackingSession::new(now);
            shared.persist(&session);
            state.session = Some(session);

            let token = CancellationToken::new();
            state.ticker = Some(token.clone());
            spawn_ticker(shared, token.clone());
            shared.publish(&state);
            token
        };

        tracing::info!(start_time = %format_utc_rfc3339(now), "Tracking started");
        shared.notifier.notify(
            Notice::success("Tracking started")
                .with_description("Your fitness activities are now being tracked in real-time"),
        );
        token
    }

    /// End the active session and archive it.
    ///
    /// Returns the archived snapshot, or `None` when already idle.
    pub fn stop(&self) -> Option<ArchivedSession> {
        let shared = &self.shared;

        let archived = {
            let mut state = shared.lock();
            // Cancel first so a pending tick cannot touch the cleared session.
            if let Some(ticker) = state.ticker.take() {
                ticker.cancel();
            }

            let mut session = state.session.take()?;
            let end_time = shared.clock.now().max(session.start_time);
            session.refresh_duration(end_time);

            let archived = ArchivedSession { session, end_time };
            shared.append_history(&archived);
            if let Err(e) = shared.store.remove(keys::TRACKING_SESSION) {
                tracing::warn!(error = %e, "Failed to remove persisted tracking session");
            }
            shared.publish(&state);
            archived
        };

        tracing::info!(
            duration = archived.session.duration,
            calories_burned = archived.session.calories_burned,
            exercises = archived.session.exercises.len(),
            "Tracking stopped"
        );
        shared.notifier.notify(
            Notice::success("Tracking stopped").with_description("Your session has been saved"),
        );
        Some(archived)
    }

    /// Reactivate a persisted session started within the recency window.
    ///
    /// Stale or malformed sessions are discarded. Returns whether a session
    /// is active afterwards.
    pub fn restore(&self) -> bool {
        let shared = &self.shared;
        if self.is_active() {
            return true;
        }

        let persisted = match load_json::<TrackingSession>(&*shared.store, keys::TRACKING_SESSION) {
            Ok(Some(session)) => session,
            Ok(None) => return false,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable tracking session");
                shared.discard_persisted();
                return false;
            }
        };

        let now = shared.clock.now();
        let age = now - persisted.start_time;
        if age >= shared.restore_window {
            tracing::info!(
                start_time = %format_utc_rfc3339(persisted.start_time),
                age_secs = age.num_seconds(),
                "Discarding stale tracking session"
            );
            shared.discard_persisted();
            return false;
        }

        if !Shared::resume(shared, persisted, now) {
            return true;
        }

        tracing::info!(age_secs = age.num_seconds(), "Tracking session restored");
        shared
            .notifier
            .notify(Notice::info("Previous tracking session restored"));
        true
    }

    /// Stop the ticker without ending the session (host teardown).
    ///
    /// The persisted session is kept so `restore()` can pick it up again.
    pub fn shutdown(&self) {
        if let Some(ticker) = self.shared.lock().ticker.take() {
            ticker.cancel();
            tracing::debug!("Tracking ticker cancelled on shutdown");
        }
    }

    // ─── Recording ───────────────────────────────────────────────

    /// Add consumed calories. Ignored while idle; returns whether applied.
    pub fn record_calories(&self, amount: u32) -> bool {
        let applied = self.shared.mutate(|session| {
            session.calories_consumed = session.calories_consumed.saturating_add(amount);
        });
        if applied {
            self.shared.notifier.notify(Notice::success(format!(
                "Added {amount} calories to your daily intake"
            )));
        }
        applied
    }

    /// Add water intake (ml). Ignored while idle; returns whether applied.
    pub fn record_water(&self, amount: u32) -> bool {
        let applied = self.shared.mutate(|session| {
            session.water_intake = session.water_intake.saturating_add(amount);
        });
        if applied {
            self.shared.notifier.notify(Notice::success(format!(
                "Added {amount}ml of water to your daily intake"
            )));
        }
        applied
    }

    /// Log an exercise and add its calories to the burned total.
    ///
    /// Ignored while idle; returns whether applied.
    pub fn record_exercise(&self, name: &str, duration: u64, calories: u32) -> bool {
        let timestamp = self.shared.clock.now();
        let applied = self.shared.mutate(|session| {
            session.calories_burned = session.calories_burned.saturating_add(calories);
            session.exercises.push(ExerciseEntry {
                name: name.to_string(),
                duration,
                calories,
                timestamp,
            });
        });
        if applied {
            self.shared.notifier.notify(
                Notice::success(format!("Tracked: {name}"))
                    .with_description(format!("Burned approximately {calories} calories")),
            );
        }
        applied
    }
}

impl Drop for SessionTracker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `f` to the active session and persist it. No-op while idle.
    fn mutate(&self, f: impl FnOnce(&mut TrackingSession)) -> bool {
        let mut state = self.lock();
        let Some(session) = state.session.as_mut() else {
            tracing::debug!("Ignoring update while no session is active");
            return false;
        };
        f(session);
        self.persist(session);
        self.publish(&state);
        true
    }

    /// Recompute the duration of the session owned by `ticker`.
    fn tick(&self, ticker: &CancellationToken) {
        let mut state = self.lock();
        if ticker.is_cancelled() {
            return;
        }
        let now = self.clock.now();
        let Some(session) = state.session.as_mut() else {
            return;
        };
        session.refresh_duration(now);
        self.persist(session);
        self.publish(&state);
    }

    /// Reactivate `session` unless one became active in the meantime.
    fn resume(self: &Arc<Self>, mut session: TrackingSession, now: DateTime<Utc>) -> bool {
        let mut state = self.lock();
        if state.session.is_some() {
            tracing::debug!("Session already active, skipping restore");
            return false;
        }
        if let Some(previous) = state.ticker.take() {
            previous.cancel();
        }

        session.refresh_duration(now);
        self.persist(&session);
        state.session = Some(session);

        let token = CancellationToken::new();
        state.ticker = Some(token.clone());
        spawn_ticker(self, token);
        self.publish(&state);
        true
    }

    fn publish(&self, state: &TrackerState) {
        self.updates.send_replace(state.session.clone());
    }

    fn persist(&self, session: &TrackingSession) {
        if let Err(e) = save_json(&*self.store, keys::TRACKING_SESSION, session) {
            tracing::warn!(error = %e, "Failed to persist tracking session");
        }
    }

    fn discard_persisted(&self) {
        if let Err(e) = self.store.remove(keys::TRACKING_SESSION) {
            tracing::warn!(error = %e, "Failed to remove persisted tracking session");
        }
    }

    fn load_history(&self) -> Vec<ArchivedSession> {
        match load_json::<Vec<ArchivedSession>>(&*self.store, keys::SESSION_HISTORY) {
            Ok(history) => history.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable session history");
                Vec::new()
            }
        }
    }

    fn append_history(&self, archived: &ArchivedSession) {
        let mut history = self.load_history();
        history.push(archived.clone());
        if let Err(e) = save_json(&*self.store, keys::SESSION_HISTORY, &history) {
            tracing::error!(error = %e, "Failed to append session to history");
        }
    }
}

/// Spawn the duration ticker for the session owned by `cancel`.
fn spawn_ticker(shared: &Arc<Shared>, cancel: CancellationToken) {
    let shared = Arc::clone(shared);
    let period = shared.tick_interval;

    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => shared.tick(&cancel),
            }
        }
        tracing::debug!("Duration ticker stopped");
    });
}
