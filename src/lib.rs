// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Calorimetrics: live workout tracking with a passcode login.
//!
//! This crate provides the state core behind the fitness dashboard: a
//! session tracker that accumulates calories, water, and exercises while a
//! workout is running, and a simulated one-time-passcode login. Both persist
//! to an injectable key/value store and are exposed over a small JSON API.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod time_utils;

use std::sync::Arc;

use config::Config;
use services::{AuthFlow, FixedDelay, Notifier, SessionTracker};
use store::KeyValueStore;
use time_utils::{Clock, SystemClock};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn KeyValueStore>,
    pub notifier: Notifier,
    pub tracker: SessionTracker,
    pub auth: AuthFlow,
}

impl AppState {
    /// Wire up the services over `store` using the wall clock.
    pub fn new(config: Config, store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_clock(config, store, Arc::new(SystemClock))
    }

    pub fn with_clock(config: Config, store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        let notifier = Notifier::default();
        let tracker = SessionTracker::new(
            store.clone(),
            clock,
            notifier.clone(),
            config.tick_interval,
            config.restore_window,
        );
        let auth = AuthFlow::new(store.clone(), notifier.clone())
            .with_delay(Arc::new(FixedDelay(config.network_delay)));

        Self {
            config,
            store,
            notifier,
            tracker,
            auth,
        }
    }

    /// Restore persisted login and tracking state. Run once at startup.
    pub fn restore(&self) {
        let authenticated = self.auth.restore_session();
        let tracking = self.tracker.restore();
        tracing::info!(authenticated, tracking, "Persisted state restored");
    }
}
