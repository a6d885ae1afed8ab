// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use calorimetrics::config::Config;
use calorimetrics::models::Contact;
use calorimetrics::routes::create_router;
use calorimetrics::services::{AuthFlow, FixedPasscode, NoDelay, PasscodeSender};
use calorimetrics::store::{KeyValueStore, MemoryStore};
use calorimetrics::time_utils::ManualClock;
use calorimetrics::AppState;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::{Arc, Mutex};

/// Passcode every test harness issues.
#[allow(dead_code)]
pub const TEST_CODE: &str = "482913";

/// Fixed starting point for the manual clock.
#[allow(dead_code)]
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 12, 8, 0, 0).unwrap()
}

/// Sender that remembers what it was asked to deliver.
#[derive(Default)]
pub struct RecordingSender {
    pub sent: Mutex<Vec<(Contact, String)>>,
}

impl PasscodeSender for RecordingSender {
    fn send(&self, contact: &Contact, code: &str) -> Result<(), String> {
        self.sent
            .lock()
            .unwrap()
            .push((contact.clone(), code.to_string()));
        Ok(())
    }
}

/// Sender whose delivery channel is down.
#[allow(dead_code)]
pub struct FailingSender;

impl PasscodeSender for FailingSender {
    fn send(&self, _contact: &Contact, _code: &str) -> Result<(), String> {
        Err("gateway unavailable".to_string())
    }
}

/// Offline app state over an in-memory store and a manual clock.
pub struct TestHarness {
    pub state: Arc<AppState>,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub sender: Arc<RecordingSender>,
}

#[allow(dead_code)]
impl TestHarness {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    /// Harness over a pre-populated store.
    pub fn with_store(store: Arc<MemoryStore>) -> Self {
        let clock = Arc::new(ManualClock::new(epoch()));
        let sender = Arc::new(RecordingSender::default());

        let mut state = AppState::with_clock(
            Config::test_default(),
            store.clone() as Arc<dyn KeyValueStore>,
            clock.clone(),
        );
        state.auth = AuthFlow::new(store.clone(), state.notifier.clone())
            .with_delay(Arc::new(NoDelay))
            .with_generator(Arc::new(FixedPasscode(TEST_CODE.to_string())))
            .with_sender(sender.clone());

        Self {
            state: Arc::new(state),
            store,
            clock,
            sender,
        }
    }

    pub fn router(&self) -> axum::Router {
        create_router(self.state.clone())
    }

    /// Log in through the passcode flow.
    pub async fn login(&self, email: &str) {
        self.state
            .auth
            .request_login(email, calorimetrics::models::ContactType::Email)
            .await
            .expect("login request should succeed");
        assert!(self.state.auth.verify(email, TEST_CODE).await);
    }
}
