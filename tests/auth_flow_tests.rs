// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Passcode login flow: issue, verify, logout, and session restore.

use calorimetrics::error::AppError;
use calorimetrics::models::{ContactType, User};
use calorimetrics::services::{
    AuthFlow, AuthState, FixedPasscode, NoDelay, Notifier, NoticeLevel, PasscodeGenerator,
};
use calorimetrics::store::{keys, load_json, save_json, KeyValueStore, MemoryStore, StoreResult};
use std::sync::{Arc, Mutex};
use std::time::Duration;

mod common;
use common::{FailingSender, TestHarness, TEST_CODE};

#[tokio::test]
async fn test_login_and_verify_email() {
    let h = TestHarness::new();
    let auth = &h.state.auth;

    auth.request_login("a@b.com", ContactType::Email).await.unwrap();

    assert_eq!(
        h.store.get(&keys::otp("a@b.com")).unwrap().as_deref(),
        Some(TEST_CODE)
    );
    assert!(matches!(auth.state(), AuthState::AwaitingCode { ref contact } if contact.value == "a@b.com"));
    {
        let sent = h.sender.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, TEST_CODE);
    }

    assert!(auth.verify("a@b.com", "482913").await);

    let user = auth.current_user().expect("user after verify");
    assert_eq!(user.email.as_deref(), Some("a@b.com"));
    assert!(user.phone.is_none());
    assert!(uuid::Uuid::parse_str(&user.id).is_ok());
    assert!(auth.is_authenticated());
    assert!(auth.pending_contact().is_none());

    let persisted: User = load_json(&*h.store, keys::CURRENT_USER).unwrap().unwrap();
    assert_eq!(persisted, user);
    assert!(h.store.get(&keys::otp("a@b.com")).unwrap().is_none());
}

#[tokio::test]
async fn test_phone_login_sets_phone_field() {
    let h = TestHarness::new();
    let auth = &h.state.auth;

    auth.request_login("5551234567", ContactType::Phone)
        .await
        .unwrap();
    assert!(auth.verify("5551234567", TEST_CODE).await);

    let user = auth.current_user().unwrap();
    assert_eq!(user.phone.as_deref(), Some("5551234567"));
    assert!(user.email.is_none());
}

#[tokio::test]
async fn test_wrong_code_keeps_pending_code() {
    let h = TestHarness::new();
    let auth = &h.state.auth;
    let mut notices = h.state.notifier.subscribe();

    auth.request_login("a@b.com", ContactType::Email).await.unwrap();
    let _otp_sent = notices.recv().await.unwrap();

    assert!(!auth.verify("a@b.com", "000000").await);
    assert!(!auth.verify("a@b.com", "48291").await);
    assert!(!auth.verify("a@b.com", "4829130").await);

    let notice = notices.recv().await.unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.title, "Verification Failed");

    assert_eq!(
        h.store.get(&keys::otp("a@b.com")).unwrap().as_deref(),
        Some(TEST_CODE)
    );
    assert!(!auth.is_authenticated());
    assert!(matches!(auth.state(), AuthState::AwaitingCode { .. }));

    // Unlimited retries
    assert!(auth.verify("a@b.com", TEST_CODE).await);
}

#[tokio::test]
async fn test_code_is_single_use() {
    let h = TestHarness::new();
    let auth = &h.state.auth;

    auth.request_login("a@b.com", ContactType::Email).await.unwrap();
    assert!(auth.verify("a@b.com", TEST_CODE).await);
    let first_user = auth.current_user().unwrap();

    assert!(!auth.verify("a@b.com", TEST_CODE).await);
    assert_eq!(auth.current_user(), Some(first_user));
}

/// Hands out the queued codes in order.
struct SequencePasscode(Mutex<Vec<&'static str>>);

impl SequencePasscode {
    fn new(codes: &[&'static str]) -> Self {
        Self(Mutex::new(codes.iter().rev().copied().collect()))
    }
}

impl PasscodeGenerator for SequencePasscode {
    fn generate(&self) -> String {
        self.0.lock().unwrap().pop().unwrap_or("000000").to_string()
    }
}

/// Memory store whose passcode reads are slow, like a cold disk.
#[derive(Default)]
struct SlowPasscodeStore(MemoryStore);

impl KeyValueStore for SlowPasscodeStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        if key.starts_with(keys::OTP_PREFIX) {
            std::thread::sleep(Duration::from_millis(50));
        }
        self.0.get(key)
    }

    fn set(&self, key: &str, value: String) -> StoreResult<()> {
        self.0.set(key, value)
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.0.remove(key)
    }
}

#[tokio::test]
async fn test_only_latest_code_verifies() {
    let store = Arc::new(MemoryStore::new());
    let auth = AuthFlow::new(store.clone(), Notifier::default())
        .with_generator(Arc::new(SequencePasscode::new(&["111111", "222222"])));

    auth.request_login("a@b.com", ContactType::Email).await.unwrap();
    auth.request_login("a@b.com", ContactType::Email).await.unwrap();
    assert_eq!(
        store.get(&keys::otp("a@b.com")).unwrap().as_deref(),
        Some("222222")
    );

    assert!(!auth.verify("a@b.com", "111111").await);
    assert!(!auth.is_authenticated());
    assert!(auth.verify("a@b.com", "222222").await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_verify_accepts_code_once() {
    let store = Arc::new(SlowPasscodeStore::default());
    let auth = Arc::new(
        AuthFlow::new(store.clone(), Notifier::default())
            .with_generator(Arc::new(FixedPasscode(TEST_CODE.to_string()))),
    );
    auth.request_login("a@b.com", ContactType::Email).await.unwrap();

    let first = tokio::spawn({
        let auth = auth.clone();
        async move { auth.verify("a@b.com", TEST_CODE).await }
    });
    let second = tokio::spawn({
        let auth = auth.clone();
        async move { auth.verify("a@b.com", TEST_CODE).await }
    });
    let results = [first.await.unwrap(), second.await.unwrap()];

    assert_eq!(results.iter().filter(|ok| **ok).count(), 1);
    let persisted: User = load_json(&*store, keys::CURRENT_USER).unwrap().unwrap();
    assert_eq!(auth.current_user(), Some(persisted));
    assert!(store.get(&keys::otp("a@b.com")).unwrap().is_none());
}

#[tokio::test]
async fn test_verify_without_pending_code() {
    let h = TestHarness::new();
    assert!(!h.state.auth.verify("nobody@b.com", TEST_CODE).await);
    assert_eq!(h.state.auth.state(), AuthState::Anonymous);
}

#[tokio::test]
async fn test_code_is_keyed_by_contact() {
    let h = TestHarness::new();
    let auth = &h.state.auth;

    auth.request_login("a@b.com", ContactType::Email).await.unwrap();
    assert!(!auth.verify("c@d.com", TEST_CODE).await);
    assert!(auth.verify("a@b.com", TEST_CODE).await);
}

#[tokio::test]
async fn test_invalid_contacts_rejected_before_mutation() {
    let h = TestHarness::new();
    let auth = &h.state.auth;

    for (contact, contact_type) in [
        ("", ContactType::Email),
        ("   ", ContactType::Phone),
        ("not-an-email", ContactType::Email),
        ("555-1234", ContactType::Phone),
    ] {
        let err = auth.request_login(contact, contact_type).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidContact(_)), "{contact:?}");
    }

    assert!(h.store.is_empty());
    assert_eq!(auth.state(), AuthState::Anonymous);
    assert!(h.sender.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_delivery_failure_leaves_no_code() {
    let store = Arc::new(MemoryStore::new());
    let auth = AuthFlow::new(store.clone(), Notifier::default())
        .with_delay(Arc::new(NoDelay))
        .with_sender(Arc::new(FailingSender));

    let err = auth
        .request_login("a@b.com", ContactType::Email)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Delivery(_)));
    assert!(store.get(&keys::otp("a@b.com")).unwrap().is_none());
    assert_eq!(auth.state(), AuthState::Anonymous);
}

#[tokio::test]
async fn test_logout_clears_user() {
    let h = TestHarness::new();
    h.login("a@b.com").await;

    h.state.auth.logout();

    assert!(!h.state.auth.is_authenticated());
    assert_eq!(h.state.auth.state(), AuthState::Anonymous);
    assert!(h.store.get(keys::CURRENT_USER).unwrap().is_none());

    // Logging out twice is fine
    h.state.auth.logout();
}

#[tokio::test]
async fn test_subscribers_see_transitions() {
    let h = TestHarness::new();
    let mut updates = h.state.auth.subscribe();

    h.state
        .auth
        .request_login("a@b.com", ContactType::Email)
        .await
        .unwrap();
    assert!(matches!(
        *updates.borrow_and_update(),
        AuthState::AwaitingCode { .. }
    ));

    h.state.auth.verify("a@b.com", TEST_CODE).await;
    assert!(matches!(
        *updates.borrow_and_update(),
        AuthState::Authenticated { .. }
    ));

    h.state.auth.logout();
    assert_eq!(*updates.borrow_and_update(), AuthState::Anonymous);
}

#[tokio::test]
async fn test_restore_session_loads_user() {
    let store = Arc::new(MemoryStore::new());
    let user = User {
        id: "2f7c3d1e-5a4b-4c8d-9e0f-1a2b3c4d5e6f".to_string(),
        email: Some("a@b.com".to_string()),
        phone: None,
        name: Some("Alex".to_string()),
    };
    save_json(&*store, keys::CURRENT_USER, &user).unwrap();

    let h = TestHarness::with_store(store);
    assert!(h.state.auth.restore_session());
    assert_eq!(h.state.auth.current_user(), Some(user));
}

#[tokio::test]
async fn test_restore_session_discards_malformed_user() {
    let store = Arc::new(MemoryStore::new());
    store
        .set(keys::CURRENT_USER, "definitely not json".to_string())
        .unwrap();

    let h = TestHarness::with_store(store);
    assert!(!h.state.auth.restore_session());
    assert_eq!(h.state.auth.state(), AuthState::Anonymous);
    assert!(h.store.get(keys::CURRENT_USER).unwrap().is_none());
}

#[tokio::test]
async fn test_restore_session_discards_user_without_id() {
    let store = Arc::new(MemoryStore::new());
    store
        .set(keys::CURRENT_USER, r#"{"id":"","email":"a@b.com"}"#.to_string())
        .unwrap();

    let h = TestHarness::with_store(store);
    assert!(!h.state.auth.restore_session());
}

#[tokio::test(start_paused = true)]
async fn test_default_state_applies_network_delay() {
    use calorimetrics::config::Config;
    use calorimetrics::AppState;

    let mut config = Config::test_default();
    config.network_delay = std::time::Duration::from_secs(1);
    let state = AppState::new(config, Arc::new(MemoryStore::new()));

    let started = tokio::time::Instant::now();
    assert!(!state.auth.verify("a@b.com", "123456").await);
    assert!(started.elapsed() >= std::time::Duration::from_secs(1));
}
