// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Passcode login flow.
//!
//! Anonymous → (request_login) → AwaitingCode → (verify ok) → Authenticated
//! → (logout) → Anonymous. A failed verify leaves the pending code in place.
//!
//! Codes never expire and attempts are not counted. That is acceptable for
//! the simulated login this crate provides, not for a real deployment.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use subtle::ConstantTimeEq;
use tokio::sync::watch;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::ValidateEmail;

use crate::error::{AppError, Result};
use crate::models::{Contact, ContactType, User};
use crate::services::notify::{Notice, Notifier};
use crate::services::otp::{
    LogPasscodeSender, NetworkDelay, NoDelay, PasscodeGenerator, PasscodeSender, RandomPasscode,
};
use crate::store::{keys, load_json, save_json, KeyValueStore};

/// Observable authentication state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum AuthState {
    Anonymous,
    AwaitingCode { contact: Contact },
    Authenticated { user: User },
}

#[derive(Default)]
struct Identity {
    user: Option<User>,
    pending: Option<Contact>,
}

impl Identity {
    fn state(&self) -> AuthState {
        match (&self.user, &self.pending) {
            (Some(user), _) => AuthState::Authenticated { user: user.clone() },
            (None, Some(contact)) => AuthState::AwaitingCode {
                contact: contact.clone(),
            },
            (None, None) => AuthState::Anonymous,
        }
    }
}

/// Owns the simulated login identity.
pub struct AuthFlow {
    store: Arc<dyn KeyValueStore>,
    notifier: Notifier,
    delay: Arc<dyn NetworkDelay>,
    generator: Arc<dyn PasscodeGenerator>,
    sender: Arc<dyn PasscodeSender>,
    identity: Mutex<Identity>,
    updates: watch::Sender<AuthState>,
}

impl AuthFlow {
    /// Flow with random codes, log-only delivery, and no latency.
    pub fn new(store: Arc<dyn KeyValueStore>, notifier: Notifier) -> Self {
        let (updates, _) = watch::channel(AuthState::Anonymous);
        Self {
            store,
            notifier,
            delay: Arc::new(NoDelay),
            generator: Arc::new(RandomPasscode),
            sender: Arc::new(LogPasscodeSender),
            identity: Mutex::new(Identity::default()),
            updates,
        }
    }

    pub fn with_delay(mut self, delay: Arc<dyn NetworkDelay>) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_generator(mut self, generator: Arc<dyn PasscodeGenerator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_sender(mut self, sender: Arc<dyn PasscodeSender>) -> Self {
        self.sender = sender;
        self
    }

    // ─── Read Side ───────────────────────────────────────────────

    pub fn state(&self) -> AuthState {
        self.lock().state()
    }

    pub fn current_user(&self) -> Option<User> {
        self.lock().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock().user.is_some()
    }

    /// Contact awaiting verification, if a login is in flight.
    pub fn pending_contact(&self) -> Option<Contact> {
        self.lock().pending.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.updates.subscribe()
    }

    // ─── Operations ──────────────────────────────────────────────

    /// Issue a passcode for `contact` and mark it pending.
    ///
    /// Malformed contacts are rejected before anything is stored.
    pub async fn request_login(&self, contact: &str, contact_type: ContactType) -> Result<()> {
        let value = contact.trim();
        validate_contact(value, contact_type)?;

        self.delay.wait().await;

        let contact = Contact {
            value: value.to_string(),
            contact_type,
        };
        // The code and the pending contact change together under the lock.
        {
            let mut identity = self.lock();
            let code = self.generator.generate();
            self.store.set(&keys::otp(value), code.clone())?;

            if let Err(e) = self.sender.send(&contact, &code) {
                if let Err(store_err) = self.store.remove(&keys::otp(value)) {
                    tracing::warn!(error = %store_err, "Failed to remove undelivered passcode");
                }
                drop(identity);
                self.notifier.notify(
                    Notice::error("Login Failed")
                        .with_description("Something went wrong. Please try again."),
                );
                return Err(AppError::Delivery(e));
            }

            identity.pending = Some(contact.clone());
            self.publish(&identity);
        }

        tracing::info!(
            contact = %contact.masked(),
            contact_type = %contact_type,
            "Passcode issued"
        );
        self.notifier.notify(Notice::success("OTP Sent").with_description(format!(
            "A verification code has been sent to your {contact_type}."
        )));
        Ok(())
    }

    /// Check `code` against the pending passcode for `contact`.
    ///
    /// On success the user is created and persisted and the code is consumed.
    /// On failure nothing changes and the caller may retry.
    pub async fn verify(&self, contact: &str, code: &str) -> bool {
        let value = contact.trim();

        self.delay.wait().await;

        // Read, compare and consume under one lock so a code is accepted once.
        let (user, contact) = {
            let mut identity = self.lock();
            let expected = match self.store.get(&keys::otp(value)) {
                Ok(expected) => expected,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read pending passcode");
                    None
                }
            };

            let matches = expected
                .as_deref()
                .is_some_and(|expected| bool::from(expected.as_bytes().ct_eq(code.as_bytes())));
            if !matches {
                drop(identity);
                if expected.is_none() {
                    tracing::warn!("Verification attempted without a pending passcode");
                } else {
                    tracing::info!("Passcode mismatch");
                }
                self.notifier.notify(
                    Notice::error("Verification Failed")
                        .with_description("Invalid OTP. Please try again."),
                );
                return false;
            }

            if let Err(e) = self.store.remove(&keys::otp(value)) {
                tracing::error!(error = %e, "Failed to consume passcode");
            }

            let contact_type = identity
                .pending
                .as_ref()
                .filter(|pending| pending.value == value)
                .map(|pending| pending.contact_type)
                .unwrap_or_else(|| ContactType::infer(value));
            let contact = Contact {
                value: value.to_string(),
                contact_type,
            };
            let user = User::for_contact(uuid::Uuid::new_v4().to_string(), &contact);

            if let Err(e) = save_json(&*self.store, keys::CURRENT_USER, &user) {
                tracing::error!(error = %e, "Failed to persist user, login will not survive restart");
            }

            identity.user = Some(user.clone());
            identity.pending = None;
            self.publish(&identity);
            (user, contact)
        };

        tracing::info!(user_id = %user.id, contact = %contact.masked(), "Login successful");
        self.notifier.notify(
            Notice::success("Login Successful").with_description("You have successfully logged in."),
        );
        true
    }

    /// Forget the user. Always succeeds.
    pub fn logout(&self) {
        if let Err(e) = self.store.remove(keys::CURRENT_USER) {
            tracing::warn!(error = %e, "Failed to remove persisted user");
        }

        {
            let mut identity = self.lock();
            identity.user = None;
            identity.pending = None;
            self.publish(&identity);
        }

        tracing::info!("Logged out");
        self.notifier.notify(
            Notice::success("Logged Out").with_description("You have been logged out successfully."),
        );
    }

    /// Load a persisted user. Malformed data is discarded.
    ///
    /// Returns whether the flow is authenticated afterwards.
    pub fn restore_session(&self) -> bool {
        let user = match load_json::<User>(&*self.store, keys::CURRENT_USER) {
            Ok(Some(user)) if !user.id.trim().is_empty() => user,
            Ok(Some(_)) => {
                tracing::warn!("Discarding stored user without an id");
                self.discard_user();
                return false;
            }
            Ok(None) => return false,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable stored user");
                self.discard_user();
                return false;
            }
        };

        tracing::info!(user_id = %user.id, "Restored login");
        let mut identity = self.lock();
        identity.user = Some(user);
        self.publish(&identity);
        true
    }

    fn discard_user(&self) {
        if let Err(e) = self.store.remove(keys::CURRENT_USER) {
            tracing::warn!(error = %e, "Failed to remove stored user");
        }
    }

    fn lock(&self) -> MutexGuard<'_, Identity> {
        self.identity.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, identity: &Identity) {
        self.updates.send_replace(identity.state());
    }
}

/// Superficial format check on a contact value.
///
/// Emails must be syntactically valid; phones must be 10–15 digits.
pub fn validate_contact(value: &str, contact_type: ContactType) -> Result<()> {
    if value.is_empty() {
        return Err(AppError::InvalidContact(
            "contact value is required".to_string(),
        ));
    }

    match contact_type {
        ContactType::Email if !value.validate_email() => Err(AppError::InvalidContact(
            "not a valid email address".to_string(),
        )),
        ContactType::Phone
            if !(10..=15).contains(&value.len()) || !value.chars().all(|c| c.is_ascii_digit()) =>
        {
            Err(AppError::InvalidContact(
                "phone number must be 10 to 15 digits".to_string(),
            ))
        }
        _ => Ok(()),
    }
}
