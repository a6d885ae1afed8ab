// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! One-time passcode generation, delivery, and simulated latency.
//!
//! Each concern is a trait so the auth flow can be driven deterministically
//! in tests.

use std::time::Duration;

use futures_util::future::{self, BoxFuture, FutureExt};
use rand::Rng;

use crate::models::Contact;

/// Produces passcodes.
pub trait PasscodeGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Uniform random 6-digit codes (100000–999999).
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPasscode;

impl PasscodeGenerator for RandomPasscode {
    fn generate(&self) -> String {
        let code: u32 = rand::thread_rng().gen_range(100000..1000000);
        code.to_string()
    }
}

/// Always returns the same code.
#[derive(Debug, Clone)]
pub struct FixedPasscode(pub String);

impl PasscodeGenerator for FixedPasscode {
    fn generate(&self) -> String {
        self.0.clone()
    }
}

/// Delivers a passcode to the user out of band.
pub trait PasscodeSender: Send + Sync {
    fn send(&self, contact: &Contact, code: &str) -> Result<(), String>;
}

/// Delivery stub: writes the code to the log instead of sending it.
///
/// Nothing reaches the user's inbox or phone. Replace with a real email/SMS
/// sender before using this flow for anything but local development.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPasscodeSender;

impl PasscodeSender for LogPasscodeSender {
    fn send(&self, contact: &Contact, code: &str) -> Result<(), String> {
        tracing::info!(
            contact_type = %contact.contact_type,
            contact = %contact.value,
            code = %code,
            "One-time passcode issued (not delivered, log only)"
        );
        Ok(())
    }
}

/// Simulated network round trip applied before login and verify.
pub trait NetworkDelay: Send + Sync {
    fn wait(&self) -> BoxFuture<'static, ()>;
}

/// Sleeps for a fixed duration on the tokio timer.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

impl NetworkDelay for FixedDelay {
    fn wait(&self) -> BoxFuture<'static, ()> {
        tokio::time::sleep(self.0).boxed()
    }
}

/// Completes immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl NetworkDelay for NoDelay {
    fn wait(&self) -> BoxFuture<'static, ()> {
        future::ready(()).boxed()
    }
}
